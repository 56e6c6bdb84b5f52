use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

use crate::builder::CreateMessage;
use crate::model::id::UserId;

/// What a user is told when a command is rejected because of their cooldown.
#[derive(Clone)]
#[non_exhaustive]
pub enum CooldownReply {
    /// Replies with the message produced from the time left.
    Message { content: Arc<dyn Fn(Duration) -> CreateMessage + Send + Sync>, ephemeral: bool },
    /// Drops the invocation without replying. Discord shows the user that the interaction failed.
    Silent,
}

impl CooldownReply {
    /// Replies with a custom message.
    pub fn message(
        content: impl Fn(Duration) -> CreateMessage + Send + Sync + 'static,
        ephemeral: bool,
    ) -> Self {
        Self::Message {
            content: Arc::new(content),
            ephemeral,
        }
    }

    /// The message to reply with, and whether it is ephemeral.
    #[must_use]
    pub fn render(&self, remaining: Duration) -> Option<(CreateMessage, bool)> {
        match self {
            Self::Message {
                content,
                ephemeral,
            } => Some((content(remaining), *ephemeral)),
            Self::Silent => None,
        }
    }
}

impl Default for CooldownReply {
    /// An ephemeral "You're being on cooldown" message with the seconds left.
    fn default() -> Self {
        Self::message(
            |remaining| {
                CreateMessage::new().content(format!(
                    "You're being on cooldown. Try again in **{:.2}s**.",
                    remaining.as_secs_f64()
                ))
            },
            true,
        )
    }
}

impl fmt::Debug for CooldownReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message {
                ephemeral, ..
            } => f.debug_struct("Message").field("ephemeral", ephemeral).finish_non_exhaustive(),
            Self::Silent => f.write_str("Silent"),
        }
    }
}

/// Configuration of the per-user command cooldown.
#[derive(Clone, Debug)]
#[must_use]
pub struct CooldownSettings {
    pub(crate) duration: Duration,
    pub(crate) sweep_every: u64,
    pub(crate) restart_on_retry: bool,
    pub(crate) excluded: HashSet<UserId>,
    pub(crate) reply: CooldownReply,
}

impl CooldownSettings {
    /// A cooldown of `duration` between two commands of the same user.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            sweep_every: 10_000,
            restart_on_retry: false,
            excluded: HashSet::new(),
            reply: CooldownReply::default(),
        }
    }

    /// Forgets every cooldown after this many admitted commands, so the map doesn't grow without
    /// bound. `0` never clears it. Defaults to 10 000.
    pub fn sweep_every(mut self, sweep_every: u64) -> Self {
        self.sweep_every = sweep_every;
        self
    }

    /// Whether a rejected attempt starts the cooldown over. Defaults to `false`.
    pub fn restart_on_retry(mut self, restart_on_retry: bool) -> Self {
        self.restart_on_retry = restart_on_retry;
        self
    }

    /// Lets a user bypass the cooldown, such as the bot's owner.
    pub fn exclude(mut self, user_id: UserId) -> Self {
        self.excluded.insert(user_id);
        self
    }

    pub fn reply(mut self, reply: CooldownReply) -> Self {
        self.reply = reply;
        self
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// The outcome of checking a user's cooldown.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Admission {
    Allowed,
    Cooldown { remaining: Duration },
}

/// Gates command execution per user.
///
/// Every admitted command records when the user may run the next one. Attempts before then are
/// rejected with the time left.
#[derive(Debug)]
pub struct CooldownTracker {
    settings: CooldownSettings,
    next_allowed: DashMap<UserId, Instant>,
    admissions: AtomicU64,
}

impl CooldownTracker {
    #[must_use]
    pub fn new(settings: CooldownSettings) -> Self {
        Self {
            settings,
            next_allowed: DashMap::new(),
            admissions: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &CooldownSettings {
        &self.settings
    }

    /// Checks, and if allowed records, an attempt of `user_id` now.
    pub fn check(&self, user_id: UserId) -> Admission {
        self.check_at(user_id, Instant::now())
    }

    /// Checks, and if allowed records, an attempt of `user_id` at `now`.
    pub fn check_at(&self, user_id: UserId, now: Instant) -> Admission {
        if self.settings.excluded.contains(&user_id) {
            return Admission::Allowed;
        }

        let next_allowed = now + self.settings.duration;

        match self.next_allowed.entry(user_id) {
            Entry::Occupied(mut entry) if now < *entry.get() => {
                let remaining = *entry.get() - now;
                if self.settings.restart_on_retry {
                    entry.insert(next_allowed);
                }

                return Admission::Cooldown {
                    remaining,
                };
            },
            entry => {
                entry.insert(next_allowed);
            },
        }

        let admissions = self.admissions.fetch_add(1, Ordering::Relaxed) + 1;
        if self.settings.sweep_every != 0 && admissions % self.settings.sweep_every == 0 {
            trace!(admissions, "Clearing command cooldowns");
            self.next_allowed.clear();
        }

        Admission::Allowed
    }

    /// Drops the cooldowns that ended before `now`.
    pub fn sweep_at(&self, now: Instant) {
        self.next_allowed.retain(|_, next_allowed| *next_allowed > now);
    }

    /// The number of users currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.next_allowed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next_allowed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId::new(42);

    #[test]
    fn rejects_until_cooldown_ends() {
        let tracker = CooldownTracker::new(CooldownSettings::new(Duration::from_secs(10)));
        let start = Instant::now();

        assert_eq!(tracker.check_at(USER, start), Admission::Allowed);
        assert_eq!(tracker.check_at(USER, start + Duration::from_secs(5)), Admission::Cooldown {
            remaining: Duration::from_secs(5),
        });
        // A rejection doesn't move the cooldown.
        assert_eq!(
            tracker.check_at(USER, start + Duration::from_secs(10) + Duration::from_millis(1)),
            Admission::Allowed
        );
    }

    #[test]
    fn restart_on_retry() {
        let settings = CooldownSettings::new(Duration::from_secs(10)).restart_on_retry(true);
        let tracker = CooldownTracker::new(settings);
        let start = Instant::now();

        assert_eq!(tracker.check_at(USER, start), Admission::Allowed);
        assert!(matches!(
            tracker.check_at(USER, start + Duration::from_secs(5)),
            Admission::Cooldown { .. }
        ));
        assert_eq!(tracker.check_at(USER, start + Duration::from_secs(11)), Admission::Cooldown {
            remaining: Duration::from_secs(4),
        });
    }

    #[test]
    fn excluded_users_and_sweeps() {
        let settings = CooldownSettings::new(Duration::from_secs(10)).exclude(USER).sweep_every(3);
        let tracker = CooldownTracker::new(settings);
        let start = Instant::now();

        assert_eq!(tracker.check_at(USER, start), Admission::Allowed);
        assert_eq!(tracker.check_at(USER, start), Admission::Allowed);
        assert!(tracker.is_empty());

        assert_eq!(tracker.check_at(UserId::new(1), start), Admission::Allowed);
        assert_eq!(tracker.check_at(UserId::new(2), start), Admission::Allowed);
        assert_eq!(tracker.len(), 2);
        // The third admission clears the map.
        assert_eq!(tracker.check_at(UserId::new(3), start), Admission::Allowed);
        assert!(tracker.is_empty());
        assert_eq!(tracker.check_at(UserId::new(1), start), Admission::Allowed);
    }

    #[test]
    fn sweep_drops_ended_cooldowns() {
        let tracker = CooldownTracker::new(CooldownSettings::new(Duration::from_secs(10)));
        let start = Instant::now();

        tracker.check_at(UserId::new(1), start);
        tracker.check_at(UserId::new(2), start + Duration::from_secs(5));
        tracker.sweep_at(start + Duration::from_secs(12));

        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn default_reply() {
        let (message, ephemeral) =
            CooldownReply::default().render(Duration::from_millis(2500)).unwrap();
        assert!(ephemeral);
        assert_eq!(
            serde_json::to_value(&message).unwrap()["content"],
            "You're being on cooldown. Try again in **2.50s**."
        );
        assert!(CooldownReply::Silent.render(Duration::from_secs(1)).is_none());
    }
}
