//! Waiting for clicks on buttons a handler sent.
//!
//! A handler registers the custom ids it is interested in with [`ButtonWaiters::await_buttons`],
//! or builds a [`ButtonCollector`], and suspends until a matching click arrives or the timeout
//! passes. Clicks nobody waits for reach [`EventHandler::unhandled_component`].
//!
//! [`EventHandler::unhandled_component`]: crate::client::EventHandler::unhandled_component

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::trace;

use crate::model::application::ComponentInteraction;
use crate::model::id::{MessageId, UserId};
use crate::model::user::Target;

type ButtonFilter = Box<dyn Fn(&Target) -> bool + Send + Sync>;
type ClickFilter = Box<dyn Fn(&ComponentInteraction) -> bool + Send + Sync>;

struct Waiter {
    id: u64,
    custom_ids: HashSet<String>,
    filter: ClickFilter,
    sender: oneshot::Sender<ComponentInteraction>,
}

impl Waiter {
    fn matches(&self, interaction: &ComponentInteraction) -> bool {
        self.custom_ids.contains(&interaction.custom_id) && (self.filter)(interaction)
    }
}

/// The pending button waiters of a client, in registration order.
///
/// A waiter is removed when it receives its click, when it times out and when its future is
/// dropped. Each waiter resolves at most once.
#[derive(Default)]
pub struct ButtonWaiters {
    waiters: Mutex<Vec<Waiter>>,
    next_id: AtomicU64,
}

impl fmt::Debug for ButtonWaiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonWaiters").field("pending", &self.len()).finish()
    }
}

/// Unregisters a waiter when the future awaiting it completes or is dropped.
struct WaiterGuard<'a> {
    waiters: &'a ButtonWaiters,
    id: u64,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.waiters.remove(self.id);
    }
}

impl ButtonWaiters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the first click on one of `custom_ids` whose invoker passes `filter`.
    ///
    /// Returns `None` once `timeout` passed without such a click. The click is acknowledged
    /// before it is handed over.
    ///
    /// `filter` runs while the registry is locked and must not touch it.
    pub async fn await_buttons<I, S>(
        &self,
        custom_ids: I,
        filter: impl Fn(&Target) -> bool + Send + Sync + 'static,
        timeout: Duration,
    ) -> Option<ComponentInteraction>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let custom_ids = custom_ids.into_iter().map(Into::into).collect();
        let filter = move |interaction: &ComponentInteraction| filter(&interaction.target);
        self.await_clicks(custom_ids, Box::new(filter), timeout).await
    }

    async fn await_clicks(
        &self,
        custom_ids: HashSet<String>,
        filter: ClickFilter,
        timeout: Duration,
    ) -> Option<ComponentInteraction> {
        let (sender, receiver) = oneshot::channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.waiters.lock().push(Waiter {
            id,
            custom_ids,
            filter,
            sender,
        });
        let _guard = WaiterGuard {
            waiters: self,
            id,
        };

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(interaction)) => Some(interaction),
            Ok(Err(_)) => None,
            Err(_) => {
                trace!(waiter = id, "Button waiter timed out");
                None
            },
        }
    }

    /// Hands a click to the first waiter it matches, removing that waiter.
    ///
    /// # Errors
    ///
    /// Gives the interaction back if no waiter matches it.
    pub fn claim(
        &self,
        mut interaction: ComponentInteraction,
    ) -> Result<(), ComponentInteraction> {
        let mut waiters = self.waiters.lock();
        waiters.retain(|waiter| !waiter.sender.is_closed());

        loop {
            let Some(index) = waiters.iter().position(|waiter| waiter.matches(&interaction)) else {
                return Err(interaction);
            };

            let waiter = waiters.remove(index);
            match waiter.sender.send(interaction) {
                Ok(()) => {
                    trace!(waiter = waiter.id, "Button waiter resolved");
                    return Ok(());
                },
                // Timed out between the check and the send.
                Err(returned) => interaction = returned,
            }
        }
    }

    fn remove(&self, id: u64) {
        self.waiters.lock().retain(|waiter| waiter.id != id);
    }

    /// The number of pending waiters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiters.lock().is_empty()
    }
}

/// A builder over [`ButtonWaiters::await_buttons`] with the usual filters.
#[must_use]
pub struct ButtonCollector<'a> {
    waiters: &'a ButtonWaiters,
    custom_ids: Vec<String>,
    timeout: Duration,
    author_id: Option<UserId>,
    message_id: Option<MessageId>,
    filter: Option<ButtonFilter>,
}

impl<'a> ButtonCollector<'a> {
    /// Creates a collector without any buttons to wait for, timing out after a minute.
    pub fn new(waiters: &'a ButtonWaiters) -> Self {
        Self {
            waiters,
            custom_ids: Vec::new(),
            timeout: Duration::from_secs(60),
            author_id: None,
            message_id: None,
            filter: None,
        }
    }

    /// Adds a custom id to wait for.
    pub fn custom_id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_ids.push(custom_id.into());
        self
    }

    pub fn custom_ids(mut self, custom_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.custom_ids.extend(custom_ids.into_iter().map(Into::into));
        self
    }

    /// Sets how long to wait for a click.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Only accepts clicks of this user.
    pub fn author_id(mut self, author_id: UserId) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Only accepts clicks on buttons of this message. Custom ids derived from
    /// [`CommandInteraction::secret`] usually make this unnecessary.
    ///
    /// [`CommandInteraction::secret`]: crate::model::application::CommandInteraction::secret
    pub fn message_id(mut self, message_id: MessageId) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// Sets a generic filter over the user clicking.
    pub fn filter(mut self, filter: impl Fn(&Target) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Waits for the first click passing every filter.
    pub async fn collect_single(self) -> Option<ComponentInteraction> {
        let Self {
            waiters,
            custom_ids,
            timeout,
            author_id,
            message_id,
            filter,
        } = self;

        let filter = move |interaction: &ComponentInteraction| {
            author_id.map_or(true, |id| interaction.target.id() == id)
                && message_id.map_or(true, |id| interaction.message_id == Some(id))
                && filter.as_ref().map_or(true, |filter| filter(&interaction.target))
        };

        waiters.await_clicks(custom_ids.into_iter().collect(), Box::new(filter), timeout).await
    }
}

impl fmt::Debug for ButtonCollector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonCollector")
            .field("custom_ids", &self.custom_ids)
            .field("timeout", &self.timeout)
            .field("author_id", &self.author_id)
            .field("message_id", &self.message_id)
            .finish_non_exhaustive()
    }
}
