//! User information-related models.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{GuildId, RoleId, UserId};
use super::Timestamp;

/// Information about a user.
///
/// [Discord docs](https://discord.com/developers/docs/resources/user#user-object).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct User {
    /// The unique Id of the user.
    pub id: UserId,
    /// The account's username.
    #[serde(rename = "username")]
    pub name: String,
    /// The account's display name, if set. For bots this is the application name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    /// Optional avatar hash.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Indicator of whether the user is a bot.
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Returns a string which mentions the user.
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// The name that is displayed in the client, which is the global name when set.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Information about a member of a guild.
///
/// [Discord docs](https://discord.com/developers/docs/resources/guild#guild-member-object).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct Member {
    /// Attached User struct.
    pub user: User,
    /// The member's nickname, if present.
    #[serde(rename = "nick", default)]
    pub nickname: Option<String>,
    /// Vector of Ids of [`Role`]s given to the member.
    ///
    /// [`Role`]: https://discord.com/developers/docs/topics/permissions#role-object
    #[serde(default)]
    pub roles: Vec<RoleId>,
    /// Timestamp representing the date when the member joined.
    #[serde(default)]
    pub joined_at: Option<Timestamp>,
    /// The total permissions of the member in the channel the interaction came from, as the
    /// stringified bitset Discord sends.
    #[serde(default)]
    pub permissions: Option<String>,
    /// The unique Id of the guild that the member is a part of.
    ///
    /// Not part of the payload; filled in from the enclosing interaction.
    #[serde(skip)]
    pub guild_id: Option<GuildId>,
}

impl Member {
    /// Returns the nickname of the member if set, otherwise the user's display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or_else(|| self.user.display_name())
    }

    /// Returns a string which mentions the member.
    #[must_use]
    pub fn mention(&self) -> String {
        self.user.mention()
    }
}

/// Whoever invoked an interaction: a guild member when it happened inside a guild, a plain user
/// in direct messages.
#[derive(Clone, Debug)]
pub enum Target {
    User(User),
    Member(Box<Member>),
}

impl Target {
    /// The Id of the invoking user.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.user().id
    }

    /// The invoking user, unwrapping a member if needed.
    #[must_use]
    pub fn user(&self) -> &User {
        match self {
            Self::User(user) => user,
            Self::Member(member) => &member.user,
        }
    }

    #[must_use]
    pub fn member(&self) -> Option<&Member> {
        match self {
            Self::User(_) => None,
            Self::Member(member) => Some(member),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::User(user) => user.display_name(),
            Self::Member(member) => member.display_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn member_display_name_prefers_nickname() {
        let mut member: Member = serde_json::from_value(json!({
            "user": {"id": "80351110224678912", "username": "nelly", "global_name": "Nelly"},
            "nick": "NL",
            "roles": ["41771983423143936"],
        }))
        .unwrap();

        assert_eq!(member.display_name(), "NL");
        member.nickname = None;
        assert_eq!(member.display_name(), "Nelly");

        let target = Target::Member(Box::new(member));
        assert_eq!(target.id(), UserId::new(80351110224678912));
        assert_eq!(target.user().mention(), "<@80351110224678912>");
        assert!(target.member().is_some());
    }
}
