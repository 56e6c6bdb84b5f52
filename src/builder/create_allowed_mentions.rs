use serde::Serialize;

use crate::model::id::{RoleId, UserId};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseValue {
    Everyone,
    Users,
    Roles,
}

/// A builder to manage the allowed mentions on a message.
///
/// ```rust
/// use tempest::builder::{CreateAllowedMentions as Am, ParseValue};
///
/// // Mention all roles and the user 110372470472613888, but not everyone
/// let mentions = Am::new().parse(ParseValue::Roles).users(vec![110372470472613888.into()]);
/// ```
///
/// [Discord docs](https://discord.com/developers/docs/resources/channel#allowed-mentions-object).
#[derive(Clone, Debug, Default, Serialize)]
#[must_use]
pub struct CreateAllowedMentions {
    parse: Vec<ParseValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    users: Vec<UserId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    roles: Vec<RoleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replied_user: Option<bool>,
}

impl CreateAllowedMentions {
    /// Equivalent to [`Self::default`], which allows no mentions at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value that's allowed to be mentioned.
    ///
    /// If users or roles is specified, [`Self::users`] and [`Self::roles`] cannot be used.
    pub fn parse(mut self, value: ParseValue) -> Self {
        if !self.parse.contains(&value) {
            self.parse.push(value);
        }
        self
    }

    /// Sets the users that will be allowed to be mentioned.
    pub fn users(mut self, users: Vec<UserId>) -> Self {
        self.users = users;
        self
    }

    /// Sets the roles that will be allowed to be mentioned.
    pub fn roles(mut self, roles: Vec<RoleId>) -> Self {
        self.roles = roles;
        self
    }

    /// Makes the reply mention/ping the user.
    pub fn replied_user(mut self, mention_user: bool) -> Self {
        self.replied_user = Some(mention_user);
        self
    }
}
