use std::error::Error as StdError;
use std::fmt;

use super::ReplyAction;

/// An error returned when responding to an interaction.
///
/// Precondition failures are raised before anything is sent, and are never retried.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The reply could not be changed because the interaction was not deferred or replied to
    /// first.
    NotAcknowledged(ReplyAction),
    /// The one-shot callback of this interaction was already sent, such as calling
    /// [`AutocompleteInteraction::suggest`] twice.
    ///
    /// [`AutocompleteInteraction::suggest`]: super::AutocompleteInteraction::suggest
    AlreadyResponded,
    /// The interaction token was rejected, usually because its 15 minute lifetime is over.
    Expired(Box<crate::Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAcknowledged(ReplyAction::Edit) => {
                f.write_str("Interaction must be acknowledged before editing the reply")
            },
            Self::NotAcknowledged(ReplyAction::Delete) => {
                f.write_str("Interaction must be acknowledged before deleting the reply")
            },
            Self::NotAcknowledged(ReplyAction::EditFollowUp(_)) => {
                f.write_str("Interaction must be acknowledged before editing a follow-up")
            },
            Self::NotAcknowledged(ReplyAction::DeleteFollowUp(_)) => {
                f.write_str("Interaction must be acknowledged before deleting a follow-up")
            },
            Self::NotAcknowledged(ReplyAction::FollowUp) => {
                f.write_str("Interaction must be acknowledged before sending a follow-up")
            },
            Self::NotAcknowledged(_) => f.write_str("Interaction must be acknowledged first"),
            Self::AlreadyResponded => f.write_str("Interaction was already responded to"),
            Self::Expired(_) => f.write_str("Interaction token expired or was rejected"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Expired(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

impl Error {
    /// Whether this error reports an expired interaction token.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired(_))
    }
}

/// Turns a webhook call that failed because the token is no longer accepted into
/// [`Error::Expired`]. Other failures are passed through.
pub(crate) fn expired_if_rejected(error: crate::Error) -> crate::Error {
    let rejected = matches!(
        &error,
        crate::Error::Http(crate::http::HttpError::UnsuccessfulRequest(response))
            if matches!(response.status_code.as_u16(), 401 | 404)
    );

    if rejected {
        crate::Error::Interaction(Error::Expired(Box::new(error)))
    } else {
        error
    }
}
