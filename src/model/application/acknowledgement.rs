//! The one-shot acknowledgement state machine shared by every reply-family operation of an
//! interaction.
//!
//! Discord accepts exactly one callback per interaction, within three seconds of receiving it.
//! Everything after that (edits, deletions, further messages) goes through the interaction's
//! webhook, which stays usable for [15 minutes] and only once the callback was sent.
//!
//! [`Acknowledgement::plan`] is the pure transition function; [`Acknowledgement`] itself holds the
//! flag behind an async mutex that stays locked across the wire call, so replies to one
//! interaction are strictly ordered and the flag flips at most once.
//!
//! [15 minutes]: crate::constants::INTERACTION_TOKEN_LIFETIME

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::error::expired_if_rejected;
use super::{InteractionCredentials, InteractionError, InteractionResponseType};
use crate::builder::CreateMessage;
use crate::http::Http;
use crate::internal::prelude::*;
use crate::model::channel::Message;
use crate::model::id::MessageId;

/// A reply-family operation requested by a handler.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ReplyAction {
    /// Show a "thinking" state, to reply later.
    Defer,
    /// Answer with a message; a follow-up once acknowledged.
    Reply,
    /// Edit the original response.
    Edit,
    /// Delete the original response.
    Delete,
    /// Send an additional message.
    FollowUp,
    /// Edit a follow-up message.
    EditFollowUp(MessageId),
    /// Delete a follow-up message.
    DeleteFollowUp(MessageId),
    /// Acknowledge a component click without changing its message.
    Acknowledge,
    /// Answer an autocomplete request with choices.
    Suggest,
}

/// What has to be sent over the wire to carry out a [`ReplyAction`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// Send the interaction callback of the given type. Acknowledges the interaction.
    Callback(InteractionResponseType),
    /// Create a new message through the interaction webhook.
    FollowUp,
    /// Patch the original response.
    EditOriginal,
    /// Delete the original response.
    DeleteOriginal,
    /// Patch a follow-up message.
    EditFollowUp(MessageId),
    /// Delete a follow-up message.
    DeleteFollowUp(MessageId),
    /// Nothing to send.
    Skip,
}

/// Per-interaction acknowledgement record.
///
/// Created unacknowledged alongside its interaction, and shared by every clone of it.
#[derive(Debug, Default)]
pub struct Acknowledgement {
    acknowledged: Mutex<bool>,
}

impl Acknowledgement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides how to carry out `action` given the current state.
    ///
    /// A [`Step::Callback`] is the only step that acknowledges the interaction; callers flip the
    /// flag once it was delivered.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NotAcknowledged`] when editing, deleting or following up on an
    /// unacknowledged interaction, and [`InteractionError::AlreadyResponded`] when suggesting
    /// twice.
    pub fn plan(acknowledged: bool, action: ReplyAction) -> Result<Step, InteractionError> {
        use InteractionResponseType as Kind;

        Ok(match (action, acknowledged) {
            (ReplyAction::Defer, false) => Step::Callback(Kind::DeferredChannelMessageWithSource),
            (ReplyAction::Reply, false) => Step::Callback(Kind::ChannelMessageWithSource),
            (ReplyAction::Acknowledge, false) => Step::Callback(Kind::DeferredUpdateMessage),
            (ReplyAction::Suggest, false) => Step::Callback(Kind::Autocomplete),
            (ReplyAction::Defer | ReplyAction::Acknowledge, true) => Step::Skip,
            (ReplyAction::Reply | ReplyAction::FollowUp, true) => Step::FollowUp,
            (ReplyAction::Edit, true) => Step::EditOriginal,
            (ReplyAction::Delete, true) => Step::DeleteOriginal,
            (ReplyAction::EditFollowUp(message_id), true) => Step::EditFollowUp(message_id),
            (ReplyAction::DeleteFollowUp(message_id), true) => Step::DeleteFollowUp(message_id),
            (ReplyAction::Suggest, true) => return Err(InteractionError::AlreadyResponded),
            (
                action @ (ReplyAction::Edit
                | ReplyAction::Delete
                | ReplyAction::FollowUp
                | ReplyAction::EditFollowUp(_)
                | ReplyAction::DeleteFollowUp(_)),
                false,
            ) => return Err(InteractionError::NotAcknowledged(action)),
        })
    }

    /// Whether the callback for this interaction was sent.
    ///
    /// Waits for any reply in flight to finish.
    pub async fn is_acknowledged(&self) -> bool {
        *self.acknowledged.lock().await
    }
}

#[derive(Serialize)]
struct Callback<'a, T: Serialize> {
    #[serde(rename = "type")]
    kind: InteractionResponseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
}

/// The "respond" capability bound to one interaction: its credentials, the shared acknowledgement
/// record and the HTTP client every step goes through.
#[derive(Clone)]
pub(crate) struct Responder {
    http: Arc<Http>,
    credentials: InteractionCredentials,
    acknowledgement: Arc<Acknowledgement>,
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("credentials", &self.credentials)
            .field("acknowledgement", &self.acknowledgement)
            .finish_non_exhaustive()
    }
}

impl Responder {
    pub(crate) fn new(http: Arc<Http>, credentials: InteractionCredentials) -> Self {
        Self {
            http,
            credentials,
            acknowledgement: Arc::new(Acknowledgement::new()),
        }
    }

    pub(crate) fn http(&self) -> &Arc<Http> {
        &self.http
    }

    pub(crate) fn acknowledgement(&self) -> &Acknowledgement {
        &self.acknowledgement
    }

    /// Carries out a reply-family action carrying an optional message.
    pub(crate) async fn run(
        &self,
        action: ReplyAction,
        message: Option<&CreateMessage>,
    ) -> Result<Option<Message>> {
        self.run_with(action, message).await
    }

    #[cfg_attr(feature = "tracing_instrument", tracing::instrument(skip(self, data)))]
    pub(crate) async fn run_with<T: Serialize>(
        &self,
        action: ReplyAction,
        data: Option<&T>,
    ) -> Result<Option<Message>> {
        let InteractionCredentials {
            id,
            application_id,
            token,
        } = &self.credentials;
        let token = token.expose_secret();

        let mut acknowledged = self.acknowledgement.acknowledged.lock().await;

        match Acknowledgement::plan(*acknowledged, action)? {
            Step::Skip => Ok(None),
            Step::Callback(kind) => {
                let callback = Callback {
                    kind,
                    data,
                };
                self.http.create_interaction_response(*id, token, &callback).await?;
                *acknowledged = true;
                debug!("Sent {kind:?} callback for interaction {id}");

                Ok(None)
            },
            Step::FollowUp => {
                let message = self.http.create_followup_message(*application_id, token, &data);
                match message.await {
                    Ok(message) => Ok(Some(message)),
                    Err(why) if action == ReplyAction::Reply => {
                        debug!("Follow-up reply to interaction {id} failed: {why:?}");
                        Err(InteractionError::Expired(Box::new(why)).into())
                    },
                    Err(why) => Err(expired_if_rejected(why)),
                }
            },
            Step::EditOriginal => self
                .http
                .edit_original_interaction_response(*application_id, token, &data)
                .await
                .map(Some)
                .map_err(expired_if_rejected),
            Step::DeleteOriginal => self
                .http
                .delete_original_interaction_response(*application_id, token)
                .await
                .map(|()| None)
                .map_err(expired_if_rejected),
            Step::EditFollowUp(message_id) => self
                .http
                .edit_followup_message(*application_id, token, message_id, &data)
                .await
                .map(Some)
                .map_err(expired_if_rejected),
            Step::DeleteFollowUp(message_id) => self
                .http
                .delete_followup_message(*application_id, token, message_id)
                .await
                .map(|()| None)
                .map_err(expired_if_rejected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_before_acknowledgement() {
        use InteractionResponseType as Kind;

        assert_eq!(
            Acknowledgement::plan(false, ReplyAction::Defer).unwrap(),
            Step::Callback(Kind::DeferredChannelMessageWithSource)
        );
        assert_eq!(
            Acknowledgement::plan(false, ReplyAction::Reply).unwrap(),
            Step::Callback(Kind::ChannelMessageWithSource)
        );
        assert_eq!(
            Acknowledgement::plan(false, ReplyAction::Acknowledge).unwrap(),
            Step::Callback(Kind::DeferredUpdateMessage)
        );
        assert_eq!(
            Acknowledgement::plan(false, ReplyAction::Suggest).unwrap(),
            Step::Callback(Kind::Autocomplete)
        );

        let unacknowledged = [
            ReplyAction::Edit,
            ReplyAction::Delete,
            ReplyAction::FollowUp,
            ReplyAction::EditFollowUp(MessageId::new(5)),
            ReplyAction::DeleteFollowUp(MessageId::new(5)),
        ];
        for action in unacknowledged {
            assert!(matches!(
                Acknowledgement::plan(false, action),
                Err(InteractionError::NotAcknowledged(a)) if a == action
            ));
        }
    }

    #[test]
    fn plan_after_acknowledgement() {
        assert_eq!(Acknowledgement::plan(true, ReplyAction::Defer).unwrap(), Step::Skip);
        assert_eq!(Acknowledgement::plan(true, ReplyAction::Acknowledge).unwrap(), Step::Skip);
        assert_eq!(Acknowledgement::plan(true, ReplyAction::Reply).unwrap(), Step::FollowUp);
        assert_eq!(Acknowledgement::plan(true, ReplyAction::FollowUp).unwrap(), Step::FollowUp);
        assert_eq!(Acknowledgement::plan(true, ReplyAction::Edit).unwrap(), Step::EditOriginal);
        assert_eq!(Acknowledgement::plan(true, ReplyAction::Delete).unwrap(), Step::DeleteOriginal);
        let message_id = MessageId::new(5);
        assert_eq!(
            Acknowledgement::plan(true, ReplyAction::EditFollowUp(message_id)).unwrap(),
            Step::EditFollowUp(message_id)
        );
        assert_eq!(
            Acknowledgement::plan(true, ReplyAction::DeleteFollowUp(message_id)).unwrap(),
            Step::DeleteFollowUp(message_id)
        );
        assert!(matches!(
            Acknowledgement::plan(true, ReplyAction::Suggest),
            Err(InteractionError::AlreadyResponded)
        ));
    }

    #[test]
    fn precondition_messages() {
        let edit = InteractionError::NotAcknowledged(ReplyAction::Edit);
        assert_eq!(edit.to_string(), "Interaction must be acknowledged before editing the reply");

        let message_id = MessageId::new(5);
        let edit = InteractionError::NotAcknowledged(ReplyAction::EditFollowUp(message_id));
        assert_eq!(edit.to_string(), "Interaction must be acknowledged before editing a follow-up");
        let delete = InteractionError::NotAcknowledged(ReplyAction::DeleteFollowUp(message_id));
        assert_eq!(
            delete.to_string(),
            "Interaction must be acknowledged before deleting a follow-up"
        );
        let send = InteractionError::NotAcknowledged(ReplyAction::FollowUp);
        assert_eq!(send.to_string(), "Interaction must be acknowledged before sending a follow-up");
    }

    #[tokio::test]
    async fn starts_unacknowledged() {
        assert!(!Acknowledgement::new().is_acknowledged().await);
    }
}
