use std::sync::Arc;

use serde::Deserialize;

use super::acknowledgement::{ReplyAction, Responder};
use super::interaction::RawInteraction;
use super::ComponentType;
use crate::builder::CreateMessage;
use crate::http::Http;
use crate::internal::prelude::*;
use crate::model::channel::Message;
use crate::model::id::{ApplicationId, ChannelId, GuildId, InteractionId, MessageId};
use crate::model::user::Target;
use crate::model::ModelError;

/// An interaction triggered by a message component, such as a button click.
///
/// [Discord docs](https://discord.com/developers/docs/interactions/receiving-and-responding#interaction-object-interaction-structure).
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct ComponentInteraction {
    /// Id of the interaction.
    pub id: InteractionId,
    /// Id of the application this interaction is for.
    pub application_id: ApplicationId,
    /// The custom id of the clicked component.
    pub custom_id: String,
    /// The type of the clicked component.
    pub component_type: ComponentType,
    /// The Id of the message the component is attached to.
    pub message_id: Option<MessageId>,
    /// The invoking member, or user outside of guilds.
    pub target: Target,
    /// The guild Id this interaction was sent from, if there is one.
    pub guild_id: Option<GuildId>,
    /// The channel Id this interaction was sent from.
    pub channel_id: Option<ChannelId>,
    /// The selected language of the invoking user.
    pub locale: Option<String>,
    responder: Responder,
}

#[derive(Deserialize)]
struct RawComponentData {
    custom_id: String,
    component_type: ComponentType,
}

#[derive(Deserialize)]
struct RawMessageRef {
    id: MessageId,
}

impl ComponentInteraction {
    pub(crate) fn from_raw(mut raw: RawInteraction, http: &Arc<Http>) -> Result<Self> {
        let data: RawComponentData = raw.take_data()?;
        let message_id = raw.take_message::<RawMessageRef>()?.map(|message| message.id);
        let target = raw.take_target()?;

        Ok(Self {
            responder: raw.responder(http),
            id: raw.id,
            application_id: raw.application_id,
            custom_id: data.custom_id,
            component_type: data.component_type,
            message_id,
            target,
            guild_id: raw.guild_id,
            channel_id: raw.channel_id,
            locale: raw.locale,
        })
    }

    /// The HTTP client this interaction responds through.
    #[must_use]
    pub fn http(&self) -> &Arc<Http> {
        self.responder.http()
    }

    /// Whether the click was acknowledged, either by [`Self::acknowledge`] or by a reply.
    pub async fn is_acknowledged(&self) -> bool {
        self.responder.acknowledgement().is_acknowledged().await
    }

    /// Acknowledges the click without changing the message it came from.
    ///
    /// Sent at most once; later calls do nothing. Clicks handed out by the framework are already
    /// acknowledged.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Http`] if the callback was rejected.
    pub async fn acknowledge(&self) -> Result<()> {
        self.responder.run(ReplyAction::Acknowledge, None).await.map(|_| ())
    }

    /// Replies to the click with a new message, or with a follow-up once acknowledged.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Http`] if the callback was rejected, or [`InteractionError::Expired`]
    /// if a follow-up could not be created.
    ///
    /// [`InteractionError::Expired`]: super::InteractionError::Expired
    pub async fn send_reply(
        &self,
        message: impl Into<CreateMessage>,
        ephemeral: bool,
    ) -> Result<Option<Message>> {
        let message = message.into().ephemeral(ephemeral);
        self.responder.run(ReplyAction::Reply, Some(&message)).await
    }

    /// Sends a new message after the click was acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NotAcknowledged`] without sending anything if the click was
    /// not acknowledged.
    ///
    /// [`InteractionError::NotAcknowledged`]: super::InteractionError::NotAcknowledged
    pub async fn send_follow_up(
        &self,
        message: impl Into<CreateMessage>,
        ephemeral: bool,
    ) -> Result<Message> {
        let message = message.into().ephemeral(ephemeral);
        let sent = self.responder.run(ReplyAction::FollowUp, Some(&message)).await?;
        sent.ok_or_else(|| Error::Model(ModelError::MissingField("message")))
    }

    /// Edits the message the clicked component is attached to.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NotAcknowledged`] if the click was not acknowledged.
    ///
    /// [`InteractionError::NotAcknowledged`]: super::InteractionError::NotAcknowledged
    pub async fn edit_message(&self, message: impl Into<CreateMessage>) -> Result<Message> {
        let message = message.into();
        let edited = self.responder.run(ReplyAction::Edit, Some(&message)).await?;
        edited.ok_or_else(|| Error::Model(ModelError::MissingField("message")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::application::Interaction;
    use crate::model::id::UserId;

    #[test]
    fn decodes_button_click() {
        let payload = json!({
            "id": "846962681424216064",
            "application_id": "846962681424216065",
            "type": 3,
            "token": "aW50ZXJhY3Rpb24",
            "version": 1,
            "channel_id": "290926798626357999",
            "user": {"id": "53908232506183680", "username": "Mason"},
            "message": {"id": "846962681424216099", "channel_id": "290926798626357999"},
            "data": {"custom_id": "btn-a", "component_type": 2},
        });

        let http = Arc::new(Http::new("token"));
        let interaction = Interaction::decode(&serde_json::to_vec(&payload).unwrap(), &http)
            .unwrap()
            .unwrap()
            .component()
            .unwrap();

        assert_eq!(interaction.custom_id, "btn-a");
        assert_eq!(interaction.component_type, ComponentType::Button);
        assert_eq!(interaction.message_id, Some(MessageId::new(846962681424216099)));
        assert_eq!(interaction.target.id(), UserId::new(53908232506183680));
        assert!(interaction.target.member().is_none());
    }
}
