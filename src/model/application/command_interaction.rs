use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use super::acknowledgement::{Acknowledgement, ReplyAction, Responder};
use super::interaction::{Invocation, RawCommandDataOption, RawInteraction};
use super::CommandOptionType;
use crate::builder::CreateMessage;
use crate::http::Http;
use crate::internal::prelude::*;
use crate::model::channel::Message;
use crate::model::id::{
    ApplicationId,
    AttachmentId,
    ChannelId,
    CommandId,
    GenericId,
    GuildId,
    InteractionId,
    MessageId,
    RoleId,
    UserId,
};
use crate::model::user::Target;
use crate::model::ModelError;

/// An interaction when a user invokes a slash command.
///
/// Replies go through the one-shot acknowledgement state machine: the first of [`Self::defer`]
/// and [`Self::send_reply`] sends the interaction callback, every other reply-family method
/// requires that to have happened. Clones share the same acknowledgement state.
///
/// [Discord docs](https://discord.com/developers/docs/interactions/receiving-and-responding#interaction-object).
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct CommandInteraction {
    /// Id of the interaction.
    pub id: InteractionId,
    /// Id of the application this interaction is for.
    pub application_id: ApplicationId,
    /// The Id of the invoked command.
    pub command_id: CommandId,
    /// The name of the invoked command.
    pub command_name: String,
    /// The subcommand group the invoked subcommand belongs to, if any.
    pub subcommand_group: Option<String>,
    /// The invoked subcommand, if any.
    pub subcommand_name: Option<String>,
    /// The values given for the options of the invoked command or subcommand, by option name.
    pub options: HashMap<String, CommandOptionValue>,
    /// The invoking member, or user outside of guilds.
    pub target: Target,
    /// The guild Id this interaction was sent from, if there is one.
    pub guild_id: Option<GuildId>,
    /// The channel Id this interaction was sent from.
    pub channel_id: Option<ChannelId>,
    /// The selected language of the invoking user.
    pub locale: Option<String>,
    /// The guild's preferred locale.
    pub guild_locale: Option<String>,
    responder: Responder,
}

#[derive(Deserialize)]
struct RawCommandData {
    id: CommandId,
    name: String,
    #[serde(default)]
    options: Vec<RawCommandDataOption>,
}

impl CommandInteraction {
    pub(crate) fn from_raw(mut raw: RawInteraction, http: &Arc<Http>) -> Result<Self> {
        let data: RawCommandData = raw.take_data()?;
        let target = raw.take_target()?;
        let invocation = Invocation::resolve(data.options);

        let options = invocation
            .options
            .into_iter()
            .map(|option| {
                let value = CommandOptionValue::parse(&option.name, option.kind, option.value)?;
                Ok((option.name, value))
            })
            .collect::<StdResult<_, ModelError>>()?;

        Ok(Self {
            responder: raw.responder(http),
            id: raw.id,
            application_id: raw.application_id,
            command_id: data.id,
            command_name: data.name,
            subcommand_group: invocation.subcommand_group,
            subcommand_name: invocation.subcommand_name,
            options,
            target,
            guild_id: raw.guild_id,
            channel_id: raw.channel_id,
            locale: raw.locale,
            guild_locale: raw.guild_locale,
        })
    }

    /// A value unique to this interaction, suitable as a seed for the custom ids of buttons sent
    /// in reply so concurrent invocations don't share button ids.
    #[must_use]
    pub fn secret(&self) -> String {
        self.id.to_string()
    }

    /// Gets the value given for an option of the invoked command.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&CommandOptionValue> {
        self.options.get(name)
    }

    /// The HTTP client this interaction responds through.
    #[must_use]
    pub fn http(&self) -> &Arc<Http> {
        self.responder.http()
    }

    /// Whether the interaction was deferred or replied to.
    pub async fn is_acknowledged(&self) -> bool {
        self.acknowledgement().is_acknowledged().await
    }

    fn acknowledgement(&self) -> &Acknowledgement {
        self.responder.acknowledgement()
    }

    /// Acknowledges the interaction, showing a "thinking" state until the reply is edited.
    ///
    /// Does nothing if the interaction was already acknowledged.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Http`] if the callback was rejected.
    pub async fn defer(&self, ephemeral: bool) -> Result<()> {
        let data = ephemeral.then(|| CreateMessage::new().ephemeral(true));
        self.responder.run(ReplyAction::Defer, data.as_ref()).await.map(|_| ())
    }

    /// Replies to the interaction. The first reply acknowledges it; once acknowledged, each call
    /// sends an additional follow-up message.
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

    /// Edits the original response.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NotAcknowledged`] without sending anything if the interaction
    /// was neither deferred nor replied to.
    ///
    /// [`InteractionError::NotAcknowledged`]: super::InteractionError::NotAcknowledged
    pub async fn edit_reply(
        &self,
        message: impl Into<CreateMessage>,
        ephemeral: bool,
    ) -> Result<Message> {
        let message = message.into().ephemeral(ephemeral);
        let edited = self.responder.run(ReplyAction::Edit, Some(&message)).await?;
        edited.ok_or_else(|| Error::Model(ModelError::MissingField("message")))
    }

    /// Deletes the original response.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NotAcknowledged`] without sending anything if the interaction
    /// was neither deferred nor replied to.
    ///
    /// [`InteractionError::NotAcknowledged`]: super::InteractionError::NotAcknowledged
    pub async fn delete_reply(&self) -> Result<()> {
        self.responder.run(ReplyAction::Delete, None).await.map(|_| ())
    }

    /// Sends a new message after the interaction was acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NotAcknowledged`] without sending anything if the interaction
    /// was neither deferred nor replied to.
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

    /// Edits a message previously sent with [`Self::send_follow_up`].
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NotAcknowledged`] if the interaction was never acknowledged.
    ///
    /// [`InteractionError::NotAcknowledged`]: super::InteractionError::NotAcknowledged
    pub async fn edit_follow_up(
        &self,
        message_id: MessageId,
        message: impl Into<CreateMessage>,
    ) -> Result<Message> {
        let message = message.into();
        let action = ReplyAction::EditFollowUp(message_id);
        let edited = self.responder.run(action, Some(&message)).await?;
        edited.ok_or_else(|| Error::Model(ModelError::MissingField("message")))
    }

    /// Deletes a message previously sent with [`Self::send_follow_up`].
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NotAcknowledged`] if the interaction was never acknowledged.
    ///
    /// [`InteractionError::NotAcknowledged`]: super::InteractionError::NotAcknowledged
    pub async fn delete_follow_up(&self, message_id: MessageId) -> Result<()> {
        self.responder.run(ReplyAction::DeleteFollowUp(message_id), None).await.map(|_| ())
    }
}

/// The value given for an option of an invoked command.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum CommandOptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(UserId),
    Channel(ChannelId),
    Role(RoleId),
    Mentionable(GenericId),
    Attachment(AttachmentId),
    Unknown(Value),
}

impl CommandOptionValue {
    /// Decodes a value according to its declared option type.
    pub(crate) fn parse(
        name: &str,
        kind: CommandOptionType,
        value: Option<Value>,
    ) -> StdResult<Self, ModelError> {
        let invalid = || ModelError::InvalidOptionValue {
            name: name.to_owned(),
        };

        macro_rules! value {
            () => {
                serde_json::from_value(value.ok_or_else(invalid)?).map_err(|_| invalid())?
            };
        }

        Ok(match kind {
            CommandOptionType::String => Self::String(value!()),
            CommandOptionType::Integer => Self::Integer(value!()),
            CommandOptionType::Number => Self::Number(value!()),
            CommandOptionType::Boolean => Self::Boolean(value!()),
            CommandOptionType::User => Self::User(value!()),
            CommandOptionType::Channel => Self::Channel(value!()),
            CommandOptionType::Role => Self::Role(value!()),
            CommandOptionType::Mentionable => Self::Mentionable(value!()),
            CommandOptionType::Attachment => Self::Attachment(value!()),
            _ => Self::Unknown(value.unwrap_or(Value::Null)),
        })
    }

    /// If the value is a string, returns it.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is an integer, returns it.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// If the value is a number, or an integer, returns it as a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// If the value is a boolean, returns it.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a user, returns its Id.
    #[must_use]
    pub fn as_user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            _ => None,
        }
    }

    /// If the value is a channel, returns its Id.
    #[must_use]
    pub fn as_channel_id(&self) -> Option<ChannelId> {
        match self {
            Self::Channel(id) => Some(*id),
            _ => None,
        }
    }

    /// If the value is a role, returns its Id.
    #[must_use]
    pub fn as_role_id(&self) -> Option<RoleId> {
        match self {
            Self::Role(id) => Some(*id),
            _ => None,
        }
    }
}
