use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use super::acknowledgement::Responder;
use super::{
    AutocompleteInteraction,
    CommandInteraction,
    CommandOptionType,
    ComponentInteraction,
    PingInteraction,
};
use crate::http::Http;
use crate::internal::prelude::*;
use crate::model::id::{ApplicationId, ChannelId, GuildId, InteractionId};
use crate::model::user::{Member, Target, User};
use crate::model::ModelError;

enum_number! {
    /// The type of an Interaction.
    ///
    /// [Discord docs](https://discord.com/developers/docs/interactions/receiving-and-responding#interaction-object-interaction-type).
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    #[non_exhaustive]
    pub enum InteractionType {
        Ping = 1,
        Command = 2,
        Component = 3,
        Autocomplete = 4,
        Modal = 5,
        _ => Unknown(u8),
    }
}

enum_number! {
    /// The type of an interaction callback.
    ///
    /// [Discord docs](https://discord.com/developers/docs/interactions/receiving-and-responding#interaction-response-object-interaction-callback-type).
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    #[non_exhaustive]
    pub enum InteractionResponseType {
        Pong = 1,
        ChannelMessageWithSource = 4,
        DeferredChannelMessageWithSource = 5,
        DeferredUpdateMessage = 6,
        UpdateMessage = 7,
        Autocomplete = 8,
        Modal = 9,
        _ => Unknown(u8),
    }
}

/// The secrets an interaction is answered with: its id, the id of the application it belongs to
/// and its continuation token.
#[derive(Clone, Debug)]
pub struct InteractionCredentials {
    pub id: InteractionId,
    pub application_id: ApplicationId,
    pub token: SecretString,
}

/// A decoded interaction, one variant per interaction type the framework handles.
///
/// [Discord docs](https://discord.com/developers/docs/interactions/receiving-and-responding#interaction-object)
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Interaction {
    Ping(PingInteraction),
    Command(CommandInteraction),
    Component(ComponentInteraction),
    Autocomplete(AutocompleteInteraction),
}

impl Interaction {
    /// Decodes a raw, already verified, request body.
    ///
    /// Every variant except [`Self::Ping`] gets its respond capability bound to `http`. Interaction
    /// types the framework doesn't handle are logged and yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed JSON or missing fields, and [`Error::Model`] when the
    /// payload is well-formed but inconsistent, such as an option value not matching its type.
    pub fn decode(body: &[u8], http: &Arc<Http>) -> Result<Option<Self>> {
        let Discriminant {
            kind,
        } = serde_json::from_slice(body)?;

        Ok(Some(match kind {
            InteractionType::Ping => {
                let raw: RawPing = serde_json::from_slice(body)?;
                Self::Ping(PingInteraction {
                    id: raw.id,
                    application_id: raw.application_id,
                })
            },
            InteractionType::Command => {
                Self::Command(CommandInteraction::from_raw(serde_json::from_slice(body)?, http)?)
            },
            InteractionType::Component => {
                Self::Component(ComponentInteraction::from_raw(serde_json::from_slice(body)?, http)?)
            },
            InteractionType::Autocomplete => Self::Autocomplete(AutocompleteInteraction::from_raw(
                serde_json::from_slice(body)?,
                http,
            )?),
            kind => {
                info!("Ignoring interaction of unhandled type {kind:?}");
                return Ok(None);
            },
        }))
    }

    /// Gets the interaction Id. Pings may come without one.
    #[must_use]
    pub fn id(&self) -> Option<InteractionId> {
        match self {
            Self::Ping(i) => i.id,
            Self::Command(i) => Some(i.id),
            Self::Component(i) => Some(i.id),
            Self::Autocomplete(i) => Some(i.id),
        }
    }

    /// Gets the interaction type
    #[must_use]
    pub fn kind(&self) -> InteractionType {
        match self {
            Self::Ping(_) => InteractionType::Ping,
            Self::Command(_) => InteractionType::Command,
            Self::Component(_) => InteractionType::Component,
            Self::Autocomplete(_) => InteractionType::Autocomplete,
        }
    }

    /// Converts this to a [`CommandInteraction`]
    #[must_use]
    pub fn command(self) -> Option<CommandInteraction> {
        match self {
            Self::Command(i) => Some(i),
            _ => None,
        }
    }

    /// Converts this to a [`ComponentInteraction`]
    #[must_use]
    pub fn component(self) -> Option<ComponentInteraction> {
        match self {
            Self::Component(i) => Some(i),
            _ => None,
        }
    }

    /// Converts this to an [`AutocompleteInteraction`]
    #[must_use]
    pub fn autocomplete(self) -> Option<AutocompleteInteraction> {
        match self {
            Self::Autocomplete(i) => Some(i),
            _ => None,
        }
    }
}

/// Only the type, read before anything else so pings decode whatever else they carry.
#[derive(Deserialize)]
struct Discriminant {
    #[serde(rename = "type")]
    kind: InteractionType,
}

#[derive(Deserialize)]
struct RawPing {
    id: Option<InteractionId>,
    application_id: Option<ApplicationId>,
}

/// The envelope shared by all interaction types. `data` is decoded per type.
#[derive(Deserialize)]
pub(crate) struct RawInteraction {
    pub(crate) id: InteractionId,
    pub(crate) application_id: ApplicationId,
    token: String,
    data: Option<Value>,
    pub(crate) guild_id: Option<GuildId>,
    pub(crate) channel_id: Option<ChannelId>,
    member: Option<Member>,
    user: Option<User>,
    message: Option<Value>,
    pub(crate) locale: Option<String>,
    pub(crate) guild_locale: Option<String>,
}

impl RawInteraction {
    pub(crate) fn responder(&self, http: &Arc<Http>) -> Responder {
        let credentials = InteractionCredentials {
            id: self.id,
            application_id: self.application_id,
            token: SecretString::from(self.token.as_str()),
        };

        Responder::new(Arc::clone(http), credentials)
    }

    /// The invoking member inside guilds, with its guild id filled in, or the invoking user.
    pub(crate) fn take_target(&mut self) -> Result<Target, ModelError> {
        if let Some(mut member) = self.member.take() {
            member.guild_id = self.guild_id;
            return Ok(Target::Member(Box::new(member)));
        }

        self.user.take().map(Target::User).ok_or(ModelError::MissingTarget)
    }

    pub(crate) fn take_data<T: DeserializeOwned>(&mut self) -> Result<T> {
        let data = self.data.take().ok_or(ModelError::MissingField("data"))?;
        serde_json::from_value(data).map_err(Error::from)
    }

    /// The message a component is attached to, decoded only as far as `T` asks.
    pub(crate) fn take_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        self.message.take().map(serde_json::from_value).transpose().map_err(Error::from)
    }
}

/// An option of an invocation as sent by Discord, either carrying a value or nesting further
/// options when it is a subcommand or group.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RawCommandDataOption {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) kind: CommandOptionType,
    pub(crate) value: Option<Value>,
    #[serde(default)]
    pub(crate) options: Vec<RawCommandDataOption>,
    #[serde(default)]
    pub(crate) focused: bool,
}

/// The command name path of an invocation, with the options of the innermost level.
#[derive(Debug, Default)]
pub(crate) struct Invocation {
    pub(crate) subcommand_group: Option<String>,
    pub(crate) subcommand_name: Option<String>,
    pub(crate) options: Vec<RawCommandDataOption>,
}

impl Invocation {
    /// Unwraps a leading subcommand group and subcommand.
    pub(crate) fn resolve(mut options: Vec<RawCommandDataOption>) -> Self {
        fn descend(
            options: &mut Vec<RawCommandDataOption>,
            kind: CommandOptionType,
        ) -> Option<String> {
            if options.first().map(|option| option.kind) != Some(kind) {
                return None;
            }

            let nested = options.remove(0);
            *options = nested.options;
            Some(nested.name)
        }

        let subcommand_group = descend(&mut options, CommandOptionType::SubCommandGroup);
        let subcommand_name = descend(&mut options, CommandOptionType::SubCommand);

        Self {
            subcommand_group,
            subcommand_name,
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn option(value: Value) -> RawCommandDataOption {
        serde_json::from_value(value).unwrap()
    }

    fn decode(body: &[u8]) -> Result<Option<Interaction>> {
        Interaction::decode(body, &Arc::new(Http::new("token")))
    }

    #[test]
    fn bare_ping_decodes() {
        let ping = decode(br#"{"type":1}"#).unwrap().unwrap();
        assert_eq!(ping.kind(), InteractionType::Ping);
        assert_eq!(ping.id(), None);

        let ping = decode(br#"{"id":"3","application_id":"2","type":1,"token":"t"}"#).unwrap();
        assert_eq!(ping.unwrap().id(), Some(InteractionId::new(3)));
    }

    #[test]
    fn unhandled_types_need_only_a_type() {
        assert!(decode(br#"{"type":5}"#).unwrap().is_none());
        assert!(matches!(decode(br#"{"type":2}"#), Err(Error::Json(_))));
        assert!(matches!(decode(br#"{"id":"1"}"#), Err(Error::Json(_))));
    }

    #[test]
    fn invocation_unwraps_subcommands() {
        let options = vec![option(json!({
            "name": "sub",
            "type": 1,
            "options": [{"name": "query", "type": 3, "value": "par"}],
        }))];
        let invocation = Invocation::resolve(options);

        assert_eq!(invocation.subcommand_group, None);
        assert_eq!(invocation.subcommand_name.as_deref(), Some("sub"));
        assert_eq!(invocation.options.len(), 1);
        assert_eq!(invocation.options[0].name, "query");
    }

    #[test]
    fn invocation_unwraps_groups() {
        let options = vec![option(json!({
            "name": "group",
            "type": 2,
            "options": [{"name": "sub", "type": 1}],
        }))];
        let invocation = Invocation::resolve(options);

        assert_eq!(invocation.subcommand_group.as_deref(), Some("group"));
        assert_eq!(invocation.subcommand_name.as_deref(), Some("sub"));
        assert!(invocation.options.is_empty());
    }

    #[test]
    fn invocation_without_subcommand() {
        let options = vec![option(json!({"name": "count", "type": 4, "value": 3}))];
        let invocation = Invocation::resolve(options);

        assert_eq!(invocation.subcommand_name, None);
        assert_eq!(invocation.options.len(), 1);
    }
}
