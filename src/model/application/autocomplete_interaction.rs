use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use super::acknowledgement::{ReplyAction, Responder};
use super::interaction::{Invocation, RawCommandDataOption, RawInteraction};
use super::{CommandOptionType, CommandOptionValue};
use crate::builder::{AutocompleteChoice, CreateAutocompleteResponse};
use crate::http::Http;
use crate::internal::prelude::*;
use crate::model::id::{ApplicationId, ChannelId, CommandId, GuildId, InteractionId};
use crate::model::user::Target;
use crate::model::ModelError;

/// An interaction received while a user types into an option with autocomplete enabled.
///
/// [Discord docs](https://discord.com/developers/docs/interactions/application-commands#autocomplete).
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct AutocompleteInteraction {
    /// Id of the interaction.
    pub id: InteractionId,
    /// Id of the application this interaction is for.
    pub application_id: ApplicationId,
    /// The Id of the command being typed.
    pub command_id: CommandId,
    /// The name of the command being typed.
    pub command_name: String,
    /// The subcommand group being typed, if any.
    pub subcommand_group: Option<String>,
    /// The subcommand being typed, if any.
    pub subcommand_name: Option<String>,
    /// The option the user is currently typing into.
    pub focused: FocusedOption,
    /// The other options already filled in. Values that don't decode yet are left out.
    pub options: HashMap<String, CommandOptionValue>,
    /// The typing member, or user outside of guilds.
    pub target: Target,
    /// The guild Id this interaction was sent from, if there is one.
    pub guild_id: Option<GuildId>,
    /// The channel Id this interaction was sent from.
    pub channel_id: Option<ChannelId>,
    /// The selected language of the invoking user.
    pub locale: Option<String>,
    responder: Responder,
}

/// The option an autocomplete interaction was sent for.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct FocusedOption {
    /// Name of the option.
    pub name: String,
    /// The declared type of the option.
    pub kind: CommandOptionType,
    /// What the user typed so far. Always text, whatever the option type.
    pub value: String,
}

#[derive(Deserialize)]
struct RawAutocompleteData {
    id: CommandId,
    name: String,
    #[serde(default)]
    options: Vec<RawCommandDataOption>,
}

impl AutocompleteInteraction {
    pub(crate) fn from_raw(mut raw: RawInteraction, http: &Arc<Http>) -> Result<Self> {
        let data: RawAutocompleteData = raw.take_data()?;
        let target = raw.take_target()?;
        let invocation = Invocation::resolve(data.options);

        let mut focused = None;
        let mut options = HashMap::new();
        for option in invocation.options {
            if option.focused && focused.is_none() {
                focused = Some(FocusedOption {
                    value: typed_text(option.value),
                    name: option.name,
                    kind: option.kind,
                });
            } else if let Ok(value) =
                CommandOptionValue::parse(&option.name, option.kind, option.value)
            {
                options.insert(option.name, value);
            }
        }

        Ok(Self {
            responder: raw.responder(http),
            id: raw.id,
            application_id: raw.application_id,
            command_id: data.id,
            command_name: data.name,
            subcommand_group: invocation.subcommand_group,
            subcommand_name: invocation.subcommand_name,
            focused: focused.ok_or(ModelError::MissingField("focused option"))?,
            options,
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

    /// Answers with the choices to show the user. Only the first 25 are sent.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::AlreadyResponded`] if choices were already suggested, or an
    /// [`Error::Http`] if the callback was rejected.
    ///
    /// [`InteractionError::AlreadyResponded`]: super::InteractionError::AlreadyResponded
    pub async fn suggest(&self, choices: Vec<AutocompleteChoice>) -> Result<()> {
        let response = CreateAutocompleteResponse::new().set_choices(choices);
        self.responder.run_with(ReplyAction::Suggest, Some(&response)).await.map(|_| ())
    }
}

fn typed_text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(text)) => text,
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}
