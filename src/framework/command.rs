use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use futures::future::BoxFuture;
use regex::Regex;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::CommandError;
use crate::client::Context;
use crate::constants;
use crate::internal::prelude::*;
use crate::model::application::{
    AutocompleteInteraction,
    ChannelType,
    CommandInteraction,
    CommandOptionType,
    CommandType,
};

/// The future returned by command and autocomplete functions.
pub type CommandFuture = BoxFuture<'static, Result<()>>;

type ExecuteFn = dyn Fn(Context, CommandInteraction) -> CommandFuture + Send + Sync;
type AutocompleteFn = dyn Fn(Context, AutocompleteInteraction) -> CommandFuture + Send + Sync;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[-_\p{L}\p{N}\p{Devanagari}\p{Thai}]{1,32}$")
            .expect("command name pattern is valid")
    })
}

/// A slash command, or a subcommand of one.
///
/// [`Self::name`] and [`Self::description`] are required. A command either declares options or,
/// once registered, groups subcommands; never both.
///
/// [Discord docs](https://discord.com/developers/docs/interactions/application-commands#application-command-object).
#[derive(Clone)]
#[must_use]
pub struct Command {
    pub(super) name: String,
    pub(super) description: String,
    pub(super) options: Vec<CommandOption>,
    pub(super) subcommands: BTreeMap<String, Arc<Command>>,
    execute: Option<Arc<ExecuteFn>>,
    autocomplete: Option<Arc<AutocompleteFn>>,
}

impl Command {
    /// Creates a command with the given name and description, without options or functions.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            subcommands: BTreeMap::new(),
            execute: None,
            autocomplete: None,
        }
    }

    /// Sets the description, replacing the current value as set in [`Self::new`].
    ///
    /// **Note**: Must be between 1 and 100 characters.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds an option the user is prompted for.
    ///
    /// **Note**: A command can have no more than 25 options.
    pub fn add_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    /// Sets all the options, replacing the existing ones.
    pub fn set_options(mut self, options: Vec<CommandOption>) -> Self {
        self.options = options;
        self
    }

    /// Sets the function run when the command is invoked.
    pub fn execute<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, CommandInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.execute = Some(Arc::new(
            move |ctx: Context, interaction: CommandInteraction| -> CommandFuture {
                Box::pin(f(ctx, interaction))
            },
        ));
        self
    }

    /// Sets the function run when the user types into an option with autocomplete enabled.
    pub fn autocomplete<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, AutocompleteInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.autocomplete = Some(Arc::new(
            move |ctx: Context, interaction: AutocompleteInteraction| -> CommandFuture {
                Box::pin(f(ctx, interaction))
            },
        ));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn options(&self) -> &[CommandOption] {
        &self.options
    }

    /// The subcommands registered under this command, by name.
    #[must_use]
    pub fn subcommands(&self) -> &BTreeMap<String, Arc<Command>> {
        &self.subcommands
    }

    #[must_use]
    pub fn subcommand(&self, name: &str) -> Option<&Arc<Command>> {
        self.subcommands.get(name)
    }

    #[must_use]
    pub fn has_execute(&self) -> bool {
        self.execute.is_some()
    }

    #[must_use]
    pub fn has_autocomplete(&self) -> bool {
        self.autocomplete.is_some()
    }

    /// Runs the command function, if there is one.
    pub(crate) fn run(&self, ctx: Context, interaction: CommandInteraction) -> Option<CommandFuture> {
        self.execute.as_ref().map(|f| f(ctx, interaction))
    }

    /// Runs the autocomplete function, if there is one.
    pub(crate) fn run_autocomplete(
        &self,
        ctx: Context,
        interaction: AutocompleteInteraction,
    ) -> Option<CommandFuture> {
        self.autocomplete.as_ref().map(|f| f(ctx, interaction))
    }

    /// Checks the command against Discord's constraints on names, descriptions and options.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> StdResult<(), CommandError> {
        let invalid = |field: &str, reason: &str| CommandError::Invalid {
            command: self.name.clone(),
            field: field.to_owned(),
            reason: reason.to_owned(),
        };

        check_name(&self.name).map_err(|reason| invalid("name", reason))?;
        check_description(&self.description).map_err(|reason| invalid("description", reason))?;

        if self.options.len() > constants::COMMAND_OPTIONS_LIMIT {
            return Err(invalid("options", "must not have more than 25 entries"));
        }

        for (index, option) in self.options.iter().enumerate() {
            option
                .validate()
                .map_err(|(field, reason)| invalid(&format!("options[{index}].{field}"), reason))?;
        }

        Ok(())
    }
}

fn check_name(name: &str) -> StdResult<(), &'static str> {
    let length = name.chars().count();
    if !(3..=32).contains(&length) {
        return Err("must be between 3 and 32 characters long");
    }

    if name.to_lowercase() != name {
        return Err("must be lowercase");
    }

    if !name_pattern().is_match(name) {
        return Err("may only contain letters, numbers, `-` and `_`");
    }

    Ok(())
}

fn check_description(description: &str) -> StdResult<(), &'static str> {
    if description.is_empty() {
        return Err("must not be empty");
    }

    if description.chars().count() > constants::COMMAND_DESCRIPTION_MAX_LENGTH {
        return Err("must not be longer than 100 characters");
    }

    Ok(())
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("options", &self.options)
            .field("subcommands", &self.subcommands)
            .field("execute", &self.execute.is_some())
            .field("autocomplete", &self.autocomplete.is_some())
            .finish()
    }
}

#[derive(Serialize)]
struct SubcommandOption<'a> {
    #[serde(rename = "type")]
    kind: CommandOptionType,
    name: &'a str,
    description: &'a str,
    options: &'a [CommandOption],
}

/// Serializes into the application command object uploaded by command sync. Subcommands become
/// options of type [`CommandOptionType::SubCommand`].
impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> StdResult<S::Ok, S::Error> {
        let mut command = serializer.serialize_struct("Command", 4)?;
        command.serialize_field("type", &CommandType::ChatInput)?;
        command.serialize_field("name", &self.name)?;
        command.serialize_field("description", &self.description)?;

        if self.subcommands.is_empty() {
            command.serialize_field("options", &self.options)?;
        } else {
            let subcommands = self
                .subcommands
                .values()
                .map(|subcommand| SubcommandOption {
                    kind: CommandOptionType::SubCommand,
                    name: &subcommand.name,
                    description: &subcommand.description,
                    options: &subcommand.options,
                })
                .collect::<Vec<_>>();
            command.serialize_field("options", &subcommands)?;
        }

        command.end()
    }
}

/// A choice offered for an option instead of free input.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct CommandOptionChoice {
    pub name: String,
    pub value: Value,
}

/// A builder for an option of a [`Command`].
///
/// [Discord docs](https://discord.com/developers/docs/interactions/application-commands#application-command-object-application-command-option-structure).
#[derive(Clone, Debug, Serialize)]
#[must_use]
pub struct CommandOption {
    #[serde(rename = "type")]
    kind: CommandOptionType,
    name: String,
    description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    choices: Vec<CommandOptionChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_types: Option<Vec<ChannelType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_value: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_value: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    autocomplete: bool,
}

impl CommandOption {
    /// Creates a new option with the given type, name, and description, leaving all other fields
    /// empty.
    pub fn new(
        kind: CommandOptionType,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
            choices: Vec::new(),
            channel_types: None,
            min_value: None,
            max_value: None,
            autocomplete: false,
        }
    }

    /// Sets if this option is required or optional.
    ///
    /// **Note**: This defaults to `false`.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Adds an optional string-choice.
    ///
    /// **Note**: There can be no more than 25 choices set. Name must be between 1 and 100
    /// characters.
    pub fn add_string_choice(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_choice(name, Value::String(value.into()))
    }

    /// Adds an optional int-choice.
    pub fn add_int_choice(self, name: impl Into<String>, value: i64) -> Self {
        self.add_choice(name, Value::from(value))
    }

    /// Adds an optional number-choice.
    pub fn add_number_choice(self, name: impl Into<String>, value: f64) -> Self {
        self.add_choice(name, Value::from(value))
    }

    fn add_choice(mut self, name: impl Into<String>, value: Value) -> Self {
        self.choices.push(CommandOptionChoice {
            name: name.into(),
            value,
        });
        self
    }

    /// Restricts a channel option to the given channel types.
    ///
    /// **Note**: At least one type must be given.
    pub fn channel_types(mut self, channel_types: Vec<ChannelType>) -> Self {
        self.channel_types = Some(channel_types);
        self
    }

    /// Sets the minimum value of an integer option.
    pub fn min_int_value(mut self, value: i64) -> Self {
        self.min_value = Some(value.into());
        self
    }

    /// Sets the maximum value of an integer option.
    pub fn max_int_value(mut self, value: i64) -> Self {
        self.max_value = Some(value.into());
        self
    }

    /// Sets the minimum value of a number option.
    pub fn min_number_value(mut self, value: f64) -> Self {
        self.min_value = serde_json::Number::from_f64(value);
        self
    }

    /// Sets the maximum value of a number option.
    pub fn max_number_value(mut self, value: f64) -> Self {
        self.max_value = serde_json::Number::from_f64(value);
        self
    }

    /// Sets whether the command's autocomplete function is run while the user types into this
    /// option.
    ///
    /// **Note**: Only string, integer and number options support autocomplete.
    pub fn set_autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = autocomplete;
        self
    }

    #[must_use]
    pub fn kind(&self) -> CommandOptionType {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn choices(&self) -> &[CommandOptionChoice] {
        &self.choices
    }

    fn validate(&self) -> StdResult<(), (&'static str, &'static str)> {
        check_name(&self.name).map_err(|reason| ("name", reason))?;
        check_description(&self.description).map_err(|reason| ("description", reason))?;

        if self.kind.is_subcommand() {
            return Err(("type", "must not be a subcommand; add subcommands with a parent"));
        }

        if let Some(channel_types) = &self.channel_types {
            if self.kind != CommandOptionType::Channel {
                return Err(("channel_types", "is only allowed on channel options"));
            }
            if channel_types.is_empty() {
                return Err(("channel_types", "must not be empty when set"));
            }
        }

        if (self.min_value.is_some() || self.max_value.is_some()) && !self.kind.is_numeric() {
            return Err(("min_value", "is only allowed on integer and number options"));
        }

        let text_or_numeric = self.kind == CommandOptionType::String || self.kind.is_numeric();

        if self.autocomplete && !text_or_numeric {
            return Err(("autocomplete", "is only allowed on string, integer and number options"));
        }

        if self.choices.len() > constants::COMMAND_CHOICES_LIMIT {
            return Err(("choices", "must not have more than 25 entries"));
        }

        for choice in &self.choices {
            let length = choice.name.chars().count();
            if length == 0 || length > 100 {
                return Err(("choices", "names must be between 1 and 100 characters long"));
            }
            if !matches!(choice.value, Value::String(_) | Value::Number(_)) {
                return Err(("choices", "values must be strings or numbers"));
            }
        }

        Ok(())
    }
}
