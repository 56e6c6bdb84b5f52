use std::error::Error as StdError;
use std::fmt;

/// An error returned when a command definition is rejected by the [`CommandRegistry`], or a
/// component binding by the [`ComponentRegistry`].
///
/// [`CommandRegistry`]: super::CommandRegistry
/// [`ComponentRegistry`]: super::ComponentRegistry
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A field of the command, or of one of its options, breaks Discord's constraints.
    Invalid { command: String, field: String, reason: String },
    /// A root command with this name is already registered.
    Duplicate { name: String },
    /// The parent command already has a subcommand with this name.
    DuplicateSubcommand { parent: String, name: String },
    /// The parent command of a subcommand is not registered.
    MissingParent { parent: String, name: String },
    /// The parent command takes options, so it cannot group subcommands.
    ParentHasOptions { parent: String, name: String },
    /// A function is already bound to this component custom id.
    DuplicateComponent { custom_id: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid {
                command,
                field,
                reason,
            } => write!(f, "Command `{command}` is invalid: `{field}` {reason}"),
            Self::Duplicate {
                name,
            } => write!(f, "A command named `{name}` is already registered"),
            Self::DuplicateSubcommand {
                parent,
                name,
            } => write!(f, "Command `{parent}` already has a subcommand named `{name}`"),
            Self::MissingParent {
                parent,
                name,
            } => write!(
                f,
                "Subcommand `{name}` cannot be added because its parent `{parent}` is not registered"
            ),
            Self::ParentHasOptions {
                parent,
                name,
            } => write!(
                f,
                "Subcommand `{name}` cannot be added because `{parent}` takes options; commands \
                 with subcommands only group them"
            ),
            Self::DuplicateComponent {
                custom_id,
            } => write!(f, "A function is already bound to component `{custom_id}`"),
        }
    }
}

impl StdError for Error {}
