use std::error::Error as StdError;
use std::fmt;

/// An error raised while turning an inbound interaction payload into a typed model.
///
/// Payloads fail closed: anything the framework needs that is absent or malformed is reported
/// here rather than filled with a default.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The payload was missing a field required for its interaction type.
    MissingField(&'static str),
    /// The interaction carried neither a guild member nor a user.
    MissingTarget,
    /// A command option's value did not match its declared option type.
    InvalidOptionValue {
        /// Name of the offending option.
        name: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "Interaction payload is missing `{field}`"),
            Self::MissingTarget => f.write_str("Interaction has neither a member nor a user"),
            Self::InvalidOptionValue {
                name,
            } => write!(f, "Option `{name}` has a value that does not match its type"),
        }
    }
}

impl StdError for Error {}
