use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;

use serde_json::Error as JsonError;

use crate::client::ClientError;
use crate::framework::CommandError;
use crate::http::HttpError;
use crate::model::application::InteractionError;
use crate::model::ModelError;

/// The common result type between most library functions.
///
/// The library exposes functions which, for a result type, exposes only one type, rather than the
/// usual 2 (`Result<T, Error>`). This is because all functions that return a result return
/// tempest's [`Error`], so this is implied, and a "simpler" result is used.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A common error enum returned by most of the library's functionality within a custom
/// [`Result`].
///
/// The most common error types, the [`InteractionError`] and [`HttpError`] enums, are both wrapped
/// around this in the form of the [`Self::Interaction`] and [`Self::Http`] variants.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An [`std::io`] error.
    Io(IoError),
    /// An error from the [`serde_json`] crate.
    Json(JsonError),
    /// An error from the [`model`] module, raised while decoding an inbound payload.
    ///
    /// [`model`]: crate::model
    Model(ModelError),
    /// An error from the [`http`] module.
    ///
    /// [`http`]: crate::http
    Http(HttpError),
    /// A reply was attempted that the interaction's acknowledgement state does not allow, or the
    /// interaction token expired.
    Interaction(InteractionError),
    /// A command definition was rejected by the [`CommandRegistry`].
    ///
    /// [`CommandRegistry`]: crate::framework::CommandRegistry
    Command(CommandError),
    /// An error from the [`client`] module.
    ///
    /// [`client`]: crate::client
    Client(ClientError),
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Error {
        Error::Io(e)
    }
}

impl From<JsonError> for Error {
    fn from(e: JsonError) -> Error {
        Error::Json(e)
    }
}

impl From<ModelError> for Error {
    fn from(e: ModelError) -> Error {
        Error::Model(e)
    }
}

impl From<HttpError> for Error {
    fn from(e: HttpError) -> Error {
        Error::Http(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        HttpError::from(e).into()
    }
}

impl From<InteractionError> for Error {
    fn from(e: InteractionError) -> Error {
        Error::Interaction(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Error {
        Error::Command(e)
    }
}

impl From<ClientError> for Error {
    fn from(e: ClientError) -> Error {
        Error::Client(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(inner) => fmt::Display::fmt(&inner, f),
            Self::Json(inner) => fmt::Display::fmt(&inner, f),
            Self::Model(inner) => fmt::Display::fmt(&inner, f),
            Self::Http(inner) => fmt::Display::fmt(&inner, f),
            Self::Interaction(inner) => fmt::Display::fmt(&inner, f),
            Self::Command(inner) => fmt::Display::fmt(&inner, f),
            Self::Client(inner) => fmt::Display::fmt(&inner, f),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(inner) => Some(inner),
            Self::Json(inner) => Some(inner),
            Self::Model(inner) => Some(inner),
            Self::Http(inner) => Some(inner),
            Self::Interaction(inner) => Some(inner),
            Self::Command(inner) => Some(inner),
            Self::Client(inner) => Some(inner),
        }
    }
}
