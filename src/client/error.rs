use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;

use crate::interactions_endpoint::InvalidKey;

/// An error returned from the [`Client`].
///
/// This is always wrapped within the library's generic [`Error::Client`] variant.
///
/// [`Client`]: super::Client
/// [`Error::Client`]: crate::Error::Client
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The application public key given to the [`ClientBuilder`] is unusable.
    ///
    /// [`ClientBuilder`]: super::ClientBuilder
    InvalidPublicKey(InvalidKey),
    /// Uploading the command set failed.
    CommandSync(Box<crate::Error>),
    /// The listener could not accept connections anymore.
    Listener(IoError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPublicKey(inner) => fmt::Display::fmt(inner, f),
            Self::CommandSync(inner) => write!(
                f,
                "Failed to sync commands, possibly because the limit of 100 global command \
                 updates per day was reached: {inner}"
            ),
            Self::Listener(inner) => write!(f, "Listener failed: {inner}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidPublicKey(inner) => Some(inner),
            Self::CommandSync(inner) => Some(inner.as_ref()),
            Self::Listener(inner) => Some(inner),
        }
    }
}
