//! Mappings of objects received from the interactions endpoint and the REST API, with
//! implementations for decoding and responding.
//!
//! Only the parts of Discord's payloads the framework consumes are mapped; everything else is
//! ignored on decode.

pub mod application;
pub mod channel;
mod error;
pub mod id;
mod timestamp;
pub mod user;

pub use error::Error as ModelError;
pub use timestamp::{ParseError as TimestampParseError, Timestamp};

/// The model prelude re-exports all types in the model sub-modules.
///
/// This allows for quick and easy access to all of the model types.
///
/// # Examples
///
/// Import all model types into scope:
///
/// ```rust,no_run
/// use tempest::model::prelude::*;
/// ```
pub mod prelude {
    pub use super::application::*;
    pub use super::channel::*;
    pub use super::id::*;
    pub use super::user::*;
    pub use super::{ModelError, Timestamp};
}
