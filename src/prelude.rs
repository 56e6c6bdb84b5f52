//! A set of exports which can be helpful to use.
//!
//! Note that the `TempestError` re-export is equivalent to [`tempest::Error`], although is
//! re-exported as a separate name to remove likely ambiguity with other crate error enums.
//!
//! # Examples
//!
//! Import all of the exports:
//!
//! ```rust
//! use tempest::prelude::*;
//! ```
//!
//! [`tempest::Error`]: crate::Error

pub use crate::client::{
    Client,
    ClientBuilder,
    ClientError,
    Context,
    EventHandler,
    HandlerFailure,
    SyncOptions,
};
pub use crate::error::Error as TempestError;
pub use crate::framework::{Command, CommandError, CommandOption, CooldownSettings};
pub use crate::http::HttpError;
pub use crate::model::application::InteractionError;
pub use crate::model::ModelError;
