//! A set of builders used to make outbound payloads.
//!
//! Builders serialize straight into the JSON bodies of interaction callbacks and webhook calls;
//! every unset field is left out of the payload.

mod create_allowed_mentions;
mod create_autocomplete_response;
mod create_components;
mod create_embed;
mod create_message;

pub use create_allowed_mentions::*;
pub use create_autocomplete_response::*;
pub use create_components::*;
pub use create_embed::*;
pub use create_message::*;
