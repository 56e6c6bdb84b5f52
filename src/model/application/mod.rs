//! Interactions received through the interactions endpoint, and the types describing them.

mod acknowledgement;
mod autocomplete_interaction;
mod command;
mod command_interaction;
mod component;
mod component_interaction;
mod error;
mod interaction;
mod ping_interaction;

pub use acknowledgement::{Acknowledgement, ReplyAction, Step};
pub use autocomplete_interaction::*;
pub use command::*;
pub use command_interaction::*;
pub use component::*;
pub use component_interaction::*;
pub use error::Error as InteractionError;
pub use interaction::{Interaction, InteractionCredentials, InteractionResponseType, InteractionType};
pub use ping_interaction::*;
