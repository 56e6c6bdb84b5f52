//! The framework is the part of the library that turns command interactions into calls to your
//! code.
//!
//! Each [`Command`] has a name, a description, the options Discord prompts the user for, and the
//! functions run when it is invoked or when the user types into an option with autocomplete.
//! Commands are added to the [`CommandRegistry`] of the [`Client`], which validates them and
//! uploads them with [`Client::sync_commands`].
//!
//! A command either takes options itself, or groups subcommands, which are added with a parent:
//!
//! ```rust,no_run
//! use tempest::framework::{Command, CommandOption, CommandRegistry};
//! use tempest::model::application::CommandOptionType;
//!
//! # fn run() -> tempest::Result<()> {
//! let registry = CommandRegistry::new();
//!
//! registry.add(Command::new("ping", "Checks whether the bot is alive").execute(
//!     |_ctx, interaction| async move {
//!         interaction.send_reply("Pong!", false).await?;
//!         Ok(())
//!     },
//! ), None)?;
//!
//! registry.add(Command::new("tag", "Manages tags"), None)?;
//! registry.add(
//!     Command::new("show", "Shows a tag")
//!         .add_option(CommandOption::new(CommandOptionType::String, "name", "Tag name").required(true)),
//!     Some("tag"),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! Invocations can be rate limited per user with a [`CooldownTracker`]. Button clicks can be bound
//! to functions by custom id in a [`ComponentRegistry`].
//!
//! [`Client`]: crate::Client
//! [`Client::sync_commands`]: crate::Client::sync_commands

mod command;
mod components;
mod cooldown;
mod error;
mod registry;

pub use self::command::*;
pub use self::components::ComponentRegistry;
pub use self::cooldown::*;
pub use self::error::Error as CommandError;
pub use self::registry::CommandRegistry;
