//! Tempest is a Rust framework for Discord bots that receive their interactions over HTTP.
//!
//! Instead of holding a gateway connection open, the bot serves an [interactions endpoint]:
//! Discord posts every slash command, button click and autocomplete request to it as a signed
//! HTTP request. The [`Client`] verifies the signature, decodes the interaction and runs the
//! matching [`Command`]. Replies, edits and follow-up messages are sent through a rate limited
//! REST client.
//!
//! Get started with [`Client::builder`], add commands to [`Client::commands`] and upload them with
//! [`Client::sync_commands`]. Each handler is given a [`Context`]; see the [client's module-level
//! documentation].
//!
//! Note that, although this documentation will try to be as up-to-date and accurate as possible,
//! Discord hosts [official documentation][docs]. If you need to be sure that some information
//! piece is sanctioned by Discord, refer to their own documentation.
//!
//! # Installation
//!
//! Add the following to your `Cargo.toml` file:
//!
//! ```toml
//! [dependencies]
//! tempest = "0.1"
//! ```
//!
//! [`Command`]: crate::framework::Command
//! [`Context`]: crate::client::Context
//! [client's module-level documentation]: crate::client
//! [docs]: https://discord.com/developers/docs/intro
//! [interactions endpoint]: https://discord.com/developers/docs/interactions/overview#configuring-an-interactions-endpoint-url
#![doc(html_root_url = "https://docs.rs/tempest/*")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![warn(
    unused,
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::clone_on_ref_ptr,
    clippy::non_ascii_literal,
    clippy::fallible_impl_from,
    clippy::let_underscore_must_use,
    clippy::format_push_string,
    clippy::pedantic
)]
#![allow(
    // Allowed as they are too pedantic
    clippy::cast_possible_truncation,
    clippy::module_name_repetitions,
    clippy::unreadable_literal,
    clippy::cast_possible_wrap,
    clippy::wildcard_imports,
    clippy::cast_sign_loss,
    clippy::too_many_lines,
    clippy::doc_markdown,
    clippy::missing_panics_doc,
    clippy::doc_link_with_quotes
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

#[macro_use]
mod internal;

pub mod builder;
pub mod client;
pub mod collector;
pub mod constants;
pub mod framework;
pub mod http;
pub mod interactions_endpoint;
pub mod model;
pub mod prelude;
pub mod utils;

mod error;
mod secret_string;

// For the procedural macros in the event handler.
pub use async_trait::async_trait;

pub use crate::client::{Client, ClientBuilder};
pub use crate::error::{Error, Result};

/// Special module that re-exports most public items from this crate.
///
/// Useful, because you don't have to remember the full paths of tempest items.
pub mod all {
    #[doc(no_inline)]
    pub use crate::builder::*;
    #[doc(no_inline)]
    pub use crate::client::*;
    #[doc(no_inline)]
    pub use crate::collector::*;
    #[doc(no_inline)]
    pub use crate::constants::*;
    #[doc(no_inline)]
    pub use crate::framework::*;
    #[doc(no_inline)]
    pub use crate::http::*;
    #[doc(no_inline)]
    pub use crate::interactions_endpoint::*;
    #[doc(no_inline)]
    pub use crate::model::prelude::*;
    #[doc(no_inline)]
    pub use crate::utils::token::{validate as validate_token, InvalidToken};
}
