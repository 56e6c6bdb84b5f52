use std::fmt;

use async_trait::async_trait;
use tracing::error;

use super::context::Context;
use crate::framework::Command;
use crate::http::RatelimitInfo;
use crate::internal::prelude::*;
use crate::model::application::{CommandInteraction, ComponentInteraction};

/// The core trait for hooking into the dispatch of interactions.
///
/// Commands themselves are run through the [`CommandRegistry`]; the handler sees what happens
/// around them. Every method has a default, so implementors only override what they need.
///
/// [`CommandRegistry`]: crate::framework::CommandRegistry
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Dispatched before a command that passed its cooldown runs. Returning `false` skips it.
    async fn pre_command(
        &self,
        _ctx: Context,
        _interaction: &CommandInteraction,
        _command: &Command,
    ) -> bool {
        true
    }

    /// Dispatched when a button was clicked that neither a bound function nor a waiter handles.
    ///
    /// The interaction is already acknowledged, so replies become follow-up messages. If the
    /// acknowledgement failed, that is reported to [`Self::handler_failure`] as well.
    async fn unhandled_component(&self, _ctx: Context, _interaction: ComponentInteraction) {}

    /// Dispatched when a command or autocomplete function returned an error or panicked.
    ///
    /// Logs the failure by default.
    async fn handler_failure(&self, _ctx: Context, failure: HandlerFailure) {
        error!("{failure}");
    }

    /// Dispatched when the REST client is waiting on a rate limit.
    ///
    /// Provides the route that is being waited on and how long for.
    async fn ratelimit(&self, _data: RatelimitInfo) {}
}

/// A handler task that did not finish cleanly.
#[derive(Debug)]
#[non_exhaustive]
pub enum HandlerFailure {
    /// The task returned an error.
    Error { task: String, error: Error },
    /// The task panicked.
    Panic { task: String, message: String },
}

impl HandlerFailure {
    /// The name of the task, such as `command ping`.
    #[must_use]
    pub fn task(&self) -> &str {
        match self {
            Self::Error {
                task, ..
            }
            | Self::Panic {
                task, ..
            } => task,
        }
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error {
                task,
                error,
            } => write!(f, "Handler of {task} failed: {error}"),
            Self::Panic {
                task,
                message,
            } => write!(f, "Handler of {task} panicked: {message}"),
        }
    }
}
