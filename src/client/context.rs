use std::sync::Arc;
use std::time::Duration;

use crate::collector::{ButtonCollector, ButtonWaiters};
use crate::framework::{CommandRegistry, ComponentRegistry};
use crate::http::Http;
use crate::model::application::ComponentInteraction;
use crate::model::user::{Target, User};

/// The context is a general utility struct provided on every handler call, giving access to the
/// parts of the [`Client`] a handler usually needs.
///
/// A context only lives for the interaction it was created for. Cloning it is cheap.
///
/// [`Client`]: super::Client
#[derive(Clone, Debug)]
pub struct Context {
    /// The HTTP client replies go through.
    pub http: Arc<Http>,
    /// The commands of the client. Commands added here are dispatched to right away, but Discord
    /// only shows them after a [`Client::sync_commands`].
    ///
    /// [`Client::sync_commands`]: super::Client::sync_commands
    pub commands: Arc<CommandRegistry>,
    /// The functions bound to component custom ids.
    pub components: Arc<ComponentRegistry>,
    /// The pending button waiters of the client.
    pub waiters: Arc<ButtonWaiters>,
    user: Option<Arc<User>>,
}

impl Context {
    pub(crate) fn new(
        http: Arc<Http>,
        commands: Arc<CommandRegistry>,
        components: Arc<ComponentRegistry>,
        waiters: Arc<ButtonWaiters>,
        user: Option<Arc<User>>,
    ) -> Self {
        Self {
            http,
            commands,
            components,
            waiters,
            user,
        }
    }

    /// The bot's own user, if it was fetched when the client started.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.user.as_deref()
    }

    /// Waits for a click on one of `custom_ids` by a user passing `filter`, for at most
    /// `timeout`. See [`ButtonWaiters::await_buttons`].
    pub async fn await_buttons<I, S>(
        &self,
        custom_ids: I,
        filter: impl Fn(&Target) -> bool + Send + Sync + 'static,
        timeout: Duration,
    ) -> Option<ComponentInteraction>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.waiters.await_buttons(custom_ids, filter, timeout).await
    }

    /// Starts building a [`ButtonCollector`].
    pub fn button_collector(&self) -> ButtonCollector<'_> {
        ButtonCollector::new(&self.waiters)
    }
}
