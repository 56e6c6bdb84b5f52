use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{CommandError, CommandFuture};
use crate::client::Context;
use crate::internal::prelude::*;
use crate::model::application::ComponentInteraction;

type ComponentFn = dyn Fn(Context, ComponentInteraction) -> CommandFuture + Send + Sync;

/// Functions bound to component custom ids.
///
/// A click on a bound custom id is handed to its function before any [`ButtonWaiters`] see it,
/// and is not acknowledged by the framework: the function answers it, either with
/// [`ComponentInteraction::acknowledge`], a reply, or [`ComponentInteraction::edit_message`].
///
/// [`ButtonWaiters`]: crate::collector::ButtonWaiters
#[derive(Default)]
pub struct ComponentRegistry {
    handlers: RwLock<HashMap<String, Arc<ComponentFn>>>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `f` to every custom id in `custom_ids`.
    ///
    /// Either all of them are bound or, on error, none.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::DuplicateComponent`] if one of the custom ids is already bound.
    pub fn add<I, S, F, Fut>(&self, custom_ids: I, f: F) -> StdResult<(), CommandError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Context, ComponentInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let custom_ids: Vec<String> = custom_ids.into_iter().map(Into::into).collect();
        let handler: Arc<ComponentFn> =
            Arc::new(move |ctx: Context, interaction: ComponentInteraction| -> CommandFuture {
                Box::pin(f(ctx, interaction))
            });

        let mut handlers = self.handlers.write();
        if let Some(custom_id) = custom_ids.iter().find(|id| handlers.contains_key(*id)) {
            return Err(CommandError::DuplicateComponent {
                custom_id: custom_id.clone(),
            });
        }

        for custom_id in custom_ids {
            debug!("Bound component `{custom_id}`");
            handlers.insert(custom_id, Arc::clone(&handler));
        }

        Ok(())
    }

    /// Unbinds `custom_id`, returning whether it was bound.
    pub fn remove(&self, custom_id: &str) -> bool {
        self.handlers.write().remove(custom_id).is_some()
    }

    #[must_use]
    pub fn contains(&self, custom_id: &str) -> bool {
        self.handlers.read().contains_key(custom_id)
    }

    /// Runs the function bound to the clicked custom id, handing the click back if there is none.
    pub(crate) fn run(
        &self,
        ctx: Context,
        interaction: ComponentInteraction,
    ) -> StdResult<CommandFuture, ComponentInteraction> {
        let handler = self.handlers.read().get(&interaction.custom_id).cloned();

        match handler {
            Some(handler) => Ok(handler(ctx, interaction)),
            None => Err(interaction),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let mut custom_ids: Vec<&String> = handlers.keys().collect();
        custom_ids.sort();

        f.debug_struct("ComponentRegistry").field("custom_ids", &custom_ids).finish()
    }
}
