use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use futures::FutureExt as _;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::event_handler::{EventHandler, HandlerFailure};
use super::Context;
use crate::collector::ButtonWaiters;
use crate::framework::{Admission, Command, CommandRegistry, ComponentRegistry, CooldownTracker};
use crate::http::Http;
use crate::internal::prelude::*;
use crate::internal::tokio::spawn_named;
use crate::model::application::{
    AutocompleteInteraction,
    CommandInteraction,
    ComponentInteraction,
    Interaction,
};
use crate::model::user::User;

/// Everything a decoded interaction is routed through.
pub(crate) struct Dispatcher {
    pub(crate) http: Arc<Http>,
    pub(crate) commands: Arc<CommandRegistry>,
    pub(crate) components: Arc<ComponentRegistry>,
    pub(crate) waiters: Arc<ButtonWaiters>,
    pub(crate) cooldown: Option<Arc<CooldownTracker>>,
    pub(crate) event_handler: Option<Arc<dyn EventHandler>>,
    pub(crate) user: OnceLock<Arc<User>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.commands)
            .field("components", &self.components)
            .field("waiters", &self.waiters)
            .field("cooldown", &self.cooldown)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub(crate) fn context(&self) -> Context {
        Context::new(
            Arc::clone(&self.http),
            Arc::clone(&self.commands),
            Arc::clone(&self.components),
            Arc::clone(&self.waiters),
            self.user.get().cloned(),
        )
    }

    /// Routes an interaction to the function handling it, in a task of its own.
    ///
    /// Returns the task, or `None` if nothing handles the interaction.
    pub(crate) fn dispatch(self: &Arc<Self>, interaction: Interaction) -> Option<JoinHandle<()>> {
        match interaction {
            Interaction::Ping(_) => None,
            Interaction::Command(interaction) => {
                let subcommand = interaction.subcommand_name.as_deref();
                let Some(command) = self.commands.resolve(&interaction.command_name, subcommand)
                else {
                    debug!("Dropping invocation of unknown command `{}`", invocation(&interaction));
                    return None;
                };

                let task = format!("command {}", invocation(&interaction));
                let run = Arc::clone(self).run_command(command, interaction);
                Some(self.spawn_supervised("dispatch::command", task, run))
            },
            Interaction::Autocomplete(interaction) => {
                let subcommand = interaction.subcommand_name.as_deref();
                let command = self.commands.resolve(&interaction.command_name, subcommand)?;
                if !command.has_autocomplete() || interaction.focused.value.is_empty() {
                    return None;
                }

                let task = format!("autocomplete {}", interaction.command_name);
                let run = Arc::clone(self).run_autocomplete(command, interaction);
                Some(self.spawn_supervised("dispatch::autocomplete", task, run))
            },
            Interaction::Component(interaction) => {
                let task = format!("component {}", interaction.custom_id);
                let run = Arc::clone(self).run_component(interaction);
                Some(self.spawn_supervised("dispatch::component", task, run))
            },
        }
    }

    async fn run_command(
        self: Arc<Self>,
        command: Arc<Command>,
        interaction: CommandInteraction,
    ) -> Result<()> {
        if let Some(cooldown) = &self.cooldown {
            let user_id = interaction.target.id();
            if let Admission::Cooldown {
                remaining,
            } = cooldown.check(user_id)
            {
                debug!(%user_id, ?remaining, "Rejected `{}` on cooldown", invocation(&interaction));
                if let Some((message, ephemeral)) = cooldown.settings().reply.render(remaining) {
                    interaction.send_reply(message, ephemeral).await?;
                }
                return Ok(());
            }
        }

        let ctx = self.context();
        if let Some(handler) = &self.event_handler {
            if !handler.pre_command(ctx.clone(), &interaction, &command).await {
                debug!("Skipped `{}` on pre_command", invocation(&interaction));
                return Ok(());
            }
        }

        match command.run(ctx, interaction) {
            Some(future) => future.await,
            None => {
                debug!("Command `{}` has nothing to execute", command.name());
                Ok(())
            },
        }
    }

    async fn run_autocomplete(
        self: Arc<Self>,
        command: Arc<Command>,
        interaction: AutocompleteInteraction,
    ) -> Result<()> {
        match command.run_autocomplete(self.context(), interaction) {
            Some(future) => future.await,
            None => Ok(()),
        }
    }

    /// Hands a click to the function bound to its custom id, or else acknowledges it and hands
    /// it to the first matching waiter or the event handler.
    ///
    /// A failed acknowledgement is returned once the click was handed on.
    async fn run_component(self: Arc<Self>, interaction: ComponentInteraction) -> Result<()> {
        let interaction = match self.components.run(self.context(), interaction) {
            Ok(bound) => return bound.await,
            Err(interaction) => interaction,
        };

        let acknowledged = interaction.acknowledge().await;
        if let Err(why) = &acknowledged {
            debug!("Failed to acknowledge button `{}`: {why}", interaction.custom_id);
        }

        if let Err(interaction) = self.waiters.claim(interaction) {
            match &self.event_handler {
                Some(handler) => handler.unhandled_component(self.context(), interaction).await,
                None => debug!("No waiter for button `{}`", interaction.custom_id),
            }
        }

        acknowledged
    }

    /// Runs `future`, reporting its error or panic to the event handler.
    fn spawn_supervised(
        self: &Arc<Self>,
        name: &str,
        task: String,
        future: impl Future<Output = Result<()>> + Send + 'static,
    ) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);

        spawn_named(name, async move {
            let failure = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(Ok(())) => return,
                Ok(Err(error)) => HandlerFailure::Error {
                    task,
                    error,
                },
                Err(payload) => HandlerFailure::Panic {
                    task,
                    message: panic_message(payload.as_ref()),
                },
            };

            match &dispatcher.event_handler {
                Some(handler) => handler.handler_failure(dispatcher.context(), failure).await,
                None => error!("{failure}"),
            }
        })
    }
}

/// The command path as typed by the user, such as `tag show`.
fn invocation(interaction: &CommandInteraction) -> String {
    [
        Some(interaction.command_name.as_str()),
        interaction.subcommand_group.as_deref(),
        interaction.subcommand_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::framework::{CommandOption, CooldownReply, CooldownSettings};
    use crate::model::application::CommandOptionType;

    fn dispatcher(
        commands: CommandRegistry,
        cooldown: Option<CooldownSettings>,
        event_handler: Option<Arc<dyn EventHandler>>,
    ) -> Arc<Dispatcher> {
        Arc::new(Dispatcher {
            http: Arc::new(Http::new("token")),
            commands: Arc::new(commands),
            components: Arc::new(ComponentRegistry::new()),
            waiters: Arc::new(ButtonWaiters::new()),
            cooldown: cooldown.map(|settings| Arc::new(CooldownTracker::new(settings))),
            event_handler,
            user: OnceLock::new(),
        })
    }

    fn decode(dispatcher: &Dispatcher, kind: u8, name: &str, options: Value) -> Interaction {
        let payload = json!({
            "id": "846962681424216064",
            "application_id": "846962681424216065",
            "type": kind,
            "token": "aW50ZXJhY3Rpb24",
            "version": 1,
            "user": {"id": "53908232506183680", "username": "Mason"},
            "data": {"id": "771825006014889984", "name": name, "type": 1, "options": options},
        });

        Interaction::decode(&serde_json::to_vec(&payload).unwrap(), &dispatcher.http)
            .unwrap()
            .unwrap()
    }

    fn counting(name: &str, runs: &Arc<AtomicUsize>) -> Command {
        let runs = Arc::clone(runs);
        Command::new(name, "Counts its runs").execute(move |_, _| {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn autocomplete_routes_to_subcommand() {
        let (sender, mut receiver) = mpsc::unbounded_channel();

        let commands = CommandRegistry::new();
        commands.add(Command::new("search", "Searches"), None).unwrap();
        let tracks = Command::new("tracks", "Searches tracks")
            .add_option(
                CommandOption::new(CommandOptionType::String, "query", "Query")
                    .set_autocomplete(true),
            )
            .autocomplete(move |_, interaction| {
                let sender = sender.clone();
                async move {
                    let focused = interaction.focused;
                    sender.send((focused.name, focused.value)).unwrap();
                    Ok(())
                }
            });
        commands.add(tracks, Some("search")).unwrap();
        let dispatcher = dispatcher(commands, None, None);

        let options = |value: &str| {
            json!([{
                "name": "tracks",
                "type": 1,
                "options": [{"name": "query", "type": 3, "value": value, "focused": true}],
            }])
        };

        let interaction = decode(&dispatcher, 4, "search", options("par"));
        dispatcher.dispatch(interaction).unwrap().await.unwrap();
        assert_eq!(receiver.recv().await.unwrap(), ("query".to_owned(), "par".to_owned()));

        let interaction = decode(&dispatcher, 4, "search", options(""));
        assert!(dispatcher.dispatch(interaction).is_none());
    }

    #[tokio::test]
    async fn unknown_commands_are_dropped() {
        let dispatcher = dispatcher(CommandRegistry::new(), None, None);
        let interaction = decode(&dispatcher, 2, "ping", json!([]));

        assert!(dispatcher.dispatch(interaction).is_none());
    }

    #[tokio::test]
    async fn cooldown_gates_execution() {
        let runs = Arc::new(AtomicUsize::new(0));
        let commands = CommandRegistry::new();
        commands.add(counting("ping", &runs), None).unwrap();

        let settings =
            CooldownSettings::new(Duration::from_secs(60)).reply(CooldownReply::Silent);
        let dispatcher = dispatcher(commands, Some(settings), None);

        for _ in 0..3 {
            let interaction = decode(&dispatcher, 2, "ping", json!([]));
            dispatcher.dispatch(interaction).unwrap().await.unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    struct Recorder {
        allow: bool,
        failures: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn pre_command(
            &self,
            _: Context,
            _: &CommandInteraction,
            _: &Command,
        ) -> bool {
            self.allow
        }

        async fn handler_failure(&self, _: Context, failure: HandlerFailure) {
            self.failures.send(failure.to_string()).unwrap();
        }
    }

    #[tokio::test]
    async fn pre_command_can_skip() {
        let runs = Arc::new(AtomicUsize::new(0));
        let commands = CommandRegistry::new();
        commands.add(counting("ping", &runs), None).unwrap();

        let (failures, _receiver) = mpsc::unbounded_channel();
        let handler = Arc::new(Recorder {
            allow: false,
            failures,
        });
        let dispatcher = dispatcher(commands, None, Some(handler));

        let interaction = decode(&dispatcher, 2, "ping", json!([]));
        dispatcher.dispatch(interaction).unwrap().await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_are_reported() {
        let commands = CommandRegistry::new();
        commands
            .add(
                Command::new("panics", "Panics").execute(|_, _| async move {
                    if true {
                        panic!("boom");
                    }
                    Ok(())
                }),
                None,
            )
            .unwrap();
        commands
            .add(
                Command::new("fails", "Fails").execute(|_, _| async move {
                    Err::<(), _>(Error::Model(crate::model::ModelError::MissingField("test")))
                }),
                None,
            )
            .unwrap();

        let (failures, mut receiver) = mpsc::unbounded_channel();
        let handler = Arc::new(Recorder {
            allow: true,
            failures,
        });
        let dispatcher = dispatcher(commands, None, Some(handler));

        let interaction = decode(&dispatcher, 2, "panics", json!([]));
        dispatcher.dispatch(interaction).unwrap().await.unwrap();
        assert_eq!(receiver.recv().await.unwrap(), "Handler of command panics panicked: boom");

        let interaction = decode(&dispatcher, 2, "fails", json!([]));
        dispatcher.dispatch(interaction).unwrap().await.unwrap();
        assert!(receiver.recv().await.unwrap().starts_with("Handler of command fails failed"));
    }

    #[test]
    fn invocation_path() {
        let dispatcher = dispatcher(CommandRegistry::new(), None, None);
        let options = json!([{"name": "group", "type": 2, "options": [{"name": "show", "type": 1}]}]);
        let interaction = decode(&dispatcher, 2, "tag", options).command().unwrap();

        assert_eq!(invocation(&interaction), "tag group show");
    }
}
