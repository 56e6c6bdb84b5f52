//! A module for [`Client`] and supporting types.
//!
//! The Client holds the bot's token, the application public key and the commands, and serves the
//! endpoint Discord posts interactions to. Every verified interaction is decoded and dispatched:
//! commands to the [`CommandRegistry`], button clicks to the [`ComponentRegistry`] or the
//! [`ButtonWaiters`], and everything around them to the [`EventHandler`].
//!
//! A [`Context`] is provided for every handler.
//!
//! Click [here][Client examples] for an example on how to use a `Client`.
//!
//! [Client examples]: Client#examples

mod context;
pub(crate) mod dispatch;
mod error;
mod event_handler;
mod listener;

use std::future::IntoFuture;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub use self::context::Context;
pub use self::error::Error as ClientError;
pub use self::event_handler::{EventHandler, HandlerFailure};
pub use self::listener::ShutdownHandle;
use self::dispatch::Dispatcher;
use self::listener::{AcceptLoop, Endpoint};
use crate::collector::ButtonWaiters;
use crate::framework::{
    Command,
    CommandRegistry,
    ComponentRegistry,
    CooldownSettings,
    CooldownTracker,
};
use crate::http::{Http, HttpBuilder, RatelimiterSettings};
use crate::interactions_endpoint::Verifier;
use crate::internal::prelude::*;
use crate::internal::tokio::spawn_named;
use crate::model::id::{ApplicationId, GuildId};
use crate::model::user::User;

/// How often cooldowns are swept when the client has no ratelimiter to take the interval from.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// A builder implementing [`IntoFuture`] building a [`Client`] to interact with Discord.
#[must_use = "Builders do nothing unless they are awaited"]
pub struct ClientBuilder {
    token: String,
    public_key: String,
    application_id: Option<ApplicationId>,
    http: Option<Arc<Http>>,
    ratelimiter_settings: RatelimiterSettings,
    cooldown: Option<CooldownSettings>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl ClientBuilder {
    /// Construct a new builder to call methods on for the client construction.
    ///
    /// The `token` will automatically be prefixed "Bot " if not already. The `public_key` is the
    /// hex encoded key shown in the developer portal, used to verify every request.
    pub fn new(token: impl AsRef<str>, public_key: impl AsRef<str>) -> Self {
        Self {
            token: token.as_ref().to_owned(),
            public_key: public_key.as_ref().to_owned(),
            application_id: None,
            http: None,
            ratelimiter_settings: RatelimiterSettings::default(),
            cooldown: None,
            event_handler: None,
        }
    }

    /// Sets the application id. Derived from the token when not set.
    pub fn application_id(mut self, application_id: ApplicationId) -> Self {
        self.application_id = Some(application_id);
        self
    }

    /// Uses an existing [`Http`] instead of building one from the token.
    ///
    /// The ratelimiter settings of this builder don't apply to it.
    pub fn http(mut self, http: Arc<Http>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the settings of the ratelimiter of the [`Http`] built for the client.
    pub fn ratelimiter_settings(mut self, settings: RatelimiterSettings) -> Self {
        self.ratelimiter_settings = settings;
        self
    }

    /// Limits how often each user can run commands.
    pub fn cooldown(mut self, settings: CooldownSettings) -> Self {
        self.cooldown = Some(settings);
        self
    }

    /// Sets the event handler hooking into the dispatch.
    pub fn event_handler<H: EventHandler + 'static>(
        mut self,
        event_handler: impl Into<Arc<H>>,
    ) -> Self {
        let event_handler: Arc<H> = event_handler.into();
        self.event_handler = Some(event_handler);
        self
    }

    /// Gets the event handler, if set.
    #[must_use]
    pub fn get_event_handler(&self) -> Option<&Arc<dyn EventHandler>> {
        self.event_handler.as_ref()
    }
}

impl IntoFuture for ClientBuilder {
    type Output = Result<Client>;

    type IntoFuture = BoxFuture<'static, Result<Client>>;

    #[cfg_attr(feature = "tracing_instrument", tracing::instrument(skip(self)))]
    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let verifier =
                Verifier::from_hex(&self.public_key).map_err(ClientError::InvalidPublicKey)?;

            let http = match self.http {
                Some(http) => http,
                None => Arc::new(
                    HttpBuilder::new(&self.token)
                        .ratelimiter_settings(self.ratelimiter_settings)
                        .build(),
                ),
            };
            if let Some(application_id) = self.application_id {
                http.set_application_id(application_id);
            }

            let event_handler = self.event_handler;
            if let (Some(ratelimiter), Some(event_handler)) = (&http.ratelimiter, &event_handler) {
                let event_handler = Arc::clone(event_handler);
                ratelimiter.set_ratelimit_callback(Box::new(move |info| {
                    let event_handler = Arc::clone(&event_handler);
                    spawn_named("client::ratelimit", async move {
                        event_handler.ratelimit(info).await;
                    });
                }));
            }

            let user = OnceLock::new();
            match http.get_current_user().await {
                Ok(current) => {
                    info!("Logged in as {}", current.name);
                    let _ = user.set(Arc::new(current));
                },
                Err(why) => warn!("HTTP request to get the current user failed: {why}"),
            }

            let dispatcher = Arc::new(Dispatcher {
                http: Arc::clone(&http),
                commands: Arc::new(CommandRegistry::new()),
                components: Arc::new(ComponentRegistry::new()),
                waiters: Arc::new(ButtonWaiters::new()),
                cooldown: self.cooldown.map(|settings| Arc::new(CooldownTracker::new(settings))),
                event_handler,
                user,
            });

            Ok(Client {
                http,
                commands: Arc::clone(&dispatcher.commands),
                components: Arc::clone(&dispatcher.components),
                waiters: Arc::clone(&dispatcher.waiters),
                cooldown: dispatcher.cooldown.clone(),
                dispatcher,
                verifier,
                shutdown: ShutdownHandle::new(),
            })
        })
    }
}

/// Which commands [`Client::sync_commands`] uploads, and where to.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct SyncOptions {
    /// Uploads to this guild instead of globally.
    pub guild_id: Option<GuildId>,
    /// Only uploads the commands with these names.
    pub whitelist: Option<Vec<String>>,
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guild_id(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    pub fn whitelist(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.whitelist = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// The Client serves the interactions endpoint of a bot.
///
/// Discord sends every interaction as a signed HTTP POST to the URL configured in the developer
/// portal. The client verifies and decodes them, and runs the matching command. Replies go back
/// through the rate limited [`Http`] client.
///
/// # Examples
///
/// A bot answering `/ping`:
///
/// ```rust,no_run
/// use tempest::framework::Command;
/// use tempest::Client;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let token = std::env::var("DISCORD_TOKEN")?;
/// let public_key = std::env::var("DISCORD_PUBLIC_KEY")?;
/// let client = Client::builder(&token, &public_key).await?;
///
/// client.commands.add(
///     Command::new("ping", "Checks whether the bot is alive").execute(|_ctx, interaction| {
///         async move {
///             interaction.send_reply("Pong!", false).await?;
///             Ok(())
///         }
///     }),
///     None,
/// )?;
///
/// client.start("0.0.0.0:8080").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client {
    /// The HTTP client replies and command uploads go through.
    pub http: Arc<Http>,
    /// The commands dispatched to.
    pub commands: Arc<CommandRegistry>,
    /// The functions bound to component custom ids, run ahead of the waiters.
    pub components: Arc<ComponentRegistry>,
    /// The pending button waiters.
    pub waiters: Arc<ButtonWaiters>,
    /// The command cooldowns, if configured.
    pub cooldown: Option<Arc<CooldownTracker>>,
    dispatcher: Arc<Dispatcher>,
    verifier: Verifier,
    shutdown: ShutdownHandle,
}

impl Client {
    pub fn builder(token: impl AsRef<str>, public_key: impl AsRef<str>) -> ClientBuilder {
        ClientBuilder::new(token, public_key)
    }

    /// The bot's own user, if it could be fetched when the client was built.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.dispatcher.user.get().map(Arc::as_ref)
    }

    /// A handle stopping [`Self::start`] and [`Self::serve`].
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Binds to `addr` and serves interactions until shut down.
    ///
    /// TLS is expected to be terminated in front of the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails, and the errors of [`Self::serve`].
    pub async fn start(&self, addr: impl ToSocketAddrs) -> Result<()> {
        self.serve(TcpListener::bind(addr).await?).await
    }

    /// Serves interactions on `listener` until shut down.
    ///
    /// Rate limit buckets and cooldowns are swept in the background meanwhile.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Listener`] if accepting connections failed for good.
    #[cfg_attr(feature = "tracing_instrument", tracing::instrument(skip(self)))]
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!("Listening for interactions on {}", listener.local_addr()?);

        let fatal = Arc::new(Mutex::new(None));
        let acceptor = AcceptLoop {
            inner: listener,
            shutdown: self.shutdown.clone(),
            fatal: Arc::clone(&fatal),
        };
        let endpoint = Arc::new(Endpoint {
            verifier: self.verifier.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
        });

        let sweeper = self.spawn_sweeper();
        let escalation = self.spawn_escalation_watcher();

        let shutdown = self.shutdown.clone();
        let served = axum::serve(acceptor, listener::router(endpoint))
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await;

        sweeper.abort();
        if let Some(escalation) = escalation {
            escalation.abort();
        }
        info!("Stopped listening for interactions");

        if let Some(why) = fatal.lock().take() {
            return Err(ClientError::Listener(why).into());
        }
        served.map_err(Error::from)
    }

    fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let http = Arc::clone(&self.http);
        let cooldown = self.cooldown.clone();
        let period = http
            .ratelimiter
            .as_ref()
            .map_or(DEFAULT_SWEEP_INTERVAL, |ratelimiter| ratelimiter.settings().sweep_interval);

        spawn_named("client::sweeper", async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;

            loop {
                interval.tick().await;

                if let Some(ratelimiter) = &http.ratelimiter {
                    ratelimiter.sweep();
                }
                if let Some(cooldown) = &cooldown {
                    cooldown.sweep_at(Instant::now());
                }
            }
        })
    }

    /// Shuts the client down when the ratelimiter escalates a global rate limit breach.
    fn spawn_escalation_watcher(&self) -> Option<tokio::task::JoinHandle<()>> {
        let mut escalation = self.http.ratelimiter.as_ref()?.subscribe_escalation();
        let shutdown = self.shutdown.clone();

        Some(spawn_named("client::escalation", async move {
            if escalation.wait_for(|escalated| *escalated).await.is_ok() {
                warn!("Shutting down after repeated global rate limits");
                shutdown.shutdown();
            }
        }))
    }

    /// Uploads the registered commands to Discord, replacing the ones there.
    ///
    /// **Note**: Discord allows 100 global command updates per day. Syncing to a guild while
    /// developing doesn't count against it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::CommandSync`] wrapping the cause if the upload failed.
    pub async fn sync_commands(&self, options: SyncOptions) -> Result<Vec<Value>> {
        let commands = match &options.whitelist {
            Some(names) => self.commands.filter(
                |command| names.iter().any(|name| name.eq_ignore_ascii_case(command.name())),
                None,
            ),
            None => self.commands.all(),
        };
        let commands: Vec<&Command> = commands.iter().map(Arc::as_ref).collect();

        let synced = match options.guild_id {
            Some(guild_id) => self.http.create_guild_commands(guild_id, &commands).await,
            None => self.http.create_global_commands(&commands).await,
        };

        match synced {
            Ok(synced) => {
                debug!("Synced {} commands", synced.len());
                Ok(synced)
            },
            Err(why) => Err(ClientError::CommandSync(Box::new(why)).into()),
        }
    }

    /// Measures the round trip to the API with a request that is never rate limited.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the request failed.
    pub async fn latency(&self) -> Result<Duration> {
        let started = Instant::now();
        self.http.get_gateway().await?;
        Ok(started.elapsed())
    }
}
