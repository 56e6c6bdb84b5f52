use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::{Client, ClientBuilder, Response as ReqwestResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{
    ErrorResponse,
    HttpError,
    LightMethod,
    Ratelimiter,
    RatelimiterSettings,
    Request,
    Route,
};
use crate::internal::prelude::*;
use crate::model::prelude::*;

/// A builder implementing [`Http`] with extra configuration.
///
/// The only required field is the bot token. Everything else falls back to sensible defaults: a
/// fresh [`reqwest::Client`], a [`Ratelimiter`] with [`RatelimiterSettings::default`], and the
/// application id encoded in the token.
#[must_use]
pub struct HttpBuilder {
    client: Option<Client>,
    ratelimiter_settings: RatelimiterSettings,
    ratelimiter_disabled: bool,
    token: SecretString,
    proxy: Option<String>,
    application_id: Option<ApplicationId>,
}

impl HttpBuilder {
    /// Construct a new builder to call methods on for the HTTP construction. The `token` will
    /// automatically be prefixed "Bot " if not already.
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            client: None,
            ratelimiter_settings: RatelimiterSettings::default(),
            ratelimiter_disabled: false,
            token: SecretString::new(parse_token(token)),
            proxy: None,
            application_id: None,
        }
    }

    /// Sets the application_id to use interactions. Without it, the id encoded in the token is
    /// used.
    pub fn application_id(mut self, application_id: ApplicationId) -> Self {
        self.application_id = Some(application_id);
        self
    }

    /// Sets the [`reqwest::Client`]. If one isn't provided, a default one will be used.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the settings of the [`Ratelimiter`] built for this client.
    pub fn ratelimiter_settings(mut self, settings: RatelimiterSettings) -> Self {
        self.ratelimiter_settings = settings;
        self
    }

    /// Sets whether or not the ratelimiter is disabled. By default if this this not used, it is
    /// enabled. In most cases, this should be used in conjunction with [`Self::proxy`].
    ///
    /// **Note**: You should **not** disable the ratelimiter unless you have another form of rate
    /// limiting. Disabling the ratelimiter has the main purpose of delegating rate limiting to an
    /// API proxy via [`Self::proxy`] instead of the current process.
    pub fn ratelimiter_disabled(mut self, ratelimiter_disabled: bool) -> Self {
        self.ratelimiter_disabled = ratelimiter_disabled;
        self
    }

    /// Sets the proxy that Discord HTTP API requests will be passed to. This is mainly intended
    /// for something like [`twilight-http-proxy`] where multiple processes can make API requests
    /// while sharing a single ratelimiter, and for pointing the client at a local server in tests.
    ///
    /// The proxy should be in the form of the protocol and hostname, e.g.
    /// `http://127.0.0.1:3000` or `http://myproxy.example`. The `https://discord.com` prefix of
    /// every request path is replaced with it.
    ///
    /// [`twilight-http-proxy`]: https://github.com/twilight-rs/http-proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Use the given configuration to build the `Http` client.
    #[must_use]
    pub fn build(self) -> Http {
        let application_id = self
            .application_id
            .or_else(|| crate::utils::token::parse_application_id(self.token.expose_secret()));

        let client = self.client.unwrap_or_else(|| {
            let builder = configure_client_backend(Client::builder());
            builder.build().unwrap_or_else(|error| {
                warn!("Cannot configure reqwest::Client, using the default one: {error}");
                Client::new()
            })
        });

        let ratelimiter = (!self.ratelimiter_disabled).then(|| {
            Ratelimiter::new(client.clone(), self.token.clone(), self.ratelimiter_settings)
                .proxy(self.proxy.clone())
        });

        Http {
            client,
            ratelimiter,
            proxy: self.proxy,
            token: self.token,
            application_id: AtomicU64::new(application_id.map_or(0, ApplicationId::get)),
        }
    }
}

fn parse_token(token: impl AsRef<str>) -> Arc<str> {
    let token = token.as_ref().trim();

    if token.starts_with("Bot ") || token.starts_with("Bearer ") {
        Arc::from(token)
    } else {
        Arc::from(format!("Bot {token}"))
    }
}

/// **Note**: For all member functions that return a [`Result`], the Error kind will be either
/// [`Error::Http`] or [`Error::Json`].
#[derive(Debug)]
pub struct Http {
    pub(crate) client: Client,
    pub ratelimiter: Option<Ratelimiter>,
    pub proxy: Option<String>,
    token: SecretString,
    application_id: AtomicU64,
}

impl Http {
    /// Creates a client with the default settings, see [`HttpBuilder`].
    #[must_use]
    pub fn new(token: &str) -> Self {
        HttpBuilder::new(token).build()
    }

    pub fn application_id(&self) -> Option<ApplicationId> {
        let application_id = self.application_id.load(Ordering::Relaxed);
        (application_id != 0).then(|| ApplicationId::new(application_id))
    }

    fn try_application_id(&self) -> Result<ApplicationId> {
        self.application_id().ok_or_else(|| HttpError::ApplicationIdMissing.into())
    }

    pub fn set_application_id(&self, application_id: ApplicationId) {
        self.application_id.store(application_id.get(), Ordering::Relaxed);
    }

    /// The token, including its `Bot ` prefix.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Responds to an interaction with one of the callback types, such as a reply or a deferral.
    ///
    /// Refer to Discord's [docs] for the object it takes.
    ///
    /// [docs]: https://discord.com/developers/docs/interactions/receiving-and-responding#interaction-response-object
    pub async fn create_interaction_response(
        &self,
        interaction_id: InteractionId,
        interaction_token: &str,
        map: &impl Serialize,
    ) -> Result<()> {
        let body = serde_json::to_vec(map)?;

        self.wind(
            204,
            Request::new(
                Route::InteractionResponse {
                    interaction_id,
                    token: interaction_token,
                },
                LightMethod::Post,
            )
            .body(Some(body)),
        )
        .await
    }

    /// Creates a follow-up message for an interaction, waiting for Discord to return it.
    pub async fn create_followup_message(
        &self,
        application_id: ApplicationId,
        interaction_token: &str,
        map: &impl Serialize,
    ) -> Result<Message> {
        let body = serde_json::to_vec(map)?;

        self.fire(
            Request::new(
                Route::WebhookFollowupMessages {
                    application_id,
                    token: interaction_token,
                },
                LightMethod::Post,
            )
            .body(Some(body))
            .params(Some(vec![("wait", String::from("true"))])),
        )
        .await
    }

    /// Edits the initial response to an interaction.
    pub async fn edit_original_interaction_response(
        &self,
        application_id: ApplicationId,
        interaction_token: &str,
        map: &impl Serialize,
    ) -> Result<Message> {
        let body = serde_json::to_vec(map)?;

        self.fire(
            Request::new(
                Route::WebhookOriginalInteractionResponse {
                    application_id,
                    token: interaction_token,
                },
                LightMethod::Patch,
            )
            .body(Some(body)),
        )
        .await
    }

    /// Deletes the initial response to an interaction.
    pub async fn delete_original_interaction_response(
        &self,
        application_id: ApplicationId,
        interaction_token: &str,
    ) -> Result<()> {
        self.wind(
            204,
            Request::new(
                Route::WebhookOriginalInteractionResponse {
                    application_id,
                    token: interaction_token,
                },
                LightMethod::Delete,
            ),
        )
        .await
    }

    /// Edits a follow-up message of an interaction.
    pub async fn edit_followup_message(
        &self,
        application_id: ApplicationId,
        interaction_token: &str,
        message_id: MessageId,
        map: &impl Serialize,
    ) -> Result<Message> {
        let body = serde_json::to_vec(map)?;

        self.fire(
            Request::new(
                Route::WebhookFollowupMessage {
                    application_id,
                    token: interaction_token,
                    message_id,
                },
                LightMethod::Patch,
            )
            .body(Some(body)),
        )
        .await
    }

    /// Deletes a follow-up message of an interaction.
    pub async fn delete_followup_message(
        &self,
        application_id: ApplicationId,
        interaction_token: &str,
        message_id: MessageId,
    ) -> Result<()> {
        self.wind(
            204,
            Request::new(
                Route::WebhookFollowupMessage {
                    application_id,
                    token: interaction_token,
                    message_id,
                },
                LightMethod::Delete,
            ),
        )
        .await
    }

    /// Overwrites every global application command with `map`, a list of command objects.
    ///
    /// **Note**: Discord allows 100 global command updates per day. Guild commands are not
    /// limited this way, and are preferable while developing.
    pub async fn create_global_commands(&self, map: &impl Serialize) -> Result<Vec<Value>> {
        let body = serde_json::to_vec(map)?;

        self.fire(
            Request::new(
                Route::Commands {
                    application_id: self.try_application_id()?,
                },
                LightMethod::Put,
            )
            .body(Some(body)),
        )
        .await
    }

    /// Overwrites every application command of one guild with `map`.
    pub async fn create_guild_commands(
        &self,
        guild_id: GuildId,
        map: &impl Serialize,
    ) -> Result<Vec<Value>> {
        let body = serde_json::to_vec(map)?;

        self.fire(
            Request::new(
                Route::GuildCommands {
                    application_id: self.try_application_id()?,
                    guild_id,
                },
                LightMethod::Put,
            )
            .body(Some(body)),
        )
        .await
    }

    /// Sends a message to a channel.
    ///
    /// Refer to Discord's [docs] for the object it takes; a [`CreateMessage`] serializes to it.
    ///
    /// [docs]: https://discord.com/developers/docs/resources/channel#create-message
    /// [`CreateMessage`]: crate::builder::CreateMessage
    pub async fn send_message(&self, channel_id: ChannelId, map: &impl Serialize) -> Result<Message> {
        let body = serde_json::to_vec(map)?;

        self.fire(
            Request::new(
                Route::ChannelMessages {
                    channel_id,
                },
                LightMethod::Post,
            )
            .body(Some(body)),
        )
        .await
    }

    /// Edits a message sent by the bot.
    pub async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        map: &impl Serialize,
    ) -> Result<Message> {
        let body = serde_json::to_vec(map)?;

        self.fire(
            Request::new(
                Route::ChannelMessage {
                    channel_id,
                    message_id,
                },
                LightMethod::Patch,
            )
            .body(Some(body)),
        )
        .await
    }

    /// Deletes a message.
    pub async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()> {
        self.wind(
            204,
            Request::new(
                Route::ChannelMessage {
                    channel_id,
                    message_id,
                },
                LightMethod::Delete,
            ),
        )
        .await
    }

    /// Publishes a message in an announcement channel to the channels following it.
    pub async fn crosspost_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<Message> {
        self.fire(Request::new(
            Route::ChannelMessageCrosspost {
                channel_id,
                message_id,
            },
            LightMethod::Post,
        ))
        .await
    }

    /// Opens the direct message channel with a user, or gets it if it already exists.
    ///
    /// **Note**: This route is heavily ratelimited; reuse [`Message::channel_id`] of earlier
    /// direct messages where possible.
    pub async fn create_private_channel(&self, user_id: UserId) -> Result<PrivateChannel> {
        let body = serde_json::to_vec(&serde_json::json!({ "recipient_id": user_id }))?;

        self.fire(Request::new(Route::UserMeDmChannels, LightMethod::Post).body(Some(body))).await
    }

    /// Sends a direct message to a user, opening the channel first.
    pub async fn send_private_message(
        &self,
        user_id: UserId,
        map: &impl Serialize,
    ) -> Result<Message> {
        let channel = self.create_private_channel(user_id).await?;
        self.send_message(channel.id, map).await
    }

    /// Gets a user by Id.
    pub async fn get_user(&self, user_id: UserId) -> Result<User> {
        self.fire(Request::new(
            Route::User {
                user_id,
            },
            LightMethod::Get,
        ))
        .await
    }

    /// Gets a member of a guild, with [`Member::guild_id`] filled in.
    pub async fn get_member(&self, guild_id: GuildId, user_id: UserId) -> Result<Member> {
        let mut member: Member = self
            .fire(Request::new(
                Route::GuildMember {
                    guild_id,
                    user_id,
                },
                LightMethod::Get,
            ))
            .await?;
        member.guild_id = Some(guild_id);

        Ok(member)
    }

    /// Gets the gateway url. Used to probe the latency to the API; the route is not ratelimited.
    pub async fn get_gateway(&self) -> Result<Value> {
        self.fire(Request::new(Route::Gateway, LightMethod::Get)).await
    }

    /// Gets the user the token belongs to.
    pub async fn get_current_user(&self) -> Result<User> {
        self.fire(Request::new(Route::UserMe, LightMethod::Get)).await
    }

    /// Fires off a request, deserializing the response reader via the given type bound.
    ///
    /// # Errors
    ///
    /// If there is an error, it will be either [`Error::Http`] or [`Error::Json`].
    pub async fn fire<T: DeserializeOwned>(&self, req: Request<'_>) -> Result<T> {
        let response = self.request(req).await?;
        let bytes = response.bytes().await.map_err(HttpError::from)?;

        serde_json::from_slice(&bytes).map_err(From::from)
    }

    /// Performs a request, ratelimiting it if necessary.
    ///
    /// Returns the raw reqwest Response. Use [`Self::fire`] to deserialize the response into some
    /// type.
    #[cfg_attr(feature = "tracing_instrument", tracing::instrument(skip(self)))]
    pub async fn request(&self, req: Request<'_>) -> Result<ReqwestResponse> {
        let response = if let Some(ratelimiter) = &self.ratelimiter {
            ratelimiter.perform(req).await?
        } else {
            let request =
                req.build(&self.client, self.token.expose_secret(), self.proxy.as_deref())?;
            self.client.execute(request.build().map_err(HttpError::from)?).await?
        };

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Error::Http(HttpError::UnsuccessfulRequest(
                ErrorResponse::from_response(response).await,
            )))
        }
    }

    /// Performs a request and then verifies that the response status code is equal to the
    /// expected value.
    ///
    /// This is a function that performs a light amount of work and returns an empty tuple, so it's
    /// called "self.wind" to denote that it's lightweight.
    pub(super) async fn wind(&self, expected: u16, req: Request<'_>) -> Result<()> {
        let route = req.route;
        let response = self.request(req).await?;

        let response_status = response.status().as_u16();
        if response_status != expected {
            debug!(
                "Mismatched successful response status from {}! Expected {} but got {}",
                route.path(),
                expected,
                response_status
            );
        }

        Ok(())
    }
}

fn configure_client_backend(builder: ClientBuilder) -> ClientBuilder {
    #[cfg(feature = "rustls_backend")]
    let builder = builder.use_rustls_tls();

    #[cfg(all(feature = "native_tls_backend", not(feature = "rustls_backend")))]
    let builder = builder.use_native_tls();

    builder
}
