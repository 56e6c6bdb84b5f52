//! Routes are used for ratelimiting. These are to differentiate between the different _types_ of
//! routes for the most part, with the exception being major parameters.
//!
//! [Taken from] the Discord docs, major parameters are:
//!
//! > Additionally, rate limits take into account major parameters in the URL. For example,
//! > `/channels/:channel_id` and `/channels/:channel_id/messages/:message_id` both take
//! > `channel_id` into account when generating rate limits since it's the major parameter.
//!
//! Discord names the bucket a route belongs to in the `x-ratelimit-bucket` header. The
//! [`Ratelimiter`] remembers which bucket each route resolved to, and keys the [`BucketStore`] by
//! that bucket plus the route's major parameter, so two interactions never wait on each other's
//! callback bucket.
//!
//! On top of the per-bucket limits, a bot may only start a fixed number of requests per second
//! (50 by default). The [`GlobalWindow`] hands out slots in one second windows; once a window is
//! full, further requests are given a slot in the next one and wait for it.
//!
//! [Taken from]: https://discord.com/developers/docs/topics/rate-limits#rate-limits

use std::borrow::Cow;
use std::fmt;
use std::str::{self, FromStr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use tokio::sync::{watch, Mutex};
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

use super::routing::RatelimitingBucket;
use super::{BucketStore, HttpError, LightMethod, Request};
use crate::internal::prelude::*;

const WINDOW: Duration = Duration::from_secs(1);

/// Passed to the [`Ratelimiter::set_ratelimit_callback`] callback. If using Client, that callback
/// is initialized to call the `EventHandler::ratelimit()` method.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct RatelimitInfo {
    pub timeout: Duration,
    pub method: LightMethod,
    pub path: Cow<'static, str>,
    pub global: bool,
    /// The bucket key the wait applies to, unknown for global waits.
    pub bucket: Option<String>,
}

/// What the [`Ratelimiter`] does when Discord reports a global ratelimit a second time for the
/// same request.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GlobalRatelimitPolicy {
    /// Only the request fails, with [`HttpError::GlobalRatelimit`].
    #[default]
    FailRequest,
    /// The request fails and the client is told to shut down its listener.
    Shutdown,
}

/// Tunables for the [`Ratelimiter`].
#[derive(Clone, Debug)]
pub struct RatelimiterSettings {
    /// Requests started per second before further requests are pushed into the next window. `0`
    /// turns the window off.
    pub global_limit: u32,
    /// Added to every `retry-after` before a 429 is retried.
    pub cooldown_offset: Duration,
    /// Sweep expired buckets after this many requests. `0` turns the count trigger off.
    pub sweep_every: u64,
    /// How often the client sweeps expired buckets in the background.
    pub sweep_interval: Duration,
    /// Routes unused for this long forget the bucket Discord assigned them, unless that bucket is
    /// still exhausted.
    pub route_idle: Duration,
    pub global_policy: GlobalRatelimitPolicy,
}

impl Default for RatelimiterSettings {
    fn default() -> Self {
        Self {
            global_limit: 50,
            cooldown_offset: Duration::from_millis(1000),
            sweep_every: 500,
            sweep_interval: Duration::from_secs(30),
            route_idle: Duration::from_secs(60),
            global_policy: GlobalRatelimitPolicy::FailRequest,
        }
    }
}

#[derive(Debug)]
struct WindowState {
    start: Option<Instant>,
    count: u32,
}

/// The bucket a route resolved to, and when a response on it was last seen.
#[derive(Debug)]
struct RouteBucket {
    key: String,
    seen: Instant,
}

/// Admission control for the global request limit.
///
/// Every caller takes one slot. Slots are counted in one second windows starting at the first
/// request; when the current window is full the slot is taken from the next one, so a burst of
/// requests is spread over as many future windows as it needs.
#[derive(Debug)]
pub struct GlobalWindow {
    limit: u32,
    state: parking_lot::Mutex<WindowState>,
}

impl GlobalWindow {
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            state: parking_lot::Mutex::new(WindowState {
                start: None,
                count: 0,
            }),
        }
    }

    /// Takes a slot, returning how long to wait at `now` until that slot's window opens.
    pub fn acquire(&self, now: Instant) -> Option<Duration> {
        if self.limit == 0 {
            return None;
        }

        let mut state = self.state.lock();

        let mut start = match state.start {
            Some(start) if now < start + WINDOW => start,
            _ => {
                state.count = 0;
                now
            },
        };

        if state.count >= self.limit {
            start += WINDOW;
            state.count = 0;
        }

        state.start = Some(start);
        state.count += 1;

        (start > now).then(|| start - now)
    }
}

/// Ratelimiter for requests to the Discord API.
///
/// Every request first takes a slot from the [`GlobalWindow`], then waits out its bucket if the
/// last response on that bucket reported no requests remaining. A `429` is retried after its
/// `retry-after` plus [`RatelimiterSettings::cooldown_offset`].
///
/// A global ratelimit blocks every request, regardless of route, until it is over. It is retried
/// once; if Discord answers with a global 429 again, the request fails and the
/// [`GlobalRatelimitPolicy`] decides what else happens.
pub struct Ratelimiter {
    client: Client,
    token: SecretString,
    proxy: Option<String>,
    global: Mutex<()>,
    routes: DashMap<RatelimitingBucket, RouteBucket>,
    buckets: BucketStore,
    window: GlobalWindow,
    settings: RatelimiterSettings,
    requests: AtomicU64,
    ratelimit_callback: parking_lot::RwLock<Box<dyn Fn(RatelimitInfo) + Send + Sync>>,
    escalation: watch::Sender<bool>,
}

impl fmt::Debug for Ratelimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ratelimiter")
            .field("client", &self.client)
            .field("token", &self.token)
            .field("proxy", &self.proxy)
            .field("global", &self.global)
            .field("routes", &self.routes)
            .field("buckets", &self.buckets)
            .field("window", &self.window)
            .field("settings", &self.settings)
            .field("requests", &self.requests)
            .field("ratelimit_callback", &"Fn(RatelimitInfo)")
            .finish_non_exhaustive()
    }
}

impl Ratelimiter {
    /// Creates a new ratelimiter, with a shared [`reqwest`] client and the bot's token.
    ///
    /// The bot token must be prefixed with `"Bot "`. The ratelimiter does not prefix it.
    #[must_use]
    pub fn new(client: Client, token: SecretString, settings: RatelimiterSettings) -> Self {
        Self {
            client,
            token,
            proxy: None,
            global: Mutex::default(),
            routes: DashMap::new(),
            buckets: BucketStore::new(),
            window: GlobalWindow::new(settings.global_limit),
            settings,
            requests: AtomicU64::new(0),
            ratelimit_callback: parking_lot::RwLock::new(Box::new(|_| {})),
            escalation: watch::channel(false).0,
        }
    }

    /// Sends requests to `proxy` instead of `https://discord.com`.
    #[must_use]
    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Sets a callback to be called when a route is rate limited.
    pub fn set_ratelimit_callback(
        &self,
        ratelimit_callback: Box<dyn Fn(RatelimitInfo) + Send + Sync>,
    ) {
        *self.ratelimit_callback.write() = ratelimit_callback;
    }

    /// The bucket resets of exhausted buckets.
    #[must_use]
    pub fn buckets(&self) -> &BucketStore {
        &self.buckets
    }

    #[must_use]
    pub fn settings(&self) -> &RatelimiterSettings {
        &self.settings
    }

    /// Flips to `true` when a global ratelimit breach asks for the client to stop, see
    /// [`GlobalRatelimitPolicy::Shutdown`].
    #[must_use]
    pub fn subscribe_escalation(&self) -> watch::Receiver<bool> {
        self.escalation.subscribe()
    }

    /// Drops every bucket entry whose reset already passed, and forgets idle routes. Returns how
    /// many bucket entries were dropped.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let removed = self.buckets.sweep(now);

        let before = self.routes.len();
        self.routes.retain(|_, route| {
            now.saturating_duration_since(route.seen) < self.settings.route_idle
                || self.buckets.reset_at(&route.key).is_some()
        });
        trace!(forgotten = before.saturating_sub(self.routes.len()), "Swept idle routes");

        removed
    }

    /// How many routes currently know their bucket.
    #[must_use]
    pub fn known_routes(&self) -> usize {
        self.routes.len()
    }

    fn route_key(&self, bucket: RatelimitingBucket) -> Option<String> {
        self.routes.get(&bucket).map(|route| route.key.clone())
    }

    /// # Errors
    ///
    /// Only error kind that may be returned is [`Error::Http`].
    #[cfg_attr(feature = "tracing_instrument", tracing::instrument(skip(self)))]
    pub async fn perform(&self, req: Request<'_>) -> Result<Response> {
        let ratelimiting_bucket = req.route.ratelimiting_bucket();
        let mut global_retried = false;

        loop {
            // Wait out a global ratelimit another request is sleeping on.
            drop(self.global.lock().await);

            if let Some(delay) = self.window.acquire(Instant::now()) {
                debug!(delay_ms = delay.as_millis(), "Global request window full, delaying request");
                sleep(delay).await;
            }

            if let Some(delay) = self.pre_hook(ratelimiting_bucket, &req) {
                sleep(delay).await;
            }

            let request =
                req.build(&self.client, self.token.expose_secret(), self.proxy.as_deref())?;
            let response = self.client.execute(request.build()?).await?;
            self.count_request();

            if ratelimiting_bucket.is_none() {
                return Ok(response);
            }

            self.post_hook(ratelimiting_bucket, response.headers(), Instant::now())?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            let retry_after =
                parse_header::<f64>(response.headers(), "retry-after")?.map_or(Duration::ZERO, secs);
            let delay = retry_after + self.settings.cooldown_offset;
            let global = is_global(response.headers());

            (self.ratelimit_callback.read())(RatelimitInfo {
                timeout: delay,
                method: req.method,
                path: req.route.path(),
                global,
                bucket: self.route_key(ratelimiting_bucket),
            });

            if !global {
                debug!(?ratelimiting_bucket, delay_ms = delay.as_millis(), "Ratelimited on route");
                sleep(delay).await;
                continue;
            }

            if global_retried {
                warn!(
                    retry_after_ms = retry_after.as_millis(),
                    policy = ?self.settings.global_policy,
                    "Global ratelimit hit again after retrying"
                );

                if self.settings.global_policy == GlobalRatelimitPolicy::Shutdown {
                    self.escalation.send_replace(true);
                }

                return Err(HttpError::GlobalRatelimit {
                    retry_after,
                }
                .into());
            }

            warn!(delay_ms = delay.as_millis(), "Globally ratelimited, retrying once");
            global_retried = true;

            let _global = self.global.lock().await;
            sleep(delay).await;
        }
    }

    /// Returns how long the request has to wait for its bucket, if the bucket is known and
    /// exhausted.
    fn pre_hook(&self, bucket: RatelimitingBucket, req: &Request<'_>) -> Option<Duration> {
        if bucket.is_none() {
            return None;
        }

        let key = self.route_key(bucket)?;
        let delay = self.buckets.delay_for(&key, Instant::now())?;

        debug!(bucket = %key, delay_ms = delay.as_millis(), "Pre-emptive ratelimit on route");
        (self.ratelimit_callback.read())(RatelimitInfo {
            timeout: delay,
            method: req.method,
            path: req.route.path(),
            global: false,
            bucket: Some(key),
        });

        Some(delay)
    }

    /// Learns the route's bucket from the response headers and records its reset when it has no
    /// requests remaining.
    fn post_hook(
        &self,
        bucket: RatelimitingBucket,
        headers: &HeaderMap,
        now: Instant,
    ) -> Result<()> {
        let Some(hash) = headers.get("x-ratelimit-bucket").and_then(|v| v.to_str().ok()) else {
            return Ok(());
        };

        let key = match bucket.major_parameter() {
            Some(id) => format!("{hash}:{id}"),
            None => hash.to_owned(),
        };
        self.routes.insert(bucket, RouteBucket {
            key: key.clone(),
            seen: now,
        });

        match parse_header::<i64>(headers, "x-ratelimit-remaining")? {
            Some(0) => {
                let wait = if let Some(after) =
                    parse_header::<f64>(headers, "x-ratelimit-reset-after")?
                {
                    secs(after)
                } else if let Some(reset) = parse_header::<f64>(headers, "x-ratelimit-reset")? {
                    (UNIX_EPOCH + secs(reset)).duration_since(SystemTime::now()).unwrap_or_default()
                } else {
                    return Ok(());
                };

                self.buckets.record(key, now + wait);
            },
            Some(_) => self.buckets.clear(&key),
            None => {},
        }

        Ok(())
    }

    fn count_request(&self) {
        let count = self.requests.fetch_add(1, Ordering::Relaxed) + 1;

        if self.settings.sweep_every != 0 && count % self.settings.sweep_every == 0 {
            self.sweep();
        }
    }
}

fn is_global(headers: &HeaderMap) -> bool {
    headers.contains_key("x-ratelimit-global")
        || headers.get("x-ratelimit-scope").is_some_and(|scope| scope == "global")
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

fn parse_header<T: FromStr>(headers: &HeaderMap, header: &str) -> Result<Option<T>> {
    let Some(header) = headers.get(header) else { return Ok(None) };

    let unicode =
        str::from_utf8(header.as_bytes()).map_err(|_| Error::from(HttpError::RateLimitUtf8))?;

    let num = unicode.parse().map_err(|_| Error::from(HttpError::RateLimitI64F64))?;

    Ok(Some(num))
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;
    use std::result::Result as StdResult;

    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

    use super::*;
    use crate::http::Route;
    use crate::model::id::{ApplicationId, InteractionId};

    type TestResult<T> = StdResult<T, Box<dyn StdError>>;

    fn headers() -> HeaderMap {
        let pairs = &[
            (HeaderName::from_static("x-ratelimit-limit"), HeaderValue::from_static("5")),
            (HeaderName::from_static("x-ratelimit-remaining"), HeaderValue::from_static("4")),
            (
                HeaderName::from_static("x-ratelimit-reset"),
                HeaderValue::from_static("1560704880.423"),
            ),
            (HeaderName::from_static("x-bad-num"), HeaderValue::from_static("abc")),
            (
                HeaderName::from_static("x-bad-unicode"),
                HeaderValue::from_bytes(&[255, 255, 255, 255]).unwrap(),
            ),
        ];

        let mut map = HeaderMap::with_capacity(pairs.len());

        for (name, val) in pairs {
            map.insert(name, val.clone());
        }

        map
    }

    fn ratelimiter() -> Ratelimiter {
        Ratelimiter::new(Client::new(), SecretString::from("Bot token"), RatelimiterSettings::default())
    }

    fn bucket() -> RatelimitingBucket {
        Route::WebhookFollowupMessages {
            application_id: ApplicationId::new(7),
            token: "tok",
        }
        .ratelimiting_bucket()
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_parse_header_good() -> TestResult<()> {
        let headers = headers();

        assert_eq!(parse_header::<i64>(&headers, "x-ratelimit-limit")?.unwrap(), 5);
        assert_eq!(parse_header::<i64>(&headers, "x-ratelimit-remaining")?.unwrap(), 4,);
        assert_eq!(parse_header::<f64>(&headers, "x-ratelimit-reset")?.unwrap(), 1_560_704_880.423);

        Ok(())
    }

    #[test]
    fn test_parse_header_errors() {
        let headers = headers();

        assert!(matches!(
            parse_header::<i64>(&headers, "x-bad-num").unwrap_err(),
            Error::Http(HttpError::RateLimitI64F64)
        ));
        assert!(matches!(
            parse_header::<i64>(&headers, "x-bad-unicode").unwrap_err(),
            Error::Http(HttpError::RateLimitUtf8)
        ));
    }

    #[test]
    fn global_window_spills_into_next_windows() {
        let window = GlobalWindow::new(2);
        let now = Instant::now();

        assert_eq!(window.acquire(now), None);
        assert_eq!(window.acquire(now), None);
        assert_eq!(window.acquire(now), Some(WINDOW));
        assert_eq!(window.acquire(now), Some(WINDOW));
        assert_eq!(window.acquire(now), Some(WINDOW * 2));

        // Once the queued windows have passed, counting starts over.
        let later = now + WINDOW * 4;
        assert_eq!(window.acquire(later), None);
    }

    #[test]
    fn global_window_disabled() {
        let window = GlobalWindow::new(0);
        let now = Instant::now();

        for _ in 0..100 {
            assert_eq!(window.acquire(now), None);
        }
    }

    #[test]
    fn exhausted_bucket_delays_until_reset() {
        let ratelimiter = ratelimiter();
        let now = Instant::now();

        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-bucket", HeaderValue::from_static("abcd"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset-after", HeaderValue::from_static("2"));
        ratelimiter.post_hook(bucket(), &headers, now).unwrap();

        let key = ratelimiter.route_key(bucket()).unwrap();
        assert_eq!(key, "abcd:7");

        let reset = now + Duration::from_secs(2);
        assert_eq!(ratelimiter.buckets().reset_at(&key), Some(reset));
        assert_eq!(
            ratelimiter.buckets().delay_for(&key, reset - Duration::from_millis(1)),
            Some(Duration::from_millis(1))
        );
        assert_eq!(ratelimiter.buckets().delay_for(&key, reset + Duration::from_millis(1)), None);
    }

    #[test]
    fn remaining_requests_clear_bucket() {
        let ratelimiter = ratelimiter();
        let now = Instant::now();

        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-bucket", HeaderValue::from_static("abcd"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset-after", HeaderValue::from_static("60"));
        ratelimiter.post_hook(bucket(), &headers, now).unwrap();
        assert_eq!(ratelimiter.buckets().len(), 1);

        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("3"));
        ratelimiter.post_hook(bucket(), &headers, now).unwrap();
        assert!(ratelimiter.buckets().is_empty());
    }

    #[test]
    fn sweep_forgets_idle_routes() {
        let ratelimiter = ratelimiter();
        let start = Instant::now();

        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-bucket", HeaderValue::from_static("cb"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4"));
        for id in 1..=1000 {
            let bucket = Route::InteractionResponse {
                interaction_id: InteractionId::new(id),
                token: "tok",
            }
            .ratelimiting_bucket();
            ratelimiter.post_hook(bucket, &headers, start).unwrap();
        }

        // One route whose bucket is still exhausted when the rest go idle.
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset-after", HeaderValue::from_static("600"));
        ratelimiter.post_hook(bucket(), &headers, start).unwrap();
        assert_eq!(ratelimiter.known_routes(), 1001);

        ratelimiter.sweep_at(start + Duration::from_secs(1));
        assert_eq!(ratelimiter.known_routes(), 1001);

        ratelimiter.sweep_at(start + Duration::from_secs(61));
        assert_eq!(ratelimiter.known_routes(), 1);
        assert_eq!(ratelimiter.route_key(bucket()).as_deref(), Some("cb:7"));

        ratelimiter.sweep_at(start + Duration::from_secs(601));
        assert_eq!(ratelimiter.known_routes(), 0);
    }

    #[test]
    fn global_scope_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_global(&headers));

        headers.insert("x-ratelimit-scope", HeaderValue::from_static("shared"));
        assert!(!is_global(&headers));

        headers.insert("x-ratelimit-scope", HeaderValue::from_static("global"));
        assert!(is_global(&headers));

        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-global", HeaderValue::from_static("true"));
        assert!(is_global(&headers));
    }

    #[test]
    fn negative_durations_do_not_panic() {
        assert_eq!(secs(-1.0), Duration::ZERO);
        assert_eq!(secs(f64::NAN), Duration::ZERO);
        assert_eq!(secs(1.5), Duration::from_millis(1500));
    }
}
