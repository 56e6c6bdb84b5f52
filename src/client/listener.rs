//! The HTTP endpoint Discord posts interactions to.

use std::io::{Error as IoError, ErrorKind};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, warn};

use super::dispatch::Dispatcher;
use crate::constants::{PONG_BODY, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::interactions_endpoint::Verifier;
use crate::model::application::Interaction;

/// Stops a running [`Client`] listener.
///
/// Requests being handled are finished first. A client that was shut down stays so; serving
/// with it again returns right away.
///
/// [`Client`]: super::Client
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub(crate) fn new() -> Self {
        Self {
            sender: Arc::new(watch::channel(false).0),
        }
    }

    /// Asks the listener to stop.
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once [`Self::shutdown`] was called.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so this cannot fail.
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}

pub(crate) struct Endpoint {
    pub(crate) verifier: Verifier,
    pub(crate) dispatcher: Arc<Dispatcher>,
}

pub(crate) fn router(endpoint: Arc<Endpoint>) -> Router {
    Router::new().fallback(handle).with_state(endpoint)
}

async fn handle(
    State(endpoint): State<Arc<Endpoint>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let signature = header_str(&headers, SIGNATURE_HEADER);
    let timestamp = header_str(&headers, TIMESTAMP_HEADER);
    let verified = endpoint.verifier.verify_headers(signature, timestamp, &body);
    if verified.is_err() {
        debug!("Rejected a request with a missing or invalid signature");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let interaction = match Interaction::decode(&body, &endpoint.dispatcher.http) {
        Ok(Some(interaction)) => interaction,
        Ok(None) => return StatusCode::OK.into_response(),
        Err(why) => {
            warn!("Failed to decode interaction: {why}");
            return StatusCode::BAD_REQUEST.into_response();
        },
    };

    if let Interaction::Ping(_) = interaction {
        return ([(header::CONTENT_TYPE, "application/json")], PONG_BODY).into_response();
    }

    endpoint.dispatcher.dispatch(interaction);
    StatusCode::OK.into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Errors after which accepting again is expected to succeed.
fn is_transient(why: &IoError) -> bool {
    matches!(
        why.kind(),
        ErrorKind::BrokenPipe
            | ErrorKind::Interrupted
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
    )
}

/// A [`TcpListener`] that retries transient accept errors, and shuts the server down on any
/// other.
pub(crate) struct AcceptLoop {
    pub(crate) inner: TcpListener,
    pub(crate) shutdown: ShutdownHandle,
    pub(crate) fatal: Arc<Mutex<Option<IoError>>>,
}

impl axum::serve::Listener for AcceptLoop {
    type Io = TcpStream;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            match self.inner.accept().await {
                Ok(connection) => return connection,
                Err(why) if is_transient(&why) => {
                    debug!("Retrying after transient accept error: {why}");
                },
                Err(why) => {
                    error!("Failed to accept connection: {why}");
                    self.fatal.lock().get_or_insert(why);
                    self.shutdown.shutdown();
                    // Graceful shutdown takes it from here.
                    std::future::pending::<()>().await;
                },
            }
        }
    }

    fn local_addr(&self) -> std::io::Result<Self::Addr> {
        self.inner.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(is_transient(&IoError::from(ErrorKind::ConnectionReset)));
        assert!(is_transient(&IoError::from(ErrorKind::Interrupted)));
        assert!(!is_transient(&IoError::from(ErrorKind::PermissionDenied)));
    }

    #[tokio::test]
    async fn shutdown_handle() {
        let handle = ShutdownHandle::new();
        assert!(!handle.is_shutdown());

        let waiting = tokio::spawn({
            let handle = handle.clone();
            async move { handle.wait().await }
        });
        handle.shutdown();

        waiting.await.unwrap();
        assert!(handle.is_shutdown());
    }
}
