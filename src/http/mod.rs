//! The HTTP module which provides functions for performing requests to endpoints in Discord's API.
//!
//! An important function of the REST API is ratelimiting. Requests to endpoints are ratelimited to
//! prevent spam, and once ratelimited Discord will stop performing requests. The library
//! implements protection to pre-emptively ratelimit, to ensure that no wasted requests are made.
//!
//! Every outbound call goes through one gate, the [`Ratelimiter`], which applies:
//!
//! - a global admission window, capping how many requests start per second;
//! - per-bucket delays learned from `x-ratelimit-*` response headers, kept in a [`BucketStore`];
//! - rescheduling after a `429 Too Many Requests`.
//!
//! Only the endpoints the framework needs are covered: interaction callbacks and webhooks, command
//! sync, the current user and the gateway probe.

mod bucket_store;
mod client;
mod error;
mod ratelimiting;
mod request;
mod routing;

use reqwest::Method;

pub use self::bucket_store::BucketStore;
pub use self::client::*;
pub use self::error::{ErrorResponse, HttpError};
pub use self::ratelimiting::{
    GlobalRatelimitPolicy,
    GlobalWindow,
    RatelimitInfo,
    Ratelimiter,
    RatelimiterSettings,
};
pub use self::request::Request;
pub use self::routing::{RatelimitingBucket, Route};

/// An method used for ratelimiting special routes.
///
/// This is needed because [`reqwest`]'s [`Method`] enum does not derive Copy.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LightMethod {
    /// Indicates that a route is for the `DELETE` method only.
    Delete,
    /// Indicates that a route is for the `GET` method only.
    Get,
    /// Indicates that a route is for the `PATCH` method only.
    Patch,
    /// Indicates that a route is for the `POST` method only.
    Post,
    /// Indicates that a route is for the `PUT` method only.
    Put,
}

impl LightMethod {
    #[must_use]
    pub const fn reqwest_method(self) -> Method {
        match self {
            Self::Delete => Method::DELETE,
            Self::Get => Method::GET,
            Self::Patch => Method::PATCH,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
        }
    }
}
