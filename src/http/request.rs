use reqwest::header::{
    HeaderMap as Headers,
    HeaderValue,
    AUTHORIZATION,
    CONTENT_LENGTH,
    CONTENT_TYPE,
    USER_AGENT,
};
use reqwest::{Client, RequestBuilder as ReqwestRequestBuilder, Url};

use super::routing::Route;
use super::{HttpError, LightMethod};
use crate::constants;
use crate::internal::prelude::*;

/// A single outbound call: the route, the method and an optional JSON body.
#[derive(Clone, Debug)]
#[must_use]
pub struct Request<'a> {
    pub(super) body: Option<Vec<u8>>,
    pub(super) headers: Option<Headers>,
    pub(super) method: LightMethod,
    pub(super) route: Route<'a>,
    pub(super) params: Option<Vec<(&'static str, String)>>,
}

impl<'a> Request<'a> {
    pub const fn new(route: Route<'a>, method: LightMethod) -> Self {
        Self {
            body: None,
            headers: None,
            method,
            route,
            params: None,
        }
    }

    pub fn body(mut self, body: Option<Vec<u8>>) -> Self {
        self.body = body;
        self
    }

    pub fn headers(mut self, headers: Option<Headers>) -> Self {
        self.headers = headers;
        self
    }

    pub fn params(mut self, params: Option<Vec<(&'static str, String)>>) -> Self {
        self.params = params;
        self
    }

    /// Turns the request into a [`reqwest`] request, pointing it at `proxy` instead of
    /// `https://discord.com` when one is given.
    ///
    /// # Errors
    ///
    /// Errors if the path, after substituting the proxy, is not a valid URL or the token is not a
    /// valid header value.
    pub fn build(
        &self,
        client: &Client,
        token: &str,
        proxy: Option<&str>,
    ) -> Result<ReqwestRequestBuilder, HttpError> {
        let mut path = self.route.path().into_owned();

        if let Some(proxy) = proxy {
            path = path.replacen("https://discord.com", proxy.trim_end_matches('/'), 1);
        }

        if let Some(params) = &self.params {
            let query = params
                .iter()
                .map(|(param, value)| format!("{param}={value}"))
                .collect::<Vec<_>>()
                .join("&");
            path.push('?');
            path.push_str(&query);
        }

        let mut builder = client.request(self.method.reqwest_method(), Url::parse(&path)?);

        let mut headers = self.headers.clone().unwrap_or_default();
        headers.insert(USER_AGENT, HeaderValue::from_static(constants::USER_AGENT));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(token)?);

        // Discord will return a 400: Bad Request response if we set the content type header,
        // but don't give a body.
        if self.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let length = self.body.as_ref().map_or(0, Vec::len);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));

        if let Some(bytes) = &self.body {
            builder = builder.body(bytes.clone());
        }

        Ok(builder.headers(headers))
    }

    #[must_use]
    pub fn body_ref(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    #[must_use]
    pub fn route(&self) -> Route<'a> {
        self.route
    }

    #[must_use]
    pub const fn method(&self) -> LightMethod {
        self.method
    }
}
