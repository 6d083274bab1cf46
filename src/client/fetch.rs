//! Core API client implementation.
//!
//! [`ApiClient`] is the single chokepoint for every outbound request: it
//! owns the server base URL, the current bearer token, the CSRF token, and
//! the error observer, and enforces consistent auth and error semantics
//! across all of them.
//!
//! # Examples
//!
//! ## Simple GET request
//!
//! ```ignore
//! use ci_http_client::ApiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new("https://ci.example.com", Some("h.p.s"), None);
//!     let body = client.get("/api/user").await?;
//!     println!("{body:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Global error observer
//!
//! ```ignore
//! client.set_error_handler(|err| {
//!     if err.status == 401 {
//!         // drop the session, show the login screen, ...
//!     }
//! });
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::header;
use reqwest::Method;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::query::{encode_query_string, QueryValue};
use crate::token::is_valid_token;

use super::subscription::{self, SubscribeOptions, Subscription};

/// Header carrying the anti-forgery token on mutating requests.
const CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Query parameter carrying the bearer token on subscription URLs, where
/// custom request headers are unavailable.
const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Error observer invoked for every failed request.
pub(crate) type ErrorHandler = Arc<dyn Fn(&ApiError) + Send + Sync>;

/// Decoded response body of a successful request.
///
/// The server answers with JSON (`Content-Type: application/json`) or plain
/// text; the client decodes by content type rather than guessing from the
/// body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Body decoded from an `application/json` response.
    Json(Value),
    /// Raw body of any other response.
    Text(String),
}

impl ApiResponse {
    /// Decode the body into a concrete type.
    ///
    /// Text bodies are parsed as JSON as a fallback, so endpoints that omit
    /// the content type still decode.
    pub fn into_json<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        match self {
            ApiResponse::Json(value) => Ok(serde_json::from_value(value)?),
            ApiResponse::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }
}

/// HTTP and push-channel client for the CI server API.
///
/// All request methods share one pipeline: the bearer token is re-validated
/// structurally at the moment of use (a stale or invalid value degrades to
/// unauthenticated, it never fails the request), the CSRF token is attached
/// to every non-GET request, and cookies always travel with the request so
/// session and bearer auth can coexist.
///
/// Failed requests (non-success status) produce an [`ApiError`] that is
/// delivered twice on purpose: once to the registered error observer, for
/// cross-cutting reactions like a global sign-out, and once to the caller as
/// the returned error.
///
/// The mutable fields (`token`, error observer) sit behind lightweight
/// locks, so the client is shared by reference and never cloned.
pub struct ApiClient {
    server: String,
    token: RwLock<Option<String>>,
    csrf: Option<String>,
    onerror: RwLock<Option<ErrorHandler>>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the given server base URL.
    ///
    /// `server` may be empty for same-origin relative addressing; paths are
    /// appended to it verbatim. The token is validated structurally - an
    /// invalid value is silently downgraded to `None` rather than stored.
    pub fn new(server: impl Into<String>, token: Option<&str>, csrf: Option<&str>) -> Self {
        let token = if is_valid_token(token) {
            token.map(str::to_owned)
        } else {
            None
        };
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap_or_default();

        ApiClient {
            server: server.into(),
            token: RwLock::new(token),
            csrf: csrf.map(str::to_owned),
            onerror: RwLock::new(None),
            http,
        }
    }

    /// Server base URL this client addresses.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Issue a GET request.
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::GET, path, None).await
    }

    /// Issue a POST request with an optional JSON payload.
    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        self.request(Method::POST, path, body).await
    }

    /// Issue a PATCH request with an optional JSON payload.
    pub async fn patch(&self, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        self.request(Method::PATCH, path, body).await
    }

    /// Issue a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::DELETE, path, None).await
    }

    /// Shared request pipeline for all verbs.
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let bearer = self.current_token();

        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.server, path));

        if method != Method::GET {
            if let Some(csrf) = &self.csrf {
                request = request.header(CSRF_HEADER, csrf);
            }
        }
        if let Some(token) = &bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            // Sets Content-Type: application/json alongside the payload.
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .map(str::to_owned)
                .unwrap_or_else(|| status.as_str().to_owned());
            let body_text = response.text().await?;
            let message = if body_text.is_empty() {
                reason
            } else {
                format!("{reason}: {body_text}")
            };

            let err = ApiError {
                status: status.as_u16(),
                message,
            };
            // Observer first, then the caller - both always fire. The
            // handler field is read at failure time, so a replacement
            // installed mid-flight applies to this failure.
            let onerror = self.onerror.read().clone();
            if let Some(onerror) = onerror {
                onerror(&err);
            }
            return Err(err.into());
        }

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        if is_json {
            Ok(ApiResponse::Json(response.json().await?))
        } else {
            Ok(ApiResponse::Text(response.text().await?))
        }
    }

    /// Open a push subscription to a streamed endpoint.
    ///
    /// The callback is invoked synchronously once per inbound message, in
    /// arrival order, with the decoded JSON payload. With
    /// [`SubscribeOptions::reconnect`] enabled (the default) the channel
    /// re-opens itself after transient failures; see
    /// [`super::subscription`] for the full lifecycle.
    ///
    /// When a token is held it is carried in an `access_token` query
    /// parameter, since the stream transport cannot send custom request
    /// headers. Returns a [`Subscription`] handle; dropping the handle does
    /// not close the channel, call [`Subscription::close`] to cancel.
    pub fn subscribe<F>(&self, path: &str, on_message: F, opts: SubscribeOptions) -> Subscription
    where
        F: FnMut(Value) + Send + 'static,
    {
        let mut url = format!("{}{}", self.server, path);
        if let Some(token) = self.current_token() {
            let query = encode_query_string([(ACCESS_TOKEN_PARAM, Some(QueryValue::from(token)))]);
            url = format!("{url}?{query}");
        }

        subscription::open(self.http.clone(), url, on_message, opts)
    }

    /// Replace the error observer.
    ///
    /// Applies to every failure surfaced after the call; requests already
    /// past their failure point keep the observer they saw.
    pub fn set_error_handler<F>(&self, onerror: F)
    where
        F: Fn(&ApiError) + Send + Sync + 'static,
    {
        *self.onerror.write() = Some(Arc::new(onerror));
    }

    /// Replace the bearer token on this instance.
    ///
    /// The value is revalidated structurally; an invalid token is stored as
    /// `None`. Durable persistence is deliberately not coupled here - the
    /// caller keeps the instance and its [`crate::TokenStore`] in sync.
    pub fn set_token(&self, token: Option<&str>) {
        *self.token.write() = if is_valid_token(token) {
            token.map(str::to_owned)
        } else {
            None
        };
    }

    /// The token, iff it passes the structural check right now.
    fn current_token(&self) -> Option<String> {
        let guard = self.token.read();
        let token = guard.as_deref();
        if is_valid_token(token) {
            token.map(str::to_owned)
        } else {
            None
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("server", &self.server)
            .field("token", &self.token.read().as_deref().map(|_| "<redacted>"))
            .field("csrf", &self.csrf.as_deref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_construction_token_is_downgraded() {
        let client = ApiClient::new("http://localhost", Some("not-a-token"), None);
        assert_eq!(client.current_token(), None);
    }

    #[test]
    fn set_token_revalidates() {
        let client = ApiClient::new("http://localhost", None, None);
        client.set_token(Some("h.p.s"));
        assert_eq!(client.current_token().as_deref(), Some("h.p.s"));

        client.set_token(Some("a.b"));
        assert_eq!(client.current_token(), None);
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let client = ApiClient::new("http://localhost", Some("h.p.s"), Some("secret-csrf"));
        let debug = format!("{client:?}");
        assert!(!debug.contains("h.p.s"));
        assert!(!debug.contains("secret-csrf"));
    }
}
