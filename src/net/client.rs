//! Shared HTTP request client for the auth API.
//!
//! DESIGN
//! ======
//! One `reqwest::Client` with a cookie store carries the server-issued
//! session cookie on every call. The client never sees the token value: it
//! arrives via `Set-Cookie` and leaves via `Cookie`, exactly like a browser's
//! ambient credential.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is returned as a `NormalizedError`. A 401 additionally fires
//! the `UnauthorizedSignal` before the error is returned; the caller still
//! receives the error and handles it as usual. Requests made with
//! `RequestOptions::silent()` skip the signal.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

pub use reqwest::Method;

use super::error::NormalizedError;
use super::unauthorized::UnauthorizedSignal;
use crate::config::{ConfigError, SessionConfig};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Do not fire the unauthorized signal on 401.
    pub silent: bool,
}

impl RequestOptions {
    #[must_use]
    pub fn silent() -> Self {
        Self { silent: true }
    }
}

#[derive(Clone, Debug)]
pub struct RequestClient {
    http: reqwest::Client,
    base_url: String,
    signal: UnauthorizedSignal,
}

impl RequestClient {
    /// Build a client with an empty cookie store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the TLS backend fails to initialize.
    pub fn new(config: &SessionConfig, signal: UnauthorizedSignal) -> Result<Self, ConfigError> {
        Self::with_cookie_jar(config, signal, Arc::new(Jar::default()))
    }

    /// Build a client backed by an existing cookie jar, e.g. one restored
    /// from a previous process.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the TLS backend fails to initialize.
    pub fn with_cookie_jar(
        config: &SessionConfig,
        signal: UnauthorizedSignal,
        jar: Arc<Jar>,
    ) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .cookie_provider(jar)
            .timeout(config.timeouts.request)
            .connect_timeout(config.timeouts.connect)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), signal })
    }

    /// Build a client whose cookie store already holds `name=value` for the
    /// API origin, e.g. a session issued to another process.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the base URL does not parse, or
    /// [`ConfigError::HttpClient`] as for [`RequestClient::new`].
    pub fn with_session_cookie(
        config: &SessionConfig,
        signal: UnauthorizedSignal,
        name: &str,
        value: &str,
    ) -> Result<Self, ConfigError> {
        let url = reqwest::Url::parse(&config.base_url)
            .map_err(|e| ConfigError::Invalid(format!("invalid base URL '{}': {e}", config.base_url)))?;
        let jar = Arc::new(Jar::default());
        jar.add_cookie_str(&format!("{name}={value}; Path=/"), &url);
        Self::with_cookie_jar(config, signal, jar)
    }

    #[must_use]
    pub fn unauthorized_signal(&self) -> &UnauthorizedSignal {
        &self.signal
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, NormalizedError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, NormalizedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// `POST` without a request body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, NormalizedError> {
        self.request(Method::POST, path, None::<&()>).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, NormalizedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, NormalizedError> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    /// Send a request with default options.
    ///
    /// # Errors
    ///
    /// Returns a [`NormalizedError`] for transport failures, non-2xx statuses,
    /// and 2xx bodies that do not deserialize into `T`.
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, NormalizedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_with(method, path, body, RequestOptions::default())
            .await
    }

    /// Send a request with explicit options.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::request`].
    pub async fn request_with<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, NormalizedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request_id = Uuid::new_v4();
        let url = join_url(&self.base_url, path);
        tracing::debug!(%request_id, %method, path, "request");

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(%request_id, %method, path, error = %e, "request failed before response");
            transport_error(&e)
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| transport_error(&e))?;

        if (200..300).contains(&status) {
            tracing::debug!(%request_id, %method, path, status, "response");
            return parse_success(status, &text);
        }

        let err = NormalizedError::from_response(status, &text);
        tracing::debug!(%request_id, %method, path, status, message = %err.message, "error response");
        if err.is_unauthorized() && !options.silent {
            self.signal.notify();
        }
        Err(err)
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}

fn transport_error(err: &reqwest::Error) -> NormalizedError {
    if err.is_timeout() {
        NormalizedError::transport(format!("request timed out: {err}"))
    } else {
        NormalizedError::transport(format!("could not reach server: {err}"))
    }
}

fn parse_success<T: DeserializeOwned>(status: u16, text: &str) -> Result<T, NormalizedError> {
    let parsed = if text.trim().is_empty() {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_str(text)
    };
    parsed.map_err(|e| NormalizedError {
        message: format!("invalid response body: {e}"),
        status_code: status,
        raw_payload: Value::String(text.to_owned()),
        code: None,
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
