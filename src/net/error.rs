//! Normalized request errors.
//!
//! DESIGN
//! ======
//! Every failed request, whether the server rejected it or it never reached
//! the server, becomes one `NormalizedError`. Transport failures use status
//! `0` so callers can tell "could not reach server" from "server said no".
//!
//! Server-authored messages are kept verbatim. Classification for UI copy
//! goes through the structured `code` field, never through the message text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel status for network failures and timeouts.
pub const TRANSPORT_STATUS: u16 = 0;

/// Coarse error class used by propagation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unreachable server, connection reset, or timeout.
    Transport,
    /// 401: the session is no longer valid.
    Unauthorized,
    /// Any other 4xx.
    Validation,
    /// 5xx and anything else outside 2xx.
    Server,
}

/// Machine-readable error codes the auth API attaches to registration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    EmailAlreadyExists,
    PasswordMissingUppercase,
    PasswordMissingLowercase,
    PasswordMissingDigit,
}

impl ErrorCode {
    /// Parse a wire code. Unknown codes yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "email_already_exists" => Some(Self::EmailAlreadyExists),
            "password_missing_uppercase" => Some(Self::PasswordMissingUppercase),
            "password_missing_lowercase" => Some(Self::PasswordMissingLowercase),
            "password_missing_digit" => Some(Self::PasswordMissingDigit),
            _ => None,
        }
    }

    /// User-facing copy for the code.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::EmailAlreadyExists => "An account with this email already exists.",
            Self::PasswordMissingUppercase => "Password must contain at least one uppercase letter.",
            Self::PasswordMissingLowercase => "Password must contain at least one lowercase letter.",
            Self::PasswordMissingDigit => "Password must contain at least one digit.",
        }
    }
}

/// The single error shape produced by the request client.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct NormalizedError {
    /// Human-readable message, server-authored when available.
    pub message: String,
    /// HTTP status, or [`TRANSPORT_STATUS`] when no response arrived.
    pub status_code: u16,
    /// Parsed error body; a JSON string when the body was not JSON, `null` when empty.
    pub raw_payload: Value,
    /// Structured code from `detail.code` or `code`, when recognized.
    pub code: Option<ErrorCode>,
}

impl NormalizedError {
    /// Error for a request that never produced a response.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self { message: message.into(), status_code: TRANSPORT_STATUS, raw_payload: Value::Null, code: None }
    }

    /// Normalize a non-2xx response body.
    ///
    /// Message lookup order: `detail.message`, `detail` (when a string),
    /// top-level `message`, then a generic message naming the status.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let raw_payload = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str::<Value>(body).unwrap_or_else(|_| Value::String(body.to_owned()))
        };

        let message = extract_message(&raw_payload).unwrap_or_else(|| generic_message(status));
        let code = extract_code(&raw_payload);
        Self { message, status_code: status, raw_payload, code }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.status_code {
            TRANSPORT_STATUS => ErrorKind::Transport,
            401 => ErrorKind::Unauthorized,
            400..=499 => ErrorKind::Validation,
            _ => ErrorKind::Server,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

fn generic_message(status: u16) -> String {
    format!("request failed with status {status}")
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

fn extract_message(payload: &Value) -> Option<String> {
    let detail = payload.get("detail");
    non_empty_str(detail.and_then(|d| d.get("message")))
        .or_else(|| non_empty_str(detail))
        .or_else(|| non_empty_str(payload.get("message")))
}

fn extract_code(payload: &Value) -> Option<ErrorCode> {
    payload
        .get("detail")
        .and_then(|d| d.get("code"))
        .or_else(|| payload.get("code"))
        .and_then(Value::as_str)
        .and_then(ErrorCode::parse)
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
