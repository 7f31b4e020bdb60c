//! Wire contract of the invoice service.
//!
//! `InvoiceApi` is the seam between the client components and the network:
//! it sends one request per call and hands back the raw status and body, so
//! every interpretation (error detail, token extraction, list decoding)
//! stays in the components and can be exercised against canned responses.

mod http;

use std::fmt;
use std::future::Future;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::Endpoints;
use crate::upload::UploadRequest;
use crate::util::{compact_text, normalize_text_option};

pub use http::HttpInvoiceApi;

/// A request that never produced a response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Service unreachable: {0}")]
    Unreachable(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Status and body of a completed exchange, success or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Human-readable failure reason, or `fallback` when the body says nothing usable.
    pub fn error_message(&self, fallback: &str) -> String {
        server_error_message(&self.body, fallback)
    }
}

/// Sign-in body: the identifier travels as `email` when it looks like one,
/// otherwise as `username`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignInPayload {
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl SignInPayload {
    pub fn for_identifier(identifier: &str, password: &str) -> Self {
        let identifier = identifier.trim().to_string();
        let (email, username) = if identifier.contains('@') {
            (Some(identifier), None)
        } else {
            (None, Some(identifier))
        };
        Self {
            password: password.to_string(),
            email,
            username,
        }
    }
}

impl fmt::Debug for SignInPayload {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SignInPayload")
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .field("username", &self.username)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignUpPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SignUpPayload {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SignUpPayload")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Requests the client issues against the invoice service.
///
/// `auth` is the header set produced by the session; it may be empty.
pub trait InvoiceApi: Send + Sync + 'static {
    fn endpoints(&self) -> &Endpoints;

    fn sign_in(
        &self,
        payload: &SignInPayload,
    ) -> impl Future<Output = TransportResult<ApiResponse>> + Send;

    fn sign_up(
        &self,
        payload: &SignUpPayload,
    ) -> impl Future<Output = TransportResult<ApiResponse>> + Send;

    fn process_invoice(
        &self,
        auth: HeaderMap,
        upload: UploadRequest,
    ) -> impl Future<Output = TransportResult<ApiResponse>> + Send;

    fn list_invoices(
        &self,
        auth: HeaderMap,
    ) -> impl Future<Output = TransportResult<ApiResponse>> + Send;

    fn get_invoice(
        &self,
        auth: HeaderMap,
        invoice_id: &str,
    ) -> impl Future<Output = TransportResult<ApiResponse>> + Send;

    fn delete_invoice(
        &self,
        auth: HeaderMap,
        invoice_id: &str,
    ) -> impl Future<Output = TransportResult<ApiResponse>> + Send;

    fn health(&self) -> impl Future<Output = TransportResult<ApiResponse>> + Send;
}

/// Pull a message out of an error body.
///
/// Understands `{detail: "..."}`, validation lists `{detail: [{msg}]}`,
/// pipeline failures `{status: "FAIL", stage, error | validation}` and a bare
/// `{message}`. Anything else yields `fallback`.
pub fn server_error_message(body: &str, fallback: &str) -> String {
    let Ok(Value::Object(payload)) = serde_json::from_str::<Value>(body) else {
        return fallback.to_string();
    };

    if let Some(detail) = payload.get("detail").and_then(detail_text) {
        return detail;
    }

    let stage = payload
        .get("stage")
        .and_then(Value::as_str)
        .and_then(|stage| normalize_text_option(Some(stage.to_string())));

    if let Some(error) = payload.get("error").and_then(scalar_text) {
        return match stage {
            Some(stage) => format!("{stage}: {error}"),
            None => error,
        };
    }

    if payload.get("validation").is_some_and(|value| !value.is_null()) {
        return match stage {
            Some(stage) => format!("{stage}: validation failed"),
            None => "validation failed".to_string(),
        };
    }

    payload
        .get("message")
        .and_then(scalar_text)
        .unwrap_or_else(|| fallback.to_string())
}

fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::Array(items) => {
            let messages = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(scalar_text))
                .collect::<Vec<_>>();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Object(object) => object.get("msg").and_then(scalar_text),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => normalize_text_option(Some(compact_text(text))),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
