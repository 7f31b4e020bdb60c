//! Client configuration.
//!
//! Provides `ClientConfig`, shared by every client front-end, and the
//! `Endpoints` table that turns the configured API base URL into the
//! concrete routes of the invoice service.

use std::time::Duration;

use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option};

/// Base URL used when nothing else is configured (the service's dev default).
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Environment variable consulted for the API base URL.
pub const API_URL_ENV: &str = "INVOICE_API_URL";

/// Pause between a successful sign-in/sign-up and the dashboard navigation.
pub const DEFAULT_DASHBOARD_REDIRECT_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("API base URL must not be empty")]
    EmptyBaseUrl,
    #[error("API base URL must include http:// or https:// (got '{0}')")]
    InvalidScheme(String),
}

/// Runtime configuration for the invoice client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    /// Optional per-request timeout. `None` lets a hung request wait forever.
    pub request_timeout: Option<Duration>,
    pub dashboard_redirect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: None,
            dashboard_redirect_delay: DEFAULT_DASHBOARD_REDIRECT_DELAY,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            ..Self::default()
        })
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_dashboard_redirect_delay(mut self, delay: Duration) -> Self {
        self.dashboard_redirect_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            base_url: self.base_url.clone(),
        }
    }
}

/// Route table for the invoice service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn sign_in(&self) -> String {
        format!("{}/auth/signin", self.base_url)
    }

    pub fn sign_up(&self) -> String {
        format!("{}/auth/signup", self.base_url)
    }

    pub fn process_invoice(&self) -> String {
        format!("{}/process_invoice", self.base_url)
    }

    pub fn invoices(&self) -> String {
        format!("{}/invoices", self.base_url)
    }

    pub fn invoice(&self, invoice_id: &str) -> String {
        format!(
            "{}/invoices/{}",
            self.base_url,
            urlencoding::encode(invoice_id)
        )
    }

    /// Browser-fetchable download link for a stored export.
    pub fn download(&self, export_id: &str) -> String {
        format!(
            "{}/download/{}",
            self.base_url,
            urlencoding::encode(export_id)
        )
    }

    pub fn health(&self) -> String {
        format!("{}/health", self.base_url)
    }
}

/// Trim and validate an API base URL, dropping any trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let base = raw.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !is_http_url(base) {
        return Err(ConfigError::InvalidScheme(base.to_string()));
    }
    Ok(base.to_string())
}

/// Pick the API base URL from the first configured source.
///
/// Precedence: explicit value, environment, profile, then
/// [`DEFAULT_API_BASE_URL`]. Blank values count as unset.
pub fn resolve_base_url(
    explicit: Option<String>,
    from_env: Option<String>,
    from_profile: Option<String>,
) -> Result<String, ConfigError> {
    let chosen = normalize_text_option(explicit)
        .or_else(|| normalize_text_option(from_env))
        .or_else(|| normalize_text_option(from_profile))
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    normalize_base_url(&chosen)
}
