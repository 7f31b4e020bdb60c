//! Sign-in and sign-up against the invoice service.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::api::{ApiResponse, InvoiceApi, SignInPayload, SignUpPayload};
use crate::config::DEFAULT_DASHBOARD_REDIRECT_DELAY;
use crate::session::{SessionPersistence, SessionState};
use crate::state::{InFlight, Redirect, View};
use crate::util::normalize_text_option;

const SIGN_IN_FAILED: &str = "Sign-in failed";
const SIGN_UP_FAILED: &str = "Sign-up failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Transport(&'static str),
    #[error("Sign-in response did not include an access token")]
    MissingToken,
    #[error("A request is already in progress")]
    InFlight,
}

pub type AuthResult<T> = Result<T, AuthError>;

/// A completed sign-in or sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSuccess {
    pub message: String,
    /// Whether the response carried a credential that is now stored.
    pub authenticated: bool,
    pub redirect: Redirect,
}

pub struct AuthFlow<A: InvoiceApi, P: SessionPersistence> {
    api: Arc<A>,
    session: Arc<SessionState<P>>,
    redirect_delay: Duration,
    sign_in_in_flight: InFlight,
    sign_up_in_flight: InFlight,
}

impl<A: InvoiceApi, P: SessionPersistence> AuthFlow<A, P> {
    pub fn new(api: Arc<A>, session: Arc<SessionState<P>>) -> Self {
        Self {
            api,
            session,
            redirect_delay: DEFAULT_DASHBOARD_REDIRECT_DELAY,
            sign_in_in_flight: InFlight::default(),
            sign_up_in_flight: InFlight::default(),
        }
    }

    #[must_use]
    pub const fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    /// Sign in with an email address or a username.
    ///
    /// On success the access token replaces the session credential and a
    /// dashboard redirect is returned. Failures leave the session untouched.
    pub async fn sign_in(&self, identifier: &str, password: &str) -> AuthResult<AuthSuccess> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Please enter your username or email and password.",
            ));
        }
        let Some(_guard) = self.sign_in_in_flight.try_begin() else {
            tracing::debug!("Sign-in already in flight; ignoring");
            return Err(AuthError::InFlight);
        };

        let payload = SignInPayload::for_identifier(identifier, password);
        let response = self.api.sign_in(&payload).await.map_err(|error| {
            tracing::warn!("Sign-in request failed: {}", error);
            AuthError::Transport("Sign-in error: could not reach the invoice service.")
        })?;
        let response = accepted(response, SIGN_IN_FAILED)?;

        let token = access_token(&response).ok_or(AuthError::MissingToken)?;
        self.session.set(token);
        tracing::info!("Signed in");

        Ok(AuthSuccess {
            message: "Signed in. Redirecting to your dashboard...".to_string(),
            authenticated: true,
            redirect: self.dashboard(),
        })
    }

    /// Register a new account. A token in the response signs the user in.
    pub async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<AuthSuccess> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Please fill in username, email and password.",
            ));
        }
        let Some(_guard) = self.sign_up_in_flight.try_begin() else {
            tracing::debug!("Sign-up already in flight; ignoring");
            return Err(AuthError::InFlight);
        };

        let payload = SignUpPayload {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.api.sign_up(&payload).await.map_err(|error| {
            tracing::warn!("Sign-up request failed: {}", error);
            AuthError::Transport("Sign-up error: could not reach the invoice service.")
        })?;
        let response = accepted(response, SIGN_UP_FAILED)?;

        let authenticated = match access_token(&response) {
            Some(token) => {
                self.session.set(token);
                true
            }
            None => false,
        };
        tracing::info!(authenticated, "Signed up");

        Ok(AuthSuccess {
            message: "Account created. Redirecting to your dashboard...".to_string(),
            authenticated,
            redirect: self.dashboard(),
        })
    }

    /// Explicit logout.
    pub fn sign_out(&self) {
        self.session.clear();
        tracing::info!("Signed out");
    }

    const fn dashboard(&self) -> Redirect {
        Redirect {
            view: View::Dashboard,
            after: self.redirect_delay,
        }
    }
}

fn accepted(response: ApiResponse, fallback: &str) -> AuthResult<ApiResponse> {
    if response.is_success() {
        return Ok(response);
    }
    let message = response.error_message(fallback);
    tracing::warn!(status = response.status, "{}: {}", fallback, message);
    Err(AuthError::Rejected {
        status: response.status,
        message,
    })
}

fn access_token(response: &ApiResponse) -> Option<String> {
    let payload = response.json::<Value>().ok()?;
    payload
        .get("access_token")
        .and_then(Value::as_str)
        .and_then(|token| normalize_text_option(Some(token.to_string())))
}
