//! Session state: the bearer credential shared by every outbound request.
//!
//! One `SessionState` lives per process and is injected (behind an `Arc`)
//! into the auth, upload and history components. Writers are the auth flow
//! (`set`) and explicit logout (`clear`); everything else only reads.
//! Navigation chrome subscribes to [`AuthStatus`] changes through a tokio
//! `watch` channel.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use thiserror::Error;
use tokio::sync::watch;

use crate::state::{Redirect, View};
use crate::util::normalize_text_option;

/// Fixed key the credential is persisted under.
pub const CREDENTIAL_KEY: &str = "access_token";

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Secure storage error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, SessionStoreError>;

/// Durable storage for the credential.
pub trait SessionPersistence: Send + Sync + 'static {
    fn load(&self) -> StoreResult<Option<String>>;
    fn save(&self, credential: &str) -> StoreResult<()>;
    fn clear(&self) -> StoreResult<()>;
}

/// Process-local persistence. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySessionStore {
    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(credential.into()))),
        }
    }

    /// Currently persisted credential.
    pub fn stored(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionPersistence for MemorySessionStore {
    fn load(&self) -> StoreResult<Option<String>> {
        Ok(self.stored())
    }

    fn save(&self, credential: &str) -> StoreResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential.to_string());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    SignedIn,
    SignedOut,
}

impl AuthStatus {
    /// Which navigation links the chrome should show.
    pub const fn nav(self) -> NavVisibility {
        let signed_in = matches!(self, Self::SignedIn);
        NavVisibility {
            show_dashboard: signed_in,
            show_logout: signed_in,
            show_sign_up: !signed_in,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct NavVisibility {
    pub show_dashboard: bool,
    pub show_logout: bool,
    pub show_sign_up: bool,
}

/// Result of loading a view that requires a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Allowed,
    Redirect(Redirect),
}

pub struct SessionState<P: SessionPersistence> {
    store: P,
    credential: RwLock<Option<String>>,
    status: watch::Sender<AuthStatus>,
}

impl<P: SessionPersistence> SessionState<P> {
    /// Starts signed out without touching the store.
    pub fn new(store: P) -> Self {
        Self::with_credential(store, None)
    }

    /// Starts from whatever the store holds. A store failure counts as signed out.
    pub fn restore(store: P) -> Self {
        let credential = match store.load() {
            Ok(credential) => normalize_text_option(credential),
            Err(error) => {
                tracing::warn!("Failed to load persisted session: {}", error);
                None
            }
        };
        Self::with_credential(store, credential)
    }

    fn with_credential(store: P, credential: Option<String>) -> Self {
        let initial = if credential.is_some() {
            AuthStatus::SignedIn
        } else {
            AuthStatus::SignedOut
        };
        let (status, _) = watch::channel(initial);
        Self {
            store,
            credential: RwLock::new(credential),
            status,
        }
    }

    pub fn get(&self) -> Option<String> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replaces the credential, persists it and notifies subscribers.
    ///
    /// A blank credential is treated as a logout.
    pub fn set(&self, credential: impl Into<String>) {
        let Some(credential) = normalize_text_option(Some(credential.into())) else {
            self.clear();
            return;
        };

        if let Err(error) = self.store.save(&credential) {
            tracing::warn!("Failed to persist session credential: {}", error);
        }
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential);
        self.status.send_replace(AuthStatus::SignedIn);
        tracing::debug!("Session credential stored");
    }

    /// Drops the credential everywhere and notifies subscribers.
    pub fn clear(&self) {
        if let Err(error) = self.store.clear() {
            tracing::warn!("Failed to clear persisted session credential: {}", error);
        }
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.status.send_replace(AuthStatus::SignedOut);
        tracing::debug!("Session credential cleared");
    }

    /// Headers proving the session: empty when signed out, otherwise a
    /// single `Authorization: Bearer ...` entry.
    pub fn auth_header(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(credential) = self.get() {
            if let Some(value) = bearer_value(&credential) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    /// Checks a gated view. Without a credential the session is cleared
    /// (so the chrome flips to signed-out) and the caller is sent to sign-in.
    pub fn gate(&self) -> Gate {
        if self.is_authenticated() {
            return Gate::Allowed;
        }
        self.clear();
        Gate::Redirect(Redirect {
            view: View::SignIn,
            after: std::time::Duration::ZERO,
        })
    }
}

impl<P: SessionPersistence> fmt::Debug for SessionState<P> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let credential = if self.is_authenticated() {
            "[REDACTED]"
        } else {
            "None"
        };
        formatter
            .debug_struct("SessionState")
            .field("credential", &credential)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Control characters cannot travel in a header, so they are dropped.
fn bearer_value(credential: &str) -> Option<HeaderValue> {
    let raw: Vec<u8> = format!("Bearer {credential}")
        .bytes()
        .filter(|byte| *byte == b'\t' || (*byte >= 0x20 && *byte != 0x7f))
        .collect();
    let mut value = HeaderValue::from_bytes(&raw).ok()?;
    value.set_sensitive(true);
    Some(value)
}
