//! Keychain-backed persistence for the session credential.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock, PoisonError};

#[cfg(not(test))]
use invoice_core::session::SessionStoreError;
use invoice_core::session::{SessionPersistence, StoreResult, CREDENTIAL_KEY};
#[cfg(not(test))]
use keyring::Entry;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "invoice-client";

/// One keychain entry per profile: `access_token:<profile>`.
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    username: String,
}

impl KeyringSessionStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("{CREDENTIAL_KEY}:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> StoreResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username).map_err(backend_error)
    }
}

#[cfg(not(test))]
#[allow(clippy::needless_pass_by_value)]
fn backend_error(error: keyring::Error) -> SessionStoreError {
    SessionStoreError::Backend(error.to_string())
}

impl SessionPersistence for KeyringSessionStore {
    #[cfg(not(test))]
    fn load(&self) -> StoreResult<Option<String>> {
        match self.entry()?.get_password() {
            Ok(credential) => Ok(Some(credential)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(backend_error(error)),
        }
    }

    #[cfg(test)]
    fn load(&self) -> StoreResult<Option<String>> {
        Ok(Self::test_store()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.username)
            .cloned())
    }

    #[cfg(not(test))]
    fn save(&self, credential: &str) -> StoreResult<()> {
        self.entry()?
            .set_password(credential)
            .map_err(backend_error)
    }

    #[cfg(test)]
    fn save(&self, credential: &str) -> StoreResult<()> {
        Self::test_store()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.username.clone(), credential.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    fn clear(&self) -> StoreResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(backend_error(error)),
        }
    }

    #[cfg(test)]
    fn clear(&self) -> StoreResult<()> {
        Self::test_store()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.username);
        Ok(())
    }
}
