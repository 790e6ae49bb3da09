//! Persistence of the session credential and cached profile
//!
//! Values are stored as plain strings under fixed keys so an older build of
//! the client can still read them.

use clearhold_common::storage::{get_json, set_json, SharedStore};
use clearhold_domain::constants::{
    STORAGE_KEY_ACCESS_TOKEN, STORAGE_KEY_EMAIL_FOR_SIGN_IN, STORAGE_KEY_SUBJECT_ID,
    STORAGE_KEY_TOKEN_EXPIRY, STORAGE_KEY_USER_PROFILE,
};
use clearhold_domain::{Credential, Result, UserProfile};
use tracing::warn;

use crate::errors::from_storage_error;

/// Reads and writes session state in the durable key-value store
#[derive(Clone)]
pub struct TokenStore {
    store: SharedStore,
}

impl TokenStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Stored credential, `None` when absent or unreadable
    pub async fn load(&self) -> Result<Option<Credential>> {
        let Some(access_token) = self.get(STORAGE_KEY_ACCESS_TOKEN).await? else {
            return Ok(None);
        };

        let expires_at = match self.get(STORAGE_KEY_TOKEN_EXPIRY).await? {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(ms) => ms,
                Err(err) => {
                    warn!(error = %err, "stored token expiry is not a number, ignoring credential");
                    return Ok(None);
                }
            },
            None => {
                warn!("stored token has no expiry, ignoring credential");
                return Ok(None);
            }
        };

        let subject_id = self.get(STORAGE_KEY_SUBJECT_ID).await?.unwrap_or_default();
        Ok(Some(Credential::new(access_token, expires_at, subject_id)))
    }

    pub async fn save(&self, credential: &Credential) -> Result<()> {
        self.set(STORAGE_KEY_ACCESS_TOKEN, &credential.access_token).await?;
        self.set(STORAGE_KEY_TOKEN_EXPIRY, &credential.expires_at_epoch_ms.to_string()).await?;
        self.set(STORAGE_KEY_SUBJECT_ID, &credential.subject_id).await
    }

    /// Cached profile; a corrupt entry is treated as absent
    pub async fn load_profile(&self) -> Result<Option<UserProfile>> {
        match get_json(self.store.as_ref(), STORAGE_KEY_USER_PROFILE).await {
            Ok(profile) => Ok(profile),
            Err(clearhold_common::StorageError::Serialization(err)) => {
                warn!(error = %err, "cached profile is unreadable, ignoring it");
                Ok(None)
            }
            Err(err) => Err(from_storage_error(err)),
        }
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        set_json(self.store.as_ref(), STORAGE_KEY_USER_PROFILE, profile)
            .await
            .map_err(from_storage_error)
    }

    /// Remove credential and profile; the magic-link email hint is kept
    pub async fn clear(&self) -> Result<()> {
        self.store
            .remove_many(&[
                STORAGE_KEY_ACCESS_TOKEN,
                STORAGE_KEY_TOKEN_EXPIRY,
                STORAGE_KEY_SUBJECT_ID,
                STORAGE_KEY_USER_PROFILE,
            ])
            .await
            .map_err(from_storage_error)
    }

    pub async fn email_hint(&self) -> Result<Option<String>> {
        Ok(self.get(STORAGE_KEY_EMAIL_FOR_SIGN_IN).await?.filter(|email| !email.is_empty()))
    }

    pub async fn set_email_hint(&self, email: &str) -> Result<()> {
        self.set(STORAGE_KEY_EMAIL_FOR_SIGN_IN, email).await
    }

    pub async fn clear_email_hint(&self) -> Result<()> {
        self.store.remove(STORAGE_KEY_EMAIL_FOR_SIGN_IN).await.map_err(from_storage_error)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.get(key).await.map_err(from_storage_error)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value).await.map_err(from_storage_error)
    }
}
