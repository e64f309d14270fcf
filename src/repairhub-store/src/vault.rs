//! The token vault: identity and token slots over the shared store.

use std::sync::Arc;

use repairhub_protocol::Identity;

use crate::error::Result;
use crate::keys::{ACCESS_TOKEN_KEY, IDENTITY_KEY, REFRESH_TOKEN_KEY};
use crate::shared::SharedStore;

/// Credentials read back from the shared store on tab (re)initialization.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    /// The persisted identity blob.
    pub identity: Identity,
    /// The persisted access token.
    pub access_token: String,
    /// The persisted refresh token, if any.
    pub refresh_token: Option<String>,
}

/// Persists the identity blob and token pair in the shared store.
///
/// The store has no transactions, so atomicity is by convention: saves
/// write tokens first and the identity blob last, clears remove the
/// identity blob first and tokens after. Readers treat the identity slot
/// as the completeness gate - identity present without an access token is
/// partial state and reads as "nothing stored". Partial or corrupt state
/// is logged and tolerated, never an error.
pub struct TokenVault {
    store: Arc<dyn SharedStore>,
}

impl TokenVault {
    /// Create a vault over a tab's store handle.
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Persist a full credential set.
    pub async fn save(
        &self,
        identity: &Identity,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, access_token).await?;
        match refresh_token {
            Some(token) => self.store.set(REFRESH_TOKEN_KEY, token).await?,
            None => self.store.remove(REFRESH_TOKEN_KEY).await?,
        }
        // Identity last: its presence tells readers the slots are complete.
        let blob = serde_json::to_string(identity)?;
        self.store.set(IDENTITY_KEY, &blob).await?;
        Ok(())
    }

    /// Overwrite only the identity blob.
    ///
    /// Used to propagate a locally-applied profile update; sibling tabs
    /// pick the write up through the store change feed.
    pub async fn save_identity(&self, identity: &Identity) -> Result<()> {
        let blob = serde_json::to_string(identity)?;
        self.store.set(IDENTITY_KEY, &blob).await?;
        Ok(())
    }

    /// Overwrite only the access token, after a successful refresh.
    pub async fn set_access_token(&self, access_token: &str) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, access_token).await
    }

    /// Read the stored refresh token, if any.
    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.store.get(REFRESH_TOKEN_KEY).await
    }

    /// Load whatever complete credential set is currently stored.
    pub async fn load(&self) -> Result<Option<StoredCredentials>> {
        let Some(blob) = self.store.get(IDENTITY_KEY).await? else {
            return Ok(None);
        };

        let identity: Identity = match serde_json::from_str(&blob) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "stored identity blob is unreadable, ignoring");
                return Ok(None);
            }
        };

        let Some(access_token) = self.store.get(ACCESS_TOKEN_KEY).await? else {
            tracing::debug!("identity present without access token, treating as empty");
            return Ok(None);
        };

        let refresh_token = self.store.get(REFRESH_TOKEN_KEY).await?;

        Ok(Some(StoredCredentials {
            identity,
            access_token,
            refresh_token,
        }))
    }

    /// Remove all three slots.
    ///
    /// Identity goes first so that a reader racing with the clear sees at
    /// worst tokens-without-identity, which [`TokenVault::load`] already
    /// reads as empty. Idempotent.
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(IDENTITY_KEY).await?;
        self.store.remove(REFRESH_TOKEN_KEY).await?;
        self.store.remove(ACCESS_TOKEN_KEY).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use pretty_assertions::assert_eq;
    use repairhub_protocol::StaffRole;

    fn identity() -> Identity {
        Identity::new(
            "user-1",
            "Jo",
            "jo@shop.test",
            StaffRole::StandardUser,
            ["manage_repairs".to_string()],
        )
    }

    fn vault(store: &MemoryStore) -> TokenVault {
        TokenVault::new(Arc::new(store.open_tab()))
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let store = MemoryStore::new();
        let vault = vault(&store);

        vault
            .save(&identity(), "access-1", Some("refresh-1"))
            .await
            .unwrap();

        let loaded = vault.load().await.unwrap().unwrap();
        assert_eq!(loaded.identity, identity());
        assert_eq!(loaded.access_token, "access-1");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn test_load_is_empty_after_clear_and_clear_is_idempotent() {
        let store = MemoryStore::new();
        let vault = vault(&store);
        vault
            .save(&identity(), "access-1", Some("refresh-1"))
            .await
            .unwrap();

        vault.clear().await.unwrap();
        vault.clear().await.unwrap();

        assert!(vault.load().await.unwrap().is_none());
        assert!(vault.refresh_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_identity_without_access_token_reads_as_empty() {
        let store = MemoryStore::new();
        let tab = store.open_tab();
        let blob = serde_json::to_string(&identity()).unwrap();
        tab.set(IDENTITY_KEY, &blob).await.unwrap();

        let vault = vault(&store);
        assert!(vault.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_identity_blob_reads_as_empty() {
        let store = MemoryStore::new();
        let tab = store.open_tab();
        tab.set(IDENTITY_KEY, "{not json").await.unwrap();
        tab.set(ACCESS_TOKEN_KEY, "access-1").await.unwrap();

        let vault = vault(&store);
        assert!(vault.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_vault_is_shared_across_tabs() {
        let store = MemoryStore::new();
        let vault_a = vault(&store);
        let vault_b = vault(&store);

        vault_a.save(&identity(), "access-1", None).await.unwrap();

        let loaded = vault_b.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "access-1");
        assert!(loaded.refresh_token.is_none());
    }
}
