//! Credential-store collaborator.
//!
//! The store supplies the username/password pair used to authenticate against
//! the vault, by opaque identifier, restricted to what the requesting access
//! context is allowed to see. Lookups are explicit and context-keyed; there
//! is deliberately no instance-level memoization, since different callers may
//! run under different access contexts.

use super::error::{VaultError, VaultResult};
use super::types::{AccessContext, UsernamePassword};
use crate::config::CredentialConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a stored credential by id. Returns `None` both when the id is
    /// unknown and when the credential is not visible under `ctx`, so callers
    /// cannot distinguish hidden from absent.
    async fn lookup(
        &self,
        credential_id: &str,
        ctx: &AccessContext,
    ) -> VaultResult<Option<UsernamePassword>>;
}

/// Serves credentials from the configuration snapshot.
///
/// A credential with a non-empty `jobs` allow-list is only visible to
/// contexts running on behalf of one of those jobs; system-level contexts do
/// not bypass the list.
pub struct ConfigCredentialStore {
    entries: HashMap<String, CredentialConfig>,
}

impl ConfigCredentialStore {
    pub fn new(entries: HashMap<String, CredentialConfig>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl CredentialStore for ConfigCredentialStore {
    async fn lookup(
        &self,
        credential_id: &str,
        ctx: &AccessContext,
    ) -> VaultResult<Option<UsernamePassword>> {
        let Some(entry) = self.entries.get(credential_id) else {
            debug!("Credential '{credential_id}' is not configured");
            return Ok(None);
        };

        if !entry.jobs.is_empty() {
            let permitted = ctx
                .job
                .as_deref()
                .is_some_and(|job| entry.jobs.iter().any(|allowed| allowed == job));
            if !permitted {
                debug!("Credential '{credential_id}' is not visible to the current context");
                return Ok(None);
            }
        }

        let password = match (&entry.password, &entry.password_env) {
            (Some(password), _) => password.clone(),
            (None, Some(var)) => std::env::var(var).map_err(|_| {
                VaultError::invalid_input(format!(
                    "Environment variable '{var}' for credential '{credential_id}' is not set"
                ))
            })?,
            (None, None) => {
                return Err(VaultError::invalid_input(format!(
                    "Credential '{credential_id}' declares neither password nor passwordEnv"
                )))
            }
        };

        Ok(Some(UsernamePassword::new(
            entry.username.clone(),
            password,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(id: &str, entry: CredentialConfig) -> ConfigCredentialStore {
        let mut entries = HashMap::new();
        entries.insert(id.to_string(), entry);
        ConfigCredentialStore::new(entries)
    }

    fn plain_credential() -> CredentialConfig {
        CredentialConfig {
            username: "svc".to_string(),
            password: Some("p@ss".to_string()),
            password_env: None,
            jobs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn lookup_returns_configured_credential() {
        let store = store_with("cred-1", plain_credential());
        let found = store
            .lookup("cred-1", &AccessContext::system())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.username, "svc");
        assert_eq!(found.password(), "p@ss");
    }

    #[tokio::test]
    async fn lookup_unknown_id_is_absent() {
        let store = store_with("cred-1", plain_credential());
        let found = store
            .lookup("missing", &AccessContext::system())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn scoped_credential_hidden_from_other_jobs() {
        let mut entry = plain_credential();
        entry.jobs = vec!["deploy".to_string()];
        let store = store_with("cred-1", entry);

        assert!(store
            .lookup("cred-1", &AccessContext::for_job("deploy"))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .lookup("cred-1", &AccessContext::for_job("other"))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .lookup("cred-1", &AccessContext::system())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn password_env_indirection() {
        std::env::set_var("VAULTWRAP_TEST_CRED_PASSWORD", "from-env");
        let entry = CredentialConfig {
            username: "svc".to_string(),
            password: None,
            password_env: Some("VAULTWRAP_TEST_CRED_PASSWORD".to_string()),
            jobs: Vec::new(),
        };
        let store = store_with("cred-1", entry);
        let found = store
            .lookup("cred-1", &AccessContext::system())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.password(), "from-env");
        std::env::remove_var("VAULTWRAP_TEST_CRED_PASSWORD");
    }

    #[tokio::test]
    async fn missing_password_source_is_invalid_input() {
        let entry = CredentialConfig {
            username: "svc".to_string(),
            password: None,
            password_env: None,
            jobs: Vec::new(),
        };
        let store = store_with("cred-1", entry);
        let err = store
            .lookup("cred-1", &AccessContext::system())
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput(_)));
    }
}
