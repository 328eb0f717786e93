//! One-shot secret resolution orchestration.
//!
//! A session ties together proxy resolution, the credential-store lookup, the
//! vault fetch, and field mapping. Every failure is terminal for that
//! resolution: no retry, no partial slot set. Results may be reused within
//! the session only while the access context stays the same; any context
//! change drops the cache, since credential visibility and proxy
//! applicability are context-dependent.

use super::client::VaultFetchClient;
use super::credentials::CredentialStore;
use super::error::{VaultError, VaultResult};
use super::mapping;
use super::proxy::{self, ProxySettings};
use super::types::{AccessContext, FieldMapping, ResolvedSecret, VaultTarget};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Inputs for one resolution.
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    pub credential_id: String,
    pub secret_id: String,
    pub base_url: String,
    pub mappings: Vec<FieldMapping>,
}

pub struct SecretResolutionSession {
    store: Arc<dyn CredentialStore>,
    client: VaultFetchClient,
    session_proxy: ProxySettings,
    /// Host-global proxy layer, snapshotted once at construction.
    host_proxy: ProxySettings,
    cache: HashMap<(String, String, String), ResolvedSecret>,
    cache_context: Option<AccessContext>,
}

impl SecretResolutionSession {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        client: VaultFetchClient,
        session_proxy: ProxySettings,
    ) -> Self {
        Self {
            store,
            client,
            session_proxy,
            host_proxy: ProxySettings::from_env_snapshot(),
            cache: HashMap::new(),
            cache_context: None,
        }
    }

    /// Replace the host-global proxy snapshot (tests and embedders that
    /// manage their own configuration source).
    pub fn with_host_proxy(mut self, host_proxy: ProxySettings) -> Self {
        self.host_proxy = host_proxy;
        self
    }

    /// Resolve one secret: proxy → credential lookup → fetch → map.
    pub async fn resolve(
        &mut self,
        request: &ResolutionRequest,
        ctx: &AccessContext,
    ) -> VaultResult<ResolvedSecret> {
        if self.cache_context.as_ref() != Some(ctx) {
            if self.cache_context.is_some() && !self.cache.is_empty() {
                debug!("Access context changed, dropping cached resolutions");
            }
            self.cache.clear();
            self.cache_context = Some(ctx.clone());
        }

        let key = (
            request.credential_id.clone(),
            request.base_url.clone(),
            request.secret_id.clone(),
        );
        if let Some(hit) = self.cache.get(&key) {
            debug!(
                "Reusing resolution of secret {} within this step",
                request.secret_id
            );
            return Ok(hit.clone());
        }

        let resolved_proxy = proxy::resolve(&request.base_url, &self.session_proxy, &self.host_proxy);

        let credential = self
            .store
            .lookup(&request.credential_id, ctx)
            .await?
            .ok_or_else(|| VaultError::CredentialNotFound(request.credential_id.clone()))?;

        let target = VaultTarget {
            base_url: request.base_url.clone(),
            credential,
        };
        let record = match self
            .client
            .fetch(&target, &resolved_proxy, &request.secret_id)
            .await
        {
            Ok(record) => record,
            Err(err) => {
                // ResolvedProxy's Debug form redacts its credentials.
                error!(
                    "Failed to fetch secret {} from {}: {} (proxy: {:?})",
                    request.secret_id, request.base_url, err, resolved_proxy
                );
                return Err(err);
            }
        };

        let resolved = mapping::match_fields(&record, &request.mappings);
        info!(
            "Resolved secret {}: {} slot(s) mapped, {} value(s) registered for masking",
            request.secret_id,
            resolved.slot_values.len(),
            resolved.masked_values.len()
        );

        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }
}
