//! HTTP client for the Secret Server wire API.
//!
//! One fetch = one short-lived `reqwest::Client` owned by the call and
//! dropped on every exit path, authenticated in two steps: a password-grant
//! token request against `{base}/oauth2/token`, then the secret read from
//! `{base}/api/{version}/secrets/{id}`. Every failure is classified onto
//! [`VaultError`] from the innermost cause.

use super::error::{VaultError, VaultResult};
use super::proxy::{ProxySource, ResolvedProxy};
use super::types::{SecretField, SecretRecord, VaultTarget};
use crate::config::{DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub struct VaultFetchClient {
    connect_timeout: Duration,
    request_timeout: Duration,
    api_version: String,
}

impl VaultFetchClient {
    pub fn new(api_version: impl Into<String>) -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            api_version: api_version.into(),
        }
    }

    /// Override the transport timeouts. A timeout is always set, since an
    /// unresponsive vault must not hang the calling job forever.
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Fetch a secret by numeric id. Blank or non-numeric ids fail with
    /// `InvalidInput` before any client is built or network touched.
    pub async fn fetch(
        &self,
        target: &VaultTarget,
        proxy: &ResolvedProxy,
        secret_id: &str,
    ) -> VaultResult<SecretRecord> {
        let id = parse_secret_id(secret_id)?;
        let base = target.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(VaultError::invalid_input("Vault base URL cannot be blank"));
        }

        let client = self.build_client(proxy)?;

        let token = self.request_token(&client, base, target).await?;

        let secret_url = format!("{base}/api/{}/secrets/{id}", self.api_version);
        debug!("Fetching secret {id} from {secret_url}");
        let response = client
            .get(&secret_url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(classify_request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let dto: SecretDto = response.json().await.map_err(|err| {
            VaultError::unexpected(anyhow::Error::new(err).context("Malformed secret response"))
        })?;
        Ok(dto.into_record(id))
    }

    /// A connection context scoped to this single call. The resolver's
    /// decision is authoritative: with `ProxySource::None`, ambient
    /// environment proxies are explicitly disabled.
    fn build_client(&self, proxy: &ResolvedProxy) -> VaultResult<Client> {
        let mut builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout);

        builder = match proxy.source {
            ProxySource::None => builder.no_proxy(),
            ProxySource::SessionOverride | ProxySource::HostGlobal => {
                let host = proxy.host.as_deref().unwrap_or_default();
                let address = match proxy.port {
                    Some(port) => format!("http://{host}:{port}"),
                    None => format!("http://{host}"),
                };
                let mut upstream = reqwest::Proxy::all(&address).map_err(|err| {
                    VaultError::invalid_input(format!("Invalid proxy address '{address}': {err}"))
                })?;
                if let Some(username) = proxy.username.as_deref() {
                    upstream = upstream.basic_auth(username, proxy.password().unwrap_or_default());
                }
                builder.proxy(upstream)
            }
        };

        builder
            .build()
            .map_err(|err| VaultError::unexpected(anyhow::Error::new(err).context("Building vault HTTP client")))
    }

    async fn request_token(
        &self,
        client: &Client,
        base: &str,
        target: &VaultTarget,
    ) -> VaultResult<String> {
        let token_url = format!("{base}/oauth2/token");
        debug!("Requesting access token from {token_url}");
        let params = [
            ("username", target.credential.username.as_str()),
            ("password", target.credential.password()),
            ("grant_type", "password"),
        ];
        let response = client
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(classify_request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }
        let token: TokenDto = response.json().await.map_err(|err| {
            VaultError::unexpected(anyhow::Error::new(err).context("Malformed token response"))
        })?;
        Ok(token.access_token)
    }
}

/// Secret ids are positive integers on the wire.
pub fn parse_secret_id(raw: &str) -> VaultResult<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(VaultError::invalid_input("Secret ID cannot be blank"));
    }
    match raw.parse::<u32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(VaultError::invalid_input(format!(
            "Secret ID must be a positive integer, got '{raw}'"
        ))),
    }
}

fn classify_status(status: StatusCode) -> VaultError {
    VaultError::from_status(status.as_u16())
}

/// Classify a transport-level failure by walking the cause chain down to the
/// innermost error.
fn classify_request_error(err: reqwest::Error) -> VaultError {
    if let Some(status) = err.status() {
        return VaultError::from_status(status.as_u16());
    }
    if err.is_timeout() {
        return VaultError::Transport(format!("request timed out: {err}"));
    }

    let mut texts = vec![err.to_string()];
    let mut cause = std::error::Error::source(&err);
    while let Some(inner) = cause {
        texts.push(inner.to_string());
        cause = inner.source();
    }
    let root = texts.last().cloned().unwrap_or_default();
    let chain = texts.join(": ").to_ascii_lowercase();

    if chain.contains("dns") || chain.contains("lookup") {
        return VaultError::HostUnreachable(root);
    }
    if chain.contains("407") || chain.contains("proxy authentication") {
        return VaultError::ProxyAuthRequired;
    }
    if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
        return VaultError::Transport(root);
    }
    VaultError::unexpected(err)
}

// ============================================================================
// Wire DTOs
// ============================================================================

#[derive(Deserialize)]
struct TokenDto {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretDto {
    #[serde(default)]
    name: String,
    #[serde(default)]
    items: Vec<SecretItemDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretItemDto {
    #[serde(default)]
    field_name: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    item_value: String,
}

impl SecretDto {
    fn into_record(self, id: u32) -> SecretRecord {
        SecretRecord {
            id,
            name: self.name,
            fields: self
                .items
                .into_iter()
                .map(|item| SecretField::new(item.field_name, item.slug, item.item_value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_id_must_be_a_positive_integer() {
        assert_eq!(parse_secret_id("42").unwrap(), 42);
        assert_eq!(parse_secret_id(" 7 ").unwrap(), 7);
        assert!(matches!(
            parse_secret_id(""),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_secret_id("   "),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_secret_id("abc"),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_secret_id("0"),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_secret_id("-3"),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn secret_dto_preserves_server_field_order() {
        let dto: SecretDto = serde_json::from_value(serde_json::json!({
            "name": "app credentials",
            "items": [
                {"fieldName": "Username", "slug": "user", "itemValue": "alice"},
                {"fieldName": "Password", "slug": "pass", "itemValue": "s3cr3t"},
            ]
        }))
        .unwrap();
        let record = dto.into_record(42);
        assert_eq!(record.id, 42);
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[0].name, "Username");
        assert_eq!(record.fields[1].slug, "pass");
        assert_eq!(record.fields[1].value(), "s3cr3t");
    }
}
