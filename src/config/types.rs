use super::defaults::{
    DEFAULT_API_VERSION, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_ENV_PREFIX,
    DEFAULT_REQUEST_TIMEOUT_MS,
};
use crate::vault::proxy::ProxySettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level vaultwrap configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub server: ServerConfig,
    /// Stored credentials for authenticating against the vault, by id.
    pub credentials: HashMap<String, CredentialConfig>,
    /// Secrets to resolve and inject.
    pub secrets: Vec<SecretSpec>,
}

/// Connection defaults for the Secret Server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Base URL of the Secret Server, e.g. `https://vault.example.com`.
    pub base_url: String,
    /// Default credential id used when a secret spec has no override.
    pub credential_id: String,
    /// Prefix prepended to every injected environment variable name.
    pub environment_variable_prefix: String,
    /// REST API version segment.
    pub api_version: String,
    /// Whether the session-level proxy override below applies.
    pub use_proxy: bool,
    pub proxy: ProxyConfig,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            credential_id: String::new(),
            environment_variable_prefix: DEFAULT_ENV_PREFIX.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            use_proxy: false,
            proxy: ProxyConfig::default(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// Session-level proxy override.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Name of an environment variable holding the proxy password.
    pub password_env: Option<String>,
    /// Hostnames and domain suffixes that always bypass proxying.
    pub no_proxy_hosts: Vec<String>,
}

impl ServerConfig {
    /// Session-layer proxy settings; empty when proxying is disabled, so the
    /// resolver falls through to the host-global layer.
    pub fn session_proxy_settings(&self) -> ProxySettings {
        if !self.use_proxy {
            return ProxySettings::default();
        }
        let password = self.proxy.password.clone().or_else(|| {
            self.proxy
                .password_env
                .as_ref()
                .and_then(|var| std::env::var(var).ok())
        });
        ProxySettings {
            host: self.proxy.host.clone(),
            port: self.proxy.port,
            username: self.proxy.username.clone(),
            password,
            no_proxy_hosts: self.proxy.no_proxy_hosts.clone(),
        }
    }
}

/// A stored vault credential.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialConfig {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Name of an environment variable holding the password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
    /// Jobs allowed to use this credential. Empty means any context.
    pub jobs: Vec<String>,
}

/// One secret to resolve, with optional per-secret overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretSpec {
    /// Numeric secret id, kept as a string for fail-fast validation.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    pub mappings: Vec<MappingConfig>,
}

/// Binds a vault field (by name or slug) to an environment variable name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingConfig {
    pub field: String,
    pub env: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_documented_constants() {
        let config = Config::default();
        assert_eq!(config.server.environment_variable_prefix, "TSS_");
        assert_eq!(config.server.api_version, "v1");
        assert!(!config.server.use_proxy);
        assert!(config.secrets.is_empty());
    }

    #[test]
    fn disabled_proxy_yields_empty_settings() {
        let mut server = ServerConfig::default();
        server.proxy.host = Some("proxy.example.com".to_string());
        server.proxy.port = Some(3128);
        let settings = server.session_proxy_settings();
        assert!(settings.host.is_none());
        assert!(settings.port.is_none());
    }

    #[test]
    fn enabled_proxy_carries_all_fields() {
        let mut server = ServerConfig::default();
        server.use_proxy = true;
        server.proxy.host = Some("proxy.example.com".to_string());
        server.proxy.port = Some(3128);
        server.proxy.username = Some("proxyuser".to_string());
        server.proxy.password = Some("proxypass".to_string());
        server.proxy.no_proxy_hosts = vec![".internal.example.com".to_string()];
        let settings = server.session_proxy_settings();
        assert_eq!(settings.host.as_deref(), Some("proxy.example.com"));
        assert_eq!(settings.port, Some(3128));
        assert_eq!(settings.no_proxy_hosts.len(), 1);
    }

    #[test]
    fn config_parses_from_json5() {
        let parsed: Config = json5::from_str(
            r#"{
              server: {
                baseUrl: "https://vault.example.com",
                credentialId: "cred-1",
              },
              credentials: {
                "cred-1": { username: "svc", passwordEnv: "VAULT_PASSWORD" },
              },
              secrets: [
                { id: "42", mappings: [{ field: "user", env: "APP_USER" }] },
              ],
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.server.base_url, "https://vault.example.com");
        assert_eq!(parsed.secrets[0].mappings[0].env, "APP_USER");
        assert!(parsed.credentials.contains_key("cred-1"));
        // Unset fields fall back to defaults.
        assert_eq!(parsed.server.environment_variable_prefix, "TSS_");
    }
}
