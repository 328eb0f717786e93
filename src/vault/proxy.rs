//! Proxy resolution with source-priority fallback and no-proxy exclusion.
//!
//! Two configuration layers may carry proxy settings: the session-level
//! override from the vaultwrap config, and the host-global default snapshot
//! taken from the `HTTPS_PROXY`/`HTTP_PROXY`/`NO_PROXY` environment. The
//! session layer wins when fully specified; a no-proxy match at either layer
//! forces a direct connection. Resolution never fails: malformed input
//! degrades to "treat as non-matching host".

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Proxy settings from one configuration layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxySettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub no_proxy_hosts: Vec<String>,
}

impl ProxySettings {
    /// Snapshot the host-global proxy layer from the process environment.
    ///
    /// Read once per session so a mid-resolution environment change can never
    /// be observed half-applied.
    pub fn from_env_snapshot() -> Self {
        let mut settings = ProxySettings::default();

        if let Some(raw) = env_first(&["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"]) {
            match url::Url::parse(&raw) {
                Ok(parsed) => {
                    settings.host = parsed.host_str().map(str::to_string);
                    settings.port = parsed.port();
                    if !parsed.username().is_empty() {
                        settings.username = Some(parsed.username().to_string());
                    }
                    settings.password = parsed.password().map(str::to_string);
                }
                Err(_) => {
                    warn!("Ignoring unparseable proxy URL from environment");
                }
            }
        }

        if let Some(raw) = env_first(&["NO_PROXY", "no_proxy"]) {
            settings.no_proxy_hosts = raw
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect();
        }

        settings
    }

    fn has_host_and_port(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.trim().is_empty()) && self.port.is_some()
    }

    fn has_host(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.trim().is_empty())
    }
}

fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .filter(|value| !value.trim().is_empty())
}

/// Which configuration layer supplied the effective proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxySource {
    /// Direct connection with no proxy applied.
    None,
    /// The session-level override from the vaultwrap config.
    SessionOverride,
    /// The host-global default from the environment snapshot.
    HostGlobal,
}

impl fmt::Display for ProxySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxySource::None => write!(f, "direct connection"),
            ProxySource::SessionOverride => write!(f, "session override"),
            ProxySource::HostGlobal => write!(f, "host global"),
        }
    }
}

/// The single effective answer of proxy resolution. Created per fetch and
/// never persisted. `source == None` implies every other field is absent.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedProxy {
    pub source: ProxySource,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    password: Option<String>,
}

impl ResolvedProxy {
    /// A direct connection with no proxy fields set.
    pub fn direct() -> Self {
        Self {
            source: ProxySource::None,
            host: None,
            port: None,
            username: None,
            password: None,
        }
    }

    fn from_settings(source: ProxySource, settings: &ProxySettings) -> Self {
        Self {
            source,
            host: settings.host.clone(),
            port: settings.port,
            username: settings.username.clone(),
            password: settings.password.clone(),
        }
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for ResolvedProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProxy")
            .field("source", &self.source)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username.as_ref().map(|_| "*****"))
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

/// Decide the effective proxy for `target_url` given the session-level
/// override and the host-global snapshot.
///
/// Priority: session no-proxy match → session override (host+port set) →
/// host-global (with its own no-proxy check) → direct.
pub fn resolve(
    target_url: &str,
    session: &ProxySettings,
    host_global: &ProxySettings,
) -> ResolvedProxy {
    let target_host = extract_host(target_url);

    let resolved = if host_in_no_proxy(&target_host, &session.no_proxy_hosts) {
        info!("Skipping proxy: no-proxy match for '{target_host}'");
        ResolvedProxy::direct()
    } else if session.has_host_and_port() {
        ResolvedProxy::from_settings(ProxySource::SessionOverride, session)
    } else if host_global.has_host() {
        if host_in_no_proxy(&target_host, &host_global.no_proxy_hosts) {
            info!("Skipping host-global proxy: no-proxy match for '{target_host}'");
            ResolvedProxy::direct()
        } else {
            ResolvedProxy::from_settings(ProxySource::HostGlobal, host_global)
        }
    } else {
        ResolvedProxy::direct()
    };

    log_summary(&resolved);
    resolved
}

/// Extract the hostname from a URL, falling back to the raw string when
/// parsing fails. Never errors on malformed input.
fn extract_host(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match url::Url::parse(trimmed) {
        Ok(parsed) => parsed
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| trimmed.to_string()),
        Err(_) => trimmed.to_string(),
    }
}

/// Exact case-insensitive match, or suffix match so `.internal.example.com`
/// covers every host under that domain. Hostnames compare case-insensitively.
fn host_in_no_proxy(host: &str, entries: &[String]) -> bool {
    if host.is_empty() {
        return false;
    }
    let host = host.to_ascii_lowercase();
    entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .any(|entry| {
            let entry = entry.to_ascii_lowercase();
            host == entry || host.ends_with(&entry)
        })
}

/// One structured, non-sensitive summary per resolution: source, endpoint,
/// and credential presence markers only.
fn log_summary(resolved: &ResolvedProxy) {
    info!(
        "Proxy configuration resolved: source={}, host={}, port={}, username={}, password={}",
        resolved.source,
        resolved.host.as_deref().unwrap_or("(none)"),
        resolved
            .port
            .map(|p| p.to_string())
            .unwrap_or_else(|| "(none)".to_string()),
        if resolved.username.is_some() { "*****" } else { "(none)" },
        if resolved.password.is_some() { "********" } else { "(none)" },
    );
}
