//! Core types for vault secret resolution.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Credentials and access control
// ============================================================================

/// A username/password pair used to authenticate against the vault.
///
/// The password is deliberately private and is redacted from `Debug` output so
/// it cannot leak through diagnostic logging.
#[derive(Clone)]
pub struct UsernamePassword {
    pub username: String,
    password: String,
}

impl UsernamePassword {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for UsernamePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernamePassword")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The access-control scope a resolution runs under: on behalf of which job
/// the credential store is being queried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessContext {
    /// The job requesting access, or `None` for system-level access.
    pub job: Option<String>,
}

impl AccessContext {
    /// System-level context, not tied to any job.
    pub fn system() -> Self {
        Self { job: None }
    }

    pub fn for_job(job: impl Into<String>) -> Self {
        Self {
            job: Some(job.into()),
        }
    }
}

/// Connection target for one vault fetch.
#[derive(Debug, Clone)]
pub struct VaultTarget {
    pub base_url: String,
    pub credential: UsernamePassword,
}

// ============================================================================
// Secret records
// ============================================================================

/// One field of a fetched secret. `name` and `slug` are independent
/// identifying keys; the value is redacted from `Debug` output.
#[derive(Clone)]
pub struct SecretField {
    pub name: String,
    pub slug: String,
    value: String,
}

impl SecretField {
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for SecretField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretField")
            .field("name", &self.name)
            .field("slug", &self.slug)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// A secret fetched from the vault: an ordered list of named fields.
/// Field order is the server's order and drives mapping overwrite semantics.
#[derive(Debug, Clone)]
pub struct SecretRecord {
    pub id: u32,
    pub name: String,
    pub fields: Vec<SecretField>,
}

// ============================================================================
// Mappings and resolution output
// ============================================================================

/// A caller-declared rule binding a vault field (by name or slug) to a
/// destination slot such as an environment variable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub source_key: String,
    pub destination_slot: String,
}

/// The outcome of one resolution: destination slots with their plaintext
/// values, plus every raw value that must be masked downstream.
///
/// Owned by the session that produced it and consumed by the masking stage;
/// never cached beyond a single resolution step.
#[derive(Clone, Default)]
pub struct ResolvedSecret {
    /// Destination slot → plaintext value. Keys are unique; when multiple
    /// fields match the same slot, the last match in server field order wins.
    pub slot_values: HashMap<String, String>,
    /// Every raw field value that was matched, in first-seen order,
    /// deduplicated. Empty values are never registered.
    pub masked_values: Vec<String>,
}

impl ResolvedSecret {
    pub fn is_empty(&self) -> bool {
        self.slot_values.is_empty()
    }

    /// Register a raw value for masking. Empty values are skipped: masking an
    /// empty string would corrupt all output.
    pub fn register_masked(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        if !self.masked_values.iter().any(|v| v == value) {
            self.masked_values.push(value.to_string());
        }
    }
}

impl fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut slots: Vec<&String> = self.slot_values.keys().collect();
        slots.sort();
        f.debug_struct("ResolvedSecret")
            .field("slots", &slots)
            .field("masked_value_count", &self.masked_values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_redacted_in_debug() {
        let cred = UsernamePassword::new("svc", "p@ss");
        let printed = format!("{cred:?}");
        assert!(printed.contains("svc"));
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("p@ss"));
    }

    #[test]
    fn field_value_redacted_in_debug() {
        let field = SecretField::new("Password", "pass", "s3cr3t");
        let printed = format!("{field:?}");
        assert!(!printed.contains("s3cr3t"));
        assert!(printed.contains("pass"));
    }

    #[test]
    fn resolved_secret_debug_hides_values() {
        let mut resolved = ResolvedSecret::default();
        resolved
            .slot_values
            .insert("APP_PASS".to_string(), "s3cr3t".to_string());
        resolved.register_masked("s3cr3t");
        let printed = format!("{resolved:?}");
        assert!(printed.contains("APP_PASS"));
        assert!(!printed.contains("s3cr3t"));
    }

    #[test]
    fn register_masked_skips_empty_and_duplicates() {
        let mut resolved = ResolvedSecret::default();
        resolved.register_masked("");
        resolved.register_masked("alice");
        resolved.register_masked("alice");
        resolved.register_masked("s3cr3t");
        assert_eq!(resolved.masked_values, vec!["alice", "s3cr3t"]);
    }
}
