//! Field-to-slot mapping for fetched secrets.

use super::types::{FieldMapping, ResolvedSecret, SecretRecord};
use tracing::debug;

/// Match vault fields against caller mappings, producing destination-slot
/// values plus the set of raw values that must be masked.
///
/// A mapping matches when its `source_key` equals the field's `name` or
/// `slug`, case-insensitively. The scan is O(fields × mappings); both counts
/// are small in practice.
///
/// Caveat: when multiple fields match the same destination slot, the last
/// matching field in server field order wins. Callers control this by mapping
/// design; prefer slugs, which are unique per secret.
pub fn match_fields(secret: &SecretRecord, mappings: &[FieldMapping]) -> ResolvedSecret {
    let mut resolved = ResolvedSecret::default();

    for field in &secret.fields {
        for mapping in mappings {
            if mapping.source_key.eq_ignore_ascii_case(&field.name)
                || mapping.source_key.eq_ignore_ascii_case(&field.slug)
            {
                debug!(
                    "Field '{}' matched mapping '{}' -> slot '{}'",
                    field.name, mapping.source_key, mapping.destination_slot
                );
                resolved
                    .slot_values
                    .insert(mapping.destination_slot.clone(), field.value().to_string());
                resolved.register_masked(field.value());
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::types::SecretField;

    fn record(fields: Vec<SecretField>) -> SecretRecord {
        SecretRecord {
            id: 42,
            name: "app credentials".to_string(),
            fields,
        }
    }

    fn mapping(source: &str, slot: &str) -> FieldMapping {
        FieldMapping {
            source_key: source.to_string(),
            destination_slot: slot.to_string(),
        }
    }

    #[test]
    fn matches_name_case_insensitively() {
        for name in ["username", "USERNAME", "Username"] {
            let secret = record(vec![SecretField::new(name, "user", "alice")]);
            let resolved = match_fields(&secret, &[mapping("Username", "APP_USER")]);
            assert_eq!(
                resolved.slot_values.get("APP_USER"),
                Some(&"alice".to_string())
            );
        }
    }

    #[test]
    fn matches_slug_case_insensitively() {
        let secret = record(vec![SecretField::new("Login Name", "UserName", "alice")]);
        let resolved = match_fields(&secret, &[mapping("username", "APP_USER")]);
        assert_eq!(
            resolved.slot_values.get("APP_USER"),
            Some(&"alice".to_string())
        );
    }

    #[test]
    fn unmatched_fields_produce_nothing() {
        let secret = record(vec![SecretField::new("Notes", "notes", "irrelevant")]);
        let resolved = match_fields(&secret, &[mapping("username", "APP_USER")]);
        assert!(resolved.is_empty());
        assert!(resolved.masked_values.is_empty());
    }

    #[test]
    fn spec_example_mapping() {
        let secret = record(vec![
            SecretField::new("Username", "user", "alice"),
            SecretField::new("Password", "pass", "s3cr3t"),
        ]);
        let resolved = match_fields(
            &secret,
            &[mapping("user", "APP_USER"), mapping("Password", "APP_PASS")],
        );
        assert_eq!(
            resolved.slot_values.get("APP_USER"),
            Some(&"alice".to_string())
        );
        assert_eq!(
            resolved.slot_values.get("APP_PASS"),
            Some(&"s3cr3t".to_string())
        );
        assert_eq!(resolved.masked_values, vec!["alice", "s3cr3t"]);
    }

    #[test]
    fn last_matching_field_in_server_order_wins() {
        let secret = record(vec![
            SecretField::new("Token", "token", "first-value"),
            SecretField::new("token", "legacy-token", "second-value"),
        ]);
        let resolved = match_fields(&secret, &[mapping("token", "APP_TOKEN")]);
        assert_eq!(
            resolved.slot_values.get("APP_TOKEN"),
            Some(&"second-value".to_string())
        );
        // The overwritten value still has to be masked.
        assert_eq!(resolved.masked_values, vec!["first-value", "second-value"]);
    }

    #[test]
    fn one_field_can_fill_multiple_slots() {
        let secret = record(vec![SecretField::new("Password", "pass", "s3cr3t")]);
        let resolved = match_fields(
            &secret,
            &[mapping("pass", "APP_PASS"), mapping("Password", "DB_PASS")],
        );
        assert_eq!(resolved.slot_values.len(), 2);
        assert_eq!(resolved.masked_values, vec!["s3cr3t"]);
    }

    #[test]
    fn empty_field_values_are_not_registered_for_masking() {
        let secret = record(vec![SecretField::new("Domain", "domain", "")]);
        let resolved = match_fields(&secret, &[mapping("domain", "APP_DOMAIN")]);
        assert_eq!(resolved.slot_values.get("APP_DOMAIN"), Some(&String::new()));
        assert!(resolved.masked_values.is_empty());
    }
}
