use super::types::Config;
use crate::vault::client::parse_secret_id;
use anyhow::Result;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn push_error(errors: &mut Vec<ConfigValidationError>, path: impl Into<String>, message: impl Into<String>) {
    errors.push(ConfigValidationError {
        path: path.into(),
        message: message.into(),
    });
}

fn check_url(errors: &mut Vec<ConfigValidationError>, path: &str, value: &str) {
    if url::Url::parse(value).is_err() {
        push_error(errors, path, "Invalid URL");
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.server.base_url.is_empty() {
        if config.secrets.iter().any(|s| s.base_url.is_none()) {
            push_error(
                &mut errors,
                "server.baseUrl",
                "Base URL is required when a secret has no baseUrl override",
            );
        }
    } else {
        check_url(&mut errors, "server.baseUrl", &config.server.base_url);
    }

    if config.server.use_proxy {
        match config.server.proxy.host.as_deref() {
            None | Some("") => push_error(
                &mut errors,
                "server.proxy.host",
                "Proxy host is required when useProxy is set",
            ),
            Some(_) => {}
        }
        if config.server.proxy.port.is_none() {
            push_error(
                &mut errors,
                "server.proxy.port",
                "Proxy port is required when useProxy is set",
            );
        }
        if config.server.proxy.port == Some(0) {
            push_error(&mut errors, "server.proxy.port", "Port must be greater than 0");
        }
    }

    for (id, credential) in &config.credentials {
        if credential.username.is_empty() {
            push_error(
                &mut errors,
                format!("credentials.{id}.username"),
                "Username is required",
            );
        }
        if credential.password.is_none() && credential.password_env.is_none() {
            push_error(
                &mut errors,
                format!("credentials.{id}"),
                "Either password or passwordEnv is required",
            );
        }
    }

    for (index, spec) in config.secrets.iter().enumerate() {
        if let Err(err) = parse_secret_id(&spec.id) {
            push_error(&mut errors, format!("secrets[{index}].id"), err.to_string());
        }
        if let Some(base_url) = &spec.base_url {
            check_url(&mut errors, &format!("secrets[{index}].baseUrl"), base_url);
        }
        if spec.mappings.is_empty() {
            push_error(
                &mut errors,
                format!("secrets[{index}].mappings"),
                "At least one mapping is required",
            );
        }
        for (m, mapping) in spec.mappings.iter().enumerate() {
            if mapping.field.is_empty() {
                push_error(
                    &mut errors,
                    format!("secrets[{index}].mappings[{m}].field"),
                    "Field name is required",
                );
            }
            if mapping.env.is_empty() {
                push_error(
                    &mut errors,
                    format!("secrets[{index}].mappings[{m}].env"),
                    "Environment variable name is required",
                );
            }
        }

        let credential_id = spec
            .credential_id
            .as_deref()
            .unwrap_or(config.server.credential_id.as_str());
        if credential_id.is_empty() {
            push_error(
                &mut errors,
                format!("secrets[{index}].credentialId"),
                "Credential ID is required (set server.credentialId or an override)",
            );
        } else if !config.credentials.contains_key(credential_id) {
            push_error(
                &mut errors,
                format!("secrets[{index}].credentialId"),
                format!("Credential '{credential_id}' is not configured"),
            );
        }
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}
