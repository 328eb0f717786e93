//! Child-command execution with injected secrets and masked output.
//!
//! Every configured secret spec is resolved through one session before the
//! child is spawned; any resolution failure aborts the run outright; the
//! child never starts with a partial environment. Child stdout/stderr are
//! pumped through per-stream [`OutputMasker`]s onto the parent's streams.

pub mod mask;

pub use mask::{OutputMasker, MASK_PLACEHOLDER};

use crate::config::{Config, SecretSpec};
use crate::vault::client::VaultFetchClient;
use crate::vault::credentials::{ConfigCredentialStore, CredentialStore};
use crate::vault::error::{VaultError, VaultResult};
use crate::vault::session::{ResolutionRequest, SecretResolutionSession};
use crate::vault::types::{AccessContext, FieldMapping};
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Environment assembled from every configured secret spec, plus the values
/// the output streams must suppress.
#[derive(Debug)]
pub struct PreparedEnv {
    pub vars: Vec<(String, String)>,
    pub masked_values: Vec<String>,
}

fn session_for(config: &Config, store: Arc<dyn CredentialStore>) -> SecretResolutionSession {
    let client = VaultFetchClient::new(&config.server.api_version).with_timeouts(
        Duration::from_millis(config.server.connect_timeout_ms),
        Duration::from_millis(config.server.request_timeout_ms),
    );
    SecretResolutionSession::new(store, client, config.server.session_proxy_settings())
}

/// Per-spec overrides fall back to the server-level defaults.
fn request_for_spec(config: &Config, spec: &SecretSpec) -> ResolutionRequest {
    ResolutionRequest {
        credential_id: spec
            .credential_id
            .clone()
            .unwrap_or_else(|| config.server.credential_id.clone()),
        base_url: spec
            .base_url
            .clone()
            .unwrap_or_else(|| config.server.base_url.clone()),
        secret_id: spec.id.clone(),
        mappings: spec
            .mappings
            .iter()
            .map(|m| FieldMapping {
                source_key: m.field.clone(),
                destination_slot: m.env.clone(),
            })
            .collect(),
    }
}

/// Resolve every configured secret spec into environment variables and the
/// masking set, using the config-backed credential store.
pub async fn prepare_env(config: &Config, ctx: &AccessContext) -> VaultResult<PreparedEnv> {
    let store: Arc<dyn CredentialStore> =
        Arc::new(ConfigCredentialStore::new(config.credentials.clone()));
    prepare_env_with_store(config, store, ctx).await
}

/// Same as [`prepare_env`] but with a caller-supplied credential store.
pub async fn prepare_env_with_store(
    config: &Config,
    store: Arc<dyn CredentialStore>,
    ctx: &AccessContext,
) -> VaultResult<PreparedEnv> {
    let mut session = session_for(config, store);
    let prefix = config.server.environment_variable_prefix.as_str();

    let mut vars: Vec<(String, String)> = Vec::new();
    let mut masked_values: Vec<String> = Vec::new();
    for spec in &config.secrets {
        let request = request_for_spec(config, spec);
        let resolved = session.resolve(&request, ctx).await?;
        let mut slots: Vec<(&String, &String)> = resolved.slot_values.iter().collect();
        slots.sort();
        for (slot, value) in slots {
            let name = format!("{prefix}{slot}");
            debug!("Injecting {name} from secret {}", spec.id);
            vars.push((name, value.clone()));
        }
        for value in &resolved.masked_values {
            if !masked_values.iter().any(|v| v == value) {
                masked_values.push(value.clone());
            }
        }
    }

    info!(
        "Prepared {} environment variable(s) from {} secret spec(s)",
        vars.len(),
        config.secrets.len()
    );
    Ok(PreparedEnv {
        vars,
        masked_values,
    })
}

/// Resolve one secret end to end without running anything: the
/// test-connection path.
pub async fn check_connection(config: &Config, secret_id: Option<&str>) -> VaultResult<()> {
    let spec = match secret_id {
        Some(id) => config
            .secrets
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .unwrap_or_else(|| SecretSpec {
                id: id.to_string(),
                ..SecretSpec::default()
            }),
        None => config.secrets.first().cloned().ok_or_else(|| {
            VaultError::invalid_input("No secrets configured and no secret id given")
        })?,
    };

    let store: Arc<dyn CredentialStore> =
        Arc::new(ConfigCredentialStore::new(config.credentials.clone()));
    let mut session = session_for(config, store);
    let request = request_for_spec(config, &spec);
    session.resolve(&request, &AccessContext::system()).await?;
    Ok(())
}

/// Run `command` with secrets injected into its environment, masking both
/// output streams. Returns the child's exit code.
pub async fn run_command(
    config: &Config,
    ctx: &AccessContext,
    command: &[String],
) -> Result<i32> {
    if command.is_empty() {
        bail!("No command given to run");
    }

    let env = prepare_env(config, ctx).await?;

    info!("Running '{}' with {} injected variable(s)", command[0], env.vars.len());
    let mut child = Command::new(&command[0])
        .args(&command[1..])
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn '{}'", command[0]))?;

    let stdout = child
        .stdout
        .take()
        .context("Child stdout was not captured")?;
    let stderr = child
        .stderr
        .take()
        .context("Child stderr was not captured")?;

    let out_task = tokio::spawn(pump(stdout, std::io::stdout(), env.masked_values.clone()));
    let err_task = tokio::spawn(pump(stderr, std::io::stderr(), env.masked_values));

    let status = child.wait().await.context("Waiting for child process")?;
    out_task.await.context("stdout pump task panicked")??;
    err_task.await.context("stderr pump task panicked")??;

    Ok(status.code().unwrap_or(-1))
}

/// Copy `reader` to `writer` through a masker until EOF, then release the
/// masker's holdback.
async fn pump<R, W>(mut reader: R, writer: W, secrets: Vec<String>) -> Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: Write,
{
    let mut masker = OutputMasker::new(writer, secrets);
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        masker.write_all(&buf[..n])?;
    }
    masker.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingConfig;

    #[tokio::test]
    async fn pump_masks_across_read_boundaries() {
        let (client, mut server) = tokio::io::duplex(64);

        let pump_task = tokio::spawn(async move {
            let mut out = Vec::new();
            {
                let mut masker = OutputMasker::new(&mut out, vec!["s3cr3t".to_string()]);
                let mut reader = client;
                let mut buf = [0u8; 4];
                loop {
                    let n = reader.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    masker.write_all(&buf[..n]).unwrap();
                }
                masker.finish().unwrap();
            }
            out
        });

        use tokio::io::AsyncWriteExt;
        server.write_all(b"value=s3cr3t end").await.unwrap();
        drop(server);

        let out = pump_task.await.unwrap();
        assert_eq!(out, b"value=******** end");
    }

    #[test]
    fn request_for_spec_falls_back_to_server_defaults() {
        let mut config = Config::default();
        config.server.base_url = "https://vault.example.com".to_string();
        config.server.credential_id = "cred-global".to_string();

        let spec = SecretSpec {
            id: "42".to_string(),
            base_url: None,
            credential_id: None,
            mappings: vec![MappingConfig {
                field: "user".to_string(),
                env: "APP_USER".to_string(),
            }],
        };
        let request = request_for_spec(&config, &spec);
        assert_eq!(request.base_url, "https://vault.example.com");
        assert_eq!(request.credential_id, "cred-global");
        assert_eq!(request.mappings[0].destination_slot, "APP_USER");

        let spec = SecretSpec {
            id: "43".to_string(),
            base_url: Some("https://other.example.com".to_string()),
            credential_id: Some("cred-override".to_string()),
            mappings: Vec::new(),
        };
        let request = request_for_spec(&config, &spec);
        assert_eq!(request.base_url, "https://other.example.com");
        assert_eq!(request.credential_id, "cred-override");
    }
}
