mod defaults;
mod io;
mod types;
mod validation;

pub use defaults::*;
pub use io::*;
pub use types::*;
pub use validation::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(find_config_file);

        let mut config = match config_path {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                load_config_file(&path)?
            }
            Some(path) => {
                anyhow::bail!("Config file '{}' does not exist", path.display());
            }
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Write default configuration to a file.
    pub fn write_default(path: &str) -> Result<()> {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("VAULTWRAP_BASE_URL") {
            self.server.base_url = value;
        }
        if let Ok(value) = std::env::var("VAULTWRAP_CREDENTIAL_ID") {
            self.server.credential_id = value;
        }
        if let Ok(value) = std::env::var("VAULTWRAP_ENV_PREFIX") {
            self.server.environment_variable_prefix = value;
        }
        if let Ok(value) = std::env::var("VAULTWRAP_PROXY_HOST") {
            self.server.use_proxy = true;
            self.server.proxy.host = Some(value);
        }
        if let Ok(value) = std::env::var("VAULTWRAP_PROXY_PORT") {
            if let Ok(port) = value.parse() {
                self.server.proxy.port = Some(port);
            }
        }
    }

    /// JSON view with secret material removed, for `config show`.
    pub fn redacted(&self) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;

        if let Some(password) = value.pointer_mut("/server/proxy/password") {
            if !password.is_null() {
                *password = serde_json::Value::String("<redacted>".to_string());
            }
        }
        if let Some(credentials) = value
            .pointer_mut("/credentials")
            .and_then(serde_json::Value::as_object_mut)
        {
            for credential in credentials.values_mut() {
                if let Some(password) = credential.get_mut("password") {
                    if !password.is_null() {
                        *password = serde_json::Value::String("<redacted>".to_string());
                    }
                }
            }
        }

        Ok(value)
    }
}
