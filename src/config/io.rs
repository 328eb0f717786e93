use super::defaults::MAX_CONFIG_FILE_BYTES;
use super::types::Config;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Candidate config file names, checked in order in the working directory.
const CONFIG_FILE_NAMES: &[&str] = &["vaultwrap.json5", "vaultwrap.json"];

/// Read and parse a JSON5 configuration file.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot stat config file '{}'", path.display()))?;
    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Config file '{}' is {} bytes, exceeds limit of {} bytes",
            path.display(),
            metadata.len(),
            MAX_CONFIG_FILE_BYTES,
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
    let config: Config = json5::from_str(&content)
        .with_context(|| format!("Invalid config file '{}'", path.display()))?;
    Ok(config)
}

/// Locate a config file in the working directory.
pub fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}
