/// Default configuration constants used across the system.

/// Default environment-variable prefix for injected secrets.
pub const DEFAULT_ENV_PREFIX: &str = "TSS_";

/// Default Secret Server REST API version segment.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Default connect timeout for vault requests.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Default overall request timeout for vault requests.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Maximum size for a config file (1 MB).
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;
