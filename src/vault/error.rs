//! Classified errors for vault resolution.
//!
//! Every failure surfaced to a caller carries a short classification-specific
//! message; full diagnostic detail stays in the server-side log. A resolution
//! failure is always terminal: there is no retry and no partial success.

use thiserror::Error;
use tracing::error;

pub type VaultResult<T> = std::result::Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Caller-supplied input failed validation before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The credential store returned nothing for the given id under the
    /// current access context.
    #[error("No credentials available for id '{0}'")]
    CredentialNotFound(String),

    /// DNS/host resolution failed.
    #[error("Host not found: {0}")]
    HostUnreachable(String),

    /// An auth-challenge status was routed back through the proxy.
    #[error("Proxy authentication failed (HTTP 407).")]
    ProxyAuthRequired,

    /// The remote rejected the credentials or the request outright.
    #[error("Access denied / invalid credentials (HTTP {status}).")]
    AccessDenied { status: u16 },

    /// The remote denies access to the specific secret.
    #[error("Access forbidden (HTTP 403).")]
    Forbidden,

    /// Any other 4xx/5xx status.
    #[error("HTTP error (status {status}).")]
    RemoteHttp { status: u16 },

    /// Non-HTTP I/O failure (timeouts, broken connections).
    #[error("Network I/O error: {0}")]
    Transport(String),

    /// Uncategorized failure. Full detail is logged at classification time;
    /// the display string stays generic.
    #[error("Unexpected error while contacting the vault.")]
    Unexpected(#[source] anyhow::Error),
}

impl VaultError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Wrap an uncategorized error, logging its full detail at error severity
    /// so the generic caller-facing message loses nothing server-side.
    pub fn unexpected(err: impl Into<anyhow::Error>) -> Self {
        let err = err.into();
        error!("Unexpected vault error: {err:#}");
        Self::Unexpected(err)
    }

    /// Classify a non-success HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            407 => Self::ProxyAuthRequired,
            400 | 401 => Self::AccessDenied { status },
            403 => Self::Forbidden,
            _ => Self::RemoteHttp { status },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification_ladder() {
        assert!(matches!(
            VaultError::from_status(407),
            VaultError::ProxyAuthRequired
        ));
        assert!(matches!(
            VaultError::from_status(400),
            VaultError::AccessDenied { status: 400 }
        ));
        assert!(matches!(
            VaultError::from_status(401),
            VaultError::AccessDenied { status: 401 }
        ));
        assert!(matches!(VaultError::from_status(403), VaultError::Forbidden));
        assert!(matches!(
            VaultError::from_status(500),
            VaultError::RemoteHttp { status: 500 }
        ));
        assert!(matches!(
            VaultError::from_status(404),
            VaultError::RemoteHttp { status: 404 }
        ));
    }

    #[test]
    fn caller_facing_messages_are_classification_specific() {
        assert_eq!(
            VaultError::from_status(407).to_string(),
            "Proxy authentication failed (HTTP 407)."
        );
        assert_eq!(
            VaultError::from_status(400).to_string(),
            "Access denied / invalid credentials (HTTP 400)."
        );
        assert_eq!(
            VaultError::from_status(403).to_string(),
            "Access forbidden (HTTP 403)."
        );
        assert_eq!(
            VaultError::from_status(502).to_string(),
            "HTTP error (status 502)."
        );
    }

    #[test]
    fn unexpected_displays_generically() {
        let err = VaultError::Unexpected(anyhow::anyhow!("stack detail with internals"));
        assert_eq!(
            err.to_string(),
            "Unexpected error while contacting the vault."
        );
    }
}
