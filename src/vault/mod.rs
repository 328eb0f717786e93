//! Secret resolution engine: proxy resolution, credential lookup, vault
//! fetch, and field-to-slot mapping.

pub mod client;
pub mod credentials;
pub mod error;
pub mod mapping;
pub mod proxy;
pub mod session;
pub mod types;

pub use client::VaultFetchClient;
pub use credentials::{ConfigCredentialStore, CredentialStore};
pub use error::{VaultError, VaultResult};
pub use session::{ResolutionRequest, SecretResolutionSession};
