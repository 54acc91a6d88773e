//! Storage provider seam and the Google Drive adapter
//!
//! The worker talks to the provider for exactly two things: exchanging a
//! refresh token for an access token, and listing one folder.

mod drive;
mod error;
pub mod types;

pub use drive::DriveClient;
pub use error::{ProviderError, Result};

use async_trait::async_trait;

/// Normalized descriptor of one remote file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub thumbnail_url: Option<String>,
    /// Provider-supplied size string, unparsed
    pub size: Option<String>,
}

/// Decrypted OAuth client material for one integration
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Short-lived bearer token, valid for one job run
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Exchange a refresh token for an access token
    async fn refresh_access_token(&self, credentials: &ClientCredentials) -> Result<AccessToken>;

    /// List the direct children of a folder, in provider order
    async fn list_folder(&self, token: &AccessToken, folder_id: &str) -> Result<Vec<RemoteFile>>;
}

/// Canonical direct-content URL of a remote file
pub fn content_url(content_host: &str, file_id: &str) -> String {
    format!("https://{}/d/{}", content_host, file_id)
}
