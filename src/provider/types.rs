//! Google Drive API wire types

use serde::Deserialize;

/// OAuth token endpoint success body
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// OAuth token endpoint error body
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Drive API error envelope: `{"error": {"code", "message", "errors": [...]}}`
#[derive(Debug, Deserialize)]
pub struct DriveErrorResponse {
    pub error: DriveError,
}

#[derive(Debug, Deserialize)]
pub struct DriveError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<DriveErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct DriveErrorDetail {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub reason: String,
}

/// Drive `files.list` response, restricted to the fields we request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Drive file resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub thumbnail_link: Option<String>,
    /// Decimal string; absent for folders and Google-native documents
    #[serde(default)]
    pub size: Option<String>,
}
