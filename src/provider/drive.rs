//! Google Drive v3 client

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::error::{ProviderError, Result};
use super::types::{
    DriveErrorResponse, DriveFile, FilesListResponse, TokenErrorResponse, TokenResponse,
};
use super::{AccessToken, ClientCredentials, RemoteFile, StorageProvider};
use crate::config::ProviderConfig;

/// `errors[].reason` values Drive sends with a 403 when throttling
const RATE_LIMIT_REASONS: &[&str] = &[
    "userRateLimitExceeded",
    "rateLimitExceeded",
    "dailyLimitExceeded",
    "sharingRateLimitExceeded",
];

/// Fields requested from `files.list`
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,thumbnailLink,size)";

/// Drive API client
///
/// No retries here: a failed call surfaces as [`ProviderError::Unavailable`]
/// and the queue decides whether to run the whole job again.
pub struct DriveClient {
    client: Client,
    token_url: String,
    api_base: String,
    page_size: u32,
}

impl DriveClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;

        Ok(Self {
            client,
            token_url: config.token_url.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    /// Fetch one page of a folder listing
    async fn list_page(
        &self,
        token: &AccessToken,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<FilesListResponse> {
        let page_size = self.page_size.to_string();
        let mut params = vec![
            ("q", query),
            ("fields", LIST_FIELDS),
            ("pageSize", page_size.as_str()),
        ];
        if let Some(page_token) = page_token {
            params.push(("pageToken", page_token));
        }

        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .bearer_auth(token.secret())
            .query(&params)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let response = check_listing_status(response).await?;
        response
            .json::<FilesListResponse>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StorageProvider for DriveClient {
    #[instrument(skip_all, fields(client_id = %credentials.client_id))]
    async fn refresh_access_token(&self, credentials: &ClientCredentials) -> Result<AccessToken> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", credentials.refresh_token.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            let token: TokenResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::Decode(e.to_string()))?;
            debug!(expires_in = token.expires_in, "Access token refreshed");
            return Ok(AccessToken::new(token.access_token));
        }

        let message = error_message(response).await;
        if is_transient(status) {
            warn!(status = status.as_u16(), "Token endpoint unavailable");
            return Err(ProviderError::Unavailable {
                status: Some(status.as_u16()),
                message,
            });
        }

        warn!(status = status.as_u16(), error = %message, "Token refresh rejected");
        Err(ProviderError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    #[instrument(skip(self, token))]
    async fn list_folder(&self, token: &AccessToken, folder_id: &str) -> Result<Vec<RemoteFile>> {
        let query = folder_query(folder_id);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0u32;

        loop {
            let page = self.list_page(token, &query, page_token.as_deref()).await?;
            pages += 1;
            files.extend(page.files.into_iter().map(RemoteFile::from));

            match page.next_page_token {
                Some(next) if !next.is_empty() => {
                    if !seen_tokens.insert(next.clone()) {
                        warn!(pages, page_token = %next, "Page token repeated");
                        return Err(ProviderError::Decode(format!(
                            "pagination did not advance: page token {} repeated after {} pages",
                            next, pages
                        )));
                    }
                    page_token = Some(next);
                }
                _ => break,
            }
        }

        debug!(count = files.len(), pages, "Folder listed");
        Ok(files)
    }
}

impl From<DriveFile> for RemoteFile {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            thumbnail_url: file.thumbnail_link,
            size: file.size,
        }
    }
}

/// Direct, non-trashed children of a folder
fn folder_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}' in parents and trashed = false", escaped)
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

async fn check_listing_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = describe_error(status, &body);
    warn!(status = code, error = %message, "Folder listing failed");

    Err(match status {
        StatusCode::FORBIDDEN if is_rate_limited(&body) => ProviderError::Unavailable {
            status: Some(code),
            message,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Rejected { status: code, message }
        }
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
            ProviderError::InvalidRequest { status: code, message }
        }
        _ => ProviderError::Unavailable {
            status: Some(code),
            message,
        },
    })
}

/// Drive reports quota exhaustion as 403 with a usage-limit reason
fn is_rate_limited(body: &str) -> bool {
    serde_json::from_str::<DriveErrorResponse>(body)
        .map(|parsed| {
            parsed
                .error
                .errors
                .iter()
                .any(|detail| RATE_LIMIT_REASONS.contains(&detail.reason.as_str()))
        })
        .unwrap_or(false)
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    describe_error(status, &body)
}

/// Best-effort error text; prefers the OAuth `error` code, then the Drive
/// error message, then the raw body
fn describe_error(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<TokenErrorResponse>(body) {
        return match parsed.error_description {
            Some(description) => format!("{}: {}", parsed.error, description),
            None => parsed.error,
        };
    }

    if let Ok(parsed) = serde_json::from_str::<DriveErrorResponse>(body) {
        let reasons: Vec<&str> = parsed
            .error
            .errors
            .iter()
            .map(|detail| detail.reason.as_str())
            .filter(|reason| !reason.is_empty())
            .collect();
        if reasons.is_empty() {
            return parsed.error.message;
        }
        return format!("{} ({})", parsed.error.message, reasons.join(", "));
    }

    if body.is_empty() {
        status.canonical_reason().unwrap_or("Unknown").to_string()
    } else {
        body.to_string()
    }
}
