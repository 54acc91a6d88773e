use super::error::ApiError;
use super::models::SyncJobRequest;

/// Ids end up inside catalog keys, which use NUL as a separator
pub fn validate_sync_request(request: &SyncJobRequest) -> Result<(), ApiError> {
    for (field, value) in [
        ("channelId", &request.channel_id),
        ("integrationId", &request.integration_id),
        ("folderId", &request.folder_id),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::InvalidPayload(format!("{} is required", field)));
        }
        if value.chars().any(char::is_control) {
            return Err(ApiError::InvalidPayload(format!(
                "{} contains control characters",
                field
            )));
        }
    }
    Ok(())
}
