//! Integration credential resolution

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::catalog::{IntegrationRecord, IntegrationStore};
use crate::provider::{AccessToken, ClientCredentials, StorageProvider};
use crate::secrets::SecretCipher;
use crate::sync::{Result, SyncError};

/// Turns an integration id into an access token for one job run
///
/// The token is returned to the caller and never stored.
pub struct CredentialResolver {
    integrations: Arc<dyn IntegrationStore>,
    cipher: Arc<dyn SecretCipher>,
    provider: Arc<dyn StorageProvider>,
}

impl CredentialResolver {
    pub fn new(
        integrations: Arc<dyn IntegrationStore>,
        cipher: Arc<dyn SecretCipher>,
        provider: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            integrations,
            cipher,
            provider,
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, integration_id: &str) -> Result<AccessToken> {
        let record = self
            .integrations
            .get_integration(integration_id)
            .await?
            .ok_or_else(|| {
                SyncError::Configuration(format!("integration {} not found", integration_id))
            })?;

        let credentials = self.client_credentials(&record)?;
        let token = self.provider.refresh_access_token(&credentials).await?;

        debug!("Access token obtained");
        Ok(token)
    }

    /// Required config fields, with secrets decrypted
    fn client_credentials(&self, record: &IntegrationRecord) -> Result<ClientCredentials> {
        let client_id = record.config_str(IntegrationRecord::CLIENT_ID);
        let refresh_token = record.config_str(IntegrationRecord::ENCRYPTED_REFRESH_TOKEN);
        let client_secret = record.config_str(IntegrationRecord::ENCRYPTED_CLIENT_SECRET);

        let (Some(client_id), Some(refresh_token), Some(client_secret)) =
            (client_id, refresh_token, client_secret)
        else {
            let missing: Vec<&str> = [
                (IntegrationRecord::CLIENT_ID, client_id),
                (IntegrationRecord::ENCRYPTED_REFRESH_TOKEN, refresh_token),
                (IntegrationRecord::ENCRYPTED_CLIENT_SECRET, client_secret),
            ]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| key)
            .collect();

            return Err(SyncError::Configuration(format!(
                "integration {} is missing {}",
                record.id,
                missing.join(", ")
            )));
        };

        let decrypt = |field: &str, ciphertext: &str| {
            self.cipher.decrypt(ciphertext).map_err(|e| {
                warn!(integration_id = %record.id, field, error = %e, "Secret decryption failed");
                SyncError::Configuration(format!(
                    "integration {}: cannot decrypt {}: {}",
                    record.id, field, e
                ))
            })
        };

        Ok(ClientCredentials {
            client_id: client_id.to_string(),
            client_secret: decrypt(IntegrationRecord::ENCRYPTED_CLIENT_SECRET, client_secret)?,
            refresh_token: decrypt(IntegrationRecord::ENCRYPTED_REFRESH_TOKEN, refresh_token)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use crate::provider::{ProviderError, RemoteFile};
    use crate::secrets::SecretError;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::{Map, Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Integrations(HashMap<String, IntegrationRecord>);

    #[async_trait]
    impl IntegrationStore for Integrations {
        async fn get_integration(
            &self,
            integration_id: &str,
        ) -> crate::catalog::Result<Option<IntegrationRecord>> {
            Ok(self.0.get(integration_id).cloned())
        }

        async fn touch_last_sync(
            &self,
            integration_id: &str,
            _at: DateTime<Utc>,
        ) -> crate::catalog::Result<()> {
            Err(CatalogError::IntegrationNotFound(integration_id.to_string()))
        }
    }

    /// "enc:<plain>" decrypts to "<plain>"; anything else fails
    struct PrefixCipher;

    impl SecretCipher for PrefixCipher {
        fn decrypt(&self, ciphertext: &str) -> std::result::Result<String, SecretError> {
            ciphertext
                .strip_prefix("enc:")
                .map(str::to_string)
                .ok_or(SecretError::DecryptionFailed)
        }
    }

    #[derive(Default)]
    struct TokenEndpoint {
        reject: bool,
        seen: Mutex<Vec<ClientCredentials>>,
    }

    #[async_trait]
    impl StorageProvider for TokenEndpoint {
        async fn refresh_access_token(
            &self,
            credentials: &ClientCredentials,
        ) -> crate::provider::Result<AccessToken> {
            self.seen.lock().unwrap().push(credentials.clone());
            if self.reject {
                return Err(ProviderError::Rejected {
                    status: 400,
                    message: "invalid_grant".to_string(),
                });
            }
            Ok(AccessToken::new("ya29.token"))
        }

        async fn list_folder(
            &self,
            _token: &AccessToken,
            _folder_id: &str,
        ) -> crate::provider::Result<Vec<RemoteFile>> {
            Ok(Vec::new())
        }
    }

    fn record(config: Value) -> IntegrationRecord {
        let config: Map<String, Value> = serde_json::from_value(config).unwrap();
        IntegrationRecord {
            id: "integ-1".to_string(),
            channel_id: "chan-1".to_string(),
            provider: "google_drive".to_string(),
            config,
            last_sync_at: None,
        }
    }

    fn complete_record() -> IntegrationRecord {
        record(json!({
            "clientId": "client-1",
            "encryptedRefreshToken": "enc:refresh",
            "encryptedClientSecret": "enc:secret",
            "folderName": "Marketing"
        }))
    }

    fn resolver(
        records: Vec<IntegrationRecord>,
        provider: Arc<TokenEndpoint>,
    ) -> CredentialResolver {
        let integrations = Integrations(records.into_iter().map(|r| (r.id.clone(), r)).collect());
        CredentialResolver::new(Arc::new(integrations), Arc::new(PrefixCipher), provider)
    }

    #[tokio::test]
    async fn test_resolve_decrypts_and_exchanges() {
        let provider = Arc::new(TokenEndpoint::default());
        let resolver = resolver(vec![complete_record()], provider.clone());

        let token = resolver.resolve("integ-1").await.unwrap();
        assert_eq!(token.secret(), "ya29.token");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].client_id, "client-1");
        assert_eq!(seen[0].client_secret, "secret");
        assert_eq!(seen[0].refresh_token, "refresh");
    }

    #[tokio::test]
    async fn test_missing_integration_is_configuration_error() {
        let provider = Arc::new(TokenEndpoint::default());
        let resolver = resolver(vec![], provider.clone());

        let err = resolver.resolve("integ-1").await.unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_are_named() {
        let provider = Arc::new(TokenEndpoint::default());
        let resolver = resolver(
            vec![record(json!({ "clientId": "client-1", "encryptedClientSecret": "" }))],
            provider.clone(),
        );

        let err = resolver.resolve("integ-1").await.unwrap_err();
        let SyncError::Configuration(message) = err else {
            panic!("expected configuration error");
        };
        assert!(message.contains("encryptedRefreshToken"));
        assert!(message.contains("encryptedClientSecret"));
        assert!(!message.contains("clientId"));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undecryptable_secret_is_configuration_error() {
        let provider = Arc::new(TokenEndpoint::default());
        let resolver = resolver(
            vec![record(json!({
                "clientId": "client-1",
                "encryptedRefreshToken": "garbage",
                "encryptedClientSecret": "enc:secret"
            }))],
            provider.clone(),
        );

        let err = resolver.resolve("integ-1").await.unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_auth_error() {
        let provider = Arc::new(TokenEndpoint {
            reject: true,
            ..Default::default()
        });
        let resolver = resolver(vec![complete_record()], provider);

        let err = resolver.resolve("integ-1").await.unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
        assert!(!err.is_retryable());
    }
}
