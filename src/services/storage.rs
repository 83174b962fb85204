// src/services/storage.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::common::error::AppError;
use crate::models::product::ALLOWED_IMAGE_TYPES;

#[derive(Debug, Clone)]
pub struct PresignedUpload {
    pub url: String,
    pub key: String,
    pub expires_in: i64,
}

/// Armazenamento de objetos (uploads de imagem).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn presign_upload(&self, key: &str, content_type: &str)
    -> Result<PresignedUpload, AppError>;
    fn public_url(&self, key: &str) -> String;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub fn ensure_image_content_type(content_type: &str) -> Result<(), AppError> {
    if ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Ok(());
    }
    Err(AppError::InvalidField {
        field: "contentType",
        message: format!("use um de: {}", ALLOWED_IMAGE_TYPES.join(", ")),
    })
}

/// URLs de upload assinadas com SHA-256; o gateway de storage confere a assinatura.
pub struct SignedUrlStore {
    base_url: String,
    secret: String,
    ttl: Duration,
}

impl SignedUrlStore {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
            ttl,
        }
    }

    fn signature(&self, key: &str, content_type: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}:{}:{}", self.secret, key, content_type, expires));
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ObjectStore for SignedUrlStore {
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<PresignedUpload, AppError> {
        ensure_image_content_type(content_type)?;

        let expires_in = self.ttl.as_secs() as i64;
        let expires = Utc::now().timestamp() + expires_in;
        let signature = self.signature(key, content_type, expires);

        Ok(PresignedUpload {
            url: format!(
                "{}/{}?contentType={}&expires={}&signature={}",
                self.base_url,
                key,
                content_type.replace('/', "%2F"),
                expires,
                signature
            ),
            key: key.to_string(),
            expires_in,
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        // A remoção física é feita pelo gateway de storage
        tracing::info!("🗑️ Objeto marcado para remoção: {}", key);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Guarda as chaves removidas para as asserções.
    #[derive(Default)]
    pub struct RecordingObjectStore {
        pub deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingObjectStore {
        async fn presign_upload(
            &self,
            key: &str,
            content_type: &str,
        ) -> Result<PresignedUpload, AppError> {
            ensure_image_content_type(content_type)?;
            Ok(PresignedUpload {
                url: format!("https://upload.test/{key}"),
                key: key.to_string(),
                expires_in: 60,
            })
        }

        fn public_url(&self, key: &str) -> String {
            format!("https://cdn.test/{key}")
        }

        async fn delete(&self, key: &str) -> Result<(), AppError> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn presigned_url_is_signed_and_scoped_to_key() {
        let store = SignedUrlStore::new(
            "http://storage.local/bucket/",
            "s3cr3t",
            Duration::from_secs(900),
        );
        let upload = store
            .presign_upload("products/p/images/i", "image/png")
            .await
            .unwrap();
        assert_eq!(upload.expires_in, 900);
        assert!(upload.url.starts_with("http://storage.local/bucket/products/p/images/i?"));
        assert!(upload.url.contains("contentType=image%2Fpng"));
        assert_eq!(store.public_url("k"), "http://storage.local/bucket/k");
    }

    #[test]
    fn signature_depends_on_secret() {
        let a = SignedUrlStore::new("http://x", "one", Duration::from_secs(60));
        let b = SignedUrlStore::new("http://x", "two", Duration::from_secs(60));
        assert_ne!(a.signature("k", "image/png", 1), b.signature("k", "image/png", 1));
        assert_eq!(a.signature("k", "image/png", 1).len(), 64);
    }

    #[tokio::test]
    async fn only_images_are_accepted() {
        let store = SignedUrlStore::new("http://x", "s", Duration::from_secs(60));
        assert!(store.presign_upload("k", "application/pdf").await.is_err());
        assert!(store.presign_upload("k", "image/webp").await.is_ok());
    }
}
