//! Cloudinary upload API client.
//!
//! Uses signed uploads: every request carries the API key, a unix
//! timestamp and a SHA-256 signature over the signed parameters.

use async_trait::async_trait;
use core_config::{env_or_default, env_parse_or, env_required, ConfigError, FromEnv};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, instrument};

use super::{ImageStorage, StoredImage};
use crate::error::{ProductError, ProductResult};
use crate::intake::UploadedFile;

/// Default base URL of the upload API
pub const DEFAULT_API_URL: &str = "https://api.cloudinary.com/v1_1";

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_url: String,
    /// Return `secure_url` (https) rather than `url`
    pub secure: bool,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("secure", &self.secure)
            .finish()
    }
}

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_url: DEFAULT_API_URL.to_string(),
            secure: true,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// `{api_url}/{cloud_name}/image/upload`
    pub fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.api_url.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

impl FromEnv for CloudinaryConfig {
    /// - CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET: required
    /// - CLOUDINARY_API_URL: defaults to [`DEFAULT_API_URL`]
    /// - CLOUDINARY_SECURE: defaults to true
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            cloud_name: env_required("CLOUDINARY_CLOUD_NAME")?,
            api_key: env_required("CLOUDINARY_API_KEY")?,
            api_secret: env_required("CLOUDINARY_API_SECRET")?,
            api_url: env_or_default("CLOUDINARY_API_URL", DEFAULT_API_URL),
            secure: env_parse_or("CLOUDINARY_SECURE", true)?,
        })
    }
}

/// Sign upload parameters.
///
/// Parameters are sorted by name, joined as `k=v` pairs with `&`, suffixed
/// with the API secret and hashed with SHA-256 (lowercase hex).
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    public_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a provider response to a [`StoredImage`]
fn parse_upload_response(
    status: StatusCode,
    body: &[u8],
    secure: bool,
) -> ProductResult<StoredImage> {
    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| format!("provider responded with {status}"));
        return Err(ProductError::Upload(message));
    }

    let response: UploadResponse = serde_json::from_slice(body)
        .map_err(|e| ProductError::Upload(format!("unreadable provider response: {e}")))?;

    let url = if secure {
        response.secure_url.or(response.url)
    } else {
        response.url.or(response.secure_url)
    };

    match url.filter(|u| !u.is_empty()) {
        Some(url) => Ok(StoredImage {
            url,
            public_id: response.public_id.unwrap_or_default(),
        }),
        None => Err(ProductError::EmptyUpload),
    }
}

/// [`ImageStorage`] backed by Cloudinary's upload API
#[derive(Clone, Debug)]
pub struct CloudinaryStorage {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryStorage {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    fn form(&self, file: &UploadedFile, folder: &str, timestamp: &str) -> ProductResult<Form> {
        let signature = sign(
            &[("folder", folder), ("timestamp", timestamp)],
            &self.config.api_secret,
        );

        let mut part = Part::stream_with_length(file.bytes.clone(), file.len() as u64)
            .file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }

        Ok(Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", folder.to_string())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", part))
    }
}

#[async_trait]
impl ImageStorage for CloudinaryStorage {
    #[instrument(skip(self, file), fields(file_name = %file.file_name, size = file.len()))]
    async fn upload(&self, file: &UploadedFile, folder: &str) -> ProductResult<StoredImage> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let form = self.form(file, folder, &timestamp)?;

        let response = self
            .client
            .post(self.config.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        match parse_upload_response(status, &body, self.config.secure) {
            Ok(image) => {
                debug!(url = %image.url, public_id = %image.public_id, "Image stored");
                Ok(image)
            }
            Err(e) => {
                error!(%status, error = %e, "Cloudinary upload rejected");
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Multipart;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::collections::HashMap;

    #[test]
    fn test_sign_sorts_params_and_appends_secret() {
        let expected = "3a0d57edea0efdf0a632c101b2f03c30457a1a02b28b145e0fb0e299dddf746b";
        assert_eq!(
            sign(&[("timestamp", "1315060510"), ("folder", "products")], "abcd"),
            expected
        );
        assert_eq!(
            sign(&[("folder", "products"), ("timestamp", "1315060510")], "abcd"),
            expected
        );
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("CLOUDINARY_CLOUD_NAME", Some("demo")),
                ("CLOUDINARY_API_KEY", Some("key")),
                ("CLOUDINARY_API_SECRET", Some("secret")),
                ("CLOUDINARY_API_URL", None),
                ("CLOUDINARY_SECURE", None),
            ],
            || {
                let config = CloudinaryConfig::from_env().unwrap();
                assert_eq!(config.cloud_name, "demo");
                assert!(config.secure);
                assert_eq!(
                    config.upload_url(),
                    "https://api.cloudinary.com/v1_1/demo/image/upload"
                );
                assert!(!format!("{config:?}").contains("secret\""));
            },
        );
    }

    #[test]
    fn test_config_requires_credentials() {
        temp_env::with_vars(
            [
                ("CLOUDINARY_CLOUD_NAME", Some("demo")),
                ("CLOUDINARY_API_KEY", Some("key")),
                ("CLOUDINARY_API_SECRET", None),
            ],
            || {
                let err = CloudinaryConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("CLOUDINARY_API_SECRET"));
            },
        );
    }

    #[test]
    fn test_parse_success_prefers_secure_url() {
        let body = br#"{"public_id":"products/abc","url":"http://res.test/abc.jpg","secure_url":"https://res.test/abc.jpg"}"#;

        let image = parse_upload_response(StatusCode::OK, body, true).unwrap();
        assert_eq!(image.url, "https://res.test/abc.jpg");
        assert_eq!(image.public_id, "products/abc");

        let image = parse_upload_response(StatusCode::OK, body, false).unwrap();
        assert_eq!(image.url, "http://res.test/abc.jpg");
    }

    #[test]
    fn test_parse_missing_url_is_empty_upload() {
        let err = parse_upload_response(StatusCode::OK, br#"{"public_id":"x"}"#, true).unwrap_err();
        assert!(matches!(err, ProductError::EmptyUpload));
    }

    #[test]
    fn test_parse_provider_error_message() {
        let err = parse_upload_response(
            StatusCode::UNAUTHORIZED,
            br#"{"error":{"message":"Invalid Signature"}}"#,
            true,
        )
        .unwrap_err();
        assert!(matches!(err, ProductError::Upload(ref m) if m == "Invalid Signature"));

        let err = parse_upload_response(StatusCode::BAD_GATEWAY, b"<html>", true).unwrap_err();
        assert!(matches!(err, ProductError::Upload(ref m) if m.contains("502")));
    }

    /// Fake provider that checks the signature the way the real API does.
    async fn fake_upload(mut multipart: Multipart) -> (StatusCode, Json<serde_json::Value>) {
        let mut fields = HashMap::new();
        let mut file_len = 0;

        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap().to_string();
            if name == "file" {
                file_len = field.bytes().await.unwrap().len();
            } else {
                fields.insert(name, field.text().await.unwrap());
            }
        }

        let expected = sign(
            &[
                ("folder", fields["folder"].as_str()),
                ("timestamp", fields["timestamp"].as_str()),
            ],
            "secret",
        );
        if fields["signature"] != expected || fields["api_key"] != "key" || file_len == 0 {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": { "message": "Invalid Signature" } })),
            );
        }

        let folder = &fields["folder"];
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "public_id": format!("{folder}/img1"),
                "secure_url": format!("https://res.test/{folder}/img1.jpg"),
            })),
        )
    }

    #[tokio::test]
    async fn test_upload_against_fake_provider() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/demo/image/upload", post(fake_upload));
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let file = UploadedFile::new("images", "shoe.jpg", Some("image/jpeg"), &b"jpeg-bytes"[..]);

        let storage = CloudinaryStorage::new(
            CloudinaryConfig::new("demo", "key", "secret").with_api_url(format!("http://{addr}")),
        );
        let image = storage.upload(&file, "products").await.unwrap();
        assert_eq!(image.url, "https://res.test/products/img1.jpg");
        assert_eq!(storage.name(), "cloudinary");

        let wrong_secret = CloudinaryStorage::new(
            CloudinaryConfig::new("demo", "key", "nope").with_api_url(format!("http://{addr}")),
        );
        let err = wrong_secret.upload(&file, "products").await.unwrap_err();
        assert!(matches!(err, ProductError::Upload(ref m) if m == "Invalid Signature"));
    }
}
