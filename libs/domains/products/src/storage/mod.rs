//! Object storage gateway for product images.
//!
//! The domain only needs "put these bytes somewhere public and give me a
//! URL"; [`ImageStorage`] is that seam and [`cloudinary`] the production
//! implementation.

pub mod cloudinary;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProductResult;
use crate::intake::UploadedFile;

pub use cloudinary::{CloudinaryConfig, CloudinaryStorage};

/// Logical folder every product image is uploaded under
pub const PRODUCT_IMAGE_FOLDER: &str = "products";

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    /// Absolute public URL; the only value persisted on a product
    pub url: String,
    pub public_id: String,
}

/// Uploads image payloads to a remote store.
///
/// Implementations must not retry or time out on their own; a call that
/// hangs keeps the request waiting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Upload one file under `folder`.
    ///
    /// Returns [`ProductError::EmptyUpload`](crate::ProductError::EmptyUpload)
    /// when the provider accepts the file but reports no URL.
    async fn upload(&self, file: &UploadedFile, folder: &str) -> ProductResult<StoredImage>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}
