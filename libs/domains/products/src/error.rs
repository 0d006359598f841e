use axum::extract::multipart::MultipartError;
use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProductError {
    /// Malformed form field or embedded JSON (e.g. the categories list)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The multipart body itself could not be read
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Image upload failed: {0}")]
    Upload(String),

    /// Replacement upload failed before the product was read
    #[error("Image replacement upload failed: {0}")]
    ReplacementUpload(String),

    /// Categories could not be decoded after the images were uploaded
    #[error("Invalid categories: {0}")]
    Categories(String),

    /// The storage provider answered without a usable URL
    #[error("Image upload returned no result")]
    EmptyUpload,

    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::Parse(msg) => AppError::BadRequest(msg),
            ProductError::Multipart(e) => AppError::Multipart(e),
            ProductError::Upload(msg) => AppError::Upstream(format!("Image upload failed: {msg}")),
            ProductError::ReplacementUpload(msg) => {
                AppError::NotFound(format!("Image Upload Failed: {msg}"))
            }
            ProductError::Categories(msg) => {
                AppError::InternalServerError(format!("categories: {msg}"))
            }
            ProductError::EmptyUpload => AppError::NotFound("Image Upload Failed".to_string()),
            ProductError::NotFound(id) => AppError::NotFound(format!("Product {} not found", id)),
            ProductError::Database(msg) => AppError::Database(msg),
            ProductError::Validation(msg) => AppError::InvalidInput(msg),
            ProductError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for ProductError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        ProductError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ProductError {
    fn from(err: serde_json::Error) -> Self {
        ProductError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ProductError {
    fn from(err: reqwest::Error) -> Self {
        ProductError::Upload(err.to_string())
    }
}
