//! Products Domain
//!
//! Seller product catalog backed by MongoDB, with product images stored
//! in Cloudinary.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, seller identity
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │   Intake    │     │   Service   │  ← queries, metadata edits
//! │ (multipart) │────▶└──────┬──────┘
//! └─────────────┘            │
//!                     ┌──────▼──────┐     ┌─────────────┐
//!                     │   Images    │────▶│   Storage   │  ← Cloudinary
//!                     │ (reconcile) │     └─────────────┘
//!                     └──────┬──────┘
//!                            │
//!                     ┌──────▼──────┐
//!                     │ Repository  │  ← trait + MongoDB implementation
//!                     └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     handlers,
//!     mongodb::MongoProductRepository,
//!     service::ProductService,
//!     storage::{CloudinaryConfig, CloudinaryStorage},
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("catalog");
//!
//! let repository = MongoProductRepository::new(&db);
//! let storage = CloudinaryStorage::new(CloudinaryConfig::new("demo", "key", "secret"));
//! let service = ProductService::new(repository, storage);
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod images;
pub mod intake;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use error::{ProductError, ProductResult};
pub use handlers::{ApiDoc, SellerId, SELLER_ID_HEADER};
pub use images::ImageReconciler;
pub use intake::{ImageReplaceForm, OneOrMany, ProductForm, UploadedFile};
pub use models::{
    Product, ProductDraft, ProductPage, ProductSummary, SellerProductsQuery, UpdateProductRequest,
};
pub use self::mongodb::MongoProductRepository;
pub use repository::{ProductPatch, ProductRepository};
pub use service::ProductService;
pub use storage::{CloudinaryConfig, CloudinaryStorage, ImageStorage, StoredImage};
