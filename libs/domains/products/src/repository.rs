use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Product, ProductSummary};

/// Partial update of a product; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub categories: Option<Vec<String>>,
    pub stock: Option<i64>,
    pub price: Option<i64>,
    pub discount: Option<i64>,
    /// Replaces the whole array
    pub images: Option<Vec<String>>,
    pub region: Option<String>,
    pub state: Option<String>,
}

impl ProductPatch {
    /// Patch that only rewrites the image list
    pub fn images(images: Vec<String>) -> Self {
        Self {
            images: Some(images),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch in memory and bump `updated_at`
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(slug) = &self.slug {
            product.slug = slug.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(brand) = &self.brand {
            product.brand = brand.clone();
        }
        if let Some(categories) = &self.categories {
            product.categories = categories.clone();
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(discount) = self.discount {
            product.discount = discount;
        }
        if let Some(images) = &self.images {
            product.images = images.clone();
        }
        if let Some(region) = &self.region {
            product.region = region.clone();
        }
        if let Some(state) = &self.state {
            product.state = state.clone();
        }
        product.updated_at = Utc::now();
    }
}

/// Catalog store for products
///
/// Thin pass-through to the document store. Paging arguments arrive
/// already computed; implementations add no business rules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persist a new product and return it as stored
    async fn create(&self, product: Product) -> ProductResult<Product>;

    /// Get a product by ID
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// A seller's products, newest first, plus the seller's total count
    async fn list_by_seller(
        &self,
        seller_id: Uuid,
        skip: u64,
        limit: i64,
    ) -> ProductResult<(Vec<Product>, u64)>;

    /// Full-text search within a seller's products, plus the match count
    async fn search(
        &self,
        seller_id: Uuid,
        text: &str,
        skip: u64,
        limit: i64,
    ) -> ProductResult<(Vec<Product>, u64)>;

    /// Apply a patch and return the updated document.
    ///
    /// Fails with `NotFound` when no product has this id.
    async fn update(&self, id: Uuid, patch: ProductPatch) -> ProductResult<Product>;

    /// Delete a product, returning it if it existed
    async fn delete(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Public feed projection, at most `limit` entries
    async fn feed(&self, limit: i64) -> ProductResult<Vec<ProductSummary>>;
}
