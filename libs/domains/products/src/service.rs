//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::images::{slugify, ImageReconciler};
use crate::intake::{ImageReplaceForm, ProductForm};
use crate::models::{
    Product, ProductPage, ProductSummary, SellerProductsQuery, UpdateProductRequest,
    PUBLIC_FEED_LIMIT,
};
use crate::repository::{ProductPatch, ProductRepository};
use crate::storage::ImageStorage;

/// Product service: catalog queries, metadata edits and the image
/// workflows (delegated to [`ImageReconciler`]).
///
/// Cloning is cheap; repository and storage are shared.
pub struct ProductService<R, S> {
    repository: Arc<R>,
    reconciler: ImageReconciler<R, S>,
}

impl<R, S> Clone for ProductService<R, S> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            reconciler: self.reconciler.clone(),
        }
    }
}

impl<R: ProductRepository, S: ImageStorage> ProductService<R, S> {
    pub fn new(repository: R, storage: S) -> Self {
        let repository = Arc::new(repository);
        let reconciler = ImageReconciler::new(Arc::clone(&repository), Arc::new(storage));
        Self {
            repository,
            reconciler,
        }
    }

    /// Create a product from a submitted form, uploading its images
    pub async fn create_product(&self, seller_id: Uuid, form: ProductForm) -> ProductResult<Product> {
        self.reconciler
            .create_product(seller_id, form.draft, form.images)
            .await
    }

    /// Replace one image of an existing product
    pub async fn replace_image(&self, form: ImageReplaceForm) -> ProductResult<Product> {
        self.reconciler
            .replace_image(form.product_id, &form.old_image, form.new_image)
            .await
    }

    /// A page of the seller's products; searches when `searchValue` is set
    #[instrument(skip(self, query), fields(page = query.page(), per_page = query.per_page()))]
    pub async fn list_seller_products(
        &self,
        seller_id: Uuid,
        query: &SellerProductsQuery,
    ) -> ProductResult<ProductPage> {
        let skip = query.skip();
        let limit = i64::try_from(query.per_page()).unwrap_or(i64::MAX);

        let (products, total_product) = match query.search_text() {
            Some(text) => self.repository.search(seller_id, text, skip, limit).await?,
            None => self.repository.list_by_seller(seller_id, skip, limit).await?,
        };

        Ok(ProductPage {
            products,
            total_product,
        })
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Edit a product's metadata.
    ///
    /// The single `category` replaces the whole categories list and the
    /// slug follows the new name.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn update_product(&self, input: UpdateProductRequest) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ProductError::Validation("name must not be blank".into()));
        }

        let patch = ProductPatch {
            slug: Some(slugify(&name)),
            name: Some(name),
            description: Some(input.description.trim().to_string()),
            brand: Some(input.brand.trim().to_string()),
            categories: Some(vec![input.category.trim().to_string()]),
            stock: Some(input.stock.resolve("stock")?),
            price: Some(input.price.resolve("price")?),
            discount: Some(input.discount.resolve("discount")?),
            images: None,
            region: input.region.as_deref().map(|r| r.trim().to_string()),
            state: input.state.as_deref().map(|s| s.trim().to_string()),
        };

        self.repository.update(input.product_id, patch).await
    }

    /// Delete a product; remote images are left in storage
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<()> {
        match self.repository.delete(id).await? {
            Some(_) => Ok(()),
            None => Err(ProductError::NotFound(id)),
        }
    }

    /// Up to [`PUBLIC_FEED_LIMIT`] products in reduced form
    #[instrument(skip(self))]
    pub async fn public_feed(&self) -> ProductResult<Vec<ProductSummary>> {
        self.repository.feed(PUBLIC_FEED_LIMIT).await
    }
}
