//! Image reconciliation: turning uploaded files into a product's ordered
//! image list.
//!
//! Both paths upload sequentially and never retry. A failed create leaves
//! any already uploaded images orphaned in storage; they are logged and
//! not deleted. Replacement is a plain read-modify-write of the whole
//! `images` array without a version check, so concurrent replacements on
//! one product resolve last-write-wins.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::intake::{parse_int_field, OneOrMany, UploadedFile};
use crate::models::{Product, ProductDraft};
use crate::repository::{ProductPatch, ProductRepository};
use crate::storage::{ImageStorage, PRODUCT_IMAGE_FOLDER};

/// `name` with every whitespace run collapsed to a single `-`.
///
/// ```
/// use domain_products::images::slugify;
///
/// assert_eq!(slugify("Red Running Shoes"), "Red-Running-Shoes");
/// ```
pub fn slugify(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Overwrite the first entry equal to `old` with `new`.
///
/// Returns the replaced index, or `None` when nothing matched (the slice
/// is then left as is).
pub fn replace_first(images: &mut [String], old: &str, new: &str) -> Option<usize> {
    let index = images.iter().position(|url| url == old)?;
    images[index] = new.to_string();
    Some(index)
}

fn log_orphans(uploaded: &[String]) {
    if !uploaded.is_empty() {
        warn!(
            orphaned = ?uploaded,
            count = uploaded.len(),
            "Uploaded images left without a product"
        );
    }
}

pub struct ImageReconciler<R, S> {
    repository: Arc<R>,
    storage: Arc<S>,
}

impl<R, S> Clone for ImageReconciler<R, S> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<R: ProductRepository, S: ImageStorage> ImageReconciler<R, S> {
    pub fn new(repository: Arc<R>, storage: Arc<S>) -> Self {
        Self {
            repository,
            storage,
        }
    }

    /// Upload every file in order, then persist one product carrying the
    /// resulting URLs.
    ///
    /// At least one file is required. Integer fields are checked before any
    /// upload. The first failed upload aborts the operation and nothing is
    /// persisted.
    #[instrument(
        skip(self, draft, files),
        fields(%seller_id, product_name = %draft.name.trim(), files = files.len())
    )]
    pub async fn create_product(
        &self,
        seller_id: Uuid,
        draft: ProductDraft,
        files: OneOrMany<UploadedFile>,
    ) -> ProductResult<Product> {
        let files = files.into_vec();
        if files.is_empty() {
            return Err(ProductError::Validation(
                "at least one image is required".to_string(),
            ));
        }

        let name = draft.name.trim().to_string();
        let slug = slugify(&name);
        let stock = parse_int_field("stock", &draft.stock)?;
        let price = parse_int_field("price", &draft.price)?;
        let discount = parse_int_field("discount", &draft.discount)?;

        let mut images = Vec::with_capacity(files.len());

        for (index, file) in files.iter().enumerate() {
            match self.storage.upload(file, PRODUCT_IMAGE_FOLDER).await {
                Ok(stored) => {
                    debug!(index, url = %stored.url, "Image uploaded");
                    images.push(stored.url);
                }
                Err(err) => {
                    error!(
                        index,
                        file_name = %file.file_name,
                        storage = self.storage.name(),
                        error = %err,
                        "Image upload failed, aborting product creation"
                    );
                    log_orphans(&images);
                    return Err(match err {
                        ProductError::EmptyUpload => {
                            ProductError::Upload("upload result empty".to_string())
                        }
                        other => other,
                    });
                }
            }
        }

        let categories = match serde_json::from_str::<OneOrMany<String>>(&draft.categories) {
            Ok(categories) => categories.into_vec(),
            Err(e) => {
                log_orphans(&images);
                return Err(ProductError::Categories(e.to_string()));
            }
        };

        let now = Utc::now();
        let product = Product {
            id: Uuid::now_v7(),
            seller_id,
            name,
            slug,
            shop_name: draft.shop_name.trim().to_string(),
            description: draft.description.trim().to_string(),
            brand: draft.brand.trim().to_string(),
            categories,
            stock,
            price,
            discount,
            images,
            region: draft.region.as_deref().map(str::trim).unwrap_or_default().to_string(),
            state: draft.state.as_deref().map(str::trim).unwrap_or_default().to_string(),
            created_at: now,
            updated_at: now,
        };

        let uploaded = product.images.clone();
        self.repository.create(product).await.inspect_err(|_| {
            log_orphans(&uploaded);
        })
    }

    /// Upload `file` and put its URL where `old_image` was.
    ///
    /// The upload happens before the product is read; a failed upload
    /// leaves the product untouched and surfaces as
    /// [`ProductError::ReplacementUpload`]. When `old_image` is not in the
    /// list the unchanged list is written back.
    #[instrument(skip(self, old_image, file), fields(%product_id, file_name = %file.file_name))]
    pub async fn replace_image(
        &self,
        product_id: Uuid,
        old_image: &str,
        file: UploadedFile,
    ) -> ProductResult<Product> {
        let stored = self
            .storage
            .upload(&file, PRODUCT_IMAGE_FOLDER)
            .await
            .map_err(|e| {
                error!(storage = self.storage.name(), error = %e, "Replacement upload failed");
                match e {
                    ProductError::Upload(msg) => ProductError::ReplacementUpload(msg),
                    other => other,
                }
            })?;

        let product = self
            .repository
            .get_by_id(product_id)
            .await?
            .ok_or(ProductError::NotFound(product_id))?;

        let mut images = product.images;
        match replace_first(&mut images, old_image, &stored.url) {
            Some(index) => debug!(index, url = %stored.url, "Image replaced"),
            None => debug!(old_image, "Old image not found, rewriting list unchanged"),
        }

        self.repository
            .update(product_id, ProductPatch::images(images))
            .await?;

        self.repository
            .get_by_id(product_id)
            .await?
            .ok_or(ProductError::NotFound(product_id))
    }
}
