//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Bson, Document},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductSummary};
use crate::repository::{ProductPatch, ProductRepository};

/// Default collection name
pub const PRODUCTS_COLLECTION: &str = "products";

/// Stored form of a [`Product`].
///
/// Timestamps are BSON dates rather than chrono's RFC 3339 strings, whose
/// varying fraction length does not sort chronologically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    seller_id: Uuid,
    name: String,
    slug: String,
    #[serde(default)]
    shop_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    categories: Vec<String>,
    stock: i64,
    price: i64,
    discount: i64,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    region: String,
    #[serde(default)]
    state: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDocument {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            seller_id: product.seller_id,
            name: product.name,
            slug: product.slug,
            shop_name: product.shop_name,
            description: product.description,
            brand: product.brand,
            categories: product.categories,
            stock: product.stock,
            price: product.price,
            discount: product.discount,
            images: product.images,
            region: product.region,
            state: product.state,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl From<ProductDocument> for Product {
    fn from(document: ProductDocument) -> Self {
        Self {
            id: document.id,
            seller_id: document.seller_id,
            name: document.name,
            slug: document.slug,
            shop_name: document.shop_name,
            description: document.description,
            brand: document.brand,
            categories: document.categories,
            stock: document.stock,
            price: document.price,
            discount: document.discount,
            images: document.images,
            region: document.region,
            state: document.state,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

/// MongoDB implementation of the ProductRepository
#[derive(Clone)]
pub struct MongoProductRepository {
    collection: Collection<ProductDocument>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, PRODUCTS_COLLECTION)
    }

    /// Create a repository over a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<ProductDocument>(collection_name);
        Self { collection }
    }

    /// Create the text index used by seller search and the listing index
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! {
                    "name": "text",
                    "brand": "text",
                    "description": "text",
                    "categories": "text",
                })
                .options(
                    IndexOptions::builder()
                        .name("idx_text_search".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "sellerId": 1, "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_seller_created".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) }
    }

    fn seller_filter(seller_id: Uuid) -> Document {
        doc! { "sellerId": to_bson(&seller_id).unwrap_or(Bson::Null) }
    }

    fn newest_first(skip: u64, limit: i64) -> FindOptions {
        FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .skip(skip)
            .limit(limit)
            .build()
    }

    /// Build the `$set` document for a patch; `updatedAt` is always set
    fn set_document(patch: &ProductPatch) -> ProductResult<Document> {
        let mut set = doc! {};

        if let Some(name) = &patch.name {
            set.insert("name", name);
        }
        if let Some(slug) = &patch.slug {
            set.insert("slug", slug);
        }
        if let Some(description) = &patch.description {
            set.insert("description", description);
        }
        if let Some(brand) = &patch.brand {
            set.insert("brand", brand);
        }
        if let Some(categories) = &patch.categories {
            set.insert("categories", categories.clone());
        }
        if let Some(stock) = patch.stock {
            set.insert("stock", stock);
        }
        if let Some(price) = patch.price {
            set.insert("price", price);
        }
        if let Some(discount) = patch.discount {
            set.insert("discount", discount);
        }
        if let Some(images) = &patch.images {
            set.insert("images", images.clone());
        }
        if let Some(region) = &patch.region {
            set.insert("region", region);
        }
        if let Some(state) = &patch.state {
            set.insert("state", state);
        }

        set.insert("updatedAt", bson::DateTime::from_chrono(Utc::now()));
        Ok(set)
    }

    async fn find_page(
        &self,
        filter: Document,
        skip: u64,
        limit: i64,
    ) -> ProductResult<(Vec<Product>, u64)> {
        let cursor = self
            .collection
            .find(filter.clone())
            .with_options(Self::newest_first(skip, limit))
            .await?;
        let documents: Vec<ProductDocument> = cursor.try_collect().await?;
        let products = documents.into_iter().map(Product::from).collect();
        let total = self.collection.count_documents(filter).await?;

        Ok((products, total))
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id, seller_id = %product.seller_id))]
    async fn create(&self, product: Product) -> ProductResult<Product> {
        self.collection
            .insert_one(ProductDocument::from(product.clone()))
            .await?;

        tracing::info!("Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let document = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(document.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn list_by_seller(
        &self,
        seller_id: Uuid,
        skip: u64,
        limit: i64,
    ) -> ProductResult<(Vec<Product>, u64)> {
        self.find_page(Self::seller_filter(seller_id), skip, limit)
            .await
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        seller_id: Uuid,
        text: &str,
        skip: u64,
        limit: i64,
    ) -> ProductResult<(Vec<Product>, u64)> {
        let mut filter = Self::seller_filter(seller_id);
        filter.insert("$text", doc! { "$search": text });

        self.find_page(filter, skip, limit).await
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: Uuid, patch: ProductPatch) -> ProductResult<Product> {
        let update = doc! { "$set": Self::set_document(&patch)? };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let document = self
            .collection
            .find_one_and_update(Self::id_filter(id), update)
            .with_options(options)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        tracing::info!(product_id = %id, "Product updated successfully");
        Ok(document.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let deleted = self
            .collection
            .find_one_and_delete(Self::id_filter(id))
            .await?;

        if deleted.is_some() {
            tracing::info!(product_id = %id, "Product deleted successfully");
        }
        Ok(deleted.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn feed(&self, limit: i64) -> ProductResult<Vec<ProductSummary>> {
        let options = FindOptions::builder()
            .projection(doc! { "name": 1, "price": 1, "stock": 1, "images": 1 })
            .limit(limit)
            .build();

        let cursor = self
            .collection
            .clone_with_type::<ProductSummary>()
            .find(doc! {})
            .with_options(options)
            .await?;
        let products: Vec<ProductSummary> = cursor.try_collect().await?;

        Ok(products)
    }
}
