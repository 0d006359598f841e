use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::intake::LenientInt;

/// Maximum number of products in the public feed
pub const PUBLIC_FEED_LIMIT: i64 = 20;

/// Page size used when `parPage` is absent
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Product entity - a seller's catalog entry stored in MongoDB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Owning seller; never changes after creation
    pub seller_id: Uuid,
    pub name: String,
    /// `name` with whitespace runs replaced by `-`
    pub slug: String,
    #[serde(default)]
    pub shop_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub stock: i64,
    pub price: i64,
    pub discount: i64,
    /// Storage URLs; position is the identity used by image replacement
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reduced projection served by the public feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            images: product.images.clone(),
        }
    }
}

/// Scalar fields of the create form, as submitted.
///
/// Integers and the categories list stay textual here; the reconciler
/// parses them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    /// JSON-encoded list of category labels
    pub categories: String,
    pub description: String,
    pub stock: String,
    pub price: String,
    pub discount: String,
    pub shop_name: String,
    pub brand: String,
    pub region: Option<String>,
    pub state: Option<String>,
}

/// Seller listing query: `?page=2&parPage=10&searchValue=shoe`
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SellerProductsQuery {
    /// 1-based page number; values below 1 are treated as 1
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size
    #[serde(rename = "parPage", default = "default_per_page")]
    pub per_page: u64,
    /// Full-text search over name, brand, description and categories
    #[serde(default)]
    pub search_value: Option<String>,
}

impl Default for SellerProductsQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
            search_value: None,
        }
    }
}

impl SellerProductsQuery {
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.max(1)
    }

    /// Documents to skip: `per_page * (page - 1)`
    pub fn skip(&self) -> u64 {
        self.per_page().saturating_mul(self.page() - 1)
    }

    /// Trimmed search text, `None` when blank
    pub fn search_text(&self) -> Option<&str> {
        self.search_value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    DEFAULT_PER_PAGE
}

/// One page of a seller's products plus the total match count
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total_product: u64,
}

/// Body of `POST /update`
///
/// `category` is a single label and replaces the whole categories list.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = i64)]
    pub stock: LenientInt,
    #[schema(value_type = i64)]
    pub price: LenientInt,
    #[schema(value_type = i64)]
    pub discount: LenientInt,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// `{ message }`
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{ product }`
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub product: Product,
}

/// `{ product, message }`
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductMessageResponse {
    pub product: Product,
    pub message: String,
}

/// `{ products }` for the public feed
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedResponse {
    pub products: Vec<ProductSummary>,
}
