//! HTTP handlers for the seller product catalog

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, FromRequestParts, Multipart,
        Query, State,
    },
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse, UpstreamErrorResponse,
    },
    AppError, UuidPath, ValidatedJson,
};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::intake::{ImageReplaceForm, ProductForm};
use crate::models::{
    FeedResponse, MessageResponse, Product, ProductMessageResponse, ProductPage, ProductResponse,
    ProductSummary, SellerProductsQuery, UpdateProductRequest,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;
use crate::storage::ImageStorage;

/// Header carrying the authenticated seller, set by the auth layer in front
pub const SELLER_ID_HEADER: &str = "x-seller-id";

/// Authenticated seller taken from [`SELLER_ID_HEADER`].
///
/// Missing or malformed values are rejected with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellerId(pub Uuid);

impl<S> FromRequestParts<S> for SellerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(SELLER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("missing {SELLER_ID_HEADER} header")))?;

        value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(SellerId)
            .ok_or_else(|| AppError::Unauthorized(format!("invalid {SELLER_ID_HEADER} header")))
    }
}

/// Create form, documentation only
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
#[allow(dead_code)]
struct ProductFormSchema {
    name: String,
    /// JSON-encoded list of labels, e.g. `["shoes","sport"]`
    categories: String,
    description: Option<String>,
    stock: String,
    price: String,
    discount: String,
    shop_name: String,
    brand: Option<String>,
    region: Option<String>,
    state: Option<String>,
    /// One or more image files, uploaded in this order
    #[schema(value_type = Vec<String>)]
    images: Vec<Vec<u8>>,
}

/// Image replacement form, documentation only
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
#[allow(dead_code)]
struct ImageReplaceSchema {
    /// URL currently stored on the product
    old_image: String,
    product_id: Uuid,
    /// Exactly one image file
    #[schema(value_type = String)]
    new_image: Vec<u8>,
}

/// OpenAPI documentation for the Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        create_product,
        list_products,
        public_feed,
        get_product,
        update_product,
        replace_image,
        delete_product,
    ),
    components(
        schemas(
            Product, ProductSummary, ProductPage, UpdateProductRequest,
            MessageResponse, ProductResponse, ProductMessageResponse, FeedResponse,
            ProductFormSchema, ImageReplaceSchema
        ),
        responses(
            BadRequestResponse,
            BadRequestUuidResponse,
            NotFoundResponse,
            UnauthorizedResponse,
            UpstreamErrorResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Seller product catalog and image management")
    )
)]
pub struct ApiDoc;

type SharedService<R, S> = State<Arc<ProductService<R, S>>>;

/// Create the products router with all HTTP endpoints
pub fn router<R, S>(service: ProductService<R, S>) -> Router
where
    R: ProductRepository + 'static,
    S: ImageStorage + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/feed", get(public_feed))
        .route("/update", post(update_product))
        .route("/image", post(replace_image))
        .route("/{id}", get(get_product).delete(delete_product))
        .with_state(shared_service)
}

fn multipart_or_parse_error(
    multipart: Result<Multipart, MultipartRejection>,
) -> ProductResult<Multipart> {
    multipart.map_err(|e| ProductError::Parse(e.body_text()))
}

/// Create a product and upload its images
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    params(("x-seller-id" = Uuid, Header, description = "Authenticated seller")),
    request_body(content = ProductFormSchema, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = UpstreamErrorResponse)
    )
)]
async fn create_product<R: ProductRepository, S: ImageStorage>(
    State(service): SharedService<R, S>,
    SellerId(seller_id): SellerId,
    multipart: Result<Multipart, MultipartRejection>,
) -> ProductResult<impl IntoResponse> {
    let form = ProductForm::from_multipart(multipart_or_parse_error(multipart)?).await?;
    service.create_product(seller_id, form).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Product Added Successfully")),
    ))
}

/// List the seller's products, optionally searching
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(
        ("x-seller-id" = Uuid, Header, description = "Authenticated seller"),
        SellerProductsQuery
    ),
    responses(
        (status = 200, description = "One page of products", body = ProductPage),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository, S: ImageStorage>(
    State(service): SharedService<R, S>,
    SellerId(seller_id): SellerId,
    query: Result<Query<SellerProductsQuery>, QueryRejection>,
) -> ProductResult<Json<ProductPage>> {
    let Query(query) = query.map_err(|e| ProductError::Parse(e.body_text()))?;
    let page = service.list_seller_products(seller_id, &query).await?;
    Ok(Json(page))
}

/// Public product feed
#[utoipa::path(
    get,
    path = "/feed",
    tag = "Products",
    responses(
        (status = 200, description = "Up to 20 products in reduced form", body = FeedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn public_feed<R: ProductRepository, S: ImageStorage>(
    State(service): SharedService<R, S>,
) -> ProductResult<Json<FeedResponse>> {
    let products = service.public_feed().await?;
    Ok(Json(FeedResponse { products }))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository, S: ImageStorage>(
    State(service): SharedService<R, S>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<ProductResponse>> {
    let product = service.get_product(id).await?;
    Ok(Json(ProductResponse { product }))
}

/// Edit a product's metadata
#[utoipa::path(
    post,
    path = "/update",
    tag = "Products",
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductMessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository, S: ImageStorage>(
    State(service): SharedService<R, S>,
    ValidatedJson(input): ValidatedJson<UpdateProductRequest>,
) -> ProductResult<Json<ProductMessageResponse>> {
    let product = service.update_product(input).await?;
    Ok(Json(ProductMessageResponse {
        product,
        message: "Product Updated Successfully".to_string(),
    }))
}

/// Replace one image of a product
#[utoipa::path(
    post,
    path = "/image",
    tag = "Products",
    request_body(content = ImageReplaceSchema, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image replaced", body = ProductMessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = UpstreamErrorResponse)
    )
)]
async fn replace_image<R: ProductRepository, S: ImageStorage>(
    State(service): SharedService<R, S>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ProductResult<Json<ProductMessageResponse>> {
    let form = ImageReplaceForm::from_multipart(multipart_or_parse_error(multipart)?).await?;
    let product = service.replace_image(form).await?;
    Ok(Json(ProductMessageResponse {
        product,
        message: "Product Image Updated Successfully".to_string(),
    }))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository, S: ImageStorage>(
    State(service): SharedService<R, S>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<MessageResponse>> {
    service.delete_product(id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
