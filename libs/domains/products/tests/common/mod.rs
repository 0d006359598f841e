//! Shared fakes for the products integration tests:
//! an in-memory catalog store, a scripted image store and a multipart
//! request builder.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use chrono::{DateTime, Duration, Utc};
use domain_products::{
    ImageStorage, Product, ProductError, ProductPatch, ProductRepository, ProductResult,
    ProductSummary, StoredImage, UploadedFile, SELLER_ID_HEADER,
};
use http_body_util::BodyExt;
use tokio::sync::Barrier;
use uuid::Uuid;

/// In-memory [`ProductRepository`]; clones share the same store.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    products: Arc<Mutex<Vec<Product>>>,
    update_gate: Option<Arc<Barrier>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `update` waits until `parties` updates are in flight, so
    /// concurrent read-modify-write cycles all read before anyone writes.
    pub fn with_update_barrier(parties: usize) -> Self {
        Self {
            products: Arc::default(),
            update_gate: Some(Arc::new(Barrier::new(parties))),
        }
    }

    pub fn insert(&self, product: Product) {
        self.products.lock().unwrap().push(product);
    }

    pub fn all(&self) -> Vec<Product> {
        self.products.lock().unwrap().clone()
    }

    pub fn find(&self, id: Uuid) -> Option<Product> {
        self.all().into_iter().find(|p| p.id == id)
    }

    fn page(mut matching: Vec<Product>, skip: u64, limit: i64) -> (Vec<Product>, u64) {
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .collect();
        (items, total)
    }
}

#[async_trait]
impl ProductRepository for InMemoryRepository {
    async fn create(&self, product: Product) -> ProductResult<Product> {
        self.insert(product.clone());
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        Ok(self.find(id))
    }

    async fn list_by_seller(
        &self,
        seller_id: Uuid,
        skip: u64,
        limit: i64,
    ) -> ProductResult<(Vec<Product>, u64)> {
        let matching = self
            .all()
            .into_iter()
            .filter(|p| p.seller_id == seller_id)
            .collect();
        Ok(Self::page(matching, skip, limit))
    }

    async fn search(
        &self,
        seller_id: Uuid,
        text: &str,
        skip: u64,
        limit: i64,
    ) -> ProductResult<(Vec<Product>, u64)> {
        let needle = text.to_lowercase();
        let matching = self
            .all()
            .into_iter()
            .filter(|p| p.seller_id == seller_id)
            .filter(|p| {
                [&p.name, &p.brand, &p.description]
                    .into_iter()
                    .chain(p.categories.iter())
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect();
        Ok(Self::page(matching, skip, limit))
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> ProductResult<Product> {
        if let Some(gate) = &self.update_gate {
            gate.wait().await;
        }

        let mut products = self.products.lock().unwrap();
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ProductError::NotFound(id))?;
        patch.apply_to(product);
        Ok(product.clone())
    }

    async fn delete(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let mut products = self.products.lock().unwrap();
        let position = products.iter().position(|p| p.id == id);
        Ok(position.map(|index| products.remove(index)))
    }

    async fn feed(&self, limit: i64) -> ProductResult<Vec<ProductSummary>> {
        Ok(self
            .all()
            .iter()
            .take(limit.max(0) as usize)
            .map(ProductSummary::from)
            .collect())
    }
}

#[derive(Default)]
struct Script {
    uploaded: Vec<String>,
    failing: HashSet<String>,
    empty: HashSet<String>,
}

/// [`ImageStorage`] fake keyed on file names; clones share the script.
///
/// Successful uploads return `https://cdn.test/products/{file_name}`.
#[derive(Clone, Default)]
pub struct ScriptedStorage {
    script: Arc<Mutex<Script>>,
}

impl ScriptedStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads of `file_name` fail with an upload error
    pub fn failing_on(self, file_name: &str) -> Self {
        self.script.lock().unwrap().failing.insert(file_name.to_string());
        self
    }

    /// Uploads of `file_name` succeed without returning a URL
    pub fn empty_on(self, file_name: &str) -> Self {
        self.script.lock().unwrap().empty.insert(file_name.to_string());
        self
    }

    /// URLs handed out so far, in upload order
    pub fn uploaded(&self) -> Vec<String> {
        self.script.lock().unwrap().uploaded.clone()
    }

    pub fn url_for(file_name: &str) -> String {
        format!("https://cdn.test/products/{file_name}")
    }
}

#[async_trait]
impl ImageStorage for ScriptedStorage {
    async fn upload(&self, file: &UploadedFile, folder: &str) -> ProductResult<StoredImage> {
        let mut script = self.script.lock().unwrap();
        if script.failing.contains(&file.file_name) {
            return Err(ProductError::Upload(format!("{} rejected", file.file_name)));
        }
        if script.empty.contains(&file.file_name) {
            return Err(ProductError::EmptyUpload);
        }

        let url = Self::url_for(&file.file_name);
        script.uploaded.push(url.clone());
        Ok(StoredImage {
            url,
            public_id: format!("{folder}/{}", file.file_name),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn image(file_name: &str) -> UploadedFile {
    UploadedFile::new(
        "images",
        file_name,
        Some("image/jpeg"),
        file_name.as_bytes().to_vec(),
    )
}

/// Product owned by `seller_id`, created `age_minutes` ago
pub fn product(seller_id: Uuid, name: &str, age_minutes: i64, images: &[&str]) -> Product {
    let created_at: DateTime<Utc> = Utc::now() - Duration::minutes(age_minutes);
    Product {
        id: Uuid::now_v7(),
        seller_id,
        name: name.to_string(),
        slug: domain_products::images::slugify(name),
        shop_name: "Test Shop".to_string(),
        description: String::new(),
        brand: "Acme".to_string(),
        categories: vec!["general".to_string()],
        stock: 5,
        price: 100,
        discount: 0,
        images: images.iter().map(|s| s.to_string()).collect(),
        region: String::new(),
        state: String::new(),
        created_at,
        updated_at: created_at,
    }
}

const BOUNDARY: &str = "products-test-boundary";

/// Builds `multipart/form-data` request bodies
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn request(mut self, uri: &str, seller_id: Option<Uuid>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder().method("POST").uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(seller_id) = seller_id {
            builder = builder.header(SELLER_ID_HEADER, seller_id.to_string());
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}

/// Helper to parse a JSON response body
pub async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
