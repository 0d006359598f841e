//! Request intake: turns multipart forms and loosely typed JSON into
//! domain inputs.

use axum::extract::multipart::{Field, Multipart};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::ProductDraft;

/// A value that may arrive either alone or as a list.
///
/// [`into_vec`](OneOrMany::into_vec) always yields an ordered sequence, so
/// callers never branch on the submitted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(mut items: Vec<T>) -> Self {
        if items.len() == 1 {
            if let Some(item) = items.pop() {
                return OneOrMany::One(item);
            }
        }
        OneOrMany::Many(items)
    }
}

/// A file part held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            content_type: content_type.map(str::to_string),
            bytes: bytes.into(),
        }
    }

    async fn read(field: Field<'_>) -> ProductResult<Self> {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        Ok(Self {
            field_name,
            file_name,
            content_type,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Integer accepted as a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LenientInt {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LenientInt {
    pub fn resolve(&self, field: &str) -> ProductResult<i64> {
        match self {
            LenientInt::Int(n) => Ok(*n),
            LenientInt::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            LenientInt::Float(_) => Err(not_an_integer(field)),
            LenientInt::Text(raw) => parse_int_field(field, raw),
        }
    }
}

impl From<i64> for LenientInt {
    fn from(n: i64) -> Self {
        LenientInt::Int(n)
    }
}

/// Parse an integer form field the way browsers' `parseInt` does.
///
/// Leading whitespace and an optional sign are accepted, then the leading
/// run of digits is used and anything after it is ignored.
///
/// ```
/// use domain_products::intake::parse_int_field;
///
/// assert_eq!(parse_int_field("price", " 42px").unwrap(), 42);
/// assert!(parse_int_field("price", "abc").is_err());
/// ```
pub fn parse_int_field(field: &str, raw: &str) -> ProductResult<i64> {
    let trimmed = raw.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..end];

    if digits.is_empty() {
        return Err(not_an_integer(field));
    }

    let value: i64 = digits
        .parse()
        .map_err(|_| ProductError::Validation(format!("{field} is out of range")))?;

    Ok(if negative { -value } else { value })
}

fn not_an_integer(field: &str) -> ProductError {
    ProductError::Validation(format!("{field} must be an integer"))
}

/// Create form: scalar fields plus 1..N files under `images`
#[derive(Debug)]
pub struct ProductForm {
    pub draft: ProductDraft,
    pub images: OneOrMany<UploadedFile>,
}

impl ProductForm {
    pub async fn from_multipart(mut multipart: Multipart) -> ProductResult<Self> {
        let mut draft = ProductDraft::default();
        let mut name = None;
        let mut images = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let Some(field_name) = field.name().map(str::to_string) else {
                continue;
            };

            if field.file_name().is_some() {
                if matches!(field_name.as_str(), "images" | "images[]") {
                    images.push(UploadedFile::read(field).await?);
                } else {
                    tracing::debug!(field = %field_name, "Ignoring unexpected file part");
                }
                continue;
            }

            let value = field.text().await?;
            match field_name.as_str() {
                "name" => name = Some(value),
                "categories" => draft.categories = value,
                "description" => draft.description = value,
                "stock" => draft.stock = value,
                "price" => draft.price = value,
                "discount" => draft.discount = value,
                "shopName" => draft.shop_name = value,
                "brand" => draft.brand = value,
                "region" => draft.region = Some(value),
                "state" => draft.state = Some(value),
                other => tracing::debug!(field = %other, "Ignoring unknown form field"),
            }
        }

        draft.name = name.ok_or_else(|| ProductError::Validation("name is required".into()))?;

        if images.is_empty() {
            return Err(ProductError::Validation(
                "at least one image is required".into(),
            ));
        }

        Ok(Self {
            draft,
            images: images.into(),
        })
    }
}

/// Image replacement form: `oldImage`, `productId` and one `newImage` file
#[derive(Debug)]
pub struct ImageReplaceForm {
    pub old_image: String,
    pub product_id: Uuid,
    pub new_image: UploadedFile,
}

impl ImageReplaceForm {
    pub async fn from_multipart(mut multipart: Multipart) -> ProductResult<Self> {
        let mut old_image = None;
        let mut product_id = None;
        let mut new_image = None;

        while let Some(field) = multipart.next_field().await? {
            let Some(field_name) = field.name().map(str::to_string) else {
                continue;
            };

            match field_name.as_str() {
                "newImage" if field.file_name().is_some() => {
                    if new_image.is_some() {
                        return Err(ProductError::Validation(
                            "exactly one newImage file is allowed".into(),
                        ));
                    }
                    new_image = Some(UploadedFile::read(field).await?);
                }
                "oldImage" => old_image = Some(field.text().await?),
                "productId" => {
                    let raw = field.text().await?;
                    let id = Uuid::parse_str(raw.trim()).map_err(|_| {
                        ProductError::Validation(format!("productId '{raw}' is not a valid id"))
                    })?;
                    product_id = Some(id);
                }
                other => tracing::debug!(field = %other, "Ignoring unknown form field"),
            }
        }

        Ok(Self {
            old_image: old_image
                .ok_or_else(|| ProductError::Validation("oldImage is required".into()))?,
            product_id: product_id
                .ok_or_else(|| ProductError::Validation("productId is required".into()))?,
            new_image: new_image
                .ok_or_else(|| ProductError::Validation("newImage file is required".into()))?,
        })
    }
}
