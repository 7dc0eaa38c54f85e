use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub price_dzd: i64,
    #[serde(default)]
    pub stock_quantity: i32,
    pub brand: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub weight: Option<f64>,
    /// Ids returned by the image upload endpoint, or absolute URLs.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Absent fields are left untouched. `image_urls` are appended to the
/// product's existing images.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_dzd: Option<i64>,
    pub stock_quantity: Option<i32>,
    pub brand: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadedImages {
    pub image_ids: Vec<String>,
}
