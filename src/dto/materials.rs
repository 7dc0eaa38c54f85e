use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Material;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateMaterialRequest {
    pub title: String,
    pub description: Option<String>,
    pub module: Option<String>,
    pub study_year: Option<String>,
    #[serde(default)]
    pub price_dzd: i64,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateMaterialRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub module: Option<String>,
    pub study_year: Option<String>,
    pub price_dzd: Option<i64>,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct MaterialList {
    #[schema(value_type = Vec<Material>)]
    pub items: Vec<Material>,
}
