use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::materials::{CreateMaterialRequest, MaterialList, UpdateMaterialRequest},
    entity::materials::{ActiveModel, Column, Entity as Materials},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Material,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_materials(state: &AppState) -> AppResult<ApiResponse<MaterialList>> {
    let items: Vec<Material> = Materials::find()
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Material::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Materials",
        MaterialList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_material(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Material>> {
    let material = Materials::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Material", Material::from(material), None))
}

pub async fn create_material(
    state: &AppState,
    user: &AuthUser,
    payload: CreateMaterialRequest,
) -> AppResult<ApiResponse<Material>> {
    ensure_admin(user)?;
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    if payload.price_dzd < 0 {
        return Err(AppError::BadRequest("price_dzd cannot be negative".into()));
    }

    let material = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        description: Set(payload.description),
        module: Set(payload.module),
        study_year: Set(payload.study_year),
        price_dzd: Set(payload.price_dzd),
        image_url: Set(payload.image_url),
        file_url: Set(payload.file_url),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        Some(user.user_id),
        "material_create",
        "materials",
        serde_json::json!({ "material_id": material.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Material created",
        Material::from(material),
        Some(Meta::empty()),
    ))
}

pub async fn update_material(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMaterialRequest,
) -> AppResult<ApiResponse<Material>> {
    ensure_admin(user)?;
    if payload.price_dzd.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("price_dzd cannot be negative".into()));
    }

    let existing = Materials::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(module) = payload.module {
        active.module = Set(Some(module));
    }
    if let Some(study_year) = payload.study_year {
        active.study_year = Set(Some(study_year));
    }
    if let Some(price) = payload.price_dzd {
        active.price_dzd = Set(price);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(file_url) = payload.file_url {
        active.file_url = Set(Some(file_url));
    }

    let material = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(user.user_id),
        "material_update",
        "materials",
        serde_json::json!({ "material_id": material.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Material::from(material),
        Some(Meta::empty()),
    ))
}

pub async fn delete_material(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Materials::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "material_delete",
        "materials",
        serde_json::json!({ "material_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}
