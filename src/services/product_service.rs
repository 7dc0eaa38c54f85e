use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest, UploadedImages},
    entity::products::{ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, json_list, string_list},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

/// A file received by the upload endpoint.
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// `ILIKE` pattern matching `needle` literally anywhere in the column.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (skip, limit) = query.window();
    let mut condition = Condition::all();

    if let Some(title) = query.title.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Title).ilike(contains_pattern(title)));
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Category.eq(category.clone()));
    }

    if let Some(brand) = query.brand.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Brand).ilike(contains_pattern(brand)));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::PriceDzd.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::PriceDzd.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or_default() {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::PriceDzd,
        ProductSortBy::Title => Column::Title,
        ProductSortBy::Stock => Column::StockQuantity,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or_default() {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };
    // Tie-break on id so paging is deterministic.
    finder = finder.order_by_asc(Column::Id);

    let total = finder.clone().count(&state.orm).await?;

    let items = finder
        .limit(limit)
        .offset(skip)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::from_window(skip, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Product::from);
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn validate_numbers(price_dzd: Option<i64>, stock: Option<i32>) -> AppResult<()> {
    if price_dzd.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("price_dzd cannot be negative".into()));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock_quantity cannot be negative".into()));
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    if payload.category.trim().is_empty() {
        return Err(AppError::BadRequest("category is required".into()));
    }
    validate_numbers(Some(payload.price_dzd), Some(payload.stock_quantity))?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        description: Set(payload.description),
        image_urls: Set(json_list(&clean_list(payload.image_urls))),
        category: Set(payload.category.trim().to_string()),
        price_dzd: Set(payload.price_dzd),
        stock_quantity: Set(payload.stock_quantity),
        brand: Set(payload.brand),
        sizes: Set(json_list(&clean_list(payload.sizes))),
        colors: Set(json_list(&clean_list(payload.colors))),
        weight: Set(payload.weight),
        created_at: Set(Utc::now().into()),
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        state,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_numbers(payload.price_dzd, payload.stock_quantity)?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let new_images = clean_list(payload.image_urls);
    let mut images = string_list(existing.image_urls.clone());

    let mut active: ActiveModel = existing.into();
    if !new_images.is_empty() {
        images.extend(new_images);
        active.image_urls = Set(json_list(&images));
    }
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(price) = payload.price_dzd {
        active.price_dzd = Set(price);
    }
    if let Some(stock) = payload.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    if let Some(brand) = payload.brand {
        active.brand = Set(Some(brand));
    }
    if let Some(sizes) = payload.sizes {
        active.sizes = Set(json_list(&clean_list(sizes)));
    }
    if let Some(colors) = payload.colors {
        active.colors = Set(json_list(&clean_list(colors)));
    }
    if let Some(weight) = payload.weight {
        active.weight = Set(Some(weight));
    }

    let product = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product deleted successfully",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

pub async fn upload_images(
    state: &AppState,
    user: &AuthUser,
    files: Vec<ImageUpload>,
) -> AppResult<ApiResponse<UploadedImages>> {
    ensure_admin(user)?;
    if files.is_empty() {
        return Err(AppError::BadRequest("no images in upload".into()));
    }

    let mut image_ids = Vec::with_capacity(files.len());
    for file in &files {
        let id = state
            .images
            .save(
                file.file_name.as_deref(),
                file.content_type.as_deref(),
                &file.bytes,
            )
            .await?;
        image_ids.push(id);
    }

    Ok(ApiResponse::success(
        "Images uploaded",
        UploadedImages { image_ids },
        Some(Meta::empty()),
    ))
}
