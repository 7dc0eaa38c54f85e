use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, DeliveryStatus, GuestOrderRequest, OrderList},
    error::AppResult,
    lifecycle::OrderAction,
    middleware::auth::AuthUser,
    models::{DeliveryType, Order},
    response::ApiResponse,
    routes::params::AdminOrderQuery,
    services::{admin_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/guest", post(create_guest_order))
        .route("/my", get(my_orders))
        .route("/delivery-types", get(delivery_types))
        .route("/{id}/delivery-status", get(delivery_status))
        .route("/admin", get(admin_orders))
        .route("/admin/{id}", delete(delete_order))
        .route("/admin/{id}/accept", patch(accept_order))
        .route("/admin/{id}/decline", patch(decline_order))
        .route("/admin/{id}/ready", patch(ready_order))
        .route("/admin/{id}/delivered", patch(deliver_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order placed", body = ApiResponse<Order>),
        (status = 400, description = "Unknown product or insufficient stock"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/guest",
    request_body = GuestOrderRequest,
    responses(
        (status = 200, description = "Guest order placed", body = ApiResponse<Order>),
        (status = 400, description = "Invalid contact details, unknown product or insufficient stock")
    ),
    tag = "Orders"
)]
pub async fn create_guest_order(
    State(state): State<AppState>,
    Json(payload): Json<GuestOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::create_guest_order(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/my",
    responses(
        (status = 200, description = "Orders of the signed-in user", body = ApiResponse<OrderList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_my_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/delivery-types",
    responses(
        (status = 200, description = "Supported delivery types", body = ApiResponse<Vec<DeliveryType>>)
    ),
    tag = "Orders"
)]
pub async fn delivery_types() -> Json<ApiResponse<Vec<DeliveryType>>> {
    Json(order_service::delivery_types())
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/delivery-status",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Courier tracking record", body = ApiResponse<DeliveryStatus>),
        (status = 403, description = "Order belongs to someone else"),
        (status = 404, description = "Order not found or not handed to the courier")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn delivery_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeliveryStatus>>> {
    let resp = order_service::delivery_status(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/admin",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
    ),
    responses(
        (status = 200, description = "Orders visible to this admin", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AdminOrderQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

async fn act(
    state: AppState,
    user: AuthUser,
    id: Uuid,
    action: OrderAction,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::apply_action(&state, &user, id, action).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/admin/{id}/accept",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order accepted", body = ApiResponse<Order>),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn accept_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    act(state, user, id, OrderAction::Accept).await
}

#[utoipa::path(
    patch,
    path = "/api/orders/admin/{id}/decline",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order declined, stock restored", body = ApiResponse<Order>),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn decline_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    act(state, user, id, OrderAction::Decline).await
}

#[utoipa::path(
    patch,
    path = "/api/orders/admin/{id}/ready",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order ready, delivery orders are handed to the courier", body = ApiResponse<Order>),
        (status = 400, description = "Order is not accepted"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn ready_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    act(state, user, id, OrderAction::Ready).await
}

#[utoipa::path(
    patch,
    path = "/api/orders/admin/{id}/delivered",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order delivered", body = ApiResponse<Order>),
        (status = 400, description = "Order is not ready or out for delivery"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn deliver_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    act(state, user, id, OrderAction::Delivered).await
}

#[utoipa::path(
    delete,
    path = "/api/orders/admin/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admin_service::delete_order(&state, &user, id).await?;
    Ok(Json(resp))
}
