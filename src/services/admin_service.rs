use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    courier::Parcel,
    dto::orders::OrderList,
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    lifecycle::OrderAction,
    middleware::auth::{AuthUser, ensure_admin},
    models::{DeliveryType, Order, OrderStatus, Role},
    response::{ApiResponse, Meta},
    routes::params::AdminOrderQuery,
    services::order_service::{hydrate, restock},
    state::AppState,
};

/// Orders an admin may see and act on. Super admins see everything; other
/// admins see guest orders and orders of customers sharing their era.
pub(crate) async fn visible_orders(state: &AppState, admin: &AuthUser) -> AppResult<Condition> {
    if admin.role == Role::SuperAdmin {
        return Ok(Condition::all());
    }

    let era = Users::find_by_id(admin.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?
        .era;

    let mut visible = Condition::any().add(OrderCol::IsGuestOrder.eq(true));
    if let Some(era) = era {
        visible = visible.add(
            OrderCol::UserId.in_subquery(
                Query::select()
                    .column(UserCol::Id)
                    .from(Users)
                    .and_where(UserCol::Era.eq(era))
                    .to_owned(),
            ),
        );
    }
    Ok(visible)
}

pub async fn list_orders(
    state: &AppState,
    admin: &AuthUser,
    query: AdminOrderQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(admin)?;

    let mut condition = Condition::all().add(visible_orders(state, admin).await?);
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let models = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let items = hydrate(&state.orm, models).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn apply_action(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    action: OrderAction,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(admin)?;
    let visible = visible_orders(state, admin).await?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .filter(visible)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = OrderStatus::from_stored(&existing.status)?;
    let delivery = DeliveryType::from_stored(&existing.delivery_type)?;
    let next = current.apply(action, delivery)?;

    // A pickup is handed over in person by the admin who prepared it.
    if action == OrderAction::Delivered
        && delivery == DeliveryType::Pickup
        && admin.role != Role::SuperAdmin
        && existing.assigned_admin != Some(admin.user_id)
    {
        return Err(AppError::Forbidden);
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(next.as_str().to_string());
    active.assigned_admin = Set(Some(admin.user_id));
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    if next == OrderStatus::Declined {
        restock(&txn, id).await?;
    }
    txn.commit().await?;

    tracing::info!(
        order_id = %id,
        from = %current,
        to = %next,
        admin = %admin.user_id,
        "order status changed"
    );

    audit::record(
        state,
        Some(admin.user_id),
        &format!("order_{}", action.as_str()),
        "orders",
        serde_json::json!({ "order_id": id, "from": current.as_str(), "to": next.as_str() }),
    )
    .await;

    let mut order = hydrate(&state.orm, vec![updated])
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;

    let mut message = format!("Order {}", next.as_str().replace('_', " "));
    if next == OrderStatus::Ready && delivery == DeliveryType::Delivery {
        if let Some(courier) = state.courier.as_ref() {
            match courier.create_parcel(&Parcel::for_order(&order)).await {
                Ok(tracking_id) => match mark_dispatched(state, id, &tracking_id).await {
                    Ok(Some(status)) => {
                        order.status = status;
                        order.tracking_id = Some(tracking_id);
                        message = "Order handed to the courier".to_string();
                    }
                    Ok(None) => {
                        tracing::warn!(
                            order_id = %id,
                            tracking_id = %tracking_id,
                            "order left ready during courier hand-off, tracking id not stored"
                        );
                        if let Ok(Some(latest)) = reload(state, id).await {
                            order = latest;
                        }
                        message = format!(
                            "Courier accepted parcel {tracking_id}, but the order changed meanwhile"
                        );
                    }
                    Err(err) => {
                        tracing::error!(
                            order_id = %id,
                            tracking_id = %tracking_id,
                            error = %err,
                            "could not record courier tracking id"
                        );
                        message = format!(
                            "Courier accepted parcel {tracking_id}, but it could not be recorded"
                        );
                    }
                },
                Err(err) => {
                    tracing::warn!(order_id = %id, error = %err, "courier hand-off failed");
                    message = "Order ready, but the courier did not accept the parcel".to_string();
                }
            }
        }
    }

    Ok(ApiResponse::success(message, order, Some(Meta::empty())))
}

async fn reload(state: &AppState, id: Uuid) -> AppResult<Option<Order>> {
    let models = Orders::find_by_id(id).all(&state.orm).await?;
    Ok(hydrate(&state.orm, models).await?.pop())
}

/// Moves a still-ready order out for delivery. Returns `None` when the
/// order is no longer `ready`, leaving the row untouched.
async fn mark_dispatched(
    state: &AppState,
    id: Uuid,
    tracking_id: &str,
) -> AppResult<Option<OrderStatus>> {
    let Some(next) = OrderStatus::Ready.dispatched() else {
        return Ok(None);
    };

    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(next.as_str()))
        .col_expr(OrderCol::TrackingId, Expr::value(tracking_id))
        .col_expr(OrderCol::UpdatedAt, Expr::current_timestamp().into())
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.eq(OrderStatus::Ready.as_str()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Ok(None);
    }

    tracing::info!(order_id = %id, tracking_id = %tracking_id, "order out for delivery");
    Ok(Some(next))
}

pub async fn delete_order(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(admin)?;
    let visible = visible_orders(state, admin).await?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .filter(visible)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    // Stock taken by an order nobody has handled yet goes back on sale.
    if existing.status == OrderStatus::Pending.as_str() {
        restock(&txn, id).await?;
    }
    Orders::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    audit::record(
        state,
        Some(admin.user_id),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}
