use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        CreateOrderRequest, DeliveryStatus, GuestOrderRequest, OrderItemRequest, OrderList,
    },
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{DeliveryType, Order, OrderStatus},
    response::{ApiResponse, Meta},
    services::admin_service,
    state::AppState,
    validation, wilaya,
};

/// Who placed the order and where it goes.
struct NewOrder {
    user_id: Option<Uuid>,
    guest_name: Option<String>,
    guest_email: Option<String>,
    guest_phone: Option<String>,
    delivery_type: DeliveryType,
    delivery_address: Option<String>,
    delivery_phone: Option<String>,
    wilaya: Option<String>,
}

/// Sums quantities of repeated products, keeping first-seen order.
fn merge_items(items: &[OrderItemRequest]) -> AppResult<Vec<(Uuid, i32)>> {
    if items.is_empty() {
        return Err(AppError::BadRequest("Order must contain at least one item".into()));
    }
    let mut merged: Vec<(Uuid, i32)> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(format!(
                "Invalid quantity for product {}",
                item.product_id
            )));
        }
        match merged.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, qty)) => {
                *qty = qty.checked_add(item.quantity).ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Invalid quantity for product {}",
                        item.product_id
                    ))
                })?;
            }
            None => merged.push((item.product_id, item.quantity)),
        }
    }
    Ok(merged)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn place_order(
    state: &AppState,
    order: NewOrder,
    items: &[OrderItemRequest],
) -> AppResult<Order> {
    let lines = merge_items(items)?;
    if order.delivery_type == DeliveryType::Delivery && order.delivery_address.is_none() {
        return Err(AppError::BadRequest(
            "delivery_address is required for delivery orders".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let ids: Vec<Uuid> = lines.iter().map(|(id, _)| *id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    for (product_id, quantity) in &lines {
        let product = products
            .get(product_id)
            .ok_or_else(|| AppError::BadRequest(format!("Product not found: {product_id}")))?;
        if product.stock_quantity < *quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product: {}",
                product.title
            )));
        }
    }

    let now = Utc::now();
    let model = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(order.user_id),
        is_guest_order: Set(order.user_id.is_none()),
        guest_name: Set(order.guest_name),
        guest_email: Set(order.guest_email),
        guest_phone: Set(order.guest_phone),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        delivery_type: Set(order.delivery_type.as_str().to_string()),
        delivery_address: Set(order.delivery_address),
        delivery_phone: Set(order.delivery_phone),
        wilaya: Set(order.wilaya),
        tracking_id: Set(None),
        assigned_admin: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut saved_items = Vec::with_capacity(lines.len());
    for (position, (product_id, quantity)) in lines.iter().enumerate() {
        let product = &products[product_id];
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(model.id),
            product_id: Set(Some(product.id)),
            title: Set(product.title.clone()),
            description: Set(product.description.clone()),
            image_urls: Set(product.image_urls.clone()),
            category: Set(product.category.clone()),
            price_dzd: Set(product.price_dzd),
            quantity: Set(*quantity),
            position: Set(position as i32),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        saved_items.push(item);

        Products::update_many()
            .col_expr(ProdCol::StockQuantity, Expr::col(ProdCol::StockQuantity).sub(*quantity))
            .filter(ProdCol::Id.eq(*product_id))
            .exec(&txn)
            .await?;
    }

    let customer = match model.user_id {
        Some(id) => Users::find_by_id(id).one(&txn).await?,
        None => None,
    };

    txn.commit().await?;

    tracing::info!(
        order_id = %model.id,
        guest = model.is_guest_order,
        lines = saved_items.len(),
        "order placed"
    );

    Ok(Order::from_parts(model, saved_items, customer.as_ref()))
}

/// Puts the stock taken by an order back on the shelf.
pub(crate) async fn restock(txn: &DatabaseTransaction, order_id: Uuid) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(txn)
        .await?;
    for item in items {
        if let Some(product_id) = item.product_id {
            Products::update_many()
                .col_expr(
                    ProdCol::StockQuantity,
                    Expr::col(ProdCol::StockQuantity).add(item.quantity),
                )
                .filter(ProdCol::Id.eq(product_id))
                .exec(txn)
                .await?;
        }
    }
    Ok(())
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let delivery_phone = non_empty(payload.delivery_phone);
    if let Some(phone) = delivery_phone.as_deref() {
        if !validation::is_valid_phone(phone) {
            return Err(AppError::BadRequest("Enter a valid Algerian phone number".into()));
        }
    }
    let wilaya = non_empty(payload.wilaya);
    if wilaya.as_deref().is_some_and(|w| !wilaya::is_valid(w)) {
        return Err(AppError::BadRequest("Unknown wilaya".into()));
    }

    let order = place_order(
        state,
        NewOrder {
            user_id: Some(user.user_id),
            guest_name: None,
            guest_email: None,
            guest_phone: None,
            delivery_type: payload.delivery_type,
            delivery_address: non_empty(payload.delivery_address),
            delivery_phone,
            wilaya,
        },
        &payload.items,
    )
    .await?;

    audit::record(
        state,
        Some(user.user_id),
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success("Order created", order, Some(Meta::empty())))
}

fn validate_guest(payload: &GuestOrderRequest) -> AppResult<()> {
    if payload.guest_name.trim().is_empty() {
        return Err(AppError::BadRequest("guest_name is required".into()));
    }
    if !validation::is_valid_phone(&payload.guest_phone) {
        return Err(AppError::BadRequest("Enter a valid Algerian phone number".into()));
    }
    if let Some(email) = payload.guest_email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !validation::is_valid_email(email) {
            return Err(AppError::BadRequest("Enter a valid email address".into()));
        }
    }
    if payload.delivery_address.trim().is_empty() {
        return Err(AppError::BadRequest("delivery_address is required".into()));
    }
    if !wilaya::is_valid(&payload.wilaya) {
        return Err(AppError::BadRequest("Unknown wilaya".into()));
    }
    Ok(())
}

pub async fn create_guest_order(
    state: &AppState,
    payload: GuestOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    validate_guest(&payload)?;

    let phone: String = payload
        .guest_phone
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let order = place_order(
        state,
        NewOrder {
            user_id: None,
            guest_name: Some(payload.guest_name.trim().to_string()),
            guest_email: non_empty(payload.guest_email),
            guest_phone: Some(phone.clone()),
            delivery_type: payload.delivery_type,
            delivery_address: Some(payload.delivery_address.trim().to_string()),
            delivery_phone: Some(phone),
            wilaya: Some(payload.wilaya.trim().to_string()),
        },
        &payload.items,
    )
    .await?;

    audit::record(
        state,
        None,
        "guest_order_create",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success("Order created", order, Some(Meta::empty())))
}

pub async fn list_my_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let models = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let items = hydrate(&state.orm, models).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(1, total, total)),
    ))
}

/// Courier tracking record of an order. Customers may look up their own
/// orders, admins any order they can see.
pub async fn delivery_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<DeliveryStatus>> {
    let order = if user.role.is_admin() {
        Orders::find_by_id(id)
            .filter(admin_service::visible_orders(state, user).await?)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?
    } else {
        let order = Orders::find_by_id(id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
        if order.user_id != Some(user.user_id) {
            return Err(AppError::Forbidden);
        }
        order
    };

    // Only orders handed to the courier have something to look up.
    let tracking_id = order.tracking_id.ok_or(AppError::NotFound)?;
    let courier = state.courier.as_ref().ok_or(AppError::NotFound)?;
    let status = courier.parcel_status(&tracking_id).await.map_err(|err| {
        tracing::warn!(order_id = %id, tracking_id = %tracking_id, error = %err, "delivery status lookup failed");
        AppError::NotFound
    })?;

    Ok(ApiResponse::success(
        "Delivery status",
        DeliveryStatus {
            order_id: id,
            tracking_id,
            status,
        },
        None,
    ))
}

pub fn delivery_types() -> ApiResponse<Vec<DeliveryType>> {
    ApiResponse::success("Delivery types", DeliveryType::ALL.to_vec(), None)
}

/// Attaches line items and customer details to order rows.
pub(crate) async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<Order>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order: BTreeMap<Uuid, Vec<OrderItemModel>> = BTreeMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids))
        .all(conn)
        .await?
    {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    let user_ids: Vec<Uuid> = orders.iter().filter_map(|o| o.user_id).collect();
    let users: HashMap<Uuid, UserModel> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(UserCol::Id.is_in(user_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    };

    Ok(orders
        .into_iter()
        .map(|model| {
            let items = items_by_order.remove(&model.id).unwrap_or_default();
            let customer = model.user_id.and_then(|id| users.get(&id));
            Order::from_parts(model, items, customer)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_items_sums_duplicates_in_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let merged = merge_items(&[
            OrderItemRequest { product_id: a, quantity: 1 },
            OrderItemRequest { product_id: b, quantity: 2 },
            OrderItemRequest { product_id: a, quantity: 3 },
        ])
        .unwrap();
        assert_eq!(merged, vec![(a, 4), (b, 2)]);
    }

    #[test]
    fn merge_items_rejects_empty_and_non_positive() {
        assert!(merge_items(&[]).is_err());
        assert!(
            merge_items(&[OrderItemRequest {
                product_id: Uuid::new_v4(),
                quantity: 0
            }])
            .is_err()
        );
    }

    #[test]
    fn merge_items_rejects_quantity_overflow() {
        let a = Uuid::new_v4();
        let err = merge_items(&[
            OrderItemRequest { product_id: a, quantity: i32::MAX },
            OrderItemRequest { product_id: a, quantity: 2 },
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.starts_with("Invalid quantity")));
    }
}
