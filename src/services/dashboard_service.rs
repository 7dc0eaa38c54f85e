use std::collections::HashMap;

use chrono::{Datelike, Utc};
use sea_orm::{EntityTrait, PaginatorTrait, QuerySelect};
use uuid::Uuid;

use crate::{
    analytics::{self, DashboardAnalytics, OrderFact},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::Entity as Orders,
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::OrderStatus,
    response::ApiResponse,
    state::AppState,
};

pub async fn analytics(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardAnalytics>> {
    ensure_admin(user)?;

    let total_users = Users::find().count(&state.orm).await? as i64;

    let categories: Vec<String> = Products::find()
        .select_only()
        .column(ProdCol::Category)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let mut revenue: HashMap<Uuid, i64> = HashMap::new();
    let lines: Vec<(Uuid, i64, i32)> = OrderItems::find()
        .select_only()
        .column(OrderItemCol::OrderId)
        .column(OrderItemCol::PriceDzd)
        .column(OrderItemCol::Quantity)
        .into_tuple()
        .all(&state.orm)
        .await?;
    for (order_id, price, quantity) in lines {
        *revenue.entry(order_id).or_default() += price * i64::from(quantity);
    }

    let facts = Orders::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|order| -> AppResult<OrderFact> {
            Ok(OrderFact {
                status: OrderStatus::from_stored(&order.status)?,
                created_at: order.created_at.with_timezone(&Utc),
                revenue_dzd: revenue.get(&order.id).copied().unwrap_or_default(),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let year = Utc::now().year();
    tracing::debug!(orders = facts.len(), year, "computing dashboard analytics");

    Ok(ApiResponse::success(
        "Dashboard analytics",
        analytics::compute(total_users, &categories, &facts, year),
        None,
    ))
}
