use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::OrderStatus;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusShare {
    pub status: OrderStatus,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryShare {
    pub category: String,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyOrders {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardAnalytics {
    pub total_users: i64,
    pub total_available_products: i64,
    pub total_pending_orders: i64,
    pub order_status_percentages: Vec<StatusShare>,
    pub category_percentages: Vec<CategoryShare>,
    pub monthly_orders: Vec<MonthlyOrders>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

/// The parts of an order the dashboard aggregates over.
#[derive(Debug, Clone)]
pub struct OrderFact {
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub revenue_dzd: i64,
}

/// Whole percentage, halves rounded to even.
fn percent(count: usize, total: usize) -> i64 {
    if total == 0 {
        0
    } else {
        ((count as f64 / total as f64) * 100.0).round_ties_even() as i64
    }
}

/// Aggregates dashboard figures. Monthly series only cover `year` and list
/// months that have at least one order, in calendar order.
pub fn compute(
    total_users: i64,
    product_categories: &[String],
    orders: &[OrderFact],
    year: i32,
) -> DashboardAnalytics {
    let status_shares = OrderStatus::ALL
        .iter()
        .filter_map(|status| {
            let count = orders.iter().filter(|o| o.status == *status).count();
            (count > 0).then(|| StatusShare {
                status: *status,
                percentage: percent(count, orders.len()),
            })
        })
        .collect();

    let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
    for category in product_categories.iter().filter(|c| !c.is_empty()) {
        *per_category.entry(category.as_str()).or_default() += 1;
    }
    let categorized: usize = per_category.values().sum();
    let category_shares = per_category
        .into_iter()
        .map(|(category, count)| CategoryShare {
            category: category.to_string(),
            percentage: percent(count, categorized),
        })
        .collect();

    let mut counts = [0_i64; 12];
    let mut revenue = [0_i64; 12];
    for order in orders.iter().filter(|o| o.created_at.year() == year) {
        let month = order.created_at.month0() as usize;
        counts[month] += 1;
        revenue[month] += order.revenue_dzd;
    }

    let active_months: Vec<usize> = (0..12).filter(|m| counts[*m] > 0).collect();

    DashboardAnalytics {
        total_users,
        total_available_products: product_categories.len() as i64,
        total_pending_orders: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count() as i64,
        order_status_percentages: status_shares,
        category_percentages: category_shares,
        monthly_orders: active_months
            .iter()
            .map(|m| MonthlyOrders {
                month: MONTHS[*m].to_string(),
                count: counts[*m],
            })
            .collect(),
        monthly_revenue: active_months
            .iter()
            .map(|m| MonthlyRevenue {
                month: MONTHS[*m].to_string(),
                revenue: revenue[*m],
            })
            .collect(),
    }
}
