use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{DeliveryType, Order};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Order placed by a signed-in customer.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub delivery_phone: Option<String>,
    pub wilaya: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct GuestOrderRequest {
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub delivery_address: String,
    pub wilaya: String,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}

/// Tracking record the courier reports for an order out for delivery.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryStatus {
    pub order_id: Uuid,
    pub tracking_id: String,
    #[schema(value_type = Object)]
    pub status: serde_json::Value,
}
