use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::entity::{
    categories::Model as CategoryModel, materials::Model as MaterialModel,
    order_items::Model as OrderItemModel, orders::Model as OrderModel,
    products::Model as ProductModel, users::Model as UserModel,
};

/// Stock at or below this level (and above zero) is shown as "low stock".
pub const LOW_STOCK_THRESHOLD: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Declined,
    Ready,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Declined,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Declined => "declined",
            OrderStatus::Ready => "ready",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    Pickup,
    #[default]
    Delivery,
}

impl DeliveryType {
    pub const ALL: [DeliveryType; 2] = [DeliveryType::Pickup, DeliveryType::Delivery];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::Pickup => "pickup",
            DeliveryType::Delivery => "delivery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value `{}`", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! impl_str_enum {
    ($ty:ty, [$($variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownVariant(s.to_string()))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ty {
            /// Parses a value read back from the database. An unknown value
            /// is a broken row, not a client mistake.
            pub fn from_stored(s: &str) -> Result<Self, AppError> {
                s.parse().map_err(|err: UnknownVariant| {
                    AppError::Internal(anyhow::anyhow!("stored {}: {err}", stringify!($ty)))
                })
            }
        }
    };
}

impl_str_enum!(Role, [Role::User, Role::Admin, Role::SuperAdmin]);
impl_str_enum!(
    OrderStatus,
    [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Declined,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ]
);
impl_str_enum!(DeliveryType, [DeliveryType::Pickup, DeliveryType::Delivery]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    pub fn from_quantity(quantity: i32) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= LOW_STOCK_THRESHOLD {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: Role,
    pub era: Option<String>,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub category: String,
    pub price_dzd: i64,
    pub stock_quantity: i32,
    pub brand: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub weight: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(self.stock_quantity)
    }

    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: Some(self.id),
            title: self.title.clone(),
            description: self.description.clone(),
            image_urls: self.image_urls.clone(),
            category: self.category.clone(),
            price_dzd: self.price_dzd,
        }
    }
}

/// Product fields frozen into an order line. `id` is `None` once the
/// product has been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductSnapshot {
    pub id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub category: String,
    pub price_dzd: i64,
}

/// Serialized as a two-element array: `[snapshot, quantity]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine(pub ProductSnapshot, pub i32);

impl OrderLine {
    pub fn line_total(&self) -> i64 {
        self.0.price_dzd * i64::from(self.1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClientInfo {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub client: Option<ClientInfo>,
    pub is_guest_order: bool,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub item: Vec<OrderLine>,
    pub status: OrderStatus,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub delivery_phone: Option<String>,
    pub wilaya: Option<String>,
    pub tracking_id: Option<String>,
    pub assigned_admin: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn total_dzd(&self) -> i64 {
        self.item.iter().map(OrderLine::line_total).sum()
    }

    /// Builds the API view of an order. `customer` is the account that
    /// placed a non-guest order, when it still exists.
    pub fn from_parts(
        model: OrderModel,
        items: Vec<OrderItemModel>,
        customer: Option<&UserModel>,
    ) -> Self {
        let client = if model.is_guest_order {
            Some(ClientInfo {
                full_name: model.guest_name.clone(),
                email: model.guest_email.clone(),
                phone: model.guest_phone.clone(),
            })
        } else {
            customer.map(|user| ClientInfo {
                full_name: user.full_name.clone(),
                email: Some(user.email.clone()),
                phone: user.phone_number.clone(),
            })
        };

        let delivery_phone = model.delivery_phone.clone().or_else(|| {
            model
                .is_guest_order
                .then(|| model.guest_phone.clone())
                .flatten()
        });

        let mut items = items;
        items.sort_by_key(|item| item.position);

        Order {
            id: model.id,
            client,
            is_guest_order: model.is_guest_order,
            guest_name: model.guest_name,
            guest_email: model.guest_email,
            guest_phone: model.guest_phone,
            item: items.into_iter().map(OrderLine::from).collect(),
            status: model.status.parse().unwrap_or(OrderStatus::Pending),
            delivery_type: model.delivery_type.parse().unwrap_or_default(),
            delivery_address: model.delivery_address,
            delivery_phone,
            wilaya: model.wilaya,
            tracking_id: model.tracking_id,
            assigned_admin: model.assigned_admin,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Material {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub module: Option<String>,
    pub study_year: Option<String>,
    pub price_dzd: i64,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn string_list(value: Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

pub fn json_list(items: &[String]) -> Value {
    Value::from(items.to_vec())
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            phone_number: model.phone_number,
            role: model.role.parse().unwrap_or(Role::User),
            era: model.era,
            is_blocked: model.is_blocked,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<CategoryModel> for Category {
    fn from(model: CategoryModel) -> Self {
        Category {
            id: model.id,
            title: model.title,
            description: model.description,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<ProductModel> for Product {
    fn from(model: ProductModel) -> Self {
        Product {
            id: model.id,
            title: model.title,
            description: model.description,
            image_urls: string_list(model.image_urls),
            category: model.category,
            price_dzd: model.price_dzd,
            stock_quantity: model.stock_quantity,
            brand: model.brand,
            sizes: string_list(model.sizes),
            colors: string_list(model.colors),
            weight: model.weight,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<OrderItemModel> for OrderLine {
    fn from(model: OrderItemModel) -> Self {
        OrderLine(
            ProductSnapshot {
                id: model.product_id,
                title: model.title,
                description: model.description,
                image_urls: string_list(model.image_urls),
                category: model.category,
                price_dzd: model.price_dzd,
            },
            model.quantity,
        )
    }
}

impl From<MaterialModel> for Material {
    fn from(model: MaterialModel) -> Self {
        Material {
            id: model.id,
            title: model.title,
            description: model.description,
            module: model.module,
            study_year: model.study_year,
            price_dzd: model.price_dzd,
            image_url: model.image_url,
            file_url: model.file_url,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
