use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    analytics::{CategoryShare, DashboardAnalytics, MonthlyOrders, MonthlyRevenue, StatusShare},
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        materials::{CreateMaterialRequest, MaterialList, UpdateMaterialRequest},
        orders::{
            CreateOrderRequest, DeliveryStatus, GuestOrderRequest, OrderItemRequest, OrderList,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest, UploadedImages},
        users::UserList,
    },
    lifecycle::OrderAction,
    models::{
        Category, ClientInfo, DeliveryType, Material, Order, OrderStatus, Product,
        ProductSnapshot, Role, StockStatus, User,
    },
    response::{ApiResponse, Meta},
    routes::{categories, dashboard, health, materials, orders, params, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register,
        users::login,
        users::me,
        users::list_users,
        users::promote,
        users::demote,
        users::block,
        users::unblock,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::upload_images,
        products::get_image,
        orders::create_order,
        orders::create_guest_order,
        orders::my_orders,
        orders::delivery_types,
        orders::delivery_status,
        orders::admin_orders,
        orders::accept_order,
        orders::decline_order,
        orders::ready_order,
        orders::deliver_order,
        orders::delete_order,
        materials::list_materials,
        materials::get_material,
        materials::create_material,
        materials::update_material,
        materials::delete_material,
        dashboard::analytics
    ),
    components(
        schemas(
            User,
            Role,
            Category,
            Product,
            ProductSnapshot,
            StockStatus,
            Order,
            OrderStatus,
            OrderAction,
            DeliveryType,
            ClientInfo,
            Material,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            UploadedImages,
            OrderItemRequest,
            CreateOrderRequest,
            GuestOrderRequest,
            OrderList,
            DeliveryStatus,
            CreateMaterialRequest,
            UpdateMaterialRequest,
            MaterialList,
            DashboardAnalytics,
            StatusShare,
            CategoryShare,
            MonthlyOrders,
            MonthlyRevenue,
            health::HealthData,
            params::Pagination,
            params::ProductQuery,
            params::ProductSortBy,
            params::SortOrder,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<User>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Accounts, authentication and roles"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product and image endpoints"),
        (name = "Orders", description = "Customer and guest order endpoints"),
        (name = "Admin", description = "Order handling for admins"),
        (name = "Materials", description = "Study material endpoints"),
        (name = "Dashboard", description = "Admin analytics"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
