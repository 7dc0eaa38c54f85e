use std::sync::{Arc, Mutex, OnceLock};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use gymfog_shop::{
    config::AppConfig,
    courier::{Courier, Parcel},
    db::{create_orm_conn, run_migrations},
    dto::orders::{CreateOrderRequest, GuestOrderRequest, OrderItemRequest},
    entity::{
        products::{ActiveModel as ProductActive, Entity as Products},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    lifecycle::OrderAction,
    middleware::auth::AuthUser,
    models::{DeliveryType, OrderStatus, Role, json_list},
    routes::params::AdminOrderQuery,
    services::{admin_service, order_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, Set};
use uuid::Uuid;

#[derive(Default)]
struct RecordingCourier {
    parcels: Mutex<Vec<Parcel>>,
}

#[async_trait]
impl Courier for RecordingCourier {
    async fn create_parcel(&self, parcel: &Parcel) -> anyhow::Result<String> {
        self.parcels.lock().unwrap().push(parcel.clone());
        Ok(parcel.tracking.clone())
    }

    async fn parcel_status(&self, tracking_id: &str) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::json!({ "Colis": [{ "Tracking": tracking_id, "Situation": "En livraison" }] }))
    }
}

struct RejectingCourier;

#[async_trait]
impl Courier for RejectingCourier {
    async fn create_parcel(&self, _parcel: &Parcel) -> anyhow::Result<String> {
        Err(anyhow!("courier returned 503 Service Unavailable"))
    }

    async fn parcel_status(&self, _tracking_id: &str) -> anyhow::Result<serde_json::Value> {
        Err(anyhow!("courier returned 503 Service Unavailable"))
    }
}

/// Lets another admin mark the order delivered while the parcel is being
/// registered.
#[derive(Default)]
struct SlowCourier {
    other_admin: OnceLock<(AppState, AuthUser)>,
}

#[async_trait]
impl Courier for SlowCourier {
    async fn create_parcel(&self, parcel: &Parcel) -> anyhow::Result<String> {
        let (state, admin) = self
            .other_admin
            .get()
            .ok_or_else(|| anyhow!("other admin not set"))?;
        let order_id: Uuid = parcel.external_id.parse()?;
        admin_service::apply_action(state, admin, order_id, OrderAction::Delivered)
            .await
            .map_err(|err| anyhow!(err.to_string()))?;
        Ok(parcel.tracking.clone())
    }

    async fn parcel_status(&self, _tracking_id: &str) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }
}

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        }
    }
}

async fn setup_state(database_url: &str, courier: Option<Arc<dyn Courier>>) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        upload_dir: std::env::temp_dir()
            .join("gymfog-flow-uploads")
            .display()
            .to_string(),
        allowed_origins: Vec::new(),
        courier: None,
    };
    Ok(AppState::new(orm, &config, courier))
}

async fn create_user(state: &AppState, role: Role, era: Option<&str>) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@gymfog.test", Uuid::new_v4())),
        password_hash: Set("not-a-real-hash".into()),
        full_name: Set(Some("Test Fighter".into())),
        phone_number: Set(Some("0661234567".into())),
        role: Set(role.as_str().to_string()),
        era: Set(era.map(str::to_string)),
        is_blocked: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

async fn create_product(state: &AppState, title: &str, price_dzd: i64, stock: i32) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        description: Set(Some("integration fixture".into())),
        image_urls: Set(json_list(&["fixture.png".to_string()])),
        category: Set("Gloves".into()),
        price_dzd: Set(price_dzd),
        stock_quantity: Set(stock),
        brand: Set(None),
        sizes: Set(json_list(&[])),
        colors: Set(json_list(&[])),
        weight: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} missing"))?;
    Ok(product.stock_quantity)
}

async fn is_listed(state: &AppState, admin: &AuthUser, order_id: Uuid) -> anyhow::Result<bool> {
    let orders = admin_service::list_orders(state, admin, AdminOrderQuery::default())
        .await?
        .data
        .expect("orders");
    Ok(orders.items.iter().any(|o| o.id == order_id))
}

fn guest_order(product_id: Uuid, quantity: i32, delivery_type: DeliveryType) -> GuestOrderRequest {
    GuestOrderRequest {
        guest_name: "Yacine Brahimi".into(),
        guest_phone: "0555 12 34 56".into(),
        guest_email: Some("yacine@gymfog.test".into()),
        delivery_address: "12 rue Didouche Mourad".into(),
        wilaya: "Alger".into(),
        items: vec![OrderItemRequest {
            product_id,
            quantity,
        }],
        delivery_type,
    }
}

// Guest pickup order: placed -> accepted -> ready -> delivered, stock taken once.
#[tokio::test]
async fn guest_pickup_order_runs_full_lifecycle() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, None).await?;
    let admin = create_user(&state, Role::Admin, Some("east")).await?;
    let product_id = create_product(&state, "Flow Gloves", 8500, 5).await?;

    let placed = order_service::create_guest_order(
        &state,
        guest_order(product_id, 2, DeliveryType::Pickup),
    )
    .await?
    .data
    .expect("order");

    assert!(placed.is_guest_order);
    assert_eq!(placed.status, OrderStatus::Pending);
    assert_eq!(placed.total_dzd(), 17_000);
    assert_eq!(placed.item[0].0.title, "Flow Gloves");
    assert_eq!(placed.item[0].1, 2);
    assert_eq!(placed.delivery_phone.as_deref(), Some("0555123456"));
    assert_eq!(stock_of(&state, product_id).await?, 3);

    let listed = admin_service::list_orders(
        &state,
        &admin,
        AdminOrderQuery {
            status: Some(OrderStatus::Pending),
        },
    )
    .await?
    .data
    .expect("orders");
    assert!(listed.items.iter().any(|o| o.id == placed.id));

    for (action, expected) in [
        (OrderAction::Accept, OrderStatus::Accepted),
        (OrderAction::Ready, OrderStatus::Ready),
        (OrderAction::Delivered, OrderStatus::Delivered),
    ] {
        let order = admin_service::apply_action(&state, &admin, placed.id, action)
            .await?
            .data
            .expect("order");
        assert_eq!(order.status, expected);
        assert_eq!(order.assigned_admin, Some(admin.user_id));
    }

    let err = admin_service::apply_action(&state, &admin, placed.id, OrderAction::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Transition(_)));
    assert_eq!(stock_of(&state, product_id).await?, 3);

    Ok(())
}

// Delivery order marked ready is handed to the courier and goes out for delivery.
#[tokio::test]
async fn ready_delivery_order_is_handed_to_courier() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let courier = Arc::new(RecordingCourier::default());
    let state = setup_state(&url, Some(courier.clone())).await?;
    let admin = create_user(&state, Role::SuperAdmin, None).await?;
    let product_id = create_product(&state, "Courier Shin Guards", 6200, 4).await?;

    let placed = order_service::create_guest_order(
        &state,
        guest_order(product_id, 1, DeliveryType::Delivery),
    )
    .await?
    .data
    .expect("order");

    admin_service::apply_action(&state, &admin, placed.id, OrderAction::Accept).await?;
    let ready = admin_service::apply_action(&state, &admin, placed.id, OrderAction::Ready).await?;
    assert_eq!(ready.message, "Order handed to the courier");
    let order = ready.data.expect("order");

    assert_eq!(order.status, OrderStatus::OutForDelivery);
    let tracking = order.tracking_id.clone().expect("tracking id");
    assert!(tracking.starts_with(&format!("ORDER_{}_", placed.id)));

    {
        let parcels = courier.parcels.lock().unwrap();
        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].wilaya_code, Some(16));
        assert_eq!(parcels[0].total_dzd, 6200);
        assert_eq!(parcels[0].client_name, "Yacine Brahimi");
    }

    let delivered = admin_service::apply_action(&state, &admin, placed.id, OrderAction::Delivered)
        .await?
        .data
        .expect("order");
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.tracking_id, Some(tracking));

    Ok(())
}

// A courier outage leaves the order ready with no tracking id.
#[tokio::test]
async fn rejected_parcel_leaves_order_ready() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Some(Arc::new(RejectingCourier))).await?;
    let admin = create_user(&state, Role::SuperAdmin, None).await?;
    let product_id = create_product(&state, "Outage Headgear", 7400, 2).await?;

    let placed = order_service::create_guest_order(
        &state,
        guest_order(product_id, 1, DeliveryType::Delivery),
    )
    .await?
    .data
    .expect("order");

    admin_service::apply_action(&state, &admin, placed.id, OrderAction::Accept).await?;
    let ready = admin_service::apply_action(&state, &admin, placed.id, OrderAction::Ready).await?;
    assert!(ready.message.contains("did not accept"), "{}", ready.message);
    let order = ready.data.expect("order");
    assert_eq!(order.status, OrderStatus::Ready);
    assert_eq!(order.tracking_id, None);

    // Still deliverable by hand.
    let delivered = admin_service::apply_action(&state, &admin, placed.id, OrderAction::Delivered)
        .await?
        .data
        .expect("order");
    assert_eq!(delivered.status, OrderStatus::Delivered);

    Ok(())
}

// An order delivered while the courier call is in flight stays delivered.
#[tokio::test]
async fn delivered_during_hand_off_is_not_reopened() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let courier = Arc::new(SlowCourier::default());
    let state = setup_state(&url, Some(courier.clone())).await?;
    let admin = create_user(&state, Role::SuperAdmin, None).await?;
    let other = create_user(&state, Role::SuperAdmin, None).await?;
    assert!(courier.other_admin.set((state.clone(), other)).is_ok());
    let product_id = create_product(&state, "Race Groin Guard", 3100, 2).await?;

    let placed = order_service::create_guest_order(
        &state,
        guest_order(product_id, 1, DeliveryType::Delivery),
    )
    .await?
    .data
    .expect("order");

    admin_service::apply_action(&state, &admin, placed.id, OrderAction::Accept).await?;
    let ready = admin_service::apply_action(&state, &admin, placed.id, OrderAction::Ready).await?;

    assert!(ready.message.contains("changed meanwhile"), "{}", ready.message);
    let order = ready.data.expect("order");
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.tracking_id, None);

    let mine = admin_service::list_orders(&state, &admin, AdminOrderQuery::default())
        .await?
        .data
        .expect("orders");
    let stored = mine
        .items
        .iter()
        .find(|o| o.id == placed.id)
        .expect("order listed");
    assert_eq!(stored.status, OrderStatus::Delivered);
    assert_eq!(stored.tracking_id, None);

    Ok(())
}

// Pickups are handed over by the admin who prepared them.
#[tokio::test]
async fn only_assigned_admin_hands_over_pickup() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, None).await?;
    let preparer = create_user(&state, Role::Admin, None).await?;
    let colleague = create_user(&state, Role::Admin, None).await?;
    let product_id = create_product(&state, "Counter Jump Rope", 1500, 3).await?;

    let placed = order_service::create_guest_order(
        &state,
        guest_order(product_id, 1, DeliveryType::Pickup),
    )
    .await?
    .data
    .expect("order");

    admin_service::apply_action(&state, &preparer, placed.id, OrderAction::Accept).await?;
    admin_service::apply_action(&state, &preparer, placed.id, OrderAction::Ready).await?;

    let err = admin_service::apply_action(&state, &colleague, placed.id, OrderAction::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let delivered = admin_service::apply_action(&state, &preparer, placed.id, OrderAction::Delivered)
        .await?
        .data
        .expect("order");
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.assigned_admin, Some(preparer.user_id));

    Ok(())
}

// Customers can follow their own parcel once it is with the courier.
#[tokio::test]
async fn delivery_status_follows_the_parcel() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Some(Arc::new(RecordingCourier::default()))).await?;
    let admin = create_user(&state, Role::SuperAdmin, None).await?;
    let customer = create_user(&state, Role::User, None).await?;
    let stranger = create_user(&state, Role::User, None).await?;
    let product_id = create_product(&state, "Tracked Bag", 5600, 3).await?;

    let order = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            items: vec![OrderItemRequest {
                product_id,
                quantity: 1,
            }],
            delivery_type: DeliveryType::Delivery,
            delivery_address: Some("Rue Larbi Ben M'hidi".into()),
            delivery_phone: None,
            wilaya: Some("Constantine".into()),
        },
    )
    .await?
    .data
    .expect("order");

    let err = order_service::delivery_status(&state, &customer, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    admin_service::apply_action(&state, &admin, order.id, OrderAction::Accept).await?;
    let dispatched = admin_service::apply_action(&state, &admin, order.id, OrderAction::Ready)
        .await?
        .data
        .expect("order");
    let tracking = dispatched.tracking_id.expect("tracking id");

    let status = order_service::delivery_status(&state, &customer, order.id)
        .await?
        .data
        .expect("status");
    assert_eq!(status.order_id, order.id);
    assert_eq!(status.tracking_id, tracking);
    assert_eq!(status.status["Colis"][0]["Tracking"], tracking.as_str());

    let err = order_service::delivery_status(&state, &stranger, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert!(order_service::delivery_status(&state, &admin, order.id).await.is_ok());

    Ok(())
}

// Declining gives the stock back and the order cannot be revived.
#[tokio::test]
async fn declined_order_restores_stock_and_is_terminal() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, None).await?;
    let admin = create_user(&state, Role::Admin, None).await?;
    let product_id = create_product(&state, "Decline Wraps", 900, 10).await?;

    let placed = order_service::create_guest_order(
        &state,
        guest_order(product_id, 4, DeliveryType::Delivery),
    )
    .await?
    .data
    .expect("order");
    assert_eq!(stock_of(&state, product_id).await?, 6);

    let declined = admin_service::apply_action(&state, &admin, placed.id, OrderAction::Decline)
        .await?
        .data
        .expect("order");
    assert_eq!(declined.status, OrderStatus::Declined);
    assert_eq!(stock_of(&state, product_id).await?, 10);

    let err = admin_service::apply_action(&state, &admin, placed.id, OrderAction::Accept)
        .await
        .unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);

    Ok(())
}

// Orders that would oversell are rejected without touching stock.
#[tokio::test]
async fn insufficient_stock_is_rejected() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, None).await?;
    let product_id = create_product(&state, "Last Mouthguard", 1200, 1).await?;

    let err = order_service::create_guest_order(
        &state,
        guest_order(product_id, 2, DeliveryType::Pickup),
    )
    .await
    .unwrap_err();
    match err {
        AppError::BadRequest(message) => {
            assert_eq!(message, "Insufficient stock for product: Last Mouthguard")
        }
        other => panic!("expected bad request, got {other:?}"),
    }
    assert_eq!(stock_of(&state, product_id).await?, 1);

    let unknown = Uuid::new_v4();
    let err = order_service::create_guest_order(
        &state,
        guest_order(unknown, 1, DeliveryType::Pickup),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(m) if m == format!("Product not found: {unknown}")));

    Ok(())
}

// Regular admins only see guest orders and orders from customers of their era.
#[tokio::test]
async fn admin_listing_is_scoped_by_era() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, None).await?;
    let era = format!("era-{}", Uuid::new_v4());
    let local_admin = create_user(&state, Role::Admin, Some(&era)).await?;
    let other_admin = create_user(&state, Role::Admin, Some("elsewhere")).await?;
    let super_admin = create_user(&state, Role::SuperAdmin, None).await?;
    let customer = create_user(&state, Role::User, Some(&era)).await?;
    let product_id = create_product(&state, "Era Hoodie", 3900, 10).await?;

    let order = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            items: vec![OrderItemRequest {
                product_id,
                quantity: 1,
            }],
            delivery_type: DeliveryType::Delivery,
            delivery_address: Some("Cite 500 logements".into()),
            delivery_phone: Some("0771234567".into()),
            wilaya: Some("Oran".into()),
        },
    )
    .await?
    .data
    .expect("order");
    assert!(!order.is_guest_order);
    assert_eq!(
        order.client.as_ref().and_then(|c| c.full_name.as_deref()),
        Some("Test Fighter")
    );

    assert!(is_listed(&state, &local_admin, order.id).await?);
    assert!(!is_listed(&state, &other_admin, order.id).await?);
    assert!(is_listed(&state, &super_admin, order.id).await?);

    let err = admin_service::apply_action(&state, &other_admin, order.id, OrderAction::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let mine = order_service::list_my_orders(&state, &customer)
        .await?
        .data
        .expect("orders");
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].id, order.id);

    Ok(())
}
