use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, header},
    routing::{get, post},
};
use chrono::Utc;
use gymfog_shop::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        orders::{GuestOrderRequest, OrderItemRequest},
    },
    error::{AppError, AppResult},
    models::{DeliveryType, Order, Product, Role, User},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    storefront::{ApiClient, ClientError, MemoryStore, TokenStore},
};
use uuid::Uuid;

const TOKEN: &str = "tok-123";

fn sample_product() -> Product {
    Product {
        id: Uuid::nil(),
        title: "Pro Boxing Gloves".into(),
        description: None,
        image_urls: vec![
            "abc.png".into(),
            "https://cdn.example.com/x.png".into(),
            "/static/y.png".into(),
        ],
        category: "Gloves".into(),
        price_dzd: 8500,
        stock_quantity: 3,
        brand: Some("Venum".into()),
        sizes: vec!["12oz".into()],
        colors: Vec::new(),
        weight: None,
        created_at: Utc::now(),
    }
}

fn sample_user() -> User {
    User {
        id: Uuid::nil(),
        email: "fighter@gymfog.dz".into(),
        full_name: Some("Amina K".into()),
        phone_number: Some("0661234567".into()),
        role: Role::User,
        era: None,
        is_blocked: false,
        created_at: Utc::now(),
    }
}

async fn products(
    Query(params): Query<HashMap<String, String>>,
) -> Json<ApiResponse<Vec<Product>>> {
    let items: Vec<Product> = vec![sample_product()]
        .into_iter()
        .filter(|p| params.get("category").is_none_or(|c| c == &p.category))
        .collect();
    let total = items.len() as i64;
    Json(ApiResponse::success("Products", items, Some(Meta::new(1, 50, total))))
}

async fn login(Json(body): Json<LoginRequest>) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    if body.password != "secret123" {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }
    Ok(Json(ApiResponse::success(
        "Logged in",
        LoginResponse {
            access_token: TOKEN.into(),
            token_type: "bearer".into(),
            user: sample_user(),
        },
        None,
    )))
}

async fn me(headers: HeaderMap) -> AppResult<Json<ApiResponse<User>>> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => {
            Ok(Json(ApiResponse::success("Current user", sample_user(), None)))
        }
        _ => Err(AppError::Unauthorized("Missing Authorization header".into())),
    }
}

async fn my_orders() -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    Err(AppError::Unauthorized("Invalid or expired token".into()))
}

async fn guest_order(Json(_): Json<GuestOrderRequest>) -> AppResult<Json<ApiResponse<Order>>> {
    Err(AppError::BadRequest(
        "Insufficient stock for product: Pro Boxing Gloves".into(),
    ))
}

async fn spawn_stub() -> SocketAddr {
    let app = Router::new()
        .route("/api/products", get(products))
        .route("/api/users/login", post(login))
        .route("/api/users/me", get(me))
        .route("/api/orders/my", get(my_orders))
        .route("/api/orders/guest", post(guest_order));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> ApiClient {
    let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
    ApiClient::new(&format!("http://{addr}/"), tokens).unwrap()
}

#[tokio::test]
async fn products_are_listed_with_expanded_image_urls() {
    let addr = spawn_stub().await;
    let client = client_for(addr);
    let base = format!("http://{addr}");

    let query = ProductQuery {
        category: Some("Gloves".into()),
        ..ProductQuery::default()
    };
    let page = client.list_products(&query).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.meta.and_then(|m| m.total), Some(1));
    assert_eq!(
        page.items[0].image_urls,
        vec![
            format!("{base}/api/products/images/abc.png"),
            "https://cdn.example.com/x.png".to_string(),
            format!("{base}/static/y.png"),
        ]
    );

    let query = ProductQuery {
        category: Some("Apparel".into()),
        ..ProductQuery::default()
    };
    assert!(client.list_products(&query).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn login_stores_token_and_401_clears_it() {
    let addr = spawn_stub().await;
    let client = client_for(addr);

    let err = client.me().await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    let bad = client.login("fighter@gymfog.dz", "wrong").await.unwrap_err();
    assert_eq!(bad.status(), Some(400));
    assert_eq!(client.tokens().get(), None);

    let login = client.login("fighter@gymfog.dz", "secret123").await.unwrap();
    assert_eq!(login.access_token, TOKEN);
    assert_eq!(client.tokens().get().as_deref(), Some(TOKEN));

    let user = client.me().await.unwrap();
    assert_eq!(user.email, "fighter@gymfog.dz");

    let err = client.my_orders().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(client.tokens().get(), None);
}

#[tokio::test]
async fn server_error_message_is_surfaced() {
    let addr = spawn_stub().await;
    let client = client_for(addr);

    let request = GuestOrderRequest {
        guest_name: "Yacine".into(),
        guest_phone: "0555123456".into(),
        guest_email: None,
        delivery_address: "Alger centre".into(),
        wilaya: "Alger".into(),
        items: vec![OrderItemRequest {
            product_id: Uuid::nil(),
            quantity: 9,
        }],
        delivery_type: DeliveryType::Delivery,
    };

    match client.create_guest_order(&request).await {
        Err(ClientError::Status { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("Insufficient stock"), "{message}");
        }
        other => panic!("expected a 400, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr);
    let err = client.list_categories().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "{err:?}");
}

#[test]
fn image_ids_expand_against_base_url() {
    let client = ApiClient::new(
        "https://api.gymfog.dz",
        TokenStore::new(Arc::new(MemoryStore::new())),
    )
    .unwrap();
    assert_eq!(
        client.image_url("7f3e.webp"),
        "https://api.gymfog.dz/api/products/images/7f3e.webp"
    );
    assert_eq!(client.image_url("http://x/y.png"), "http://x/y.png");
}
