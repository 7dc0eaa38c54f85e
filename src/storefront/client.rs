//! Typed wrapper around the shop REST API.

use std::{sync::Arc, time::Duration};

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        orders::{DeliveryStatus, GuestOrderRequest},
    },
    lifecycle::OrderAction,
    models::{Category, Order, OrderStatus, Product, User},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    storefront::store::KeyValueStore,
};

pub const TOKEN_KEY: &str = "access_token";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Bearer token kept in the client store under `access_token`.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn get(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read access token");
                None
            }
        }
    }

    pub fn set(&self, token: &str) {
        if let Err(err) = self.store.set(TOKEN_KEY, token) {
            tracing::warn!(error = %err, "failed to persist access token");
        }
    }

    pub fn clear(&self) {
        if let Err(err) = self.store.remove(TOKEN_KEY) {
            tracing::warn!(error = %err, "failed to clear access token");
        }
    }
}

/// One page of a listing with the server's paging meta.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: Option<Meta>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: TokenStore) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Absolute URL for a stored image id. Absolute URLs pass through and
    /// rooted paths are resolved against the base URL.
    pub fn image_url(&self, image: &str) -> String {
        if image.starts_with("http://") || image.starts_with("https://") || image.starts_with("data:")
        {
            image.to_string()
        } else if image.starts_with('/') {
            format!("{}{}", self.base_url, image)
        } else {
            format!("{}/api/products/images/{}", self.base_url, image)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.tokens.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiResponse<T>, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::info!("session rejected, clearing access token");
            self.tokens.clear();
        }

        if !status.is_success() {
            let message = response
                .json::<ApiResponse<serde_json::Value>>()
                .await
                .ok()
                .map(|body| body.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ApiResponse<T>>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        self.send(builder)
            .await?
            .data
            .ok_or_else(|| ClientError::Decode("response carried no data".into()))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    fn expand_images(&self, mut product: Product) -> Product {
        product.image_urls = product
            .image_urls
            .iter()
            .map(|image| self.image_url(image))
            .collect();
        product
    }

    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ClientError> {
        let resp: ApiResponse<Vec<Product>> = self
            .send(self.request(Method::GET, "/api/products").query(query))
            .await?;
        Ok(Page {
            items: resp
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|p| self.expand_images(p))
                .collect(),
            meta: resp.meta,
        })
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, ClientError> {
        let product = self
            .data(self.request(Method::GET, &format!("/api/products/{id}")))
            .await?;
        Ok(self.expand_images(product))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        self.data(self.request(Method::GET, "/api/categories")).await
    }

    pub async fn create_guest_order(&self, order: &GuestOrderRequest) -> Result<Order, ClientError> {
        self.post_json("/api/orders/guest", order)
            .await?
            .data
            .ok_or_else(|| ClientError::Decode("response carried no data".into()))
    }

    /// Signs in and keeps the returned token for later requests.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let login: LoginResponse = self
            .post_json("/api/users/login", &body)
            .await?
            .data
            .ok_or_else(|| ClientError::Decode("response carried no data".into()))?;
        self.tokens.set(&login.access_token);
        Ok(login)
    }

    pub fn logout(&self) {
        self.tokens.clear();
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ClientError> {
        self.post_json("/api/users/register", request)
            .await?
            .data
            .ok_or_else(|| ClientError::Decode("response carried no data".into()))
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        self.data(self.request(Method::GET, "/api/users/me")).await
    }

    pub async fn my_orders(&self) -> Result<Vec<Order>, ClientError> {
        self.data(self.request(Method::GET, "/api/orders/my")).await
    }

    pub async fn delivery_status(&self, id: Uuid) -> Result<DeliveryStatus, ClientError> {
        self.data(self.request(Method::GET, &format!("/api/orders/{id}/delivery-status")))
            .await
    }

    pub async fn admin_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ClientError> {
        let mut builder = self.request(Method::GET, "/api/orders/admin");
        if let Some(status) = status {
            builder = builder.query(&[("status", status.as_str())]);
        }
        self.data(builder).await
    }

    /// Applies an admin action and returns the updated order with the
    /// server's message, which reports courier hand-off problems.
    pub async fn order_action(
        &self,
        id: Uuid,
        action: OrderAction,
    ) -> Result<(Order, String), ClientError> {
        let path = format!("/api/orders/admin/{id}/{}", action.as_str());
        let resp: ApiResponse<Order> = self.send(self.request(Method::PATCH, &path)).await?;
        let order = resp
            .data
            .ok_or_else(|| ClientError::Decode("response carried no data".into()))?;
        Ok((order, resp.message))
    }
}
