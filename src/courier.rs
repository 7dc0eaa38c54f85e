//! Parcel hand-off to the delivery company once an order is ready.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::{config::CourierConfig, models::Order, wilaya};

/// What the courier needs to pick up and deliver one order.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    pub tracking: String,
    pub client_name: String,
    pub phone: String,
    pub alt_phone: Option<String>,
    pub address: String,
    pub wilaya_code: Option<u8>,
    pub total_dzd: i64,
    pub note: String,
    pub external_id: String,
}

impl Parcel {
    pub fn for_order(order: &Order) -> Self {
        let client = order.client.as_ref();
        let phone = order
            .delivery_phone
            .clone()
            .or_else(|| client.and_then(|c| c.phone.clone()))
            .unwrap_or_default();

        Parcel {
            tracking: format!("ORDER_{}_{}", order.id, Utc::now().format("%Y%m%d%H%M")),
            client_name: client
                .and_then(|c| c.full_name.clone())
                .unwrap_or_else(|| "Client".to_string()),
            phone,
            alt_phone: client.and_then(|c| c.phone.clone()),
            address: order
                .delivery_address
                .clone()
                .unwrap_or_else(|| "Address not provided".to_string()),
            wilaya_code: order.wilaya.as_deref().and_then(wilaya::code_of),
            total_dzd: order.total_dzd(),
            note: format!("GYM FOG order #{}", order.id),
            external_id: order.id.to_string(),
        }
    }
}

#[async_trait]
pub trait Courier: Send + Sync {
    /// Registers the parcel and returns the tracking id.
    async fn create_parcel(&self, parcel: &Parcel) -> Result<String>;

    /// Current tracking record of a parcel, as reported by the courier.
    async fn parcel_status(&self, tracking_id: &str) -> Result<serde_json::Value>;
}

/// Client for the ZR Express `add_colis` and `lire` APIs.
pub struct ZrExpressCourier {
    client: reqwest::Client,
    base_url: String,
    token: String,
    key: String,
}

#[derive(Serialize)]
struct AddColisRequest<'a> {
    #[serde(rename = "Colis")]
    colis: [Colis<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Colis<'a> {
    tracking: &'a str,
    type_livraison: &'static str,
    type_colis: &'static str,
    confirmee: &'static str,
    client: &'a str,
    #[serde(rename = "MobileA")]
    mobile_a: &'a str,
    #[serde(rename = "MobileB")]
    mobile_b: &'a str,
    adresse: &'a str,
    #[serde(rename = "IDWilaya")]
    id_wilaya: String,
    commune: &'a str,
    total: String,
    note: &'a str,
    #[serde(rename = "TProduit")]
    t_produit: &'static str,
    #[serde(rename = "id_Externe")]
    id_externe: &'a str,
    source: &'static str,
}

#[derive(Serialize)]
struct LireRequest<'a> {
    #[serde(rename = "Colis")]
    colis: [TrackingRef<'a>; 1],
}

#[derive(Serialize)]
struct TrackingRef<'a> {
    #[serde(rename = "Tracking")]
    tracking: &'a str,
}

impl ZrExpressCourier {
    pub fn new(config: &CourierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            key: config.key.clone(),
        })
    }
}

#[async_trait]
impl Courier for ZrExpressCourier {
    async fn create_parcel(&self, parcel: &Parcel) -> Result<String> {
        let body = AddColisRequest {
            colis: [Colis {
                tracking: &parcel.tracking,
                type_livraison: "0",
                type_colis: "0",
                confirmee: "",
                client: &parcel.client_name,
                mobile_a: &parcel.phone,
                mobile_b: parcel.alt_phone.as_deref().unwrap_or(""),
                adresse: &parcel.address,
                id_wilaya: parcel
                    .wilaya_code
                    .map(|code| code.to_string())
                    .unwrap_or_default(),
                commune: "",
                total: parcel.total_dzd.to_string(),
                note: &parcel.note,
                t_produit: "Combat sports gear",
                id_externe: &parcel.external_id,
                source: "",
            }],
        };

        let response = self
            .client
            .post(format!("{}/add_colis", self.base_url))
            .header("token", &self.token)
            .header("key", &self.key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, body = %text, "courier rejected parcel");
            return Err(anyhow!("courier returned {status}"));
        }

        info!(tracking = %parcel.tracking, "parcel registered with courier");
        Ok(parcel.tracking.clone())
    }

    async fn parcel_status(&self, tracking_id: &str) -> Result<serde_json::Value> {
        let body = LireRequest {
            colis: [TrackingRef {
                tracking: tracking_id,
            }],
        };

        let response = self
            .client
            .post(format!("{}/lire", self.base_url))
            .header("token", &self.token)
            .header("key", &self.key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, tracking = %tracking_id, body = %text, "courier status lookup failed");
            return Err(anyhow!("courier returned {status}"));
        }

        Ok(response.json().await?)
    }
}
