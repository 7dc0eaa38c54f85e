use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dto::orders::OrderItemRequest,
    models::Product,
    storefront::store::{KeyValueStore, load_json, save_json},
};

pub const CART_KEY: &str = "gym_fog_cart";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: i32,
}

impl CartItem {
    pub fn line_total(&self) -> i64 {
        self.product.price_dzd * i64::from(self.quantity)
    }
}

/// Shopping cart, one line per product in the order they were added.
/// Every mutation is written through to the store.
pub struct Cart {
    items: Vec<CartItem>,
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for Cart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart").field("items", &self.items).finish()
    }
}

impl Cart {
    /// Restores the cart saved in `store`, or starts empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let items: Vec<CartItem> = load_json(store.as_ref(), CART_KEY).unwrap_or_default();
        let items = items.into_iter().filter(|item| item.quantity > 0).collect();
        Self { items, store }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_items(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn total_price(&self) -> i64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn quantity_of(&self, product_id: Uuid) -> i32 {
        self.items
            .iter()
            .find(|item| item.product.id == product_id)
            .map_or(0, |item| item.quantity)
    }

    /// Adds one unit of `product`.
    pub fn add(&mut self, product: &Product) {
        match self.items.iter_mut().find(|item| item.product.id == product.id) {
            Some(item) => item.quantity += 1,
            None => self.items.push(CartItem {
                product: product.clone(),
                quantity: 1,
            }),
        }
        self.persist();
    }

    pub fn remove(&mut self, product_id: Uuid) {
        let before = self.items.len();
        self.items.retain(|item| item.product.id != product_id);
        if self.items.len() != before {
            self.persist();
        }
    }

    /// A quantity of zero or less removes the line. Unknown products are
    /// ignored.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: i32) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.product.id == product_id) {
            item.quantity = quantity;
            self.persist();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// The `items` array of an order request.
    pub fn to_guest_items(&self) -> Vec<OrderItemRequest> {
        self.items
            .iter()
            .map(|item| OrderItemRequest {
                product_id: item.product.id,
                quantity: item.quantity,
            })
            .collect()
    }

    fn persist(&self) {
        save_json(self.store.as_ref(), CART_KEY, &self.items);
    }
}
