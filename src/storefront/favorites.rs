use std::{fmt, sync::Arc};

use uuid::Uuid;

use crate::{
    models::Product,
    storefront::store::{KeyValueStore, load_json, save_json},
};

pub const FAVORITES_KEY: &str = "gymfog_favorites";

/// Favorite products, unique by id, in the order they were added.
pub struct Favorites {
    items: Vec<Product>,
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for Favorites {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Favorites").field("items", &self.items).finish()
    }
}

impl Favorites {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let stored: Vec<Product> = load_json(store.as_ref(), FAVORITES_KEY).unwrap_or_default();
        let mut items: Vec<Product> = Vec::with_capacity(stored.len());
        for product in stored {
            if !items.iter().any(|p| p.id == product.id) {
                items.push(product);
            }
        }
        Self { items, store }
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, product_id: Uuid) -> bool {
        self.items.iter().any(|p| p.id == product_id)
    }

    /// Returns `false` when the product was already a favorite.
    pub fn add(&mut self, product: &Product) -> bool {
        if self.contains(product.id) {
            return false;
        }
        self.items.push(product.clone());
        self.persist();
        true
    }

    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|p| p.id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Returns whether the product is a favorite afterwards.
    pub fn toggle(&mut self, product: &Product) -> bool {
        if self.remove(product.id) {
            false
        } else {
            self.add(product)
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    fn persist(&self) {
        save_json(self.store.as_ref(), FAVORITES_KEY, &self.items);
    }
}
