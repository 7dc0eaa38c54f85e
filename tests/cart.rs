use std::sync::Arc;

use chrono::Utc;
use gymfog_shop::{
    models::Product,
    storefront::{
        Cart, Favorites, FileStore, KeyValueStore, MemoryStore,
        cart::CART_KEY,
        favorites::FAVORITES_KEY,
    },
};
use uuid::Uuid;

fn product(title: &str, price_dzd: i64) -> Product {
    Product {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        image_urls: vec![format!("{}.png", Uuid::new_v4())],
        category: "Gloves".into(),
        price_dzd,
        stock_quantity: 10,
        brand: Some("Venum".into()),
        sizes: vec!["M".into()],
        colors: Vec::new(),
        weight: None,
        created_at: Utc::now(),
    }
}

fn memory() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

#[test]
fn repeated_add_counts_each_add() {
    let mut cart = Cart::load(memory());
    let gloves = product("Gloves", 1000);
    for _ in 0..4 {
        cart.add(&gloves);
    }
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.quantity_of(gloves.id), 4);
}

#[test]
fn checkout_scenario_totals() {
    let mut cart = Cart::load(memory());
    let p1 = product("P1", 1000);
    let p2 = product("P2", 500);

    cart.add(&p1);
    cart.add(&p1);
    cart.add(&p2);
    assert_eq!(cart.total_items(), 3);
    assert_eq!(cart.total_price(), 2500);

    cart.remove(p1.id);
    assert_eq!(cart.total_items(), 1);
    assert_eq!(cart.total_price(), 500);
    assert_eq!(cart.quantity_of(p1.id), 0);
    assert_eq!(cart.quantity_of(p2.id), 1);
}

#[test]
fn remove_leaves_other_lines_in_order() {
    let mut cart = Cart::load(memory());
    let a = product("A", 100);
    let b = product("B", 200);
    let c = product("C", 300);
    cart.add(&a);
    cart.add(&b);
    cart.add(&c);

    cart.remove(b.id);
    let ids: Vec<Uuid> = cart.items().iter().map(|i| i.product.id).collect();
    assert_eq!(ids, vec![a.id, c.id]);

    cart.remove(Uuid::new_v4());
    assert_eq!(cart.items().len(), 2);
}

#[test]
fn set_quantity_zero_or_negative_removes_line() {
    let mut cart = Cart::load(memory());
    let a = product("A", 100);
    let b = product("B", 200);
    cart.add(&a);
    cart.add(&b);

    cart.set_quantity(a.id, 5);
    assert_eq!(cart.quantity_of(a.id), 5);
    assert_eq!(cart.total_price(), 700);

    cart.set_quantity(a.id, 0);
    assert_eq!(cart.quantity_of(a.id), 0);
    cart.set_quantity(b.id, -2);
    assert!(cart.is_empty());
    assert_eq!(cart.total_items(), 0);
    assert_eq!(cart.total_price(), 0);
}

#[test]
fn set_quantity_on_unknown_product_is_ignored() {
    let mut cart = Cart::load(memory());
    cart.set_quantity(Uuid::new_v4(), 3);
    assert!(cart.is_empty());
}

#[test]
fn cart_survives_reload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()));

    let mut cart = Cart::load(store.clone());
    let a = product("A", 1500);
    let b = product("B", 250);
    cart.add(&a);
    cart.add(&b);
    cart.add(&b);
    cart.set_quantity(a.id, 3);

    let reloaded = Cart::load(Arc::new(FileStore::new(dir.path())));
    assert_eq!(reloaded.items(), cart.items());
    assert_eq!(reloaded.total_price(), cart.total_price());
    assert_eq!(reloaded.total_items(), 5);
}

#[test]
fn corrupt_cart_storage_starts_empty() {
    let store = memory();
    store.set(CART_KEY, "[{\"product\": 12").unwrap();
    let cart = Cart::load(store);
    assert!(cart.is_empty());
}

#[test]
fn clear_empties_persisted_cart() {
    let store = memory();
    let mut cart = Cart::load(store.clone());
    cart.add(&product("A", 100));
    cart.clear();
    assert!(Cart::load(store).is_empty());
}

#[test]
fn guest_items_follow_cart_lines() {
    let mut cart = Cart::load(memory());
    let a = product("A", 100);
    let b = product("B", 200);
    cart.add(&a);
    cart.add(&b);
    cart.add(&a);

    let items = cart.to_guest_items();
    assert_eq!(items.len(), 2);
    assert_eq!((items[0].product_id, items[0].quantity), (a.id, 2));
    assert_eq!((items[1].product_id, items[1].quantity), (b.id, 1));
}

#[test]
fn favorites_add_is_idempotent_and_toggle_flips() {
    let mut favorites = Favorites::load(memory());
    let a = product("A", 100);
    let b = product("B", 200);

    assert!(favorites.add(&a));
    assert!(!favorites.add(&a));
    assert_eq!(favorites.len(), 1);

    assert!(favorites.toggle(&b));
    assert!(favorites.contains(b.id));
    assert!(!favorites.toggle(&b));
    assert!(!favorites.contains(b.id));

    assert!(favorites.remove(a.id));
    assert!(!favorites.remove(a.id));
    assert!(favorites.is_empty());
}

#[test]
fn favorites_persist_in_insertion_order() {
    let store = memory();
    let mut favorites = Favorites::load(store.clone());
    let a = product("A", 100);
    let b = product("B", 200);
    favorites.add(&b);
    favorites.add(&a);

    let reloaded = Favorites::load(store.clone());
    assert_eq!(reloaded.items(), favorites.items());
    assert_eq!(reloaded.items()[0].id, b.id);

    store.set(FAVORITES_KEY, "nonsense").unwrap();
    assert!(Favorites::load(store).is_empty());
}
