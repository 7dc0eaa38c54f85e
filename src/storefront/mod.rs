//! Client-side pieces of the shop front: the REST client, cart and
//! favorites containers, catalog filtering, checkout validation and the
//! interface language. State that the browser would keep in local storage
//! goes through [`store::KeyValueStore`].

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod client;
pub mod favorites;
pub mod i18n;
pub mod store;

pub use cart::{Cart, CartItem};
pub use client::{ApiClient, ClientError, TokenStore};
pub use favorites::Favorites;
pub use store::{FileStore, KeyValueStore, MemoryStore};
