use axum::Router;

use crate::state::AppState;

pub mod categories;
pub mod dashboard;
pub mod doc;
pub mod health;
pub mod materials;
pub mod orders;
pub mod params;
pub mod products;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/materials", materials::router())
        .nest("/dashboard", dashboard::router())
}
