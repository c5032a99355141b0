use std::sync::Arc;

use axum::Router;

use crate::store::Store;

mod health;
mod parking;

// ---

pub fn router(store: Arc<dyn Store>) -> Router {
    // ---
    Router::new()
        .merge(parking::router())
        .merge(health::router())
        .with_state(store)
}
