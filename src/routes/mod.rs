use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub mod bookings;
pub mod health;
pub mod hosts;
pub mod listings;
pub mod webhooks;

pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(listings::router())
        .merge(hosts::router())
        .merge(bookings::router())
        .merge(webhooks::router())
}
