use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::{DateRange, Listing};
use crate::error::AppResult;
use crate::schemas::{validate_input, BlockDatesInput, CreateListingInput, ListingPath};
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/listings", axum::routing::post(create_listing))
        .route("/listings/{listing_id}", axum::routing::get(get_listing))
        .route(
            "/listings/{listing_id}/blocked-ranges",
            axum::routing::get(get_blocked_ranges),
        )
        .route(
            "/listings/{listing_id}/blocks",
            axum::routing::post(block_dates),
        )
}

async fn create_listing(
    State(state): State<AppState>,
    Json(payload): Json<CreateListingInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let bookings = state.bookings()?;

    let listing = Listing {
        id: Uuid::new_v4(),
        host_id: payload.host_id,
        title: payload.title,
        nightly_rate: payload.nightly_rate,
        currency: payload.currency.to_uppercase(),
        cleaning_fee: payload.cleaning_fee,
        min_nights: payload.min_nights,
        max_nights: payload.max_nights,
        max_guests: payload.max_guests,
        is_active: true,
        created_at: Utc::now(),
    };
    let created = bookings.create_listing(listing).await?;
    Ok((axum::http::StatusCode::CREATED, Json(created)))
}

async fn get_listing(
    State(state): State<AppState>,
    Path(path): Path<ListingPath>,
) -> AppResult<Json<Listing>> {
    let bookings = state.bookings()?;
    Ok(Json(bookings.get_listing(path.listing_id).await?))
}

/// Blocking bookings plus host blocks, as the public calendar sees them.
async fn get_blocked_ranges(
    State(state): State<AppState>,
    Path(path): Path<ListingPath>,
) -> AppResult<Json<Value>> {
    let bookings = state.bookings()?;
    let ranges = bookings.blocked_ranges(path.listing_id).await?;
    Ok(Json(json!({ "data": ranges })))
}

async fn block_dates(
    State(state): State<AppState>,
    Path(path): Path<ListingPath>,
    Json(payload): Json<BlockDatesInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let bookings = state.bookings()?;

    let block = bookings
        .block_dates(
            path.listing_id,
            payload.host_id,
            DateRange {
                start_date: payload.start_date,
                end_date: payload.end_date,
            },
            payload.reason,
        )
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(block)))
}
