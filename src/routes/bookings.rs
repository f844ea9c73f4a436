use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::domain::Booking;
use crate::error::AppResult;
use crate::schemas::{
    validate_input, BookingPath, CancelBookingInput, ConfirmArrivalInput, ConfirmBookingInput,
    CreateBookingInput, RefundBookingInput,
};
use crate::services::bookings::CreateBookingRequest;
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/bookings", axum::routing::post(create_booking))
        .route("/bookings/{booking_id}", axum::routing::get(get_booking))
        .route(
            "/bookings/{booking_id}/confirm",
            axum::routing::post(confirm_booking),
        )
        .route(
            "/bookings/{booking_id}/arrival",
            axum::routing::post(confirm_arrival),
        )
        .route(
            "/bookings/{booking_id}/cancel",
            axum::routing::post(cancel_booking),
        )
        .route(
            "/bookings/{booking_id}/refund",
            axum::routing::post(refund_booking),
        )
        .route(
            "/bookings/{booking_id}/payout/retry",
            axum::routing::post(retry_payout),
        )
        .route(
            "/bookings/{booking_id}/transactions",
            axum::routing::get(list_transactions),
        )
}

async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingInput>,
) -> AppResult<impl IntoResponse> {
    let bookings = state.bookings()?;
    let created = bookings
        .create_booking(CreateBookingRequest {
            listing_id: payload.listing_id,
            guest_id: payload.guest_id,
            check_in_date: payload.check_in_date,
            check_out_date: payload.check_out_date,
            num_guests: payload.num_guests,
            payment_method: payload.payment_method,
        })
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(created)))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
) -> AppResult<Json<Booking>> {
    let bookings = state.bookings()?;
    Ok(Json(bookings.get_booking(path.booking_id).await?))
}

async fn confirm_booking(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    Json(payload): Json<ConfirmBookingInput>,
) -> AppResult<Json<Booking>> {
    let bookings = state.bookings()?;
    Ok(Json(
        bookings
            .confirm_booking(path.booking_id, payload.host_id)
            .await?,
    ))
}

/// Guest- or admin-initiated arrival confirmation. A payout failure is a
/// partial success: arrival is confirmed and the reason is attached, so a
/// provider outage never blocks the guest-facing action.
async fn confirm_arrival(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    Json(payload): Json<ConfirmArrivalInput>,
) -> AppResult<Json<Value>> {
    let bookings = state.bookings()?;
    let outcome = bookings
        .confirm_arrival(path.booking_id, Some(payload.caller_id))
        .await?;
    Ok(Json(json!({
        "booking": outcome.booking,
        "arrival_confirmed": true,
        "payout_released": outcome.payout_released,
        "payout_error": outcome.payout_error,
    })))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    Json(payload): Json<CancelBookingInput>,
) -> AppResult<Json<Booking>> {
    validate_input(&payload)?;
    let bookings = state.bookings()?;
    Ok(Json(
        bookings
            .cancel_booking(path.booking_id, payload.caller_id, payload.reason)
            .await?,
    ))
}

async fn refund_booking(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    Json(payload): Json<RefundBookingInput>,
) -> AppResult<Json<Booking>> {
    let bookings = state.bookings()?;
    Ok(Json(
        bookings
            .refund_booking(path.booking_id, payload.caller_id)
            .await?,
    ))
}

async fn retry_payout(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
) -> AppResult<Json<Booking>> {
    let bookings = state.bookings()?;
    Ok(Json(bookings.retry_payout(path.booking_id).await?))
}

async fn list_transactions(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
) -> AppResult<Json<Value>> {
    let bookings = state.bookings()?;
    let entries = bookings.transactions(path.booking_id).await?;
    Ok(Json(json!({ "data": entries })))
}
