use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::domain::PayoutProfile;
use crate::error::{AppError, AppResult};
use crate::schemas::{HostPath, UpsertPayoutProfileInput};
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/hosts/{host_id}/payout-profile",
        axum::routing::get(get_payout_profile).put(upsert_payout_profile),
    )
}

async fn get_payout_profile(
    State(state): State<AppState>,
    Path(path): Path<HostPath>,
) -> AppResult<Json<PayoutProfile>> {
    let bookings = state.bookings()?;
    bookings
        .store()
        .payout_profile(path.host_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Host has no payout profile.".to_string()))
}

/// Destinations are validated exhaustively before they are stored so a payout
/// never discovers an incomplete profile the host could have fixed earlier.
async fn upsert_payout_profile(
    State(state): State<AppState>,
    Path(path): Path<HostPath>,
    Json(payload): Json<UpsertPayoutProfileInput>,
) -> AppResult<Json<Value>> {
    payload.destination.validate()?;
    let bookings = state.bookings()?;

    let profile = PayoutProfile {
        host_id: path.host_id,
        destination: payload.destination,
        updated_at: Utc::now(),
    };
    bookings.store().upsert_payout_profile(&profile).await?;
    Ok(Json(json!({ "data": profile })))
}
