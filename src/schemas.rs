use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::{PaymentMethod, PayoutDestination};
use crate::error::AppError;

pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::Validation(format!("Validation failed: {errors}")))
}

fn default_currency_usd() -> String {
    "USD".to_string()
}
fn default_min_nights() -> i64 {
    1
}
fn default_max_nights() -> i64 {
    30
}
fn default_max_guests() -> i16 {
    2
}
fn default_one_guest() -> i16 {
    1
}
fn default_card() -> PaymentMethod {
    PaymentMethod::Card
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateListingInput {
    pub host_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub nightly_rate: f64,
    #[serde(default = "default_currency_usd")]
    #[validate(length(min = 3, max = 3))]
    pub currency: String,
    #[serde(default)]
    pub cleaning_fee: f64,
    #[serde(default = "default_min_nights")]
    pub min_nights: i64,
    #[serde(default = "default_max_nights")]
    pub max_nights: i64,
    #[serde(default = "default_max_guests")]
    pub max_guests: i16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingInput {
    pub listing_id: Uuid,
    pub guest_id: Uuid,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[serde(default = "default_one_guest")]
    pub num_guests: i16,
    #[serde(default = "default_card")]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmBookingInput {
    pub host_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmArrivalInput {
    pub caller_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CancelBookingInput {
    pub caller_id: Uuid,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundBookingInput {
    pub caller_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BlockDatesInput {
    pub host_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPayoutProfileInput {
    pub destination: PayoutDestination,
}

/// Body of the payment provider's webhook, trusted only after the signature
/// header has been verified.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookPayload {
    pub booking_id: Uuid,
    pub payment_status: String,
    pub order_id: Option<String>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingPath {
    pub booking_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingPath {
    pub listing_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostPath {
    pub host_id: Uuid,
}
