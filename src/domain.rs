use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Lifecycle status of a booking.
///
/// `pending` and `confirmed` are pre-payment; `awaiting_arrival_confirmation`
/// means the platform is holding funds; `in_progress` means arrival was
/// confirmed and payout has been requested. Terminal statuses free the
/// listing's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    AwaitingArrivalConfirmation,
    InProgress,
    Completed,
    CancelledByGuest,
    CancelledByHost,
    Refunded,
}

impl BookingStatus {
    /// Statuses that reserve the listing's calendar against new bookings.
    pub const BLOCKING: &'static [BookingStatus] = &[
        Self::Pending,
        Self::Confirmed,
        Self::AwaitingArrivalConfirmation,
        Self::InProgress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::AwaitingArrivalConfirmation => "awaiting_arrival_confirmation",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::CancelledByGuest => "cancelled_by_guest",
            Self::CancelledByHost => "cancelled_by_host",
            Self::Refunded => "refunded",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "awaiting_arrival_confirmation" => Some(Self::AwaitingArrivalConfirmation),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled_by_guest" => Some(Self::CancelledByGuest),
            "cancelled_by_host" => Some(Self::CancelledByHost),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    pub fn is_blocking(self) -> bool {
        Self::BLOCKING.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CancelledByGuest | Self::CancelledByHost | Self::Refunded
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    ReadyForRelease,
    Completed,
    Failed,
    Cancelled,
}

impl PayoutStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ReadyForRelease => "ready_for_release",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "ready_for_release" => Some(Self::ReadyForRelease),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Statuses from which a release attempt may still proceed.
    pub fn is_releasable(self) -> bool {
        matches!(self, Self::Pending | Self::ReadyForRelease | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Booking,
    Refund,
    Payout,
    CancellationFee,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Refund => "refund",
            Self::Payout => "payout",
            Self::CancellationFee => "cancellation_fee",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "booking" => Some(Self::Booking),
            "refund" => Some(Self::Refund),
            "payout" => Some(Self::Payout),
            "cancellation_fee" => Some(Self::CancellationFee),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    MobileMoney,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::MobileMoney => "mobile_money",
            Self::BankTransfer => "bank_transfer",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "card" => Some(Self::Card),
            "mobile_money" => Some(Self::MobileMoney),
            "bank_transfer" => Some(Self::BankTransfer),
            _ => None,
        }
    }
}

/// Where a host's money goes. Snapshotted onto the booking at release time so
/// later profile edits never alter a completed payout record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PayoutDestination {
    BankAccount {
        account_name: String,
        account_number: String,
        bank_name: String,
    },
    MobileMoney {
        phone_e164: String,
        provider: String,
    },
}

impl PayoutDestination {
    /// Exhaustive per-variant completeness check. Incomplete data fails fast
    /// with a host-facing message and leaves payout state untouched.
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            Self::BankAccount {
                account_name,
                account_number,
                bank_name,
            } => {
                for (field, value) in [
                    ("account_name", account_name),
                    ("account_number", account_number),
                    ("bank_name", bank_name),
                ] {
                    if value.trim().is_empty() {
                        return Err(AppError::PayoutConfig(format!(
                            "Payout profile is missing bank account field '{field}'. Complete your payout setup."
                        )));
                    }
                }
                Ok(())
            }
            Self::MobileMoney { phone_e164, provider } => {
                if phone_e164.trim().is_empty() {
                    return Err(AppError::PayoutConfig(
                        "Payout profile is missing the mobile money phone number. Complete your payout setup.".to_string(),
                    ));
                }
                if provider.trim().is_empty() {
                    return Err(AppError::PayoutConfig(
                        "Payout profile is missing the mobile money provider. Complete your payout setup.".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Pricing captured when the booking is created. Authoritative for every later
/// computation; never recomputed from the live listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub nightly_rate: f64,
    pub nights: i64,
    pub subtotal: f64,
    pub cleaning_fee: f64,
    pub service_fee: f64,
    pub taxes: f64,
    pub total: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub order_id: Option<String>,
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalRecord {
    pub confirmation_required: bool,
    pub confirmed_by: Option<Uuid>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub auto_confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub status: PayoutStatus,
    pub platform_fee: Option<f64>,
    pub host_amount: Option<f64>,
    pub currency: String,
    pub destination: Option<PayoutDestination>,
    pub auto_release_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub provider_reference: Option<String>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub cancelled_by: Uuid,
    pub cancelled_at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub num_guests: i16,
    pub status: BookingStatus,
    pub pricing: PricingSnapshot,
    pub payment: PaymentRecord,
    pub arrival: ArrivalRecord,
    pub payout: PayoutRecord,
    pub cancellation: Option<CancellationRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_paid(&self) -> bool {
        self.payment.status == PaymentStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub nightly_rate: f64,
    pub currency: String,
    pub cleaning_fee: f64,
    pub min_nights: i64,
    pub max_nights: i64,
    pub max_guests: i16,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A host-imposed calendar block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingBlock {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A half-open `[start, end)` date range on a listing's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Append-only record of a single money movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub tx_type: TransactionType,
    pub amount: f64,
    pub platform_fee: f64,
    pub host_payout: f64,
    pub currency: String,
    pub status: String,
    pub provider_reference: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A host's stored payout destination, editable via the profile endpoints.
/// The engine snapshots it onto the booking at release time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutProfile {
    pub host_id: Uuid,
    pub destination: PayoutDestination,
    pub updated_at: DateTime<Utc>,
}
