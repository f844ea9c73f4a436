use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    Booking, DateRange, LedgerEntry, Listing, ListingBlock, PayoutDestination, PayoutProfile,
};
use crate::error::AppResult;

/// Fields recorded when the payment provider confirms a charge.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub order_id: Option<String>,
    pub transaction_id: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub platform_fee: f64,
    pub host_amount: f64,
    pub auto_release_at: DateTime<Utc>,
}

/// Fields recorded when arrival is confirmed, explicitly or by timeout.
#[derive(Debug, Clone)]
pub struct ArrivalConfirmation {
    /// `None` when the auto-release watcher confirmed on the guest's behalf.
    pub confirmed_by: Option<Uuid>,
    pub confirmed_at: DateTime<Utc>,
}

/// Fields recorded when the provider accepts a transfer.
#[derive(Debug, Clone)]
pub struct PayoutCompletion {
    pub provider_reference: String,
    pub destination: PayoutDestination,
    pub platform_fee: f64,
    pub host_amount: f64,
    pub released_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Cancellation {
    pub by_guest: bool,
    pub cancelled_by: Uuid,
    pub cancelled_at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Persistence seam for the booking engine.
///
/// Single-booking state transitions are compare-and-swap: each `mark_*`
/// method applies its update only while the expected pre-state still holds
/// and returns `None` when another actor already performed the transition.
/// `insert_booking_checked` and `insert_block_checked` run the availability
/// overlap check and the insert as one serializable unit against the store.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_listing(&self, listing: &Listing) -> AppResult<()>;
    async fn get_listing(&self, listing_id: Uuid) -> AppResult<Option<Listing>>;

    /// Insert a booking unless its `[check_in, check_out)` range overlaps a
    /// blocking booking or host block for the listing. Overlap is
    /// `AppError::Conflict`; the check and the insert are atomic.
    async fn insert_booking_checked(&self, booking: &Booking) -> AppResult<()>;
    async fn get_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>>;

    /// All date ranges currently unavailable on the listing: blocking
    /// bookings plus host-imposed blocks.
    async fn blocked_ranges(&self, listing_id: Uuid) -> AppResult<Vec<DateRange>>;

    /// Insert a host block unless it overlaps an existing block or a
    /// blocking booking. Same atomicity discipline as bookings.
    async fn insert_block_checked(&self, block: &ListingBlock) -> AppResult<()>;

    /// `pending -> confirmed` (host acknowledgment).
    async fn mark_confirmed(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>>;

    /// `pending|confirmed -> awaiting_arrival_confirmation` with the payment
    /// sub-record completed and the payout split recorded.
    async fn mark_payment_completed(
        &self,
        booking_id: Uuid,
        confirmation: &PaymentConfirmation,
    ) -> AppResult<Option<Booking>>;

    /// `awaiting_arrival_confirmation -> in_progress` with payout
    /// `ready_for_release`.
    async fn mark_arrival_confirmed(
        &self,
        booking_id: Uuid,
        arrival: &ArrivalConfirmation,
    ) -> AppResult<Option<Booking>>;

    /// Payout `pending|ready_for_release|failed -> completed`, recording the
    /// provider reference and the destination snapshot. The `None` case is
    /// the duplicate-release guard: the payout was already completed or
    /// cancelled by another actor.
    async fn mark_payout_completed(
        &self,
        booking_id: Uuid,
        completion: &PayoutCompletion,
    ) -> AppResult<Option<Booking>>;

    /// Payout `pending|ready_for_release|failed -> failed` with the reason.
    async fn mark_payout_failed(
        &self,
        booking_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>>;

    /// Any non-terminal status -> `cancelled_by_guest|cancelled_by_host`.
    /// A payout that has not completed moves to `cancelled`.
    async fn mark_cancelled(
        &self,
        booking_id: Uuid,
        cancellation: &Cancellation,
    ) -> AppResult<Option<Booking>>;

    /// `awaiting_arrival_confirmation|in_progress -> refunded` (payout not
    /// completed): payment `refunded`, payout `cancelled`.
    async fn mark_refunded(
        &self,
        booking_id: Uuid,
        refunded_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>>;

    /// `in_progress -> completed` once the stay has ended.
    async fn mark_completed(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>>;

    /// Ledger entries are append-only; corrections are new entries.
    async fn append_transaction(&self, entry: &LedgerEntry) -> AppResult<()>;
    async fn transactions_for_booking(&self, booking_id: Uuid) -> AppResult<Vec<LedgerEntry>>;

    /// Bookings eligible for the auto-release sweep: payout still
    /// `pending|ready_for_release|failed`, deadline elapsed, status
    /// `awaiting_arrival_confirmation|in_progress`.
    async fn due_for_auto_release(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Booking>>;

    /// `in_progress` bookings whose check-out date has passed.
    async fn due_for_completion(&self, today: NaiveDate, limit: i64) -> AppResult<Vec<Booking>>;

    async fn upsert_payout_profile(&self, profile: &PayoutProfile) -> AppResult<()>;
    async fn payout_profile(&self, host_id: Uuid) -> AppResult<Option<PayoutProfile>>;
}
