#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use lodgia_backend_rs::domain::{
    Booking, BookingStatus, CancellationRecord, DateRange, LedgerEntry, Listing, ListingBlock,
    PaymentStatus, PayoutDestination, PayoutProfile, PayoutStatus,
};
use lodgia_backend_rs::error::{AppError, AppResult};
use lodgia_backend_rs::repository::store::{
    ArrivalConfirmation, BookingStore, Cancellation, PaymentConfirmation, PayoutCompletion,
};
use lodgia_backend_rs::services::auto_release::AutoReleaseWatcher;
use lodgia_backend_rs::services::availability::ranges_overlap;
use lodgia_backend_rs::services::bookings::{BookingPolicy, BookingService};
use lodgia_backend_rs::services::clock::Clock;
use lodgia_backend_rs::services::notifications::{Notification, NotificationSender};
use lodgia_backend_rs::services::payout::PayoutEngine;
use lodgia_backend_rs::services::payout_provider::{
    PayoutProvider, TransferReceipt, TransferRequest,
};

/// In-memory store with the same check+insert atomicity and CAS-transition
/// semantics as the PostgreSQL implementation; one mutex plays the role of
/// the per-listing lock and row-level compare-and-swap.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    listings: HashMap<Uuid, Listing>,
    blocks: Vec<ListingBlock>,
    bookings: HashMap<Uuid, Booking>,
    transactions: Vec<LedgerEntry>,
    profiles: HashMap<Uuid, PayoutProfile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_listing(&self, listing: &Listing) -> AppResult<()> {
        self.lock().listings.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn get_listing(&self, listing_id: Uuid) -> AppResult<Option<Listing>> {
        Ok(self.lock().listings.get(&listing_id).cloned())
    }

    async fn insert_booking_checked(&self, booking: &Booking) -> AppResult<()> {
        let mut inner = self.lock();
        if !inner.listings.contains_key(&booking.listing_id) {
            return Err(AppError::NotFound("Listing not found.".to_string()));
        }
        let block_overlap = inner.blocks.iter().any(|block| {
            block.listing_id == booking.listing_id
                && ranges_overlap(
                    booking.check_in_date,
                    booking.check_out_date,
                    block.start_date,
                    block.end_date,
                )
        });
        if block_overlap {
            return Err(AppError::Conflict(
                "Selected dates are blocked by the host.".to_string(),
            ));
        }
        let booking_overlap = inner.bookings.values().any(|existing| {
            existing.listing_id == booking.listing_id
                && existing.status.is_blocking()
                && ranges_overlap(
                    booking.check_in_date,
                    booking.check_out_date,
                    existing.check_in_date,
                    existing.check_out_date,
                )
        });
        if booking_overlap {
            return Err(AppError::Conflict(
                "Selected dates overlap an existing booking.".to_string(),
            ));
        }
        inner.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.lock().bookings.get(&booking_id).cloned())
    }

    async fn blocked_ranges(&self, listing_id: Uuid) -> AppResult<Vec<DateRange>> {
        let inner = self.lock();
        let mut ranges: Vec<DateRange> = inner
            .bookings
            .values()
            .filter(|b| b.listing_id == listing_id && b.status.is_blocking())
            .map(|b| DateRange {
                start_date: b.check_in_date,
                end_date: b.check_out_date,
            })
            .chain(
                inner
                    .blocks
                    .iter()
                    .filter(|block| block.listing_id == listing_id)
                    .map(|block| DateRange {
                        start_date: block.start_date,
                        end_date: block.end_date,
                    }),
            )
            .collect();
        ranges.sort_by_key(|range| range.start_date);
        Ok(ranges)
    }

    async fn insert_block_checked(&self, block: &ListingBlock) -> AppResult<()> {
        let mut inner = self.lock();
        if !inner.listings.contains_key(&block.listing_id) {
            return Err(AppError::NotFound("Listing not found.".to_string()));
        }
        let booking_overlap = inner.bookings.values().any(|existing| {
            existing.listing_id == block.listing_id
                && existing.status.is_blocking()
                && ranges_overlap(
                    block.start_date,
                    block.end_date,
                    existing.check_in_date,
                    existing.check_out_date,
                )
        });
        if booking_overlap {
            return Err(AppError::Conflict(
                "Block overlaps an active booking.".to_string(),
            ));
        }
        let block_overlap = inner.blocks.iter().any(|existing| {
            existing.listing_id == block.listing_id
                && ranges_overlap(
                    block.start_date,
                    block.end_date,
                    existing.start_date,
                    existing.end_date,
                )
        });
        if block_overlap {
            return Err(AppError::Conflict(
                "Block overlaps an existing block.".to_string(),
            ));
        }
        inner.blocks.push(block.clone());
        Ok(())
    }

    async fn mark_confirmed(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let mut inner = self.lock();
        let Some(booking) = inner.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if booking.status != BookingStatus::Pending {
            return Ok(None);
        }
        booking.status = BookingStatus::Confirmed;
        booking.updated_at = now;
        Ok(Some(booking.clone()))
    }

    async fn mark_payment_completed(
        &self,
        booking_id: Uuid,
        confirmation: &PaymentConfirmation,
    ) -> AppResult<Option<Booking>> {
        let mut inner = self.lock();
        let Some(booking) = inner.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Ok(None);
        }
        booking.status = BookingStatus::AwaitingArrivalConfirmation;
        booking.payment.status = PaymentStatus::Completed;
        if confirmation.order_id.is_some() {
            booking.payment.order_id = confirmation.order_id.clone();
        }
        if confirmation.transaction_id.is_some() {
            booking.payment.transaction_id = confirmation.transaction_id.clone();
        }
        booking.payment.paid_at = Some(confirmation.paid_at);
        booking.payout.platform_fee = Some(confirmation.platform_fee);
        booking.payout.host_amount = Some(confirmation.host_amount);
        booking.payout.auto_release_at = Some(confirmation.auto_release_at);
        booking.updated_at = confirmation.paid_at;
        Ok(Some(booking.clone()))
    }

    async fn mark_arrival_confirmed(
        &self,
        booking_id: Uuid,
        arrival: &ArrivalConfirmation,
    ) -> AppResult<Option<Booking>> {
        let mut inner = self.lock();
        let Some(booking) = inner.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if booking.status != BookingStatus::AwaitingArrivalConfirmation {
            return Ok(None);
        }
        booking.status = BookingStatus::InProgress;
        match arrival.confirmed_by {
            Some(confirmer) => {
                booking.arrival.confirmed_by = Some(confirmer);
                booking.arrival.confirmed_at = Some(arrival.confirmed_at);
            }
            None => {
                booking.arrival.auto_confirmed_at = Some(arrival.confirmed_at);
            }
        }
        booking.payout.status = PayoutStatus::ReadyForRelease;
        booking.updated_at = arrival.confirmed_at;
        Ok(Some(booking.clone()))
    }

    async fn mark_payout_completed(
        &self,
        booking_id: Uuid,
        completion: &PayoutCompletion,
    ) -> AppResult<Option<Booking>> {
        let mut inner = self.lock();
        let Some(booking) = inner.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if !booking.payout.status.is_releasable() {
            return Ok(None);
        }
        booking.payout.status = PayoutStatus::Completed;
        booking.payout.provider_reference = Some(completion.provider_reference.clone());
        booking.payout.destination = Some(completion.destination.clone());
        booking.payout.platform_fee = Some(completion.platform_fee);
        booking.payout.host_amount = Some(completion.host_amount);
        booking.payout.released_at = Some(completion.released_at);
        booking.payout.failure_reason = None;
        booking.updated_at = completion.released_at;
        Ok(Some(booking.clone()))
    }

    async fn mark_payout_failed(
        &self,
        booking_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let mut inner = self.lock();
        let Some(booking) = inner.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if !booking.payout.status.is_releasable() {
            return Ok(None);
        }
        booking.payout.status = PayoutStatus::Failed;
        booking.payout.failure_reason = Some(reason.to_string());
        booking.updated_at = now;
        Ok(Some(booking.clone()))
    }

    async fn mark_cancelled(
        &self,
        booking_id: Uuid,
        cancellation: &Cancellation,
    ) -> AppResult<Option<Booking>> {
        let mut inner = self.lock();
        let Some(booking) = inner.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if booking.status.is_terminal() {
            return Ok(None);
        }
        booking.status = if cancellation.by_guest {
            BookingStatus::CancelledByGuest
        } else {
            BookingStatus::CancelledByHost
        };
        booking.cancellation = Some(CancellationRecord {
            cancelled_by: cancellation.cancelled_by,
            cancelled_at: cancellation.cancelled_at,
            reason: cancellation.reason.clone(),
        });
        if booking.payout.status != PayoutStatus::Completed {
            booking.payout.status = PayoutStatus::Cancelled;
        }
        booking.updated_at = cancellation.cancelled_at;
        Ok(Some(booking.clone()))
    }

    async fn mark_refunded(
        &self,
        booking_id: Uuid,
        _refunded_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let mut inner = self.lock();
        let Some(booking) = inner.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        let refundable = matches!(
            booking.status,
            BookingStatus::AwaitingArrivalConfirmation | BookingStatus::InProgress
        ) && booking.payout.status != PayoutStatus::Completed;
        if !refundable {
            return Ok(None);
        }
        booking.status = BookingStatus::Refunded;
        booking.payment.status = PaymentStatus::Refunded;
        booking.payout.status = PayoutStatus::Cancelled;
        booking.updated_at = now;
        Ok(Some(booking.clone()))
    }

    async fn mark_completed(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let mut inner = self.lock();
        let Some(booking) = inner.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if booking.status != BookingStatus::InProgress {
            return Ok(None);
        }
        booking.status = BookingStatus::Completed;
        booking.updated_at = now;
        Ok(Some(booking.clone()))
    }

    async fn append_transaction(&self, entry: &LedgerEntry) -> AppResult<()> {
        self.lock().transactions.push(entry.clone());
        Ok(())
    }

    async fn transactions_for_booking(&self, booking_id: Uuid) -> AppResult<Vec<LedgerEntry>> {
        Ok(self
            .lock()
            .transactions
            .iter()
            .filter(|entry| entry.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn due_for_auto_release(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Booking>> {
        let inner = self.lock();
        let mut due: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| {
                b.payout.status.is_releasable()
                    && b.payment.status == PaymentStatus::Completed
                    && matches!(
                        b.status,
                        BookingStatus::AwaitingArrivalConfirmation | BookingStatus::InProgress
                    )
                    && b.payout.auto_release_at.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();
        due.sort_by_key(|b| b.payout.auto_release_at);
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn due_for_completion(&self, today: NaiveDate, limit: i64) -> AppResult<Vec<Booking>> {
        let inner = self.lock();
        let mut ended: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::InProgress && b.check_out_date <= today)
            .cloned()
            .collect();
        ended.sort_by_key(|b| b.check_out_date);
        ended.truncate(limit.max(0) as usize);
        Ok(ended)
    }

    async fn upsert_payout_profile(&self, profile: &PayoutProfile) -> AppResult<()> {
        self.lock()
            .profiles
            .insert(profile.host_id, profile.clone());
        Ok(())
    }

    async fn payout_profile(&self, host_id: Uuid) -> AppResult<Option<PayoutProfile>> {
        Ok(self.lock().profiles.get(&host_id).cloned())
    }
}

/// Provider double: records every transfer request and can be told to fail
/// the next N calls.
#[derive(Default)]
pub struct MockPayoutProvider {
    calls: Mutex<Vec<TransferRequest>>,
    failures_remaining: Mutex<u32>,
}

impl MockPayoutProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, count: u32) {
        *self.failures_remaining.lock().expect("provider mutex") = count;
    }

    pub fn calls(&self) -> Vec<TransferRequest> {
        self.calls.lock().expect("provider mutex").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("provider mutex").len()
    }
}

#[async_trait]
impl PayoutProvider for MockPayoutProvider {
    async fn transfer(&self, request: &TransferRequest) -> AppResult<TransferReceipt> {
        self.calls
            .lock()
            .expect("provider mutex")
            .push(request.clone());
        let mut failures = self.failures_remaining.lock().expect("provider mutex");
        if *failures > 0 {
            *failures -= 1;
            return Err(AppError::PayoutProvider(
                "Payout provider request failed.".to_string(),
            ));
        }
        Ok(TransferReceipt {
            reference: Some(format!("prov_{}", request.reference)),
            status: "accepted".to_string(),
        })
    }
}

/// Controllable clock for deadline-driven tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex") = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex")
    }
}

pub struct SilentNotifier;

#[async_trait]
impl NotificationSender for SilentNotifier {
    async fn send(&self, _notification: Notification) {}
}

pub const PLATFORM_FEE_PERCENT: f64 = 7.0;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub provider: Arc<MockPayoutProvider>,
    pub clock: Arc<ManualClock>,
    pub service: Arc<BookingService>,
}

impl TestApp {
    pub fn watcher(&self, batch_size: i64) -> AutoReleaseWatcher {
        AutoReleaseWatcher::new(
            self.store.clone(),
            self.service.clone(),
            self.clock.clone(),
            std::time::Duration::from_secs(900),
            batch_size,
        )
    }
}

/// Engine wired against the in-memory doubles. Fees match the defaults:
/// 7% platform, 10% service, 18% taxes, 24h auto-release.
pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MockPayoutProvider::new());
    let clock = Arc::new(ManualClock::starting_at(
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap(),
    ));

    let payout = Arc::new(PayoutEngine::new(
        store.clone() as Arc<dyn BookingStore>,
        provider.clone() as Arc<dyn PayoutProvider>,
        clock.clone() as Arc<dyn Clock>,
        PLATFORM_FEE_PERCENT,
    ));
    let service = Arc::new(BookingService::new(
        store.clone() as Arc<dyn BookingStore>,
        payout,
        Arc::new(SilentNotifier),
        clock.clone() as Arc<dyn Clock>,
        BookingPolicy {
            platform_fee_percent: PLATFORM_FEE_PERCENT,
            service_fee_percent: 10.0,
            tax_percent: 18.0,
            auto_release_hours: 24,
        },
    ));

    TestApp {
        store,
        provider,
        clock,
        service,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Listing matching the worked pricing example: two nights at 500 plus a 10
/// cleaning fee totals 1290 with the default fee percentages.
pub async fn seed_listing(app: &TestApp) -> Listing {
    let listing = Listing {
        id: Uuid::new_v4(),
        host_id: Uuid::new_v4(),
        title: "Casa del Sol".to_string(),
        nightly_rate: 500.0,
        currency: "USD".to_string(),
        cleaning_fee: 10.0,
        min_nights: 1,
        max_nights: 30,
        max_guests: 4,
        is_active: true,
        created_at: app.clock.now(),
    };
    app.service
        .create_listing(listing.clone())
        .await
        .expect("listing inserted");
    listing
}

pub async fn seed_payout_profile(app: &TestApp, host_id: Uuid) {
    app.store
        .upsert_payout_profile(&PayoutProfile {
            host_id,
            destination: PayoutDestination::BankAccount {
                account_name: "Ana Duarte".to_string(),
                account_number: "0012345678".to_string(),
                bank_name: "Banco Continental".to_string(),
            },
            updated_at: app.clock.now(),
        })
        .await
        .expect("profile stored");
}
