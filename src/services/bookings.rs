use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::{
    ArrivalRecord, Booking, BookingStatus, DateRange, LedgerEntry, Listing, ListingBlock,
    PaymentMethod, PaymentRecord, PaymentStatus, PayoutRecord, PayoutStatus,
};
use crate::error::{AppError, AppResult};
use crate::repository::store::{
    ArrivalConfirmation, BookingStore, Cancellation, PaymentConfirmation,
};
use crate::services::availability::nights_between;
use crate::services::clock::Clock;
use crate::services::ledger;
use crate::services::notifications::{Notification, NotificationSender};
use crate::services::payout::{PayoutEngine, ReleaseReason};
use crate::services::pricing::{build_snapshot, compute_split};

/// Fee and deadline knobs, captured from configuration at startup.
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    pub platform_fee_percent: f64,
    pub service_fee_percent: f64,
    pub tax_percent: f64,
    pub auto_release_hours: i64,
}

impl BookingPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            platform_fee_percent: config.platform_fee_percent,
            service_fee_percent: config.service_fee_percent,
            tax_percent: config.tax_percent,
            auto_release_hours: config.auto_release_hours,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub listing_id: Uuid,
    pub guest_id: Uuid,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub num_guests: i16,
    pub payment_method: PaymentMethod,
}

/// Payment-provider webhook fields after signature verification.
#[derive(Debug, Clone)]
pub struct PaymentNotice {
    pub booking_id: Uuid,
    pub order_id: Option<String>,
    pub transaction_id: Option<String>,
}

/// Result of arrival confirmation. Payout release is decoupled from the
/// guest-facing action: a provider outage yields `payout_released: false`
/// with the reason attached, never an error for the guest.
#[derive(Debug, Clone)]
pub struct ArrivalOutcome {
    pub booking: Booking,
    pub payout_released: bool,
    pub payout_error: Option<String>,
}

/// Owns the booking lifecycle: creation against the availability ledger,
/// payment and arrival transitions, cancellation and refund, and the handoff
/// to the payout engine.
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    payout: Arc<PayoutEngine>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        payout: Arc<PayoutEngine>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            store,
            payout,
            notifier,
            clock,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.store
    }

    /// Validate the request against the listing, capture the pricing
    /// snapshot and split, and insert with the store-side overlap check.
    pub async fn create_booking(&self, request: CreateBookingRequest) -> AppResult<Booking> {
        if request.check_out_date <= request.check_in_date {
            return Err(AppError::Validation(
                "Check-out must be after check-in.".to_string(),
            ));
        }
        if request.num_guests < 1 {
            return Err(AppError::Validation(
                "Guest count must be at least 1.".to_string(),
            ));
        }

        let listing = self
            .store
            .get_listing(request.listing_id)
            .await?
            .filter(|listing| listing.is_active)
            .ok_or_else(|| AppError::NotFound("Listing not found.".to_string()))?;

        if request.num_guests > listing.max_guests {
            return Err(AppError::Conflict(format!(
                "Listing sleeps at most {} guests.",
                listing.max_guests
            )));
        }
        let nights = nights_between(request.check_in_date, request.check_out_date);
        if nights < listing.min_nights || nights > listing.max_nights {
            return Err(AppError::Conflict(format!(
                "Stay length must be between {} and {} nights.",
                listing.min_nights, listing.max_nights
            )));
        }

        let pricing = build_snapshot(
            &listing,
            nights,
            self.policy.service_fee_percent,
            self.policy.tax_percent,
        );
        let split = compute_split(pricing.total, self.policy.platform_fee_percent);
        let now = self.clock.now();

        let booking = Booking {
            id: Uuid::new_v4(),
            listing_id: listing.id,
            guest_id: request.guest_id,
            host_id: listing.host_id,
            check_in_date: request.check_in_date,
            check_out_date: request.check_out_date,
            num_guests: request.num_guests,
            status: BookingStatus::Pending,
            payout: PayoutRecord {
                status: PayoutStatus::Pending,
                platform_fee: Some(split.platform_fee),
                host_amount: Some(split.host_amount),
                currency: pricing.currency.clone(),
                destination: None,
                auto_release_at: Some(self.release_deadline(request.check_in_date)),
                released_at: None,
                provider_reference: None,
                failure_reason: None,
            },
            payment: PaymentRecord {
                method: request.payment_method,
                order_id: None,
                transaction_id: None,
                status: PaymentStatus::Pending,
                paid_at: None,
            },
            arrival: ArrivalRecord {
                confirmation_required: true,
                confirmed_by: None,
                confirmed_at: None,
                auto_confirmed_at: None,
            },
            pricing,
            cancellation: None,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_booking_checked(&booking).await?;

        self.notify(Notification {
            recipient_id: booking.host_id,
            event: "booking_requested",
            message: format!(
                "New booking request for {} nights, check-in {}.",
                booking.pricing.nights, booking.check_in_date
            ),
            context: json!({ "booking_id": booking.id }),
        });

        Ok(booking)
    }

    /// Host acknowledgment, legal only from `pending`.
    pub async fn confirm_booking(&self, booking_id: Uuid, host_id: Uuid) -> AppResult<Booking> {
        let booking = self.load(booking_id).await?;
        if booking.host_id != host_id {
            return Err(AppError::Unauthorized(
                "Only the listing's host may confirm this booking.".to_string(),
            ));
        }
        match self.store.mark_confirmed(booking_id, self.clock.now()).await? {
            Some(updated) => Ok(updated),
            None => Err(AppError::InvalidState(format!(
                "Booking cannot be confirmed from status '{}'.",
                booking.status.as_str()
            ))),
        }
    }

    /// Webhook-driven payment confirmation. Idempotent: a redelivery for a
    /// booking that already moved past payment returns the current record
    /// without recomputing anything.
    pub async fn confirm_payment(&self, notice: PaymentNotice) -> AppResult<Booking> {
        let booking = self.load(notice.booking_id).await?;

        if booking.payment.status == PaymentStatus::Completed {
            return Ok(booking);
        }
        if booking.status.is_terminal() {
            tracing::warn!(
                booking_id = %booking.id,
                status = booking.status.as_str(),
                "Payment confirmation received for a terminal booking"
            );
            return Ok(booking);
        }

        // The split comes from the stored snapshot total; listing pricing may
        // have changed since creation and must not leak in.
        let split = compute_split(booking.pricing.total, self.policy.platform_fee_percent);
        let now = self.clock.now();
        let confirmation = PaymentConfirmation {
            order_id: notice.order_id,
            transaction_id: notice.transaction_id,
            paid_at: now,
            platform_fee: split.platform_fee,
            host_amount: split.host_amount,
            auto_release_at: self.release_deadline(booking.check_in_date),
        };

        match self
            .store
            .mark_payment_completed(booking.id, &confirmation)
            .await?
        {
            Some(updated) => {
                self.store
                    .append_transaction(&ledger::charge_entry(&updated, now))
                    .await?;
                self.notify(Notification {
                    recipient_id: updated.guest_id,
                    event: "payment_confirmed",
                    message: "Your payment was received. Funds are held until check-in."
                        .to_string(),
                    context: json!({ "booking_id": updated.id }),
                });
                Ok(updated)
            }
            // Lost the race against a concurrent delivery of the same
            // webhook; the winner did the work.
            None => self.load(booking.id).await,
        }
    }

    /// Confirm arrival and request payout release. Legal once payment has
    /// completed; already-confirmed bookings no-op to success. A payout
    /// failure is reported in the outcome, not as an error.
    ///
    /// `confirmed_by` is `None` when the watcher confirms on timeout.
    pub async fn confirm_arrival(
        &self,
        booking_id: Uuid,
        confirmed_by: Option<Uuid>,
    ) -> AppResult<ArrivalOutcome> {
        let booking = self.load(booking_id).await?;
        let reason = match confirmed_by {
            None => ReleaseReason::AutoRelease,
            Some(id) if id == booking.guest_id => ReleaseReason::GuestConfirmed,
            Some(_) => ReleaseReason::AdminConfirmed,
        };

        if !booking.is_paid() {
            return Err(AppError::InvalidState(
                "Arrival can be confirmed once payment has completed.".to_string(),
            ));
        }
        if matches!(
            booking.status,
            BookingStatus::CancelledByGuest
                | BookingStatus::CancelledByHost
                | BookingStatus::Refunded
        ) {
            return Err(AppError::InvalidState(format!(
                "Booking is {} and cannot confirm arrival.",
                booking.status.as_str()
            )));
        }

        if booking.status == BookingStatus::AwaitingArrivalConfirmation {
            let arrival = ArrivalConfirmation {
                confirmed_by,
                confirmed_at: self.clock.now(),
            };
            // A CAS miss means the guest and the watcher raced; either way
            // arrival is confirmed and release below is idempotent.
            if self
                .store
                .mark_arrival_confirmed(booking.id, &arrival)
                .await?
                .is_none()
            {
                tracing::debug!(booking_id = %booking.id, "Arrival already confirmed concurrently");
            }
        }

        match self.payout.release(booking_id, reason).await {
            Ok(updated) => {
                let released = updated.payout.status == PayoutStatus::Completed;
                if released {
                    self.notify(Notification {
                        recipient_id: updated.host_id,
                        event: "payout_released",
                        message: format!(
                            "Payout of {:.2} {} is on its way.",
                            updated.payout.host_amount.unwrap_or(0.0),
                            updated.payout.currency
                        ),
                        context: json!({ "booking_id": updated.id }),
                    });
                }
                Ok(ArrivalOutcome {
                    booking: updated,
                    payout_released: released,
                    payout_error: None,
                })
            }
            Err(
                err @ (AppError::PayoutProvider(_)
                | AppError::PayoutConfig(_)
                | AppError::Dependency(_)),
            ) => {
                let booking = self.load(booking_id).await?;
                Ok(ArrivalOutcome {
                    booking,
                    payout_released: false,
                    payout_error: Some(err.to_string()),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Cancel from any non-terminal status. A payout that has not completed
    /// is cancelled and never attempted; a paid booking gets a refund entry
    /// in the ledger.
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        cancelled_by: Uuid,
        reason: Option<String>,
    ) -> AppResult<Booking> {
        let booking = self.load(booking_id).await?;
        if booking.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "Booking is already {}.",
                booking.status.as_str()
            )));
        }

        let cancellation = Cancellation {
            by_guest: cancelled_by == booking.guest_id,
            cancelled_by,
            cancelled_at: self.clock.now(),
            reason,
        };
        let updated = self
            .store
            .mark_cancelled(booking_id, &cancellation)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState("Booking was already finalized.".to_string())
            })?;

        if booking.is_paid() && updated.payout.status == PayoutStatus::Cancelled {
            let entry: LedgerEntry =
                ledger::refund_entry(&updated, cancelled_by, "cancellation", self.clock.now());
            self.store.append_transaction(&entry).await?;
        }

        let counterparty = if cancellation.by_guest {
            updated.host_id
        } else {
            updated.guest_id
        };
        self.notify(Notification {
            recipient_id: counterparty,
            event: "booking_cancelled",
            message: "The booking was cancelled.".to_string(),
            context: json!({ "booking_id": updated.id }),
        });

        Ok(updated)
    }

    /// Admin refund of a paid booking whose payout has not been released.
    pub async fn refund_booking(&self, booking_id: Uuid, refunded_by: Uuid) -> AppResult<Booking> {
        let booking = self.load(booking_id).await?;
        if booking.payout.status == PayoutStatus::Completed {
            return Err(AppError::InvalidState(
                "Payout was already released; refund via a new ledger correction.".to_string(),
            ));
        }
        let updated = self
            .store
            .mark_refunded(booking_id, refunded_by, self.clock.now())
            .await?
            .ok_or_else(|| {
                AppError::InvalidState(format!(
                    "Booking cannot be refunded from status '{}'.",
                    booking.status.as_str()
                ))
            })?;

        let entry = ledger::refund_entry(&updated, refunded_by, "refund", self.clock.now());
        self.store.append_transaction(&entry).await?;

        self.notify(Notification {
            recipient_id: updated.guest_id,
            event: "booking_refunded",
            message: "Your booking was refunded.".to_string(),
            context: json!({ "booking_id": updated.id }),
        });

        Ok(updated)
    }

    /// Explicit retry of a failed payout (admin or host surface).
    pub async fn retry_payout(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.payout
            .release(booking_id, ReleaseReason::ManualRetry)
            .await
    }

    pub async fn transactions(&self, booking_id: Uuid) -> AppResult<Vec<LedgerEntry>> {
        self.load(booking_id).await?;
        self.store.transactions_for_booking(booking_id).await
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.load(booking_id).await
    }

    pub async fn blocked_ranges(&self, listing_id: Uuid) -> AppResult<Vec<DateRange>> {
        self.store
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Listing not found.".to_string()))?;
        self.store.blocked_ranges(listing_id).await
    }

    /// Host-imposed calendar block, same overlap discipline as bookings.
    pub async fn block_dates(
        &self,
        listing_id: Uuid,
        host_id: Uuid,
        range: DateRange,
        reason: Option<String>,
    ) -> AppResult<ListingBlock> {
        if range.end_date <= range.start_date {
            return Err(AppError::Validation(
                "Block end date must be after its start date.".to_string(),
            ));
        }
        let listing = self
            .store
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Listing not found.".to_string()))?;
        if listing.host_id != host_id {
            return Err(AppError::Unauthorized(
                "Only the listing's host may block dates.".to_string(),
            ));
        }

        let block = ListingBlock {
            id: Uuid::new_v4(),
            listing_id,
            start_date: range.start_date,
            end_date: range.end_date,
            reason,
            created_by: host_id,
            created_at: self.clock.now(),
        };
        self.store.insert_block_checked(&block).await?;
        Ok(block)
    }

    pub async fn create_listing(&self, listing: Listing) -> AppResult<Listing> {
        if listing.nightly_rate <= 0.0 {
            return Err(AppError::Validation(
                "Nightly rate must be positive.".to_string(),
            ));
        }
        if listing.min_nights < 1 || listing.max_nights < listing.min_nights {
            return Err(AppError::Validation(
                "Night limits must satisfy 1 <= min <= max.".to_string(),
            ));
        }
        self.store.insert_listing(&listing).await?;
        Ok(listing)
    }

    pub async fn get_listing(&self, listing_id: Uuid) -> AppResult<Listing> {
        self.store
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Listing not found.".to_string()))
    }

    async fn load(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found.".to_string()))
    }

    /// `check_in` (midnight UTC) plus the configured delay.
    fn release_deadline(&self, check_in: NaiveDate) -> DateTime<Utc> {
        check_in
            .and_hms_opt(0, 0, 0)
            .expect("midnight is a valid time")
            .and_utc()
            + Duration::hours(self.policy.auto_release_hours)
    }

    /// Fire-and-forget: delivery runs in its own task and its failures never
    /// touch booking or payout state.
    fn notify(&self, notification: Notification) {
        let sender = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            sender.send(notification).await;
        });
    }
}
