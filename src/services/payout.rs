use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::domain::{Booking, BookingStatus, PayoutDestination, PayoutStatus};
use crate::error::{AppError, AppResult};
use crate::repository::store::{BookingStore, PayoutCompletion};
use crate::services::clock::Clock;
use crate::services::ledger;
use crate::services::payout_provider::{PayoutProvider, TransferRequest};
use crate::services::pricing::compute_split;

/// Namespace for UUIDv5 payout references so a booking maps to the same
/// reference on every attempt.
const PAYOUT_REFERENCE_NAMESPACE: Uuid = Uuid::from_u128(0x8f1d6a2e_41c7_4b5a_9d3e_7c2a90f4b812);

/// Stable per-booking transfer reference. The provider dedupes on it, so a
/// crashed or retried release cannot produce a second real transfer.
pub fn payout_reference(booking_id: Uuid) -> String {
    format!(
        "po_{}",
        Uuid::new_v5(&PAYOUT_REFERENCE_NAMESPACE, booking_id.as_bytes()).simple()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    GuestConfirmed,
    AdminConfirmed,
    AutoRelease,
    ManualRetry,
}

impl ReleaseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GuestConfirmed => "guest_confirmed",
            Self::AdminConfirmed => "admin_confirmed",
            Self::AutoRelease => "auto_release",
            Self::ManualRetry => "manual_retry",
        }
    }
}

/// Releases escrowed funds to the host: computes the split from the stored
/// pricing snapshot, validates the destination, calls the provider, and
/// records the outcome exactly once.
pub struct PayoutEngine {
    store: Arc<dyn BookingStore>,
    provider: Arc<dyn PayoutProvider>,
    clock: Arc<dyn Clock>,
    fee_percent: f64,
}

impl PayoutEngine {
    pub fn new(
        store: Arc<dyn BookingStore>,
        provider: Arc<dyn PayoutProvider>,
        clock: Arc<dyn Clock>,
        fee_percent: f64,
    ) -> Self {
        Self {
            store,
            provider,
            clock,
            fee_percent,
        }
    }

    /// Attempt to pay the host for a booking. Safe to re-invoke: an already
    /// `completed` payout returns success without touching the provider, and
    /// a lost completion race defers to the winner. On provider failure the
    /// payout is marked `failed` with the reason and the error propagates;
    /// the booking's own status is untouched so a later retry can converge.
    pub async fn release(&self, booking_id: Uuid, reason: ReleaseReason) -> AppResult<Booking> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found.".to_string()))?;

        // Idempotency guard: the primary defense against a guest action and a
        // concurrent watcher tick both triggering release.
        if booking.payout.status == PayoutStatus::Completed {
            return Ok(booking);
        }
        if booking.payout.status == PayoutStatus::Cancelled {
            return Err(AppError::InvalidState(
                "Payout was cancelled and will not be attempted.".to_string(),
            ));
        }
        if !booking.is_paid() {
            return Err(AppError::InvalidState(
                "Payout requires a completed payment.".to_string(),
            ));
        }
        if !matches!(
            booking.status,
            BookingStatus::InProgress | BookingStatus::Completed
        ) {
            return Err(AppError::InvalidState(
                "Payout requires confirmed arrival.".to_string(),
            ));
        }

        // The pricing snapshot is authoritative; the split is recomputed from
        // its total, never from live listing data.
        let split = compute_split(booking.pricing.total, self.fee_percent);
        let destination = self.resolve_destination(&booking).await?;
        destination.validate()?;

        let reference = payout_reference(booking.id);
        let request = TransferRequest {
            amount: split.host_amount,
            currency: booking.pricing.currency.clone(),
            reference: reference.clone(),
            destination: destination.clone(),
            metadata: json!({
                "booking_id": booking.id,
                "host_id": booking.host_id,
                "release_reason": reason.as_str(),
            }),
        };

        match self.provider.transfer(&request).await {
            Ok(receipt) => {
                let provider_reference = receipt.reference.unwrap_or(reference);
                let now = self.clock.now();
                let completion = PayoutCompletion {
                    provider_reference: provider_reference.clone(),
                    destination,
                    platform_fee: split.platform_fee,
                    host_amount: split.host_amount,
                    released_at: now,
                };
                match self.store.mark_payout_completed(booking.id, &completion).await? {
                    Some(updated) => {
                        // CAS winner appends the single payout ledger entry.
                        let entry =
                            ledger::payout_entry(&updated, &provider_reference, reason.as_str(), now);
                        self.store.append_transaction(&entry).await?;
                        tracing::info!(
                            booking_id = %updated.id,
                            host_amount = split.host_amount,
                            platform_fee = split.platform_fee,
                            reason = reason.as_str(),
                            "Payout released"
                        );
                        Ok(updated)
                    }
                    None => {
                        // Another actor recorded the outcome first.
                        self.store
                            .get_booking(booking.id)
                            .await?
                            .ok_or_else(|| AppError::NotFound("Booking not found.".to_string()))
                    }
                }
            }
            Err(err) => {
                let reason_text = err.to_string();
                self.store
                    .mark_payout_failed(booking.id, &reason_text, self.clock.now())
                    .await?;
                tracing::warn!(
                    booking_id = %booking.id,
                    error = %reason_text,
                    "Payout attempt failed; left retryable"
                );
                Err(err)
            }
        }
    }

    /// Use the snapshot captured on the booking when present; otherwise pull
    /// the host's current profile (it becomes the snapshot on completion).
    async fn resolve_destination(&self, booking: &Booking) -> AppResult<PayoutDestination> {
        if let Some(destination) = &booking.payout.destination {
            return Ok(destination.clone());
        }
        self.store
            .payout_profile(booking.host_id)
            .await?
            .map(|profile| profile.destination)
            .ok_or_else(|| {
                AppError::PayoutConfig(
                    "Host has no payout profile. Complete your payout setup.".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::payout_reference;
    use uuid::Uuid;

    #[test]
    fn reference_is_deterministic_per_booking() {
        let booking_id = Uuid::new_v4();
        assert_eq!(payout_reference(booking_id), payout_reference(booking_id));
        assert_ne!(payout_reference(booking_id), payout_reference(Uuid::new_v4()));
    }

    #[test]
    fn reference_is_prefixed() {
        assert!(payout_reference(Uuid::new_v4()).starts_with("po_"));
    }
}
