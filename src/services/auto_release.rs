use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::repository::store::BookingStore;
use crate::services::bookings::BookingService;
use crate::services::clock::Clock;

/// Outcome of one sweep, for logs and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub picked: usize,
    pub released: usize,
    pub failed: usize,
    pub stays_completed: usize,
}

/// Periodic sweep that force-confirms arrival and releases payouts once the
/// guest-confirmation deadline has elapsed, and closes out stays whose
/// check-out date has passed.
///
/// Owned by process startup and injected with its dependencies; tests call
/// `sweep_once` directly with a manual clock instead of waiting on the timer.
pub struct AutoReleaseWatcher {
    store: Arc<dyn BookingStore>,
    bookings: Arc<BookingService>,
    clock: Arc<dyn Clock>,
    sweep_interval: Duration,
    batch_size: i64,
}

impl AutoReleaseWatcher {
    pub fn new(
        store: Arc<dyn BookingStore>,
        bookings: Arc<BookingService>,
        clock: Arc<dyn Clock>,
        sweep_interval: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            bookings,
            clock,
            sweep_interval,
            batch_size,
        }
    }

    /// Timer loop. A sweep never propagates an error; per-booking failures
    /// are recorded on the booking and retried next tick.
    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            interval_secs = self.sweep_interval.as_secs(),
            batch_size = self.batch_size,
            "Auto-release watcher started"
        );
        loop {
            sleep(self.sweep_interval).await;
            let summary = self.sweep_once().await;
            if summary.picked > 0 || summary.stays_completed > 0 {
                tracing::info!(
                    picked = summary.picked,
                    released = summary.released,
                    failed = summary.failed,
                    stays_completed = summary.stays_completed,
                    "Auto-release sweep completed"
                );
            }
        }
    }

    /// One bounded pass. The batch cap bounds provider fan-out per tick.
    pub async fn sweep_once(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();
        let now = self.clock.now();

        let due = match self.store.due_for_auto_release(now, self.batch_size).await {
            Ok(due) => due,
            Err(e) => {
                tracing::warn!(error = %e, "Auto-release scan failed");
                return summary;
            }
        };

        for booking in due {
            summary.picked += 1;
            match self.bookings.confirm_arrival(booking.id, None).await {
                Ok(outcome) if outcome.payout_released => {
                    summary.released += 1;
                }
                Ok(outcome) => {
                    summary.failed += 1;
                    tracing::warn!(
                        booking_id = %booking.id,
                        reason = outcome.payout_error.as_deref().unwrap_or("unknown"),
                        "Auto-release payout failed; will retry next sweep"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        booking_id = %booking.id,
                        error = %e,
                        "Auto-release failed for booking; will retry next sweep"
                    );
                }
            }
        }

        // Free the calendar for stays that ended.
        let ended = match self
            .store
            .due_for_completion(now.date_naive(), self.batch_size)
            .await
        {
            Ok(ended) => ended,
            Err(e) => {
                tracing::warn!(error = %e, "Stay-completion scan failed");
                return summary;
            }
        };
        for booking in ended {
            match self.store.mark_completed(booking.id, now).await {
                Ok(Some(_)) => summary.stays_completed += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(booking_id = %booking.id, error = %e, "Stay completion failed");
                }
            }
        }

        summary
    }
}
