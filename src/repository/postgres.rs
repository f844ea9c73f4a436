use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::{
    ArrivalRecord, Booking, BookingStatus, CancellationRecord, DateRange, LedgerEntry, Listing,
    ListingBlock, PaymentMethod, PaymentRecord, PaymentStatus, PayoutProfile, PayoutRecord,
    PayoutStatus, PricingSnapshot, TransactionType,
};
use crate::error::{AppError, AppResult};
use crate::repository::store::{
    ArrivalConfirmation, BookingStore, Cancellation, PaymentConfirmation, PayoutCompletion,
};

/// PostgreSQL-backed store.
///
/// Availability atomicity: `insert_booking_checked` and `insert_block_checked`
/// take a `FOR UPDATE` row lock on the listing, re-check overlap inside the
/// transaction, and insert. The partial GiST exclusion constraints in the
/// schema are the backstop if a future code path skips the lock.
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn blocking_statuses() -> Vec<String> {
        BookingStatus::BLOCKING
            .iter()
            .map(|status| status.as_str().to_string())
            .collect()
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert_listing(&self, listing: &Listing) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO listings (id, host_id, title, nightly_rate, currency, cleaning_fee,
                                   min_nights, max_nights, max_guests, is_active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(listing.id)
        .bind(listing.host_id)
        .bind(&listing.title)
        .bind(listing.nightly_rate)
        .bind(&listing.currency)
        .bind(listing.cleaning_fee)
        .bind(listing.min_nights)
        .bind(listing.max_nights)
        .bind(listing.max_guests)
        .bind(listing.is_active)
        .bind(listing.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_listing(&self, listing_id: Uuid) -> AppResult<Option<Listing>> {
        let row = sqlx::query("SELECT * FROM listings WHERE id = $1")
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| listing_from_row(&r)).transpose()
    }

    async fn insert_booking_checked(&self, booking: &Booking) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        // Per-listing lock: serializes the check+insert against concurrent
        // bookings and block creation for the same listing.
        let listing = sqlx::query("SELECT id FROM listings WHERE id = $1 FOR UPDATE")
            .bind(booking.listing_id)
            .fetch_optional(&mut *tx)
            .await?;
        if listing.is_none() {
            return Err(AppError::NotFound("Listing not found.".to_string()));
        }

        let block_overlap: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM listing_blocks
             WHERE listing_id = $1 AND start_date < $3 AND $2 < end_date
             LIMIT 1",
        )
        .bind(booking.listing_id)
        .bind(booking.check_in_date)
        .bind(booking.check_out_date)
        .fetch_optional(&mut *tx)
        .await?;
        if block_overlap.is_some() {
            return Err(AppError::Conflict(
                "Selected dates are blocked by the host.".to_string(),
            ));
        }

        let booking_overlap: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM bookings
             WHERE listing_id = $1 AND status = ANY($4)
               AND check_in_date < $3 AND $2 < check_out_date
             LIMIT 1",
        )
        .bind(booking.listing_id)
        .bind(booking.check_in_date)
        .bind(booking.check_out_date)
        .bind(Self::blocking_statuses())
        .fetch_optional(&mut *tx)
        .await?;
        if booking_overlap.is_some() {
            return Err(AppError::Conflict(
                "Selected dates overlap an existing booking.".to_string(),
            ));
        }

        let destination = booking
            .payout
            .destination
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Could not encode destination: {e}")))?;

        sqlx::query(
            "INSERT INTO bookings (
                 id, listing_id, guest_id, host_id, check_in_date, check_out_date, num_guests,
                 status, nightly_rate, nights, subtotal, cleaning_fee, service_fee, taxes,
                 total, currency, payment_method, payment_order_id, payment_transaction_id,
                 payment_status, paid_at, arrival_confirmation_required, arrival_confirmed_by,
                 arrival_confirmed_at, arrival_auto_confirmed_at, payout_status,
                 payout_platform_fee, payout_host_amount, payout_currency, payout_destination,
                 payout_auto_release_at, payout_released_at, payout_provider_reference,
                 payout_failure_reason, created_at, updated_at
             ) VALUES (
                 $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                 $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32,
                 $33, $34, $35, $36
             )",
        )
        .bind(booking.id)
        .bind(booking.listing_id)
        .bind(booking.guest_id)
        .bind(booking.host_id)
        .bind(booking.check_in_date)
        .bind(booking.check_out_date)
        .bind(booking.num_guests)
        .bind(booking.status.as_str())
        .bind(booking.pricing.nightly_rate)
        .bind(booking.pricing.nights)
        .bind(booking.pricing.subtotal)
        .bind(booking.pricing.cleaning_fee)
        .bind(booking.pricing.service_fee)
        .bind(booking.pricing.taxes)
        .bind(booking.pricing.total)
        .bind(&booking.pricing.currency)
        .bind(booking.payment.method.as_str())
        .bind(&booking.payment.order_id)
        .bind(&booking.payment.transaction_id)
        .bind(booking.payment.status.as_str())
        .bind(booking.payment.paid_at)
        .bind(booking.arrival.confirmation_required)
        .bind(booking.arrival.confirmed_by)
        .bind(booking.arrival.confirmed_at)
        .bind(booking.arrival.auto_confirmed_at)
        .bind(booking.payout.status.as_str())
        .bind(booking.payout.platform_fee)
        .bind(booking.payout.host_amount)
        .bind(&booking.payout.currency)
        .bind(destination)
        .bind(booking.payout.auto_release_at)
        .bind(booking.payout.released_at)
        .bind(&booking.payout.provider_reference)
        .bind(&booking.payout.failure_reason)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| booking_from_row(&r)).transpose()
    }

    async fn blocked_ranges(&self, listing_id: Uuid) -> AppResult<Vec<DateRange>> {
        let rows = sqlx::query(
            "SELECT check_in_date AS start_date, check_out_date AS end_date
               FROM bookings WHERE listing_id = $1 AND status = ANY($2)
             UNION ALL
             SELECT start_date, end_date FROM listing_blocks WHERE listing_id = $1
             ORDER BY start_date",
        )
        .bind(listing_id)
        .bind(Self::blocking_statuses())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(DateRange {
                    start_date: row.try_get("start_date").map_err(map_row_error)?,
                    end_date: row.try_get("end_date").map_err(map_row_error)?,
                })
            })
            .collect()
    }

    async fn insert_block_checked(&self, block: &ListingBlock) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let listing = sqlx::query("SELECT id FROM listings WHERE id = $1 FOR UPDATE")
            .bind(block.listing_id)
            .fetch_optional(&mut *tx)
            .await?;
        if listing.is_none() {
            return Err(AppError::NotFound("Listing not found.".to_string()));
        }

        let booking_overlap: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM bookings
             WHERE listing_id = $1 AND status = ANY($4)
               AND check_in_date < $3 AND $2 < check_out_date
             LIMIT 1",
        )
        .bind(block.listing_id)
        .bind(block.start_date)
        .bind(block.end_date)
        .bind(Self::blocking_statuses())
        .fetch_optional(&mut *tx)
        .await?;
        if booking_overlap.is_some() {
            return Err(AppError::Conflict(
                "Block overlaps an active booking.".to_string(),
            ));
        }

        // Block-on-block overlap is caught by the exclusion constraint.
        sqlx::query(
            "INSERT INTO listing_blocks (id, listing_id, start_date, end_date, reason,
                                         created_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(block.id)
        .bind(block.listing_id)
        .bind(block.start_date)
        .bind(block.end_date)
        .bind(&block.reason)
        .bind(block.created_by)
        .bind(block.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn mark_confirmed(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let row = sqlx::query(
            "UPDATE bookings SET status = 'confirmed', updated_at = $2
             WHERE id = $1 AND status = 'pending'
             RETURNING *",
        )
        .bind(booking_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| booking_from_row(&r)).transpose()
    }

    async fn mark_payment_completed(
        &self,
        booking_id: Uuid,
        confirmation: &PaymentConfirmation,
    ) -> AppResult<Option<Booking>> {
        let row = sqlx::query(
            "UPDATE bookings SET
                 status = 'awaiting_arrival_confirmation',
                 payment_status = 'completed',
                 payment_order_id = COALESCE($2, payment_order_id),
                 payment_transaction_id = COALESCE($3, payment_transaction_id),
                 paid_at = $4,
                 payout_platform_fee = $5,
                 payout_host_amount = $6,
                 payout_auto_release_at = $7,
                 updated_at = $4
             WHERE id = $1 AND status IN ('pending', 'confirmed')
             RETURNING *",
        )
        .bind(booking_id)
        .bind(&confirmation.order_id)
        .bind(&confirmation.transaction_id)
        .bind(confirmation.paid_at)
        .bind(confirmation.platform_fee)
        .bind(confirmation.host_amount)
        .bind(confirmation.auto_release_at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| booking_from_row(&r)).transpose()
    }

    async fn mark_arrival_confirmed(
        &self,
        booking_id: Uuid,
        arrival: &ArrivalConfirmation,
    ) -> AppResult<Option<Booking>> {
        let row = sqlx::query(
            "UPDATE bookings SET
                 status = 'in_progress',
                 arrival_confirmed_by = $2,
                 arrival_confirmed_at = CASE WHEN $2::uuid IS NULL
                                             THEN arrival_confirmed_at ELSE $3 END,
                 arrival_auto_confirmed_at = CASE WHEN $2::uuid IS NULL
                                                  THEN $3 ELSE arrival_auto_confirmed_at END,
                 payout_status = 'ready_for_release',
                 updated_at = $3
             WHERE id = $1 AND status = 'awaiting_arrival_confirmation'
             RETURNING *",
        )
        .bind(booking_id)
        .bind(arrival.confirmed_by)
        .bind(arrival.confirmed_at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| booking_from_row(&r)).transpose()
    }

    async fn mark_payout_completed(
        &self,
        booking_id: Uuid,
        completion: &PayoutCompletion,
    ) -> AppResult<Option<Booking>> {
        let destination = serde_json::to_value(&completion.destination)
            .map_err(|e| AppError::Internal(format!("Could not encode destination: {e}")))?;
        let row = sqlx::query(
            "UPDATE bookings SET
                 payout_status = 'completed',
                 payout_provider_reference = $2,
                 payout_destination = $3,
                 payout_platform_fee = $4,
                 payout_host_amount = $5,
                 payout_released_at = $6,
                 payout_failure_reason = NULL,
                 updated_at = $6
             WHERE id = $1 AND payout_status IN ('pending', 'ready_for_release', 'failed')
             RETURNING *",
        )
        .bind(booking_id)
        .bind(&completion.provider_reference)
        .bind(destination)
        .bind(completion.platform_fee)
        .bind(completion.host_amount)
        .bind(completion.released_at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| booking_from_row(&r)).transpose()
    }

    async fn mark_payout_failed(
        &self,
        booking_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let row = sqlx::query(
            "UPDATE bookings SET
                 payout_status = 'failed',
                 payout_failure_reason = $2,
                 updated_at = $3
             WHERE id = $1 AND payout_status IN ('pending', 'ready_for_release', 'failed')
             RETURNING *",
        )
        .bind(booking_id)
        .bind(reason)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| booking_from_row(&r)).transpose()
    }

    async fn mark_cancelled(
        &self,
        booking_id: Uuid,
        cancellation: &Cancellation,
    ) -> AppResult<Option<Booking>> {
        let status = if cancellation.by_guest {
            BookingStatus::CancelledByGuest
        } else {
            BookingStatus::CancelledByHost
        };
        let row = sqlx::query(
            "UPDATE bookings SET
                 status = $2,
                 cancelled_by = $3,
                 cancelled_at = $4,
                 cancellation_reason = $5,
                 payout_status = CASE WHEN payout_status = 'completed'
                                      THEN payout_status ELSE 'cancelled' END,
                 updated_at = $4
             WHERE id = $1
               AND status IN ('pending', 'confirmed', 'awaiting_arrival_confirmation', 'in_progress')
             RETURNING *",
        )
        .bind(booking_id)
        .bind(status.as_str())
        .bind(cancellation.cancelled_by)
        .bind(cancellation.cancelled_at)
        .bind(&cancellation.reason)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| booking_from_row(&r)).transpose()
    }

    async fn mark_refunded(
        &self,
        booking_id: Uuid,
        _refunded_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let row = sqlx::query(
            "UPDATE bookings SET
                 status = 'refunded',
                 payment_status = 'refunded',
                 payout_status = 'cancelled',
                 updated_at = $2
             WHERE id = $1
               AND status IN ('awaiting_arrival_confirmation', 'in_progress')
               AND payout_status <> 'completed'
             RETURNING *",
        )
        .bind(booking_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| booking_from_row(&r)).transpose()
    }

    async fn mark_completed(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let row = sqlx::query(
            "UPDATE bookings SET status = 'completed', updated_at = $2
             WHERE id = $1 AND status = 'in_progress'
             RETURNING *",
        )
        .bind(booking_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| booking_from_row(&r)).transpose()
    }

    async fn append_transaction(&self, entry: &LedgerEntry) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO transactions (id, booking_id, tx_type, amount, platform_fee,
                                       host_payout, currency, status, provider_reference,
                                       metadata, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(entry.id)
        .bind(entry.booking_id)
        .bind(entry.tx_type.as_str())
        .bind(entry.amount)
        .bind(entry.platform_fee)
        .bind(entry.host_payout)
        .bind(&entry.currency)
        .bind(&entry.status)
        .bind(&entry.provider_reference)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn transactions_for_booking(&self, booking_id: Uuid) -> AppResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM transactions WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(ledger_entry_from_row).collect()
    }

    async fn due_for_auto_release(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query(
            "SELECT * FROM bookings
             WHERE payout_status IN ('pending', 'ready_for_release', 'failed')
               AND payment_status = 'completed'
               AND status IN ('awaiting_arrival_confirmation', 'in_progress')
               AND payout_auto_release_at IS NOT NULL
               AND payout_auto_release_at <= $1
             ORDER BY payout_auto_release_at
             LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn due_for_completion(&self, today: NaiveDate, limit: i64) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query(
            "SELECT * FROM bookings
             WHERE status = 'in_progress' AND check_out_date <= $1
             ORDER BY check_out_date
             LIMIT $2",
        )
        .bind(today)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn upsert_payout_profile(&self, profile: &PayoutProfile) -> AppResult<()> {
        let destination = serde_json::to_value(&profile.destination)
            .map_err(|e| AppError::Internal(format!("Could not encode destination: {e}")))?;
        sqlx::query(
            "INSERT INTO host_payout_profiles (host_id, destination, updated_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (host_id) DO UPDATE
                 SET destination = EXCLUDED.destination,
                     updated_at = EXCLUDED.updated_at",
        )
        .bind(profile.host_id)
        .bind(destination)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn payout_profile(&self, host_id: Uuid) -> AppResult<Option<PayoutProfile>> {
        let row = sqlx::query("SELECT * FROM host_payout_profiles WHERE host_id = $1")
            .bind(host_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| payout_profile_from_row(&r)).transpose()
    }
}

fn map_row_error(err: sqlx::Error) -> AppError {
    AppError::Internal(format!("Row decode error: {err}"))
}

fn parse_status<T>(raw: String, parse: fn(&str) -> Option<T>, kind: &str) -> AppResult<T> {
    parse(&raw).ok_or_else(|| AppError::Internal(format!("Unknown {kind} value '{raw}' in store.")))
}

fn listing_from_row(row: &PgRow) -> AppResult<Listing> {
    Ok(Listing {
        id: row.try_get("id").map_err(map_row_error)?,
        host_id: row.try_get("host_id").map_err(map_row_error)?,
        title: row.try_get("title").map_err(map_row_error)?,
        nightly_rate: row.try_get("nightly_rate").map_err(map_row_error)?,
        currency: row.try_get("currency").map_err(map_row_error)?,
        cleaning_fee: row.try_get("cleaning_fee").map_err(map_row_error)?,
        min_nights: row.try_get("min_nights").map_err(map_row_error)?,
        max_nights: row.try_get("max_nights").map_err(map_row_error)?,
        max_guests: row.try_get("max_guests").map_err(map_row_error)?,
        is_active: row.try_get("is_active").map_err(map_row_error)?,
        created_at: row.try_get("created_at").map_err(map_row_error)?,
    })
}

fn booking_from_row(row: &PgRow) -> AppResult<Booking> {
    let status: String = row.try_get("status").map_err(map_row_error)?;
    let payment_method: String = row.try_get("payment_method").map_err(map_row_error)?;
    let payment_status: String = row.try_get("payment_status").map_err(map_row_error)?;
    let payout_status: String = row.try_get("payout_status").map_err(map_row_error)?;

    let destination: Option<serde_json::Value> =
        row.try_get("payout_destination").map_err(map_row_error)?;
    let destination = destination
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| AppError::Internal(format!("Corrupt destination snapshot: {e}")))?;

    let cancelled_by: Option<Uuid> = row.try_get("cancelled_by").map_err(map_row_error)?;
    let cancellation = match cancelled_by {
        Some(by) => Some(CancellationRecord {
            cancelled_by: by,
            cancelled_at: row.try_get("cancelled_at").map_err(map_row_error)?,
            reason: row.try_get("cancellation_reason").map_err(map_row_error)?,
        }),
        None => None,
    };

    Ok(Booking {
        id: row.try_get("id").map_err(map_row_error)?,
        listing_id: row.try_get("listing_id").map_err(map_row_error)?,
        guest_id: row.try_get("guest_id").map_err(map_row_error)?,
        host_id: row.try_get("host_id").map_err(map_row_error)?,
        check_in_date: row.try_get("check_in_date").map_err(map_row_error)?,
        check_out_date: row.try_get("check_out_date").map_err(map_row_error)?,
        num_guests: row.try_get("num_guests").map_err(map_row_error)?,
        status: parse_status(status, BookingStatus::from_str, "booking status")?,
        pricing: PricingSnapshot {
            nightly_rate: row.try_get("nightly_rate").map_err(map_row_error)?,
            nights: row.try_get("nights").map_err(map_row_error)?,
            subtotal: row.try_get("subtotal").map_err(map_row_error)?,
            cleaning_fee: row.try_get("cleaning_fee").map_err(map_row_error)?,
            service_fee: row.try_get("service_fee").map_err(map_row_error)?,
            taxes: row.try_get("taxes").map_err(map_row_error)?,
            total: row.try_get("total").map_err(map_row_error)?,
            currency: row.try_get("currency").map_err(map_row_error)?,
        },
        payment: PaymentRecord {
            method: parse_status(payment_method, PaymentMethod::from_str, "payment method")?,
            order_id: row.try_get("payment_order_id").map_err(map_row_error)?,
            transaction_id: row
                .try_get("payment_transaction_id")
                .map_err(map_row_error)?,
            status: parse_status(payment_status, PaymentStatus::from_str, "payment status")?,
            paid_at: row.try_get("paid_at").map_err(map_row_error)?,
        },
        arrival: ArrivalRecord {
            confirmation_required: row
                .try_get("arrival_confirmation_required")
                .map_err(map_row_error)?,
            confirmed_by: row.try_get("arrival_confirmed_by").map_err(map_row_error)?,
            confirmed_at: row.try_get("arrival_confirmed_at").map_err(map_row_error)?,
            auto_confirmed_at: row
                .try_get("arrival_auto_confirmed_at")
                .map_err(map_row_error)?,
        },
        payout: PayoutRecord {
            status: parse_status(payout_status, PayoutStatus::from_str, "payout status")?,
            platform_fee: row.try_get("payout_platform_fee").map_err(map_row_error)?,
            host_amount: row.try_get("payout_host_amount").map_err(map_row_error)?,
            currency: row.try_get("payout_currency").map_err(map_row_error)?,
            destination,
            auto_release_at: row
                .try_get("payout_auto_release_at")
                .map_err(map_row_error)?,
            released_at: row.try_get("payout_released_at").map_err(map_row_error)?,
            provider_reference: row
                .try_get("payout_provider_reference")
                .map_err(map_row_error)?,
            failure_reason: row
                .try_get("payout_failure_reason")
                .map_err(map_row_error)?,
        },
        cancellation,
        created_at: row.try_get("created_at").map_err(map_row_error)?,
        updated_at: row.try_get("updated_at").map_err(map_row_error)?,
    })
}

fn ledger_entry_from_row(row: &PgRow) -> AppResult<LedgerEntry> {
    let tx_type: String = row.try_get("tx_type").map_err(map_row_error)?;
    Ok(LedgerEntry {
        id: row.try_get("id").map_err(map_row_error)?,
        booking_id: row.try_get("booking_id").map_err(map_row_error)?,
        tx_type: parse_status(tx_type, TransactionType::from_str, "transaction type")?,
        amount: row.try_get("amount").map_err(map_row_error)?,
        platform_fee: row.try_get("platform_fee").map_err(map_row_error)?,
        host_payout: row.try_get("host_payout").map_err(map_row_error)?,
        currency: row.try_get("currency").map_err(map_row_error)?,
        status: row.try_get("status").map_err(map_row_error)?,
        provider_reference: row.try_get("provider_reference").map_err(map_row_error)?,
        metadata: row.try_get("metadata").map_err(map_row_error)?,
        created_at: row.try_get("created_at").map_err(map_row_error)?,
    })
}

fn payout_profile_from_row(row: &PgRow) -> AppResult<PayoutProfile> {
    let destination: serde_json::Value = row.try_get("destination").map_err(map_row_error)?;
    Ok(PayoutProfile {
        host_id: row.try_get("host_id").map_err(map_row_error)?,
        destination: serde_json::from_value(destination)
            .map_err(|e| AppError::Internal(format!("Corrupt payout profile: {e}")))?,
        updated_at: row.try_get("updated_at").map_err(map_row_error)?,
    })
}
