use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{Booking, LedgerEntry, TransactionType};

/// Builders for the append-only transaction ledger. One entry per money
/// movement; corrections are new entries, never mutations of history.

/// The guest's charge, recorded when the payment provider confirms it.
pub fn charge_entry(booking: &Booking, now: DateTime<Utc>) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        tx_type: TransactionType::Booking,
        amount: booking.pricing.total,
        platform_fee: booking.payout.platform_fee.unwrap_or(0.0),
        host_payout: booking.payout.host_amount.unwrap_or(0.0),
        currency: booking.pricing.currency.clone(),
        status: "completed".to_string(),
        provider_reference: booking
            .payment
            .transaction_id
            .clone()
            .or_else(|| booking.payment.order_id.clone()),
        metadata: json!({ "initiator": "payment_webhook" }),
        created_at: now,
    }
}

/// The host payout, recorded exactly once when the provider accepts the
/// transfer. Mirrors the computed split.
pub fn payout_entry(
    booking: &Booking,
    provider_reference: &str,
    release_reason: &str,
    now: DateTime<Utc>,
) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        tx_type: TransactionType::Payout,
        amount: booking.pricing.total,
        platform_fee: booking.payout.platform_fee.unwrap_or(0.0),
        host_payout: booking.payout.host_amount.unwrap_or(0.0),
        currency: booking.payout.currency.clone(),
        status: "completed".to_string(),
        provider_reference: Some(provider_reference.to_string()),
        metadata: json!({
            "release_reason": release_reason,
            "host_id": booking.host_id,
        }),
        created_at: now,
    }
}

/// Funds returned to the guest. Negative amount: the ledger is append-only,
/// so the correction is a new entry.
pub fn refund_entry(
    booking: &Booking,
    initiated_by: Uuid,
    note: &str,
    now: DateTime<Utc>,
) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        tx_type: TransactionType::Refund,
        amount: -booking.pricing.total,
        platform_fee: 0.0,
        host_payout: 0.0,
        currency: booking.pricing.currency.clone(),
        status: "completed".to_string(),
        provider_reference: booking.payment.transaction_id.clone(),
        metadata: json!({
            "initiator": initiated_by,
            "note": note,
        }),
        created_at: now,
    }
}
