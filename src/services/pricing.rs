use crate::domain::{Listing, PricingSnapshot};

/// Round to two decimal places, the resolution of every stored amount.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The division of a booking's total into platform fee and host payout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub platform_fee: f64,
    pub host_amount: f64,
}

/// `platform_fee = round(total * fee_percent / 100)`, host gets the rest,
/// both floored at zero. Conservation (`fee + host == total`) holds by
/// construction.
pub fn compute_split(total: f64, fee_percent: f64) -> Split {
    let platform_fee = round_money(total * fee_percent / 100.0).max(0.0);
    let host_amount = round_money(total - platform_fee).max(0.0);
    Split {
        platform_fee,
        host_amount,
    }
}

/// Build the pricing snapshot captured at booking creation. Service fee and
/// taxes are percentages of the subtotal; the cleaning fee comes from the
/// listing. The snapshot is immutable afterwards.
pub fn build_snapshot(
    listing: &Listing,
    nights: i64,
    service_fee_percent: f64,
    tax_percent: f64,
) -> PricingSnapshot {
    let subtotal = round_money(listing.nightly_rate * nights as f64);
    let cleaning_fee = round_money(listing.cleaning_fee);
    let service_fee = round_money(subtotal * service_fee_percent / 100.0);
    let taxes = round_money(subtotal * tax_percent / 100.0);
    let total = round_money(subtotal + cleaning_fee + service_fee + taxes);
    PricingSnapshot {
        nightly_rate: listing.nightly_rate,
        nights,
        subtotal,
        cleaning_fee,
        service_fee,
        taxes,
        total,
        currency: listing.currency.clone(),
    }
}
