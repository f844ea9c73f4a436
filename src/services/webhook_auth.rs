use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const TOLERANCE_SECS: i64 = 300; // 5 minutes

/// Verify a payment-provider webhook signature using HMAC-SHA256.
///
/// Parses the signature header (format: `t=<timestamp>,v1=<signature>`),
/// constructs the signed payload `<timestamp>.<body>`, computes HMAC-SHA256
/// with the shared secret, and uses constant-time comparison. Rejects
/// signatures older than 5 minutes to prevent replay.
pub fn verify_webhook_signature(
    payload: &str,
    signature_header: &str,
    webhook_secret: &str,
) -> bool {
    verify_at(payload, signature_header, webhook_secret, chrono::Utc::now().timestamp())
}

fn verify_at(payload: &str, signature_header: &str, webhook_secret: &str, now: i64) -> bool {
    let mut timestamp: Option<&str> = None;
    let mut signature: Option<&str> = None;

    for part in signature_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(v1) = part.strip_prefix("v1=") {
            signature = Some(v1);
        }
    }

    let (Some(ts_str), Some(expected_hex)) = (timestamp, signature) else {
        return false;
    };

    let Ok(ts) = ts_str.parse::<i64>() else {
        return false;
    };

    if (now - ts).abs() > TOLERANCE_SECS {
        tracing::warn!("Webhook signature too old: delta={}s", (now - ts).abs());
        return false;
    }

    let signed_payload = format!("{ts_str}.{payload}");

    let Ok(mut mac) = HmacSha256::new_from_slice(webhook_secret.as_bytes()) else {
        return false;
    };
    mac.update(signed_payload.as_bytes());

    let Ok(expected_bytes) = hex_decode(expected_hex) else {
        return false;
    };

    mac.verify_slice(&expected_bytes).is_ok()
}

fn hex_decode(hex: &str) -> Result<Vec<u8>, ()> {
    if hex.len() % 2 != 0 {
        return Err(());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    fn sign(payload: &str, secret: &str, ts: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{ts}.{payload}").as_bytes());
        let digest = mac.finalize().into_bytes();
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        format!("t={ts},v1={hex}")
    }

    #[test]
    fn accepts_a_valid_signature() {
        let payload = r#"{"booking_id":"abc"}"#;
        let header = sign(payload, "whsec_test", 1_700_000_000);
        assert!(verify_at(payload, &header, "whsec_test", 1_700_000_000));
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let header = sign(r#"{"amount":100}"#, "whsec_test", 1_700_000_000);
        assert!(!verify_at(
            r#"{"amount":10000}"#,
            &header,
            "whsec_test",
            1_700_000_000
        ));
    }

    #[test]
    fn rejects_the_wrong_secret() {
        let payload = "body";
        let header = sign(payload, "whsec_other", 1_700_000_000);
        assert!(!verify_at(payload, &header, "whsec_test", 1_700_000_000));
    }

    #[test]
    fn rejects_a_stale_signature() {
        let payload = "body";
        let header = sign(payload, "whsec_test", 1_700_000_000);
        assert!(!verify_at(
            payload,
            &header,
            "whsec_test",
            1_700_000_000 + TOLERANCE_SECS + 1
        ));
    }

    #[test]
    fn rejects_a_malformed_header() {
        assert!(!verify_at("body", "v1=deadbeef", "whsec_test", 0));
        assert!(!verify_at("body", "t=notanumber,v1=deadbeef", "whsec_test", 0));
        assert!(!verify_at("body", "", "whsec_test", 0));
    }
}
