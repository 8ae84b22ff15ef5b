use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// CJDropshipping request signature: hex HMAC-SHA256 of
/// `appKey{app_key}timestamp{timestamp_ms}` keyed by the account secret.
pub fn cj_signature(app_key: &str, secret_key: &str, timestamp_ms: i64) -> String {
    let payload = format!("appKey{app_key}timestamp{timestamp_ms}");
    hmac_hex(secret_key.as_bytes(), payload.as_bytes())
}

pub fn webhook_signature(secret: &str, body: &[u8]) -> String {
    hmac_hex(secret.as_bytes(), body)
}

/// Constant-time check of a hex signature over a raw webhook body.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Some(expected) = decode_hex(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn hmac_hex(secret: &[u8], payload: &[u8]) -> String {
    // HMAC accepts keys of any length, so this never falls through.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload);
    encode_hex(mac.finalize().into_bytes().as_slice())
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn decode_hex(raw: &str) -> Option<Vec<u8>> {
    if raw.len() % 2 != 0 {
        return None;
    }
    (0..raw.len())
        .step_by(2)
        .map(|index| raw.get(index..index + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{cj_signature, decode_hex, verify_webhook_signature, webhook_signature};

    #[test]
    fn cj_signature_depends_on_key_and_timestamp() {
        let signature = cj_signature("key", "secret", 1_700_000_000_000);
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(signature, cj_signature("key", "secret", 1_700_000_000_000));
        assert_ne!(signature, cj_signature("key", "secret", 1_700_000_000_001));
        assert_ne!(signature, cj_signature("other", "secret", 1_700_000_000_000));
    }

    #[test]
    fn webhook_signature_round_trip() {
        let body = br#"{"event":"order.shipped"}"#;
        let signature = webhook_signature("whsec", body);

        assert!(verify_webhook_signature("whsec", body, &signature));
        assert!(!verify_webhook_signature("other", body, &signature));
        assert!(!verify_webhook_signature("whsec", b"{}", &signature));
        assert!(!verify_webhook_signature("whsec", body, "zz"));
    }

    #[test]
    fn decode_hex_rejects_odd_and_non_hex_input() {
        assert_eq!(decode_hex("0aff"), Some(vec![0x0a, 0xff]));
        assert_eq!(decode_hex("abc"), None);
        assert_eq!(decode_hex("zz"), None);
    }

    #[test]
    fn cj_signature_signs_the_documented_payload() {
        assert_eq!(
            cj_signature("key", "secret", 1_700_000_000_000),
            webhook_signature("secret", b"appKeykeytimestamp1700000000000")
        );
    }

    #[test]
    fn known_hmac_vector() {
        // RFC 4231 test case 2.
        let signature = webhook_signature("Jefe", b"what do ya want for nothing?");
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
