use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::domain::clock::{Clock, TimestampMs};

type HmacSha256 = Hmac<Sha256>;

pub const SIGN_METHOD: &str = "HMAC-SHA256";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Header values authenticating one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub timestamp: String,
    pub signature: String,
}

/// Computes request signatures for the device cloud.
///
/// The string to sign is
/// `access_id + token + t + METHOD + "\n" + sha256_hex(body) + "\n\n" + path`,
/// keyed with the access secret and rendered as uppercase hex.
#[derive(Clone)]
pub struct Signer {
    access_id: String,
    keyed_mac: HmacSha256,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_id", &self.access_id)
            .finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(access_id: &str, access_secret: &str) -> Self {
        // HMAC pads or hashes the key to the block size, so every length is valid.
        let keyed_mac = HmacSha256::new_from_slice(access_secret.as_bytes())
            .expect("HMAC-SHA256 accepts keys of any length");

        Self {
            access_id: access_id.to_string(),
            keyed_mac,
        }
    }

    pub fn access_id(&self) -> &str {
        &self.access_id
    }

    pub fn sign<C: Clock + ?Sized>(
        &self,
        clock: &C,
        method: HttpMethod,
        path: &str,
        body: &str,
        token: Option<&str>,
    ) -> SignedRequest {
        self.sign_at(clock.now(), method, path, body, token)
    }

    pub fn sign_at(
        &self,
        now: TimestampMs,
        method: HttpMethod,
        path: &str,
        body: &str,
        token: Option<&str>,
    ) -> SignedRequest {
        let timestamp = now.0.to_string();
        let body_hash = hex::encode(Sha256::digest(body.as_bytes()));
        let message = format!(
            "{}{}{}{}\n{}\n\n{}",
            self.access_id,
            token.unwrap_or_default(),
            timestamp,
            method.as_str(),
            body_hash,
            path
        );

        let mut mac = self.keyed_mac.clone();
        mac.update(message.as_bytes());
        let signature = hex::encode_upper(mac.finalize().into_bytes());

        SignedRequest {
            timestamp,
            signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    use super::{HttpMethod, Signer};
    use crate::domain::clock::{FixedClock, TimestampMs};

    const ACCESS_ID: &str = "test-access-id";
    const ACCESS_SECRET: &str = "test-access-secret";
    const EMPTY_BODY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn signer() -> Signer {
        Signer::new(ACCESS_ID, ACCESS_SECRET)
    }

    fn reference_signature(message: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(ACCESS_SECRET.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(message.as_bytes());
        hex::encode_upper(mac.finalize().into_bytes())
    }

    #[test]
    fn renders_timestamp_as_decimal_milliseconds() {
        let signed = signer().sign(
            &FixedClock(TimestampMs(1_700_000_000_123)),
            HttpMethod::Get,
            "/v1.0/token?grant_type=1",
            "",
            None,
        );

        assert_eq!(signed.timestamp, "1700000000123");
    }

    #[test]
    fn signs_token_grant_without_token() {
        let path = "/v1.0/token?grant_type=1";
        let signed = signer().sign_at(TimestampMs(1_700_000_000_000), HttpMethod::Get, path, "", None);

        let expected = reference_signature(&format!(
            "{ACCESS_ID}1700000000000GET\n{EMPTY_BODY_SHA256}\n\n{path}"
        ));
        assert_eq!(signed.signature, expected);
    }

    #[test]
    fn includes_token_and_body_hash_in_message() {
        let path = "/v1.0/devices/dev-1/commands";
        let body = r#"{"commands":[{"code":"switch_1","value":true}]}"#;
        let signed = signer().sign_at(
            TimestampMs(1_700_000_000_000),
            HttpMethod::Post,
            path,
            body,
            Some("tok-1"),
        );

        let body_hash = {
            use sha2::Digest;
            hex::encode(Sha256::digest(body.as_bytes()))
        };
        let expected = reference_signature(&format!(
            "{ACCESS_ID}tok-11700000000000POST\n{body_hash}\n\n{path}"
        ));
        assert_eq!(signed.signature, expected);
    }

    #[test]
    fn signature_is_uppercase_hex_of_sha256_length() {
        let signed = signer().sign_at(TimestampMs(1), HttpMethod::Get, "/", "", None);

        assert_eq!(signed.signature.len(), 64);
        assert!(
            signed
                .signature
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn identical_inputs_at_same_instant_sign_identically() {
        let clock = FixedClock(TimestampMs(1_700_000_000_500));
        let signer = signer();

        let first = signer.sign(&clock, HttpMethod::Get, "/v1.0/devices/a/status", "", Some("t"));
        let second = signer.sign(&clock, HttpMethod::Get, "/v1.0/devices/a/status", "", Some("t"));

        assert_eq!(first, second);
    }

    #[test]
    fn different_instants_produce_different_signatures() {
        let signer = signer();

        let first = signer.sign_at(TimestampMs(1_700_000_000_000), HttpMethod::Get, "/p", "", None);
        let second = signer.sign_at(TimestampMs(1_700_000_000_001), HttpMethod::Get, "/p", "", None);

        assert_ne!(first.signature, second.signature);
    }

    #[test]
    fn empty_token_matches_absent_token() {
        let signer = signer();

        let absent = signer.sign_at(TimestampMs(42), HttpMethod::Get, "/p", "", None);
        let empty = signer.sign_at(TimestampMs(42), HttpMethod::Get, "/p", "", Some(""));

        assert_eq!(absent, empty);
    }

    #[test]
    fn accepts_empty_and_oversized_secrets() {
        let long_secret = "s".repeat(200);

        let empty =
            Signer::new(ACCESS_ID, "").sign_at(TimestampMs(1), HttpMethod::Get, "/", "", None);
        let long = Signer::new(ACCESS_ID, &long_secret).sign_at(
            TimestampMs(1),
            HttpMethod::Get,
            "/",
            "",
            None,
        );

        assert_eq!(empty.signature.len(), 64);
        assert_ne!(empty.signature, long.signature);
    }
}
