//! # wl-auth-simple
//!
//! HMAC-SHA256 implementation of `CredentialVerifier`.
//! A token is `base64url(user_id:expires_unix) . hex(mac)`; anything that
//! does not parse, verify, or sit inside its validity window is rejected
//! with the same answer. The secret comes from the environment, so tokens
//! survive restarts but not secret rotation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use wl_core::error::{AppError, Result};
use wl_core::traits::CredentialVerifier;

type HmacSha256 = Hmac<Sha256>;

pub struct HmacTokenAuthority {
    key: Vec<u8>,
}

impl HmacTokenAuthority {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        mac
    }
}

fn rejected() -> AppError {
    AppError::Unauthenticated("Invalid or expired token".into())
}

impl CredentialVerifier for HmacTokenAuthority {
    fn verify(&self, token: &str) -> Result<Uuid> {
        let (encoded, signature) = token.split_once('.').ok_or_else(rejected)?;
        let payload_bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| rejected())?;
        let payload = String::from_utf8(payload_bytes).map_err(|_| rejected())?;
        let signature = hex::decode(signature).map_err(|_| rejected())?;
        self.mac(&payload)
            .verify_slice(&signature)
            .map_err(|_| rejected())?;

        let (user, expires) = payload.split_once(':').ok_or_else(rejected)?;
        let expires: i64 = expires.parse().map_err(|_| rejected())?;
        if expires < Utc::now().timestamp() {
            return Err(rejected());
        }
        Uuid::parse_str(user).map_err(|_| rejected())
    }

    fn issue(&self, user_id: Uuid, ttl: Duration) -> String {
        let expires = (Utc::now() + ttl).timestamp();
        let payload = format!("{}:{}", user_id.simple(), expires);
        let signature = hex::encode(self.mac(&payload).finalize().into_bytes());
        format!("{}.{}", URL_SAFE_NO_PAD.encode(&payload), signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_back_to_the_user() {
        let authority = HmacTokenAuthority::new("test-secret");
        let user_id = Uuid::now_v7();
        let token = authority.issue(user_id, Duration::days(7));
        assert_eq!(authority.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let authority = HmacTokenAuthority::new("test-secret");
        let token = authority.issue(Uuid::now_v7(), Duration::seconds(-10));
        assert!(authority.verify(&token).is_err());
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let authority = HmacTokenAuthority::new("test-secret");
        let token = authority.issue(Uuid::now_v7(), Duration::days(1));

        // flip the signature
        let mut forged = token.clone();
        let tail = forged.pop().unwrap();
        forged.push(if tail == '0' { '1' } else { '0' });
        assert!(authority.verify(&forged).is_err());

        // swap in a different payload under the old signature
        let other = Uuid::now_v7();
        let expires = (Utc::now() + Duration::days(1)).timestamp();
        let payload = URL_SAFE_NO_PAD.encode(format!("{}:{}", other.simple(), expires));
        let signature = token.split_once('.').unwrap().1;
        assert!(authority.verify(&format!("{payload}.{signature}")).is_err());
    }

    #[test]
    fn tokens_do_not_cross_secrets() {
        let token = HmacTokenAuthority::new("secret-a").issue(Uuid::now_v7(), Duration::days(1));
        assert!(HmacTokenAuthority::new("secret-b").verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let authority = HmacTokenAuthority::new("test-secret");
        for junk in ["", "nodot", "a.b", "!!!.???", "YWJj.00ff"] {
            assert!(authority.verify(junk).is_err(), "accepted {junk:?}");
        }
    }
}
