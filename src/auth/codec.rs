// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 token signing and verification.
//!
//! ## Security
//!
//! - Only HS256 is accepted; tokens declaring any other algorithm are rejected
//! - Expiry is checked against an explicit `now`, never the ambient clock
//! - A token whose `exp` equals `now` is already expired
//! - Claim payloads are strongly typed and reject unknown fields

use std::fmt;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Serialize};

use super::claims::{Expiring, IdentityClaim, OtpClaim};
use super::error::{CodecError, DecodeError};

/// Login token lifetime without "remember me" (1 day).
pub const STANDARD_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Login token lifetime with "remember me" (3 days).
pub const REMEMBERED_SESSION_TTL_SECS: i64 = 3 * 24 * 60 * 60;

/// OTP verification token lifetime (1 minute).
pub const OTP_TOKEN_TTL_SECS: i64 = 60;

/// Login session length chosen at sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionLength {
    #[default]
    Standard,
    Remembered,
}

impl SessionLength {
    pub fn from_remember_me(remember_me: bool) -> Self {
        if remember_me {
            SessionLength::Remembered
        } else {
            SessionLength::Standard
        }
    }

    /// Token and cookie lifetime in seconds.
    pub fn ttl_secs(self) -> i64 {
        match self {
            SessionLength::Standard => STANDARD_SESSION_TTL_SECS,
            SessionLength::Remembered => REMEMBERED_SESSION_TTL_SECS,
        }
    }
}

/// Signs and verifies login and OTP tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    leeway_secs: i64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec for the given HMAC secret.
    pub fn new(secret: &[u8]) -> Self {
        // Expiry is enforced in `verify` against the caller's `now`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            leeway_secs: 0,
        }
    }

    /// Accept tokens up to `secs` seconds past their expiry.
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = i64::try_from(secs).unwrap_or(i64::MAX);
        self
    }

    /// Mint a login token for `subject` valid for `ttl_secs` from `now`.
    pub fn issue(
        &self,
        subject: &str,
        role_tag: &str,
        ttl_secs: i64,
        now: i64,
    ) -> Result<String, CodecError> {
        let claims = IdentityClaim {
            sub: subject.to_string(),
            role: role_tag.to_string(),
            iat: now,
            exp: expiry(now, ttl_secs)?,
        };
        self.sign(&claims)
    }

    /// Mint an OTP verification token for `email`.
    pub fn issue_otp(&self, email: &str, ttl_secs: i64, now: i64) -> Result<String, CodecError> {
        let claims = OtpClaim {
            otp: None,
            email: email.to_string(),
            iat: now,
            exp: expiry(now, ttl_secs)?,
        };
        self.sign(&claims)
    }

    /// Verify a login token at time `now`.
    pub fn decode(&self, token: &str, now: i64) -> Result<IdentityClaim, DecodeError> {
        self.verify(token, now)
    }

    /// Verify an OTP verification token at time `now`.
    pub fn decode_otp(&self, token: &str, now: i64) -> Result<OtpClaim, DecodeError> {
        self.verify(token, now)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, CodecError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    fn verify<T>(&self, token: &str, now: i64) -> Result<T, DecodeError>
    where
        T: DeserializeOwned + Expiring,
    {
        let token_data =
            decode::<T>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => DecodeError::InvalidSignature,
                    _ => DecodeError::Malformed,
                }
            })?;

        let claims = token_data.claims;
        if now >= claims.expires_at().saturating_add(self.leeway_secs) {
            return Err(DecodeError::Expired);
        }

        Ok(claims)
    }
}

fn expiry(now: i64, ttl_secs: i64) -> Result<i64, CodecError> {
    if ttl_secs <= 0 {
        return Err(CodecError::InvalidTtl(ttl_secs));
    }
    Ok(now.saturating_add(ttl_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const SECRET: &[u8] = b"test-secret-for-manga-portal";
    const NOW: i64 = 1_700_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET)
    }

    fn with_signature(token: &str, signature: &[u8]) -> String {
        let (signed_part, _) = token.rsplit_once('.').unwrap();
        format!("{signed_part}.{}", URL_SAFE_NO_PAD.encode(signature))
    }

    #[test]
    fn issue_then_decode_round_trips() {
        let codec = codec();
        let token = codec.issue("42", "0", STANDARD_SESSION_TTL_SECS, NOW).unwrap();

        let claims = codec.decode(&token, NOW + 10).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, "0");
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + STANDARD_SESSION_TTL_SECS);
    }

    #[test]
    fn token_is_compact_three_segments() {
        let token = codec().issue("7", "2", 60, NOW).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn flipping_any_signature_bit_is_rejected() {
        let codec = codec();
        let token = codec.issue("42", "2", 3600, NOW).unwrap();
        let (_, signature_b64) = token.rsplit_once('.').unwrap();
        let signature = URL_SAFE_NO_PAD.decode(signature_b64).unwrap();

        for byte in 0..signature.len() {
            for bit in 0..8 {
                let mut tampered = signature.clone();
                tampered[byte] ^= 1 << bit;
                let forged = with_signature(&token, &tampered);
                assert_eq!(
                    codec.decode(&forged, NOW),
                    Err(DecodeError::InvalidSignature),
                    "byte {byte} bit {bit}"
                );
            }
        }
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let token = TokenCodec::new(b"secret-one").issue("1", "0", 60, NOW).unwrap();
        let result = TokenCodec::new(b"secret-two").decode(&token, NOW);
        assert_eq!(result, Err(DecodeError::InvalidSignature));
    }

    #[test]
    fn tampered_payload_is_invalid_signature() {
        let codec = codec();
        let token = codec.issue("42", "2", 3600, NOW).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_payload = URL_SAFE_NO_PAD
            .encode(format!(r#"{{"id":"42","role":"0","iat":{NOW},"exp":{}}}"#, NOW + 3600));
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(codec.decode(&forged, NOW), Err(DecodeError::InvalidSignature));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let codec = codec();
        let token = codec.issue("42", "2", 100, NOW).unwrap();
        let exp = NOW + 100;

        assert!(codec.decode(&token, exp - 1).is_ok());
        assert_eq!(codec.decode(&token, exp), Err(DecodeError::Expired));
        assert_eq!(codec.decode(&token, exp + 1), Err(DecodeError::Expired));
    }

    #[test]
    fn leeway_extends_the_boundary() {
        let codec = codec().with_leeway(30);
        let token = codec.issue("42", "2", 100, NOW).unwrap();
        let exp = NOW + 100;

        assert!(codec.decode(&token, exp + 29).is_ok());
        assert_eq!(codec.decode(&token, exp + 30), Err(DecodeError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        assert_eq!(codec.decode("", NOW), Err(DecodeError::Malformed));
        assert_eq!(codec.decode("not-a-token", NOW), Err(DecodeError::Malformed));
        assert_eq!(codec.decode("a.b.c", NOW), Err(DecodeError::Malformed));
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let claims = IdentityClaim {
            sub: "42".to_string(),
            role: "0".to_string(),
            iat: NOW,
            exp: NOW + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(codec().decode(&token, NOW), Err(DecodeError::Malformed));
    }

    #[test]
    fn otp_and_login_tokens_are_not_interchangeable() {
        let codec = codec();
        let otp = codec.issue_otp("reader@example.com", OTP_TOKEN_TTL_SECS, NOW).unwrap();
        let login = codec.issue("42", "0", 60, NOW).unwrap();

        assert_eq!(codec.decode(&otp, NOW), Err(DecodeError::Malformed));
        assert_eq!(codec.decode_otp(&login, NOW), Err(DecodeError::Malformed));
        assert_eq!(codec.decode_otp(&otp, NOW).unwrap().email, "reader@example.com");
    }

    #[test]
    fn otp_token_expires_after_a_minute() {
        let codec = codec();
        let otp = codec.issue_otp("reader@example.com", OTP_TOKEN_TTL_SECS, NOW).unwrap();
        assert!(codec.decode_otp(&otp, NOW + 59).is_ok());
        assert_eq!(codec.decode_otp(&otp, NOW + 60), Err(DecodeError::Expired));
    }

    #[test]
    fn non_positive_ttl_is_refused() {
        let result = codec().issue("42", "0", 0, NOW);
        assert!(matches!(result, Err(CodecError::InvalidTtl(0))));
    }

    #[test]
    fn session_length_follows_remember_me() {
        assert_eq!(SessionLength::from_remember_me(false).ttl_secs(), 86_400);
        assert_eq!(SessionLength::from_remember_me(true).ttl_secs(), 259_200);
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let rendered = format!("{:?}", codec());
        assert!(!rendered.contains("test-secret"));
    }
}
