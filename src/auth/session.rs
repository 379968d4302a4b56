// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session gate: resolves request cookies into credentials.
//!
//! A missing or unverifiable token is never an error here. It yields an
//! anonymous session and the access policy decides what that means for the
//! requested path.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};

use super::claims::{AuthenticatedUser, OtpClaim};
use super::codec::{SessionLength, TokenCodec, OTP_TOKEN_TTL_SECS};
use super::error::DecodeError;

/// Cookie carrying the login token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie carrying the OTP verification token.
pub const OTP_TOKEN_COOKIE: &str = "verified_otp_token";

/// Why a request has no authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnonymousCause {
    MissingToken,
    Malformed,
    InvalidSignature,
    Expired,
}

impl From<DecodeError> for AnonymousCause {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Malformed => AnonymousCause::Malformed,
            DecodeError::InvalidSignature => AnonymousCause::InvalidSignature,
            DecodeError::Expired => AnonymousCause::Expired,
        }
    }
}

/// Outcome of reading the login cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Authenticated(AuthenticatedUser),
    Anonymous(AnonymousCause),
}

/// Outcome of reading the OTP verification cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpStatus {
    Verified(OtpClaim),
    Missing,
    Invalid(DecodeError),
}

/// Everything the access policy looks at for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub session: Session,
    pub otp: OtpStatus,
}

impl Credentials {
    /// No cookies at all.
    pub fn anonymous() -> Self {
        Self {
            session: Session::Anonymous(AnonymousCause::MissingToken),
            otp: OtpStatus::Missing,
        }
    }
}

/// Reads auth cookies and verifies them through the token codec.
#[derive(Debug, Clone)]
pub struct SessionGate {
    codec: TokenCodec,
    admin_tag: String,
}

impl SessionGate {
    pub fn new(codec: TokenCodec, admin_tag: impl Into<String>) -> Self {
        Self {
            codec,
            admin_tag: admin_tag.into(),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Resolve the `accessToken` cookie into a session.
    pub fn authenticate(&self, headers: &HeaderMap, now: i64) -> Session {
        let Some(token) = cookie_value(headers, ACCESS_TOKEN_COOKIE) else {
            return Session::Anonymous(AnonymousCause::MissingToken);
        };

        match self.codec.decode(token, now) {
            Ok(claims) => Session::Authenticated(AuthenticatedUser::from_claims(
                claims,
                &self.admin_tag,
            )),
            Err(err) => {
                tracing::debug!(error = %err, "Access token rejected");
                Session::Anonymous(err.into())
            }
        }
    }

    /// Resolve the `verified_otp_token` cookie.
    pub fn otp_status(&self, headers: &HeaderMap, now: i64) -> OtpStatus {
        let Some(token) = cookie_value(headers, OTP_TOKEN_COOKIE) else {
            return OtpStatus::Missing;
        };

        match self.codec.decode_otp(token, now) {
            Ok(claims) => OtpStatus::Verified(claims),
            Err(err) => {
                tracing::debug!(error = %err, "OTP verification token rejected");
                OtpStatus::Invalid(err)
            }
        }
    }

    pub fn credentials(&self, headers: &HeaderMap, now: i64) -> Credentials {
        Credentials {
            session: self.authenticate(headers, now),
            otp: self.otp_status(headers, now),
        }
    }
}

/// Find a cookie by name across all `Cookie` headers.
///
/// Empty values are treated as absent, so a later non-empty pair with the
/// same name still counts.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| key.trim() == name)
        .map(|(_, val)| val.trim())
        .find(|val| !val.is_empty())
}

/// `Set-Cookie` value carrying a freshly issued login token.
pub fn access_token_cookie(
    token: &str,
    length: SessionLength,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(ACCESS_TOKEN_COOKIE, token, length.ttl_secs(), secure)
}

/// `Set-Cookie` value that removes the login token.
pub fn clear_access_token_cookie(secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(ACCESS_TOKEN_COOKIE, "", 0, secure)
}

/// `Set-Cookie` value carrying an OTP verification token.
pub fn otp_token_cookie(token: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(OTP_TOKEN_COOKIE, token, OTP_TOKEN_TTL_SECS, secure)
}

/// `Set-Cookie` value that removes the OTP verification token.
pub fn clear_otp_token_cookie(secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(OTP_TOKEN_COOKIE, "", 0, secure)
}

fn build_cookie(
    name: &str,
    value: &str,
    max_age_secs: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    // Secure only when the frontend is served over HTTPS.
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    const NOW: i64 = 1_700_000_000;

    fn gate() -> SessionGate {
        SessionGate::new(TokenCodec::new(b"session-test-secret"), "0")
    }

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn cookie_value_finds_named_pair() {
        let headers = headers_with_cookie("theme=dark; accessToken=abc.def.ghi; lang=vi");
        assert_eq!(cookie_value(&headers, "accessToken"), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, "lang"), Some("vi"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_value_ignores_empty_and_prefix_names() {
        let headers = headers_with_cookie("xaccessToken=zzz; accessToken=");
        assert_eq!(cookie_value(&headers, "accessToken"), None);
    }

    #[test]
    fn cookie_value_skips_empty_duplicate() {
        let headers = headers_with_cookie("accessToken=; accessToken=abc.def.ghi");
        assert_eq!(cookie_value(&headers, "accessToken"), Some("abc.def.ghi"));

        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("verified_otp_token="));
        headers.append(COOKIE, HeaderValue::from_static("verified_otp_token=t"));
        assert_eq!(cookie_value(&headers, OTP_TOKEN_COOKIE), Some("t"));
    }

    #[test]
    fn empty_then_valid_access_cookie_authenticates() {
        let gate = gate();
        let token = gate.codec().issue("42", "2", 3600, NOW).unwrap();
        let headers = headers_with_cookie(&format!("accessToken=; accessToken={token}"));

        assert!(matches!(
            gate.authenticate(&headers, NOW),
            Session::Authenticated(user) if user.user_id == "42"
        ));
    }

    #[test]
    fn login_service_payload_authenticates() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let payload = serde_json::json!({"id": 42, "role": 0, "iat": NOW, "exp": NOW + 86400});
        let token = encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(b"session-test-secret"),
        )
        .unwrap();
        let headers = headers_with_cookie(&format!("accessToken={token}"));

        let Session::Authenticated(user) = gate().authenticate(&headers, NOW) else {
            panic!("expected an authenticated session");
        };
        assert_eq!(user.user_id, "42");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn forgot_password_payload_is_verified() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let payload = serde_json::json!({
            "otp": "123456",
            "email": "reader@example.com",
            "iat": NOW,
            "exp": NOW + 60,
        });
        let token = encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(b"session-test-secret"),
        )
        .unwrap();
        let headers = headers_with_cookie(&format!("verified_otp_token={token}"));

        let OtpStatus::Verified(claims) = gate().otp_status(&headers, NOW) else {
            panic!("expected a verified OTP token");
        };
        assert_eq!(claims.email, "reader@example.com");
        assert_eq!(claims.otp.as_deref(), Some("123456"));
    }

    #[test]
    fn cookie_value_reads_every_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("verified_otp_token=t"));
        assert_eq!(cookie_value(&headers, OTP_TOKEN_COOKIE), Some("t"));
    }

    #[test]
    fn missing_cookie_is_anonymous() {
        let session = gate().authenticate(&HeaderMap::new(), NOW);
        assert_eq!(session, Session::Anonymous(AnonymousCause::MissingToken));
    }

    #[test]
    fn valid_cookie_is_authenticated() {
        let gate = gate();
        let token = gate.codec().issue("42", "0", 3600, NOW).unwrap();
        let headers = headers_with_cookie(&format!("accessToken={token}"));

        let Session::Authenticated(user) = gate.authenticate(&headers, NOW) else {
            panic!("expected an authenticated session");
        };
        assert_eq!(user.user_id, "42");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn decode_failures_become_anonymous() {
        let gate = gate();
        let expired = gate.codec().issue("42", "2", 10, NOW).unwrap();

        let headers = headers_with_cookie(&format!("accessToken={expired}"));
        assert_eq!(
            gate.authenticate(&headers, NOW + 10),
            Session::Anonymous(AnonymousCause::Expired)
        );

        let headers = headers_with_cookie("accessToken=garbage");
        assert_eq!(
            gate.authenticate(&headers, NOW),
            Session::Anonymous(AnonymousCause::Malformed)
        );

        let foreign = TokenCodec::new(b"another-secret").issue("42", "0", 60, NOW).unwrap();
        let headers = headers_with_cookie(&format!("accessToken={foreign}"));
        assert_eq!(
            gate.authenticate(&headers, NOW),
            Session::Anonymous(AnonymousCause::InvalidSignature)
        );
    }

    #[test]
    fn otp_status_validates_the_token() {
        let gate = gate();
        assert_eq!(gate.otp_status(&HeaderMap::new(), NOW), OtpStatus::Missing);

        let otp = gate.codec().issue_otp("reader@example.com", 60, NOW).unwrap();
        let headers = headers_with_cookie(&format!("verified_otp_token={otp}"));
        assert!(matches!(gate.otp_status(&headers, NOW), OtpStatus::Verified(_)));
        assert_eq!(
            gate.otp_status(&headers, NOW + 60),
            OtpStatus::Invalid(DecodeError::Expired)
        );

        let headers = headers_with_cookie("verified_otp_token=present-but-bogus");
        assert_eq!(
            gate.otp_status(&headers, NOW),
            OtpStatus::Invalid(DecodeError::Malformed)
        );
    }

    #[test]
    fn access_cookie_carries_session_length() {
        let cookie = access_token_cookie("t0k", SessionLength::Remembered, false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "accessToken=t0k; Path=/; HttpOnly; SameSite=Lax; Max-Age=259200"
        );

        let cookie = access_token_cookie("t0k", SessionLength::Standard, true).unwrap();
        assert!(cookie.to_str().unwrap().ends_with("Max-Age=86400; Secure"));
    }

    #[test]
    fn clearing_cookies_expires_them() {
        let cookie = clear_access_token_cookie(false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "accessToken=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
        let cookie = clear_otp_token_cookie(true).unwrap();
        assert!(cookie.to_str().unwrap().starts_with("verified_otp_token=; "));
    }

    #[test]
    fn otp_cookie_lives_one_minute() {
        let cookie = otp_token_cookie("otp", false).unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=60"));
    }

    #[test]
    fn issued_cookie_round_trips_through_the_gate() {
        let gate = gate();
        let token = gate.codec().issue("9", "2", SessionLength::Standard.ttl_secs(), NOW).unwrap();
        let set_cookie = access_token_cookie(&token, SessionLength::Standard, false).unwrap();
        let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();

        let headers = headers_with_cookie(&pair);
        assert!(matches!(
            gate.authenticate(&headers, NOW),
            Session::Authenticated(user) if user.user_id == "9"
        ));
    }

    #[test]
    fn credentials_bundle_both_cookies() {
        let gate = gate();
        let login = gate.codec().issue("42", "2", 60, NOW).unwrap();
        let otp = gate.codec().issue_otp("reader@example.com", 60, NOW).unwrap();
        let headers = headers_with_cookie(&format!("accessToken={login}; verified_otp_token={otp}"));

        let credentials = gate.credentials(&headers, NOW);
        assert!(matches!(credentials.session, Session::Authenticated(_)));
        assert!(matches!(credentials.otp, OtpStatus::Verified(_)));
    }
}
