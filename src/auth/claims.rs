// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and authenticated user representation.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims whose validity ends at a Unix timestamp.
pub trait Expiring {
    /// Expiration timestamp (seconds since the Unix epoch).
    fn expires_at(&self) -> i64;
}

/// Claims carried by the `accessToken` login cookie.
///
/// Unknown fields are rejected so a payload minted for another purpose (for
/// example an OTP verification token) never decodes as a login identity.
///
/// The login service signs `{ id, role }`, with either value possibly
/// numeric; both are kept as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityClaim {
    /// Subject (user ID), `id` on the wire
    #[serde(rename = "id", alias = "sub", deserialize_with = "string_or_number")]
    pub sub: String,

    /// Raw role tag as stored with the account
    #[serde(deserialize_with = "string_or_number")]
    pub role: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

impl Expiring for IdentityClaim {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// Claims carried by the short-lived `verified_otp_token` cookie.
///
/// Issued when an OTP code is mailed out for registration or password reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpClaim {
    /// The mailed code itself, when the issuer embeds it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,

    /// Address the OTP code was sent to
    pub email: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

impl Expiring for OtpClaim {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(n) => n.to_string(),
    })
}

/// Authenticated user information extracted from a verified login token.
///
/// This is the type handlers receive to represent the user making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// User ID (`sub` claim)
    pub user_id: String,

    /// Classified role
    pub role: Role,

    /// Raw role tag from the token, compared against the admin tag
    #[serde(skip)]
    pub role_tag: String,

    /// Token expiration (Unix timestamp)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Build from verified claims.
    pub fn from_claims(claims: IdentityClaim, admin_tag: &str) -> Self {
        Self {
            user_id: claims.sub,
            role: Role::from_tag(&claims.role, admin_tag),
            role_tag: claims.role,
            expires_at: claims.exp,
        }
    }
}
