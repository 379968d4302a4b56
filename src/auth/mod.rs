// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cookie-based authentication and path access policy for the manga portal.
//!
//! ## Auth Flow
//!
//! 1. The login handler (outside this crate) checks credentials and sets the
//!    `accessToken` cookie with a token minted by [`TokenCodec::issue`]
//! 2. OTP flows (registration, password reset) set a short-lived
//!    `verified_otp_token` cookie minted by [`TokenCodec::issue_otp`]
//! 3. On every request the access gate:
//!    - verifies both cookies (HS256 signature, expiry)
//!    - picks the path rule for the request path
//!    - forwards the request or redirects to `/account/login` or `/`
//!
//! ## Security
//!
//! - Tokens are checked against an explicit clock value; `exp == now` is expired
//! - Unknown or missing claim fields reject the token
//! - The rule table and secret are fixed at startup

pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod policy;
pub mod roles;
pub mod session;

pub use claims::{AuthenticatedUser, IdentityClaim, OtpClaim};
pub use codec::{SessionLength, TokenCodec};
pub use error::{AuthError, CodecError, DecodeError};
pub use extractor::Auth;
pub use middleware::{access_gate, with_access_gate, AccessGate};
pub use policy::{AccessDecision, AccessPolicy, DenyReason, PathRule, PolicyTable, Requirement};
pub use roles::Role;
pub use session::{Credentials, Session, SessionGate};
