// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Manga Portal Gate - session and route access control
//!
//! This crate decides, before any page is rendered, whether a request may
//! proceed or must be redirected to the login or home page. Decisions are
//! based on the signed `accessToken` cookie, the OTP verification cookie
//! and a table of protected path prefixes.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, session gate and access policy
//! - `config` - Environment configuration
//! - `state` - Shared application state

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
