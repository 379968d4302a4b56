// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role tag that marks an administrator unless configured otherwise.
pub const DEFAULT_ADMIN_ROLE_TAG: &str = "0";

/// Platform roles.
///
/// ## Roles
///
/// - `Admin` - Back-office access (genres, manga, chapters, users, authors)
/// - `Uploader` - Approved uploader, manages own manga
/// - `Reader` - Regular reader account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Registered uploader
    Uploader,
    /// Normal reader
    Reader,
}

impl Role {
    /// Classify the raw role tag carried in a token.
    ///
    /// Only the exact admin tag grants `Admin`. Unknown tags fall back to
    /// `Reader`.
    pub fn from_tag(tag: &str, admin_tag: &str) -> Role {
        if tag == admin_tag {
            return Role::Admin;
        }
        if tag.eq_ignore_ascii_case("uploader") {
            return Role::Uploader;
        }
        Role::Reader
    }
}
