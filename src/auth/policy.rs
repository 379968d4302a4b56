// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path-prefix access policy.
//!
//! ## Rule Selection
//!
//! A rule applies when its prefix matches the request path on a segment
//! boundary: `/admin` covers `/admin` and `/admin/genre/list` but not
//! `/administrator`. When several rules apply, the longest prefix wins and
//! ties go to the rule declared first. A path no rule covers is allowed.
//!
//! ## Requirements
//!
//! | Requirement | Satisfied by | Otherwise |
//! |-------------|--------------|-----------|
//! | `admin` | login token with the admin role tag | login page (no identity), home (wrong role) |
//! | `otp_verified` | valid `verified_otp_token` | login page |
//! | `authenticated` | any valid login token | home |
//! | `none` | anything | - |

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::session::{AnonymousCause, Credentials, OtpStatus, Session};

/// Admin area prefix unless configured otherwise.
pub const DEFAULT_ADMIN_PREFIX: &str = "/admin";

/// Condition a request must meet to reach paths under a rule's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Explicitly public
    #[serde(rename = "none", alias = "public")]
    Public,
    /// Valid OTP verification token (account verification, password reset)
    OtpVerified,
    /// Any logged-in user
    Authenticated,
    /// Logged-in user holding the admin role tag
    Admin,
}

/// A single prefix → requirement mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathRule {
    pub prefix: String,
    pub require: Requirement,
}

impl PathRule {
    pub fn new(prefix: impl Into<String>, require: Requirement) -> Self {
        Self {
            prefix: prefix.into(),
            require,
        }
    }

    /// Segment-boundary prefix match.
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Why a rule table was refused.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("rule {index}: prefix is empty")]
    EmptyPrefix { index: usize },
    #[error("rule {index}: prefix {prefix:?} must start with '/'")]
    RelativePrefix { index: usize, prefix: String },
    #[error("rule {index}: prefix {prefix:?} is already declared")]
    DuplicatePrefix { index: usize, prefix: String },
    #[error("rule table is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read rule file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Validated, ordered list of path rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    rules: Vec<PathRule>,
}

impl PolicyTable {
    /// Validate and normalise a rule list.
    ///
    /// Trailing slashes are dropped (`/profile/` becomes `/profile`).
    pub fn new(rules: Vec<PathRule>) -> Result<Self, RuleError> {
        let mut normalised: Vec<PathRule> = Vec::with_capacity(rules.len());

        for (index, rule) in rules.into_iter().enumerate() {
            let raw = rule.prefix.trim();
            if raw.is_empty() {
                return Err(RuleError::EmptyPrefix { index });
            }
            if !raw.starts_with('/') {
                return Err(RuleError::RelativePrefix {
                    index,
                    prefix: raw.to_string(),
                });
            }

            let trimmed = raw.trim_end_matches('/');
            let prefix = if trimmed.is_empty() { "/" } else { trimmed };

            if normalised.iter().any(|r| r.prefix == prefix) {
                return Err(RuleError::DuplicatePrefix {
                    index,
                    prefix: prefix.to_string(),
                });
            }
            normalised.push(PathRule::new(prefix, rule.require));
        }

        Ok(Self { rules: normalised })
    }

    /// The platform's built-in rules with the given admin prefix.
    pub fn with_admin_prefix(admin_prefix: &str) -> Result<Self, RuleError> {
        Self::new(default_rules(admin_prefix))
    }

    /// Parse a JSON array of `{ "prefix": ..., "require": ... }` objects.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let rules: Vec<PathRule> = serde_json::from_str(json)?;
        Self::new(rules)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RuleError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    /// Longest matching prefix, earliest declaration on ties.
    pub fn rule_for(&self, path: &str) -> Option<&PathRule> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(path))
            .fold(None, |best: Option<&PathRule>, rule| match best {
                Some(current) if current.prefix.len() >= rule.prefix.len() => Some(current),
                _ => Some(rule),
            })
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        // Already normalised: every prefix is absolute and distinct.
        Self {
            rules: default_rules(DEFAULT_ADMIN_PREFIX),
        }
    }
}

fn default_rules(admin_prefix: &str) -> Vec<PathRule> {
    vec![
        PathRule::new(admin_prefix, Requirement::Admin),
        PathRule::new("/account/verify", Requirement::OtpVerified),
        PathRule::new("/account/reset-password", Requirement::OtpVerified),
        PathRule::new("/profile", Requirement::Authenticated),
        PathRule::new("/order", Requirement::Authenticated),
    ]
}

/// Why a request was redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingToken,
    MalformedToken,
    InvalidSignature,
    Expired,
    WrongRole,
    MissingOtpToken,
    InvalidOtpToken,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::MissingToken => "missing_token",
            DenyReason::MalformedToken => "malformed_token",
            DenyReason::InvalidSignature => "invalid_signature",
            DenyReason::Expired => "expired",
            DenyReason::WrongRole => "wrong_role",
            DenyReason::MissingOtpToken => "missing_otp_token",
            DenyReason::InvalidOtpToken => "invalid_otp_token",
        }
    }
}

impl From<AnonymousCause> for DenyReason {
    fn from(cause: AnonymousCause) -> Self {
        match cause {
            AnonymousCause::MissingToken => DenyReason::MissingToken,
            AnonymousCause::Malformed => DenyReason::MalformedToken,
            AnonymousCause::InvalidSignature => DenyReason::InvalidSignature,
            AnonymousCause::Expired => DenyReason::Expired,
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request outcome of the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Hand the request to the downstream handler unchanged
    Allow,
    /// Send the browser to the login page
    RedirectLogin(DenyReason),
    /// Send the browser to the home page
    RedirectHome(DenyReason),
}

impl AccessDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::RedirectLogin(reason) | AccessDecision::RedirectHome(reason) => {
                Some(*reason)
            }
        }
    }
}

/// Evaluates requests against a fixed rule table.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    table: PolicyTable,
    admin_tag: String,
}

impl AccessPolicy {
    pub fn new(table: PolicyTable, admin_tag: impl Into<String>) -> Self {
        Self {
            table,
            admin_tag: admin_tag.into(),
        }
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Decide what happens to a request for `path`.
    ///
    /// Any query string or fragment on `path` is ignored.
    pub fn evaluate(&self, path: &str, credentials: &Credentials) -> AccessDecision {
        let path = path.split(['?', '#']).next().unwrap_or_default();

        match self.table.rule_for(path) {
            Some(rule) => self.apply(rule.require, credentials),
            None => AccessDecision::Allow,
        }
    }

    fn apply(&self, requirement: Requirement, credentials: &Credentials) -> AccessDecision {
        match requirement {
            Requirement::Public => AccessDecision::Allow,
            Requirement::Admin => match &credentials.session {
                Session::Authenticated(user) if user.role_tag == self.admin_tag => {
                    AccessDecision::Allow
                }
                Session::Authenticated(_) => AccessDecision::RedirectHome(DenyReason::WrongRole),
                Session::Anonymous(cause) => AccessDecision::RedirectLogin((*cause).into()),
            },
            Requirement::OtpVerified => match &credentials.otp {
                OtpStatus::Verified(_) => AccessDecision::Allow,
                OtpStatus::Missing => AccessDecision::RedirectLogin(DenyReason::MissingOtpToken),
                OtpStatus::Invalid(_) => AccessDecision::RedirectLogin(DenyReason::InvalidOtpToken),
            },
            Requirement::Authenticated => match &credentials.session {
                Session::Authenticated(_) => AccessDecision::Allow,
                Session::Anonymous(cause) => AccessDecision::RedirectHome((*cause).into()),
            },
        }
    }
}
