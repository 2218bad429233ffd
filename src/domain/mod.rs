//! Domain primitives shared by the services and the HTTP layer.
//!
//! Roles and account statuses are stored as plain strings in the database;
//! these enums are the only place that knows the accepted spellings.

pub mod policy;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account role. Admins bypass every role and ownership rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Author,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Author => "author",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "author" => Ok(Self::Author),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

/// Account status. Banned accounts are rejected on every authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Banned,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Banned => "banned",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "banned" => Ok(Self::Banned),
            other => Err(format!("Unknown account status '{other}'")),
        }
    }
}

/// The caller resolved from a session token, re-read from the credential
/// store on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl Identity {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Stories are addressed by id on most routes and by title on the
/// moderation routes. Both resolve to an id before any rule is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryRef {
    Id(Uuid),
    Title(String),
}

impl fmt::Display for StoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Title(title) => write!(f, "'{title}'"),
        }
    }
}

/// Sort order enumeration to replace boolean blindness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn is_ascending(&self) -> bool {
        matches!(self, Self::Asc)
    }
}

/// 1-based page window, clamped the same way on every paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    pub const DEFAULT_LIMIT: u64 = 10;
    pub const MAX_LIMIT: u64 = 100;
    /// The store binds offsets as signed 64-bit integers.
    pub const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();
    /// Highest page whose offset still fits at `MAX_LIMIT`.
    pub const MAX_PAGE: u64 = Self::MAX_OFFSET / Self::MAX_LIMIT;

    /// Out-of-range values fall back to the defaults instead of failing.
    #[must_use]
    pub fn clamped(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p.unsigned_abs().min(Self::MAX_PAGE),
            _ => 1,
        };
        let limit = match limit {
            Some(l) if (1..=Self::MAX_LIMIT as i64).contains(&l) => l.unsigned_abs(),
            _ => Self::DEFAULT_LIMIT,
        };
        Self { page, limit }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = self.page.saturating_sub(1).saturating_mul(self.limit);
        if offset > Self::MAX_OFFSET {
            Self::MAX_OFFSET
        } else {
            offset
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Author".parse::<Role>().unwrap(), Role::Author);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("editor".parse::<Role>().is_err());
    }

    #[test]
    fn status_round_trips_through_display() {
        for status in [UserStatus::Active, UserStatus::Banned] {
            assert_eq!(status.to_string().parse::<UserStatus>().unwrap(), status);
        }
    }

    #[test]
    fn page_clamps_out_of_range_values() {
        assert_eq!(Page::clamped(None, None), Page::default());
        assert_eq!(Page::clamped(Some(0), Some(500)), Page { page: 1, limit: 10 });
        assert_eq!(Page::clamped(Some(-3), Some(0)), Page { page: 1, limit: 10 });

        let page = Page::clamped(Some(3), Some(25));
        assert_eq!(page, Page { page: 3, limit: 25 });
        assert_eq!(page.offset(), 50);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow_the_offset() {
        let page = Page::clamped(Some(i64::MAX), Some(100));
        assert_eq!(page.page, Page::MAX_PAGE);
        assert!(page.offset() <= Page::MAX_OFFSET);

        let raw = Page {
            page: u64::MAX,
            limit: 100,
        };
        assert_eq!(raw.offset(), Page::MAX_OFFSET);
    }

    #[test]
    fn sort_order_defaults_to_descending() {
        assert!(!SortOrder::default().is_ascending());
    }
}
