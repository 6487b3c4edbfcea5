use std::cmp::Ordering;
use std::str::FromStr;

use super::{Criteria, cmp_folded, contains_folded, normalize_search};
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserStatusFilter {
    #[default]
    All,
    Active,
    Inactive,
    Staff,
}

impl FromStr for UserStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "inactive" | "banned" => Ok(Self::Inactive),
            "staff" => Ok(Self::Staff),
            other => Err(format!("unknown user filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSort {
    /// Keep the server's order.
    #[default]
    None,
    Newest,
    Username,
}

impl FromStr for UserSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "newest" => Ok(Self::Newest),
            "username" => Ok(Self::Username),
            other => Err(format!("unknown user sort: {other}")),
        }
    }
}

/// Search and filter state of the user table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserQuery {
    /// Matches username, email, or `"first last"`.
    pub search: String,
    pub status: UserStatusFilter,
    pub sort: UserSort,
}

impl Criteria<User> for UserQuery {
    fn matches(&self, user: &User) -> bool {
        if let Some(term) = normalize_search(&self.search) {
            let full_name = format!("{} {}", user.first_name, user.last_name);
            let hit = contains_folded(&user.username, &term)
                || contains_folded(&user.email, &term)
                || contains_folded(&full_name, &term);
            if !hit {
                return false;
            }
        }
        match self.status {
            UserStatusFilter::All => true,
            UserStatusFilter::Active => user.is_active,
            UserStatusFilter::Inactive => !user.is_active,
            UserStatusFilter::Staff => user.is_staff || user.is_superuser,
        }
    }

    fn compare(&self, a: &User, b: &User) -> Ordering {
        match self.sort {
            UserSort::None => Ordering::Equal,
            UserSort::Newest => b.date_joined.cmp(&a.date_joined),
            UserSort::Username => cmp_folded(&a.username, &b.username),
        }
    }
}
