//! Customer entity (read-only)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{CustomerId, Status};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub city: String,
    pub zipcode: String,
    pub status: Status,
}

/// Filter accepted by the customer listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(Status),
}

impl StatusFilter {
    /// `""` lists everyone; anything other than `active`/`inactive` is unknown
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "" => Some(StatusFilter::All),
            "active" => Some(StatusFilter::Only(Status::Active)),
            "inactive" => Some(StatusFilter::Only(Status::Inactive)),
            _ => None,
        }
    }

    pub fn matches(&self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}
