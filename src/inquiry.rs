//! Inquiry types - messages from a user to a vendor with a tracked status
//!
//! Lifecycle:
//! - `Pending`: every inquiry starts here
//! - `Responded`: the vendor answered
//! - `Booked`: the vendor was hired (terminal)
//! - `Declined`: the vendor turned it down (terminal)
//!
//! Status updates overwrite unconditionally. Leaving a terminal state is
//! allowed and only flagged through [`InquiryStatus::is_backward_move`].

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    #[default]
    Pending,
    Responded,
    Booked,
    Declined,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::Pending => "pending",
            InquiryStatus::Responded => "responded",
            InquiryStatus::Booked => "booked",
            InquiryStatus::Declined => "declined",
        }
    }

    pub fn all() -> &'static [InquiryStatus] {
        &[
            InquiryStatus::Pending,
            InquiryStatus::Responded,
            InquiryStatus::Booked,
            InquiryStatus::Declined,
        ]
    }

    /// Booked and declined end the modeled lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InquiryStatus::Booked | InquiryStatus::Declined)
    }

    /// True when moving from a terminal state to a non-terminal one.
    pub fn is_backward_move(&self, next: InquiryStatus) -> bool {
        self.is_terminal() && !next.is_terminal()
    }
}

impl FromStr for InquiryStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(InquiryStatus::Pending),
            "responded" => Ok(InquiryStatus::Responded),
            "booked" => Ok(InquiryStatus::Booked),
            "declined" => Ok(InquiryStatus::Declined),
            _ => Err(Error::Validation(format!("Unknown inquiry status: {}", s))),
        }
    }
}

impl std::fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: i64,
    pub vendor_id: i64,
    pub user_id: i64,
    pub wedding_id: Option<i64>,
    pub message: Option<String>,
    pub status: InquiryStatus,
    pub vendor_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inquiry creation request. There is no status field: new inquiries are
/// always pending.
#[derive(Debug, Clone)]
pub struct NewInquiry {
    pub vendor_id: i64,
    pub user_id: i64,
    pub wedding_id: Option<i64>,
    pub message: String,
}
