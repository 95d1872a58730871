//! Wedding profile - one per user, created lazily on first access

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wedding {
    pub id: i64,
    pub user_id: i64,
    pub partner_name: Option<String>,
    pub wedding_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub guest_count: Option<i64>,
    pub budget: Option<f64>,
    pub theme: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a wedding profile. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeddingUpdate {
    pub id: i64,
    #[serde(default)]
    pub partner_name: Option<String>,
    #[serde(default)]
    pub wedding_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub guest_count: Option<i64>,
    /// Decimal amount as text, e.g. "25000" or "18500.50"
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl WeddingUpdate {
    /// Validate the update and parse the budget amount.
    pub fn parsed_budget(&self) -> Result<Option<f64>> {
        let Some(raw) = self.budget.as_deref() else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let value: f64 = trimmed
            .parse()
            .map_err(|_| Error::Validation(format!("budget is not a number: {}", raw)))?;
        if !value.is_finite() || value < 0.0 {
            return Err(Error::Validation(format!("budget must be non-negative: {}", raw)));
        }
        Ok(Some((value * 100.0).round() / 100.0))
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(count) = self.guest_count {
            if count < 0 {
                return Err(Error::Validation(format!(
                    "guestCount must be non-negative, got {}",
                    count
                )));
            }
        }
        self.parsed_budget()?;
        Ok(())
    }
}
