//! Review types

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// A user's review of a vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub vendor_id: i64,
    pub user_id: i64,
    /// Star rating, 1 through 5
    pub rating: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub vendor_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NewReview {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(Error::Validation(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, self.rating
            )));
        }
        Ok(())
    }
}

/// Mean of the given ratings at the stored precision (two decimals).
///
/// Returns 0 for an empty slice, matching an unreviewed vendor.
pub fn aggregate_rating(ratings: &[i64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().sum();
    let mean = sum as f64 / ratings.len() as f64;
    (mean * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_rating() {
        assert_eq!(aggregate_rating(&[]), 0.0);
        assert_eq!(aggregate_rating(&[5, 3, 4]), 4.0);
        assert_eq!(aggregate_rating(&[5, 4, 4]), 4.33);
        assert_eq!(aggregate_rating(&[1, 2]), 1.5);
    }

    #[test]
    fn test_rating_bounds() {
        let mut review = NewReview {
            vendor_id: 1,
            user_id: 1,
            rating: 5,
            title: None,
            content: None,
        };
        assert!(review.validate().is_ok());
        review.rating = 0;
        assert!(review.validate().is_err());
        review.rating = 6;
        assert!(review.validate().is_err());
    }
}
