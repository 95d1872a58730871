//! Vendor types
//!
//! Vendors are listed in the marketplace under one of a fixed set of
//! categories. The aggregate `rating` and `review_count` are derived from
//! the vendor's reviews and are never written directly by callers.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Marketplace categories a vendor can be listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorCategory {
    Photographer,
    Videographer,
    Venue,
    Catering,
    Florist,
    Decorator,
    Dj,
    Band,
    Planner,
    Makeup,
    Transportation,
    Other,
}

impl VendorCategory {
    /// Get the string representation of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorCategory::Photographer => "photographer",
            VendorCategory::Videographer => "videographer",
            VendorCategory::Venue => "venue",
            VendorCategory::Catering => "catering",
            VendorCategory::Florist => "florist",
            VendorCategory::Decorator => "decorator",
            VendorCategory::Dj => "dj",
            VendorCategory::Band => "band",
            VendorCategory::Planner => "planner",
            VendorCategory::Makeup => "makeup",
            VendorCategory::Transportation => "transportation",
            VendorCategory::Other => "other",
        }
    }

    /// Get all categories
    pub fn all() -> &'static [VendorCategory] {
        &[
            VendorCategory::Photographer,
            VendorCategory::Videographer,
            VendorCategory::Venue,
            VendorCategory::Catering,
            VendorCategory::Florist,
            VendorCategory::Decorator,
            VendorCategory::Dj,
            VendorCategory::Band,
            VendorCategory::Planner,
            VendorCategory::Makeup,
            VendorCategory::Transportation,
            VendorCategory::Other,
        ]
    }
}

impl FromStr for VendorCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        VendorCategory::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| Error::Validation(format!("Unknown vendor category: {}", s)))
    }
}

impl std::fmt::Display for VendorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A vendor listed in the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: i64,
    pub name: String,
    pub category: VendorCategory,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// URL of the vendor's listing image
    pub image: Option<String>,
    /// Mean of all review ratings, two decimal places. 0 when unreviewed.
    pub rating: f64,
    pub review_count: i64,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vendor listing as administered out of band (catalog import).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVendor {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

impl NewVendor {
    pub fn new(name: impl Into<String>, category: VendorCategory) -> Self {
        Self {
            name: name.into(),
            category: category.as_str().to_string(),
            ..Default::default()
        }
    }

    /// Validate the listing and resolve its category tag.
    pub fn validate(&self) -> Result<VendorCategory> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("vendor name must not be empty".into()));
        }
        let category: VendorCategory = self.category.parse()?;
        for price in [self.price_min, self.price_max].into_iter().flatten() {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::Validation(format!(
                    "vendor '{}' has an invalid price: {}",
                    self.name, price
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                return Err(Error::Validation(format!(
                    "vendor '{}' has priceMin {} above priceMax {}",
                    self.name, min, max
                )));
            }
        }
        Ok(category)
    }
}

/// A user's favorite-marked vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedVendor {
    pub id: i64,
    pub user_id: i64,
    pub vendor_id: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("Venue".parse::<VendorCategory>().unwrap(), VendorCategory::Venue);
        assert_eq!(" dj ".parse::<VendorCategory>().unwrap(), VendorCategory::Dj);
        assert!("juggler".parse::<VendorCategory>().is_err());
    }

    #[test]
    fn test_category_string_roundtrip() {
        for category in VendorCategory::all() {
            assert_eq!(category.as_str().parse::<VendorCategory>().unwrap(), *category);
        }
    }

    #[test]
    fn test_new_vendor_validation() {
        let mut vendor = NewVendor::new("Petal & Stem", VendorCategory::Florist);
        assert_eq!(vendor.validate().unwrap(), VendorCategory::Florist);

        vendor.price_min = Some(500.0);
        vendor.price_max = Some(100.0);
        assert!(matches!(vendor.validate(), Err(Error::Validation(_))));

        let blank = NewVendor::new("   ", VendorCategory::Band);
        assert!(blank.validate().is_err());
    }
}
