//! Vendor search filters
//!
//! All supplied filters must match (conjunction). Keyword (against the
//! vendor name) and location are case-sensitive substring matches. Results
//! are ordered by aggregate rating, highest first, then paginated.

use crate::vendor::VendorCategory;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 20;

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSearch {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for VendorSearch {
    fn default() -> Self {
        Self {
            category: None,
            keyword: None,
            price_min: None,
            price_max: None,
            location: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl VendorSearch {
    pub fn category(mut self, category: VendorCategory) -> Self {
        self.category = Some(category.as_str().to_string());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Check pagination and price bounds and resolve the category filter.
    ///
    /// Empty strings count as "no filter".
    pub fn validate(&self) -> Result<Option<VendorCategory>> {
        if self.limit < 0 {
            return Err(Error::Validation(format!(
                "limit must be non-negative, got {}",
                self.limit
            )));
        }
        if self.offset < 0 {
            return Err(Error::Validation(format!(
                "offset must be non-negative, got {}",
                self.offset
            )));
        }
        for price in [self.price_min, self.price_max].into_iter().flatten() {
            if !price.is_finite() {
                return Err(Error::Validation("price filters must be finite".into()));
            }
        }
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                return Err(Error::Validation(format!(
                    "priceMin {} is above priceMax {}",
                    min, max
                )));
            }
        }
        match self.category.as_deref() {
            Some(c) if !c.is_empty() => Ok(Some(c.parse()?)),
            _ => Ok(None),
        }
    }

    /// Row cap for the `LIMIT` clause. A zero limit means no cap, which
    /// SQLite spells as `LIMIT -1`.
    pub(crate) fn sql_limit(&self) -> i64 {
        if self.limit == 0 { -1 } else { self.limit }
    }

    pub(crate) fn keyword_filter(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.is_empty())
    }

    pub(crate) fn location_filter(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_input() {
        let search: VendorSearch = serde_json::from_str("{}").unwrap();
        assert_eq!(search.limit, DEFAULT_LIMIT);
        assert_eq!(search.offset, 0);
        assert_eq!(search.validate().unwrap(), None);
    }

    #[test]
    fn test_validation_rejects_bad_pages() {
        assert!(VendorSearch::default().page(-1, 0).validate().is_err());
        assert!(VendorSearch::default().page(10, -1).validate().is_err());
    }

    #[test]
    fn test_large_and_zero_limits_are_accepted() {
        let large = VendorSearch::default().page(150, 0);
        assert!(large.validate().is_ok());
        assert_eq!(large.sql_limit(), 150);

        let unlimited = VendorSearch::default().page(0, 0);
        assert!(unlimited.validate().is_ok());
        assert_eq!(unlimited.sql_limit(), -1);
    }

    #[test]
    fn test_validation_rejects_inverted_price_range() {
        let search = VendorSearch::default().price_range(Some(900.0), Some(100.0));
        assert!(matches!(search.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_empty_strings_are_not_filters() {
        let search: VendorSearch =
            serde_json::from_str(r#"{"category":"","keyword":"","location":""}"#).unwrap();
        assert_eq!(search.validate().unwrap(), None);
        assert!(search.keyword_filter().is_none());
        assert!(search.location_filter().is_none());
    }

    #[test]
    fn test_category_resolution() {
        let search = VendorSearch::default().category(VendorCategory::Catering);
        assert_eq!(search.validate().unwrap(), Some(VendorCategory::Catering));

        let unknown: VendorSearch = serde_json::from_str(r#"{"category":"juggler"}"#).unwrap();
        assert!(unknown.validate().is_err());
    }
}
