use tabled::{settings::Style, Table, Tabled};
use crate::storage::DbStats;
use crate::vendor::Vendor;

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Table")]
    table: &'static str,
    #[tabled(rename = "Rows")]
    rows: usize,
}

/// Row counts per marketplace table.
pub fn stats_table(stats: &DbStats) -> String {
    let rows = [
        CountRow { table: "Users", rows: stats.users },
        CountRow { table: "Weddings", rows: stats.weddings },
        CountRow { table: "Vendors", rows: stats.vendors },
        CountRow { table: "Reviews", rows: stats.reviews },
        CountRow { table: "Inquiries", rows: stats.inquiries },
        CountRow { table: "Saved vendors", rows: stats.saved_vendors },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct VendorRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Rating")]
    rating: String,
}

fn price_range(vendor: &Vendor) -> String {
    match (vendor.price_min, vendor.price_max) {
        (Some(min), Some(max)) => format!("{:.0}-{:.0}", min, max),
        (Some(min), None) => format!("from {:.0}", min),
        (None, Some(max)) => format!("up to {:.0}", max),
        (None, None) => "-".to_string(),
    }
}

/// Render search results, one row per vendor.
pub fn vendor_table(vendors: &[Vendor]) -> String {
    if vendors.is_empty() {
        return String::new();
    }

    let rows: Vec<VendorRow> = vendors
        .iter()
        .map(|v| VendorRow {
            id: v.id,
            name: if v.is_verified { format!("{} ✓", v.name) } else { v.name.clone() },
            category: v.category.to_string(),
            location: v.location.clone().unwrap_or_else(|| "-".to_string()),
            price: price_range(v),
            rating: format!("{:.2} ({})", v.rating, v.review_count),
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::VendorCategory;
    use chrono::Utc;

    fn vendor(name: &str, price_min: Option<f64>, price_max: Option<f64>) -> Vendor {
        Vendor {
            id: 7,
            name: name.to_string(),
            category: VendorCategory::Florist,
            description: None,
            location: None,
            price_min,
            price_max,
            phone: None,
            email: None,
            website: None,
            image: None,
            rating: 4.5,
            review_count: 2,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_range_labels() {
        assert_eq!(price_range(&vendor("a", Some(500.0), Some(1500.0))), "500-1500");
        assert_eq!(price_range(&vendor("a", Some(500.0), None)), "from 500");
        assert_eq!(price_range(&vendor("a", None, Some(900.0))), "up to 900");
        assert_eq!(price_range(&vendor("a", None, None)), "-");
    }

    #[test]
    fn test_vendor_table_marks_verified_and_rating() {
        assert!(vendor_table(&[]).is_empty());
        let table = vendor_table(&[vendor("Budget Blooms", None, None)]);
        assert!(table.contains("Budget Blooms ✓"));
        assert!(table.contains("4.50 (2)"));
    }

    #[test]
    fn test_stats_table_lists_every_table() {
        let stats = DbStats {
            users: 1,
            weddings: 1,
            vendors: 12,
            reviews: 30,
            inquiries: 4,
            saved_vendors: 5,
        };
        let table = stats_table(&stats);
        for label in ["Users", "Weddings", "Vendors", "Reviews", "Inquiries", "Saved vendors"] {
            assert!(table.contains(label), "missing {}", label);
        }
        assert!(table.contains("30"));
    }
}
