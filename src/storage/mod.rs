//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - users(open_id, name, email, login_method, role, last_signed_in)
//! - weddings(user_id, partner_name, wedding_date, location, guest_count, budget, theme, notes)
//! - vendors(name, category, description, location, price_min, price_max, contact, rating, review_count, is_verified)
//! - reviews(vendor_id, user_id, rating, title, content)
//! - inquiries(vendor_id, user_id, wedding_id, message, status, vendor_response)
//! - saved_vendors(user_id, vendor_id)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, DbStats};
