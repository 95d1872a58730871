//! # Vowmarket - Wedding Vendor Marketplace
//!
//! Backend for a marketplace connecting couples planning a wedding with
//! service vendors.
//!
//! Vowmarket provides:
//! - Vendor search with category, keyword, location and price filters
//! - Reviews with synchronous rating aggregation per vendor
//! - Saved (favorite) vendors per user
//! - Inquiries with a four-state status lifecycle
//! - A lazily created wedding profile per user
//! - A typed RPC surface with public and session-protected procedures

pub mod vendor;
pub mod review;
pub mod inquiry;
pub mod wedding;
pub mod user;
pub mod search;
pub mod session;
pub mod storage;
pub mod import;
pub mod server;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use vendor::{Vendor, VendorCategory, NewVendor, SavedVendor};
pub use review::{Review, NewReview};
pub use inquiry::{Inquiry, InquiryStatus, NewInquiry};
pub use wedding::{Wedding, WeddingUpdate};
pub use user::{User, UserRole, UpsertUser};
pub use search::VendorSearch;
pub use storage::SqliteStore;

/// Result type alias for Vowmarket operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Vowmarket operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Database not available")]
    StorageUnavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Please login")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),
}
