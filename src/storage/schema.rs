//! Database schema definitions

/// SQL to create the users table
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    open_id TEXT NOT NULL UNIQUE,
    name TEXT,
    email TEXT,
    login_method TEXT,
    role TEXT NOT NULL DEFAULT 'user',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_signed_in TEXT NOT NULL
)
"#;

/// SQL to create the weddings table
/// One row per user, created on first access
pub const CREATE_WEDDINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS weddings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    partner_name TEXT,
    wedding_date TEXT,
    location TEXT,
    guest_count INTEGER,
    budget REAL,
    theme TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// SQL to create the vendors table
/// `rating` and `review_count` are derived from the reviews table
pub const CREATE_VENDORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS vendors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT,
    location TEXT,
    price_min REAL,
    price_max REAL,
    phone TEXT,
    email TEXT,
    website TEXT,
    image TEXT,
    rating REAL NOT NULL DEFAULT 0,
    review_count INTEGER NOT NULL DEFAULT 0,
    is_verified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// SQL to create the reviews table
pub const CREATE_REVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vendor_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    title TEXT,
    content TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// SQL to create the inquiries table
pub const CREATE_INQUIRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inquiries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vendor_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    wedding_id INTEGER,
    message TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    vendor_response TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// SQL to create the saved_vendors link table
pub const CREATE_SAVED_VENDORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS saved_vendors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    vendor_id INTEGER NOT NULL,
    created_at TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_weddings_user ON weddings(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_vendors_category ON vendors(category)",
    "CREATE INDEX IF NOT EXISTS idx_vendors_rating ON vendors(rating)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_vendor ON reviews(vendor_id)",
    "CREATE INDEX IF NOT EXISTS idx_inquiries_user ON inquiries(user_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_saved_vendors_pair ON saved_vendors(user_id, vendor_id)",
];

/// All table names, in creation order
pub const TABLES: &[&str] = &[
    "users",
    "weddings",
    "vendors",
    "reviews",
    "inquiries",
    "saved_vendors",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_USERS_TABLE,
        CREATE_WEDDINGS_TABLE,
        CREATE_VENDORS_TABLE,
        CREATE_REVIEWS_TABLE,
        CREATE_INQUIRIES_TABLE,
        CREATE_SAVED_VENDORS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
