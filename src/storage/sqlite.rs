//! SQLite storage implementation
//!
//! This is the data-access layer: every read and write the RPC surface
//! performs goes through [`SqliteStore`]. Multi-step sequences (review
//! insert + rating recompute, wedding get-or-create, save-vendor
//! check-then-insert, status update) each run in a single transaction.

use std::path::Path;
use std::str::FromStr;
use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;
use crate::{Result, Error};
use crate::inquiry::{Inquiry, InquiryStatus, NewInquiry};
use crate::review::{aggregate_rating, NewReview, Review};
use crate::search::VendorSearch;
use crate::user::{UpsertUser, User, UserRole};
use crate::vendor::{NewVendor, SavedVendor, Vendor};
use crate::wedding::{Wedding, WeddingUpdate};
use super::schema;

const VENDOR_COLUMNS: &str = "id, name, category, description, location, price_min, price_max, phone, email, website, image, rating, review_count, is_verified, created_at, updated_at";
const REVIEW_COLUMNS: &str = "id, vendor_id, user_id, rating, title, content, created_at, updated_at";
const INQUIRY_COLUMNS: &str = "id, vendor_id, user_id, wedding_id, message, status, vendor_response, created_at, updated_at";
const WEDDING_COLUMNS: &str = "id, user_id, partner_name, wedding_date, location, guest_count, budget, theme, notes, created_at, updated_at";
const USER_COLUMNS: &str = "id, open_id, name, email, login_method, role, created_at, updated_at, last_signed_in";

/// Row counts per table
#[derive(Debug, Clone, Default, Serialize)]
pub struct DbStats {
    pub users: usize,
    pub weddings: usize,
    pub vendors: usize,
    pub reviews: usize,
    pub inquiries: usize,
    pub saved_vendors: usize,
}

/// SQLite-backed storage for the marketplace
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        tracing::debug!("Opened marketplace database at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== User Operations ==========

    /// Insert a user or refresh an existing one on sign-in.
    ///
    /// Supplied profile fields overwrite stored ones; `last_signed_in` is
    /// always refreshed. The owner open id is granted the admin role unless
    /// a role is given explicitly.
    pub fn upsert_user(&self, user: &UpsertUser, owner_open_id: Option<&str>) -> Result<User> {
        if user.open_id.trim().is_empty() {
            return Err(Error::Validation("User openId is required for upsert".into()));
        }

        let role = user.role.or_else(|| {
            owner_open_id
                .filter(|owner| !owner.is_empty() && *owner == user.open_id)
                .map(|_| UserRole::Admin)
        });
        let now = Utc::now();

        self.conn.execute(
            r#"
            INSERT INTO users (open_id, name, email, login_method, role, created_at, updated_at, last_signed_in)
            VALUES (?1, ?2, ?3, ?4, COALESCE(?5, 'user'), ?6, ?6, ?6)
            ON CONFLICT(open_id) DO UPDATE SET
                name = COALESCE(?2, users.name),
                email = COALESCE(?3, users.email),
                login_method = COALESCE(?4, users.login_method),
                role = COALESCE(?5, users.role),
                updated_at = ?6,
                last_signed_in = ?6
            "#,
            params![
                user.open_id,
                user.name,
                user.email,
                user.login_method,
                role.map(|r| r.as_str()),
                now,
            ],
        )?;

        self.get_user_by_open_id(&user.open_id)?
            .ok_or_else(|| Error::NotFound(format!("user {}", user.open_id)))
    }

    /// Get a user by their identity-provider open id
    pub fn get_user_by_open_id(&self, open_id: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE open_id = ?1", USER_COLUMNS),
                [open_id],
                row_to_user,
            )
            .optional()
            .map_err(Into::into)
    }

    // ========== Wedding Operations ==========

    /// Return the user's wedding profile, creating an empty one on first access
    pub fn get_or_create_wedding(&mut self, user_id: i64) -> Result<Wedding> {
        let tx = self.conn.transaction()?;

        let existing = tx
            .query_row(
                &format!(
                    "SELECT {} FROM weddings WHERE user_id = ?1 ORDER BY id LIMIT 1",
                    WEDDING_COLUMNS
                ),
                [user_id],
                row_to_wedding,
            )
            .optional()?;

        let wedding = match existing {
            Some(wedding) => wedding,
            None => {
                let now = Utc::now();
                tx.execute(
                    "INSERT INTO weddings (user_id, created_at, updated_at) VALUES (?1, ?2, ?2)",
                    params![user_id, now],
                )?;
                let id = tx.last_insert_rowid();
                tracing::debug!("Created wedding profile {} for user {}", id, user_id);
                fetch_wedding(&tx, id)?
                    .ok_or_else(|| Error::NotFound(format!("wedding {}", id)))?
            }
        };

        tx.commit()?;
        Ok(wedding)
    }

    /// Get a wedding profile by id
    pub fn get_wedding(&self, id: i64) -> Result<Option<Wedding>> {
        fetch_wedding(&self.conn, id)
    }

    /// Apply a partial update to a wedding profile owned by `user_id`.
    ///
    /// Returns `None` when no such wedding belongs to the user.
    pub fn update_wedding(&self, user_id: i64, update: &WeddingUpdate) -> Result<Option<Wedding>> {
        update.validate()?;
        let budget = update.parsed_budget()?;

        let changed = self.conn.execute(
            r#"
            UPDATE weddings SET
                partner_name = COALESCE(?1, partner_name),
                wedding_date = COALESCE(?2, wedding_date),
                location = COALESCE(?3, location),
                guest_count = COALESCE(?4, guest_count),
                budget = COALESCE(?5, budget),
                theme = COALESCE(?6, theme),
                notes = COALESCE(?7, notes),
                updated_at = ?8
            WHERE id = ?9 AND user_id = ?10
            "#,
            params![
                update.partner_name,
                update.wedding_date,
                update.location,
                update.guest_count,
                budget,
                update.theme,
                update.notes,
                Utc::now(),
                update.id,
                user_id,
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_wedding(update.id)
    }

    // ========== Vendor Operations ==========

    /// Insert a vendor listing (out-of-band administration)
    pub fn insert_vendor(&self, vendor: &NewVendor) -> Result<Vendor> {
        let id = insert_vendor_row(&self.conn, vendor)?;
        self.get_vendor(id)?
            .ok_or_else(|| Error::NotFound(format!("vendor {}", id)))
    }

    /// Insert many vendor listings in one transaction
    pub fn insert_vendors(&mut self, vendors: &[NewVendor]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for vendor in vendors {
            insert_vendor_row(&tx, vendor)?;
        }
        tx.commit()?;
        Ok(vendors.len())
    }

    /// Get a vendor by id
    pub fn get_vendor(&self, id: i64) -> Result<Option<Vendor>> {
        fetch_vendor(&self.conn, id)
    }

    /// Search vendors matching every supplied filter, best rated first
    pub fn search_vendors(&self, search: &VendorSearch) -> Result<Vec<Vendor>> {
        let category = search.validate()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(category) = category {
            clauses.push("category = ?");
            values.push(Value::Text(category.as_str().to_string()));
        }
        // instr() is case-sensitive, unlike LIKE
        if let Some(keyword) = search.keyword_filter() {
            clauses.push("instr(name, ?) > 0");
            values.push(Value::Text(keyword.to_string()));
        }
        if let Some(location) = search.location_filter() {
            clauses.push("instr(location, ?) > 0");
            values.push(Value::Text(location.to_string()));
        }
        if let Some(min) = search.price_min {
            clauses.push("(price_max IS NULL OR price_max >= ?)");
            values.push(Value::Real(min));
        }
        if let Some(max) = search.price_max {
            clauses.push("(price_min IS NULL OR price_min <= ?)");
            values.push(Value::Real(max));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM vendors {} ORDER BY rating DESC, id ASC LIMIT ? OFFSET ?",
            VENDOR_COLUMNS, where_clause
        );
        values.push(Value::Integer(search.sql_limit()));
        values.push(Value::Integer(search.offset));

        let mut stmt = self.conn.prepare(&sql)?;
        let vendors = stmt
            .query_map(params_from_iter(values), row_to_vendor)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tracing::debug!("Vendor search matched {} vendors", vendors.len());
        Ok(vendors)
    }

    // ========== Review Operations ==========

    /// Get a vendor's reviews, newest first
    pub fn get_vendor_reviews(&self, vendor_id: i64) -> Result<Vec<Review>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM reviews WHERE vendor_id = ?1 ORDER BY created_at DESC, id DESC",
            REVIEW_COLUMNS
        ))?;

        let reviews = stmt
            .query_map([vendor_id], row_to_review)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(reviews)
    }

    /// Insert a review and recompute the vendor's aggregate rating.
    ///
    /// The aggregate is rebuilt from every review of the vendor, never
    /// adjusted incrementally.
    pub fn create_review(&mut self, review: &NewReview) -> Result<Review> {
        review.validate()?;
        let tx = self.conn.transaction()?;

        if !vendor_exists(&tx, review.vendor_id)? {
            return Err(Error::NotFound(format!("vendor {}", review.vendor_id)));
        }

        let now = Utc::now();
        tx.execute(
            r#"
            INSERT INTO reviews (vendor_id, user_id, rating, title, content, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![
                review.vendor_id,
                review.user_id,
                review.rating,
                review.title,
                review.content,
                now,
            ],
        )?;
        let review_id = tx.last_insert_rowid();

        let (rating, count) = recompute_vendor_rating(&tx, review.vendor_id)?;
        tracing::debug!(
            "Vendor {} now rated {:.2} over {} reviews",
            review.vendor_id,
            rating,
            count
        );

        let created = tx
            .query_row(
                &format!("SELECT {} FROM reviews WHERE id = ?1", REVIEW_COLUMNS),
                [review_id],
                row_to_review,
            )?;

        tx.commit()?;
        Ok(created)
    }

    // ========== Inquiry Operations ==========

    /// Create an inquiry. New inquiries always start pending.
    pub fn create_inquiry(&self, inquiry: &NewInquiry) -> Result<Inquiry> {
        if !vendor_exists(&self.conn, inquiry.vendor_id)? {
            return Err(Error::NotFound(format!("vendor {}", inquiry.vendor_id)));
        }
        if let Some(wedding_id) = inquiry.wedding_id {
            let owned = self
                .get_wedding(wedding_id)?
                .is_some_and(|w| w.user_id == inquiry.user_id);
            if !owned {
                return Err(Error::NotFound(format!("wedding {}", wedding_id)));
            }
        }

        let now = Utc::now();
        self.conn.execute(
            r#"
            INSERT INTO inquiries (vendor_id, user_id, wedding_id, message, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![
                inquiry.vendor_id,
                inquiry.user_id,
                inquiry.wedding_id,
                inquiry.message,
                InquiryStatus::Pending.as_str(),
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        self.get_inquiry(id)?
            .ok_or_else(|| Error::NotFound(format!("inquiry {}", id)))
    }

    /// Get an inquiry by id
    pub fn get_inquiry(&self, id: i64) -> Result<Option<Inquiry>> {
        fetch_inquiry(&self.conn, id)
    }

    /// Get a user's inquiries, newest first
    pub fn get_user_inquiries(&self, user_id: i64) -> Result<Vec<Inquiry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM inquiries WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            INQUIRY_COLUMNS
        ))?;

        let inquiries = stmt
            .query_map([user_id], row_to_inquiry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(inquiries)
    }

    /// Overwrite an inquiry's status, attaching the vendor response if given.
    ///
    /// Any transition is accepted, including moves out of a terminal state.
    /// Returns `None` for an unknown inquiry id.
    pub fn update_inquiry_status(
        &mut self,
        id: i64,
        status: InquiryStatus,
        vendor_response: Option<&str>,
    ) -> Result<Option<Inquiry>> {
        let tx = self.conn.transaction()?;

        let Some(current) = fetch_inquiry(&tx, id)? else {
            return Ok(None);
        };
        if current.status.is_backward_move(status) {
            tracing::warn!(
                "Inquiry {} moved from terminal status {} back to {}",
                id,
                current.status,
                status
            );
        }

        let response = vendor_response.filter(|r| !r.is_empty());
        tx.execute(
            r#"
            UPDATE inquiries SET
                status = ?1,
                vendor_response = COALESCE(?2, vendor_response),
                updated_at = ?3
            WHERE id = ?4
            "#,
            params![status.as_str(), response, Utc::now(), id],
        )?;

        let updated = fetch_inquiry(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    // ========== Saved Vendor Operations ==========

    /// Save a vendor for a user. Saving twice returns the existing link.
    pub fn save_vendor(&mut self, user_id: i64, vendor_id: i64) -> Result<SavedVendor> {
        let tx = self.conn.transaction()?;

        if !vendor_exists(&tx, vendor_id)? {
            return Err(Error::NotFound(format!("vendor {}", vendor_id)));
        }

        let existing = fetch_saved_link(&tx, user_id, vendor_id)?;
        let link = match existing {
            Some(link) => link,
            None => {
                tx.execute(
                    "INSERT INTO saved_vendors (user_id, vendor_id, created_at) VALUES (?1, ?2, ?3)",
                    params![user_id, vendor_id, Utc::now()],
                )?;
                fetch_saved_link(&tx, user_id, vendor_id)?
                    .ok_or_else(|| Error::NotFound(format!("saved vendor {}", vendor_id)))?
            }
        };

        tx.commit()?;
        Ok(link)
    }

    /// Remove a saved vendor link. Returns whether a link existed.
    pub fn unsave_vendor(&self, user_id: i64, vendor_id: i64) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM saved_vendors WHERE user_id = ?1 AND vendor_id = ?2",
            params![user_id, vendor_id],
        )?;
        Ok(removed > 0)
    }

    /// Check whether a user has saved a vendor
    pub fn is_vendor_saved(&self, user_id: i64, vendor_id: i64) -> Result<bool> {
        Ok(fetch_saved_link(&self.conn, user_id, vendor_id)?.is_some())
    }

    /// Get the vendors a user has saved, in the order they were saved
    pub fn get_saved_vendors(&self, user_id: i64) -> Result<Vec<Vendor>> {
        let columns = VENDOR_COLUMNS
            .split(", ")
            .map(|c| format!("v.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM saved_vendors s
            JOIN vendors v ON v.id = s.vendor_id
            WHERE s.user_id = ?1
            ORDER BY s.created_at, s.id
            "#,
            columns
        ))?;

        let vendors = stmt
            .query_map([user_id], row_to_vendor)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(vendors)
    }

    // ========== Statistics ==========

    fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            users: self.count_rows("users")?,
            weddings: self.count_rows("weddings")?,
            vendors: self.count_rows("vendors")?,
            reviews: self.count_rows("reviews")?,
            inquiries: self.count_rows("inquiries")?,
            saved_vendors: self.count_rows("saved_vendors")?,
        })
    }
}

// ========== Row Helpers ==========

fn parse_column<T: FromStr<Err = Error>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: Error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_vendor(row: &rusqlite::Row) -> rusqlite::Result<Vendor> {
    Ok(Vendor {
        id: row.get(0)?,
        name: row.get(1)?,
        category: parse_column(row, 2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        price_min: row.get(5)?,
        price_max: row.get(6)?,
        phone: row.get(7)?,
        email: row.get(8)?,
        website: row.get(9)?,
        image: row.get(10)?,
        rating: row.get(11)?,
        review_count: row.get(12)?,
        is_verified: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn row_to_review(row: &rusqlite::Row) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        vendor_id: row.get(1)?,
        user_id: row.get(2)?,
        rating: row.get(3)?,
        title: row.get(4)?,
        content: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn row_to_inquiry(row: &rusqlite::Row) -> rusqlite::Result<Inquiry> {
    Ok(Inquiry {
        id: row.get(0)?,
        vendor_id: row.get(1)?,
        user_id: row.get(2)?,
        wedding_id: row.get(3)?,
        message: row.get(4)?,
        status: parse_column(row, 5)?,
        vendor_response: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn row_to_wedding(row: &rusqlite::Row) -> rusqlite::Result<Wedding> {
    Ok(Wedding {
        id: row.get(0)?,
        user_id: row.get(1)?,
        partner_name: row.get(2)?,
        wedding_date: row.get(3)?,
        location: row.get(4)?,
        guest_count: row.get(5)?,
        budget: row.get(6)?,
        theme: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        open_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        login_method: row.get(4)?,
        role: parse_column(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        last_signed_in: row.get(8)?,
    })
}

fn row_to_saved(row: &rusqlite::Row) -> rusqlite::Result<SavedVendor> {
    Ok(SavedVendor {
        id: row.get(0)?,
        user_id: row.get(1)?,
        vendor_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn fetch_vendor(conn: &Connection, id: i64) -> Result<Option<Vendor>> {
    conn.query_row(
        &format!("SELECT {} FROM vendors WHERE id = ?1", VENDOR_COLUMNS),
        [id],
        row_to_vendor,
    )
    .optional()
    .map_err(Into::into)
}

fn fetch_inquiry(conn: &Connection, id: i64) -> Result<Option<Inquiry>> {
    conn.query_row(
        &format!("SELECT {} FROM inquiries WHERE id = ?1", INQUIRY_COLUMNS),
        [id],
        row_to_inquiry,
    )
    .optional()
    .map_err(Into::into)
}

fn fetch_wedding(conn: &Connection, id: i64) -> Result<Option<Wedding>> {
    conn.query_row(
        &format!("SELECT {} FROM weddings WHERE id = ?1", WEDDING_COLUMNS),
        [id],
        row_to_wedding,
    )
    .optional()
    .map_err(Into::into)
}

fn fetch_saved_link(conn: &Connection, user_id: i64, vendor_id: i64) -> Result<Option<SavedVendor>> {
    conn.query_row(
        "SELECT id, user_id, vendor_id, created_at FROM saved_vendors WHERE user_id = ?1 AND vendor_id = ?2",
        params![user_id, vendor_id],
        row_to_saved,
    )
    .optional()
    .map_err(Into::into)
}

fn vendor_exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM vendors WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn insert_vendor_row(conn: &Connection, vendor: &NewVendor) -> Result<i64> {
    let category = vendor.validate()?;
    let now = Utc::now();
    conn.execute(
        r#"
        INSERT INTO vendors (name, category, description, location, price_min, price_max,
                             phone, email, website, image, is_verified, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
        "#,
        params![
            vendor.name.trim(),
            category.as_str(),
            vendor.description,
            vendor.location,
            vendor.price_min,
            vendor.price_max,
            vendor.phone,
            vendor.email,
            vendor.website,
            vendor.image,
            vendor.is_verified,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Rebuild a vendor's rating and review count from all of its reviews
fn recompute_vendor_rating(conn: &Connection, vendor_id: i64) -> Result<(f64, i64)> {
    let mut stmt = conn.prepare("SELECT rating FROM reviews WHERE vendor_id = ?1")?;
    let ratings = stmt
        .query_map([vendor_id], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let rating = aggregate_rating(&ratings);
    let count = ratings.len() as i64;

    conn.execute(
        "UPDATE vendors SET rating = ?1, review_count = ?2, updated_at = ?3 WHERE id = ?4",
        params![rating, count, Utc::now(), vendor_id],
    )?;
    Ok((rating, count))
}
