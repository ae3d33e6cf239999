//! SQLite-backed implementation of [`RemoteStore`].
//!
//! Behaves like the hosted backend as far as the review layer can observe:
//! a signed-in session, row-level policies, and NOT NULL / CHECK / FOREIGN
//! KEY / UNIQUE constraints reported through [`RemoteErrorKind`].
//!
//! Row-level policies:
//! - reviews: insert needs a session and `author_id` null or self; update and
//!   delete only by the author
//! - reactions: insert and delete only for `user_id = self`
//! - comments: insert needs a session and `author_id` null or self
//! - companies: insert needs a session
//! - profiles: update only self
//!
//! Everything is readable without a session.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::cell::RefCell;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{PageRange, RemoteError, RemoteErrorKind, RemoteResult, RemoteStore, SessionUser};
use crate::ids::new_id;
use crate::model::{
    Comment, Company, NewComment, NewCompany, NewReaction, NewReview, Profile, ProfileUpdate,
    Reaction, ReactionKind, Review, ReviewPatch, ReviewWithRelations,
};

/// Options applied when opening a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Enforce foreign keys (reviews → companies, comments/reactions → reviews).
    pub enforce_foreign_keys: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            enforce_foreign_keys: true,
        }
    }
}

/// Store backed by a SQLite database.
pub struct SqliteStore {
    conn: Connection,
    session: RefCell<Option<SessionUser>>,
}

impl SqliteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates parent directories if they don't exist.
    pub fn open(path: &Path, options: StoreOptions) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create parent directories: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::configure(conn, options)
    }

    /// Create an in-memory store.
    pub fn open_in_memory(options: StoreOptions) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::configure(conn, options)
    }

    fn configure(conn: Connection, options: StoreOptions) -> Result<Self> {
        let pragma = if options.enforce_foreign_keys {
            "PRAGMA foreign_keys = ON;"
        } else {
            "PRAGMA foreign_keys = OFF;"
        };
        conn.execute_batch(pragma)
            .context("Failed to configure foreign keys")?;

        Ok(Self {
            conn,
            session: RefCell::new(None),
        })
    }

    /// Initialize the database schema.
    ///
    /// Creates all tables and indexes if they don't exist.
    pub fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .context("Failed to initialize schema")?;
        Ok(())
    }

    /// Start a session as `user`, creating their profile row on first sign-in.
    pub fn sign_in(&self, user: SessionUser) -> RemoteResult<()> {
        let now = now_ts();
        let username = user
            .email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .map(str::to_string);
        self.conn.execute(
            "INSERT OR IGNORE INTO profiles (id, username, email, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            params![user.id, username, user.email, now, now],
        )?;
        debug!(user_id = %user.id, "session started");
        *self.session.borrow_mut() = Some(user);
        Ok(())
    }

    /// End the current session.
    pub fn sign_out(&self) {
        *self.session.borrow_mut() = None;
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn session_for(&self, table: &str) -> RemoteResult<SessionUser> {
        self.session
            .borrow()
            .clone()
            .ok_or_else(|| RemoteError::policy(table))
    }

    fn review_author(&self, review_id: &str) -> RemoteResult<Option<Option<String>>> {
        Ok(self
            .conn
            .query_row(
                "SELECT author_id FROM reviews WHERE id = ?",
                params![review_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?)
    }

    /// Check that the session user authored `review_id`.
    fn require_review_owner(&self, review_id: &str) -> RemoteResult<()> {
        let session = self.session_for("reviews")?;
        match self.review_author(review_id)? {
            None => Err(RemoteError::new(
                RemoteErrorKind::NotFound,
                format!("review {review_id} not found"),
            )),
            Some(Some(author)) if author == session.id => Ok(()),
            Some(_) => Err(RemoteError::policy("reviews")),
        }
    }

    fn with_relations(&self, review: Review) -> RemoteResult<ReviewWithRelations> {
        let company = self.company_by_id(&review.company_id)?;
        let reactions = self.reactions_for(&review.id)?;
        let comments = self.comments_for(&review.id)?;
        Ok(ReviewWithRelations {
            review,
            company,
            reactions,
            comments,
        })
    }

    fn company_by_id(&self, company_id: &str) -> RemoteResult<Option<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?");
        Ok(self
            .conn
            .query_row(&sql, params![company_id], company_from_row)
            .optional()?)
    }

    fn reactions_for(&self, review_id: &str) -> RemoteResult<Vec<Reaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, review_id, user_id, type, created_at FROM reactions
             WHERE review_id = ? ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map(params![review_id], reaction_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn comments_for(&self, review_id: &str) -> RemoteResult<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE review_id = ? ORDER BY created_at, rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![review_id], comment_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn query_reviews(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> RemoteResult<Vec<Review>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, review_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl RemoteStore for SqliteStore {
    fn current_user(&self) -> RemoteResult<Option<SessionUser>> {
        Ok(self.session.borrow().clone())
    }

    fn count_reviews(&self) -> RemoteResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn select_reviews(&self, range: PageRange) -> RemoteResult<Vec<ReviewWithRelations>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             ORDER BY created_at DESC, rowid DESC
             LIMIT ? OFFSET ?"
        );
        // An offset beyond i64 lies past the end of any table.
        let Ok(offset) = i64::try_from(range.from) else {
            return Ok(Vec::new());
        };
        let limit = i64::try_from(range.row_count()).unwrap_or(i64::MAX);
        let reviews = self.query_reviews(&sql, params![limit, offset])?;
        reviews
            .into_iter()
            .map(|r| self.with_relations(r))
            .collect()
    }

    fn select_review(&self, review_id: &str) -> RemoteResult<Option<ReviewWithRelations>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?");
        let review = self
            .conn
            .query_row(&sql, params![review_id], review_from_row)
            .optional()?;
        review.map(|r| self.with_relations(r)).transpose()
    }

    fn review_exists(&self, review_id: &str) -> RemoteResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM reviews WHERE id = ?",
                params![review_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_review(&self, review: &NewReview) -> RemoteResult<ReviewWithRelations> {
        let session = self.session_for("reviews")?;
        if review
            .author_id
            .as_deref()
            .is_some_and(|author| author != session.id)
        {
            return Err(RemoteError::policy("reviews"));
        }

        let id = new_id();
        let now = now_ts();
        self.conn.execute(
            "INSERT INTO reviews (
                id, company_id, author_id, title, content, rating, position, department,
                employment_type, work_location, is_anonymous, is_current_employee,
                pros, cons, advice_to_management, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                review.company_id,
                review.author_id,
                review.title,
                review.content,
                review.rating,
                review.position,
                review.department,
                review.employment_type,
                review.work_location,
                review.is_anonymous,
                review.is_current_employee,
                review.pros,
                review.cons,
                review.advice_to_management,
                now,
                now,
            ],
        )?;

        self.select_review(&id)?.ok_or_else(|| {
            RemoteError::new(
                RemoteErrorKind::NotFound,
                format!("inserted review {id} could not be read back"),
            )
        })
    }

    fn update_review(&self, review_id: &str, patch: &ReviewPatch) -> RemoteResult<()> {
        self.require_review_owner(review_id)?;

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! push {
            ($field:ident) => {
                if let Some(v) = &patch.$field {
                    sets.push(concat!(stringify!($field), " = ?"));
                    values.push(Box::new(v.clone()));
                }
            };
        }
        push!(company_id);
        push!(title);
        push!(content);
        push!(rating);
        push!(position);
        push!(department);
        push!(employment_type);
        push!(work_location);
        push!(is_anonymous);
        push!(is_current_employee);
        push!(pros);
        push!(cons);
        push!(advice_to_management);

        sets.push("updated_at = ?");
        values.push(Box::new(now_ts()));
        values.push(Box::new(review_id.to_string()));

        let sql = format!("UPDATE reviews SET {} WHERE id = ?", sets.join(", "));
        let params: Vec<&dyn rusqlite::ToSql> = values.iter().map(AsRef::as_ref).collect();
        self.conn.execute(&sql, params.as_slice())?;
        Ok(())
    }

    fn delete_review(&self, review_id: &str) -> RemoteResult<()> {
        self.require_review_owner(review_id)?;
        self.conn
            .execute("DELETE FROM reviews WHERE id = ?", params![review_id])?;
        Ok(())
    }

    fn select_reviews_by_author(
        &self,
        author_id: &str,
    ) -> RemoteResult<Vec<ReviewWithRelations>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE author_id = ?
             ORDER BY created_at DESC, rowid DESC"
        );
        self.query_reviews(&sql, params![author_id])?
            .into_iter()
            .map(|r| self.with_relations(r))
            .collect()
    }

    fn select_company_reviews(&self, company_id: &str) -> RemoteResult<Vec<ReviewWithRelations>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE company_id = ?
             ORDER BY created_at DESC, rowid DESC"
        );
        self.query_reviews(&sql, params![company_id])?
            .into_iter()
            .map(|r| self.with_relations(r))
            .collect()
    }

    fn insert_reaction(&self, reaction: &NewReaction) -> RemoteResult<Reaction> {
        let session = self.session_for("reactions")?;
        if reaction.user_id != session.id {
            return Err(RemoteError::policy("reactions"));
        }

        let id = new_id();
        let now = now_ts();
        self.conn.execute(
            "INSERT INTO reactions (id, review_id, user_id, type, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                id,
                reaction.review_id,
                reaction.user_id,
                reaction.kind.as_str(),
                now
            ],
        )?;

        Ok(Reaction {
            id,
            review_id: reaction.review_id.clone(),
            user_id: reaction.user_id.clone(),
            kind: reaction.kind,
            created_at: parse_ts(4, &now)?,
        })
    }

    fn delete_reaction(
        &self,
        review_id: &str,
        user_id: &str,
        kind: ReactionKind,
    ) -> RemoteResult<usize> {
        let session = self.session_for("reactions")?;
        if user_id != session.id {
            return Err(RemoteError::policy("reactions"));
        }
        Ok(self.conn.execute(
            "DELETE FROM reactions WHERE review_id = ? AND user_id = ? AND type = ?",
            params![review_id, user_id, kind.as_str()],
        )?)
    }

    fn count_reactions_by_user(&self, user_id: &str, kind: ReactionKind) -> RemoteResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reactions WHERE user_id = ? AND type = ?",
            params![user_id, kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn insert_comment(&self, comment: &NewComment) -> RemoteResult<Comment> {
        let session = self.session_for("comments")?;
        if comment
            .author_id
            .as_deref()
            .is_some_and(|author| author != session.id)
        {
            return Err(RemoteError::policy("comments"));
        }

        let id = new_id();
        let now = now_ts();
        self.conn.execute(
            "INSERT INTO comments (
                id, review_id, author_id, content, is_anonymous, parent_comment_id,
                created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                comment.review_id,
                comment.author_id,
                comment.content,
                comment.is_anonymous,
                comment.parent_comment_id,
                now,
                now,
            ],
        )?;

        self.select_comment(&id)?.ok_or_else(|| {
            RemoteError::new(
                RemoteErrorKind::NotFound,
                format!("inserted comment {id} could not be read back"),
            )
        })
    }

    fn select_comment(&self, comment_id: &str) -> RemoteResult<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?");
        Ok(self
            .conn
            .query_row(&sql, params![comment_id], comment_from_row)
            .optional()?)
    }

    fn find_companies_by_name(&self, name: &str) -> RemoteResult<Vec<Company>> {
        let sql = format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE lower(name) = lower(?)
             ORDER BY created_at, rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![name], company_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn select_company_by_slug(&self, slug: &str) -> RemoteResult<Option<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE slug = ?");
        Ok(self
            .conn
            .query_row(&sql, params![slug], company_from_row)
            .optional()?)
    }

    fn select_companies(&self) -> RemoteResult<Vec<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name, rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], company_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert_company(&self, company: &NewCompany) -> RemoteResult<Company> {
        self.session_for("companies")?;

        let id = new_id();
        let now = now_ts();
        self.conn.execute(
            "INSERT INTO companies (
                id, name, slug, description, website, logo_url, industry, size, location,
                created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                company.name,
                company.slug,
                company.description,
                company.website,
                company.logo_url,
                company.industry,
                company.size,
                company.location,
                now,
                now,
            ],
        )?;

        self.company_by_id(&id)?.ok_or_else(|| {
            RemoteError::new(
                RemoteErrorKind::NotFound,
                format!("inserted company {id} could not be read back"),
            )
        })
    }

    fn select_profile(&self, user_id: &str) -> RemoteResult<Option<Profile>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, username, email, full_name, bio, location, website, avatar_url,
                        created_at, updated_at
                 FROM profiles WHERE id = ?",
                params![user_id],
                profile_from_row,
            )
            .optional()?)
    }

    fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> RemoteResult<Profile> {
        let session = self.session_for("profiles")?;
        if session.id != user_id {
            return Err(RemoteError::policy("profiles"));
        }

        self.conn.execute(
            "UPDATE profiles SET
                username = COALESCE(?, username),
                full_name = COALESCE(?, full_name),
                bio = COALESCE(?, bio),
                location = COALESCE(?, location),
                website = COALESCE(?, website),
                avatar_url = COALESCE(?, avatar_url),
                updated_at = ?
             WHERE id = ?",
            params![
                update.username,
                update.full_name,
                update.bio,
                update.location,
                update.website,
                update.avatar_url,
                now_ts(),
                user_id,
            ],
        )?;

        self.select_profile(user_id)?.ok_or_else(|| {
            RemoteError::new(
                RemoteErrorKind::NotFound,
                format!("profile {user_id} not found"),
            )
        })
    }
}

// ============================================================================
// Error mapping
// ============================================================================

impl From<rusqlite::Error> for RemoteError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, msg) => {
                let message = msg.clone().unwrap_or_else(|| failure.to_string());
                // "NOT NULL constraint failed: reviews.rating" -> "reviews.rating"
                let detail = message.split_once(": ").map(|(_, d)| d.to_string());

                let kind = match failure.extended_code {
                    ffi::SQLITE_CONSTRAINT_NOTNULL => RemoteErrorKind::NotNullViolation,
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RemoteErrorKind::ForeignKeyViolation,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RemoteErrorKind::UniqueViolation
                    }
                    ffi::SQLITE_CONSTRAINT_CHECK => RemoteErrorKind::CheckViolation,
                    _ if message.contains("no such table") => RemoteErrorKind::MissingTable,
                    _ => RemoteErrorKind::Other,
                };

                let detail = match kind {
                    RemoteErrorKind::NotNullViolation => detail
                        .map(|d| d.rsplit('.').next().unwrap_or_default().to_string()),
                    _ => detail,
                };

                let remote = Self::new(kind, message);
                match detail {
                    Some(d) => remote.with_details(d),
                    None => remote,
                }
            }
            rusqlite::Error::QueryReturnedNoRows => {
                Self::new(RemoteErrorKind::NotFound, err.to_string())
            }
            _ => Self::new(RemoteErrorKind::Other, err.to_string()),
        }
    }
}

// ============================================================================
// Row mapping
// ============================================================================

const REVIEW_COLUMNS: &str = "id, company_id, author_id, title, content, rating, position, \
     department, employment_type, work_location, is_anonymous, is_current_employee, pros, cons, \
     advice_to_management, created_at, updated_at";

const COMPANY_COLUMNS: &str = "id, name, slug, description, website, logo_url, industry, size, \
     location, created_at, updated_at";

const COMMENT_COLUMNS: &str = "id, review_id, author_id, content, is_anonymous, \
     parent_comment_id, created_at, updated_at";

fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts(idx, &raw)
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        company_id: row.get(1)?,
        author_id: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        rating: row.get(5)?,
        position: row.get(6)?,
        department: row.get(7)?,
        employment_type: row.get(8)?,
        work_location: row.get(9)?,
        is_anonymous: row.get(10)?,
        is_current_employee: row.get(11)?,
        pros: row.get(12)?,
        cons: row.get(13)?,
        advice_to_management: row.get(14)?,
        created_at: ts_column(row, 15)?,
        updated_at: ts_column(row, 16)?,
    })
}

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        website: row.get(4)?,
        logo_url: row.get(5)?,
        industry: row.get(6)?,
        size: row.get(7)?,
        location: row.get(8)?,
        created_at: ts_column(row, 9)?,
        updated_at: ts_column(row, 10)?,
    })
}

fn reaction_from_row(row: &Row<'_>) -> rusqlite::Result<Reaction> {
    let kind: String = row.get(3)?;
    Ok(Reaction {
        id: row.get(0)?,
        review_id: row.get(1)?,
        user_id: row.get(2)?,
        kind: kind.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into())
        })?,
        created_at: ts_column(row, 4)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        review_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        is_anonymous: row.get(4)?,
        parent_comment_id: row.get(5)?,
        created_at: ts_column(row, 6)?,
        updated_at: ts_column(row, 7)?,
    })
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        full_name: row.get(3)?,
        bio: row.get(4)?,
        location: row.get(5)?,
        website: row.get(6)?,
        avatar_url: row.get(7)?,
        created_at: ts_column(row, 8)?,
        updated_at: ts_column(row, 9)?,
    })
}

// ============================================================================
// Schema
// ============================================================================

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    username TEXT,
    email TEXT,
    full_name TEXT,
    bio TEXT,
    location TEXT,
    website TEXT,
    avatar_url TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    description TEXT,
    website TEXT,
    logo_url TEXT,
    industry TEXT,
    size TEXT,
    location TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reviews (
    id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    author_id TEXT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    position TEXT,
    department TEXT,
    employment_type TEXT,
    work_location TEXT,
    is_anonymous INTEGER NOT NULL DEFAULT 0,
    is_current_employee INTEGER NOT NULL DEFAULT 0,
    pros TEXT,
    cons TEXT,
    advice_to_management TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reviews_created_at ON reviews(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_reviews_company ON reviews(company_id);
CREATE INDEX IF NOT EXISTS idx_reviews_author ON reviews(author_id);

CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    review_id TEXT NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
    author_id TEXT,
    content TEXT NOT NULL,
    is_anonymous INTEGER NOT NULL DEFAULT 0,
    parent_comment_id TEXT REFERENCES comments(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_review ON comments(review_id);

-- One reaction of each type per (review, user); concurrent double toggles
-- collapse into a unique violation instead of a duplicate row.
CREATE TABLE IF NOT EXISTS reactions (
    id TEXT PRIMARY KEY,
    review_id TEXT NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('like', 'helpful', 'insightful')),
    created_at TEXT NOT NULL,
    UNIQUE (review_id, user_id, type)
);

CREATE INDEX IF NOT EXISTS idx_reactions_user ON reactions(user_id, type);
";

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory(StoreOptions::default()).unwrap();
        store.init_schema().unwrap();
        store.sign_in(SessionUser::new("u1")).unwrap();
        store
    }

    fn company(store: &SqliteStore, name: &str) -> Company {
        store
            .insert_company(&NewCompany {
                name: name.to_string(),
                slug: name.to_lowercase(),
                ..NewCompany::default()
            })
            .unwrap()
    }

    fn new_review(company_id: &str, author: Option<&str>) -> NewReview {
        NewReview {
            company_id: company_id.to_string(),
            author_id: author.map(str::to_string),
            title: "Great team".to_string(),
            content: "Learned a lot".to_string(),
            rating: Some(5),
            ..NewReview::default()
        }
    }

    #[test]
    fn test_insert_review_returns_company_and_empty_relations() {
        let store = store();
        let acme = company(&store, "Acme");
        let review = store.insert_review(&new_review(&acme.id, Some("u1"))).unwrap();

        assert_eq!(review.company.as_ref().map(|c| c.name.as_str()), Some("Acme"));
        assert!(review.reactions.is_empty());
        assert!(review.comments.is_empty());
        assert_eq!(store.count_reviews().unwrap(), 1);
    }

    #[test]
    fn test_missing_rating_is_not_null_violation() {
        let store = store();
        let acme = company(&store, "Acme");
        let mut input = new_review(&acme.id, Some("u1"));
        input.rating = None;

        let err = store.insert_review(&input).unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::NotNullViolation);
        assert_eq!(err.code.as_deref(), Some("23502"));
        assert_eq!(err.details.as_deref(), Some("rating"));
    }

    #[test]
    fn test_rating_out_of_range_is_check_violation() {
        let store = store();
        let acme = company(&store, "Acme");
        let mut input = new_review(&acme.id, Some("u1"));
        input.rating = Some(9);

        let err = store.insert_review(&input).unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::CheckViolation);
    }

    #[test]
    fn test_unknown_company_is_foreign_key_violation() {
        let store = store();
        let err = store
            .insert_review(&new_review("no-such-company", Some("u1")))
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::ForeignKeyViolation);
        assert_eq!(err.code.as_deref(), Some("23503"));
    }

    #[test]
    fn test_unknown_company_accepted_without_foreign_keys() {
        let store = SqliteStore::open_in_memory(StoreOptions {
            enforce_foreign_keys: false,
        })
        .unwrap();
        store.init_schema().unwrap();
        store.sign_in(SessionUser::new("u1")).unwrap();

        let review = store
            .insert_review(&new_review("no-such-company", Some("u1")))
            .unwrap();
        assert!(review.company.is_none());
    }

    #[test]
    fn test_missing_table_is_classified() {
        let store = SqliteStore::open_in_memory(StoreOptions::default()).unwrap();
        let err = store.count_reviews().unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::MissingTable);
        assert_eq!(err.details.as_deref(), Some("reviews"));
    }

    #[test]
    fn test_duplicate_reaction_is_unique_violation() {
        let store = store();
        let acme = company(&store, "Acme");
        let review = store.insert_review(&new_review(&acme.id, Some("u1"))).unwrap();
        let like = NewReaction {
            review_id: review.review.id.clone(),
            user_id: "u1".to_string(),
            kind: ReactionKind::Like,
        };

        store.insert_reaction(&like).unwrap();
        let err = store.insert_reaction(&like).unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::UniqueViolation);
        assert_eq!(store.count_reactions_by_user("u1", ReactionKind::Like).unwrap(), 1);
    }

    #[test]
    fn test_reaction_policy_rejects_other_user() {
        let store = store();
        let acme = company(&store, "Acme");
        let review = store.insert_review(&new_review(&acme.id, Some("u1"))).unwrap();

        let err = store
            .insert_reaction(&NewReaction {
                review_id: review.review.id,
                user_id: "u2".to_string(),
                kind: ReactionKind::Like,
            })
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::PermissionDenied);
        assert!(err.message.contains("policy"));
    }

    #[test]
    fn test_delete_requires_author() {
        let store = store();
        let acme = company(&store, "Acme");
        let review = store.insert_review(&new_review(&acme.id, Some("u1"))).unwrap();

        store.sign_in(SessionUser::new("u2")).unwrap();
        let err = store.delete_review(&review.review.id).unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::PermissionDenied);
        assert!(store.review_exists(&review.review.id).unwrap());

        store.sign_in(SessionUser::new("u1")).unwrap();
        store.delete_review(&review.review.id).unwrap();
        assert!(!store.review_exists(&review.review.id).unwrap());
    }

    #[test]
    fn test_delete_cascades_relations() {
        let store = store();
        let acme = company(&store, "Acme");
        let review = store.insert_review(&new_review(&acme.id, Some("u1"))).unwrap();
        let id = review.review.id.clone();

        store
            .insert_reaction(&NewReaction {
                review_id: id.clone(),
                user_id: "u1".to_string(),
                kind: ReactionKind::Like,
            })
            .unwrap();
        store
            .insert_comment(&NewComment {
                review_id: id.clone(),
                author_id: None,
                content: "agreed".to_string(),
                is_anonymous: true,
                parent_comment_id: None,
            })
            .unwrap();

        store.delete_review(&id).unwrap();
        let reactions: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM reactions", [], |r| r.get(0))
            .unwrap();
        let comments: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM comments", [], |r| r.get(0))
            .unwrap();
        assert_eq!((reactions, comments), (0, 0));
    }

    #[test]
    fn test_update_review_sets_fields() {
        let store = store();
        let acme = company(&store, "Acme");
        let review = store.insert_review(&new_review(&acme.id, Some("u1"))).unwrap();

        store
            .update_review(
                &review.review.id,
                &ReviewPatch {
                    rating: Some(3),
                    cons: Some(Some("Slow reviews".to_string())),
                    ..ReviewPatch::default()
                },
            )
            .unwrap();

        let fresh = store.select_review(&review.review.id).unwrap().unwrap();
        assert_eq!(fresh.review.rating, 3);
        assert_eq!(fresh.review.cons.as_deref(), Some("Slow reviews"));
        assert_eq!(fresh.review.title, "Great team");

        store
            .update_review(
                &review.review.id,
                &ReviewPatch {
                    cons: Some(None),
                    ..ReviewPatch::default()
                },
            )
            .unwrap();
        let cleared = store.select_review(&review.review.id).unwrap().unwrap();
        assert!(cleared.review.cons.is_none());
        assert_eq!(cleared.review.rating, 3);
    }

    #[test]
    fn test_select_reviews_offset_beyond_i64_is_empty() {
        let store = store();
        let acme = company(&store, "Acme");
        store.insert_review(&new_review(&acme.id, Some("u1"))).unwrap();

        let far = PageRange {
            from: 1 << 63,
            to: 1 << 63,
        };
        assert!(store.select_reviews(far).unwrap().is_empty());

        let everything = PageRange {
            from: 0,
            to: usize::MAX - 1,
        };
        assert_eq!(store.select_reviews(everything).unwrap().len(), 1);
    }

    #[test]
    fn test_select_reviews_pages_newest_first() {
        let store = store();
        let acme = company(&store, "Acme");
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(store.insert_review(&new_review(&acme.id, Some("u1"))).unwrap().review.id);
        }

        let first = store.select_reviews(PageRange::for_page(1, 2).unwrap()).unwrap();
        let third = store.select_reviews(PageRange::for_page(3, 2).unwrap()).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].review.id, ids[4]);
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].review.id, ids[0]);
    }

    #[test]
    fn test_company_name_lookup_ignores_case() {
        let store = store();
        let acme = company(&store, "Acme Corp");
        let found = store.find_companies_by_name("ACME corp").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, acme.id);
    }

    #[test]
    fn test_company_insert_needs_session() {
        let store = store();
        store.sign_out();
        let err = store
            .insert_company(&NewCompany {
                name: "Acme".to_string(),
                slug: "acme".to_string(),
                ..NewCompany::default()
            })
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::PermissionDenied);
    }

    #[test]
    fn test_profile_created_on_sign_in() {
        let store = store();
        store
            .sign_in(SessionUser {
                id: "u3".to_string(),
                email: Some("dana@example.com".to_string()),
            })
            .unwrap();
        let profile = store.select_profile("u3").unwrap().unwrap();
        assert_eq!(profile.username.as_deref(), Some("dana"));

        let updated = store
            .update_profile(
                "u3",
                &ProfileUpdate {
                    bio: Some("Backend engineer".to_string()),
                    ..ProfileUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Backend engineer"));
        assert_eq!(updated.username.as_deref(), Some("dana"));
    }
}
