//! Remote data service abstraction.
//!
//! [`RemoteStore`] is the query/mutation surface the review layer consumes:
//! the auth session, nested-relation selects, range-bounded selects, exact
//! counts, inserts, updates, and deletes. Failures come back as a typed
//! [`RemoteError`] so callers never inspect backend error strings.
//!
//! [`SqliteStore`] is the shipped implementation.

mod sqlite;

pub use sqlite::{SqliteStore, StoreOptions};

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::model::{
    Comment, Company, NewComment, NewCompany, NewReaction, NewReview, Profile, ProfileUpdate,
    Reaction, ReactionKind, ReviewPatch, ReviewWithRelations,
};

/// Result type alias for store calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Classified failure kind of a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// A required column was null (`23502`).
    NotNullViolation,
    /// A referenced row does not exist (`23503`).
    ForeignKeyViolation,
    /// A unique key already exists (`23505`).
    UniqueViolation,
    /// A column value failed a check constraint (`23514`).
    CheckViolation,
    /// A row-level policy rejected the call (`42501`).
    PermissionDenied,
    /// The table is not set up (`42P01`).
    MissingTable,
    /// A single-row select matched nothing.
    NotFound,
    /// Anything else.
    Other,
}

impl RemoteErrorKind {
    /// Backend error code reported for this kind, when one exists.
    #[must_use]
    pub const fn code(self) -> Option<&'static str> {
        match self {
            Self::NotNullViolation => Some("23502"),
            Self::ForeignKeyViolation => Some("23503"),
            Self::UniqueViolation => Some("23505"),
            Self::CheckViolation => Some("23514"),
            Self::PermissionDenied => Some("42501"),
            Self::MissingTable => Some("42P01"),
            Self::NotFound | Self::Other => None,
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotNullViolation => "not_null_violation",
            Self::ForeignKeyViolation => "foreign_key_violation",
            Self::UniqueViolation => "unique_violation",
            Self::CheckViolation => "check_violation",
            Self::PermissionDenied => "permission_denied",
            Self::MissingTable => "missing_table",
            Self::NotFound => "not_found",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// A failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    /// Backend error code (e.g., "23503").
    pub code: Option<String>,
    pub message: String,
    /// Offending column, table, or constraint when known.
    pub details: Option<String>,
}

impl RemoteError {
    #[must_use]
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.code().map(str::to_string),
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Row-level policy rejection for `table`.
    #[must_use]
    pub fn policy(table: &str) -> Self {
        Self::new(
            RemoteErrorKind::PermissionDenied,
            format!("new row violates row-level security policy for table \"{table}\""),
        )
        .with_details(table)
    }
}

/// Inclusive row range for a paginated select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub from: usize,
    pub to: usize,
}

impl PageRange {
    /// Range for a 1-based `page` of `limit` rows. Zero values are treated as 1.
    ///
    /// Returns `None` when the first row's offset overflows `usize`; such a
    /// page lies past the end of any table.
    #[must_use]
    pub fn for_page(page: usize, limit: usize) -> Option<Self> {
        let limit = limit.max(1);
        let from = (page.max(1) - 1).checked_mul(limit)?;
        Some(Self {
            from,
            to: from.saturating_add(limit - 1),
        })
    }

    /// Number of rows the range spans (never zero).
    #[must_use]
    pub const fn row_count(&self) -> usize {
        (self.to - self.from).saturating_add(1)
    }
}

/// The signed-in user of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
}

impl SessionUser {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

/// Query/mutation client for the remote data service.
///
/// All selects of reviews return nested company, reactions, and comments.
pub trait RemoteStore {
    // -- Session --

    /// The authenticated user, or `None` when signed out.
    fn current_user(&self) -> RemoteResult<Option<SessionUser>>;

    // -- Reviews --

    /// Exact row count over the whole reviews table.
    fn count_reviews(&self) -> RemoteResult<usize>;

    /// Reviews in `range`, newest first.
    fn select_reviews(&self, range: PageRange) -> RemoteResult<Vec<ReviewWithRelations>>;

    fn select_review(&self, review_id: &str) -> RemoteResult<Option<ReviewWithRelations>>;

    fn review_exists(&self, review_id: &str) -> RemoteResult<bool>;

    /// Insert a review and return it with its company and empty relations.
    fn insert_review(&self, review: &NewReview) -> RemoteResult<ReviewWithRelations>;

    fn update_review(&self, review_id: &str, patch: &ReviewPatch) -> RemoteResult<()>;

    fn delete_review(&self, review_id: &str) -> RemoteResult<()>;

    /// Reviews written by `author_id`, newest first.
    fn select_reviews_by_author(
        &self,
        author_id: &str,
    ) -> RemoteResult<Vec<ReviewWithRelations>>;

    /// Reviews of one company, newest first.
    fn select_company_reviews(&self, company_id: &str) -> RemoteResult<Vec<ReviewWithRelations>>;

    // -- Reactions --

    fn insert_reaction(&self, reaction: &NewReaction) -> RemoteResult<Reaction>;

    /// Delete matching reactions; returns the number of rows removed.
    fn delete_reaction(&self, review_id: &str, user_id: &str, kind: ReactionKind)
        -> RemoteResult<usize>;

    fn count_reactions_by_user(&self, user_id: &str, kind: ReactionKind) -> RemoteResult<usize>;

    // -- Comments --

    fn insert_comment(&self, comment: &NewComment) -> RemoteResult<Comment>;

    fn select_comment(&self, comment_id: &str) -> RemoteResult<Option<Comment>>;

    // -- Companies --

    /// Companies whose name equals `name`, ignoring case.
    fn find_companies_by_name(&self, name: &str) -> RemoteResult<Vec<Company>>;

    fn select_company_by_slug(&self, slug: &str) -> RemoteResult<Option<Company>>;

    /// All companies ordered by name.
    fn select_companies(&self) -> RemoteResult<Vec<Company>>;

    fn insert_company(&self, company: &NewCompany) -> RemoteResult<Company>;

    // -- Profiles --

    fn select_profile(&self, user_id: &str) -> RemoteResult<Option<Profile>>;

    fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> RemoteResult<Profile>;
}

/// Forwarding impl so a repository can borrow a store the caller keeps.
impl<T: RemoteStore + ?Sized> RemoteStore for &T {
    fn current_user(&self) -> RemoteResult<Option<SessionUser>> {
        (**self).current_user()
    }
    fn count_reviews(&self) -> RemoteResult<usize> {
        (**self).count_reviews()
    }
    fn select_reviews(&self, range: PageRange) -> RemoteResult<Vec<ReviewWithRelations>> {
        (**self).select_reviews(range)
    }
    fn select_review(&self, review_id: &str) -> RemoteResult<Option<ReviewWithRelations>> {
        (**self).select_review(review_id)
    }
    fn review_exists(&self, review_id: &str) -> RemoteResult<bool> {
        (**self).review_exists(review_id)
    }
    fn insert_review(&self, review: &NewReview) -> RemoteResult<ReviewWithRelations> {
        (**self).insert_review(review)
    }
    fn update_review(&self, review_id: &str, patch: &ReviewPatch) -> RemoteResult<()> {
        (**self).update_review(review_id, patch)
    }
    fn delete_review(&self, review_id: &str) -> RemoteResult<()> {
        (**self).delete_review(review_id)
    }
    fn select_reviews_by_author(
        &self,
        author_id: &str,
    ) -> RemoteResult<Vec<ReviewWithRelations>> {
        (**self).select_reviews_by_author(author_id)
    }
    fn select_company_reviews(&self, company_id: &str) -> RemoteResult<Vec<ReviewWithRelations>> {
        (**self).select_company_reviews(company_id)
    }
    fn insert_reaction(&self, reaction: &NewReaction) -> RemoteResult<Reaction> {
        (**self).insert_reaction(reaction)
    }
    fn delete_reaction(
        &self,
        review_id: &str,
        user_id: &str,
        kind: ReactionKind,
    ) -> RemoteResult<usize> {
        (**self).delete_reaction(review_id, user_id, kind)
    }
    fn count_reactions_by_user(&self, user_id: &str, kind: ReactionKind) -> RemoteResult<usize> {
        (**self).count_reactions_by_user(user_id, kind)
    }
    fn insert_comment(&self, comment: &NewComment) -> RemoteResult<Comment> {
        (**self).insert_comment(comment)
    }
    fn select_comment(&self, comment_id: &str) -> RemoteResult<Option<Comment>> {
        (**self).select_comment(comment_id)
    }
    fn find_companies_by_name(&self, name: &str) -> RemoteResult<Vec<Company>> {
        (**self).find_companies_by_name(name)
    }
    fn select_company_by_slug(&self, slug: &str) -> RemoteResult<Option<Company>> {
        (**self).select_company_by_slug(slug)
    }
    fn select_companies(&self) -> RemoteResult<Vec<Company>> {
        (**self).select_companies()
    }
    fn insert_company(&self, company: &NewCompany) -> RemoteResult<Company> {
        (**self).insert_company(company)
    }
    fn select_profile(&self, user_id: &str) -> RemoteResult<Option<Profile>> {
        (**self).select_profile(user_id)
    }
    fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> RemoteResult<Profile> {
        (**self).update_profile(user_id, update)
    }
}
