//! Review repository: the canonical in-memory review list and its mutations.
//!
//! The repository holds one page of reviews (with nested company, reactions,
//! and comments), the total review count, and the current page. Every mutation
//! goes to the remote store first; the local list changes only on success,
//! except for update and delete, which are applied optimistically and rolled
//! back when the store rejects them.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::errors::{CoreError, CoreResult};
use crate::model::{
    Comment, LikeState, NewComment, NewReaction, NewReview, ReactionKind, ReviewPatch,
    ReviewWithRelations,
};
use crate::store::{PageRange, RemoteErrorKind, RemoteStore};

/// Reviews per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// Number of pages needed for `total` rows at `limit` per page.
#[must_use]
pub const fn page_count(total: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

/// Owned, read-only view of the repository state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewListSnapshot {
    pub reviews: Vec<ReviewWithRelations>,
    pub total_count: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Owns the loaded review page and performs all review mutations.
pub struct ReviewRepository<S: RemoteStore> {
    store: S,
    reviews: Vec<ReviewWithRelations>,
    total_count: usize,
    current_page: usize,
    page_size: usize,
}

impl<S: RemoteStore> ReviewRepository<S> {
    /// Create an empty repository with the default page size.
    pub fn new(store: S) -> Self {
        Self::with_page_size(store, DEFAULT_PAGE_SIZE)
    }

    /// Create an empty repository. A zero page size falls back to the default.
    pub fn with_page_size(store: S, page_size: usize) -> Self {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        Self {
            store,
            reviews: Vec::new(),
            total_count: 0,
            current_page: 1,
            page_size,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Reviews of the loaded page, newest first.
    pub fn reviews(&self) -> &[ReviewWithRelations] {
        &self.reviews
    }

    pub const fn total_count(&self) -> usize {
        self.total_count
    }

    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    /// Limit of the last fetch, or the construction default before any fetch.
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Pages needed for the total count at the current page size.
    pub const fn total_pages(&self) -> usize {
        page_count(self.total_count, self.page_size)
    }

    /// Find a loaded review by id.
    pub fn find(&self, review_id: &str) -> Option<&ReviewWithRelations> {
        self.reviews.iter().find(|r| r.id() == review_id)
    }

    /// Whether `user_id` likes the loaded review `review_id`.
    pub fn is_liked_by(&self, review_id: &str, user_id: &str) -> bool {
        self.find(review_id)
            .is_some_and(|r| r.is_liked_by(user_id))
    }

    pub fn snapshot(&self) -> ReviewListSnapshot {
        ReviewListSnapshot {
            reviews: self.reviews.clone(),
            total_count: self.total_count,
            current_page: self.current_page,
            page_size: self.page_size,
            total_pages: self.total_pages(),
        }
    }

    fn position(&self, review_id: &str) -> CoreResult<usize> {
        self.reviews
            .iter()
            .position(|r| r.id() == review_id)
            .ok_or_else(|| CoreError::ReviewNotFound {
                review_id: review_id.to_string(),
            })
    }

    // ------------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------------

    /// Load 1-based `page` of `limit` reviews, newest first.
    ///
    /// `page` and `limit` become the current page and page size (zero counts
    /// as 1). The total count is replaced whenever the count succeeds. The
    /// list is replaced on success and cleared on any failure. A page past the
    /// end loads nothing. Returns the number of reviews loaded.
    pub fn fetch_reviews(&mut self, page: usize, limit: usize) -> CoreResult<usize> {
        self.current_page = page.max(1);
        self.page_size = limit.max(1);

        let result = self.store.count_reviews().and_then(|total| {
            self.total_count = total;
            match PageRange::for_page(self.current_page, self.page_size) {
                Some(range) => self.store.select_reviews(range),
                None => Ok(Vec::new()),
            }
        });

        match result {
            Ok(reviews) => {
                debug!(
                    page,
                    limit,
                    total = self.total_count,
                    loaded = reviews.len(),
                    "fetched reviews"
                );
                self.reviews = reviews;
                Ok(self.reviews.len())
            }
            Err(e) => {
                error!(page, limit, error = %e, "failed to fetch reviews");
                self.reviews.clear();
                Err(CoreError::from_remote("fetch reviews", e))
            }
        }
    }

    /// Switch to `page` and load it.
    pub fn set_page(&mut self, page: usize) -> CoreResult<usize> {
        self.fetch_reviews(page, self.page_size)
    }

    /// Reload the current page.
    pub fn refresh(&mut self) -> CoreResult<usize> {
        self.fetch_reviews(self.current_page, self.page_size)
    }

    /// Re-fetch one review and splice it into the list by id.
    ///
    /// Returns `false` when the review is gone remotely or not loaded.
    pub fn refresh_review(&mut self, review_id: &str) -> CoreResult<bool> {
        let fresh = self
            .store
            .select_review(review_id)
            .map_err(|e| CoreError::from_remote("refresh review", e))?;

        match (fresh, self.reviews.iter_mut().find(|r| r.id() == review_id)) {
            (Some(fresh), Some(slot)) => {
                *slot = fresh;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Refresh after a successful mutation; failures are logged, not raised.
    fn refresh_after_mutation(&mut self, review_id: &str) {
        if let Err(e) = self.refresh_review(review_id) {
            warn!(review_id, error = %e, "failed to refresh review after mutation");
        }
    }

    // ------------------------------------------------------------------------
    // Review mutations
    // ------------------------------------------------------------------------

    /// Insert a review and prepend it to the list.
    ///
    /// `author_id` must already be resolved (`None` when anonymous). A failed
    /// insert never appears in the list.
    pub fn add_review(&mut self, input: NewReview) -> CoreResult<ReviewWithRelations> {
        validate_new_review(&input)?;

        let created = self.store.insert_review(&input).map_err(|e| {
            error!(company_id = %input.company_id, error = %e, "failed to add review");
            CoreError::from_remote("add review", e)
        })?;

        info!(review_id = %created.id(), company_id = %input.company_id, "added review");
        self.reviews.insert(0, created.clone());
        self.total_count += 1;
        Ok(created)
    }

    /// Update a loaded review's scalar fields.
    ///
    /// The patch is applied locally first and reverted if the store rejects it.
    pub fn update_review(&mut self, review_id: &str, patch: &ReviewPatch) -> CoreResult<()> {
        let idx = self.position(review_id)?;
        if patch.is_empty() {
            return Ok(());
        }
        if let Some(rating) = patch.rating {
            validate_rating(rating)?;
        }

        let previous = self.reviews[idx].clone();
        patch.apply_to(&mut self.reviews[idx].review);
        self.reviews[idx].review.updated_at = Utc::now();

        if let Err(e) = self.store.update_review(review_id, patch) {
            warn!(review_id, error = %e, "update rejected, rolling back");
            self.reviews[idx] = previous;
            return Err(CoreError::from_remote("update review", e));
        }

        info!(review_id, "updated review");
        self.refresh_after_mutation(review_id);
        Ok(())
    }

    /// Delete a loaded review.
    ///
    /// The review is removed locally first and restored at its old position if
    /// the store rejects the delete.
    pub fn delete_review(&mut self, review_id: &str) -> CoreResult<()> {
        let idx = self.position(review_id)?;
        let removed = self.reviews.remove(idx);
        self.total_count = self.total_count.saturating_sub(1);

        if let Err(e) = self.store.delete_review(review_id) {
            warn!(review_id, error = %e, "delete rejected, rolling back");
            self.reviews.insert(idx, removed);
            self.total_count += 1;
            return Err(CoreError::from_remote("delete review", e));
        }

        info!(review_id, "deleted review");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Social mutations
    // ------------------------------------------------------------------------

    /// Toggle the session user's like on a loaded review.
    ///
    /// `user_hint`, when given, must name the session user. Returns the like
    /// state after the toggle.
    pub fn like_review(
        &mut self,
        review_id: &str,
        user_hint: Option<&str>,
    ) -> CoreResult<LikeState> {
        let session = self
            .store
            .current_user()
            .map_err(|e| CoreError::from_remote("like review", e))?
            .ok_or(CoreError::NotAuthenticated)?;

        if let Some(hint) = user_hint {
            if hint != session.id {
                return Err(CoreError::PermissionDenied {
                    detail: format!("cannot react as {hint} while signed in as {}", session.id),
                });
            }
        }

        let liked = self
            .find(review_id)
            .ok_or_else(|| CoreError::ReviewNotFound {
                review_id: review_id.to_string(),
            })?
            .is_liked_by(&session.id);

        let state = if liked {
            self.store
                .delete_reaction(review_id, &session.id, ReactionKind::Like)
                .map_err(|e| CoreError::from_remote("unlike review", e))?;
            LikeState::Unliked
        } else {
            let reaction = NewReaction {
                review_id: review_id.to_string(),
                user_id: session.id.clone(),
                kind: ReactionKind::Like,
            };
            match self.store.insert_reaction(&reaction) {
                Ok(_) => {}
                Err(e) if e.kind == RemoteErrorKind::UniqueViolation => {
                    debug!(review_id, user_id = %session.id, "like already recorded");
                }
                Err(e) => return Err(CoreError::from_remote("like review", e)),
            }
            LikeState::Liked
        };

        debug!(review_id, user_id = %session.id, ?state, "toggled like");
        self.refresh_after_mutation(review_id);
        Ok(state)
    }

    /// Add a comment (or a reply when `parent_comment_id` is set) to a review.
    ///
    /// The review is re-checked remotely first; if it is missing the current
    /// page is refreshed and the insert still attempted, so the store decides.
    /// An explicit `user_id` takes precedence over the session user, but a
    /// session is still required. Anonymous comments carry no author.
    pub fn add_comment(
        &mut self,
        review_id: &str,
        content: &str,
        is_anonymous: bool,
        user_id: Option<&str>,
        parent_comment_id: Option<&str>,
    ) -> CoreResult<Comment> {
        if content.trim().is_empty() {
            return Err(CoreError::MissingRequiredField {
                field: "content".to_string(),
            });
        }

        match self.store.review_exists(review_id) {
            Ok(true) => {}
            Ok(false) => {
                warn!(review_id, "review missing remotely, refreshing before comment");
                if let Err(e) = self.refresh() {
                    warn!(error = %e, "refresh before comment failed");
                }
            }
            Err(e) => warn!(review_id, error = %e, "could not verify review before comment"),
        }

        let session = self
            .store
            .current_user()
            .map_err(|e| CoreError::from_remote("add comment", e))?
            .ok_or(CoreError::NotAuthenticated)?;
        let author = user_id.map_or(session.id, str::to_string);

        if let Some(parent_id) = parent_comment_id {
            self.check_parent(review_id, parent_id)?;
        }

        let comment = NewComment {
            review_id: review_id.to_string(),
            author_id: (!is_anonymous).then_some(author),
            content: content.trim().to_string(),
            is_anonymous,
            parent_comment_id: parent_comment_id.map(str::to_string),
        };

        let created = self.store.insert_comment(&comment).map_err(|e| {
            error!(review_id, error = %e, "failed to add comment");
            CoreError::from_remote("add comment", e)
        })?;

        info!(review_id, comment_id = %created.id, "added comment");
        self.refresh_after_mutation(review_id);
        Ok(created)
    }

    fn check_parent(&self, review_id: &str, parent_id: &str) -> CoreResult<()> {
        let parent = self
            .store
            .select_comment(parent_id)
            .map_err(|e| CoreError::from_remote("add comment", e))?;
        match parent {
            Some(p) if p.review_id == review_id => Ok(()),
            Some(_) => Err(CoreError::InvalidReference {
                detail: format!("comment {parent_id} belongs to a different review"),
            }),
            None => Err(CoreError::InvalidReference {
                detail: format!("parent comment {parent_id} not found"),
            }),
        }
    }
}

fn validate_rating(rating: u8) -> CoreResult<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(CoreError::InvalidValue {
            field: "rating".to_string(),
            reason: format!("{rating} is outside 1-5"),
        })
    }
}

fn validate_new_review(input: &NewReview) -> CoreResult<()> {
    let required = [
        ("company_id", input.company_id.as_str()),
        ("title", input.title.as_str()),
        ("content", input.content.as_str()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(CoreError::MissingRequiredField {
            field: (*field).to_string(),
        });
    }
    // A missing rating is left to the store's NOT NULL constraint.
    input.rating.map_or(Ok(()), validate_rating)
}
