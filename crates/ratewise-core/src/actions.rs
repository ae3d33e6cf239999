//! Review action facade: identity resolution and the loaded-review guard.
//!
//! Front ends route like, comment, and create-review actions through
//! [`ReviewActions`]. Like and comment actions on reviews that are not in the
//! repository's current page are dropped instead of failing, since the user
//! can only act on what is on screen.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::companies::CompanyDirectory;
use crate::errors::{CoreError, CoreResult};
use crate::model::{Comment, LikeState, NewReview, ReviewWithRelations};
use crate::repository::ReviewRepository;
use crate::store::RemoteStore;

/// Who an action is performed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(String),
    Anonymous,
}

impl Identity {
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            Self::Anonymous => None,
        }
    }
}

/// Outcome of a guarded action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<T> {
    Applied(T),
    /// The target review was not loaded; nothing happened.
    Dropped,
}

impl<T> Dispatch<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(v) => Some(v),
            Self::Dropped => None,
        }
    }
}

/// A review as entered in the create form: company by name, not id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub company_name: String,
    pub title: String,
    pub content: String,
    pub rating: Option<u8>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub employment_type: Option<String>,
    pub work_location: Option<String>,
    pub is_anonymous: bool,
    pub is_current_employee: bool,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub advice_to_management: Option<String>,
}

/// Facade over a [`ReviewRepository`] for user-triggered actions.
pub struct ReviewActions<'a, S: RemoteStore> {
    repo: &'a mut ReviewRepository<S>,
}

impl<'a, S: RemoteStore> ReviewActions<'a, S> {
    pub fn new(repo: &'a mut ReviewRepository<S>) -> Self {
        Self { repo }
    }

    /// Explicit user id, then the session user, then anonymous.
    pub fn resolve_identity(&self, explicit: Option<&str>) -> Identity {
        if let Some(id) = explicit.filter(|s| !s.is_empty()) {
            return Identity::User(id.to_string());
        }
        match self.repo.store().current_user() {
            Ok(Some(user)) => Identity::User(user.id),
            Ok(None) => Identity::Anonymous,
            Err(e) => {
                warn!(error = %e, "could not read session, acting anonymously");
                Identity::Anonymous
            }
        }
    }

    fn is_loaded(&self, review_id: &str, action: &str) -> bool {
        let loaded = self.repo.find(review_id).is_some();
        if !loaded {
            debug!(review_id, action, "review not loaded, dropping action");
        }
        loaded
    }

    /// Toggle a like on a loaded review.
    pub fn like_review(
        &mut self,
        review_id: &str,
        user_id: Option<&str>,
    ) -> CoreResult<Dispatch<LikeState>> {
        if !self.is_loaded(review_id, "like") {
            return Ok(Dispatch::Dropped);
        }
        let identity = self.resolve_identity(user_id);
        self.repo
            .like_review(review_id, identity.user_id())
            .map(Dispatch::Applied)
    }

    /// Comment on (or reply within) a loaded review.
    pub fn add_comment(
        &mut self,
        review_id: &str,
        content: &str,
        is_anonymous: bool,
        user_id: Option<&str>,
        parent_comment_id: Option<&str>,
    ) -> CoreResult<Dispatch<Comment>> {
        if !self.is_loaded(review_id, "comment") {
            return Ok(Dispatch::Dropped);
        }
        let identity = self.resolve_identity(user_id);
        self.repo
            .add_comment(
                review_id,
                content,
                is_anonymous,
                identity.user_id(),
                parent_comment_id,
            )
            .map(Dispatch::Applied)
    }

    /// Create a review from a form draft.
    ///
    /// Finds or creates the company by name, sets the author from the
    /// resolved identity (none when anonymous), and adds the review.
    pub fn submit_review(
        &mut self,
        draft: ReviewDraft,
        user_id: Option<&str>,
    ) -> CoreResult<ReviewWithRelations> {
        let identity = self.resolve_identity(user_id);

        let company = CompanyDirectory::new(self.repo.store())
            .find_or_create(&draft.company_name)
            .ok_or_else(|| CoreError::InvalidReference {
                detail: format!("could not resolve company '{}'", draft.company_name.trim()),
            })?;

        let author_id = if draft.is_anonymous {
            None
        } else {
            identity.user_id().map(str::to_string)
        };

        self.repo.add_review(NewReview {
            company_id: company.id,
            author_id,
            title: draft.title,
            content: draft.content,
            rating: draft.rating,
            position: draft.position,
            department: draft.department,
            employment_type: draft.employment_type,
            work_location: draft.work_location,
            is_anonymous: draft.is_anonymous,
            is_current_employee: draft.is_current_employee,
            pros: draft.pros,
            cons: draft.cons,
            advice_to_management: draft.advice_to_management,
        })
    }
}
