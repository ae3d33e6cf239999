//! Profile service: statistics, validation, and updates.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{CoreError, CoreResult};
use crate::model::{Profile, ProfileUpdate, ReactionKind, ReviewWithRelations};
use crate::store::RemoteStore;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const FULL_NAME_MAX: usize = 100;
pub const BIO_MAX: usize = 500;

/// Activity summary for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    pub reviews_count: usize,
    /// `helpful` reactions the user has given.
    pub helpful_votes: usize,
    pub companies_reviewed: usize,
    /// Mean rating of the user's reviews, 0 when there are none.
    pub average_rating: f64,
}

/// Check profile fields, returning one message per violation.
///
/// Unset and empty fields are not checked.
#[must_use]
pub fn validate_profile(update: &ProfileUpdate) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(username) = update.username.as_deref().filter(|s| !s.is_empty()) {
        let len = username.chars().count();
        if len < USERNAME_MIN {
            errors.push(format!(
                "Username must be at least {USERNAME_MIN} characters long"
            ));
        }
        if len > USERNAME_MAX {
            errors.push(format!("Username must be at most {USERNAME_MAX} characters"));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            errors.push(
                "Username can only contain letters, numbers, hyphens, and underscores".to_string(),
            );
        }
    }

    if let Some(name) = update.full_name.as_deref() {
        if name.chars().count() > FULL_NAME_MAX {
            errors.push(format!("Full name must be at most {FULL_NAME_MAX} characters"));
        }
    }

    if let Some(bio) = update.bio.as_deref() {
        if bio.chars().count() > BIO_MAX {
            errors.push(format!("Bio must be at most {BIO_MAX} characters"));
        }
    }

    if let Some(website) = update.website.as_deref().filter(|s| !s.is_empty()) {
        if !is_web_url(website) {
            errors.push("Please enter a valid website URL".to_string());
        }
    }

    errors
}

/// Absolute `http`/`https` URL with a non-empty host.
fn is_web_url(s: &str) -> bool {
    let Some((scheme, rest)) = s.split_once("://") else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return false;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    !host.is_empty() && !host.chars().any(char::is_whitespace)
}

/// Service for profile operations.
pub struct ProfileService<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RemoteStore + ?Sized> ProfileService<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Compute activity statistics for `user_id`.
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self, user_id: &str) -> CoreResult<ProfileStats> {
        let reviews = self
            .store
            .select_reviews_by_author(user_id)
            .map_err(|e| CoreError::from_remote("fetch profile stats", e))?;
        let helpful_votes = self
            .store
            .count_reactions_by_user(user_id, ReactionKind::Helpful)
            .map_err(|e| CoreError::from_remote("fetch profile stats", e))?;

        let reviews_count = reviews.len();
        let companies_reviewed = reviews
            .iter()
            .map(|r| r.review.company_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let average_rating = if reviews_count == 0 {
            0.0
        } else {
            let sum: u32 = reviews.iter().map(|r| u32::from(r.review.rating)).sum();
            f64::from(sum) / reviews_count as f64
        };

        Ok(ProfileStats {
            reviews_count,
            helpful_votes,
            companies_reviewed,
            average_rating,
        })
    }

    /// Reviews written by `user_id`, newest first, with company and relations.
    ///
    /// Anonymous reviews are left out unless `include_anonymous` is set.
    pub fn reviews(
        &self,
        user_id: &str,
        include_anonymous: bool,
    ) -> CoreResult<Vec<ReviewWithRelations>> {
        let mut reviews = self
            .store
            .select_reviews_by_author(user_id)
            .map_err(|e| CoreError::from_remote("fetch user reviews", e))?;
        if !include_anonymous {
            reviews.retain(|r| !r.review.is_anonymous);
        }
        Ok(reviews)
    }

    /// Delete one of the signed-in user's own reviews.
    ///
    /// Works from the author's review list, so the review need not be on any
    /// loaded page.
    pub fn delete_own_review(&self, review_id: &str) -> CoreResult<()> {
        let session = self
            .store
            .current_user()
            .map_err(|e| CoreError::from_remote("delete review", e))?
            .ok_or(CoreError::NotAuthenticated)?;

        let owned = self
            .reviews(&session.id, true)?
            .iter()
            .any(|r| r.id() == review_id);
        if !owned {
            return Err(CoreError::ReviewNotFound {
                review_id: review_id.to_string(),
            });
        }

        self.store.delete_review(review_id).map_err(|e| {
            warn!(review_id, error = %e, "failed to delete own review");
            CoreError::from_remote("delete review", e)
        })?;
        info!(review_id, user_id = %session.id, "deleted own review");
        Ok(())
    }

    /// Profile of the signed-in user.
    pub fn current(&self) -> CoreResult<Profile> {
        let session = self
            .store
            .current_user()
            .map_err(|e| CoreError::from_remote("fetch profile", e))?
            .ok_or(CoreError::NotAuthenticated)?;
        self.store
            .select_profile(&session.id)
            .map_err(|e| CoreError::from_remote("fetch profile", e))?
            .ok_or_else(|| CoreError::Remote {
                operation: "fetch profile".to_string(),
                message: format!("no profile for {}", session.id),
            })
    }

    /// Validate and apply `update` to the signed-in user's profile.
    pub fn update(&self, update: &ProfileUpdate) -> CoreResult<Profile> {
        let errors = validate_profile(update);
        if !errors.is_empty() {
            return Err(CoreError::InvalidProfile(errors));
        }
        let session = self
            .store
            .current_user()
            .map_err(|e| CoreError::from_remote("update profile", e))?
            .ok_or(CoreError::NotAuthenticated)?;

        let profile = self
            .store
            .update_profile(&session.id, update)
            .map_err(|e| CoreError::from_remote("update profile", e))?;
        info!(user_id = %session.id, "updated profile");
        Ok(profile)
    }
}
