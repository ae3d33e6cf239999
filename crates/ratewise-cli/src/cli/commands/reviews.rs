//! Implementation of `ratewise reviews` subcommands.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::cli::commands::helpers::{not_on_page_error, open_session, CommandContext};
use crate::cli::{ClearableField, ReviewDetailsArgs};
use crate::output::{Formatter, OutputFormat};
use ratewise_core::actions::{ReviewActions, ReviewDraft};
use ratewise_core::filter::ReviewQuery;
use ratewise_core::model::{ReviewPatch, ReviewWithRelations};
use ratewise_core::repository::ReviewRepository;
use ratewise_core::store::RemoteStore;
use ratewise_core::threads::build_threads;
use ratewise_core::CoreError;

/// One line of `reviews list`.
#[derive(Debug, Serialize)]
pub struct ReviewRow {
    pub review_id: String,
    pub company: String,
    pub rating: u8,
    pub title: String,
    pub author: String,
    pub likes: usize,
    pub comments: usize,
    pub created: String,
}

impl From<&ReviewWithRelations> for ReviewRow {
    fn from(r: &ReviewWithRelations) -> Self {
        let author = if r.review.is_anonymous {
            "anonymous".to_string()
        } else {
            r.review
                .author_id
                .clone()
                .unwrap_or_else(|| "unknown".to_string())
        };
        Self {
            review_id: r.review.id.clone(),
            company: r.company_name().to_string(),
            rating: r.review.rating,
            title: r.review.title.clone(),
            author,
            likes: r.like_count(),
            comments: r.comments.len(),
            created: r.review.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Build a create-form draft from CLI arguments.
pub fn draft_from_args(
    company: String,
    title: String,
    content: String,
    rating: u8,
    details: ReviewDetailsArgs,
    anonymous: bool,
    current: bool,
) -> ReviewDraft {
    ReviewDraft {
        company_name: company,
        title,
        content,
        rating: Some(rating),
        position: details.position,
        department: details.department,
        employment_type: details.employment_type,
        work_location: details.work_location,
        is_anonymous: anonymous,
        is_current_employee: current,
        pros: details.pros,
        cons: details.cons,
        advice_to_management: details.advice,
    }
}

/// Build a partial update from CLI arguments.
///
/// Unset flags leave fields alone. A field named in `clear` is emptied, even
/// if a value was also given for it.
pub fn patch_from_args(
    title: Option<String>,
    content: Option<String>,
    rating: Option<u8>,
    details: ReviewDetailsArgs,
    clear: &[ClearableField],
    current: Option<bool>,
) -> ReviewPatch {
    let field = |value: Option<String>, which: ClearableField| {
        if clear.contains(&which) {
            Some(None)
        } else {
            value.map(Some)
        }
    };

    ReviewPatch {
        title,
        content,
        rating,
        position: field(details.position, ClearableField::Position),
        department: field(details.department, ClearableField::Department),
        employment_type: field(details.employment_type, ClearableField::EmploymentType),
        work_location: field(details.work_location, ClearableField::WorkLocation),
        is_current_employee: current,
        pros: field(details.pros, ClearableField::Pros),
        cons: field(details.cons, ClearableField::Cons),
        advice_to_management: field(details.advice, ClearableField::Advice),
        ..ReviewPatch::default()
    }
}

/// List one page of reviews, filtered and sorted client-side.
#[tracing::instrument(skip(ctx, query, format))]
pub fn run_reviews_list(
    ctx: &CommandContext,
    page: usize,
    query: &ReviewQuery,
    format: OutputFormat,
) -> Result<()> {
    let session = open_session(ctx)?;
    let mut repo =
        ReviewRepository::with_page_size(&session.store, session.config.reviews.page_size);
    repo.set_page(page)?;

    let rows: Vec<ReviewRow> = query
        .apply(repo.reviews(), Utc::now())
        .into_iter()
        .map(ReviewRow::from)
        .collect();

    let mut advice = vec![format!(
        "page {} of {} ({} reviews)",
        repo.current_page(),
        repo.total_pages(),
        repo.total_count()
    )];
    if repo.current_page() < repo.total_pages() {
        advice.push(format!("ratewise reviews list --page {}", repo.current_page() + 1));
    }

    Formatter::new(format).print_list(&rows, "No reviews found", "reviews", &advice)
}

/// Show one review with threaded comments.
#[tracing::instrument(skip(ctx, format))]
pub fn run_reviews_show(ctx: &CommandContext, review_id: &str, format: OutputFormat) -> Result<()> {
    let session = open_session(ctx)?;
    let review = session
        .store
        .select_review(review_id)?
        .ok_or_else(|| CoreError::ReviewNotFound {
            review_id: review_id.to_string(),
        })?;

    let output = serde_json::json!({
        "review_id": review.review.id,
        "company": review.company_name(),
        "review": review.review,
        "likes": review.like_count(),
        "threads": build_threads(&review.comments),
    });
    Formatter::new(format).print(&output)
}

/// Create a review, creating its company if needed.
#[tracing::instrument(skip(ctx, draft, format))]
pub fn run_reviews_create(
    ctx: &CommandContext,
    draft: ReviewDraft,
    format: OutputFormat,
) -> Result<()> {
    let user = ctx.require_user()?;
    let session = open_session(ctx)?;
    let mut repo =
        ReviewRepository::with_page_size(&session.store, session.config.reviews.page_size);

    let created = ReviewActions::new(&mut repo).submit_review(draft, Some(user))?;
    Formatter::new(format).print(&ReviewRow::from(&created))
}

/// Update a review on `page`.
#[tracing::instrument(skip(ctx, patch, format))]
pub fn run_reviews_update(
    ctx: &CommandContext,
    review_id: &str,
    patch: &ReviewPatch,
    page: usize,
    format: OutputFormat,
) -> Result<()> {
    ctx.require_user()?;
    let session = open_session(ctx)?;
    let mut repo =
        ReviewRepository::with_page_size(&session.store, session.config.reviews.page_size);
    repo.set_page(page)?;
    if repo.find(review_id).is_none() {
        return Err(not_on_page_error(review_id, page));
    }

    repo.update_review(review_id, patch)?;
    let updated = repo
        .find(review_id)
        .map(ReviewRow::from)
        .ok_or_else(|| not_on_page_error(review_id, page))?;
    Formatter::new(format).print(&updated)
}

/// Delete a review on `page`.
#[tracing::instrument(skip(ctx, format))]
pub fn run_reviews_delete(
    ctx: &CommandContext,
    review_id: &str,
    page: usize,
    format: OutputFormat,
) -> Result<()> {
    ctx.require_user()?;
    let session = open_session(ctx)?;
    let mut repo =
        ReviewRepository::with_page_size(&session.store, session.config.reviews.page_size);
    repo.set_page(page)?;
    if repo.find(review_id).is_none() {
        return Err(not_on_page_error(review_id, page));
    }

    repo.delete_review(review_id)?;
    let output = serde_json::json!({
        "review_id": review_id,
        "deleted": true,
        "remaining": repo.total_count(),
    });
    Formatter::new(format).print(&output)
}
