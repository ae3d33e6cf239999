//! Implementation of `ratewise like` and `ratewise comment`.
//!
//! Both act through [`ReviewActions`], which ignores reviews that are not on
//! the loaded page. The CLI turns a dropped action into an error naming the
//! page it looked at.

use anyhow::Result;

use crate::cli::commands::helpers::{not_on_page_error, open_session, CommandContext};
use crate::output::{Formatter, OutputFormat};
use ratewise_core::actions::{Dispatch, ReviewActions};
use ratewise_core::repository::ReviewRepository;

/// Toggle the acting user's like on a review.
#[tracing::instrument(skip(ctx, format))]
pub fn run_like(
    ctx: &CommandContext,
    review_id: &str,
    page: usize,
    format: OutputFormat,
) -> Result<()> {
    let session = open_session(ctx)?;
    let mut repo =
        ReviewRepository::with_page_size(&session.store, session.config.reviews.page_size);
    repo.set_page(page)?;

    let state = match ReviewActions::new(&mut repo).like_review(review_id, ctx.user.as_deref())? {
        Dispatch::Applied(state) => state,
        Dispatch::Dropped => return Err(not_on_page_error(review_id, page)),
    };

    let likes = repo.find(review_id).map_or(0, |r| r.like_count());
    let output = serde_json::json!({
        "review_id": review_id,
        "state": state,
        "likes": likes,
    });
    Formatter::new(format).print(&output)
}

/// Comment on a review, optionally as a reply.
#[tracing::instrument(skip(ctx, content, format))]
pub fn run_comment(
    ctx: &CommandContext,
    review_id: &str,
    content: &str,
    anonymous: bool,
    reply_to: Option<&str>,
    page: usize,
    format: OutputFormat,
) -> Result<()> {
    let session = open_session(ctx)?;
    let mut repo =
        ReviewRepository::with_page_size(&session.store, session.config.reviews.page_size);
    repo.set_page(page)?;

    let dispatch = ReviewActions::new(&mut repo).add_comment(
        review_id,
        content,
        anonymous,
        ctx.user.as_deref(),
        reply_to,
    )?;
    let comment = dispatch
        .applied()
        .ok_or_else(|| not_on_page_error(review_id, page))?;

    let output = serde_json::json!({
        "comment_id": comment.id,
        "review_id": comment.review_id,
        "reply_to": comment.parent_comment_id,
        "anonymous": comment.is_anonymous,
        "content": comment.content,
    });
    Formatter::new(format).print(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::init::run_init;
    use crate::cli::commands::reviews::{draft_from_args, run_reviews_create};
    use crate::cli::ReviewDetailsArgs;
    use ratewise_core::store::RemoteStore;
    use tempfile::{tempdir, TempDir};

    fn setup_with_review() -> (TempDir, CommandContext, String) {
        let dir = tempdir().unwrap();
        let ctx = CommandContext::new(
            dir.path(),
            Some(dir.path().join("ratewise.db")),
            Some("u1".to_string()),
        );
        run_init(&ctx, false, OutputFormat::Json).unwrap();
        let draft = draft_from_args(
            "Acme".to_string(),
            "Fine".to_string(),
            "Decent".to_string(),
            3,
            ReviewDetailsArgs::default(),
            false,
            false,
        );
        run_reviews_create(&ctx, draft, OutputFormat::Json).unwrap();

        let session = open_session(&ctx).unwrap();
        let mut repo = ReviewRepository::new(&session.store);
        repo.fetch_reviews(1, 15).unwrap();
        let id = repo.reviews()[0].id().to_string();
        (dir, ctx, id)
    }

    #[test]
    fn test_like_toggles() {
        let (_dir, ctx, id) = setup_with_review();

        run_like(&ctx, &id, 1, OutputFormat::Json).unwrap();
        let session = open_session(&ctx).unwrap();
        assert!(session.store.select_review(&id).unwrap().unwrap().is_liked_by("u1"));

        run_like(&ctx, &id, 1, OutputFormat::Json).unwrap();
        assert!(!session.store.select_review(&id).unwrap().unwrap().is_liked_by("u1"));
    }

    #[test]
    fn test_like_off_page_is_reported() {
        let (_dir, ctx, id) = setup_with_review();
        let err = run_like(&ctx, &id, 2, OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("not on page 2"));
    }

    #[test]
    fn test_like_requires_user() {
        let (_dir, mut ctx, id) = setup_with_review();
        ctx.user = None;
        let err = run_like(&ctx, &id, 1, OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("Not authenticated"));
    }

    #[test]
    fn test_comment_and_reply() {
        let (_dir, ctx, id) = setup_with_review();
        run_comment(&ctx, &id, "Same here", false, None, 1, OutputFormat::Json).unwrap();

        let session = open_session(&ctx).unwrap();
        let parent = session.store.select_review(&id).unwrap().unwrap().comments[0]
            .id
            .clone();
        run_comment(&ctx, &id, "Agreed", true, Some(&parent), 1, OutputFormat::Text).unwrap();

        let review = session.store.select_review(&id).unwrap().unwrap();
        assert_eq!(review.comments.len(), 2);
        let reply = review
            .comments
            .iter()
            .find(|c| c.parent_comment_id.is_some())
            .unwrap();
        assert!(reply.is_anonymous);
        assert!(reply.author_id.is_none());
    }

    #[test]
    fn test_empty_comment_rejected() {
        let (_dir, ctx, id) = setup_with_review();
        let err = run_comment(&ctx, &id, "   ", false, None, 1, OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("content"));
    }
}
