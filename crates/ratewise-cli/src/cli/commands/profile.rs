//! Implementation of `ratewise profile` subcommands.

use anyhow::Result;

use crate::cli::commands::helpers::{open_session, CommandContext};
use crate::cli::commands::reviews::ReviewRow;
use crate::cli::ProfileArgs;
use crate::output::{Formatter, OutputFormat};
use ratewise_core::model::ProfileUpdate;
use ratewise_core::profile::{validate_profile, ProfileService};
use ratewise_core::CoreError;

impl From<ProfileArgs> for ProfileUpdate {
    fn from(args: ProfileArgs) -> Self {
        Self {
            username: args.username,
            full_name: args.full_name,
            bio: args.bio,
            location: args.location,
            website: args.website,
            avatar_url: None,
        }
    }
}

/// Review activity for `user_id`, or the acting user.
#[tracing::instrument(skip(ctx, format))]
pub fn run_profile_stats(
    ctx: &CommandContext,
    user_id: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let target = user_id
        .or(ctx.user.as_deref())
        .ok_or(CoreError::NotAuthenticated)?;
    let session = open_session(ctx)?;
    let stats = ProfileService::new(&session.store).stats(target)?;

    let output = serde_json::json!({
        "id": target,
        "reviews": stats.reviews_count,
        "helpful_votes": stats.helpful_votes,
        "companies_reviewed": stats.companies_reviewed,
        "average_rating": format!("{:.1}", stats.average_rating),
    });
    Formatter::new(format).print(&output)
}

/// Reviews written by `user_id`, or by the acting user.
///
/// Your own list always includes anonymous reviews. Someone else's includes
/// them only with `show_anonymous`.
#[tracing::instrument(skip(ctx, format))]
pub fn run_profile_reviews(
    ctx: &CommandContext,
    user_id: Option<&str>,
    show_anonymous: bool,
    format: OutputFormat,
) -> Result<()> {
    let target = user_id
        .or(ctx.user.as_deref())
        .ok_or(CoreError::NotAuthenticated)?;
    let own = ctx.user.as_deref() == Some(target);
    let session = open_session(ctx)?;
    let reviews = ProfileService::new(&session.store).reviews(target, own || show_anonymous)?;

    let rows: Vec<ReviewRow> = reviews.iter().map(ReviewRow::from).collect();
    let advice = if own && !rows.is_empty() {
        vec!["ratewise profile delete-review <review_id>".to_string()]
    } else {
        Vec::new()
    };
    Formatter::new(format).print_list(&rows, "No reviews yet", "reviews", &advice)
}

/// Delete one of the acting user's reviews.
#[tracing::instrument(skip(ctx, format))]
pub fn run_profile_delete_review(
    ctx: &CommandContext,
    review_id: &str,
    format: OutputFormat,
) -> Result<()> {
    ctx.require_user()?;
    let session = open_session(ctx)?;
    ProfileService::new(&session.store).delete_own_review(review_id)?;

    let output = serde_json::json!({
        "review_id": review_id,
        "deleted": true,
    });
    Formatter::new(format).print(&output)
}

/// Check profile fields without touching the database.
#[tracing::instrument(skip_all)]
pub fn run_profile_validate(update: &ProfileUpdate, format: OutputFormat) -> Result<()> {
    let errors = validate_profile(update);
    let output = serde_json::json!({
        "valid": errors.is_empty(),
        "errors": errors,
    });
    Formatter::new(format).print(&output)
}

/// Validate and save the acting user's profile.
#[tracing::instrument(skip_all)]
pub fn run_profile_update(
    ctx: &CommandContext,
    update: &ProfileUpdate,
    format: OutputFormat,
) -> Result<()> {
    ctx.require_user()?;
    let session = open_session(ctx)?;
    let profile = ProfileService::new(&session.store).update(update)?;
    Formatter::new(format).print(&profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::init::run_init;
    use crate::cli::commands::reviews::{draft_from_args, run_reviews_create};
    use crate::cli::ReviewDetailsArgs;
    use ratewise_core::store::RemoteStore;
    use tempfile::{tempdir, TempDir};

    fn setup(user: Option<&str>) -> (TempDir, CommandContext) {
        let dir = tempdir().unwrap();
        let ctx = CommandContext::new(
            dir.path(),
            Some(dir.path().join("ratewise.db")),
            user.map(str::to_string),
        );
        run_init(&ctx, false, OutputFormat::Json).unwrap();
        (dir, ctx)
    }

    fn write_review(ctx: &CommandContext, company: &str, anonymous: bool) {
        let draft = draft_from_args(
            company.to_string(),
            "Fine".to_string(),
            "Decent place".to_string(),
            4,
            ReviewDetailsArgs::default(),
            anonymous,
            false,
        );
        run_reviews_create(ctx, draft, OutputFormat::Json).unwrap();
    }

    #[test]
    fn test_args_convert_to_update() {
        let update = ProfileUpdate::from(ProfileArgs {
            username: Some("dana".to_string()),
            website: Some("https://dana.dev".to_string()),
            ..ProfileArgs::default()
        });
        assert_eq!(update.username.as_deref(), Some("dana"));
        assert!(update.avatar_url.is_none());
    }

    #[test]
    fn test_stats_need_a_target() {
        let (_dir, ctx) = setup(None);
        assert!(run_profile_stats(&ctx, None, OutputFormat::Json).is_err());
        run_profile_stats(&ctx, Some("someone"), OutputFormat::Json).unwrap();
    }

    #[test]
    fn test_update_saves_valid_profile() {
        let (_dir, ctx) = setup(Some("u1"));
        let update = ProfileUpdate {
            full_name: Some("Dana K".to_string()),
            ..ProfileUpdate::default()
        };
        run_profile_update(&ctx, &update, OutputFormat::Json).unwrap();

        let session = open_session(&ctx).unwrap();
        let profile = ProfileService::new(&session.store).current().unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Dana K"));
    }

    #[test]
    fn test_update_rejects_invalid_profile() {
        let (_dir, ctx) = setup(Some("u1"));
        let update = ProfileUpdate {
            website: Some("not a url".to_string()),
            ..ProfileUpdate::default()
        };
        let err = run_profile_update(&ctx, &update, OutputFormat::Json).unwrap_err();
        assert!(err.to_string().starts_with("Invalid profile"));
        run_profile_validate(&update, OutputFormat::Json).unwrap();
    }

    #[test]
    fn test_reviews_lists_own_and_others() {
        let (dir, ctx) = setup(Some("u1"));
        write_review(&ctx, "Acme", false);
        write_review(&ctx, "Globex", true);

        run_profile_reviews(&ctx, None, false, OutputFormat::Text).unwrap();
        let other = CommandContext::new(dir.path(), ctx.db.clone(), Some("u2".to_string()));
        run_profile_reviews(&other, Some("u1"), false, OutputFormat::Json).unwrap();

        let anonymous = CommandContext::new(dir.path(), ctx.db.clone(), None);
        let err = run_profile_reviews(&anonymous, None, false, OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("Not authenticated"));
    }

    #[test]
    fn test_delete_review_only_own() {
        let (dir, ctx) = setup(Some("u1"));
        write_review(&ctx, "Acme", true);
        let session = open_session(&ctx).unwrap();
        let id = ProfileService::new(&session.store).reviews("u1", true).unwrap()[0]
            .id()
            .to_string();

        let other = CommandContext::new(dir.path(), ctx.db.clone(), Some("u2".to_string()));
        let err = run_profile_delete_review(&other, &id, OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains(&id));

        run_profile_delete_review(&ctx, &id, OutputFormat::Json).unwrap();
        assert!(session.store.select_review(&id).unwrap().is_none());
    }
}
