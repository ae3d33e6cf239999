//! ratewise - workplace reviews from the command line

use anyhow::Result;
use clap::Parser;
use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod output;

use cli::commands::{
    draft_from_args, patch_from_args, run_comment, run_companies_list, run_companies_show,
    run_init, run_like, run_profile_delete_review, run_profile_reviews, run_profile_stats,
    run_profile_update, run_profile_validate, run_reviews_create, run_reviews_delete,
    run_reviews_list, run_reviews_show, run_reviews_update, CommandContext,
};
use cli::{Cli, Commands, CompaniesCommands, ProfileCommands, ReviewsCommands};
use output::OutputFormat;
use ratewise_core::filter::{CompanyQuery, ReviewQuery};
use ratewise_core::identity::resolve_user;
use ratewise_core::model::ProfileUpdate;
use ratewise_core::CoreError;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let format = OutputFormat::resolve(cli.json, cli.format);

    let result = run(cli, format);
    if let Err(err) = &result {
        if format == OutputFormat::Json {
            println!("{}", error_json(err));
        }
    }
    result
}

/// JSON body printed on stdout when a `--json` command fails.
fn error_json(err: &anyhow::Error) -> serde_json::Value {
    let kind = err.downcast_ref::<CoreError>().map_or("error", CoreError::kind);
    serde_json::json!({
        "error": {
            "kind": kind,
            "message": err.to_string(),
        }
    })
}

fn run(cli: Cli, format: OutputFormat) -> Result<()> {
    let root = env::current_dir()?;
    let ctx = CommandContext::new(&root, cli.db.clone(), resolve_user(cli.user.as_deref()));

    match cli.command {
        Commands::Init { seed } => run_init(&ctx, seed, format)?,

        Commands::Reviews(cmd) => match cmd {
            ReviewsCommands::List {
                page,
                search,
                filter,
                sort,
            } => {
                let query = ReviewQuery {
                    search,
                    filter,
                    sort,
                };
                run_reviews_list(&ctx, page, &query, format)?;
            }
            ReviewsCommands::Show { review_id } => run_reviews_show(&ctx, &review_id, format)?,
            ReviewsCommands::Create {
                company,
                title,
                content,
                rating,
                details,
                anonymous,
                current,
            } => {
                let draft =
                    draft_from_args(company, title, content, rating, details, anonymous, current);
                run_reviews_create(&ctx, draft, format)?;
            }
            ReviewsCommands::Update {
                review_id,
                title,
                content,
                rating,
                details,
                clear,
                current,
                page,
            } => {
                let patch = patch_from_args(title, content, rating, details, &clear, current);
                run_reviews_update(&ctx, &review_id, &patch, page, format)?;
            }
            ReviewsCommands::Delete { review_id, page } => {
                run_reviews_delete(&ctx, &review_id, page, format)?;
            }
        },

        Commands::Like { review_id, page } => run_like(&ctx, &review_id, page, format)?,

        Commands::Comment {
            review_id,
            text,
            anonymous,
            reply_to,
            page,
        } => run_comment(
            &ctx,
            &review_id,
            &text,
            anonymous,
            reply_to.as_deref(),
            page,
            format,
        )?,

        Commands::Companies(cmd) => match cmd {
            CompaniesCommands::List {
                search,
                industry,
                size,
                tab,
                sort,
            } => {
                let query = CompanyQuery {
                    search,
                    industry,
                    size,
                    tab,
                    sort,
                };
                run_companies_list(&ctx, &query, format)?;
            }
            CompaniesCommands::Show { slug } => run_companies_show(&ctx, &slug, format)?,
        },

        Commands::Profile(cmd) => match cmd {
            ProfileCommands::Stats { user_id } => {
                run_profile_stats(&ctx, user_id.as_deref(), format)?;
            }
            ProfileCommands::Reviews {
                user_id,
                show_anonymous,
            } => run_profile_reviews(&ctx, user_id.as_deref(), show_anonymous, format)?,
            ProfileCommands::DeleteReview { review_id } => {
                run_profile_delete_review(&ctx, &review_id, format)?;
            }
            ProfileCommands::Validate { fields } => {
                run_profile_validate(&ProfileUpdate::from(fields), format)?;
            }
            ProfileCommands::Update { fields } => {
                run_profile_update(&ctx, &ProfileUpdate::from(fields), format)?;
            }
        },
    }

    Ok(())
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("RATEWISE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "ratewise=debug,ratewise_core=debug,info"
        } else {
            "ratewise=info,ratewise_core=info,warn"
        })
    });

    let format = env::var("RATEWISE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}
