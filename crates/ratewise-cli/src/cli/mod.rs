//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ratewise_core::filter::{CompanySort, CompanyTab, ReviewFilter, ReviewSort};

use crate::output::OutputFormat;

pub mod commands;

/// Workplace reviews from the command line
#[derive(Parser, Debug)]
#[command(name = "ratewise")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Act as this user (default: $RATEWISE_USER; anonymous if unset)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Database file (default: database.path from .ratewise/config.toml or $RATEWISE_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .ratewise/ with a default config and an empty database
    Init {
        /// Add the sample companies (needs --user)
        #[arg(long)]
        seed: bool,
    },

    /// Browse and manage reviews
    #[command(subcommand)]
    Reviews(ReviewsCommands),

    /// Like a review, or remove your like
    Like {
        /// Review ID
        review_id: String,

        /// Page the review is on
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Comment on a review
    Comment {
        /// Review ID
        review_id: String,

        /// Comment text
        text: String,

        /// Post without your name
        #[arg(long)]
        anonymous: bool,

        /// Reply to this comment
        #[arg(long)]
        reply_to: Option<String>,

        /// Page the review is on
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Browse companies
    #[command(subcommand)]
    Companies(CompaniesCommands),

    /// Profile statistics and settings
    #[command(subcommand)]
    Profile(ProfileCommands),
}

// ============================================================================
// Reviews subcommands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ReviewsCommands {
    /// List one page of reviews, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Case-insensitive search over title, content, company, and position
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_enum, default_value_t)]
        filter: ReviewFilter,

        #[arg(long, value_enum, default_value_t)]
        sort: ReviewSort,
    },

    /// Show a review with its comment threads
    Show {
        /// Review ID
        review_id: String,
    },

    /// Write a review
    Create {
        /// Company name (created if new)
        #[arg(long)]
        company: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        content: String,

        /// Rating from 1 to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        #[command(flatten)]
        details: ReviewDetailsArgs,

        /// Post without your name
        #[arg(long)]
        anonymous: bool,

        /// You still work there
        #[arg(long)]
        current: bool,
    },

    /// Edit one of your reviews
    Update {
        /// Review ID
        review_id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,

        #[command(flatten)]
        details: ReviewDetailsArgs,

        /// Empty these fields (repeatable)
        #[arg(long, value_enum)]
        clear: Vec<ClearableField>,

        /// Whether you still work there
        #[arg(long)]
        current: Option<bool>,

        /// Page the review is on
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Delete one of your reviews
    Delete {
        /// Review ID
        review_id: String,

        /// Page the review is on
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

/// Optional review fields shared by create and update.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ReviewDetailsArgs {
    #[arg(long)]
    pub position: Option<String>,

    #[arg(long)]
    pub department: Option<String>,

    /// e.g. full-time, contract
    #[arg(long)]
    pub employment_type: Option<String>,

    /// e.g. remote, hybrid, office
    #[arg(long)]
    pub work_location: Option<String>,

    #[arg(long)]
    pub pros: Option<String>,

    #[arg(long)]
    pub cons: Option<String>,

    #[arg(long)]
    pub advice: Option<String>,
}

/// Optional review fields that `reviews update --clear` can empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClearableField {
    Position,
    Department,
    EmploymentType,
    WorkLocation,
    Pros,
    Cons,
    Advice,
}

// ============================================================================
// Companies subcommands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum CompaniesCommands {
    /// List companies with review stats
    List {
        /// Search over name, industry, location, and description
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        #[arg(long)]
        size: Option<String>,

        #[arg(long, value_enum, default_value_t)]
        tab: CompanyTab,

        #[arg(long, value_enum, default_value_t)]
        sort: CompanySort,
    },

    /// Show a company with its reviews
    Show {
        /// Company slug
        slug: String,
    },
}

// ============================================================================
// Profile subcommands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Review activity for a user (default: you)
    Stats {
        /// User ID
        user_id: Option<String>,
    },

    /// Reviews written by a user, newest first (default: you)
    Reviews {
        /// User ID
        user_id: Option<String>,

        /// Include anonymous reviews (always on for your own)
        #[arg(long)]
        show_anonymous: bool,
    },

    /// Delete one of your reviews, wherever it is listed
    DeleteReview {
        /// Review ID
        review_id: String,
    },

    /// Check profile fields without saving
    Validate {
        #[command(flatten)]
        fields: ProfileArgs,
    },

    /// Change your profile
    Update {
        #[command(flatten)]
        fields: ProfileArgs,
    },
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct ProfileArgs {
    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub full_name: Option<String>,

    #[arg(long)]
    pub bio: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub website: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_comment_reply() {
        let cli = Cli::try_parse_from([
            "ratewise", "--user", "u1", "comment", "r1", "Agreed", "--reply-to", "c9",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("u1"));
        match cli.command {
            Commands::Comment {
                review_id,
                text,
                anonymous,
                reply_to,
                page,
            } => {
                assert_eq!(review_id, "r1");
                assert_eq!(text, "Agreed");
                assert!(!anonymous);
                assert_eq!(reply_to.as_deref(), Some("c9"));
                assert_eq!(page, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::try_parse_from([
            "ratewise", "reviews", "list", "--filter", "high-rated", "--sort", "most-liked",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Reviews(ReviewsCommands::List { filter, sort, .. }) => {
                assert_eq!(filter, ReviewFilter::HighRated);
                assert_eq!(sort, ReviewSort::MostLiked);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_update_clear() {
        let cli = Cli::try_parse_from([
            "ratewise", "reviews", "update", "r1", "--clear", "cons", "--clear", "work-location",
        ])
        .unwrap();
        match cli.command {
            Commands::Reviews(ReviewsCommands::Update { clear, .. }) => {
                assert_eq!(clear, vec![ClearableField::Cons, ClearableField::WorkLocation]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_profile_reviews() {
        let cli = Cli::try_parse_from(["ratewise", "profile", "reviews", "u2", "--show-anonymous"])
            .unwrap();
        match cli.command {
            Commands::Profile(ProfileCommands::Reviews {
                user_id,
                show_anonymous,
            }) => {
                assert_eq!(user_id.as_deref(), Some("u2"));
                assert!(show_anonymous);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rating_range_enforced() {
        let result = Cli::try_parse_from([
            "ratewise", "reviews", "create", "--company", "Acme", "--title", "t", "--content",
            "c", "--rating", "6",
        ]);
        assert!(result.is_err());
    }
}
