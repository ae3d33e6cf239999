//! Command implementations for the ratewise CLI.

pub mod companies;
pub mod helpers;
pub mod init;
pub mod profile;
pub mod reviews;
pub mod social;

pub use companies::{run_companies_list, run_companies_show};
pub use helpers::CommandContext;
pub use init::run_init;
pub use profile::{
    run_profile_delete_review, run_profile_reviews, run_profile_stats, run_profile_update,
    run_profile_validate,
};
pub use reviews::{
    draft_from_args, patch_from_args, run_reviews_create, run_reviews_delete, run_reviews_list,
    run_reviews_show, run_reviews_update,
};
pub use social::{run_comment, run_like};
