//! Implementation of `ratewise init` command.

use anyhow::Result;

use crate::cli::commands::helpers::{database_path, open_session, store_options, CommandContext};
use crate::output::{Formatter, OutputFormat};
use ratewise_core::companies::CompanyDirectory;
use ratewise_core::config::{resolve_config, write_default_config};
use ratewise_core::store::SqliteStore;

/// Run the init command.
///
/// Writes `.ratewise/config.toml` (kept if present) and creates the database
/// schema. With `seed`, also adds the sample companies as the acting user.
/// Safe to run repeatedly.
#[tracing::instrument(skip(ctx, format))]
pub fn run_init(ctx: &CommandContext, seed: bool, format: OutputFormat) -> Result<()> {
    if seed {
        ctx.require_user()?;
    }

    let config_path = write_default_config(&ctx.root)?;
    let config = resolve_config(&ctx.root)?;
    let db_path = database_path(ctx, &config);

    let store = SqliteStore::open(&db_path, store_options(&config))?;
    store.init_schema()?;
    drop(store);

    let seeded = if seed {
        let session = open_session(ctx)?;
        CompanyDirectory::new(&session.store).seed_defaults()?
    } else {
        0
    };

    let output = serde_json::json!({
        "config": config_path.display().to_string(),
        "database": db_path.display().to_string(),
        "enforce_foreign_keys": config.database.enforce_foreign_keys,
        "page_size": config.reviews.page_size,
        "seeded_companies": seeded,
    });
    Formatter::new(format).print(&output)
}
