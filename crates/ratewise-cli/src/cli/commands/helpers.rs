//! Shared helpers for CLI commands.
//!
//! Centralizes config resolution, opening the store, and signing in, so every
//! command sees the same database and session.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use ratewise_core::config::{resolve_config, Config};
use ratewise_core::store::{SessionUser, SqliteStore, StoreOptions};
use ratewise_core::CoreError;

/// Where a command runs and who it runs as.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Project root (where `.ratewise/` lives).
    pub root: PathBuf,
    /// `--db` override.
    pub db: Option<PathBuf>,
    /// Resolved acting user; `None` is anonymous.
    pub user: Option<String>,
}

impl CommandContext {
    pub fn new(root: &Path, db: Option<PathBuf>, user: Option<String>) -> Self {
        Self {
            root: root.to_path_buf(),
            db,
            user,
        }
    }

    /// The acting user, or a not-authenticated error.
    pub fn require_user(&self) -> Result<&str> {
        match self.user.as_deref() {
            Some(user) => Ok(user),
            None => Err(CoreError::NotAuthenticated.into()),
        }
    }
}

/// An open store with the acting user signed in.
pub struct Session {
    pub store: SqliteStore,
    pub config: Config,
}

/// Database file for this context: `--db`, then config.
pub fn database_path(ctx: &CommandContext, config: &Config) -> PathBuf {
    ctx.db
        .clone()
        .unwrap_or_else(|| config.database_path(&ctx.root))
}

pub const fn store_options(config: &Config) -> StoreOptions {
    StoreOptions {
        enforce_foreign_keys: config.database.enforce_foreign_keys,
    }
}

/// Open the configured database and sign in as the context's user.
///
/// Fails if the database does not exist yet.
pub fn open_session(ctx: &CommandContext) -> Result<Session> {
    let config = resolve_config(&ctx.root)?;
    let path = database_path(ctx, &config);
    if !path.exists() {
        bail!(
            "No database at {}.\n  To fix: ratewise init (or pass --db <path>)",
            path.display()
        );
    }

    let store = SqliteStore::open(&path, store_options(&config))?;
    store.init_schema()?;

    if let Some(user) = &ctx.user {
        store.sign_in(SessionUser::new(user.clone()))?;
        debug!(user = %user, db = %path.display(), "signed in");
    }

    Ok(Session { store, config })
}

/// Create a "review not on page" error.
pub fn not_on_page_error(review_id: &str, page: usize) -> anyhow::Error {
    anyhow::anyhow!(
        "Review {review_id} is not on page {page}.\n  \
         To fix: ratewise reviews list --page <n>, then pass --page <n>"
    )
}
