//! ratewise-core: domain logic for the ratewise workplace-review tool.
//!
//! This crate owns the domain types, the remote-store abstraction and its
//! SQLite implementation, the review repository and action facade, company
//! lookup, client-side filtering, comment threading, profiles, and config.
//!
//! # Usage
//!
//! ```no_run
//! use ratewise_core::repository::ReviewRepository;
//! use ratewise_core::store::{SessionUser, SqliteStore, StoreOptions};
//!
//! let store = SqliteStore::open_in_memory(StoreOptions::default()).unwrap();
//! store.init_schema().unwrap();
//! store.sign_in(SessionUser::new("u1")).unwrap();
//!
//! let mut repo = ReviewRepository::new(&store);
//! repo.fetch_reviews(1, 15).unwrap();
//! println!("{} reviews", repo.total_count());
//! ```

pub mod actions;
pub mod companies;
pub mod config;
pub mod errors;
pub mod filter;
pub mod identity;
pub mod ids;
pub mod model;
pub mod profile;
pub mod repository;
pub mod store;
pub mod threads;

pub use errors::{CoreError, CoreResult};
