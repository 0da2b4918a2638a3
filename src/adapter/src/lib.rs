//! # CretoAI Policy Adapter
//!
//! SQL persistence for access-control policy rules.
//!
//! The enforcement engine keeps its matching tables in memory and calls the
//! adapter to load rules at startup and to persist every mutation. Rules are
//! stored in one table as a type tag plus up to six positional values:
//!
//! | column  | notes                          |
//! |---------|--------------------------------|
//! | id      | auto-increment, unused         |
//! | ptype   | rule type, e.g. `p` or `g`     |
//! | v0..v5  | positional values, nullable    |
//!
//! ## Features
//!
//! - **Full and filtered loads** with field-map, raw SQL or custom-loader filters
//! - **Filtered-save guard** so a partial load can never truncate the table
//! - **Transactional** save, bulk add/remove and updates
//! - **Streaming load** for large tables
//! - PostgreSQL and SQLite through the sqlx Any driver
//!
//! ## Example
//!
//! ```rust,no_run
//! use cretoai_policy_adapter::{Adapter, AdapterConfig, FieldFilter, SqlAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = SqlAdapter::connect(AdapterConfig::from_env()?).await?;
//!
//!     adapter
//!         .add_policy("p", "p", &["alice".into(), "data1".into(), "read".into()])
//!         .await?;
//!
//!     let filter = FieldFilter::new().with("v0", ["alice"]);
//!     let rules = adapter.load_filtered_policy(&filter.into()).await?;
//!     for rule in rules {
//!         println!("{}", rule);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod filter;
pub mod rule;
mod sql;

// Re-export commonly used types
pub use adapter::{fetch_rules, Adapter, SqlAdapter};
pub use config::{AdapterConfig, Backend};
pub use error::{AdapterError, Result};
pub use filter::{FieldFilter, Filter, RowLoader};
pub use rule::{PolicyRule, MAX_FIELDS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
