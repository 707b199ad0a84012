//!
//! # Organization Tags
//!
//! Hierarchical organization tags for multi-tenant access control. Protected resources are
//! labeled with tags, and a principal holding a tag implicitly holds every tag below it.
//!
//! The crate is made of three layers:
//! - [`TagStore`]: transactional persistence, with [`SqlTagStore`] for production and
//!   [`MemoryTagStore`] for tests and tooling;
//! - [`TagDirectory`]: input validation, both delete strategies and tree materialization;
//! - [`EffectiveTagResolver`]: expands a principal's seed tags down the hierarchy.
//!
//! ## Basic example
//!
//! ```
//! use sd_org_tags::{EffectiveTagResolver, MemoryTagStore, TagDirectory};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryTagStore::new());
//!     let directory = TagDirectory::new(store.clone());
//!     let resolver = EffectiveTagResolver::new(store);
//!
//!     directory.create("root", "Root", "", None, "admin").await.unwrap();
//!     directory.create("dept", "Dept", "", Some("root"), "admin").await.unwrap();
//!
//!     let effective = resolver.resolve(&["root".to_string()]).await.unwrap();
//!     assert_eq!(effective.len(), 2);
//! }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod config;
pub mod db;
pub mod logging;

mod directory;
mod domain;
mod error;
mod principal;
mod resolver;
mod store;

pub use config::{ConfigSource, DatabaseConfig, LoggingConfig, OrgTagsConfig};
pub use db::Database;
pub use directory::{build_forest, TagDirectory};
pub use domain::{NewTag, Tag, TagChanges, TagNode, SYSTEM_ACTOR};
pub use error::{StoreError, TagError};
pub use logging::init_logging;
pub use principal::{parse_seed_tags, private_tag_id, Principal};
pub use resolver::EffectiveTagResolver;
pub use store::{MemoryTagStore, SqlTagStore, TagStore};
