//! Durable storage for organization tags
//!
//! [`TagStore`] is the capability the directory service and the resolver are written against.
//! [`SqlTagStore`] is the production implementation and [`MemoryTagStore`] the in-process one
//! used by tests and tooling.
//!
//! Each operation is atomic on its own. The two delete strategies in particular run their
//! "look, then write" sequence inside a single transaction, so no caller can observe a tag that
//! was removed while still being referenced by a child.

use crate::{
	domain::{NewTag, Tag, TagChanges},
	error::StoreError,
};

use async_trait::async_trait;

mod memory;
mod sql;

pub use memory::MemoryTagStore;
pub use sql::SqlTagStore;

#[async_trait]
pub trait TagStore: Send + Sync {
	/// Persist a new tag. Fails with [`StoreError::AlreadyExists`] if the id is taken.
	async fn create(&self, tag: NewTag) -> Result<Tag, StoreError>;

	async fn find_by_id(&self, id: &str) -> Result<Tag, StoreError>;

	/// Every tag, ordered by id ascending.
	async fn find_all(&self) -> Result<Vec<Tag>, StoreError>;

	/// Direct children of `parent_id`, or the roots when `None`. Ordered by id ascending.
	async fn find_by_parent(&self, parent_id: Option<&str>) -> Result<Vec<Tag>, StoreError>;

	/// Overwrite name, description, parent and `updated_by`; creation fields are untouched.
	async fn update(&self, changes: TagChanges) -> Result<Tag, StoreError>;

	/// Delete a childless tag. Refuses with [`StoreError::HasChildren`] otherwise.
	async fn delete_protect(&self, id: &str) -> Result<(), StoreError>;

	/// Move the tag's direct children under its own parent, then delete it.
	async fn delete_reparent(&self, id: &str) -> Result<(), StoreError>;
}

pub(crate) fn require_id(id: &str) -> Result<(), StoreError> {
	if id.is_empty() {
		Err(StoreError::MissingId)
	} else {
		Ok(())
	}
}
