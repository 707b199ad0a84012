use crate::{
	domain::{NewTag, Tag, TagChanges},
	error::StoreError,
};

use super::{require_id, TagStore};

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// In-process [`TagStore`].
///
/// Every mutating operation holds the write lock for its whole check-then-write sequence,
/// which gives it the same atomicity a transaction gives [`super::SqlTagStore`].
#[derive(Debug, Default)]
pub struct MemoryTagStore {
	tags: RwLock<BTreeMap<String, Tag>>,
}

impl MemoryTagStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a store pre-populated with `tags`, as-is.
	///
	/// No validation happens here, which makes it possible to load snapshots that the directory
	/// service would never produce (dangling parents, cycles).
	pub fn with_tags(tags: impl IntoIterator<Item = Tag>) -> Self {
		Self {
			tags: RwLock::new(tags.into_iter().map(|tag| (tag.id.clone(), tag)).collect()),
		}
	}
}

#[async_trait]
impl TagStore for MemoryTagStore {
	async fn create(&self, tag: NewTag) -> Result<Tag, StoreError> {
		require_id(&tag.id)?;

		let mut tags = self.tags.write().await;
		if tags.contains_key(&tag.id) {
			return Err(StoreError::AlreadyExists(tag.id));
		}

		let now = Utc::now();
		let created = Tag {
			id: tag.id,
			name: tag.name,
			description: tag.description,
			parent_id: tag.parent_id,
			updated_by: tag.created_by.clone(),
			created_by: tag.created_by,
			created_at: now,
			updated_at: now,
		};
		tags.insert(created.id.clone(), created.clone());

		debug!(tag_id = %created.id, "Created organization tag in memory");

		Ok(created)
	}

	async fn find_by_id(&self, id: &str) -> Result<Tag, StoreError> {
		require_id(id)?;

		self.tags
			.read()
			.await
			.get(id)
			.cloned()
			.ok_or_else(|| StoreError::NotFound(id.to_owned()))
	}

	async fn find_all(&self) -> Result<Vec<Tag>, StoreError> {
		Ok(self.tags.read().await.values().cloned().collect())
	}

	async fn find_by_parent(&self, parent_id: Option<&str>) -> Result<Vec<Tag>, StoreError> {
		Ok(self
			.tags
			.read()
			.await
			.values()
			.filter(|tag| tag.parent_id.as_deref() == parent_id)
			.cloned()
			.collect())
	}

	async fn update(&self, changes: TagChanges) -> Result<Tag, StoreError> {
		require_id(&changes.id)?;

		let mut tags = self.tags.write().await;
		let Some(tag) = tags.get_mut(&changes.id) else {
			return Err(StoreError::NotFound(changes.id));
		};

		tag.name = changes.name;
		tag.description = changes.description;
		tag.parent_id = changes.parent_id;
		tag.updated_by = changes.updated_by;
		tag.updated_at = Utc::now();

		Ok(tag.clone())
	}

	async fn delete_protect(&self, id: &str) -> Result<(), StoreError> {
		require_id(id)?;

		let mut tags = self.tags.write().await;
		if !tags.contains_key(id) {
			return Err(StoreError::NotFound(id.to_owned()));
		}

		if tags
			.values()
			.any(|tag| tag.parent_id.as_deref() == Some(id))
		{
			warn!(tag_id = %id, "Refusing to delete organization tag with children");
			return Err(StoreError::HasChildren(id.to_owned()));
		}

		tags.remove(id);

		Ok(())
	}

	async fn delete_reparent(&self, id: &str) -> Result<(), StoreError> {
		require_id(id)?;

		let mut tags = self.tags.write().await;
		let Some(current) = tags.remove(id) else {
			return Err(StoreError::NotFound(id.to_owned()));
		};

		let now = Utc::now();
		for child in tags
			.values_mut()
			.filter(|tag| tag.parent_id.as_deref() == Some(id))
		{
			child.parent_id.clone_from(&current.parent_id);
			child.updated_at = now;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::contract;

	#[tokio::test]
	async fn create_rejects_duplicates() {
		contract::create_rejects_duplicates(&MemoryTagStore::new()).await;
	}

	#[tokio::test]
	async fn finds_in_id_order() {
		contract::finds_in_id_order(&MemoryTagStore::new()).await;
	}

	#[tokio::test]
	async fn update_keeps_creation_fields() {
		contract::update_keeps_creation_fields(&MemoryTagStore::new()).await;
	}

	#[tokio::test]
	async fn delete_protect_refuses_parents() {
		contract::delete_protect_refuses_parents(&MemoryTagStore::new()).await;
	}

	#[tokio::test]
	async fn delete_reparent_moves_children_up() {
		contract::delete_reparent_moves_children_up(&MemoryTagStore::new()).await;
	}
}
