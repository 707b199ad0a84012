//! Business rules on top of a [`TagStore`]
//!
//! The directory validates and normalizes input before anything reaches the store, and turns
//! store failures into [`TagError`]s. Validation failures never touch the store.

use crate::{
	domain::{NewTag, Tag, TagChanges, TagNode, SYSTEM_ACTOR},
	error::{StoreError, TagError},
	principal::{private_tag_id, Principal},
	store::TagStore,
};

use std::{collections::HashSet, sync::Arc};

use tracing::debug;

mod tree;

pub use tree::build_forest;

const PRIVATE_TAG_DESCRIPTION: &str = "Auto-created private organization tag";

#[derive(Clone)]
pub struct TagDirectory {
	store: Arc<dyn TagStore>,
	system_actor: String,
}

impl TagDirectory {
	pub fn new(store: Arc<dyn TagStore>) -> Self {
		Self {
			store,
			system_actor: SYSTEM_ACTOR.to_string(),
		}
	}

	/// Use `actor` instead of [`SYSTEM_ACTOR`] when a write names no one.
	#[must_use]
	pub fn with_system_actor(mut self, actor: impl Into<String>) -> Self {
		let actor = actor.into();
		if !actor.trim().is_empty() {
			self.system_actor = actor.trim().to_string();
		}
		self
	}

	pub async fn create(
		&self,
		id: &str,
		name: &str,
		description: &str,
		parent: Option<&str>,
		actor: &str,
	) -> Result<Tag, TagError> {
		let (id, name) = required_id_and_name(id, name)?;
		let parent = normalize_parent(parent);
		reject_self_parent(id, parent)?;

		match self.store.find_by_id(id).await {
			Ok(_) => return Err(TagError::AlreadyExists(id.to_string())),
			Err(StoreError::NotFound(_)) => {}
			Err(e) => return Err(e.into()),
		}

		if let Some(parent) = parent {
			self.check_parent(id, parent).await?;
		}

		Ok(self
			.store
			.create(NewTag {
				id: id.to_string(),
				name: name.to_string(),
				description: description.to_string(),
				parent_id: parent.map(str::to_string),
				created_by: self.actor_or_system(actor),
			})
			.await?)
	}

	pub async fn update(
		&self,
		id: &str,
		name: &str,
		description: &str,
		parent: Option<&str>,
		actor: &str,
	) -> Result<Tag, TagError> {
		let (id, name) = required_id_and_name(id, name)?;

		let existing = self.find_by_id(id).await?;

		let parent = normalize_parent(parent);
		reject_self_parent(id, parent)?;
		if let Some(parent) = parent {
			self.check_parent(id, parent).await?;
		}

		Ok(self
			.store
			.update(TagChanges {
				id: existing.id,
				name: name.to_string(),
				description: description.to_string(),
				parent_id: parent.map(str::to_string),
				updated_by: self.actor_or_system(actor),
			})
			.await?)
	}

	/// Protect-delete: refuses with [`TagError::HasChildren`] when the tag has children.
	pub async fn delete(&self, id: &str) -> Result<(), TagError> {
		let id = required_id(id)?;
		self.store.delete_protect(id).await?;
		Ok(())
	}

	/// Reparent-delete: children move to the deleted tag's parent (or become roots).
	pub async fn delete_and_reparent(&self, id: &str) -> Result<(), TagError> {
		let id = required_id(id)?;
		self.store.delete_reparent(id).await?;
		Ok(())
	}

	pub async fn list(&self) -> Result<Vec<Tag>, TagError> {
		Ok(self.store.find_all().await?)
	}

	/// The full hierarchy as a forest, see [`build_forest`].
	pub async fn get_tree(&self) -> Result<Vec<TagNode>, TagError> {
		let tags = self.store.find_all().await?;
		let forest = build_forest(&tags);

		debug!(tags = tags.len(), roots = forest.len(), "Built organization tag tree");

		Ok(forest)
	}

	pub async fn find_by_id(&self, id: &str) -> Result<Tag, TagError> {
		let id = required_id(id)?;
		Ok(self.store.find_by_id(id).await?)
	}

	/// Direct children of `parent`, or the roots when `parent` is blank or `None`.
	pub async fn children(&self, parent: Option<&str>) -> Result<Vec<Tag>, TagError> {
		Ok(self.store.find_by_parent(normalize_parent(parent)).await?)
	}

	/// Create the root tag every registered user owns privately.
	pub async fn create_private_tag(&self, user_id: u64, username: &str) -> Result<Tag, TagError> {
		self.create(
			&private_tag_id(user_id),
			&format!("{} Private", username.trim()),
			PRIVATE_TAG_DESCRIPTION,
			None,
			username,
		)
		.await
	}

	/// Validate that `principal` may use `tag_id` as its primary tag and return that tag.
	pub async fn select_primary_tag(
		&self,
		principal: &Principal,
		tag_id: &str,
	) -> Result<Tag, TagError> {
		let tag_id = tag_id.trim();
		if tag_id.is_empty() {
			return Err(TagError::NotFound(String::new()));
		}

		if !principal.holds(tag_id) {
			return Err(TagError::NotHeld(tag_id.to_string()));
		}

		Ok(self.store.find_by_id(tag_id).await?)
	}

	/// The parent must exist and must not be `id` itself or one of its descendants.
	async fn check_parent(&self, id: &str, parent: &str) -> Result<(), TagError> {
		let mut seen = HashSet::new();
		let mut current = Some(parent.to_string());

		while let Some(ancestor_id) = current {
			if ancestor_id == id {
				return Err(TagError::InvalidInput(format!(
					"tag '{id}' cannot be moved under its own descendant '{parent}'"
				)));
			}

			if !seen.insert(ancestor_id.clone()) {
				// Pre-existing cycle above us that doesn't involve `id`.
				break;
			}

			current = match self.store.find_by_id(&ancestor_id).await {
				Ok(ancestor) => ancestor.parent().map(str::to_string),
				Err(StoreError::NotFound(missing)) if missing == parent => {
					return Err(TagError::NotFound(missing));
				}
				// A dangling reference further up ends the chain.
				Err(StoreError::NotFound(_)) => None,
				Err(e) => return Err(e.into()),
			};
		}

		Ok(())
	}

	fn actor_or_system(&self, actor: &str) -> String {
		let actor = actor.trim();
		if actor.is_empty() {
			self.system_actor.clone()
		} else {
			actor.to_string()
		}
	}
}

fn required_id(id: &str) -> Result<&str, TagError> {
	let id = id.trim();
	if id.is_empty() {
		return Err(TagError::InvalidInput("tag id is required".to_string()));
	}
	Ok(id)
}

fn required_id_and_name<'a>(id: &'a str, name: &'a str) -> Result<(&'a str, &'a str), TagError> {
	let id = required_id(id)?;
	let name = name.trim();
	if name.is_empty() {
		return Err(TagError::InvalidInput("tag name is required".to_string()));
	}
	Ok((id, name))
}

/// Blank parents mean "root".
fn normalize_parent(parent: Option<&str>) -> Option<&str> {
	parent.map(str::trim).filter(|parent| !parent.is_empty())
}

fn reject_self_parent(id: &str, parent: Option<&str>) -> Result<(), TagError> {
	if parent == Some(id) {
		return Err(TagError::InvalidInput(format!(
			"tag '{id}' cannot be its own parent"
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryTagStore;

	use pretty_assertions::assert_eq;

	fn directory() -> TagDirectory {
		TagDirectory::new(Arc::new(MemoryTagStore::new()))
	}

	async fn seeded() -> TagDirectory {
		let directory = directory();
		directory.create("root", "Root", "", None, "admin").await.unwrap();
		directory
			.create("dept", "Dept", "", Some("root"), "admin")
			.await
			.unwrap();
		directory
			.create("team", "Team", "", Some("dept"), "admin")
			.await
			.unwrap();
		directory
	}

	#[tokio::test]
	async fn create_trims_and_defaults_actor() {
		let directory = directory();

		let root = directory
			.create("  root ", " Root  ", "top", Some("   "), "  ")
			.await
			.unwrap();

		assert_eq!(root.id, "root");
		assert_eq!(root.name, "Root");
		assert_eq!(root.description, "top");
		assert_eq!(root.parent_id, None);
		assert_eq!(root.created_by, SYSTEM_ACTOR);
		assert_eq!(root.updated_by, SYSTEM_ACTOR);

		let child = directory
			.create("child", "Child", "", Some(" root "), "alice")
			.await
			.unwrap();
		assert_eq!(child.parent_id.as_deref(), Some("root"));
		assert_eq!(child.created_by, "alice");
	}

	#[tokio::test]
	async fn configured_system_actor_is_used() {
		let directory = directory().with_system_actor("  provisioner ");

		let tag = directory.create("a", "A", "", None, "").await.unwrap();
		assert_eq!(tag.created_by, "provisioner");

		let tag = directory.update("a", "A", "", None, " ").await.unwrap();
		assert_eq!(tag.updated_by, "provisioner");
	}

	#[tokio::test]
	async fn create_validates_before_persisting() {
		let directory = directory();

		for (id, name) in [("", "Name"), ("  ", "Name"), ("id", ""), ("id", "   ")] {
			assert!(matches!(
				directory.create(id, name, "", None, "").await,
				Err(TagError::InvalidInput(_))
			));
		}

		assert!(matches!(
			directory.create("a", "A", "", Some(" a "), "").await,
			Err(TagError::InvalidInput(_))
		));
		assert!(matches!(
			directory.create("a", "A", "", Some("ghost"), "").await,
			Err(TagError::NotFound(id)) if id == "ghost"
		));

		assert!(directory.list().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn create_refuses_duplicate_ids() {
		let directory = seeded().await;
		let before = directory.find_by_id("dept").await.unwrap();

		assert!(matches!(
			directory.create("dept", "Other", "changed", None, "bob").await,
			Err(TagError::AlreadyExists(id)) if id == "dept"
		));
		assert_eq!(directory.find_by_id("dept").await.unwrap(), before);
	}

	#[tokio::test]
	async fn update_rewrites_mutable_fields_only() {
		let directory = seeded().await;
		let before = directory.find_by_id("team").await.unwrap();

		let updated = directory
			.update(" team ", " Squad ", "renamed", Some("root"), "bob")
			.await
			.unwrap();

		assert_eq!(updated.name, "Squad");
		assert_eq!(updated.description, "renamed");
		assert_eq!(updated.parent_id.as_deref(), Some("root"));
		assert_eq!(updated.updated_by, "bob");
		assert_eq!(updated.created_by, before.created_by);
		assert_eq!(updated.created_at, before.created_at);

		let promoted = directory
			.update("team", "Squad", "", Some(""), "bob")
			.await
			.unwrap();
		assert!(promoted.is_root());
	}

	#[tokio::test]
	async fn update_validates_target_and_parent() {
		let directory = seeded().await;

		assert!(matches!(
			directory.update("ghost", "Ghost", "", None, "").await,
			Err(TagError::NotFound(id)) if id == "ghost"
		));
		assert!(matches!(
			directory.update("dept", "", "", None, "").await,
			Err(TagError::InvalidInput(_))
		));
		assert!(matches!(
			directory.update("dept", "Dept", "", Some("dept"), "").await,
			Err(TagError::InvalidInput(_))
		));
		assert!(matches!(
			directory.update("dept", "Dept", "", Some("ghost"), "").await,
			Err(TagError::NotFound(id)) if id == "ghost"
		));
	}

	#[tokio::test]
	async fn update_refuses_to_close_a_cycle() {
		let directory = seeded().await;

		// root -> dept -> team, so root can't move below team.
		assert!(matches!(
			directory.update("root", "Root", "", Some("team"), "").await,
			Err(TagError::InvalidInput(_))
		));
		assert!(directory.find_by_id("root").await.unwrap().is_root());
	}

	#[tokio::test]
	async fn protect_delete_keeps_parents() {
		let directory = seeded().await;
		let snapshot = directory.list().await.unwrap();

		assert!(matches!(
			directory.delete("dept").await,
			Err(TagError::HasChildren(id)) if id == "dept"
		));
		assert_eq!(directory.list().await.unwrap(), snapshot);

		directory.delete(" team ").await.unwrap();
		directory.delete("dept").await.unwrap();
		assert!(matches!(
			directory.delete("dept").await,
			Err(TagError::NotFound(_))
		));
		assert!(matches!(
			directory.delete(" ").await,
			Err(TagError::InvalidInput(_))
		));
	}

	#[tokio::test]
	async fn reparent_delete_moves_children_to_grandparent() {
		let directory = seeded().await;

		directory.delete_and_reparent("dept").await.unwrap();

		assert!(matches!(
			directory.find_by_id("dept").await,
			Err(TagError::NotFound(_))
		));
		assert_eq!(
			directory.find_by_id("team").await.unwrap().parent_id.as_deref(),
			Some("root")
		);

		directory.delete_and_reparent("root").await.unwrap();
		assert!(directory.find_by_id("team").await.unwrap().is_root());

		assert!(matches!(
			directory.delete_and_reparent("root").await,
			Err(TagError::NotFound(_))
		));
		assert!(matches!(
			directory.delete_and_reparent("").await,
			Err(TagError::InvalidInput(_))
		));
	}

	#[tokio::test]
	async fn tree_nests_seeded_hierarchy() {
		let directory = seeded().await;
		directory.create("aaa", "Solo", "", None, "").await.unwrap();

		let forest = directory.get_tree().await.unwrap();

		assert_eq!(
			forest.iter().map(|node| node.tag_id.as_str()).collect::<Vec<_>>(),
			["aaa", "root"]
		);
		let root = &forest[1];
		assert_eq!(root.children.len(), 1);
		assert_eq!(root.children[0].tag_id, "dept");
		assert_eq!(root.children[0].children[0].tag_id, "team");
		assert_eq!(forest.iter().map(TagNode::node_count).sum::<usize>(), 4);
	}

	#[tokio::test]
	async fn children_lists_direct_descendants() {
		let directory = seeded().await;

		let roots = directory.children(Some("  ")).await.unwrap();
		assert_eq!(roots.len(), 1);
		assert_eq!(roots[0].id, "root");

		let children = directory.children(Some("dept")).await.unwrap();
		assert_eq!(children.len(), 1);
		assert_eq!(children[0].id, "team");
	}

	#[tokio::test]
	async fn private_tag_is_a_root_owned_by_the_user() {
		let directory = directory();

		let tag = directory.create_private_tag(7, "alice").await.unwrap();

		assert_eq!(tag.id, "user:7:private");
		assert_eq!(tag.name, "alice Private");
		assert_eq!(tag.description, PRIVATE_TAG_DESCRIPTION);
		assert!(tag.is_root());
		assert_eq!(tag.created_by, "alice");

		assert!(matches!(
			directory.create_private_tag(7, "alice").await,
			Err(TagError::AlreadyExists(_))
		));
	}

	#[tokio::test]
	async fn primary_tag_must_be_held_and_exist() {
		let directory = seeded().await;
		let principal = Principal::from_raw("dept,gone");

		assert_eq!(
			directory
				.select_primary_tag(&principal, " dept ")
				.await
				.unwrap()
				.id,
			"dept"
		);
		assert!(matches!(
			directory.select_primary_tag(&principal, "root").await,
			Err(TagError::NotHeld(id)) if id == "root"
		));
		assert!(matches!(
			directory.select_primary_tag(&principal, "gone").await,
			Err(TagError::NotFound(id)) if id == "gone"
		));
		assert!(matches!(
			directory.select_primary_tag(&principal, "  ").await,
			Err(TagError::NotFound(_))
		));
	}
}
