//! Organization tag domain types
//!
//! A [`Tag`] is one node of the organization hierarchy. Its `parent_id` points at another
//! tag's id, or is `None` for a root. Tags are labels on protected resources: holding a tag
//! grants the scope of that tag and of every tag below it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actor recorded on writes when the caller does not identify itself.
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
	pub id: String,
	pub name: String,
	pub description: String,
	pub parent_id: Option<String>,
	pub created_by: String,
	pub updated_by: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Tag {
	pub fn is_root(&self) -> bool {
		self.parent().is_none()
	}

	/// The declared parent id, treating an empty string the same as no parent.
	pub fn parent(&self) -> Option<&str> {
		self.parent_id.as_deref().filter(|parent| !parent.is_empty())
	}
}

/// Everything the store needs to persist a brand new tag; timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
	pub id: String,
	pub name: String,
	pub description: String,
	pub parent_id: Option<String>,
	pub created_by: String,
}

/// The mutable subset of a tag. `id` selects the record and is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChanges {
	pub id: String,
	pub name: String,
	pub description: String,
	pub parent_id: Option<String>,
	pub updated_by: String,
}

/// A tag materialized into the forest returned by [`crate::TagDirectory::get_tree`].
///
/// Audit fields are left out, the tree is a view for navigation. Building, counting,
/// searching and dropping work at any depth; the derived `Clone`, `PartialEq`, `Debug` and
/// serde impls recurse once per level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagNode {
	pub tag_id: String,
	pub name: String,
	pub description: String,
	pub parent_tag: Option<String>,
	pub children: Vec<TagNode>,
}

impl TagNode {
	/// Number of nodes in this subtree, including `self`.
	pub fn node_count(&self) -> usize {
		let mut count = 0;
		let mut pending = vec![self];
		while let Some(node) = pending.pop() {
			count += 1;
			pending.extend(&node.children);
		}
		count
	}

	/// Depth-first search for a node by id inside this subtree.
	pub fn find(&self, tag_id: &str) -> Option<&Self> {
		let mut pending = vec![self];
		while let Some(node) = pending.pop() {
			if node.tag_id == tag_id {
				return Some(node);
			}
			pending.extend(node.children.iter().rev());
		}
		None
	}
}

// Flattens the teardown so dropping a deep hierarchy can't overflow the stack.
impl Drop for TagNode {
	fn drop(&mut self) {
		let mut pending = std::mem::take(&mut self.children);
		while let Some(mut node) = pending.pop() {
			pending.append(&mut node.children);
		}
	}
}

impl From<&Tag> for TagNode {
	fn from(tag: &Tag) -> Self {
		Self {
			tag_id: tag.id.clone(),
			name: tag.name.clone(),
			description: tag.description.clone(),
			parent_tag: tag.parent_id.clone(),
			children: Vec::new(),
		}
	}
}
