//! Effective tag resolution
//!
//! Holding a tag grants the scope of every tag below it. [`EffectiveTagResolver`] expands a
//! principal's seed tags into that full set with a breadth-first walk down the hierarchy.

use crate::{
	domain::Tag,
	error::TagError,
	principal::Principal,
	store::TagStore,
};

use std::{
	collections::{HashMap, HashSet, VecDeque},
	sync::Arc,
};

use tracing::debug;

#[derive(Clone)]
pub struct EffectiveTagResolver {
	store: Arc<dyn TagStore>,
}

impl EffectiveTagResolver {
	pub fn new(store: Arc<dyn TagStore>) -> Self {
		Self { store }
	}

	/// Seeds plus all of their descendants, in breadth-first visit order.
	///
	/// Reads the whole tag table once per call; an empty seed list returns immediately without
	/// touching the store. Any seed or reachable id that doesn't resolve to a tag fails the call
	/// with [`TagError::NotFound`]. Each id is visited at most once, so parent cycles in the
	/// stored data can't make this loop forever.
	pub async fn resolve(&self, seeds: &[String]) -> Result<Vec<Tag>, TagError> {
		if seeds.is_empty() {
			return Ok(Vec::new());
		}

		let all_tags = self.store.find_all().await?;

		let mut children_by_parent = HashMap::<&str, Vec<&str>>::new();
		for tag in &all_tags {
			if let Some(parent) = tag.parent() {
				children_by_parent.entry(parent).or_default().push(&tag.id);
			}
		}
		let tag_by_id = all_tags
			.iter()
			.map(|tag| (tag.id.as_str(), tag))
			.collect::<HashMap<_, _>>();

		let mut visited = HashSet::with_capacity(all_tags.len());
		let mut queue = seeds.iter().map(String::as_str).collect::<VecDeque<_>>();
		let mut effective = Vec::with_capacity(seeds.len());

		while let Some(id) = queue.pop_front() {
			if !visited.insert(id) {
				continue;
			}

			let tag = tag_by_id
				.get(id)
				.ok_or_else(|| TagError::NotFound(id.to_string()))?;
			effective.push((*tag).clone());

			if let Some(children) = children_by_parent.get(id) {
				queue.extend(children.iter().filter(|child| !visited.contains(*child)));
			}
		}

		debug!(
			seeds = seeds.len(),
			effective = effective.len(),
			"Resolved effective organization tags"
		);

		Ok(effective)
	}

	pub async fn resolve_principal(&self, principal: &Principal) -> Result<Vec<Tag>, TagError> {
		self.resolve(principal.seed_tags()).await
	}
}
