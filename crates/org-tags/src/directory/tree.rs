use crate::domain::{Tag, TagNode};

use std::collections::HashMap;

use tracing::warn;

/// Materialize a flat tag list into a forest.
///
/// Roots come out in input order and children keep the relative order they had in `tags`.
/// A tag whose parent is missing from `tags` becomes a root. Tags that can't be reached from
/// any root, which only happens when the snapshot contains a parent cycle, are also promoted
/// to roots so the forest always holds exactly `tags.len()` nodes.
pub fn build_forest(tags: &[Tag]) -> Vec<TagNode> {
	let index = tags
		.iter()
		.enumerate()
		.map(|(idx, tag)| (tag.id.as_str(), idx))
		.collect::<HashMap<_, _>>();

	let mut children = vec![Vec::new(); tags.len()];
	let mut roots = Vec::new();

	for (idx, tag) in tags.iter().enumerate() {
		match tag.parent().and_then(|parent| index.get(parent)) {
			Some(&parent_idx) => children[parent_idx].push(idx),
			None => roots.push(idx),
		}
	}

	let mut placed = vec![false; tags.len()];
	let mut forest = Vec::with_capacity(roots.len());
	for idx in roots {
		materialize(idx, tags, &children, &mut placed, &mut forest);
	}

	for idx in 0..tags.len() {
		if !placed[idx] {
			warn!(tag_id = %tags[idx].id, "Organization tag is part of a parent cycle, promoting to root");
			materialize(idx, tags, &children, &mut placed, &mut forest);
		}
	}

	forest
}

/// Build the subtree under `start` and append it to `forest`.
///
/// Iterative, so the depth of the hierarchy is bounded by memory and not by the call stack.
fn materialize(
	start: usize,
	tags: &[Tag],
	children: &[Vec<usize>],
	placed: &mut [bool],
	forest: &mut Vec<TagNode>,
) {
	// Pre-order walk, recording how many children each node keeps.
	let mut order = Vec::new();
	let mut pending = vec![start];
	placed[start] = true;

	while let Some(idx) = pending.pop() {
		let before = pending.len();
		for &child in children[idx].iter().rev() {
			// Only already placed for the back edge that closes a cycle.
			if !placed[child] {
				placed[child] = true;
				pending.push(child);
			}
		}
		order.push((idx, pending.len() - before));
	}

	// Assemble bottom-up: by the time a node comes up, its children sit on top of `built`,
	// first child last.
	let mut built = Vec::<TagNode>::new();
	for (idx, kept) in order.into_iter().rev() {
		let mut node = TagNode::from(&tags[idx]);
		node.children = built.split_off(built.len() - kept);
		node.children.reverse();
		built.push(node);
	}

	forest.append(&mut built);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::domain::SYSTEM_ACTOR;

	use chrono::Utc;
	use pretty_assertions::assert_eq;

	fn tag(id: &str, parent: Option<&str>) -> Tag {
		let now = Utc::now();
		Tag {
			id: id.to_string(),
			name: id.to_uppercase(),
			description: String::new(),
			parent_id: parent.map(str::to_string),
			created_by: SYSTEM_ACTOR.to_string(),
			updated_by: SYSTEM_ACTOR.to_string(),
			created_at: now,
			updated_at: now,
		}
	}

	fn shape(node: &TagNode) -> String {
		if node.children.is_empty() {
			node.tag_id.clone()
		} else {
			let children = node.children.iter().map(shape).collect::<Vec<_>>();
			format!("{}({})", node.tag_id, children.join(","))
		}
	}

	fn shapes(forest: &[TagNode]) -> Vec<String> {
		forest.iter().map(shape).collect()
	}

	fn total(forest: &[TagNode]) -> usize {
		forest.iter().map(TagNode::node_count).sum()
	}

	#[test]
	fn nests_children_under_parents() {
		let tags = [
			tag("dept", Some("root")),
			tag("other", None),
			tag("root", None),
			tag("team", Some("dept")),
		];

		let forest = build_forest(&tags);

		assert_eq!(shapes(&forest), ["other", "root(dept(team))"]);
		assert_eq!(forest[1].children[0].parent_tag.as_deref(), Some("root"));
	}

	#[test]
	fn missing_parent_becomes_root() {
		let tags = [
			tag("a", Some("ghost")),
			tag("b", Some("a")),
			tag("c", Some("")),
		];

		let forest = build_forest(&tags);

		assert_eq!(shapes(&forest), ["a(b)", "c"]);
		assert_eq!(forest[0].parent_tag.as_deref(), Some("ghost"));
	}

	#[test]
	fn cycles_are_broken_without_losing_nodes() {
		let tags = [
			tag("a", Some("c")),
			tag("b", Some("a")),
			tag("c", Some("b")),
			tag("self", Some("self")),
			tag("z", None),
		];

		let forest = build_forest(&tags);

		assert_eq!(total(&forest), tags.len());
		assert_eq!(shapes(&forest), ["z", "a(b(c))", "self"]);
	}

	#[test]
	fn deep_chain_does_not_exhaust_the_stack() {
		const DEPTH: usize = 100_000;

		let tags = (0..DEPTH)
			.map(|i| {
				let parent = (i > 0).then(|| format!("n{:06}", i - 1));
				tag(&format!("n{i:06}"), parent.as_deref())
			})
			.collect::<Vec<_>>();

		let forest = build_forest(&tags);

		assert_eq!(forest.len(), 1);
		assert_eq!(forest[0].tag_id, "n000000");
		assert_eq!(total(&forest), DEPTH);

		let deepest = forest[0].find("n099999").unwrap();
		assert!(deepest.children.is_empty());
		assert_eq!(deepest.parent_tag.as_deref(), Some("n099998"));
	}

	#[test]
	fn siblings_keep_input_order() {
		let tags = [
			tag("p", None),
			tag("p1", Some("p")),
			tag("p1a", Some("p1")),
			tag("p2", Some("p")),
			tag("p3", Some("p")),
			tag("p3a", Some("p3")),
			tag("p3b", Some("p3")),
		];

		assert_eq!(shapes(&build_forest(&tags)), ["p(p1(p1a),p2,p3(p3a,p3b))"]);
	}

	#[test]
	fn empty_snapshot_is_empty_forest() {
		assert!(build_forest(&[]).is_empty());
	}
}
