//! The seed tags a user record carries
//!
//! User records store the tags a principal directly holds as one comma-separated string. This
//! module owns parsing that string; expanding it down the hierarchy is the resolver's job.

use std::collections::HashSet;

/// Id of the private root tag created for each user at registration.
pub fn private_tag_id(user_id: u64) -> String {
	format!("user:{user_id}:private")
}

/// Split a comma-separated tag list, trimming entries, dropping empty ones and duplicates.
/// First-seen order is kept.
pub fn parse_seed_tags(raw: &str) -> Vec<String> {
	let mut seen = HashSet::new();

	raw.split(',')
		.map(str::trim)
		.filter(|id| !id.is_empty())
		.filter(|id| seen.insert(*id))
		.map(str::to_string)
		.collect()
}

/// Someone holding organization tags directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
	seed_tags: Vec<String>,
}

impl Principal {
	pub fn new(seed_tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
		let mut seen = HashSet::new();
		Self {
			seed_tags: seed_tags
				.into_iter()
				.map(Into::into)
				.filter(|id| seen.insert(id.clone()))
				.collect(),
		}
	}

	/// Build from the comma-separated form stored on user records.
	pub fn from_raw(raw: &str) -> Self {
		Self {
			seed_tags: parse_seed_tags(raw),
		}
	}

	pub fn seed_tags(&self) -> &[String] {
		&self.seed_tags
	}

	pub fn holds(&self, tag_id: &str) -> bool {
		self.seed_tags.iter().any(|id| id == tag_id)
	}

	/// Back to the stored comma-separated form.
	pub fn to_raw(&self) -> String {
		self.seed_tags.join(",")
	}
}
