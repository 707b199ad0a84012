//! Configuration for the organization tag service

use crate::domain::SYSTEM_ACTOR;

use std::{
	fs,
	path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DATABASE_FILE_NAME: &str = "org_tags.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgTagsConfig {
	/// Directory holding the SQLite database when no explicit url is configured
	pub data_dir: PathBuf,

	/// Full database url, overrides the file in `data_dir`
	pub database_url: Option<String>,

	/// Actor recorded on writes that do not name one
	pub system_actor: String,

	pub database: DatabaseConfig,

	pub logging: LoggingConfig,

	#[serde(skip)]
	path: Option<PathBuf>,
}

/// Where [`OrgTagsConfig::load_or_create`] got its configuration from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
	/// Read from an existing file
	Loaded,
	/// No file existed, defaults were written to it
	Created,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
	pub max_connections: u32,
	pub min_connections: u32,
	pub connect_timeout_secs: u64,
	pub idle_timeout_secs: u64,
	/// Let sqlx log every statement; we normally rely on our own tracing instead
	pub sqlx_logging: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// Default filter directive, `RUST_LOG` takes precedence when set
	pub level: String,
	/// Write a daily rolling log file here in addition to stderr
	pub directory: Option<PathBuf>,
}

impl Default for OrgTagsConfig {
	fn default() -> Self {
		Self {
			data_dir: PathBuf::from("data"),
			database_url: None,
			system_actor: SYSTEM_ACTOR.to_string(),
			database: DatabaseConfig::default(),
			logging: LoggingConfig::default(),
			path: None,
		}
	}
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			max_connections: 10,
			min_connections: 1,
			connect_timeout_secs: 8,
			idle_timeout_secs: 8,
			sqlx_logging: false,
		}
	}
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			directory: None,
		}
	}
}

impl OrgTagsConfig {
	/// Load configuration from `path`, writing a default one there if it doesn't exist yet
	pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
		Self::load_or_create(path).map(|(config, _)| config)
	}

	/// Like [`Self::load_from`], also reporting whether the file had to be created.
	///
	/// Nothing is logged here: this normally runs before the subscriber is installed, so the
	/// caller logs the outcome once logging is up.
	pub fn load_or_create(path: impl AsRef<Path>) -> Result<(Self, ConfigSource)> {
		let path = path.as_ref();

		if path.exists() {
			let raw = fs::read_to_string(path)
				.with_context(|| format!("failed to read config file {}", path.display()))?;
			let mut config = toml::from_str::<Self>(&raw)
				.with_context(|| format!("failed to parse config file {}", path.display()))?;
			config.path = Some(path.to_path_buf());

			Ok((config, ConfigSource::Loaded))
		} else {
			let config = Self {
				path: Some(path.to_path_buf()),
				..Self::default()
			};
			config.save()?;

			Ok((config, ConfigSource::Created))
		}
	}

	/// Save configuration back to the file it was loaded from
	pub fn save(&self) -> Result<()> {
		let Some(path) = &self.path else {
			anyhow::bail!("config was not loaded from a file");
		};

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}

		fs::write(path, toml::to_string_pretty(self)?)
			.with_context(|| format!("failed to write config file {}", path.display()))?;
		Ok(())
	}

	pub fn database_path(&self) -> PathBuf {
		self.data_dir.join(DATABASE_FILE_NAME)
	}

	/// The url the store connects to
	pub fn database_url(&self) -> String {
		self.database_url.clone().unwrap_or_else(|| {
			format!("sqlite://{}?mode=rwc", self.database_path().display())
		})
	}

	/// The configured actor, falling back to [`SYSTEM_ACTOR`] when blank
	pub fn system_actor(&self) -> &str {
		let actor = self.system_actor.trim();
		if actor.is_empty() {
			SYSTEM_ACTOR
		} else {
			actor
		}
	}
}
