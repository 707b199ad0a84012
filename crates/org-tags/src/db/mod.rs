//! Database infrastructure using SeaORM

use crate::config::DatabaseConfig;

use std::{path::Path, time::Duration};

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

pub mod entities;
pub mod migration;

/// Owns the connection pool backing the organization tag store.
///
/// Built once at process start and handed to [`crate::SqlTagStore`]; nothing in the crate
/// reaches for a global connection.
#[derive(Debug, Clone)]
pub struct Database {
	conn: DatabaseConnection,
}

impl Database {
	/// Create (or reuse) an SQLite database file at the specified path
	pub async fn create(path: &Path, config: &DatabaseConfig) -> Result<Self, DbErr> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.map_err(|e| DbErr::Custom(format!("Failed to create directory: {e}")))?;
		}

		let db = Self::connect(&format!("sqlite://{}?mode=rwc", path.display()), config).await?;

		info!("Created database at {}", path.display());

		Ok(db)
	}

	/// Open an existing SQLite database file
	pub async fn open(path: &Path, config: &DatabaseConfig) -> Result<Self, DbErr> {
		if !path.exists() {
			return Err(DbErr::Custom(format!(
				"Database does not exist: {}",
				path.display()
			)));
		}

		let db = Self::connect(&format!("sqlite://{}", path.display()), config).await?;

		info!("Opened database at {}", path.display());

		Ok(db)
	}

	/// Connect to an arbitrary database url with the configured pool settings
	pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, DbErr> {
		let mut opt = ConnectOptions::new(url.to_owned());
		opt.max_connections(config.max_connections)
			.min_connections(config.min_connections)
			.connect_timeout(Duration::from_secs(config.connect_timeout_secs))
			.idle_timeout(Duration::from_secs(config.idle_timeout_secs))
			.sqlx_logging(config.sqlx_logging);

		let conn = SeaDatabase::connect(opt).await?;

		Ok(Self { conn })
	}

	/// Run migrations
	pub async fn migrate(&self) -> Result<(), DbErr> {
		migration::Migrator::up(&self.conn, None).await?;
		info!("Database migrations completed successfully");
		Ok(())
	}

	/// Get the database connection
	pub const fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}
}
