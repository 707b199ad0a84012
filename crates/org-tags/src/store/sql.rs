use crate::{
	db::{
		entities::organization_tag::{self, Column},
		Database,
	},
	domain::{NewTag, Tag, TagChanges},
	error::StoreError,
};

use super::{require_id, TagStore};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
	sea_query::Expr, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
	EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, SqlErr, TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// [`TagStore`] backed by the `organization_tags` table.
///
/// Writes are serialized through `write_lock`, shared by every clone of the store. A deferred
/// SQLite transaction that reads and then writes fails with `SQLITE_BUSY` when another writer
/// committed in between, so two writers must never overlap on the same database.
#[derive(Debug, Clone)]
pub struct SqlTagStore {
	conn: DatabaseConnection,
	write_lock: Arc<Mutex<()>>,
}

impl SqlTagStore {
	pub fn new(db: &Database) -> Self {
		Self {
			conn: db.conn().clone(),
			write_lock: Arc::default(),
		}
	}
}

async fn load(conn: &impl ConnectionTrait, id: &str) -> Result<Tag, StoreError> {
	organization_tag::Entity::find_by_id(id.to_owned())
		.one(conn)
		.await?
		.map(Into::into)
		.ok_or_else(|| StoreError::NotFound(id.to_owned()))
}

fn insert_error(id: &str, e: DbErr) -> StoreError {
	// Only reachable when another process writes the same database file.
	if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
		StoreError::AlreadyExists(id.to_owned())
	} else {
		StoreError::Database(e)
	}
}

#[async_trait]
impl TagStore for SqlTagStore {
	async fn create(&self, tag: NewTag) -> Result<Tag, StoreError> {
		require_id(&tag.id)?;

		let _write = self.write_lock.lock().await;
		let txn = self.conn.begin().await?;

		if organization_tag::Entity::find_by_id(tag.id.clone())
			.one(&txn)
			.await?
			.is_some()
		{
			return Err(StoreError::AlreadyExists(tag.id));
		}

		let now = Utc::now();
		organization_tag::Entity::insert(organization_tag::ActiveModel {
			tag_id: Set(tag.id.clone()),
			name: Set(tag.name),
			description: Set(tag.description),
			parent_tag: Set(tag.parent_id),
			created_by: Set(tag.created_by.clone()),
			updated_by: Set(tag.created_by),
			created_at: Set(now),
			updated_at: Set(now),
		})
		.exec_without_returning(&txn)
		.await
		.map_err(|e| insert_error(&tag.id, e))?;

		let created = load(&txn, &tag.id).await?;
		txn.commit().await?;

		info!(
			tag_id = %created.id,
			parent = ?created.parent_id,
			created_by = %created.created_by,
			"Created organization tag"
		);

		Ok(created)
	}

	async fn find_by_id(&self, id: &str) -> Result<Tag, StoreError> {
		require_id(id)?;
		load(&self.conn, id).await
	}

	async fn find_all(&self) -> Result<Vec<Tag>, StoreError> {
		let tags = organization_tag::Entity::find()
			.order_by_asc(Column::TagId)
			.all(&self.conn)
			.await?;

		debug!(count = tags.len(), "Loaded all organization tags");

		Ok(tags.into_iter().map(Into::into).collect())
	}

	async fn find_by_parent(&self, parent_id: Option<&str>) -> Result<Vec<Tag>, StoreError> {
		let query = organization_tag::Entity::find().order_by_asc(Column::TagId);
		let query = match parent_id {
			Some(parent_id) => query.filter(Column::ParentTag.eq(parent_id)),
			None => query.filter(Column::ParentTag.is_null()),
		};

		Ok(query
			.all(&self.conn)
			.await?
			.into_iter()
			.map(Into::into)
			.collect())
	}

	async fn update(&self, changes: TagChanges) -> Result<Tag, StoreError> {
		require_id(&changes.id)?;

		let _write = self.write_lock.lock().await;
		let txn = self.conn.begin().await?;

		let res = organization_tag::Entity::update_many()
			.col_expr(Column::Name, Expr::value(changes.name))
			.col_expr(Column::Description, Expr::value(changes.description))
			.col_expr(Column::ParentTag, Expr::value(changes.parent_id))
			.col_expr(Column::UpdatedBy, Expr::value(changes.updated_by))
			.col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
			.filter(Column::TagId.eq(changes.id.as_str()))
			.exec(&txn)
			.await?;

		if res.rows_affected == 0 {
			return Err(StoreError::NotFound(changes.id));
		}

		let updated = load(&txn, &changes.id).await?;
		txn.commit().await?;

		info!(
			tag_id = %updated.id,
			parent = ?updated.parent_id,
			updated_by = %updated.updated_by,
			"Updated organization tag"
		);

		Ok(updated)
	}

	async fn delete_protect(&self, id: &str) -> Result<(), StoreError> {
		require_id(id)?;

		let _write = self.write_lock.lock().await;
		// Dropping `txn` on any early return rolls it back.
		let txn = self.conn.begin().await?;

		load(&txn, id).await?;

		let children = organization_tag::Entity::find()
			.filter(Column::ParentTag.eq(id))
			.count(&txn)
			.await?;
		if children > 0 {
			warn!(tag_id = %id, children, "Refusing to delete organization tag with children");
			return Err(StoreError::HasChildren(id.to_owned()));
		}

		let res = organization_tag::Entity::delete_by_id(id.to_owned())
			.exec(&txn)
			.await?;
		if res.rows_affected == 0 {
			return Err(StoreError::NotFound(id.to_owned()));
		}

		txn.commit().await?;

		info!(tag_id = %id, "Deleted organization tag");

		Ok(())
	}

	async fn delete_reparent(&self, id: &str) -> Result<(), StoreError> {
		require_id(id)?;

		let _write = self.write_lock.lock().await;
		let txn = self.conn.begin().await?;

		let current = load(&txn, id).await?;

		let moved = organization_tag::Entity::update_many()
			.col_expr(Column::ParentTag, Expr::value(current.parent_id.clone()))
			.col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
			.filter(Column::ParentTag.eq(id))
			.exec(&txn)
			.await?
			.rows_affected;

		let res = organization_tag::Entity::delete_by_id(id.to_owned())
			.exec(&txn)
			.await?;
		if res.rows_affected == 0 {
			return Err(StoreError::NotFound(id.to_owned()));
		}

		txn.commit().await?;

		info!(
			tag_id = %id,
			new_parent = ?current.parent_id,
			moved,
			"Deleted organization tag and reparented its children"
		);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{config::DatabaseConfig, store::contract};

	use tempfile::{tempdir, TempDir};

	async fn store() -> (TempDir, SqlTagStore) {
		let dir = tempdir().unwrap();
		let db = Database::create(&dir.path().join("tags.db"), &DatabaseConfig::default())
			.await
			.unwrap();
		db.migrate().await.unwrap();
		(dir, SqlTagStore::new(&db))
	}

	#[tokio::test]
	async fn create_rejects_duplicates() {
		let (_dir, store) = store().await;
		contract::create_rejects_duplicates(&store).await;
	}

	#[tokio::test]
	async fn finds_in_id_order() {
		let (_dir, store) = store().await;
		contract::finds_in_id_order(&store).await;
	}

	#[tokio::test]
	async fn update_keeps_creation_fields() {
		let (_dir, store) = store().await;
		contract::update_keeps_creation_fields(&store).await;
	}

	#[tokio::test]
	async fn delete_protect_refuses_parents() {
		let (_dir, store) = store().await;
		contract::delete_protect_refuses_parents(&store).await;
	}

	#[tokio::test]
	async fn delete_reparent_moves_children_up() {
		let (_dir, store) = store().await;
		contract::delete_reparent_moves_children_up(&store).await;
	}

	#[tokio::test]
	async fn duplicate_insert_maps_to_already_exists() {
		let (_dir, store) = store().await;
		contract::seed(&store, &[("a", None)]).await;

		let err = organization_tag::Entity::insert(organization_tag::ActiveModel {
			tag_id: Set("a".to_string()),
			name: Set("A".to_string()),
			description: Set(String::new()),
			parent_tag: Set(None),
			created_by: Set("x".to_string()),
			updated_by: Set("x".to_string()),
			created_at: Set(Utc::now()),
			updated_at: Set(Utc::now()),
		})
		.exec_without_returning(&store.conn)
		.await
		.unwrap_err();

		assert!(matches!(
			insert_error("a", err),
			StoreError::AlreadyExists(id) if id == "a"
		));
	}
}
