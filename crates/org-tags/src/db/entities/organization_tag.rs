//! Organization tag entity
//!
//! SeaORM entity for the `organization_tags` table. The hierarchy lives in the nullable
//! `parent_tag` column, a plain reference to another row's `tag_id`.

use crate::domain::Tag;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organization_tags")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub tag_id: String,
	pub name: String,
	pub description: String,
	pub parent_tag: Option<String>,
	pub created_by: String,
	pub updated_by: String,
	pub created_at: DateTimeUtc,
	pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Tag {
	fn from(model: Model) -> Self {
		Self {
			id: model.tag_id,
			name: model.name,
			description: model.description,
			parent_id: model.parent_tag,
			created_by: model.created_by,
			updated_by: model.updated_by,
			created_at: model.created_at,
			updated_at: model.updated_at,
		}
	}
}
