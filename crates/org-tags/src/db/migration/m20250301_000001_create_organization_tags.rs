//! Creates the `organization_tags` table
//!
//! `parent_tag` carries no foreign key. Write-time parent rules live in the store and
//! directory, and readers tolerate a parent that has since disappeared.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(OrganizationTags::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(OrganizationTags::TagId)
							.string_len(255)
							.not_null()
							.primary_key(),
					)
					.col(
						ColumnDef::new(OrganizationTags::Name)
							.string_len(100)
							.not_null(),
					)
					.col(
						ColumnDef::new(OrganizationTags::Description)
							.string_len(255)
							.not_null()
							.default(""),
					)
					.col(ColumnDef::new(OrganizationTags::ParentTag).string_len(255))
					.col(
						ColumnDef::new(OrganizationTags::CreatedBy)
							.string_len(255)
							.not_null(),
					)
					.col(
						ColumnDef::new(OrganizationTags::UpdatedBy)
							.string_len(255)
							.not_null(),
					)
					.col(
						ColumnDef::new(OrganizationTags::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.col(
						ColumnDef::new(OrganizationTags::UpdatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_organization_tags_parent_tag")
					.table(OrganizationTags::Table)
					.col(OrganizationTags::ParentTag)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_index(
				Index::drop()
					.name("idx_organization_tags_parent_tag")
					.table(OrganizationTags::Table)
					.to_owned(),
			)
			.await?;

		manager
			.drop_table(
				Table::drop()
					.table(OrganizationTags::Table)
					.if_exists()
					.to_owned(),
			)
			.await?;

		Ok(())
	}
}

#[derive(DeriveIden)]
enum OrganizationTags {
	Table,
	TagId,
	Name,
	Description,
	ParentTag,
	CreatedBy,
	UpdatedBy,
	CreatedAt,
	UpdatedAt,
}
