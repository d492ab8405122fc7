use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BuildFiles::Table)
                    .col(
                        ColumnDef::new(BuildFiles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BuildFiles::ProjectId).big_integer().not_null())
                    .col(ColumnDef::new(BuildFiles::FileId).big_integer().not_null())
                    .col(ColumnDef::new(BuildFiles::Filename).string().not_null())
                    .index(
                        Index::create()
                            .name("build_files_project_id_filename_idx")
                            .col(BuildFiles::ProjectId)
                            .col(BuildFiles::Filename)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BuildFiles::Table, BuildFiles::ProjectId)
                            .to(crate::Projects::Table, crate::Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BuildFiles::Table, BuildFiles::FileId)
                            .to(crate::Files::Table, crate::Files::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BuildFiles::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum BuildFiles {
    Table,
    Id,
    ProjectId,
    FileId,
    Filename,
}
