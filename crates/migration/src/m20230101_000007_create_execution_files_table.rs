use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExecutionFiles::Table)
                    .col(
                        ColumnDef::new(ExecutionFiles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExecutionFiles::ProjectId).big_integer().not_null())
                    .col(ColumnDef::new(ExecutionFiles::FileId).big_integer().not_null())
                    .col(ColumnDef::new(ExecutionFiles::Filename).string().not_null())
                    .index(
                        Index::create()
                            .name("execution_files_project_id_filename_idx")
                            .col(ExecutionFiles::ProjectId)
                            .col(ExecutionFiles::Filename)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExecutionFiles::Table, ExecutionFiles::ProjectId)
                            .to(crate::Projects::Table, crate::Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExecutionFiles::Table, ExecutionFiles::FileId)
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
            .drop_table(Table::drop().table(ExecutionFiles::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum ExecutionFiles {
    Table,
    Id,
    ProjectId,
    FileId,
    Filename,
}
