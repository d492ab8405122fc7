use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FileRequirements::Table)
                    .col(
                        ColumnDef::new(FileRequirements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FileRequirements::ProjectId).big_integer().not_null())
                    .col(ColumnDef::new(FileRequirements::Filename).string().not_null())
                    .col(
                        ColumnDef::new(FileRequirements::MinSize)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(FileRequirements::MaxSize).big_integer())
                    .col(
                        ColumnDef::new(FileRequirements::MinLines)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(FileRequirements::MaxLines).big_integer())
                    .col(
                        ColumnDef::new(FileRequirements::Optional)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FileRequirements::WarningRegex).string())
                    .index(
                        Index::create()
                            .name("file_requirements_project_id_filename_idx")
                            .col(FileRequirements::ProjectId)
                            .col(FileRequirements::Filename)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(FileRequirements::Table, FileRequirements::ProjectId)
                            .to(crate::Projects::Table, crate::Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FileRequirements::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum FileRequirements {
    Table,
    Id,
    ProjectId,
    Filename,
    MinSize,
    MaxSize,
    MinLines,
    MaxLines,
    Optional,
    WarningRegex,
}
