use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SubmissionFiles::Table)
                    .col(ColumnDef::new(SubmissionFiles::SubmissionId).big_integer().not_null())
                    .col(ColumnDef::new(SubmissionFiles::Filename).string().not_null())
                    .col(ColumnDef::new(SubmissionFiles::FileId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(SubmissionFiles::SubmissionId)
                            .col(SubmissionFiles::Filename),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SubmissionFiles::Table, SubmissionFiles::SubmissionId)
                            .to(crate::Submissions::Table, crate::Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SubmissionFiles::Table, SubmissionFiles::FileId)
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
            .drop_table(Table::drop().table(SubmissionFiles::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum SubmissionFiles {
    Table,
    SubmissionId,
    Filename,
    FileId,
}
