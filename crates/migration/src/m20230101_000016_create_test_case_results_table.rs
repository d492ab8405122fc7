use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestCaseResults::Table)
                    .col(ColumnDef::new(TestCaseResults::SubmissionId).big_integer().not_null())
                    .col(ColumnDef::new(TestCaseResults::TestCaseId).big_integer().not_null())
                    .col(ColumnDef::new(TestCaseResults::Generation).big_integer().not_null())
                    .col(ColumnDef::new(TestCaseResults::Status).small_integer().not_null())
                    .col(ColumnDef::new(TestCaseResults::Extra).integer())
                    .col(ColumnDef::new(TestCaseResults::OutputId).big_integer())
                    .col(
                        ColumnDef::new(TestCaseResults::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .primary_key(
                        Index::create()
                            .col(TestCaseResults::SubmissionId)
                            .col(TestCaseResults::TestCaseId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestCaseResults::Table, TestCaseResults::SubmissionId)
                            .to(crate::Submissions::Table, crate::Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestCaseResults::Table, TestCaseResults::TestCaseId)
                            .to(crate::TestCases::Table, crate::TestCases::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestCaseResults::Table, TestCaseResults::OutputId)
                            .to(crate::Files::Table, crate::Files::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestCaseResults::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum TestCaseResults {
    Table,
    SubmissionId,
    TestCaseId,
    Generation,
    Status,
    Extra,
    OutputId,
    CreatedAt,
}
