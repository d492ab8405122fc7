use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestableResults::Table)
                    .col(
                        ColumnDef::new(TestableResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TestableResults::SubmissionId).big_integer().not_null())
                    .col(ColumnDef::new(TestableResults::TestableId).big_integer().not_null())
                    .col(ColumnDef::new(TestableResults::Generation).big_integer().not_null())
                    .col(ColumnDef::new(TestableResults::BuildLog).text().not_null())
                    .col(
                        ColumnDef::new(TestableResults::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .index(
                        Index::create()
                            .name("testable_results_submission_id_testable_id_idx")
                            .col(TestableResults::SubmissionId)
                            .col(TestableResults::TestableId)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestableResults::Table, TestableResults::SubmissionId)
                            .to(crate::Submissions::Table, crate::Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestableResults::Table, TestableResults::TestableId)
                            .to(crate::Testables::Table, crate::Testables::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestableResults::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum TestableResults {
    Table,
    Id,
    SubmissionId,
    TestableId,
    Generation,
    BuildLog,
    CreatedAt,
}
