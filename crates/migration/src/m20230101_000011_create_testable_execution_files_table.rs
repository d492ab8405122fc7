use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestableExecutionFiles::Table)
                    .col(
                        ColumnDef::new(TestableExecutionFiles::TestableId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestableExecutionFiles::ExecutionFileId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(TestableExecutionFiles::TestableId)
                            .col(TestableExecutionFiles::ExecutionFileId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestableExecutionFiles::Table, TestableExecutionFiles::TestableId)
                            .to(crate::Testables::Table, crate::Testables::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestableExecutionFiles::Table, TestableExecutionFiles::ExecutionFileId)
                            .to(crate::ExecutionFiles::Table, crate::ExecutionFiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestableExecutionFiles::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum TestableExecutionFiles {
    Table,
    TestableId,
    ExecutionFileId,
}
