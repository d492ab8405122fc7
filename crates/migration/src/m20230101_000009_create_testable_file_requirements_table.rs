use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestableFileRequirements::Table)
                    .col(
                        ColumnDef::new(TestableFileRequirements::TestableId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestableFileRequirements::FileRequirementId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(TestableFileRequirements::TestableId)
                            .col(TestableFileRequirements::FileRequirementId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestableFileRequirements::Table, TestableFileRequirements::TestableId)
                            .to(crate::Testables::Table, crate::Testables::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestableFileRequirements::Table, TestableFileRequirements::FileRequirementId)
                            .to(crate::FileRequirements::Table, crate::FileRequirements::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestableFileRequirements::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum TestableFileRequirements {
    Table,
    TestableId,
    FileRequirementId,
}
