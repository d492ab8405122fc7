use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestCases::Table)
                    .col(
                        ColumnDef::new(TestCases::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TestCases::TestableId).big_integer().not_null())
                    .col(ColumnDef::new(TestCases::Name).string().not_null())
                    .col(ColumnDef::new(TestCases::Args).string().not_null())
                    .col(ColumnDef::new(TestCases::Points).integer().not_null().default(0))
                    .col(ColumnDef::new(TestCases::Source).small_integer().not_null())
                    .col(ColumnDef::new(TestCases::OutputType).small_integer().not_null())
                    .col(ColumnDef::new(TestCases::OutputFilename).string())
                    .col(ColumnDef::new(TestCases::ExpectedId).big_integer())
                    .col(ColumnDef::new(TestCases::StdinId).big_integer())
                    .index(
                        Index::create()
                            .name("test_cases_testable_id_name_idx")
                            .col(TestCases::TestableId)
                            .col(TestCases::Name)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestCases::Table, TestCases::TestableId)
                            .to(crate::Testables::Table, crate::Testables::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestCases::Table, TestCases::ExpectedId)
                            .to(crate::Files::Table, crate::Files::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestCases::Table, TestCases::StdinId)
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
            .drop_table(Table::drop().table(TestCases::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum TestCases {
    Table,
    Id,
    TestableId,
    Name,
    Args,
    Points,
    Source,
    OutputType,
    OutputFilename,
    ExpectedId,
    StdinId,
}
