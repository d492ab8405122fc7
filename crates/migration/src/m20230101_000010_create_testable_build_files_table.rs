use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestableBuildFiles::Table)
                    .col(ColumnDef::new(TestableBuildFiles::TestableId).big_integer().not_null())
                    .col(ColumnDef::new(TestableBuildFiles::BuildFileId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(TestableBuildFiles::TestableId)
                            .col(TestableBuildFiles::BuildFileId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestableBuildFiles::Table, TestableBuildFiles::TestableId)
                            .to(crate::Testables::Table, crate::Testables::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestableBuildFiles::Table, TestableBuildFiles::BuildFileId)
                            .to(crate::BuildFiles::Table, crate::BuildFiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestableBuildFiles::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum TestableBuildFiles {
    Table,
    TestableId,
    BuildFileId,
}
