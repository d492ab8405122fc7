use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Testables::Table)
                    .col(
                        ColumnDef::new(Testables::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Testables::ProjectId).big_integer().not_null())
                    .col(ColumnDef::new(Testables::Name).string().not_null())
                    .col(ColumnDef::new(Testables::Executable).string().not_null())
                    .col(ColumnDef::new(Testables::MakeTarget).string())
                    .index(
                        Index::create()
                            .name("testables_project_id_name_idx")
                            .col(Testables::ProjectId)
                            .col(Testables::Name)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Testables::Table, Testables::ProjectId)
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
            .drop_table(Table::drop().table(Testables::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum Testables {
    Table,
    Id,
    ProjectId,
    Name,
    Executable,
    MakeTarget,
}
