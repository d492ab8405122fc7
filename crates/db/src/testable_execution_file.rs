use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "testable_execution_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub testable_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub execution_file_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::testable::Entity",
        from = "Column::TestableId",
        to = "super::testable::Column::Id"
    )]
    Testable,

    #[sea_orm(
        belongs_to = "super::execution_file::Entity",
        from = "Column::ExecutionFileId",
        to = "super::execution_file::Column::Id"
    )]
    ExecutionFile,
}

impl ActiveModelBehavior for ActiveModel {}
