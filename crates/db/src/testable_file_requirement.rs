//! Many-to-many association between testables and file requirements.
//!
//! A single requirement may serve several testables of the same project.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "testable_file_requirements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub testable_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub file_requirement_id: i64,
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
        belongs_to = "super::file_requirement::Entity",
        from = "Column::FileRequirementId",
        to = "super::file_requirement::Column::Id"
    )]
    FileRequirement,
}

impl ActiveModelBehavior for ActiveModel {}
