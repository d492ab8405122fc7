//! Course project.
//!
//! A project declares the files students must submit (see [`file_requirement`])
//! and the programs built from those files (see [`testable`]).
//!
//! [`file_requirement`]: super::file_requirement
//! [`testable`]: super::testable

use sea_orm::entity::prelude::*;
use time::Duration;

/// Project model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    /// Unique project identifier.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Related class identifier.
    pub class_id: i64,

    /// Project name, unique within a class.
    pub name: String,

    /// Minutes for which verified results are withheld from students.
    pub delay_minutes: i32,

    /// Whether the project is visible to students.
    pub is_ready: bool,

    /// Shared makefile used to build every testable, if any.
    pub makefile_id: Option<i64>,
}

impl Model {
    /// Result disclosure delay as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::minutes(self.delay_minutes.into())
    }
}

/// Project model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,

    #[sea_orm(
        belongs_to = "super::file::Entity",
        from = "Column::MakefileId",
        to = "super::file::Column::Id"
    )]
    Makefile,

    #[sea_orm(has_many = "super::file_requirement::Entity")]
    FileRequirements,

    #[sea_orm(has_many = "super::testable::Entity")]
    Testables,

    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Makefile.def()
    }
}

impl Related<super::file_requirement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FileRequirements.def()
    }
}

impl Related<super::testable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Testables.def()
    }
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
