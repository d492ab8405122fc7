//! A single program built and executed from a submission.
//!
//! Testables are associated with the file requirements they depend on,
//! and with the project-provided build and execution files they need.
//! The associations live in separate join tables, see
//! [`testable_file_requirement`], [`testable_build_file`] and
//! [`testable_execution_file`].
//!
//! [`testable_file_requirement`]: super::testable_file_requirement
//! [`testable_build_file`]: super::testable_build_file
//! [`testable_execution_file`]: super::testable_execution_file

use sea_orm::entity::prelude::*;

/// Testable model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "testables")]
pub struct Model {
    /// Unique testable identifier.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Related project identifier.
    pub project_id: i64,

    /// Testable name, unique within a project.
    pub name: String,

    /// Name of the executable produced by the build step.
    pub executable: String,

    /// Build target passed to `make`.
    ///
    /// [`None`] if the testable requires no build step.
    pub make_target: Option<String>,
}

/// Testable model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,

    #[sea_orm(has_many = "super::test_case::Entity")]
    TestCases,

    #[sea_orm(has_many = "super::testable_result::Entity")]
    TestableResults,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::test_case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestCases.def()
    }
}

impl Related<super::testable_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestableResults.def()
    }
}

impl Related<super::file_requirement::Entity> for Entity {
    fn to() -> RelationDef {
        super::testable_file_requirement::Relation::FileRequirement.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::testable_file_requirement::Relation::Testable.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
