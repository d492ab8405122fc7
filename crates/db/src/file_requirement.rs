//! File requirement declared by a project.
//!
//! Each requirement names a single file students must (or, when
//! [`Model::optional`] is set, may) submit, together with the bounds
//! the file contents must fall into.

use sea_orm::entity::prelude::*;

/// File requirement model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "file_requirements")]
pub struct Model {
    /// Unique requirement identifier.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Related project identifier.
    pub project_id: i64,

    /// Required file name, unique within a project.
    pub filename: String,

    /// Min file size, in bytes.
    pub min_size: i64,

    /// Max file size, in bytes.
    ///
    /// [`None`] if the size is unbounded.
    pub max_size: Option<i64>,

    /// Min line count.
    pub min_lines: i64,

    /// Max line count.
    ///
    /// [`None`] if the line count is unbounded.
    pub max_lines: Option<i64>,

    /// Whether the file may be left out of a submission.
    pub optional: bool,

    /// Regular expression whose matches are reported as warnings.
    pub warning_regex: Option<String>,
}

/// File requirement model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::testable::Entity> for Entity {
    fn to() -> RelationDef {
        super::testable_file_requirement::Relation::Testable.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::testable_file_requirement::Relation::FileRequirement.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
