//! Recorded build attempt.
//!
//! The presence of a testable result means that the harness attempted to
//! build the testable for the related submission; its build log is kept as-is.

use sea_orm::entity::prelude::*;

/// Testable result model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "testable_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submission_id: i64,
    pub testable_id: i64,

    /// Verification generation this result was produced for.
    pub generation: i64,

    /// Raw build output.
    pub build_log: String,
    pub created_at: TimeDateTime,
}

/// Testable result model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submission::Entity",
        from = "Column::SubmissionId",
        to = "super::submission::Column::Id"
    )]
    Submission,

    #[sea_orm(
        belongs_to = "super::testable::Entity",
        from = "Column::TestableId",
        to = "super::testable::Column::Id"
    )]
    Testable,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl Related<super::testable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Testable.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
