//! Student submission.
//!
//! A submission maps submitted file names to stored file contents
//! (see [`submission_file`]) and carries the serialized verification
//! report of its latest verification.
//!
//! # Verification generations
//!
//! Every verification increments [`Model::generation`]. Build and test case
//! results are tagged with the generation they were produced for, which
//! allows results computed for an outdated verification to be detected
//! and discarded.
//!
//! [`submission_file`]: super::submission_file

use sea_orm::entity::prelude::*;

/// Submission model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    /// Unique submission identifier.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Related project identifier.
    pub project_id: i64,

    /// Submitting user identifier.
    pub user_id: i64,

    /// Submission creation timestamp.
    pub created_at: TimeDateTime,

    /// Timestamp of the latest verification.
    ///
    /// [`None`] if the submission was never verified.
    pub verified_at: Option<TimeDateTime>,

    /// Current verification generation, zero if never verified.
    pub generation: i64,

    /// Serialized verification report of the current generation.
    pub verification_report: Option<Vec<u8>>,
}

/// Submission model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(has_many = "super::submission_file::Entity")]
    Files,

    #[sea_orm(has_many = "super::testable_result::Entity")]
    TestableResults,

    #[sea_orm(has_many = "super::test_case_result::Entity")]
    TestCaseResults,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::submission_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl Related<super::testable_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestableResults.def()
    }
}

impl Related<super::test_case_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestCaseResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
