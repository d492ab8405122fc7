//! Outcome of a single test case run.
//!
//! The [`Model::extra`] field stores the exit status when the status is
//! [`Status::Success`], and the signal number when the status is
//! [`Status::Signal`].
//!
//! When the test case output type is not a diff, [`Model::output_id`]
//! refers to the raw produced output instead.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Test case result model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "test_case_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub submission_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub test_case_id: i64,

    /// Verification generation this result was produced for.
    pub generation: i64,
    pub status: Status,
    pub extra: Option<i32>,

    /// Produced output (or its diff) file identifier.
    pub output_id: Option<i64>,
    pub created_at: TimeDateTime,
}

/// Test case run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(num_value = 0)]
    NonexistentExecutable,
    #[sea_orm(num_value = 1)]
    OutputLimitExceeded,
    #[sea_orm(num_value = 2)]
    Signal,
    #[sea_orm(num_value = 3)]
    Success,
    #[sea_orm(num_value = 4)]
    TimedOut,
}

/// Test case result model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submission::Entity",
        from = "Column::SubmissionId",
        to = "super::submission::Column::Id"
    )]
    Submission,

    #[sea_orm(
        belongs_to = "super::test_case::Entity",
        from = "Column::TestCaseId",
        to = "super::test_case::Column::Id"
    )]
    TestCase,

    #[sea_orm(
        belongs_to = "super::file::Entity",
        from = "Column::OutputId",
        to = "super::file::Column::Id"
    )]
    Output,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl Related<super::test_case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestCase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
