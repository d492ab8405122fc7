//! A single test case of a testable.
//!
//! Test cases are executed by an external harness, which reports
//! their outcomes back as [`test_case_result`] records.
//!
//! [`test_case_result`]: super::test_case_result

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Test case model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "test_cases")]
pub struct Model {
    /// Unique test case identifier.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Related testable identifier.
    pub testable_id: i64,

    /// Test case name, unique within a testable.
    pub name: String,

    /// Command line arguments passed to the executable.
    pub args: String,

    /// Points awarded for passing the test case.
    pub points: i32,

    /// Stream or file that produces the output to be checked.
    pub source: Source,

    /// How the produced output is compared and presented.
    pub output_type: OutputType,

    /// Output file name, used when [`Model::source`] is [`Source::File`].
    pub output_filename: Option<String>,

    /// Expected output file identifier.
    pub expected_id: Option<i64>,

    /// Standard input file identifier.
    pub stdin_id: Option<i64>,
}

/// Source of a test case output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[sea_orm(num_value = 0)]
    File,
    #[sea_orm(num_value = 1)]
    Stderr,
    #[sea_orm(num_value = 2)]
    Stdout,
}

/// Test case output type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    #[sea_orm(num_value = 0)]
    Diff,
    #[sea_orm(num_value = 1)]
    Image,
    #[sea_orm(num_value = 2)]
    Text,
}

/// Test case model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::testable::Entity",
        from = "Column::TestableId",
        to = "super::testable::Column::Id"
    )]
    Testable,

    #[sea_orm(
        belongs_to = "super::file::Entity",
        from = "Column::ExpectedId",
        to = "super::file::Column::Id"
    )]
    Expected,

    #[sea_orm(
        belongs_to = "super::file::Entity",
        from = "Column::StdinId",
        to = "super::file::Column::Id"
    )]
    Stdin,

    #[sea_orm(has_many = "super::test_case_result::Entity")]
    TestCaseResults,
}

impl Related<super::testable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Testable.def()
    }
}

impl Related<super::test_case_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestCaseResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
