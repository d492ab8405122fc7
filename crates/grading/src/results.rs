//! Ingestion of build and test case results reported by the harness.
//!
//! Every reported result carries the verification generation its build job
//! was created for. Results of any other generation than the current one
//! are stale, since the submission was re-verified after the job was
//! created, and are discarded without being recorded.

use db::{
    sea_query::OnConflict,
    submission, test_case, test_case_result, testable, testable_file_requirement,
    testable_result, ActiveValue, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::report::VerificationReport;

/// Outcome of a single test case run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TestCaseRun {
    pub test_case_id: i64,
    pub status: test_case_result::Status,

    /// Exit status or signal number, depending on the status.
    pub extra: Option<i32>,

    /// Produced output (or diff) file identifier.
    pub output_id: Option<i64>,
}

/// Outcome of building a testable and running its test cases.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TestableRun {
    pub submission_id: i64,
    pub testable_id: i64,
    pub generation: i64,
    pub build_log: String,

    /// Empty if the build failed.
    pub test_cases: Vec<TestCaseRun>,
}

/// Result ingestion outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ingested {
    Recorded,

    /// Result belongs to a superseded verification and was discarded.
    Stale,
}

/// Result ingestion errors.
#[derive(Debug, Display, Error, From)]
pub enum IngestError {
    DatabaseError(DbErr),
    ReportError(serde_json::Error),

    #[display(fmt = "submission {} not found", _0)]
    #[from(ignore)]
    SubmissionNotFound(#[error(not(source))] i64),

    #[display(fmt = "test case {} does not belong to testable {}", test_case_id, testable_id)]
    #[from(ignore)]
    ForeignTestCase { test_case_id: i64, testable_id: i64 },

    #[display(fmt = "testable {} is not buildable for submission {}", testable_id, submission_id)]
    #[from(ignore)]
    NotBuildable { testable_id: i64, submission_id: i64 },
}

/// Lock the submission row, returning it if `generation` is its current generation.
async fn current_submission(
    txn: &DatabaseTransaction,
    submission_id: i64,
    generation: i64,
) -> Result<Option<submission::Model>, IngestError> {
    let submission = submission::Entity::find_by_id(submission_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(IngestError::SubmissionNotFound(submission_id))?;

    // Generation zero means the submission was never verified, so no job may refer to it.
    let current = submission.generation != 0 && submission.generation == generation;

    Ok(current.then_some(submission))
}

/// Check that the stored verification report lets the testable be built.
async fn is_buildable(
    txn: &DatabaseTransaction,
    submission: &submission::Model,
    testable_id: i64,
) -> Result<bool, IngestError> {
    let Some(data) = submission.verification_report.as_deref() else {
        return Ok(false);
    };

    if VerificationReport::decode(data)?
        .missing_testable_ids()
        .contains(&testable_id)
    {
        return Ok(false);
    }

    let in_project = testable::Entity::find_by_id(testable_id)
        .filter(testable::Column::ProjectId.eq(submission.project_id))
        .exists(txn)
        .await?;

    // Testables without requirements are never buildable from submitted files.
    let has_requirements = testable_file_requirement::Entity::find()
        .filter(testable_file_requirement::Column::TestableId.eq(testable_id))
        .exists(txn)
        .await?;

    Ok(in_project && has_requirements)
}

async fn upsert_test_case(
    txn: &DatabaseTransaction,
    submission_id: i64,
    generation: i64,
    run: TestCaseRun,
) -> Result<(), DbErr> {
    test_case_result::Entity::insert(test_case_result::ActiveModel {
        submission_id: ActiveValue::Set(submission_id),
        test_case_id: ActiveValue::Set(run.test_case_id),
        generation: ActiveValue::Set(generation),
        status: ActiveValue::Set(run.status),
        extra: ActiveValue::Set(run.extra),
        output_id: ActiveValue::Set(run.output_id),
        created_at: ActiveValue::Set(db::now()),
    })
    .on_conflict(
        OnConflict::columns([
            test_case_result::Column::SubmissionId,
            test_case_result::Column::TestCaseId,
        ])
        .update_columns([
            test_case_result::Column::Generation,
            test_case_result::Column::Status,
            test_case_result::Column::Extra,
            test_case_result::Column::OutputId,
            test_case_result::Column::CreatedAt,
        ])
        .to_owned(),
    )
    .exec_without_returning(txn)
    .await?;

    Ok(())
}

/// Record the build and test case results of a testable.
///
/// The build result and every test case result are recorded atomically,
/// so readers never observe a testable with a build but only part of
/// its test case results. Test case results of an earlier run of the same
/// generation are replaced as a whole, so a rebuild that fails leaves no
/// test case results behind.
#[instrument(skip(db, run), fields(submission_id = run.submission_id, testable_id = run.testable_id), err)]
pub async fn record_run(db: &DatabaseConnection, run: TestableRun) -> Result<Ingested, IngestError> {
    let ingested = db
        .transaction::<_, _, IngestError>(|txn| {
            Box::pin(async move {
                let Some(submission) =
                    current_submission(txn, run.submission_id, run.generation).await?
                else {
                    return Ok(Ingested::Stale);
                };

                if !is_buildable(txn, &submission, run.testable_id).await? {
                    return Err(IngestError::NotBuildable {
                        testable_id: run.testable_id,
                        submission_id: run.submission_id,
                    });
                }

                let test_case_ids = test_case::Entity::find()
                    .select_only()
                    .column(test_case::Column::Id)
                    .filter(test_case::Column::TestableId.eq(run.testable_id))
                    .into_tuple::<i64>()
                    .all(txn)
                    .await?;

                if let Some(foreign) = run
                    .test_cases
                    .iter()
                    .find(|test_case| !test_case_ids.contains(&test_case.test_case_id))
                {
                    return Err(IngestError::ForeignTestCase {
                        test_case_id: foreign.test_case_id,
                        testable_id: run.testable_id,
                    });
                }

                testable_result::Entity::insert(testable_result::ActiveModel {
                    submission_id: ActiveValue::Set(run.submission_id),
                    testable_id: ActiveValue::Set(run.testable_id),
                    generation: ActiveValue::Set(run.generation),
                    build_log: ActiveValue::Set(run.build_log),
                    created_at: ActiveValue::Set(db::now()),
                    ..Default::default()
                })
                .on_conflict(
                    OnConflict::columns([
                        testable_result::Column::SubmissionId,
                        testable_result::Column::TestableId,
                    ])
                    .update_columns([
                        testable_result::Column::Generation,
                        testable_result::Column::BuildLog,
                        testable_result::Column::CreatedAt,
                    ])
                    .to_owned(),
                )
                .exec_without_returning(txn)
                .await?;

                test_case_result::Entity::delete_many()
                    .filter(test_case_result::Column::SubmissionId.eq(run.submission_id))
                    .filter(test_case_result::Column::TestCaseId.is_in(test_case_ids))
                    .exec(txn)
                    .await?;

                for test_case in run.test_cases {
                    upsert_test_case(txn, run.submission_id, run.generation, test_case).await?;
                }

                Ok(Ingested::Recorded)
            })
        })
        .await
        .into_raw_result()?;

    match ingested {
        Ingested::Recorded => info!("testable results recorded"),
        Ingested::Stale => debug!("discarding stale testable results"),
    }

    Ok(ingested)
}

/// Record a single test case result, replacing any previous result of the test case.
#[instrument(skip(db, run), fields(test_case_id = run.test_case_id), err)]
pub async fn record_test_case(
    db: &DatabaseConnection,
    submission_id: i64,
    generation: i64,
    run: TestCaseRun,
) -> Result<Ingested, IngestError> {
    let ingested = db
        .transaction::<_, _, IngestError>(|txn| {
            Box::pin(async move {
                if current_submission(txn, submission_id, generation)
                    .await?
                    .is_none()
                {
                    return Ok(Ingested::Stale);
                }

                upsert_test_case(txn, submission_id, generation, run).await?;

                Ok(Ingested::Recorded)
            })
        })
        .await
        .into_raw_result()?;

    if ingested == Ingested::Stale {
        debug!("discarding stale test case result");
    }

    Ok(ingested)
}
