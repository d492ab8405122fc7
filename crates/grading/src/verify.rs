//! Submission verification.
//!
//! Verification matches submitted files against the requirements of every
//! testable, selects the testables that can be built and persists the
//! resulting [`VerificationReport`]. Persisting the report, bumping the
//! verification generation and clearing every previously recorded result
//! happen in a single transaction, which makes verification safe to
//! repeat at any time.

use std::collections::{BTreeMap, HashMap};

use common::content::{ContentError, ContentStore};
use db::{
    file, file_requirement, submission, test_case_result, testable, testable_result, ColumnTrait,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, TransactionErrorExt,
    TransactionTrait,
};
use derive_more::{Display, Error, From};
use tracing::{info, instrument};

use crate::{matcher, project, report::VerificationReport, resolver, submissions};

/// Outcome of a submission verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verification {
    /// Verification generation that results of build jobs must refer to.
    pub generation: i64,

    pub report: VerificationReport,

    /// Testables that can be built, ordered by name.
    pub buildable: Vec<testable::Model>,
}

/// Verification errors.
///
/// Every error leaves the previously persisted verification intact.
#[derive(Debug, Display, Error, From)]
pub enum VerifyError {
    DatabaseError(DbErr),
    ContentError(ContentError),
    ReportError(serde_json::Error),

    #[display(fmt = "submission {} not found", _0)]
    #[from(ignore)]
    SubmissionNotFound(#[error(not(source))] i64),

    #[display(fmt = "project {} not found", _0)]
    #[from(ignore)]
    ProjectNotFound(#[error(not(source))] i64),
}

/// Fetch contents of every submitted file that is going to be scanned for warnings.
async fn fetch_contents(
    store: &dyn ContentStore,
    requirements: &[file_requirement::Model],
    files: &BTreeMap<String, file::Model>,
) -> Result<HashMap<String, Vec<u8>>, ContentError> {
    let mut contents = HashMap::new();

    for requirement in requirements {
        let Some(file) = files.get(&requirement.filename) else {
            continue;
        };

        if matcher::needs_content(requirement, file) && !contents.contains_key(&file.hash) {
            contents.insert(file.hash.clone(), store.get(&file.hash).await?);
        }
    }

    Ok(contents)
}

/// Verify a submission, returning the testables that can be built.
#[instrument(skip(db, store), err)]
pub async fn verify(
    db: &DatabaseConnection,
    store: &dyn ContentStore,
    submission_id: i64,
) -> Result<Verification, VerifyError> {
    let submission = submission::Entity::find_by_id(submission_id)
        .one(db)
        .await?
        .ok_or(VerifyError::SubmissionNotFound(submission_id))?;

    let layout = project::load(db, submission.project_id)
        .await?
        .ok_or(VerifyError::ProjectNotFound(submission.project_id))?;

    let files = submissions::file_mapping(db, submission_id).await?;
    let contents = fetch_contents(store, &layout.requirements, &files).await?;

    let outcome = matcher::match_files(&layout.requirements, &files, &contents);
    let resolution = resolver::resolve(&layout.testables, &outcome.satisfied);
    let buildable = resolution
        .buildable
        .iter()
        .map(|testable| (*testable).clone())
        .collect::<Vec<_>>();

    let report = VerificationReport::assemble(outcome, &resolution);
    let encoded = report.encode()?;

    let generation = db
        .transaction::<_, _, VerifyError>(|txn| {
            Box::pin(async move {
                let current = submission::Entity::find_by_id(submission_id)
                    .select_only()
                    .column(submission::Column::Generation)
                    .lock_exclusive()
                    .into_tuple::<i64>()
                    .one(txn)
                    .await?
                    .ok_or(VerifyError::SubmissionNotFound(submission_id))?;

                test_case_result::Entity::delete_many()
                    .filter(test_case_result::Column::SubmissionId.eq(submission_id))
                    .exec(txn)
                    .await?;

                testable_result::Entity::delete_many()
                    .filter(testable_result::Column::SubmissionId.eq(submission_id))
                    .exec(txn)
                    .await?;

                let generation = current + 1;

                submission::Entity::update_many()
                    .col_expr(submission::Column::VerificationReport, encoded.into())
                    .col_expr(submission::Column::VerifiedAt, db::now().into())
                    .col_expr(submission::Column::Generation, generation.into())
                    .filter(submission::Column::Id.eq(submission_id))
                    .exec(txn)
                    .await?;

                Ok(generation)
            })
        })
        .await
        .into_raw_result()?;

    info!(
        generation,
        buildable = buildable.len(),
        missing = report.missing_testable_ids().len(),
        "submission verified"
    );

    Ok(Verification {
        generation,
        report,
        buildable,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use common::content::MemoryContentStore;
    use db::{
        submission, test_case_result, testable_result, ActiveValue, DatabaseConnection,
        EntityTrait,
    };

    use super::{verify, VerifyError};
    use crate::{
        results::{self, Ingested, TestCaseRun, TestableRun},
        status::{self, TestableState},
        submissions,
        testing::{create_database, Fixture},
    };

    struct Setup {
        db: DatabaseConnection,
        store: MemoryContentStore,
        submission: submission::Model,
        hello: db::testable::Model,
        hello_case: db::test_case::Model,
        util: db::testable::Model,
    }

    /// "hello" needs main.c (warns on printf), "util" needs main.c and util.c.
    async fn setup() -> Setup {
        let db = create_database().await;
        let store = MemoryContentStore::new();
        let fixture = Fixture::new(&db).await;

        let main = fixture
            .requirement(&db, "main.c", |model| {
                model.min_lines = ActiveValue::Set(1);
                model.warning_regex = ActiveValue::Set(Some(String::from("printf")));
            })
            .await;
        let util_c = fixture.requirement(&db, "util.c", |_| {}).await;
        let readme = fixture
            .requirement(&db, "README", |model| model.optional = ActiveValue::Set(true))
            .await;

        let hello = fixture.testable(&db, "hello", &[&main, &readme]).await;
        let util = fixture.testable(&db, "util", &[&main, &util_c]).await;
        let hello_case = fixture.test_case(&db, &hello, "greets", 5).await;
        fixture.test_case(&db, &util, "links", 5).await;

        let submission = submissions::create(
            &db,
            &store,
            fixture.project.id,
            fixture.user.id,
            vec![
                (
                    String::from("main.c"),
                    b"int main() {\n  printf(\"hi\");\n}\n".to_vec(),
                ),
                (String::from("notes.txt"), b"todo".to_vec()),
            ],
        )
        .await
        .expect("unable to create submission");

        Setup {
            db,
            store,
            submission,
            hello,
            hello_case,
            util,
        }
    }

    #[tokio::test]
    async fn verify_submission() {
        let setup = setup().await;

        let verification = verify(&setup.db, &setup.store, setup.submission.id)
            .await
            .expect("unable to verify");

        assert_eq!(verification.generation, 1);
        assert_eq!(verification.buildable, vec![setup.hello.clone()]);

        let report = &verification.report;
        assert_eq!(report.errors()["util.c"], vec!["file missing"]);
        assert!(!report.errors().contains_key("README"));
        assert_eq!(report.warnings()["main.c"][0].line, 2);
        assert!(report.extra_filenames().contains("notes.txt"));
        assert_eq!(report.missing_filenames(setup.util.id).map(|f| f.len()), Some(1));

        let stored = submission::Entity::find_by_id(setup.submission.id)
            .one(&setup.db)
            .await
            .unwrap()
            .expect("submission");
        assert_eq!(stored.generation, 1);
        assert!(stored.verified_at.is_some());
        assert_eq!(stored.verification_report, Some(report.encode().unwrap()));

        let statuses = status::status(&setup.db, setup.submission.id)
            .await
            .expect("unable to compute status");
        assert_eq!(statuses[0].state, TestableState::Pending);
        assert!(matches!(statuses[1].state, TestableState::MissingFiles { .. }));
    }

    #[tokio::test]
    async fn reverification_clears_results() {
        let setup = setup().await;
        let first = verify(&setup.db, &setup.store, setup.submission.id)
            .await
            .expect("unable to verify");

        let run = TestableRun {
            submission_id: setup.submission.id,
            testable_id: setup.hello.id,
            generation: first.generation,
            build_log: String::from("cc -o hello main.c"),
            test_cases: vec![TestCaseRun {
                test_case_id: setup.hello_case.id,
                status: test_case_result::Status::Success,
                extra: Some(0),
                output_id: None,
            }],
        };
        assert_eq!(
            results::record_run(&setup.db, run.clone())
                .await
                .expect("unable to record"),
            Ingested::Recorded
        );

        let statuses = status::status(&setup.db, setup.submission.id).await.unwrap();
        assert_eq!(statuses[0].state, TestableState::SucceededWithIssues);

        let second = verify(&setup.db, &setup.store, setup.submission.id)
            .await
            .expect("unable to verify");

        assert_eq!(second.generation, 2);
        assert_eq!(
            second.report.encode().unwrap(),
            first.report.encode().unwrap()
        );
        assert!(testable_result::Entity::find()
            .all(&setup.db)
            .await
            .unwrap()
            .is_empty());
        assert!(test_case_result::Entity::find()
            .all(&setup.db)
            .await
            .unwrap()
            .is_empty());

        // Results of the build job created by the first verification are stale now.
        assert_eq!(
            results::record_run(&setup.db, run).await.unwrap(),
            Ingested::Stale
        );

        let statuses = status::status(&setup.db, setup.submission.id).await.unwrap();
        assert_eq!(statuses[0].state, TestableState::Pending);
    }

    #[tokio::test]
    async fn build_error() {
        let setup = setup().await;
        let verification = verify(&setup.db, &setup.store, setup.submission.id)
            .await
            .unwrap();

        results::record_run(
            &setup.db,
            TestableRun {
                submission_id: setup.submission.id,
                testable_id: setup.hello.id,
                generation: verification.generation,
                build_log: String::from("main.c:2: error"),
                test_cases: Vec::new(),
            },
        )
        .await
        .unwrap();

        let statuses = status::status(&setup.db, setup.submission.id).await.unwrap();
        assert_eq!(statuses[0].state, TestableState::BuildError);
        assert!(statuses[0].has_build_log);
        assert_eq!(
            statuses[0].issues["main.c"].errors,
            vec![crate::status::BUILD_FAILED]
        );

        let progress = status::progress(&setup.db, setup.submission.id).await.unwrap();
        assert_eq!(progress.build_errors.len(), 1);
        assert_eq!(progress.missing_files, BTreeSet::from([setup.util.id]));
    }

    #[tokio::test]
    async fn unknown_submission() {
        let setup = setup().await;

        assert!(matches!(
            verify(&setup.db, &setup.store, 42).await,
            Err(VerifyError::SubmissionNotFound(42))
        ));
    }
}
