//! Per-testable result status.
//!
//! Status combines the persisted verification report with the build and
//! test case results recorded for the current verification generation.
//! Results recorded for any other generation are ignored.

use std::collections::{BTreeMap, BTreeSet};

use db::{
    submission, test_case_result, testable_result, ColumnTrait, ConnectionTrait, DbErr,
    EntityTrait, QueryFilter,
};
use derive_more::{Display, Error, From};
use serde::Serialize;
use tracing::instrument;

use crate::{
    project::{self, TestableLayout},
    report::{FileIssues, VerificationReport},
};

/// Error prepended to the issues of every file of a testable that failed to build.
pub const BUILD_FAILED: &str = "Build failed (see make output)";

/// State of a single testable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TestableState {
    /// Required files are missing, so the testable was never built.
    MissingFiles { filenames: BTreeSet<String> },

    /// Build and test results are not available yet.
    Pending,

    /// Build was recorded, but produced no test case results.
    BuildError,

    /// Build was recorded and test cases ran, but files of the testable have issues.
    SucceededWithIssues,

    /// Build was recorded, test cases ran and files of the testable have no issues.
    Succeeded,
}

/// Status of a single testable of a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestableStatus {
    pub testable_id: i64,
    pub name: String,

    #[serde(flatten)]
    pub state: TestableState,

    /// Issues of files the testable depends on.
    pub issues: BTreeMap<String, FileIssues>,

    /// Whether the recorded build produced any output.
    pub has_build_log: bool,
}

impl TestableStatus {
    /// Whether the status should be presented as an error.
    pub fn is_error(&self) -> bool {
        matches!(
            self.state,
            TestableState::MissingFiles { .. } | TestableState::BuildError
        )
    }

    /// Whether results of the testable are final for the current generation.
    pub fn is_completed(&self) -> bool {
        matches!(
            self.state,
            TestableState::BuildError
                | TestableState::SucceededWithIssues
                | TestableState::Succeeded
        )
    }
}

/// Results recorded for the current verification generation.
#[derive(Clone, Debug, Default)]
pub struct Results {
    pub testable_results: Vec<testable_result::Model>,
    pub test_case_results: Vec<test_case_result::Model>,
}

/// Compute the status of every testable.
///
/// Returned statuses are ordered by testable name. An unverified submission
/// is represented by `None` as its report, which leaves every testable pending.
pub fn aggregate(
    report: Option<&VerificationReport>,
    testables: &[TestableLayout],
    results: &Results,
) -> Vec<TestableStatus> {
    let issues = report.map(VerificationReport::issues).unwrap_or_default();

    let build_logs = results
        .testable_results
        .iter()
        .map(|result| (result.testable_id, result.build_log.as_str()))
        .collect::<BTreeMap<_, _>>();

    let completed_test_cases = results
        .test_case_results
        .iter()
        .map(|result| result.test_case_id)
        .collect::<BTreeSet<_>>();

    let mut statuses = testables
        .iter()
        .map(|layout| {
            let filenames = layout.filenames();
            let mut issues = issues
                .iter()
                .filter(|(filename, _)| filenames.contains(filename.as_str()))
                .map(|(filename, issues)| (filename.clone(), issues.clone()))
                .collect::<BTreeMap<_, _>>();

            let build_log = build_logs.get(&layout.testable.id);
            let has_test_case_results = layout
                .test_cases
                .iter()
                .any(|test_case| completed_test_cases.contains(&test_case.id));

            let missing = report.map(|report| report.missing_filenames(layout.testable.id));

            let state = match missing {
                None => TestableState::Pending,
                Some(Some(filenames)) => TestableState::MissingFiles {
                    filenames: filenames.clone(),
                },
                Some(None) if build_log.is_none() => TestableState::Pending,
                Some(None) if has_test_case_results => {
                    if issues.values().all(FileIssues::is_empty) {
                        TestableState::Succeeded
                    } else {
                        TestableState::SucceededWithIssues
                    }
                }
                Some(None) => {
                    for file_issues in issues.values_mut() {
                        file_issues.errors.insert(0, String::from(BUILD_FAILED));
                    }

                    TestableState::BuildError
                }
            };

            TestableStatus {
                testable_id: layout.testable.id,
                name: layout.testable.name.clone(),
                state,
                issues,
                has_build_log: build_log.map_or(false, |log| !log.is_empty()),
            }
        })
        .collect::<Vec<_>>();

    statuses.sort_by(|a, b| a.name.cmp(&b.name).then(a.testable_id.cmp(&b.testable_id)));

    statuses
}

/// Progress summary of a submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Testables with final results.
    pub completed: BTreeSet<i64>,

    /// Testables whose test cases ran.
    pub succeeded: BTreeSet<i64>,

    /// Testables that failed to build.
    pub build_errors: BTreeSet<i64>,

    /// Testables still waiting for results.
    pub pending: BTreeSet<i64>,

    /// Testables blocked by missing files.
    pub missing_files: BTreeSet<i64>,
}

impl Progress {
    /// Summarize the provided statuses.
    pub fn from_statuses(statuses: &[TestableStatus]) -> Self {
        let mut progress = Self::default();

        for status in statuses {
            let id = status.testable_id;

            if status.is_completed() {
                progress.completed.insert(id);
            }

            match status.state {
                TestableState::MissingFiles { .. } => progress.missing_files.insert(id),
                TestableState::Pending => progress.pending.insert(id),
                TestableState::BuildError => progress.build_errors.insert(id),
                TestableState::SucceededWithIssues | TestableState::Succeeded => {
                    progress.succeeded.insert(id)
                }
            };
        }

        progress
    }
}

/// Status query errors.
#[derive(Debug, Display, From, Error)]
pub enum StatusError {
    DatabaseError(DbErr),

    /// Persisted verification report is malformed.
    ReportError(serde_json::Error),

    #[display(fmt = "submission {} not found", _0)]
    #[from(ignore)]
    SubmissionNotFound(#[error(not(source))] i64),

    #[display(fmt = "project {} not found", _0)]
    #[from(ignore)]
    ProjectNotFound(#[error(not(source))] i64),
}

/// Load results of the current verification generation of a submission.
pub async fn current_results<C: ConnectionTrait>(
    db: &C,
    submission: &submission::Model,
) -> Result<Results, DbErr> {
    let testable_results = testable_result::Entity::find()
        .filter(testable_result::Column::SubmissionId.eq(submission.id))
        .filter(testable_result::Column::Generation.eq(submission.generation))
        .all(db)
        .await?;

    let test_case_results = test_case_result::Entity::find()
        .filter(test_case_result::Column::SubmissionId.eq(submission.id))
        .filter(test_case_result::Column::Generation.eq(submission.generation))
        .all(db)
        .await?;

    Ok(Results {
        testable_results,
        test_case_results,
    })
}

/// Compute the status of every testable of a submission.
#[instrument(skip(db), err)]
pub async fn status<C: ConnectionTrait>(
    db: &C,
    submission_id: i64,
) -> Result<Vec<TestableStatus>, StatusError> {
    let submission = submission::Entity::find_by_id(submission_id)
        .one(db)
        .await?
        .ok_or(StatusError::SubmissionNotFound(submission_id))?;

    let layout = project::load(db, submission.project_id)
        .await?
        .ok_or(StatusError::ProjectNotFound(submission.project_id))?;

    let report = submission
        .verification_report
        .as_deref()
        .map(VerificationReport::decode)
        .transpose()?;

    let results = current_results(db, &submission).await?;

    Ok(aggregate(report.as_ref(), &layout.testables, &results))
}

/// Compute the progress summary of a submission.
pub async fn progress<C: ConnectionTrait>(
    db: &C,
    submission_id: i64,
) -> Result<Progress, StatusError> {
    Ok(Progress::from_statuses(&status(db, submission_id).await?))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, HashMap};

    use db::{test_case, test_case_result, testable_result};

    use super::{aggregate, Progress, Results, TestableState, BUILD_FAILED};
    use crate::{
        matcher::{
            match_files,
            tests::{file, requirement},
        },
        project::TestableLayout,
        report::VerificationReport,
        resolver::{resolve, tests::layout},
    };

    fn test_case(id: i64, testable_id: i64) -> test_case::Model {
        test_case::Model {
            id,
            testable_id,
            name: format!("case {id}"),
            args: String::new(),
            points: 1,
            source: test_case::Source::Stdout,
            output_type: test_case::OutputType::Diff,
            output_filename: None,
            expected_id: None,
            stdin_id: None,
        }
    }

    fn testable_result(testable_id: i64, build_log: &str) -> testable_result::Model {
        testable_result::Model {
            id: testable_id,
            submission_id: 1,
            testable_id,
            generation: 1,
            build_log: String::from(build_log),
            created_at: db::now(),
        }
    }

    fn test_case_result(test_case_id: i64) -> test_case_result::Model {
        test_case_result::Model {
            submission_id: 1,
            test_case_id,
            generation: 1,
            status: test_case_result::Status::Success,
            extra: Some(0),
            output_id: None,
            created_at: db::now(),
        }
    }

    /// Testables "alpha" (main.c), "beta" (util.c, warns on goto),
    /// "gamma" (absent.c) and "delta" (main.c).
    fn setup() -> (Vec<TestableLayout>, VerificationReport) {
        let main = requirement(1, "main.c");
        let util = db::file_requirement::Model {
            warning_regex: Some(String::from("goto")),
            ..requirement(2, "util.c")
        };
        let absent = requirement(3, "absent.c");

        let util_data = b"goto x;\n".to_vec();
        let util_file = file(2, &util_data);
        let files = BTreeMap::from([
            (String::from("main.c"), file(1, b"int main;\n")),
            (String::from("util.c"), util_file.clone()),
        ]);
        let contents = HashMap::from([(util_file.hash, util_data)]);

        let mut testables = vec![
            layout(1, "alpha", &[main.clone()]),
            layout(2, "beta", &[util.clone()]),
            layout(3, "gamma", &[absent.clone()]),
            layout(4, "delta", &[main.clone()]),
        ];
        testables[0].test_cases = vec![test_case(10, 1)];
        testables[1].test_cases = vec![test_case(20, 2)];
        testables[3].test_cases = vec![test_case(40, 4)];

        let outcome = match_files(&[main, util, absent], &files, &contents);
        let report = {
            let resolution = resolve(&testables, &outcome.satisfied);
            VerificationReport::assemble(outcome, &resolution)
        };

        (testables, report)
    }

    #[test]
    fn unverified_submission_is_pending() {
        let (testables, _) = setup();

        let statuses = aggregate(None, &testables, &Results::default());

        assert!(statuses
            .iter()
            .all(|status| status.state == TestableState::Pending));
        assert!(statuses.iter().all(|status| status.issues.is_empty()));
    }

    #[test]
    fn states_and_ordering() {
        let (testables, report) = setup();
        let results = Results {
            testable_results: vec![
                testable_result(1, ""),
                testable_result(2, "cc util.c"),
                testable_result(4, "util.c:1: error"),
            ],
            test_case_results: vec![test_case_result(10), test_case_result(20)],
        };

        let statuses = aggregate(Some(&report), &testables, &results);

        assert_eq!(
            statuses
                .iter()
                .map(|status| status.name.as_str())
                .collect::<Vec<_>>(),
            vec!["alpha", "beta", "delta", "gamma"]
        );

        assert_eq!(statuses[0].state, TestableState::Succeeded);
        assert!(!statuses[0].has_build_log);

        assert_eq!(statuses[1].state, TestableState::SucceededWithIssues);
        assert_eq!(statuses[1].issues["util.c"].warnings.len(), 1);
        assert!(statuses[1].has_build_log);

        assert_eq!(statuses[2].state, TestableState::BuildError);
        assert!(statuses[2].is_error());

        assert_eq!(
            statuses[3].state,
            TestableState::MissingFiles {
                filenames: BTreeSet::from([String::from("absent.c")]),
            }
        );
        assert_eq!(statuses[3].issues["absent.c"].errors, vec!["file missing"]);
        assert!(statuses[3].is_error());
    }

    #[test]
    fn build_error_prepends_message() {
        let (mut testables, report) = setup();
        testables[1].test_cases.clear();
        let results = Results {
            testable_results: vec![testable_result(2, "error")],
            test_case_results: Vec::new(),
        };

        let statuses = aggregate(Some(&report), &testables, &results);
        let beta = statuses
            .iter()
            .find(|status| status.name == "beta")
            .expect("beta status");

        assert_eq!(beta.state, TestableState::BuildError);
        assert_eq!(beta.issues["util.c"].errors, vec![BUILD_FAILED]);
        assert_eq!(beta.issues["util.c"].warnings.len(), 1);
    }

    #[test]
    fn progress_summary() {
        let (testables, report) = setup();
        let results = Results {
            testable_results: vec![testable_result(1, ""), testable_result(2, "")],
            test_case_results: vec![test_case_result(10)],
        };

        let progress = Progress::from_statuses(&aggregate(Some(&report), &testables, &results));

        assert_eq!(progress.completed, BTreeSet::from([1, 2]));
        assert_eq!(progress.succeeded, BTreeSet::from([1]));
        assert_eq!(progress.build_errors, BTreeSet::from([2]));
        assert_eq!(progress.pending, BTreeSet::from([4]));
        assert_eq!(progress.missing_files, BTreeSet::from([3]));
    }
}
