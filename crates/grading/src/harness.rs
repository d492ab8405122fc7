//! Build jobs handed over to the external build and execution harness.
//!
//! A build job describes everything needed to build a single testable of
//! a verified submission and to run its test cases. Files are referenced
//! by content hash. The harness reports outcomes back through
//! [`results::record_run`], quoting the job generation.
//!
//! [`results::record_run`]: crate::results::record_run

use std::collections::{BTreeMap, HashMap};

use db::{
    build_file, execution_file, file, submission, test_case, testable_build_file,
    testable_execution_file, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
};
use itertools::Itertools;
use serde::Serialize;
use tracing::instrument;

use crate::{project, submissions, verify::Verification};

/// File copied into the build environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JobFile {
    pub filename: String,
    pub hash: String,
}

/// Test case run specification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestCaseSpec {
    pub id: i64,
    pub name: String,
    pub args: String,
    pub points: i32,
    pub source: test_case::Source,
    pub output_type: test_case::OutputType,
    pub output_filename: Option<String>,

    /// Expected output content hash.
    pub expected: Option<String>,

    /// Standard input content hash.
    pub stdin: Option<String>,
}

/// Build and run job of a single testable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildJob {
    pub submission_id: i64,
    pub generation: i64,
    pub testable_id: i64,
    pub testable: String,
    pub executable: String,
    pub make_target: Option<String>,

    /// Shared project makefile content hash.
    pub makefile: Option<String>,

    /// Submitted files the testable depends on.
    pub submitted_files: Vec<JobFile>,

    pub build_files: Vec<JobFile>,
    pub execution_files: Vec<JobFile>,
    pub test_cases: Vec<TestCaseSpec>,
}

/// Create build jobs of every buildable testable of a verified submission.
#[instrument(skip(db, submission, verification), fields(submission_id = submission.id))]
pub async fn build_jobs<C: ConnectionTrait>(
    db: &C,
    submission: &submission::Model,
    verification: &Verification,
) -> Result<Vec<BuildJob>, DbErr> {
    let layout = project::load(db, submission.project_id)
        .await?
        .ok_or_else(|| {
            DbErr::RecordNotFound(format!("project {} not found", submission.project_id))
        })?;

    let testable_ids = verification
        .buildable
        .iter()
        .map(|testable| testable.id)
        .collect_vec();

    let build_links = testable_build_file::Entity::find()
        .filter(testable_build_file::Column::TestableId.is_in(testable_ids.clone()))
        .all(db)
        .await?;

    let build_files = build_file::Entity::find()
        .filter(
            build_file::Column::Id.is_in(
                build_links
                    .iter()
                    .map(|link| link.build_file_id)
                    .unique()
                    .collect_vec(),
            ),
        )
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, model))
        .collect::<HashMap<_, _>>();

    let execution_links = testable_execution_file::Entity::find()
        .filter(testable_execution_file::Column::TestableId.is_in(testable_ids))
        .all(db)
        .await?;

    let execution_files = execution_file::Entity::find()
        .filter(
            execution_file::Column::Id.is_in(
                execution_links
                    .iter()
                    .map(|link| link.execution_file_id)
                    .unique()
                    .collect_vec(),
            ),
        )
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, model))
        .collect::<HashMap<_, _>>();

    let referenced_file_ids = build_files
        .values()
        .map(|model| model.file_id)
        .chain(execution_files.values().map(|model| model.file_id))
        .chain(layout.project.makefile_id)
        .chain(
            layout
                .testables
                .iter()
                .flat_map(|testable| &testable.test_cases)
                .flat_map(|test_case| test_case.expected_id.into_iter().chain(test_case.stdin_id)),
        )
        .unique()
        .collect_vec();

    let hashes = file::Entity::find()
        .filter(file::Column::Id.is_in(referenced_file_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, model.hash))
        .collect::<HashMap<_, _>>();

    let submitted = submissions::file_mapping(db, submission.id).await?;

    let mut build_links = build_links
        .into_iter()
        .into_group_map_by(|link| link.testable_id);
    let mut execution_links = execution_links
        .into_iter()
        .into_group_map_by(|link| link.testable_id);

    let job_file = |filename: &str, file_id: i64| {
        hashes.get(&file_id).map(|hash| JobFile {
            filename: String::from(filename),
            hash: hash.clone(),
        })
    };

    let mut jobs = Vec::with_capacity(verification.buildable.len());

    for testable in &verification.buildable {
        let Some(testable_layout) = layout.testable(testable.id) else {
            continue;
        };

        let submitted_files = testable_layout
            .filenames()
            .into_iter()
            .filter_map(|filename| {
                submitted.get(filename).map(|model| JobFile {
                    filename: String::from(filename),
                    hash: model.hash.clone(),
                })
            })
            .collect();

        let build_files = build_links
            .remove(&testable.id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|link| build_files.get(&link.build_file_id))
            .filter_map(|model| job_file(&model.filename, model.file_id))
            .sorted_by(|a, b| a.filename.cmp(&b.filename))
            .collect();

        let execution_files = execution_links
            .remove(&testable.id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|link| execution_files.get(&link.execution_file_id))
            .filter_map(|model| job_file(&model.filename, model.file_id))
            .sorted_by(|a, b| a.filename.cmp(&b.filename))
            .collect();

        let test_cases = testable_layout
            .test_cases
            .iter()
            .map(|test_case| TestCaseSpec {
                id: test_case.id,
                name: test_case.name.clone(),
                args: test_case.args.clone(),
                points: test_case.points,
                source: test_case.source,
                output_type: test_case.output_type,
                output_filename: test_case.output_filename.clone(),
                expected: test_case
                    .expected_id
                    .and_then(|id| hashes.get(&id).cloned()),
                stdin: test_case.stdin_id.and_then(|id| hashes.get(&id).cloned()),
            })
            .collect();

        jobs.push(BuildJob {
            submission_id: submission.id,
            generation: verification.generation,
            testable_id: testable.id,
            testable: testable.name.clone(),
            executable: testable.executable.clone(),
            make_target: testable.make_target.clone(),
            makefile: layout
                .project
                .makefile_id
                .and_then(|id| hashes.get(&id).cloned()),
            submitted_files,
            build_files,
            execution_files,
            test_cases,
        });
    }

    Ok(jobs)
}

/// Group build jobs by the content hashes they reference, which the
/// harness has to fetch before running them.
pub fn required_contents(jobs: &[BuildJob]) -> BTreeMap<String, Vec<i64>> {
    let mut contents = BTreeMap::<String, Vec<i64>>::new();

    for job in jobs {
        let hashes = job
            .submitted_files
            .iter()
            .chain(&job.build_files)
            .chain(&job.execution_files)
            .map(|file| &file.hash)
            .chain(&job.makefile)
            .chain(job.test_cases.iter().flat_map(|test_case| {
                test_case.expected.iter().chain(&test_case.stdin)
            }))
            .unique();

        for hash in hashes {
            contents.entry(hash.clone()).or_default().push(job.testable_id);
        }
    }

    contents
}

#[cfg(test)]
mod tests {
    use common::content::MemoryContentStore;
    use db::{
        build_file, project, testable_build_file, ActiveValue, ColumnTrait, EntityTrait,
        QueryFilter,
    };

    use crate::{
        submissions,
        testing::{self, create_database, Fixture},
        verify::verify,
    };

    #[tokio::test]
    async fn jobs_of_buildable_testables() {
        let db = create_database().await;
        let store = MemoryContentStore::new();
        let fixture = Fixture::new(&db).await;

        let makefile = testing::file(&db, b"all:\n\tcc -o hello main.c\n").await;
        project::Entity::update_many()
            .col_expr(project::Column::MakefileId, makefile.id.into())
            .filter(project::Column::Id.eq(fixture.project.id))
            .exec(&db)
            .await
            .unwrap();

        let main = fixture.requirement(&db, "main.c", |_| {}).await;
        let lib = fixture.requirement(&db, "lib.c", |_| {}).await;
        let hello = fixture.testable(&db, "hello", &[&main]).await;
        fixture.testable(&db, "linked", &[&main, &lib]).await;
        let case = fixture.test_case(&db, &hello, "greets", 2).await;

        let header = testing::file(&db, b"void greet(void);\n").await;
        let build_file = build_file::Entity::insert(build_file::ActiveModel {
            project_id: ActiveValue::Set(fixture.project.id),
            file_id: ActiveValue::Set(header.id),
            filename: ActiveValue::Set(String::from("greet.h")),
            ..Default::default()
        })
        .exec_with_returning(&db)
        .await
        .unwrap();
        testable_build_file::Entity::insert(testable_build_file::ActiveModel {
            testable_id: ActiveValue::Set(hello.id),
            build_file_id: ActiveValue::Set(build_file.id),
        })
        .exec_without_returning(&db)
        .await
        .unwrap();

        let submission = submissions::create(
            &db,
            &store,
            fixture.project.id,
            fixture.user.id,
            vec![(String::from("main.c"), b"int main;\n".to_vec())],
        )
        .await
        .unwrap();

        let verification = verify(&db, &store, submission.id).await.unwrap();
        let jobs = super::build_jobs(&db, &submission, &verification)
            .await
            .expect("unable to create build jobs");

        assert_eq!(jobs.len(), 1);

        let job = &jobs[0];
        assert_eq!(job.testable_id, hello.id);
        assert_eq!(job.generation, verification.generation);
        assert_eq!(job.makefile, Some(makefile.hash.clone()));
        assert_eq!(job.submitted_files.len(), 1);
        assert_eq!(job.submitted_files[0].filename, "main.c");
        assert_eq!(job.build_files[0].hash, header.hash);
        assert!(job.execution_files.is_empty());
        assert_eq!(job.test_cases[0].id, case.id);

        let contents = super::required_contents(&jobs);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[&makefile.hash], vec![hello.id]);

        let serialized = serde_json::to_value(job).expect("unable to serialize");
        assert_eq!(serialized["test_cases"][0]["source"], "stdout");
    }
}
