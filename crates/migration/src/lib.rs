pub use sea_orm_migration::prelude::*;

mod m20230101_000001_create_users_table;
mod m20230101_000002_create_classes_table;
mod m20230101_000003_create_files_table;
mod m20230101_000004_create_projects_table;
mod m20230101_000005_create_file_requirements_table;
mod m20230101_000006_create_build_files_table;
mod m20230101_000007_create_execution_files_table;
mod m20230101_000008_create_testables_table;
mod m20230101_000009_create_testable_file_requirements_table;
mod m20230101_000010_create_testable_build_files_table;
mod m20230101_000011_create_testable_execution_files_table;
mod m20230101_000012_create_test_cases_table;
mod m20230101_000013_create_submissions_table;
mod m20230101_000014_create_submission_files_table;
mod m20230101_000015_create_testable_results_table;
mod m20230101_000016_create_test_case_results_table;
mod m20230101_000017_create_project_views_table;

pub(crate) use m20230101_000001_create_users_table::Users;
pub(crate) use m20230101_000002_create_classes_table::Classes;
pub(crate) use m20230101_000003_create_files_table::Files;
pub(crate) use m20230101_000004_create_projects_table::Projects;
pub(crate) use m20230101_000005_create_file_requirements_table::FileRequirements;
pub(crate) use m20230101_000006_create_build_files_table::BuildFiles;
pub(crate) use m20230101_000007_create_execution_files_table::ExecutionFiles;
pub(crate) use m20230101_000008_create_testables_table::Testables;
pub(crate) use m20230101_000012_create_test_cases_table::TestCases;
pub(crate) use m20230101_000013_create_submissions_table::Submissions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20230101_000001_create_users_table::Migration),
            Box::new(m20230101_000002_create_classes_table::Migration),
            Box::new(m20230101_000003_create_files_table::Migration),
            Box::new(m20230101_000004_create_projects_table::Migration),
            Box::new(m20230101_000005_create_file_requirements_table::Migration),
            Box::new(m20230101_000006_create_build_files_table::Migration),
            Box::new(m20230101_000007_create_execution_files_table::Migration),
            Box::new(m20230101_000008_create_testables_table::Migration),
            Box::new(m20230101_000009_create_testable_file_requirements_table::Migration),
            Box::new(m20230101_000010_create_testable_build_files_table::Migration),
            Box::new(m20230101_000011_create_testable_execution_files_table::Migration),
            Box::new(m20230101_000012_create_test_cases_table::Migration),
            Box::new(m20230101_000013_create_submissions_table::Migration),
            Box::new(m20230101_000014_create_submission_files_table::Migration),
            Box::new(m20230101_000015_create_testable_results_table::Migration),
            Box::new(m20230101_000016_create_test_case_results_table::Migration),
            Box::new(m20230101_000017_create_project_views_table::Migration),
        ]
    }
}
