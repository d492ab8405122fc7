use common::config::Config;
use db::{
    class, file, file_requirement, project, project_view, submission, test_case, testable,
    testable_file_requirement, user, ActiveValue, Database, DatabaseConnection, EntityTrait,
    PrimitiveDateTime,
};
use migration::MigratorTrait;

pub(crate) async fn create_database() -> DatabaseConnection {
    let db = Database::connect(&Config::for_tests().database.url)
        .await
        .expect("unable to create test database");

    migration::Migrator::up(&db, None)
        .await
        .expect("unable to run migrations");

    db
}

pub(crate) async fn class(db: &DatabaseConnection, name: &str) -> class::Model {
    class::Entity::insert(class::ActiveModel {
        name: ActiveValue::Set(String::from(name)),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create class")
}

pub(crate) async fn user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::Entity::insert(user::ActiveModel {
        username: ActiveValue::Set(String::from(username)),
        name: ActiveValue::Set(String::from(username)),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create user")
}

pub(crate) async fn file(db: &DatabaseConnection, data: &[u8]) -> file::Model {
    crate::files::fetch_or_create(db, &common::content::ContentInfo::describe(data))
        .await
        .expect("unable to create file")
}

/// Class with a single project, delayed by 10 minutes, and a single student.
pub(crate) struct Fixture {
    pub(crate) user: user::Model,
    pub(crate) project: project::Model,
}

impl Fixture {
    pub(crate) async fn new(db: &DatabaseConnection) -> Self {
        let class = class(db, "systems").await;
        let user = user(db, "student").await;

        let project = project::Entity::insert(project::ActiveModel {
            class_id: ActiveValue::Set(class.id),
            name: ActiveValue::Set(String::from("shell")),
            delay_minutes: ActiveValue::Set(10),
            is_ready: ActiveValue::Set(true),
            makefile_id: ActiveValue::Set(None),
            ..Default::default()
        })
        .exec_with_returning(db)
        .await
        .expect("unable to create project");

        Self { user, project }
    }

    pub(crate) async fn requirement(
        &self,
        db: &DatabaseConnection,
        filename: &str,
        configure: impl FnOnce(&mut file_requirement::ActiveModel),
    ) -> file_requirement::Model {
        let mut model = file_requirement::ActiveModel {
            project_id: ActiveValue::Set(self.project.id),
            filename: ActiveValue::Set(String::from(filename)),
            min_size: ActiveValue::Set(0),
            max_size: ActiveValue::Set(None),
            min_lines: ActiveValue::Set(0),
            max_lines: ActiveValue::Set(None),
            optional: ActiveValue::Set(false),
            warning_regex: ActiveValue::Set(None),
            ..Default::default()
        };

        configure(&mut model);

        file_requirement::Entity::insert(model)
            .exec_with_returning(db)
            .await
            .expect("unable to create file requirement")
    }

    pub(crate) async fn testable(
        &self,
        db: &DatabaseConnection,
        name: &str,
        requirements: &[&file_requirement::Model],
    ) -> testable::Model {
        let testable = testable::Entity::insert(testable::ActiveModel {
            project_id: ActiveValue::Set(self.project.id),
            name: ActiveValue::Set(String::from(name)),
            executable: ActiveValue::Set(String::from(name)),
            make_target: ActiveValue::Set(Some(String::from(name))),
            ..Default::default()
        })
        .exec_with_returning(db)
        .await
        .expect("unable to create testable");

        for requirement in requirements {
            testable_file_requirement::Entity::insert(testable_file_requirement::ActiveModel {
                testable_id: ActiveValue::Set(testable.id),
                file_requirement_id: ActiveValue::Set(requirement.id),
            })
            .exec_without_returning(db)
            .await
            .expect("unable to attach file requirement");
        }

        testable
    }

    pub(crate) async fn test_case(
        &self,
        db: &DatabaseConnection,
        testable: &testable::Model,
        name: &str,
        points: i32,
    ) -> test_case::Model {
        test_case::Entity::insert(test_case::ActiveModel {
            testable_id: ActiveValue::Set(testable.id),
            name: ActiveValue::Set(String::from(name)),
            args: ActiveValue::Set(format!("./{} {}", testable.executable, name)),
            points: ActiveValue::Set(points),
            source: ActiveValue::Set(test_case::Source::Stdout),
            output_type: ActiveValue::Set(test_case::OutputType::Diff),
            output_filename: ActiveValue::Set(None),
            expected_id: ActiveValue::Set(None),
            stdin_id: ActiveValue::Set(None),
            ..Default::default()
        })
        .exec_with_returning(db)
        .await
        .expect("unable to create test case")
    }

    /// Create an empty submission of the fixture user.
    pub(crate) async fn submission_at(
        &self,
        db: &DatabaseConnection,
        created_at: PrimitiveDateTime,
    ) -> submission::Model {
        submission::Entity::insert(submission::ActiveModel {
            project_id: ActiveValue::Set(self.project.id),
            user_id: ActiveValue::Set(self.user.id),
            created_at: ActiveValue::Set(created_at),
            verified_at: ActiveValue::Set(None),
            generation: ActiveValue::Set(0),
            verification_report: ActiveValue::Set(None),
            ..Default::default()
        })
        .exec_with_returning(db)
        .await
        .expect("unable to create submission")
    }

    pub(crate) async fn project_view(&self, db: &DatabaseConnection, created_at: PrimitiveDateTime) {
        project_view::Entity::insert(project_view::ActiveModel {
            project_id: ActiveValue::Set(self.project.id),
            user_id: ActiveValue::Set(self.user.id),
            created_at: ActiveValue::Set(created_at),
        })
        .exec_without_returning(db)
        .await
        .expect("unable to create project view");
    }
}
