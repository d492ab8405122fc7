//! Submission intake and history.

use std::collections::{BTreeMap, BTreeSet};

use common::content::{ContentError, ContentInfo, ContentStore};
use db::{
    file, project, submission, submission_file, user, ActiveValue, ColumnTrait, Condition,
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use tracing::{info, instrument};

use crate::files;

/// Submission intake errors.
#[derive(Debug, Display, Error, From)]
pub enum IntakeError {
    DatabaseError(DbErr),
    ContentError(ContentError),

    #[display(fmt = "file {} was submitted more than once", _0)]
    #[from(ignore)]
    DuplicateFilename(#[error(not(source))] String),

    #[display(fmt = "project {} not found", _0)]
    #[from(ignore)]
    ProjectNotFound(#[error(not(source))] i64),

    #[display(fmt = "user {} not found", _0)]
    #[from(ignore)]
    UserNotFound(#[error(not(source))] i64),
}

/// Create a submission of the provided named files.
///
/// File contents are stored before any record is created. The submission
/// and its file associations are then created atomically.
#[instrument(skip(db, store, files), err)]
pub async fn create(
    db: &DatabaseConnection,
    store: &dyn ContentStore,
    project_id: i64,
    user_id: i64,
    files: Vec<(String, Vec<u8>)>,
) -> Result<submission::Model, IntakeError> {
    let mut filenames = BTreeSet::new();

    for (filename, _) in &files {
        if !filenames.insert(filename.as_str()) {
            return Err(IntakeError::DuplicateFilename(filename.clone()));
        }
    }

    let mut stored = Vec::<(String, ContentInfo)>::with_capacity(files.len());

    for (filename, data) in files {
        let info = store.put(&data).await?;
        stored.push((filename, info));
    }

    let submission = db
        .transaction::<_, _, IntakeError>(|txn| {
            Box::pin(async move {
                let project_exists = project::Entity::find_by_id(project_id)
                    .select_only()
                    .exists(txn)
                    .await?;

                if !project_exists {
                    return Err(IntakeError::ProjectNotFound(project_id));
                }

                let user_exists = user::Entity::find_by_id(user_id)
                    .select_only()
                    .exists(txn)
                    .await?;

                if !user_exists {
                    return Err(IntakeError::UserNotFound(user_id));
                }

                let submission = submission::Entity::insert(submission::ActiveModel {
                    project_id: ActiveValue::Set(project_id),
                    user_id: ActiveValue::Set(user_id),
                    created_at: ActiveValue::Set(db::now()),
                    verified_at: ActiveValue::Set(None),
                    generation: ActiveValue::Set(0),
                    verification_report: ActiveValue::Set(None),
                    ..Default::default()
                })
                .exec_with_returning(txn)
                .await?;

                for (filename, info) in stored {
                    let file = files::fetch_or_create(txn, &info).await?;

                    submission_file::Entity::insert(submission_file::ActiveModel {
                        submission_id: ActiveValue::Set(submission.id),
                        filename: ActiveValue::Set(filename),
                        file_id: ActiveValue::Set(file.id),
                    })
                    .exec_without_returning(txn)
                    .await?;
                }

                Ok(submission)
            })
        })
        .await
        .into_raw_result()?;

    info!(submission_id = submission.id, "submission created");

    Ok(submission)
}

/// Submitted files of a submission by file name.
pub async fn file_mapping<C: ConnectionTrait>(
    db: &C,
    submission_id: i64,
) -> Result<BTreeMap<String, file::Model>, DbErr> {
    Ok(submission_file::Entity::find()
        .filter(submission_file::Column::SubmissionId.eq(submission_id))
        .find_also_related(file::Entity)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(submission_file, file)| Some((submission_file.filename, file?)))
        .collect())
}

/// Latest submission of a user for a project.
pub async fn most_recent<C: ConnectionTrait>(
    db: &C,
    project_id: i64,
    user_id: i64,
) -> Result<Option<submission::Model>, DbErr> {
    submission::Entity::find()
        .filter(submission::Column::ProjectId.eq(project_id))
        .filter(submission::Column::UserId.eq(user_id))
        .order_by_desc(submission::Column::CreatedAt)
        .order_by_desc(submission::Column::Id)
        .one(db)
        .await
}

/// Submission of the same user and project directly preceding the provided one.
pub async fn earlier<C: ConnectionTrait>(
    db: &C,
    submission: &submission::Model,
) -> Result<Option<submission::Model>, DbErr> {
    submission::Entity::find()
        .filter(submission::Column::ProjectId.eq(submission.project_id))
        .filter(submission::Column::UserId.eq(submission.user_id))
        .filter(
            Condition::any()
                .add(submission::Column::CreatedAt.lt(submission.created_at))
                .add(
                    Condition::all()
                        .add(submission::Column::CreatedAt.eq(submission.created_at))
                        .add(submission::Column::Id.lt(submission.id)),
                ),
        )
        .order_by_desc(submission::Column::CreatedAt)
        .order_by_desc(submission::Column::Id)
        .one(db)
        .await
}

/// Submission of the same user and project directly following the provided one.
pub async fn later<C: ConnectionTrait>(
    db: &C,
    submission: &submission::Model,
) -> Result<Option<submission::Model>, DbErr> {
    submission::Entity::find()
        .filter(submission::Column::ProjectId.eq(submission.project_id))
        .filter(submission::Column::UserId.eq(submission.user_id))
        .filter(
            Condition::any()
                .add(submission::Column::CreatedAt.gt(submission.created_at))
                .add(
                    Condition::all()
                        .add(submission::Column::CreatedAt.eq(submission.created_at))
                        .add(submission::Column::Id.gt(submission.id)),
                ),
        )
        .order_by_asc(submission::Column::CreatedAt)
        .order_by_asc(submission::Column::Id)
        .one(db)
        .await
}

#[cfg(test)]
mod tests {
    use common::content::MemoryContentStore;
    use db::{submission_file, Duration, EntityTrait};

    use super::IntakeError;
    use crate::testing::{create_database, Fixture};

    fn files(entries: &[(&str, &[u8])]) -> Vec<(String, Vec<u8>)> {
        entries
            .iter()
            .map(|(name, data)| (String::from(*name), data.to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn create_with_shared_contents() {
        let db = create_database().await;
        let store = MemoryContentStore::new();
        let fixture = Fixture::new(&db).await;

        let submission = super::create(
            &db,
            &store,
            fixture.project.id,
            fixture.user.id,
            files(&[("main.c", b"int x;\n"), ("copy.c", b"int x;\n")]),
        )
        .await
        .expect("unable to create submission");

        assert_eq!(submission.generation, 0);
        assert!(submission.verification_report.is_none());

        let mapping = super::file_mapping(&db, submission.id)
            .await
            .expect("unable to load files");

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["main.c"], mapping["copy.c"]);
        assert_eq!(mapping["main.c"].lines, 1);
    }

    #[tokio::test]
    async fn duplicate_filenames_are_rejected() {
        let db = create_database().await;
        let store = MemoryContentStore::new();
        let fixture = Fixture::new(&db).await;

        let result = super::create(
            &db,
            &store,
            fixture.project.id,
            fixture.user.id,
            files(&[("main.c", b"a"), ("main.c", b"b")]),
        )
        .await;

        assert!(matches!(result, Err(IntakeError::DuplicateFilename(name)) if name == "main.c"));
        assert!(submission_file::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unknown_project() {
        let db = create_database().await;
        let store = MemoryContentStore::new();
        let fixture = Fixture::new(&db).await;

        let result = super::create(&db, &store, 42, fixture.user.id, files(&[("a", b"a")])).await;

        assert!(matches!(result, Err(IntakeError::ProjectNotFound(42))));
    }

    #[tokio::test]
    async fn history() {
        let db = create_database().await;
        let fixture = Fixture::new(&db).await;
        let start = db::now();

        let first = fixture.submission_at(&db, start).await;
        let second = fixture.submission_at(&db, start + Duration::minutes(1)).await;
        let third = fixture.submission_at(&db, start + Duration::minutes(2)).await;

        assert_eq!(
            super::most_recent(&db, fixture.project.id, fixture.user.id)
                .await
                .unwrap(),
            Some(third.clone())
        );
        assert_eq!(super::earlier(&db, &second).await.unwrap(), Some(first.clone()));
        assert_eq!(super::later(&db, &second).await.unwrap(), Some(third.clone()));
        assert_eq!(super::earlier(&db, &first).await.unwrap(), None);
        assert_eq!(super::later(&db, &third).await.unwrap(), None);
    }
}
