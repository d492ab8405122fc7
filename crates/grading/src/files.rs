//! Stored file records.

use common::content::{ContentInfo, ContentStore};
use db::{
    file, sea_query::OnConflict, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter,
};

use crate::submissions::IntakeError;

async fn find_by_hash<C: ConnectionTrait>(db: &C, hash: &str) -> Result<Option<file::Model>, DbErr> {
    file::Entity::find()
        .filter(file::Column::Hash.eq(hash))
        .one(db)
        .await
}

/// Fetch the file record of the described content, creating it if needed.
///
/// There is at most one file record per content hash, even when the
/// same content is recorded concurrently.
pub async fn fetch_or_create<C: ConnectionTrait>(
    db: &C,
    info: &ContentInfo,
) -> Result<file::Model, DbErr> {
    if let Some(model) = find_by_hash(db, &info.hash).await? {
        return Ok(model);
    }

    file::Entity::insert(file::ActiveModel {
        hash: ActiveValue::Set(info.hash.clone()),
        size: ActiveValue::Set(info.size as i64),
        lines: ActiveValue::Set(info.lines as i64),
        ..Default::default()
    })
    .on_conflict(OnConflict::column(file::Column::Hash).do_nothing().to_owned())
    .exec_without_returning(db)
    .await?;

    find_by_hash(db, &info.hash)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("file {} not found", info.hash)))
}

/// Store the provided bytes and record them as a file.
pub async fn upload<C: ConnectionTrait>(
    db: &C,
    store: &dyn ContentStore,
    data: &[u8],
) -> Result<file::Model, IntakeError> {
    let info = store.put(data).await?;

    Ok(fetch_or_create(db, &info).await?)
}
