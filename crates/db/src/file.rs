//! Stored file contents.
//!
//! The bytes themselves live in a content store keyed by [`Model::hash`];
//! this model only records the metadata used during verification.
//! A single file row is shared by every submission and project
//! that references the same content.

use sea_orm::entity::prelude::*;

/// File contents model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "files")]
pub struct Model {
    /// Unique file identifier.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Unique hex-encoded content hash.
    pub hash: String,

    /// Content size, in bytes.
    pub size: i64,

    /// Count of newline bytes in the content.
    pub lines: i64,
}

/// File model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::submission_file::Entity")]
    SubmissionFiles,
}

impl Related<super::submission_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubmissionFiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
