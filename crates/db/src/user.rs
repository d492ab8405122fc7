//! Registered user.
//!
//! Authentication is handled outside of this crate, so the user model
//! only carries what the grading engine needs to attribute submissions
//! and to track per-user result disclosure.

use sea_orm::entity::prelude::*;

/// User model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    pub name: String,
    pub created_at: TimeDateTime,
}

/// User model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,

    #[sea_orm(has_many = "super::project_view::Entity")]
    ProjectViews,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::project_view::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectViews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
