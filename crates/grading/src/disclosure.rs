//! Result disclosure timing.
//!
//! Verified results of a submission are withheld from its viewer for the
//! project delay after the submission was created. Additionally, every
//! viewer has a sliding per-project window, tracked by a [`project_view`]
//! record: once the window lapses, the next disclosing read reopens it,
//! and newer submissions are withheld until either their own delay or the
//! reopened window passes, whichever comes first.
//!
//! Results of submissions created before the current window opened are
//! always disclosed.

use db::{
    project, project_view, sea_query::OnConflict, submission, ActiveValue, ColumnTrait,
    ConnectionTrait, DbErr, Duration, EntityTrait, PrimitiveDateTime, QueryFilter,
};
use tracing::{debug, instrument};

/// Disclosure decision for a single read.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Disclosure {
    /// Results may be shown.
    Now,

    /// Results are withheld for the provided number of minutes.
    Delayed { minutes: f64 },

    /// Viewer has no window yet and the read is not allowed to open one.
    ///
    /// `minutes` holds the remaining delay of the submission itself,
    /// which is an upper bound of the actual delay.
    Undetermined { minutes: f64 },
}

impl Disclosure {
    /// Minutes to wait before results may be shown, [`None`] if they may be shown now.
    pub fn delay_minutes(&self) -> Option<f64> {
        match *self {
            Disclosure::Now => None,
            Disclosure::Delayed { minutes } | Disclosure::Undetermined { minutes } => {
                Some(minutes)
            }
        }
    }
}

/// Project view change requested by a disclosure decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bookkeeping {
    None,

    /// Open the first window of the viewer.
    Create,

    /// Reopen the lapsed window that started at `observed`.
    Reset { observed: PrimitiveDateTime },
}

/// Disclosure decision together with the project view change it requires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    pub disclosure: Disclosure,
    pub bookkeeping: Bookkeeping,
}

impl Decision {
    fn disclose(bookkeeping: Bookkeeping) -> Self {
        Self {
            disclosure: Disclosure::Now,
            bookkeeping,
        }
    }

    fn withhold(disclosure: Disclosure) -> Self {
        Self {
            disclosure,
            bookkeeping: Bookkeeping::None,
        }
    }
}

fn minutes(duration: Duration) -> f64 {
    duration.as_seconds_f64() / 60.0
}

/// Decide whether results of a submission created at `submitted_at` may be shown.
///
/// `view` is the start of the viewer's current window, if any. Only
/// `disclosing` reads are allowed to request project view changes.
pub fn decide(
    delay: Duration,
    submitted_at: PrimitiveDateTime,
    view: Option<PrimitiveDateTime>,
    now: PrimitiveDateTime,
    disclosing: bool,
) -> Decision {
    let remaining = delay - (now - submitted_at);

    if remaining <= Duration::ZERO {
        return Decision::disclose(Bookkeeping::None);
    }

    let Some(view) = view else {
        return if disclosing {
            Decision::disclose(Bookkeeping::Create)
        } else {
            Decision::withhold(Disclosure::Undetermined {
                minutes: minutes(remaining),
            })
        };
    };

    if submitted_at <= view {
        return Decision::disclose(Bookkeeping::None);
    }

    let view_remaining = delay - (now - view);

    if view_remaining <= Duration::ZERO {
        return Decision::disclose(if disclosing {
            Bookkeeping::Reset { observed: view }
        } else {
            Bookkeeping::None
        });
    }

    Decision::withhold(Disclosure::Delayed {
        minutes: minutes(remaining.min(view_remaining)),
    })
}

/// Apply a project view change, returning `false` if a concurrent
/// read already applied a conflicting one.
///
/// Losing such a race leaves the project view written by the winner.
async fn apply<C: ConnectionTrait>(
    db: &C,
    project_id: i64,
    viewer_id: i64,
    bookkeeping: Bookkeeping,
    now: PrimitiveDateTime,
) -> Result<bool, DbErr> {
    match bookkeeping {
        Bookkeeping::None => Ok(true),
        Bookkeeping::Create => {
            let inserted = project_view::Entity::insert(project_view::ActiveModel {
                project_id: ActiveValue::Set(project_id),
                user_id: ActiveValue::Set(viewer_id),
                created_at: ActiveValue::Set(now),
            })
            .on_conflict(
                OnConflict::columns([
                    project_view::Column::ProjectId,
                    project_view::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

            if inserted == 0 {
                debug!(viewer_id, "project view was created concurrently");
            }

            Ok(inserted != 0)
        }
        Bookkeeping::Reset { observed } => {
            let updated = project_view::Entity::update_many()
                .col_expr(project_view::Column::CreatedAt, now.into())
                .filter(project_view::Column::ProjectId.eq(project_id))
                .filter(project_view::Column::UserId.eq(viewer_id))
                .filter(project_view::Column::CreatedAt.eq(observed))
                .exec(db)
                .await?;

            if updated.rows_affected == 0 {
                debug!(viewer_id, "project view was reset concurrently");
            }

            Ok(updated.rows_affected != 0)
        }
    }
}

/// Decide whether a viewer may see results of a submission, applying
/// the required project view changes.
///
/// Concurrent first views by the same viewer create a single project view,
/// and concurrent resets of the same lapsed window reopen it once.
#[instrument(skip(db, submission), fields(submission_id = submission.id), err)]
pub async fn disclosure<C: ConnectionTrait>(
    db: &C,
    submission: &submission::Model,
    viewer_id: i64,
    disclosing: bool,
    now: PrimitiveDateTime,
) -> Result<Disclosure, DbErr> {
    let project = project::Entity::find_by_id(submission.project_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            DbErr::RecordNotFound(format!("project {} not found", submission.project_id))
        })?;

    let view = project_view::Entity::find_by_id((project.id, viewer_id))
        .one(db)
        .await?;

    let decision = decide(
        project.delay(),
        submission.created_at,
        view.map(|view| view.created_at),
        now,
        disclosing,
    );

    apply(db, project.id, viewer_id, decision.bookkeeping, now).await?;

    Ok(decision.disclosure)
}

/// Minutes to wait before a viewer may see results of a submission,
/// [`None`] if results may be shown now.
///
/// A viewer without a window on a non-disclosing read gets the remaining
/// delay of the submission itself, same as an actual delay. Use
/// [`disclosure`] to tell [`Disclosure::Undetermined`] apart.
pub async fn disclosure_delay_minutes<C: ConnectionTrait>(
    db: &C,
    submission: &submission::Model,
    viewer_id: i64,
    disclosing: bool,
) -> Result<Option<f64>, DbErr> {
    Ok(disclosure(db, submission, viewer_id, disclosing, db::now())
        .await?
        .delay_minutes())
}

#[cfg(test)]
mod tests {
    use db::{project_view, Duration, EntityTrait, PrimitiveDateTime};

    use super::{apply, decide, disclosure, Bookkeeping, Decision, Disclosure};
    use crate::testing::{create_database, Fixture};

    const DELAY: Duration = Duration::minutes(10);

    fn now() -> PrimitiveDateTime {
        db::now()
    }

    fn ago(minutes: i64) -> PrimitiveDateTime {
        now() - Duration::minutes(minutes)
    }

    #[test]
    fn elapsed_delay_discloses() {
        let now = now();

        for view in [None, Some(now), Some(now - Duration::minutes(3))] {
            for disclosing in [false, true] {
                assert_eq!(
                    decide(DELAY, now - Duration::minutes(10), view, now, disclosing),
                    Decision::disclose(Bookkeeping::None)
                );
            }
        }

        assert_eq!(
            decide(Duration::ZERO, now, None, now, false).disclosure,
            Disclosure::Now
        );
    }

    #[test]
    fn own_delay_is_checked_first() {
        let now = now();

        assert_eq!(
            decide(
                DELAY,
                now - Duration::minutes(11),
                Some(now - Duration::minutes(12)),
                now,
                true
            ),
            Decision::disclose(Bookkeeping::None)
        );
    }

    #[test]
    fn first_view() {
        let now = now();
        let submitted_at = now - Duration::minutes(4);

        assert_eq!(
            decide(DELAY, submitted_at, None, now, true),
            Decision::disclose(Bookkeeping::Create)
        );
        assert_eq!(
            decide(DELAY, submitted_at, None, now, false),
            Decision::withhold(Disclosure::Undetermined { minutes: 6.0 })
        );
    }

    #[test]
    fn older_submissions_are_disclosed() {
        let now = now();
        let view = now - Duration::minutes(2);

        assert_eq!(
            decide(DELAY, view, Some(view), now, false),
            Decision::disclose(Bookkeeping::None)
        );
        assert_eq!(
            decide(DELAY, view - Duration::minutes(1), Some(view), now, true),
            Decision::disclose(Bookkeeping::None)
        );
    }

    #[test]
    fn lapsed_view() {
        let now = now();
        let view = now - Duration::minutes(12);
        let submitted_at = now - Duration::minutes(5);

        assert_eq!(
            decide(DELAY, submitted_at, Some(view), now, true),
            Decision::disclose(Bookkeeping::Reset { observed: view })
        );
        assert_eq!(
            decide(DELAY, submitted_at, Some(view), now, false),
            Decision::disclose(Bookkeeping::None)
        );
    }

    #[test]
    fn shorter_remainder_wins() {
        let now = now();

        assert_eq!(
            decide(
                DELAY,
                now - Duration::minutes(1),
                Some(now - Duration::minutes(7)),
                now,
                true
            )
            .disclosure,
            Disclosure::Delayed { minutes: 3.0 }
        );
        assert_eq!(
            decide(
                DELAY,
                now - Duration::minutes(1),
                Some(now - Duration::seconds(510)),
                now,
                false
            )
            .disclosure,
            Disclosure::Delayed { minutes: 1.5 }
        );
    }

    #[tokio::test]
    async fn first_view_is_created_once() {
        let db = create_database().await;
        let fixture = Fixture::new(&db).await;
        let submission = fixture.submission_at(&db, ago(1)).await;
        let viewer = fixture.user.id;

        assert_eq!(
            super::disclosure_delay_minutes(&db, &submission, viewer, false)
                .await
                .expect("unable to compute delay")
                .map(f64::round),
            Some(9.0)
        );
        assert!(project_view::Entity::find().all(&db).await.unwrap().is_empty());

        let first = now();
        assert_eq!(
            disclosure(&db, &submission, viewer, true, first).await.unwrap(),
            Disclosure::Now
        );
        assert_eq!(
            disclosure(&db, &submission, viewer, true, first).await.unwrap(),
            Disclosure::Now
        );

        let views = project_view::Entity::find().all(&db).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].created_at, first);

        let newer = fixture.submission_at(&db, first + Duration::minutes(1)).await;
        assert_eq!(
            disclosure(&db, &newer, viewer, true, first + Duration::minutes(2))
                .await
                .unwrap(),
            Disclosure::Delayed { minutes: 8.0 }
        );
    }

    #[tokio::test]
    async fn lapsed_view_is_reset_on_disclosing_read() {
        let db = create_database().await;
        let fixture = Fixture::new(&db).await;
        let viewer = fixture.user.id;
        let opened = ago(12);
        fixture.project_view(&db, opened).await;

        let submission = fixture.submission_at(&db, ago(5)).await;

        assert_eq!(
            super::disclosure_delay_minutes(&db, &submission, viewer, false)
                .await
                .unwrap(),
            None
        );
        let view = project_view::Entity::find_by_id((fixture.project.id, viewer))
            .one(&db)
            .await
            .unwrap()
            .expect("project view");
        assert_eq!(view.created_at, opened);

        let now = now();
        assert_eq!(
            disclosure(&db, &submission, viewer, true, now).await.unwrap(),
            Disclosure::Now
        );
        let view = project_view::Entity::find_by_id((fixture.project.id, viewer))
            .one(&db)
            .await
            .unwrap()
            .expect("project view");
        assert_eq!(view.created_at, now);
    }

    #[tokio::test]
    async fn undetermined_delay_is_reported_as_minutes() {
        let db = create_database().await;
        let fixture = Fixture::new(&db).await;
        let submission = fixture.submission_at(&db, ago(4)).await;
        let now = now();

        let Disclosure::Undetermined { minutes } =
            disclosure(&db, &submission, fixture.user.id, false, now)
                .await
                .unwrap()
        else {
            panic!("expected undetermined delay");
        };

        assert_eq!(minutes.round(), 6.0);
        assert_eq!(
            super::disclosure_delay_minutes(&db, &submission, fixture.user.id, false)
                .await
                .unwrap()
                .map(f64::round),
            Some(6.0)
        );
    }

    #[tokio::test]
    async fn concurrent_first_view_keeps_winner() {
        let db = create_database().await;
        let fixture = Fixture::new(&db).await;
        let submission = fixture.submission_at(&db, ago(1)).await;
        let now = now();

        let decision = decide(DELAY, submission.created_at, None, now, true);
        assert_eq!(decision.bookkeeping, Bookkeeping::Create);

        let winner = now - Duration::seconds(1);
        fixture.project_view(&db, winner).await;

        assert!(!apply(&db, fixture.project.id, fixture.user.id, decision.bookkeeping, now)
            .await
            .expect("lost race is not an error"));

        let views = project_view::Entity::find().all(&db).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].created_at, winner);
    }

    #[tokio::test]
    async fn concurrent_reset_keeps_winner() {
        let db = create_database().await;
        let fixture = Fixture::new(&db).await;
        let opened = ago(12);
        fixture.project_view(&db, opened).await;
        let submission = fixture.submission_at(&db, ago(5)).await;
        let now = now();

        let decision = decide(DELAY, submission.created_at, Some(opened), now, true);
        assert_eq!(decision.bookkeeping, Bookkeeping::Reset { observed: opened });

        let winner = now - Duration::seconds(1);
        assert!(apply(
            &db,
            fixture.project.id,
            fixture.user.id,
            Bookkeeping::Reset { observed: opened },
            winner
        )
        .await
        .unwrap());

        assert!(!apply(&db, fixture.project.id, fixture.user.id, decision.bookkeeping, now)
            .await
            .expect("lost race is not an error"));

        let views = project_view::Entity::find().all(&db).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].created_at, winner);
    }
}
