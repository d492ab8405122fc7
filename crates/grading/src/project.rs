//! Project configuration loading.

use std::collections::{BTreeMap, BTreeSet};

use db::{
    class, file_requirement, project, test_case, testable, testable_file_requirement,
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use itertools::Itertools;

/// A testable together with everything it depends on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestableLayout {
    pub testable: testable::Model,

    /// Requirements of the testable, ordered by file name.
    pub requirements: Vec<file_requirement::Model>,

    /// Test cases of the testable, ordered by name.
    pub test_cases: Vec<test_case::Model>,
}

impl TestableLayout {
    /// File names of every requirement of this testable, optional ones included.
    pub fn filenames(&self) -> BTreeSet<&str> {
        self.requirements
            .iter()
            .map(|requirement| requirement.filename.as_str())
            .collect()
    }

    /// Total points of this testable test cases.
    pub fn points(&self) -> i64 {
        self.test_cases
            .iter()
            .map(|test_case| i64::from(test_case.points))
            .sum()
    }
}

/// Full verification configuration of a project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectLayout {
    pub project: project::Model,

    /// Requirements attached to at least one testable, ordered by file name.
    ///
    /// Requirements no testable depends on never take part in verification.
    pub requirements: Vec<file_requirement::Model>,

    /// Testables ordered by name.
    pub testables: Vec<TestableLayout>,
}

impl ProjectLayout {
    /// Total points of every test case of the project.
    pub fn points_possible(&self) -> i64 {
        self.testables.iter().map(TestableLayout::points).sum()
    }

    /// Find testable layout by its identifier.
    pub fn testable(&self, testable_id: i64) -> Option<&TestableLayout> {
        self.testables
            .iter()
            .find(|layout| layout.testable.id == testable_id)
    }
}

/// Load project verification configuration.
///
/// Returns [`None`] if there is no project with the provided identifier.
pub async fn load<C: ConnectionTrait>(
    db: &C,
    project_id: i64,
) -> Result<Option<ProjectLayout>, DbErr> {
    let Some(project) = project::Entity::find_by_id(project_id).one(db).await? else {
        return Ok(None);
    };

    let testables = testable::Entity::find()
        .filter(testable::Column::ProjectId.eq(project_id))
        .order_by_asc(testable::Column::Name)
        .order_by_asc(testable::Column::Id)
        .all(db)
        .await?;

    let testable_ids = testables.iter().map(|testable| testable.id).collect_vec();

    let links = testable_file_requirement::Entity::find()
        .filter(testable_file_requirement::Column::TestableId.is_in(testable_ids.clone()))
        .all(db)
        .await?;

    let requirements = file_requirement::Entity::find()
        .filter(
            file_requirement::Column::Id.is_in(
                links
                    .iter()
                    .map(|link| link.file_requirement_id)
                    .unique()
                    .collect_vec(),
            ),
        )
        .order_by_asc(file_requirement::Column::Filename)
        .all(db)
        .await?;

    let mut test_cases = test_case::Entity::find()
        .filter(test_case::Column::TestableId.is_in(testable_ids))
        .order_by_asc(test_case::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .into_group_map_by(|test_case| test_case.testable_id);

    let requirements_by_id = requirements
        .iter()
        .map(|requirement| (requirement.id, requirement))
        .collect::<BTreeMap<_, _>>();

    let mut requirement_ids = links
        .into_iter()
        .into_group_map_by(|link| link.testable_id);

    let testables = testables
        .into_iter()
        .map(|testable| {
            let requirements = requirement_ids
                .remove(&testable.id)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|link| requirements_by_id.get(&link.file_requirement_id))
                .map(|requirement| (*requirement).clone())
                .sorted_by(|a, b| a.filename.cmp(&b.filename))
                .collect();

            TestableLayout {
                test_cases: test_cases.remove(&testable.id).unwrap_or_default(),
                requirements,
                testable,
            }
        })
        .collect();

    Ok(Some(ProjectLayout {
        project,
        requirements,
        testables,
    }))
}

/// Total points of every test case of the project.
pub async fn points_possible<C: ConnectionTrait>(db: &C, project_id: i64) -> Result<i64, DbErr> {
    Ok(load(db, project_id)
        .await?
        .map(|layout| layout.points_possible())
        .unwrap_or_default())
}

/// List every class, ordered by name.
pub async fn classes<C: ConnectionTrait>(db: &C) -> Result<Vec<class::Model>, DbErr> {
    class::Entity::find()
        .order_by_asc(class::Column::Name)
        .all(db)
        .await
}
