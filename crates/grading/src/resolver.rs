//! Partitioning of testables into buildable ones and ones blocked by missing files.

use std::collections::{BTreeMap, BTreeSet};

use db::testable;

use crate::project::TestableLayout;

/// Outcome of resolving testables against satisfied file names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Testables whose non-optional requirements are all satisfied.
    pub buildable: Vec<&'a testable::Model>,

    /// Blocked testable identifiers, grouped by the set of file names they miss.
    pub missing: BTreeMap<BTreeSet<String>, BTreeSet<i64>>,
}

/// Resolve testables against the set of file names that satisfy their requirements.
///
/// Testables that miss the exact same set of non-optional files share
/// a single `missing` entry. Buildable testables keep their input order.
/// Testables without any requirement are neither buildable nor missing.
pub fn resolve<'a>(testables: &'a [TestableLayout], satisfied: &BTreeSet<String>) -> Resolution<'a> {
    let mut resolution = Resolution::default();

    for layout in testables {
        let missing = layout
            .requirements
            .iter()
            .filter(|requirement| !requirement.optional)
            .filter(|requirement| !satisfied.contains(&requirement.filename))
            .map(|requirement| requirement.filename.clone())
            .collect::<BTreeSet<_>>();

        if !missing.is_empty() {
            resolution
                .missing
                .entry(missing)
                .or_default()
                .insert(layout.testable.id);
        } else if !layout.requirements.is_empty() {
            resolution.buildable.push(&layout.testable);
        }
    }

    resolution
}
