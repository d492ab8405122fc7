//! Verification report.
//!
//! A report captures the outcome of matching a submission against its
//! project requirements: validation errors, warning pattern matches,
//! extra files and testables blocked by missing files. Reports are
//! immutable once assembled and are persisted alongside the submission
//! in a deterministic serialized form, so that verifying unchanged
//! inputs twice produces identical bytes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{matcher::MatchOutcome, matcher::Warning, resolver::Resolution};

/// Warnings and errors of a single file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FileIssues {
    pub warnings: Vec<Warning>,
    pub errors: Vec<String>,
}

impl FileIssues {
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

/// Persisted outcome of a submission verification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    errors: BTreeMap<String, Vec<String>>,
    warnings: BTreeMap<String, Vec<Warning>>,
    extra_filenames: BTreeSet<String>,
    #[serde(with = "missing_entries")]
    missing: BTreeMap<BTreeSet<String>, BTreeSet<i64>>,
}

impl VerificationReport {
    /// Assemble report from matcher and resolver outcomes.
    pub fn assemble(outcome: MatchOutcome, resolution: &Resolution) -> Self {
        Self {
            errors: outcome.errors,
            warnings: outcome.warnings,
            extra_filenames: outcome.extra,
            missing: resolution.missing.clone(),
        }
    }

    /// Validation errors by file name.
    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    /// Warning pattern matches by file name.
    pub fn warnings(&self) -> &BTreeMap<String, Vec<Warning>> {
        &self.warnings
    }

    /// Submitted file names that no requirement claimed.
    pub fn extra_filenames(&self) -> &BTreeSet<String> {
        &self.extra_filenames
    }

    /// Blocked testable identifiers, grouped by the file names they miss.
    pub fn missing(&self) -> &BTreeMap<BTreeSet<String>, BTreeSet<i64>> {
        &self.missing
    }

    /// Identifiers of every testable blocked by missing files.
    pub fn missing_testable_ids(&self) -> BTreeSet<i64> {
        self.missing.values().flatten().copied().collect()
    }

    /// File names missed by the provided testable.
    ///
    /// Returns [`None`] if the testable is not blocked.
    pub fn missing_filenames(&self, testable_id: i64) -> Option<&BTreeSet<String>> {
        self.missing
            .iter()
            .find(|(_, testables)| testables.contains(&testable_id))
            .map(|(filenames, _)| filenames)
    }

    /// Warnings and errors merged by file name.
    pub fn issues(&self) -> BTreeMap<String, FileIssues> {
        let mut issues = BTreeMap::<String, FileIssues>::new();

        for (filename, warnings) in &self.warnings {
            issues.entry(filename.clone()).or_default().warnings = warnings.clone();
        }

        for (filename, errors) in &self.errors {
            issues.entry(filename.clone()).or_default().errors = errors.clone();
        }

        issues
    }

    /// Serialize the report into its persisted form.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize the report from its persisted form.
    pub fn decode(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

/// JSON objects only allow string keys, so missing entries are
/// stored as a list of pairs instead.
mod missing_entries {
    use std::collections::{BTreeMap, BTreeSet};

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct EntryRef<'a> {
        filenames: &'a BTreeSet<String>,
        testables: &'a BTreeSet<i64>,
    }

    #[derive(Deserialize)]
    struct Entry {
        filenames: BTreeSet<String>,
        testables: BTreeSet<i64>,
    }

    pub fn serialize<S: Serializer>(
        missing: &BTreeMap<BTreeSet<String>, BTreeSet<i64>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            missing
                .iter()
                .map(|(filenames, testables)| EntryRef { filenames, testables }),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<BTreeSet<String>, BTreeSet<i64>>, D::Error> {
        Ok(Vec::<Entry>::deserialize(deserializer)?
            .into_iter()
            .map(|entry| (entry.filenames, entry.testables))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, HashMap};

    use super::{FileIssues, VerificationReport};
    use crate::{
        matcher::{
            match_files,
            tests::{file, requirement},
            Warning,
        },
        resolver::{resolve, tests::layout},
    };

    fn report() -> VerificationReport {
        let main = requirement(1, "main.c");
        let util = db::file_requirement::Model {
            min_size: 100,
            warning_regex: Some(String::from("goto")),
            ..requirement(2, "util.c")
        };
        let header = db::file_requirement::Model {
            warning_regex: Some(String::from("goto")),
            ..requirement(3, "util.h")
        };

        let header_data = b"goto\n".to_vec();
        let header_file = file(2, &header_data);
        let files = BTreeMap::from([
            (String::from("util.c"), file(1, b"short")),
            (String::from("util.h"), header_file.clone()),
            (String::from("notes.txt"), file(3, b"notes")),
        ]);
        let contents = HashMap::from([(header_file.hash, header_data)]);

        let requirements = [main.clone(), util.clone(), header.clone()];
        let testables = [
            layout(1, "first", &[main.clone()]),
            layout(2, "second", &[main, header]),
            layout(3, "third", &[util]),
        ];

        let outcome = match_files(&requirements, &files, &contents);
        let resolution = resolve(&testables, &outcome.satisfied);

        VerificationReport::assemble(outcome, &resolution)
    }

    #[test]
    fn assembled_report() {
        let report = report();

        assert_eq!(report.errors()["main.c"], vec!["file missing"]);
        assert_eq!(report.errors()["util.c"], vec!["must be >= 100 bytes"]);
        assert_eq!(
            report.extra_filenames(),
            &BTreeSet::from([String::from("notes.txt")])
        );
        assert_eq!(report.missing_testable_ids(), BTreeSet::from([1, 2, 3]));
        assert_eq!(
            report.missing_filenames(2),
            Some(&BTreeSet::from([String::from("main.c")]))
        );
        assert_eq!(
            report.missing_filenames(3),
            Some(&BTreeSet::from([String::from("util.c")]))
        );
        assert_eq!(report.missing_filenames(4), None);
    }

    #[test]
    fn merged_issues() {
        let issues = report().issues();

        assert_eq!(
            issues["util.h"],
            FileIssues {
                warnings: vec![Warning {
                    line: 1,
                    token: String::from("goto"),
                }],
                errors: Vec::new(),
            }
        );
        assert_eq!(issues["main.c"].errors, vec!["file missing"]);
        assert!(issues["main.c"].warnings.is_empty());
        assert!(!issues.contains_key("notes.txt"));
    }

    #[test]
    fn persisted_form_is_deterministic() {
        let first = report().encode().expect("unable to encode report");
        let second = report().encode().expect("unable to encode report");

        assert_eq!(first, second);
        assert_eq!(
            VerificationReport::decode(&first).expect("unable to decode report"),
            report()
        );
    }

    #[test]
    fn empty_report() {
        let report = VerificationReport::default();

        assert!(report.issues().is_empty());
        assert!(report.missing_testable_ids().is_empty());
    }
}
