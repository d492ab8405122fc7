//! Matching of submitted files against project file requirements.
//!
//! Every requirement looks up its file name in the submitted file mapping.
//! Found files are validated against the requirement bounds and, if they pass,
//! scanned for warning pattern matches. Found files are always consumed, whether
//! they pass validation or not, and whatever remains in the mapping afterwards
//! is reported as extra files.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use db::{file, file_requirement};
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Error recorded for a non-optional requirement without a submitted file.
pub const FILE_MISSING: &str = "file missing";

/// A single warning pattern match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Line number, starting at 1.
    pub line: usize,

    /// Matched token.
    pub token: String,
}

/// Result of matching submitted files against requirements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Validation errors by file name.
    pub errors: BTreeMap<String, Vec<String>>,

    /// Warning pattern matches by file name.
    pub warnings: BTreeMap<String, Vec<Warning>>,

    /// Submitted files not claimed by any requirement.
    pub extra: BTreeSet<String>,

    /// Files that satisfy their requirements.
    pub satisfied: BTreeSet<String>,
}

/// Validate file metadata against the requirement bounds.
///
/// Size is checked before the line count, and each violated dimension
/// contributes at most one error.
pub fn bounds_errors(requirement: &file_requirement::Model, file: &file::Model) -> Vec<String> {
    let mut errors = Vec::new();

    if file.size < requirement.min_size {
        errors.push(format!("must be >= {} bytes", requirement.min_size));
    } else if let Some(max_size) = requirement.max_size.filter(|&max| file.size > max) {
        errors.push(format!("must be <= {} bytes", max_size));
    }

    if file.lines < requirement.min_lines {
        errors.push(format!("must be >= {} lines", requirement.min_lines));
    } else if let Some(max_lines) = requirement.max_lines.filter(|&max| file.lines > max) {
        errors.push(format!("must be <= {} lines", max_lines));
    }

    errors
}

/// Whether matching the requirement needs the file bytes.
///
/// Contents are only scanned for warnings once the file passed validation.
pub fn needs_content(requirement: &file_requirement::Model, file: &file::Model) -> bool {
    requirement.warning_regex.is_some() && bounds_errors(requirement, file).is_empty()
}

/// Collect every pattern match of every line of the provided data.
///
/// Patterns with a single capture group report the captured text as the token,
/// any other pattern reports the whole match.
pub fn scan_warnings(pattern: &Regex, data: &[u8]) -> Vec<Warning> {
    let single_group = pattern.captures_len() == 2;

    data.split_inclusive(|&byte| byte == b'\n')
        .enumerate()
        .flat_map(|(index, line)| {
            let line = line.strip_suffix(b"\n").unwrap_or(line);

            pattern.captures_iter(line).map(move |captures| {
                let token = if single_group {
                    captures.get(1)
                } else {
                    captures.get(0)
                }
                .map(|token| String::from_utf8_lossy(token.as_bytes()).into_owned())
                .unwrap_or_default();

                Warning {
                    line: index + 1,
                    token,
                }
            })
        })
        .collect()
}

/// Match submitted files against the provided requirements.
///
/// `contents` maps content hashes to file bytes and must contain every file
/// for which [`needs_content`] holds. Requirements sharing an identifier
/// are only processed once.
pub fn match_files(
    requirements: &[file_requirement::Model],
    files: &BTreeMap<String, file::Model>,
    contents: &HashMap<String, Vec<u8>>,
) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();
    let mut remaining = files.iter().collect::<BTreeMap<_, _>>();
    let mut seen = BTreeSet::new();

    for requirement in requirements {
        if !seen.insert(requirement.id) {
            continue;
        }

        let Some(file) = remaining.remove(&requirement.filename) else {
            if !requirement.optional {
                outcome
                    .errors
                    .insert(requirement.filename.clone(), vec![String::from(FILE_MISSING)]);
            }

            continue;
        };

        let errors = bounds_errors(requirement, file);

        if !errors.is_empty() {
            outcome.errors.insert(requirement.filename.clone(), errors);
            continue;
        }

        outcome.satisfied.insert(requirement.filename.clone());

        let Some(pattern) = requirement.warning_regex.as_deref() else {
            continue;
        };

        let pattern = match Regex::new(pattern) {
            Ok(pattern) => pattern,
            Err(err) => {
                warn!(requirement_id = requirement.id, %err, "invalid warning pattern");
                continue;
            }
        };

        if let Some(data) = contents.get(&file.hash) {
            let warnings = scan_warnings(&pattern, data);

            if !warnings.is_empty() {
                outcome
                    .warnings
                    .insert(requirement.filename.clone(), warnings);
            }
        }
    }

    outcome.extra = remaining.into_keys().cloned().collect();

    outcome
}
