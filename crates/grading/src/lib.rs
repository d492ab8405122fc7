//! Submission verification and grading status engine.
//!
//! The engine matches submitted files against project file requirements
//! ([`matcher`]), selects the testables that can be built ([`resolver`])
//! and persists the outcome as a [`VerificationReport`] ([`verify`]).
//! Build and test case outcomes reported later by the external harness
//! ([`harness`], [`results`]) are merged with the report into a status
//! per testable ([`status`]), which is disclosed to viewers according to
//! the project delay policy ([`disclosure`]).

pub mod disclosure;
pub mod files;
pub mod harness;
pub mod matcher;
pub mod project;
pub mod report;
pub mod resolver;
pub mod results;
pub mod status;
pub mod submissions;
pub mod verify;

#[cfg(test)]
mod testing;

pub use disclosure::{disclosure_delay_minutes, Disclosure};
pub use report::VerificationReport;
pub use status::status;
pub use verify::verify;
