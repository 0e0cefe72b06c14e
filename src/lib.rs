pub mod changes;
pub mod coverage;
pub mod eligibility;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod killcmd;
pub mod operators;
pub mod output;
pub mod report;
pub mod skiplist;
pub mod store;

pub use error::{Error, Result};

/// How a target file participates in the build/test system, judged from its
/// path shape alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Python functional test or tooling script.
    Script,
    /// Native unit-test translation unit.
    UnitTest,
    /// Ordinary production source.
    Source,
}

pub fn classify_target(path: &str) -> TargetKind {
    if path.ends_with(".py") {
        return TargetKind::Script;
    }
    if path.contains("test") && !path.contains("util") {
        return TargetKind::UnitTest;
    }
    TargetKind::Source
}
