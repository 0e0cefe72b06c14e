//! Survivor reporting: a diff per surviving mutant, grouped by an anchor
//! line derived from the diff's hunk header, persisted either as a growing
//! accumulated document or one JSON file per mutated source file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;
use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::error::Result;
use crate::evaluator::{EvaluationResult, FileSlot};
use crate::store::MutationBatch;

/// Leading context lines in a unified hunk; anchoring past them points at
/// the changed region instead of the hunk boundary.
const ANCHOR_OFFSET: usize = 3;

/// Fixed location of the accumulated document.
pub const ACCUMULATED_REPORT_FILE: &str = "mutation-reports.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivorDiff {
    pub id: String,
    pub commit: String,
    pub diff: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivorReport {
    pub filename: String,
    pub mutation_score: f64,
    pub date: String,
    /// Anchor line → the surviving diffs near that line.
    pub diffs: BTreeMap<usize, Vec<SurvivorDiff>>,
}

/// How a compiled report is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Merge into the growing array at the fixed location.
    Accumulate,
    /// Fresh file named after the mutated source file.
    PerFile,
}

pub fn unified_diff(original: &str, mutated: &str) -> String {
    TextDiff::from_lines(original, mutated)
        .unified_diff()
        .context_radius(3)
        .to_string()
}

/// Anchor line for a unified diff: the new-file start of its first hunk
/// plus a small offset into the changed region.
pub fn diff_anchor(diff: &str) -> Option<usize> {
    for line in diff.lines() {
        let Some(rest) = line.strip_prefix("@@") else {
            continue;
        };
        let plus = rest.split_whitespace().find(|p| p.starts_with('+'))?;
        let start: usize = plus[1..].split(',').next()?.parse().ok()?;
        return Some(start + ANCHOR_OFFSET);
    }
    None
}

/// Current repository head, best-effort. No repository is not fatal; the
/// field is simply left empty.
pub fn head_commit() -> String {
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default()
}

/// Build the survivor report for one evaluated batch. A batch with zero
/// survivors produces no artifact at all: survivors are the only thing
/// worth reporting.
pub fn compile(
    batch: &MutationBatch,
    result: &EvaluationResult,
    slot: &FileSlot,
) -> Result<Option<SurvivorReport>> {
    let surviving = result.surviving();
    if surviving.is_empty() {
        return Ok(None);
    }

    // Diffs must run against the pristine original; restore is idempotent.
    slot.restore()?;
    let commit = head_commit();

    let mut diffs: BTreeMap<usize, Vec<SurvivorDiff>> = BTreeMap::new();
    for mutant in batch.mutants.iter().filter(|m| surviving.contains(&m.id)) {
        let diff = unified_diff(slot.pristine(), &mutant.content);
        let anchor = diff_anchor(&diff).unwrap_or(mutant.line_number);
        let status = if result.timed_out.contains(&mutant.id) {
            "timed_out"
        } else {
            "survived"
        };
        let bucket = diffs.entry(anchor).or_default();
        bucket.push(SurvivorDiff {
            id: format!("m{}", bucket.len()),
            commit: commit.clone(),
            diff,
            status: status.to_string(),
        });
    }

    Ok(Some(SurvivorReport {
        filename: batch.original_file.display().to_string(),
        mutation_score: result.score(),
        date: Local::now().format("%d/%m/%Y %H:%M:%S").to_string(),
        diffs,
    }))
}

/// Pure merge for accumulate mode: this run's report joins the existing
/// ordered sequence.
pub fn merge_reports(
    mut existing: Vec<SurvivorReport>,
    report: SurvivorReport,
) -> Vec<SurvivorReport> {
    existing.push(report);
    existing
}

/// Per-file report name, flattened so reports for different source files
/// never collide: separators become dashes, the extension is dropped.
pub fn per_file_report_name(original_file: &Path) -> String {
    let mut flat = original_file.to_string_lossy().replace(['/', '\\'], "-");
    if let Some(ext) = original_file.extension() {
        let suffix = format!(".{}", ext.to_string_lossy());
        if let Some(trimmed) = flat.strip_suffix(&suffix) {
            flat = trimmed.to_string();
        }
    }
    format!("diff_not_killed-{flat}.json")
}

/// Persist a compiled report under `out_dir`, returning the written path.
pub fn persist(report: &SurvivorReport, mode: ReportMode, out_dir: &Path) -> Result<PathBuf> {
    match mode {
        ReportMode::Accumulate => {
            let path = out_dir.join(ACCUMULATED_REPORT_FILE);
            let existing: Vec<SurvivorReport> = match std::fs::read_to_string(&path) {
                Ok(data) => serde_json::from_str(&data)?,
                Err(_) => Vec::new(),
            };
            let merged = merge_reports(existing, report.clone());
            std::fs::write(&path, serde_json::to_string_pretty(&merged)?)?;
            Ok(path)
        }
        ReportMode::PerFile => {
            let path = out_dir.join(per_file_report_name(Path::new(&report.filename)));
            std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
            Ok(path)
        }
    }
}
