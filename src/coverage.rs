//! Coverage collaborator: an LCOV tracefile parsed into the set of lines
//! with at least one recorded hit, per source file.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::{Error, Result};

pub type CoverageMap = HashMap<String, BTreeSet<usize>>;

/// Parse an LCOV tracefile. `SF:` opens a file scope; `DA:line,hits`
/// records a line when hits is non-zero. A missing tracefile is its own
/// error so callers can tell it apart from an empty one.
pub fn parse_coverage_file(path: &Path) -> Result<CoverageMap> {
    if !path.exists() {
        return Err(Error::CoverageMissing(path.to_path_buf()));
    }
    let data = std::fs::read_to_string(path)?;

    let mut coverage = CoverageMap::new();
    let mut current: Option<String> = None;
    for line in data.lines() {
        let line = line.trim();
        if let Some(file) = line.strip_prefix("SF:") {
            coverage.entry(file.to_string()).or_default();
            current = Some(file.to_string());
        } else if let Some(record) = line.strip_prefix("DA:") {
            let Some(file) = &current else {
                continue;
            };
            let mut fields = record.split(',');
            let (Some(Ok(line_no)), Some(Ok(hits))) = (
                fields.next().map(str::parse::<usize>),
                fields.next().map(str::parse::<usize>),
            ) else {
                continue;
            };
            if hits > 0 {
                if let Some(set) = coverage.get_mut(file) {
                    set.insert(line_no);
                }
            }
        }
    }
    Ok(coverage)
}

/// Exercised lines for one target file. Tracefiles record absolute paths,
/// so the target is matched as a path suffix.
pub fn lines_for_file<'a>(coverage: &'a CoverageMap, file: &str) -> Option<&'a BTreeSet<usize>> {
    coverage
        .iter()
        .find(|(recorded, _)| recorded.contains(file))
        .map(|(_, lines)| lines)
}

/// Coverage constraint for one target file: `None` when no tracefile was
/// supplied at all, the empty set when the tracefile has no record of the
/// file. An uncovered file under coverage scoping must yield no mutants,
/// never an unconstrained walk.
pub fn constraint_for_file(
    coverage: Option<&CoverageMap>,
    file: &str,
) -> Option<BTreeSet<usize>> {
    coverage.map(|map| lines_for_file(map, file).cloned().unwrap_or_default())
}
