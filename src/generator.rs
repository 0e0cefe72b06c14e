//! Mutant generation: walk the candidate lines of one source file, filter
//! through the eligibility rules and scoping constraints, and emit one
//! mutant per firing operator (or per line, in one-mutant mode).

use std::path::{Path, PathBuf};

use crate::TargetKind;
use crate::eligibility::{self, LineScope};
use crate::error::{Error, Result};
use crate::operators::{OperatorClass, operator_set};
use crate::output;
use crate::store::{self, Mutant, MutationBatch};

pub struct GenerateOptions {
    /// Change-set identifier folded into the batch directory name so
    /// concurrent generations for different contexts never collide.
    pub change_set: Option<u64>,
    /// One mutant per line, with operator and candidate order shuffled so a
    /// capped run samples the file instead of taking a prefix.
    pub one_mutant: bool,
    /// Restrict to the security-relevant rule set. Script and unit-test
    /// targets always use the test-oriented set regardless.
    pub security_only: bool,
    /// Where batch directories are created.
    pub base_dir: PathBuf,
}

/// Generate the mutation batch for one source file. `candidate_lines`
/// defaults to every line of the file; all line numbers are 1-based.
/// Any read or write failure aborts the whole generation for this file.
pub fn generate(
    source_file: &Path,
    candidate_lines: Option<Vec<usize>>,
    scope: &LineScope,
    opts: &GenerateOptions,
    rng: &mut fastrand::Rng,
) -> Result<MutationBatch> {
    output::print_info(&format!("Generating mutants for {}...", source_file.display()));

    let source = std::fs::read_to_string(source_file).map_err(|e| Error::SourceAccess {
        path: source_file.to_path_buf(),
        source: e,
    })?;
    // Raw segments keep each line's own terminator so CRLF sources come
    // back out byte-for-byte except for the one mutated line.
    let segments: Vec<&str> = source.split_inclusive('\n').collect();

    let kind = crate::classify_target(&source_file.to_string_lossy());
    let class = match kind {
        TargetKind::Script | TargetKind::UnitTest => OperatorClass::Test,
        TargetKind::Source if opts.security_only => OperatorClass::Security,
        TargetKind::Source => OperatorClass::General,
    };

    let mut ops = operator_set(class);
    let mut candidates: Vec<usize> =
        candidate_lines.unwrap_or_else(|| (1..=segments.len()).collect());
    if opts.one_mutant {
        rng.shuffle(&mut ops);
        rng.shuffle(&mut candidates);
    }

    let dir = opts.base_dir.join(store::batch_dir_name(source_file, opts.change_set));
    let mut mutants: Vec<Mutant> = Vec::new();

    for line_no in candidates {
        if line_no == 0 || line_no > segments.len() {
            continue;
        }
        if !scope.permits(line_no) {
            continue;
        }
        let raw = segments[line_no - 1];
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let terminator = &raw[line.len()..];
        if !eligibility::line_is_eligible(line, kind) {
            continue;
        }
        let stripped = line.trim_start();
        let indent = &line[..line.len() - stripped.len()];

        for op in &ops {
            if !op.matches(stripped) {
                continue;
            }
            let mut content = String::with_capacity(source.len());
            content.push_str(&segments[..line_no - 1].concat());
            content.push_str(indent);
            content.push_str(&op.apply(stripped));
            content.push_str(terminator);
            content.push_str(&segments[line_no..].concat());

            let mutant = Mutant {
                id: mutants.len(),
                source_file: source_file.to_path_buf(),
                line_number: line_no,
                content,
                operator_class: class.to_string(),
            };
            // Storage appears lazily with the first mutant.
            store::init_batch_dir(&dir, source_file)?;
            store::write_mutant(&dir, &mutant)?;
            mutants.push(mutant);

            if opts.one_mutant {
                break;
            }
        }
    }

    output::print_info(&format!("Generated {} mutants...", mutants.len()));
    Ok(MutationBatch {
        original_file: source_file.to_path_buf(),
        mutants,
        storage_dir: dir,
    })
}
