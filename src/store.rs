//! On-disk batch format: one directory per (file, change-set) pairing with a
//! marker file pointing back at the mutated path and one artifact file per
//! mutant.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// First line of this file is the path of the file being mutated; the
/// evaluator restores that path when the batch is consumed.
pub const MARKER_FILE: &str = "original_file.txt";

/// Prefix shared by all batch directories, used for discovery.
pub const BATCH_DIR_PREFIX: &str = "muts";

/// A copy of the target file with exactly one line altered. Immutable after
/// generation; consumed once by the evaluator.
#[derive(Debug, Clone)]
pub struct Mutant {
    pub id: usize,
    pub source_file: PathBuf,
    /// 1-based number of the altered line.
    pub line_number: usize,
    /// Full mutated file text.
    pub content: String,
    pub operator_class: String,
}

/// The persisted set of mutants for one source file, plus the pointer back
/// to the live path the evaluator must mutate and restore.
#[derive(Debug)]
pub struct MutationBatch {
    pub original_file: PathBuf,
    pub mutants: Vec<Mutant>,
    pub storage_dir: PathBuf,
}

fn stem_and_ext(source_file: &Path) -> (String, String) {
    let stem = source_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source_file
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (stem, ext)
}

/// Batch directory name. The stem and extension keep concurrently generated
/// batches for different files from colliding.
pub fn batch_dir_name(source_file: &Path, change_set: Option<u64>) -> String {
    let (stem, ext) = stem_and_ext(source_file);
    match change_set {
        Some(n) => format!("{BATCH_DIR_PREFIX}-pr-{n}-{stem}-{ext}"),
        None => format!("{BATCH_DIR_PREFIX}-{stem}-{ext}"),
    }
}

pub fn mutant_file_name(source_file: &Path, id: usize) -> String {
    let (stem, ext) = stem_and_ext(source_file);
    if ext.is_empty() {
        format!("{stem}.mutant.{id}")
    } else {
        format!("{stem}.mutant.{id}.{ext}")
    }
}

/// Create the batch directory and marker on first use; later calls are
/// no-ops so generation can initialize lazily per mutant.
pub fn init_batch_dir(dir: &Path, source_file: &Path) -> Result<()> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(MARKER_FILE), format!("{}\n", source_file.display()))?;
    }
    Ok(())
}

pub fn write_mutant(dir: &Path, mutant: &Mutant) -> Result<PathBuf> {
    let path = dir.join(mutant_file_name(&mutant.source_file, mutant.id));
    fs::write(&path, &mutant.content)?;
    Ok(path)
}

fn parse_mutant_id(file_name: &str) -> Option<usize> {
    let rest = file_name.split_once(".mutant.")?.1;
    rest.split('.').next()?.parse().ok()
}

/// First line (1-based) where `content` differs from `original`, which for a
/// well-formed mutant is the single altered line.
fn first_differing_line(original: &str, content: &str) -> usize {
    original
        .lines()
        .zip(content.lines())
        .position(|(a, b)| a != b)
        .map(|idx| idx + 1)
        .unwrap_or(0)
}

/// Read a batch back from its directory. Artifacts are ordered by mutant id
/// so evaluation order is deterministic regardless of directory listing
/// order. An empty batch is a distinct fatal error, not an empty result.
pub fn load_batch(dir: &Path) -> Result<MutationBatch> {
    let marker = fs::read_to_string(dir.join(MARKER_FILE))
        .map_err(|_| Error::BatchMarker(dir.to_path_buf()))?;
    let original_file = PathBuf::from(marker.lines().next().unwrap_or("").trim());
    let original = fs::read_to_string(&original_file).map_err(|e| Error::SourceAccess {
        path: original_file.clone(),
        source: e,
    })?;

    let mut mutants = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(id) = parse_mutant_id(&name) else {
            continue;
        };
        let content = fs::read_to_string(entry.path())?;
        let line_number = first_differing_line(&original, &content);
        mutants.push(Mutant {
            id,
            source_file: original_file.clone(),
            line_number,
            content,
            operator_class: String::new(),
        });
    }
    if mutants.is_empty() {
        return Err(Error::EmptyBatch(dir.to_path_buf()));
    }
    mutants.sort_by_key(|m| m.id);

    Ok(MutationBatch {
        original_file,
        mutants,
        storage_dir: dir.to_path_buf(),
    })
}

/// Find every batch directory under `root`, for analysis runs that do not
/// name a folder explicitly.
pub fn find_batch_dirs(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(BATCH_DIR_PREFIX) {
                found.push(path);
            } else {
                stack.push(path);
            }
        }
    }
    found.sort();
    found
}
