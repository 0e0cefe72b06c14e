use std::path::Path;

use mutation_core::Error;
use mutation_core::store::{self, Mutant, batch_dir_name, load_batch, mutant_file_name};
use tempfile::TempDir;

// --- naming ---

#[test]
fn batch_dir_name_includes_stem_and_extension() {
    assert_eq!(
        batch_dir_name(Path::new("src/net_processing.cpp"), None),
        "muts-net_processing-cpp"
    );
    assert_eq!(
        batch_dir_name(Path::new("test/functional/feature_addrman.py"), Some(99)),
        "muts-pr-99-feature_addrman-py"
    );
}

#[test]
fn batches_for_different_files_never_collide() {
    assert_ne!(
        batch_dir_name(Path::new("src/a.cpp"), None),
        batch_dir_name(Path::new("src/b.cpp"), None)
    );
    assert_ne!(
        batch_dir_name(Path::new("src/a.cpp"), None),
        batch_dir_name(Path::new("src/a.h"), None)
    );
}

#[test]
fn mutant_file_name_embeds_the_id() {
    assert_eq!(
        mutant_file_name(Path::new("src/validation.cpp"), 12),
        "validation.mutant.12.cpp"
    );
}

// --- round trip ---

fn write_batch(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let original = root.join("calc.cpp");
    std::fs::write(&original, "int f() {\n    return 1 + 2;\n}\n").unwrap();

    let dir = root.join(batch_dir_name(&original, None));
    store::init_batch_dir(&dir, &original).unwrap();
    for (id, content) in [
        (0, "int f() {\n    return 1 - 2;\n}\n"),
        (1, "int f() {\n    return 1 * 2;\n}\n"),
    ] {
        let mutant = Mutant {
            id,
            source_file: original.clone(),
            line_number: 2,
            content: content.to_string(),
            operator_class: "general".to_string(),
        };
        store::write_mutant(&dir, &mutant).unwrap();
    }
    (original, dir)
}

#[test]
fn load_batch_reads_marker_and_artifacts() {
    let root = TempDir::new().unwrap();
    let (original, dir) = write_batch(root.path());

    let batch = load_batch(&dir).unwrap();
    assert_eq!(batch.original_file, original);
    assert_eq!(batch.mutants.len(), 2);
    assert_eq!(batch.mutants[0].line_number, 2);
}

#[test]
fn load_batch_orders_mutants_by_id() {
    let root = TempDir::new().unwrap();
    let (_, dir) = write_batch(root.path());

    let batch = load_batch(&dir).unwrap();
    let ids: Vec<usize> = batch.mutants.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn load_batch_ignores_the_marker_file_itself() {
    let root = TempDir::new().unwrap();
    let (_, dir) = write_batch(root.path());

    let batch = load_batch(&dir).unwrap();
    assert!(
        batch
            .mutants
            .iter()
            .all(|m| !m.content.contains("calc.cpp")),
        "marker content leaked into the mutant list"
    );
}

// --- failure semantics ---

#[test]
fn empty_batch_is_a_distinct_error() {
    let root = TempDir::new().unwrap();
    let original = root.path().join("calc.cpp");
    std::fs::write(&original, "int f();\n").unwrap();

    let dir = root.path().join("muts-calc-cpp");
    store::init_batch_dir(&dir, &original).unwrap();

    match load_batch(&dir) {
        Err(Error::EmptyBatch(path)) => assert_eq!(path, dir),
        other => panic!("expected EmptyBatch, got {other:?}"),
    }
}

#[test]
fn directory_without_marker_is_not_just_empty() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("muts-mystery-cpp");
    std::fs::create_dir(&dir).unwrap();

    match load_batch(&dir) {
        Err(Error::BatchMarker(path)) => assert_eq!(path, dir),
        other => panic!("expected BatchMarker, got {other:?}"),
    }
}

#[test]
fn missing_original_file_fails_loading() {
    let root = TempDir::new().unwrap();
    let (original, dir) = write_batch(root.path());
    std::fs::remove_file(&original).unwrap();
    assert!(matches!(
        load_batch(&dir),
        Err(Error::SourceAccess { .. })
    ));
}

// --- discovery ---

#[test]
fn find_batch_dirs_locates_nested_batches() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("work/muts-a-cpp")).unwrap();
    std::fs::create_dir_all(root.path().join("muts-b-py")).unwrap();
    std::fs::create_dir_all(root.path().join("work/other")).unwrap();

    let found = store::find_batch_dirs(root.path());
    assert_eq!(found.len(), 2);
    assert!(found.iter().any(|p| p.ends_with("muts-a-cpp")));
    assert!(found.iter().any(|p| p.ends_with("muts-b-py")));
}
