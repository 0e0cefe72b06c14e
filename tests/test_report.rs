use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use mutation_core::evaluator::{self, EvalOptions, FileSlot};
use mutation_core::report::{
    self, ReportMode, SurvivorReport, diff_anchor, merge_reports, per_file_report_name,
    unified_diff,
};
use mutation_core::store::{Mutant, MutationBatch};
use tempfile::TempDir;

const ORIGINAL: &str = "\
int clamp(int v)\n\
{\n\
    if (v > 100) {\n\
        return 100;\n\
    }\n\
    return v;\n\
}\n";

fn make_batch(root: &Path) -> (MutationBatch, FileSlot) {
    let original = root.join("clamp.cpp");
    std::fs::write(&original, ORIGINAL).unwrap();

    let mutants = vec![
        Mutant {
            id: 0,
            source_file: original.clone(),
            line_number: 3,
            content: ORIGINAL.replace("v > 100", "v >= 100"),
            operator_class: "general".to_string(),
        },
        Mutant {
            id: 1,
            source_file: original.clone(),
            line_number: 6,
            content: ORIGINAL.replace("return v;", "return 0;"),
            operator_class: "general".to_string(),
        },
    ];
    let slot = FileSlot::acquire(&original).unwrap();
    let batch = MutationBatch {
        original_file: original,
        mutants,
        storage_dir: root.join("muts-clamp-cpp"),
    };
    (batch, slot)
}

fn evaluate_with(batch: &MutationBatch, slot: &FileSlot, command: &str) -> evaluator::EvaluationResult {
    let opts = EvalOptions {
        command: Some(command.to_string()),
        timeout: Duration::from_secs(5),
        survival_threshold: 1.0,
        jobs: 0,
    };
    evaluator::evaluate(batch, slot, &opts).unwrap()
}

// --- diff plumbing ---

#[test]
fn unified_diff_contains_removed_and_added_lines() {
    let diff = unified_diff("a\nb\nc\n", "a\nB\nc\n");
    assert!(diff.contains("-b"), "{diff}");
    assert!(diff.contains("+B"), "{diff}");
}

#[test]
fn diff_anchor_reads_the_first_hunk_header() {
    let diff = "@@ -12,7 +12,7 @@\n context\n-old\n+new\n";
    assert_eq!(diff_anchor(diff), Some(15));
}

#[test]
fn diff_anchor_handles_headers_without_counts() {
    assert_eq!(diff_anchor("@@ -5 +7 @@\n-x\n+y\n"), Some(10));
}

#[test]
fn diff_anchor_ignores_non_header_noise() {
    assert_eq!(diff_anchor("+not a header\nplain\n"), None);
}

// --- compilation ---

#[test]
fn zero_survivors_produce_no_report() {
    let root = TempDir::new().unwrap();
    let (batch, slot) = make_batch(root.path());
    let result = evaluate_with(&batch, &slot, "false");

    let compiled = report::compile(&batch, &result, &slot).unwrap();
    assert!(compiled.is_none());
}

#[test]
fn diff_count_matches_survivor_count() {
    let root = TempDir::new().unwrap();
    let (batch, slot) = make_batch(root.path());
    let result = evaluate_with(&batch, &slot, "true");

    let compiled = report::compile(&batch, &result, &slot).unwrap().unwrap();
    let diff_count: usize = compiled.diffs.values().map(|v| v.len()).sum();
    assert_eq!(diff_count, result.surviving().len());
}

#[test]
fn report_score_comes_from_the_evaluation() {
    let root = TempDir::new().unwrap();
    let (batch, slot) = make_batch(root.path());
    let result = evaluate_with(&batch, &slot, "true");

    let compiled = report::compile(&batch, &result, &slot).unwrap().unwrap();
    assert_eq!(compiled.mutation_score, 0.0);
    assert!(compiled.filename.ends_with("clamp.cpp"));
}

#[test]
fn compile_restores_the_original_before_diffing() {
    let root = TempDir::new().unwrap();
    let (batch, slot) = make_batch(root.path());
    let result = evaluate_with(&batch, &slot, "true");

    // Clobber the live file; compile must diff against the pristine copy.
    std::fs::write(&batch.original_file, "garbage\n").unwrap();
    let compiled = report::compile(&batch, &result, &slot).unwrap().unwrap();

    assert_eq!(
        std::fs::read_to_string(&batch.original_file).unwrap(),
        ORIGINAL
    );
    for bucket in compiled.diffs.values() {
        for entry in bucket {
            assert!(!entry.diff.contains("garbage"));
        }
    }
}

#[test]
fn bucket_ids_increment_within_a_line_bucket() {
    let root = TempDir::new().unwrap();
    let original = root.path().join("clamp.cpp");
    std::fs::write(&original, ORIGINAL).unwrap();

    // Two different mutations of the same line land in the same bucket.
    let mutants = vec![
        Mutant {
            id: 0,
            source_file: original.clone(),
            line_number: 3,
            content: ORIGINAL.replace("v > 100", "v >= 100"),
            operator_class: "general".to_string(),
        },
        Mutant {
            id: 1,
            source_file: original.clone(),
            line_number: 3,
            content: ORIGINAL.replace("v > 100", "v < 100"),
            operator_class: "general".to_string(),
        },
    ];
    let slot = FileSlot::acquire(&original).unwrap();
    let batch = MutationBatch {
        original_file: original,
        mutants,
        storage_dir: root.path().join("muts-clamp-cpp"),
    };
    let result = evaluate_with(&batch, &slot, "true");

    let compiled = report::compile(&batch, &result, &slot).unwrap().unwrap();
    assert_eq!(compiled.diffs.len(), 1);
    let bucket = compiled.diffs.values().next().unwrap();
    let ids: Vec<&str> = bucket.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["m0", "m1"]);
}

#[test]
fn timed_out_survivors_keep_their_own_status() {
    let root = TempDir::new().unwrap();
    let (batch, slot) = make_batch(root.path());
    let mut result = evaluate_with(&batch, &slot, "true");
    // Reclassify one survivor as a timeout.
    result.survived.remove(&1);
    result.timed_out.insert(1);

    let compiled = report::compile(&batch, &result, &slot).unwrap().unwrap();
    let statuses: BTreeSet<String> = compiled
        .diffs
        .values()
        .flatten()
        .map(|d| d.status.clone())
        .collect();
    assert_eq!(statuses, BTreeSet::from(["survived".into(), "timed_out".into()]));
}

// --- persistence strategies ---

fn sample_report(name: &str) -> SurvivorReport {
    SurvivorReport {
        filename: name.to_string(),
        mutation_score: 0.5,
        date: "01/01/2026 00:00:00".to_string(),
        diffs: Default::default(),
    }
}

#[test]
fn merge_reports_appends_in_order() {
    let merged = merge_reports(vec![sample_report("a.cpp")], sample_report("b.cpp"));
    let names: Vec<&str> = merged.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["a.cpp", "b.cpp"]);
}

#[test]
fn per_file_name_flattens_separators_and_extension() {
    assert_eq!(
        per_file_report_name(Path::new("src/wallet/coinselection.cpp")),
        "diff_not_killed-src-wallet-coinselection.json"
    );
    assert_eq!(
        per_file_report_name(Path::new("test/functional/feature_addrman.py")),
        "diff_not_killed-test-functional-feature_addrman.json"
    );
}

#[test]
fn accumulate_mode_grows_the_fixed_document() {
    let out = TempDir::new().unwrap();
    report::persist(&sample_report("a.cpp"), ReportMode::Accumulate, out.path()).unwrap();
    report::persist(&sample_report("b.cpp"), ReportMode::Accumulate, out.path()).unwrap();

    let data =
        std::fs::read_to_string(out.path().join(report::ACCUMULATED_REPORT_FILE)).unwrap();
    let reports: Vec<SurvivorReport> = serde_json::from_str(&data).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].filename, "a.cpp");
    assert_eq!(reports[1].filename, "b.cpp");
}

#[test]
fn per_file_mode_writes_one_document_per_source() {
    let out = TempDir::new().unwrap();
    let written = report::persist(
        &sample_report("src/net_processing.cpp"),
        ReportMode::PerFile,
        out.path(),
    )
    .unwrap();
    assert!(written.ends_with("diff_not_killed-src-net_processing.json"));
    let data = std::fs::read_to_string(written).unwrap();
    let parsed: SurvivorReport = serde_json::from_str(&data).unwrap();
    assert_eq!(parsed.mutation_score, 0.5);
}
