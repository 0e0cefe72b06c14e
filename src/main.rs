use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use mutation_core::eligibility::LineScope;
use mutation_core::evaluator::{self, EvalOptions, FileSlot};
use mutation_core::generator::{self, GenerateOptions};
use mutation_core::report::{self, ReportMode};
use mutation_core::{Error, changes, coverage, output, skiplist, store};

#[derive(Parser)]
#[command(
    name = "mutation-core",
    version,
    about = "Line-level mutation testing for large native codebases"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create mutants for a change-set (0 = current branch) or a single file
    Mutate {
        /// Pull-request number to fetch and mutate
        #[arg(short, long, default_value_t = 0)]
        pr: u64,
        /// Mutate one specific file instead of a change-set
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Only mutate lines covered by this LCOV tracefile
        #[arg(short, long)]
        cov: Option<PathBuf>,
        /// Inclusive 1-based line range to mutate
        #[arg(short, long, num_args = 2, value_names = ["LO", "HI"])]
        range: Option<Vec<usize>>,
        /// JSON document with line numbers to skip per file
        #[arg(long)]
        skip_lines: Option<PathBuf>,
        /// One mutant per line, sampling operators and lines in random order
        #[arg(long)]
        one_mutant: bool,
        /// Apply only security-based mutations (usually to test fuzzing)
        #[arg(short = 's', long)]
        security: bool,
        /// Only create mutants for unit and functional tests
        #[arg(short, long)]
        test_only: bool,
        /// Seed for the one-mutant shuffles
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Evaluate mutants against the build/test harness
    Analyze {
        /// Folder with the mutants (default: every muts* folder found)
        #[arg(short, long)]
        folder: Option<PathBuf>,
        /// Command to test the mutants (default: derived from the file path)
        #[arg(short, long, default_value = "")]
        command: String,
        /// Timeout per mutant, in seconds
        #[arg(short, long, default_value_t = 1000)]
        timeout: u64,
        /// Build jobs for the derived rebuild command
        #[arg(short, long, default_value_t = 0)]
        jobs: usize,
        /// Maximum acceptable survival rate before aborting (0.3 = 30%)
        #[arg(long, default_value_t = 0.75)]
        survival_threshold: f64,
        /// Append this run's report to the accumulated document
        #[arg(long)]
        accumulate: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Mutate {
            pr,
            file,
            cov,
            range,
            skip_lines,
            one_mutant,
            security,
            test_only,
            seed,
        } => cmd_mutate(
            pr, file, cov, range, skip_lines, one_mutant, security, test_only, seed,
        ),
        Commands::Analyze {
            folder,
            command,
            timeout,
            jobs,
            survival_threshold,
            accumulate,
        } => cmd_analyze(folder, command, timeout, jobs, survival_threshold, accumulate),
    };
    process::exit(code);
}

/// Paths never worth mutating in change-set mode: docs, fuzz harnesses,
/// benchmarks, utility helpers, and plain-text files.
const CHANGE_SET_EXCLUDES: &[&str] = &["doc", "fuzz", "bench", "util"];

fn validate_mutate_config(
    pr: u64,
    file: &Option<PathBuf>,
    cov: &Option<PathBuf>,
    range: &Option<Vec<usize>>,
) -> Result<Option<(usize, usize)>, Error> {
    if pr != 0 && file.is_some() {
        return Err(Error::Config(
            "provide either a PR number or a file, not both".into(),
        ));
    }
    if cov.is_some() && range.is_some() {
        return Err(Error::Config(
            "provide either a coverage file or a line range, not both".into(),
        ));
    }
    match range {
        None => Ok(None),
        Some(bounds) => {
            let (lo, hi) = (bounds[0], bounds[1]);
            if lo == 0 || lo > hi {
                return Err(Error::Config(format!("invalid range {lo}..{hi}")));
            }
            Ok(Some((lo, hi)))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_mutate(
    pr: u64,
    file: Option<PathBuf>,
    cov: Option<PathBuf>,
    range: Option<Vec<usize>>,
    skip_lines: Option<PathBuf>,
    one_mutant: bool,
    security: bool,
    test_only: bool,
    seed: Option<u64>,
) -> i32 {
    let range = match validate_mutate_config(pr, &file, &cov, &range) {
        Ok(r) => r,
        Err(e) => {
            output::print_error(&e.to_string());
            return 2;
        }
    };

    let coverage_map = match cov {
        Some(path) => match coverage::parse_coverage_file(&path) {
            Ok(map) => Some(map),
            Err(e) => {
                output::print_error(&e.to_string());
                return 2;
            }
        },
        None => None,
    };

    let skip_map = match skip_lines {
        Some(path) => match skiplist::load(&path, true) {
            Ok(map) => map,
            Err(e) => {
                output::print_error(&e.to_string());
                return 2;
            }
        },
        None => skiplist::SkipMap::new(),
    };

    let mut rng = match seed {
        Some(s) => fastrand::Rng::with_seed(s),
        None => fastrand::Rng::new(),
    };
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    if let Some(file) = file {
        let opts = GenerateOptions {
            change_set: None,
            one_mutant,
            security_only: security,
            base_dir,
        };
        let scope = scope_for(&file, range, coverage_map.as_ref(), &skip_map);
        return match generator::generate(&file, None, &scope, &opts, &mut rng) {
            Ok(_) => 0,
            Err(e) => {
                output::print_error(&e.to_string());
                3
            }
        };
    }

    let pr_context = (pr != 0).then_some(pr);
    let files = match changes::changed_files(pr_context) {
        Ok(files) => files,
        Err(e) => {
            output::print_error(&e.to_string());
            return 3;
        }
    };

    let mut failed = false;
    for changed in files {
        if CHANGE_SET_EXCLUDES.iter().any(|t| changed.contains(t)) || changed.contains(".txt") {
            continue;
        }
        let kind = mutation_core::classify_target(&changed);
        if test_only && kind == mutation_core::TargetKind::Source {
            continue;
        }
        let touched = match changes::lines_touched(&changed) {
            Ok(lines) => lines,
            Err(e) => {
                output::print_error(&e.to_string());
                failed = true;
                continue;
            }
        };
        let path = PathBuf::from(&changed);
        let mut scope = scope_for(&path, range, coverage_map.as_ref(), &skip_map);
        scope.touched = Some(touched.iter().copied().collect());

        let opts = GenerateOptions {
            change_set: pr_context,
            one_mutant,
            security_only: security,
            base_dir: base_dir.clone(),
        };
        if let Err(e) = generator::generate(&path, Some(touched), &scope, &opts, &mut rng) {
            // Fatal for this file's generation only.
            output::print_error(&e.to_string());
            failed = true;
        }
    }
    if failed { 3 } else { 0 }
}

fn scope_for(
    file: &Path,
    range: Option<(usize, usize)>,
    coverage_map: Option<&coverage::CoverageMap>,
    skip_map: &skiplist::SkipMap,
) -> LineScope {
    let file_str = file.to_string_lossy();
    LineScope {
        touched: None,
        range,
        coverage: coverage::constraint_for_file(coverage_map, &file_str),
        skip: skip_map.get(file_str.as_ref()).cloned(),
    }
}

fn cmd_analyze(
    folder: Option<PathBuf>,
    command: String,
    timeout: u64,
    jobs: usize,
    survival_threshold: f64,
    accumulate: bool,
) -> i32 {
    let folders = match folder {
        Some(f) => vec![f],
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let found = store::find_batch_dirs(&cwd);
            if found.is_empty() {
                output::print_error("No mutant folders found. Run `mutation-core mutate` first.");
                return 2;
            }
            found
        }
    };

    let opts = EvalOptions {
        command: (!command.is_empty()).then_some(command),
        timeout: Duration::from_secs(timeout),
        survival_threshold,
        jobs,
    };
    let mode = if accumulate {
        ReportMode::Accumulate
    } else {
        ReportMode::PerFile
    };

    for folder in folders {
        if let Err(e) = analyze_folder(&folder, &opts, mode) {
            output::print_error(&e.to_string());
            return 3;
        }
    }
    0
}

fn analyze_folder(folder: &Path, opts: &EvalOptions, mode: ReportMode) -> Result<(), Error> {
    let batch = store::load_batch(folder)?;
    let slot = FileSlot::acquire(&batch.original_file)?;

    let result = evaluator::evaluate(&batch, &slot, opts)?;
    output::print_score(&result);

    if let Some(compiled) = report::compile(&batch, &result, &slot)? {
        let out_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let path = report::persist(&compiled, mode, &out_dir)?;
        output::print_success(&format!("Report saved to {}", path.display()));
    } else {
        output::print_success("All mutants killed, no report to write.");
    }
    Ok(())
}
