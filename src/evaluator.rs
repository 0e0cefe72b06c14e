//! Sequential mutant evaluation: install one mutant at a time into the live
//! target path, run the kill-command under a timeout, classify, and stop
//! early once the running survival rate crosses the threshold.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::killcmd;
use crate::output;
use crate::store::{MutationBatch, mutant_file_name};

/// Terminal classification of one evaluated mutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutantStatus {
    Killed,
    Survived,
    /// Kill-command exceeded the per-mutant timeout. Counts as survived for
    /// the running rate and the score but stays distinguishable in results.
    TimedOut,
}

#[derive(Debug)]
pub struct EvaluationResult {
    pub killed: BTreeSet<usize>,
    pub survived: BTreeSet<usize>,
    pub timed_out: BTreeSet<usize>,
    /// Count of all generated mutants, fixed at loop start.
    pub total: usize,
    pub terminated_early: bool,
}

impl EvaluationResult {
    /// Mutation score over all generated mutants. The denominator stays the
    /// full batch size even after early termination; `terminated_early`
    /// marks the score as partial.
    pub fn score(&self) -> f64 {
        self.killed.len() as f64 / self.total as f64
    }

    /// Everything the test suite failed to detect, timeouts included.
    pub fn surviving(&self) -> BTreeSet<usize> {
        self.survived.union(&self.timed_out).copied().collect()
    }

    fn survival_rate(&self) -> f64 {
        (self.survived.len() + self.timed_out.len()) as f64 / self.total as f64
    }
}

/// Exclusive ownership of the one live path the build system reads from.
/// At most one mutant's content may occupy the path at a time, and the
/// pristine content is written back on every exit path, drop included.
pub struct FileSlot {
    path: PathBuf,
    pristine: String,
}

impl FileSlot {
    pub fn acquire(path: &Path) -> Result<Self> {
        let pristine = std::fs::read_to_string(path).map_err(|e| Error::SourceAccess {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(FileSlot {
            path: path.to_path_buf(),
            pristine,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pristine(&self) -> &str {
        &self.pristine
    }

    pub fn install(&self, content: &str) -> Result<()> {
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Idempotent: safe to call after the slot has already been restored.
    pub fn restore(&self) -> Result<()> {
        std::fs::write(&self.path, &self.pristine)?;
        Ok(())
    }
}

impl Drop for FileSlot {
    fn drop(&mut self) {
        let _ = std::fs::write(&self.path, &self.pristine);
    }
}

pub enum CommandOutcome {
    /// Process finished; true when the exit status was zero.
    Exited(bool),
    TimedOut,
}

#[cfg(unix)]
fn spawn_in_own_group(cmd: &mut Command) -> std::io::Result<Child> {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0).spawn()
}

#[cfg(not(unix))]
fn spawn_in_own_group(cmd: &mut Command) -> std::io::Result<Child> {
    cmd.spawn()
}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    // The child leads its own process group; signalling the negative pid
    // takes down build/test descendants with it.
    let _ = Command::new("kill")
        .args(["-9", &format!("-{}", child.id())])
        .status();
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}

/// Run a shell command, killing it and its descendants once `timeout`
/// elapses. Spawn failure counts as a non-zero exit: the harness could not
/// run, which is indistinguishable from the harness rejecting the mutant.
pub fn run_with_timeout(command: &str, timeout: Duration) -> CommandOutcome {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    let mut child = match spawn_in_own_group(&mut cmd) {
        Ok(c) => c,
        Err(_) => return CommandOutcome::Exited(false),
    };
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => break CommandOutcome::Exited(status.success()),
            Ok(None) => {
                if start.elapsed() > timeout {
                    kill_process_group(&mut child);
                    let _ = child.wait();
                    break CommandOutcome::TimedOut;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(_) => break CommandOutcome::Exited(false),
        }
    }
}

fn run_unbounded(command: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub struct EvalOptions {
    /// Explicit kill-command; empty or absent means derive one from the
    /// target path and pay for one clean rebuild up front.
    pub command: Option<String>,
    pub timeout: Duration,
    /// Maximum tolerable survival rate before the loop aborts early.
    pub survival_threshold: f64,
    pub jobs: usize,
}

/// Evaluate every mutant in batch order through the exclusive slot.
/// Unexpected errors propagate to the caller; the slot restores the target
/// on the way out regardless.
pub fn evaluate(
    batch: &MutationBatch,
    slot: &FileSlot,
    opts: &EvalOptions,
) -> Result<EvaluationResult> {
    let total = batch.mutants.len();
    if total == 0 {
        return Err(Error::EmptyBatch(batch.storage_dir.clone()));
    }

    let command = match opts.command.as_deref() {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => {
            output::print_info(&format!("Running {}", killcmd::CLEAN_REBUILD));
            run_unbounded(killcmd::CLEAN_REBUILD);
            killcmd::resolve(&batch.original_file, opts.jobs)
        }
    };

    output::print_info(&format!("* {total} MUTANTS *"));

    let mut result = EvaluationResult {
        killed: BTreeSet::new(),
        survived: BTreeSet::new(),
        timed_out: BTreeSet::new(),
        total,
        terminated_early: false,
    };

    for (i, mutant) in batch.mutants.iter().enumerate() {
        if result.survival_rate() > opts.survival_threshold {
            output::print_warn(&format!(
                "Survival rate above {:.0}%, stopping analysis early",
                opts.survival_threshold * 100.0
            ));
            result.terminated_early = true;
            break;
        }

        let name = mutant_file_name(&mutant.source_file, mutant.id);
        output::print_progress(i + 1, total, &name);

        slot.install(&mutant.content)?;
        let status = match run_with_timeout(&command, opts.timeout) {
            CommandOutcome::Exited(false) => MutantStatus::Killed,
            CommandOutcome::Exited(true) => MutantStatus::Survived,
            CommandOutcome::TimedOut => MutantStatus::TimedOut,
        };
        output::print_outcome(status);
        match status {
            MutantStatus::Killed => result.killed.insert(mutant.id),
            MutantStatus::Survived => result.survived.insert(mutant.id),
            MutantStatus::TimedOut => result.timed_out.insert(mutant.id),
        };
    }

    // Reporting must start from the pristine file.
    slot.restore()?;
    Ok(result)
}
