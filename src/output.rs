use console::Style;

use crate::evaluator::{EvaluationResult, MutantStatus};

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

pub fn print_success(msg: &str) {
    let style = Style::new().green().bold();
    println!("{} {}", style.apply_to("✓"), msg);
}

pub fn print_warn(msg: &str) {
    let style = Style::new().yellow().bold();
    println!("{} {}", style.apply_to("!"), msg);
}

pub fn print_info(msg: &str) {
    println!("{msg}");
}

/// One progress line per mutant as the loop advances.
pub fn print_progress(current: usize, total: usize, name: &str) {
    println!("[{current}/{total}] Analyzing {name}");
}

pub fn print_outcome(status: MutantStatus) {
    match status {
        MutantStatus::Killed => {
            let style = Style::new().green();
            println!("{}", style.apply_to("KILLED ✅"));
        }
        MutantStatus::Survived => {
            let style = Style::new().red();
            println!("{}", style.apply_to("NOT KILLED ❌"));
        }
        MutantStatus::TimedOut => {
            let style = Style::new().yellow();
            println!("{}", style.apply_to("TIMED OUT ⏱"));
        }
    }
}

pub fn print_score(result: &EvaluationResult) {
    let score_pct = result.score() * 100.0;
    if result.terminated_early {
        let style = Style::new().yellow().bold();
        println!(
            "\n{} MUTATION SCORE: {:.2}% (partial: {} of {} mutants evaluated)\n",
            style.apply_to("!"),
            score_pct,
            result.killed.len() + result.survived.len() + result.timed_out.len(),
            result.total,
        );
        return;
    }
    println!("\nMUTATION SCORE: {score_pct:.2}%\n");
}
