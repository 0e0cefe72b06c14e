//! Change-set collaborator: which files a branch or pull request touched,
//! and which lines inside each file, both read from `git` output.

use std::process::Command;

use crate::error::{Error, Result};

fn run_git(args: &[&str]) -> Result<Vec<String>> {
    let output = Command::new("git").args(args).output()?;
    if !output.status.success() {
        return Err(Error::Git(format!("git {} failed", args.join(" "))));
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect())
}

/// Changed file paths for the current branch, optionally after fetching and
/// checking out a pull-request head first.
pub fn changed_files(pr_number: Option<u64>) -> Result<Vec<String>> {
    if let Some(n) = pr_number {
        let branch = format!("pr/{n}");
        match run_git(&["fetch", "upstream", &format!("pull/{n}/head:{branch}")]) {
            Ok(_) => {
                run_git(&["checkout", &branch])?;
            }
            Err(_) => {
                // Branch already exists locally; bring it up to date instead.
                let _ = run_git(&["rebase", &branch]);
            }
        }
    }
    run_git(&["diff", "--name-only", "upstream/master...HEAD"])
}

/// 1-based line numbers touched in one file of the change-set.
pub fn lines_touched(file: &str) -> Result<Vec<usize>> {
    let diff = run_git(&["diff", "--unified=0", "upstream/master...HEAD", "--", file])?;
    Ok(parse_hunk_lines(&diff))
}

/// Expand the `@@ -a,b +c,d @@` headers of a unified diff into the new-file
/// line numbers they cover. A header without a count names a single line.
pub fn parse_hunk_lines(diff_lines: &[String]) -> Vec<usize> {
    let mut touched = Vec::new();
    for line in diff_lines {
        if !line.starts_with("@@") {
            continue;
        }
        for part in line.split(' ') {
            let Some(info) = part.strip_prefix('+') else {
                continue;
            };
            let mut fields = info.split(',');
            let Some(Ok(start)) = fields.next().map(str::parse::<usize>) else {
                continue;
            };
            match fields.next().map(str::parse::<usize>) {
                Some(Ok(count)) => touched.extend(start..start + count),
                _ => touched.push(start),
            }
        }
    }
    touched
}
