//! Kill-command derivation from the target file's path shape. Pure so the
//! path→command mapping can be pinned by fixtures.

use std::path::Path;

/// One-off clean rebuild, paid once before a loop that has no explicit
/// command, never per mutant.
pub const CLEAN_REBUILD: &str = "rm -rf build && cmake -B build && cmake --build build";

fn build_command(jobs: usize) -> String {
    if jobs != 0 {
        format!("cmake --build build -j{jobs}")
    } else {
        "cmake --build build".to_string()
    }
}

/// Derive the command that should kill mutants of `target_file`:
/// a functional test runs directly from the build tree; a unit-test source
/// rebuilds and runs its own suite; anything else rebuilds and runs the
/// whole unit and functional harness.
pub fn resolve(target_file: &Path, jobs: usize) -> String {
    let path = target_file.to_string_lossy();
    if path.contains("functional") {
        return format!("./build/{path}");
    }
    if path.contains("test") {
        let suite = target_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        return format!(
            "{} && ./build/src/test/test_bitcoin --run_test={suite}",
            build_command(jobs)
        );
    }
    format!(
        "{} && ./build/src/test/test_bitcoin && CI_FAILFAST_TEST_LEAVE_DANGLING=1 ./build/test/functional/test_runner.py -F",
        build_command(jobs)
    )
}
