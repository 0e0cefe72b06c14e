//! Line eligibility: lexical rules deciding whether a source line may be
//! mutated at all, plus the orthogonal scoping filters the generator applies
//! on top (touched lines, line range, coverage, external skip set).

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::TargetKind;

/// Control and diagnostic lines: mutating these either exercises no real
/// logic or breaks the instrumentation the harness relies on.
pub const DISQUALIFYING_PREFIXES: &[&str] = &[
    "//",
    "#",
    "*",
    "assert",
    "self.log",
    "Assume",
    "CHECK_NONFATAL",
    "/*",
    "LogPrintf",
    "LogPrint",
    "strprintf",
    "G_FUZZING",
];

/// Known false-positive mutation sites, skipped wherever they appear.
pub const ALWAYS_SKIP_SUBSTRINGS: &[&str] = &[
    "EnableFuzzDeterminism",
    "nLostUnk",
    "RPCArg::Type::",
];

/// Tokens that disqualify a line in Python scripts: loop/conditional
/// keywords plus the functional-test lifecycle and assertion helpers.
pub const SCRIPT_SKIP_TOKENS: &[&str] = &[
    "wait_for",
    "wait_until",
    "check_",
    "for",
    "expected_error",
    "def",
    "send_and_ping",
    "test_",
    "rehash",
    "start_",
    "solve()",
    "restart_",
    "stop_",
    "connect_",
    "sync_",
    "class",
    "return",
    "generate(",
    "continue",
    "sleep",
    "break",
    "getcontext().prec",
    "if",
    "else",
    "assert",
];

/// The native-unit-test analogue: type keywords, lock macros, assertion
/// macros, and fixture identifiers.
pub const UNIT_SKIP_TOKENS: &[&str] = &[
    "while",
    "for",
    "if",
    "test_",
    "_test",
    "reset",
    "class",
    "return",
    "continue",
    "break",
    "else",
    "reserve",
    "resize",
    "static",
    "void",
    "BOOST_",
    "LOCK(",
    "LOCK2(",
    "Test",
    "Assert",
    "EXCLUSIVE_LOCKS_REQUIRED",
    "catch",
];

/// Plain `identifier = expression` statements; in scripts these are
/// dominated by trivial or false-positive mutants.
static SCRIPT_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[a-zA-Z_]\w*\s*=\s*.+$").expect("assignment shape"));

/// Typed declaration/assignment shapes in the native test dialect,
/// including pointer/reference and member-access targets.
static UNIT_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[a-zA-Z_][a-zA-Z0-9_:<>*&\s]*\s+[a-zA-Z_][a-zA-Z0-9_]*(?:\[[^\]]*\])?(?:\.[a-zA-Z_][a-zA-Z0-9_]*|->[a-zA-Z_][a-zA-Z0-9_]*)*(?:\s*=\s*[^;]+|\s*\{[^;]+\})",
    )
    .expect("declaration shape")
});

/// Decide whether `line` may be mutated for a target of the given kind.
/// Rules apply in precedence order; scoping is the caller's concern.
pub fn line_is_eligible(line: &str, kind: TargetKind) -> bool {
    let stripped = line.trim_start();
    if DISQUALIFYING_PREFIXES.iter().any(|p| stripped.starts_with(p)) {
        return false;
    }
    if ALWAYS_SKIP_SUBSTRINGS.iter().any(|s| line.contains(s)) {
        return false;
    }
    match kind {
        TargetKind::Script => {
            if SCRIPT_SKIP_TOKENS.iter().any(|t| line.contains(t)) {
                return false;
            }
            if SCRIPT_ASSIGNMENT.is_match(line) {
                return false;
            }
        }
        TargetKind::UnitTest => {
            if UNIT_SKIP_TOKENS.iter().any(|t| line.contains(t)) {
                return false;
            }
            if UNIT_DECLARATION.is_match(line) {
                return false;
            }
        }
        TargetKind::Source => {}
    }
    true
}

/// The four scoping filters narrowing the candidate set. They are orthogonal
/// constraints: every supplied one must pass. Line numbers are 1-based.
#[derive(Debug, Default, Clone)]
pub struct LineScope {
    pub touched: Option<BTreeSet<usize>>,
    pub range: Option<(usize, usize)>,
    pub coverage: Option<BTreeSet<usize>>,
    pub skip: Option<BTreeSet<usize>>,
}

impl LineScope {
    pub fn permits(&self, line_no: usize) -> bool {
        if let Some(touched) = &self.touched {
            if !touched.contains(&line_no) {
                return false;
            }
        }
        if let Some((lo, hi)) = self.range {
            if line_no < lo || line_no > hi {
                return false;
            }
        }
        if let Some(coverage) = &self.coverage {
            if !coverage.contains(&line_no) {
                return false;
            }
        }
        if let Some(skip) = &self.skip {
            if skip.contains(&line_no) {
                return false;
            }
        }
        true
    }
}
