//! Operator catalog: ordered (pattern, replacement) rules, kept as pure data
//! so the active set can be shuffled, sampled, and tested independently of
//! the generator walk.

use std::fmt;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorClass {
    General,
    Security,
    Test,
}

impl fmt::Display for OperatorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorClass::General => write!(f, "general"),
            OperatorClass::Security => write!(f, "security"),
            OperatorClass::Test => write!(f, "test"),
        }
    }
}

/// One syntactic alteration rule. Patterns are tried in catalog order; the
/// substitution replaces the first occurrence in the left-trimmed line.
pub struct MutationOp {
    regex: Regex,
    replacement: &'static str,
    pub class: OperatorClass,
}

impl MutationOp {
    fn new(pattern: &'static str, replacement: &'static str, class: OperatorClass) -> Self {
        // Catalog patterns are static and vetted by the table tests.
        let regex = Regex::new(pattern).unwrap_or_else(|e| {
            panic!("invalid operator pattern {pattern:?}: {e}");
        });
        MutationOp { regex, replacement, class }
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn replacement(&self) -> &str {
        self.replacement
    }

    pub fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    pub fn apply(&self, line: &str) -> String {
        self.regex.replace(line, self.replacement).into_owned()
    }
}

/// General-purpose rules for native production sources. Two-character
/// operators come before their one-character prefixes so a `<=` line is
/// offered the boundary swap before the strict-comparison swap.
const GENERAL_RULES: &[(&str, &str)] = &[
    (r" == ", " != "),
    (r" != ", " == "),
    (r" <= ", " < "),
    (r" >= ", " > "),
    (r" < ", " <= "),
    (r" > ", " >= "),
    (r" && ", " || "),
    (r" \|\| ", " && "),
    (r" \+= ", " -= "),
    (r" -= ", " += "),
    (r"\+\+", "--"),
    (r"--", "++"),
    (r" \+ ", " - "),
    (r" - ", " + "),
    (r" \* ", " / "),
    (r" / ", " * "),
    (r"\btrue\b", "false"),
    (r"\bfalse\b", "true"),
    (r"\bbreak;", "continue;"),
    (r"\bcontinue;", "break;"),
    (r"std::min\b", "std::max"),
    (r"std::max\b", "std::min"),
];

/// Security-relevant rules aimed at fuzz-reachable constructs: boundary
/// conditions, length arithmetic, and raw-memory helpers.
const SECURITY_RULES: &[(&str, &str)] = &[
    (r" <= ", " < "),
    (r" >= ", " > "),
    (r" < ", " <= "),
    (r" > ", " >= "),
    (r" << ", " >> "),
    (r" >> ", " << "),
    (r"\+ 1\b", "- 1"),
    (r"- 1\b", "+ 1"),
    (r"\bmemcpy\b", "memmove"),
    (r"\bsizeof\b", "1 + sizeof"),
    (r"\bstrlen\b", "sizeof"),
];

/// Rules for Python scripts and native unit-test sources, where boolean and
/// comparison flips dominate the useful mutants.
const TEST_RULES: &[(&str, &str)] = &[
    (r"\bTrue\b", "False"),
    (r"\bFalse\b", "True"),
    (r"\btrue\b", "false"),
    (r"\bfalse\b", "true"),
    (r" == ", " != "),
    (r" != ", " == "),
    (r" <= ", " < "),
    (r" >= ", " > "),
    (r" < ", " <= "),
    (r" > ", " >= "),
    (r"\band\b", "or"),
    (r"\bor\b", "and"),
    (r" \+ ", " - "),
    (r" - ", " + "),
    (r"\b0\b", "1"),
    (r"\b1\b", "0"),
];

/// Compile the active rule set for one generation pass. The returned order
/// is the catalog order; one-mutant mode shuffles it afterwards.
pub fn operator_set(class: OperatorClass) -> Vec<MutationOp> {
    let rules = match class {
        OperatorClass::General => GENERAL_RULES,
        OperatorClass::Security => SECURITY_RULES,
        OperatorClass::Test => TEST_RULES,
    };
    rules
        .iter()
        .map(|&(pattern, replacement)| MutationOp::new(pattern, replacement, class))
        .collect()
}
