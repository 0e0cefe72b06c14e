//! Skip-list collaborator: a JSON document mapping file paths to line
//! numbers that must never be mutated.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::{Error, Result};
use crate::output;

pub type SkipMap = HashMap<String, BTreeSet<usize>>;

/// Load the skip-list document. Missing or malformed documents degrade to
/// an empty map with a diagnostic; `required` turns that into an error the
/// caller must abort on.
pub fn load(path: &Path, required: bool) -> Result<SkipMap> {
    let degrade = |detail: String| -> Result<SkipMap> {
        if required {
            Err(Error::SkipList(path.to_path_buf()))
        } else {
            output::print_error(&detail);
            Ok(SkipMap::new())
        }
    };

    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) => return degrade(format!("Cannot read skip-list {}: {e}", path.display())),
    };
    match serde_json::from_str(&data) {
        Ok(map) => Ok(map),
        Err(e) => degrade(format!("Skip-list {} is not valid JSON: {e}", path.display())),
    }
}
