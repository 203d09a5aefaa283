//! Tag alias file loading.
//!
//! An alias file holds one `OldTag, =NewTag` rule per line. Rules are
//! applied to activity and specifier tags at extraction time; categories are
//! never aliased.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::AliasTable;

/// Separator between the two fields of an alias rule.
const RULE_SEPARATOR: &str = ", =";

/// Loads an alias file into a lookup table.
pub fn load_alias_table(path: &Path) -> Result<AliasTable> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read alias file {}", path.display()))?;
    Ok(parse_alias_rules(&text))
}

/// Parses `OldTag, =NewTag` rules, one per line.
///
/// Lines that do not split into exactly two fields are skipped.
pub fn parse_alias_rules(text: &str) -> AliasTable {
    let mut table = AliasTable::new();
    for line in text.lines() {
        let fields: Vec<&str> = line.split(RULE_SEPARATOR).collect();
        if let [from, to] = fields[..] {
            table.insert(from, to);
        }
    }
    table
}
