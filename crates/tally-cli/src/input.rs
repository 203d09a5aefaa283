//! Input line loading, filtering, and wildcard-category discovery.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tally_core::{ALL_CATEGORY, AliasTable, extract_categories, is_entry};

use crate::alias;
use crate::cli::InputArgs;
use crate::config::Config;

/// Lines plus derived aggregation inputs, ready for the core.
#[derive(Debug)]
pub struct PreparedInput {
    pub lines: Vec<String>,
    pub aliases: AliasTable,
    pub all_replacement: Vec<String>,
}

/// Reads, filters, and annotates the input for one command run.
pub fn prepare<W: Write>(
    writer: &mut W,
    args: &InputArgs,
    config: &Config,
) -> Result<PreparedInput> {
    let lines = read_lines(&args.files)?;
    let lines = filter_lines(lines, &args.include, &args.exclude);
    if args.show_included {
        for line in &lines {
            writeln!(writer, "{line}")?;
        }
    }

    let aliases = match args.alias_file.as_deref().or(config.alias_file.as_deref()) {
        Some(path) => alias::load_alias_table(path)?,
        None => AliasTable::new(),
    };
    let all_replacement = discover_all_replacement(&lines);

    Ok(PreparedInput {
        lines,
        aliases,
        all_replacement,
    })
}

/// Concatenates the lines of every input file, in argument order.
pub fn read_lines(files: &[PathBuf]) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for path in files {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        lines.extend(text.lines().map(str::to_string));
    }
    Ok(lines)
}

/// Applies the include/exclude substring filter.
///
/// Non-entry lines (headers, notes) are always kept. An entry line is kept
/// iff it contains every include substring (when any are given) and none of
/// the exclude substrings.
pub fn filter_lines(lines: Vec<String>, includes: &[String], excludes: &[String]) -> Vec<String> {
    if includes.is_empty() && excludes.is_empty() {
        return lines;
    }
    lines
        .into_iter()
        .filter(|line| {
            if !is_entry(line) {
                return true;
            }
            if !includes.is_empty() && !includes.iter().all(|text| line.contains(text.as_str())) {
                return false;
            }
            excludes.iter().all(|text| !line.contains(text.as_str()))
        })
        .collect()
}

/// Collects every category named anywhere in the input; if `@ALL` occurs,
/// the remaining categories (sorted) become its replacement set.
pub fn discover_all_replacement(lines: &[String]) -> Vec<String> {
    let mut categories: BTreeSet<String> = BTreeSet::new();
    for line in lines.iter().filter(|line| is_entry(line)) {
        categories.extend(extract_categories(line));
    }
    if categories.remove(ALL_CATEGORY) {
        categories.into_iter().collect()
    } else {
        Vec::new()
    }
}
