//! Tags command: tag occurrence counts across the whole input.

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use tally_core::{TagResolver, extract_tags};

use crate::cli::TagsArgs;
use crate::config::Config;
use crate::input;

/// Runs the tags command.
pub fn run<W: Write>(writer: &mut W, args: &TagsArgs, config: &Config) -> Result<()> {
    let prepared = input::prepare(writer, &args.input, config)?;
    for (tag, count) in count_tags(&prepared.lines, &prepared.aliases) {
        writeln!(writer, "{count} {tag}")?;
    }
    Ok(())
}

/// Counts every resolved tag occurrence on every line, duplicates included.
///
/// Sorted most common first, ties broken by tag name so the output is
/// deterministic.
fn count_tags(lines: &[String], resolver: &dyn TagResolver) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for line in lines {
        for tag in extract_tags(line, resolver) {
            *counts.entry(tag).or_insert(0) += 1;
        }
    }

    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|(a_tag, a_count), (b_tag, b_count)| {
        b_count.cmp(a_count).then_with(|| a_tag.cmp(b_tag))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{AliasTable, IdentityResolver};

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| (*line).to_string()).collect()
    }

    #[test]
    fn counts_tags_most_common_first() {
        let input = lines(&[
            "9:00-10:00 @Read docs (@JOB)",
            "10:00-11:00 @Read mail (@JOB)",
            "11:00-12:00 @Write notes (@HOME)",
        ]);
        let counts = count_tags(&input, &IdentityResolver);
        assert_eq!(counts[0], ("@JOB".to_string(), 2));
        assert_eq!(counts[1], ("@Read".to_string(), 2));
        assert_eq!(counts[2], ("@HOME".to_string(), 1));
        assert_eq!(counts[3], ("@Write".to_string(), 1));
    }

    #[test]
    fn repeated_tag_on_one_line_counts_twice() {
        let input = lines(&["9:00-10:00 @Read then @Read again (@JOB)"]);
        let counts = count_tags(&input, &IdentityResolver);
        assert_eq!(counts[0], ("@Read".to_string(), 2));
    }

    #[test]
    fn aliases_merge_counts() {
        let mut table = AliasTable::new();
        table.insert("@Reading", "@Read");
        let input = lines(&[
            "9:00-10:00 @Reading docs (@JOB)",
            "10:00-11:00 @Read mail (@JOB)",
        ]);
        let counts = count_tags(&input, &table);
        assert_eq!(counts[0], ("@Read".to_string(), 2));
    }
}
