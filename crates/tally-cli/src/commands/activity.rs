//! Activity command: per-category activity breakdown with percentages.

use std::io::Write;

use anyhow::Result;
use tally_core::{AggregateOptions, Aggregation, aggregate};

use crate::cli::ActivityArgs;
use crate::config::Config;
use crate::format::{HourFormat, format_minutes};
use crate::input;

/// Runs the activity command.
pub fn run<W: Write>(writer: &mut W, args: &ActivityArgs, config: &Config) -> Result<()> {
    let prepared = input::prepare(writer, &args.input, config)?;
    let options = AggregateOptions {
        category_filter: args.input.category.clone(),
        detail: true,
        all_replacement: &prepared.all_replacement,
        ..AggregateOptions::new(&prepared.aliases)
    };
    let result = aggregate(&prepared.lines, &options)?;

    let format = if args.clock || config.clock_format {
        HourFormat::Clock
    } else {
        HourFormat::PartHours
    };
    write_activity(writer, &result, format)
}

/// Writes one `CAT` block per category with its activities and their share
/// of the category total. Activities without accumulated minutes are
/// skipped.
fn write_activity<W: Write>(
    writer: &mut W,
    result: &Aggregation,
    format: HourFormat,
) -> Result<()> {
    writeln!(writer, "BY ACTIVITY:")?;
    for (category, node) in &result.tree.children {
        writeln!(writer, "CAT {category} {}", format_minutes(node.total, format))?;
        for (activity, activity_node) in &node.children {
            if activity_node.total > 0.0 {
                let percentage = activity_node.total / node.total * 100.0;
                writeln!(
                    writer,
                    "  {activity} {} ({percentage:.1}%)",
                    format_minutes(activity_node.total, format)
                )?;
            }
        }
    }
    Ok(())
}
