//! Report command: day-by-day summaries and per-category totals.
//!
//! This module implements `tally report` with human-readable and JSON output
//! and the optional target-total scaling mode.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tally_core::{
    AggregateOptions, Aggregation, AggregationNode, DaySummary, Warning, aggregate,
    aggregate_scaled_to,
};

use crate::cli::ReportArgs;
use crate::config::Config;
use crate::format::{HourFormat, format_minutes};
use crate::input;

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: &Config) -> Result<()> {
    let prepared = input::prepare(writer, &args.input, config)?;
    let options = AggregateOptions {
        category_filter: args.input.category.clone(),
        all_replacement: &prepared.all_replacement,
        ..AggregateOptions::new(&prepared.aliases)
    };
    let result = match args.scale_to {
        Some(target) => aggregate_scaled_to(&prepared.lines, target, &options)?,
        None => aggregate(&prepared.lines, &options)?,
    };

    let format = if args.clock || config.clock_format {
        HourFormat::Clock
    } else {
        HourFormat::PartHours
    };

    if args.json {
        writeln!(writer, "{}", format_report_json(&result)?)?;
    } else {
        write_report(
            writer,
            &result,
            format,
            args.input.category.is_some(),
            args.quiet,
        )?;
    }
    Ok(())
}

/// Writes the human-readable report.
///
/// With a category filter the day lines show the filtered minutes and the
/// day's notes; without one they show the day's raw total.
fn write_report<W: Write>(
    writer: &mut W,
    result: &Aggregation,
    format: HourFormat,
    filtered: bool,
    quiet: bool,
) -> Result<()> {
    for warning in &result.warnings {
        writeln!(writer, "WARNING: {warning}")?;
    }

    if !quiet {
        for day in &result.days {
            if filtered {
                let notes = day.notes.join("; ").replace('@', "");
                writeln!(
                    writer,
                    "{} {} : {}",
                    day.label,
                    format_minutes(day.filtered_minutes, format),
                    notes
                )?;
            } else {
                writeln!(
                    writer,
                    "{} {}",
                    day.label,
                    format_minutes(day.total_minutes, format)
                )?;
            }
        }
    }

    writeln!(writer)?;
    writeln!(writer, "TOTAL:")?;
    for (category, node) in &result.tree.children {
        writeln!(writer, "{category} {}", format_minutes(node.total, format))?;
    }
    writeln!(
        writer,
        "TOTALTOTAL: {}",
        format_minutes(result.tree.total, format)
    )?;
    Ok(())
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    days: &'a [DaySummary],
    categories: &'a BTreeMap<String, AggregationNode>,
    warnings: &'a [Warning],
    total_minutes: f64,
}

/// Formats the aggregation as pretty-printed JSON.
fn format_report_json(result: &Aggregation) -> Result<String> {
    let report = JsonReport {
        days: &result.days,
        categories: &result.tree.children,
        warnings: &result.warnings,
        total_minutes: result.tree.total,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
