//! The stateful aggregation engine.
//!
//! Consumes an ordered sequence of timesheet lines, tracks per-day running
//! totals, splits each entry's duration across the categories it names (and,
//! in detail mode, across activity and specifier tags), and hands back a
//! nested aggregation tree plus non-fatal diagnostics.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::Serialize;
use thiserror::Error;

use crate::line::{self, InvalidTime, LineKind};
use crate::tags::{self, TagResolver};

/// The wildcard category replaced by the configured ALL-replacement set.
pub const ALL_CATEGORY: &str = "@ALL";

/// Fatal aggregation errors. Warnings are advisory and collected into the
/// [`Aggregation`] instead.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// An entry line could not be processed. Carries the offending line
    /// verbatim; the whole batch is aborted.
    #[error("failed to process line {line:?}")]
    MalformedLine {
        line: String,
        #[source]
        source: InvalidTime,
    },

    /// Target-total scaling was requested but the raw total is zero, so no
    /// scale factor exists.
    #[error("cannot scale to a target: the unscaled total is zero")]
    DegenerateScaleTarget,
}

/// Advisory diagnostic kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// An entry started before the previous entry of the same day ended.
    Overlap,

    /// An entry named no categories; its minutes count toward the day's raw
    /// total but toward no category bucket.
    MissingCategory,
}

/// An advisory diagnostic tied to one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,

    /// Label of the day the line belongs to (verbatim header text, or empty
    /// for entries before the first header).
    pub day: String,

    /// The offending line, verbatim.
    pub line: String,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            WarningKind::Overlap => {
                write!(f, "time overlap on {} line: {}", self.day, self.line)
            }
            WarningKind::MissingCategory => {
                write!(f, "no categories on {} line: {}", self.day, self.line)
            }
        }
    }
}

/// One node of the aggregation tree.
///
/// The root's children are categories; in detail mode each category's
/// children are activity tags and each activity's children are specifier
/// tags. The same uniform shape serves every level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationNode {
    /// Accumulated minutes at this node.
    pub total: f64,

    /// Child nodes, keyed by tag. Ordered for deterministic output.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, AggregationNode>,
}

impl AggregationNode {
    /// Looks up a direct child by tag.
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.children.get(key)
    }

    fn child(&mut self, key: &str) -> &mut Self {
        self.children.entry(key.to_string()).or_default()
    }
}

/// Totals flushed for one day, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    /// Verbatim text of the day's header line (empty for entries before the
    /// first header).
    pub label: String,

    /// Scaled minutes of every entry in the day, categorized or not.
    pub total_minutes: f64,

    /// Scaled minutes credited to categories passing the category filter.
    pub filtered_minutes: f64,

    /// Stripped entry descriptions, one per entry, in input order.
    pub notes: Vec<String>,
}

/// Aggregation parameters. The resolver and ALL-replacement set are always
/// provided explicitly; pass [`IdentityResolver`](crate::IdentityResolver)
/// and an empty slice to opt out.
#[derive(Debug, Clone)]
pub struct AggregateOptions<'a> {
    /// When set, only this category accumulates; other categories' shares
    /// are dropped, not redistributed.
    pub category_filter: Option<String>,

    /// Multiplier applied to every entry's raw minutes.
    pub scale: f64,

    /// Enables the activity/specifier breakdown below each category.
    pub detail: bool,

    /// Categories substituted for the literal `@ALL`. Empty disables the
    /// expansion.
    pub all_replacement: &'a [String],

    /// Tag aliasing hook, applied to activity and specifier tags.
    pub resolver: &'a dyn TagResolver,
}

impl<'a> AggregateOptions<'a> {
    /// Options with scale 1.0, no filter, no detail, no ALL-expansion.
    pub fn new(resolver: &'a dyn TagResolver) -> Self {
        Self {
            category_filter: None,
            scale: 1.0,
            detail: false,
            all_replacement: &[],
            resolver,
        }
    }
}

/// The finished aggregation, handed off by value once parsing completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    /// Root of the tree; children are category nodes and `total` is the
    /// grand total credited to qualifying categories.
    pub tree: AggregationNode,

    /// Per-day summaries, flushed at each date header and at end of input.
    pub days: Vec<DaySummary>,

    /// Advisory diagnostics, in input order.
    pub warnings: Vec<Warning>,
}

impl Aggregation {
    /// Minutes accumulated under one category, if present.
    pub fn category_total(&self, category: &str) -> Option<f64> {
        self.tree.get(category).map(|node| node.total)
    }
}

/// Transient per-day accumulation state, reset at each date header.
struct DayState {
    label: String,
    minutes: f64,
    filtered_minutes: f64,
    notes: Vec<String>,
    prev_end: Option<NaiveTime>,
}

impl DayState {
    fn new(label: String) -> Self {
        Self {
            label,
            minutes: 0.0,
            filtered_minutes: 0.0,
            notes: Vec::new(),
            prev_end: None,
        }
    }

    /// Records the day if it accumulated any minutes. Used both at date
    /// headers and at end of input; skipping the terminal call would lose
    /// the last day.
    fn flush_into(&mut self, days: &mut Vec<DaySummary>) {
        if self.minutes > 0.0 {
            days.push(DaySummary {
                label: self.label.clone(),
                total_minutes: self.minutes,
                filtered_minutes: self.filtered_minutes,
                notes: std::mem::take(&mut self.notes),
            });
        }
    }
}

/// Aggregates an ordered sequence of timesheet lines.
///
/// Single pass, fully sequential. Identical input, options, and resolver
/// always produce a bit-identical result.
pub fn aggregate<I, S>(lines: I, options: &AggregateOptions<'_>) -> Result<Aggregation, AggregateError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut root = AggregationNode::default();
    let mut days = Vec::new();
    let mut warnings = Vec::new();
    let mut day = DayState::new(String::new());

    for line in lines {
        let line = line.as_ref();
        match line::classify(line) {
            Ok(LineKind::DateHeader { label }) => {
                day.flush_into(&mut days);
                day = DayState::new(label);
            }
            Ok(LineKind::Entry(entry)) => {
                accumulate_entry(line, &entry, options, &mut root, &mut day, &mut warnings);
            }
            Ok(LineKind::Other) => {}
            Err(source) => {
                tracing::error!(line, %source, "failed to process line");
                return Err(AggregateError::MalformedLine {
                    line: line.to_string(),
                    source,
                });
            }
        }
    }
    day.flush_into(&mut days);

    Ok(Aggregation {
        tree: root,
        days,
        warnings,
    })
}

/// Aggregates twice so the grand total equals `target` minutes.
///
/// Pass one runs unscaled to measure the raw total; pass two reruns the
/// whole aggregation with `target / raw_total` as the scale factor. There
/// is no incremental reuse between passes.
pub fn aggregate_scaled_to<S>(
    lines: &[S],
    target: f64,
    options: &AggregateOptions<'_>,
) -> Result<Aggregation, AggregateError>
where
    S: AsRef<str>,
{
    let unscaled = AggregateOptions {
        scale: 1.0,
        ..options.clone()
    };
    let raw_total = aggregate(lines, &unscaled)?.tree.total;
    if raw_total == 0.0 || !raw_total.is_finite() {
        return Err(AggregateError::DegenerateScaleTarget);
    }

    let scaled = AggregateOptions {
        scale: target / raw_total,
        ..options.clone()
    };
    aggregate(lines, &scaled)
}

fn accumulate_entry(
    line: &str,
    entry: &line::Entry,
    options: &AggregateOptions<'_>,
    root: &mut AggregationNode,
    day: &mut DayState,
    warnings: &mut Vec<Warning>,
) {
    #[allow(clippy::cast_precision_loss)]
    let raw_minutes = entry.to.signed_duration_since(entry.from).num_seconds() as f64 / 60.0;
    let minutes = raw_minutes * options.scale;

    if day.prev_end.is_some_and(|prev| entry.from < prev) {
        tracing::warn!(day = %day.label, line, "time overlap");
        warnings.push(Warning {
            kind: WarningKind::Overlap,
            day: day.label.clone(),
            line: line.to_string(),
        });
    }
    day.prev_end = Some(entry.to);
    day.minutes += minutes;

    let mut categories = tags::extract_categories(line);
    if !options.all_replacement.is_empty() {
        if let Some(pos) = categories.iter().position(|cat| cat == ALL_CATEGORY) {
            categories.remove(pos);
            categories.extend(options.all_replacement.iter().cloned());
        }
    }
    if categories.is_empty() {
        tracing::warn!(day = %day.label, line, "no categories");
        warnings.push(Warning {
            kind: WarningKind::MissingCategory,
            day: day.label.clone(),
            line: line.to_string(),
        });
    }

    let (activity_tags, specifier_tags) = if options.detail {
        split_detail_tags(line, &categories, options.resolver)
    } else {
        (Vec::new(), Vec::new())
    };

    #[allow(clippy::cast_precision_loss)]
    let share = minutes / categories.len() as f64;
    for category in &categories {
        if options
            .category_filter
            .as_deref()
            .is_some_and(|filter| filter != category.as_str())
        {
            continue;
        }
        root.total += share;
        day.filtered_minutes += share;

        let category_node = root.child(category);
        category_node.total += share;
        if !activity_tags.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let per_activity = share / activity_tags.len() as f64;
            for activity in &activity_tags {
                let activity_node = category_node.child(activity);
                activity_node.total += per_activity;
                if !specifier_tags.is_empty() {
                    #[allow(clippy::cast_precision_loss)]
                    let per_specifier = per_activity / specifier_tags.len() as f64;
                    for specifier in &specifier_tags {
                        activity_node.child(specifier).total += per_specifier;
                    }
                }
            }
        }
    }

    day.notes.push(entry.description.clone());
}

/// Splits the line's non-category tags into activity and specifier tiers.
///
/// Candidates are tags whose raw token is not already a category; the first
/// candidate plus every "and"-introduced tag are activities, the remaining
/// candidates are specifiers. Duplicates are retained throughout, so a tag
/// repeated on one line weights its tier's split accordingly.
fn split_detail_tags(
    line: &str,
    categories: &[String],
    resolver: &dyn TagResolver,
) -> (Vec<String>, Vec<String>) {
    let candidates: Vec<String> = tags::raw_tags(line)
        .into_iter()
        .filter(|tag| !categories.iter().any(|cat| cat == tag))
        .map(|tag| resolver.resolve(tag))
        .collect();
    if candidates.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let and_tags: Vec<String> = tags::raw_and_tags(line)
        .into_iter()
        .filter(|tag| !categories.iter().any(|cat| cat == tag))
        .map(|tag| resolver.resolve(tag))
        .collect();

    let mut activities = vec![candidates[0].clone()];
    activities.extend(and_tags.iter().cloned());
    let specifiers = candidates[1..]
        .iter()
        .filter(|tag| !and_tags.contains(tag))
        .cloned()
        .collect();
    (activities, specifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{AliasTable, IdentityResolver};

    const TOLERANCE: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn run(lines: &[&str]) -> Aggregation {
        aggregate(lines, &AggregateOptions::new(&IdentityResolver)).expect("aggregation succeeds")
    }

    fn run_with(lines: &[&str], options: &AggregateOptions<'_>) -> Aggregation {
        aggregate(lines, options).expect("aggregation succeeds")
    }

    #[test]
    fn sums_minutes_per_category() {
        // Spec'd worked example: 90 + 15 to @JOB, 15 to @OTHER.
        let result = run(&[
            "Mon 1.1.2024",
            "9:00-10:30 Did work (@JOB)",
            "10:30-11:00 Did more (@JOB/@OTHER)",
        ]);
        assert!(close(result.category_total("@JOB").unwrap(), 105.0));
        assert!(close(result.category_total("@OTHER").unwrap(), 15.0));
        assert!(close(result.tree.total, 120.0));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn splits_duration_evenly_across_categories() {
        let result = run(&["Mon 1.1.2024", "9:00-10:00 Shared (@A/@B/@C)"]);
        for category in ["@A", "@B", "@C"] {
            assert!(close(result.category_total(category).unwrap(), 20.0));
        }
        let sum: f64 = result.tree.children.values().map(|n| n.total).sum();
        assert!(close(sum, 60.0));
    }

    #[test]
    fn zero_length_entry_contributes_nothing() {
        let result = run(&["Mon 1.1.2024", "9:00-9:00 nothing ()"]);
        assert!(result.tree.children.is_empty());
        assert!(close(result.tree.total, 0.0));
        // No overlap warning, and no day summary since nothing accumulated.
        assert!(result.days.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::MissingCategory);
    }

    #[test]
    fn negative_span_yields_negative_minutes() {
        let result = run(&["Mon 1.1.2024", "10:00-9:00 backwards (@A)"]);
        assert!(close(result.category_total("@A").unwrap(), -60.0));
        assert!(result.days.is_empty());
    }

    #[test]
    fn missing_category_counts_toward_day_total_only() {
        let result = run(&["Mon 1.1.2024", "9:00-9:30 Did something"]);
        assert!(result.tree.children.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::MissingCategory);
        assert_eq!(result.warnings[0].day, "Mon 1.1.2024");
        assert_eq!(result.days.len(), 1);
        assert!(close(result.days[0].total_minutes, 30.0));
        assert!(close(result.days[0].filtered_minutes, 0.0));
    }

    #[test]
    fn overlap_warns_without_changing_totals() {
        let overlapping = run(&[
            "Mon 1.1.2024",
            "9:00-10:00 First (@A)",
            "9:30-10:30 Second (@B)",
        ]);
        let disjoint = run(&[
            "Mon 1.1.2024",
            "9:00-10:00 First (@A)",
            "10:00-11:00 Second (@B)",
        ]);

        assert_eq!(overlapping.warnings.len(), 1);
        assert_eq!(overlapping.warnings[0].kind, WarningKind::Overlap);
        assert!(disjoint.warnings.is_empty());
        assert!(close(
            overlapping.category_total("@A").unwrap(),
            disjoint.category_total("@A").unwrap()
        ));
        assert!(close(
            overlapping.category_total("@B").unwrap(),
            disjoint.category_total("@B").unwrap()
        ));
    }

    #[test]
    fn overlap_is_not_tracked_across_days() {
        let result = run(&[
            "Mon 1.1.2024",
            "9:00-17:00 Work (@A)",
            "Tue 2.1.2024",
            "8:00-9:00 Earlier start (@A)",
        ]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn days_flush_at_headers_and_end_of_input() {
        let result = run(&[
            "Mon 1.1.2024",
            "9:00-10:00 One (@A)",
            "Tue 2.1.2024",
            "9:00-11:00 Two (@A)",
        ]);
        assert_eq!(result.days.len(), 2);
        assert_eq!(result.days[0].label, "Mon 1.1.2024");
        assert!(close(result.days[0].total_minutes, 60.0));
        assert_eq!(result.days[1].label, "Tue 2.1.2024");
        assert!(close(result.days[1].total_minutes, 120.0));
    }

    #[test]
    fn empty_days_are_not_flushed() {
        let result = run(&[
            "Mon 1.1.2024",
            "Tue 2.1.2024",
            "9:00-10:00 Only real day (@A)",
        ]);
        assert_eq!(result.days.len(), 1);
        assert_eq!(result.days[0].label, "Tue 2.1.2024");
    }

    #[test]
    fn entries_before_first_header_have_empty_label() {
        let result = run(&["9:00-10:00 Headerless (@A)"]);
        assert_eq!(result.days.len(), 1);
        assert_eq!(result.days[0].label, "");
    }

    #[test]
    fn notes_collect_stripped_descriptions() {
        let result = run(&[
            "Mon 1.1.2024",
            "9:00-10:00 Wrote report (@A)",
            "10:00-11:00 Meetings (@A)",
        ]);
        assert_eq!(
            result.days[0].notes,
            vec!["Wrote report".to_string(), "Meetings".to_string()]
        );
    }

    #[test]
    fn other_lines_are_ignored() {
        let result = run(&[
            "Mon 1.1.2024",
            "a stray note",
            "9:00-10:00 Work (@A)",
            "",
        ]);
        assert!(close(result.category_total("@A").unwrap(), 60.0));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn category_filter_drops_other_categories() {
        let options = AggregateOptions {
            category_filter: Some("@A".to_string()),
            ..AggregateOptions::new(&IdentityResolver)
        };
        let result = run_with(
            &["Mon 1.1.2024", "9:00-10:00 Shared (@A/@B)"],
            &options,
        );
        assert!(close(result.category_total("@A").unwrap(), 30.0));
        assert!(result.category_total("@B").is_none());
        // The unmatched half is dropped, not redistributed.
        assert!(close(result.tree.total, 30.0));
        assert!(close(result.days[0].filtered_minutes, 30.0));
        assert!(close(result.days[0].total_minutes, 60.0));
    }

    #[test]
    fn scale_factor_multiplies_every_duration() {
        let options = AggregateOptions {
            scale: 0.5,
            ..AggregateOptions::new(&IdentityResolver)
        };
        let result = run_with(&["Mon 1.1.2024", "9:00-11:00 Work (@A)"], &options);
        assert!(close(result.category_total("@A").unwrap(), 60.0));
        assert!(close(result.days[0].total_minutes, 60.0));
    }

    #[test]
    fn all_category_is_expanded() {
        let replacement = vec!["@A".to_string(), "@B".to_string()];
        let options = AggregateOptions {
            all_replacement: &replacement,
            ..AggregateOptions::new(&IdentityResolver)
        };
        let result = run_with(&["Mon 1.1.2024", "9:00-10:00 Everything (@ALL)"], &options);
        assert!(result.category_total(ALL_CATEGORY).is_none());
        assert!(close(result.category_total("@A").unwrap(), 30.0));
        assert!(close(result.category_total("@B").unwrap(), 30.0));
    }

    #[test]
    fn all_category_joins_explicit_categories() {
        let replacement = vec!["@B".to_string()];
        let options = AggregateOptions {
            all_replacement: &replacement,
            ..AggregateOptions::new(&IdentityResolver)
        };
        let result = run_with(
            &["Mon 1.1.2024", "9:00-10:00 Mixed (@A @ALL)"],
            &options,
        );
        assert!(result.category_total(ALL_CATEGORY).is_none());
        assert!(close(result.category_total("@A").unwrap(), 30.0));
        assert!(close(result.category_total("@B").unwrap(), 30.0));
    }

    #[test]
    fn all_category_survives_without_replacement() {
        let result = run(&["Mon 1.1.2024", "9:00-10:00 Everything (@ALL)"]);
        assert!(close(result.category_total(ALL_CATEGORY).unwrap(), 60.0));
    }

    #[test]
    fn detail_mode_splits_across_activities_and_specifiers() {
        let options = AggregateOptions {
            detail: true,
            ..AggregateOptions::new(&IdentityResolver)
        };
        let result = run_with(
            &["Mon 1.1.2024", "9:00-10:00 @Read @Blogs @Mail (@HOME)"],
            &options,
        );
        let home = result.tree.get("@HOME").unwrap();
        assert!(close(home.total, 60.0));
        // First non-category tag is the activity; the rest are specifiers.
        let read = home.get("@Read").unwrap();
        assert!(close(read.total, 60.0));
        assert!(close(read.get("@Blogs").unwrap().total, 30.0));
        assert!(close(read.get("@Mail").unwrap().total, 30.0));
    }

    #[test]
    fn and_tags_become_activities() {
        let options = AggregateOptions {
            detail: true,
            ..AggregateOptions::new(&IdentityResolver)
        };
        let result = run_with(
            &["Mon 1.1.2024", "9:00-10:00 @Read stuff and @Rest (@HOME)"],
            &options,
        );
        let home = result.tree.get("@HOME").unwrap();
        assert!(close(home.get("@Read").unwrap().total, 30.0));
        assert!(close(home.get("@Rest").unwrap().total, 30.0));
    }

    #[test]
    fn detail_share_is_lossless_at_every_level() {
        let options = AggregateOptions {
            detail: true,
            scale: 2.0,
            ..AggregateOptions::new(&IdentityResolver)
        };
        let result = run_with(
            &["Mon 1.1.2024", "9:00-10:00 @Act @S1 @S2 and @Act2 (@A/@B)"],
            &options,
        );
        // 120 scaled minutes split over two categories.
        for category in ["@A", "@B"] {
            let node = result.tree.get(category).unwrap();
            assert!(close(node.total, 60.0));
            let activity_sum: f64 = node.children.values().map(|n| n.total).sum();
            assert!(close(activity_sum, node.total));
            for activity in node.children.values() {
                if !activity.children.is_empty() {
                    let specifier_sum: f64 =
                        activity.children.values().map(|n| n.total).sum();
                    assert!(close(specifier_sum, activity.total));
                }
            }
        }
    }

    #[test]
    fn detail_mode_without_extra_tags_keeps_category_total() {
        let options = AggregateOptions {
            detail: true,
            ..AggregateOptions::new(&IdentityResolver)
        };
        let result = run_with(&["Mon 1.1.2024", "9:00-10:00 plain work (@A)"], &options);
        let node = result.tree.get("@A").unwrap();
        assert!(close(node.total, 60.0));
        assert!(node.children.is_empty());
    }

    #[test]
    fn detail_mode_is_off_by_default() {
        let result = run(&["Mon 1.1.2024", "9:00-10:00 @Read blogs (@HOME)"]);
        assert!(result.tree.get("@HOME").unwrap().children.is_empty());
    }

    #[test]
    fn repeated_tag_weights_the_split() {
        let options = AggregateOptions {
            detail: true,
            ..AggregateOptions::new(&IdentityResolver)
        };
        // @S1 appears twice among the specifiers, so it receives two of the
        // three specifier shares.
        let result = run_with(
            &["Mon 1.1.2024", "9:00-10:00 @Act @S1 @S1 @S2 (@A)"],
            &options,
        );
        let activity = result.tree.get("@A").unwrap().get("@Act").unwrap();
        assert!(close(activity.get("@S1").unwrap().total, 40.0));
        assert!(close(activity.get("@S2").unwrap().total, 20.0));
    }

    #[test]
    fn aliases_apply_to_tags_but_not_categories() {
        let mut table = AliasTable::new();
        table.insert("@Reading", "@Read");
        table.insert("@HOME", "@CASTLE");
        let options = AggregateOptions {
            detail: true,
            ..AggregateOptions::new(&table)
        };
        let result = run_with(
            &["Mon 1.1.2024", "9:00-10:00 @Reading blogs (@HOME)"],
            &options,
        );
        // The category key stays @HOME; the activity tag is aliased.
        let home = result.tree.get("@HOME").unwrap();
        assert!(home.get("@Read").is_some());
        assert!(home.get("@Reading").is_none());
    }

    #[test]
    fn alias_is_equivalent_to_textual_replacement() {
        let mut table = AliasTable::new();
        table.insert("@Reading", "@Read");
        let aliased_options = AggregateOptions {
            detail: true,
            ..AggregateOptions::new(&table)
        };
        let aliased = run_with(
            &[
                "Mon 1.1.2024",
                "9:00-10:00 @Reading blogs (@HOME)",
                "10:00-11:00 @Read mail (@HOME)",
            ],
            &aliased_options,
        );

        let plain_options = AggregateOptions {
            detail: true,
            ..AggregateOptions::new(&IdentityResolver)
        };
        let replaced = run_with(
            &[
                "Mon 1.1.2024",
                "9:00-10:00 @Read blogs (@HOME)",
                "10:00-11:00 @Read mail (@HOME)",
            ],
            &plain_options,
        );

        let aliased_read = aliased.tree.get("@HOME").unwrap().get("@Read").unwrap();
        let replaced_read = replaced.tree.get("@HOME").unwrap().get("@Read").unwrap();
        assert!(close(aliased_read.total, replaced_read.total));
    }

    #[test]
    fn malformed_entry_aborts_with_line_content() {
        let err = aggregate(
            ["Mon 1.1.2024", "25:00-26:00 impossible (@A)"],
            &AggregateOptions::new(&IdentityResolver),
        )
        .unwrap_err();
        let AggregateError::MalformedLine { line, .. } = err else {
            panic!("expected malformed line error");
        };
        assert_eq!(line, "25:00-26:00 impossible (@A)");
    }

    #[test]
    fn scaling_to_target_hits_the_target() {
        let lines = [
            "Mon 1.1.2024",
            "9:00-10:30 Did work (@JOB)",
            "10:30-11:00 Did more (@JOB/@OTHER)",
        ];
        let result =
            aggregate_scaled_to(&lines, 480.0, &AggregateOptions::new(&IdentityResolver))
                .expect("scaling succeeds");
        assert!(close(result.tree.total, 480.0));
        // Proportions are preserved: @JOB had 105/120 of the raw total.
        assert!(close(result.category_total("@JOB").unwrap(), 480.0 * 105.0 / 120.0));
    }

    #[test]
    fn scaling_with_zero_raw_total_is_an_error() {
        let lines = ["Mon 1.1.2024", "9:00-9:00 nothing (@A)"];
        let err = aggregate_scaled_to(&lines, 480.0, &AggregateOptions::new(&IdentityResolver))
            .unwrap_err();
        assert!(matches!(err, AggregateError::DegenerateScaleTarget));
    }

    #[test]
    fn deterministic_across_runs() {
        let lines = [
            "Mon 1.1.2024",
            "9:00-10:00 @Read @Blogs and @Rest (@HOME/@JOB)",
            "Tue 2.1.2024",
            "8:00-12:30 more @Work (@JOB)",
        ];
        let options = AggregateOptions {
            detail: true,
            ..AggregateOptions::new(&IdentityResolver)
        };
        let first = run_with(&lines, &options);
        let second = run_with(&lines, &options);
        assert_eq!(first, second);
    }
}
