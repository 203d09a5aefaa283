//! Flow command: renders the aggregation tree as a Sankey flow diagram.
//!
//! Links run category → activity → specifier, weighted by minutes. The
//! output is a single HTML document loading plotly from its CDN with the
//! node/link data inlined as JSON.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use tally_core::{AggregateOptions, AggregationNode, aggregate};

use crate::cli::FlowArgs;
use crate::config::Config;
use crate::format::{HourFormat, format_minutes};
use crate::input;

/// Placeholder leaf for activities with no specifier tags.
const NO_SPECIFIER_LABEL: &str = "None specified";

/// Key prefix keeping specifier nodes distinct from activity nodes sharing
/// the same tag.
const SPECIFIER_PREFIX: &str = "specifier_";

/// Runs the flow command.
pub fn run<W: Write>(writer: &mut W, args: &FlowArgs, config: &Config) -> Result<()> {
    let prepared = input::prepare(writer, &args.input, config)?;
    let options = AggregateOptions {
        category_filter: args.input.category.clone(),
        detail: true,
        all_replacement: &prepared.all_replacement,
        ..AggregateOptions::new(&prepared.aliases)
    };
    let result = aggregate(&prepared.lines, &options)?;

    let html = render_sankey(&result.tree, !args.no_specifiers);
    fs::write(&args.out, html)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    writeln!(writer, "wrote {}", args.out.display())?;
    Ok(())
}

/// Builds the Sankey HTML document from the aggregation tree.
///
/// Node keys are collected per tier and sorted; an activity with no
/// specifiers links to a unit-weight "None specified" leaf so every
/// activity reaches the third tier.
fn render_sankey(tree: &AggregationNode, with_specifiers: bool) -> String {
    let mut links: Vec<(String, String, f64)> = Vec::new();
    let mut category_labels: Vec<String> = Vec::new();
    let mut activity_labels: Vec<String> = Vec::new();
    let mut specifier_labels: Vec<String> = Vec::new();
    let mut activity_minutes: BTreeMap<String, f64> = BTreeMap::new();

    for (category, category_node) in &tree.children {
        if !category_labels.contains(category) {
            category_labels.push(category.clone());
        }
        for (activity, activity_node) in &category_node.children {
            if activity_node.total > 0.0 {
                *activity_minutes.entry(activity.clone()).or_insert(0.0) += activity_node.total;
                if !activity_labels.contains(activity) {
                    activity_labels.push(activity.clone());
                }
                links.push((category.clone(), activity.clone(), activity_node.total));
            }
        }

        if with_specifiers {
            for (activity, activity_node) in &category_node.children {
                // Zero-weight activities have no node in the diagram.
                if activity_node.total <= 0.0 {
                    continue;
                }
                if activity_node.children.is_empty() {
                    let key = format!("{SPECIFIER_PREFIX}{NO_SPECIFIER_LABEL}");
                    if !specifier_labels.contains(&key) {
                        specifier_labels.push(key.clone());
                    }
                    links.push((activity.clone(), key, 1.0));
                } else {
                    for (specifier, specifier_node) in &activity_node.children {
                        let key = format!("{SPECIFIER_PREFIX}{specifier}");
                        if !specifier_labels.contains(&key) {
                            specifier_labels.push(key.clone());
                        }
                        links.push((activity.clone(), key, specifier_node.total));
                    }
                }
            }
        }
    }

    category_labels.sort();
    activity_labels.sort();
    specifier_labels.sort();

    let mut keys: Vec<String> = category_labels.clone();
    keys.extend(activity_labels.iter().cloned());
    keys.extend(specifier_labels.iter().cloned());
    let index: HashMap<&str, usize> = keys
        .iter()
        .enumerate()
        .map(|(position, key)| (key.as_str(), position))
        .collect();

    let mut shown_labels: Vec<String> = Vec::with_capacity(keys.len());
    for category in &category_labels {
        let minutes = tree.get(category).map_or(0.0, |node| node.total);
        shown_labels.push(format!(
            "{} {}",
            category.replace('@', ""),
            format_minutes(minutes, HourFormat::Clock)
        ));
    }
    for activity in &activity_labels {
        let minutes = activity_minutes.get(activity).copied().unwrap_or(0.0);
        shown_labels.push(format!(
            "{} {}",
            activity.replace('@', ""),
            format_minutes(minutes, HourFormat::Clock)
        ));
    }
    for specifier in &specifier_labels {
        shown_labels.push(specifier.trim_start_matches(SPECIFIER_PREFIX).to_string());
    }

    let sources: Vec<usize> = links.iter().map(|(source, _, _)| index[source.as_str()]).collect();
    let targets: Vec<usize> = links.iter().map(|(_, target, _)| index[target.as_str()]).collect();
    let values: Vec<f64> = links.iter().map(|(_, _, value)| *value).collect();

    let data = serde_json::json!({
        "labels": shown_labels,
        "link": { "source": sources, "target": targets, "value": values },
    });

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>tally flow</title>\n\
         <script src=\"https://cdn.plot.ly/plotly-2.35.2.min.js\"></script>\n\
         </head>\n\
         <body>\n\
         <div id=\"flow\"></div>\n\
         <script>\n\
         const data = {data};\n\
         Plotly.newPlot(\"flow\", [{{type: \"sankey\", node: {{label: data.labels}}, link: data.link}}]);\n\
         </script>\n\
         </body>\n\
         </html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::IdentityResolver;

    fn detailed(lines: &[&str]) -> AggregationNode {
        aggregate(
            lines,
            &AggregateOptions {
                detail: true,
                ..AggregateOptions::new(&IdentityResolver)
            },
        )
        .expect("aggregation succeeds")
        .tree
    }

    #[test]
    fn renders_three_tiers() {
        let tree = detailed(&["Mon 1.1.2024", "9:00-10:00 @Read @Blogs (@HOME)"]);
        let html = render_sankey(&tree, true);

        assert!(html.contains("sankey"));
        assert!(html.contains("HOME 1:00"));
        assert!(html.contains("Read 1:00"));
        assert!(html.contains("Blogs"));
    }

    #[test]
    fn activity_without_specifiers_gets_placeholder_leaf() {
        let tree = detailed(&["Mon 1.1.2024", "9:00-10:00 @Read only (@HOME)"]);
        let html = render_sankey(&tree, true);
        assert!(html.contains(NO_SPECIFIER_LABEL));
    }

    #[test]
    fn specifier_tier_can_be_collapsed() {
        let tree = detailed(&["Mon 1.1.2024", "9:00-10:00 @Read @Blogs (@HOME)"]);
        let html = render_sankey(&tree, false);
        assert!(!html.contains("Blogs"));
        assert!(html.contains("Read 1:00"));
    }

    #[test]
    fn link_indices_stay_in_bounds() {
        let tree = detailed(&[
            "Mon 1.1.2024",
            "9:00-10:00 @Read @Blogs and @Rest (@HOME/@JOB)",
            "10:00-11:00 @Write drafts (@JOB)",
        ]);
        let html = render_sankey(&tree, true);
        let start = html.find("const data = ").expect("data assignment") + "const data = ".len();
        let end = html[start..].find(";\n").expect("data terminator") + start;
        let data: serde_json::Value = serde_json::from_str(&html[start..end]).expect("valid JSON");

        let label_count = data["labels"].as_array().unwrap().len();
        for field in ["source", "target"] {
            for value in data["link"][field].as_array().unwrap() {
                let position = usize::try_from(value.as_u64().unwrap()).unwrap();
                assert!(position < label_count);
            }
        }
    }
}
