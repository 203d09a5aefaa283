//! Core domain logic for the timesheet tally.
//!
//! This crate contains the fundamental types and logic for:
//! - Line classification: date headers, time-range entries, everything else
//! - Tag handling: category/tag extraction and the aliasing seam
//! - Aggregation: per-day totals and the category → activity → specifier tree
//!
//! The crate performs no I/O; callers hand it an already-materialized,
//! ordered sequence of lines and consume the finished [`Aggregation`].

mod aggregate;
pub mod line;
pub mod tags;

pub use aggregate::{
    ALL_CATEGORY, AggregateError, AggregateOptions, Aggregation, AggregationNode, DaySummary,
    Warning, WarningKind, aggregate, aggregate_scaled_to,
};
pub use line::{Entry, InvalidTime, LineKind, classify, is_date_header, is_entry};
pub use tags::{
    AliasTable, IdentityResolver, TagResolver, extract_and_tags, extract_categories, extract_tags,
};
