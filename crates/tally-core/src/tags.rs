//! Tag and category extraction, plus the tag aliasing seam.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Matches one `@word` tag token.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").expect("tag regex is valid"));

/// Matches an `@word` tag introduced by the literal word "and".
static AND_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"and (@\w+)").expect("and-tag regex is valid"));

/// Separators inside a category group: `/`, `+`, a space, or `", "`.
static CATEGORY_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/|\+| |, ").expect("category split regex is valid"));

/// A piece that looks like a tag token: leading `@` followed by word chars.
static TAG_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@\w+").expect("tag prefix regex is valid"));

/// Maps an extracted tag to the tag used for aggregation.
///
/// Injected by reference into the aggregator; [`IdentityResolver`] is the
/// default, [`AliasTable`] the file-backed implementation.
pub trait TagResolver {
    /// Returns the tag to aggregate under.
    fn resolve(&self, tag: &str) -> String;
}

impl<'a> std::fmt::Debug for (dyn TagResolver + 'a) {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TagResolver")
    }
}

/// Resolver that maps every tag to itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl TagResolver for IdentityResolver {
    fn resolve(&self, tag: &str) -> String {
        tag.to_string()
    }
}

/// A tag-to-tag alias lookup table.
///
/// Tags without a rule resolve to themselves, so an empty table behaves
/// like [`IdentityResolver`].
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    rules: HashMap<String, String>,
}

impl AliasTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an alias rule from one tag to another.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.rules.insert(from.into(), to.into());
    }

    /// Number of alias rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the table holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl TagResolver for AliasTable {
    fn resolve(&self, tag: &str) -> String {
        self.rules
            .get(tag)
            .cloned()
            .unwrap_or_else(|| tag.to_string())
    }
}

impl FromIterator<(String, String)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

/// Extracts category tokens from the line's trailing parenthesized group.
///
/// The group runs from the *last* `(` to the *last* `)` so descriptions may
/// contain unrelated parentheses. Pieces are split on `/`, `+`, whitespace,
/// or `", "`, trimmed, and kept when they start with a tag token. Order is
/// preserved and duplicates are retained. Categories are not passed through
/// a resolver; aliasing applies to tags only.
pub fn extract_categories(line: &str) -> Vec<String> {
    let (Some(start), Some(end)) = (line.rfind('('), line.rfind(')')) else {
        return Vec::new();
    };
    if start + 1 >= end {
        return Vec::new();
    }
    CATEGORY_SPLIT_RE
        .split(&line[start + 1..end])
        .map(str::trim)
        .filter(|piece| TAG_PREFIX_RE.is_match(piece))
        .map(str::to_string)
        .collect()
}

/// Extracts every `@word` token on the line, left to right, duplicates
/// retained, each passed through the resolver.
pub fn extract_tags(line: &str, resolver: &dyn TagResolver) -> Vec<String> {
    raw_tags(line)
        .into_iter()
        .map(|tag| resolver.resolve(tag))
        .collect()
}

/// Extracts every `@word` token immediately preceded by the word "and",
/// each passed through the resolver.
pub fn extract_and_tags(line: &str, resolver: &dyn TagResolver) -> Vec<String> {
    raw_and_tags(line)
        .into_iter()
        .map(|tag| resolver.resolve(tag))
        .collect()
}

/// Unresolved `@word` tokens, for callers that filter before aliasing.
pub(crate) fn raw_tags(line: &str) -> Vec<&str> {
    TAG_RE.find_iter(line).map(|m| m.as_str()).collect()
}

/// Unresolved "and"-introduced tokens.
pub(crate) fn raw_and_tags(line: &str) -> Vec<&str> {
    AND_TAG_RE
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}
