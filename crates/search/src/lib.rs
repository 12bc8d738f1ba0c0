//! Query side of the notice index
//!
//! Search is a three-step affair:
//! 1. sanitize and tokenize the raw query with the same tokenizer the index uses
//! 2. filter candidate records (college, hashtags)
//! 3. rank the surviving documents by tier weight and cut a page

#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{Result, bail};
use noticeboard_core::{Record, SearchDocument, env_parse_with_default, tokenize};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Overrides the page size used when a caller does not pass one.
pub const SEARCH_DEFAULT_LIMIT_ENV: &str = "NOTICEBOARD_SEARCH_DEFAULT_LIMIT";

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;
pub const MAX_OFFSET: usize = 10_000;
pub const MAX_QUERY_CHARS: usize = 500;
pub const MAX_HASHTAG_CHARS: usize = 50;

/// College filter value that disables college filtering.
pub const ALL_COLLEGES: &str = "all";

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static QUERY_STRIP_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[;'"\\]"#).unwrap());

static HASHTAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[#\w가-힣\s-]+$").unwrap());

/// Collapses whitespace, strips quote and statement characters, caps the length.
#[must_use]
pub fn sanitize_search_query(raw: &str) -> String {
    let collapsed = WHITESPACE_REGEX.replace_all(raw.trim(), " ");
    let stripped = QUERY_STRIP_REGEX.replace_all(&collapsed, "");
    stripped.chars().take(MAX_QUERY_CHARS).collect()
}

/// Trims each tag, drops overlong or malformed ones, de-duplicates in order.
#[must_use]
pub fn normalize_hashtag_filter<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.as_ref().trim();
        if tag.chars().count() > MAX_HASHTAG_CHARS || !HASHTAG_REGEX.is_match(tag) {
            tracing::debug!(tag, "dropping hashtag filter value");
            continue;
        }
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_owned());
        }
    }
    tags
}

/// How query tokens combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Every token must occur in the document.
    #[default]
    All,
    /// At least one token must occur.
    Any,
}

impl MatchMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::All => "and",
            Self::Any => "or",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "and" | "all" => Ok(Self::All),
            "or" | "any" => Ok(Self::Any),
            other => bail!("unknown match mode: {other}"),
        }
    }
}

/// A sanitized, tokenized search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    text: String,
    tokens: Vec<String>,
    mode: MatchMode,
}

impl SearchQuery {
    /// # Errors
    /// Fails when nothing searchable is left after sanitizing.
    pub fn parse(raw: &str, mode: MatchMode) -> Result<Self> {
        let text = sanitize_search_query(raw);
        let mut tokens: Vec<String> = Vec::new();
        for token in tokenize(&text) {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        if tokens.is_empty() {
            bail!("search query has no searchable terms");
        }
        Ok(Self { text, tokens, mode })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub const fn mode(&self) -> MatchMode {
        self.mode
    }
}

/// Limit and offset after clamping to the allowed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    /// Page size used when the caller gives none, from the environment.
    #[must_use]
    pub fn default_limit() -> usize {
        env_parse_with_default(SEARCH_DEFAULT_LIMIT_ENV, DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn clamped(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self {
            limit: limit.unwrap_or_else(Self::default_limit).clamp(1, MAX_LIMIT),
            offset: offset.unwrap_or(0).min(MAX_OFFSET),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}

/// Record-level filters applied before ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoticeFilter {
    college: Option<String>,
    hashtags: Vec<String>,
}

impl NoticeFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to one college key; `"all"` clears the restriction.
    #[must_use]
    pub fn college(mut self, college: impl Into<String>) -> Self {
        let college = college.into();
        self.college = (college != ALL_COLLEGES).then_some(college);
        self
    }

    /// Keeps notices whose `hashtags_ai` share at least one tag with `tags`.
    #[must_use]
    pub fn hashtags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.hashtags = normalize_hashtag_filter(tags);
        self
    }

    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(college) = &self.college {
            if record.get("college_key").and_then(Value::as_str) != Some(college.as_str()) {
                return false;
            }
        }
        if self.hashtags.is_empty() {
            return true;
        }
        record
            .get("hashtags_ai")
            .and_then(Value::as_array)
            .is_some_and(|tags| {
                tags.iter().filter_map(Value::as_str).any(|t| self.hashtags.iter().any(|h| h == t))
            })
    }
}

/// Scores a document against a query, `None` when it does not match.
///
/// Each query token contributes the weight of the highest tier it occurs in.
#[must_use]
pub fn rank(document: &SearchDocument, query: &SearchQuery) -> Option<f32> {
    let mut score = 0.0_f32;
    let mut hits = 0_usize;
    for token in query.tokens() {
        match document.best_tier(token) {
            Some(tier) => {
                score += tier.weight();
                hits = hits.saturating_add(1);
            },
            None if query.mode() == MatchMode::All => return None,
            None => {},
        }
    }
    (hits > 0).then_some(score)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}

/// Ranks `(id, document)` pairs, best first, ties broken by id, then pages.
#[must_use]
pub fn search_documents<'a, I>(documents: I, query: &SearchQuery, page: Page) -> Vec<SearchHit>
where
    I: IntoIterator<Item = (&'a str, &'a SearchDocument)>,
{
    let mut hits: Vec<SearchHit> = documents
        .into_iter()
        .filter_map(|(id, doc)| rank(doc, query).map(|score| SearchHit { id: id.to_owned(), score }))
        .collect();
    hits.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
    tracing::debug!(query = query.text(), matched = hits.len(), "ranked documents");
    hits.into_iter().skip(page.offset).take(page.limit).collect()
}
