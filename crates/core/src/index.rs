//! Weighted search documents derived from record fields.
//!
//! Tokenization follows the `simple` text-search configuration: no stemming and
//! no stop words, just case folding and splitting on anything that is not a
//! letter or digit.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use crate::constants::college_synonyms;
use crate::schema::{Record, RecordSchema};

/// Relevance tier of a token. `A` ranks highest, `D` lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
    D,
}

impl Tier {
    pub const ALL: &'static [Tier] = &[Self::A, Self::B, Self::C, Self::D];

    /// Default ranking weight of the tier (`{0.1, 0.2, 0.4, 1.0}` for `D..=A`).
    #[must_use]
    pub const fn weight(&self) -> f32 {
        match *self {
            Self::A => 1.0,
            Self::B => 0.4,
            Self::C => 0.2,
            Self::D => 0.1,
        }
    }

    #[must_use]
    pub const fn as_char(&self) -> char {
        match *self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Where an index entry takes its text from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "field", rename_all = "snake_case")]
pub enum IndexSource {
    /// A text or text-array field, tokenized as-is.
    Field(String),
    /// A college key field, expanded through the synonym table.
    CollegeSynonyms(String),
}

impl IndexSource {
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self {
            Self::Field(name) | Self::CollegeSynonyms(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub tier: Tier,
    #[serde(flatten)]
    pub source: IndexSource,
}

/// Ordered list of index sources. Entries are concatenated in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexSpec {
    entries: Vec<IndexEntry>,
}

impl IndexSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, tier: Tier, name: impl Into<String>) -> Self {
        self.entries.push(IndexEntry { tier, source: IndexSource::Field(name.into()) });
        self
    }

    #[must_use]
    pub fn synonyms(mut self, tier: Tier, name: impl Into<String>) -> Self {
        self.entries.push(IndexEntry { tier, source: IndexSource::CollegeSynonyms(name.into()) });
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fields whose change requires the document to be rebuilt.
    #[must_use]
    pub fn triggers(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|e| e.source.field_name()).collect()
    }

    /// Whether any of `fields` feeds the index.
    #[must_use]
    pub fn is_triggered_by<'a, I>(&self, fields: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let triggers = self.triggers();
        fields.into_iter().any(|f| triggers.contains(f))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexedToken {
    pub token: String,
    pub tier: Tier,
}

/// Ordered `(token, tier)` pairs. Duplicates are kept; position matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchDocument {
    tokens: Vec<IndexedToken>,
}

impl SearchDocument {
    #[must_use]
    pub fn tokens(&self) -> &[IndexedToken] {
        &self.tokens
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens of one tier, in document order.
    pub fn tier(&self, tier: Tier) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter(move |t| t.tier == tier).map(|t| t.token.as_str())
    }

    /// Highest tier at which `token` occurs.
    #[must_use]
    pub fn best_tier(&self, token: &str) -> Option<Tier> {
        self.tokens.iter().filter(|t| t.token == token).map(|t| t.tier).min()
    }

    fn push_text(&mut self, text: &str, tier: Tier) {
        self.tokens.extend(tokenize(text).into_iter().map(|token| IndexedToken { token, tier }));
    }

    /// Renders the document as a `tsvector` literal: `'token':pos[A-D]`, one
    /// lexeme per distinct token, positions 1-based.
    #[must_use]
    pub fn to_tsvector_literal(&self) -> String {
        let mut lexemes: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (i, t) in self.tokens.iter().enumerate() {
            let position = format!("{}{}", i.saturating_add(1), t.tier);
            lexemes.entry(t.token.as_str()).or_default().push(position);
        }
        lexemes
            .iter()
            .map(|(token, positions)| {
                format!("'{}':{}", token.replace('\'', "''"), positions.join(","))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Splits text into lower-cased tokens on every non-alphanumeric character.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text.nfkc().collect();
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|piece| !piece.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Builds the search document of a record from its schema's index spec.
///
/// Absent, null or mistyped source fields contribute nothing, and an unknown
/// college key expands to nothing. This never fails.
#[must_use]
pub fn build_index(schema: &RecordSchema, record: &Record) -> SearchDocument {
    let mut doc = SearchDocument::default();
    for entry in schema.index().entries() {
        let value = record.get(entry.source.field_name());
        match &entry.source {
            IndexSource::Field(_) => match value {
                Some(Value::String(text)) => doc.push_text(text, entry.tier),
                Some(Value::Array(items)) => {
                    for text in items.iter().filter_map(Value::as_str) {
                        doc.push_text(text, entry.tier);
                    }
                },
                _ => {},
            },
            IndexSource::CollegeSynonyms(_) => {
                let phrase = value.and_then(Value::as_str).and_then(college_synonyms);
                if let Some(phrase) = phrase {
                    doc.push_text(phrase, entry.tier);
                } else if let Some(key) = value.and_then(Value::as_str) {
                    tracing::debug!(college_key = key, "no synonyms for college key");
                }
            },
        }
    }
    doc
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{into_record, notice_schema};

    fn notice(value: Value) -> SearchDocument {
        build_index(&notice_schema(), &into_record(value).unwrap())
    }

    #[test]
    fn tokenize_strips_hash_and_splits_punctuation() {
        assert_eq!(tokenize("#장학"), vec!["장학"]);
        assert_eq!(tokenize("#공모전/대회"), vec!["공모전", "대회"]);
        assert_eq!(tokenize("Scholarship  Notice!"), vec!["scholarship", "notice"]);
        assert!(tokenize("  -- ").is_empty());
    }

    #[test]
    fn tokenize_folds_fullwidth_forms() {
        assert_eq!(tokenize("ＴＯＥＩＣ ９００"), vec!["toeic", "900"]);
    }

    #[test]
    fn notice_tokens_land_in_their_tiers() {
        let doc = notice(json!({
            "title": "Scholarship Notice",
            "hashtags_ai": ["#장학"],
            "detailed_hashtags": ["#국가장학"],
            "body_text": "신청 기간 안내",
            "college_key": "engineering"
        }));
        assert_eq!(doc.tier(Tier::A).collect::<Vec<_>>(), vec!["scholarship", "notice"]);
        assert_eq!(doc.tier(Tier::B).collect::<Vec<_>>(), vec!["장학", "국가장학"]);
        assert_eq!(doc.tier(Tier::C).collect::<Vec<_>>(), vec!["신청", "기간", "안내"]);
        let d: Vec<&str> = doc.tier(Tier::D).collect();
        for expected in ["공과", "공학", "공대"] {
            assert!(d.contains(&expected), "{d:?}");
        }
    }

    #[test]
    fn tiers_are_emitted_in_order() {
        let doc = notice(json!({
            "title": "공지",
            "hashtags_ai": ["#행사"],
            "body_text": "본문",
            "college_key": "music"
        }));
        let tiers: Vec<Tier> = doc.tokens().iter().map(|t| t.tier).collect();
        let mut sorted = tiers.clone();
        sorted.sort();
        assert_eq!(tiers, sorted);
    }

    #[test]
    fn hashtag_duplicates_are_kept() {
        let doc = notice(json!({
            "title": "t",
            "hashtags_ai": ["#장학"],
            "detailed_hashtags": ["#장학"],
            "college_key": "main"
        }));
        assert_eq!(doc.tier(Tier::B).collect::<Vec<_>>(), vec!["장학", "장학"]);
    }

    #[test]
    fn unknown_college_key_yields_empty_tier_d() {
        let doc = notice(json!({"title": "공지", "college_key": "unknown_key"}));
        assert_eq!(doc.tier(Tier::D).count(), 0);
        assert_eq!(doc.tier(Tier::A).count(), 1);
    }

    #[test]
    fn missing_and_null_fields_contribute_nothing() {
        let doc = notice(json!({"title": null, "body_text": 42, "hashtags_ai": null}));
        assert!(doc.is_empty());
    }

    #[test]
    fn building_twice_is_deterministic() {
        let value = json!({
            "title": "Scholarship Notice",
            "hashtags_ai": ["#장학"],
            "college_key": "engineering"
        });
        assert_eq!(notice(value.clone()), notice(value));
    }

    #[test]
    fn best_tier_prefers_highest() {
        let doc = notice(json!({"title": "장학", "hashtags_ai": ["#장학"], "college_key": "x"}));
        assert_eq!(doc.best_tier("장학"), Some(Tier::A));
        assert_eq!(doc.best_tier("없음"), None);
    }

    #[test]
    fn triggers_cover_every_source() {
        let schema = notice_schema();
        let triggers: Vec<&str> = schema.index().triggers().into_iter().collect();
        assert_eq!(
            triggers,
            vec!["body_text", "college_key", "detailed_hashtags", "hashtags_ai", "title"]
        );
        assert!(schema.index().is_triggered_by(["url", "title"]));
        assert!(!schema.index().is_triggered_by(["url", "summary_raw"]));
    }

    #[test]
    fn tsvector_literal_groups_positions() {
        let doc = notice(json!({"title": "장학 공지", "hashtags_ai": ["#장학"], "college_key": "x"}));
        assert_eq!(doc.to_tsvector_literal(), "'공지':2A '장학':1A,3B");

        let doc = notice(json!({"title": "장학 공지", "hashtags_ai": ["#공지", "#장학"], "college_key": "x"}));
        assert_eq!(doc.to_tsvector_literal(), "'공지':2A,3B '장학':1A,4B");
    }
}
