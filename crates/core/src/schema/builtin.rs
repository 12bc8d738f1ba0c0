//! Built-in schemas for the `user`, `user_profile` and `notice` kinds.

use std::sync::LazyLock;

use regex::Regex;

use super::{FieldNormalizer, FieldSpec, FieldType, RecordKind, RecordSchema};
use crate::constants::{
    ALLOWED_KEYWORDS, COLLEGE_KEY_MAX_CHARS, CREATED_AT_FIELD, EMAIL_FIELD, EMAIL_MAX_CHARS, GENDERS,
    MAIN_CATEGORIES, MILITARY_SERVICE_STATUSES, TAG_PREFIX, TITLE_MAX_CHARS, TOEIC_MAX, TOEIC_MIN,
    UPDATED_AT_FIELD,
};
use crate::index::{IndexSpec, Tier};
use crate::validate::{Constraint, ScoreCoercion};

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static COLLEGE_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());

fn timestamps(builder: super::RecordSchemaBuilder) -> super::RecordSchemaBuilder {
    builder
        .field(FieldSpec::optional(CREATED_AT_FIELD, FieldType::Timestamp))
        .field(FieldSpec::optional(UPDATED_AT_FIELD, FieldType::Timestamp))
}

/// Account record. The email is normalized before validation and must be unique
/// case-insensitively; uniqueness itself is the store's job.
#[must_use]
pub fn user_schema() -> RecordSchema {
    let builder = RecordSchema::builder(RecordKind::User.as_str()).field(
        FieldSpec::required(EMAIL_FIELD, FieldType::Text)
            .normalizer(FieldNormalizer::Email)
            .constraint(Constraint::max_length("email_length", EMAIL_MAX_CHARS))
            .constraint(Constraint::pattern("email_format", &EMAIL_REGEX)),
    );
    timestamps(builder).build().expect("user schema field names are unique")
}

/// Student profile. TOEIC lives inside `language_scores` rather than in a
/// dedicated column.
#[must_use]
pub fn user_profile_schema(coercion: ScoreCoercion) -> RecordSchema {
    let builder = RecordSchema::builder(RecordKind::UserProfile.as_str())
        .field(FieldSpec::required("user_id", FieldType::Text))
        .field(
            FieldSpec::required("gender", FieldType::Enum)
                .constraint(Constraint::one_of("gender_enum", GENDERS)),
        )
        .field(
            FieldSpec::required("age", FieldType::Integer)
                .constraint(Constraint::range("age_range", 15.0, 100.0)),
        )
        .field(FieldSpec::required("major", FieldType::Text))
        .field(FieldSpec::optional("college", FieldType::Text))
        .field(
            FieldSpec::required("grade", FieldType::Integer)
                .constraint(Constraint::range("grade_range", 1.0, 6.0)),
        )
        .field(
            FieldSpec::required("keywords", FieldType::TextArray)
                .normalizer(FieldNormalizer::Tags)
                .constraint(Constraint::non_empty("keywords_not_empty"))
                .constraint(Constraint::element_prefix("keywords_hash_prefix", TAG_PREFIX))
                .constraint(Constraint::distinct("keywords_unique"))
                .constraint(Constraint::whitelist("keywords_allowed", ALLOWED_KEYWORDS)),
        )
        .field(
            FieldSpec::optional("military_service", FieldType::Enum)
                .constraint(Constraint::one_of("military_service_enum", MILITARY_SERVICE_STATUSES)),
        )
        .field(
            FieldSpec::optional("income_bracket", FieldType::Integer)
                .constraint(Constraint::range("income_bracket_range", 0.0, 10.0)),
        )
        .field(
            FieldSpec::optional("gpa", FieldType::Decimal)
                .normalizer(FieldNormalizer::Decimal2)
                .constraint(Constraint::range("gpa_range", 0.0, 4.5)),
        )
        .field(
            FieldSpec::optional("language_scores", FieldType::Json)
                .constraint(Constraint::object_kind("language_scores_object"))
                .constraint(Constraint::keyed_digits("toeic_digits", "toeic", coercion))
                .constraint(Constraint::keyed_range(
                    "toeic_range",
                    "toeic",
                    TOEIC_MIN,
                    TOEIC_MAX,
                    coercion,
                )),
        );
    timestamps(builder).build().expect("user_profile schema field names are unique")
}

/// Crawled notice. AI fields are filled by an external enrichment job and are
/// only read here.
#[must_use]
pub fn notice_schema() -> RecordSchema {
    let builder = RecordSchema::builder(RecordKind::Notice.as_str())
        .field(
            FieldSpec::required("college_key", FieldType::Text)
                .constraint(Constraint::max_length("college_key_length", COLLEGE_KEY_MAX_CHARS))
                .constraint(Constraint::pattern("college_key_format", &COLLEGE_KEY_REGEX)),
        )
        .field(
            FieldSpec::required("title", FieldType::Text)
                .constraint(Constraint::max_length("title_length", TITLE_MAX_CHARS)),
        )
        .field(
            FieldSpec::required("url", FieldType::Text)
                .constraint(Constraint::pattern("url_format", &URL_REGEX)),
        )
        .field(FieldSpec::optional("summary_raw", FieldType::Text))
        .field(FieldSpec::optional("summary_ai", FieldType::Text))
        .field(FieldSpec::optional("body_html", FieldType::Text))
        .field(FieldSpec::optional("body_text", FieldType::Text))
        .field(FieldSpec::optional("published_at", FieldType::Timestamp))
        .field(
            FieldSpec::optional("category_ai", FieldType::Enum)
                .constraint(Constraint::one_of("category_ai_enum", MAIN_CATEGORIES)),
        )
        .field(
            FieldSpec::optional("hashtags_ai", FieldType::TextArray)
                .normalizer(FieldNormalizer::Tags)
                .constraint(Constraint::element_prefix("hashtags_ai_hash_prefix", TAG_PREFIX)),
        )
        .field(
            FieldSpec::optional("detailed_hashtags", FieldType::TextArray)
                .normalizer(FieldNormalizer::Tags)
                .constraint(Constraint::element_prefix(
                    "detailed_hashtags_hash_prefix",
                    TAG_PREFIX,
                )),
        )
        .field(FieldSpec::optional("start_at_ai", FieldType::Timestamp))
        .field(FieldSpec::optional("end_at_ai", FieldType::Timestamp))
        .field(FieldSpec::optional("qualification_ai", FieldType::Object))
        .field(FieldSpec::optional("content_hash", FieldType::Text))
        .index(
            IndexSpec::new()
                .field(Tier::A, "title")
                .field(Tier::B, "hashtags_ai")
                .field(Tier::B, "detailed_hashtags")
                .field(Tier::C, "body_text")
                .synonyms(Tier::D, "college_key"),
        );
    timestamps(builder).build().expect("notice schema field names are unique")
}
