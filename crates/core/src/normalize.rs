//! Pre-validation normalizers.

use serde_json::{Number, Value};

use crate::schema::{FieldNormalizer, Record, RecordSchema};

/// Trims surrounding whitespace and lower-cases an email address.
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Trims every tag and drops blank ones. Order, case and duplicates are kept so
/// that prefix and uniqueness rules still see what the caller sent.
#[must_use]
pub fn normalize_tags<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter()
        .map(|tag| tag.as_ref().trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Rounds to two decimal places. Non-finite input is returned unchanged.
#[must_use]
pub fn round_decimal(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    (value * 100.0).round() / 100.0
}

/// Applies the pre-validation normalizers (email, tags) in place. Values of an
/// unexpected shape are left untouched for the validator to report.
pub fn normalize_record(schema: &RecordSchema, record: &mut Record) {
    apply_matching(schema, record, FieldNormalizer::runs_before_validation);
}

/// Applies the normalizers that must see an already validated value, so that
/// range checks run on what the caller sent (`4.504` is rejected, not rounded
/// to `4.5`).
pub fn finalize_record(schema: &RecordSchema, record: &mut Record) {
    apply_matching(schema, record, |n| !n.runs_before_validation());
}

fn apply_matching(
    schema: &RecordSchema,
    record: &mut Record,
    select: impl Fn(FieldNormalizer) -> bool,
) {
    for spec in schema.fields() {
        let Some(normalizer) = spec.field_normalizer().filter(|n| select(*n)) else {
            continue;
        };
        let Some(value) = record.get_mut(spec.name()) else {
            continue;
        };
        apply(normalizer, value);
    }
}

fn apply(normalizer: FieldNormalizer, value: &mut Value) {
    match normalizer {
        FieldNormalizer::Email => {
            if let Value::String(s) = value {
                *s = normalize_email(s);
            }
        },
        FieldNormalizer::Tags => {
            // Arrays with non-text elements are left for the type check.
            let Value::Array(items) = value else {
                return;
            };
            let texts: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
            if let Some(texts) = texts {
                *items = normalize_tags(&texts).into_iter().map(Value::String).collect();
            }
        },
        FieldNormalizer::Decimal2 => {
            if !value.is_f64() {
                return;
            }
            if let Some(n) = value.as_f64().map(round_decimal).and_then(Number::from_f64) {
                *value = Value::Number(n);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{into_record, notice_schema, user_profile_schema, user_schema};
    use crate::validate::ScoreCoercion;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email(" Test@Example.COM "), "test@example.com");
    }

    #[test]
    fn email_normalization_is_idempotent() {
        for raw in [" Test@Example.COM ", "a@b.c", "\tMiXeD@Case.Org\n", ""] {
            let once = normalize_email(raw);
            assert_eq!(normalize_email(&once), once);
        }
    }

    #[test]
    fn tags_are_trimmed_not_folded_or_deduped() {
        let tags = normalize_tags(&[" #장학 ", "", "#ABEEK", "  ", "#장학"]);
        assert_eq!(tags, vec!["#장학", "#ABEEK", "#장학"]);
        assert_eq!(normalize_tags(&tags), tags);
    }

    #[test]
    fn decimals_round_to_two_places() {
        assert!((round_decimal(3.456) - 3.46).abs() < f64::EPSILON);
        assert!((round_decimal(4.5) - 4.5).abs() < f64::EPSILON);
        assert!(round_decimal(f64::NAN).is_nan());
    }

    #[test]
    fn record_normalization_touches_only_declared_fields() {
        let mut user = into_record(json!({"email": "  Student@Yonsei.AC.KR", "note": " X "})).unwrap();
        normalize_record(&user_schema(), &mut user);
        assert_eq!(user["email"], json!("student@yonsei.ac.kr"));
        assert_eq!(user["note"], json!(" X "));
    }

    #[test]
    fn profile_keywords_and_gpa_are_normalized() {
        let schema = user_profile_schema(ScoreCoercion::Textual);
        let mut profile =
            into_record(json!({"keywords": [" #장학", "#취업 ", " "], "gpa": 3.856, "age": 20}))
                .unwrap();
        normalize_record(&schema, &mut profile);
        assert_eq!(profile["keywords"], json!(["#장학", "#취업"]));
        assert_eq!(profile["gpa"], json!(3.856));

        finalize_record(&schema, &mut profile);
        assert_eq!(profile["gpa"], json!(3.86));
        assert_eq!(profile["age"], json!(20));
    }

    #[test]
    fn mistyped_values_are_left_alone() {
        let mut notice = into_record(json!({"hashtags_ai": ["#a", 1], "detailed_hashtags": "#b"})).unwrap();
        normalize_record(&notice_schema(), &mut notice);
        assert_eq!(notice["hashtags_ai"], json!(["#a", 1]));
        assert_eq!(notice["detailed_hashtags"], json!("#b"));
    }
}
