//! Environment variable parsing with warn-level logging for invalid values.

use std::fmt::Display;
use std::str::FromStr;

use crate::validate::ScoreCoercion;

/// Selects how keyed score values (e.g. `language_scores.toeic`) are coerced to text.
pub const SCORE_COERCION_ENV: &str = "NOTICEBOARD_SCORE_COERCION";

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn env_parse_with_default<T: FromStr + Display>(var: &str, default: T) -> T {
    parse_with_default(var, std::env::var(var).ok().as_deref(), default)
}

fn parse_with_default<T: FromStr + Display>(var: &str, raw: Option<&str>, default: T) -> T {
    match raw {
        Some(v) => match v.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        None => default,
    }
}

/// Engine-wide settings resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    pub score_coercion: ScoreCoercion,
}

impl EngineConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self { score_coercion: env_parse_with_default(SCORE_COERCION_ENV, ScoreCoercion::default()) }
    }
}
