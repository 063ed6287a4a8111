// src/extractors/coercion.rs

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;

use super::record::Value;

/// Canonical field names parsed as base-10 integers.
pub const INTEGER_FIELDS: &[&str] = &[
    "rk", "no", "gp", "g", "a", "tp", "pim", "plus", "minus", "plusminus", "gwg", "ppg", "shg",
    "sog", "foplus", "fominus", "fo", "weight", "height", "gpt", "gkd", "gpi", "ga", "svs", "so",
    "w", "l",
];

/// Canonical field names parsed as decimals.
pub const FLOAT_FIELDS: &[&str] = &["sgperc", "foperc", "gaa", "svsperc"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How a field's cell text turns into a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Integer,
    Float,
    /// `MM:SS` time on ice.
    Duration,
    /// `YYYY-MM-DD`, strictly.
    Date,
    /// First three characters, e.g. a nationality code.
    Code,
}

impl Coercion {
    /// Never fails: text that does not fit the shape becomes [`Value::Absent`].
    pub fn apply(self, text: &str) -> Value {
        let text = text.trim();
        let parsed = match self {
            Coercion::Integer => text.parse().ok().map(Value::Integer),
            Coercion::Float => text.parse().ok().map(Value::Float),
            Coercion::Duration => parse_duration(text).map(Value::Duration),
            Coercion::Date => NaiveDate::parse_from_str(text, DATE_FORMAT).ok().map(Value::Date),
            Coercion::Code => {
                let code: String = text.chars().take(3).collect();
                (code.chars().count() == 3).then_some(Value::Code(code))
            }
        };
        parsed.unwrap_or(Value::Absent)
    }
}

fn parse_duration(text: &str) -> Option<Duration> {
    let (minutes, seconds) = text.split_once(':')?;
    let minutes: u64 = minutes.trim().parse().ok()?;
    let seconds: u64 = seconds.trim().parse().ok()?;
    minutes.checked_mul(60)?.checked_add(seconds).map(Duration::from_secs)
}

/// Field name to coercion table. Fields without a rule stay text.
#[derive(Debug, Clone, Default)]
pub struct CoercionRegistry {
    rules: HashMap<String, Coercion>,
}

impl CoercionRegistry {
    /// Rules for every typed column the stats site publishes.
    pub fn standard() -> Self {
        let registry = INTEGER_FIELDS
            .iter()
            .fold(Self::default(), |registry, name| registry.with_rule(name, Coercion::Integer));
        FLOAT_FIELDS
            .iter()
            .fold(registry, |registry, name| registry.with_rule(name, Coercion::Float))
            .with_rule("mip", Coercion::Duration)
            .with_rule("birthdate", Coercion::Date)
            .with_rule("nationalityclub", Coercion::Code)
    }

    /// No rules at all: every field comes out as the cell's text.
    pub fn text_only() -> Self {
        Self::default()
    }

    /// Adds or replaces the rule for one field.
    pub fn with_rule(mut self, field: &str, coercion: Coercion) -> Self {
        self.rules.insert(field.to_string(), coercion);
        self
    }

    pub fn rule(&self, field: &str) -> Option<Coercion> {
        self.rules.get(field).copied()
    }

    pub fn coerce(&self, field: &str, text: &str) -> Value {
        match self.rule(field) {
            Some(coercion) => coercion.apply(text),
            None => Value::Text(text.to_string()),
        }
    }
}
