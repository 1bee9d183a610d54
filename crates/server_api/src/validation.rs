//! Per-field rules applied to submitted forms before anything is persisted.
//!
//! Every rule sanitizes its field even when the check fails, so a rejected
//! form can be echoed back. Failures are collected in rule order and the
//! workflows only persist when the list is empty.

use std::{collections::HashMap, fmt, ops::RangeInclusive, sync::OnceLock};

use regex::Regex;
use shared::protocol::FieldError;

/// Closed range accepted for `number_in_stock`.
pub const STOCK_RANGE: RangeInclusive<i64> = 0..=500;

pub const NAME_REQUIRED: &str = "name must not be empty";
pub const TITLE_REQUIRED: &str = "title must not be empty";
pub const DESCRIPTION_REQUIRED: &str = "description must not be empty";
pub const PRICE_INVALID: &str = "please enter a non-negative price value";
pub const STOCK_INVALID: &str = "number in stock must be a positive integer below 500";
pub const PASSWORD_INCORRECT: &str = "incorrect password";

/// The shared value that gates every mutating form.
#[derive(Clone)]
pub struct GateSecret(String);

impl GateSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn admits(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl fmt::Debug for GateSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GateSecret(..)")
    }
}

/// A submitted field. A key sent once is a scalar, a repeated key is a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Absent,
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> &str {
        match self {
            Self::Absent => "",
            Self::Scalar(value) => value,
            Self::List(values) => values.first().map(String::as_str).unwrap_or_default(),
        }
    }

    /// Absent becomes empty, a scalar becomes a one-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Absent => Vec::new(),
            Self::Scalar(value) => vec![value.clone()],
            Self::List(values) => values.clone(),
        }
    }

    fn push(&mut self, value: String) {
        *self = match std::mem::replace(self, Self::Absent) {
            Self::Absent => Self::Scalar(value),
            Self::Scalar(first) => Self::List(vec![first, value]),
            Self::List(mut values) => {
                values.push(value);
                Self::List(values)
            }
        };
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: HashMap<String, FieldValue>,
}

static ABSENT: FieldValue = FieldValue::Absent;

impl FormData {
    /// Parses an `application/x-www-form-urlencoded` body.
    pub fn parse(body: &[u8]) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(body).into_owned())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields: HashMap<String, FieldValue> = HashMap::new();
        for (key, value) in pairs {
            fields
                .entry(key.into())
                .or_insert(FieldValue::Absent)
                .push(value.into());
        }
        Self { fields }
    }

    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&ABSENT)
    }
}

/// Sanitized echo of a numeric field plus its parsed value when the rule
/// passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checked<T> {
    pub echo: String,
    pub value: Option<T>,
}

pub struct FormValidator<'a> {
    form: &'a FormData,
    errors: Vec<FieldError>,
}

impl<'a> FormValidator<'a> {
    pub fn new(form: &'a FormData) -> Self {
        Self {
            form,
            errors: Vec::new(),
        }
    }

    pub fn required_text(&mut self, field: &str, message: &str) -> String {
        let trimmed = trim(self.form.get(field).as_scalar());
        if trimmed.is_empty() {
            self.reject(field, message);
        }
        escape_html(trimmed)
    }

    pub fn currency(&mut self, field: &str, message: &str) -> String {
        let trimmed = trim(self.form.get(field).as_scalar());
        if !is_currency(trimmed) {
            self.reject(field, message);
        }
        escape_html(trimmed)
    }

    pub fn bounded_int(
        &mut self,
        field: &str,
        range: RangeInclusive<i64>,
        message: &str,
    ) -> Checked<i64> {
        let trimmed = trim(self.form.get(field).as_scalar());
        let value = parse_int_in(trimmed, &range);
        if value.is_none() {
            self.reject(field, message);
        }
        Checked {
            echo: escape_html(trimmed),
            value,
        }
    }

    /// Compares the raw, untrimmed value against the secret.
    pub fn gated(&mut self, field: &str, secret: &GateSecret, message: &str) {
        if !secret.admits(self.form.get(field).as_scalar()) {
            self.reject(field, message);
        }
    }

    /// Normalizes the field into a list and escapes each element. Never fails.
    pub fn escaped_list(&mut self, field: &str) -> Vec<String> {
        self.form
            .get(field)
            .to_list()
            .iter()
            .map(|value| escape_html(value))
            .collect()
    }

    pub fn finish(self) -> Vec<FieldError> {
        self.errors
    }

    fn reject(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }
}

/// Replaces the characters `& " ' < > / \` and backtick with HTML entities.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Non-negative amount: optional `$`, optional `,` thousands grouping and an
/// optional two-digit fraction.
pub fn is_currency(value: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^\$?(0|[1-9][0-9]{0,2}(,[0-9]{3})+|[1-9][0-9]*)?(\.[0-9]{2})?$")
            .expect("currency pattern compiles")
    });
    value.chars().any(|c| c.is_ascii_digit()) && pattern.is_match(value)
}

pub fn parse_int_in(value: &str, range: &RangeInclusive<i64>) -> Option<i64> {
    let digits = value.strip_prefix(&['+', '-'][..]).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<i64>().ok().filter(|parsed| range.contains(parsed))
}

/// Strips the whitespace set of JavaScript's `\s`: Unicode `White_Space`
/// without NEL, plus the byte order mark.
fn trim(value: &str) -> &str {
    value.trim_matches(|c: char| c == '\u{feff}' || (c.is_whitespace() && c != '\u{85}'))
}
