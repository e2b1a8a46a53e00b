//! Declarative field rules checked against the raw request input.
//!
//! Input is an untyped JSON object so that wrong types are reported as
//! rule violations instead of deserialization failures. Strings are trimmed
//! and empty strings count as missing before any rule runs.

use std::borrow::Cow;

use serde_json::{Map, Value};
use validator::{ValidateLength, ValidationError};

pub type Input = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Any,
    String,
    Numeric,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    field: &'static str,
    required: bool,
    kind: Kind,
    min: Option<u64>,
    max: Option<u64>,
}

impl FieldRule {
    pub const fn required(field: &'static str) -> Self {
        Self {
            field,
            required: true,
            kind: Kind::Any,
            min: None,
            max: None,
        }
    }

    /// Field may be missing or null
    pub const fn nullable(field: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(field)
        }
    }

    pub const fn string(mut self) -> Self {
        self.kind = Kind::String;
        self
    }

    pub const fn numeric(mut self) -> Self {
        self.kind = Kind::Numeric;
        self
    }

    /// Minimum length in characters
    pub const fn min(mut self, min: u64) -> Self {
        self.min = Some(min);
        self
    }

    /// Maximum length in characters
    pub const fn max(mut self, max: u64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    fn check(&self, value: &Value, violations: &mut Vec<Violation>) {
        if is_absent(value) {
            if self.required {
                violations.push(self.violation(
                    "required",
                    format!("The {} field is required.", self.field),
                ));
            }
            return;
        }

        match self.kind {
            Kind::Any => {}
            Kind::String => match value {
                Value::String(text) => self.check_length(text, violations),
                _ => violations.push(
                    self.violation("string", format!("The {} must be a string.", self.field)),
                ),
            },
            Kind::Numeric => {
                if !is_numeric(value) {
                    violations.push(
                        self.violation("numeric", format!("The {} must be a number.", self.field)),
                    );
                }
            }
        }
    }

    // `ValidateLength` counts characters and is implemented for `String`.
    #[allow(clippy::ptr_arg)]
    fn check_length(&self, text: &String, violations: &mut Vec<Violation>) {
        if let Some(min) = self.min {
            if !text.validate_length(Some(min), None, None) {
                let mut violation = self.violation(
                    "length",
                    format!("The {} must be at least {} characters.", self.field, min),
                );
                violation.error.add_param(Cow::from("min"), &min);
                violations.push(violation);
            }
        }

        if let Some(max) = self.max {
            if !text.validate_length(None, Some(max), None) {
                let mut violation = self.violation(
                    "length",
                    format!(
                        "The {} may not be greater than {} characters.",
                        self.field, max
                    ),
                );
                violation.error.add_param(Cow::from("max"), &max);
                violations.push(violation);
            }
        }
    }

    fn violation(&self, code: &'static str, message: String) -> Violation {
        let mut error = ValidationError::new(code);
        error.message = Some(Cow::Owned(message));
        Violation {
            field: self.field,
            error,
        }
    }
}

/// A single broken rule
#[derive(Debug, Clone)]
pub struct Violation {
    pub field: &'static str,
    pub error: ValidationError,
}

impl Violation {
    pub fn message(&self) -> String {
        self.error
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| self.error.code.to_string())
    }
}

/// Ordered set of field rules for one operation
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    rules: &'static [FieldRule],
}

impl RuleSet {
    pub const fn new(rules: &'static [FieldRule]) -> Self {
        Self { rules }
    }

    /// Check `input` and return the declared fields, normalized.
    ///
    /// Violations are ordered by field declaration, then by rule.
    pub fn apply(&self, input: &Input) -> Result<Input, Vec<Violation>> {
        let mut violations = Vec::new();
        let mut validated = Map::new();

        for rule in self.rules {
            let value = input
                .get(rule.field)
                .map(normalize)
                .unwrap_or(Value::Null);
            rule.check(&value, &mut violations);
            validated.insert(rule.field.to_string(), value);
        }

        if violations.is_empty() {
            Ok(validated)
        } else {
            Err(violations)
        }
    }
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_string())
            }
        }
        other => other.clone(),
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map(f64::is_finite)
            .unwrap_or(false),
        _ => false,
    }
}

/// Read a numeric input value as an integer, truncating any fraction
pub fn as_integer(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if number.is_finite() {
        Some(number.trunc() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TITLE_RULES: RuleSet = RuleSet::new(&[
        FieldRule::required("title").string().min(3).max(191),
        FieldRule::nullable("description").string().max(191),
    ]);

    const SIZE_RULES: RuleSet = RuleSet::new(&[FieldRule::required("size").numeric()]);

    fn input(value: Value) -> Input {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    fn messages(result: Result<Input, Vec<Violation>>) -> Vec<String> {
        result.unwrap_err().iter().map(Violation::message).collect()
    }

    #[test]
    fn accepts_valid_title_and_missing_description() {
        let validated = TITLE_RULES.apply(&input(json!({ "title": "Hello" }))).unwrap();
        assert_eq!(validated.get("title"), Some(&json!("Hello")));
        assert_eq!(validated.get("description"), Some(&Value::Null));
    }

    #[test]
    fn missing_title_reports_required_only() {
        let result = TITLE_RULES.apply(&input(json!({})));
        assert_eq!(messages(result), vec!["The title field is required."]);
    }

    #[test]
    fn blank_title_counts_as_missing() {
        let result = TITLE_RULES.apply(&input(json!({ "title": "   " })));
        assert_eq!(messages(result), vec!["The title field is required."]);
    }

    #[test]
    fn short_title_is_rejected() {
        let result = TITLE_RULES.apply(&input(json!({ "title": "ab" })));
        assert_eq!(messages(result), vec!["The title must be at least 3 characters."]);
    }

    #[test]
    fn long_fields_report_in_declaration_order() {
        let long = "x".repeat(192);
        let result = TITLE_RULES.apply(&input(json!({ "title": long, "description": long })));
        assert_eq!(
            messages(result),
            vec![
                "The title may not be greater than 191 characters.",
                "The description may not be greater than 191 characters.",
            ]
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let title = "é".repeat(191);
        assert!(TITLE_RULES.apply(&input(json!({ "title": title }))).is_ok());
    }

    #[test]
    fn non_string_title_is_rejected() {
        let result = TITLE_RULES.apply(&input(json!({ "title": 12345 })));
        assert_eq!(messages(result), vec!["The title must be a string."]);
    }

    #[test]
    fn violation_carries_code_and_params() {
        let violations = TITLE_RULES
            .apply(&input(json!({ "title": "ab" })))
            .unwrap_err();
        assert_eq!(violations[0].field, "title");
        assert_eq!(violations[0].error.code, "length");
        assert_eq!(violations[0].error.params.get("min"), Some(&json!(3)));
    }

    #[test]
    fn strings_are_trimmed() {
        let validated = TITLE_RULES
            .apply(&input(json!({ "title": "  Hello  ", "description": "" })))
            .unwrap();
        assert_eq!(validated.get("title"), Some(&json!("Hello")));
        assert_eq!(validated.get("description"), Some(&Value::Null));
    }

    #[test]
    fn size_accepts_numbers_and_numeric_strings() {
        assert!(SIZE_RULES.apply(&input(json!({ "size": 2 }))).is_ok());
        assert!(SIZE_RULES.apply(&input(json!({ "size": " 2.5 " }))).is_ok());
    }

    #[test]
    fn size_rejects_non_numbers() {
        let result = SIZE_RULES.apply(&input(json!({ "size": "two" })));
        assert_eq!(messages(result), vec!["The size must be a number."]);

        let result = SIZE_RULES.apply(&input(json!({ "size": "NaN" })));
        assert_eq!(messages(result), vec!["The size must be a number."]);
    }

    #[test]
    fn as_integer_truncates() {
        assert_eq!(as_integer(&json!("2.9")), Some(2));
        assert_eq!(as_integer(&json!(7)), Some(7));
        assert_eq!(as_integer(&json!("abc")), None);
        assert_eq!(as_integer(&json!(true)), None);
    }
}
