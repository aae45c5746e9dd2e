//! Answer validation against form field definitions.
//!
//! The tracker calls a [`FormValidator`] before any step completion or
//! standalone submission is written. [`RulesValidator`] is the default and
//! enforces the rules carried by each field's [`FieldKind`].

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Answers, FieldKind, FormField};

/// Per-field validation messages, keyed by field ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(pub BTreeMap<u64, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field.
    pub fn add(&mut self, field_id: u64, message: impl Into<String>) {
        self.0.entry(field_id).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for one field.
    pub fn for_field(&self, field_id: u64) -> &[String] {
        self.0.get(&field_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// IDs of the fields that failed.
    pub fn field_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.keys().copied()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field_id, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "field {field_id}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Checks raw answers against the fields of a form.
///
/// On success the returned answers are normalized: empty optional answers are
/// dropped and numeric strings become numbers.
pub trait FormValidator: Send + Sync {
    fn validate(&self, fields: &[FormField], answers: &Answers) -> Result<Answers, FieldErrors>;
}

/// Validator enforcing the rules declared on each field type.
///
/// # Examples
///
/// ```rust
/// use formflow_core::{
///     models::{Answers, FieldKind, FormField},
///     validation::{FormValidator, RulesValidator},
/// };
/// use jiff::Timestamp;
///
/// let field = FormField {
///     id: 1,
///     form_id: 1,
///     label: "Email".to_string(),
///     description: None,
///     is_required: true,
///     order: 0,
///     kind: FieldKind::Email,
///     created_at: Timestamp::now(),
///     updated_at: Timestamp::now(),
/// };
///
/// let mut answers = Answers::new();
/// answers.insert(1, serde_json::json!("not-an-email"));
/// let errors = RulesValidator.validate(&[field], &answers).unwrap_err();
/// assert_eq!(errors.for_field(1), ["Enter a valid email address"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RulesValidator;

impl FormValidator for RulesValidator {
    fn validate(&self, fields: &[FormField], answers: &Answers) -> Result<Answers, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut cleaned = Answers::new();

        for field_id in answers.keys() {
            if !fields.iter().any(|f| f.id == *field_id) {
                errors.add(*field_id, "Unknown field");
            }
        }

        for field in fields {
            let value = answers.get(&field.id).filter(|v| !is_blank(v));
            match value {
                None if field.is_required => errors.add(field.id, "This field is required"),
                None => {}
                Some(value) => match check_value(&field.kind, value) {
                    Ok(normalized) => {
                        cleaned.insert(field.id, normalized);
                    }
                    Err(messages) => {
                        for message in messages {
                            errors.add(field.id, message);
                        }
                    }
                },
            }
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn check_value(kind: &FieldKind, value: &Value) -> Result<Value, Vec<String>> {
    match kind {
        FieldKind::Text {
            min_length,
            max_length,
        }
        | FieldKind::Textarea {
            min_length,
            max_length,
        } => {
            let text = expect_str(value)?;
            let length = text.chars().count();
            let mut messages = Vec::new();
            if let Some(min) = min_length.filter(|min| length < *min as usize) {
                messages.push(format!("Must be at least {min} characters"));
            }
            if let Some(max) = max_length.filter(|max| length > *max as usize) {
                messages.push(format!("Must be at most {max} characters"));
            }
            finish(messages, value.clone())
        }
        FieldKind::Number {
            min_value,
            max_value,
        } => {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
                _ => None,
            }
            .ok_or_else(|| vec!["Must be a number".to_string()])?;

            let mut messages = Vec::new();
            if let Some(min) = min_value.filter(|min| number < *min) {
                messages.push(format!("Must be at least {min}"));
            }
            if let Some(max) = max_value.filter(|max| number > *max) {
                messages.push(format!("Must be at most {max}"));
            }
            let normalized = match value {
                Value::Number(_) => value.clone(),
                _ => serde_json::Number::from_f64(number)
                    .map(Value::Number)
                    .unwrap_or_else(|| value.clone()),
            };
            finish(messages, normalized)
        }
        FieldKind::Email => {
            let text = expect_str(value)?;
            if is_email(text.trim()) {
                Ok(Value::String(text.trim().to_string()))
            } else {
                Err(vec!["Enter a valid email address".to_string()])
            }
        }
        FieldKind::Select { options } | FieldKind::Radio { options } => {
            let choice = expect_str(value)?;
            if options.iter().any(|o| o == choice) {
                Ok(value.clone())
            } else {
                Err(vec![format!("'{choice}' is not one of the available options")])
            }
        }
        FieldKind::Checkbox {
            options,
            min_selections,
            max_selections,
        } => {
            let Value::Array(items) = value else {
                return Err(vec!["Must be a list of selected options".to_string()]);
            };

            let mut messages = Vec::new();
            let mut selected: Vec<&str> = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(choice) if !options.iter().any(|o| o == choice) => {
                        messages.push(format!("'{choice}' is not one of the available options"));
                    }
                    Some(choice) if selected.contains(&choice) => {
                        messages.push(format!("'{choice}' is selected more than once"));
                    }
                    Some(choice) => selected.push(choice),
                    None => messages.push("Selections must be strings".to_string()),
                }
            }

            let count = selected.len();
            if let Some(min) = min_selections.filter(|min| count < *min as usize) {
                messages.push(format!("Select at least {min} options"));
            }
            if let Some(max) = max_selections.filter(|max| count > *max as usize) {
                messages.push(format!("Select at most {max} options"));
            }
            finish(messages, value.clone())
        }
        FieldKind::Date => {
            let text = expect_str(value)?;
            text.trim()
                .parse::<jiff::civil::Date>()
                .map(|date| Value::String(date.to_string()))
                .map_err(|_| vec!["Enter a date as YYYY-MM-DD".to_string()])
        }
        FieldKind::File { allowed_extensions } => {
            let name = expect_str(value)?;
            if allowed_extensions.is_empty() {
                return Ok(value.clone());
            }
            let extension = name
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_lowercase())
                .unwrap_or_default();
            let allowed = allowed_extensions
                .iter()
                .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(&extension));
            if allowed {
                Ok(value.clone())
            } else {
                Err(vec![format!(
                    "File type must be one of: {}",
                    allowed_extensions.join(", ")
                )])
            }
        }
    }
}

fn expect_str(value: &Value) -> Result<&str, Vec<String>> {
    value
        .as_str()
        .ok_or_else(|| vec!["Must be a text value".to_string()])
}

fn finish(messages: Vec<String>, value: Value) -> Result<Value, Vec<String>> {
    if messages.is_empty() {
        Ok(value)
    } else {
        Err(messages)
    }
}

fn is_email(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use serde_json::json;

    use super::*;

    fn field(id: u64, is_required: bool, kind: FieldKind) -> FormField {
        FormField {
            id,
            form_id: 1,
            label: format!("Field {id}"),
            description: None,
            is_required,
            order: id as u32,
            kind,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn answers(pairs: &[(u64, Value)]) -> Answers {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_required_and_unknown_fields() {
        let fields = vec![field(
            1,
            true,
            FieldKind::Text {
                min_length: None,
                max_length: None,
            },
        )];

        let errors = RulesValidator
            .validate(&fields, &answers(&[(1, json!("   ")), (9, json!("x"))]))
            .unwrap_err();
        assert_eq!(errors.for_field(1), ["This field is required"]);
        assert_eq!(errors.for_field(9), ["Unknown field"]);
        assert_eq!(errors.field_ids().collect::<Vec<_>>(), vec![1, 9]);
    }

    #[test]
    fn test_optional_blank_answers_are_dropped() {
        let fields = vec![field(1, false, FieldKind::Email)];
        let cleaned = RulesValidator
            .validate(&fields, &answers(&[(1, Value::Null)]))
            .unwrap();
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_text_length_bounds() {
        let fields = vec![field(
            1,
            true,
            FieldKind::Text {
                min_length: Some(3),
                max_length: Some(5),
            },
        )];
        assert!(RulesValidator.validate(&fields, &answers(&[(1, json!("abcd"))])).is_ok());

        let errors = RulesValidator
            .validate(&fields, &answers(&[(1, json!("ab"))]))
            .unwrap_err();
        assert_eq!(errors.for_field(1), ["Must be at least 3 characters"]);

        let errors = RulesValidator
            .validate(&fields, &answers(&[(1, json!(42))]))
            .unwrap_err();
        assert_eq!(errors.for_field(1), ["Must be a text value"]);
    }

    #[test]
    fn test_number_bounds_and_normalization() {
        let fields = vec![field(
            1,
            true,
            FieldKind::Number {
                min_value: Some(0.0),
                max_value: Some(10.0),
            },
        )];

        let cleaned = RulesValidator
            .validate(&fields, &answers(&[(1, json!("7.5"))]))
            .unwrap();
        assert_eq!(cleaned[&1], json!(7.5));

        let errors = RulesValidator
            .validate(&fields, &answers(&[(1, json!(11))]))
            .unwrap_err();
        assert_eq!(errors.for_field(1), ["Must be at most 10"]);

        let errors = RulesValidator
            .validate(&fields, &answers(&[(1, json!("seven"))]))
            .unwrap_err();
        assert_eq!(errors.for_field(1), ["Must be a number"]);
    }

    #[test]
    fn test_email_shape() {
        assert!(is_email("ada@example.com"));
        assert!(!is_email("ada@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("ada lovelace@example.com"));
        assert!(!is_email("ada@@example.com"));
    }

    #[test]
    fn test_choice_fields() {
        let options = vec!["red".to_string(), "green".to_string(), "blue".to_string()];
        let fields = vec![
            field(1, true, FieldKind::Radio {
                options: options.clone(),
            }),
            field(2, false, FieldKind::Checkbox {
                options,
                min_selections: Some(1),
                max_selections: Some(2),
            }),
        ];

        assert!(
            RulesValidator
                .validate(&fields, &answers(&[(1, json!("red")), (2, json!(["green"]))]))
                .is_ok()
        );

        let errors = RulesValidator
            .validate(
                &fields,
                &answers(&[(1, json!("purple")), (2, json!(["red", "green", "blue"]))]),
            )
            .unwrap_err();
        assert_eq!(errors.for_field(1), ["'purple' is not one of the available options"]);
        assert_eq!(errors.for_field(2), ["Select at most 2 options"]);

        let errors = RulesValidator
            .validate(&fields, &answers(&[(1, json!("red")), (2, json!(["red", "red"]))]))
            .unwrap_err();
        assert_eq!(errors.for_field(2), ["'red' is selected more than once"]);
    }

    #[test]
    fn test_date_and_file_fields() {
        let fields = vec![
            field(1, true, FieldKind::Date),
            field(2, true, FieldKind::File {
                allowed_extensions: vec![".pdf".to_string(), "png".to_string()],
            }),
        ];

        assert!(
            RulesValidator
                .validate(&fields, &answers(&[(1, json!("2024-02-29")), (2, json!("scan.PDF"))]))
                .is_ok()
        );

        let errors = RulesValidator
            .validate(&fields, &answers(&[(1, json!("2023-02-29")), (2, json!("notes.txt"))]))
            .unwrap_err();
        assert_eq!(errors.for_field(1), ["Enter a date as YYYY-MM-DD"]);
        assert_eq!(errors.for_field(2), ["File type must be one of: .pdf, png"]);
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::new();
        errors.add(2, "Must be a number");
        errors.add(1, "This field is required");
        assert_eq!(
            errors.to_string(),
            "field 1: This field is required; field 2: Must be a number"
        );
    }
}
