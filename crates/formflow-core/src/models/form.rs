//! Form and field definitions.

use jiff::Timestamp;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A form whose fields collect the answers for a process step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Form {
    pub id: u64,
    pub title: String,
    /// Unique, URL-safe identifier
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Fields ordered by their position (lazy-loaded)
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// One input of a form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormField {
    pub id: u64,
    pub form_id: u64,
    pub label: String,
    pub description: Option<String>,
    pub is_required: bool,
    /// Position within the form (0-indexed)
    pub order: u32,
    /// Type and type-specific rules
    pub kind: FieldKind,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Closed set of field types with their recognized rules.
///
/// Stored as JSON and checked with [`FieldKind::check`] before it is written,
/// so a persisted field always carries a coherent configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum FieldKind {
    Text {
        min_length: Option<u32>,
        max_length: Option<u32>,
    },
    Textarea {
        min_length: Option<u32>,
        max_length: Option<u32>,
    },
    Number {
        min_value: Option<f64>,
        max_value: Option<f64>,
    },
    Email,
    Select {
        options: Vec<String>,
    },
    Radio {
        options: Vec<String>,
    },
    Checkbox {
        options: Vec<String>,
        min_selections: Option<u32>,
        max_selections: Option<u32>,
    },
    Date,
    File {
        #[serde(default)]
        allowed_extensions: Vec<String>,
    },
}

impl FieldKind {
    /// Name of the field type as used in storage and on the command line.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Textarea { .. } => "textarea",
            FieldKind::Number { .. } => "number",
            FieldKind::Email => "email",
            FieldKind::Select { .. } => "select",
            FieldKind::Radio { .. } => "radio",
            FieldKind::Checkbox { .. } => "checkbox",
            FieldKind::Date => "date",
            FieldKind::File { .. } => "file",
        }
    }

    /// Declared options for choice fields.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            FieldKind::Select { options }
            | FieldKind::Radio { options }
            | FieldKind::Checkbox { options, .. } => Some(options),
            _ => None,
        }
    }

    /// Checks that the rules are internally consistent.
    pub fn check(&self) -> Result<(), String> {
        match self {
            FieldKind::Text {
                min_length,
                max_length,
            }
            | FieldKind::Textarea {
                min_length,
                max_length,
            } => check_bounds("length", *min_length, *max_length),
            FieldKind::Number {
                min_value,
                max_value,
            } => {
                if min_value.is_some_and(|v| !v.is_finite())
                    || max_value.is_some_and(|v| !v.is_finite())
                {
                    return Err("numeric bounds must be finite".to_string());
                }
                match (min_value, max_value) {
                    (Some(min), Some(max)) if min > max => {
                        Err(format!("min_value {min} exceeds max_value {max}"))
                    }
                    _ => Ok(()),
                }
            }
            FieldKind::Select { options } | FieldKind::Radio { options } => {
                check_options(options)
            }
            FieldKind::Checkbox {
                options,
                min_selections,
                max_selections,
            } => {
                check_options(options)?;
                check_bounds("selections", *min_selections, *max_selections)?;
                match min_selections {
                    Some(min) if *min as usize > options.len() => Err(format!(
                        "min_selections {min} exceeds the {} declared options",
                        options.len()
                    )),
                    _ => Ok(()),
                }
            }
            FieldKind::File { allowed_extensions } => {
                if allowed_extensions.iter().any(|ext| ext.trim().is_empty()) {
                    Err("allowed_extensions must not contain empty entries".to_string())
                } else {
                    Ok(())
                }
            }
            FieldKind::Email | FieldKind::Date => Ok(()),
        }
    }
}

fn check_bounds(what: &str, min: Option<u32>, max: Option<u32>) -> Result<(), String> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => {
            Err(format!("min_{what} {min} exceeds max_{what} {max}"))
        }
        _ => Ok(()),
    }
}

fn check_options(options: &[String]) -> Result<(), String> {
    if options.is_empty() {
        return Err("at least one option is required".to_string());
    }
    let mut seen = std::collections::HashSet::new();
    for option in options {
        if option.trim().is_empty() {
            return Err("options must not be empty".to_string());
        }
        if !seen.insert(option.as_str()) {
            return Err(format!("duplicate option '{option}'"));
        }
    }
    Ok(())
}
