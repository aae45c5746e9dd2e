//! Read-only analytics reports for process owners.

use std::collections::BTreeMap;

use jiff::{civil::Date, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Answers, FieldKind, FormField};

/// Outcome counts across all progress records of a process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRate {
    pub process_id: u64,
    pub total_views: u64,
    pub total_started: u64,
    pub total_completed: u64,
    pub total_abandoned: u64,
    pub total_in_progress: u64,
    /// Percentage of started records that completed
    pub completion_rate: f64,
    /// Percentage of started records that were abandoned
    pub abandonment_rate: f64,
}

/// Retention figures for one step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDropOff {
    pub step_id: u64,
    pub step_title: String,
    pub order: u32,
    /// Records that resolved the step (completed or skipped)
    pub started_count: u64,
    pub completed_count: u64,
    pub drop_off_count: u64,
    pub drop_off_percentage: f64,
    pub retention_rate: f64,
}

/// Drop-off analysis over all steps, in step order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DropOffReport {
    pub process_id: u64,
    pub total_started: u64,
    pub steps: Vec<StepDropOff>,
}

/// Time from start to completion, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionTimes {
    pub process_id: u64,
    pub sample_size: u64,
    pub average_minutes: Option<f64>,
    pub min_minutes: Option<f64>,
    pub max_minutes: Option<f64>,
    pub median_minutes: Option<f64>,
}

/// An abandoned record with how long it had been idle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbandonedProgress {
    pub id: u64,
    pub session_id: String,
    pub user_id: Option<String>,
    pub current_step_index: u32,
    pub completion_percentage: f64,
    pub started_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub hours_inactive: f64,
}

/// Visitors per day for a process, oldest day first.
///
/// Both series hold one entry per day of the window, including days without
/// activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityOverTime {
    pub process_id: u64,
    pub days: u32,
    pub views: Vec<DailyCount>,
    pub completions: Vec<DailyCount>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DailyCount {
    /// UTC calendar day
    pub date: Date,
    pub count: u64,
}

/// Views and submissions of a standalone form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormOverview {
    pub form_id: u64,
    pub total_views: u64,
    /// Submissions in the submitted state
    pub total_submissions: u64,
    /// Percentage of views that led to a submission
    pub conversion_rate: f64,
    pub last_viewed_at: Option<Timestamp>,
    pub last_submitted_at: Option<Timestamp>,
}

/// How far visitors of a form get: viewed, started, submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormDropOff {
    pub form_id: u64,
    pub views: u64,
    /// Distinct sessions holding any submission, drafts included
    pub started: u64,
    pub submitted: u64,
    /// Percentage of views that started a submission
    pub start_rate: f64,
    /// Percentage of started sessions that submitted
    pub completion_rate: f64,
}

/// Response figures for one field over the submitted answers of its form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSummary {
    pub field_id: u64,
    pub label: String,
    /// Field type name, as in [`super::FieldKind::type_name`]
    pub field_type: String,
    /// Submitted answers with a non-empty value for the field
    pub total_responses: u64,
    pub aggregation: FieldAggregation,
}

/// Type-specific aggregate of a field's answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldAggregation {
    /// Free-form fields are only counted
    None,
    Numeric {
        average: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
        sum: f64,
    },
    /// Answer counts per option, most chosen first
    Choices { counts: Vec<ChoiceCount> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceCount {
    pub value: String,
    pub count: u64,
}

/// Rounds to two decimals, the precision every report uses.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `part` in `whole`, zero when `whole` is zero.
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}

/// Median of unsorted samples.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    Some(if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    })
}

/// Aggregates the answers given to `field` across `submissions`.
pub(crate) fn summarize_field(field: &FormField, submissions: &[Answers]) -> FieldSummary {
    let values: Vec<&Value> = submissions
        .iter()
        .filter_map(|answers| answers.get(&field.id))
        .filter(|value| !is_blank(value))
        .collect();

    let aggregation = match &field.kind {
        FieldKind::Number { .. } => {
            let numbers: Vec<f64> = values.iter().filter_map(|v| as_number(v)).collect();
            let sum: f64 = numbers.iter().sum();
            FieldAggregation::Numeric {
                average: (!numbers.is_empty()).then(|| round2(sum / numbers.len() as f64)),
                min: numbers.iter().copied().reduce(f64::min),
                max: numbers.iter().copied().reduce(f64::max),
                sum: round2(sum),
            }
        }
        FieldKind::Select { .. } | FieldKind::Radio { .. } | FieldKind::Checkbox { .. } => {
            let mut tally: BTreeMap<&str, u64> = BTreeMap::new();
            for value in values.iter().copied() {
                match value {
                    Value::String(choice) => *tally.entry(choice.as_str()).or_default() += 1,
                    Value::Array(choices) => {
                        for choice in choices.iter().filter_map(Value::as_str) {
                            *tally.entry(choice).or_default() += 1;
                        }
                    }
                    _ => {}
                }
            }
            let mut counts: Vec<ChoiceCount> = tally
                .into_iter()
                .map(|(value, count)| ChoiceCount {
                    value: value.to_string(),
                    count,
                })
                .collect();
            // stable sort keeps ties in alphabetical order
            counts.sort_by(|a, b| b.count.cmp(&a.count));
            FieldAggregation::Choices { counts }
        }
        _ => FieldAggregation::None,
    };

    FieldSummary {
        field_id: field.id,
        label: field.label.clone(),
        field_type: field.kind.type_name().to_string(),
        total_responses: values.len() as u64,
        aggregation,
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

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
