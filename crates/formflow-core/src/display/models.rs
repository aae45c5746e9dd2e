//! Display implementations for domain models.
//!
//! Every model renders as markdown: definitions as headed sections with a
//! metadata list, runtime records as compact summaries with status icons.

use std::fmt;

use super::datetime::{LocalDateTime, Minutes};
use crate::{
    models::{
        AbandonedProgress, ActivityOverTime, Completed, CompletionRate, CompletionResult,
        CompletionStatus, CompletionTimes, DropOffReport, FieldAggregation, FieldKind,
        FieldSummary, FormDropOff, FormOverview, Form, FormField, LedgerEntry, Navigation,
        NavigationMode, Process, ProcessStep, Progress, ProgressDetail, ProgressStatus,
        ProgressSummary, StepDescriptor, Submission, SubmissionStatus, Visibility,
    },
    sweeper::SweepReport,
};

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inline summary of a field's rules, e.g. `text, 3-40 chars`.
impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())?;
        match self {
            FieldKind::Text {
                min_length,
                max_length,
            }
            | FieldKind::Textarea {
                min_length,
                max_length,
            } => write_bounds(f, *min_length, *max_length, " chars"),
            FieldKind::Number {
                min_value,
                max_value,
            } => write_bounds(f, *min_value, *max_value, ""),
            FieldKind::Select { options } | FieldKind::Radio { options } => {
                write!(f, ": {}", options.join(" | "))
            }
            FieldKind::Checkbox {
                options,
                min_selections,
                max_selections,
            } => {
                write!(f, ": {}", options.join(" | "))?;
                write_bounds(f, *min_selections, *max_selections, " selections")
            }
            FieldKind::File { allowed_extensions } if !allowed_extensions.is_empty() => {
                write!(f, ": {}", allowed_extensions.join(", "))
            }
            FieldKind::Email | FieldKind::Date | FieldKind::File { .. } => Ok(()),
        }
    }
}

fn write_bounds<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    min: Option<T>,
    max: Option<T>,
    unit: &str,
) -> fmt::Result {
    match (min, max) {
        (Some(min), Some(max)) => write!(f, ", {min}-{max}{unit}"),
        (Some(min), None) => write!(f, ", at least {min}{unit}"),
        (None, Some(max)) => write!(f, ", at most {max}{unit}"),
        (None, None) => Ok(()),
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}. {}", self.id, self.title)?;
        writeln!(f)?;
        writeln!(f, "- Slug: {}", self.slug)?;
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }

        if self.fields.is_empty() {
            writeln!(f, "\nNo fields in this form.")?;
        } else {
            writeln!(f, "\n## Fields")?;
            writeln!(f)?;
            for field in &self.fields {
                write!(f, "{field}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_required { " *" } else { "" };
        writeln!(f, "- **{}**{marker} (ID: {}): {}", self.label, self.id, self.kind)?;
        if let Some(desc) = &self.description {
            writeln!(f, "  {desc}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}. {}", self.id, self.title)?;
        writeln!(f)?;

        writeln!(f, "- Slug: {}", self.slug)?;
        writeln!(f, "- Mode: {}", self.mode)?;
        let lock = if self.password_protected {
            " (password)"
        } else {
            ""
        };
        writeln!(f, "- Visibility: {}{lock}", self.visibility)?;
        writeln!(
            f,
            "- State: {}",
            if self.is_active { "active" } else { "inactive" }
        )?;
        match &self.published_at {
            Some(at) => writeln!(f, "- Published: {}", LocalDateTime(at))?,
            None => writeln!(f, "- Published: no")?,
        }
        if self.allow_resubmission {
            writeln!(f, "- Resubmission: allowed")?;
        }
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at))?;

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }

        if self.steps.is_empty() {
            writeln!(f, "\nNo steps in this process.")?;
        } else {
            writeln!(f, "\n## Steps")?;
            writeln!(f)?;
            for step in &self.steps {
                write!(f, "{step}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ProcessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_required {
            "required"
        } else {
            "optional"
        };
        writeln!(
            f,
            "### {}. {} (ID: {}, form {}, {kind})",
            self.order + 1,
            self.title,
            self.id,
            self.form_id
        )?;
        writeln!(f)?;
        if let Some(desc) = &self.description {
            writeln!(f, "{desc}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Progress {} (process {})", self.id, self.process_id)?;
        writeln!(f)?;
        writeln!(f, "- Status: {}", self.status)?;
        writeln!(f, "- Session: {}", self.session_id)?;
        if let Some(user) = &self.user_id {
            writeln!(f, "- User: {user}")?;
        }
        writeln!(f, "- Step index: {}", self.current_step_index)?;
        writeln!(f, "- Completion: {:.2}%", self.completion_percentage)?;
        writeln!(f, "- Version: {}", self.version)?;
        writeln!(f, "- Started: {}", LocalDateTime(&self.started_at))?;
        writeln!(f, "- Last activity: {}", LocalDateTime(&self.last_activity_at))?;
        if let Some(at) = &self.completed_at {
            writeln!(f, "- Completed: {}", LocalDateTime(at))?;
        }
        Ok(())
    }
}

impl fmt::Display for ProgressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "## Progress {} ({}, {:.2}%)",
            self.id, self.status, self.completion_percentage
        )?;
        writeln!(f)?;
        writeln!(f, "- **Session**: {}", self.session_id)?;
        writeln!(f, "- **Step index**: {}", self.current_step_index)?;
        writeln!(
            f,
            "- **Last activity**: {}",
            LocalDateTime(&self.last_activity_at)
        )?;
        writeln!(f)
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let optional = if self.is_required { "" } else { " (optional)" };
        write!(
            f,
            "{}. {}{optional}: {}",
            self.order + 1,
            self.step_title,
            self.status.with_icon()
        )?;
        if let Some(id) = self.submission_id {
            write!(f, " [submission {id}]")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for ProgressDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.progress)?;
        writeln!(f, "\n## {}", self.process_title)?;
        writeln!(f)?;
        for entry in &self.entries {
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Submission {} (form {}, {})", self.id, self.form_id, self.status)?;
        writeln!(f)?;
        writeln!(f, "- **Session**: {}", self.session_id)?;
        if let Some(progress) = self.progress_id {
            writeln!(f, "- **Progress**: {progress}")?;
        }
        if let Some(at) = &self.submitted_at {
            writeln!(f, "- **Submitted**: {}", LocalDateTime(at))?;
        }
        if !self.answers.is_empty() {
            writeln!(f, "- **Answers**:")?;
            for (field_id, value) in &self.answers {
                writeln!(f, "  - {field_id}: {value}")?;
            }
        }
        writeln!(f)
    }
}

impl fmt::Display for StepDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Step {} of {}: {} ({})",
            self.index + 1,
            self.total_steps,
            self.step.title,
            self.status.with_icon()
        )?;
        writeln!(f)?;
        writeln!(f, "- Step ID: {}", self.step.id)?;
        writeln!(f, "- Form ID: {}", self.step.form_id)?;
        writeln!(
            f,
            "- Required: {}",
            if self.step.is_required { "yes" } else { "no" }
        )?;
        writeln!(f, "- Completion: {:.2}%", self.completion_percentage)?;
        writeln!(f, "- Version: {}", self.version)?;
        if let Some(desc) = &self.step.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Completed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Progress {} completed at {} ({:.2}%)",
            self.progress_id,
            LocalDateTime(&self.completed_at),
            self.completion_percentage
        )
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Navigation::Step(step) => write!(f, "{step}"),
            Navigation::Completed(done) => write!(f, "{done}"),
        }
    }
}

impl fmt::Display for CompletionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.status {
            CompletionStatus::Skipped => "skipped",
            _ => "completed",
        };
        if self.unchanged {
            writeln!(f, "Step {} was already {verb}; nothing changed", self.step_id)?;
        } else {
            writeln!(f, "Step {} {verb}", self.step_id)?;
        }
        if let Some(id) = self.submission_id {
            writeln!(f, "- Submission: {id}")?;
        }
        writeln!(f, "- Completion: {:.2}%", self.completion_percentage)
    }
}

impl fmt::Display for CompletionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Completion rate (process {})", self.process_id)?;
        writeln!(f)?;
        writeln!(f, "- Views: {}", self.total_views)?;
        writeln!(f, "- Started: {}", self.total_started)?;
        writeln!(f, "- In progress: {}", self.total_in_progress)?;
        writeln!(
            f,
            "- Completed: {} ({:.2}%)",
            self.total_completed, self.completion_rate
        )?;
        writeln!(
            f,
            "- Abandoned: {} ({:.2}%)",
            self.total_abandoned, self.abandonment_rate
        )
    }
}

impl fmt::Display for DropOffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Drop-off (process {})", self.process_id)?;
        writeln!(f)?;
        writeln!(f, "Started: {}", self.total_started)?;
        writeln!(f)?;
        if self.steps.is_empty() {
            return writeln!(f, "No steps in this process.");
        }
        writeln!(f, "| Step | Started | Completed | Dropped | Retention |")?;
        writeln!(f, "|:-|-:|-:|-:|-:|")?;
        for step in &self.steps {
            writeln!(
                f,
                "| {}. {} | {} | {} | {} ({:.2}%) | {:.2}% |",
                step.order + 1,
                step.step_title,
                step.started_count,
                step.completed_count,
                step.drop_off_count,
                step.drop_off_percentage,
                step.retention_rate
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for CompletionTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Completion times (process {})", self.process_id)?;
        writeln!(f)?;
        if self.sample_size == 0 {
            return writeln!(f, "No completed records yet.");
        }
        writeln!(f, "- Samples: {}", self.sample_size)?;
        let rows = [
            ("Average", self.average_minutes),
            ("Median", self.median_minutes),
            ("Fastest", self.min_minutes),
            ("Slowest", self.max_minutes),
        ];
        for (label, minutes) in rows {
            if let Some(minutes) = minutes {
                writeln!(f, "- {label}: {}", Minutes(minutes))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AbandonedProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "- Progress {} (session {}): step index {}, {:.2}%, idle {:.1}h",
            self.id,
            self.session_id,
            self.current_step_index,
            self.completion_percentage,
            self.hours_inactive
        )
    }
}

impl fmt::Display for ActivityOverTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# Activity (process {}, last {} days)",
            self.process_id, self.days
        )?;
        writeln!(f)?;
        writeln!(f, "| Day | Views | Completions |")?;
        writeln!(f, "|:-|-:|-:|")?;
        for (views, completions) in self.views.iter().zip(&self.completions) {
            writeln!(
                f,
                "| {} | {} | {} |",
                views.date, views.count, completions.count
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for FormOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Form overview (form {})", self.form_id)?;
        writeln!(f)?;
        writeln!(f, "- Views: {}", self.total_views)?;
        writeln!(
            f,
            "- Submissions: {} ({:.2}% of views)",
            self.total_submissions, self.conversion_rate
        )?;
        if let Some(ref at) = self.last_viewed_at {
            writeln!(f, "- Last viewed: {}", LocalDateTime(at))?;
        }
        if let Some(ref at) = self.last_submitted_at {
            writeln!(f, "- Last submitted: {}", LocalDateTime(at))?;
        }
        Ok(())
    }
}

impl fmt::Display for FormDropOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Drop-off (form {})", self.form_id)?;
        writeln!(f)?;
        writeln!(f, "- Viewed: {}", self.views)?;
        writeln!(f, "- Started: {} ({:.2}%)", self.started, self.start_rate)?;
        writeln!(
            f,
            "- Submitted: {} ({:.2}%)",
            self.submitted, self.completion_rate
        )
    }
}

impl fmt::Display for FieldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "## {} (ID: {}, {})",
            self.label, self.field_id, self.field_type
        )?;
        writeln!(f)?;
        writeln!(f, "- Responses: {}", self.total_responses)?;
        match &self.aggregation {
            FieldAggregation::None => {}
            FieldAggregation::Numeric {
                average,
                min,
                max,
                sum,
            } => {
                if let (Some(average), Some(min), Some(max)) = (average, min, max) {
                    writeln!(f, "- Average: {average}, min {min}, max {max}")?;
                }
                writeln!(f, "- Sum: {sum}")?;
            }
            FieldAggregation::Choices { counts } => {
                for choice in counts {
                    writeln!(f, "- {}: {}", choice.value, choice.count)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Abandoned {} of {} open records ({} skipped, {} failed)",
            self.abandoned, self.scanned, self.skipped, self.failed
        )
    }
}
