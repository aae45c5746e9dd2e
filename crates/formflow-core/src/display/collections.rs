//! Collection wrapper types for displaying groups of domain objects.
//!
//! Lists render compactly: one short section per item, and a fixed message
//! when there is nothing to show.

use std::{fmt, ops::Index};

use super::datetime::LocalDateTime;
use crate::models::{
    AbandonedProgress, FieldSummary, Form, Page, Process, ProcessStep, ProgressSummary, Submission,
};

/// Newtype wrapper for displaying a list of processes.
///
/// # Examples
///
/// ```rust
/// use formflow_core::{
///     display::Processes,
///     models::{NavigationMode, Process, Visibility},
/// };
/// use jiff::Timestamp;
///
/// let process = Process {
///     id: 1,
///     title: "Onboarding".to_string(),
///     slug: "onboarding".to_string(),
///     description: None,
///     mode: NavigationMode::Linear,
///     visibility: Visibility::Public,
///     password_protected: false,
///     is_active: true,
///     allow_resubmission: false,
///     published_at: None,
///     created_at: Timestamp::now(),
///     updated_at: Timestamp::now(),
///     steps: vec![],
/// };
/// let output = Processes(vec![process]).to_string();
/// assert!(output.contains("## Onboarding (ID: 1)"));
/// ```
pub struct Processes(pub Vec<Process>);

impl Processes {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Process> {
        self.0.iter()
    }
}

impl Index<usize> for Processes {
    type Output = Process;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl fmt::Display for Processes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No processes found.");
        }
        for process in &self.0 {
            let published = if process.is_published() {
                "published"
            } else {
                "draft"
            };
            let state = if process.is_active { "" } else { ", inactive" };
            writeln!(f, "## {} (ID: {})", process.title, process.id)?;
            writeln!(f)?;
            writeln!(
                f,
                "- **Mode**: {}, {} ({published}{state})",
                process.mode, process.visibility
            )?;
            writeln!(f, "- **Steps**: {}", process.steps.len())?;
            writeln!(f, "- **Slug**: {}", process.slug)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying the steps of a process in order.
pub struct Steps(pub Vec<ProcessStep>);

impl Steps {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProcessStep> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Steps {
    type Item = &'a ProcessStep;
    type IntoIter = std::slice::Iter<'a, ProcessStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Steps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            writeln!(f, "No steps found.")
        } else {
            for step in &self.0 {
                write!(f, "{step}")?;
            }
            Ok(())
        }
    }
}

/// Newtype wrapper for displaying a list of forms without their fields.
pub struct Forms(pub Vec<Form>);

impl Forms {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Forms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No forms found.");
        }
        for form in &self.0 {
            writeln!(f, "## {} (ID: {})", form.title, form.id)?;
            writeln!(f)?;
            writeln!(f, "- **Slug**: {}", form.slug)?;
            writeln!(f, "- **Fields**: {}", form.fields.len())?;
            writeln!(f, "- **Created**: {}", LocalDateTime(&form.created_at))?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying abandoned records.
pub struct AbandonedList(pub Vec<AbandonedProgress>);

impl fmt::Display for AbandonedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No abandoned records.");
        }
        for record in &self.0 {
            write!(f, "{record}")?;
        }
        Ok(())
    }
}

/// Per-field answer summaries of a form, separated by blank lines.
pub struct FieldSummaries(pub Vec<FieldSummary>);

impl fmt::Display for FieldSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "This form has no fields.");
        }
        for (i, summary) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{summary}")?;
        }
        Ok(())
    }
}

fn write_page_footer<T>(f: &mut fmt::Formatter<'_>, page: &Page<T>) -> fmt::Result {
    let first = u64::from(page.offset) + 1;
    let last = u64::from(page.offset) + page.items.len() as u64;
    write!(f, "Showing {first}-{last} of {}", page.total)?;
    if page.has_more() {
        write!(f, " (next offset: {})", last)?;
    }
    writeln!(f)
}

impl fmt::Display for Page<ProgressSummary> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return writeln!(f, "No progress records found.");
        }
        for summary in &self.items {
            write!(f, "{summary}")?;
        }
        write_page_footer(f, self)
    }
}

impl fmt::Display for Page<Submission> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return writeln!(f, "No submissions found.");
        }
        for submission in &self.items {
            write!(f, "{submission}")?;
        }
        write_page_footer(f, self)
    }
}
