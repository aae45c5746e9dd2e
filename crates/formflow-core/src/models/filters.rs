//! Filter and paging types for querying progress records.

use serde::{Deserialize, Serialize};

use super::ProgressStatus;

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Filter options for listing progress records of one process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressFilter {
    /// Only records in this status
    pub status: Option<ProgressStatus>,

    /// Only records of this session
    pub session_id: Option<String>,

    /// Page size, clamped to [`MAX_PAGE_SIZE`]
    pub limit: u32,

    /// Number of records to skip
    pub offset: u32,
}

impl Default for ProgressFilter {
    fn default() -> Self {
        Self {
            status: None,
            session_id: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl ProgressFilter {
    /// Filter for a single status.
    ///
    /// ```rust
    /// use formflow_core::models::{ProgressFilter, ProgressStatus};
    ///
    /// let filter = ProgressFilter::with_status(ProgressStatus::Abandoned);
    /// assert_eq!(filter.status, Some(ProgressStatus::Abandoned));
    /// assert_eq!(filter.offset, 0);
    /// ```
    pub fn with_status(status: ProgressStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// The limit actually applied to the query.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

impl From<&crate::params::ListProgress> for ProgressFilter {
    fn from(params: &crate::params::ListProgress) -> Self {
        Self {
            status: params.status,
            session_id: params.session_id.clone(),
            limit: params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: params.offset.unwrap_or(0),
        }
    }
}

/// One page of results with the total number of matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

impl<T> Page<T> {
    /// Whether more records follow this page.
    pub fn has_more(&self) -> bool {
        u64::from(self.offset) + (self.items.len() as u64) < self.total
    }
}
