//! Request types for updating process definitions.

use super::{NavigationMode, Visibility};

/// Blank text clears an optional field.
fn clearable(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Changes to apply to a process; `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct UpdateProcessRequest {
    pub title: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub mode: Option<NavigationMode>,
    pub visibility: Option<Visibility>,
    pub allow_resubmission: Option<bool>,
}

impl UpdateProcessRequest {
    /// Whether the request changes anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.mode.is_none()
            && self.visibility.is_none()
            && self.allow_resubmission.is_none()
    }
}

impl TryFrom<crate::params::UpdateProcess> for UpdateProcessRequest {
    type Error = crate::TrackerError;

    /// Convert UpdateProcess parameters into a validated request.
    ///
    /// # Errors
    ///
    /// * `TrackerError::InvalidInput` - When the mode or visibility string is
    ///   unknown, or the title is blank
    ///
    /// # Examples
    ///
    /// ```rust
    /// use formflow_core::{
    ///     models::{NavigationMode, UpdateProcessRequest},
    ///     params::UpdateProcess,
    /// };
    ///
    /// let params = UpdateProcess {
    ///     id: 1,
    ///     mode: Some("free".to_string()),
    ///     ..Default::default()
    /// };
    /// let request: UpdateProcessRequest = params.try_into()?;
    /// assert_eq!(request.mode, Some(NavigationMode::Free));
    /// # Result::<(), formflow_core::TrackerError>::Ok(())
    /// ```
    fn try_from(params: crate::params::UpdateProcess) -> Result<Self, Self::Error> {
        if params.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(crate::TrackerError::invalid_input("title")
                .with_reason("Title cannot be empty"));
        }

        let mode = params
            .mode
            .as_deref()
            .map(str::parse::<NavigationMode>)
            .transpose()
            .map_err(|reason| crate::TrackerError::invalid_input("mode").with_reason(reason))?;

        let visibility = params
            .visibility
            .as_deref()
            .map(str::parse::<Visibility>)
            .transpose()
            .map_err(|reason| {
                crate::TrackerError::invalid_input("visibility").with_reason(reason)
            })?;

        Ok(Self {
            title: params.title,
            description: params.description.map(clearable),
            mode,
            visibility,
            allow_resubmission: params.allow_resubmission,
        })
    }
}

/// Changes to apply to a step; `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct UpdateStepRequest {
    pub title: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub is_required: Option<bool>,
    pub form_id: Option<u64>,
}

impl UpdateStepRequest {
    /// Whether the request changes anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.is_required.is_none()
            && self.form_id.is_none()
    }
}

impl TryFrom<crate::params::UpdateStep> for UpdateStepRequest {
    type Error = crate::TrackerError;

    fn try_from(params: crate::params::UpdateStep) -> Result<Self, Self::Error> {
        if params.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(crate::TrackerError::invalid_input("title")
                .with_reason("Title cannot be empty"));
        }

        Ok(Self {
            title: params.title,
            description: params.description.map(clearable),
            is_required: params.is_required,
            form_id: params.form_id,
        })
    }
}
