//! One-line confirmations for operations that return no resource.

use std::fmt;

/// Outcome line such as `Success: Swapped steps 3 and 4`.
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
        }
    }
}

impl From<&crate::TrackerError> for OperationStatus {
    fn from(error: &crate::TrackerError) -> Self {
        Self::failure(error.to_string())
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.success { "Success:" } else { "Error:" };
        writeln!(f, "{prefix} {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackerError;

    #[test]
    fn test_operation_status_display() {
        let success = OperationStatus::success("Archived submission 2".to_string());
        assert_eq!(success.to_string(), "Success: Archived submission 2\n");

        let error = TrackerError::StepRequired { step_id: 9 };
        let failure = OperationStatus::from(&error);
        assert_eq!(
            failure.to_string(),
            "Error: Step 9 is required and cannot be skipped\n"
        );
    }
}
