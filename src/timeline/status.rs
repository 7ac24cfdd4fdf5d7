//! Step, overall, and connection status types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a single workflow step
///
/// Steps move `pending → running → {success | fail}`. The last two are
/// terminal, but the transport gives no ordering guarantees, so transitions
/// out of them are applied as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Success,
    Fail,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Success => "success",
            StepStatus::Fail => "fail",
        }
    }

    /// Capitalised label shown when a step has no message
    pub fn label(&self) -> &'static str {
        match self {
            StepStatus::Pending => "Pending",
            StepStatus::Running => "Running",
            StepStatus::Success => "Success",
            StepStatus::Fail => "Fail",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Success | StepStatus::Fail)
    }

    /// Position in the lifecycle; both terminal states share the last rank
    pub fn rank(&self) -> u8 {
        match self {
            StepStatus::Pending => 0,
            StepStatus::Running => 1,
            StepStatus::Success | StepStatus::Fail => 2,
        }
    }

    /// True if moving from `self` to `next` goes backwards in the lifecycle
    pub fn is_regression_to(&self, next: StepStatus) -> bool {
        next.rank() < self.rank() || (self.is_terminal() && next.is_terminal() && *self != next)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown step status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for StepStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StepStatus::Pending),
            "running" => Ok(StepStatus::Running),
            "success" => Ok(StepStatus::Success),
            "fail" => Ok(StepStatus::Fail),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Completion state of the whole workflow, derived from the terminal indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallState {
    InProgress,
    Success,
    Fail,
}

impl OverallState {
    pub fn from_terminal(status: StepStatus) -> Self {
        match status {
            StepStatus::Success => OverallState::Success,
            StepStatus::Fail => OverallState::Fail,
            StepStatus::Pending | StepStatus::Running => OverallState::InProgress,
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, OverallState::InProgress)
    }

    /// Task status string the backend stores for finished workflows
    pub fn task_status(&self) -> Option<&'static str> {
        match self {
            OverallState::Success => Some("SUCCESS"),
            OverallState::Fail => Some("FAILURE"),
            OverallState::InProgress => None,
        }
    }
}

impl fmt::Display for OverallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallState::InProgress => f.write_str("in progress"),
            OverallState::Success => f.write_str("success"),
            OverallState::Fail => f.write_str("fail"),
        }
    }
}

/// State of the live update channel. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    #[default]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_lowercase() {
        let status: StepStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(status, StepStatus::Running);
        assert_eq!(serde_json::to_string(&StepStatus::Fail).unwrap(), "\"fail\"");
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(serde_json::from_str::<StepStatus>("\"done\"").is_err());
        assert!("done".parse::<StepStatus>().is_err());
        assert_eq!("success".parse::<StepStatus>().unwrap(), StepStatus::Success);
    }

    #[test]
    fn test_regression_detection() {
        assert!(StepStatus::Success.is_regression_to(StepStatus::Pending));
        assert!(StepStatus::Running.is_regression_to(StepStatus::Pending));
        assert!(StepStatus::Success.is_regression_to(StepStatus::Fail));
        assert!(!StepStatus::Running.is_regression_to(StepStatus::Success));
        assert!(!StepStatus::Success.is_regression_to(StepStatus::Success));
    }

    #[test]
    fn test_overall_task_status() {
        assert_eq!(OverallState::from_terminal(StepStatus::Fail).task_status(), Some("FAILURE"));
        assert_eq!(OverallState::from_terminal(StepStatus::Success).task_status(), Some("SUCCESS"));
        assert_eq!(OverallState::from_terminal(StepStatus::Running).task_status(), None);
    }
}
