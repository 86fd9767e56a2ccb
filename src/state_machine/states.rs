use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation lifecycle of one changeover step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepLifecycle {
    /// Initial state; the step has not been validated, or was invalidated.
    Pending,
    /// The step was validated and the remote source accepted it.
    Validated,
}

impl StepLifecycle {
    /// Check if the step has been validated.
    pub fn is_validated(&self) -> bool {
        matches!(self, Self::Validated)
    }

    /// Check if the step still requires operator action.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for StepLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Validated => write!(f, "validated"),
        }
    }
}

impl std::str::FromStr for StepLifecycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "validated" => Ok(Self::Validated),
            _ => Err(format!("Invalid step lifecycle: {s}")),
        }
    }
}

/// New steps start pending.
impl Default for StepLifecycle {
    fn default() -> Self {
        Self::Pending
    }
}
