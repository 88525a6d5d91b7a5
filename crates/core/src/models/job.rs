//! Job model: a named, schedulable sequence of scripts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::Schedule;

/// Outcome of the most recent run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionState {
    /// The job has never run
    NeverRun,
    /// The last run succeeded
    Succeeded,
    /// The last run failed
    Failed,
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionState::NeverRun => write!(f, "never run"),
            ExecutionState::Succeeded => write!(f, "succeeded"),
            ExecutionState::Failed => write!(f, "failed"),
        }
    }
}

/// The job's record of its most recent execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLedger {
    /// When the last run finished
    pub last_execution_time: Option<DateTime<Utc>>,
    /// Tri-state success flag: `None` until the first run
    pub last_execution_success: Option<bool>,
    /// Error text of the last run, if it failed
    pub last_execution_error: Option<String>,
    /// Duration of the last run in milliseconds
    pub last_execution_duration_ms: Option<i64>,
}

impl ExecutionLedger {
    /// Ledger entry for a finished run
    pub fn finished(success: bool, error: Option<String>, duration_ms: i64) -> Self {
        Self {
            last_execution_time: Some(Utc::now()),
            last_execution_success: Some(success),
            last_execution_error: error,
            last_execution_duration_ms: Some(duration_ms),
        }
    }

    /// Outcome of the last run
    pub fn state(&self) -> ExecutionState {
        match self.last_execution_success {
            None => ExecutionState::NeverRun,
            Some(true) => ExecutionState::Succeeded,
            Some(false) => ExecutionState::Failed,
        }
    }
}

/// A persisted job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Catalog identifier
    pub id: i64,
    /// Unique name
    pub name: String,
    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Recurring schedule, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    /// Last execution outcome
    pub ledger: ExecutionLedger,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    /// Unique name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Recurring schedule, if any
    pub schedule: Option<Schedule>,
}

impl NewJob {
    /// Create a job definition with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the schedule
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_state() {
        assert_eq!(ExecutionLedger::default().state(), ExecutionState::NeverRun);
        assert_eq!(
            ExecutionLedger::finished(true, None, 10).state(),
            ExecutionState::Succeeded
        );
        let failed = ExecutionLedger::finished(false, Some("boom".to_string()), 10);
        assert_eq!(failed.state(), ExecutionState::Failed);
        assert_eq!(failed.last_execution_error.as_deref(), Some("boom"));
    }
}
