//! Error types shared across the workflow crates

use crate::{StepId, WorkflowId, WorkflowInstanceId};

/// Errors raised while building, validating, or executing workflows
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Duplicate step id: '{0}'")]
    DuplicateStepId(StepId),

    #[error("Step not found: '{0}'")]
    StepNotFound(StepId),

    #[error("Transition references unregistered step: '{from}' -> '{to}'")]
    UnresolvedReference { from: StepId, to: StepId },

    #[error("Workflow has no start step")]
    NoStartStep,

    #[error(
        "Workflow validation failed with {} violation(s):\n{}",
        .violations.len(),
        .violations.join("\n")
    )]
    ValidationFailure { violations: Vec<String> },

    #[error("Workflow not found: '{0}'")]
    WorkflowNotFound(WorkflowId),

    #[error("Workflow '{0}' is already registered")]
    DuplicateWorkflow(WorkflowId),

    #[error("Workflow instance not found: '{0}'")]
    InstanceNotFound(WorkflowInstanceId),

    #[error("Workflow instance already completed")]
    AlreadyCompleted,

    #[error("Workflow instance is not suspended")]
    NotSuspended,

    #[error("Submission does not match the suspended step '{expected}'")]
    UnexpectedSubmission { expected: StepId },

    #[error(
        "Submission rejected with {} issue(s):\n{}",
        .issues.len(),
        .issues.join("\n")
    )]
    InvalidSubmission { issues: Vec<String> },

    #[error("Citizen data key '{0}' was already submitted with a different value")]
    DataConflict(String),

    #[error("'{approver}' is not an authorized approver for step '{step}'")]
    UnknownApprover { approver: String, step: StepId },

    #[error("Integration '{service}{endpoint}' failed: {message}")]
    IntegrationFailed {
        service: String,
        endpoint: String,
        message: String,
    },

    #[error("Execution exceeded {0} step transitions; the graph may contain an unterminated cycle")]
    ExecutionLimitExceeded(usize),
}

impl WorkflowError {
    /// Build an aggregated validation failure from collected violations
    pub fn validation(violations: Vec<String>) -> Self {
        Self::ValidationFailure { violations }
    }
}

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
