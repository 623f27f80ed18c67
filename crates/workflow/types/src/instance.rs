//! Workflow instances: one in-progress execution of a workflow
//!
//! An instance owns two mappings. `data` is citizen-submitted input and
//! is append-only: a key, once submitted, never changes (replaying the
//! same submission is a no-op; a conflicting overwrite is an error).
//! `context` is the running accumulation of step outputs, merged
//! globally — see [`WorkflowInstance::merge_context`] for the contract.

use crate::{Context, InputForm, StepId, StepOutput, WorkflowError, WorkflowId, WorkflowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

// ── Instance Identifier ──────────────────────────────────────────────

/// Unique identifier for a workflow instance
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowInstanceId(pub String);

impl WorkflowInstanceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for WorkflowInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Workflow Instance ────────────────────────────────────────────────

/// A running execution of a workflow
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Unique instance identifier
    pub id: WorkflowInstanceId,
    /// The workflow this instance executes
    pub workflow_id: WorkflowId,
    /// Lifecycle state
    pub state: InstanceState,
    /// Citizen-submitted input, append-only
    pub data: Context,
    /// Accumulated step outputs, globally merged
    pub context: Context,
    /// Execution status per visited step
    pub step_states: HashMap<StepId, StepState>,
    /// The step the instance is currently at, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<StepId>,
    /// Why the instance is suspended, if it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspension: Option<Suspension>,
    /// Ordered record of everything that happened to this instance
    pub journal: Vec<JournalEntry>,
    /// When the instance was created
    pub created_at: DateTime<Utc>,
    /// When the instance was last updated
    pub updated_at: DateTime<Utc>,
    /// When the instance reached a terminal step (if it has)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// The terminal step that ended the instance. The step's description
    /// carries the success/failure semantic; the instance state is
    /// `Completed` either way, since routed business failures are
    /// outcomes, not errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_step: Option<StepId>,
}

impl WorkflowInstance {
    /// Create a new instance of a workflow
    pub fn new(workflow_id: WorkflowId) -> Self {
        let now = Utc::now();
        Self {
            id: WorkflowInstanceId::generate(),
            workflow_id,
            state: InstanceState::Created,
            data: Context::new(),
            context: Context::new(),
            step_states: HashMap::new(),
            current_step: None,
            suspension: None,
            journal: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            terminal_step: None,
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    // ── Citizen data ─────────────────────────────────────────────────

    /// Append one citizen-submitted value.
    ///
    /// `data` is append-only: resubmitting an identical value is a
    /// no-op, resubmitting a different value for an existing key is a
    /// [`WorkflowError::DataConflict`].
    pub fn submit_data(&mut self, key: impl Into<String>, value: Value) -> WorkflowResult<()> {
        let key = key.into();
        match self.data.get(&key) {
            Some(existing) if *existing == value => Ok(()),
            Some(_) => Err(WorkflowError::DataConflict(key)),
            None => {
                self.data.insert(key, value);
                self.updated_at = Utc::now();
                Ok(())
            }
        }
    }

    /// Append a batch of citizen-submitted values
    pub fn submit_all(&mut self, data: Context) -> WorkflowResult<()> {
        for (key, value) in data {
            self.submit_data(key, value)?;
        }
        Ok(())
    }

    // ── Context ──────────────────────────────────────────────────────

    /// Merge a step's output into the running context.
    ///
    /// The merge contract is global: every output key lands at the top
    /// level of one shared `context`, and a later writer overwrites an
    /// earlier one. This is deliberate — successive check steps reuse
    /// the `status` key, and the Conditional immediately after each
    /// check reads it un-namespaced.
    pub fn merge_context(&mut self, output: StepOutput) {
        for (key, value) in output {
            self.context.insert(key, value);
        }
        self.updated_at = Utc::now();
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the instance (transition from Created to Active)
    pub fn start(&mut self) {
        self.state = InstanceState::Active;
        self.updated_at = Utc::now();
        self.record("instance_started", "Workflow instance started");
    }

    /// Enter a step
    pub fn enter_step(&mut self, step_id: StepId) {
        let now = Utc::now();
        self.step_states.insert(
            step_id.clone(),
            StepState {
                status: StepStatus::Active,
                entered_at: Some(now),
                completed_at: None,
            },
        );
        self.record("step_entered", format!("Step '{}' entered", step_id));
        self.current_step = Some(step_id);
        self.updated_at = now;
    }

    /// Complete a step
    pub fn complete_step(&mut self, step_id: &StepId) {
        if let Some(state) = self.step_states.get_mut(step_id) {
            state.status = StepStatus::Completed;
            state.completed_at = Some(Utc::now());
        }
        self.updated_at = Utc::now();
        self.record("step_completed", format!("Step '{}' completed", step_id));
    }

    /// Fail a step
    pub fn fail_step(&mut self, step_id: &StepId, reason: impl Into<String>) {
        let reason = reason.into();
        if let Some(state) = self.step_states.get_mut(step_id) {
            state.status = StepStatus::Failed;
            state.completed_at = Some(Utc::now());
        }
        self.updated_at = Utc::now();
        self.record(
            "step_failed",
            format!("Step '{}' failed: {}", step_id, reason),
        );
    }

    /// Suspend the instance at a suspension point
    pub fn suspend(&mut self, suspension: Suspension) {
        self.record(
            "instance_suspended",
            format!("Suspended at step '{}'", suspension.step()),
        );
        self.suspension = Some(suspension);
        self.state = InstanceState::Suspended;
        self.updated_at = Utc::now();
    }

    /// Resume a suspended instance
    pub fn resume(&mut self) {
        self.suspension = None;
        self.state = InstanceState::Active;
        self.updated_at = Utc::now();
        self.record("instance_resumed", "Workflow instance resumed");
    }

    /// Complete the instance at a terminal step
    pub fn complete(&mut self, terminal_step: StepId) {
        self.record(
            "instance_completed",
            format!("Reached terminal step '{}'", terminal_step),
        );
        self.terminal_step = Some(terminal_step);
        self.current_step = None;
        self.state = InstanceState::Completed;
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Fail the instance (genuine error, not a routed business outcome)
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.state = InstanceState::Failed;
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self.record("instance_failed", format!("Instance failed: {}", reason));
    }

    // ── Query methods ────────────────────────────────────────────────

    /// Check if the instance is actively executing
    pub fn is_active(&self) -> bool {
        self.state == InstanceState::Active
    }

    /// Check if the instance is suspended awaiting external input
    pub fn is_suspended(&self) -> bool {
        self.state == InstanceState::Suspended
    }

    /// Check if the instance has ended (completed or failed)
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Get a visited step's execution state
    pub fn step_state(&self, step_id: &StepId) -> Option<&StepState> {
        self.step_states.get(step_id)
    }

    /// Check if a step has already completed (idempotent-resume guard)
    pub fn step_completed(&self, step_id: &StepId) -> bool {
        self.step_states
            .get(step_id)
            .map(|s| s.status == StepStatus::Completed)
            .unwrap_or(false)
    }

    /// All steps that have completed, in no particular order
    pub fn completed_steps(&self) -> Vec<&StepId> {
        self.step_states
            .iter()
            .filter(|(_, s)| s.status == StepStatus::Completed)
            .map(|(id, _)| id)
            .collect()
    }

    /// Total journal entries
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn record(&mut self, event: impl Into<String>, description: impl Into<String>) {
        self.journal.push(JournalEntry {
            sequence: self.journal.len() as u64,
            event: event.into(),
            description: description.into(),
            timestamp: Utc::now(),
        });
    }
}

// ── Instance State ───────────────────────────────────────────────────

/// The lifecycle state of a workflow instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InstanceState {
    /// Created but not yet started
    #[default]
    Created,
    /// Actively executing
    Active,
    /// Suspended awaiting citizen input or an approval decision
    Suspended,
    /// Reached a terminal step
    Completed,
    /// Stopped by a genuine error (integration fault, misconfiguration)
    Failed,
}

impl InstanceState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

// ── Suspension ───────────────────────────────────────────────────────

/// Why a suspended instance is waiting
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suspension {
    /// Waiting for the citizen to submit the surfaced form
    CitizenInput { step: StepId, form: InputForm },
    /// Waiting for a decision from one of the named approvers
    Approval { step: StepId, approvers: Vec<String> },
}

impl Suspension {
    /// The step the instance is suspended at
    pub fn step(&self) -> &StepId {
        match self {
            Self::CitizenInput { step, .. } => step,
            Self::Approval { step, .. } => step,
        }
    }
}

// ── Step State ───────────────────────────────────────────────────────

/// Execution state of a visited step
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepState {
    /// Current status
    pub status: StepStatus,
    /// When the step was entered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entered_at: Option<DateTime<Utc>>,
    /// When the step completed or failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Status of a visited step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Currently executing or suspended
    Active,
    /// Successfully completed
    Completed,
    /// Failed with a genuine error
    Failed,
}

// ── Journal ──────────────────────────────────────────────────────────

/// An entry in the instance journal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Monotonically increasing sequence number
    pub sequence: u64,
    /// Type of event
    pub event: String,
    /// Human-readable description
    pub description: String,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FormField, InputForm};
    use serde_json::json;

    fn make_instance() -> WorkflowInstance {
        WorkflowInstance::new(WorkflowId::new("fishing_permit_v1"))
    }

    #[test]
    fn test_create_instance() {
        let inst = make_instance();
        assert_eq!(inst.state, InstanceState::Created);
        assert!(!inst.is_active());
        assert!(!inst.is_terminal());
        assert!(inst.current_step.is_none());
    }

    #[test]
    fn test_lifecycle() {
        let mut inst = make_instance();
        inst.start();
        assert!(inst.is_active());

        inst.enter_step(StepId::new("validate_identity"));
        assert_eq!(inst.current_step, Some(StepId::new("validate_identity")));

        inst.complete_step(&StepId::new("validate_identity"));
        assert!(inst.step_completed(&StepId::new("validate_identity")));
        assert_eq!(inst.completed_steps().len(), 1);

        inst.complete(StepId::new("permit_issued"));
        assert!(inst.is_terminal());
        assert_eq!(inst.state, InstanceState::Completed);
        assert_eq!(inst.terminal_step, Some(StepId::new("permit_issued")));
        assert!(inst.completed_at.is_some());
    }

    #[test]
    fn test_data_is_append_only() {
        let mut inst = make_instance();
        inst.submit_data("fisher_name", json!("Maria Santos"))
            .unwrap();

        // identical resubmission is a no-op
        inst.submit_data("fisher_name", json!("Maria Santos"))
            .unwrap();
        assert_eq!(inst.data.len(), 1);

        // conflicting overwrite is rejected
        let result = inst.submit_data("fisher_name", json!("Someone Else"));
        assert!(matches!(result, Err(WorkflowError::DataConflict(_))));
        assert_eq!(
            inst.data.get("fisher_name").unwrap(),
            &json!("Maria Santos")
        );
    }

    #[test]
    fn test_global_context_merge() {
        let mut inst = make_instance();

        let mut first = StepOutput::new();
        first.insert("status".into(), json!("valid"));
        first.insert("fisher_id".into(), json!("FISHER_CF12345678"));
        inst.merge_context(first);

        // a later step reuses the status key and overwrites it
        let mut second = StepOutput::new();
        second.insert("status".into(), json!("verified"));
        inst.merge_context(second);

        assert_eq!(inst.context.get("status").unwrap(), &json!("verified"));
        assert_eq!(
            inst.context.get("fisher_id").unwrap(),
            &json!("FISHER_CF12345678")
        );
    }

    #[test]
    fn test_suspension_round_trip() {
        let mut inst = make_instance();
        inst.start();
        inst.enter_step(StepId::new("collect_details"));

        let form =
            InputForm::new("Details", "").with_field(FormField::text("fisher_name", "Name"));
        inst.suspend(Suspension::CitizenInput {
            step: StepId::new("collect_details"),
            form,
        });

        assert!(inst.is_suspended());
        assert_eq!(
            inst.suspension.as_ref().unwrap().step(),
            &StepId::new("collect_details")
        );

        inst.resume();
        assert!(inst.is_active());
        assert!(inst.suspension.is_none());
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut inst = make_instance();
        inst.start();
        inst.enter_step(StepId::new("process_payment"));
        inst.fail_step(&StepId::new("process_payment"), "gateway unreachable");
        inst.fail("Integration 'payment_gateway/process' failed");

        assert_eq!(inst.state, InstanceState::Failed);
        assert!(inst.is_terminal());
        assert_eq!(
            inst.step_state(&StepId::new("process_payment"))
                .unwrap()
                .status,
            StepStatus::Failed
        );
    }

    #[test]
    fn test_journal_sequencing() {
        let mut inst = make_instance();
        inst.start();
        inst.enter_step(StepId::new("a"));
        inst.complete_step(&StepId::new("a"));
        inst.complete(StepId::new("done"));

        assert!(inst.journal_len() >= 4);
        for (i, entry) in inst.journal.iter().enumerate() {
            assert_eq!(entry.sequence, i as u64);
        }
    }

    #[test]
    fn test_instance_serializes() {
        let mut inst = make_instance();
        inst.start();
        inst.submit_data("vessel_id", json!("VR12345678")).unwrap();

        let value = serde_json::to_value(&inst).unwrap();
        assert_eq!(value["workflow_id"], json!("fishing_permit_v1"));
        assert_eq!(value["data"]["vessel_id"], json!("VR12345678"));

        let back: WorkflowInstance = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, inst.id);
        assert!(back.is_active());
    }

    #[test]
    fn test_instance_id() {
        let id = WorkflowInstanceId::generate();
        assert!(!id.0.is_empty());
        assert!(id.short().len() <= 8);

        let named = WorkflowInstanceId::new("inst-1");
        assert_eq!(format!("{}", named), "inst-1");
    }
}
