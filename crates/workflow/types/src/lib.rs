//! Step-graph domain types for Coastline case-management workflows
//!
//! A workflow is a directed graph of typed steps — Action, Conditional,
//! Approval, Integration, Terminal — connected by transitions whose
//! guards are evaluated in declaration order. Workflows are assembled
//! once, validated once, and then treated as immutable blueprints that
//! many [`WorkflowInstance`]s execute against.
//!
//! Two mappings flow through execution:
//!
//! - `data` — citizen-submitted input, append-only
//! - `context` — accumulated step outputs, merged globally so that a
//!   Conditional can read its predecessor's keys un-namespaced
//!
//! Business-rule failures (an invalid license, an exceeded quota) are
//! ordinary `status` values routed to dedicated Terminal steps. Only
//! genuine faults — a failed integration call, a misconfigured graph —
//! surface as [`WorkflowError`].

#![deny(unsafe_code)]

pub mod error;
pub mod form;
pub mod instance;
pub mod step;
pub mod transition;
pub mod workflow;

pub use error::{WorkflowError, WorkflowResult};
pub use form::{FieldType, FieldValidation, FormField, InputForm};
pub use instance::{
    InstanceState, JournalEntry, StepState, StepStatus, Suspension, WorkflowInstance,
    WorkflowInstanceId,
};
pub use step::{ActionFn, HttpMethod, Step, StepId, StepKind};
pub use transition::{Guard, Predicate, Transition};
pub use workflow::{Workflow, WorkflowId};

/// The accumulated mapping of step outputs consulted by downstream
/// steps and conditionals; also the shape of citizen-submitted `data`.
pub type Context = serde_json::Map<String, serde_json::Value>;

/// A partial context update produced by one step
pub type StepOutput = serde_json::Map<String, serde_json::Value>;
