//! Workflow steps: the typed nodes of a case-management step graph
//!
//! Five kinds of step exist. Action steps run a pure business-rule
//! function (or pause for citizen input when they carry a form),
//! Conditional steps route on guarded transitions, Approval steps pause
//! for a named approver, Integration steps invoke an external service,
//! and Terminal steps end the instance.

use crate::{Context, InputForm, StepOutput, WorkflowInstance};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ── HTTP method ──────────────────────────────────────────────────────

/// HTTP method for an Integration step's external call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a step within a workflow
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Action functions ─────────────────────────────────────────────────

/// A pure business-rule function attached to an Action step.
///
/// Takes the instance (citizen-submitted `data`) and the accumulated
/// `context`, and returns a partial context update. Business failures
/// are expressed as `status` values in the output, never as errors.
#[derive(Clone)]
pub struct ActionFn(Arc<dyn Fn(&WorkflowInstance, &Context) -> StepOutput + Send + Sync>);

impl ActionFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&WorkflowInstance, &Context) -> StepOutput + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the function against an instance and its context
    pub fn call(&self, instance: &WorkflowInstance, context: &Context) -> StepOutput {
        (self.0)(instance, context)
    }
}

impl fmt::Debug for ActionFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionFn")
    }
}

// ── Step ─────────────────────────────────────────────────────────────

/// A step in the workflow graph
#[derive(Clone, Debug)]
pub struct Step {
    /// Unique identifier within this workflow
    pub id: StepId,
    /// Human-readable name
    pub name: String,
    /// Description of what this step does. For Terminal steps this is
    /// the only carrier of the success/failure semantic.
    pub description: String,
    /// The step variant
    pub kind: StepKind,
}

/// The variant of a workflow step
#[derive(Clone, Debug)]
pub enum StepKind {
    /// Runs a business-rule function producing a partial context update.
    /// A step carrying an `input_form` suspends on entry and surfaces
    /// the form to the citizen; `required_inputs` is introspection
    /// metadata naming the `data` keys the function reads.
    Action {
        action: Option<ActionFn>,
        required_inputs: Vec<String>,
        input_form: Option<InputForm>,
    },
    /// Routes on the guarded transitions declared against it; carries
    /// no function of its own.
    Conditional,
    /// Suspends pending a decision by one of the named approvers
    Approval { approvers: Vec<String> },
    /// Invokes a named external service endpoint and merges the result
    Integration {
        service: String,
        endpoint: String,
        method: HttpMethod,
    },
    /// Ends the instance; no outgoing transitions
    Terminal,
}

impl Step {
    fn new(id: impl Into<String>, name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: StepId::new(id),
            name: name.into(),
            description: String::new(),
            kind,
        }
    }

    /// Create an Action step with a business-rule function
    pub fn action(id: impl Into<String>, name: impl Into<String>, action: ActionFn) -> Self {
        Self::new(
            id,
            name,
            StepKind::Action {
                action: Some(action),
                required_inputs: Vec::new(),
                input_form: None,
            },
        )
    }

    /// Create an Action step that suspends for citizen input,
    /// surfacing the given form
    pub fn citizen_input(id: impl Into<String>, name: impl Into<String>, form: InputForm) -> Self {
        Self::new(
            id,
            name,
            StepKind::Action {
                action: None,
                required_inputs: Vec::new(),
                input_form: Some(form),
            },
        )
    }

    /// Create a Conditional routing step
    pub fn conditional(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, StepKind::Conditional)
    }

    /// Create an Approval step with its named approvers
    pub fn approval<I, S>(id: impl Into<String>, name: impl Into<String>, approvers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            name,
            StepKind::Approval {
                approvers: approvers.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Create an Integration step naming an external service call
    pub fn integration(
        id: impl Into<String>,
        name: impl Into<String>,
        service: impl Into<String>,
        endpoint: impl Into<String>,
        method: HttpMethod,
    ) -> Self {
        Self::new(
            id,
            name,
            StepKind::Integration {
                service: service.into(),
                endpoint: endpoint.into(),
                method,
            },
        )
    }

    /// Create a Terminal step
    pub fn terminal(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, StepKind::Terminal)
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Declare the `data` keys an Action step's function reads.
    /// Has no effect on other step kinds.
    pub fn with_required_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let StepKind::Action {
            required_inputs, ..
        } = &mut self.kind
        {
            *required_inputs = inputs.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Check if this is a Terminal step
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, StepKind::Terminal)
    }

    /// Check if this is a Conditional step
    pub fn is_conditional(&self) -> bool {
        matches!(self.kind, StepKind::Conditional)
    }

    /// Check if this step suspends the instance for citizen input
    pub fn requires_citizen_input(&self) -> bool {
        matches!(
            self.kind,
            StepKind::Action {
                input_form: Some(_),
                ..
            }
        )
    }

    /// The citizen-facing form, if this step carries one
    pub fn input_form(&self) -> Option<&InputForm> {
        match &self.kind {
            StepKind::Action { input_form, .. } => input_form.as_ref(),
            _ => None,
        }
    }

    /// Check if this step is a suspension point (citizen input or approval)
    pub fn suspends(&self) -> bool {
        self.requires_citizen_input() || matches!(self.kind, StepKind::Approval { .. })
    }
}
