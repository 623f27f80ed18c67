//! Workflow builder: explicit edge registration over the step graph
//!
//! The builder is the one place a workflow can come from. Steps are
//! registered by id, the start step is designated, and transitions are
//! declared with `connect` / `connect_when` / `connect_otherwise` —
//! explicit builder methods standing in for fluent connector sugar.
//! `build` resolves everything into an immutable [`Workflow`],
//! rejecting unresolved references and aggregating every structural
//! violation.

use workflow_types::{
    Predicate, Step, StepId, Transition, Workflow, WorkflowError, WorkflowId, WorkflowResult,
};

/// Assembles and validates a [`Workflow`]
#[derive(Debug, Default)]
pub struct WorkflowBuilder {
    id: String,
    name: String,
    description: String,
    steps: Vec<Step>,
    start: Option<StepId>,
    transitions: Vec<Transition>,
}

impl WorkflowBuilder {
    /// Start building a workflow
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
            start: None,
            transitions: Vec::new(),
        }
    }

    /// Register a step by id
    pub fn add_step(&mut self, step: Step) -> WorkflowResult<()> {
        if self.steps.iter().any(|s| s.id == step.id) {
            return Err(WorkflowError::DuplicateStepId(step.id));
        }
        self.steps.push(step);
        Ok(())
    }

    /// Designate the entry point; the step must already be registered
    pub fn set_start(&mut self, id: impl Into<String>) -> WorkflowResult<()> {
        let id = StepId::new(id);
        if !self.steps.iter().any(|s| s.id == id) {
            return Err(WorkflowError::StepNotFound(id));
        }
        self.start = Some(id);
        Ok(())
    }

    /// Declare an unconditional transition `from -> to`
    pub fn connect(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.transitions
            .push(Transition::new(StepId::new(from), StepId::new(to)));
    }

    /// Declare a guarded transition on a Conditional step. Guards are
    /// evaluated in declaration order; the first satisfied one wins.
    pub fn connect_when(
        &mut self,
        from: impl Into<String>,
        label: impl Into<String>,
        predicate: Predicate,
        to: impl Into<String>,
    ) {
        self.transitions.push(
            Transition::when(StepId::new(from), StepId::new(to), predicate).with_label(label),
        );
    }

    /// Declare a Conditional step's fallback, taken when no guard
    /// matched. Every Conditional must declare exactly one, last.
    pub fn connect_otherwise(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.transitions
            .push(Transition::otherwise(StepId::new(from), StepId::new(to)));
    }

    /// Resolve the declared graph into an immutable, validated
    /// [`Workflow`]. Fails with `UnresolvedReference` if a transition
    /// names an unregistered step, `NoStartStep` if no entry point was
    /// designated, and an aggregated `ValidationFailure` for all other
    /// structural violations.
    pub fn build(self) -> WorkflowResult<Workflow> {
        let start = self.start.ok_or(WorkflowError::NoStartStep)?;
        let workflow = Workflow::assemble(
            WorkflowId::new(self.id),
            self.name,
            self.description,
            self.steps,
            start,
            self.transitions,
        )?;

        tracing::debug!(
            workflow_id = %workflow.id,
            steps = workflow.step_count(),
            "Workflow built and validated"
        );
        Ok(workflow)
    }
}
