//! Workflows: immutable, validated step graphs
//!
//! A [`Workflow`] is assembled once (normally through the engine's
//! `WorkflowBuilder`), validated once, and then reused across many
//! instances. Assembly rejects unresolved step references outright;
//! everything else structural is checked by [`Workflow::validate`],
//! which aggregates every violation instead of stopping at the first.

use crate::{Step, StepId, Transition, WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for a workflow
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Workflow ─────────────────────────────────────────────────────────

/// An immutable, validated workflow graph
#[derive(Clone, Debug)]
pub struct Workflow {
    /// Unique identifier
    pub id: WorkflowId,
    /// Human-readable name
    pub name: String,
    /// Description of what this workflow accomplishes
    pub description: String,
    /// Steps keyed by id
    steps: HashMap<StepId, Step>,
    /// Step ids in registration order, for deterministic iteration
    order: Vec<StepId>,
    /// The designated entry point
    start: StepId,
    /// Outgoing transitions per step, in declaration order
    routes: HashMap<StepId, Vec<Transition>>,
}

impl Workflow {
    /// Assemble a workflow from its parts and validate it.
    ///
    /// Fails with [`WorkflowError::DuplicateStepId`] on a repeated id,
    /// [`WorkflowError::UnresolvedReference`] when a transition names an
    /// unregistered step, and [`WorkflowError::ValidationFailure`]
    /// (aggregating all violations) for everything else structural. A
    /// workflow that fails any of these never exists as a value.
    pub fn assemble(
        id: WorkflowId,
        name: impl Into<String>,
        description: impl Into<String>,
        steps: Vec<Step>,
        start: StepId,
        transitions: Vec<Transition>,
    ) -> WorkflowResult<Self> {
        let mut step_map = HashMap::with_capacity(steps.len());
        let mut order = Vec::with_capacity(steps.len());
        for step in steps {
            if step_map.contains_key(&step.id) {
                return Err(WorkflowError::DuplicateStepId(step.id));
            }
            order.push(step.id.clone());
            step_map.insert(step.id.clone(), step);
        }

        let mut routes: HashMap<StepId, Vec<Transition>> = HashMap::new();
        for transition in transitions {
            if !step_map.contains_key(&transition.source) {
                return Err(WorkflowError::UnresolvedReference {
                    from: transition.source,
                    to: transition.target,
                });
            }
            if !step_map.contains_key(&transition.target) {
                return Err(WorkflowError::UnresolvedReference {
                    from: transition.source,
                    to: transition.target,
                });
            }
            routes
                .entry(transition.source.clone())
                .or_default()
                .push(transition);
        }

        let workflow = Self {
            id,
            name: name.into(),
            description: description.into(),
            steps: step_map,
            order,
            start,
            routes,
        };
        workflow.validate()?;
        Ok(workflow)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The designated start step
    pub fn start_step(&self) -> &Step {
        // assembly guarantees the start step is registered
        &self.steps[&self.start]
    }

    /// The start step's id
    pub fn start_id(&self) -> &StepId {
        &self.start
    }

    /// Get a step by id
    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.get(id)
    }

    /// Iterate over all steps in registration order
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.order.iter().filter_map(|id| self.steps.get(id))
    }

    /// Total number of steps
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Outgoing transitions from a step, in declaration order
    pub fn outgoing(&self, id: &StepId) -> &[Transition] {
        self.routes.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All terminal steps, in registration order
    pub fn terminal_steps(&self) -> Vec<&Step> {
        self.steps().filter(|s| s.is_terminal()).collect()
    }

    /// All conditional steps, in registration order
    pub fn conditional_steps(&self) -> Vec<&Step> {
        self.steps().filter(|s| s.is_conditional()).collect()
    }

    /// Find all step ids reachable from a given step
    pub fn reachable_from(&self, start: &StepId) -> HashSet<StepId> {
        let mut visited = HashSet::new();
        let mut queue = vec![start.clone()];

        while let Some(current) = queue.pop() {
            if visited.insert(current.clone()) {
                for transition in self.outgoing(&current) {
                    if !visited.contains(&transition.target) {
                        queue.push(transition.target.clone());
                    }
                }
            }
        }

        visited
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Check every structural invariant, aggregating all violations
    pub fn validate(&self) -> WorkflowResult<()> {
        let mut violations = Vec::new();

        if self.steps.is_empty() {
            violations.push("workflow has no steps".to_string());
        }

        if !self.steps.is_empty() && !self.steps.contains_key(&self.start) {
            violations.push(format!("start step '{}' is not registered", self.start));
        }

        for id in &self.order {
            let step = &self.steps[id];
            let outgoing = self.outgoing(id);

            if step.is_terminal() {
                if !outgoing.is_empty() {
                    violations.push(format!("terminal step '{}' has outgoing transitions", id));
                }
                continue;
            }

            if outgoing.is_empty() {
                violations.push(format!("step '{}' has no outgoing transition", id));
                continue;
            }

            if step.is_conditional() {
                self.check_conditional(id, outgoing, &mut violations);
            } else {
                if outgoing.len() > 1 {
                    violations.push(format!(
                        "step '{}' has {} outgoing transitions; only conditional steps branch",
                        id,
                        outgoing.len()
                    ));
                }
                for transition in outgoing {
                    if !transition.guard.is_always() {
                        violations.push(format!(
                            "guarded transition declared on non-conditional step '{}'",
                            id
                        ));
                    }
                }
            }
        }

        if self.steps.contains_key(&self.start) {
            let reachable = self.reachable_from(&self.start);
            for id in &self.order {
                if !reachable.contains(id) {
                    violations.push(format!("step '{}' is unreachable from start", id));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(WorkflowError::validation(violations))
        }
    }

    /// A conditional's guards must be structurally exhaustive: every
    /// outgoing transition guarded, at least one predicate, and exactly
    /// one trailing `Otherwise` fallback.
    fn check_conditional(&self, id: &StepId, outgoing: &[Transition], violations: &mut Vec<String>) {
        let mut predicated = 0usize;
        let mut fallbacks = 0usize;

        for transition in outgoing {
            if transition.guard.is_always() {
                violations.push(format!(
                    "conditional step '{}' has an unguarded transition to '{}'",
                    id, transition.target
                ));
            }
            if transition.guard.is_predicated() {
                predicated += 1;
            }
            if transition.guard.is_otherwise() {
                fallbacks += 1;
            }
        }

        if predicated == 0 {
            violations.push(format!("conditional step '{}' declares no guards", id));
        }
        match fallbacks {
            0 => violations.push(format!(
                "conditional step '{}' declares no fallback; its guards cannot be proven exhaustive",
                id
            )),
            1 => {
                if !outgoing
                    .last()
                    .map(|t| t.guard.is_otherwise())
                    .unwrap_or(false)
                {
                    violations.push(format!(
                        "conditional step '{}' declares guards after its fallback; they are unreachable",
                        id
                    ));
                }
            }
            _ => violations.push(format!(
                "conditional step '{}' declares {} fallbacks; exactly one is allowed",
                id, fallbacks
            )),
        }
    }
}
