//! Workflow transitions: directed, optionally guarded edges
//!
//! Transitions connect steps in the workflow graph. A Conditional
//! step's outgoing transitions carry guards that are evaluated in
//! declaration order; the first satisfied guard's transition is taken.
//! Every Conditional must declare an `Otherwise` fallback — a guard set
//! with no fallback is rejected at build time, which is what makes
//! guard coverage a structural property instead of a runtime surprise.

use crate::{Context, StepId, WorkflowInstance};
use std::fmt;
use std::sync::Arc;

// ── Predicates ───────────────────────────────────────────────────────

/// A boolean guard over `(instance, context)` attached to a transition
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&WorkflowInstance, &Context) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&WorkflowInstance, &Context) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluate the predicate against an instance and its context
    pub fn evaluate(&self, instance: &WorkflowInstance, context: &Context) -> bool {
        (self.0)(instance, context)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

// ── Transition ───────────────────────────────────────────────────────

/// A directed edge between two steps
#[derive(Clone, Debug)]
pub struct Transition {
    /// Source step
    pub source: StepId,
    /// Target step
    pub target: StepId,
    /// The guard controlling whether this transition is taken
    pub guard: Guard,
    /// Human-readable label for this transition
    pub label: String,
}

impl Transition {
    /// Create an unconditional transition
    pub fn new(source: StepId, target: StepId) -> Self {
        Self {
            source,
            target,
            guard: Guard::Always,
            label: String::new(),
        }
    }

    /// Create a guarded transition
    pub fn when(source: StepId, target: StepId, predicate: Predicate) -> Self {
        Self {
            source,
            target,
            guard: Guard::When(predicate),
            label: String::new(),
        }
    }

    /// Create the declared fallback transition of a Conditional step
    pub fn otherwise(source: StepId, target: StepId) -> Self {
        Self {
            source,
            target,
            guard: Guard::Otherwise,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// The guard on a transition
#[derive(Clone, Debug)]
pub enum Guard {
    /// Always taken — the single outgoing edge of a non-Conditional step
    Always,
    /// Taken when the predicate evaluates true
    When(Predicate),
    /// The declared fallback, taken when no earlier guard matched
    Otherwise,
}

impl Guard {
    /// Check if this is an unconditional guard
    pub fn is_always(&self) -> bool {
        matches!(self, Self::Always)
    }

    /// Check if this is the declared fallback
    pub fn is_otherwise(&self) -> bool {
        matches!(self, Self::Otherwise)
    }

    /// Check if this guard carries a predicate
    pub fn is_predicated(&self) -> bool {
        matches!(self, Self::When(_))
    }

    /// Evaluate the guard. `Always` and `Otherwise` are satisfied by
    /// construction; `Otherwise` is only reached when evaluation in
    /// declaration order exhausted every `When` guard before it.
    pub fn satisfied(&self, instance: &WorkflowInstance, context: &Context) -> bool {
        match self {
            Self::Always | Self::Otherwise => true,
            Self::When(predicate) => predicate.evaluate(instance, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkflowId;
    use serde_json::json;

    fn instance() -> WorkflowInstance {
        WorkflowInstance::new(WorkflowId::new("wf"))
    }

    #[test]
    fn test_unconditional_transition() {
        let t = Transition::new(StepId::new("a"), StepId::new("b"));
        assert!(t.guard.is_always());
        assert!(!t.guard.is_predicated());
        assert!(t.guard.satisfied(&instance(), &Context::new()));
    }

    #[test]
    fn test_guarded_transition() {
        let t = Transition::when(
            StepId::new("check"),
            StepId::new("pass"),
            Predicate::new(|_, context| context.get("status") == Some(&json!("valid"))),
        )
        .with_label("valid");

        assert_eq!(t.label, "valid");
        assert!(t.guard.is_predicated());

        let mut context = Context::new();
        assert!(!t.guard.satisfied(&instance(), &context));

        context.insert("status".into(), json!("valid"));
        assert!(t.guard.satisfied(&instance(), &context));
    }

    #[test]
    fn test_otherwise_transition() {
        let t = Transition::otherwise(StepId::new("check"), StepId::new("failed"));
        assert!(t.guard.is_otherwise());
        assert!(t.guard.satisfied(&instance(), &Context::new()));
    }

    #[test]
    fn test_predicate_reads_instance_data() {
        let p = Predicate::new(|instance, _| {
            instance
                .data
                .get("permit_type")
                .and_then(|v| v.as_str())
                .map(|s| s == "sustainable")
                .unwrap_or(false)
        });

        let mut inst = instance();
        assert!(!p.evaluate(&inst, &Context::new()));

        inst.data.insert("permit_type".into(), json!("sustainable"));
        assert!(p.evaluate(&inst, &Context::new()));
    }
}
