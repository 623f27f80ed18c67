//! Workflow engine: single-stepping executor over validated workflows
//!
//! The engine coordinates; the business rules live in the steps. It
//! owns the registry and all instances, advances exactly one step at a
//! time per instance, and suspends at exactly two kinds of step:
//! citizen-input Actions and Approvals. Resumption is idempotent —
//! replaying a submission that already landed does not re-execute
//! completed steps.
//!
//! External services are reached only through the [`IntegrationClient`]
//! seam. A failed call fails the step and the instance; it is never
//! silently skipped. Retry policy belongs to the host deployment, not
//! here.

use crate::WorkflowRegistry;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use workflow_types::{
    Context, HttpMethod, InputForm, StepId, StepKind, StepOutput, Suspension, Workflow,
    WorkflowError, WorkflowId, WorkflowInstance, WorkflowInstanceId, WorkflowResult,
};

/// Upper bound on step transitions per advance, guarding against a
/// misconfigured cyclic graph spinning forever.
const STEP_LIMIT: usize = 1_000;

// ── Integration seam ─────────────────────────────────────────────────

/// One outbound call to an external service
#[derive(Clone, Debug)]
pub struct IntegrationRequest {
    pub service: String,
    pub endpoint: String,
    pub method: HttpMethod,
    /// Snapshot of the instance's `data` and `context`
    pub payload: Value,
}

/// The seam through which Integration steps reach external services.
///
/// Implementations return the service's structured result; an `Err`
/// fails the step and the instance.
pub trait IntegrationClient: Send + Sync {
    fn call(&self, request: &IntegrationRequest) -> Result<Value, String>;
}

/// An [`IntegrationClient`] serving canned responses, keyed by
/// `(service, endpoint)`. Unconfigured calls fail.
#[derive(Clone, Debug, Default)]
pub struct StaticIntegrationClient {
    responses: HashMap<(String, String), Result<Value, String>>,
}

impl StaticIntegrationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a successful response for a service endpoint
    pub fn with_response(
        mut self,
        service: impl Into<String>,
        endpoint: impl Into<String>,
        response: Value,
    ) -> Self {
        self.responses
            .insert((service.into(), endpoint.into()), Ok(response));
        self
    }

    /// Fail calls to a service endpoint
    pub fn with_failure(
        mut self,
        service: impl Into<String>,
        endpoint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.responses
            .insert((service.into(), endpoint.into()), Err(message.into()));
        self
    }
}

impl IntegrationClient for StaticIntegrationClient {
    fn call(&self, request: &IntegrationRequest) -> Result<Value, String> {
        match self
            .responses
            .get(&(request.service.clone(), request.endpoint.clone()))
        {
            Some(response) => response.clone(),
            None => Err(format!(
                "no response configured for {} {}{}",
                request.method, request.service, request.endpoint
            )),
        }
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// The workflow engine: registry, instances, and the advance loop
pub struct WorkflowEngine {
    registry: WorkflowRegistry,
    instances: HashMap<WorkflowInstanceId, WorkflowInstance>,
    integrations: Arc<dyn IntegrationClient>,
}

impl WorkflowEngine {
    /// Create an engine with the given integration client
    pub fn new(integrations: Arc<dyn IntegrationClient>) -> Self {
        Self {
            registry: WorkflowRegistry::new(),
            instances: HashMap::new(),
            integrations,
        }
    }

    // ── Workflow management ──────────────────────────────────────────

    /// Register a workflow with the engine
    pub fn register(&mut self, workflow: Workflow) -> WorkflowResult<WorkflowId> {
        self.registry.register(workflow)
    }

    /// The workflow registry
    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    // ── Instance lifecycle ───────────────────────────────────────────

    /// Launch an instance of a registered workflow
    pub fn start_instance(
        &mut self,
        workflow_id: &WorkflowId,
    ) -> WorkflowResult<WorkflowInstanceId> {
        self.start_instance_with_data(workflow_id, Context::new())
    }

    /// Launch an instance with pre-seeded citizen data.
    ///
    /// Seeded data is treated as already host-validated: a citizen-input
    /// step whose required fields are covered by it does not suspend.
    /// Live submissions through [`submit_input`](Self::submit_input) are
    /// checked against the form before they are accepted.
    pub fn start_instance_with_data(
        &mut self,
        workflow_id: &WorkflowId,
        data: Context,
    ) -> WorkflowResult<WorkflowInstanceId> {
        let workflow = self.registry.get(workflow_id)?.clone();

        let mut instance = WorkflowInstance::new(workflow_id.clone());
        instance.submit_all(data)?;
        instance.start();
        instance.enter_step(workflow.start_id().clone());

        let instance_id = instance.id.clone();
        tracing::info!(
            instance_id = %instance_id,
            workflow_id = %workflow_id,
            "Workflow instance launched"
        );

        let result = Self::advance(self.integrations.as_ref(), &workflow, &mut instance);
        self.instances.insert(instance_id.clone(), instance);
        result?;
        Ok(instance_id)
    }

    /// Get a workflow instance
    pub fn instance(&self, id: &WorkflowInstanceId) -> WorkflowResult<&WorkflowInstance> {
        self.instances
            .get(id)
            .ok_or_else(|| WorkflowError::InstanceNotFound(id.clone()))
    }

    /// All instances currently suspended awaiting external input
    pub fn suspended_instances(&self) -> Vec<&WorkflowInstance> {
        self.instances
            .values()
            .filter(|i| i.is_suspended())
            .collect()
    }

    /// Total number of instances (live and terminal)
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    // ── Resumption ───────────────────────────────────────────────────

    /// Submit citizen input for an instance suspended at a form.
    ///
    /// The submission is checked against the suspended form's required
    /// fields and validation rules; all issues are reported together.
    /// Replaying a submission whose values already landed is a no-op,
    /// whatever state the instance has since reached.
    pub fn submit_input(
        &mut self,
        instance_id: &WorkflowInstanceId,
        submission: Context,
    ) -> WorkflowResult<()> {
        let workflow = {
            let instance = self.instance(instance_id)?;
            self.registry.get(&instance.workflow_id)?.clone()
        };
        let integrations = Arc::clone(&self.integrations);
        let instance = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| WorkflowError::InstanceNotFound(instance_id.clone()))?;

        match instance.suspension.clone() {
            Some(Suspension::CitizenInput { step, form }) => {
                let mut overlay = instance.data.clone();
                for (key, value) in &submission {
                    overlay.insert(key.clone(), value.clone());
                }
                let issues = form.validate_submission(&overlay);
                if !issues.is_empty() {
                    return Err(WorkflowError::InvalidSubmission { issues });
                }

                instance.submit_all(submission)?;
                instance.resume();
                tracing::info!(
                    instance_id = %instance_id,
                    step = %step,
                    "Citizen input received"
                );
                Self::advance(integrations.as_ref(), &workflow, instance)
            }
            _ => {
                // idempotent replay of data that already landed
                let replayed = !submission.is_empty()
                    && submission
                        .iter()
                        .all(|(key, value)| instance.data.get(key) == Some(value));
                if replayed {
                    return Ok(());
                }
                if instance.is_terminal() {
                    Err(WorkflowError::AlreadyCompleted)
                } else {
                    Err(WorkflowError::NotSuspended)
                }
            }
        }
    }

    /// Record an approver's decision for an instance suspended at an
    /// Approval step. Rejection is a routed business outcome: the
    /// decision lands in context as `approved` and the following
    /// Conditional does the routing.
    pub fn resolve_approval(
        &mut self,
        instance_id: &WorkflowInstanceId,
        approver: &str,
        approved: bool,
    ) -> WorkflowResult<()> {
        let workflow = {
            let instance = self.instance(instance_id)?;
            self.registry.get(&instance.workflow_id)?.clone()
        };
        let integrations = Arc::clone(&self.integrations);
        let instance = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| WorkflowError::InstanceNotFound(instance_id.clone()))?;

        match instance.suspension.clone() {
            Some(Suspension::Approval { step, approvers }) => {
                if !approvers.iter().any(|a| a == approver) {
                    return Err(WorkflowError::UnknownApprover {
                        approver: approver.to_string(),
                        step,
                    });
                }

                let mut output = StepOutput::new();
                output.insert("approved".into(), json!(approved));
                output.insert("approved_by".into(), json!(approver));
                output.insert("decided_at".into(), json!(Utc::now().to_rfc3339()));
                instance.merge_context(output);

                instance.complete_step(&step);
                instance.resume();
                tracing::info!(
                    instance_id = %instance_id,
                    step = %step,
                    approved,
                    "Approval decision recorded"
                );

                Self::enter_next(&workflow, instance, &step)?;
                Self::advance(integrations.as_ref(), &workflow, instance)
            }
            _ => {
                if instance.is_terminal() {
                    Err(WorkflowError::AlreadyCompleted)
                } else {
                    Err(WorkflowError::NotSuspended)
                }
            }
        }
    }

    // ── Advance loop ─────────────────────────────────────────────────

    /// Execute steps until the instance suspends or terminates
    fn advance(
        client: &dyn IntegrationClient,
        workflow: &Workflow,
        instance: &mut WorkflowInstance,
    ) -> WorkflowResult<()> {
        let mut hops = 0usize;

        while instance.is_active() {
            hops += 1;
            if hops > STEP_LIMIT {
                instance.fail(format!(
                    "execution exceeded {} step transitions",
                    STEP_LIMIT
                ));
                return Err(WorkflowError::ExecutionLimitExceeded(STEP_LIMIT));
            }

            let step_id = match instance.current_step.clone() {
                Some(id) => id,
                None => break,
            };
            let step = workflow
                .step(&step_id)
                .ok_or_else(|| WorkflowError::StepNotFound(step_id.clone()))?;

            match &step.kind {
                StepKind::Action {
                    action, input_form, ..
                } => {
                    if let Some(form) = input_form {
                        if !Self::form_covered(form, instance) {
                            tracing::info!(
                                instance_id = %instance.id,
                                step = %step_id,
                                "Awaiting citizen input"
                            );
                            instance.suspend(Suspension::CitizenInput {
                                step: step_id,
                                form: form.clone(),
                            });
                            return Ok(());
                        }
                    }
                    if let Some(action) = action {
                        let output = action.call(&*instance, &instance.context);
                        instance.merge_context(output);
                    }
                    instance.complete_step(&step_id);
                    Self::enter_next(workflow, instance, &step_id)?;
                }

                StepKind::Conditional => {
                    let mut target = None;
                    for transition in workflow.outgoing(&step_id) {
                        if transition.guard.satisfied(&*instance, &instance.context) {
                            target = Some(transition.target.clone());
                            break;
                        }
                    }
                    // validation guarantees a trailing fallback
                    let target = target.ok_or_else(|| {
                        WorkflowError::validation(vec![format!(
                            "conditional step '{}' matched no guard",
                            step_id
                        )])
                    })?;
                    instance.complete_step(&step_id);
                    instance.enter_step(target);
                }

                StepKind::Approval { approvers } => {
                    tracing::info!(
                        instance_id = %instance.id,
                        step = %step_id,
                        "Awaiting approval"
                    );
                    instance.suspend(Suspension::Approval {
                        step: step_id,
                        approvers: approvers.clone(),
                    });
                    return Ok(());
                }

                StepKind::Integration {
                    service,
                    endpoint,
                    method,
                } => {
                    let request = IntegrationRequest {
                        service: service.clone(),
                        endpoint: endpoint.clone(),
                        method: *method,
                        payload: json!({
                            "instance_id": instance.id.to_string(),
                            "data": instance.data,
                            "context": instance.context,
                        }),
                    };
                    match client.call(&request) {
                        Ok(Value::Object(result)) => instance.merge_context(result),
                        Ok(other) => {
                            let mut output = StepOutput::new();
                            output.insert(step_id.to_string(), other);
                            instance.merge_context(output);
                        }
                        Err(message) => {
                            instance.fail_step(&step_id, message.as_str());
                            instance.fail(format!(
                                "integration '{}{}' failed",
                                service, endpoint
                            ));
                            return Err(WorkflowError::IntegrationFailed {
                                service: service.clone(),
                                endpoint: endpoint.clone(),
                                message,
                            });
                        }
                    }
                    instance.complete_step(&step_id);
                    Self::enter_next(workflow, instance, &step_id)?;
                }

                StepKind::Terminal => {
                    instance.complete_step(&step_id);
                    instance.complete(step_id.clone());
                    tracing::info!(
                        instance_id = %instance.id,
                        terminal = %step_id,
                        "Workflow instance completed"
                    );
                }
            }
        }

        Ok(())
    }

    /// Follow the single unconditional transition out of a step
    fn enter_next(
        workflow: &Workflow,
        instance: &mut WorkflowInstance,
        from: &StepId,
    ) -> WorkflowResult<()> {
        let next = workflow
            .outgoing(from)
            .first()
            .map(|t| t.target.clone())
            .ok_or_else(|| {
                WorkflowError::validation(vec![format!(
                    "step '{}' has no outgoing transition",
                    from
                )])
            })?;
        instance.enter_step(next);
        Ok(())
    }

    /// A citizen-input step's form is covered when every required field
    /// is already present in the instance data
    fn form_covered(form: &InputForm, instance: &WorkflowInstance) -> bool {
        form.required_fields()
            .iter()
            .all(|field| instance.data.contains_key(*field))
    }
}
