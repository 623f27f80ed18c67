//! Workflow registry: stores and retrieves built workflows
//!
//! Workflows are immutable once registered. To modify one, register a
//! successor under the same name; the registry tracks every version.

use std::collections::HashMap;
use workflow_types::{Workflow, WorkflowError, WorkflowId, WorkflowResult};

/// Registry of validated workflows
#[derive(Clone, Debug, Default)]
pub struct WorkflowRegistry {
    /// All registered workflows, keyed by id
    workflows: HashMap<WorkflowId, Workflow>,
    /// Index by name -> list of workflow ids (for versioning)
    by_name: HashMap<String, Vec<WorkflowId>>,
}

impl WorkflowRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workflow.
    ///
    /// Re-validates before storing so a hand-assembled workflow cannot
    /// sneak past the structural checks. Returns the workflow id.
    pub fn register(&mut self, workflow: Workflow) -> WorkflowResult<WorkflowId> {
        workflow.validate()?;

        let id = workflow.id.clone();
        if self.workflows.contains_key(&id) {
            return Err(WorkflowError::DuplicateWorkflow(id));
        }
        let name = workflow.name.clone();

        self.workflows.insert(id.clone(), workflow);
        self.by_name.entry(name).or_default().push(id.clone());

        tracing::info!(workflow_id = %id, "Workflow registered");
        Ok(id)
    }

    /// Get a workflow by id
    pub fn get(&self, id: &WorkflowId) -> WorkflowResult<&Workflow> {
        self.workflows
            .get(id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(id.clone()))
    }

    /// Get the latest version of a workflow by name
    pub fn get_latest_by_name(&self, name: &str) -> Option<&Workflow> {
        self.by_name
            .get(name)
            .and_then(|ids| ids.last())
            .and_then(|id| self.workflows.get(id))
    }

    /// Get all versions of a workflow by name
    pub fn get_versions_by_name(&self, name: &str) -> Vec<&Workflow> {
        self.by_name
            .get(name)
            .map(|ids| ids.iter().filter_map(|id| self.workflows.get(id)).collect())
            .unwrap_or_default()
    }

    /// List all registered workflows
    pub fn list(&self) -> Vec<&Workflow> {
        self.workflows.values().collect()
    }

    /// Total number of registered workflows
    pub fn count(&self) -> usize {
        self.workflows.len()
    }

    /// Check if a workflow is registered
    pub fn contains(&self, id: &WorkflowId) -> bool {
        self.workflows.contains_key(id)
    }

    /// Remove a workflow
    pub fn remove(&mut self, id: &WorkflowId) -> WorkflowResult<Workflow> {
        let workflow = self
            .workflows
            .remove(id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(id.clone()))?;

        if let Some(ids) = self.by_name.get_mut(&workflow.name) {
            ids.retain(|i| i != id);
            if ids.is_empty() {
                self.by_name.remove(&workflow.name);
            }
        }

        tracing::info!(workflow_id = %id, "Workflow removed");
        Ok(workflow)
    }
}
