//! Workflow graph builder and executor for Coastline plugins
//!
//! Plugins declare workflows as data: typed steps wired together with
//! explicit `connect` calls, validated once, then handed over as
//! immutable [`Workflow`](workflow_types::Workflow) values. This crate
//! provides the machinery around that contract:
//!
//! - [`WorkflowBuilder`] — step registration, start designation, edge
//!   declaration, and aggregated build-time validation
//! - [`WorkflowRegistry`] — versioned storage of built workflows
//! - [`WorkflowEngine`] — a synchronous single-stepping executor that
//!   suspends at citizen-input and approval steps and reaches external
//!   services only through the [`IntegrationClient`] seam
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use workflow_engine::{StaticIntegrationClient, WorkflowBuilder, WorkflowEngine};
//! use workflow_types::{ActionFn, Step, StepOutput};
//!
//! let mut builder = WorkflowBuilder::new("hello_v1", "Hello", "Smallest useful workflow");
//! builder.add_step(Step::action(
//!     "greet",
//!     "Greet",
//!     ActionFn::new(|_, _| {
//!         let mut out = StepOutput::new();
//!         out.insert("greeting".into(), serde_json::json!("hello"));
//!         out
//!     }),
//! )).unwrap();
//! builder.add_step(Step::terminal("done", "Done")).unwrap();
//! builder.connect("greet", "done");
//! builder.set_start("greet").unwrap();
//! let workflow = builder.build().unwrap();
//!
//! let mut engine = WorkflowEngine::new(Arc::new(StaticIntegrationClient::new()));
//! let id = engine.register(workflow).unwrap();
//! let instance_id = engine.start_instance(&id).unwrap();
//! assert!(engine.instance(&instance_id).unwrap().is_terminal());
//! ```

#![deny(unsafe_code)]

pub mod builder;
pub mod executor;
pub mod registry;

pub use builder::WorkflowBuilder;
pub use executor::{
    IntegrationClient, IntegrationRequest, StaticIntegrationClient, WorkflowEngine,
};
pub use registry::WorkflowRegistry;
