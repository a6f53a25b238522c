//! Fully-resolved execution plans.

use super::{AuthSignal, MicroAction, WorkflowDomainError, WorkflowId, WorkflowKind, WorkflowName};
use crate::platform::Platform;
use minijinja::{Environment, UndefinedBehavior};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A workflow step with its micro-action definition inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStep {
    /// Zero-based position in the workflow.
    pub index: usize,
    /// Inlined micro-action definition.
    pub action: MicroAction,
    /// Step parameters before rendering.
    pub params: Map<String, Value>,
    /// Meaning of this step failing, if any.
    pub auth_signal: Option<AuthSignal>,
}

impl ResolvedStep {
    /// Renders the step parameters against job-level values.
    ///
    /// Declared parameters missing from the step fall back to their default.
    /// String values are rendered as templates, so a step parameter of
    /// `"{{ text }}"` receives the job's `text` value. Undeclared step
    /// parameters pass through rendering as well.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::MissingParameter`] when a required
    /// parameter has no value, or [`WorkflowDomainError::Template`] when a
    /// template references an unknown value or fails to parse.
    pub fn render_params(
        &self,
        context: &Map<String, Value>,
    ) -> Result<Map<String, Value>, WorkflowDomainError> {
        let mut environment = Environment::new();
        environment.set_undefined_behavior(UndefinedBehavior::Strict);

        let mut rendered = Map::new();
        for spec in self.action.params() {
            let value = self
                .params
                .get(&spec.name)
                .or(spec.default.as_ref())
                .cloned();
            match value {
                Some(raw) => {
                    let value = self.render_value(&environment, &spec.name, raw, context)?;
                    rendered.insert(spec.name.clone(), value);
                }
                None if spec.required => {
                    return Err(WorkflowDomainError::MissingParameter {
                        step: self.index,
                        name: spec.name.clone(),
                    });
                }
                None => {}
            }
        }

        for (name, raw) in &self.params {
            if rendered.contains_key(name) {
                continue;
            }
            let value = self.render_value(&environment, name, raw.clone(), context)?;
            rendered.insert(name.clone(), value);
        }
        Ok(rendered)
    }

    fn render_value(
        &self,
        environment: &Environment<'_>,
        name: &str,
        raw: Value,
        context: &Map<String, Value>,
    ) -> Result<Value, WorkflowDomainError> {
        let Value::String(template) = raw else {
            return Ok(raw);
        };
        environment
            .render_str(&template, context)
            .map(Value::String)
            .map_err(|err| WorkflowDomainError::Template {
                step: self.index,
                name: name.to_owned(),
                message: err.to_string(),
            })
    }
}

/// Ordered, fully-resolved plan for one workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Source workflow.
    pub workflow_id: WorkflowId,
    /// Canonical workflow name.
    pub name: WorkflowName,
    /// Platform the plan runs on.
    pub platform: Platform,
    /// Auth or action.
    pub kind: WorkflowKind,
    /// Whether the account must be logged in first.
    pub requires_auth: bool,
    /// Workflow used to log in first, if any.
    pub auth_workflow_id: Option<WorkflowId>,
    /// Whether the source workflow is active.
    pub is_active: bool,
    /// Steps in execution order.
    pub steps: Vec<ResolvedStep>,
}
