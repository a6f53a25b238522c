//! Micro-action catalog entries: reusable units of browser interaction.

use super::{MicroActionId, ParseWorkflowValueError, WorkflowDomainError};
use crate::platform::Platform;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Kind of browser interaction a micro-action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Navigate to the `url` parameter.
    Navigate,
    /// Move the pointer to the target and click it.
    Click,
    /// Click the target and type the `text` parameter.
    Type,
    /// Scroll the page by the `delta` parameter.
    Scroll,
    /// Pause between `min_ms` and `max_ms`.
    Wait,
    /// Wait for the target to appear.
    WaitForSelector,
    /// Assert the current URL contains the `contains` parameter.
    AssertUrl,
}

impl ActionType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Click => "click",
            Self::Type => "type",
            Self::Scroll => "scroll",
            Self::Wait => "wait",
            Self::WaitForSelector => "wait_for_selector",
            Self::AssertUrl => "assert_url",
        }
    }

    /// Whether the action operates on a page element.
    #[must_use]
    pub const fn needs_target(self) -> bool {
        matches!(self, Self::Click | Self::Type | Self::WaitForSelector)
    }
}

impl TryFrom<&str> for ActionType {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "navigate" => Ok(Self::Navigate),
            "click" => Ok(Self::Click),
            "type" => Ok(Self::Type),
            "scroll" => Ok(Self::Scroll),
            "wait" => Ok(Self::Wait),
            "wait_for_selector" => Ok(Self::WaitForSelector),
            "assert_url" => Ok(Self::AssertUrl),
            _ => Err(ParseWorkflowValueError {
                field: "action type",
                value: value.to_owned(),
            }),
        }
    }
}

/// Declared parameter of a micro-action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,
    /// Whether a value must be supplied when no default exists.
    pub required: bool,
    /// Value used when the step does not supply one.
    pub default: Option<Value>,
}

impl ParamSpec {
    /// Declares a required parameter without a default.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: None,
        }
    }

    /// Declares an optional parameter with a default value.
    #[must_use]
    pub fn optional(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: Some(default),
        }
    }
}

/// Parameter object for creating a micro-action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMicroAction {
    /// Human-readable name, e.g. `click_compose_button`.
    pub name: String,
    /// Interaction kind.
    pub action_type: ActionType,
    /// Platform the action targets.
    pub platform: Platform,
    /// Selector of the element the action operates on.
    pub target: Option<String>,
    /// Parameter schema.
    pub params: Vec<ParamSpec>,
}

/// Micro-action catalog entry.
///
/// Micro-actions are immutable once created so that job history keeps
/// pointing at the shape that was executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroAction {
    id: MicroActionId,
    name: String,
    action_type: ActionType,
    platform: Platform,
    target: Option<String>,
    params: Vec<ParamSpec>,
    created_at: DateTime<Utc>,
}

impl MicroAction {
    /// Creates a validated micro-action.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptyActionName`] when the name is blank,
    /// [`WorkflowDomainError::MissingTarget`] when an element action has no
    /// selector, or [`WorkflowDomainError::DuplicateParameter`] when a
    /// parameter is declared twice.
    pub fn new(data: NewMicroAction, clock: &impl Clock) -> Result<Self, WorkflowDomainError> {
        let name = data.name.trim().to_owned();
        if name.is_empty() {
            return Err(WorkflowDomainError::EmptyActionName);
        }

        let target = data
            .target
            .map(|selector| selector.trim().to_owned())
            .filter(|selector| !selector.is_empty());
        if data.action_type.needs_target() && target.is_none() {
            return Err(WorkflowDomainError::MissingTarget(name));
        }

        let mut seen = HashSet::new();
        for spec in &data.params {
            if !seen.insert(spec.name.as_str()) {
                return Err(WorkflowDomainError::DuplicateParameter(spec.name.clone()));
            }
        }

        Ok(Self {
            id: MicroActionId::new(),
            name,
            action_type: data.action_type,
            platform: data.platform,
            target,
            params: data.params,
            created_at: clock.utc(),
        })
    }

    /// Returns the micro-action identifier.
    #[must_use]
    pub const fn id(&self) -> MicroActionId {
        self.id
    }

    /// Returns the micro-action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the interaction kind.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        self.action_type
    }

    /// Returns the targeted platform.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the target selector, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Returns the parameter schema.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
