//! Concrete browser commands derived from resolved steps.

use super::AgentError;
use crate::workflow::domain::{ActionType, AuthSignal, ResolvedStep};
use serde_json::{Map, Value};

/// Scroll distance used when a scroll step gives none.
const DEFAULT_SCROLL_PX: i64 = 600;

/// One browser command with every parameter resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCommand {
    /// Open a URL.
    Navigate {
        /// Destination.
        url: String,
    },
    /// Click an element.
    Click {
        /// Element selector.
        target: String,
    },
    /// Focus an element and type into it.
    Type {
        /// Element selector.
        target: String,
        /// Text to type.
        text: String,
    },
    /// Scroll vertically.
    Scroll {
        /// Distance in pixels; negative scrolls up.
        delta: i64,
    },
    /// Pause for a human-like interval.
    Wait {
        /// Lower bound in milliseconds.
        min_ms: u64,
        /// Upper bound in milliseconds.
        max_ms: u64,
    },
    /// Wait for an element to appear.
    WaitForSelector {
        /// Element selector.
        target: String,
    },
    /// Check the current URL.
    AssertUrl {
        /// Fragment the URL must contain.
        contains: String,
    },
}

/// A step ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStep {
    /// Zero-based position in its workflow.
    pub index: usize,
    /// Micro-action name, safe to report.
    pub action: String,
    /// Meaning of this step failing, if any.
    pub auth_signal: Option<AuthSignal>,
    /// Command to run.
    pub command: StepCommand,
}

impl PreparedStep {
    /// Renders a resolved step against job values and extracts its command.
    ///
    /// `default_wait` bounds a wait step that declares none.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Render`] when rendering fails, or
    /// [`AgentError::StepParam`] when the action lacks a value it needs.
    pub fn prepare(
        step: &ResolvedStep,
        context: &Map<String, Value>,
        default_wait: (u64, u64),
    ) -> Result<Self, AgentError> {
        let params = step.render_params(context)?;
        let action = step.action.name().to_owned();
        let missing = |name: &'static str| AgentError::StepParam {
            index: step.index,
            action: action.clone(),
            name,
        };
        let target = || {
            step.action
                .target()
                .map(str::to_owned)
                .ok_or_else(|| missing("target"))
        };
        let text = |name: &'static str| {
            params
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| missing(name))
        };
        let number = |name: &'static str| match params.get(name) {
            None => Ok(None),
            Some(value) => parse_u64(value).map(Some).ok_or_else(|| missing(name)),
        };

        let command = match step.action.action_type() {
            ActionType::Navigate => StepCommand::Navigate { url: text("url")? },
            ActionType::Click => StepCommand::Click { target: target()? },
            ActionType::Type => StepCommand::Type {
                target: target()?,
                text: text("text")?,
            },
            ActionType::Scroll => StepCommand::Scroll {
                delta: match params.get("delta") {
                    None => DEFAULT_SCROLL_PX,
                    Some(value) => parse_i64(value).ok_or_else(|| missing("delta"))?,
                },
            },
            ActionType::Wait => StepCommand::Wait {
                min_ms: number("min_ms")?.unwrap_or(default_wait.0),
                max_ms: number("max_ms")?.unwrap_or(default_wait.1),
            },
            ActionType::WaitForSelector => StepCommand::WaitForSelector { target: target()? },
            ActionType::AssertUrl => StepCommand::AssertUrl {
                contains: text("contains")?,
            },
        };
        Ok(Self {
            index: step.index,
            action,
            auth_signal: step.auth_signal,
            command,
        })
    }
}

fn parse_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
}

fn parse_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
}
