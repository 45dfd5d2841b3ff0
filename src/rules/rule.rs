//! Rule specifications and per-evaluation rule state

use crate::core::types::Severity;
use crate::entity::Entity;
use crate::rules::check::Check;
use crate::rules::context::RuleContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Declarative description of one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    pub severity: Severity,
    pub short_message: String,
    pub message: String,
    pub check: Check,
}

impl RuleSpec {
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        short_message: impl Into<String>,
        message: impl Into<String>,
        check: Check,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            short_message: short_message.into(),
            message: message.into(),
            check,
        }
    }
}

/// What a check decided for one entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub triggered: bool,
    /// Replaces the spec's short message for this evaluation
    pub short_message: Option<String>,
    /// Replaces the spec's message for this evaluation, e.g. with the exact
    /// overrun
    pub message: Option<String>,
}

impl Outcome {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn trigger() -> Self {
        Self {
            triggered: true,
            ..Self::default()
        }
    }

    pub fn when(triggered: bool) -> Self {
        Self {
            triggered,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_short_message(mut self, short_message: impl Into<String>) -> Self {
        self.short_message = Some(short_message.into());
        self
    }
}

/// A triggered rule as reported to collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    pub short_message: String,
    pub message: String,
}

/// A rule instance carrying the result of its last evaluation
#[derive(Debug, Clone)]
pub struct Rule {
    spec: Arc<RuleSpec>,
    triggered: bool,
    short_message: Option<String>,
    message: Option<String>,
}

impl Rule {
    pub fn new(spec: Arc<RuleSpec>) -> Self {
        Self {
            spec,
            triggered: false,
            short_message: None,
            message: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn spec(&self) -> &RuleSpec {
        &self.spec
    }

    pub fn triggered(&self) -> bool {
        self.triggered
    }

    /// Configured severity while triggered, `None` otherwise
    pub fn severity(&self) -> Severity {
        if self.triggered {
            self.spec.severity
        } else {
            Severity::None
        }
    }

    pub fn short_message(&self) -> &str {
        self.short_message.as_deref().unwrap_or(&self.spec.short_message)
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.spec.message)
    }

    /// Evaluate the rule for `entity` and remember the result.
    ///
    /// Failures are logged and count as not triggered; they never escape
    /// into the surrounding pass.
    pub fn check_rule(&mut self, entity: &Entity, ctx: &mut RuleContext<'_>) -> bool {
        self.short_message = None;
        self.message = None;

        if entity.properties.suppress_warnings && self.spec.severity < Severity::High {
            self.triggered = false;
            return false;
        }

        match self.spec.check.evaluate(entity, ctx) {
            Ok(outcome) => {
                self.triggered = outcome.triggered;
                self.short_message = outcome.short_message;
                self.message = outcome.message;
            }
            Err(err) => {
                tracing::warn!(
                    rule = %self.spec.id,
                    entity = %entity.id,
                    "Rule evaluation failed, treating as not triggered: {}",
                    err
                );
                self.triggered = false;
            }
        }

        self.triggered
    }

    pub fn violation(&self) -> Option<Violation> {
        self.triggered.then(|| Violation {
            rule_id: self.spec.id.clone(),
            severity: self.spec.severity,
            short_message: self.short_message().to_string(),
            message: self.message().to_string(),
        })
    }
}
