//! Rule — a condition → action pair evaluated against live device state.
//!
//! A condition is a single attribute comparison against a literal; an
//! action is a single attribute assignment. Rules never mutate devices
//! themselves — a satisfied rule only emits its action as a command for
//! the execution coordinator.

use serde::{Deserialize, Serialize};

use crate::device::AttributeValue;
use crate::error::HearthError;
use crate::id::RuleId;
use crate::time::Timestamp;

/// Comparison operator between a live attribute value and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl Comparison {
    /// Apply the operator.
    ///
    /// Booleans support only `=` and `!=`; every other pairing — including
    /// comparisons between mismatched types — evaluates to `false` rather
    /// than erroring.
    #[must_use]
    pub fn compare(self, actual: AttributeValue, expected: AttributeValue) -> bool {
        match (actual, expected) {
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => match self {
                Self::Eq => a == b,
                Self::Ne => a != b,
                _ => false,
            },
            (AttributeValue::Int(a), AttributeValue::Int(b)) => match self {
                Self::Eq => a == b,
                Self::Ne => a != b,
                Self::Lt => a < b,
                Self::Le => a <= b,
                Self::Gt => a > b,
                Self::Ge => a >= b,
            },
            _ => false,
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        };
        f.write_str(symbol)
    }
}

/// A predicate over one device attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub device: String,
    pub attribute: String,
    pub op: Comparison,
    pub value: AttributeValue,
}

impl Condition {
    /// Whether the condition holds for the given live value.
    #[must_use]
    pub fn holds(&self, actual: AttributeValue) -> bool {
        self.op.compare(actual, self.value)
    }

    fn validate(&self) -> Result<(), HearthError> {
        if self.device.is_empty() {
            return Err(HearthError::EmptyField {
                field: "condition device",
            });
        }
        if self.attribute.is_empty() {
            return Err(HearthError::EmptyField {
                field: "condition attribute",
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} {} {}",
            self.device, self.attribute, self.op, self.value
        )
    }
}

/// One attribute assignment: "set `device.attribute = value`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub device: String,
    pub attribute: String,
    pub value: AttributeValue,
}

impl Action {
    fn validate(&self) -> Result<(), HearthError> {
        if self.device.is_empty() {
            return Err(HearthError::EmptyField {
                field: "action device",
            });
        }
        if self.attribute.is_empty() {
            return Err(HearthError::EmptyField {
                field: "action attribute",
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} = {}", self.device, self.attribute, self.value)
    }
}

/// A condition → action rule.
///
/// Immutable once created, except for the enabled flag and atomic
/// redefinition through the rule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub condition: Condition,
    pub action: Action,
    pub enabled: bool,
    pub created_at: Timestamp,
}

impl Rule {
    /// Create an enabled rule.
    #[must_use]
    pub fn new(condition: Condition, action: Action) -> Self {
        Self {
            id: RuleId::new(),
            condition,
            action,
            enabled: true,
            created_at: crate::time::now(),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::EmptyField`] when any device or attribute
    /// name in the condition or action is empty.
    pub fn validate(&self) -> Result<(), HearthError> {
        self.condition.validate()?;
        self.action.validate()
    }
}
