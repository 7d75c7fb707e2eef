//! Device — a named, typed entity with a bounded set of mutable attributes.
//!
//! Every device kind carries a static attribute schema (name, type, valid
//! range, default). The schema is consulted on every write: integer values
//! are clamped into their declared range, while writes of the wrong type
//! are rejected outright.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AttributeErrorKind, HearthError};

/// A single typed attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
}

impl AttributeValue {
    /// Human-readable name of the value's type.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => b.fmt(f),
            Self::Int(n) => n.fmt(f),
        }
    }
}

/// Declared type and range of a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Boolean attribute. Non-boolean input is rejected.
    Bool,
    /// Integer attribute with an inclusive range. Out-of-range input is
    /// clamped; non-integer input is rejected.
    Int { min: i64, max: i64 },
}

impl AttributeKind {
    /// Validate a proposed value against this kind, clamping integers.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeErrorKind::TypeMismatch`] when the value's type
    /// does not match the declared kind.
    pub fn accept(self, value: AttributeValue) -> Result<AttributeValue, AttributeErrorKind> {
        match (self, value) {
            (Self::Bool, AttributeValue::Bool(_)) => Ok(value),
            (Self::Int { min, max }, AttributeValue::Int(n)) => {
                Ok(AttributeValue::Int(n.clamp(min, max)))
            }
            _ => Err(AttributeErrorKind::TypeMismatch),
        }
    }
}

/// Schema entry for one attribute of a device kind.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub default: AttributeValue,
}

const LIGHT_SPECS: &[AttributeSpec] = &[
    AttributeSpec {
        name: "power",
        kind: AttributeKind::Bool,
        default: AttributeValue::Bool(false),
    },
    AttributeSpec {
        name: "brightness",
        kind: AttributeKind::Int { min: 0, max: 100 },
        default: AttributeValue::Int(50),
    },
];

const THERMOSTAT_SPECS: &[AttributeSpec] = &[
    AttributeSpec {
        name: "power",
        kind: AttributeKind::Bool,
        default: AttributeValue::Bool(false),
    },
    AttributeSpec {
        name: "temperature",
        kind: AttributeKind::Int { min: 60, max: 80 },
        default: AttributeValue::Int(70),
    },
];

const SECURITY_CAMERA_SPECS: &[AttributeSpec] = &[AttributeSpec {
    name: "armed",
    kind: AttributeKind::Bool,
    default: AttributeValue::Bool(false),
}];

/// Closed set of supported device kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Light,
    Thermostat,
    SecurityCamera,
}

impl DeviceKind {
    /// The attribute schema for this kind.
    #[must_use]
    pub fn attribute_specs(self) -> &'static [AttributeSpec] {
        match self {
            Self::Light => LIGHT_SPECS,
            Self::Thermostat => THERMOSTAT_SPECS,
            Self::SecurityCamera => SECURITY_CAMERA_SPECS,
        }
    }

    /// Look up a single attribute's schema entry.
    #[must_use]
    pub fn spec(self, attribute: &str) -> Option<&'static AttributeSpec> {
        self.attribute_specs().iter().find(|s| s.name == attribute)
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Thermostat => f.write_str("thermostat"),
            Self::SecurityCamera => f.write_str("security_camera"),
        }
    }
}

/// A device: stable unique name, a kind, and its current attribute values.
///
/// Devices are owned exclusively by the registry; values obtained from it
/// are snapshots. Mutating a snapshot has no effect on authoritative state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub kind: DeviceKind,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Device {
    /// Create a device with its kind's default attribute values.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: DeviceKind) -> Self {
        let attributes = kind
            .attribute_specs()
            .iter()
            .map(|s| (s.name.to_string(), s.default))
            .collect();
        Self {
            name: name.into(),
            kind,
            attributes,
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::EmptyField`] when the name is empty.
    pub fn validate(&self) -> Result<(), HearthError> {
        if self.name.is_empty() {
            return Err(HearthError::EmptyField {
                field: "device name",
            });
        }
        Ok(())
    }

    /// Current value of an attribute, if the schema declares it.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        self.attributes.get(name).copied()
    }

    /// Apply a validated write, returning the previous value.
    ///
    /// Integer values are clamped into the attribute's declared range
    /// before being stored.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeErrorKind::Unknown`] for an undeclared attribute
    /// and [`AttributeErrorKind::TypeMismatch`] for a value of the wrong
    /// type. The device is left untouched on error.
    pub fn write(
        &mut self,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<AttributeValue, AttributeErrorKind> {
        let spec = self
            .kind
            .spec(attribute)
            .ok_or(AttributeErrorKind::Unknown)?;
        let accepted = spec.kind.accept(value)?;
        let old = self
            .attributes
            .insert(spec.name.to_string(), accepted)
            .unwrap_or(spec.default);
        Ok(old)
    }
}
