//! Device document data model.
//!
//! The wire shape is a top-level `params` mapping of oid to descriptor.
//! Each descriptor carries a type tag, an optional constraint, an optional
//! value whose variant must match the tag, and an optional import directive
//! that exists only until load-time resolution.

use crate::types::ParamType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root document: every parameter the model owns, keyed by oid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub params: BTreeMap<String, ParamDescriptor>,
}

/// One tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    #[serde(default)]
    pub oid: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportDirective>,
}

impl ParamDescriptor {
    /// Descriptor with a type tag and nothing else.
    pub fn new(oid: impl Into<String>, param_type: ParamType) -> Self {
        ParamDescriptor {
            oid: oid.into(),
            param_type,
            constraint: None,
            value: None,
            import: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

/// Discriminated parameter value.
///
/// Accessing a variant other than the stored one is a schema error at the
/// call site, never undefined behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Int32(i32),
    Float32(f32),
    String(String),
    Int32Array(Vec<i32>),
    Float32Array(Vec<f32>),
    StringArray(Vec<String>),
    Struct(StructValue),
    /// Reserved: decodes and encodes, navigation unbuilt.
    StructArray(Vec<StructValue>),
}

impl Value {
    /// Type tag this variant corresponds to.
    pub fn kind(&self) -> ParamType {
        match self {
            Value::Int32(_) => ParamType::Int32,
            Value::Float32(_) => ParamType::Float32,
            Value::String(_) => ParamType::String,
            Value::Int32Array(_) => ParamType::Int32Array,
            Value::Float32Array(_) => ParamType::Float32Array,
            Value::StringArray(_) => ParamType::StringArray,
            Value::Struct(_) => ParamType::Struct,
            Value::StructArray(_) => ParamType::StructArray,
        }
    }
}

/// Mapping from child oid to child descriptor; the payload of a STRUCT
/// value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructValue {
    #[serde(default)]
    pub fields: BTreeMap<String, ParamDescriptor>,
}

/// Validation/clamping rule applied before a write is committed.
///
/// A constraint variant must be compatible with its owning descriptor's
/// type; an incompatible pairing surfaces at set-time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    IntRange { min: i32, max: i32 },
    FloatRange { min: f32, max: f32 },
    IntChoice { choices: Vec<i32> },
    AlarmTable { alarms: Vec<Alarm> },
}

impl Constraint {
    /// Wire tag, for failure messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constraint::IntRange { .. } => "int_range",
            Constraint::FloatRange { .. } => "float_range",
            Constraint::IntChoice { .. } => "int_choice",
            Constraint::AlarmTable { .. } => "alarm_table",
        }
    }
}

/// One alarm table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub value: i32,
    pub description: String,
}

/// Placeholder instructing the loader to splice this parameter's content
/// from another document. Present only before resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportDirective {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ImportDirective {
    /// A directive with no url (or an empty one) resolves locally by the
    /// oid filename convention.
    pub fn is_local(&self) -> bool {
        self.url.as_deref().map_or(true, str::is_empty)
    }
}
