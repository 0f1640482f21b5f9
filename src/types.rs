//! Shared type tags for the device model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a parameter descriptor.
///
/// `StructArray` is recognized by the wire format but sub-param navigation
/// for it is not built yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParamType {
    Int32,
    Float32,
    String,
    Int32Array,
    Float32Array,
    StringArray,
    Struct,
    StructArray,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Int32 => "INT32",
            ParamType::Float32 => "FLOAT32",
            ParamType::String => "STRING",
            ParamType::Int32Array => "INT32_ARRAY",
            ParamType::Float32Array => "FLOAT32_ARRAY",
            ParamType::StringArray => "STRING_ARRAY",
            ParamType::Struct => "STRUCT",
            ParamType::StructArray => "STRUCT_ARRAY",
        };
        f.write_str(name)
    }
}
