//! Constraint application.
//!
//! A write runs its candidate through the parameter's declared constraint
//! before anything is committed, so a rejected candidate leaves the
//! document untouched. `int_choice` and `alarm_table` deliberately accept
//! int candidates unchanged: membership validation is left to the client.

use crate::device::Constraint;
use crate::error::Error;

/// Clamp or pass an int candidate.
pub fn apply_int(constraint: Option<&Constraint>, candidate: i32) -> Result<i32, Error> {
    match constraint {
        None => Ok(candidate),
        Some(Constraint::IntRange { min, max }) => Ok(candidate.clamp(*min, *max)),
        // trust the client
        Some(Constraint::IntChoice { .. }) => Ok(candidate),
        Some(Constraint::AlarmTable { .. }) => Ok(candidate),
        Some(c @ Constraint::FloatRange { .. }) => Err(incompatible(c, "INT32")),
    }
}

/// Clamp or pass a float candidate.
pub fn apply_float(constraint: Option<&Constraint>, candidate: f32) -> Result<f32, Error> {
    match constraint {
        None => Ok(candidate),
        Some(Constraint::FloatRange { min, max }) => Ok(candidate.clamp(*min, *max)),
        Some(
            c @ (Constraint::IntRange { .. }
            | Constraint::IntChoice { .. }
            | Constraint::AlarmTable { .. }),
        ) => Err(incompatible(c, "FLOAT32")),
    }
}

/// Pass a string candidate; no constraint kind applies to strings.
pub fn apply_string(constraint: Option<&Constraint>, candidate: String) -> Result<String, Error> {
    match constraint {
        None => Ok(candidate),
        Some(c) => Err(incompatible(c, "STRING")),
    }
}

fn incompatible(constraint: &Constraint, type_name: &str) -> Error {
    Error::Range(format!(
        "constraint {} is invalid for {}",
        constraint.kind_name(),
        type_name
    ))
}
