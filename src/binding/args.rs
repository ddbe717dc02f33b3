//! Argument validation for bound functions
//!
//! Scripts are dynamically typed, so every bound function takes `Dynamic`
//! parameters and checks them here before any engine call.

use rhai::{Blob, Dynamic, FLOAT, INT};

use super::error::UsageError;

/// Require a string argument
pub fn string(function: &'static str, position: usize, value: Dynamic) -> Result<String, UsageError> {
    let actual = value.type_name();
    value.into_string().map_err(|_| UsageError::ArgumentType {
        function,
        position,
        expected: "a string",
        actual,
    })
}

/// Require a boolean argument
pub fn boolean(function: &'static str, position: usize, value: &Dynamic) -> Result<bool, UsageError> {
    value.as_bool().map_err(|_| UsageError::ArgumentType {
        function,
        position,
        expected: "a boolean",
        actual: value.type_name(),
    })
}

/// Require a number; floats are truncated toward zero
pub fn integer(function: &'static str, position: usize, value: &Dynamic) -> Result<INT, UsageError> {
    if let Ok(n) = value.as_int() {
        return Ok(n);
    }
    if let Ok(f) = value.as_float() {
        return truncate(function, f);
    }
    Err(UsageError::ArgumentType {
        function,
        position,
        expected: "a number",
        actual: value.type_name(),
    })
}

fn truncate(function: &'static str, value: FLOAT) -> Result<INT, UsageError> {
    if !value.is_finite() {
        return Err(UsageError::ArgumentRange {
            function,
            message: format!("expects a finite number, got {value}"),
        });
    }
    Ok(value.trunc() as INT)
}

/// Require a top-N count of at least one
pub fn top_n(function: &'static str, position: usize, value: &Dynamic) -> Result<u32, UsageError> {
    let n = integer(function, position, value)?;
    u32::try_from(n)
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| UsageError::ArgumentRange {
            function,
            message: format!("expects a count between 1 and {}, got {n}", u32::MAX),
        })
}

/// Require a binary buffer
pub fn blob(function: &'static str, position: usize, value: Dynamic) -> Result<Blob, UsageError> {
    let actual = value.type_name();
    value.try_cast::<Blob>().ok_or(UsageError::ArgumentType {
        function,
        position,
        expected: "a blob",
        actual,
    })
}
