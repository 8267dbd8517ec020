use serde_json::{Map, Value};

use super::callback::CallbackToken;
use crate::error::{BridgeError, BridgeResult};

/// Positional reader over the loosely typed argument list of one command.
pub struct ArgReader<'a> {
    command: &'static str,
    args: &'a [Value],
}

impl<'a> ArgReader<'a> {
    pub fn new(command: &'static str, args: &'a [Value]) -> Self {
        Self { command, args }
    }

    pub fn int(&self, index: usize) -> BridgeResult<i64> {
        let value = self.get(index)?;
        if let Some(int) = value.as_i64() {
            return Ok(int);
        }
        match value.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() <= i64::MAX as f64 => {
                Ok(float as i64)
            }
            _ => Err(self.mismatch(index, "integer", value)),
        }
    }

    pub fn double(&self, index: usize) -> BridgeResult<f64> {
        let value = self.get(index)?;
        value
            .as_f64()
            .ok_or_else(|| self.mismatch(index, "number", value))
    }

    pub fn boolean(&self, index: usize) -> BridgeResult<bool> {
        let value = self.get(index)?;
        value
            .as_bool()
            .ok_or_else(|| self.mismatch(index, "boolean", value))
    }

    pub fn string(&self, index: usize) -> BridgeResult<&'a str> {
        let value = self.get(index)?;
        value
            .as_str()
            .ok_or_else(|| self.mismatch(index, "string", value))
    }

    pub fn map(&self, index: usize) -> BridgeResult<&'a Map<String, Value>> {
        let value = self.get(index)?;
        value
            .as_object()
            .ok_or_else(|| self.mismatch(index, "map", value))
    }

    pub fn array(&self, index: usize) -> BridgeResult<&'a [Value]> {
        let value = self.get(index)?;
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.mismatch(index, "array", value))
    }

    pub fn token(&self, index: usize) -> BridgeResult<CallbackToken> {
        self.int(index).map(CallbackToken)
    }

    pub fn strings(&self, index: usize) -> BridgeResult<Vec<String>> {
        self.array(index)?
            .iter()
            .enumerate()
            .map(|(position, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    self.malformed(format!(
                        "argument {index}[{position}]: expected string, found {}",
                        describe(item)
                    ))
                })
            })
            .collect()
    }

    pub fn malformed(&self, reason: impl Into<String>) -> BridgeError {
        BridgeError::malformed(self.command, reason)
    }

    fn get(&self, index: usize) -> BridgeResult<&'a Value> {
        self.args
            .get(index)
            .ok_or_else(|| self.malformed(format!("missing argument {index}")))
    }

    fn mismatch(&self, index: usize, expected: &str, found: &Value) -> BridgeError {
        self.malformed(format!(
            "argument {index}: expected {expected}, found {}",
            describe(found)
        ))
    }
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
