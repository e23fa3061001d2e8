use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::io::{IsTerminal, Read};

/// JSON type name used in shape diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Use the positional payload when given, otherwise read redirected stdin.
pub fn read_payload(arg: Option<String>) -> Result<String> {
    if let Some(payload) = arg {
        return Ok(payload);
    }
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(anyhow!(
            "no payload given; pass it as an argument or redirect stdin"
        ));
    }
    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .context("read payload from stdin")?;
    Ok(buffer)
}
