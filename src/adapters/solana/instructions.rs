//! Parsed instruction decoding
//!
//! Both the Helius enhanced API and `getTransaction` with `jsonParsed`
//! encoding describe instructions as JSON objects carrying a `programId` and,
//! when the program is known, a `parsed` object with `type` and `info`.
//! This module flattens those objects (and their inner instructions) into
//! port `Operation`s.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::ports::{FetchError, Operation};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInstruction {
    program_id: String,
    #[serde(default)]
    program: Option<String>,
    #[serde(default)]
    parsed: Option<Value>,
    /// Helius nests inner instructions under each outer instruction
    #[serde(default)]
    inner_instructions: Vec<Value>,
}

impl RawInstruction {
    fn push_into(self, out: &mut Vec<Operation>) {
        // `parsed` is an object for most programs but a bare string for memo
        let (kind, info) = match self.parsed {
            Some(Value::Object(mut map)) => {
                let kind = map.get("type").and_then(Value::as_str).map(str::to_string);
                let info = map.remove("info").unwrap_or(Value::Null);
                (kind, info)
            }
            _ => (None, Value::Null),
        };
        out.push(Operation {
            program_id: self.program_id,
            program: self.program,
            kind,
            info,
        });
        push_instructions(&self.inner_instructions, out);
    }
}

/// Decode a list of instruction objects, skipping ones without a program id
pub fn push_instructions(values: &[Value], out: &mut Vec<Operation>) {
    for value in values {
        match RawInstruction::deserialize(value) {
            Ok(raw) => raw.push_into(out),
            Err(e) => debug!(error = %e, "Skipping undecodable instruction"),
        }
    }
}

/// Operations of a `getTransaction` (jsonParsed) result, outer then inner
///
/// A failed transaction yields no operations: nothing it attempted exists on chain.
pub fn operations_from_rpc_transaction(tx: &Value) -> Result<Vec<Operation>, FetchError> {
    let meta = tx.get("meta");
    if let Some(err) = meta.and_then(|m| m.get("err")) {
        if !err.is_null() {
            return Ok(Vec::new());
        }
    }

    let outer = tx
        .pointer("/transaction/message/instructions")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            FetchError::MalformedResponse("transaction without parsed message instructions".to_string())
        })?;

    let mut out = Vec::new();
    push_instructions(outer, &mut out);

    if let Some(groups) = meta.and_then(|m| m.get("innerInstructions")).and_then(Value::as_array) {
        for group in groups {
            if let Some(inner) = group.get("instructions").and_then(Value::as_array) {
                push_instructions(inner, &mut out);
            }
        }
    }

    Ok(out)
}
