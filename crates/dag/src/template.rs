// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template reference resolution for step task strings.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex for `{{ steps.<name>.output.<key> }}` (whitespace-tolerant).
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static STEP_REF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*steps\.(\w+)\.output\.(\w+)\s*\}\}")
        .expect("constant regex pattern is valid")
});

/// Replace `{{ steps.<name>.output.<key> }}` references with upstream values.
///
/// Scalars substitute in lexical form (strings unquoted, numbers and
/// booleans via their display form); objects and arrays substitute as
/// canonical JSON text. References to an unknown step, an unknown key,
/// or a null value are left in place literally, which makes resolution
/// idempotent.
pub fn resolve_templates(text: &str, outputs: &HashMap<String, Value>) -> String {
    STEP_REF_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let step = &caps[1];
            let key = &caps[2];
            match outputs.get(step).and_then(|output| output.get(key)) {
                None | Some(Value::Null) => caps[0].to_string(),
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                Some(composite) => composite.to_string(),
            }
        })
        .to_string()
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
