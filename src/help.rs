//! Sidecar help file loading.
//!
//! A script may ship a `<script>.help` file: a JSON object mapping parameter
//! names (plus the reserved key `ALG_DESC`) to description strings. The file
//! is optional — a missing or malformed file yields empty descriptions, never
//! an error.

use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::ScriptDeclaration;

/// Reserved key holding the whole-script description.
pub const ALG_DESC: &str = "ALG_DESC";

/// The sidecar path for a script: the script path with `.help` appended.
#[must_use]
pub fn help_file(script: &Path) -> PathBuf {
    let mut name = script.as_os_str().to_owned();
    name.push(".help");
    PathBuf::from(name)
}

fn load(script: &Path) -> Option<serde_json::Map<String, Value>> {
    let text = fs::read_to_string(help_file(script)).ok()?;
    match serde_json::from_str(&text).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// The whole-script description from the sidecar file, if present.
#[must_use]
pub fn short_description(script: &Path) -> Option<String> {
    load(script)?
        .get(ALG_DESC)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Descriptions for the declared parameters that the sidecar file covers.
#[must_use]
pub fn parameter_descriptions(script: &Path, decl: &ScriptDeclaration) -> HashMap<String, String> {
    let mut descriptions = HashMap::new();
    if let Some(map) = load(script) {
        for parameter in &decl.parameters {
            if let Some(text) = map.get(&parameter.name).and_then(Value::as_str) {
                descriptions.insert(parameter.name.clone(), text.to_string());
            }
        }
    }
    descriptions
}
