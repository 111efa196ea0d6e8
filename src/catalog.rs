//! Nested JSON message catalogs
//!
//! A catalog is any JSON document: objects and arrays nest, string leaves
//! are the translatable messages, and every other leaf (numbers, booleans,
//! null) is carried through untouched, numbers digit for digit. Key order
//! follows the source file.
//!
//! ```json
//! {
//!     "common": { "save": "Mentés", "cancel": "Mégse" },
//!     "steps": ["Első {n}", "Második"],
//!     "maxItems": 10
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// A message catalog for one locale
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog(pub Value);

impl Catalog {
    /// Parse a catalog from JSON text
    pub fn from_json_str(content: &str) -> MtResult<Self> {
        Ok(Catalog(serde_json::from_str(content)?))
    }

    /// Load a catalog from a JSON file
    ///
    /// # Errors
    /// - [`MtError::MissingSourceFile`] if `path` does not exist
    /// - [`MtError::Io`] if it cannot be read
    /// - [`MtError::InvalidCatalog`] if it is not valid JSON
    pub fn load(path: &Path) -> MtResult<Self> {
        if !path.exists() {
            return Err(MtError::MissingSourceFile(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| MtError::Io(format!("Failed to read '{}': {}", path.display(), e)))?;

        serde_json::from_str(&content).map(Catalog).map_err(|e| {
            MtError::InvalidCatalog(format!(
                "Failed to parse JSON from '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Every distinct string leaf, sorted
    pub fn collect_strings(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        collect_strings(&self.0, &mut out);
        out
    }

    /// Dotted paths to every non-object value under the root object
    ///
    /// Arrays count as a single leaf. A non-object root has no key paths.
    pub fn key_paths(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        if let Value::Object(map) = &self.0 {
            collect_key_paths(map, "", &mut out);
        }
        out
    }

    /// A catalog of the same shape with string leaves looked up in `mapping`
    pub fn apply_translation(&self, mapping: &HashMap<String, String>) -> Catalog {
        Catalog(apply_translation(&self.0, mapping))
    }

    /// Pretty JSON: 4-space indent, literal UTF-8, trailing newline
    pub fn to_pretty_string(&self) -> MtResult<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.0
            .serialize(&mut serializer)
            .map_err(|e| MtError::Io(format!("Failed to serialize catalog: {}", e)))?;

        let mut out = String::from_utf8(buf)
            .map_err(|e| MtError::Io(format!("Serialized catalog is not UTF-8: {}", e)))?;
        out.push('\n');
        Ok(out)
    }

    /// Write the catalog to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> MtResult<()> {
        let content = self.to_pretty_string()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                MtError::Io(format!("Failed to create '{}': {}", parent.display(), e))
            })?;
        }
        fs::write(path, content)
            .map_err(|e| MtError::Io(format!("Failed to write '{}': {}", path.display(), e)))
    }
}

/// Add every string leaf under `node` to `out`
pub fn collect_strings(node: &Value, out: &mut BTreeSet<String>) {
    match node {
        Value::Object(map) => {
            for value in map.values() {
                collect_strings(value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        Value::String(s) => {
            out.insert(s.clone());
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn collect_key_paths(map: &Map<String, Value>, prefix: &str, out: &mut BTreeSet<String>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) => collect_key_paths(inner, &path, out),
            _ => {
                out.insert(path);
            }
        }
    }
}

/// Rebuild `node` with each string leaf replaced by its mapping entry
///
/// Strings missing from `mapping` are kept as they are.
pub fn apply_translation(node: &Value, mapping: &HashMap<String, String>) -> Value {
    match node {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), apply_translation(value, mapping)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| apply_translation(item, mapping))
                .collect(),
        ),
        Value::String(s) => Value::String(mapping.get(s).unwrap_or(s).clone()),
        other => other.clone(),
    }
}
