use std::path::Path;

use anyhow::Context as _;
use serde_json::{Map, Value};

use crate::foundation::error::{VertexError, VertexResult};

/// Keys that older exports nest under `body` instead of the top level.
const LIFTED_KEYS: [&str; 3] = ["vertices", "shapes", "palettes"];

/// A puzzle document as read from disk, before it is turned into a [`crate::Puzzle`].
///
/// Documents come in a few historical layouts. [`Document::normalize`] rewrites any of them into
/// the canonical one (`vertices` mapping with shape back-references, `shapes`, `palette`,
/// `theme`) while leaving unrelated fields untouched, so the result can be written back.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    /// Parse a document from JSON text.
    pub fn from_json_str(s: &str) -> VertexResult<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(value)
    }

    /// Wrap an already-parsed JSON value.
    pub fn from_value(value: Value) -> VertexResult<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(VertexError::validation(format!(
                "puzzle document must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Read and parse a document from `path`.
    pub fn from_path(path: &Path) -> VertexResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read puzzle '{}'", path.display()))?;
        Self::from_json_str(&text).map_err(|e| in_file(e, path))
    }

    /// Rewrite the document into the canonical layout. Returns `true` when anything changed.
    pub fn normalize(&mut self) -> VertexResult<bool> {
        let mut changed = false;

        for key in LIFTED_KEYS {
            if self.root.contains_key(key) {
                continue;
            }
            let lifted = self
                .root
                .get_mut("body")
                .and_then(Value::as_object_mut)
                .and_then(|body| body.remove(key));
            if let Some(v) = lifted {
                self.root.insert(key.to_owned(), v);
                changed = true;
            }
        }

        if !self.root.contains_key("palette")
            && let Some(p) = self.root.remove("palettes")
        {
            self.root.insert("palette".to_owned(), p);
            changed = true;
        }

        let vertices = self
            .root
            .get_mut("vertices")
            .ok_or_else(|| VertexError::validation("puzzle document has no 'vertices'"))?;
        if let Value::Array(list) = vertices {
            let map = std::mem::take(list)
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect::<Map<_, _>>();
            *vertices = Value::Object(map);
            changed = true;
        }

        if self.needs_back_references()? {
            self.rebuild_back_references()?;
            changed = true;
        }

        Ok(changed)
    }

    /// Serialize the document as compact JSON.
    pub fn to_json_string(&self) -> VertexResult<String> {
        Ok(serde_json::to_string(&self.root)?)
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    fn vertex_map(&self) -> VertexResult<&Map<String, Value>> {
        self.root
            .get("vertices")
            .and_then(Value::as_object)
            .ok_or_else(|| VertexError::validation("'vertices' must be a mapping or a list"))
    }

    fn needs_back_references(&self) -> VertexResult<bool> {
        let vertices = self.vertex_map()?;
        let probe = vertices.get("0").or_else(|| vertices.values().next());
        Ok(match probe {
            Some(v) => v.get("shapes").is_none(),
            None => false,
        })
    }

    fn rebuild_back_references(&mut self) -> VertexResult<()> {
        let shapes = self
            .root
            .get("shapes")
            .and_then(Value::as_array)
            .ok_or_else(|| VertexError::validation("puzzle document has no 'shapes' list"))?;

        let mut refs = Vec::<(String, usize)>::new();
        for (i, shape) in shapes.iter().enumerate() {
            let ids = shape
                .get("vertices")
                .and_then(Value::as_array)
                .ok_or_else(|| VertexError::validation(format!("shapes[{i}] has no 'vertices'")))?;
            for id in ids {
                refs.push((id_key(id)?, i));
            }
        }

        let vertices = self
            .root
            .get_mut("vertices")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| VertexError::validation("'vertices' must be a mapping or a list"))?;
        for vertex in vertices.values_mut() {
            if let Value::Object(v) = vertex {
                v.insert("shapes".to_owned(), Value::Array(Vec::new()));
            }
        }
        for (key, shape_i) in refs {
            let list = vertices
                .get_mut(&key)
                .and_then(|v| v.get_mut("shapes"))
                .and_then(Value::as_array_mut)
                .ok_or_else(|| {
                    VertexError::validation(format!(
                        "shapes[{shape_i}] references missing vertex '{key}'"
                    ))
                })?;
            let entry = Value::from(shape_i);
            if !list.contains(&entry) {
                list.push(entry);
            }
        }
        Ok(())
    }
}

/// Prefix data errors with the file they came from.
pub(crate) fn in_file(e: VertexError, path: &Path) -> VertexError {
    match e {
        VertexError::Serde(msg) => VertexError::serde(format!("puzzle '{}': {msg}", path.display())),
        VertexError::Validation(msg) => {
            VertexError::validation(format!("puzzle '{}': {msg}", path.display()))
        }
        other => other,
    }
}

/// Vertex ids appear both as JSON numbers and strings; both map to the string key.
pub(crate) fn id_key(v: &Value) -> VertexResult<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        other => Err(VertexError::validation(format!(
            "vertex id must be an integer or string, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/puzzle/document.rs"]
mod tests;
