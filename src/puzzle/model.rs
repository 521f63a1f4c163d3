use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::foundation::core::{Point, Rect, Rgb8};
use crate::foundation::error::{VertexError, VertexResult};
use crate::puzzle::color::parse_palette;
use crate::puzzle::document::{Document, in_file};

/// A 2D point shared by zero or more shapes.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    /// Stable key from the source document.
    pub id: String,
    pub pos: Point,
    /// Indices into [`Puzzle::shapes`] of every shape touching this vertex, in document order.
    pub shapes: Vec<usize>,
    /// Number of non-finalized shapes currently touching this vertex.
    pub hits: u32,
}

/// A closed polygon over vertex indices with a palette color.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub id: usize,
    /// Indices into [`Puzzle::vertices`], in boundary order.
    pub vertices: Vec<usize>,
    /// Index into [`Puzzle::palette`].
    pub color: usize,
    pub sides_revealed: u32,
    pub finalized: bool,
}

impl Shape {
    /// Number of boundary segments (equal to the vertex count).
    pub fn side_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

/// Normalized, validated puzzle state.
///
/// The scheduler mutates one of these in place; frames carry owned clones of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Puzzle {
    vertices: Vec<Vertex>,
    shapes: Vec<Shape>,
    palette: Vec<Rgb8>,
    theme: String,
    remaining: usize,
}

#[derive(Deserialize)]
struct RawPuzzle {
    vertices: BTreeMap<String, RawVertex>,
    shapes: Vec<RawShape>,
    palette: Vec<String>,
    #[serde(default)]
    theme: String,
}

#[derive(Deserialize)]
struct RawVertex {
    coordinates: [f64; 2],
    #[serde(default)]
    shapes: Option<Vec<IndexRepr>>,
}

#[derive(Deserialize)]
struct RawShape {
    vertices: Vec<IdRepr>,
    color: IndexRepr,
    #[serde(default, rename = "isPreDrawn")]
    is_pre_drawn: bool,
    #[serde(default)]
    sides: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    Str(String),
}

impl IdRepr {
    fn key(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Str(s) => s.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexRepr {
    Int(u64),
    Str(String),
}

impl IndexRepr {
    fn index(&self, what: &str) -> VertexResult<usize> {
        match self {
            Self::Int(i) => Ok(*i as usize),
            Self::Str(s) => s
                .trim()
                .parse::<usize>()
                .map_err(|_| VertexError::validation(format!("{what} '{s}' is not an index"))),
        }
    }
}

impl Puzzle {
    /// Load, normalize and validate a puzzle file.
    pub fn from_path(path: &Path) -> VertexResult<Self> {
        let mut doc = Document::from_path(path)?;
        doc.normalize().map_err(|e| in_file(e, path))?;
        Self::from_document(&doc).map_err(|e| in_file(e, path))
    }

    /// Parse, normalize and validate a puzzle from JSON text.
    pub fn from_json_str(s: &str) -> VertexResult<Self> {
        let mut doc = Document::from_json_str(s)?;
        doc.normalize()?;
        Self::from_document(&doc)
    }

    /// Build a puzzle from a document already in canonical layout.
    pub fn from_document(doc: &Document) -> VertexResult<Self> {
        let raw: RawPuzzle = serde_json::from_value(serde_json::Value::Object(doc.as_map().clone()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawPuzzle) -> VertexResult<Self> {
        let palette = parse_palette(&raw.palette)?;

        let mut keyed = raw.vertices.into_iter().collect::<Vec<_>>();
        keyed.sort_by(|(a, _), (b, _)| vertex_key_order(a, b));

        let index = keyed
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect::<HashMap<_, _>>();

        let mut shapes = Vec::with_capacity(raw.shapes.len());
        for (i, s) in raw.shapes.iter().enumerate() {
            if s.vertices.is_empty() {
                return Err(VertexError::validation(format!("shapes[{i}] has no vertices")));
            }
            let vertices = s
                .vertices
                .iter()
                .map(|id| {
                    let key = id.key();
                    index.get(&key).copied().ok_or_else(|| {
                        VertexError::validation(format!(
                            "shapes[{i}] references missing vertex '{key}'"
                        ))
                    })
                })
                .collect::<VertexResult<Vec<_>>>()?;
            let color = s.color.index("color index")?;
            if color >= palette.len() {
                return Err(VertexError::validation(format!(
                    "shapes[{i}] color index {color} is out of range for a palette of {}",
                    palette.len()
                )));
            }
            let n = vertices.len() as u32;
            let finalized = s.is_pre_drawn || s.sides >= n;
            shapes.push(Shape {
                id: i,
                vertices,
                color,
                sides_revealed: if finalized { n } else { s.sides },
                finalized,
            });
        }

        let mut derived = vec![Vec::<usize>::new(); keyed.len()];
        for shape in &shapes {
            for &v in &shape.vertices {
                if !derived[v].contains(&shape.id) {
                    derived[v].push(shape.id);
                }
            }
        }

        let mut vertices = Vec::with_capacity(keyed.len());
        for ((id, rv), derived) in keyed.into_iter().zip(derived) {
            let shapes_for_vertex = match rv.shapes {
                None => derived,
                Some(listed) => {
                    let mut ordered = Vec::with_capacity(listed.len());
                    for s in &listed {
                        let s = s.index("shape index")?;
                        if !ordered.contains(&s) {
                            ordered.push(s);
                        }
                    }
                    let listed_set = ordered.iter().copied().collect::<BTreeSet<_>>();
                    let derived_set = derived.iter().copied().collect::<BTreeSet<_>>();
                    if listed_set != derived_set {
                        return Err(VertexError::validation(format!(
                            "vertex '{id}' lists shapes {listed_set:?} but is used by {derived_set:?}"
                        )));
                    }
                    ordered
                }
            };
            let [x, y] = rv.coordinates;
            if !x.is_finite() || !y.is_finite() {
                return Err(VertexError::validation(format!(
                    "vertex '{id}' has non-finite coordinates"
                )));
            }
            vertices.push(Vertex {
                id,
                pos: Point::new(x, y),
                shapes: shapes_for_vertex,
                hits: 0,
            });
        }

        let remaining = shapes.iter().filter(|s| !s.finalized).count();
        let mut out = Self {
            vertices,
            shapes,
            palette,
            theme: raw.theme,
            remaining,
        };
        out.recompute_hits();
        Ok(out)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn palette(&self) -> &[Rgb8] {
        &self.palette
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Count of shapes not yet finalized.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_solved(&self) -> bool {
        self.remaining == 0
    }

    /// Palette color of `shape`.
    pub fn color_of(&self, shape: &Shape) -> VertexResult<Rgb8> {
        self.palette.get(shape.color).copied().ok_or_else(|| {
            VertexError::validation(format!(
                "shape {} color index {} has no palette entry",
                shape.id, shape.color
            ))
        })
    }

    /// Position of the vertex at `index`.
    pub fn vertex_pos(&self, index: usize) -> VertexResult<Point> {
        self.vertices
            .get(index)
            .map(|v| v.pos)
            .ok_or_else(|| VertexError::validation(format!("vertex index {index} out of range")))
    }

    /// Bounding box over every vertex, or `None` for a puzzle without vertices.
    pub fn bounds(&self) -> Option<Rect> {
        let first = self.vertices.first()?.pos;
        let init = Rect::from_points(first, first);
        Some(self.vertices.iter().fold(init, |r, v| r.union_pt(v.pos)))
    }

    /// Reveal one more side of `shape`; finalizes it when every side is shown.
    ///
    /// Returns `true` when this call finalized the shape.
    pub(crate) fn reveal_side(&mut self, shape: usize) -> bool {
        let s = &mut self.shapes[shape];
        if s.finalized {
            return false;
        }
        s.sides_revealed += 1;
        if s.sides_revealed >= s.side_count() {
            s.sides_revealed = s.side_count();
            s.finalized = true;
            self.remaining -= 1;
            return true;
        }
        false
    }

    /// Recount every vertex's `hits` from the non-finalized shapes.
    pub(crate) fn recompute_hits(&mut self) {
        for v in &mut self.vertices {
            v.hits = 0;
        }
        for shape in self.shapes.iter().filter(|s| !s.finalized) {
            for &v in &shape.vertices {
                self.vertices[v].hits += 1;
            }
        }
    }
}

/// Numeric ids sort by value, anything else after them lexicographically.
fn vertex_key_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/puzzle/model.rs"]
mod tests;
