use rand::Rng;

use crate::puzzle::model::Puzzle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WalkState {
    Initial,
    Selecting,
    Terminal,
}

/// Greedy edge-reveal walk over a puzzle.
///
/// Yields the untouched puzzle first, then one snapshot per revealed side until every shape is
/// finalized. A shape, once picked, keeps receiving sides until it is finalized; the next shape is
/// taken from the current vertex, then from recently touched vertices (most recent first), then
/// from the vertex with the most unfinished shapes overall. Ties between eligible shapes at one
/// vertex are broken by `rng`, the only source of non-determinism.
pub struct Walk<R> {
    puzzle: Puzzle,
    rng: R,
    state: WalkState,
    touched: Vec<usize>,
    current_vertex: Option<usize>,
    current_shape: Option<usize>,
}

impl<R: Rng> Walk<R> {
    pub fn new(puzzle: Puzzle, rng: R) -> Self {
        Self {
            puzzle,
            rng,
            state: WalkState::Initial,
            touched: Vec::new(),
            current_vertex: None,
            current_shape: None,
        }
    }

    /// The puzzle as of the last yielded snapshot.
    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    /// Advance one side. Returns `false` once nothing is left to reveal.
    fn step(&mut self) -> bool {
        let shape = match self.current_shape {
            Some(s) if !self.puzzle.shapes()[s].finalized => s,
            _ => match self.select_shape() {
                Some(s) => s,
                None => return false,
            },
        };

        for &v in &self.puzzle.shapes()[shape].vertices {
            if !self.touched.contains(&v) {
                self.touched.push(v);
            }
        }

        let finalized = self.puzzle.reveal_side(shape);
        self.current_shape = if finalized { None } else { Some(shape) };
        self.puzzle.recompute_hits();
        true
    }

    fn select_shape(&mut self) -> Option<usize> {
        loop {
            if let Some(v) = self.current_vertex {
                let candidates = self.puzzle.vertices()[v]
                    .shapes
                    .iter()
                    .copied()
                    .filter(|&s| !self.puzzle.shapes()[s].finalized)
                    .collect::<Vec<_>>();
                if !candidates.is_empty() {
                    let pick = self.rng.random_range(0..candidates.len());
                    return Some(candidates[pick]);
                }
                self.current_vertex = None;
            }

            while let Some(v) = self.touched.pop() {
                if self.puzzle.vertices()[v].hits > 0 {
                    self.current_vertex = Some(v);
                    break;
                }
            }
            if self.current_vertex.is_some() {
                continue;
            }

            let (busiest, hits) = self.busiest_vertex()?;
            if hits == 0 {
                return None;
            }
            self.current_vertex = Some(busiest);
        }
    }

    /// Vertex with the most hits; the last one wins ties.
    fn busiest_vertex(&self) -> Option<(usize, u32)> {
        self.puzzle
            .vertices()
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.hits))
            .max_by_key(|&(_, hits)| hits)
    }
}

impl<R: Rng> Iterator for Walk<R> {
    type Item = Puzzle;

    fn next(&mut self) -> Option<Puzzle> {
        match self.state {
            WalkState::Initial => {
                self.state = WalkState::Selecting;
                Some(self.puzzle.clone())
            }
            WalkState::Selecting => {
                if self.step() {
                    Some(self.puzzle.clone())
                } else {
                    tracing::debug!(theme = self.puzzle.theme(), "walk finished");
                    self.state = WalkState::Terminal;
                    None
                }
            }
            WalkState::Terminal => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/walk.rs"]
mod tests;
