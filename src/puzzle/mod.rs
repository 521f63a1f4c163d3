/// Palette color parsing.
pub mod color;
/// Raw documents and layout normalization.
pub mod document;
/// Validated puzzle state.
pub mod model;
