use crate::foundation::core::Rgb8;
use crate::foundation::error::{VertexError, VertexResult};

/// Parse a palette entry: `#rgb` (nibbles duplicated) or `#rrggbb`, case-insensitive.
pub fn parse_hex(s: &str) -> VertexResult<Rgb8> {
    let trimmed = s.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);

    fn nibble(c: u8) -> Option<u8> {
        (c as char).to_digit(16).map(|d| d as u8)
    }

    let bytes = hex.as_bytes();
    let digits = bytes
        .iter()
        .map(|&c| nibble(c))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| VertexError::validation(format!("invalid hex color \"{s}\"")))?;

    match digits.as_slice() {
        [r, g, b] => Ok(Rgb8::new(r * 17, g * 17, b * 17)),
        [r1, r0, g1, g0, b1, b0] => Ok(Rgb8::new(
            (r1 << 4) | r0,
            (g1 << 4) | g0,
            (b1 << 4) | b0,
        )),
        _ => Err(VertexError::validation(format!(
            "palette color \"{s}\" must be #rgb or #rrggbb"
        ))),
    }
}

/// Resolve every palette entry up front so a bad entry fails the load, not a render.
pub fn parse_palette(entries: &[String]) -> VertexResult<Vec<Rgb8>> {
    entries
        .iter()
        .enumerate()
        .map(|(i, c)| {
            parse_hex(c).map_err(|e| VertexError::validation(format!("palette[{i}]: {e}")))
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/puzzle/color.rs"]
mod tests;
