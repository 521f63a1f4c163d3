pub use kurbo::{Point, Rect, Vec2};

/// Global, zero-based frame number across every input file of a run.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct FrameNo(pub u64);

impl FrameNo {
    /// File name of this frame inside a frames directory (`frame_%08d.png`).
    pub fn file_name(self) -> String {
        format!("frame_{:08}.png", self.0)
    }

    /// The frame `n` positions later.
    pub fn offset(self, n: u64) -> Self {
        Self(self.0 + n)
    }
}

/// Opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Blend toward white by `t` in `[0, 1]`; `t == 0` is the color itself.
    pub fn fade_to_white(self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let ch = |c: u8| -> u8 { (f64::from(c) * (1.0 - t) + 255.0 * t) as u8 };
        Self::new(ch(self.r), ch(self.g), ch(self.b))
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
