use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{VertexError, VertexResult};

/// Where overlay text gets its font from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FontSource {
    /// First sans-serif face found among the system fonts.
    #[default]
    System,
    /// A specific TTF/OTF file.
    File(PathBuf),
    /// Draw no text at all.
    Disabled,
}

/// Raw font data shared by every worker of a run.
#[derive(Clone, Debug)]
pub struct FontBytes {
    data: Arc<Vec<u8>>,
    index: u32,
}

impl FontBytes {
    pub fn new(data: Vec<u8>, index: u32) -> Self {
        Self {
            data: Arc::new(data),
            index,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Resolve `source` to font bytes. `Ok(None)` means text is disabled.
pub fn load_font(source: &FontSource) -> VertexResult<Option<FontBytes>> {
    match source {
        FontSource::Disabled => Ok(None),
        FontSource::File(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("read font '{}'", path.display()))?;
            Ok(Some(FontBytes::new(data, 0)))
        }
        FontSource::System => {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            let query = usvg::fontdb::Query {
                families: &[usvg::fontdb::Family::SansSerif],
                ..Default::default()
            };
            let found = db.query(&query).and_then(|id| {
                db.with_face_data(id, |data, index| FontBytes::new(data.to_vec(), index))
            });
            if found.is_none() {
                tracing::warn!("no system sans-serif font found; overlay text is disabled");
            }
            Ok(found)
        }
    }
}

/// Brush type carried through Parley layouts; paint is chosen at draw time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrush;

/// Light/dark outlined text drawing for one worker.
pub struct TextPainter {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family: String,
    font: vello_cpu::peniko::FontData,
}

/// Offsets (in 2000px canvas units) of the light copies drawn under the dark one.
const OUTLINE_OFFSETS: [(f64, f64); 8] = [
    (-2.0, -2.0),
    (0.0, -2.0),
    (2.0, -2.0),
    (-2.0, 0.0),
    (2.0, 0.0),
    (-2.0, 2.0),
    (0.0, 2.0),
    (2.0, 2.0),
];

impl TextPainter {
    pub fn new(font: &FontBytes) -> VertexResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from((*font.data).clone()), None);
        let faces: Vec<_> = families
            .iter()
            .map(|(id, fonts)| (*id, fonts.iter().map(|f| f.index()).collect::<Vec<_>>()))
            .collect();
        let family_id = family_for_face(&faces, font.index).ok_or_else(|| {
            VertexError::validation("no font families registered from font bytes")
        })?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| VertexError::validation("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from((*font.data).clone()),
            font.index,
        );
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font,
        })
    }

    fn layout(&mut self, text: &str, size_px: f32) -> parley::Layout<TextBrush> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }

    /// Width and height of `text` laid out at `size_px`.
    pub fn measure(&mut self, text: &str, size_px: f32) -> (f64, f64) {
        let layout = self.layout(text, size_px);
        (f64::from(layout.width()), f64::from(layout.height()))
    }

    /// Draw `text` with its top-left corner at `(x, y)`: eight light copies, then one dark copy.
    pub fn draw_outlined(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        size_px: f32,
        (x, y): (f64, f64),
        unit: f64,
    ) {
        if text.is_empty() {
            return;
        }
        let layout = self.layout(text, size_px);
        for (ox, oy) in OUTLINE_OFFSETS {
            self.fill_layout(ctx, &layout, Rgb8::WHITE, (x + ox * unit, y + oy * unit));
        }
        self.fill_layout(ctx, &layout, Rgb8::BLACK, (x, y));
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    fn fill_layout(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        layout: &parley::Layout<TextBrush>,
        color: Rgb8,
        (x, y): (f64, f64),
    ) {
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, 255,
        ));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }
}

/// The family holding face `index` of a font collection, else the first family registered.
///
/// Layout and glyph drawing must agree on the face, or a `.ttc` lays out with one face's
/// metrics and draws another's glyphs.
fn family_for_face<T: Copy>(families: &[(T, Vec<u32>)], index: u32) -> Option<T> {
    families
        .iter()
        .find(|(_, faces)| faces.contains(&index))
        .or_else(|| families.first())
        .map(|(id, _)| *id)
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// First `n` characters of `s`.
pub fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((byte, _)) => &s[..byte],
        None => s,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
