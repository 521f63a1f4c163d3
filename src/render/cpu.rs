use std::path::Path;

use anyhow::Context as _;
use vello_cpu::kurbo::Shape as _;

use crate::foundation::core::{Point, Rgb8};
use crate::foundation::error::{VertexError, VertexResult};
use crate::puzzle::model::Puzzle;
use crate::render::text::{FontBytes, FontSource, TextPainter, char_prefix, group_thousands};
use crate::schedule::framer::Frame;

/// Reference canvas size that stroke widths, marker radii and font sizes are specified against.
const REFERENCE_CANVAS_PX: f64 = 2000.0;
/// Fraction of the way each decayed shape's corners travel toward its centroid at `decay == 1`.
const DECAY_SHRINK: f64 = 0.75;
/// Extra room around the puzzle's bounding box.
const MARGIN: f64 = 1.1;

/// Raster settings for frames.
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Side of the square drawing canvas, in pixels.
    pub canvas_px: u16,
    /// The canvas is downscaled to fit inside this box.
    pub fit_width: u32,
    pub fit_height: u32,
    /// Final frame size; the downscaled canvas is centered on it.
    pub out_width: u32,
    pub out_height: u32,
    pub background: Rgb8,
    pub font: FontSource,
    pub header_px: f32,
    pub footer_px: f32,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            canvas_px: 2000,
            fit_width: 1580,
            fit_height: 1040,
            out_width: 1920,
            out_height: 1080,
            background: Rgb8::WHITE,
            font: FontSource::System,
            header_px: 70.0,
            footer_px: 40.0,
        }
    }
}

impl RenderOpts {
    /// Canvas pixels per reference-canvas pixel.
    fn unit(&self) -> f64 {
        f64::from(self.canvas_px) / REFERENCE_CANVAS_PX
    }

    fn validate(&self) -> VertexResult<()> {
        if self.canvas_px == 0 {
            return Err(VertexError::validation("canvas_px must be > 0"));
        }
        if self.fit_width == 0 || self.fit_height == 0 {
            return Err(VertexError::validation("fit box must be non-empty"));
        }
        if self.out_width < self.fit_width.min(u32::from(self.canvas_px))
            || self.out_height < self.fit_height.min(u32::from(self.canvas_px))
        {
            return Err(VertexError::validation(
                "output size must be able to hold the downscaled canvas",
            ));
        }
        Ok(())
    }
}

/// Per-worker renderer state: options plus the shaped-text machinery built from the run's font.
///
/// Construct one per worker and reuse it for every frame that worker renders.
pub struct RenderContext {
    opts: RenderOpts,
    text: Option<TextPainter>,
}

impl RenderContext {
    /// Build a context around an already-loaded font (`None` draws no text).
    pub fn new(opts: RenderOpts, font: Option<&FontBytes>) -> VertexResult<Self> {
        opts.validate()?;
        let text = font.map(TextPainter::new).transpose()?;
        Ok(Self { opts, text })
    }

    /// Build a context, resolving `opts.font` itself.
    pub fn from_opts(opts: RenderOpts) -> VertexResult<Self> {
        let font = crate::render::text::load_font(&opts.font)?;
        Self::new(opts, font.as_ref())
    }

    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Render one frame to an opaque image of the configured output size.
    ///
    /// `source_date` is printed in the footer of non-ramp frames.
    pub fn render(&mut self, frame: &Frame, source_date: &str) -> VertexResult<image::RgbImage> {
        let side = self.opts.canvas_px;
        let unit = self.opts.unit();
        let view = Viewport::fit(&frame.puzzle, f64::from(side))?;

        let mut ctx = vello_cpu::RenderContext::new(side, side);
        ctx.set_paint(color_to_cpu(self.opts.background));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(side),
            f64::from(side),
        ));

        draw_shapes(&mut ctx, &frame.puzzle, &view, frame.decay(), unit)?;
        draw_markers(&mut ctx, &frame.puzzle, &view, frame.appear(), unit);

        if let Some(text) = self.text.as_mut() {
            draw_overlay(text, &mut ctx, frame, source_date, &self.opts);
        }

        let mut pixmap = vello_cpu::Pixmap::new(side, side);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        let canvas = image::RgbaImage::from_raw(
            u32::from(side),
            u32::from(side),
            pixmap.data_as_u8_slice().to_vec(),
        )
        .ok_or_else(|| VertexError::render("canvas buffer size mismatch"))?;
        Ok(letterbox(canvas, &self.opts))
    }
}

/// Maps puzzle coordinates onto the square canvas.
struct Viewport {
    center: Point,
    /// Canvas pixels per puzzle unit.
    scale: f64,
    half: f64,
}

impl Viewport {
    fn fit(puzzle: &Puzzle, side: f64) -> VertexResult<Self> {
        let bounds = puzzle
            .bounds()
            .ok_or_else(|| VertexError::render("puzzle has no vertices to frame"))?;
        let mut length = bounds.width().max(bounds.height()) * MARGIN;
        if length <= 0.0 {
            length = 1.0;
        }
        Ok(Self {
            center: bounds.center(),
            scale: side / length,
            half: side / 2.0,
        })
    }

    fn map(&self, p: Point) -> vello_cpu::kurbo::Point {
        vello_cpu::kurbo::Point::new(
            (p.x - self.center.x) * self.scale + self.half,
            (p.y - self.center.y) * self.scale + self.half,
        )
    }
}

fn draw_shapes(
    ctx: &mut vello_cpu::RenderContext,
    puzzle: &Puzzle,
    view: &Viewport,
    decay: Option<f64>,
    unit: f64,
) -> VertexResult<()> {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    for shape in puzzle.shapes() {
        if !shape.finalized && shape.sides_revealed == 0 {
            continue;
        }

        let mut pts = shape
            .vertices
            .iter()
            .map(|&v| puzzle.vertex_pos(v).map(|p| view.map(p)))
            .collect::<VertexResult<Vec<_>>>()?;

        if let Some(t) = decay {
            shrink_toward_centroid(&mut pts, t * DECAY_SHRINK);
        }

        if shape.finalized {
            let mut color = puzzle.color_of(shape)?;
            if let Some(t) = decay {
                color = color.fade_to_white(t);
            }
            ctx.set_paint(color_to_cpu(color));
            ctx.fill_path(&polygon(&pts));
        } else {
            ctx.set_paint(color_to_cpu(Rgb8::BLACK));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(2.0 * unit));
            let n = pts.len();
            for i in 0..(shape.sides_revealed as usize).min(n) {
                let mut seg = vello_cpu::kurbo::BezPath::new();
                seg.move_to(pts[i]);
                seg.line_to(pts[(i + 1) % n]);
                ctx.stroke_path(&seg);
            }
        }
    }
    Ok(())
}

fn draw_markers(
    ctx: &mut vello_cpu::RenderContext,
    puzzle: &Puzzle,
    view: &Viewport,
    appear: Option<f64>,
    unit: f64,
) {
    let shown = visible_markers(puzzle, appear, view.center);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(2.0 * unit));
    for v in shown {
        let vertex = &puzzle.vertices()[v];
        let radius = (f64::from(vertex.hits) + 8.0) * unit;
        let circle = vello_cpu::kurbo::Circle::new(view.map(vertex.pos), radius).to_path(0.1);
        ctx.set_paint(color_to_cpu(Rgb8::WHITE));
        ctx.fill_path(&circle);
        ctx.set_paint(color_to_cpu(Rgb8::BLACK));
        ctx.stroke_path(&circle);
    }
}

/// Indices of vertices that get a marker: every vertex with hits, or during the appear ramp the
/// `appear` fraction of them closest to `center`.
pub(crate) fn visible_markers(puzzle: &Puzzle, appear: Option<f64>, center: Point) -> Vec<usize> {
    let mut shown = puzzle
        .vertices()
        .iter()
        .enumerate()
        .filter(|(_, v)| v.hits > 0)
        .map(|(i, _)| i)
        .collect::<Vec<_>>();
    if let Some(t) = appear {
        let dist = |i: usize| (puzzle.vertices()[i].pos - center).hypot2();
        shown.sort_by(|&a, &b| dist(a).total_cmp(&dist(b)));
        let keep = (shown.len() as f64 * t.clamp(0.0, 1.0)) as usize;
        shown.truncate(keep);
    }
    shown
}

fn draw_overlay(
    text: &mut TextPainter,
    ctx: &mut vello_cpu::RenderContext,
    frame: &Frame,
    source_date: &str,
    opts: &RenderOpts,
) {
    let unit = opts.unit();
    let side = f64::from(opts.canvas_px);
    let margin = 10.0 * unit;
    let header_px = opts.header_px * unit as f32;
    let footer_px = opts.footer_px * unit as f32;

    let theme = frame.puzzle.theme();
    match frame.text_reveal {
        Some(n) => {
            text.draw_outlined(ctx, char_prefix(theme, n), header_px, (margin, margin), unit);
        }
        None => {
            text.draw_outlined(ctx, theme, header_px, (margin, margin), unit);

            let left = group_thousands(frame.remaining);
            let (w, h) = text.measure(&left, footer_px);
            text.draw_outlined(
                ctx,
                &left,
                footer_px,
                (side / 2.0 - w / 2.0, side - (h + margin)),
                unit,
            );

            let (w, h) = text.measure(source_date, footer_px);
            text.draw_outlined(
                ctx,
                source_date,
                footer_px,
                (side - (w + margin), side - (h + margin)),
                unit,
            );
        }
    }
}

fn shrink_toward_centroid(pts: &mut [vello_cpu::kurbo::Point], amount: f64) {
    if pts.is_empty() {
        return;
    }
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / n;
    let keep = 1.0 - amount;
    for p in pts.iter_mut() {
        p.x = p.x * keep + cx * amount;
        p.y = p.y * keep + cy * amount;
    }
}

fn polygon(pts: &[vello_cpu::kurbo::Point]) -> vello_cpu::kurbo::BezPath {
    let mut path = vello_cpu::kurbo::BezPath::new();
    if let Some((first, rest)) = pts.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        path.close_path();
    }
    path
}

fn color_to_cpu(c: Rgb8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, 255)
}

/// Downscale the canvas (never upscale) to fit the fit box and center it on the output frame.
fn letterbox(canvas: image::RgbaImage, opts: &RenderOpts) -> image::RgbImage {
    let (w, h) = canvas.dimensions();
    let ratio = (f64::from(opts.fit_width) / f64::from(w))
        .min(f64::from(opts.fit_height) / f64::from(h))
        .min(1.0);
    let nw = ((f64::from(w) * ratio).round() as u32).max(1);
    let nh = ((f64::from(h) * ratio).round() as u32).max(1);
    let scaled = if (nw, nh) == (w, h) {
        canvas
    } else {
        image::imageops::resize(&canvas, nw, nh, image::imageops::FilterType::Triangle)
    };

    let mut out = image::RgbaImage::from_pixel(
        opts.out_width,
        opts.out_height,
        image::Rgba(opts.background.to_rgba()),
    );
    let x = (i64::from(opts.out_width) - i64::from(nw)) / 2;
    let y = (i64::from(opts.out_height) - i64::from(nh)) / 2;
    image::imageops::overlay(&mut out, &scaled, x, y);
    image::DynamicImage::ImageRgba8(out).into_rgb8()
}

/// Write `img` as a fast-compressed PNG at `path`.
///
/// The image goes to a sibling temporary file first and is renamed into place, so `path` either
/// does not exist or holds a complete frame.
pub fn save_png(img: &image::RgbImage, path: &Path) -> VertexResult<()> {
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};

    let tmp = path.with_extension("png.partial");
    {
        let file = std::fs::File::create(&tmp)
            .with_context(|| format!("create frame '{}'", tmp.display()))?;
        let encoder = PngEncoder::new_with_quality(
            std::io::BufWriter::new(file),
            CompressionType::Fast,
            FilterType::Adaptive,
        );
        img.write_with_encoder(encoder)
            .map_err(|e| VertexError::render(format!("encode '{}': {e}", path.display())))?;
    }
    std::fs::rename(&tmp, path)
        .with_context(|| format!("move frame into place at '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
