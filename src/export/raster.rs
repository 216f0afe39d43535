use std::collections::HashMap;
use std::convert::Infallible;

use embedded_graphics::mono_font::{iso_8859_1, MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    PrimitiveStyleBuilder, Rectangle, RoundedRectangle, StrokeAlignment,
};
use embedded_graphics::text::{Baseline, Text};
use image::RgbImage;

use super::snapshot::{Align, Node, Rect, Rgb, SnapshotLayout};
use crate::error::{Error, ErrorKind, Result};

/// Upper bound for the pixel count of one rasterized surface.
const MAX_PIXELS: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

/// Paints print layouts into bitmaps.
///
/// Layouts are attached as off-screen surfaces first and must be detached again once
/// captured; [`mount`] does the detaching for its caller.
pub trait Rasterizer: Send {
    fn attach(&mut self, layout: SnapshotLayout) -> SurfaceId;
    fn rasterize(&mut self, surface: SurfaceId, magnification: u32) -> Result<RgbImage>;
    fn detach(&mut self, surface: SurfaceId);
    /// Number of surfaces currently attached.
    fn attached(&self) -> usize;
}

/// An attached surface, detached again when dropped.
pub struct Mounted<'r> {
    rasterizer: &'r mut dyn Rasterizer,
    surface: SurfaceId,
}

pub fn mount(rasterizer: &mut dyn Rasterizer, layout: SnapshotLayout) -> Mounted<'_> {
    let surface = rasterizer.attach(layout);
    Mounted {
        rasterizer,
        surface,
    }
}

impl Mounted<'_> {
    pub fn rasterize(&mut self, magnification: u32) -> Result<RgbImage> {
        self.rasterizer.rasterize(self.surface, magnification)
    }
}

impl Drop for Mounted<'_> {
    fn drop(&mut self) {
        self.rasterizer.detach(self.surface);
        log::debug!("Detached print surface {:?}", self.surface);
    }
}

/// Software rasterizer painting with `embedded-graphics` onto an RGB image.
#[derive(Debug, Default)]
pub struct CanvasRasterizer {
    surfaces: HashMap<SurfaceId, SnapshotLayout>,
    next_id: u64,
}

impl CanvasRasterizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rasterizer for CanvasRasterizer {
    fn attach(&mut self, layout: SnapshotLayout) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(id, layout);
        id
    }

    fn rasterize(&mut self, surface: SurfaceId, magnification: u32) -> Result<RgbImage> {
        let layout = self.surfaces.get(&surface).ok_or_else(|| {
            Error::new(
                ErrorKind::GenerationFailed,
                &format!("surface {:?} is not attached", surface),
            )
        })?;

        let mag = magnification.max(1);
        let width = layout.width as u64 * mag as u64;
        let height = layout.height as u64 * mag as u64;
        if width == 0 || height == 0 || width * height > MAX_PIXELS {
            return Err(Error::new(
                ErrorKind::GenerationFailed,
                &format!("cannot rasterize a {}x{} surface", width, height),
            ));
        }

        let mut canvas = Canvas::new(width as u32, height as u32, layout.background);
        for node in &layout.nodes {
            draw_node(&mut canvas, node, mag);
        }

        Ok(canvas.into_image())
    }

    fn detach(&mut self, surface: SurfaceId) {
        self.surfaces.remove(&surface);
    }

    fn attached(&self) -> usize {
        self.surfaces.len()
    }
}

fn color(rgb: Rgb) -> Rgb888 {
    Rgb888::new(rgb.0, rgb.1, rgb.2)
}

fn scaled(rect: &Rect, mag: u32) -> Rectangle {
    Rectangle::new(
        Point::new(rect.x * mag as i32, rect.y * mag as i32),
        Size::new(rect.width * mag, rect.height * mag),
    )
}

fn draw_node(canvas: &mut Canvas, node: &Node, mag: u32) {
    match node {
        Node::Box {
            rect,
            fill,
            border,
            radius,
        } => {
            let mut style = PrimitiveStyleBuilder::new().fill_color(color(*fill));
            if let Some(border) = border {
                style = style
                    .stroke_color(color(border.color))
                    .stroke_width(border.width * mag)
                    .stroke_alignment(StrokeAlignment::Inside);
            }

            let corner = Size::new(radius * mag, radius * mag);
            let _ = RoundedRectangle::with_equal_corners(scaled(rect, mag), corner)
                .into_styled(style.build())
                .draw(canvas);
        }
        Node::Text {
            rect,
            lines,
            size,
            color: rgb,
            bold,
            align,
        } => {
            let (font, factor) = pick_font(size * mag, *bold);
            let clip = scaled(rect, mag);
            let char_width = (font.character_size.width + font.character_spacing) * factor;
            let line_height = (font.character_size.height + 2) * factor;
            let per_line = (clip.size.width / char_width.max(1)).max(1) as usize;

            let wrapped = lines.iter().flat_map(|line| wrap(line, per_line));

            let mut y = clip.top_left.y;
            for line in wrapped {
                if y >= clip.top_left.y + clip.size.height as i32 {
                    break;
                }

                let line_width = line.chars().count() as u32 * char_width;
                let x = match align {
                    Align::Left => clip.top_left.x,
                    Align::Center => {
                        clip.top_left.x + (clip.size.width.saturating_sub(line_width) / 2) as i32
                    }
                };

                let mut target = Magnify {
                    canvas: &mut *canvas,
                    origin: Point::new(x, y),
                    factor,
                    clip,
                };
                let style = MonoTextStyle::new(font, color(*rgb));
                let _ = Text::with_baseline(&line, Point::zero(), style, Baseline::Top)
                    .draw(&mut target);

                y += line_height as i32;
            }
        }
    }
}

/// Splits `line` into chunks of at most `width` characters, preferring to break
/// after whitespace. An empty line stays one (empty) line.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= width {
        return vec![line.to_owned()];
    }

    let mut out = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let mut end = (start + width).min(chars.len());
        if end < chars.len() {
            if let Some(space) = chars[start..end].iter().rposition(|c| c.is_whitespace()) {
                if space > 0 {
                    end = start + space + 1;
                }
            }
        }
        out.push(chars[start..end].iter().collect::<String>().trim_end().to_owned());
        start = end;
    }
    out
}

const REGULAR_FONTS: &[&MonoFont<'static>] = &[
    &iso_8859_1::FONT_6X10,
    &iso_8859_1::FONT_6X13,
    &iso_8859_1::FONT_9X15,
    &iso_8859_1::FONT_9X18,
    &iso_8859_1::FONT_10X20,
];

const BOLD_FONTS: &[&MonoFont<'static>] = &[
    &iso_8859_1::FONT_6X13_BOLD,
    &iso_8859_1::FONT_7X13_BOLD,
    &iso_8859_1::FONT_9X15_BOLD,
    &iso_8859_1::FONT_9X18_BOLD,
];

/// Picks a bitmap font and an integer scale factor approximating a glyph height of
/// `px` device pixels.
fn pick_font(px: u32, bold: bool) -> (&'static MonoFont<'static>, u32) {
    let fonts = if bold { BOLD_FONTS } else { REGULAR_FONTS };
    let tallest = fonts
        .iter()
        .map(|f| f.character_size.height)
        .max()
        .unwrap_or(20);

    let factor = ((px as f32) / tallest as f32).ceil().max(1.0) as u32;
    let per_glyph = px / factor;

    let font = fonts
        .iter()
        .rev()
        .find(|f| f.character_size.height <= per_glyph)
        .or_else(|| fonts.first())
        .copied()
        .unwrap_or(&iso_8859_1::FONT_6X10);

    (font, factor)
}

struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Rgb) -> Self {
        Canvas {
            image: RgbImage::from_pixel(
                width,
                height,
                image::Rgb([background.0, background.1, background.2]),
            ),
        }
    }

    fn into_image(self) -> RgbImage {
        self.image
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.image.dimensions();
        for Pixel(point, c) in pixels {
            if point.x >= 0 && point.y >= 0 && (point.x as u32) < width && (point.y as u32) < height
            {
                self.image
                    .put_pixel(point.x as u32, point.y as u32, image::Rgb([c.r(), c.g(), c.b()]));
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, c: Self::Color) -> std::result::Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if let Some(bottom_right) = area.bottom_right() {
            let px = image::Rgb([c.r(), c.g(), c.b()]);
            for y in area.top_left.y..=bottom_right.y {
                for x in area.top_left.x..=bottom_right.x {
                    self.image.put_pixel(x as u32, y as u32, px);
                }
            }
        }
        Ok(())
    }
}

/// Draws every pixel as a `factor` × `factor` block, offset by `origin` and clipped
/// to `clip`. Used to scale bitmap glyphs.
struct Magnify<'c> {
    canvas: &'c mut Canvas,
    origin: Point,
    factor: u32,
    clip: Rectangle,
}

impl OriginDimensions for Magnify<'_> {
    fn size(&self) -> Size {
        self.canvas.size() / self.factor
    }
}

impl DrawTarget for Magnify<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let f = self.factor as i32;
        for Pixel(point, c) in pixels {
            let block = Rectangle::new(
                self.origin + Point::new(point.x * f, point.y * f),
                Size::new(self.factor, self.factor),
            )
            .intersection(&self.clip);
            self.canvas.fill_solid(&block, c)?;
        }
        Ok(())
    }
}
