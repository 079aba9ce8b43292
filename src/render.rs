//! Raster backend: executes a [`LayoutPlan`] on a plotters bitmap

use crate::error::RenderError;
use crate::ir::{DotDraw, HAlign, LayoutPlan, Rotation, TextDraw, VAlign};
use crate::settings::DotShape;
use image::{ImageEncoder, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

/// Largest accepted surface side, in pixels
pub const MAX_SURFACE_SIDE: u32 = 8192;

/// Corner radius of a rounded dot, as a fraction of its edge
const ROUNDED_CORNER: f64 = 0.25;

const FONT_FAMILY: &str = "sans-serif";

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// A fully rendered RGB image
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    image: RgbImage,
}

impl Surface {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Packed RGB8 rows, top to bottom
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.image.get_pixel(x, y).0)
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Encode the surface as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder.write_image(
                self.image.as_raw(),
                self.width(),
                self.height(),
                image::ColorType::Rgb8,
            )?;
        }
        Ok(png_bytes)
    }
}

fn draw_err<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Draw(err.to_string())
}

/// Draw background, texts, dots and overlays, in that order.
///
/// Either the whole plan is drawn or an error is returned; no partially drawn
/// surface escapes.
pub fn render(plan: &LayoutPlan) -> Result<Surface, RenderError> {
    let (width, height) = (plan.width, plan.height);
    if width == 0 || height == 0 || width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
        return Err(RenderError::SurfaceSize { width, height });
    }

    let mut image = RgbImage::new(width, height);
    {
        let root = BitMapBackend::with_buffer(&mut image, (width, height)).into_drawing_area();
        root.fill(&plan.background.to_plotters()).map_err(draw_err)?;

        for text in &plan.texts {
            draw_text(&root, text)?;
        }
        for dot in &plan.dots {
            draw_dot(&root, dot)?;
        }
        for rect in &plan.overlays {
            fill_rounded_rect(
                &root,
                rect.origin,
                rect.size,
                rect.radius,
                rect.color.to_plotters(),
            )?;
        }

        root.present().map_err(draw_err)?;
    }

    Ok(Surface { image })
}

fn draw_text(root: &Area, text: &TextDraw) -> Result<(), RenderError> {
    let color = text.color.to_plotters().mix(text.opacity);
    let h_pos = match text.h_align {
        HAlign::Left => HPos::Left,
        HAlign::Center => HPos::Center,
        HAlign::Right => HPos::Right,
    };
    let v_pos = match text.v_align {
        VAlign::Top => VPos::Top,
        VAlign::Middle => VPos::Center,
        VAlign::Bottom => VPos::Bottom,
    };

    let mut style = (FONT_FAMILY, text.font_size)
        .into_font()
        .color(&color)
        .pos(Pos::new(h_pos, v_pos));
    if text.rotation == Rotation::Ccw90 {
        style = style.transform(FontTransform::Rotate270);
    }

    let anchor = (text.anchor.0.round() as i32, text.anchor.1.round() as i32);
    root.draw(&Text::new(text.content.as_str(), anchor, style))
        .map_err(draw_err)
}

fn draw_dot(root: &Area, dot: &DotDraw) -> Result<(), RenderError> {
    if dot.size <= 0.0 {
        return Ok(());
    }
    let color = dot.color.to_plotters();
    let size = (dot.size, dot.size);

    match dot.shape {
        DotShape::Circle => {
            // Disc spans c-r..=c+r, so derive both from the dot's pixel span
            let (x0, y0, x1, y1) = pixel_span(dot.origin, size);
            let r = (x1 - x0).min(y1 - y0) / 2;
            if r == 0 {
                return fill_rounded_rect(root, dot.origin, size, 0.0, color);
            }
            let center = (x0 + (x1 - x0) / 2, y0 + (y1 - y0) / 2);
            root.draw(&Circle::new(center, r, color.filled()))
                .map_err(draw_err)
        }
        DotShape::Square => fill_rounded_rect(root, dot.origin, size, 0.0, color),
        DotShape::Rounded => {
            fill_rounded_rect(root, dot.origin, size, dot.size * ROUNDED_CORNER, color)
        }
    }
}

/// Inclusive pixel bounds `(x0, y0, x1, y1)` covered by a box
fn pixel_span(origin: (f64, f64), size: (f64, f64)) -> (i32, i32, i32, i32) {
    let x0 = origin.0.round() as i32;
    let y0 = origin.1.round() as i32;
    let x1 = ((origin.0 + size.0).round() as i32 - 1).max(x0);
    let y1 = ((origin.1 + size.1).round() as i32 - 1).max(y0);
    (x0, y0, x1, y1)
}

/// Fill a rectangle whose corners are quarter discs of `radius`.
///
/// Built from two overlapping bands plus four corner discs, which the bitmap
/// backend can fill exactly.
fn fill_rounded_rect(
    root: &Area,
    origin: (f64, f64),
    size: (f64, f64),
    radius: f64,
    color: RGBColor,
) -> Result<(), RenderError> {
    let (x0, y0, x1, y1) = pixel_span(origin, size);
    let style = color.filled();

    let r = radius.min(size.0 / 2.0).min(size.1 / 2.0).round() as i32;
    // Filled rectangles exclude their bottom-right corner
    if r <= 0 {
        return root
            .draw(&Rectangle::new([(x0, y0), (x1 + 1, y1 + 1)], style))
            .map_err(draw_err);
    }

    root.draw(&Rectangle::new([(x0 + r, y0), (x1 - r + 1, y1 + 1)], style))
        .map_err(draw_err)?;
    root.draw(&Rectangle::new([(x0, y0 + r), (x1 + 1, y1 - r + 1)], style))
        .map_err(draw_err)?;
    for center in [
        (x0 + r, y0 + r),
        (x1 - r, y0 + r),
        (x0 + r, y1 - r),
        (x1 - r, y1 - r),
    ] {
        root.draw(&Circle::new(center, r, style)).map_err(draw_err)?;
    }
    Ok(())
}
