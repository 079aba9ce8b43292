use crate::settings::DotShape;
use crate::theme::Rgb;

// =============================================================================
// Layout output
// =============================================================================

/// Everything the renderer needs, in draw order: background, then texts,
/// then dots, then overlays. The renderer executes these blindly.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub texts: Vec<TextDraw>,
    pub dots: Vec<DotDraw>,
    /// Decorative shapes drawn on top (preview chrome only)
    pub overlays: Vec<RectDraw>,
    pub geometry: GridGeometry,
}

impl LayoutPlan {
    pub fn lived_count(&self) -> usize {
        self.dots.iter().filter(|d| d.lived).count()
    }

    pub fn with_overlays(mut self, overlays: Vec<RectDraw>) -> Self {
        self.overlays.extend(overlays);
        self
    }
}

/// Computed placement of the week grid on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub cols: u32,
    pub rows: u32,
    pub scale: f64,
    pub top_offset: f64,
    pub bottom_offset: f64,
    pub side_padding: f64,
    pub top_padding: f64,
    pub label_space: f64,
    pub axis_title_space: f64,
    pub available_width: f64,
    pub available_height: f64,
    pub cell_size: f64,
    pub dot_size: f64,
    pub gap: f64,
    pub start_x: f64,
    pub start_y: f64,
}

impl GridGeometry {
    pub fn grid_width(&self) -> f64 {
        self.cols as f64 * self.cell_size
    }

    pub fn grid_height(&self) -> f64 {
        self.rows as f64 * self.cell_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    /// Quarter turn counter-clockwise, text reads bottom to top
    Ccw90,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub content: String,
    pub anchor: (f64, f64),
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub font_size: f64,
    pub rotation: Rotation,
    pub opacity: f64,
    pub color: Rgb,
}

/// One week cell; `origin` is the top-left corner of the dot square
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotDraw {
    pub week_index: u32,
    pub origin: (f64, f64),
    pub size: f64,
    pub shape: DotShape,
    pub lived: bool,
    pub color: Rgb,
}

/// Filled rectangle with optional rounded corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectDraw {
    pub origin: (f64, f64),
    pub size: (f64, f64),
    pub radius: f64,
    pub color: Rgb,
}
