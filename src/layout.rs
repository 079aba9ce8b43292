//! Grid geometry
//!
//! Maps settings and a device profile onto a [`LayoutPlan`] for a canvas of
//! any size. All reserved bands are measured against the device's native
//! width and then multiplied by `canvas_width / device.width`, so a preview
//! render is a uniformly scaled copy of the full-size export.

use crate::device::DeviceProfile;
use crate::grid::WeekGrid;
use crate::ir::{
    DotDraw, GridGeometry, HAlign, LayoutPlan, RectDraw, Rotation, TextDraw, VAlign,
};
use crate::settings::{Settings, WidgetPosition};
use crate::theme::{Rgb, ThemeColors};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Week numbers labelled along the top axis
pub const WEEK_TICKS: [u32; 14] = [1, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48, 52];

/// Opacity applied to every label
pub const LABEL_OPACITY: f64 = 0.4;

const CLOCK_BUFFER: f64 = 0.05;
const TOP_WIDGET_SPACE: f64 = 0.28;
const BOTTOM_BUTTON_SPACE: f64 = 0.12;
const BOTTOM_WIDGET_SPACE: f64 = 0.20;
const SIDE_PADDING: f64 = 0.04;
const LABEL_SPACE: f64 = 0.025;
const AXIS_TITLE_SPACE: f64 = 0.015;
const TITLE_FONT: f64 = 0.016;
const TICK_FONT: f64 = 0.55;

/// Tunables shared by every render path
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    /// Fraction of each cell left empty between dots
    #[serde(default = "default_gap_ratio")]
    pub gap_ratio: f64,
}

fn default_gap_ratio() -> f64 {
    0.2
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            gap_ratio: default_gap_ratio(),
        }
    }
}

/// Space reserved above the grid: lock screen clock, a small buffer, and the
/// widget row when widgets sit on top. In device pixels.
pub fn calculate_top_offset(device: &DeviceProfile, widget_position: WidgetPosition) -> f64 {
    let width = device.width as f64;
    let mut offset = device.clock_height as f64 + (width * CLOCK_BUFFER).round();
    if widget_position == WidgetPosition::Top {
        offset += (width * TOP_WIDGET_SPACE).round();
    }
    offset
}

/// Space reserved below the grid: home indicator, flashlight and camera
/// buttons, and the widget row when widgets sit at the bottom. In device pixels.
pub fn calculate_bottom_offset(device: &DeviceProfile, widget_position: WidgetPosition) -> f64 {
    let width = device.width as f64;
    let mut offset = device.safe_area_bottom as f64 + (width * BOTTOM_BUTTON_SPACE).round();
    if widget_position == WidgetPosition::Bottom {
        offset += (width * BOTTOM_WIDGET_SPACE).round();
    }
    offset
}

/// Compute the full draw plan for one render.
///
/// `device` must already be resolved (unknown identifiers replaced by the
/// table's fallback). Never fails; a canvas too small to hold the grid yields
/// zero-sized cells.
pub fn compute_layout(
    settings: &Settings,
    device: &DeviceProfile,
    canvas_width: u32,
    canvas_height: u32,
    now: DateTime<Utc>,
    config: &LayoutConfig,
) -> LayoutPlan {
    let colors = settings.theme.colors();
    let grid = WeekGrid::new(settings.birth_date, settings.life_expectancy, now);
    let geometry = compute_geometry(settings, device, &grid, canvas_width, canvas_height, config);

    let texts = if settings.show_labels {
        axis_labels(settings.life_expectancy, &geometry, device, colors.text)
    } else {
        Vec::new()
    };

    LayoutPlan {
        width: canvas_width,
        height: canvas_height,
        background: colors.background,
        texts,
        dots: place_dots(settings, &grid, &geometry, &colors),
        overlays: Vec::new(),
        geometry,
    }
}

fn compute_geometry(
    settings: &Settings,
    device: &DeviceProfile,
    grid: &WeekGrid,
    canvas_width: u32,
    canvas_height: u32,
    config: &LayoutConfig,
) -> GridGeometry {
    let device_width = device.width as f64;
    let scale = canvas_width as f64 / device_width;

    let top_offset = calculate_top_offset(device, settings.widget_position) * scale;
    let bottom_offset = calculate_bottom_offset(device, settings.widget_position) * scale;

    let (label_space, axis_title_space) = if settings.show_labels {
        (
            (device_width * LABEL_SPACE).round() * scale,
            (device_width * AXIS_TITLE_SPACE).round() * scale,
        )
    } else {
        (0.0, 0.0)
    };

    let side_padding = device_width * SIDE_PADDING * scale + label_space + axis_title_space;
    let top_padding = label_space + axis_title_space;

    let available_width = canvas_width as f64 - side_padding * 2.0;
    let available_height = canvas_height as f64 - top_offset - bottom_offset - top_padding;

    let cols = grid.cols as f64;
    let rows = grid.rows as f64;
    let cell_size = (available_width / cols).min(available_height / rows).max(0.0);
    let dot_size = cell_size * (1.0 - config.gap_ratio);
    let gap = cell_size * config.gap_ratio;

    let start_x = side_padding + (available_width - cols * cell_size) / 2.0;
    let start_y = top_offset + top_padding + (available_height - rows * cell_size) / 2.0;

    GridGeometry {
        cols: grid.cols,
        rows: grid.rows,
        scale,
        top_offset,
        bottom_offset,
        side_padding,
        top_padding,
        label_space,
        axis_title_space,
        available_width,
        available_height,
        cell_size,
        dot_size,
        gap,
        start_x,
        start_y,
    }
}

fn place_dots(
    settings: &Settings,
    grid: &WeekGrid,
    geometry: &GridGeometry,
    colors: &ThemeColors,
) -> Vec<DotDraw> {
    let mut dots = Vec::with_capacity(grid.total_weeks as usize);
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let week_index = row * grid.cols + col;
            if week_index >= grid.total_weeks {
                continue;
            }
            let lived = grid.is_lived(week_index);
            dots.push(DotDraw {
                week_index,
                origin: (
                    geometry.start_x + col as f64 * geometry.cell_size + geometry.gap / 2.0,
                    geometry.start_y + row as f64 * geometry.cell_size + geometry.gap / 2.0,
                ),
                size: geometry.dot_size,
                shape: settings.shape,
                lived,
                color: if lived { colors.lived } else { colors.future },
            });
        }
    }
    dots
}

fn axis_labels(
    life_expectancy: u32,
    geometry: &GridGeometry,
    device: &DeviceProfile,
    color: Rgb,
) -> Vec<TextDraw> {
    let cell = geometry.cell_size;
    let font_size = (cell * TICK_FONT).round().max(1.0);
    let title_font_size = (device.width as f64 * TITLE_FONT * geometry.scale).round().max(1.0);
    let label = |content: String, anchor, h_align, v_align, font_size, rotation| TextDraw {
        content,
        anchor,
        h_align,
        v_align,
        font_size,
        rotation,
        opacity: LABEL_OPACITY,
        color,
    };

    let mut texts = Vec::with_capacity(WEEK_TICKS.len() + 2 + (life_expectancy / 10) as usize);

    texts.push(label(
        "WEEK OF YEAR".to_string(),
        (
            geometry.start_x + geometry.grid_width() / 2.0,
            geometry.start_y - geometry.label_space * 0.6,
        ),
        HAlign::Center,
        VAlign::Bottom,
        title_font_size,
        Rotation::None,
    ));

    for week in WEEK_TICKS {
        let col = (week - 1) as f64;
        texts.push(label(
            week.to_string(),
            (
                geometry.start_x + col * cell + cell / 2.0,
                geometry.start_y - font_size * 0.2,
            ),
            HAlign::Center,
            VAlign::Bottom,
            font_size,
            Rotation::None,
        ));
    }

    texts.push(label(
        "AGE".to_string(),
        (
            geometry.start_x - geometry.label_space - geometry.axis_title_space * 0.6,
            geometry.start_y + geometry.grid_height() / 2.0,
        ),
        HAlign::Center,
        VAlign::Middle,
        title_font_size,
        Rotation::Ccw90,
    ));

    // Row index equals age in years
    for age in (10..=life_expectancy).step_by(10) {
        if age >= geometry.rows {
            break;
        }
        texts.push(label(
            age.to_string(),
            (
                geometry.start_x - font_size * 0.4,
                geometry.start_y + age as f64 * cell + cell / 2.0,
            ),
            HAlign::Right,
            VAlign::Middle,
            font_size,
            Rotation::None,
        ));
    }

    texts
}

const CUTOUT_COLOR: Rgb = Rgb(0x1a, 0x1a, 0x1a);

// Preview frame proportions, relative to a 260x560 logical preview
const PREVIEW_WIDTH: f64 = 260.0;
const PREVIEW_HEIGHT: f64 = 560.0;

/// Decorative phone chrome for previews: the home indicator and, depending on
/// the device, a Dynamic Island pill or a notch. Not part of exported images.
pub fn preview_chrome(
    device: &DeviceProfile,
    colors: &ThemeColors,
    canvas_width: u32,
    canvas_height: u32,
) -> Vec<RectDraw> {
    let sx = canvas_width as f64 / PREVIEW_WIDTH;
    let sy = canvas_height as f64 / PREVIEW_HEIGHT;
    let mut chrome = Vec::with_capacity(2);

    if device.has_dynamic_island {
        let (w, h) = (112.0 * sx, 32.0 * sy);
        chrome.push(RectDraw {
            origin: (canvas_width as f64 / 2.0 - w / 2.0, 12.0 * sy),
            size: (w, h),
            radius: h / 2.0,
            color: CUTOUT_COLOR,
        });
    } else if device.has_notch {
        // Extends above the top edge so only the bottom corners show rounded
        let (w, h, r) = (144.0 * sx, 28.0 * sy, 24.0 * sy);
        chrome.push(RectDraw {
            origin: (canvas_width as f64 / 2.0 - w / 2.0, -r),
            size: (w, h + r),
            radius: r,
            color: CUTOUT_COLOR,
        });
    }

    let (w, h) = (110.0 * sx, 4.0 * sy);
    chrome.push(RectDraw {
        origin: (canvas_width as f64 / 2.0 - w / 2.0, canvas_height as f64 - 14.0 * sy),
        size: (w, h),
        radius: h / 2.0,
        color: colors.text,
    });

    chrome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceTable;
    use crate::settings::DotShape;
    use crate::theme::{PresetTheme, Theme};
    use chrono::{Duration, NaiveDate, TimeZone};

    const EPS: f64 = 1e-6;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 8, 30, 0).unwrap()
    }

    fn settings() -> Settings {
        Settings {
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            life_expectancy: 80,
            device: "iphone-16-pro".to_string(),
            shape: DotShape::Circle,
            widget_position: WidgetPosition::None,
            theme: Theme::Preset(PresetTheme::Dark),
            show_labels: true,
        }
    }

    fn assert_within_bounds(plan: &LayoutPlan) {
        let g = &plan.geometry;
        let (w, h) = (plan.width as f64, plan.height as f64);
        assert!(g.cell_size > 0.0);
        assert!(g.start_x >= g.side_padding - EPS, "{:?}", g);
        assert!(g.start_x + g.grid_width() <= w - g.side_padding + EPS, "{:?}", g);
        assert!(g.start_y >= g.top_offset + g.top_padding - EPS, "{:?}", g);
        assert!(g.start_y + g.grid_height() <= h - g.bottom_offset + EPS, "{:?}", g);
        for dot in &plan.dots {
            assert!(dot.origin.0 >= 0.0 && dot.origin.0 + dot.size <= w);
            assert!(dot.origin.1 >= 0.0 && dot.origin.1 + dot.size <= h);
        }
    }

    #[test]
    fn test_offsets_follow_widget_position() {
        let table = DeviceTable::builtin().unwrap();
        let device = table.get("iphone-16-pro").unwrap();
        // 300 clock + round(1206 * 0.05) = 60
        assert_eq!(calculate_top_offset(device, WidgetPosition::None), 360.0);
        assert_eq!(calculate_top_offset(device, WidgetPosition::Top), 360.0 + 338.0);
        assert_eq!(calculate_top_offset(device, WidgetPosition::Bottom), 360.0);
        // 102 home indicator + round(1206 * 0.12) = 145
        assert_eq!(calculate_bottom_offset(device, WidgetPosition::None), 247.0);
        assert_eq!(calculate_bottom_offset(device, WidgetPosition::Bottom), 247.0 + 241.0);
    }

    #[test]
    fn test_geometry_full_resolution() {
        let table = DeviceTable::builtin().unwrap();
        let device = table.get("iphone-16-pro").unwrap();
        let plan = compute_layout(&settings(), device, 1206, 2622, now(), &LayoutConfig::default());
        let g = plan.geometry;

        assert_eq!(g.scale, 1.0);
        assert_eq!(g.label_space, 30.0);
        assert_eq!(g.axis_title_space, 18.0);
        assert!((g.side_padding - (48.24 + 48.0)).abs() < EPS);
        assert_eq!(g.top_padding, 48.0);
        // Width bound: (1206 - 192.48) / 52 is tighter than the height bound
        let expected_cell = (1206.0 - 2.0 * g.side_padding) / 52.0;
        assert!((g.cell_size - expected_cell).abs() < EPS);
        assert!((g.dot_size - expected_cell * 0.8).abs() < EPS);
        assert!((g.gap - expected_cell * 0.2).abs() < EPS);
        assert!((g.start_x - g.side_padding).abs() < EPS);
        assert_within_bounds(&plan);
    }

    #[test]
    fn test_dot_positions_and_classification() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let mut s = settings();
        s.birth_date = (now - Duration::weeks(520)).date_naive();
        s.life_expectancy = 77;
        let table = DeviceTable::builtin().unwrap();
        let plan = compute_layout(&s, table.fallback(), 1206, 2622, now, &LayoutConfig::default());

        assert_eq!(plan.dots.len(), 4004);
        assert_eq!(plan.lived_count(), 520);
        let colors = PresetTheme::Dark.colors();
        for (i, dot) in plan.dots.iter().enumerate() {
            assert_eq!(dot.week_index as usize, i);
            assert_eq!(dot.lived, i < 520);
            assert_eq!(dot.color, if i < 520 { colors.lived } else { colors.future });
        }

        let g = plan.geometry;
        let dot = plan.dots[53]; // row 1, col 1
        assert!((dot.origin.0 - (g.start_x + g.cell_size + g.gap / 2.0)).abs() < EPS);
        assert!((dot.origin.1 - (g.start_y + g.cell_size + g.gap / 2.0)).abs() < EPS);
    }

    #[test]
    fn test_no_overflow_for_every_device() {
        let table = DeviceTable::builtin().unwrap();
        for device in table.iter() {
            for position in [WidgetPosition::None, WidgetPosition::Top, WidgetPosition::Bottom] {
                for show_labels in [true, false] {
                    for years in [1, 77, 120] {
                        let mut s = settings();
                        s.widget_position = position;
                        s.show_labels = show_labels;
                        s.life_expectancy = years;
                        let plan = compute_layout(
                            &s,
                            device,
                            device.width,
                            device.height,
                            now(),
                            &LayoutConfig::default(),
                        );
                        assert_within_bounds(&plan);
                        assert_eq!(plan.dots.len() as u32, years * 52);
                    }
                }
            }
        }
    }

    #[test]
    fn test_preview_is_scaled_copy() {
        let table = DeviceTable::builtin().unwrap();
        let device = table.get("iphone-16-pro").unwrap();
        let full = compute_layout(&settings(), device, 1206, 2622, now(), &LayoutConfig::default());
        let half = compute_layout(&settings(), device, 603, 1311, now(), &LayoutConfig::default());

        assert_eq!(half.geometry.scale, 0.5);
        assert!((half.geometry.cell_size * 2.0 - full.geometry.cell_size).abs() < EPS);
        assert!((half.geometry.start_x * 2.0 - full.geometry.start_x).abs() < EPS);
        assert!((half.geometry.start_y * 2.0 - full.geometry.start_y).abs() < EPS);
        assert_eq!(half.dots.len(), full.dots.len());
        assert_within_bounds(&half);
    }

    #[test]
    fn test_no_labels_reclaims_label_space() {
        let table = DeviceTable::builtin().unwrap();
        let device = table.get("iphone-15").unwrap();
        let mut s = settings();
        s.show_labels = false;
        let plan = compute_layout(&s, device, device.width, device.height, now(), &LayoutConfig::default());
        let g = plan.geometry;

        assert!(plan.texts.is_empty());
        assert_eq!(g.label_space, 0.0);
        assert_eq!(g.top_padding, 0.0);
        assert!((g.side_padding - device.width as f64 * 0.04).abs() < EPS);
        assert!((g.available_width - device.width as f64 * 0.92).abs() < EPS);

        let labelled = compute_layout(&settings(), device, device.width, device.height, now(), &LayoutConfig::default());
        assert!(g.cell_size > labelled.geometry.cell_size);
    }

    #[test]
    fn test_labels() {
        let table = DeviceTable::builtin().unwrap();
        let device = table.get("iphone-16-pro").unwrap();
        let plan = compute_layout(&settings(), device, 1206, 2622, now(), &LayoutConfig::default());
        let g = plan.geometry;

        let contents: Vec<&str> = plan.texts.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents[0], "WEEK OF YEAR");
        assert_eq!(&contents[1..15], &["1", "4", "8", "12", "16", "20", "24", "28", "32", "36", "40", "44", "48", "52"]);
        assert_eq!(contents[15], "AGE");
        // Ages 10..70; 80 would sit on row 80 which does not exist
        assert_eq!(&contents[16..], &["10", "20", "30", "40", "50", "60", "70"]);

        let age = &plan.texts[15];
        assert_eq!(age.rotation, Rotation::Ccw90);
        assert!(age.anchor.0 < g.start_x);

        let week_52 = &plan.texts[14];
        assert!((week_52.anchor.0 - (g.start_x + 51.0 * g.cell_size + g.cell_size / 2.0)).abs() < EPS);
        assert_eq!(week_52.h_align, HAlign::Center);
        assert_eq!(week_52.v_align, VAlign::Bottom);

        let age_10 = &plan.texts[16];
        assert_eq!(age_10.h_align, HAlign::Right);
        assert!((age_10.anchor.1 - (g.start_y + 10.5 * g.cell_size)).abs() < EPS);

        for text in &plan.texts {
            assert_eq!(text.opacity, LABEL_OPACITY);
            assert_eq!(text.color, PresetTheme::Dark.colors().text);
        }
    }

    #[test]
    fn test_gap_ratio_is_configurable() {
        let table = DeviceTable::builtin().unwrap();
        let config = LayoutConfig { gap_ratio: 0.25 };
        let plan = compute_layout(&settings(), table.fallback(), 520, 1120, now(), &config);
        let g = plan.geometry;
        assert!((g.dot_size - g.cell_size * 0.75).abs() < EPS);
        assert!((g.gap - g.cell_size * 0.25).abs() < EPS);
    }

    #[test]
    fn test_tiny_canvas_does_not_panic() {
        let table = DeviceTable::builtin().unwrap();
        let plan = compute_layout(&settings(), table.fallback(), 10, 3, now(), &LayoutConfig::default());
        assert_eq!(plan.geometry.cell_size, 0.0);
        assert_eq!(plan.dots.len(), 80 * 52);
    }

    #[test]
    fn test_preview_chrome_depends_on_cutout() {
        let table = DeviceTable::builtin().unwrap();
        let colors = PresetTheme::Light.colors();

        let island = preview_chrome(table.get("iphone-16").unwrap(), &colors, 520, 1120);
        assert_eq!(island.len(), 2);
        assert!(island[0].origin.1 > 0.0);

        let notch = preview_chrome(table.get("iphone-13").unwrap(), &colors, 520, 1120);
        assert_eq!(notch.len(), 2);
        assert!(notch[0].origin.1 < 0.0);

        let plain = preview_chrome(table.get("iphone-se").unwrap(), &colors, 520, 1120);
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].color, colors.text);
    }
}
