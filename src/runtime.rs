// Render pipeline shared by the export and preview paths

use crate::device::{DeviceProfile, DeviceTable};
use crate::error::RenderError;
use crate::ir::LayoutPlan;
use crate::layout::{self, LayoutConfig};
use crate::render::{self, Surface};
use crate::settings::Settings;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Default preview canvas: a 260x560 logical frame at 2x density
pub const PREVIEW_SIZE: (u32, u32) = (520, 1120);

/// Device table plus layout tunables, built once and shared by every render
#[derive(Debug, Clone)]
pub struct Engine {
    devices: DeviceTable,
    layout: LayoutConfig,
}

impl Engine {
    pub fn new(devices: DeviceTable, layout: LayoutConfig) -> Self {
        Self { devices, layout }
    }

    pub fn devices(&self) -> &DeviceTable {
        &self.devices
    }

    /// Profile for `settings.device`, or the fallback when it is unknown
    pub fn device_for(&self, settings: &Settings) -> &DeviceProfile {
        let device = self.devices.resolve(&settings.device);
        if device.id != settings.device {
            log::warn!("Unknown device '{}', using '{}'", settings.device, device.id);
        }
        device
    }

    /// Layout for the device's native resolution
    pub fn plan(&self, settings: &Settings, now: DateTime<Utc>) -> LayoutPlan {
        let device = self.device_for(settings);
        layout::compute_layout(settings, device, device.width, device.height, now, &self.layout)
    }

    /// Full-size wallpaper at the device's native resolution
    pub fn render_wallpaper(&self, settings: &Settings, now: DateTime<Utc>) -> Result<Surface, RenderError> {
        let started = Instant::now();
        let plan = self.plan(settings, now);
        let surface = render::render(&plan)?;
        log::debug!(
            "Rendered {}x{} wallpaper ({} dots, {} lived) in {:?}",
            plan.width,
            plan.height,
            plan.dots.len(),
            plan.lived_count(),
            started.elapsed()
        );
        Ok(surface)
    }

    /// Full-size wallpaper encoded as PNG
    pub fn render_png(&self, settings: &Settings, now: DateTime<Utc>) -> Result<Vec<u8>, RenderError> {
        self.render_wallpaper(settings, now)?.to_png()
    }

    /// Scaled-down render for live previews, with phone chrome on top.
    ///
    /// Geometry is the export layout scaled by `width / device.width`, so a
    /// preview never disagrees with the exported image.
    pub fn render_preview(
        &self,
        settings: &Settings,
        width: u32,
        height: u32,
        now: DateTime<Utc>,
    ) -> Result<Surface, RenderError> {
        let device = self.device_for(settings);
        let chrome = layout::preview_chrome(device, &settings.theme.colors(), width, height);
        let plan = layout::compute_layout(settings, device, width, height, now, &self.layout)
            .with_overlays(chrome);
        render::render(&plan)
    }
}
