//! Wallpaper settings and their wire form
//!
//! [`Settings`] is the validated, strongly-typed value the layout engine
//! consumes. [`WireSettings`] is the JSON shape accepted over HTTP and stored
//! inside tokens; converting between the two is where validation happens.

use crate::country::CountryPreset;
use crate::error::ValidationError;
use crate::theme::{PresetTheme, Rgb, Theme, ThemeColors};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound on accepted life expectancy, in years
pub const MAX_LIFE_EXPECTANCY: u32 = 150;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DotShape {
    #[default]
    Circle,
    Rounded,
    Square,
}

/// Where lock-screen widgets sit, if anywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetPosition {
    #[default]
    None,
    Top,
    Bottom,
}

/// Theme identifier as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    Light,
    Dark,
    Midnight,
    Sepia,
    Ocean,
    Forest,
    Custom,
}

impl ThemeId {
    fn preset(self) -> Option<PresetTheme> {
        match self {
            ThemeId::Light => Some(PresetTheme::Light),
            ThemeId::Dark => Some(PresetTheme::Dark),
            ThemeId::Midnight => Some(PresetTheme::Midnight),
            ThemeId::Sepia => Some(PresetTheme::Sepia),
            ThemeId::Ocean => Some(PresetTheme::Ocean),
            ThemeId::Forest => Some(PresetTheme::Forest),
            ThemeId::Custom => None,
        }
    }

    fn from_preset(preset: PresetTheme) -> ThemeId {
        match preset {
            PresetTheme::Light => ThemeId::Light,
            PresetTheme::Dark => ThemeId::Dark,
            PresetTheme::Midnight => ThemeId::Midnight,
            PresetTheme::Sepia => ThemeId::Sepia,
            PresetTheme::Ocean => ThemeId::Ocean,
            PresetTheme::Forest => ThemeId::Forest,
        }
    }
}

impl std::str::FromStr for ThemeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "custom" {
            return Ok(ThemeId::Custom);
        }
        PresetTheme::from_id(s)
            .map(ThemeId::from_preset)
            .ok_or_else(|| ValidationError::Theme(s.to_string()))
    }
}

/// Validated wallpaper settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub birth_date: NaiveDate,
    pub life_expectancy: u32,
    /// Device identifier, kept verbatim even when it is not in the device table
    pub device: String,
    pub shape: DotShape,
    pub widget_position: WidgetPosition,
    pub theme: Theme,
    pub show_labels: bool,
}

impl Settings {
    pub fn new(birth_date: NaiveDate, life_expectancy: u32) -> Result<Self, ValidationError> {
        check_life_expectancy(life_expectancy)?;
        Ok(Settings {
            birth_date,
            life_expectancy,
            device: String::new(),
            shape: DotShape::default(),
            widget_position: WidgetPosition::default(),
            theme: Theme::default(),
            show_labels: true,
        })
    }

    /// Total number of week cells in the grid
    pub fn total_weeks(&self) -> u32 {
        self.life_expectancy * crate::grid::COLS
    }

    /// Switch palettes the way the interactive editor does: moving to
    /// `custom` starts from whatever palette is currently in effect.
    pub fn with_theme(mut self, id: ThemeId) -> Self {
        self.theme = match id.preset() {
            Some(preset) => Theme::Preset(preset),
            None => match self.theme {
                Theme::Custom(_) => self.theme,
                Theme::Preset(preset) => Theme::Custom(preset.colors()),
            },
        };
        self
    }

    /// Take the life expectancy of a country preset
    pub fn with_country(mut self, country: &CountryPreset) -> Self {
        self.life_expectancy = country.life_expectancy;
        self
    }

    pub fn to_wire(&self) -> WireSettings {
        let (theme, custom_colors) = match self.theme {
            Theme::Preset(preset) => (ThemeId::from_preset(preset), None),
            Theme::Custom(colors) => (ThemeId::Custom, Some(WireColors::from(colors))),
        };
        WireSettings {
            birth_date: self.birth_date.format(DATE_FORMAT).to_string(),
            life_expectancy: self.life_expectancy,
            device: self.device.clone(),
            shape: self.shape,
            widget_position: self.widget_position,
            theme,
            custom_colors,
            show_labels: self.show_labels,
        }
    }
}

fn check_life_expectancy(value: u32) -> Result<(), ValidationError> {
    if value == 0 || value > MAX_LIFE_EXPECTANCY {
        return Err(ValidationError::LifeExpectancy {
            value,
            max: MAX_LIFE_EXPECTANCY,
        });
    }
    Ok(())
}

/// JSON form of [`Settings`]; field order here is the canonical token order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WireSettings {
    pub birth_date: String,
    pub life_expectancy: u32,
    pub device: String,
    pub shape: DotShape,
    pub widget_position: WidgetPosition,
    pub theme: ThemeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_colors: Option<WireColors>,
    #[serde(default = "default_show_labels")]
    pub show_labels: bool,
}

fn default_show_labels() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireColors {
    pub background: String,
    pub lived: String,
    pub future: String,
    pub text: String,
}

impl From<ThemeColors> for WireColors {
    fn from(colors: ThemeColors) -> Self {
        WireColors {
            background: colors.background.to_hex(),
            lived: colors.lived.to_hex(),
            future: colors.future.to_hex(),
            text: colors.text.to_hex(),
        }
    }
}

impl TryFrom<&WireColors> for ThemeColors {
    type Error = ValidationError;

    fn try_from(wire: &WireColors) -> Result<Self, Self::Error> {
        let color = |field: &'static str, value: &str| {
            Rgb::parse(value).ok_or_else(|| ValidationError::Color {
                field,
                value: value.to_string(),
            })
        };
        Ok(ThemeColors {
            background: color("background", &wire.background)?,
            lived: color("lived", &wire.lived)?,
            future: color("future", &wire.future)?,
            text: color("text", &wire.text)?,
        })
    }
}

impl TryFrom<WireSettings> for Settings {
    type Error = ValidationError;

    fn try_from(wire: WireSettings) -> Result<Self, Self::Error> {
        let birth_date = NaiveDate::parse_from_str(&wire.birth_date, DATE_FORMAT)
            .map_err(|_| ValidationError::BirthDate(wire.birth_date.clone()))?;
        check_life_expectancy(wire.life_expectancy)?;

        // Colors are validated even when the theme ignores them
        let custom = wire
            .custom_colors
            .as_ref()
            .map(ThemeColors::try_from)
            .transpose()?;
        let theme = match wire.theme.preset() {
            Some(preset) => Theme::Preset(preset),
            None => Theme::Custom(custom.unwrap_or_else(|| PresetTheme::default().colors())),
        };

        Ok(Settings {
            birth_date,
            life_expectancy: wire.life_expectancy,
            device: wire.device,
            shape: wire.shape,
            widget_position: wire.widget_position,
            theme,
            show_labels: wire.show_labels,
        })
    }
}

/// Parse and validate settings from a JSON document
pub fn parse_settings_json(json: &str) -> Result<Settings, ValidationError> {
    let wire: WireSettings =
        serde_json::from_str(json).map_err(|e| ValidationError::Schema(e.to_string()))?;
    Settings::try_from(wire)
}
