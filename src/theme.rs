//! Color palettes
//!
//! A palette is four colors: the background fill, the color of weeks already
//! lived, the color of future weeks, and the axis text color. Six presets ship
//! with the crate; a custom palette can be supplied through settings.

use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::char,
    combinator::{all_consuming, map, map_res},
    sequence::{preceded, tuple},
    IResult,
};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// An opaque sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` or `#rgb` (case-insensitive)
    pub fn parse(input: &str) -> Option<Rgb> {
        all_consuming(hex_color)(input).ok().map(|(_, rgb)| rgb)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    pub fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

fn hex_pair(input: &str) -> IResult<&str, u8> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        |s: &str| u8::from_str_radix(s, 16),
    )(input)
}

fn hex_single(input: &str) -> IResult<&str, u8> {
    map_res(
        take_while_m_n(1, 1, |c: char| c.is_ascii_hexdigit()),
        |s: &str| u8::from_str_radix(s, 16).map(|v| v * 17),
    )(input)
}

fn hex_color(input: &str) -> IResult<&str, Rgb> {
    preceded(
        char('#'),
        alt((
            map(tuple((hex_pair, hex_pair, hex_pair)), |(r, g, b)| Rgb(r, g, b)),
            map(tuple((hex_single, hex_single, hex_single)), |(r, g, b)| {
                Rgb(r, g, b)
            }),
        )),
    )(input)
}

/// The four colors a wallpaper is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeColors {
    pub background: Rgb,
    pub lived: Rgb,
    pub future: Rgb,
    pub text: Rgb,
}

/// Built-in palettes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetTheme {
    #[default]
    Light,
    Dark,
    Midnight,
    Sepia,
    Ocean,
    Forest,
}

impl PresetTheme {
    pub const ALL: [PresetTheme; 6] = [
        PresetTheme::Light,
        PresetTheme::Dark,
        PresetTheme::Midnight,
        PresetTheme::Sepia,
        PresetTheme::Ocean,
        PresetTheme::Forest,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PresetTheme::Light => "light",
            PresetTheme::Dark => "dark",
            PresetTheme::Midnight => "midnight",
            PresetTheme::Sepia => "sepia",
            PresetTheme::Ocean => "ocean",
            PresetTheme::Forest => "forest",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PresetTheme::Light => "Light",
            PresetTheme::Dark => "Dark",
            PresetTheme::Midnight => "Midnight",
            PresetTheme::Sepia => "Sepia",
            PresetTheme::Ocean => "Ocean",
            PresetTheme::Forest => "Forest",
        }
    }

    pub fn colors(self) -> ThemeColors {
        match self {
            PresetTheme::Light => ThemeColors {
                background: Rgb(0xf5, 0xf2, 0xed),
                lived: Rgb(0xd3, 0x52, 0x33),
                future: Rgb(0xd9, 0xd4, 0xcc),
                text: Rgb(0x14, 0x14, 0x14),
            },
            PresetTheme::Dark => ThemeColors {
                background: Rgb(0x0a, 0x0c, 0x10),
                lived: Rgb(0xc9, 0xa2, 0x4d),
                future: Rgb(0x1e, 0x21, 0x28),
                text: Rgb(0xf2, 0xf0, 0xeb),
            },
            PresetTheme::Midnight => ThemeColors {
                background: Rgb(0x0f, 0x0f, 0x1a),
                lived: Rgb(0x63, 0x66, 0xf1),
                future: Rgb(0x1e, 0x1e, 0x2e),
                text: Rgb(0xe2, 0xe8, 0xf0),
            },
            PresetTheme::Sepia => ThemeColors {
                background: Rgb(0xf4, 0xec, 0xd8),
                lived: Rgb(0x8b, 0x45, 0x13),
                future: Rgb(0xd4, 0xc4, 0xa8),
                text: Rgb(0x3d, 0x29, 0x14),
            },
            PresetTheme::Ocean => ThemeColors {
                background: Rgb(0x0c, 0x19, 0x29),
                lived: Rgb(0x0e, 0xa5, 0xe9),
                future: Rgb(0x1e, 0x3a, 0x5f),
                text: Rgb(0xe0, 0xf2, 0xfe),
            },
            PresetTheme::Forest => ThemeColors {
                background: Rgb(0x0f, 0x1a, 0x0f),
                lived: Rgb(0x22, 0xc5, 0x5e),
                future: Rgb(0x1a, 0x2e, 0x1a),
                text: Rgb(0xdc, 0xfc, 0xe7),
            },
        }
    }

    pub fn from_id(id: &str) -> Option<PresetTheme> {
        PresetTheme::ALL.into_iter().find(|t| t.id() == id)
    }
}

/// Palette selection carried by settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Preset(PresetTheme),
    Custom(ThemeColors),
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Preset(PresetTheme::default())
    }
}

impl Theme {
    pub fn id(&self) -> &'static str {
        match self {
            Theme::Preset(preset) => preset.id(),
            Theme::Custom(_) => "custom",
        }
    }

    /// The palette the renderer should draw with
    pub fn colors(&self) -> ThemeColors {
        match self {
            Theme::Preset(preset) => preset.colors(),
            Theme::Custom(colors) => *colors,
        }
    }
}

/// Entry in the theme listing served over HTTP
#[derive(Debug, Serialize)]
pub struct ThemeInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub colors: ThemeColors,
}

pub fn theme_catalog() -> Vec<ThemeInfo> {
    PresetTheme::ALL
        .into_iter()
        .map(|preset| ThemeInfo {
            id: preset.id(),
            name: preset.name(),
            colors: preset.colors(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(Rgb::parse("#d35233"), Some(Rgb(211, 82, 51)));
        assert_eq!(Rgb::parse("#FFF"), Some(Rgb(255, 255, 255)));
        assert_eq!(Rgb::parse("#0a0C10"), Some(Rgb(10, 12, 16)));
    }

    #[test]
    fn test_parse_hex_color_rejects_malformed() {
        assert_eq!(Rgb::parse("d35233"), None);
        assert_eq!(Rgb::parse("#d3523"), None);
        assert_eq!(Rgb::parse("#d352339"), None);
        assert_eq!(Rgb::parse("#ggg"), None);
        assert_eq!(Rgb::parse("red"), None);
        assert_eq!(Rgb::parse(""), None);
        assert_eq!(Rgb::parse(" #fff"), None);
    }

    #[test]
    fn test_hex_is_lowercase_long_form() {
        assert_eq!(Rgb(255, 0, 171).to_hex(), "#ff00ab");
        assert_eq!(Rgb::parse("#F0A").unwrap().to_hex(), "#ff00aa");
    }

    #[test]
    fn test_preset_ids_round_trip() {
        for preset in PresetTheme::ALL {
            assert_eq!(PresetTheme::from_id(preset.id()), Some(preset));
        }
        assert_eq!(PresetTheme::from_id("custom"), None);
    }

    #[test]
    fn test_custom_theme_colors() {
        let colors = PresetTheme::Ocean.colors();
        let theme = Theme::Custom(colors);
        assert_eq!(theme.id(), "custom");
        assert_eq!(theme.colors(), colors);
    }

    #[test]
    fn test_catalog_lists_presets_only() {
        let catalog = theme_catalog();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog[0].id, "light");
        let json = serde_json::to_value(&catalog[1]).unwrap();
        assert_eq!(json["colors"]["lived"], "#c9a24d");
    }
}
