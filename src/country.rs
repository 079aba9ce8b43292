//! Life expectancy presets by country

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryPreset {
    pub code: &'static str,
    pub name: &'static str,
    pub life_expectancy: u32,
}

const fn preset(code: &'static str, name: &'static str, life_expectancy: u32) -> CountryPreset {
    CountryPreset {
        code,
        name,
        life_expectancy,
    }
}

/// Preselected country
pub const DEFAULT_COUNTRY: &str = "US";

pub const COUNTRIES: [CountryPreset; 20] = [
    preset("US", "United States", 77),
    preset("UK", "United Kingdom", 81),
    preset("CA", "Canada", 82),
    preset("AU", "Australia", 83),
    preset("DE", "Germany", 81),
    preset("FR", "France", 83),
    preset("JP", "Japan", 84),
    preset("IT", "Italy", 83),
    preset("ES", "Spain", 83),
    preset("BR", "Brazil", 76),
    preset("MX", "Mexico", 75),
    preset("IN", "India", 70),
    preset("CN", "China", 78),
    preset("KR", "South Korea", 83),
    preset("SG", "Singapore", 84),
    preset("NL", "Netherlands", 82),
    preset("SE", "Sweden", 83),
    preset("CH", "Switzerland", 84),
    preset("NZ", "New Zealand", 82),
    preset("OTHER", "Other", 73),
];

/// Look up a preset by its code, ignoring case
pub fn find_country(code: &str) -> Option<&'static CountryPreset> {
    COUNTRIES.iter().find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}
