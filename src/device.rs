//! Device profiles
//!
//! Screen geometry for every supported phone, loaded once into an immutable
//! [`DeviceTable`] and shared by every render path. The built-in table is
//! compiled in from `data/devices.csv`; operators can point the server at a
//! replacement CSV with the same columns.

use crate::error::DeviceTableError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

const BUILTIN_DEVICES: &str = include_str!("../data/devices.csv");

/// Identifier used when a requested device is unknown
pub const DEFAULT_FALLBACK_DEVICE: &str = "iphone-16-pro";

/// Native screen geometry of one phone model, in pixels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Status bar plus Dynamic Island or notch
    pub safe_area_top: u32,
    /// Home indicator
    pub safe_area_bottom: u32,
    /// Lock screen clock and date, measured from the top edge
    pub clock_height: u32,
    pub has_dynamic_island: bool,
    pub has_notch: bool,
}

impl DeviceProfile {
    fn validate(&self) -> Result<(), DeviceTableError> {
        let reason = if self.id.trim().is_empty() {
            Some("empty identifier".to_string())
        } else if self.width == 0 || self.height == 0 {
            Some(format!("non-positive size {}x{}", self.width, self.height))
        } else if self.safe_area_top > self.height || self.safe_area_bottom > self.height {
            Some("safe area exceeds screen height".to_string())
        } else if self.clock_height > self.height {
            Some("clock area exceeds screen height".to_string())
        } else {
            None
        };
        match reason {
            Some(reason) => Err(DeviceTableError::Profile {
                id: self.id.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Immutable lookup from device identifier to profile
#[derive(Debug, Clone)]
pub struct DeviceTable {
    profiles: Vec<DeviceProfile>,
    index: HashMap<String, usize>,
    fallback: usize,
}

impl DeviceTable {
    /// The table compiled into the crate, falling back to `iphone-16-pro`
    pub fn builtin() -> Result<Self, DeviceTableError> {
        Self::from_reader(BUILTIN_DEVICES.as_bytes(), DEFAULT_FALLBACK_DEVICE)
    }

    pub fn from_csv_path(path: &Path, fallback: &str) -> Result<Self, DeviceTableError> {
        let reader = csv::Reader::from_path(path)?;
        Self::from_csv(reader, fallback)
    }

    pub fn from_reader<R: Read>(reader: R, fallback: &str) -> Result<Self, DeviceTableError> {
        Self::from_csv(csv::Reader::from_reader(reader), fallback)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>, fallback: &str) -> Result<Self, DeviceTableError> {
        let mut profiles = Vec::new();
        for record in reader.deserialize() {
            let profile: DeviceProfile = record?;
            profile.validate()?;
            profiles.push(profile);
        }
        Self::new(profiles, fallback)
    }

    pub fn new(profiles: Vec<DeviceProfile>, fallback: &str) -> Result<Self, DeviceTableError> {
        let mut index = HashMap::with_capacity(profiles.len());
        for (i, profile) in profiles.iter().enumerate() {
            profile.validate()?;
            if index.insert(profile.id.clone(), i).is_some() {
                return Err(DeviceTableError::Duplicate(profile.id.clone()));
            }
        }
        let fallback = *index
            .get(fallback)
            .ok_or_else(|| DeviceTableError::MissingFallback(fallback.to_string()))?;
        Ok(DeviceTable {
            profiles,
            index,
            fallback,
        })
    }

    /// Same profiles with a different fallback device
    pub fn with_fallback(self, fallback: &str) -> Result<Self, DeviceTableError> {
        Self::new(self.profiles, fallback)
    }

    pub fn get(&self, id: &str) -> Option<&DeviceProfile> {
        self.index.get(id).map(|&i| &self.profiles[i])
    }

    /// Look up `id`, substituting the fallback profile when it is unknown
    pub fn resolve(&self, id: &str) -> &DeviceProfile {
        self.get(id).unwrap_or_else(|| self.fallback())
    }

    pub fn fallback(&self) -> &DeviceProfile {
        &self.profiles[self.fallback]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_loads() {
        let table = DeviceTable::builtin().unwrap();
        assert_eq!(table.len(), 18);
        assert_eq!(table.fallback().id, "iphone-16-pro");
        let se = table.get("iphone-se").unwrap();
        assert_eq!((se.width, se.height), (750, 1334));
        assert!(!se.has_dynamic_island && !se.has_notch);
        let thirteen = table.get("iphone-13").unwrap();
        assert_eq!(thirteen.name, "iPhone 13/12");
        assert!(thirteen.has_notch);
    }

    #[test]
    fn test_unknown_device_resolves_to_fallback() {
        let table = DeviceTable::builtin().unwrap();
        assert_eq!(table.resolve("nokia-3310").id, "iphone-16-pro");
        assert_eq!(table.resolve("iphone-15").id, "iphone-15");
    }

    #[test]
    fn test_with_fallback() {
        let table = DeviceTable::builtin().unwrap().with_fallback("iphone-15-pro").unwrap();
        assert_eq!(table.resolve("").id, "iphone-15-pro");
        assert!(matches!(
            DeviceTable::builtin().unwrap().with_fallback("pixel-9"),
            Err(DeviceTableError::MissingFallback(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_profiles() {
        let csv = "id,name,width,height,safe_area_top,safe_area_bottom,clock_height,has_dynamic_island,has_notch\n\
                   bad,Bad,0,100,10,10,20,false,false\n";
        assert!(matches!(
            DeviceTable::from_reader(csv.as_bytes(), "bad"),
            Err(DeviceTableError::Profile { .. })
        ));

        let csv = "id,name,width,height,safe_area_top,safe_area_bottom,clock_height,has_dynamic_island,has_notch\n\
                   tall,Tall,100,100,200,10,20,false,false\n";
        assert!(DeviceTable::from_reader(csv.as_bytes(), "tall").is_err());
    }

    #[test]
    fn test_rejects_duplicates_and_malformed_rows() {
        let dup = "id,name,width,height,safe_area_top,safe_area_bottom,clock_height,has_dynamic_island,has_notch\n\
                   a,A,100,200,10,10,20,false,false\n\
                   a,A,100,200,10,10,20,false,false\n";
        assert!(matches!(
            DeviceTable::from_reader(dup.as_bytes(), "a"),
            Err(DeviceTableError::Duplicate(_))
        ));

        let malformed = "id,name,width,height,safe_area_top,safe_area_bottom,clock_height,has_dynamic_island,has_notch\n\
                         a,A,wide,200,10,10,20,false,false\n";
        assert!(matches!(
            DeviceTable::from_reader(malformed.as_bytes(), "a"),
            Err(DeviceTableError::Csv(_))
        ));
    }
}
