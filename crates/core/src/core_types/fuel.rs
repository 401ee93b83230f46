//! Agricultural residue fuel catalog
//!
//! Each crop type carries the two numbers the emission estimate needs: the
//! residue fuel load left on the field and the PM2.5 emission factor of that
//! residue when burned in the open.
//!
//! # References
//!
//! - U.S. EPA (1992). AP-42 Fifth Edition, §2.5 "Open Burning", Table 2.5-5
//!   (emission factors and fuel loading for agricultural refuse burning).
//! - Jenkins, B.M. et al. (1996). "Atmospheric pollutant emission factors from
//!   open burning of agricultural and forest biomass by wind tunnel
//!   simulations." CARB Report A932-126.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Residue burning properties of a crop type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidueProperties {
    /// Residue fuel load, metric tonnes per acre
    pub fuel_load_t_per_acre: f64,
    /// PM2.5 emitted per kilogram of residue burned, grams
    pub pm25_g_per_kg: f64,
}

/// Crop (residue fuel) types accepted for open burning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropType {
    /// Wheat stubble
    Wheat,
    /// Rice straw
    Rice,
    /// Corn stover
    Corn,
    /// Barley stubble
    Barley,
    /// Oat stubble
    Oats,
    /// Sugarcane leaf trash (pre-harvest burn)
    Sugarcane,
    /// Cotton stalks
    Cotton,
    /// Grass seed field residue (bluegrass, ryegrass)
    GrassSeed,
    /// Orchard and vineyard prunings
    OrchardPrunings,
}

impl CropType {
    /// Every catalogued crop, in declaration order
    pub const ALL: [CropType; 9] = [
        CropType::Wheat,
        CropType::Rice,
        CropType::Corn,
        CropType::Barley,
        CropType::Oats,
        CropType::Sugarcane,
        CropType::Cotton,
        CropType::GrassSeed,
        CropType::OrchardPrunings,
    ];

    /// Residue properties for this crop
    #[must_use]
    pub const fn residue(self) -> ResidueProperties {
        // AP-42 lists fuel loading in short tons/acre and PM in lb/ton;
        // values here are converted to tonnes/acre and g/kg.
        let (fuel_load_t_per_acre, pm25_g_per_kg) = match self {
            CropType::Wheat => (1.7, 5.5),
            CropType::Rice => (2.7, 4.0),
            CropType::Corn => (3.6, 3.5),
            CropType::Barley => (1.6, 5.5),
            CropType::Oats => (1.4, 10.5),
            CropType::Sugarcane => (3.2, 3.9),
            CropType::Cotton => (1.4, 3.2),
            CropType::GrassSeed => (1.0, 8.0),
            CropType::OrchardPrunings => (2.2, 3.0),
        };
        ResidueProperties {
            fuel_load_t_per_acre,
            pm25_g_per_kg,
        }
    }

    /// Grams of PM2.5 released by burning one acre of this residue
    #[must_use]
    pub fn pm25_grams_per_acre(self) -> f64 {
        let r = self.residue();
        r.fuel_load_t_per_acre * 1000.0 * r.pm25_g_per_kg
    }

    /// Canonical snake_case name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CropType::Wheat => "wheat",
            CropType::Rice => "rice",
            CropType::Corn => "corn",
            CropType::Barley => "barley",
            CropType::Oats => "oats",
            CropType::Sugarcane => "sugarcane",
            CropType::Cotton => "cotton",
            CropType::GrassSeed => "grass_seed",
            CropType::OrchardPrunings => "orchard_prunings",
        }
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CropType {
    type Err = DomainError;

    /// Parse free-form crop names as submitted by growers.
    ///
    /// Case, separators and residue qualifiers ("stubble", "straw",
    /// "stover", "residue") are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .replace(['-', ' '], "_");
        let base = ["_stubble", "_straw", "_stover", "_residue", "_stalks"]
            .iter()
            .fold(normalized.as_str(), |acc, suffix| {
                acc.strip_suffix(suffix).unwrap_or(acc)
            });

        let crop = match base {
            "wheat" => CropType::Wheat,
            "rice" => CropType::Rice,
            "corn" | "maize" => CropType::Corn,
            "barley" => CropType::Barley,
            "oat" | "oats" => CropType::Oats,
            "sugarcane" | "sugar_cane" => CropType::Sugarcane,
            "cotton" => CropType::Cotton,
            "grass_seed" | "grassseed" | "bluegrass" | "ryegrass" => CropType::GrassSeed,
            "orchard" | "orchard_prunings" | "prunings" | "vineyard" => {
                CropType::OrchardPrunings
            }
            _ => {
                return Err(DomainError::invalid(
                    "crop_type",
                    format!("unknown crop/fuel type '{s}'"),
                ))
            }
        };
        Ok(crop)
    }
}
