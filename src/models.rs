//! Data models for moons, ores, moon materials and Metenox structures

use std::collections::BTreeMap;

use crate::depletion::PingState;
use crate::error::{HarvestError, Result};

/// EVE type id of an item (ore, moon material, fuel block...)
pub type TypeId = i64;
pub type MoonId = i64;
pub type StructureId = i64;
pub type CorporationId = i64;

/// Fraction of every ore type found on a moon by a survey.
///
/// Ordered by type id so that every walk over a composition, and the float
/// sums built from it, happen in the same order.
pub type OreComposition = BTreeMap<TypeId, f64>;

/// Units of each moon material harvested in one hour. Never holds zeroes.
pub type HourlyHarvest = BTreeMap<TypeId, u64>;

/// Units of each moon material sitting in a structure's moon material bay
pub type StoredMaterials = BTreeMap<TypeId, u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialCategory {
    MoonMaterial,
    FuelBlock,
    MagmaticGas,
}

impl MaterialCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialCategory::MoonMaterial => "moon_material",
            MaterialCategory::FuelBlock => "fuel_block",
            MaterialCategory::MagmaticGas => "magmatic_gas",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "moon_material" => Some(MaterialCategory::MoonMaterial),
            "fuel_block" => Some(MaterialCategory::FuelBlock),
            "magmatic_gas" => Some(MaterialCategory::MagmaticGas),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialType {
    pub type_id: TypeId,
    pub name: String,
    pub volume_m3: f64,
    pub category: MaterialCategory,
}

/// One reprocessing output of an ore: `quantity` units per portion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OreMaterial {
    pub material_type_id: TypeId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OreType {
    pub type_id: TypeId,
    pub name: String,
    pub volume_m3: f64,
    /// Ore units consumed by one reprocessing batch
    pub portion_size: u32,
    pub materials: Vec<OreMaterial>,
}

impl OreType {
    /// Number of reprocessing portions held in `volume_m3` of this ore
    pub fn portions_in_volume(&self, volume_m3: f64) -> f64 {
        volume_m3 / self.volume_m3 / f64::from(self.portion_size)
    }

    pub fn is_well_formed(&self) -> bool {
        self.volume_m3.is_finite() && self.volume_m3 > 0.0 && self.portion_size > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Moon {
    pub moon_id: MoonId,
    pub name: String,
    pub solar_system_id: Option<i64>,
    /// Monthly value of the hourly harvest in ISK
    pub value: f64,
}

/// Corporation owning Metenoxes, carrying the low stock alert thresholds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingCorporation {
    pub corporation_id: CorporationId,
    pub name: String,
    pub ping_on_remaining_fuel_days: u64,
    pub ping_on_remaining_magmatic_days: u64,
}

/// A Metenox moon drill anchored on a moon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    pub structure_id: StructureId,
    pub name: String,
    pub moon_id: MoonId,
    pub corporation_id: CorporationId,
    pub fuel_blocks: u64,
    pub magmatic_gases: u64,
    pub fuel_state: PingState,
    pub magmatic_state: PingState,
}

impl Structure {
    /// Solar system name, taken from the structure name (`"System - Name"`)
    pub fn system_name(&self) -> &str {
        self.name
            .split_once(" - ")
            .map_or(self.name.as_str(), |(system, _)| system)
    }
}

pub const MAX_TAG_NAME_LEN: usize = 20;

/// Label sorting structures. Default tags go on every new structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub is_default: bool,
}

impl Tag {
    pub fn validate(&self) -> Result<()> {
        let len = self.name.chars().count();
        if self.name.trim().is_empty() || len > MAX_TAG_NAME_LEN {
            return Err(HarvestError::InvalidTag(self.name.clone()));
        }
        Ok(())
    }
}
