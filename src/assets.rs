//! Structure asset listings: fuel bay and moon material bay content

use crate::catalog::{FUEL_BLOCK_TYPE_IDS, MAGMATIC_GAS_TYPE_ID};
use crate::error::{HarvestError, Result};
use crate::models::{StoredMaterials, TypeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationFlag {
    StructureFuel,
    MoonMaterialBay,
    Other(String),
}

impl From<&str> for LocationFlag {
    fn from(flag: &str) -> Self {
        match flag {
            "StructureFuel" => LocationFlag::StructureFuel,
            "MoonMaterialBay" => LocationFlag::MoonMaterialBay,
            other => LocationFlag::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub type_id: TypeId,
    pub location_flag: LocationFlag,
    pub quantity: u64,
}

impl AssetEntry {
    /// Parse a `<type id> <location flag> <quantity>` line
    pub fn parse_line(line: &str) -> Result<Self> {
        let invalid = |reason: &str| HarvestError::InvalidAsset {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = line.split_whitespace();
        let (Some(type_id), Some(flag), Some(quantity), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected type id, location flag and quantity"));
        };

        Ok(AssetEntry {
            type_id: type_id.parse().map_err(|_| invalid("type id is not an integer"))?,
            location_flag: LocationFlag::from(flag),
            quantity: quantity
                .parse()
                .map_err(|_| invalid("quantity is not a non-negative integer"))?,
        })
    }
}

/// Parse a whole asset listing, skipping blank lines and `#` comments
pub fn parse_asset_listing(text: &str) -> Result<Vec<AssetEntry>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(AssetEntry::parse_line)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureInventory {
    /// All four fuel block types summed together
    pub fuel_blocks: u64,
    pub magmatic_gases: u64,
    pub moon_materials: StoredMaterials,
}

pub fn classify_assets(assets: &[AssetEntry]) -> StructureInventory {
    let mut inventory = StructureInventory::default();

    for asset in assets {
        match asset.location_flag {
            LocationFlag::StructureFuel if asset.type_id == MAGMATIC_GAS_TYPE_ID => {
                inventory.magmatic_gases += asset.quantity;
            }
            LocationFlag::StructureFuel if FUEL_BLOCK_TYPE_IDS.contains(&asset.type_id) => {
                inventory.fuel_blocks += asset.quantity;
            }
            LocationFlag::MoonMaterialBay => {
                *inventory.moon_materials.entry(asset.type_id).or_default() += asset.quantity;
            }
            _ => {}
        }
    }

    inventory
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_fuel_reagent_and_bay() {
        let listing = "\
            # type_id flag quantity
            4051 StructureFuel 300
            4312 StructureFuel 200
            81143 StructureFuel 4000
            16634 MoonMaterialBay 50
            16633 MoonMaterialBay 200
            16634 MoonMaterialBay 10

            34 Cargo 1000
            16633 StructureFuel 5
        ";
        let assets = parse_asset_listing(listing).unwrap();
        assert_eq!(assets.len(), 8);

        let inventory = classify_assets(&assets);
        assert_eq!(inventory.fuel_blocks, 500);
        assert_eq!(inventory.magmatic_gases, 4000);
        assert_eq!(inventory.moon_materials.get(&16634), Some(&60));
        assert_eq!(inventory.moon_materials.get(&16633), Some(&200));
        assert_eq!(inventory.moon_materials.len(), 2);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(matches!(
            AssetEntry::parse_line("4051 StructureFuel"),
            Err(HarvestError::InvalidAsset { .. })
        ));
        assert!(matches!(
            AssetEntry::parse_line("4051 StructureFuel -3"),
            Err(HarvestError::InvalidAsset { .. })
        ));
        assert!(matches!(
            AssetEntry::parse_line("abc StructureFuel 3"),
            Err(HarvestError::InvalidAsset { .. })
        ));
    }

    #[test]
    fn unknown_flags_are_kept_as_other() {
        let entry = AssetEntry::parse_line("34 Hangar 12").unwrap();
        assert_eq!(entry.location_flag, LocationFlag::Other("Hangar".to_string()));
    }
}
