//! Static game data: which moon materials every ore reprocesses into
//!
//! The tables are owned by the game. [`moon_ores`] and [`materials`] carry the
//! current moon ore data so the calculator works without an external dump.

use std::collections::HashMap;

use crate::error::{HarvestError, Result};
use crate::models::{MaterialCategory, MaterialType, OreMaterial, OreType, TypeId};

pub const MAGMATIC_GAS_TYPE_ID: TypeId = 81143;
pub const FUEL_BLOCK_TYPE_IDS: [TypeId; 4] = [4051, 4246, 4247, 4312];

const MOON_ORE_VOLUME_M3: f64 = 10.0;
const MOON_ORE_PORTION_SIZE: u32 = 100;
const MOON_MATERIAL_VOLUME_M3: f64 = 0.05;

/// Ore type id → ore reprocessing data
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    ores: HashMap<TypeId, OreType>,
}

impl ConversionTable {
    pub fn new(ores: impl IntoIterator<Item = OreType>) -> Self {
        Self {
            ores: ores.into_iter().map(|ore| (ore.type_id, ore)).collect(),
        }
    }

    pub fn get(&self, ore_type_id: TypeId) -> Option<&OreType> {
        self.ores.get(&ore_type_id)
    }

    pub fn len(&self) -> usize {
        self.ores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ores.is_empty()
    }
}

/// Material type id → material data
#[derive(Debug, Clone, Default)]
pub struct MaterialCatalog {
    materials: HashMap<TypeId, MaterialType>,
}

impl MaterialCatalog {
    pub fn new(materials: impl IntoIterator<Item = MaterialType>) -> Self {
        Self {
            materials: materials.into_iter().map(|m| (m.type_id, m)).collect(),
        }
    }

    pub fn get(&self, type_id: TypeId) -> Option<&MaterialType> {
        self.materials.get(&type_id)
    }

    /// Unit volume of a material. Unknown materials are a data error.
    pub fn volume_of(&self, type_id: TypeId) -> Result<f64> {
        self.get(type_id)
            .map(|material| material.volume_m3)
            .ok_or(HarvestError::UnknownMaterial(type_id))
    }

    /// Display name, falling back to the type id for unknown materials
    pub fn name_of(&self, type_id: TypeId) -> String {
        self.get(type_id)
            .map_or_else(|| format!("Type {}", type_id), |material| material.name.clone())
    }

    pub fn type_ids(&self, category: MaterialCategory) -> Vec<TypeId> {
        let mut ids: Vec<_> = self
            .materials
            .values()
            .filter(|m| m.category == category)
            .map(|m| m.type_id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

fn moon_ore(type_id: TypeId, name: &str, materials: &[(TypeId, u32)]) -> OreType {
    OreType {
        type_id,
        name: name.to_string(),
        volume_m3: MOON_ORE_VOLUME_M3,
        portion_size: MOON_ORE_PORTION_SIZE,
        materials: materials
            .iter()
            .map(|&(material_type_id, quantity)| OreMaterial {
                material_type_id,
                quantity,
            })
            .collect(),
    }
}

/// Moon material outputs of the base moon ores, per 100 units of ore
pub fn moon_ores() -> Vec<OreType> {
    vec![
        // R4
        moon_ore(45490, "Zeolites", &[(16634, 65)]),
        moon_ore(45491, "Sylvite", &[(16635, 65)]),
        moon_ore(45492, "Bitumens", &[(16633, 65)]),
        moon_ore(45493, "Coesite", &[(16636, 65)]),
        // R8
        moon_ore(45494, "Cobaltite", &[(16640, 40)]),
        moon_ore(45495, "Euxenite", &[(16639, 40)]),
        moon_ore(45496, "Titanite", &[(16638, 40)]),
        moon_ore(45497, "Scheelite", &[(16637, 40)]),
        // R16
        moon_ore(45498, "Otavite", &[(16643, 40), (16634, 10)]),
        moon_ore(45499, "Sperrylite", &[(16644, 40), (16635, 10)]),
        moon_ore(45500, "Vanadinite", &[(16642, 40), (16636, 10)]),
        moon_ore(45501, "Chromite", &[(16641, 40), (16633, 10)]),
        // R32
        moon_ore(45502, "Carnotite", &[(16649, 50), (16640, 10), (16634, 15)]),
        moon_ore(45503, "Zircon", &[(16648, 50), (16638, 10), (16636, 15)]),
        moon_ore(45504, "Pollucite", &[(16647, 50), (16639, 10), (16633, 15)]),
        moon_ore(45506, "Cinnabar", &[(16646, 50), (16637, 10), (16635, 15)]),
        // R64
        moon_ore(45510, "Xenotime", &[(16650, 22), (16642, 10), (16640, 20), (16634, 20)]),
        moon_ore(45511, "Monazite", &[(16651, 22), (16641, 10), (16637, 20), (16635, 20)]),
        moon_ore(45512, "Loparite", &[(16652, 22), (16644, 10), (16639, 20), (16633, 20)]),
        moon_ore(45513, "Ytterbite", &[(16653, 22), (16643, 10), (16638, 20), (16636, 20)]),
    ]
}

fn material(type_id: TypeId, name: &str, volume_m3: f64, category: MaterialCategory) -> MaterialType {
    MaterialType {
        type_id,
        name: name.to_string(),
        volume_m3,
        category,
    }
}

/// Moon materials, fuel blocks and magmatic gas
pub fn materials() -> Vec<MaterialType> {
    let moon_materials = [
        (16633, "Hydrocarbons"),
        (16634, "Atmospheric Gases"),
        (16635, "Evaporite Deposits"),
        (16636, "Silicates"),
        (16637, "Tungsten"),
        (16638, "Titanium"),
        (16639, "Scandium"),
        (16640, "Cobalt"),
        (16641, "Chromium"),
        (16642, "Vanadium"),
        (16643, "Cadmium"),
        (16644, "Platinum"),
        (16646, "Mercury"),
        (16647, "Caesium"),
        (16648, "Hafnium"),
        (16649, "Technetium"),
        (16650, "Dysprosium"),
        (16651, "Neodymium"),
        (16652, "Promethium"),
        (16653, "Thulium"),
    ];

    let mut all: Vec<MaterialType> = moon_materials
        .iter()
        .map(|&(id, name)| material(id, name, MOON_MATERIAL_VOLUME_M3, MaterialCategory::MoonMaterial))
        .collect();

    all.extend([
        material(4051, "Caldari Fuel Block", 5.0, MaterialCategory::FuelBlock),
        material(4246, "Minmatar Fuel Block", 5.0, MaterialCategory::FuelBlock),
        material(4247, "Amarr Fuel Block", 5.0, MaterialCategory::FuelBlock),
        material(4312, "Gallente Fuel Block", 5.0, MaterialCategory::FuelBlock),
        material(MAGMATIC_GAS_TYPE_ID, "Magmatic Gas", 1.0, MaterialCategory::MagmaticGas),
    ]);
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ore_output_is_a_known_moon_material() {
        let catalog = MaterialCatalog::new(materials());
        for ore in moon_ores() {
            assert!(ore.is_well_formed(), "{} is malformed", ore.name);
            for output in &ore.materials {
                let material = catalog
                    .get(output.material_type_id)
                    .unwrap_or_else(|| panic!("{} yields unknown type", ore.name));
                assert_eq!(material.category, MaterialCategory::MoonMaterial);
            }
        }
    }

    #[test]
    fn fuel_block_ids_match_catalog() {
        let catalog = MaterialCatalog::new(materials());
        assert_eq!(catalog.type_ids(MaterialCategory::FuelBlock), FUEL_BLOCK_TYPE_IDS.to_vec());
        assert_eq!(catalog.type_ids(MaterialCategory::MagmaticGas), vec![MAGMATIC_GAS_TYPE_ID]);
    }

    #[test]
    fn unknown_material_volume_is_an_error() {
        let catalog = MaterialCatalog::new(materials());
        assert_eq!(catalog.volume_of(16634), Ok(0.05));
        assert_eq!(catalog.volume_of(1), Err(HarvestError::UnknownMaterial(1)));
        assert_eq!(catalog.name_of(1), "Type 1");
    }
}
