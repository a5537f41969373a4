//! Hourly harvest allocation of a Metenox and bay capacity

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::catalog::{ConversionTable, MaterialCatalog};
use crate::config::HarvestSettings;
use crate::economics::{self, PriceBook};
use crate::error::{HarvestError, Result};
use crate::models::{HourlyHarvest, Moon, OreComposition, TypeId};

/// Absorbs float noise such as `779.9999999` before flooring
const FLOOR_TOLERANCE: f64 = 1e-9;

/// Non-fatal problem met while allocating a harvest
#[derive(Debug, Clone, PartialEq)]
pub enum AllocationWarning {
    /// The ore type is not in the conversion table and was skipped
    MissingOreType { ore_type_id: TypeId, fraction: f64 },
}

impl fmt::Display for AllocationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationWarning::MissingOreType {
                ore_type_id,
                fraction,
            } => write!(
                f,
                "ore type {} ({:.2}%) is not in the conversion table and was skipped",
                ore_type_id,
                fraction * 100.0
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    pub harvest: HourlyHarvest,
    pub warnings: Vec<AllocationWarning>,
}

/// Allocate the integer units of every moon material harvested in one hour.
///
/// Each ore receives `hourly_volume * fraction` of the harvested volume, is
/// split into reprocessing portions and converted to moon materials at
/// `reprocess_yield`. Materials are summed over all ores and only then
/// floored; materials flooring to zero are left out.
///
/// Fractions above 1.0 are clamped. A zero or negative volume or yield means
/// the structure is not operational and yields an empty harvest.
pub fn allocate_hourly_harvest(
    composition: &OreComposition,
    hourly_volume: f64,
    reprocess_yield: f64,
    table: &ConversionTable,
) -> Result<Allocation> {
    if !hourly_volume.is_finite() {
        return Err(HarvestError::InvalidVolume(hourly_volume));
    }
    if !reprocess_yield.is_finite() || reprocess_yield > 1.0 {
        return Err(HarvestError::InvalidYield(reprocess_yield));
    }
    for (&ore_type_id, &fraction) in composition {
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(HarvestError::InvalidFraction {
                ore_type_id,
                fraction,
            });
        }
    }

    let mut allocation = Allocation::default();
    if hourly_volume <= 0.0 || reprocess_yield <= 0.0 {
        return Ok(allocation);
    }

    let mut units: BTreeMap<TypeId, f64> = BTreeMap::new();
    for (&ore_type_id, &fraction) in composition {
        let Some(ore) = table.get(ore_type_id) else {
            warn!(ore_type_id, fraction, "ore type missing from conversion table, skipping");
            allocation.warnings.push(AllocationWarning::MissingOreType {
                ore_type_id,
                fraction,
            });
            continue;
        };
        if !ore.is_well_formed() {
            return Err(HarvestError::InvalidOreType(ore_type_id));
        }

        let portions = ore.portions_in_volume(hourly_volume * fraction.min(1.0));
        for output in &ore.materials {
            *units.entry(output.material_type_id).or_default() +=
                f64::from(output.quantity) * portions * reprocess_yield;
        }
    }

    allocation.harvest = units
        .into_iter()
        .filter_map(|(type_id, amount)| {
            let whole = (amount + FLOOR_TOLERANCE).floor() as u64;
            (whole > 0).then_some((type_id, whole))
        })
        .collect();

    debug!(
        ores = composition.len(),
        materials = allocation.harvest.len(),
        "allocated hourly harvest"
    );
    Ok(allocation)
}

/// Volume in m3 of one hour of harvest
pub fn harvest_volume(harvest: &HourlyHarvest, materials: &MaterialCatalog) -> Result<f64> {
    harvest.iter().try_fold(0.0, |total, (&type_id, &amount)| {
        Ok(total + materials.volume_of(type_id)? * amount as f64)
    })
}

/// Hours of harvest before a bay of `capacity` m3 is full.
///
/// A structure harvesting nothing never fills and reports 0.
pub fn capacity_hours(capacity: f64, hourly_volume: f64) -> u64 {
    if hourly_volume.is_nan() || hourly_volume <= 0.0 || !capacity.is_finite() {
        return 0;
    }
    (capacity / hourly_volume).ceil().max(0.0) as u64
}

/// Format how every ore of a composition contributes to the harvest
pub fn format_breakdown(
    composition: &OreComposition,
    settings: &HarvestSettings,
    table: &ConversionTable,
    materials: &MaterialCatalog,
) -> String {
    let mut output = String::new();

    for (&ore_type_id, &fraction) in composition {
        let Some(ore) = table.get(ore_type_id) else {
            output.push_str(&format!(
                "{:>6.2}% ore type {} (not in conversion table)\n",
                fraction * 100.0,
                ore_type_id
            ));
            continue;
        };

        let volume = settings.hourly_harvest_volume * fraction.min(1.0);
        output.push_str(&format!(
            "{:>6.2}% {} ({:.0} m3/h)\n",
            fraction * 100.0,
            ore.name,
            volume
        ));

        let portions = ore.portions_in_volume(volume);
        for ore_output in &ore.materials {
            output.push_str(&format!(
                "          → {} @ {:.2}/h\n",
                materials.name_of(ore_output.material_type_id),
                f64::from(ore_output.quantity) * portions * settings.reprocess_yield
            ));
        }
    }

    output
}

/// Everything known about the harvest of a moon
#[derive(Debug)]
pub struct HarvestReport {
    pub moon_name: String,
    pub materials: Vec<(String, u64)>,
    pub hourly_volume_m3: f64,
    pub hours_until_full: u64,
    pub monthly_value: f64,
    pub monthly_fuel_cost: f64,
    pub monthly_profit: f64,
}

/// Build the report of a moon from its stored hourly harvest
pub fn build_report(
    moon: &Moon,
    harvest: &HourlyHarvest,
    settings: &HarvestSettings,
    materials: &MaterialCatalog,
    prices: &PriceBook,
) -> Result<HarvestReport> {
    let hourly_volume_m3 = harvest_volume(harvest, materials)?;
    let monthly_value = economics::monthly_value(harvest, prices);
    let monthly_fuel_cost = economics::monthly_fuel_cost(settings, prices);

    let mut material_list: Vec<_> = harvest
        .iter()
        .map(|(&type_id, &amount)| (materials.name_of(type_id), amount))
        .collect();
    material_list.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(HarvestReport {
        moon_name: moon.name.clone(),
        materials: material_list,
        hourly_volume_m3,
        hours_until_full: capacity_hours(settings.bay_capacity, hourly_volume_m3),
        monthly_value,
        monthly_fuel_cost,
        monthly_profit: monthly_value - monthly_fuel_cost,
    })
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Harvest of {} ===", self.moon_name)?;
        writeln!(f)?;

        if self.materials.is_empty() {
            writeln!(f, "No harvest. Has this moon been surveyed?")?;
            return Ok(());
        }

        writeln!(f, "Moon materials per hour:")?;
        for (name, amount) in &self.materials {
            writeln!(f, "  {:<20} {:>6}", name, amount)?;
        }
        writeln!(f)?;

        writeln!(f, "Volume:       {:.2} m3/h", self.hourly_volume_m3)?;
        writeln!(f, "Bay full in:  {} hours", self.hours_until_full)?;
        writeln!(f)?;

        writeln!(f, "Monthly:")?;
        writeln!(f, "  Value:     {:>16.0} ISK", self.monthly_value)?;
        writeln!(f, "  Fuel:      {:>16.0} ISK", self.monthly_fuel_cost)?;
        writeln!(f, "  Profit:    {:>16.0} ISK", self.monthly_profit)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn table() -> ConversionTable {
        ConversionTable::new(catalog::moon_ores())
    }

    fn allocate(composition: &[(TypeId, f64)]) -> Allocation {
        let composition: OreComposition = composition.iter().copied().collect();
        allocate_hourly_harvest(&composition, 30_000.0, 0.40, &table()).expect("valid scan")
    }

    #[test]
    fn r16_moon_reference_harvest() {
        let allocation = allocate(&[
            (45501, 0.303093851),
            (45497, 0.088907719),
            (45499, 0.307283372),
            (45490, 0.300715059),
        ]);

        let expected: HourlyHarvest = [
            (16634, 234),
            (16641, 145),
            (16635, 36),
            (16633, 36),
            (16644, 147),
            (16637, 42),
        ]
        .into_iter()
        .collect();
        assert_eq!(allocation.harvest, expected);
        assert!(allocation.warnings.is_empty());
    }

    #[test]
    fn double_r64_moon_reference_harvest() {
        let allocation = allocate(&[
            (45512, 0.210578531),
            (45497, 0.272598475),
            (45499, 0.296382815),
            (45510, 0.220440164),
        ]);

        let expected: HourlyHarvest = [
            (16634, 52),
            (16640, 52),
            (16650, 58),
            (16635, 35),
            (16633, 50),
            (16644, 167),
            (16652, 55),
            (16639, 50),
            (16637, 130),
            (16642, 26),
        ]
        .into_iter()
        .collect();
        assert_eq!(allocation.harvest, expected);
    }

    #[test]
    fn materials_are_floored_after_aggregation() {
        // Platinum comes from Sperrylite (142.26) and Loparite (25.27)
        let allocation = allocate(&[(45499, 0.296382815), (45512, 0.210578531)]);
        assert_eq!(allocation.harvest[&16644], 167);
    }

    #[test]
    fn empty_composition_gives_empty_harvest() {
        assert_eq!(allocate(&[]), Allocation::default());
    }

    #[test]
    fn full_r4_moon_is_exact() {
        let allocation = allocate(&[(45490, 1.0)]);
        assert_eq!(allocation.harvest.get(&16634), Some(&780));
    }

    #[test]
    fn fraction_above_one_is_clamped() {
        assert_eq!(allocate(&[(45490, 1.0000001)]), allocate(&[(45490, 1.0)]));
    }

    #[test]
    fn trace_amounts_are_not_stored() {
        let allocation = allocate(&[(45490, 0.00001)]);
        assert!(allocation.harvest.is_empty());
    }

    #[test]
    fn unknown_ore_is_skipped_with_warning() {
        let allocation = allocate(&[(45490, 0.5), (99999, 0.5)]);
        assert_eq!(allocation.harvest.get(&16634), Some(&390));
        assert_eq!(
            allocation.warnings,
            vec![AllocationWarning::MissingOreType {
                ore_type_id: 99999,
                fraction: 0.5
            }]
        );
    }

    #[test]
    fn negative_fraction_is_rejected() {
        let composition: OreComposition = [(45490, -0.1)].into_iter().collect();
        let result = allocate_hourly_harvest(&composition, 30_000.0, 0.4, &table());
        assert_eq!(
            result,
            Err(HarvestError::InvalidFraction {
                ore_type_id: 45490,
                fraction: -0.1
            })
        );
    }

    #[test]
    fn idle_structure_harvests_nothing() {
        let composition: OreComposition = [(45490, 1.0)].into_iter().collect();
        let idle = allocate_hourly_harvest(&composition, 0.0, 0.4, &table()).unwrap();
        assert!(idle.harvest.is_empty());
        let no_yield = allocate_hourly_harvest(&composition, 30_000.0, 0.0, &table()).unwrap();
        assert!(no_yield.harvest.is_empty());
    }

    #[test]
    fn yield_above_one_is_rejected() {
        let result = allocate_hourly_harvest(&OreComposition::new(), 30_000.0, 1.5, &table());
        assert_eq!(result, Err(HarvestError::InvalidYield(1.5)));
    }

    #[test]
    fn capacity_hours_boundaries() {
        assert_eq!(capacity_hours(500_000.0, 0.0), 0);
        assert_eq!(capacity_hours(30_000.0, 30_000.0), 1);
        assert_eq!(capacity_hours(30_001.0, 30_000.0), 2);
    }

    #[test]
    fn harvest_volume_uses_material_volumes() {
        let materials = MaterialCatalog::new(catalog::materials());
        let harvest: HourlyHarvest = [(16634, 50), (16633, 200)].into_iter().collect();
        let volume = harvest_volume(&harvest, &materials).unwrap();
        assert!((volume - 12.5).abs() < 1e-9);

        let unknown: HourlyHarvest = [(1, 3)].into_iter().collect();
        assert_eq!(
            harvest_volume(&unknown, &materials),
            Err(HarvestError::UnknownMaterial(1))
        );
    }

    #[test]
    fn report_of_unsurveyed_moon() {
        let moon = Moon {
            moon_id: 40178441,
            name: "Jita IV - 4".to_string(),
            solar_system_id: None,
            value: 0.0,
        };
        let report = build_report(
            &moon,
            &HourlyHarvest::new(),
            &HarvestSettings::default(),
            &MaterialCatalog::new(catalog::materials()),
            &PriceBook::default(),
        )
        .unwrap();
        assert_eq!(report.hours_until_full, 0);
        assert!(report.to_string().contains("No harvest"));
    }

    #[test]
    fn breakdown_lists_every_ore() {
        let composition: OreComposition = [(45490, 0.5), (99999, 0.5)].into_iter().collect();
        let text = format_breakdown(
            &composition,
            &HarvestSettings::default(),
            &table(),
            &MaterialCatalog::new(catalog::materials()),
        );
        assert!(text.contains("Zeolites"));
        assert!(text.contains("Atmospheric Gases"));
        assert!(text.contains("ore type 99999"));
    }
}
