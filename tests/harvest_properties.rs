use std::collections::BTreeMap;

use metenox_calculator::catalog::{self, ConversionTable};
use metenox_calculator::harvest::{allocate_hourly_harvest, capacity_hours};
use metenox_calculator::models::OreComposition;
use proptest::prelude::*;
use proptest::test_runner::Config;

const ORE_IDS: [i64; 21] = [
    45490, 45491, 45492, 45493, 45494, 45495, 45496, 45497, 45498, 45499, 45500, 45501, 45502,
    45503, 45504, 45506, 45510, 45511, 45512, 45513, 99999,
];

fn table() -> ConversionTable {
    ConversionTable::new(catalog::moon_ores())
}

fn composition() -> impl Strategy<Value = OreComposition> {
    prop::collection::btree_map(prop::sample::select(ORE_IDS.to_vec()), 0.0_f64..=1.0, 0..5)
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn allocation_is_deterministic(
        composition in composition(),
        volume in 0.0_f64..100_000.0,
        reprocess_yield in 0.0_f64..=1.0,
    ) {
        let table = table();
        let first = allocate_hourly_harvest(&composition, volume, reprocess_yield, &table).unwrap();
        let second = allocate_hourly_harvest(&composition, volume, reprocess_yield, &table).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn harvest_is_sparse(
        composition in composition(),
        volume in 0.0_f64..100_000.0,
        reprocess_yield in 0.0_f64..=1.0,
    ) {
        let allocation = allocate_hourly_harvest(&composition, volume, reprocess_yield, &table()).unwrap();
        prop_assert!(allocation.harvest.values().all(|&amount| amount > 0));
    }

    #[test]
    fn empty_composition_is_empty_harvest(
        volume in -1_000.0_f64..100_000.0,
        reprocess_yield in -1.0_f64..=1.0,
    ) {
        let allocation =
            allocate_hourly_harvest(&OreComposition::new(), volume, reprocess_yield, &table()).unwrap();
        prop_assert!(allocation.harvest.is_empty());
        prop_assert!(allocation.warnings.is_empty());
    }

    #[test]
    fn more_volume_never_harvests_less(
        composition in composition(),
        volume in 0.0_f64..50_000.0,
        extra in 0.0_f64..50_000.0,
        reprocess_yield in 0.0_f64..=1.0,
    ) {
        let table = table();
        let small = allocate_hourly_harvest(&composition, volume, reprocess_yield, &table).unwrap();
        let large = allocate_hourly_harvest(&composition, volume + extra, reprocess_yield, &table).unwrap();
        for (type_id, amount) in &small.harvest {
            prop_assert!(large.harvest.get(type_id).copied().unwrap_or(0) >= *amount);
        }
    }

    #[test]
    fn floored_total_never_exceeds_unfloored_total(
        composition in composition(),
        reprocess_yield in 0.0_f64..=1.0,
    ) {
        let table = table();
        let allocation = allocate_hourly_harvest(&composition, 30_000.0, reprocess_yield, &table).unwrap();

        let mut unfloored: BTreeMap<i64, f64> = BTreeMap::new();
        for (&ore_type_id, &fraction) in &composition {
            if let Some(ore) = table.get(ore_type_id) {
                let portions = ore.portions_in_volume(30_000.0 * fraction.min(1.0));
                for output in &ore.materials {
                    *unfloored.entry(output.material_type_id).or_default() +=
                        f64::from(output.quantity) * portions * reprocess_yield;
                }
            }
        }
        let total: u64 = allocation.harvest.values().sum();
        let bound: f64 = unfloored.values().sum();
        prop_assert!(total as f64 <= bound + 1e-6);
    }

    #[test]
    fn unknown_ores_only_warn(fraction in 0.0_f64..=1.0) {
        let composition: OreComposition = [(99999, fraction)].into_iter().collect();
        let allocation = allocate_hourly_harvest(&composition, 30_000.0, 0.4, &table()).unwrap();
        prop_assert!(allocation.harvest.is_empty());
        prop_assert_eq!(allocation.warnings.len(), 1);
    }

    #[test]
    fn capacity_covers_the_bay(capacity in 1.0_f64..1_000_000.0, hourly in 0.01_f64..100_000.0) {
        let hours = capacity_hours(capacity, hourly);
        let tolerance = 1e-6 * capacity;
        prop_assert!(hours as f64 * hourly >= capacity - tolerance);
        prop_assert!((hours.saturating_sub(1)) as f64 * hourly < capacity + tolerance);
    }
}
