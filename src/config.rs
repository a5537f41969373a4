//! Deployment-wide constants of a Metenox
//!
//! These values come from the game and should not need editing, but every one
//! of them can be overridden from the command line or the environment.

use clap::Args;

pub const DEFAULT_HOURLY_HARVEST_VOLUME: f64 = 30_000.0;
pub const DEFAULT_HARVEST_REPROCESS_YIELD: f64 = 0.40;
pub const DEFAULT_MOON_MATERIAL_BAY_CAPACITY: f64 = 500_000.0;
pub const DEFAULT_FUEL_BLOCKS_PER_HOUR: u64 = 5;
pub const DEFAULT_MAGMATIC_GASES_PER_HOUR: u64 = 110;

#[derive(Debug, Clone, Copy, PartialEq, Args)]
pub struct HarvestSettings {
    /// Volume in m3 harvested by a Metenox every hour
    #[arg(
        long,
        env = "METENOX_HOURLY_HARVEST_VOLUME",
        default_value_t = DEFAULT_HOURLY_HARVEST_VOLUME
    )]
    pub hourly_harvest_volume: f64,

    /// Yield at which the Metenox reprocesses the harvested ore
    #[arg(
        long,
        env = "METENOX_HARVEST_REPROCESS_YIELD",
        default_value_t = DEFAULT_HARVEST_REPROCESS_YIELD
    )]
    pub reprocess_yield: f64,

    /// Volume in m3 of the moon material output bay
    #[arg(
        long,
        env = "METENOX_MOON_MATERIAL_BAY_CAPACITY",
        default_value_t = DEFAULT_MOON_MATERIAL_BAY_CAPACITY
    )]
    pub bay_capacity: f64,

    /// Fuel blocks consumed every hour
    #[arg(
        long,
        env = "METENOX_FUEL_BLOCKS_PER_HOUR",
        default_value_t = DEFAULT_FUEL_BLOCKS_PER_HOUR
    )]
    pub fuel_blocks_per_hour: u64,

    /// Magmatic gases consumed every hour
    #[arg(
        long,
        env = "METENOX_MAGMATIC_GASES_PER_HOUR",
        default_value_t = DEFAULT_MAGMATIC_GASES_PER_HOUR
    )]
    pub magmatic_gases_per_hour: u64,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            hourly_harvest_volume: DEFAULT_HOURLY_HARVEST_VOLUME,
            reprocess_yield: DEFAULT_HARVEST_REPROCESS_YIELD,
            bay_capacity: DEFAULT_MOON_MATERIAL_BAY_CAPACITY,
            fuel_blocks_per_hour: DEFAULT_FUEL_BLOCKS_PER_HOUR,
            magmatic_gases_per_hour: DEFAULT_MAGMATIC_GASES_PER_HOUR,
        }
    }
}
