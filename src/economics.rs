//! Prices, harvest value and running costs of a Metenox

use std::collections::HashMap;
use std::fmt;

use crate::catalog::{FUEL_BLOCK_TYPE_IDS, MAGMATIC_GAS_TYPE_ID, MaterialCatalog};
use crate::config::HarvestSettings;
use crate::error::Result;
use crate::models::{HourlyHarvest, StoredMaterials, TypeId};

pub const HOURS_PER_DAY: u64 = 24;
pub const DAYS_PER_MONTH: u64 = 30;
pub const HOURS_PER_MONTH: f64 = (HOURS_PER_DAY * DAYS_PER_MONTH) as f64;

/// Last known unit price of every item, in ISK
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    prices: HashMap<TypeId, f64>,
}

impl PriceBook {
    /// Unit price of an item, 0.0 when it was never priced
    pub fn price(&self, type_id: TypeId) -> f64 {
        self.prices.get(&type_id).copied().unwrap_or(0.0)
    }

    /// Record a new price. Non-positive prices are market noise and ignored.
    pub fn update(&mut self, type_id: TypeId, price: f64) -> bool {
        if !price.is_finite() || price <= 0.0 {
            return false;
        }
        self.prices.insert(type_id, price);
        true
    }

    /// Cheapest known price among `type_ids`, 0.0 if none is priced
    pub fn cheapest_of(&self, type_ids: &[TypeId]) -> f64 {
        type_ids
            .iter()
            .filter_map(|id| self.prices.get(id).copied())
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    pub fn fuel_block_price(&self) -> f64 {
        self.cheapest_of(&FUEL_BLOCK_TYPE_IDS)
    }

    pub fn magmatic_gas_price(&self) -> f64 {
        self.price(MAGMATIC_GAS_TYPE_ID)
    }
}

impl FromIterator<(TypeId, f64)> for PriceBook {
    fn from_iter<I: IntoIterator<Item = (TypeId, f64)>>(iter: I) -> Self {
        let mut book = PriceBook::default();
        for (type_id, price) in iter {
            book.update(type_id, price);
        }
        book
    }
}

/// ISK value of one hour of harvest
pub fn hourly_value(harvest: &HourlyHarvest, prices: &PriceBook) -> f64 {
    harvest
        .iter()
        .map(|(&type_id, &amount)| prices.price(type_id) * amount as f64)
        .sum()
}

/// ISK value of a 30 day month of harvest
pub fn monthly_value(harvest: &HourlyHarvest, prices: &PriceBook) -> f64 {
    hourly_value(harvest, prices) * HOURS_PER_MONTH
}

/// Cost of running a Metenox for a 30 day month, buying the cheapest fuel block
pub fn monthly_fuel_cost(settings: &HarvestSettings, prices: &PriceBook) -> f64 {
    let hourly = settings.magmatic_gases_per_hour as f64 * prices.magmatic_gas_price()
        + settings.fuel_blocks_per_hour as f64 * prices.fuel_block_price();
    hourly * HOURS_PER_MONTH
}

pub fn stored_value(stored: &StoredMaterials, prices: &PriceBook) -> f64 {
    stored
        .iter()
        .map(|(&type_id, &amount)| prices.price(type_id) * amount as f64)
        .sum()
}

/// Volume of the moon material bay content, rounded to 2 decimals
pub fn stored_volume(stored: &StoredMaterials, materials: &MaterialCatalog) -> Result<f64> {
    let mut total = 0.0;
    for (&type_id, &amount) in stored {
        total += materials.volume_of(type_id)? * amount as f64;
    }
    Ok((total * 100.0).round() / 100.0)
}

/// Monthly figures of every Metenox owned by a holding corporation
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingSummary {
    pub corporation_name: String,
    pub structures: usize,
    pub raw_revenue: f64,
    pub profit: f64,
}

/// Sum the monthly moon values of a corporation's structures and remove fuel
pub fn summarize_holding(
    corporation_name: &str,
    moon_values: &[f64],
    monthly_fuel_cost: f64,
) -> HoldingSummary {
    let raw_revenue: f64 = moon_values.iter().sum();
    let profit = if raw_revenue > 0.0 {
        raw_revenue - moon_values.len() as f64 * monthly_fuel_cost
    } else {
        0.0
    };

    HoldingSummary {
        corporation_name: corporation_name.to_string(),
        structures: moon_values.len(),
        raw_revenue,
        profit,
    }
}

impl fmt::Display for HoldingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.corporation_name)?;
        writeln!(f, "Metenoxes:      {}", self.structures)?;
        writeln!(f, "Raw revenue:    {:.0} ISK/month", self.raw_revenue)?;
        writeln!(f, "Profit:         {:.0} ISK/month", self.profit)
    }
}
