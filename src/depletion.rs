//! Fuel and reagent depletion forecast with one-shot low stock alerts
//!
//! A Metenox burns fuel blocks and magmatic gases every hour. Owners set a
//! number of remaining days under which they want to be warned. The warning
//! must go out once when the level drops to the threshold and stay quiet until
//! the structure is refuelled above it, which [`PingState`] models.

use std::fmt;

use tracing::info;

use crate::economics::HOURS_PER_DAY;
use crate::models::Structure;

/// Whole days of operation left with `stock` units burnt at `hourly_rate`.
///
/// A structure that consumes nothing reports 0.
pub fn remaining_days(stock: u64, hourly_rate: u64) -> u64 {
    match hourly_rate.checked_mul(HOURS_PER_DAY) {
        Some(daily) if daily > 0 => stock / daily,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PingState {
    /// An alert may be sent
    #[default]
    Armed,
    /// An alert was sent and further ones are suppressed
    Pinged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// Armed → Pinged, the alert must be sent
    Fired,
    /// Pinged → Armed, silently
    Rearmed,
}

impl PingState {
    pub fn from_pinged(pinged: bool) -> Self {
        if pinged {
            PingState::Pinged
        } else {
            PingState::Armed
        }
    }

    pub fn is_pinged(self) -> bool {
        self == PingState::Pinged
    }

    pub fn observe(self, remaining_days: u64, threshold_days: u64) -> (PingState, Transition) {
        match self {
            PingState::Armed if remaining_days <= threshold_days => {
                (PingState::Pinged, Transition::Fired)
            }
            PingState::Pinged if remaining_days > threshold_days => {
                (PingState::Armed, Transition::Rearmed)
            }
            state => (state, Transition::Unchanged),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    FuelBlocks,
    MagmaticGases,
}

impl ResourceKind {
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::FuelBlocks => "fuel blocks",
            ResourceKind::MagmaticGases => "magmatic gases",
        }
    }

    fn alert_title(self) -> &'static str {
        match self {
            ResourceKind::FuelBlocks => "Low fuel blocks level",
            ResourceKind::MagmaticGases => "Low reagent level",
        }
    }

    fn field_name(self) -> &'static str {
        match self {
            ResourceKind::FuelBlocks => "Remaining Fuel Blocks",
            ResourceKind::MagmaticGases => "Remaining Magmatic Gases",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockUpdate {
    pub remaining_days: u64,
    pub transition: Transition,
}

/// Stock level and alert state of one resource of one structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMonitor {
    pub kind: ResourceKind,
    pub stock: u64,
    pub state: PingState,
}

impl StockMonitor {
    pub fn new(kind: ResourceKind, stock: u64, state: PingState) -> Self {
        Self { kind, stock, state }
    }

    /// Store a new stock level and advance the alert state.
    ///
    /// A threshold of 0 days disables alerts for this resource and is the one
    /// exception to [`PingState::observe`]: nothing fires, even at 0 remaining
    /// days, and a pinged monitor re-arms at any stock level.
    pub fn update(&mut self, new_stock: u64, hourly_rate: u64, threshold_days: u64) -> StockUpdate {
        self.stock = new_stock;
        let remaining_days = remaining_days(new_stock, hourly_rate);

        let (state, transition) = if threshold_days == 0 {
            match self.state {
                PingState::Pinged => (PingState::Armed, Transition::Rearmed),
                PingState::Armed => (PingState::Armed, Transition::Unchanged),
            }
        } else {
            self.state.observe(remaining_days, threshold_days)
        };
        self.state = state;

        match transition {
            Transition::Fired => info!(
                resource = self.kind.label(),
                remaining_days, threshold_days, new_stock, "level is under the threshold"
            ),
            Transition::Rearmed => info!(
                resource = self.kind.label(),
                remaining_days, threshold_days, new_stock, "level is back above the threshold"
            ),
            Transition::Unchanged => {}
        }

        StockUpdate {
            remaining_days,
            transition,
        }
    }
}

/// Content of a low stock notification, ready for any chat webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockAlert {
    pub title: String,
    pub description: String,
    pub fields: Vec<(String, String)>,
}

impl LowStockAlert {
    pub fn new(structure: &Structure, kind: ResourceKind, amount: u64) -> Self {
        let system = structure.system_name();
        Self {
            title: kind.alert_title().to_string(),
            description: format!(
                "Your Metenox {} in [{}]({}) level of {} is under the threshold. Refueling is required",
                structure.name,
                system,
                dotlan_system_url(system),
                kind.label()
            ),
            fields: vec![(kind.field_name().to_string(), amount.to_string())],
        }
    }
}

impl fmt::Display for LowStockAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "** {} **", self.title)?;
        writeln!(f, "{}", self.description)?;
        for (name, value) in &self.fields {
            writeln!(f, "  {}: {}", name, value)?;
        }
        Ok(())
    }
}

fn dotlan_system_url(system: &str) -> String {
    format!("https://evemaps.dotlan.net/system/{}", system.replace(' ', "_"))
}
