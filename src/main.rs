//! Metenox Calculator
//!
//! Moon harvest and fuel calculator for Metenox moon drills in EVE Online.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use metenox_calculator::assets::{classify_assets, parse_asset_listing};
use metenox_calculator::catalog;
use metenox_calculator::config::HarvestSettings;
use metenox_calculator::db;
use metenox_calculator::depletion::{
    LowStockAlert, ResourceKind, StockMonitor, Transition, remaining_days,
};
use metenox_calculator::economics;
use metenox_calculator::harvest;
use metenox_calculator::models::{HoldingCorporation, Structure, Tag};
use metenox_calculator::scan;

#[derive(Parser)]
#[command(name = "metenox-calculator")]
#[command(about = "Moon harvest and fuel calculator for Metenox moon drills")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "METENOX_DATABASE", default_value = "metenox.db")]
    database: PathBuf,

    #[command(flatten)]
    settings: HarvestSettings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Load the built-in moon ore and material data
    LoadSample,

    /// Import moon surveys from a file or a directory of .txt files
    ImportScans {
        /// Survey file or directory
        path: PathBuf,

        /// Clear existing moons before import
        #[arg(long)]
        clear: bool,
    },

    /// Show the hourly harvest and monthly value of a moon
    Harvest {
        /// Moon ID
        moon_id: i64,

        /// Show how every ore contributes to the harvest
        #[arg(short, long)]
        verbose: bool,
    },

    /// List all moons, most valuable first
    ListMoons,

    /// Recompute hourly harvests of surveyed moons
    RefreshMoons {
        /// Recompute every moon instead of only those without a harvest
        #[arg(long)]
        all: bool,
    },

    /// Record the price of an item and refresh moon values
    SetPrice {
        /// Type ID of the item
        type_id: i64,

        /// Unit price in ISK
        price: f64,
    },

    /// Add or update a corporation owning Metenoxes
    AddHolding {
        corporation_id: i64,

        name: String,

        /// Alert when fuel blocks last this many days or less (0 disables)
        #[arg(long, default_value_t = 0)]
        fuel_days: u64,

        /// Alert when magmatic gases last this many days or less (0 disables)
        #[arg(long, default_value_t = 0)]
        magmatic_days: u64,
    },

    /// Add a Metenox anchored on a moon
    AddStructure {
        structure_id: i64,

        /// Structure name, "<system> - <name>"
        name: String,

        #[arg(long)]
        moon: i64,

        #[arg(long)]
        corporation: i64,
    },

    /// Create a tag, or change whether new Metenoxes get it by default
    AddTag {
        name: String,

        /// Apply this tag to every Metenox added from now on
        #[arg(long)]
        default: bool,
    },

    /// Attach a tag to a Metenox
    Tag {
        structure_id: i64,

        name: String,
    },

    /// Update the fuel blocks and magmatic gases of a Metenox
    Stock {
        structure_id: i64,

        #[arg(long)]
        fuel_blocks: u64,

        #[arg(long)]
        magmatic_gases: u64,
    },

    /// Update a Metenox from an asset listing (type_id, location flag, quantity per line)
    ImportAssets {
        structure_id: i64,

        file: PathBuf,
    },

    /// Show the Metenoxes and monthly figures of a corporation
    Holding {
        corporation_id: i64,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_json = std::env::var("METENOX_LOG_JSON")
        .is_ok_and(|value| value == "1" || value.eq_ignore_ascii_case("true"));

    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = cli.settings;

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            load_sample_data(&conn)?;
            println!("Game data loaded successfully!");
        }

        Commands::ImportScans { path, clear } => {
            if clear {
                println!("Clearing existing moons...");
                db::clear_moons(&conn)?;
            }

            let stats = scan::import_to_database(&conn, &path, &settings)?;
            println!("\n{}", stats);
        }

        Commands::Harvest { moon_id, verbose } => {
            let Some(moon) = db::get_moon(&conn, moon_id)? else {
                bail!("Moon {} not found. Import its survey first.", moon_id);
            };
            let materials = db::load_material_catalog(&conn)?;

            if verbose {
                let table = db::load_conversion_table(&conn)?;
                let composition = db::load_composition(&conn, moon_id)?;
                println!("Survey:\n");
                println!(
                    "{}",
                    harvest::format_breakdown(&composition, &settings, &table, &materials)
                );
            }

            let hourly = db::load_hourly_harvest(&conn, moon_id)?;
            let prices = db::load_price_book(&conn)?;
            let report = harvest::build_report(&moon, &hourly, &settings, &materials, &prices)?;
            println!("{}", report);
        }

        Commands::ListMoons => {
            let moons = db::list_moons(&conn)?;
            if moons.is_empty() {
                println!("No moons in database. Run 'import-scans' first.");
            } else {
                let fuel_cost = economics::monthly_fuel_cost(&settings, &db::load_price_book(&conn)?);
                println!("{:<12} {:<30} {:>16} {:>16}", "Moon ID", "Name", "Value", "Profit");
                println!("{}", "-".repeat(77));
                for moon in moons {
                    println!(
                        "{:<12} {:<30} {:>16.0} {:>16.0}",
                        moon.moon_id,
                        moon.name,
                        moon.value,
                        moon.value - fuel_cost
                    );
                }
            }
        }

        Commands::RefreshMoons { all } => {
            let moon_ids = if all {
                db::list_moons(&conn)?.into_iter().map(|m| m.moon_id).collect()
            } else {
                db::moons_in_need_of_update(&conn)?
            };
            let table = db::load_conversion_table(&conn)?;
            let prices = db::load_price_book(&conn)?;

            for moon_id in &moon_ids {
                scan::refresh_moon(&conn, *moon_id, &settings, &table, &prices)?;
            }
            println!("Refreshed {} moons", moon_ids.len());
        }

        Commands::SetPrice { type_id, price } => {
            if !db::save_price(&conn, type_id, price)? {
                println!("Ignored non-positive price for type {}", type_id);
                return Ok(());
            }

            let prices = db::load_price_book(&conn)?;
            let moons = db::list_moons(&conn)?;
            for moon in &moons {
                let hourly = db::load_hourly_harvest(&conn, moon.moon_id)?;
                db::set_moon_value(&conn, moon.moon_id, economics::monthly_value(&hourly, &prices))?;
            }
            info!(type_id, price, moons = moons.len(), "updated price and moon values");
            println!("Price of type {} set to {} ISK", type_id, price);
        }

        Commands::AddHolding {
            corporation_id,
            name,
            fuel_days,
            magmatic_days,
        } => {
            db::upsert_holding(
                &conn,
                &HoldingCorporation {
                    corporation_id,
                    name,
                    ping_on_remaining_fuel_days: fuel_days,
                    ping_on_remaining_magmatic_days: magmatic_days,
                },
            )?;
            println!("Holding corporation {} saved", corporation_id);
        }

        Commands::AddStructure {
            structure_id,
            name,
            moon,
            corporation,
        } => {
            if db::get_holding(&conn, corporation)?.is_none() {
                bail!("Corporation {} not found. Run 'add-holding' first.", corporation);
            }
            if let Some(owner) = db::get_structure_on_moon(&conn, moon)?
                && owner.structure_id != structure_id
            {
                bail!("Moon {} already carries Metenox {} ({})", moon, owner.structure_id, owner.name);
            }
            let existing = db::get_structure(&conn, structure_id)?;
            let is_new = existing.is_none();
            let structure = match existing {
                Some(existing) => Structure {
                    name,
                    moon_id: moon,
                    corporation_id: corporation,
                    ..existing
                },
                None => Structure {
                    structure_id,
                    name,
                    moon_id: moon,
                    corporation_id: corporation,
                    fuel_blocks: 0,
                    magmatic_gases: 0,
                    fuel_state: Default::default(),
                    magmatic_state: Default::default(),
                },
            };
            db::upsert_structure(&conn, &structure)?;
            if is_new {
                let tagged = db::apply_default_tags(&conn, structure_id)?;
                info!(structure_id, tags = tagged, "applied default tags");
            }
            println!("Metenox {} saved", structure.name);
        }

        Commands::AddTag { name, default } => {
            db::upsert_tag(&conn, &Tag { name, is_default: default })?;
            println!("{} tags defined", db::list_tags(&conn)?.len());
        }

        Commands::Tag { structure_id, name } => {
            if db::get_structure(&conn, structure_id)?.is_none() {
                bail!("Metenox {} not found. Run 'add-structure' first.", structure_id);
            }
            db::tag_structure(&conn, structure_id, &name)?;
            println!(
                "Metenox {} tags: {}",
                structure_id,
                db::structure_tags(&conn, structure_id)?.join(", ")
            );
        }

        Commands::Stock {
            structure_id,
            fuel_blocks,
            magmatic_gases,
        } => {
            update_stock(&conn, &settings, structure_id, fuel_blocks, magmatic_gases)?;
        }

        Commands::ImportAssets { structure_id, file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let inventory = classify_assets(&parse_asset_listing(&text)?);

            update_stock(
                &conn,
                &settings,
                structure_id,
                inventory.fuel_blocks,
                inventory.magmatic_gases,
            )?;
            db::replace_stored_materials(&conn, structure_id, &inventory.moon_materials)?;
        }

        Commands::Holding { corporation_id } => {
            let Some(holding) = db::get_holding(&conn, corporation_id)? else {
                bail!("Corporation {} not found", corporation_id);
            };
            let structures = db::list_structures_for_corporation(&conn, corporation_id)?;
            let prices = db::load_price_book(&conn)?;
            let materials = db::load_material_catalog(&conn)?;

            let mut moon_values = Vec::new();
            println!(
                "{:<30} {:>10} {:>10} {:>16} {:>12}  {}",
                "Metenox", "Fuel days", "Gas days", "Stored (ISK)", "Stored (m3)", "Tags"
            );
            println!("{}", "-".repeat(96));
            for structure in &structures {
                moon_values.push(db::get_moon(&conn, structure.moon_id)?.map_or(0.0, |moon| moon.value));
                let stored = db::load_stored_materials(&conn, structure.structure_id)?;
                println!(
                    "{:<30} {:>10} {:>10} {:>16.0} {:>12.2}  {}",
                    structure.name,
                    remaining_days(structure.fuel_blocks, settings.fuel_blocks_per_hour),
                    remaining_days(structure.magmatic_gases, settings.magmatic_gases_per_hour),
                    economics::stored_value(&stored, &prices),
                    economics::stored_volume(&stored, &materials)?,
                    db::structure_tags(&conn, structure.structure_id)?.join(", ")
                );
            }

            let summary = economics::summarize_holding(
                &holding.name,
                &moon_values,
                economics::monthly_fuel_cost(&settings, &prices),
            );
            println!("\n{}", summary);
        }
    }

    Ok(())
}

/// Store new fuel levels of a Metenox and print the alerts that must go out
fn update_stock(
    conn: &Connection,
    settings: &HarvestSettings,
    structure_id: i64,
    fuel_blocks: u64,
    magmatic_gases: u64,
) -> Result<()> {
    let Some(mut structure) = db::get_structure(conn, structure_id)? else {
        bail!("Metenox {} not found. Run 'add-structure' first.", structure_id);
    };
    let holding = db::get_holding(conn, structure.corporation_id)?
        .with_context(|| format!("Corporation {} not found", structure.corporation_id))?;

    let mut fuel = StockMonitor::new(ResourceKind::FuelBlocks, structure.fuel_blocks, structure.fuel_state);
    let fuel_update = fuel.update(
        fuel_blocks,
        settings.fuel_blocks_per_hour,
        holding.ping_on_remaining_fuel_days,
    );

    let mut magmatic = StockMonitor::new(
        ResourceKind::MagmaticGases,
        structure.magmatic_gases,
        structure.magmatic_state,
    );
    let magmatic_update = magmatic.update(
        magmatic_gases,
        settings.magmatic_gases_per_hour,
        holding.ping_on_remaining_magmatic_days,
    );

    structure.fuel_blocks = fuel.stock;
    structure.fuel_state = fuel.state;
    structure.magmatic_gases = magmatic.stock;
    structure.magmatic_state = magmatic.state;
    db::upsert_structure(conn, &structure)?;

    println!(
        "{}: {} fuel blocks ({} days), {} magmatic gases ({} days)",
        structure.name,
        structure.fuel_blocks,
        fuel_update.remaining_days,
        structure.magmatic_gases,
        magmatic_update.remaining_days
    );

    for (monitor, update) in [(fuel, fuel_update), (magmatic, magmatic_update)] {
        if update.transition == Transition::Fired {
            println!("\n{}", LowStockAlert::new(&structure, monitor.kind, monitor.stock));
        }
    }

    Ok(())
}

/// Load the built-in moon ore and material data
fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_game_data(conn)?;

    let materials = catalog::materials();
    for material in &materials {
        db::upsert_material_type(conn, material)?;
    }

    let ores = catalog::moon_ores();
    for ore in &ores {
        db::upsert_ore_type(conn, ore)?;
    }

    println!("Loaded {} ore types and {} materials", ores.len(), materials.len());
    Ok(())
}
