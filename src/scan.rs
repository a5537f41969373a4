//! Moon survey import
//!
//! Reads the text copied from the in-game moon survey window:
//!
//! ```text
//! Moon	Moon Product	Quantity	Ore TypeID	SolarSystemID	PlanetID	MoonID
//! Jita IV - Moon 4
//! 	Zeolites	0.300715059	45490	30000142	40009081	40009082
//! ```
//!
//! Every surveyed moon gets its composition replaced and its hourly harvest
//! recomputed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use rusqlite::Connection;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::catalog::ConversionTable;
use crate::config::HarvestSettings;
use crate::db;
use crate::economics::{self, PriceBook};
use crate::harvest::allocate_hourly_harvest;
use crate::models::{Moon, MoonId, OreComposition};

/// A moon as read from a survey
#[derive(Debug, Clone, PartialEq)]
pub struct MoonSurvey {
    pub moon_id: MoonId,
    pub name: String,
    pub solar_system_id: i64,
    pub composition: OreComposition,
}

/// Find survey files: the path itself, or every `*.txt` below a directory
pub fn find_survey_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        let file = entry.path();
        if file.is_file() && file.extension().is_some_and(|ext| ext == "txt") {
            files.push(file.to_path_buf());
        }
    }
    Ok(files)
}

/// Parse the text of one or more moon surveys
pub fn parse_survey(text: &str) -> Result<Vec<MoonSurvey>> {
    let product_re = Regex::new(
        r"^\s+(?P<ore>[^\t]+?)\t(?P<fraction>\d+(?:[.,]\d+)?)\t(?P<ore_id>\d+)\t(?P<system>\d+)\t(?P<planet>\d+)\t(?P<moon>\d+)\s*$",
    )?;
    let header_re = Regex::new(r"^Moon\tMoon Product\t")?;

    let mut surveys: Vec<MoonSurvey> = Vec::new();
    let mut current_name: Option<String> = None;

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() || header_re.is_match(line) {
            continue;
        }

        if !line.starts_with(char::is_whitespace) {
            current_name = Some(line.trim().to_string());
            continue;
        }

        let Some(cap) = product_re.captures(line) else {
            bail!("line {}: not a moon product line: {:?}", index + 1, line.trim());
        };

        let fraction: f64 = cap["fraction"]
            .replace(',', ".")
            .parse()
            .with_context(|| format!("line {}: bad quantity", index + 1))?;
        let ore_type_id = cap["ore_id"].parse()?;
        let moon_id: MoonId = cap["moon"].parse()?;
        let solar_system_id = cap["system"].parse()?;

        let position = match surveys.iter().position(|s| s.moon_id == moon_id) {
            Some(position) => position,
            None => {
                surveys.push(MoonSurvey {
                    moon_id,
                    name: current_name
                        .clone()
                        .unwrap_or_else(|| format!("Moon {}", moon_id)),
                    solar_system_id,
                    composition: OreComposition::new(),
                });
                surveys.len() - 1
            }
        };
        surveys[position].composition.insert(ore_type_id, fraction);
    }

    Ok(surveys)
}

/// Store a survey and recompute the hourly harvest and value of its moon
pub fn store_survey(
    conn: &Connection,
    survey: &MoonSurvey,
    settings: &HarvestSettings,
    table: &ConversionTable,
    prices: &PriceBook,
) -> Result<usize> {
    db::upsert_moon(
        conn,
        &Moon {
            moon_id: survey.moon_id,
            name: survey.name.clone(),
            solar_system_id: Some(survey.solar_system_id),
            value: 0.0,
        },
    )?;
    db::replace_moon_composition(conn, survey.moon_id, &survey.composition)?;
    refresh_moon(conn, survey.moon_id, settings, table, prices)
}

/// Recompute and store the hourly harvest and value of a moon from its survey.
///
/// Returns the number of ore types skipped because they are not in the table.
pub fn refresh_moon(
    conn: &Connection,
    moon_id: MoonId,
    settings: &HarvestSettings,
    table: &ConversionTable,
    prices: &PriceBook,
) -> Result<usize> {
    let composition = db::load_composition(conn, moon_id)?;
    let allocation = allocate_hourly_harvest(
        &composition,
        settings.hourly_harvest_volume,
        settings.reprocess_yield,
        table,
    )
    .with_context(|| format!("Failed to allocate harvest of moon {}", moon_id))?;

    for warning in &allocation.warnings {
        warn!(moon_id, "{}", warning);
    }

    db::replace_hourly_harvest(conn, moon_id, &allocation.harvest)?;
    db::set_moon_value(conn, moon_id, economics::monthly_value(&allocation.harvest, prices))?;
    Ok(allocation.warnings.len())
}

/// Import every survey found under `path` into the database
pub fn import_to_database(
    conn: &Connection,
    path: &Path,
    settings: &HarvestSettings,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let table = db::load_conversion_table(conn)?;
    let prices = db::load_price_book(conn)?;

    if table.is_empty() {
        warn!("conversion table is empty, run load-sample first");
    }

    info!(path = %path.display(), "scanning for moon surveys");
    let files = find_survey_files(path)?;
    info!(files = files.len(), "found survey files");

    for filepath in &files {
        let content = match fs::read_to_string(filepath) {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %filepath.display(), "unreadable survey: {}", e);
                stats.errors += 1;
                continue;
            }
        };

        match parse_survey(&content) {
            Ok(surveys) if surveys.is_empty() => stats.skipped += 1,
            Ok(surveys) => {
                for survey in &surveys {
                    match store_survey(conn, survey, settings, &table, &prices) {
                        Ok(skipped_ores) => stats.skipped_ores += skipped_ores,
                        Err(e) => {
                            warn!(
                                file = %filepath.display(),
                                moon_id = survey.moon_id,
                                "error storing survey: {:#}", e
                            );
                            stats.errors += 1;
                            continue;
                        }
                    }
                    stats.moons += 1;
                    stats.products += survey.composition.len();
                    info!(
                        moon_id = survey.moon_id,
                        name = %survey.name,
                        products = survey.composition.len(),
                        "imported moon survey"
                    );
                }
            }
            Err(e) => {
                warn!(file = %filepath.display(), "error parsing survey: {:#}", e);
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub moons: usize,
    pub products: usize,
    pub skipped_ores: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} moons ({} products, {} unknown ores). Skipped: {}, Errors: {}",
            self.moons, self.products, self.skipped_ores, self.skipped, self.errors
        )
    }
}
