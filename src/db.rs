//! Database schema and operations

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::catalog::{ConversionTable, MaterialCatalog};
use crate::depletion::PingState;
use crate::economics::PriceBook;
use crate::models::{
    CorporationId, HoldingCorporation, HourlyHarvest, MaterialCategory, MaterialType, Moon,
    MoonId, OreComposition, OreMaterial, OreType, StoredMaterials, Structure, StructureId, Tag,
    TypeId,
};

/// Counts are stored as SQLite integers, which are signed
fn count(value: u64) -> Result<i64> {
    i64::try_from(value).with_context(|| format!("count {} does not fit in the database", value))
}

fn get_count(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Static game data: moon materials, fuel blocks, magmatic gas
        CREATE TABLE IF NOT EXISTS material_types (
            type_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            volume_m3 REAL NOT NULL,
            category TEXT NOT NULL
        );

        -- Static game data: ores and what a portion reprocesses into
        CREATE TABLE IF NOT EXISTS ore_types (
            type_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            volume_m3 REAL NOT NULL,
            portion_size INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ore_materials (
            ore_type_id INTEGER NOT NULL,
            material_type_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            PRIMARY KEY (ore_type_id, material_type_id)
        );

        -- Surveyed moons and their monthly harvest value
        CREATE TABLE IF NOT EXISTS moons (
            moon_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            solar_system_id INTEGER,
            value REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS moon_products (
            moon_id INTEGER NOT NULL,
            ore_type_id INTEGER NOT NULL,
            fraction REAL NOT NULL,
            PRIMARY KEY (moon_id, ore_type_id)
        );

        -- Always replaced as a whole when a moon is recomputed
        CREATE TABLE IF NOT EXISTS hourly_products (
            moon_id INTEGER NOT NULL,
            material_type_id INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            PRIMARY KEY (moon_id, material_type_id)
        );

        CREATE TABLE IF NOT EXISTS prices (
            type_id INTEGER PRIMARY KEY,
            price REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS holdings (
            corporation_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            ping_on_remaining_fuel_days INTEGER NOT NULL DEFAULT 0,
            ping_on_remaining_magmatic_days INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS structures (
            structure_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            moon_id INTEGER NOT NULL UNIQUE,
            corporation_id INTEGER NOT NULL,
            fuel_blocks INTEGER NOT NULL DEFAULT 0,
            magmatic_gases INTEGER NOT NULL DEFAULT 0,
            was_fuel_pinged INTEGER NOT NULL DEFAULT 0,
            was_magmatic_pinged INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS stored_materials (
            structure_id INTEGER NOT NULL,
            material_type_id INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            PRIMARY KEY (structure_id, material_type_id)
        );

        -- Labels for sorting structures; default tags go on every new structure
        CREATE TABLE IF NOT EXISTS tags (
            name TEXT PRIMARY KEY,
            is_default INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS structure_tags (
            structure_id INTEGER NOT NULL,
            tag_name TEXT NOT NULL,
            PRIMARY KEY (structure_id, tag_name)
        );

        CREATE INDEX IF NOT EXISTS idx_structures_corporation ON structures(corporation_id);
        "#,
    )?;
    Ok(())
}

/// Clear the static game data (for re-seeding)
pub fn clear_game_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM ore_materials;
        DELETE FROM ore_types;
        DELETE FROM material_types;
        "#,
    )?;
    Ok(())
}

/// Clear every moon survey and computed harvest
pub fn clear_moons(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM hourly_products;
        DELETE FROM moon_products;
        DELETE FROM moons;
        "#,
    )?;
    Ok(())
}

pub fn upsert_material_type(conn: &Connection, material: &MaterialType) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO material_types (type_id, name, volume_m3, category)
         VALUES (?1, ?2, ?3, ?4)",
        (
            material.type_id,
            &material.name,
            material.volume_m3,
            material.category.as_str(),
        ),
    )?;
    Ok(())
}

/// Insert or replace an ore type together with its reprocessing outputs
pub fn upsert_ore_type(conn: &Connection, ore: &OreType) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT OR REPLACE INTO ore_types (type_id, name, volume_m3, portion_size)
         VALUES (?1, ?2, ?3, ?4)",
        (ore.type_id, &ore.name, ore.volume_m3, ore.portion_size),
    )?;
    tx.execute("DELETE FROM ore_materials WHERE ore_type_id = ?1", [ore.type_id])?;
    for output in &ore.materials {
        tx.execute(
            "INSERT INTO ore_materials (ore_type_id, material_type_id, quantity)
             VALUES (?1, ?2, ?3)",
            (ore.type_id, output.material_type_id, output.quantity),
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn load_material_catalog(conn: &Connection) -> Result<MaterialCatalog> {
    let mut stmt =
        conn.prepare("SELECT type_id, name, volume_m3, category FROM material_types")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, TypeId>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut materials = Vec::new();
    for row in rows {
        let (type_id, name, volume_m3, category) = row?;
        let category = MaterialCategory::parse(&category)
            .with_context(|| format!("material type {} has unknown category {:?}", type_id, category))?;
        materials.push(MaterialType {
            type_id,
            name,
            volume_m3,
            category,
        });
    }
    Ok(MaterialCatalog::new(materials))
}

pub fn load_conversion_table(conn: &Connection) -> Result<ConversionTable> {
    let mut stmt = conn.prepare("SELECT type_id, name, volume_m3, portion_size FROM ore_types")?;
    let rows = stmt.query_map([], |row| {
        Ok(OreType {
            type_id: row.get(0)?,
            name: row.get(1)?,
            volume_m3: row.get(2)?,
            portion_size: row.get(3)?,
            materials: Vec::new(),
        })
    })?;

    let mut ores = Vec::new();
    for row in rows {
        ores.push(row?);
    }

    let mut stmt = conn.prepare(
        "SELECT material_type_id, quantity FROM ore_materials
         WHERE ore_type_id = ?1 ORDER BY material_type_id",
    )?;
    for ore in &mut ores {
        let rows = stmt.query_map([ore.type_id], |row| {
            Ok(OreMaterial {
                material_type_id: row.get(0)?,
                quantity: row.get(1)?,
            })
        })?;
        for row in rows {
            ore.materials.push(row?);
        }
    }

    Ok(ConversionTable::new(ores))
}

/// Insert a moon or refresh its name and location, keeping its value
pub fn upsert_moon(conn: &Connection, moon: &Moon) -> Result<()> {
    conn.execute(
        "INSERT INTO moons (moon_id, name, solar_system_id, value) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(moon_id) DO UPDATE SET name = excluded.name, solar_system_id = excluded.solar_system_id",
        (moon.moon_id, &moon.name, moon.solar_system_id, moon.value),
    )?;
    Ok(())
}

fn moon_from_row(row: &Row<'_>) -> rusqlite::Result<Moon> {
    Ok(Moon {
        moon_id: row.get(0)?,
        name: row.get(1)?,
        solar_system_id: row.get(2)?,
        value: row.get(3)?,
    })
}

pub fn get_moon(conn: &Connection, moon_id: MoonId) -> Result<Option<Moon>> {
    let moon = conn
        .query_row(
            "SELECT moon_id, name, solar_system_id, value FROM moons WHERE moon_id = ?1",
            [moon_id],
            moon_from_row,
        )
        .optional()?;
    Ok(moon)
}

/// List all moons, most valuable first
pub fn list_moons(conn: &Connection) -> Result<Vec<Moon>> {
    let mut stmt = conn.prepare(
        "SELECT moon_id, name, solar_system_id, value FROM moons ORDER BY value DESC, moon_id",
    )?;
    let rows = stmt.query_map([], moon_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

pub fn set_moon_value(conn: &Connection, moon_id: MoonId, value: f64) -> Result<()> {
    conn.execute("UPDATE moons SET value = ?1 WHERE moon_id = ?2", (value, moon_id))?;
    Ok(())
}

/// Replace the survey of a moon
pub fn replace_moon_composition(
    conn: &Connection,
    moon_id: MoonId,
    composition: &OreComposition,
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM moon_products WHERE moon_id = ?1", [moon_id])?;
    for (&ore_type_id, &fraction) in composition {
        tx.execute(
            "INSERT INTO moon_products (moon_id, ore_type_id, fraction) VALUES (?1, ?2, ?3)",
            (moon_id, ore_type_id, fraction),
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn load_composition(conn: &Connection, moon_id: MoonId) -> Result<OreComposition> {
    let mut stmt =
        conn.prepare("SELECT ore_type_id, fraction FROM moon_products WHERE moon_id = ?1")?;
    let rows = stmt.query_map([moon_id], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut composition = OreComposition::new();
    for row in rows {
        let (ore_type_id, fraction) = row?;
        composition.insert(ore_type_id, fraction);
    }
    Ok(composition)
}

/// Replace the hourly harvest of a moon as a whole
pub fn replace_hourly_harvest(conn: &Connection, moon_id: MoonId, harvest: &HourlyHarvest) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM hourly_products WHERE moon_id = ?1", [moon_id])?;
    for (&material_type_id, &amount) in harvest {
        tx.execute(
            "INSERT INTO hourly_products (moon_id, material_type_id, amount) VALUES (?1, ?2, ?3)",
            (moon_id, material_type_id, count(amount)?),
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn load_hourly_harvest(conn: &Connection, moon_id: MoonId) -> Result<HourlyHarvest> {
    let mut stmt =
        conn.prepare("SELECT material_type_id, amount FROM hourly_products WHERE moon_id = ?1")?;
    let rows = stmt.query_map([moon_id], |row| Ok((row.get(0)?, get_count(row, 1)?)))?;

    let mut harvest = HourlyHarvest::new();
    for row in rows {
        let (material_type_id, amount) = row?;
        harvest.insert(material_type_id, amount);
    }
    Ok(harvest)
}

/// Moons that have a survey but no hourly harvest computed yet
pub fn moons_in_need_of_update(conn: &Connection) -> Result<Vec<MoonId>> {
    let mut stmt = conn.prepare(
        "SELECT m.moon_id FROM moons m
         WHERE EXISTS (SELECT 1 FROM moon_products p WHERE p.moon_id = m.moon_id)
           AND NOT EXISTS (SELECT 1 FROM hourly_products h WHERE h.moon_id = m.moon_id)
         ORDER BY m.moon_id",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Store a price, ignoring non-positive values. Returns whether it was stored.
pub fn save_price(conn: &Connection, type_id: TypeId, price: f64) -> Result<bool> {
    if !price.is_finite() || price <= 0.0 {
        return Ok(false);
    }
    conn.execute(
        "INSERT OR REPLACE INTO prices (type_id, price) VALUES (?1, ?2)",
        (type_id, price),
    )?;
    Ok(true)
}

pub fn load_price_book(conn: &Connection) -> Result<PriceBook> {
    let mut stmt = conn.prepare("SELECT type_id, price FROM prices")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, TypeId>(0)?, row.get::<_, f64>(1)?)))?;

    let mut prices = Vec::new();
    for row in rows {
        prices.push(row?);
    }
    Ok(prices.into_iter().collect())
}

pub fn upsert_holding(conn: &Connection, holding: &HoldingCorporation) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO holdings
         (corporation_id, name, ping_on_remaining_fuel_days, ping_on_remaining_magmatic_days)
         VALUES (?1, ?2, ?3, ?4)",
        (
            holding.corporation_id,
            &holding.name,
            count(holding.ping_on_remaining_fuel_days)?,
            count(holding.ping_on_remaining_magmatic_days)?,
        ),
    )?;
    Ok(())
}

pub fn get_holding(conn: &Connection, corporation_id: CorporationId) -> Result<Option<HoldingCorporation>> {
    let holding = conn
        .query_row(
            "SELECT corporation_id, name, ping_on_remaining_fuel_days, ping_on_remaining_magmatic_days
             FROM holdings WHERE corporation_id = ?1",
            [corporation_id],
            |row| {
                Ok(HoldingCorporation {
                    corporation_id: row.get(0)?,
                    name: row.get(1)?,
                    ping_on_remaining_fuel_days: get_count(row, 2)?,
                    ping_on_remaining_magmatic_days: get_count(row, 3)?,
                })
            },
        )
        .optional()?;
    Ok(holding)
}

/// Insert a structure or update it in place with its stock and alert state.
///
/// A moon carries at most one Metenox: anchoring a second structure on a moon
/// already taken is an error and leaves the existing structure untouched.
pub fn upsert_structure(conn: &Connection, structure: &Structure) -> Result<()> {
    conn.execute(
        "INSERT INTO structures
         (structure_id, name, moon_id, corporation_id, fuel_blocks, magmatic_gases,
          was_fuel_pinged, was_magmatic_pinged)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(structure_id) DO UPDATE SET
            name = excluded.name,
            moon_id = excluded.moon_id,
            corporation_id = excluded.corporation_id,
            fuel_blocks = excluded.fuel_blocks,
            magmatic_gases = excluded.magmatic_gases,
            was_fuel_pinged = excluded.was_fuel_pinged,
            was_magmatic_pinged = excluded.was_magmatic_pinged",
        (
            structure.structure_id,
            &structure.name,
            structure.moon_id,
            structure.corporation_id,
            count(structure.fuel_blocks)?,
            count(structure.magmatic_gases)?,
            structure.fuel_state.is_pinged(),
            structure.magmatic_state.is_pinged(),
        ),
    )
    .with_context(|| {
        format!(
            "Failed to save structure {} on moon {}",
            structure.structure_id, structure.moon_id
        )
    })?;
    Ok(())
}

const STRUCTURE_COLUMNS: &str = "structure_id, name, moon_id, corporation_id, fuel_blocks, \
                                 magmatic_gases, was_fuel_pinged, was_magmatic_pinged";

fn structure_from_row(row: &Row<'_>) -> rusqlite::Result<Structure> {
    Ok(Structure {
        structure_id: row.get(0)?,
        name: row.get(1)?,
        moon_id: row.get(2)?,
        corporation_id: row.get(3)?,
        fuel_blocks: get_count(row, 4)?,
        magmatic_gases: get_count(row, 5)?,
        fuel_state: PingState::from_pinged(row.get(6)?),
        magmatic_state: PingState::from_pinged(row.get(7)?),
    })
}

pub fn get_structure(conn: &Connection, structure_id: StructureId) -> Result<Option<Structure>> {
    let structure = conn
        .query_row(
            &format!("SELECT {} FROM structures WHERE structure_id = ?1", STRUCTURE_COLUMNS),
            [structure_id],
            structure_from_row,
        )
        .optional()?;
    Ok(structure)
}

/// The structure anchored on a moon, if any
pub fn get_structure_on_moon(conn: &Connection, moon_id: MoonId) -> Result<Option<Structure>> {
    let structure = conn
        .query_row(
            &format!("SELECT {} FROM structures WHERE moon_id = ?1", STRUCTURE_COLUMNS),
            [moon_id],
            structure_from_row,
        )
        .optional()?;
    Ok(structure)
}

pub fn list_structures_for_corporation(
    conn: &Connection,
    corporation_id: CorporationId,
) -> Result<Vec<Structure>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM structures WHERE corporation_id = ?1 ORDER BY name",
        STRUCTURE_COLUMNS
    ))?;
    let rows = stmt.query_map([corporation_id], structure_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Replace the moon material bay content of a structure
pub fn replace_stored_materials(
    conn: &Connection,
    structure_id: StructureId,
    stored: &StoredMaterials,
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM stored_materials WHERE structure_id = ?1", [structure_id])?;
    for (&material_type_id, &amount) in stored {
        tx.execute(
            "INSERT INTO stored_materials (structure_id, material_type_id, amount) VALUES (?1, ?2, ?3)",
            (structure_id, material_type_id, count(amount)?),
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn load_stored_materials(conn: &Connection, structure_id: StructureId) -> Result<StoredMaterials> {
    let mut stmt = conn
        .prepare("SELECT material_type_id, amount FROM stored_materials WHERE structure_id = ?1")?;
    let rows = stmt.query_map([structure_id], |row| Ok((row.get(0)?, get_count(row, 1)?)))?;

    let mut stored = StoredMaterials::new();
    for row in rows {
        let (material_type_id, amount) = row?;
        stored.insert(material_type_id, amount);
    }
    Ok(stored)
}

/// Create a tag or change whether it is a default tag
pub fn upsert_tag(conn: &Connection, tag: &Tag) -> Result<()> {
    tag.validate()?;
    conn.execute(
        "INSERT INTO tags (name, is_default) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET is_default = excluded.is_default",
        (&tag.name, tag.is_default),
    )?;
    Ok(())
}

pub fn list_tags(conn: &Connection) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare("SELECT name, is_default FROM tags ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok(Tag {
            name: row.get(0)?,
            is_default: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Attach an existing tag to a structure. Attaching it twice is a no-op.
pub fn tag_structure(conn: &Connection, structure_id: StructureId, tag_name: &str) -> Result<()> {
    let known: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM tags WHERE name = ?1)",
        [tag_name],
        |row| row.get(0),
    )?;
    if !known {
        bail!("Tag {:?} does not exist", tag_name);
    }

    conn.execute(
        "INSERT OR IGNORE INTO structure_tags (structure_id, tag_name) VALUES (?1, ?2)",
        (structure_id, tag_name),
    )?;
    Ok(())
}

/// Attach every default tag to a structure, returning how many were attached
pub fn apply_default_tags(conn: &Connection, structure_id: StructureId) -> Result<usize> {
    let attached = conn.execute(
        "INSERT OR IGNORE INTO structure_tags (structure_id, tag_name)
         SELECT ?1, name FROM tags WHERE is_default = 1",
        [structure_id],
    )?;
    Ok(attached)
}

pub fn structure_tags(conn: &Connection, structure_id: StructureId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag_name FROM structure_tags WHERE structure_id = ?1 ORDER BY tag_name",
    )?;
    let rows = stmt.query_map([structure_id], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn game_data_round_trips() {
        let conn = open();
        for material in catalog::materials() {
            upsert_material_type(&conn, &material).unwrap();
        }
        for ore in catalog::moon_ores() {
            upsert_ore_type(&conn, &ore).unwrap();
        }

        let table = load_conversion_table(&conn).unwrap();
        assert_eq!(table.len(), catalog::moon_ores().len());
        let xenotime = table.get(45510).unwrap();
        assert_eq!(xenotime.materials.len(), 4);
        assert_eq!(xenotime.portion_size, 100);

        let materials = load_material_catalog(&conn).unwrap();
        assert_eq!(materials.get(16634).unwrap().name, "Atmospheric Gases");
    }

    #[test]
    fn hourly_harvest_is_replaced_not_merged() {
        let conn = open();
        let first: HourlyHarvest = [(16634, 234), (16641, 145)].into_iter().collect();
        let second: HourlyHarvest = [(16634, 219)].into_iter().collect();

        replace_hourly_harvest(&conn, 1, &first).unwrap();
        replace_hourly_harvest(&conn, 1, &second).unwrap();
        assert_eq!(load_hourly_harvest(&conn, 1).unwrap(), second);
    }

    #[test]
    fn finds_moons_needing_harvest() {
        let conn = open();
        for moon_id in [1, 2, 3] {
            let moon = Moon {
                moon_id,
                name: format!("Moon {}", moon_id),
                solar_system_id: None,
                value: 0.0,
            };
            upsert_moon(&conn, &moon).unwrap();
        }
        let composition: OreComposition = [(45490, 1.0)].into_iter().collect();
        replace_moon_composition(&conn, 1, &composition).unwrap();
        replace_moon_composition(&conn, 2, &composition).unwrap();
        replace_hourly_harvest(&conn, 2, &[(16634, 780)].into_iter().collect()).unwrap();

        assert_eq!(moons_in_need_of_update(&conn).unwrap(), vec![1]);
    }

    #[test]
    fn non_positive_prices_are_not_saved() {
        let conn = open();
        assert!(save_price(&conn, 16634, 1000.0).unwrap());
        assert!(!save_price(&conn, 16634, 0.0).unwrap());
        assert_eq!(load_price_book(&conn).unwrap().price(16634), 1000.0);
    }

    #[test]
    fn structure_keeps_ping_state() {
        let conn = open();
        let structure = Structure {
            structure_id: 1,
            name: "Jita - Metenox1".to_string(),
            moon_id: 40178441,
            corporation_id: 1,
            fuel_blocks: 20,
            magmatic_gases: 4000,
            fuel_state: PingState::Pinged,
            magmatic_state: PingState::Armed,
        };
        upsert_structure(&conn, &structure).unwrap();
        assert_eq!(get_structure(&conn, 1).unwrap(), Some(structure));
        assert_eq!(get_structure(&conn, 2).unwrap(), None);
        assert_eq!(list_structures_for_corporation(&conn, 1).unwrap().len(), 1);
    }

    fn metenox(structure_id: StructureId, moon_id: MoonId) -> Structure {
        Structure {
            structure_id,
            name: format!("Jita - Metenox{}", structure_id),
            moon_id,
            corporation_id: 1,
            fuel_blocks: 1400,
            magmatic_gases: 4000,
            fuel_state: PingState::Armed,
            magmatic_state: PingState::Pinged,
        }
    }

    #[test]
    fn second_structure_on_a_moon_is_rejected() {
        let conn = open();
        let first = metenox(1, 40178441);
        upsert_structure(&conn, &first).unwrap();
        replace_stored_materials(&conn, 1, &[(16634, 60)].into_iter().collect()).unwrap();

        assert!(upsert_structure(&conn, &metenox(2, 40178441)).is_err());

        assert_eq!(get_structure(&conn, 1).unwrap(), Some(first.clone()));
        assert_eq!(get_structure(&conn, 2).unwrap(), None);
        assert_eq!(get_structure_on_moon(&conn, 40178441).unwrap(), Some(first));
        assert_eq!(list_structures_for_corporation(&conn, 1).unwrap().len(), 1);
        assert_eq!(load_stored_materials(&conn, 1).unwrap().get(&16634), Some(&60));
    }

    #[test]
    fn structure_update_keeps_its_row() {
        let conn = open();
        upsert_structure(&conn, &metenox(1, 40178441)).unwrap();

        let mut moved = metenox(1, 40178442);
        moved.fuel_blocks = 20;
        moved.fuel_state = PingState::Pinged;
        upsert_structure(&conn, &moved).unwrap();

        assert_eq!(get_structure(&conn, 1).unwrap(), Some(moved));
        assert_eq!(get_structure_on_moon(&conn, 40178441).unwrap(), None);
    }

    #[test]
    fn default_tags_are_applied_to_structures() {
        let conn = open();
        upsert_tag(&conn, &Tag { name: "alliance".to_string(), is_default: true }).unwrap();
        upsert_tag(&conn, &Tag { name: "r64".to_string(), is_default: false }).unwrap();
        upsert_structure(&conn, &metenox(1, 40178441)).unwrap();

        assert_eq!(apply_default_tags(&conn, 1).unwrap(), 1);
        tag_structure(&conn, 1, "r64").unwrap();
        tag_structure(&conn, 1, "r64").unwrap();
        assert_eq!(structure_tags(&conn, 1).unwrap(), vec!["alliance", "r64"]);

        assert!(tag_structure(&conn, 1, "missing").is_err());
        assert_eq!(list_tags(&conn).unwrap().len(), 2);
    }

    #[test]
    fn overlong_tag_names_are_rejected() {
        let conn = open();
        let tag = Tag { name: "a tag name far too long".to_string(), is_default: false };
        assert!(upsert_tag(&conn, &tag).is_err());
        assert!(list_tags(&conn).unwrap().is_empty());
    }
}
