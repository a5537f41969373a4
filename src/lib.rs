//! Metenox moon harvest calculator.
//!
//! Computes what a Metenox moon drill harvests every hour from a moon survey,
//! what that harvest is worth, how long the moon material bay takes to fill,
//! and when fuel blocks or magmatic gases run low enough to warn the owners.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`assets`] | Splits a structure asset listing into fuel, reagent and stored materials |
//! | [`catalog`] | Ore conversion table, material catalog and built-in moon ore data |
//! | [`config`] | Deployment-wide harvest and consumption constants |
//! | [`db`] | SQLite storage for game data, moons, prices, holdings and structures |
//! | [`depletion`] | Remaining days of fuel and the one-shot low stock alert |
//! | [`economics`] | Prices, monthly values, fuel cost and profit |
//! | [`harvest`] | Hourly harvest allocation and bay capacity |
//! | [`models`] | Plain value records shared by every module |
//! | [`scan`] | Moon survey import |

pub mod assets;
pub mod catalog;
pub mod config;
pub mod db;
pub mod depletion;
pub mod economics;
pub mod error;
pub mod harvest;
pub mod models;
pub mod scan;
