//! Headless mode for agentic testing
//!
//! Runs a scripted encounter without any graphical output, suitable for
//! automated testing and balance checks.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless encounter
//! cargo run --release -- --headless scenario.json
//! ```
//!
//! ## JSON Scenario
//!
//! ```json
//! {
//!   "player": { "name": "Rowan", "health": 500, "attack_power": 30 },
//!   "foe": { "name": "Thicket Boar", "health": 50, "attack_power": 20 },
//!   "script": ["Attack", "Item:0", "Attack"],
//!   "random_seed": 42,
//!   "max_turns": 100
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::HeadlessEncounterConfig;
pub use runner::{run_headless_encounter, EncounterOutcome};
