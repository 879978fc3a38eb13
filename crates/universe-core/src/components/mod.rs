//! Component definitions for the turn engine.
//!
//! Two layers live here:
//! - the schema catalog: which attributes each named component allows
//! - typed views (`Position`, `Queue`) that systems mutate during a turn
//!   and that are folded back into attributes before serialization.

mod catalog;
mod navigation;
mod planet;

pub use catalog::*;
pub use navigation::*;
pub use planet::*;

/// Component names used by the core systems to pick their working sets.
pub const METADATA: &str = "metadata";
pub const POSITION: &str = "position";
pub const QUEUE: &str = "queue";
pub const SPECIES: &str = "species";
pub const OWNERSHIP: &str = "ownership";
pub const POPULATION: &str = "population";
pub const ENVIRONMENT: &str = "environment";
pub const MINERAL_CONCENTRATIONS: &str = "mineral_concentrations";
pub const MINERALS: &str = "minerals";
