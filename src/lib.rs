//! # hospital-scenario
//!
//! Scenario definitions for an agent-based hospital simulation: a floor plan
//! of tiles, the elements placed on it and a parameter document, validated and
//! written out in the formats the simulation engine reads at startup.
//!
//! ## Core Concepts
//!
//! - **Grid**: a dense matrix of [`Tile`]s with a versioned binary codec
//! - **ParameterSchema**: a declarative tree of typed parameters with
//!   probability groups, checked by a fail-fast validator
//! - **Scenario**: plan + elements + parameters, cross-checked and serialized
//! - **SimulationProperties**: process layout and manager ranks for a run
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hospital_scenario::{Element, Point, Scenario, SimulationProperties, PreparedRun, Value};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), hospital_scenario::ScenarioError> {
//! let mut scenario = Scenario::new(20, 12)?;
//! scenario.enclose()?;
//! scenario.place(Element::Entry(Point::new(0, 5)?))?;
//! scenario.place(Element::doctor_office("surgeon", Point::new(10, 10)?, Point::new(10, 9)?))?;
//!
//! let text = std::fs::read_to_string("parameters.json").map_err(|e| {
//!     hospital_scenario::ScenarioError::io("parameters.json", e)
//! })?;
//! let parameters: serde_json::Value = serde_json::from_str(&text)
//!     .map_err(|e| hospital_scenario::ScenarioError::document(e.to_string()))?;
//! scenario.set_parameters(Value::from_json(parameters)?);
//! scenario.validate()?;
//!
//! let run = PreparedRun::prepare(Path::new("runs"), &SimulationProperties::default(), &scenario)?;
//! println!("{}", run.folder().display());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod geometry;
pub mod tile;
pub mod value;

pub mod grid;
pub mod influx;
pub mod schema;

pub mod artifact;
pub mod properties;
pub mod run;
pub mod scenario;

// Re-export primary types at crate root for convenience
pub use error::{
    FormatError, GeometryError, LayoutError, ScenarioError, ScenarioResult, ValidationError,
};
pub use geometry::{Point, TimePeriod};
pub use grid::Grid;
pub use properties::SimulationProperties;
pub use run::PreparedRun;
pub use scenario::{Element, Scenario, ScenarioDocument};
pub use schema::{GroupPolicy, Kind, Parameter, ParameterSchema};
pub use tile::{SpecialtyIndex, Tile};
pub use value::Value;
