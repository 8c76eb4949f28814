//! Scenario interchange document read by the simulation engine.
//!
//! ```json
//! {
//!   "building": {
//!     "width": 10, "height": 8,
//!     "walls": [{"x": 0, "y": 0}],
//!     "chairs": [{"x": 3, "y": 4}],
//!     "entry": {"x": 0, "y": 4},
//!     "exit": {"x": 9, "y": 4},
//!     "icu": {"x": 8, "y": 6},
//!     "triages": [{"patient_location": {"x": 2, "y": 2}}],
//!     "receptionists": [{"receptionist_location": {...}, "patient_location": {...}}],
//!     "doctors": [{"specialty": "surgeon", "doctor_location": {...}, "patient_location": {...}}]
//!   },
//!   "parameters": { ... }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ScenarioError, ScenarioResult};
use crate::geometry::Point;
use crate::value::Value;

/// File name used when a scenario is saved to a folder.
pub const SCENARIO_FILE: &str = "hospital.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDocument {
    pub building: Building,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub walls: Vec<Point>,
    #[serde(default)]
    pub chairs: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icu: Option<Point>,
    #[serde(default)]
    pub triages: Vec<TriageRecord>,
    #[serde(default)]
    pub receptionists: Vec<ReceptionistRecord>,
    #[serde(default)]
    pub doctors: Vec<DoctorRecord>,
}

impl Building {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            walls: Vec::new(),
            chairs: Vec::new(),
            entry: None,
            exit: None,
            icu: None,
            triages: Vec::new(),
            receptionists: Vec::new(),
            doctors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageRecord {
    pub patient_location: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptionistRecord {
    pub receptionist_location: Point,
    pub patient_location: Point,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub specialty: String,
    pub doctor_location: Point,
    pub patient_location: Point,
}

impl ScenarioDocument {
    /// Parses a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Document` for malformed JSON, negative
    /// coordinates or out-of-range durations.
    pub fn from_json_str(text: &str) -> ScenarioResult<Self> {
        serde_json::from_str(text).map_err(|e| ScenarioError::document(e.to_string()))
    }

    /// Renders the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Fails only if a parameter holds a non-finite float.
    pub fn to_json_string(&self) -> ScenarioResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScenarioError::document(e.to_string()))
    }
}
