//! The scenario aggregate: a floor plan, the elements placed on it and the
//! parameter document handed to the simulation engine.
//!
//! A scenario is built by placing elements and setting parameters, then
//! validated, then saved. Any mutation after a successful validation requires
//! validating again before the scenario can be serialized.

pub mod document;
pub mod element;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub use document::{
    Building, DoctorRecord, ReceptionistRecord, ScenarioDocument, TriageRecord, SCENARIO_FILE,
};
pub use element::Element;

use crate::artifact;
use crate::error::{ScenarioError, ScenarioResult, ValidationError};
use crate::geometry::Point;
use crate::grid::{self, Grid};
use crate::schema::{hospital, ParameterSchema};
use crate::tile::{SpecialtyIndex, Tile, MAX_SPECIALTIES};
use crate::value::Value;

/// A hospital scenario under construction.
#[derive(Debug, Clone)]
pub struct Scenario {
    grid: Grid,
    elements: Vec<Element>,
    specialties: Vec<String>,
    patient_spots: BTreeSet<Point>,
    parameters: Option<Value>,
    schema: ParameterSchema,
    validated: bool,
}

impl Scenario {
    /// Creates an empty `width x height` scenario validated against the
    /// hospital base schema.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidDimensions` unless both dimensions are
    /// at least 1 and the plan holds at most [`grid::MAX_CELLS`] cells.
    pub fn new(width: i64, height: i64) -> ScenarioResult<Self> {
        Ok(Self {
            grid: Grid::with_dimensions(width, height)?,
            elements: Vec::new(),
            specialties: Vec::new(),
            patient_spots: BTreeSet::new(),
            parameters: None,
            schema: hospital::schema()?,
            validated: false,
        })
    }

    /// Replaces the schema the parameters are validated against, typically
    /// one obtained from [`ParameterSchema::extend`].
    #[must_use]
    pub fn with_schema(mut self, schema: ParameterSchema) -> Self {
        self.schema = schema;
        self.validated = false;
        self
    }

    #[must_use]
    pub const fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Doctor specialties in order of first placement. The position of a
    /// specialty is its index in the plan's doctor tile codes.
    #[must_use]
    pub fn specialties(&self) -> &[String] {
        &self.specialties
    }

    #[must_use]
    pub fn specialty_index(&self, specialty: &str) -> Option<SpecialtyIndex> {
        let i = self.specialties.iter().position(|s| s == specialty)?;
        SpecialtyIndex::new(i as i64).ok()
    }

    #[must_use]
    pub const fn parameters(&self) -> Option<&Value> {
        self.parameters.as_ref()
    }

    #[must_use]
    pub const fn is_validated(&self) -> bool {
        self.validated
    }

    /// Places an element on the plan.
    ///
    /// Every location of the element must be a free floor cell, so the
    /// resulting plan does not depend on placement order. Nothing is modified
    /// when placement fails.
    ///
    /// # Errors
    ///
    /// - `GeometryError::OutOfBounds` if any of its locations is off the plan
    /// - `ValidationError::Occupied` if a location is already painted or is
    ///   the patient spot of a desk or office, or if both locations coincide
    /// - `ValidationError::DuplicateElement` for a second entry, exit or ICU
    /// - `ValidationError::TooManySpecialties` for a 129th distinct specialty
    pub fn place(&mut self, element: Element) -> ScenarioResult<()> {
        let locations = element.locations();
        for location in &locations {
            self.grid.check(*location)?;
        }

        for (i, location) in locations.iter().enumerate() {
            let occupant = if locations[..i].contains(location) {
                Some(element.kind())
            } else if self.patient_spots.contains(location) {
                Some("a patient spot")
            } else {
                match self.grid.get(*location) {
                    Some(Tile::Floor) | None => None,
                    Some(tile) => Some(tile.name()),
                }
            };
            if let Some(occupant) = occupant {
                return Err(ValidationError::Occupied {
                    kind: element.kind(),
                    occupant,
                    x: location.x(),
                    y: location.y(),
                }
                .into());
            }
        }

        if element.is_unique()
            && self
                .elements
                .iter()
                .any(|e| std::mem::discriminant(e) == std::mem::discriminant(&element))
        {
            return Err(ValidationError::DuplicateElement {
                kind: element.kind(),
            }
            .into());
        }

        match &element {
            Element::DoctorOffice {
                specialty, doctor, ..
            } => {
                let index = self.assign_specialty(specialty)?;
                self.grid.set(*doctor, Tile::Doctor(index))?;
            }
            other => {
                if let Some((location, tile)) = other.tile() {
                    self.grid.set(location, tile)?;
                }
            }
        }
        if let Some(spot) = element.patient_spot() {
            self.patient_spots.insert(spot);
        }

        debug!(kind = element.kind(), locations = ?locations, "element placed");
        self.elements.push(element);
        self.validated = false;
        Ok(())
    }

    fn assign_specialty(&mut self, specialty: &str) -> ScenarioResult<SpecialtyIndex> {
        let index = match self.specialties.iter().position(|s| s == specialty) {
            Some(i) => i,
            None => {
                if self.specialties.len() == MAX_SPECIALTIES {
                    return Err(ValidationError::TooManySpecialties {
                        count: MAX_SPECIALTIES + 1,
                    }
                    .into());
                }
                self.specialties.push(specialty.to_string());
                self.specialties.len() - 1
            }
        };
        Ok(SpecialtyIndex::new(index as i64)?)
    }

    /// Places a wall on every free border cell.
    ///
    /// # Errors
    ///
    /// Never fails in practice; border cells are always on the plan.
    pub fn enclose(&mut self) -> ScenarioResult<()> {
        let floors: Vec<Point> = self
            .grid
            .border()
            .filter(|p| {
                self.grid.get(*p) == Some(Tile::Floor) && !self.patient_spots.contains(p)
            })
            .collect();
        for point in floors {
            self.place(Element::Wall(point))?;
        }
        Ok(())
    }

    /// Stores the parameter document. Validation is deferred to
    /// [`Scenario::validate`].
    pub fn set_parameters(&mut self, parameters: Value) {
        self.parameters = Some(parameters);
        self.validated = false;
    }

    /// Validates the parameters against the schema, then cross-checks the
    /// placed doctor offices against the doctor parameters.
    ///
    /// Every placed specialty needs a `doctors[]` record and a
    /// `triage.doctors_probabilities[]` record, and triage may only send
    /// patients to specialties with a placed office.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found; `MissingParameter` with the
    /// path `parameters` if no document was set. Placed specialties are
    /// checked in order of first placement.
    pub fn validate(&mut self) -> ScenarioResult<()> {
        self.validated = false;
        let parameters = self
            .parameters
            .as_ref()
            .ok_or_else(|| ValidationError::MissingParameter {
                path: "parameters".to_string(),
            })?;

        debug!(
            elements = self.elements.len(),
            specialties = self.specialties.len(),
            "validating scenario"
        );
        self.schema.validate(parameters)?;

        self.check_doctors(parameters)?;

        self.validated = true;
        info!(
            width = self.grid.width(),
            height = self.grid.height(),
            elements = self.elements.len(),
            "scenario validated"
        );
        Ok(())
    }

    fn check_doctors(&self, parameters: &Value) -> Result<(), ValidationError> {
        let attended = specialties_of(parameters.get("doctors"));
        let routed = specialties_of(
            parameters
                .get("triage")
                .and_then(|t| t.get("doctors_probabilities")),
        );

        for specialty in &self.specialties {
            if !attended.contains(specialty.as_str()) {
                return Err(ValidationError::MissingDoctorParameters {
                    specialty: specialty.clone(),
                });
            }
            if !routed.contains(specialty.as_str()) {
                return Err(ValidationError::MissingDoctorProbability {
                    specialty: specialty.clone(),
                });
            }
        }

        if let Some(unplaced) = routed
            .into_iter()
            .find(|r| !self.specialties.iter().any(|s| s == r))
        {
            return Err(ValidationError::UnplacedSpecialty {
                specialty: unplaced.to_string(),
            });
        }
        Ok(())
    }

    /// Builds the interchange document.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::NotValidated` unless [`Scenario::validate`]
    /// succeeded after the last mutation.
    pub fn serialize(&self) -> ScenarioResult<ScenarioDocument> {
        if !self.validated {
            return Err(ScenarioError::NotValidated);
        }
        let parameters = self
            .parameters
            .clone()
            .ok_or_else(|| ScenarioError::internal("validated scenario has no parameters"))?;

        let mut building = Building::new(self.grid.width(), self.grid.height());
        for element in &self.elements {
            match element {
                Element::Wall(p) => building.walls.push(*p),
                Element::Chair(p) => building.chairs.push(*p),
                Element::Entry(p) => building.entry = Some(*p),
                Element::Exit(p) => building.exit = Some(*p),
                Element::Icu(p) => building.icu = Some(*p),
                Element::Triage { patient } => building.triages.push(TriageRecord {
                    patient_location: *patient,
                }),
                Element::Receptionist {
                    receptionist,
                    patient,
                } => building.receptionists.push(ReceptionistRecord {
                    receptionist_location: *receptionist,
                    patient_location: *patient,
                }),
                Element::DoctorOffice {
                    specialty,
                    doctor,
                    patient,
                } => building.doctors.push(DoctorRecord {
                    specialty: specialty.clone(),
                    doctor_location: *doctor,
                    patient_location: *patient,
                }),
            }
        }

        Ok(ScenarioDocument {
            building,
            parameters,
        })
    }

    /// Writes the interchange document to `folder/hospital.json`.
    ///
    /// The file is either completely written or left untouched; an
    /// unvalidated scenario writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::NotValidated` or an I/O error.
    pub fn save(&self, folder: &Path) -> ScenarioResult<PathBuf> {
        let text = self.serialize()?.to_json_string()?;
        artifact::write_atomic(folder.join(SCENARIO_FILE), text.as_bytes())
    }

    /// Writes the binary plan to `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn save_plan(&self, path: &Path) -> ScenarioResult<PathBuf> {
        artifact::write_atomic(path, &grid::encode(&self.grid))
    }

    /// Character art of the plan, highest `y` first. Patient spots of desks
    /// and offices are drawn as `P`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for y in (0..self.grid.height()).rev() {
            for x in 0..self.grid.width() {
                let point = Point::at(x, y);
                if self.patient_spots.contains(&point) {
                    out.push('P');
                } else {
                    out.push(self.grid.get(point).unwrap_or_default().char_art());
                }
            }
            out.push('\n');
        }
        out
    }

    /// Rebuilds a scenario from an interchange document. The parameters are
    /// stored but not validated.
    ///
    /// # Errors
    ///
    /// Fails like [`Scenario::new`] and [`Scenario::place`].
    pub fn from_document(document: ScenarioDocument) -> ScenarioResult<Self> {
        let ScenarioDocument {
            building,
            parameters,
        } = document;
        let mut scenario = Self::new(i64::from(building.width), i64::from(building.height))?;

        let singles = building
            .walls
            .into_iter()
            .map(Element::Wall)
            .chain(building.chairs.into_iter().map(Element::Chair))
            .chain(building.entry.map(Element::Entry))
            .chain(building.exit.map(Element::Exit))
            .chain(building.icu.map(Element::Icu));
        let desks = building
            .triages
            .into_iter()
            .map(|t| Element::triage(t.patient_location))
            .chain(
                building
                    .receptionists
                    .into_iter()
                    .map(|r| Element::receptionist(r.receptionist_location, r.patient_location)),
            )
            .chain(building.doctors.into_iter().map(|d| {
                Element::doctor_office(d.specialty, d.doctor_location, d.patient_location)
            }));

        for element in singles.chain(desks) {
            scenario.place(element)?;
        }
        scenario.set_parameters(parameters);
        Ok(scenario)
    }

    /// Parses and rebuilds a scenario from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Document` for malformed JSON, otherwise fails
    /// like [`Scenario::from_document`].
    pub fn from_json_str(text: &str) -> ScenarioResult<Self> {
        Self::from_document(ScenarioDocument::from_json_str(text)?)
    }
}

/// Specialties named by a list of records with a `specialty` key.
fn specialties_of(records: Option<&Value>) -> BTreeSet<&str> {
    records
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(|r| r.get("specialty").and_then(Value::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;

    fn p(x: u32, y: u32) -> Point {
        Point::at(x, y)
    }

    #[test]
    fn test_new_rejects_empty_plan() {
        let err = Scenario::new(0, 5).unwrap_err();
        assert!(err.is_geometry());
        assert!(Scenario::new(-3, 5).unwrap_err().is_geometry());
    }

    #[test]
    fn test_place_out_of_bounds_changes_nothing() {
        let mut scenario = Scenario::new(4, 4).unwrap();
        let err = scenario
            .place(Element::doctor_office("surgeon", p(1, 1), p(1, 4)))
            .unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Geometry(GeometryError::OutOfBounds { x: 1, y: 4, .. })
        ));
        assert!(scenario.elements().is_empty());
        assert!(scenario.specialties().is_empty());
        assert_eq!(scenario.grid().count(Tile::Floor), 16);
    }

    #[test]
    fn test_unique_elements() {
        let mut scenario = Scenario::new(4, 4).unwrap();
        scenario.place(Element::Entry(p(0, 1))).unwrap();
        scenario.place(Element::Exit(p(3, 1))).unwrap();
        let err = scenario.place(Element::Entry(p(0, 2))).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Validation(ValidationError::DuplicateElement { kind: "entry" })
        ));
    }

    #[test]
    fn test_specialties_indexed_by_first_placement() {
        let mut scenario = Scenario::new(6, 6).unwrap();
        scenario
            .place(Element::doctor_office("general", p(1, 1), p(1, 2)))
            .unwrap();
        scenario
            .place(Element::doctor_office("surgeon", p(3, 1), p(3, 2)))
            .unwrap();
        scenario
            .place(Element::doctor_office("general", p(5, 1), p(5, 2)))
            .unwrap();

        assert_eq!(scenario.specialties(), &["general", "surgeon"]);
        assert_eq!(scenario.grid().get(p(3, 1)), Some(Tile::doctor(1).unwrap()));
        assert_eq!(scenario.grid().get(p(5, 1)), Some(Tile::doctor(0).unwrap()));
        assert_eq!(scenario.grid().get(p(5, 2)), Some(Tile::Floor));
    }

    #[test]
    fn test_too_many_specialties() {
        let mut scenario = Scenario::new(129, 2).unwrap();
        for i in 0..128 {
            scenario
                .place(Element::doctor_office(format!("s{i}"), p(i, 0), p(i, 1)))
                .unwrap();
        }
        let err = scenario
            .place(Element::doctor_office("one more", p(128, 0), p(128, 1)))
            .unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Validation(ValidationError::TooManySpecialties { count: 129 })
        ));
    }

    #[test]
    fn test_enclose_skips_placed_tiles() {
        let mut scenario = Scenario::new(4, 3).unwrap();
        scenario.place(Element::Entry(p(0, 1))).unwrap();
        scenario.enclose().unwrap();
        assert_eq!(scenario.grid().count(Tile::Wall), 9);
        assert_eq!(scenario.grid().get(p(0, 1)), Some(Tile::Entry));
    }

    #[test]
    fn test_new_rejects_oversized_plan() {
        let err = Scenario::new(4_294_967_295, 4_294_967_295).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Geometry(GeometryError::InvalidDimensions {
                max_cells: grid::MAX_CELLS,
                ..
            })
        ));
        assert!(Scenario::new(1 << 13, 1 << 13).unwrap_err().is_geometry());
    }

    #[test]
    fn test_place_on_taken_cell_changes_nothing() {
        let mut scenario = Scenario::new(8, 8).unwrap();
        scenario.place(Element::Chair(p(7, 7))).unwrap();

        let err = scenario.place(Element::Wall(p(7, 7))).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Validation(ValidationError::Occupied {
                kind: "wall",
                occupant: "chair",
                x: 7,
                y: 7
            })
        ));
        assert_eq!(scenario.grid().get(p(7, 7)), Some(Tile::Chair));
        assert_eq!(scenario.elements().len(), 1);
    }

    #[test]
    fn test_patient_spots_are_reserved() {
        let mut scenario = Scenario::new(6, 6).unwrap();
        scenario
            .place(Element::doctor_office("general", p(2, 2), p(2, 3)))
            .unwrap();

        let err = scenario.place(Element::Chair(p(2, 3))).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Validation(ValidationError::Occupied {
                occupant: "a patient spot",
                ..
            })
        ));
        let err = scenario
            .place(Element::doctor_office("surgeon", p(4, 4), p(2, 2)))
            .unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Validation(ValidationError::Occupied {
                occupant: "doctor",
                ..
            })
        ));
        assert_eq!(scenario.specialties(), &["general"]);

        let err = scenario
            .place(Element::receptionist(p(4, 4), p(4, 4)))
            .unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Validation(ValidationError::Occupied {
                kind: "receptionist",
                occupant: "receptionist",
                ..
            })
        ));
    }

    #[test]
    fn test_enclose_skips_patient_spots() {
        let mut scenario = Scenario::new(4, 3).unwrap();
        scenario
            .place(Element::receptionist(p(1, 1), p(0, 1)))
            .unwrap();
        scenario.enclose().unwrap();
        assert_eq!(scenario.grid().get(p(0, 1)), Some(Tile::Floor));
        assert_eq!(scenario.grid().count(Tile::Wall), 9);
    }

    #[test]
    fn test_render_draws_patient_spots() {
        let mut scenario = Scenario::new(3, 2).unwrap();
        scenario
            .place(Element::receptionist(p(1, 1), p(1, 0)))
            .unwrap();
        scenario.place(Element::Chair(p(2, 0))).unwrap();
        assert_eq!(scenario.render(), " R \n Ph\n");
    }

    #[test]
    fn test_validate_without_parameters() {
        let mut scenario = Scenario::new(3, 3).unwrap();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Validation(ValidationError::MissingParameter { path }))
                if path == "parameters"
        ));
    }

    #[test]
    fn test_serialize_requires_validation() {
        let scenario = Scenario::new(3, 3).unwrap();
        assert!(matches!(scenario.serialize(), Err(ScenarioError::NotValidated)));
    }
}
