//! Parameter schema every hospital scenario is validated against.
//!
//! Probability groups:
//! - `triage_diagnosis`: `triage.icu` plus every `triage.doctors_probabilities[].probability`
//! - `triage_levels`: every `triage.levels[].probability`
//! - `icu_sleep_times`: every `icu.sleep_times[].probability`
//!
//! All three must sum to exactly 1.

use super::{non_negative, rectangular, GroupPolicy, Parameter, ParameterSchema};
use crate::error::ValidationError;

pub const TRIAGE_DIAGNOSIS: &str = "triage_diagnosis";
pub const TRIAGE_LEVELS: &str = "triage_levels";
pub const ICU_SLEEP_TIMES: &str = "icu_sleep_times";

fn human() -> Parameter {
    Parameter::group(
        "human",
        [
            Parameter::probability("infect_probability")
                .help("Probability of infecting a nearby person per tick"),
            Parameter::float("infect_distance")
                .check(non_negative())
                .help("Maximum distance, in cells, at which infection happens"),
            Parameter::probability("contamination_probability")
                .help("Probability of contaminating a touched object"),
            Parameter::duration("incubation_time"),
        ],
    )
}

fn infectious_object(key: &str) -> Parameter {
    Parameter::group(
        key,
        [
            Parameter::probability("infect_probability"),
            Parameter::float("radius").check(non_negative()),
            Parameter::duration("cleaning_interval"),
        ],
    )
}

fn patient() -> Parameter {
    Parameter::group(
        "patient",
        [
            Parameter::float("walk_speed").check(non_negative()),
            Parameter::probability("infected_probability"),
            Parameter::matrix("influx")
                .check(rectangular())
                .help("Admissions per day (rows) and interval of the day (columns)"),
        ],
    )
}

fn triage() -> Parameter {
    Parameter::group(
        "triage",
        [
            Parameter::duration("attention_time"),
            Parameter::float("icu")
                .in_group(TRIAGE_DIAGNOSIS)
                .help("Probability of sending the patient straight to the ICU"),
            Parameter::list(
                "doctors_probabilities",
                [
                    Parameter::string("specialty"),
                    Parameter::float("probability").in_group(TRIAGE_DIAGNOSIS),
                ],
            ),
            Parameter::list(
                "levels",
                [
                    Parameter::int("level").check(non_negative()),
                    Parameter::float("probability").in_group(TRIAGE_LEVELS),
                    Parameter::duration("wait_time"),
                ],
            ),
        ],
    )
}

fn icu() -> Parameter {
    Parameter::group(
        "icu",
        [
            Parameter::int("beds").check(non_negative()),
            Parameter::group(
                "environment",
                [Parameter::probability("infection_probability")],
            ),
            Parameter::probability("dead_probability"),
            Parameter::list(
                "sleep_times",
                [
                    Parameter::duration("time"),
                    Parameter::float("probability").in_group(ICU_SLEEP_TIMES),
                ],
            ),
        ],
    )
}

/// Builds the hospital base schema.
///
/// # Errors
///
/// Only fails if the declarations themselves are inconsistent, which the unit
/// tests rule out.
pub fn schema() -> Result<ParameterSchema, ValidationError> {
    ParameterSchema::builder()
        .node(human())
        .node(Parameter::group(
            "objects",
            [infectious_object("chair"), infectious_object("bed")],
        ))
        .node(patient())
        .node(Parameter::group(
            "reception",
            [Parameter::duration("attention_time")],
        ))
        .node(triage())
        .node(icu())
        .node(Parameter::list(
            "doctors",
            [
                Parameter::string("specialty"),
                Parameter::duration("attention_duration"),
            ],
        ))
        .group_policy(TRIAGE_DIAGNOSIS, GroupPolicy::Exact)
        .group_policy(TRIAGE_LEVELS, GroupPolicy::Exact)
        .group_policy(ICU_SLEEP_TIMES, GroupPolicy::Exact)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TimePeriod;
    use crate::value::Value;

    fn minutes(m: i64) -> TimePeriod {
        TimePeriod::new(0, 0, m, 0).unwrap()
    }

    fn document() -> Value {
        let object = || {
            Value::record()
                .with("infect_probability", 0.05)
                .with("radius", 1.0)
                .with("cleaning_interval", TimePeriod::new(0, 6, 0, 0).unwrap())
        };
        Value::record()
            .with(
                "human",
                Value::record()
                    .with("infect_probability", 0.1)
                    .with("infect_distance", 2.0)
                    .with("contamination_probability", 0.01)
                    .with("incubation_time", TimePeriod::new(2, 0, 0, 0).unwrap()),
            )
            .with("objects", Value::record().with("chair", object()).with("bed", object()))
            .with(
                "patient",
                Value::record()
                    .with("walk_speed", 1.4)
                    .with("infected_probability", 0.2)
                    .with("influx", vec![vec![3_i64, 5, 2], vec![1, 0, 4]]),
            )
            .with("reception", Value::record().with("attention_time", minutes(5)))
            .with(
                "triage",
                Value::record()
                    .with("attention_time", minutes(10))
                    .with("icu", 0.1)
                    .with(
                        "doctors_probabilities",
                        vec![
                            Value::record().with("specialty", "general").with("probability", 0.6),
                            Value::record().with("specialty", "surgeon").with("probability", 0.3),
                        ],
                    )
                    .with(
                        "levels",
                        vec![
                            Value::record()
                                .with("level", 1)
                                .with("probability", 0.25)
                                .with("wait_time", minutes(0)),
                            Value::record()
                                .with("level", 2)
                                .with("probability", 0.75)
                                .with("wait_time", minutes(30)),
                        ],
                    ),
            )
            .with(
                "icu",
                Value::record()
                    .with("beds", 4)
                    .with("environment", Value::record().with("infection_probability", 0.02))
                    .with("dead_probability", 0.15)
                    .with(
                        "sleep_times",
                        vec![Value::record()
                            .with("time", TimePeriod::new(3, 0, 0, 0).unwrap())
                            .with("probability", 0.999_999_999_999)],
                    ),
            )
            .with(
                "doctors",
                vec![
                    Value::record()
                        .with("specialty", "general")
                        .with("attention_duration", minutes(15)),
                    Value::record()
                        .with("specialty", "surgeon")
                        .with("attention_duration", minutes(45)),
                ],
            )
    }

    #[test]
    fn test_schema_builds() {
        let schema = schema().unwrap();
        assert_eq!(schema.nodes().len(), 7);
        assert_eq!(schema.groups().len(), 3);
        assert!(schema
            .groups()
            .values()
            .all(|p| *p == GroupPolicy::Exact));
    }

    #[test]
    fn test_accepts_complete_document() {
        assert_eq!(schema().unwrap().validate(&document()), Ok(()));
    }

    #[test]
    fn test_triage_diagnosis_includes_icu() {
        let mut doc = document();
        if let Value::Record(root) = &mut doc {
            if let Some(Value::Record(triage)) = root.get_mut("triage") {
                triage.insert("icu".to_string(), Value::Float(0.2));
            }
        }
        assert!(matches!(
            schema().unwrap().validate(&doc),
            Err(ValidationError::ProbabilityGroupOverflow { group, .. }) if group == TRIAGE_DIAGNOSIS
        ));
    }

    #[test]
    fn test_jagged_influx_is_rejected() {
        let mut doc = document();
        if let Value::Record(root) = &mut doc {
            if let Some(Value::Record(patient)) = root.get_mut("patient") {
                patient.insert("influx".to_string(), Value::Matrix(vec![vec![1, 2], vec![3]]));
            }
        }
        assert!(matches!(
            schema().unwrap().validate(&doc),
            Err(ValidationError::CustomValidationFailed { path, .. }) if path == "patient.influx"
        ));
    }
}
