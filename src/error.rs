//! Error types for scenario construction.
//!
//! Every failure is strongly typed with thiserror so callers can match on the
//! exact condition and surface the path, kind and offending value verbatim.
//! None of these errors are transient: they describe a malformed scenario.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building geometry: points, durations, tiles and grids.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Invalid point ({x}, {y}): coordinates must be >= 0")]
    InvalidPoint {
        x: i64,
        y: i64,
    },

    #[error("Invalid time period: {field} = {value} is outside [0, {max}]")]
    InvalidTimePeriod {
        field: &'static str,
        value: i64,
        max: i64,
    },

    #[error("Invalid doctor specialty index {index}, must be in [0, 127]")]
    InvalidSpecialtyIndex {
        index: i64,
    },

    #[error("Location ({x}, {y}) is outside the {width}x{height} plan")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    #[error("Invalid plan dimensions {width}x{height}: both must be >= 1 and the plan at most {max_cells} cells")]
    InvalidDimensions {
        width: i64,
        height: i64,
        max_cells: u64,
    },
}

/// Errors raised while decoding a binary plan buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Plan buffer too small: {len} bytes, header needs 16")]
    TooShort {
        len: usize,
    },

    #[error("Unknown magic bytes {found:?}")]
    BadMagic {
        found: [u8; 3],
    },

    #[error("Unsupported plan version {version}")]
    UnsupportedVersion {
        version: u8,
    },

    #[error("Plan payload has {actual} bytes, header declares {expected}")]
    PayloadLength {
        expected: u64,
        actual: u64,
    },

    #[error("Unknown tile code {code} at payload offset {offset}")]
    UnknownTileCode {
        code: u8,
        offset: usize,
    },
}

/// Errors raised while validating a parameter document or a scenario.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing parameter {path}")]
    MissingParameter {
        path: String,
    },

    #[error("{path} should be {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{path} = {value} is outside the probability range [0, 1)")]
    ProbabilityOutOfRange {
        path: String,
        value: f64,
    },

    #[error("Probability group '{group}' overflows: running sum {sum} exceeds 1")]
    ProbabilityGroupOverflow {
        group: String,
        sum: f64,
    },

    #[error("Probability group '{group}' does not sum 1: {sum}")]
    ProbabilityGroupIncomplete {
        group: String,
        sum: f64,
    },

    #[error("{path} {message}")]
    CustomValidationFailed {
        path: String,
        message: String,
    },

    #[error("List {path} is empty")]
    EmptyList {
        path: String,
    },

    #[error("Invalid schema at {path}: {reason}")]
    InvalidSchema {
        path: String,
        reason: String,
    },

    #[error("Missing parameters for doctor '{specialty}'")]
    MissingDoctorParameters {
        specialty: String,
    },

    #[error("No triage probability for doctor '{specialty}'")]
    MissingDoctorProbability {
        specialty: String,
    },

    #[error("Triage sends patients to '{specialty}', but no office of that specialty is placed")]
    UnplacedSpecialty {
        specialty: String,
    },

    #[error("Cannot place {kind} at ({x}, {y}): the cell is taken by {occupant}")]
    Occupied {
        kind: &'static str,
        occupant: &'static str,
        x: u32,
        y: u32,
    },

    #[error("Only one {kind} can be placed in a scenario")]
    DuplicateElement {
        kind: &'static str,
    },

    #[error("Too many doctor specialties ({count}), at most 128 are supported")]
    TooManySpecialties {
        count: usize,
    },
}

/// Errors raised while validating the process layout properties.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Invalid process layout {x}x{y}: both axes must be >= 1")]
    InvalidLayout {
        x: i64,
        y: i64,
    },

    #[error("{role} manager rank {rank} is outside [0, {process_count})")]
    InvalidManagerRank {
        role: &'static str,
        rank: i64,
        process_count: i64,
    },

    #[error("seconds per tick must be >= 0, got {seconds}")]
    InvalidSeconds {
        seconds: i64,
    },
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Malformed document: {message}")]
    Document {
        message: String,
    },

    #[error("Scenario must be validated before it is serialized")]
    NotValidated,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl ScenarioError {
    /// Creates a document error.
    #[must_use]
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it happened on.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this is a geometry error.
    #[must_use]
    pub const fn is_geometry(&self) -> bool {
        matches!(self, Self::Geometry(_))
    }

    /// Returns true if this is a binary format error.
    #[must_use]
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a layout error.
    #[must_use]
    pub const fn is_layout(&self) -> bool {
        matches!(self, Self::Layout(_))
    }

    /// Returns true if this is an I/O error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Result type alias for scenario operations.
pub type ScenarioResult<T> = Result<T, ScenarioError>;
