//! Physical elements placed on a hospital plan.

use crate::geometry::Point;
use crate::tile::Tile;

/// Something with a physical presence in the hospital.
///
/// Single-cell elements paint their tile at their location. Attention points
/// (triage, reception desks and doctor offices) also carry the spot where the
/// patient stands during attention; that spot stays walkable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Wall(Point),
    Chair(Point),
    Entry(Point),
    Exit(Point),
    Icu(Point),
    Triage {
        patient: Point,
    },
    Receptionist {
        receptionist: Point,
        patient: Point,
    },
    DoctorOffice {
        specialty: String,
        doctor: Point,
        patient: Point,
    },
}

impl Element {
    #[must_use]
    pub fn doctor_office(specialty: impl Into<String>, doctor: Point, patient: Point) -> Self {
        Self::DoctorOffice {
            specialty: specialty.into(),
            doctor,
            patient,
        }
    }

    #[must_use]
    pub const fn receptionist(receptionist: Point, patient: Point) -> Self {
        Self::Receptionist {
            receptionist,
            patient,
        }
    }

    #[must_use]
    pub const fn triage(patient: Point) -> Self {
        Self::Triage { patient }
    }

    /// Element kind, as used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Wall(_) => "wall",
            Self::Chair(_) => "chair",
            Self::Entry(_) => "entry",
            Self::Exit(_) => "exit",
            Self::Icu(_) => "icu",
            Self::Triage { .. } => "triage",
            Self::Receptionist { .. } => "receptionist",
            Self::DoctorOffice { .. } => "doctor office",
        }
    }

    /// Whether at most one element of this kind may be placed.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        matches!(self, Self::Entry(_) | Self::Exit(_) | Self::Icu(_))
    }

    /// Every location the element occupies.
    #[must_use]
    pub fn locations(&self) -> Vec<Point> {
        match self {
            Self::Wall(p) | Self::Chair(p) | Self::Entry(p) | Self::Exit(p) | Self::Icu(p) => {
                vec![*p]
            }
            Self::Triage { patient } => vec![*patient],
            Self::Receptionist {
                receptionist,
                patient,
            } => vec![*receptionist, *patient],
            Self::DoctorOffice {
                doctor, patient, ..
            } => vec![*doctor, *patient],
        }
    }

    /// Where a patient stands while being attended by a desk or office.
    #[must_use]
    pub const fn patient_spot(&self) -> Option<Point> {
        match self {
            Self::Receptionist { patient, .. } | Self::DoctorOffice { patient, .. } => {
                Some(*patient)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn specialty(&self) -> Option<&str> {
        match self {
            Self::DoctorOffice { specialty, .. } => Some(specialty.as_str()),
            _ => None,
        }
    }

    /// The tile painted on the plan and where. Doctor offices are painted by
    /// the scenario, which owns the specialty index assignment.
    pub(crate) const fn tile(&self) -> Option<(Point, Tile)> {
        match self {
            Self::Wall(p) => Some((*p, Tile::Wall)),
            Self::Chair(p) => Some((*p, Tile::Chair)),
            Self::Entry(p) => Some((*p, Tile::Entry)),
            Self::Exit(p) => Some((*p, Tile::Exit)),
            Self::Icu(p) => Some((*p, Tile::Icu)),
            Self::Triage { patient } => Some((*patient, Tile::Triage)),
            Self::Receptionist { receptionist, .. } => Some((*receptionist, Tile::Receptionist)),
            Self::DoctorOffice { .. } => None,
        }
    }
}
