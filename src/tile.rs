//! Tile kinds of the floor plan and their stable byte codes.
//!
//! The set of tiles is closed. Every kind except `Doctor` owns one code; a
//! doctor owns the 128 codes `128..=255`, one per specialty index.
//!
//! | Tile           | Code       |
//! |----------------|------------|
//! | Floor          | 0          |
//! | Wall           | 1          |
//! | Chair          | 16         |
//! | Entry          | 64         |
//! | Exit           | 65         |
//! | Triage         | 66         |
//! | ICU            | 67         |
//! | Receptionist   | 96         |
//! | Doctor(i)      | 128 + i    |

use crate::error::GeometryError;

/// First code of the doctor sub-range.
pub const DOCTOR_CODE_BASE: u8 = 128;

/// Number of distinct doctor specialties a plan can encode.
pub const MAX_SPECIALTIES: usize = 128;

/// Specialty index of a doctor tile, always in `[0, 127]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecialtyIndex(u8);

impl SpecialtyIndex {
    /// Creates a specialty index.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidSpecialtyIndex` outside `[0, 127]`.
    pub fn new(index: i64) -> Result<Self, GeometryError> {
        match u8::try_from(index) {
            Ok(i) if usize::from(i) < MAX_SPECIALTIES => Ok(Self(i)),
            _ => Err(GeometryError::InvalidSpecialtyIndex { index }),
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// One cell of the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tile {
    #[default]
    Floor,
    Wall,
    Chair,
    Entry,
    Exit,
    Triage,
    Icu,
    Receptionist,
    Doctor(SpecialtyIndex),
}

/// Static code table for the single-code tiles.
const FIXED_CODES: [(Tile, u8); 8] = [
    (Tile::Floor, 0),
    (Tile::Wall, 1),
    (Tile::Chair, 16),
    (Tile::Entry, 64),
    (Tile::Exit, 65),
    (Tile::Triage, 66),
    (Tile::Icu, 67),
    (Tile::Receptionist, 96),
];

/// Code-indexed lookup built once at compile time. `None` marks unused codes.
const DECODE_TABLE: [Option<Tile>; 256] = {
    let mut table: [Option<Tile>; 256] = [None; 256];
    let mut i = 0;
    while i < FIXED_CODES.len() {
        table[FIXED_CODES[i].1 as usize] = Some(FIXED_CODES[i].0);
        i += 1;
    }
    let mut code = DOCTOR_CODE_BASE as usize;
    while code < 256 {
        table[code] = Some(Tile::Doctor(SpecialtyIndex((code - DOCTOR_CODE_BASE as usize) as u8)));
        code += 1;
    }
    table
};

impl Tile {
    /// Creates a doctor tile for the given specialty index.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidSpecialtyIndex` outside `[0, 127]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hospital_scenario::Tile;
    ///
    /// assert_eq!(Tile::doctor(0).unwrap().code(), 128);
    /// assert_eq!(Tile::doctor(127).unwrap().code(), 255);
    /// assert!(Tile::doctor(128).is_err());
    /// ```
    pub fn doctor(index: i64) -> Result<Self, GeometryError> {
        SpecialtyIndex::new(index).map(Self::Doctor)
    }

    /// The byte this tile is stored as.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Floor => 0,
            Self::Wall => 1,
            Self::Chair => 16,
            Self::Entry => 64,
            Self::Exit => 65,
            Self::Triage => 66,
            Self::Icu => 67,
            Self::Receptionist => 96,
            Self::Doctor(index) => DOCTOR_CODE_BASE + index.0,
        }
    }

    /// Looks up the tile stored as `code`, if any.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        DECODE_TABLE[code as usize]
    }

    /// Whether a person can walk over this tile.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Wall | Self::Receptionist | Self::Doctor(_))
    }

    /// Single-character rendering used by the console plotter.
    #[must_use]
    pub const fn char_art(self) -> char {
        match self {
            Self::Floor => ' ',
            Self::Wall => '#',
            Self::Chair => 'h',
            Self::Entry => 'E',
            Self::Exit => 'X',
            Self::Triage => 'T',
            Self::Icu => 'I',
            Self::Receptionist => 'R',
            Self::Doctor(_) => 'D',
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Wall => "wall",
            Self::Chair => "chair",
            Self::Entry => "entry",
            Self::Exit => "exit",
            Self::Triage => "triage",
            Self::Icu => "icu",
            Self::Receptionist => "receptionist",
            Self::Doctor(_) => "doctor",
        }
    }
}
