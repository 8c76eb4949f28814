//! Binary codec for floor plans.
//!
//! Format (all integers little-endian):
//! ```text
//! [magic: 3 bytes "PLA"][version: u8][columns: u32][rows: u32][reserved: 4 zero bytes]
//! [tile codes: columns * rows bytes, column-major]
//! ```
//!
//! The codec is a pure transformation between a [`Grid`] and a byte buffer.
//! Reading and writing files is left to the caller.

use crate::error::FormatError;
use crate::grid::Grid;
use crate::tile::Tile;

/// Magic bytes identifying a plan buffer.
pub const MAGIC: [u8; 3] = *b"PLA";

/// Version written by [`encode`].
pub const VERSION: u8 = 1;

/// Versions [`decode`] accepts.
pub const SUPPORTED_VERSIONS: [u8; 1] = [VERSION];

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Decoded plan header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanHeader {
    pub version: u8,
    pub columns: u32,
    pub rows: u32,
}

impl PlanHeader {
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self {
            version: VERSION,
            columns,
            rows,
        }
    }

    /// Serializes the header.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..3].copy_from_slice(&MAGIC);
        out[3] = self.version;
        out[4..8].copy_from_slice(&self.columns.to_le_bytes());
        out[8..12].copy_from_slice(&self.rows.to_le_bytes());
        // 12..16 reserved, left at zero.
        out
    }

    /// Parses and checks the header at the start of `buffer`.
    ///
    /// # Errors
    ///
    /// - `TooShort` if fewer than [`HEADER_SIZE`] bytes are available
    /// - `BadMagic` if the magic bytes differ
    /// - `UnsupportedVersion` if the version is not in [`SUPPORTED_VERSIONS`]
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, FormatError> {
        let Some(header) = buffer.get(..HEADER_SIZE) else {
            return Err(FormatError::TooShort { len: buffer.len() });
        };

        let found = [header[0], header[1], header[2]];
        if found != MAGIC {
            return Err(FormatError::BadMagic { found });
        }

        let version = header[3];
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(FormatError::UnsupportedVersion { version });
        }

        let columns = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let rows = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);

        Ok(Self {
            version,
            columns,
            rows,
        })
    }

    /// Number of payload bytes this header declares.
    #[must_use]
    pub fn payload_len(&self) -> u64 {
        u64::from(self.columns) * u64::from(self.rows)
    }
}

/// Serializes a grid to a plan buffer.
///
/// # Examples
///
/// ```
/// use hospital_scenario::{grid, Grid, Point, Tile};
///
/// let mut plan = Grid::new(2, 2);
/// plan.set(Point::at(1, 1), Tile::doctor(5).unwrap()).unwrap();
///
/// let bytes = grid::encode(&plan);
/// assert_eq!(bytes.len(), 16 + 4);
/// assert_eq!(grid::decode(&bytes).unwrap(), plan);
/// ```
#[must_use]
pub fn encode(grid: &Grid) -> Vec<u8> {
    let header = PlanHeader::new(grid.width(), grid.height());

    let mut out = Vec::with_capacity(HEADER_SIZE + grid.cells().len());
    out.extend_from_slice(&header.to_bytes());
    out.extend(grid.cells().iter().map(|tile| tile.code()));
    out
}

/// Deserializes a plan buffer.
///
/// The buffer must hold exactly the header plus `columns * rows` tile codes;
/// nothing is truncated or padded.
///
/// # Errors
///
/// Returns a [`FormatError`] for a short buffer, bad magic bytes, an
/// unsupported version, a payload of the wrong length or an unknown tile code.
pub fn decode(buffer: &[u8]) -> Result<Grid, FormatError> {
    let header = PlanHeader::from_bytes(buffer)?;
    let payload = &buffer[HEADER_SIZE..];

    let expected = header.payload_len();
    let actual = payload.len() as u64;
    if actual != expected {
        return Err(FormatError::PayloadLength { expected, actual });
    }

    let cells = payload
        .iter()
        .enumerate()
        .map(|(offset, &code)| {
            Tile::from_code(code).ok_or(FormatError::UnknownTileCode { code, offset })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Grid::from_cells(header.columns, header.rows, cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_header_layout() {
        let bytes = PlanHeader::new(3, 258).to_bytes();
        assert_eq!(&bytes[..3], b"PLA");
        assert_eq!(bytes[3], 1);
        assert_eq!(&bytes[4..8], &[3, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[2, 1, 0, 0]);
        assert_eq!(&bytes[12..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = PlanHeader::new(50, 36);
        assert_eq!(PlanHeader::from_bytes(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn test_encode_writes_codes_column_major() {
        let mut grid = Grid::new(2, 3);
        grid.set(Point::at(0, 2), Tile::Wall).unwrap();
        grid.set(Point::at(1, 0), Tile::Receptionist).unwrap();

        let bytes = encode(&grid);
        assert_eq!(&bytes[HEADER_SIZE..], &[0, 0, 1, 96, 0, 0]);
    }

    #[test]
    fn test_empty_grid_roundtrip() {
        let grid = Grid::new(0, 0);
        let bytes = encode(&grid);
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(decode(&bytes).unwrap(), grid);
    }

    #[test]
    fn test_rejects_short_buffer() {
        assert_eq!(decode(b"PLA\x01"), Err(FormatError::TooShort { len: 4 }));
    }

    #[test]
    fn test_rejects_unknown_tile() {
        let mut bytes = encode(&Grid::new(2, 2));
        bytes[HEADER_SIZE + 3] = 2;
        assert_eq!(
            decode(&bytes),
            Err(FormatError::UnknownTileCode { code: 2, offset: 3 })
        );
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = encode(&Grid::new(2, 2));
        bytes.push(0);
        assert_eq!(
            decode(&bytes),
            Err(FormatError::PayloadLength {
                expected: 4,
                actual: 5
            })
        );
    }
}
