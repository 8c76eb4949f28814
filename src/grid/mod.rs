//! Dense floor-plan grid.
//!
//! Cells are stored column-major (`x` outer, `y` inner), the same order the
//! binary plan format uses, so encoding is a straight copy of the codes.

pub mod codec;

pub use codec::{decode, encode, PlanHeader, HEADER_SIZE, MAGIC, SUPPORTED_VERSIONS, VERSION};

use crate::error::GeometryError;
use crate::geometry::Point;
use crate::tile::Tile;

/// Largest plan accepted from untrusted dimensions, 4096 x 4096 cells.
pub const MAX_CELLS: u64 = 1 << 24;

/// A `width x height` matrix of tiles, addressed by `(x, y)`.
///
/// Every cell starts as [`Tile::Floor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Tile>,
}

impl Grid {
    /// Creates a grid filled with floor.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Tile::Floor; width as usize * height as usize],
        }
    }

    /// Creates a grid filled with floor from unchecked dimensions.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidDimensions` unless both dimensions are
    /// at least 1 and the plan holds at most [`MAX_CELLS`] cells.
    pub fn with_dimensions(width: i64, height: i64) -> Result<Self, GeometryError> {
        let invalid = || GeometryError::InvalidDimensions {
            width,
            height,
            max_cells: MAX_CELLS,
        };
        let w = u32::try_from(width).map_err(|_| invalid())?;
        let h = u32::try_from(height).map_err(|_| invalid())?;
        match u64::from(w).checked_mul(u64::from(h)) {
            Some(cells) if w > 0 && h > 0 && cells <= MAX_CELLS => Ok(Self::new(w, h)),
            _ => Err(invalid()),
        }
    }

    /// Builds a grid from column-major cells. The caller guarantees the length.
    pub(crate) fn from_cells(width: u32, height: u32, cells: Vec<Tile>) -> Self {
        debug_assert_eq!(cells.len(), width as usize * height as usize);
        Self {
            width,
            height,
            cells,
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Cells in storage order.
    #[must_use]
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x() < self.width && point.y() < self.height
    }

    fn index(&self, point: Point) -> Option<usize> {
        self.contains(point)
            .then(|| point.x() as usize * self.height as usize + point.y() as usize)
    }

    fn out_of_bounds(&self, point: Point) -> GeometryError {
        GeometryError::OutOfBounds {
            x: i64::from(point.x()),
            y: i64::from(point.y()),
            width: self.width,
            height: self.height,
        }
    }

    /// Checks that a point lies inside the plan.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::OutOfBounds` otherwise.
    pub fn check(&self, point: Point) -> Result<(), GeometryError> {
        if self.contains(point) {
            Ok(())
        } else {
            Err(self.out_of_bounds(point))
        }
    }

    #[must_use]
    pub fn get(&self, point: Point) -> Option<Tile> {
        self.index(point).map(|i| self.cells[i])
    }

    /// Replaces the tile at `point`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::OutOfBounds` if the point is outside the plan.
    pub fn set(&mut self, point: Point, tile: Tile) -> Result<(), GeometryError> {
        let i = self.index(point).ok_or_else(|| self.out_of_bounds(point))?;
        self.cells[i] = tile;
        Ok(())
    }

    /// Iterates `(point, tile)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, Tile)> + '_ {
        let height = self.height as usize;
        self.cells.iter().enumerate().map(move |(i, tile)| {
            // i < width * height, so both quotients fit in u32.
            #[allow(clippy::cast_possible_truncation)]
            let point = Point::at((i / height) as u32, (i % height) as u32);
            (point, *tile)
        })
    }

    /// Number of cells holding `tile`.
    #[must_use]
    pub fn count(&self, tile: Tile) -> usize {
        self.cells.iter().filter(|t| **t == tile).count()
    }

    /// Points on the border of the plan, each listed once.
    pub fn border(&self) -> impl Iterator<Item = Point> + '_ {
        let (w, h) = (self.width, self.height);
        self.iter()
            .map(|(p, _)| p)
            .filter(move |p| p.x() == 0 || p.y() == 0 || p.x() + 1 == w || p.y() + 1 == h)
    }

    /// Turns every floor cell on the border into a wall.
    pub fn border_walls(&mut self) {
        let floors: Vec<usize> = self
            .border()
            .filter_map(|p| self.index(p))
            .filter(|i| self.cells[*i] == Tile::Floor)
            .collect();
        for i in floors {
            self.cells[i] = Tile::Wall;
        }
    }

    /// Renders the plan as character art, highest `y` on the first line.
    #[must_use]
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let tile = self.get(Point::at(x, y)).unwrap_or_default();
                out.push(tile.char_art());
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_floor() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.cells().len(), 12);
        assert_eq!(grid.count(Tile::Floor), 12);
    }

    #[test]
    fn test_with_dimensions_bounds() {
        assert_eq!(Grid::with_dimensions(4096, 4096).unwrap().width(), 4096);
        for (width, height) in [(0, 3), (3, -1), (4097, 4096), (4_294_967_295, 4_294_967_295)] {
            assert_eq!(
                Grid::with_dimensions(width, height),
                Err(GeometryError::InvalidDimensions {
                    width,
                    height,
                    max_cells: MAX_CELLS
                })
            );
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = Grid::new(4, 3);
        grid.set(Point::at(3, 2), Tile::Chair).unwrap();
        assert_eq!(grid.get(Point::at(3, 2)), Some(Tile::Chair));
        assert_eq!(grid.get(Point::at(4, 0)), None);
    }

    #[test]
    fn test_set_out_of_bounds() {
        let mut grid = Grid::new(4, 3);
        assert_eq!(
            grid.set(Point::at(1, 3), Tile::Wall),
            Err(GeometryError::OutOfBounds {
                x: 1,
                y: 3,
                width: 4,
                height: 3
            })
        );
    }

    #[test]
    fn test_storage_is_column_major() {
        let mut grid = Grid::new(3, 2);
        grid.set(Point::at(1, 0), Tile::Wall).unwrap();
        assert_eq!(grid.cells()[2], Tile::Wall);

        let (point, tile) = grid.iter().nth(2).unwrap();
        assert_eq!(point, Point::at(1, 0));
        assert_eq!(tile, Tile::Wall);
    }

    #[test]
    fn test_border_walls_keep_existing_tiles() {
        let mut grid = Grid::new(5, 4);
        grid.set(Point::at(0, 2), Tile::Entry).unwrap();
        grid.border_walls();

        // 2 * 5 + 2 * 4 - 4 border cells, one of them is the entry.
        assert_eq!(grid.count(Tile::Wall), 13);
        assert_eq!(grid.get(Point::at(0, 2)), Some(Tile::Entry));
        assert_eq!(grid.get(Point::at(2, 2)), Some(Tile::Floor));
    }

    #[test]
    fn test_render_ascii_top_row_is_highest_y() {
        let mut grid = Grid::new(3, 2);
        grid.set(Point::at(0, 1), Tile::Wall).unwrap();
        grid.set(Point::at(2, 0), Tile::Chair).unwrap();
        assert_eq!(grid.render_ascii(), "#  \n  h\n");
    }
}
