/// Single coordinate axis used for board width, height, and cell positions.
pub type Coord = u8;

/// Count type used for tile counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional cell coordinates `(x, y)`, `x` is the column and `y` the row.
pub type Coord2 = (Coord, Coord);

/// Coordinate on the padded grid, which extends one cell past every edge of the board.
pub type PaddedCoord = i16;

/// Point on the padded grid `(x, y)`, ranging over `-1..=width` and `-1..=height`.
pub type Point = (PaddedCoord, PaddedCoord);

/// Index into the `[x, y]` ordered occupancy grids backing a board.
pub trait GridIndex {
    fn grid_index(self) -> [usize; 2];
}

impl GridIndex for Coord2 {
    fn grid_index(self) -> [usize; 2] {
        [usize::from(self.0), usize::from(self.1)]
    }
}

pub trait ToPoint {
    fn to_point(self) -> Point;
}

impl ToPoint for Coord2 {
    fn to_point(self) -> Point {
        (self.0.into(), self.1.into())
    }
}

/// Number of cells on a board of `size`.
pub const fn cell_count((width, height): Coord2) -> CellCount {
    (width as CellCount).saturating_mul(height as CellCount)
}

/// Converts a padded point back to board coordinates, when it lies on the board itself.
pub fn point_to_coords((x, y): Point, (size_x, size_y): Coord2) -> Option<Coord2> {
    let x = Coord::try_from(x).ok()?;
    let y = Coord::try_from(y).ok()?;
    (x < size_x && y < size_y).then_some((x, y))
}

/// Offsets of the eight cells around a center, clockwise from the top-left corner.
const RING: [Point; 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

/// Cells of the ring surrounding `center` that lie on a board of `size`, clockwise.
pub fn ring_around(center: Coord2, size: Coord2) -> impl Iterator<Item = Coord2> {
    let (cx, cy) = center.to_point();
    RING.into_iter()
        .filter_map(move |(dx, dy)| point_to_coords((cx + dx, cy + dy), size))
}
