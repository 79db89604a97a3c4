use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// How the remaining tiles move after a pair is removed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MotionPolicy {
    /// Tiles never move, removed cells stay empty.
    #[default]
    Static,
    FallDown,
    RiseUp,
    SlideLeft,
    SlideRight,
    /// Left half packs to the left edge, right half to the right edge.
    SplitLeftRight,
    /// Top half packs to the top edge, bottom half to the bottom edge.
    SplitUpDown,
    /// The ring around each removed cell turns one step clockwise.
    RotateClockwise,
    /// The ring around each removed cell turns one step counterclockwise.
    RotateCounterclockwise,
}

impl MotionPolicy {
    pub const ALL: [MotionPolicy; 9] = [
        Self::Static,
        Self::FallDown,
        Self::RiseUp,
        Self::SlideLeft,
        Self::SlideRight,
        Self::SplitLeftRight,
        Self::SplitUpDown,
        Self::RotateClockwise,
        Self::RotateCounterclockwise,
    ];

    pub const fn name(self) -> &'static str {
        use MotionPolicy::*;
        match self {
            Static => "static",
            FallDown => "fall-down",
            RiseUp => "rise-up",
            SlideLeft => "slide-left",
            SlideRight => "slide-right",
            SplitLeftRight => "split-left-right",
            SplitUpDown => "split-up-down",
            RotateClockwise => "rotate-clockwise",
            RotateCounterclockwise => "rotate-counterclockwise",
        }
    }

    pub const fn is_static(self) -> bool {
        matches!(self, Self::Static)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Axis {
    Columns,
    Rows,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Pack {
    Start,
    End,
    Split,
}

/// Removes `removed` from play and repositions every remaining tile according to `policy`.
///
/// Tiles keep their id and kind, only their cell changes. Moved tiles remember where they are
/// drawn from in [`Tile::moving_from`] until the board is settled. Unknown or repeated ids mean
/// the caller lost track of the board and are reported as errors, as are tiles already out of play.
pub fn reflow(board: &Board, removed: &[TileId], policy: MotionPolicy) -> Result<Board> {
    use MotionPolicy::*;

    for (i, id) in removed.iter().enumerate() {
        if removed[..i].contains(id) {
            return Err(GameError::DuplicateTile(*id));
        }
    }
    for &id in removed {
        let tile = board.tile(id).ok_or(GameError::UnknownTile(id))?;
        if !tile.is_active() {
            return Err(GameError::TileAlreadyMatched(id));
        }
    }
    let expected = usize::from(board.occupied_count()) - removed.len();

    let matched = board.with_matched(removed)?;
    let size = matched.size();
    let mut tiles = matched.into_tiles();

    let mut grid: Array2<Option<usize>> = Array2::default(size.grid_index());
    for (index, tile) in tiles.iter().enumerate().filter(|(_, tile)| tile.is_active()) {
        grid[tile.pos.grid_index()] = Some(index);
    }

    let grid = match policy {
        Static => grid,
        FallDown => pack_lines(&grid, size, Axis::Columns, Pack::End),
        RiseUp => pack_lines(&grid, size, Axis::Columns, Pack::Start),
        SlideLeft => pack_lines(&grid, size, Axis::Rows, Pack::Start),
        SlideRight => pack_lines(&grid, size, Axis::Rows, Pack::End),
        SplitLeftRight => pack_lines(&grid, size, Axis::Rows, Pack::Split),
        SplitUpDown => pack_lines(&grid, size, Axis::Columns, Pack::Split),
        RotateClockwise | RotateCounterclockwise => {
            let clockwise = policy == RotateClockwise;
            let centers = removed.iter().filter_map(|&id| board.tile(id)).map(|t| t.pos);
            centers.fold(grid, |grid, center| rotate_ring(grid, size, center, clockwise))
        }
    };

    let mut moved = 0;
    for ((x, y), cell) in grid.indexed_iter() {
        let Some(index) = *cell else {
            continue;
        };
        // indices come from a grid of `size`, so they fit a Coord
        let pos = (x as Coord, y as Coord);
        let tile = &mut tiles[index];
        let drawn_at = tile.rendered_pos();
        if tile.pos != pos {
            moved += 1;
        }
        tile.pos = pos;
        tile.moving_from = (drawn_at != pos).then_some(drawn_at);
    }

    let board = Board::from_tiles(size, tiles)?;
    debug_assert_eq!(usize::from(board.occupied_count()), expected);
    log::debug!(
        "reflow {} removed {:?}, {} tiles moved",
        policy.name(),
        removed,
        moved
    );
    Ok(board)
}

/// Compacts every column or row independently, preserving the order of tiles along the line.
fn pack_lines(
    grid: &Array2<Option<usize>>,
    size: Coord2,
    axis: Axis,
    pack: Pack,
) -> Array2<Option<usize>> {
    let (lines, len) = match axis {
        Axis::Columns => (size.0, size.1),
        Axis::Rows => (size.1, size.0),
    };
    let at = |line: Coord, offset: Coord| -> [usize; 2] {
        match axis {
            Axis::Columns => (line, offset).grid_index(),
            Axis::Rows => (offset, line).grid_index(),
        }
    };
    let toward_start = |offset: Coord| match pack {
        Pack::Start => true,
        Pack::End => false,
        Pack::Split => 2 * u16::from(offset) + 1 < u16::from(len),
    };

    let mut packed: Array2<Option<usize>> = Array2::default(size.grid_index());
    for line in 0..lines {
        let (head, tail): (SmallVec<[_; 16]>, SmallVec<[_; 16]>) = (0..len)
            .filter_map(|offset| grid[at(line, offset)].map(|index| (offset, index)))
            .partition(|&(offset, _)| toward_start(offset));

        for (slot, &(_, index)) in head.iter().enumerate() {
            packed[at(line, slot as Coord)] = Some(index);
        }
        let first_tail_slot = usize::from(len) - tail.len();
        for (slot, &(_, index)) in tail.iter().enumerate() {
            packed[at(line, (first_tail_slot + slot) as Coord)] = Some(index);
        }
    }
    packed
}

/// Shifts the contents of the ring around `center` one step, empty cells included.
fn rotate_ring(
    mut grid: Array2<Option<usize>>,
    size: Coord2,
    center: Coord2,
    clockwise: bool,
) -> Array2<Option<usize>> {
    let ring: SmallVec<[Coord2; 8]> = ring_around(center, size).collect();
    if ring.len() < 2 {
        return grid;
    }
    let mut contents: SmallVec<[Option<usize>; 8]> =
        ring.iter().map(|&coords| grid[coords.grid_index()]).collect();
    if clockwise {
        contents.rotate_right(1);
    } else {
        contents.rotate_left(1);
    }
    for (&coords, content) in ring.iter().zip(contents) {
        grid[coords.grid_index()] = content;
    }
    grid
}
