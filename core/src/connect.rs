use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::*;

/// Route between two tiles on the padded grid, as its start, corners and end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPath {
    points: SmallVec<[Point; 4]>,
}

impl ConnectionPath {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Number of direction changes along the path.
    pub fn turns(&self) -> usize {
        self.points
            .windows(3)
            .filter(|w| direction(w[0], w[1]) != direction(w[1], w[2]))
            .count()
    }

    /// Number of cells walked from start to end.
    pub fn length(&self) -> u32 {
        walked_length(&self.points)
    }

    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }
}

fn walked_length(points: &[Point]) -> u32 {
    points
        .windows(2)
        .map(|w| u32::from(w[0].0.abs_diff(w[1].0)) + u32::from(w[0].1.abs_diff(w[1].1)))
        .sum()
}

fn direction(from: Point, to: Point) -> (i16, i16) {
    ((to.0 - from.0).signum(), (to.1 - from.1).signum())
}

/// Looks for a connection with at most two turns between tiles `a` and `b`.
///
/// Both tiles must be distinct, in play, and of the same kind, otherwise this is a misuse and an
/// error is returned. `Ok(None)` means the tiles simply cannot be connected right now.
pub fn find_path(board: &Board, a: TileId, b: TileId) -> Result<Option<ConnectionPath>> {
    if a == b {
        return Err(GameError::SameTile);
    }
    let first = board.tile(a).ok_or(GameError::UnknownTile(a))?;
    let second = board.tile(b).ok_or(GameError::UnknownTile(b))?;
    if first.is_matched {
        return Err(GameError::TileAlreadyMatched(a));
    }
    if second.is_matched {
        return Err(GameError::TileAlreadyMatched(b));
    }
    if first.kind != second.kind {
        return Err(GameError::KindMismatch);
    }

    let finder = PathFinder {
        board,
        endpoints: [a, b],
    };
    let start = first.pos.to_point();
    let end = second.pos.to_point();

    let path = finder
        .straight(start, end)
        .or_else(|| finder.one_turn(start, end))
        .or_else(|| finder.two_turns(start, end));
    Ok(path.map(|points| ConnectionPath { points }))
}

/// Whether tiles `a` and `b` can be paired right now, misuse counts as not connectable.
pub fn can_connect(board: &Board, a: TileId, b: TileId) -> bool {
    matches!(find_path(board, a, b), Ok(Some(_)))
}

type Points = SmallVec<[Point; 4]>;

struct PathFinder<'a> {
    board: &'a Board,
    endpoints: [TileId; 2],
}

impl PathFinder<'_> {
    fn passable(&self, point: Point) -> bool {
        self.board.is_passable(point, self.endpoints)
    }

    /// Whether `from` and `to` share a line and every cell strictly between them is passable.
    fn is_clear(&self, from: Point, to: Point) -> bool {
        if from.0 == to.0 {
            let (lo, hi) = (from.1.min(to.1), from.1.max(to.1));
            (lo + 1..hi).all(|y| self.passable((from.0, y)))
        } else if from.1 == to.1 {
            let (lo, hi) = (from.0.min(to.0), from.0.max(to.0));
            (lo + 1..hi).all(|x| self.passable((x, from.1)))
        } else {
            false
        }
    }

    fn straight(&self, start: Point, end: Point) -> Option<Points> {
        self.is_clear(start, end).then(|| smallvec![start, end])
    }

    fn one_turn(&self, start: Point, end: Point) -> Option<Points> {
        if start.0 == end.0 || start.1 == end.1 {
            return None;
        }
        [(end.0, start.1), (start.0, end.1)]
            .into_iter()
            .find(|&corner| {
                self.passable(corner) && self.is_clear(start, corner) && self.is_clear(corner, end)
            })
            .map(|corner| smallvec![start, corner, end])
    }

    /// Scans every column and row of the padded grid for a pair of corners joining the
    /// straight extensions of both endpoints, keeping the shortest route.
    fn two_turns(&self, start: Point, end: Point) -> Option<Points> {
        let (size_x, size_y) = self.board.size().to_point();

        let via_columns = (-1..=size_x)
            .filter(|&x| x != start.0 && x != end.0)
            .map(|x| ((x, start.1), (x, end.1)));
        let via_rows = (-1..=size_y)
            .filter(|&y| y != start.1 && y != end.1)
            .map(|y| ((start.0, y), (end.0, y)));

        via_columns
            .chain(via_rows)
            .filter(|&(c1, c2)| c1 != c2)
            .filter(|&(c1, c2)| {
                self.passable(c1)
                    && self.passable(c2)
                    && self.is_clear(start, c1)
                    && self.is_clear(c1, c2)
                    && self.is_clear(c2, end)
            })
            .map(|(c1, c2)| -> Points { smallvec![start, c1, c2, end] })
            .min_by_key(|points| walked_length(points))
    }
}
