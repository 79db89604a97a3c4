use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Tiles of one kind still in play.
pub type KindGroup = SmallVec<[TileId; 8]>;

/// The grid of tiles for a single round.
///
/// Every tile ever generated stays in `tiles`, matched ones included, so ids remain stable for the
/// presentation layer. The occupancy grid only references tiles that are still in play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoardData", into = "BoardData")]
pub struct Board {
    size: Coord2,
    tiles: Vec<Tile>,
    cells: Array2<Option<usize>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct BoardData {
    size: Coord2,
    tiles: Vec<Tile>,
}

impl TryFrom<BoardData> for Board {
    type Error = GameError;

    fn try_from(data: BoardData) -> Result<Self> {
        Self::from_tiles(data.size, data.tiles)
    }
}

impl From<Board> for BoardData {
    fn from(board: Board) -> Self {
        Self {
            size: board.size,
            tiles: board.tiles,
        }
    }
}

impl Board {
    /// Builds a board from tiles in any order, they are kept sorted by id.
    pub fn from_tiles(size: Coord2, mut tiles: Vec<Tile>) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidConfig);
        }
        tiles.sort_unstable_by_key(|tile| tile.id);

        let mut cells: Array2<Option<usize>> = Array2::default(size.grid_index());
        let mut seen = HashSet::with_capacity(tiles.len());

        for (index, tile) in tiles.iter().enumerate() {
            if !seen.insert(tile.id) {
                return Err(GameError::DuplicateTile(tile.id));
            }
            if tile.pos.0 >= size.0 || tile.pos.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            if tile.is_matched {
                continue;
            }
            let cell = &mut cells[tile.pos.grid_index()];
            if cell.is_some() {
                return Err(GameError::OverlappingTiles);
            }
            *cell = Some(index);
        }

        Ok(Self { size, tiles, cells })
    }

    /// Builds a board from a row-major layout, `None` marks an empty cell.
    ///
    /// Ids are handed out in layout order starting at zero.
    pub fn from_kinds(size: Coord2, layout: &[Option<TileKind>]) -> Result<Self> {
        if layout.len() != usize::from(cell_count(size)) {
            return Err(GameError::InvalidConfig);
        }

        let width = usize::from(size.0.max(1));
        let mut tiles = Vec::with_capacity(layout.len());
        for (index, kind) in layout.iter().enumerate() {
            let Some(kind) = *kind else {
                continue;
            };
            let id = TileId::try_from(tiles.len()).map_err(|_| GameError::InvalidConfig)?;
            // both fit a Coord since the layout length equals width * height
            let pos = ((index % width) as Coord, (index / width) as Coord);
            tiles.push(Tile::new(id, kind, pos));
        }

        Self::from_tiles(size, tiles)
    }

    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn width(&self) -> Coord {
        self.size.0
    }

    pub fn height(&self) -> Coord {
        self.size.1
    }

    /// All tiles in id order, matched ones included.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }

    pub fn tile_at(&self, coords: Coord2) -> Option<&Tile> {
        if !self.is_in_bounds(coords) {
            return None;
        }
        self.cells[coords.grid_index()].map(|index| &self.tiles[index])
    }

    pub fn is_in_bounds(&self, coords: Coord2) -> bool {
        coords.0 < self.size.0 && coords.1 < self.size.1
    }

    /// Whether `point` lies on the board or on the empty border ring around it.
    pub fn is_in_padded_bounds(&self, (x, y): Point) -> bool {
        let (size_x, size_y) = self.size.to_point();
        (-1..=size_x).contains(&x) && (-1..=size_y).contains(&y)
    }

    /// Whether a connection may run through `point`.
    ///
    /// Empty cells and the border ring are passable, as are the cells of the `endpoints` themselves.
    pub fn is_passable(&self, point: Point, endpoints: [TileId; 2]) -> bool {
        if !self.is_in_padded_bounds(point) {
            return false;
        }
        match point_to_coords(point, self.size) {
            None => true,
            Some(coords) => self
                .tile_at(coords)
                .is_none_or(|tile| endpoints.contains(&tile.id)),
        }
    }

    /// Tiles still in play.
    pub fn remaining(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.is_active())
    }

    pub fn occupied_count(&self) -> CellCount {
        self.cells
            .iter()
            .filter(|cell| cell.is_some())
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX)
    }

    pub fn is_cleared(&self) -> bool {
        self.tiles.iter().all(|tile| tile.is_matched)
    }

    pub fn selected(&self) -> Option<&Tile> {
        self.remaining().find(|tile| tile.is_selected)
    }

    pub fn kind_counts(&self) -> HashMap<TileKind, CellCount> {
        let mut counts = HashMap::new();
        for tile in self.remaining() {
            *counts.entry(tile.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Whether every kind in play has an even number of tiles left.
    pub fn has_even_kinds(&self) -> bool {
        self.kind_counts().values().all(|count| count % 2 == 0)
    }

    /// Tiles in play grouped by kind, ordered by kind, each group in id order.
    pub fn kind_groups(&self) -> Vec<(TileKind, KindGroup)> {
        let mut groups: HashMap<TileKind, KindGroup> = HashMap::new();
        for tile in self.remaining() {
            groups.entry(tile.kind).or_default().push(tile.id);
        }
        let mut groups: Vec<_> = groups.into_iter().collect();
        groups.sort_unstable_by_key(|&(kind, _)| kind);
        groups
    }

    /// Moves of the last reflow that the presentation layer has not finished animating.
    pub fn pending_moves(&self) -> impl Iterator<Item = TileMove> + '_ {
        self.remaining().filter_map(|tile| {
            tile.moving_from.map(|from| TileMove {
                id: tile.id,
                from,
                to: tile.pos,
            })
        })
    }

    pub fn has_pending_moves(&self) -> bool {
        self.remaining().any(Tile::is_moving)
    }

    /// Copy of this board where every tile rests on its logical cell.
    pub fn settled(&self) -> Board {
        let mut board = self.clone();
        for tile in &mut board.tiles {
            tile.moving_from = None;
        }
        board
    }

    /// Copy of this board with `selected` as the only selected tile.
    pub fn with_selection(&self, selected: Option<TileId>) -> Board {
        let mut board = self.clone();
        for tile in &mut board.tiles {
            tile.is_selected = Some(tile.id) == selected && tile.is_active();
        }
        board
    }

    /// Copy of this board where `ids` are matched and removed from play.
    pub fn with_matched(&self, ids: &[TileId]) -> Result<Board> {
        let mut tiles = self.tiles.clone();
        for &id in ids {
            let tile = tiles
                .iter_mut()
                .find(|tile| tile.id == id)
                .ok_or(GameError::UnknownTile(id))?;
            tile.is_matched = true;
            tile.is_selected = false;
            tile.moving_from = None;
        }
        Board::from_tiles(self.size, tiles)
    }

    pub(crate) fn remaining_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.iter_mut().filter(|tile| tile.is_active())
    }

    pub(crate) fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }
}
