use thiserror::Error;

use crate::TileId;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Invalid game configuration")]
    InvalidConfig,
    #[error("Board would hold an odd number of tiles, some kind could never clear")]
    OddTileCount,
    #[error("Tile {0} is not on the board")]
    UnknownTile(TileId),
    #[error("Tile id {0} is used more than once")]
    DuplicateTile(TileId),
    #[error("Two unmatched tiles occupy the same cell")]
    OverlappingTiles,
    #[error("Tile {0} was already matched")]
    TileAlreadyMatched(TileId),
    #[error("A tile cannot be connected to itself")]
    SameTile,
    #[error("Only tiles of the same kind can be connected")]
    KindMismatch,
    #[error("Game has not started yet")]
    NotStarted,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = core::result::Result<T, GameError>;
