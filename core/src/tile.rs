use serde::{Deserialize, Serialize};

use crate::*;

/// Stable tile identifier, unique within a round.
pub type TileId = u16;

/// Tile category, only tiles of the same kind can be paired.
pub type TileKind = u8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    /// Logical cell, authoritative for every rule.
    pub pos: Coord2,
    /// Cell the tile is visually moving away from after a reflow, cleared once the board settles.
    #[serde(default)]
    pub moving_from: Option<Coord2>,
    #[serde(default)]
    pub is_matched: bool,
    #[serde(default)]
    pub is_selected: bool,
}

impl Tile {
    pub const fn new(id: TileId, kind: TileKind, pos: Coord2) -> Self {
        Self {
            id,
            kind,
            pos,
            moving_from: None,
            is_matched: false,
            is_selected: false,
        }
    }

    /// Whether this tile still occupies its cell.
    pub const fn is_active(&self) -> bool {
        !self.is_matched
    }

    /// Where the presentation layer should currently draw the tile from.
    pub fn rendered_pos(&self) -> Coord2 {
        self.moving_from.unwrap_or(self.pos)
    }

    pub const fn is_moving(&self) -> bool {
        self.moving_from.is_some()
    }
}

/// A single tile displacement produced by a reflow.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMove {
    pub id: TileId,
    pub from: Coord2,
    pub to: Coord2,
}
