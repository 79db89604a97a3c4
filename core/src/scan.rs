use serde::{Deserialize, Serialize};

use crate::*;

/// A connectable pair of tiles together with the route joining them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub first: TileId,
    pub second: TileId,
    pub path: ConnectionPath,
}

/// Iterates every connectable pair on the board, lazily, kind by kind.
fn matchable_pairs(board: &Board) -> impl Iterator<Item = Match> + '_ {
    board
        .kind_groups()
        .into_iter()
        .filter(|(_, group)| group.len() >= 2)
        .flat_map(move |(_, group)| {
            let pairs: alloc::vec::Vec<_> = group
                .iter()
                .enumerate()
                .flat_map(|(i, &first)| group[i + 1..].iter().map(move |&second| (first, second)))
                .collect();
            pairs.into_iter().filter_map(move |(first, second)| {
                find_path(board, first, second)
                    .ok()
                    .flatten()
                    .map(|path| Match {
                        first,
                        second,
                        path,
                    })
            })
        })
}

/// First connectable pair, scanning kinds in ascending order and tiles in id order.
pub fn find_matchable_pair(board: &Board) -> Option<Match> {
    matchable_pairs(board).next()
}

/// Whether at least one pair can still be removed, stops at the first one found.
pub fn has_matchable_pairs(board: &Board) -> bool {
    find_matchable_pair(board).is_some()
}

/// Number of pairs that could be removed right now.
pub fn count_matchable_pairs(board: &Board) -> usize {
    matchable_pairs(board).count()
}

/// Finds a pair to highlight for the player, without touching the board.
pub fn find_hint(board: &Board) -> Option<(Tile, Tile)> {
    let found = find_matchable_pair(board)?;
    Some((*board.tile(found.first)?, *board.tile(found.second)?))
}
