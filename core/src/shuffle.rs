use alloc::vec::Vec;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::*;

/// Deals the kinds of the tiles in play out again over the same cells.
///
/// Occupied cells and the number of tiles per kind stay the same, so every kind keeps an even
/// count. A single permutation is drawn; whether the result has a move left is up to the caller.
pub fn shuffle<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Board {
    let mut kinds: Vec<TileKind> = board.remaining().map(|tile| tile.kind).collect();
    kinds.shuffle(rng);

    let mut shuffled = board.settled().with_selection(None);
    for (tile, kind) in shuffled.remaining_mut().zip(kinds) {
        tile.kind = kind;
    }
    log::trace!("shuffled {} tiles", board.occupied_count());
    shuffled
}
