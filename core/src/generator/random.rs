use alloc::vec::Vec;

use super::*;

/// Fills every cell of the board, handing out kinds in pairs before dealing them at random.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: &GameConfig) -> Result<Board> {
        use rand::prelude::*;

        config.validate()?;

        let (size_x, size_y) = config.size;
        let total_cells = config.total_cells();
        let pair_count = total_cells / 2;

        if pair_count < CellCount::from(config.kinds) {
            log::debug!(
                "Board only fits {} pairs, {} kinds requested, some kinds will not appear",
                pair_count,
                config.kinds
            );
        }

        let mut kinds: Vec<TileKind> = (0..pair_count)
            // the modulus keeps it below config.kinds
            .map(|pair| (pair % CellCount::from(config.kinds)) as TileKind)
            .flat_map(|kind| [kind, kind])
            .collect();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        kinds.shuffle(&mut rng);

        let positions = (0..size_y).flat_map(|y| (0..size_x).map(move |x| (x, y)));
        let tiles = kinds
            .into_iter()
            .zip(positions)
            .zip(0..)
            .map(|((kind, pos), id)| Tile::new(id, kind, pos))
            .collect();
        let board = Board::from_tiles(config.size, tiles)?;

        // double check the pairing
        if !board.has_even_kinds() {
            log::warn!("Generated board has an odd kind count, rejecting it");
            return Err(GameError::OddTileCount);
        }
        log::debug!(
            "Generated {}x{} board with {} kinds, seed {}",
            size_x,
            size_y,
            config.kinds,
            self.seed
        );
        Ok(board)
    }
}
