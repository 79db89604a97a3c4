#![no_std]

extern crate alloc;

use core::time::Duration;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use connect::*;
pub use error::*;
pub use generator::*;
pub use reflow::*;
pub use scan::*;
pub use session::*;
pub use shuffle::*;
pub use tile::*;
pub use timer::*;
pub use types::*;

mod board;
mod connect;
mod error;
mod generator;
mod reflow;
mod scan;
mod session;
mod shuffle;
mod tile;
mod timer;
mod types;

/// When the countdown of a round begins.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerStart {
    /// As soon as the board is dealt.
    #[default]
    Immediately,
    /// On the first tile the player picks.
    OnFirstPick,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board `(width, height)` in cells.
    pub size: Coord2,
    /// Number of distinct tile kinds dealt.
    pub kinds: TileKind,
    pub motion: MotionPolicy,
    /// Round length in seconds.
    pub time_limit: u16,
    /// Shuffles available per round, automatic and requested ones alike.
    pub shuffle_limit: u8,
    pub match_score: u32,
    /// Points per second left on the clock when the board is cleared.
    pub time_bonus: u32,
    pub timer_start: TimerStart,
    /// How long moved tiles take to settle, new picks wait for it.
    pub settle_delay_ms: u32,
    /// How long the connection of the last match stays visible.
    pub path_display_ms: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            size: (10, 8),
            kinds: 21,
            motion: MotionPolicy::Static,
            time_limit: 300,
            shuffle_limit: 3,
            match_score: 10,
            time_bonus: 2,
            timer_start: TimerStart::Immediately,
            settle_delay_ms: 300,
            path_display_ms: 300,
        }
    }
}

impl GameConfig {
    pub fn new((size_x, size_y): Coord2, kinds: TileKind, motion: MotionPolicy) -> Self {
        let size_x = size_x.clamp(1, Coord::MAX);
        let size_y = size_y.clamp(1, Coord::MAX);
        let kinds = kinds.clamp(1, TileKind::MAX);
        Self {
            size: (size_x, size_y),
            kinds,
            motion,
            ..Self::default()
        }
    }

    pub const fn total_cells(&self) -> CellCount {
        cell_count(self.size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size.0 == 0 || self.size.1 == 0 || self.kinds == 0 || self.time_limit == 0 {
            return Err(GameError::InvalidConfig);
        }
        if self.total_cells() % 2 != 0 {
            return Err(GameError::OddTileCount);
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms.into())
    }

    pub fn path_display(&self) -> Duration {
        Duration::from_millis(self.path_display_ms.into())
    }
}

/// A named preset for the level selection screen.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Level {
    pub id: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub motion: MotionPolicy,
}

impl Level {
    pub const ALL: &'static [Level] = &[
        Level::new(1, "Classic", "Tiles stay where they are", MotionPolicy::Static),
        Level::new(2, "Fall Down", "Tiles drop after a match", MotionPolicy::FallDown),
        Level::new(3, "Rise Up", "Tiles float up after a match", MotionPolicy::RiseUp),
        Level::new(4, "Slide Left", "Tiles slide left after a match", MotionPolicy::SlideLeft),
        Level::new(5, "Slide Right", "Tiles slide right after a match", MotionPolicy::SlideRight),
        Level::new(
            6,
            "Left-Right Split",
            "Tiles part towards both sides",
            MotionPolicy::SplitLeftRight,
        ),
        Level::new(
            7,
            "Up-Down Split",
            "Tiles part towards top and bottom",
            MotionPolicy::SplitUpDown,
        ),
        Level::new(
            8,
            "Clockwise",
            "Tiles around a match turn clockwise",
            MotionPolicy::RotateClockwise,
        ),
        Level::new(
            9,
            "Counterclockwise",
            "Tiles around a match turn counterclockwise",
            MotionPolicy::RotateCounterclockwise,
        ),
    ];

    const fn new(
        id: u8,
        name: &'static str,
        description: &'static str,
        motion: MotionPolicy,
    ) -> Self {
        Self {
            id,
            name,
            description,
            motion,
        }
    }

    pub fn by_id(id: u8) -> Option<&'static Level> {
        Self::ALL.iter().find(|level| level.id == id)
    }

    /// Default settings with this level's motion.
    pub fn config(&self) -> GameConfig {
        GameConfig {
            motion: self.motion,
            ..GameConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
        assert_eq!(GameConfig::default().total_cells(), 80);
    }

    #[test]
    fn new_clamps_degenerate_values() {
        let config = GameConfig::new((0, 0), 0, MotionPolicy::FallDown);

        assert_eq!(config.size, (1, 1));
        assert_eq!(config.kinds, 1);
        assert_eq!(config.validate(), Err(GameError::OddTileCount));
    }

    #[test]
    fn every_policy_has_a_level() {
        for policy in MotionPolicy::ALL {
            assert!(Level::ALL.iter().any(|level| level.motion == policy));
        }
        assert_eq!(Level::by_id(2).map(|level| level.motion), Some(MotionPolicy::FallDown));
        assert_eq!(Level::by_id(6).unwrap().config().motion, MotionPolicy::SplitLeftRight);
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"size": [6, 4], "motion": "split-up-down"}"#).unwrap();

        assert_eq!(config.size, (6, 4));
        assert_eq!(config.motion, MotionPolicy::SplitUpDown);
        assert_eq!(config.time_limit, 300);
        assert_eq!(config.shuffle_limit, 3);
    }
}
