use alloc::vec::Vec;
use core::time::Duration;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Valid transitions:
/// - Idle -> Playing
/// - Playing -> Success
/// - Playing -> Failed
/// - any -> Playing, on restart
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No board dealt yet
    #[default]
    Idle,
    Playing,
    /// Board cleared
    Success,
    /// Out of time, or out of moves with no shuffles left
    Failed,
}

impl SessionStatus {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Indicates the round has ended and no moves can be made anymore
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// Outcome of picking a tile
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Tile became the first pick
    Selected,
    /// The first pick was picked again and released
    Deselected,
    /// The pick did not pair with the first one and took its place
    Replaced,
    /// Both picks were removed
    Matched,
    /// Tiles are still moving, the pick was ignored
    Busy,
}

impl SelectOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::Busy)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShuffleOutcome {
    Shuffled,
    /// No shuffles left this round
    Exhausted,
    /// Tiles are still moving
    Busy,
}

/// Everything the presentation layer needs to follow a round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    StatusChanged(SessionStatus),
    Selected(TileId),
    Deselected(TileId),
    Matched {
        first: TileId,
        second: TileId,
        path: ConnectionPath,
        score: u32,
    },
    TilesMoved(Vec<TileMove>),
    ReflowSettled,
    PathCleared,
    Shuffled {
        count: u8,
    },
    HintCleared,
    Tick {
        time_remaining: u16,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SessionTask {
    Countdown,
    Settle,
    ClearPath,
}

/// Drives one round after another: dealing, picks, matches, the clock and the end of the round.
///
/// The session is the only writer of its board. Engine functions get the current board and hand
/// back a new one, which the session commits. Deferred work (the countdown, tiles settling after a
/// reflow, hiding the last connection) lives in a [`TaskQueue`] that only moves when
/// [`Session::advance`] is called, and is dropped as soon as the round ends or restarts.
#[derive(Clone, Debug)]
pub struct Session {
    config: GameConfig,
    rng: SmallRng,
    board: Option<Board>,
    status: SessionStatus,
    score: u32,
    time_remaining: u16,
    shuffle_count: u8,
    selected: Option<TileId>,
    connection_path: Option<ConnectionPath>,
    hint: Option<(TileId, TileId)>,
    tasks: TaskQueue<SessionTask>,
    countdown: Option<TaskHandle>,
    settle: Option<TaskHandle>,
    path_clear: Option<TaskHandle>,
    events: Vec<SessionEvent>,
}

impl Session {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
            board: None,
            status: SessionStatus::Idle,
            score: 0,
            time_remaining: config.time_limit,
            shuffle_count: 0,
            selected: None,
            connection_path: None,
            hint: None,
            tasks: TaskQueue::new(),
            countdown: None,
            settle: None,
            path_clear: None,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> u16 {
        self.time_remaining
    }

    pub fn shuffle_count(&self) -> u8 {
        self.shuffle_count
    }

    pub fn shuffles_left(&self) -> u8 {
        self.config.shuffle_limit.saturating_sub(self.shuffle_count)
    }

    pub fn selected(&self) -> Option<&Tile> {
        self.board.as_ref()?.tile(self.selected?)
    }

    /// Route of the last match, until it is hidden again.
    pub fn connection_path(&self) -> Option<&ConnectionPath> {
        self.connection_path.as_ref()
    }

    pub fn current_hint(&self) -> Option<(TileId, TileId)> {
        self.hint
    }

    /// Whether tiles are still moving into place, picks are ignored meanwhile.
    pub fn is_settling(&self) -> bool {
        self.settle.is_some()
    }

    pub fn is_timer_running(&self) -> bool {
        self.countdown.is_some()
    }

    /// Drains the events produced since the last call.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        core::mem::take(&mut self.events)
    }

    /// Deals a fresh board and starts a round, any round in progress is dropped.
    pub fn start(&mut self) -> Result<()> {
        self.config.validate()?;
        let seed = self.rng.random();
        let board = RandomBoardGenerator::new(seed).generate(&self.config)?;
        self.begin(board);
        Ok(())
    }

    /// Starts a round on a prepared board, such as a fixed layout.
    pub fn start_with_board(&mut self, board: Board) -> Result<()> {
        if !board.has_even_kinds() {
            return Err(GameError::OddTileCount);
        }
        self.begin(board.settled().with_selection(None));
        Ok(())
    }

    pub fn restart(&mut self) -> Result<()> {
        self.start()
    }

    /// Applies new settings, a round in progress or finished is restarted with them.
    pub fn reconfigure(&mut self, config: GameConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        match self.status {
            SessionStatus::Idle => Ok(()),
            _ => self.start(),
        }
    }

    fn begin(&mut self, board: Board) {
        self.tasks.clear();
        self.countdown = None;
        self.settle = None;
        self.path_clear = None;
        self.board = Some(board);
        self.score = 0;
        self.time_remaining = self.config.time_limit;
        self.shuffle_count = 0;
        self.selected = None;
        self.connection_path = None;
        self.hint = None;
        self.set_status(SessionStatus::Playing);
        if self.config.timer_start == TimerStart::Immediately {
            self.start_countdown();
        }
        self.check_board();
    }

    fn start_countdown(&mut self) {
        if self.countdown.is_none() {
            self.countdown = Some(
                self.tasks
                    .schedule_repeating(TICK_PERIOD, SessionTask::Countdown),
            );
        }
    }

    fn check_playing(&self) -> Result<&Board> {
        match (self.status, &self.board) {
            (SessionStatus::Playing, Some(board)) => Ok(board),
            (SessionStatus::Idle, _) => Err(GameError::NotStarted),
            _ => Err(GameError::AlreadyEnded),
        }
    }

    /// Handles a pick of tile `id`.
    ///
    /// A pick that does not complete a pair is never an error, it simply becomes the new first
    /// pick. Errors are reserved for picks that cannot happen on this board.
    pub fn select(&mut self, id: TileId) -> Result<SelectOutcome> {
        let board = self.check_playing()?;
        let tile = *board.tile(id).ok_or(GameError::UnknownTile(id))?;
        if tile.is_matched {
            return Err(GameError::TileAlreadyMatched(id));
        }
        if self.is_settling() {
            return Ok(SelectOutcome::Busy);
        }

        let path = match self.selected {
            Some(current) if current != id => {
                let same_kind = board.tile(current).is_some_and(|first| first.kind == tile.kind);
                if same_kind {
                    find_path(board, current, id)?
                } else {
                    None
                }
            }
            _ => None,
        };

        self.start_countdown();
        self.clear_hint();

        let Some(current) = self.selected else {
            self.set_selection(Some(id));
            self.events.push(SessionEvent::Selected(id));
            return Ok(SelectOutcome::Selected);
        };

        if current == id {
            self.set_selection(None);
            self.events.push(SessionEvent::Deselected(id));
            return Ok(SelectOutcome::Deselected);
        }

        match path {
            Some(path) => {
                self.commit_match(current, id, path)?;
                Ok(SelectOutcome::Matched)
            }
            None => {
                log::trace!("tile {} does not pair with {}", id, current);
                self.set_selection(Some(id));
                self.events.push(SessionEvent::Deselected(current));
                self.events.push(SessionEvent::Selected(id));
                Ok(SelectOutcome::Replaced)
            }
        }
    }

    fn commit_match(&mut self, first: TileId, second: TileId, path: ConnectionPath) -> Result<()> {
        let board = self.check_playing()?;
        let next = reflow(board, &[first, second], self.config.motion)?;

        self.selected = None;
        self.score = self.score.saturating_add(self.config.match_score);
        log::debug!("matched {} and {}, score {}", first, second, self.score);
        self.events.push(SessionEvent::Matched {
            first,
            second,
            path: path.clone(),
            score: self.score,
        });
        self.show_path(path);

        let moves: Vec<TileMove> = next.pending_moves().collect();
        self.board = Some(next);

        if moves.is_empty() {
            self.check_board();
        } else {
            self.events.push(SessionEvent::TilesMoved(moves));
            let delay = self.config.settle_delay();
            if delay.is_zero() {
                self.settle_reflow();
            } else {
                self.settle = Some(self.tasks.schedule_once(delay, SessionTask::Settle));
            }
        }
        Ok(())
    }

    fn show_path(&mut self, path: ConnectionPath) {
        if let Some(handle) = self.path_clear.take() {
            self.tasks.cancel(handle);
        }
        self.connection_path = Some(path);
        self.path_clear = Some(
            self.tasks
                .schedule_once(self.config.path_display(), SessionTask::ClearPath),
        );
    }

    fn settle_reflow(&mut self) {
        self.settle = None;
        self.board = self.board.as_ref().map(Board::settled);
        self.events.push(SessionEvent::ReflowSettled);
        self.check_board();
    }

    /// Runs after every change of the board: ends the round when it is cleared, and keeps a move
    /// available by shuffling while the budget lasts.
    fn check_board(&mut self) {
        let Ok(board) = self.check_playing() else {
            return;
        };

        if board.is_cleared() {
            let bonus = self.config.time_bonus.saturating_mul(u32::from(self.time_remaining));
            self.score = self.score.saturating_add(bonus);
            self.finish(SessionStatus::Success);
            return;
        }

        while !self
            .board
            .as_ref()
            .is_some_and(has_matchable_pairs)
        {
            if self.shuffle_count >= self.config.shuffle_limit {
                log::debug!("no moves left after {} shuffles", self.shuffle_count);
                self.finish(SessionStatus::Failed);
                return;
            }
            self.shuffle_board();
        }
    }

    fn shuffle_board(&mut self) {
        let Some(board) = self.board.as_ref() else {
            return;
        };
        let shuffled = shuffle(board, &mut self.rng);
        self.board = Some(shuffled);
        self.selected = None;
        self.clear_hint();
        self.shuffle_count += 1;
        log::debug!("shuffle {}/{}", self.shuffle_count, self.config.shuffle_limit);
        self.events.push(SessionEvent::Shuffled {
            count: self.shuffle_count,
        });
    }

    /// Shuffles on the player's request, drawing from the same budget as automatic shuffles.
    pub fn request_shuffle(&mut self) -> Result<ShuffleOutcome> {
        self.check_playing()?;
        if self.is_settling() {
            return Ok(ShuffleOutcome::Busy);
        }
        if self.shuffle_count >= self.config.shuffle_limit {
            return Ok(ShuffleOutcome::Exhausted);
        }
        self.shuffle_board();
        self.check_board();
        Ok(ShuffleOutcome::Shuffled)
    }

    /// Looks up a pair to highlight. The hint is dropped again on the next change of the board.
    pub fn hint(&mut self) -> Option<(Tile, Tile)> {
        if self.is_settling() {
            return None;
        }
        let board = self.check_playing().ok()?;
        let (first, second) = find_hint(board)?;
        self.hint = Some((first.id, second.id));
        Some((first, second))
    }

    fn clear_hint(&mut self) {
        if self.hint.take().is_some() {
            self.events.push(SessionEvent::HintCleared);
        }
    }

    /// One second of the countdown. Does nothing outside of a round.
    pub fn tick(&mut self) {
        if !self.status.is_playing() {
            return;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        self.events.push(SessionEvent::Tick {
            time_remaining: self.time_remaining,
        });
        if self.time_remaining == 0 {
            log::debug!("time is up");
            self.finish(SessionStatus::Failed);
        }
    }

    /// Lets `elapsed` pass, running every task that falls due in order.
    pub fn advance(&mut self, elapsed: Duration) {
        let mut budget = elapsed;
        while let Some((handle, task)) = self.tasks.pop_due(&mut budget) {
            log::trace!("task {:?} due: {:?}", handle, task);
            match task {
                SessionTask::Countdown => self.tick(),
                SessionTask::Settle => self.settle_reflow(),
                SessionTask::ClearPath => {
                    self.path_clear = None;
                    if self.connection_path.take().is_some() {
                        self.events.push(SessionEvent::PathCleared);
                    }
                }
            }
        }
    }

    fn set_selection(&mut self, selected: Option<TileId>) {
        self.selected = selected;
        self.board = self.board.as_ref().map(|board| board.with_selection(selected));
    }

    fn finish(&mut self, status: SessionStatus) {
        self.tasks.clear();
        self.countdown = None;
        self.settle = None;
        self.path_clear = None;
        self.hint = None;
        if self.selected.take().is_some() {
            self.board = self.board.as_ref().map(|board| board.with_selection(None));
        }
        self.set_status(status);
    }

    fn set_status(&mut self, status: SessionStatus) {
        if self.status != status {
            log::debug!("session {:?} -> {:?}", self.status, status);
        }
        self.status = status;
        self.events.push(SessionEvent::StatusChanged(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const A: Option<TileKind> = Some(0);
    const B: Option<TileKind> = Some(1);
    const C: Option<TileKind> = Some(2);

    fn session_with(config: GameConfig, layout: (Coord2, &[Option<TileKind>])) -> Session {
        let mut session = Session::new(config, 11);
        let board = Board::from_kinds(layout.0, layout.1).unwrap();
        session.start_with_board(board).unwrap();
        session.take_events();
        session
    }

    fn static_config() -> GameConfig {
        GameConfig {
            size: (4, 1),
            kinds: 2,
            ..GameConfig::default()
        }
    }

    #[test]
    fn starts_idle_and_refuses_picks() {
        let mut session = Session::new(GameConfig::default(), 1);

        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.select(0), Err(GameError::NotStarted));
    }

    #[test]
    fn start_deals_a_playable_board() {
        let mut session = Session::new(GameConfig::default(), 1);

        session.start().unwrap();

        assert_eq!(session.status(), SessionStatus::Playing);
        assert!(session.is_timer_running());
        let board = session.board().unwrap();
        assert_eq!(board.occupied_count(), 80);
        assert!(board.has_even_kinds());
        assert!(has_matchable_pairs(board));
    }

    #[test]
    fn pick_twice_deselects() {
        let mut session = session_with(static_config(), ((4, 1), &[A, B, B, A]));

        assert_eq!(session.select(0), Ok(SelectOutcome::Selected));
        assert_eq!(session.selected().map(|t| t.id), Some(0));
        assert_eq!(session.select(0), Ok(SelectOutcome::Deselected));
        assert_eq!(session.selected(), None);
        assert_eq!(
            session.take_events(),
            vec![SessionEvent::Selected(0), SessionEvent::Deselected(0)]
        );
    }

    #[test]
    fn mismatched_pick_replaces_selection() {
        let mut session = session_with(static_config(), ((4, 1), &[A, B, B, A]));

        session.select(0).unwrap();
        assert_eq!(session.select(1), Ok(SelectOutcome::Replaced));
        assert_eq!(session.selected().map(|t| t.id), Some(1));
        assert_eq!(session.score(), 0);
        assert!(session.board().unwrap().tile(0).unwrap().is_active());
    }

    #[test]
    fn blocked_same_kind_pick_replaces_selection() {
        let config = GameConfig {
            size: (3, 3),
            ..static_config()
        };
        #[rustfmt::skip]
        let layout: &[Option<TileKind>] = &[
            A, C, C,
            C, None, C,
            C, C, A,
        ];
        let mut session = session_with(config, ((3, 3), layout));

        session.select(0).unwrap();
        assert_eq!(session.select(7), Ok(SelectOutcome::Replaced));
        assert_eq!(session.selected().map(|t| t.id), Some(7));
    }

    #[test]
    fn match_scores_and_shows_path() {
        let mut session = session_with(static_config(), ((4, 1), &[A, B, B, A]));

        session.select(1).unwrap();
        assert_eq!(session.select(2), Ok(SelectOutcome::Matched));

        assert_eq!(session.score(), 10);
        assert_eq!(session.selected(), None);
        assert!(session.connection_path().is_some());
        let events = session.take_events();
        assert!(events.iter().any(|event| matches!(
            event,
            SessionEvent::Matched { first: 1, second: 2, score: 10, .. }
        )));

        session.advance(Duration::from_millis(300));
        assert!(session.connection_path().is_none());
        assert!(session.take_events().contains(&SessionEvent::PathCleared));
    }

    #[test]
    fn clearing_the_board_succeeds_with_time_bonus() {
        let mut session = session_with(static_config(), ((4, 1), &[A, B, B, A]));

        session.select(1).unwrap();
        session.select(2).unwrap();
        session.advance(Duration::from_secs(10));
        session.select(0).unwrap();
        assert_eq!(session.select(3), Ok(SelectOutcome::Matched));

        assert_eq!(session.status(), SessionStatus::Success);
        assert_eq!(session.time_remaining(), 290);
        assert_eq!(session.score(), 20 + 2 * 290);
        assert!(!session.is_timer_running());
        assert_eq!(session.select(0), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn extreme_rewards_saturate() {
        let config = GameConfig {
            match_score: u32::MAX,
            time_bonus: u32::MAX,
            ..static_config()
        };
        let mut session = session_with(config, ((4, 1), &[A, B, B, A]));

        session.select(1).unwrap();
        session.select(2).unwrap();
        assert_eq!(session.score(), u32::MAX);
        session.select(0).unwrap();
        session.select(3).unwrap();

        assert_eq!(session.status(), SessionStatus::Success);
        assert_eq!(session.score(), u32::MAX);
    }

    #[test]
    fn countdown_fails_the_round() {
        let config = GameConfig {
            time_limit: 1,
            ..static_config()
        };
        let mut session = session_with(config, ((4, 1), &[A, B, B, A]));

        session.advance(Duration::from_millis(999));
        assert_eq!(session.status(), SessionStatus::Playing);
        session.advance(Duration::from_millis(1));

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.time_remaining(), 0);
        assert!(!session.is_timer_running());
    }

    #[test]
    fn timer_can_wait_for_first_pick() {
        let config = GameConfig {
            timer_start: TimerStart::OnFirstPick,
            ..static_config()
        };
        let mut session = session_with(config, ((4, 1), &[A, B, B, A]));

        session.advance(Duration::from_secs(5));
        assert_eq!(session.time_remaining(), 300);

        session.select(0).unwrap();
        session.advance(Duration::from_secs(5));
        assert_eq!(session.time_remaining(), 295);
    }

    #[test]
    fn picks_wait_for_tiles_to_settle() {
        let config = GameConfig {
            size: (2, 3),
            motion: MotionPolicy::FallDown,
            ..static_config()
        };
        #[rustfmt::skip]
        let layout: &[Option<TileKind>] = &[
            B, A,
            A, B,
            A, A,
        ];
        let mut session = session_with(config, ((2, 3), layout));

        session.select(2).unwrap();
        assert_eq!(session.select(4), Ok(SelectOutcome::Matched));
        assert!(session.is_settling());
        assert_eq!(session.select(1), Ok(SelectOutcome::Busy));
        assert!(session.hint().is_none());

        session.advance(Duration::from_millis(300));

        assert!(!session.is_settling());
        assert!(!session.board().unwrap().has_pending_moves());
        assert_eq!(session.select(1), Ok(SelectOutcome::Selected));
        let events = session.take_events();
        assert!(events.iter().any(|event| matches!(event, SessionEvent::TilesMoved(_))));
        assert!(events.contains(&SessionEvent::ReflowSettled));
    }

    #[test]
    fn deadlocked_board_is_shuffled_or_failed() {
        let config = GameConfig {
            size: (2, 2),
            ..static_config()
        };
        let mut session = session_with(config, ((2, 2), &[A, B, B, A]));

        assert!(session.shuffle_count() >= 1);
        match session.status() {
            SessionStatus::Playing => assert!(has_matchable_pairs(session.board().unwrap())),
            SessionStatus::Failed => assert_eq!(session.shuffle_count(), 3),
            status => panic!("unexpected status {status:?}"),
        }
    }

    #[test]
    fn deadlock_without_shuffles_fails() {
        let config = GameConfig {
            size: (2, 2),
            shuffle_limit: 0,
            ..static_config()
        };
        let mut session = Session::new(config, 3);
        let board = Board::from_kinds((2, 2), &[A, B, B, A]).unwrap();

        session.start_with_board(board).unwrap();

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.shuffle_count(), 0);
    }

    #[test]
    fn requested_shuffles_share_the_budget() {
        let config = GameConfig {
            shuffle_limit: 2,
            ..static_config()
        };
        let mut session = session_with(config, ((4, 1), &[A, A, B, B]));

        assert_eq!(session.request_shuffle(), Ok(ShuffleOutcome::Shuffled));
        assert_eq!(session.request_shuffle(), Ok(ShuffleOutcome::Shuffled));
        assert_eq!(session.request_shuffle(), Ok(ShuffleOutcome::Exhausted));
        assert_eq!(session.shuffles_left(), 0);
        assert!(session.board().unwrap().has_even_kinds());
    }

    #[test]
    fn hint_is_cleared_by_the_next_pick() {
        let mut session = session_with(static_config(), ((4, 1), &[A, B, B, A]));

        let (first, second) = session.hint().unwrap();
        assert_eq!(first.kind, second.kind);
        assert_eq!(session.current_hint(), Some((first.id, second.id)));

        session.select(0).unwrap();

        assert_eq!(session.current_hint(), None);
        assert!(session.take_events().contains(&SessionEvent::HintCleared));
    }

    #[test]
    fn restart_drops_pending_tasks() {
        let config = GameConfig {
            size: (4, 2),
            ..static_config()
        };
        let mut session = Session::new(config, 5);
        session.start().unwrap();
        session.advance(Duration::from_secs(3));

        session.restart().unwrap();

        assert_eq!(session.status(), SessionStatus::Playing);
        assert_eq!(session.time_remaining(), 300);
        assert_eq!(session.score(), 0);
        assert!(session.is_timer_running());
    }

    #[test]
    fn reconfigure_rejects_odd_boards() {
        let mut session = Session::new(static_config(), 5);
        let config = GameConfig {
            size: (3, 3),
            ..static_config()
        };

        assert_eq!(session.reconfigure(config), Err(GameError::OddTileCount));
        assert_eq!(session.config().size, (4, 1));
    }
}
