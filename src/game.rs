//! Game session over a packed [`Board`]: score, best score, status, and the
//! move pipeline (slide, spawn, terminal check).

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::engine::{self, Board, Move, Score, WIN_EXPONENT};
use crate::store::{BestScoreStore, MemoryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Playing,
    Won,
    Lost,
}

impl Status {
    /// The ending this status represents, if any.
    pub fn game_end(self) -> Option<GameEnd> {
        match self {
            Status::Playing => None,
            Status::Won => Some(GameEnd::Won),
            Status::Lost => Some(GameEnd::Lost),
        }
    }

    pub fn is_terminal(self) -> bool { self != Status::Playing }
}

/// How a game finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEnd {
    Won,
    Lost,
}

/// Result of one move attempt. `Won` and `Lost` imply the board changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveOutcome {
    NoChange,
    Changed,
    Won,
    Lost,
}

impl MoveOutcome {
    #[inline]
    pub fn changed(self) -> bool { self != MoveOutcome::NoChange }

    pub fn game_end(self) -> Option<GameEnd> {
        match self {
            MoveOutcome::Won => Some(GameEnd::Won),
            MoveOutcome::Lost => Some(GameEnd::Lost),
            _ => None,
        }
    }
}

/// Snapshot of a game. `Copy`, so clones never share storage with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    score: Score,
    best: Score,
    status: Status,
}

impl GameState {
    /// A state on `board` with zero score. A dead board starts out `Lost`.
    pub fn from_board(board: Board) -> Self {
        let status = if board.is_dead() { Status::Lost } else { Status::Playing };
        Self { board, score: 0, best: 0, status }
    }

    #[inline]
    pub fn board(&self) -> Board { self.board }

    #[inline]
    pub fn score(&self) -> Score { self.score }

    #[inline]
    pub fn best_score(&self) -> Score { self.best }

    #[inline]
    pub fn status(&self) -> Status { self.status }

    /// True iff sliding in `dir` would change the board.
    #[inline]
    pub fn can_move(&self, dir: Move) -> bool { self.board.shift(dir) != self.board }

    /// Slide and merge in `dir` without spawning, adding the merge score.
    /// Returns the score gained.
    pub fn slide(&mut self, dir: Move) -> Score {
        let (board, gained) = self.board.shift_scored(dir);
        self.board = board;
        self.score += gained;
        gained
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "score: {} | best: {} | {:?}", self.score, self.best, self.status)?;
        write!(f, "{}", self.board)
    }
}

/// Owns one board and resolves moves on it.
///
/// ```
/// use race_2048::engine::Move;
/// use race_2048::game::{GridEngine, Status};
///
/// let mut game = GridEngine::seeded(7);
/// assert_eq!(game.board().count_empty(), 14);
/// for dir in Move::ALL {
///     game.make_move(dir);
/// }
/// assert_eq!(game.status(), Status::Playing);
/// assert!(game.best_score() >= game.score());
/// ```
pub struct GridEngine<R = StdRng> {
    state: GameState,
    rng: R,
    store: Box<dyn BestScoreStore>,
}

impl GridEngine<StdRng> {
    /// Deterministic engine with an in-memory best score.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), Box::new(MemoryStore::default()))
    }
}

impl<R: Rng> GridEngine<R> {
    /// Load the best score from `store` and deal a fresh game.
    ///
    /// A store that fails to load is logged and treated as holding 0.
    pub fn new(rng: R, mut store: Box<dyn BestScoreStore>) -> Self {
        engine::new();
        let best = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load best score, starting from 0");
            0
        });
        let mut game = Self { state: GameState { best, ..GameState::from_board(Board::EMPTY) }, rng, store };
        game.new_game();
        game
    }

    /// Start from a given position (score 0) with an in-memory best score.
    /// A dead position is already `Lost`.
    pub fn from_board(board: Board, rng: R) -> Self {
        Self { state: GameState::from_board(board), rng, store: Box::new(MemoryStore::default()) }
    }

    /// Replace the board with two random tiles and reset score and status.
    /// The best score is kept.
    pub fn new_game(&mut self) -> GameState {
        let board = Board::EMPTY.with_random_tile(&mut self.rng).with_random_tile(&mut self.rng);
        self.state = GameState { best: self.state.best, ..GameState::from_board(board) };
        debug!(board = ?board, "new game");
        self.state
    }

    pub fn restart(&mut self) {
        info!(score = self.state.score, best = self.state.best, "restarting game");
        self.new_game();
    }

    /// Resolve one move.
    ///
    /// Rejected (returns `NoChange`) unless the game is playing. A move that
    /// changes the board spawns one tile, then checks for a win before a loss.
    /// A move that changes nothing still checks the board, so a dead position
    /// surfaces as `Status::Lost`.
    pub fn make_move(&mut self, dir: Move) -> MoveOutcome {
        if self.state.status != Status::Playing {
            return MoveOutcome::NoChange;
        }
        let before = self.state.board;
        let gained = self.state.slide(dir);
        if self.state.board == before {
            if before.is_dead() {
                self.state.status = Status::Lost;
                info!(score = self.state.score, "no moves left, game lost");
            }
            return MoveOutcome::NoChange;
        }

        self.state.board = self.state.board.with_random_tile(&mut self.rng);
        self.record_best();
        debug!(%dir, gained, score = self.state.score, "move applied");

        if self.state.board.contains_exponent(WIN_EXPONENT) {
            self.state.status = Status::Won;
            info!(score = self.state.score, "reached 2048, game won");
            MoveOutcome::Won
        } else if self.state.board.is_dead() {
            self.state.status = Status::Lost;
            info!(score = self.state.score, "board full with no merges, game lost");
            MoveOutcome::Lost
        } else {
            MoveOutcome::Changed
        }
    }

    /// True iff `dir` would change the board. Does not mutate.
    #[inline]
    pub fn can_move(&self, dir: Move) -> bool { self.state.can_move(dir) }

    /// Deep copy of the current state for speculative evaluation.
    #[inline]
    pub fn clone_state(&self) -> GameState { self.state }

    #[inline]
    pub fn state(&self) -> &GameState { &self.state }

    #[inline]
    pub fn board(&self) -> Board { self.state.board }

    #[inline]
    pub fn score(&self) -> Score { self.state.score }

    #[inline]
    pub fn best_score(&self) -> Score { self.state.best }

    /// Overwrite the in-memory best score (e.g. after the owner reloads it).
    pub fn set_best_score(&mut self, best: Score) { self.state.best = best; }

    #[inline]
    pub fn status(&self) -> Status { self.state.status }

    fn record_best(&mut self) {
        if self.state.score <= self.state.best {
            return;
        }
        self.state.best = self.state.score;
        info!(best = self.state.best, "new best score");
        if let Err(e) = self.store.save(self.state.best) {
            warn!(error = %e, "failed to persist best score");
        }
    }
}

impl<R> fmt::Debug for GridEngine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridEngine").field("state", &self.state).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rng() -> StdRng { StdRng::seed_from_u64(99) }

    fn game(rows: [[u32; 4]; 4]) -> GridEngine {
        GridEngine::from_board(Board::from_rows(rows).unwrap(), rng())
    }

    /// Every load and save fails.
    struct Broken;

    impl BestScoreStore for Broken {
        fn load(&mut self) -> Result<Score, StoreError> {
            Err(StoreError::Io { path: "best.json".into(), source: std::io::Error::new(std::io::ErrorKind::Other, "disk gone") })
        }
        fn save(&mut self, _best: Score) -> Result<(), StoreError> {
            Err(StoreError::Io { path: "best.json".into(), source: std::io::Error::new(std::io::ErrorKind::Other, "disk gone") })
        }
    }

    #[derive(Clone, Default)]
    struct Recording(Rc<RefCell<Vec<Score>>>);

    impl BestScoreStore for Recording {
        fn load(&mut self) -> Result<Score, StoreError> { Ok(100) }
        fn save(&mut self, best: Score) -> Result<(), StoreError> {
            self.0.borrow_mut().push(best);
            Ok(())
        }
    }

    #[test]
    fn new_game_deals_two_tiles() {
        let g = GridEngine::seeded(1);
        assert_eq!(g.board().count_empty(), 14);
        assert_eq!(g.score(), 0);
        assert_eq!(g.status(), Status::Playing);
    }

    #[test]
    fn changed_move_scores_and_spawns_once() {
        let mut g = game([[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]);
        assert_eq!(g.make_move(Move::Left), MoveOutcome::Changed);
        assert_eq!(g.score(), 8);
        assert_eq!(16 - g.board().count_empty(), 3);
        let row = g.board().rows()[0];
        assert_eq!(&row[..2], &[4, 4]);
    }

    #[test]
    fn no_op_move_leaves_everything_alone() {
        let mut g = game([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let before = g.clone_state();
        assert!(!g.can_move(Move::Left));
        assert!(!g.can_move(Move::Up));
        assert_eq!(g.make_move(Move::Left), MoveOutcome::NoChange);
        assert_eq!(g.clone_state(), before);
    }

    #[test]
    fn reaching_2048_wins_once() {
        let mut g = game([[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert_eq!(g.make_move(Move::Left), MoveOutcome::Won);
        assert_eq!(g.status(), Status::Won);
        assert_eq!(g.score(), 2048);
        let frozen = g.clone_state();
        for dir in Move::ALL {
            assert_eq!(g.make_move(dir), MoveOutcome::NoChange);
        }
        assert_eq!(g.clone_state(), frozen);
    }

    #[test]
    fn filling_the_last_cell_without_merges_loses() {
        let mut g = game([
            [8, 16, 32, 0],
            [64, 128, 256, 512],
            [2, 4, 8, 16],
            [4, 8, 16, 32],
        ]);
        assert_eq!(g.make_move(Move::Right), MoveOutcome::Lost);
        assert_eq!(g.status(), Status::Lost);
        assert_eq!(g.board().count_empty(), 0);
        assert_eq!(g.make_move(Move::Left), MoveOutcome::NoChange);
        assert_eq!(g.status(), Status::Lost);
    }

    #[test]
    fn dead_position_starts_lost() {
        let mut g = game([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert_eq!(g.status(), Status::Lost);
        assert_eq!(g.make_move(Move::Up), MoveOutcome::NoChange);
        assert_eq!(g.status(), Status::Lost);
    }

    #[test]
    fn no_op_on_dead_board_surfaces_loss() {
        let mut g = game([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        g.state.status = Status::Playing;
        assert_eq!(g.make_move(Move::Up), MoveOutcome::NoChange);
        assert_eq!(g.status(), Status::Lost);
    }

    #[test]
    fn clone_state_is_independent() {
        let g = game([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let mut trial = g.clone_state();
        assert_eq!(trial.slide(Move::Left), 4);
        assert_eq!(g.score(), 0);
        assert_eq!(g.board().rows()[0], [2, 2, 0, 0]);
    }

    #[test]
    fn best_score_loads_and_saves_through_store() {
        let saved = Recording::default();
        let mut g = GridEngine::new(rng(), Box::new(saved.clone()));
        assert_eq!(g.best_score(), 100);
        g.state = GameState { best: 100, ..GameState::from_board(Board::from_rows([[64, 64, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap()) };
        g.make_move(Move::Left);
        assert_eq!(g.score(), 128);
        assert_eq!(g.best_score(), 128);
        assert_eq!(*saved.0.borrow(), vec![128]);

        g.restart();
        assert_eq!(g.score(), 0);
        assert_eq!(g.best_score(), 128);
        assert_eq!(g.status(), Status::Playing);
    }

    #[test]
    fn best_score_untouched_below_record() {
        let saved = Recording::default();
        let mut g = GridEngine::new(rng(), Box::new(saved.clone()));
        g.state = GameState { best: 100, ..GameState::from_board(Board::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap()) };
        g.make_move(Move::Left);
        assert_eq!(g.best_score(), 100);
        assert!(saved.0.borrow().is_empty());
    }

    #[test]
    fn failing_store_does_not_stop_play() {
        let mut g = GridEngine::new(rng(), Box::new(Broken));
        assert_eq!(g.best_score(), 0);
        assert_eq!(g.status(), Status::Playing);
        g.state = GameState::from_board(Board::from_rows([[8, 8, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap());
        assert_eq!(g.make_move(Move::Left), MoveOutcome::Changed);
        assert_eq!(g.best_score(), 16);
        assert_eq!(g.status(), Status::Playing);
        let dir = Move::ALL.into_iter().find(|&d| g.can_move(d)).unwrap();
        assert!(g.make_move(dir).changed());
    }

    #[test]
    fn set_best_score_overrides_record() {
        let mut g = game([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        g.set_best_score(500);
        g.make_move(Move::Left);
        assert_eq!(g.best_score(), 500);
        g.set_best_score(0);
        assert_eq!(g.best_score(), 0);
    }

    #[test]
    fn outcome_and_status_name_the_same_end() {
        assert_eq!(MoveOutcome::Won.game_end(), Some(GameEnd::Won));
        assert_eq!(MoveOutcome::Lost.game_end(), Some(GameEnd::Lost));
        assert_eq!(MoveOutcome::Changed.game_end(), None);
        assert_eq!(MoveOutcome::NoChange.game_end(), None);

        let mut g = game([[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let outcome = g.make_move(Move::Left);
        assert_eq!(outcome.game_end(), g.status().game_end());
        assert!(g.status().is_terminal());
    }
}
