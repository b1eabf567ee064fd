//! Timer-driven greedy opponent.
//!
//! [`HeuristicAgent`] owns an engine and, while active, plays one move each
//! time its timer comes due. Moves are chosen by one-ply lookahead on cloned
//! state: the legal direction with the largest immediate merge score wins,
//! ties going to the first of `Left, Right, Up, Down`.
//!
//! Quick start (virtual time)
//! ```
//! use std::time::Duration;
//! use race_2048::agent::{AgentConfig, HeuristicAgent};
//! use race_2048::game::GridEngine;
//! use race_2048::schedule::{Clock, ManualClock};
//!
//! let clock = ManualClock::new();
//! let cfg = AgentConfig { move_delay: Duration::from_secs(1) };
//! let mut agent = HeuristicAgent::with_config(GridEngine::seeded(3), cfg);
//! agent.start(clock.now());
//! assert!(agent.poll(clock.now()).is_none());
//! clock.advance(Duration::from_secs(1));
//! let step = agent.poll(clock.now()).unwrap();
//! assert!(step.dir.is_some());
//! agent.stop();
//! assert!(agent.next_deadline().is_none());
//! ```

use std::time::Duration;

use rand::Rng;

use crate::engine::{Move, Score};
use crate::game::{GameState, GridEngine, MoveOutcome, Status};

mod greedy;
mod session;

pub use greedy::{best_move, branch_evals, choose};
pub use session::{AgentStep, HeuristicAgent};

/// The engine operations the agent relies on.
pub trait Playable {
    fn status(&self) -> Status;
    fn can_move(&self, dir: Move) -> bool;
    fn clone_state(&self) -> GameState;
    fn make_move(&mut self, dir: Move) -> MoveOutcome;
}

impl<R: Rng> Playable for GridEngine<R> {
    fn status(&self) -> Status { GridEngine::status(self) }
    fn can_move(&self, dir: Move) -> bool { GridEngine::can_move(self, dir) }
    fn clone_state(&self) -> GameState { GridEngine::clone_state(self) }
    fn make_move(&mut self, dir: Move) -> MoveOutcome { GridEngine::make_move(self, dir) }
}

/// Agent knobs.
///
/// - `move_delay`: time between scheduled moves.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub move_delay: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { move_delay: Duration::from_millis(1200) }
    }
}

/// Immediate score gain for one direction.
///
/// `legal` is false when the move is a no-op for the current board; `gain`
/// is then 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchEval {
    pub dir: Move,
    pub gain: Score,
    pub legal: bool,
}

/// Counters accumulated over the agent's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStats {
    pub moves: u64,
    pub branches_evaluated: u64,
}
