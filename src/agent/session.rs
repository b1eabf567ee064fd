use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::engine::Move;
use crate::game::{GameEnd, MoveOutcome};
use crate::schedule::Timer;

use super::{greedy, AgentConfig, AgentStats, Playable};

/// What one fired cycle did.
///
/// `dir` is `None` when the cycle ended the game without moving (no legal
/// direction, or the engine was already finished). `end` is set on the cycle
/// that deactivated the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentStep {
    pub dir: Option<Move>,
    pub outcome: MoveOutcome,
    pub end: Option<GameEnd>,
}

type EndCallback = Box<dyn FnMut(GameEnd)>;

/// Plays an owned engine on a fixed delay.
///
/// Idle until [`start`](Self::start); back to idle on [`stop`](Self::stop)
/// or when the game ends. At most one move is pending at any time, and
/// nothing fires after `stop` returns.
pub struct HeuristicAgent<E> {
    engine: E,
    cfg: AgentConfig,
    active: bool,
    timer: Timer,
    on_game_end: Option<EndCallback>,
    stats: AgentStats,
}

impl<E: Playable> HeuristicAgent<E> {
    pub fn new(engine: E) -> Self { Self::with_config(engine, AgentConfig::default()) }

    pub fn with_config(engine: E, cfg: AgentConfig) -> Self {
        Self { engine, cfg, active: false, timer: Timer::default(), on_game_end: None, stats: AgentStats::default() }
    }

    /// Register the completion callback, replacing any previous one.
    pub fn on_game_end<F: FnMut(GameEnd) + 'static>(mut self, f: F) -> Self {
        self.set_on_game_end(f);
        self
    }

    pub fn set_on_game_end<F: FnMut(GameEnd) + 'static>(&mut self, f: F) {
        self.on_game_end = Some(Box::new(f));
    }

    /// Activate and arm the first move one delay after `now`. No-op if already active.
    pub fn start(&mut self, now: Duration) {
        if self.active {
            return;
        }
        self.active = true;
        self.timer.arm(now, self.cfg.move_delay);
        info!(delay_ms = self.cfg.move_delay.as_millis() as u64, "agent started");
    }

    /// Deactivate and cancel the pending move. Safe to call when idle.
    pub fn stop(&mut self) {
        let was_active = std::mem::replace(&mut self.active, false);
        self.timer.cancel();
        if was_active {
            info!(moves = self.stats.moves, "agent stopped");
        }
    }

    /// Run the pending cycle if it is due.
    ///
    /// Applies at most one move per call. The following move is armed one
    /// delay after `now`, so a late poll does not trigger catch-up moves.
    pub fn poll(&mut self, now: Duration) -> Option<AgentStep> {
        if !self.active || !self.timer.fire_if_due(now) {
            return None;
        }
        let step = self.cycle();
        if self.active {
            self.timer.arm(now, self.cfg.move_delay);
        }
        Some(step)
    }

    #[inline]
    pub fn is_active(&self) -> bool { self.active }

    /// When the pending move fires, if one is armed.
    #[inline]
    pub fn next_deadline(&self) -> Option<Duration> { self.timer.deadline() }

    #[inline]
    pub fn stats(&self) -> AgentStats { self.stats }

    #[inline]
    pub fn config(&self) -> &AgentConfig { &self.cfg }

    /// Read access for pollers (status, score, board).
    #[inline]
    pub fn engine(&self) -> &E { &self.engine }

    pub fn into_engine(self) -> E { self.engine }

    fn cycle(&mut self) -> AgentStep {
        if let Some(end) = self.engine.status().game_end() {
            self.finish(end);
            return AgentStep { dir: None, outcome: MoveOutcome::NoChange, end: Some(end) };
        }

        let evals = greedy::branch_evals(&self.engine);
        self.stats.branches_evaluated += evals.iter().filter(|e| e.legal).count() as u64;
        let Some(dir) = greedy::choose(&evals) else {
            debug!("no legal direction");
            self.finish(GameEnd::Lost);
            return AgentStep { dir: None, outcome: MoveOutcome::NoChange, end: Some(GameEnd::Lost) };
        };

        let outcome = self.engine.make_move(dir);
        self.stats.moves += 1;
        debug!(%dir, ?outcome, move_no = self.stats.moves, "agent moved");

        let end = self.engine.status().game_end();
        if let Some(end) = end {
            self.finish(end);
        }
        AgentStep { dir: Some(dir), outcome, end }
    }

    fn finish(&mut self, end: GameEnd) {
        self.active = false;
        self.timer.cancel();
        info!(?end, moves = self.stats.moves, "agent game over");
        if let Some(cb) = self.on_game_end.as_mut() {
            cb(end);
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for HeuristicAgent<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeuristicAgent")
            .field("engine", &self.engine)
            .field("cfg", &self.cfg)
            .field("active", &self.active)
            .field("timer", &self.timer)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
