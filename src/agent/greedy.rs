use crate::engine::Move;

use super::{BranchEval, Playable};

/// Score each direction by applying it to a clone of the engine's state.
///
/// Returned in `Move::ALL` order. The engine itself is never touched.
pub fn branch_evals<E: Playable + ?Sized>(engine: &E) -> [BranchEval; 4] {
    Move::ALL.map(|dir| {
        if !engine.can_move(dir) {
            return BranchEval { dir, gain: 0, legal: false };
        }
        let mut trial = engine.clone_state();
        let before = trial.score();
        trial.slide(dir);
        BranchEval { dir, gain: trial.score() - before, legal: true }
    })
}

/// Pick the legal branch with the strictly greatest gain; earlier entries win ties.
pub fn choose(evals: &[BranchEval]) -> Option<Move> {
    let mut best: Option<BranchEval> = None;
    for &eval in evals.iter().filter(|e| e.legal) {
        if best.map_or(true, |b| eval.gain > b.gain) {
            best = Some(eval);
        }
    }
    best.map(|b| b.dir)
}

/// One-ply greedy choice. `None` when no direction changes the board.
#[inline]
pub fn best_move<E: Playable + ?Sized>(engine: &E) -> Option<Move> { choose(&branch_evals(engine)) }
