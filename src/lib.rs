//! race-2048: a 2048 rules engine + a timer-driven greedy opponent
//!
//! This crate provides:
//! - A compact `Board` type with table-driven slides and merge scoring (`engine` module)
//! - `GridEngine`, which owns a board and resolves moves, spawns and win/loss (`game` module)
//! - `HeuristicAgent`, a one-ply greedy player armed on a cooperative timer (`agent` module)
//! - A best-score persistence port (`store` module) and timing primitives (`schedule` module)
//!
//! Quick start:
//! ```
//! use race_2048::engine::Move;
//! use race_2048::game::{GridEngine, MoveOutcome};
//!
//! // Deterministic game with an in-memory best score
//! let mut game = GridEngine::seeded(42);
//! let outcome = game.make_move(Move::Left);
//! if outcome == MoveOutcome::NoChange {
//!     assert!(!game.can_move(Move::Left));
//! }
//! println!("{}", game.state());
//! ```
//!
//! Race (two isolated boards, virtual time)
//! ```
//! use std::time::Duration;
//! use race_2048::agent::HeuristicAgent;
//! use race_2048::engine::Move;
//! use race_2048::game::GridEngine;
//!
//! let mut human = GridEngine::seeded(1);
//! let mut computer = HeuristicAgent::new(GridEngine::seeded(2));
//! computer.start(Duration::ZERO);
//!
//! let mut now = Duration::ZERO;
//! for dir in [Move::Left, Move::Up, Move::Right, Move::Down] {
//!     human.make_move(dir);
//!     now += computer.config().move_delay;
//!     computer.poll(now);
//! }
//! assert_eq!(computer.stats().moves, 4);
//! ```
//!
pub mod agent;
pub mod engine;
pub mod error;
pub mod game;
pub mod schedule;
pub mod store;
