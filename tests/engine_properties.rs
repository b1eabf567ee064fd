//! Board and engine invariants checked over generated positions.
use proptest::prelude::*;
use race_2048::engine::{Board, Move};
use race_2048::game::{GridEngine, MoveOutcome, Status};
use rand::{rngs::StdRng, SeedableRng};

fn board_from_exponents(exps: &[u64]) -> Board {
    let raw = exps.iter().fold(0u64, |acc, &e| (acc << 4) | e);
    Board::from_raw(raw)
}

/// Straightforward list-based merge toward index 0.
fn reference_merge(line: [u32; 4]) -> ([u32; 4], u64) {
    let tiles: Vec<u32> = line.iter().copied().filter(|&v| v != 0).collect();
    let mut out = Vec::with_capacity(4);
    let mut gained = 0u64;
    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] && tiles[i] < 32768 {
            out.push(tiles[i] * 2);
            gained += (tiles[i] * 2) as u64;
            i += 2;
        } else {
            out.push(tiles[i]);
            i += 1;
        }
    }
    out.resize(4, 0);
    ([out[0], out[1], out[2], out[3]], gained)
}

fn reference_shift(rows: [[u32; 4]; 4], dir: Move) -> ([[u32; 4]; 4], u64) {
    let mut out = [[0u32; 4]; 4];
    let mut gained = 0;
    for i in 0..4 {
        // Gather line i ordered from the target edge inward.
        let line: [u32; 4] = std::array::from_fn(|k| match dir {
            Move::Left => rows[i][k],
            Move::Right => rows[i][3 - k],
            Move::Up => rows[k][i],
            Move::Down => rows[3 - k][i],
        });
        let (merged, g) = reference_merge(line);
        gained += g;
        for (k, &v) in merged.iter().enumerate() {
            match dir {
                Move::Left => out[i][k] = v,
                Move::Right => out[i][3 - k] = v,
                Move::Up => out[k][i] = v,
                Move::Down => out[3 - k][i] = v,
            }
        }
    }
    (out, gained)
}

fn any_dir() -> impl Strategy<Value = Move> {
    prop::sample::select(Move::ALL.to_vec())
}

fn mostly_full_cell() -> impl Strategy<Value = u64> {
    prop_oneof![1 => Just(0u64), 6 => 1u64..=10]
}

proptest! {
    #[test]
    fn table_shift_matches_reference(exps in prop::collection::vec(0u64..=15, 16), dir in any_dir()) {
        let board = board_from_exponents(&exps);
        let (moved, gained) = board.shift_scored(dir);
        let (expected, expected_gain) = reference_shift(board.rows(), dir);
        prop_assert_eq!(moved.rows(), expected);
        prop_assert_eq!(gained, expected_gain);
        prop_assert_eq!(moved.tile_sum(), board.tile_sum());
    }

    #[test]
    fn move_adds_at_most_one_tile_and_scores_merges(
        exps in prop::collection::vec(0u64..=10, 16),
        dir in any_dir(),
        seed in any::<u64>(),
    ) {
        let board = board_from_exponents(&exps);
        let mut game = GridEngine::from_board(board, StdRng::seed_from_u64(seed));
        let (_, gained) = board.shift_scored(dir);
        let filled_before = 16 - board.count_empty();
        let outcome = game.make_move(dir);
        let filled_after = 16 - game.board().count_empty();
        prop_assert!(filled_after <= filled_before + 1);
        prop_assert_eq!(game.score(), gained);
        if outcome.changed() {
            // The spawned tile is the only value not accounted for by the slide.
            let spawned = game.board().tile_sum() - board.tile_sum();
            prop_assert!(spawned == 2 || spawned == 4);
        }
    }

    #[test]
    fn illegal_move_is_a_no_op(exps in prop::collection::vec(mostly_full_cell(), 16)) {
        let board = board_from_exponents(&exps);
        for dir in Move::ALL {
            let mut game = GridEngine::from_board(board, StdRng::seed_from_u64(0));
            if game.can_move(dir) {
                continue;
            }
            prop_assert_eq!(game.make_move(dir), MoveOutcome::NoChange);
            prop_assert_eq!(game.board(), board);
            prop_assert_eq!(game.score(), 0);
            let expected = if board.is_dead() { Status::Lost } else { Status::Playing };
            prop_assert_eq!(game.status(), expected);
        }
    }

    #[test]
    fn dead_scan_agrees_with_shift_check(exps in prop::collection::vec(1u64..=4, 16)) {
        // Full boards over few values: plenty of both dead and live positions.
        let board = board_from_exponents(&exps);
        prop_assert_eq!(board.is_dead(), board.is_game_over());
        prop_assert_eq!(board.is_dead(), Move::ALL.iter().all(|&d| board.shift(d) == board));
    }

    #[test]
    fn terminal_status_is_sticky(seed in any::<u64>(), dirs in prop::collection::vec(any_dir(), 1..200)) {
        let mut game = GridEngine::seeded(seed);
        let mut seen_terminal = None;
        for dir in dirs {
            let outcome = game.make_move(dir);
            if let Some(status) = seen_terminal {
                prop_assert_eq!(outcome, MoveOutcome::NoChange);
                prop_assert_eq!(game.status(), status);
            } else if game.status() != Status::Playing {
                seen_terminal = Some(game.status());
            }
            prop_assert!(game.best_score() >= game.score());
        }
    }
}

#[test]
fn spawn_ratio_is_nine_to_one() {
    let mut rng = StdRng::seed_from_u64(2048);
    let (mut twos, mut fours) = (0u32, 0u32);
    for _ in 0..20_000 {
        match Board::EMPTY.with_random_tile(&mut rng).highest_tile() {
            2 => twos += 1,
            4 => fours += 1,
            other => panic!("unexpected spawn {other}"),
        }
    }
    let ratio = fours as f64 / (twos + fours) as f64;
    assert!((0.08..0.12).contains(&ratio), "ratio of 4s was {ratio}");
}

#[test]
fn spawn_hits_every_empty_cell() {
    let mut rng = StdRng::seed_from_u64(7);
    let base = Board::from_rows([[2, 0, 2, 0], [0; 4], [4, 4, 4, 4], [0; 4]]).unwrap();
    let mut hits = [0u32; 16];
    for _ in 0..5_000 {
        let spawned = base.with_random_tile(&mut rng);
        let idx = (0..16).find(|&i| spawned.tile_value(i) != base.tile_value(i)).unwrap();
        hits[idx] += 1;
    }
    for (idx, &n) in hits.iter().enumerate() {
        if base.tile_value(idx) == 0 {
            assert!(n > 300, "cell {idx} hit only {n} times");
        } else {
            assert_eq!(n, 0);
        }
    }
}
