use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::EngineError;

/// A direction to slide/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

impl Move {
    /// Fixed enumeration order; greedy tie-breaks follow it.
    pub const ALL: [Move; 4] = [Move::Left, Move::Right, Move::Up, Move::Down];

    /// Translate a swipe vector (start minus end) into a direction.
    ///
    /// The dominant axis wins; equal magnitudes count as vertical. A zero or
    /// non-finite vector is not a swipe.
    ///
    /// ```
    /// use race_2048::engine::Move;
    /// assert_eq!(Move::from_swipe(40.0, -3.0), Some(Move::Left));
    /// assert_eq!(Move::from_swipe(2.0, -25.0), Some(Move::Down));
    /// assert_eq!(Move::from_swipe(0.0, 0.0), None);
    /// ```
    pub fn from_swipe(dx: f32, dy: f32) -> Option<Move> {
        if !dx.is_finite() || !dy.is_finite() || (dx == 0.0 && dy == 0.0) {
            return None;
        }
        if dx.abs() > dy.abs() {
            Some(if dx > 0.0 { Move::Left } else { Move::Right })
        } else {
            Some(if dy > 0.0 { Move::Up } else { Move::Down })
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Move::Left => "left",
            Move::Right => "right",
            Move::Up => "up",
            Move::Down => "down",
        };
        f.write_str(s)
    }
}

impl FromStr for Move {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" | "arrowleft" => Ok(Move::Left),
            "right" | "r" | "arrowright" => Ok(Move::Right),
            "up" | "u" | "arrowup" => Ok(Move::Up),
            "down" | "d" | "arrowdown" => Ok(Move::Down),
            _ => Err(EngineError::UnknownDirection(s.to_string())),
        }
    }
}

impl TryFrom<u8> for Move {
    type Error = EngineError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Move::Up),
            1 => Ok(Move::Down),
            2 => Ok(Move::Left),
            3 => Ok(Move::Right),
            other => Err(EngineError::UnknownDirection(other.to_string())),
        }
    }
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

/// Largest exponent a nibble can hold (2^15 = 32768). Two such tiles never merge.
pub const MAX_EXPONENT: u64 = 15;

/// Exponent of the winning tile (2^11 = 2048).
pub const WIN_EXPONENT: u64 = 11;

struct Stores {
    shift_left: Box<[u64]>,
    shift_right: Box<[u64]>,
    shift_up: Box<[u64]>,
    shift_down: Box<[u64]>,
    gain_left: Box<[Score]>,
    gain_right: Box<[Score]>,
}

type BoardRaw = u64;
type Line = u64;
type Tile = u64;
pub type Score = u64;

/// Packed 4x4 board as 16 4-bit exponent nibbles in a `u64`, row-major,
/// top-left cell in the most significant nibble.
///
/// A nibble of 0 is an empty cell; `k` is a tile worth `2^k`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board(raw) }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw { self.0 }

    /// Build a board from tile values, rejecting anything that is not 0 or a
    /// power of two in `2..=32768`.
    ///
    /// ```
    /// use race_2048::engine::Board;
    /// let b = Board::from_rows([[2, 2, 4, 4], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// assert_eq!(b.tile_value(3), 4);
    /// assert!(Board::from_rows([[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_err());
    /// ```
    pub fn from_rows(rows: [[u32; 4]; 4]) -> Result<Self, EngineError> {
        let mut raw = 0u64;
        for (row, cells) in rows.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if value == 0 {
                    continue;
                }
                let exponent = value.trailing_zeros() as u64;
                if !value.is_power_of_two() || exponent == 0 || exponent > MAX_EXPONENT {
                    return Err(EngineError::InvalidTile { row, col, value });
                }
                raw |= exponent << (60 - 4 * (row * 4 + col));
            }
        }
        Ok(Board(raw))
    }

    /// Tile values as a row-major matrix (0 for empty cells).
    pub fn rows(self) -> [[u32; 4]; 4] {
        let mut out = [[0u32; 4]; 4];
        for (idx, value) in self.values().into_iter().enumerate() {
            out[idx / 4][idx % 4] = value;
        }
        out
    }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    #[inline]
    pub fn shift(self, dir: Move) -> Self { self.shift_scored(dir).0 }

    /// Slide/merge tiles in `dir` and report the score gained by the merges.
    ///
    /// ```
    /// use race_2048::engine::{Board, Move};
    /// let b = Board::from_rows([[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// let (moved, gained) = b.shift_scored(Move::Left);
    /// assert_eq!(moved.rows()[0], [4, 4, 0, 0]);
    /// assert_eq!(gained, 8);
    /// ```
    #[inline]
    pub fn shift_scored(self, dir: Move) -> (Self, Score) {
        match dir {
            Move::Left | Move::Right => shift_rows(self, dir),
            Move::Up | Move::Down => shift_cols(self, dir),
        }
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a uniformly chosen empty
    /// slot. A full board is returned unchanged.
    ///
    /// ```
    /// use race_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    #[inline]
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = count_empty(self);
        if empty == 0 {
            return self;
        }
        let mut index = rng.gen_range(0..empty);
        let mut tmp = self.0;
        let mut tile = generate_random_tile(rng);
        loop {
            while (tmp & 0xf) != 0 {
                tmp >>= 4;
                tile <<= 4;
            }
            if index == 0 { break; }
            index -= 1;
            tmp >>= 4;
            tile <<= 4;
        }
        Board(self.0 | tile)
    }

    /// True if no move in any direction changes the board.
    #[inline]
    pub fn is_game_over(self) -> bool { is_game_over(self) }

    /// True iff the board is full and no horizontally or vertically adjacent
    /// pair can merge. Direct O(N²) scan; agrees with [`Board::is_game_over`]
    /// on full boards.
    pub fn is_dead(self) -> bool {
        if count_empty(self) != 0 {
            return false;
        }
        for row in 0..4 {
            for col in 0..4 {
                let e = get_tile(self, row * 4 + col);
                if e == MAX_EXPONENT {
                    continue;
                }
                if col < 3 && get_tile(self, row * 4 + col + 1) == e {
                    return false;
                }
                if row < 3 && get_tile(self, (row + 1) * 4 + col) == e {
                    return false;
                }
            }
        }
        true
    }

    /// True if any cell holds exactly the tile `2^exponent`.
    pub fn contains_exponent(self, exponent: u64) -> bool {
        (0..16).any(|idx| get_tile(self, idx) == exponent)
    }

    /// Return the highest tile value present on the board (0 when empty).
    #[inline]
    pub fn highest_tile(self) -> u32 { get_highest_tile_val(self) }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u64 { count_empty(self) }

    /// Sum of all tile values.
    pub fn tile_sum(self) -> u64 {
        self.values().iter().map(|&v| v as u64).sum()
    }

    /// Get the actual value at index (0 if empty). Index runs 0..16 row-major.
    #[inline]
    pub fn tile_value(self, idx: usize) -> u32 { get_tile_val(self, idx) }

    fn values(self) -> [u32; 16] {
        let mut out = [0u32; 16];
        for (idx, slot) in out.iter_mut().enumerate() {
            *slot = get_tile_val(self, idx);
        }
        out
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = to_vec(*self).iter().map(format_val).collect();
        for (row, chunk) in cells.chunks(4).enumerate() {
            if row > 0 {
                writeln!(f, "-------------------------------")?;
            }
            writeln!(f, "{}", chunk.join("|"))?;
        }
        Ok(())
    }
}

impl From<BoardRaw> for Board { fn from(v: BoardRaw) -> Self { Board::from_raw(v) } }
impl From<Board> for BoardRaw { fn from(b: Board) -> Self { b.raw() } }

/// Initialize internal tables. Safe to call multiple times; lookups also
/// initialize lazily on first use.
pub fn new() {
    let _ = stores();
}

// Credit to Nneonneo
pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

pub(crate) fn extract_line(board: BoardRaw, line_idx: u64) -> Line {
    (board >> ((3 - line_idx) * 16)) & 0xffff
}

/// Return the cell's actual value (0 if empty), e.g., 2, 4, 8, ...
pub fn get_tile_val(board: Board, idx: usize) -> u32 {
    match get_tile(board, idx) {
        0 => 0,
        e => 1 << e,
    }
}

fn line_to_vec(line: Line) -> Vec<Tile> {
    (0..4).fold(Vec::new(), |mut tiles, tile_idx| {
        tiles.push(line >> ((3 - tile_idx) * 4) & 0xf);
        tiles
    })
}

/// True if no move in any direction changes the board.
pub fn is_game_over(board: Board) -> bool {
    Move::ALL.iter().all(|&direction| board.shift(direction) == board)
}

// https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
/// Count the number of zero tiles.
pub fn count_empty(board: Board) -> u64 {
    16 - count_non_empty(board)
}

static STORES: OnceLock<Stores> = OnceLock::new();

fn create_stores() -> Stores {
    // Allocate on the heap to avoid large stack frames
    let mut shift_left = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_right = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_up = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_down = vec![0u64; LINE_TABLE_SIZE];
    let mut gain_left = vec![0 as Score; LINE_TABLE_SIZE];
    let mut gain_right = vec![0 as Score; LINE_TABLE_SIZE];

    for val in 0..LINE_TABLE_SIZE {
        let tiles = line_to_vec(val as u64);
        let (left, left_gain) = shift_vec_left(tiles.clone());
        let (right, right_gain) = shift_vec_right(tiles);
        shift_left[val] = vec_to_row(&left);
        shift_right[val] = vec_to_row(&right);
        shift_up[val] = vec_to_col(&left);
        shift_down[val] = vec_to_col(&right);
        gain_left[val] = left_gain;
        gain_right[val] = right_gain;
    }

    Stores {
        shift_left: shift_left.into_boxed_slice(),
        shift_right: shift_right.into_boxed_slice(),
        shift_up: shift_up.into_boxed_slice(),
        shift_down: shift_down.into_boxed_slice(),
        gain_left: gain_left.into_boxed_slice(),
        gain_right: gain_right.into_boxed_slice(),
    }
}

#[inline(always)]
fn stores() -> &'static Stores {
    STORES.get_or_init(create_stores)
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile { if rng.gen_range(0..10) < 9 { 1 } else { 2 } }

fn shift_rows(board: Board, move_dir: Move) -> (Board, Score) {
    let s = stores();
    let (table, gains): (&[u64], &[Score]) = match move_dir {
        Move::Right => (&s.shift_right, &s.gain_right),
        _ => (&s.shift_left, &s.gain_left),
    };
    (0..4).fold((Board(0), 0), |(new_board, gained), row_idx| {
        let row_val = extract_line(board.0, row_idx) as usize;
        let new_row_val = table[row_val];
        (Board(new_board.0 | (new_row_val << (48 - (16 * row_idx)))), gained + gains[row_val])
    })
}

fn shift_cols(board: Board, move_dir: Move) -> (Board, Score) {
    let transpose_board = transpose(board.0);
    let s = stores();
    // Transposed columns read top-to-bottom like rows read left-to-right.
    let (table, gains): (&[u64], &[Score]) = match move_dir {
        Move::Down => (&s.shift_down, &s.gain_right),
        _ => (&s.shift_up, &s.gain_left),
    };
    (0..4).fold((Board(0), 0), |(new_board, gained), col_idx| {
        let col_val = extract_line(transpose_board, col_idx) as usize;
        let new_col_val = table[col_val];
        (Board(new_board.0 | (new_col_val << (12 - (4 * col_idx)))), gained + gains[col_val])
    })
}

fn vec_to_row(tiles: &[Tile]) -> Line {
    tiles[0] << 12 | tiles[1] << 8 | tiles[2] << 4 | tiles[3]
}

fn vec_to_col(tiles: &[Tile]) -> Line {
    tiles[0] << 48 | tiles[1] << 32 | tiles[2] << 16 | tiles[3]
}

fn shift_vec_right(vec: Vec<Tile>) -> (Vec<Tile>, Score) {
    let rev_vec: Vec<Tile> = vec.into_iter().rev().collect();
    let (shifted, gained) = shift_vec_left(rev_vec);
    (shifted.into_iter().rev().collect(), gained)
}

fn shift_vec_left(mut vec: Vec<Tile>) -> (Vec<Tile>, Score) {
    let mut gained = 0;
    for i in 0..4 {
        gained += calculate_left_shift(&mut vec[i..]);
    }
    (vec, gained)
}

/// Pull the next tile into `slice[0]`, merging it with the following tile
/// when they match. Each slot absorbs at most one merge, so a merged tile
/// never merges again in the same move. Returns the merge score.
fn calculate_left_shift(slice: &mut [Tile]) -> Score {
    let mut acc = 0;
    let mut gained = 0;
    for idx in 0..slice.len() {
        let val = slice[idx];
        if acc != 0 && acc == val && acc < MAX_EXPONENT {
            slice[idx] = 0;
            acc += 1;
            gained = 1 << acc;
            break;
        } else if acc != 0 && val != 0 {
            break;
        } else if acc == 0 && val != 0 {
            slice[idx] = 0;
            acc = val;
        }
    }
    slice[0] = acc;
    gained
}

fn count_non_empty(board: Board) -> u64 {
    let mut board_copy = board.0;
    board_copy |= board_copy >> 1;
    board_copy |= board_copy >> 2;
    board_copy &= 0x1111111111111111;
    board_copy.count_ones() as u64
}

fn to_vec(board: Board) -> Vec<u8> {
    (0..16).map(|idx| get_tile(board, idx) as u8).collect()
}

fn format_val(val: &u8) -> String {
    match val {
        0 => " ".repeat(7),
        &x => format!("{:^7}", 1u32 << x),
    }
}

fn get_highest_tile_val(board: Board) -> u32 {
    (0..16).map(|idx| get_tile_val(board, idx)).max().unwrap_or(0)
}

fn get_tile(board: Board, idx: usize) -> Tile {
    (board.0 >> (60 - (4 * idx))) & 0xf
}
