//! Hand-built boards shared by the sim tests.

use crate::domain::grid::Grid;
use crate::domain::token::{Pos, TokenKind};

const STRIPES: [TokenKind; 4] = [TokenKind::Blue, TokenKind::Green, TokenKind::Yellow, TokenKind::Pink];

/// Kind at (x, y) = STRIPES[(x + 2y) % 4]. No two neighbours share a
/// kind, so the board holds no runs at all.
pub fn striped_board(width: usize, height: usize) -> Grid {
    let mut g = Grid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            g.spawn(Pos::new(x, y), STRIPES[(x + 2 * y) % 4]);
        }
    }
    g
}

/// 8×8 striped board with reds at (2,4), (4,4) and (3,3). Swapping
/// (3,3)↔(3,4) lines up exactly three reds on row 4; a "YPG" refill
/// leaves the board without further runs.
pub fn red_swap_board() -> Grid {
    let mut g = striped_board(8, 8);
    for pos in [Pos::new(2, 4), Pos::new(4, 4), Pos::new(3, 3)] {
        g.spawn(pos, TokenKind::Red);
    }
    g
}
