/// Grid: the board of token cells.
///
/// ## Layout
///
/// `cells[y][x]`, row 0 at the bottom. Gravity pulls toward lower `y`,
/// refills enter from the top of each column.
///
/// All placement goes through `set()` / `spawn()` / `take()` / `swap()`,
/// which bounds-check silently and keep every token's stored `pos`
/// equal to the cell that holds it.
///
/// ## Walls
///
/// Wall cells hold a token of kind `Wall`. They never move, are never
/// cleared by bulk effects, and split their column into independent
/// gravity segments.

use serde::Serialize;

use super::kinds::KindSource;
use super::token::{Pos, Token, TokenId, TokenKind};

/// A token moved by gravity. `token.pos == to`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Fall {
    pub token: Token,
    pub from: Pos,
    pub to: Pos,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Vec<Option<Token>>>,
    next_id: u64,
}

// ── Construction ──

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            cells: vec![vec![None; width]; height],
            next_id: 0,
        }
    }

    /// Empty board with fixed wall cells. Out-of-bounds walls are ignored.
    pub fn with_walls(width: usize, height: usize, walls: &[Pos]) -> Self {
        let mut grid = Grid::new(width, height);
        for &pos in walls {
            grid.spawn(pos, TokenKind::Wall);
        }
        grid
    }

    /// Build a board from a diagram, TOP row first.
    /// Legend: kind symbols (`R B P G Y I #`), anything else = empty.
    /// Rows shorter than the first are padded with empty cells.
    pub fn from_diagram(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut grid = Grid::new(width, height);
        for (i, row) in rows.iter().enumerate() {
            let y = height - 1 - i;
            for (x, ch) in row.chars().enumerate() {
                if let Some(kind) = TokenKind::from_symbol(ch) {
                    grid.spawn(Pos::new(x, y), kind);
                }
            }
        }
        grid
    }
}

// ── Cell query / mutation API ──

impl Grid {
    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Token at `pos`, or `None` for empty and out-of-bounds cells.
    #[inline]
    pub fn get(&self, pos: Pos) -> Option<&Token> {
        if !self.in_bounds(pos) { return None; }
        self.cells[pos.y][pos.x].as_ref()
    }

    #[inline]
    pub fn kind_at(&self, pos: Pos) -> Option<TokenKind> {
        self.get(pos).map(|t| t.kind)
    }

    #[inline]
    pub fn is_wall(&self, pos: Pos) -> bool {
        self.kind_at(pos) == Some(TokenKind::Wall)
    }

    /// Place or clear a cell. Stamps the token's position. Out-of-bounds is a no-op.
    pub fn set(&mut self, pos: Pos, token: Option<Token>) {
        if !self.in_bounds(pos) { return; }
        self.cells[pos.y][pos.x] = token.map(|mut t| {
            t.pos = pos;
            t
        });
    }

    /// Create a fresh token at `pos`, replacing whatever was there.
    pub fn spawn(&mut self, pos: Pos, kind: TokenKind) -> Option<Token> {
        if !self.in_bounds(pos) { return None; }
        let token = Token { id: TokenId(self.next_id), kind, pos };
        self.next_id += 1;
        self.cells[pos.y][pos.x] = Some(token);
        Some(token)
    }

    /// Remove and return the token at `pos`.
    pub fn take(&mut self, pos: Pos) -> Option<Token> {
        if !self.in_bounds(pos) { return None; }
        self.cells[pos.y][pos.x].take()
    }

    /// Exchange two cells' contents, re-stamping positions.
    /// Returns false (and does nothing) if either cell is out of bounds.
    pub fn swap(&mut self, a: Pos, b: Pos) -> bool {
        if !self.in_bounds(a) || !self.in_bounds(b) { return false; }
        let ta = self.take(a);
        let tb = self.take(b);
        self.set(a, tb);
        self.set(b, ta);
        true
    }
}

// ── Iteration / inspection ──

impl Grid {
    /// Every cell position, column by column, bottom to top.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Pos::new(x, y)))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        self.positions().filter_map(move |p| self.get(p))
    }

    /// Number of occupied cells (walls included).
    pub fn occupied(&self) -> usize {
        self.tokens().count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == self.width * self.height
    }

    /// Diagram of the board, top row first (inverse of `from_diagram`).
    pub fn to_diagram(&self) -> Vec<String> {
        (0..self.height)
            .rev()
            .map(|y| {
                (0..self.width)
                    .map(|x| self.kind_at(Pos::new(x, y)).map_or('.', TokenKind::symbol))
                    .collect()
            })
            .collect()
    }

    /// No empty cell sits below an occupied one inside a wall-delimited column segment.
    pub fn is_gravity_consistent(&self) -> bool {
        for x in 0..self.width {
            let mut gap_below = false;
            for y in 0..self.height {
                match self.kind_at(Pos::new(x, y)) {
                    Some(TokenKind::Wall) => gap_below = false,
                    Some(_) if gap_below => return false,
                    Some(_) => {}
                    None => gap_below = true,
                }
            }
        }
        true
    }

    /// Every stored token position matches its cell.
    pub fn positions_consistent(&self) -> bool {
        self.positions().all(|p| self.get(p).map_or(true, |t| t.pos == p))
    }
}

// ── Bulk operations ──

impl Grid {
    /// Fill every non-wall cell with a fresh token.
    pub fn populate(&mut self, kinds: &mut impl KindSource) {
        for pos in self.positions().collect::<Vec<_>>() {
            if self.is_wall(pos) { continue; }
            self.spawn(pos, kinds.next_kind());
        }
    }

    /// Remove every non-wall token, returning them.
    pub fn clear_all(&mut self) -> Vec<Token> {
        let mut removed = vec![];
        for pos in self.positions().collect::<Vec<_>>() {
            if self.is_wall(pos) { continue; }
            if let Some(t) = self.take(pos) {
                removed.push(t);
            }
        }
        removed
    }

    /// Is `pos` inside the central cross band?
    /// The band is the two middle columns and the two middle rows
    /// (`x ∈ {w/2-1, w/2}` or `y ∈ {h/2-1, h/2}`).
    pub fn in_cross_band(&self, pos: Pos) -> bool {
        fn central(i: usize, len: usize) -> bool {
            i + 2 > len / 2 && i <= len / 2
        }
        self.in_bounds(pos) && (central(pos.x, self.width) || central(pos.y, self.height))
    }

    /// Turn every occupied non-wall cell in the central cross band into ice.
    /// Kind mutation only: ids and positions are kept. Returns converted cells.
    pub fn clear_cross_pattern(&mut self) -> Vec<Pos> {
        let mut converted = vec![];
        for pos in self.positions().collect::<Vec<_>>() {
            if !self.in_cross_band(pos) { continue; }
            if let Some(token) = self.cells[pos.y][pos.x].as_mut() {
                if token.kind == TokenKind::Wall { continue; }
                token.kind = TokenKind::Ice;
                converted.push(pos);
            }
        }
        converted
    }

    /// Compact each column segment downward, preserving relative order.
    pub fn apply_gravity(&mut self) -> Vec<Fall> {
        let mut falls = vec![];
        for x in 0..self.width {
            let mut floor = 0;
            for y in 0..self.height {
                let from = Pos::new(x, y);
                match self.kind_at(from) {
                    None => {}
                    Some(TokenKind::Wall) => floor = y + 1,
                    Some(_) => {
                        if y != floor {
                            let to = Pos::new(x, floor);
                            let token = self.take(from);
                            self.set(to, token);
                            if let Some(&token) = self.get(to) {
                                falls.push(Fall { token, from, to });
                            }
                        }
                        floor += 1;
                    }
                }
            }
        }
        falls
    }

    /// Spawn a fresh token into every empty cell, column by column, bottom to top.
    pub fn refill(&mut self, kinds: &mut impl KindSource) -> Vec<Token> {
        let mut spawned = vec![];
        for pos in self.positions().collect::<Vec<_>>() {
            if self.get(pos).is_some() { continue; }
            if let Some(t) = self.spawn(pos, kinds.next_kind()) {
                spawned.push(t);
            }
        }
        spawned
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kinds::{RandomKinds, ScriptedKinds};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn p(x: usize, y: usize) -> Pos { Pos::new(x, y) }

    // ── Lookup ──

    #[test]
    fn out_of_bounds_get_is_none() {
        let g = Grid::from_diagram(&["RG", "BY"]);
        assert!(g.get(p(2, 0)).is_none());
        assert!(g.get(p(0, 2)).is_none());
        assert!(g.get(p(usize::MAX, 0)).is_none());
    }

    #[test]
    fn diagram_top_row_is_highest_y() {
        let g = Grid::from_diagram(&[
            "RG",
            "BY",
        ]);
        assert_eq!(g.kind_at(p(0, 1)), Some(TokenKind::Red));
        assert_eq!(g.kind_at(p(1, 0)), Some(TokenKind::Yellow));
        assert_eq!(g.to_diagram(), vec!["RG".to_string(), "BY".to_string()]);
    }

    #[test]
    fn out_of_bounds_set_is_noop() {
        let mut g = Grid::from_diagram(&["RG"]);
        let before = g.clone();
        let t = *g.get(p(0, 0)).unwrap();
        g.set(p(5, 5), Some(t));
        assert_eq!(g, before);
    }

    #[test]
    fn set_stamps_position() {
        let mut g = Grid::new(3, 1);
        let t = g.spawn(p(0, 0), TokenKind::Red).unwrap();
        g.set(p(2, 0), Some(t));
        assert_eq!(g.get(p(2, 0)).unwrap().pos, p(2, 0));
        assert_eq!(g.get(p(2, 0)).unwrap().id, t.id);
    }

    #[test]
    fn swap_exchanges_and_restamps() {
        let mut g = Grid::from_diagram(&["RB"]);
        let red = g.get(p(0, 0)).unwrap().id;
        assert!(g.swap(p(0, 0), p(1, 0)));
        assert_eq!(g.kind_at(p(0, 0)), Some(TokenKind::Blue));
        assert_eq!(g.get(p(1, 0)).unwrap().id, red);
        assert!(g.positions_consistent());
    }

    #[test]
    fn swap_out_of_bounds_rejected() {
        let mut g = Grid::from_diagram(&["RB"]);
        let before = g.clone();
        assert!(!g.swap(p(1, 0), p(2, 0)));
        assert_eq!(g, before);
    }

    // ── Populate / clear ──

    #[test]
    fn populate_fills_everything_but_walls() {
        let mut g = Grid::with_walls(4, 4, &[p(1, 1)]);
        let mut kinds = RandomKinds::new(StdRng::seed_from_u64(42), TokenKind::COLORS.to_vec());
        g.populate(&mut kinds);
        assert!(g.is_full());
        assert!(g.is_wall(p(1, 1)));
        assert!(g.positions_consistent());
        let walls = g.tokens().filter(|t| t.kind == TokenKind::Wall).count();
        assert_eq!(walls, 1);
    }

    #[test]
    fn clear_all_keeps_walls() {
        let mut g = Grid::from_diagram(&[
            "R#G",
            "BYP",
        ]);
        let removed = g.clear_all();
        assert_eq!(removed.len(), 5);
        assert_eq!(g.occupied(), 1);
        assert!(g.is_wall(p(1, 1)));
    }

    #[test]
    fn cross_pattern_8x8() {
        let mut g = Grid::new(8, 8);
        g.populate(&mut ScriptedKinds::from_symbols("RGBYP"));
        let before = g.clone();
        let converted = g.clear_cross_pattern();
        assert_eq!(converted.len(), 64 - 4 * 9); // four untouched 3x3 corners
        for pos in g.positions() {
            let band = pos.x == 3 || pos.x == 4 || pos.y == 3 || pos.y == 4;
            if band {
                assert_eq!(g.kind_at(pos), Some(TokenKind::Ice), "{pos:?}");
            } else {
                assert_eq!(g.get(pos), before.get(pos), "{pos:?}");
            }
            assert_eq!(g.get(pos).unwrap().id, before.get(pos).unwrap().id);
        }
    }

    #[test]
    fn cross_pattern_skips_walls() {
        let mut g = Grid::from_diagram(&[
            "RRRR",
            "R#RR",
            "RRRR",
            "RRRR",
        ]);
        g.clear_cross_pattern();
        assert!(g.is_wall(p(1, 2)));
    }

    // ── Gravity ──

    #[test]
    fn gravity_compacts_preserving_order() {
        let mut g = Grid::from_diagram(&[
            "R",
            ".",
            "B",
            ".",
        ]);
        let falls = g.apply_gravity();
        assert_eq!(g.to_diagram(), vec![".", ".", "R", "B"]);
        assert_eq!(falls.len(), 2);
        assert_eq!(falls[0].from, p(0, 1));
        assert_eq!(falls[0].to, p(0, 0));
        assert_eq!(falls[1].from, p(0, 3));
        assert_eq!(falls[1].to, p(0, 1));
        assert!(g.is_gravity_consistent());
        assert!(g.positions_consistent());
    }

    #[test]
    fn gravity_stops_at_walls() {
        let mut g = Grid::from_diagram(&[
            "R",
            ".",
            "#",
            ".",
            "B",
        ]);
        g.apply_gravity();
        assert_eq!(g.to_diagram(), vec![".", "R", "#", ".", "B"]);
        assert!(g.is_gravity_consistent());
    }

    #[test]
    fn gravity_consistency_detects_gaps() {
        let g = Grid::from_diagram(&["R", "."]);
        assert!(!g.is_gravity_consistent());
        let g = Grid::from_diagram(&["R", "#", "."]);
        assert!(g.is_gravity_consistent());
    }

    #[test]
    fn refill_fills_holes_with_new_ids() {
        let mut g = Grid::from_diagram(&[
            "..",
            "R.",
        ]);
        let old = g.get(p(0, 0)).unwrap().id;
        let spawned = g.refill(&mut ScriptedKinds::from_symbols("G"));
        assert_eq!(spawned.len(), 3);
        assert!(g.is_full());
        assert!(spawned.iter().all(|t| t.id != old && t.kind == TokenKind::Green));
        assert_eq!(spawned[0].pos, p(0, 1));
    }
}
