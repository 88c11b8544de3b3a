/// Token kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so kind semantics are centralized here.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum TokenKind {
    Red,    // Feeds the bomb gauge
    Blue,   // Feeds the cross gauge
    Pink,   // Feeds the clock gauge
    Green,
    Yellow,
    Ice,    // Produced by the cross effect, matches only other ice
    Wall,   // Immovable, never matched
}

impl TokenKind {
    /// Default refill palette.
    pub const COLORS: [TokenKind; 5] = [
        TokenKind::Red,
        TokenKind::Blue,
        TokenKind::Pink,
        TokenKind::Green,
        TokenKind::Yellow,
    ];

    /// Can this kind take part in a run?
    pub fn is_matchable(self) -> bool {
        !matches!(self, TokenKind::Wall)
    }

    /// Does gravity move it / can a swap pick it up?
    pub fn is_movable(self) -> bool {
        !matches!(self, TokenKind::Wall)
    }

    /// May a kind source hand this out as a fresh token?
    pub fn is_color(self) -> bool {
        !matches!(self, TokenKind::Ice | TokenKind::Wall)
    }

    /// Which item gauge a cleared token of this kind charges.
    pub fn item(self) -> Option<Item> {
        match self {
            TokenKind::Red => Some(Item::Bomb),
            TokenKind::Blue => Some(Item::Cross),
            TokenKind::Pink => Some(Item::Clock),
            _ => None,
        }
    }

    /// Single-letter code used by board diagrams.
    pub fn symbol(self) -> char {
        match self {
            TokenKind::Red => 'R',
            TokenKind::Blue => 'B',
            TokenKind::Pink => 'P',
            TokenKind::Green => 'G',
            TokenKind::Yellow => 'Y',
            TokenKind::Ice => 'I',
            TokenKind::Wall => '#',
        }
    }

    pub fn from_symbol(c: char) -> Option<TokenKind> {
        match c {
            'R' => Some(TokenKind::Red),
            'B' => Some(TokenKind::Blue),
            'P' => Some(TokenKind::Pink),
            'G' => Some(TokenKind::Green),
            'Y' => Some(TokenKind::Yellow),
            'I' => Some(TokenKind::Ice),
            '#' => Some(TokenKind::Wall),
            _ => None,
        }
    }
}

/// Item effects charged by clearing tokens.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Item {
    Bomb,  // Clears every non-wall token
    Cross, // Freezes the central cross band and clears it
    Clock, // Adds time to the session clock
}

impl Item {
    pub const ALL: [Item; 3] = [Item::Bomb, Item::Cross, Item::Clock];
}

/// Cell coordinate. `x` is the column, `y` the row; row 0 is the bottom.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }

    /// Grid-adjacent: same row or column, exactly one step apart.
    pub fn is_adjacent(self, other: Pos) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }
}

/// Stable identity handed out by the grid at spawn time.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct TokenId(pub u64);

/// One grid occupant. `pos` always mirrors the cell that holds it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Token {
    pub id: TokenId,
    pub kind: TokenKind,
    pub pos: Pos,
}
