//! Game arenas for parity and generalized parity games.

pub mod arena;

use std::fmt;

/// The type for a color (priority) of a vertex.
pub type Color = usize;

/// The type for an index of a vertex in an arena.
pub type Vertex = usize;

/// A parity value: either even (0) or odd (1).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Parity {
    /// Even parity (0).
    Even = 0,
    /// Odd parity (1).
    Odd = 1,
}

impl std::ops::Not for Parity {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Even => Self::Odd,
            Self::Odd => Self::Even,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let string = match self {
            Self::Even => "even",
            Self::Odd => "odd",
        };
        write!(f, "{}", string)
    }
}

impl Parity {
    /// Returns the parity of the given color.
    pub fn of(color: Color) -> Self {
        match color % 2 {
            0 => Self::Even,
            1 => Self::Odd,
            _ => unreachable!(),
        }
    }
}

/// A player in a parity game.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Player {
    /// Player with max-even winning condition (player 0).
    Even = 0,
    /// Player with max-odd winning condition (player 1).
    Odd = 1,
}

impl std::ops::Not for Player {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Even => Self::Odd,
            Self::Odd => Self::Even,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let string = match self {
            Self::Even => "even",
            Self::Odd => "odd",
        };
        write!(f, "{}", string)
    }
}

impl From<Parity> for Player {
    fn from(p: Parity) -> Self {
        match p {
            Parity::Even => Self::Even,
            Parity::Odd => Self::Odd,
        }
    }
}

impl From<Player> for Parity {
    fn from(p: Player) -> Self {
        match p {
            Player::Even => Self::Even,
            Player::Odd => Self::Odd,
        }
    }
}

/// The owner of a vertex in an arena.
///
/// Besides the two players, a vertex can be an auxiliary edge node that
/// materializes a labelled transition. An edge node has exactly one
/// successor and belongs to neither player.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Owner {
    /// The vertex belongs to the player with the max-even condition.
    Even,
    /// The vertex belongs to the player with the max-odd condition.
    Odd,
    /// The vertex is an auxiliary edge node.
    Edge,
}

impl Owner {
    /// Returns the player owning this vertex, or `None` for an edge node.
    pub fn player(self) -> Option<Player> {
        match self {
            Self::Even => Some(Player::Even),
            Self::Odd => Some(Player::Odd),
            Self::Edge => None,
        }
    }

    /// Parses the numeric owner encoding of the textual game formats.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Even),
            1 => Some(Self::Odd),
            2 => Some(Self::Edge),
            _ => None,
        }
    }

    /// Returns the numeric owner encoding of the textual game formats.
    pub fn index(self) -> usize {
        match self {
            Self::Even => 0,
            Self::Odd => 1,
            Self::Edge => 2,
        }
    }
}

impl From<Player> for Owner {
    fn from(player: Player) -> Self {
        match player {
            Player::Even => Self::Even,
            Player::Odd => Self::Odd,
        }
    }
}

/// A coalition of players used as the controlling side of an attractor.
///
/// The empty coalition yields the unforced attractor: the set of vertices
/// from which every play reaches the target.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Coalition(u8);

impl Coalition {
    /// The empty coalition.
    pub const NONE: Self = Self(0);

    /// The coalition consisting of a single player.
    pub fn of(player: Player) -> Self {
        Self(1 << player as u8)
    }

    /// Returns whether a vertex with the given owner is controlled by this
    /// coalition. Edge nodes are controlled by nobody.
    pub fn controls(self, owner: Owner) -> bool {
        match owner.player() {
            Some(player) => self.0 & (1 << player as u8) != 0,
            None => false,
        }
    }
}

impl From<Player> for Coalition {
    fn from(player: Player) -> Self {
        Self::of(player)
    }
}
