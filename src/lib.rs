//! Shrike library crate: permissive winning strategy templates for parity
//! and generalized parity games.
//!
//! The solver consumes an already-constructed game [`Arena`] and produces
//! the winning region of the max-even player together with a strategy
//! [`Template`]: unsafe edges, co-live edges and live groups that jointly
//! over-approximate the winning strategies.

pub mod error;
pub mod game;
pub mod io;
pub mod local;
pub mod options;
pub mod random;
pub mod solver;
pub mod template;

use std::fmt::{self, Display};

use log::info;

use crate::game::arena::{Arena, Region};
use crate::game::Player;
use crate::solver::{Composer, TemplateBuilder};
use crate::template::Template;

/// The realizability status of a game.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Status {
    /// The initial vertex is winning for the max-even player.
    Realizable,
    /// The initial vertex is winning for the max-odd player.
    Unrealizable,
}

impl From<Player> for Status {
    fn from(player: Player) -> Self {
        match player {
            Player::Even => Self::Realizable,
            Player::Odd => Self::Unrealizable,
        }
    }
}

impl From<Status> for Player {
    fn from(status: Status) -> Self {
        match status {
            Status::Realizable => Self::Even,
            Status::Unrealizable => Self::Odd,
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Realizable => "REALIZABLE",
                Self::Unrealizable => "UNREALIZABLE",
            }
        )
    }
}

/// How to solve a game.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SolveMode {
    /// Solve a single objective directly and multiple objectives through
    /// the composition engine.
    #[default]
    Direct,
    /// Solve a parity game through its per-odd-color decomposition and the
    /// composition engine. The winning region is a sound lower bound.
    Composed,
    /// Add the objectives of a generalized parity game one at a time,
    /// reusing the template computed so far.
    Incremental,
}

/// The result of solving a game.
pub struct SolveResult {
    /// The winning region of the max-even player. For multi-objective
    /// games this is the sound lower bound computed by composition.
    pub winning: Region,
    /// The losing region.
    pub losing: Region,
    /// The cleaned strategy template over the winning region.
    pub template: Template,
    /// Whether the composition engine was involved, in which case the
    /// winning region is partial (a lower bound).
    pub partial: bool,
}

impl SolveResult {
    /// The realizability status: decided by the initial vertex when the
    /// arena designates one, by non-emptiness of the winning region
    /// otherwise.
    pub fn status(&self, arena: &Arena) -> Status {
        let realizable = match arena.initial_vertex() {
            Some(initial) => self.winning[initial],
            None => !self.winning.is_empty(),
        };
        if realizable {
            Status::Realizable
        } else {
            Status::Unrealizable
        }
    }
}

/// Solves a game with the given mode and returns the winning region and
/// the strategy template.
pub fn solve_game(arena: &Arena, mode: SolveMode) -> crate::error::Result<SolveResult> {
    let n = arena.num_vertices();
    info!(
        "solving game with {} vertices, {} edges, {} objective(s)",
        n,
        arena.num_edges(),
        arena.num_objectives()
    );
    match mode {
        SolveMode::Direct if arena.num_objectives() == 1 => {
            let (won, template) = TemplateBuilder::new(arena, 0).solve();
            Ok(SolveResult {
                winning: won[Player::Even].clone(),
                losing: won.of(Player::Odd),
                template,
                partial: false,
            })
        }
        SolveMode::Direct => {
            let outcome = Composer::new(arena).solve();
            Ok(SolveResult {
                winning: outcome.winning,
                losing: outcome.losing,
                template: outcome.template,
                partial: true,
            })
        }
        SolveMode::Composed => {
            if arena.num_objectives() != 1 {
                return Err(crate::error::Error::malformed(
                    "composed solving expects a single parity objective",
                ));
            }
            let split = arena.split_objective(0);
            let decomposed = arena.with_objectives(split)?;
            let partial = decomposed.num_objectives() > 1;
            let outcome = Composer::new(&decomposed).solve();
            Ok(SolveResult {
                winning: outcome.winning,
                losing: outcome.losing,
                template: outcome.template,
                partial,
            })
        }
        SolveMode::Incremental => {
            let outcome = Composer::new(arena).solve_incremental();
            Ok(SolveResult {
                winning: outcome.winning,
                losing: outcome.losing,
                template: outcome.template,
                partial: arena.num_objectives() > 1,
            })
        }
    }
}
