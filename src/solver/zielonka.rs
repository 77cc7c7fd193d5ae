//! The classic recursive parity game solver.

use log::debug;

use crate::game::arena::{Arena, ColorView, Region};
use crate::game::{Parity, Player};
use crate::solver::WinningRegion;

/// Zielonka's recursive solver on the max-color peel.
///
/// Each recursion level removes the attractor of the maximum color for the
/// player of its parity and solves the rest; the recursion depth is bounded
/// by the number of distinct colors.
pub struct ZielonkaSolver<'a> {
    arena: &'a Arena,
    colors: ColorView<'a>,
}

impl<'a> ZielonkaSolver<'a> {
    /// Creates a solver for one objective of the arena.
    pub fn new(arena: &'a Arena, objective: usize) -> Self {
        Self {
            arena,
            colors: arena.colors(objective),
        }
    }

    pub(crate) fn with_colors(arena: &'a Arena, colors: ColorView<'a>) -> Self {
        Self { arena, colors }
    }

    /// Solves the whole arena and returns the partition into the winning
    /// regions of the two players.
    pub fn solve(&self) -> WinningRegion {
        let disabled = Region::with_capacity(self.arena.num_vertices());
        let won = self.run(&disabled);
        debug!(
            "zielonka partition: |W_even| = {}, |W_odd| = {}",
            won[Player::Even].size(),
            won[Player::Odd].size()
        );
        won
    }

    /// Solves the sub-arena of vertices outside `disabled`.
    pub(crate) fn run(&self, disabled: &Region) -> WinningRegion {
        let n = self.arena.num_vertices();
        let mut won = WinningRegion::with_capacity(n);
        let color = match self.colors.largest_color(disabled) {
            Some(color) => color,
            None => return won,
        };
        let player = Player::from(Parity::of(color));

        let mut region_a = Region::with_capacity(n);
        region_a.extend(
            (0..n).filter(|&v| !disabled[v] && self.colors.color(v) == color),
        );
        region_a.attract_mut_without(self.arena, player.into(), disabled);

        let disabled_a = disabled.union(&region_a);
        let won_a = self.run(&disabled_a);

        if won_a[!player].is_empty() {
            // the opponent wins nowhere below the peel, so the color player
            // wins the whole enabled region
            won[player] = disabled.complement(n);
            return won;
        }

        let mut region_b = won_a.of(!player);
        region_b.attract_mut_without(self.arena, (!player).into(), disabled);
        let disabled_b = disabled.union(&region_b);
        let mut won_b = self.run(&disabled_b);
        won_b[!player].union_with(&region_b);
        won_b
    }
}
