//! Template extraction for parity games.
//!
//! Runs the same recursion as the plain solver, but records the template
//! artifacts along the way: co-live edges around sub-winning regions and
//! live groups witnessing that the play keeps making progress towards the
//! regions player 0 must visit again and again.

use log::{debug, trace};

use crate::game::arena::{Arena, ColorView, Region};
use crate::game::{Coalition, Owner, Parity, Player, Vertex};
use crate::solver::WinningRegion;
use crate::template::{EdgeSet, Template};

/// The template-extracting parity solver.
pub struct TemplateBuilder<'a> {
    arena: &'a Arena,
    colors: ColorView<'a>,
}

impl<'a> TemplateBuilder<'a> {
    /// Creates a builder for one objective of the arena.
    pub fn new(arena: &'a Arena, objective: usize) -> Self {
        Self {
            arena,
            colors: arena.colors(objective),
        }
    }

    pub(crate) fn with_colors(arena: &'a Arena, colors: ColorView<'a>) -> Self {
        Self { arena, colors }
    }

    /// Computes the winning regions and the strategy template for the whole
    /// arena. The returned template is cleaned: unsafe edges are the
    /// player-0 edges leaving the winning region, and co-live edges touching
    /// the losing region are pruned.
    pub fn solve(&self) -> (WinningRegion, Template) {
        let n = self.arena.num_vertices();
        let disabled = Region::with_capacity(n);
        let (won, mut template) = self.solve_within(&disabled);

        template.unsafe_edges =
            self.edges_between(&won[Player::Even], &won[Player::Odd], &disabled);
        template.colive_edges.remove_sources(&won[Player::Odd]);
        template.colive_edges.remove_targets(&won[Player::Odd]);
        template.clean();
        debug!(
            "template: |W_even| = {}, unsafe = {}, colive = {}, live groups = {}",
            won[Player::Even].size(),
            template.num_unsafe(),
            template.num_colive(),
            template.num_live_groups()
        );
        (won, template)
    }

    /// Computes the winning regions and the raw template for the sub-arena
    /// outside `disabled`. The raw template has no unsafe edges and still
    /// carries co-live edges recorded around regions that later turned out
    /// to be losing; the composition solver prunes those itself.
    pub(crate) fn solve_within(&self, disabled: &Region) -> (WinningRegion, Template) {
        let mut template = Template::new();
        let won = self.run(disabled, &mut template);
        (won, template)
    }

    fn run(&self, disabled: &Region, template: &mut Template) -> WinningRegion {
        let n = self.arena.num_vertices();
        let mut won = WinningRegion::with_capacity(n);
        let color = match self.colors.largest_color(disabled) {
            Some(color) => color,
            None => return won,
        };
        let player = Player::from(Parity::of(color));
        trace!("peeling color {} for player {}", color, player);

        let mut peel = Region::with_capacity(n);
        peel.extend((0..n).filter(|&v| !disabled[v] && self.colors.color(v) == color));
        let region_a = peel.attract_without(self.arena, player.into(), disabled);
        let disabled_a = disabled.union(&region_a);

        match player {
            Player::Odd => {
                let won_a = self.run(&disabled_a, template);
                if won_a[Player::Even].is_empty() {
                    won[Player::Odd] = disabled.complement(n);
                    return won;
                }
                // player 0 escapes into its sub-winning region: leaving it
                // again is allowed only finitely often, and the attractor
                // onion carries the play back in
                let region_b =
                    won_a[Player::Even].attract_without(self.arena, Player::Even.into(), disabled);
                self.colive_exits(&won_a[Player::Even], disabled, template);
                self.live_groups_reach(&won_a[Player::Even], &region_b, disabled, template);

                let disabled_b = disabled.union(&region_b);
                let mut won_b = self.run(&disabled_b, template);
                won_b[Player::Even].union_with(&region_b);
                won_b
            }
            Player::Even => {
                // solve below the peel into a scratch template first: the
                // recorded constraints are only valid if the opponent wins
                // nowhere down there
                let mut template_a = template.clone();
                let won_a = self.run(&disabled_a, &mut template_a);
                if won_a[Player::Odd].is_empty() {
                    *template = template_a;
                    self.live_groups_reach(&peel, &region_a, disabled, template);
                    self.colive_retention_exits(&peel, disabled, template);
                    won[Player::Even] = disabled.complement(n);
                    return won;
                }
                self.colive_exits(&won_a[Player::Odd], disabled, template);
                let region_b =
                    won_a[Player::Odd].attract_without(self.arena, Player::Odd.into(), disabled);
                let disabled_b = disabled.union(&region_b);
                let mut won_b = self.run(&disabled_b, template);
                won_b[Player::Odd].union_with(&region_b);
                won_b
            }
        }
    }

    /// Records the player-0 edges from `region` into the rest of the
    /// enabled sub-arena as co-live.
    fn colive_exits(&self, region: &Region, disabled: &Region, template: &mut Template) {
        for v in region.vertices() {
            if self.arena.owner(v) != Owner::Even {
                continue;
            }
            for &u in self.arena.successors(v) {
                if !disabled[u] && !region[u] {
                    template.colive_edges.insert(v, u);
                }
            }
        }
    }

    /// Records the live groups that keep the play moving towards `target`
    /// inside the covered region `within`: each layer registers every
    /// player-0 edge into the current target and grows the target by the
    /// unforced attractor together with the sources of those edges, until
    /// the unforced attractor covers `within`.
    fn live_groups_reach(
        &self,
        target: &Region,
        within: &Region,
        disabled: &Region,
        template: &mut Template,
    ) {
        let n = self.arena.num_vertices();
        let mut current = target.clone();
        loop {
            let reach = current.attract_without(self.arena, Coalition::NONE, disabled);

            let mut group = EdgeSet::new();
            let mut sources = Region::with_capacity(n);
            for v in (0..n).filter(|&v| !disabled[v]) {
                if self.arena.owner(v) != Owner::Even {
                    continue;
                }
                for &u in self.arena.successors(v) {
                    if !disabled[u] && current[u] {
                        group.insert(v, u);
                        sources.insert(v);
                    }
                }
            }
            if !group.is_empty() {
                template.live_groups.push(group);
            }
            if reach == *within {
                break;
            }
            let mut next = reach;
            next.union_with(&sources);
            if next == current {
                // no enabled edge makes progress; nothing left to witness
                debug_assert!(false, "live group layering stalled");
                break;
            }
            current = next;
        }
    }

    /// Records as co-live the player-0 exits from the retention core of the
    /// peel: the largest subset of `peel` in which player 0 can keep the
    /// play forever. Any strategy may eventually park there, so leaving the
    /// core is needed only finitely often.
    fn colive_retention_exits(&self, peel: &Region, disabled: &Region, template: &mut Template) {
        let mut core = peel.clone();
        loop {
            let dropped: Vec<Vertex> = core
                .vertices()
                .filter(|&v| !self.keeps_play_in(v, &core, disabled))
                .collect();
            if dropped.is_empty() {
                break;
            }
            for v in dropped {
                core.set(v, false);
            }
        }
        self.colive_exits(&core, disabled, template);
    }

    /// Returns whether the owner of `v` can keep the next step inside
    /// `core`: player 0 needs some enabled successor in the core, everyone
    /// else must have all enabled successors (and at least one) in it.
    fn keeps_play_in(&self, v: Vertex, core: &Region, disabled: &Region) -> bool {
        let mut enabled = self
            .arena
            .successors(v)
            .iter()
            .filter(|&&u| !disabled[u])
            .peekable();
        match self.arena.owner(v) {
            Owner::Even => enabled.any(|&u| core[u]),
            Owner::Odd | Owner::Edge => {
                enabled.peek().is_some() && enabled.all(|&u| core[u])
            }
        }
    }

    /// Returns the player-0 edges from `source` into `target` within the
    /// enabled sub-arena.
    fn edges_between(&self, source: &Region, target: &Region, disabled: &Region) -> EdgeSet {
        let mut edges = EdgeSet::new();
        for v in source.vertices() {
            if disabled[v] || self.arena.owner(v) != Owner::Even {
                continue;
            }
            for &u in self.arena.successors(v) {
                if !disabled[u] && target[u] {
                    edges.insert(v, u);
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::tests::arena;
    use crate::game::Owner::{Even as E, Odd as O};
    use crate::solver::ZielonkaSolver;

    fn group(edges: &[(Vertex, Vertex)]) -> EdgeSet {
        edges.iter().copied().collect()
    }

    #[test]
    fn test_losing_self_loop_yields_empty_template() {
        let arena = arena(&[E], &[1], &[(0, 0)]);
        let (won, template) = TemplateBuilder::new(&arena, 0).solve();
        assert!(won[Player::Odd][0]);
        assert!(template.is_empty());
    }

    #[test]
    fn test_winning_self_loop_yields_live_group() {
        let arena = arena(&[E], &[2], &[(0, 0)]);
        let (won, template) = TemplateBuilder::new(&arena, 0).solve();
        assert!(won[Player::Even][0]);
        assert!(template.unsafe_edges.is_empty());
        assert!(template.colive_edges.is_empty());
        assert_eq!(template.live_groups, vec![group(&[(0, 0)])]);
    }

    #[test]
    fn test_two_vertex_choice() {
        // staying at 0 keeps the even color, wandering to the odd vertex 1
        // is allowed only finitely often
        let arena = arena(&[E, O], &[2, 1], &[(0, 0), (0, 1), (1, 0)]);
        let (won, template) = TemplateBuilder::new(&arena, 0).solve();
        assert!(won[Player::Even][0]);
        assert!(won[Player::Even][1]);
        assert!(template.unsafe_edges.is_empty());
        assert_eq!(
            template.colive_edges.edges().collect::<Vec<_>>(),
            vec![(0, 1)]
        );
        assert_eq!(template.live_groups, vec![group(&[(0, 0)])]);
    }

    #[test]
    fn test_odd_trap_loses_everything() {
        let arena = arena(
            &[E, O, E],
            &[1, 1, 3],
            &[(0, 1), (1, 0), (1, 2), (2, 2)],
        );
        let (won, template) = TemplateBuilder::new(&arena, 0).solve();
        for v in 0..3 {
            assert!(won[Player::Odd][v]);
        }
        assert!(template.is_empty());
    }

    #[test]
    fn test_unsafe_edge_at_winning_boundary() {
        // 0 may stay on its even loop but loses by moving into the trap at 1
        let arena = arena(
            &[E, O, E],
            &[2, 1, 3],
            &[(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)],
        );
        let (won, template) = TemplateBuilder::new(&arena, 0).solve();
        assert!(won[Player::Even][0]);
        assert!(won[Player::Odd][1]);
        assert!(won[Player::Odd][2]);
        assert_eq!(
            template.unsafe_edges.edges().collect::<Vec<_>>(),
            vec![(0, 1)]
        );
        // no co-live edge may point into the losing region
        assert!(template
            .colive_edges
            .edges()
            .all(|(_, u)| won[Player::Even][u]));
    }

    #[test]
    fn test_winning_region_matches_zielonka() {
        let arena = arena(
            &[E, O, E, O, E],
            &[2, 1, 0, 3, 2],
            &[
                (0, 0),
                (0, 1),
                (1, 0),
                (1, 2),
                (2, 3),
                (3, 2),
                (3, 4),
                (4, 4),
                (4, 0),
            ],
        );
        let (won, template) = TemplateBuilder::new(&arena, 0).solve();
        let plain = ZielonkaSolver::new(&arena, 0).solve();
        for v in 0..arena.num_vertices() {
            assert_eq!(won[Player::Even][v], plain[Player::Even][v]);
            assert_eq!(won[Player::Odd][v], plain[Player::Odd][v]);
        }
        // all template edges have player-0 sources
        for (v, _) in template
            .unsafe_edges
            .edges()
            .chain(template.colive_edges.edges())
            .chain(template.live_groups.iter().flat_map(|g| g.edges()))
        {
            assert_eq!(arena.owner(v), Owner::Even);
        }
        // every live group keeps a choice that is not co-live
        for group in &template.live_groups {
            for (v, targets) in group.entries() {
                assert!(targets
                    .iter()
                    .any(|&u| !template.colive_edges.contains(v, u)));
            }
        }
    }

    #[test]
    fn test_safe_choice_remains_on_winning_vertices() {
        let arena = arena(
            &[E, O, E, E],
            &[2, 1, 3, 0],
            &[(0, 0), (0, 1), (1, 0), (1, 3), (2, 2), (2, 0), (3, 0)],
        );
        let (won, template) = TemplateBuilder::new(&arena, 0).solve();
        for v in (0..arena.num_vertices()).filter(|&v| won[Player::Even][v]) {
            if arena.owner(v) != Owner::Even {
                continue;
            }
            // some successor is neither losing nor co-live
            assert!(arena.successors(v).iter().any(|&u| {
                won[Player::Even][u] && !template.colive_edges.contains(v, u)
            }));
        }
    }
}
