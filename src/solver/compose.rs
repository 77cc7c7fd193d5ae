//! Template composition for generalized parity games.
//!
//! Each objective is solved on its own and the per-objective templates are
//! merged. Merging can create conflicts: a vertex whose outgoing edges are
//! all co-live, or a live group left without a non-co-live choice. Such
//! vertices are painted with the highest odd color of every objective (a
//! vertex player 0 visits only finitely often can carry any color) and the
//! arena is re-solved, shrinking towards a sound joint winning region.

use log::{debug, info, trace};
use rayon::prelude::*;

use crate::game::arena::{Arena, ColorView, Region};
use crate::game::{Coalition, Color, Owner, Player};
use crate::solver::{TemplateBuilder, WinningRegion};
use crate::template::Template;

/// The result of a composition solve: the joint winning region for player 0
/// (a sound lower bound on the conjunction of all objectives) and the
/// merged template.
#[derive(Debug, Clone)]
pub struct ComposerOutcome {
    pub winning: Region,
    pub losing: Region,
    pub template: Template,
}

/// The composition solver for generalized parity games.
pub struct Composer<'a> {
    arena: &'a Arena,
    /// Vertices that are still in play; everything else turned out losing.
    present: Region,
    /// Cumulative set of vertices painted with the max-odd ceiling.
    painted: Region,
    /// Max-odd ceiling per objective, fixed by the base color maps.
    paint_colors: Vec<Color>,
    template: Template,
}

impl<'a> Composer<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        let n = arena.num_vertices();
        let paint_colors = (0..arena.num_objectives())
            .map(|i| max_odd(arena.max_color(i)))
            .collect();
        Self {
            arena,
            present: Region::full(n),
            painted: Region::with_capacity(n),
            paint_colors,
            template: Template::new(),
        }
    }

    /// Solves all objectives conjunctively.
    pub fn solve(mut self) -> ComposerOutcome {
        let num_objectives = self.arena.num_objectives();
        if num_objectives == 1 {
            let (won, template) = TemplateBuilder::new(self.arena, 0).solve();
            return ComposerOutcome {
                winning: won[Player::Even].clone(),
                losing: won.of(Player::Odd),
                template,
            };
        }
        self.fixpoint(num_objectives, None);
        self.finish()
    }

    /// Solves the objectives one at a time, seeding every round with the
    /// template and winning region of the previous rounds. The first sweep
    /// of each round only solves the added objective.
    pub fn solve_incremental(mut self) -> ComposerOutcome {
        let num_objectives = self.arena.num_objectives();
        if num_objectives == 1 {
            return self.solve();
        }
        let (won, template) = TemplateBuilder::new(self.arena, 0).solve_within(
            &self.present.complement(self.arena.num_vertices()),
        );
        self.template.merge_live_colive(&template);
        self.present = won.of(Player::Even);
        for objective in 1..num_objectives {
            info!("adding objective {}", objective);
            self.fixpoint(objective + 1, Some(objective));
        }
        self.finish()
    }

    /// Runs the shrink-and-retry loop over the first `active` objectives.
    /// When `only` is given, the first sweep solves just that objective and
    /// merges it into the template accumulated so far.
    fn fixpoint(&mut self, active: usize, only: Option<usize>) {
        let n = self.arena.num_vertices();
        let mut only = only;
        loop {
            if self.present.is_empty() {
                // trivially true: nothing is winning, nothing is constrained
                self.template.clear();
                return;
            }
            let disabled = self.present.complement(n);

            // per-objective solves; reads are shared, outputs are indexed,
            // so the merge below is deterministic in objective order
            let objectives: Vec<usize> = match only {
                Some(i) => vec![i],
                None => (0..active).collect(),
            };
            let results: Vec<(WinningRegion, Template)> = objectives
                .par_iter()
                .map(|&i| {
                    let colors = ColorView::with_paint(
                        self.arena.color_map(i),
                        &self.painted,
                        self.paint_colors[i],
                    );
                    TemplateBuilder::with_colors(self.arena, colors).solve_within(&disabled)
                })
                .collect();

            // the joint losing region is everything that cannot avoid some
            // per-objective losing region
            let mut losing = Region::with_capacity(n);
            for (won, _) in &results {
                let mut lost = self.present.clone();
                lost.difference_with(&won[Player::Even]);
                losing.union_with(&lost);
            }
            losing.attract_mut_without(self.arena, Coalition::NONE, &disabled);

            for (_, template) in &results {
                self.template.merge_live_colive(template);
            }

            let mut conflicts = Region::with_capacity(n);
            self.conflict_colive(&losing, &mut conflicts);
            self.conflict_live_colive(&losing, &mut conflicts);

            trace!(
                "sweep: |losing| = {}, |conflicts| = {}",
                losing.size(),
                conflicts.size()
            );

            self.present.difference_with(&losing);
            self.painted.difference_with(&losing);
            conflicts.difference_with(&losing);

            let mut fresh_paint = conflicts.clone();
            fresh_paint.difference_with(&self.painted);
            self.painted.union_with(&conflicts);

            if fresh_paint.is_empty() {
                let starved = self.unsafe_conflicts();
                if starved.is_empty() {
                    return;
                }
                // the winning region was over-estimated: these vertices
                // keep no implementable choice, so they are losing
                debug!("dropping {} over-estimated vertices", starved.size());
                self.present.difference_with(&starved);
                self.painted.difference_with(&starved);
            }
            self.template.clear();
            only = None;
        }
    }

    /// Finalizes the merged template against the overall losing region and
    /// returns the outcome.
    fn finish(mut self) -> ComposerOutcome {
        let n = self.arena.num_vertices();
        let losing = self.present.complement(n);

        self.template.colive_edges.remove_sources(&losing);
        self.template.colive_edges.remove_targets(&losing);
        for group in &mut self.template.live_groups {
            group.remove_sources(&losing);
            group.subtract(&self.template.colive_edges);
        }

        let mut unsafe_edges = crate::template::EdgeSet::new();
        for v in self.present.vertices() {
            if self.arena.owner(v) != Owner::Even {
                continue;
            }
            for &u in self.arena.successors(v) {
                if losing[u] {
                    unsafe_edges.insert(v, u);
                }
            }
        }
        self.template.unsafe_edges = unsafe_edges;
        self.template.clean();

        info!(
            "composition: |W_even| = {}/{}, unsafe = {}, colive = {}, live groups = {}",
            self.present.size(),
            n,
            self.template.num_unsafe(),
            self.template.num_colive(),
            self.template.num_live_groups()
        );
        ComposerOutcome {
            winning: self.present,
            losing,
            template: self.template,
        }
    }

    /// A vertex all of whose outgoing edges are co-live cannot honor the
    /// merged template; it is recorded as a conflict.
    fn conflict_colive(&self, losing: &Region, conflicts: &mut Region) {
        for (v, colive) in self.template.colive_edges.entries() {
            if !self.present[v] || losing[v] {
                continue;
            }
            let mut successors = self
                .arena
                .successors(v)
                .iter()
                .filter(|&&u| self.present[u])
                .peekable();
            if successors.peek().is_some() && successors.all(|&u| colive.contains(&u)) {
                conflicts.insert(v);
            }
        }
    }

    /// A live group whose choices at a vertex are all co-live can be honored
    /// finitely often at most; the vertex is recorded as a conflict.
    fn conflict_live_colive(&self, losing: &Region, conflicts: &mut Region) {
        for group in &self.template.live_groups {
            for (v, choices) in group.entries() {
                if !self.present[v] || losing[v] || choices.is_empty() {
                    continue;
                }
                if let Some(colive) = self.template.colive_edges.targets(v) {
                    if choices.iter().all(|u| colive.contains(u)) {
                        conflicts.insert(v);
                    }
                }
            }
        }
    }

    /// Detects vertices of the (shrunk) winning region without any
    /// implementable choice left: every remaining edge is co-live or gone,
    /// or some live group lost all its usable choices.
    fn unsafe_conflicts(&self) -> Region {
        let n = self.arena.num_vertices();
        let mut starved = Region::with_capacity(n);
        for v in self.present.vertices() {
            let usable = self.arena.successors(v).iter().any(|&u| {
                self.present[u] && !self.template.colive_edges.contains(v, u)
            });
            if !usable {
                starved.insert(v);
            }
        }
        for group in &self.template.live_groups {
            for (v, choices) in group.entries() {
                if !self.present[v] || choices.is_empty() {
                    continue;
                }
                let usable = choices.iter().any(|&u| {
                    self.present[u] && !self.template.colive_edges.contains(v, u)
                });
                if !usable {
                    starved.insert(v);
                }
            }
        }
        starved
    }
}

/// The smallest odd color that is at least `max_color`.
pub(crate) fn max_odd(max_color: Color) -> Color {
    if max_color % 2 == 1 {
        max_color
    } else {
        max_color + 1
    }
}

/// Computes the winning regions of every objective independently; the
/// intersection is an upper bound on the composed winning region.
pub fn independent_winning_regions(arena: &Arena) -> Vec<Region> {
    (0..arena.num_objectives())
        .map(|i| {
            crate::solver::ZielonkaSolver::new(arena, i)
                .solve()
                .of(Player::Even)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::ArenaBuilder;
    use crate::game::Owner::{Even as E, Odd as O};
    use crate::game::Vertex;

    fn multi_arena(
        owners: &[Owner],
        colors: &[&[Color]],
        edges: &[(Vertex, Vertex)],
    ) -> Arena {
        let mut builder = ArenaBuilder::new(colors.len());
        for (v, &owner) in owners.iter().enumerate() {
            let vertex_colors: Vec<Color> = colors.iter().map(|map| map[v]).collect();
            builder.add_vertex(owner, &vertex_colors);
        }
        for &(from, to) in edges {
            builder.add_edge(from, to);
        }
        builder.set_initial(0);
        builder.finish().expect("valid test arena")
    }

    #[test]
    fn test_max_odd() {
        assert_eq!(max_odd(0), 1);
        assert_eq!(max_odd(1), 1);
        assert_eq!(max_odd(2), 3);
        assert_eq!(max_odd(5), 5);
    }

    #[test]
    fn test_agreeing_objectives_on_a_ring() {
        // both objectives are satisfied by the unique cycle; each wants its
        // own even vertex visited again and again
        let arena = multi_arena(
            &[E, E],
            &[&[2, 1], &[1, 2]],
            &[(0, 1), (1, 0)],
        );
        let outcome = Composer::new(&arena).solve();
        assert!(outcome.winning[0]);
        assert!(outcome.winning[1]);
        assert!(outcome.template.colive_edges.is_empty());
        assert!(outcome.template.unsafe_edges.is_empty());
        assert_eq!(outcome.template.num_live_groups(), 2);
    }

    #[test]
    fn test_conflicting_parking_spots_shrink() {
        // each objective wants to park in its own even loop and marks the
        // middle vertex's other exit co-live; merged, vertex 0 saturates,
        // is painted odd, and the whole component falls out of the winning
        // region, while the separate loop at 3 survives
        let arena = multi_arena(
            &[E, E, E, E],
            &[&[2, 2, 1, 2], &[2, 1, 2, 2]],
            &[
                (0, 1),
                (0, 2),
                (1, 1),
                (1, 0),
                (2, 2),
                (2, 0),
                (3, 3),
            ],
        );
        let outcome = Composer::new(&arena).solve();
        assert!(!outcome.winning[0]);
        assert!(!outcome.winning[1]);
        assert!(!outcome.winning[2]);
        assert!(outcome.winning[3]);
        // nothing of the collapsed component survives in the template
        for (v, _) in outcome
            .template
            .colive_edges
            .edges()
            .chain(outcome.template.unsafe_edges.edges())
        {
            assert_eq!(v, 3);
        }
    }

    #[test]
    fn test_composition_is_a_lower_bound() {
        let arena = multi_arena(
            &[E, O, E],
            &[&[2, 1, 0], &[0, 1, 2]],
            &[(0, 1), (1, 0), (1, 2), (2, 2), (2, 0)],
        );
        let outcome = Composer::new(&arena).solve();
        let independent = independent_winning_regions(&arena);
        for v in outcome.winning.vertices() {
            for region in &independent {
                assert!(region[v], "vertex {} must win every objective", v);
            }
        }
    }

    #[test]
    fn test_incremental_matches_joint_winning() {
        let arena = multi_arena(
            &[E, E],
            &[&[2, 1], &[1, 2]],
            &[(0, 1), (1, 0)],
        );
        let joint = Composer::new(&arena).solve();
        let incremental = Composer::new(&arena).solve_incremental();
        assert_eq!(joint.winning, incremental.winning);
    }

    #[test]
    fn test_empty_winning_region_is_a_valid_result() {
        // both objectives demand a different exclusive parking spot of the
        // single player-0 vertex pair; nothing satisfies both
        let arena = multi_arena(
            &[E, E],
            &[&[2, 1], &[2, 1]],
            &[(0, 1), (1, 1)],
        );
        // objective forces eventually staying at 1, which has odd color
        let outcome = Composer::new(&arena).solve();
        assert!(outcome.winning.is_empty());
        assert!(outcome.template.is_empty());
    }
}
