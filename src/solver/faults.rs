//! Availability-fault analysis.
//!
//! A permanently unavailable edge behaves like a co-live edge: it may be
//! used at most finitely often before the fault strikes. Seeding the
//! template computation with the faulty edges and checking for conflicts
//! afterwards decides whether the template survives the faults without
//! re-synthesis.

use std::collections::BTreeSet;

use log::debug;

use crate::game::arena::{Arena, Region};
use crate::game::{Owner, Player, Vertex};
use crate::solver::TemplateBuilder;
use crate::template::{EdgeSet, Template};

/// The outcome of an availability-fault check.
#[derive(Debug, Clone)]
pub struct FaultReport {
    /// Vertices of the surviving winning region left without an
    /// implementable choice.
    pub conflicts: BTreeSet<Vertex>,
    /// Formerly winning vertices stranded by the faults: every edge leads
    /// into the losing region or is faulty.
    pub stranded: Region,
    /// The winning region after dead-end propagation.
    pub winning: Region,
}

impl FaultReport {
    /// Returns whether the template survives the faults unchanged; when
    /// `false`, the strategy template has to be recomputed on the pruned
    /// arena.
    pub fn survives(&self) -> bool {
        self.conflicts.is_empty() && self.stranded.is_empty()
    }
}

/// Checks whether the strategy template of the given objective survives the
/// permanent unavailability of the given edges.
pub fn check_faults(arena: &Arena, objective: usize, faults: &EdgeSet) -> FaultReport {
    let n = arena.num_vertices();
    let disabled = Region::with_capacity(n);

    // solve with the faulty edges pre-seeded as co-live
    let (won, computed) = TemplateBuilder::new(arena, objective).solve_within(&disabled);
    let mut template = Template::new();
    template.colive_edges = faults.clone();
    template.merge_live_colive(&computed);

    // faults can strand vertices of the winning region: propagate dead ends
    let mut losing = won.of(Player::Odd);
    let mut stranded = Region::with_capacity(n);
    loop {
        let mut grown = false;
        for v in 0..n {
            if losing[v] {
                continue;
            }
            let stuck = arena
                .successors(v)
                .iter()
                .all(|&u| losing[u] || faults.contains(v, u));
            if stuck {
                losing.insert(v);
                stranded.insert(v);
                grown = true;
            }
        }
        if !grown {
            break;
        }
    }
    let winning = losing.complement(n);

    let mut conflicts = BTreeSet::new();
    for v in winning.vertices() {
        if arena.owner(v) != Owner::Even {
            continue;
        }
        let usable = arena
            .successors(v)
            .iter()
            .any(|&u| winning[u] && !template.colive_edges.contains(v, u));
        if !usable {
            conflicts.insert(v);
        }
    }
    for group in &template.live_groups {
        for (v, choices) in group.entries() {
            if !winning[v] || choices.is_empty() {
                continue;
            }
            let usable = choices
                .iter()
                .any(|&u| winning[u] && !template.colive_edges.contains(v, u));
            if !usable {
                conflicts.insert(v);
            }
        }
    }
    debug!(
        "fault check: {} fault edges, {} stranded, {} conflicts",
        faults.num_edges(),
        stranded.size(),
        conflicts.len()
    );
    FaultReport {
        conflicts,
        stranded,
        winning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::tests::arena;
    use crate::game::Owner::{Even as E, Odd as O};

    #[test]
    fn test_fault_on_redundant_edge_survives() {
        // 0 has two even vertices to commute between; losing one edge of
        // the cycle through 1 still leaves the self-loop
        let arena = arena(&[E, E], &[2, 2], &[(0, 0), (0, 1), (1, 0)]);
        let faults: EdgeSet = [(0, 1)].into_iter().collect();
        let report = check_faults(&arena, 0, &faults);
        assert!(report.survives());
        assert!(report.winning[0]);
        assert!(report.winning[1]);
    }

    #[test]
    fn test_fault_starving_the_live_group_conflicts() {
        // the template keeps (0, 1) co-live, so a fault on the self-loop
        // leaves vertex 0 without any usable choice
        let arena = arena(&[E, O], &[2, 1], &[(0, 0), (0, 1), (1, 0)]);
        let faults: EdgeSet = [(0, 0)].into_iter().collect();
        let report = check_faults(&arena, 0, &faults);
        assert!(!report.survives());
        assert!(report.conflicts.contains(&0));
    }

    #[test]
    fn test_fault_stranding_a_vertex() {
        // vertex 0 wins only through its even self-loop; the fault strands
        // it between the faulty loop and the losing trap
        let arena = arena(
            &[E, O, E],
            &[2, 1, 3],
            &[(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)],
        );
        let faults: EdgeSet = [(0, 0)].into_iter().collect();
        let report = check_faults(&arena, 0, &faults);
        assert!(!report.survives());
        assert!(report.stranded[0]);
        assert!(!report.winning[0]);
    }
}
