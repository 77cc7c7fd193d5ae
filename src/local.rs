//! Per-vertex local views of a template.
//!
//! A local view partitions the outgoing edges of a winning player-0 vertex
//! into the classes induced by the template, so a controller at that vertex
//! can pick a next action without global knowledge.

use std::collections::BTreeSet;
use std::fmt;

use crate::game::arena::{Arena, Region};
use crate::game::{Owner, Vertex};
use crate::template::Template;

/// The edge classes of one player-0 vertex of the winning region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalView {
    pub vertex: Vertex,
    /// Every outgoing edge target.
    pub all: BTreeSet<Vertex>,
    /// Targets of unsafe edges.
    pub unsafe_targets: BTreeSet<Vertex>,
    /// Targets of co-live edges that are not unsafe.
    pub colive: BTreeSet<Vertex>,
    /// Targets of live edges that are neither unsafe nor co-live.
    pub live: BTreeSet<Vertex>,
    /// Targets in no other class.
    pub unrestricted: BTreeSet<Vertex>,
}

impl LocalView {
    /// The preferred actions: the live targets when there are any, the
    /// unrestricted ones otherwise.
    pub fn preferred(&self) -> &BTreeSet<Vertex> {
        if self.live.is_empty() {
            &self.unrestricted
        } else {
            &self.live
        }
    }
}

/// Computes the local views of all player-0 vertices in the winning region.
pub fn local_views(arena: &Arena, winning: &Region, template: &Template) -> Vec<LocalView> {
    let mut views = Vec::new();
    for v in winning.vertices() {
        if arena.owner(v) != Owner::Even {
            continue;
        }
        let all: BTreeSet<Vertex> = arena.successors(v).iter().copied().collect();
        let unsafe_targets: BTreeSet<Vertex> = template
            .unsafe_edges
            .targets(v)
            .map(|targets| targets.iter().copied().collect())
            .unwrap_or_default();
        let colive: BTreeSet<Vertex> = template
            .colive_edges
            .targets(v)
            .map(|targets| {
                targets
                    .iter()
                    .copied()
                    .filter(|u| !unsafe_targets.contains(u))
                    .collect()
            })
            .unwrap_or_default();
        let live: BTreeSet<Vertex> = template
            .live_groups
            .iter()
            .flat_map(|group| group.targets(v).into_iter().flatten().copied())
            .filter(|u| !unsafe_targets.contains(u) && !colive.contains(u))
            .collect();
        let unrestricted: BTreeSet<Vertex> = all
            .iter()
            .copied()
            .filter(|u| {
                !unsafe_targets.contains(u) && !colive.contains(u) && !live.contains(u)
            })
            .collect();
        views.push(LocalView {
            vertex: v,
            all,
            unsafe_targets,
            colive,
            live,
            unrestricted,
        });
    }
    views
}

/// Renders a local view as a machine-readable record, naming actions with
/// the given resolver (identifiers, or label expressions for edge nodes).
pub struct LocalViewDisplay<'a> {
    pub view: &'a LocalView,
    pub arena: &'a Arena,
    pub use_labels: bool,
}

impl LocalViewDisplay<'_> {
    fn write_set(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        set: &BTreeSet<Vertex>,
    ) -> fmt::Result {
        write!(f, " {}=[", name)?;
        for (i, &u) in set.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", self.arena.action_name(u, self.use_labels))?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for LocalViewDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vertex={}", self.view.vertex)?;
        self.write_set(f, "all", &self.view.all)?;
        self.write_set(f, "unsafe", &self.view.unsafe_targets)?;
        self.write_set(f, "colive", &self.view.colive)?;
        self.write_set(f, "live", &self.view.live)?;
        self.write_set(f, "unrestricted", &self.view.unrestricted)?;
        self.write_set(f, "preferred", self.view.preferred())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::tests::arena;
    use crate::game::Owner::{Even as E, Odd as O};
    use crate::solver::TemplateBuilder;
    use crate::game::Player;

    #[test]
    fn test_classes_partition_the_edges() {
        let arena = arena(&[E, O], &[2, 1], &[(0, 0), (0, 1), (1, 0)]);
        let (won, template) = TemplateBuilder::new(&arena, 0).solve();
        let views = local_views(&arena, &won[Player::Even], &template);
        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.vertex, 0);
        assert_eq!(view.all, [0, 1].into());
        assert_eq!(view.colive, [1].into());
        assert_eq!(view.live, [0].into());
        assert!(view.unsafe_targets.is_empty());
        assert!(view.unrestricted.is_empty());
        assert_eq!(view.preferred(), &view.live);

        // the classes are disjoint and cover all edges
        let total = view.unsafe_targets.len()
            + view.colive.len()
            + view.live.len()
            + view.unrestricted.len();
        assert_eq!(total, view.all.len());
    }
}
