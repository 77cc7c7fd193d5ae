//! Strategy templates.
//!
//! A template is a symbolic description of a family of player-0 strategies:
//! unsafe edges may never be taken, co-live edges only finitely often, and
//! from every live group some edge must be taken infinitely often whenever
//! its sources are visited infinitely often. Conditional live groups attach
//! the same obligation to a condition set of vertices.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::game::arena::Region;
use crate::game::Vertex;

/// An edge of the arena, identified by its source and target vertices.
pub type Edge = (Vertex, Vertex);

/// A set of edges, stored as an ordered map from sources to target sets.
///
/// The ordered representation makes iteration, display and equality
/// deterministic, which the output contract relies on.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct EdgeSet {
    map: BTreeMap<Vertex, BTreeSet<Vertex>>,
}

impl EdgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: Vertex, to: Vertex) {
        self.map.entry(from).or_default().insert(to);
    }

    pub fn contains(&self, from: Vertex, to: Vertex) -> bool {
        self.map.get(&from).map_or(false, |set| set.contains(&to))
    }

    /// Returns the targets recorded for a source vertex.
    pub fn targets(&self, from: Vertex) -> Option<&BTreeSet<Vertex>> {
        self.map.get(&from)
    }

    /// Returns an iterator over `(source, targets)` entries.
    pub fn entries(&self) -> impl Iterator<Item = (Vertex, &BTreeSet<Vertex>)> {
        self.map.iter().map(|(&v, set)| (v, set))
    }

    /// Returns an iterator over all edges.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.map
            .iter()
            .flat_map(|(&v, set)| set.iter().map(move |&u| (v, u)))
    }

    /// Returns the number of edges.
    pub fn num_edges(&self) -> usize {
        self.map.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.map.values().all(BTreeSet::is_empty)
    }

    /// Merges another edge set into this one.
    pub fn merge(&mut self, other: &Self) {
        for (&v, targets) in &other.map {
            self.map.entry(v).or_default().extend(targets.iter().copied());
        }
    }

    /// Removes all edges whose source lies in the given region.
    pub fn remove_sources(&mut self, region: &Region) {
        self.map.retain(|&v, _| !region[v]);
    }

    /// Removes all edges whose target lies in the given region.
    pub fn remove_targets(&mut self, region: &Region) {
        for targets in self.map.values_mut() {
            targets.retain(|&u| !region[u]);
        }
    }

    /// Removes, per source, the targets recorded in the other edge set.
    pub fn subtract(&mut self, other: &Self) {
        for (v, targets) in self.map.iter_mut() {
            if let Some(removed) = other.map.get(v) {
                targets.retain(|u| !removed.contains(u));
            }
        }
    }

    /// Drops sources whose target set became empty.
    pub fn drop_empty(&mut self) {
        self.map.retain(|_, targets| !targets.is_empty());
    }
}

impl FromIterator<Edge> for EdgeSet {
    fn from_iter<T: IntoIterator<Item = Edge>>(iter: T) -> Self {
        let mut set = Self::new();
        for (from, to) in iter {
            set.insert(from, to);
        }
        set
    }
}

impl fmt::Display for EdgeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (v, u) in self.edges() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "({} -> {})", v, u)?;
            first = false;
        }
        Ok(())
    }
}

/// A strategy template: unsafe edges, co-live edges, live groups and
/// conditional live groups.
///
/// Every edge recorded in a template originates at a player-0 vertex.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Template {
    /// Edges from the winning region into the losing region.
    pub unsafe_edges: EdgeSet,
    /// Edges that may be taken only finitely often.
    pub colive_edges: EdgeSet,
    /// Groups from which some edge must be taken infinitely often.
    pub live_groups: Vec<EdgeSet>,
    /// Condition sets for the conditional live groups.
    pub cond_sets: Vec<BTreeSet<Vertex>>,
    /// Live groups active whenever the matching condition set is visited
    /// infinitely often. Kept in lockstep with `cond_sets`.
    pub cond_live_groups: Vec<Vec<EdgeSet>>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the template imposes no restriction at all.
    pub fn is_empty(&self) -> bool {
        self.unsafe_edges.is_empty()
            && self.colive_edges.is_empty()
            && self.live_groups.iter().all(EdgeSet::is_empty)
            && self.cond_live_groups.iter().flatten().all(EdgeSet::is_empty)
    }

    pub fn clear(&mut self) {
        self.unsafe_edges = EdgeSet::new();
        self.colive_edges = EdgeSet::new();
        self.live_groups.clear();
        self.cond_sets.clear();
        self.cond_live_groups.clear();
    }

    /// Merges another template into this one: unsafe and co-live edges are
    /// unioned per source, live groups and conditional entries are
    /// concatenated.
    pub fn merge(&mut self, other: &Self) {
        self.unsafe_edges.merge(&other.unsafe_edges);
        self.colive_edges.merge(&other.colive_edges);
        self.live_groups.extend(other.live_groups.iter().cloned());
        self.cond_sets.extend(other.cond_sets.iter().cloned());
        self.cond_live_groups
            .extend(other.cond_live_groups.iter().cloned());
    }

    /// Merges the co-live edges and the live groups of another template,
    /// flattening its conditional live groups into plain live groups. This
    /// is the merge used between per-objective solves.
    pub fn merge_live_colive(&mut self, other: &Self) {
        self.colive_edges.merge(&other.colive_edges);
        self.live_groups.extend(other.live_groups.iter().cloned());
        for groups in &other.cond_live_groups {
            self.live_groups.extend(groups.iter().cloned());
        }
    }

    /// Number of unsafe edges.
    pub fn num_unsafe(&self) -> usize {
        self.unsafe_edges.num_edges()
    }

    /// Number of co-live edges.
    pub fn num_colive(&self) -> usize {
        self.colive_edges.num_edges()
    }

    /// Number of live groups.
    pub fn num_live_groups(&self) -> usize {
        self.live_groups.len()
    }

    /// Number of conditional live groups, over all condition sets.
    pub fn num_cond_live_groups(&self) -> usize {
        self.cond_live_groups.iter().map(Vec::len).sum()
    }

    fn clean_groups(groups: &mut Vec<EdgeSet>) {
        for group in groups.iter_mut() {
            group.drop_empty();
        }
        groups.retain(|group| !group.is_empty());
        groups.sort();
        groups.dedup();
    }

    /// Cleans the template: drops sources with empty target sets, drops
    /// empty live groups, sorts and deduplicates the live groups, and merges
    /// conditional entries whose live-group lists coincide. Cleaning is
    /// idempotent, and makes the template independent of the order in which
    /// its parts were recorded.
    pub fn clean(&mut self) {
        self.unsafe_edges.drop_empty();
        self.colive_edges.drop_empty();
        Self::clean_groups(&mut self.live_groups);

        let cond_sets = std::mem::take(&mut self.cond_sets);
        let cond_groups = std::mem::take(&mut self.cond_live_groups);
        for (set, mut groups) in cond_sets.into_iter().zip(cond_groups) {
            if set.is_empty() {
                continue;
            }
            Self::clean_groups(&mut groups);
            if groups.is_empty() {
                continue;
            }
            match self.cond_live_groups.iter().position(|g| *g == groups) {
                Some(i) => self.cond_sets[i].extend(set),
                None => {
                    self.cond_sets.push(set);
                    self.cond_live_groups.push(groups);
                }
            }
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.unsafe_edges.is_empty() {
            writeln!(f, "Unsafe edges:")?;
            for (v, u) in self.unsafe_edges.edges() {
                writeln!(f, "{} -> {}", v, u)?;
            }
        }
        if !self.colive_edges.is_empty() {
            writeln!(f, "Colive edges:")?;
            for (v, u) in self.colive_edges.edges() {
                writeln!(f, "{} -> {}", v, u)?;
            }
        }
        if !self.live_groups.is_empty() {
            writeln!(f, "Live groups:")?;
            for group in &self.live_groups {
                writeln!(f, "{{{}}}", group)?;
            }
        }
        if !self.cond_live_groups.is_empty() {
            writeln!(f, "Conditional live groups:")?;
            for (set, groups) in self.cond_sets.iter().zip(&self.cond_live_groups) {
                let condition = set
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                for group in groups {
                    writeln!(f, "{{{}}}: {{{}}}", condition, group)?;
                }
            }
        }
        if self.is_empty() {
            writeln!(f, "TRUE")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_set(edges: &[Edge]) -> EdgeSet {
        edges.iter().copied().collect()
    }

    #[test]
    fn test_edge_set_algebra() {
        let mut set = edge_set(&[(0, 1), (0, 2), (3, 1)]);
        assert_eq!(set.num_edges(), 3);
        assert!(set.contains(0, 2));

        set.merge(&edge_set(&[(0, 4), (5, 5)]));
        assert_eq!(set.num_edges(), 5);

        let mut region = Region::with_capacity(6);
        region.insert(1);
        set.remove_targets(&region);
        assert!(!set.contains(0, 1));
        assert!(!set.contains(3, 1));

        set.subtract(&edge_set(&[(0, 2), (0, 4)]));
        set.drop_empty();
        assert_eq!(set.edges().collect::<Vec<_>>(), vec![(5, 5)]);
    }

    #[test]
    fn test_merge_flattens_conditional_groups() {
        let mut template = Template::new();
        let mut other = Template::new();
        other.colive_edges.insert(0, 1);
        other.cond_sets.push([2].into());
        other.cond_live_groups.push(vec![edge_set(&[(2, 3)])]);
        template.merge_live_colive(&other);
        assert_eq!(template.live_groups, vec![edge_set(&[(2, 3)])]);
        assert!(template.colive_edges.contains(0, 1));
        assert!(template.cond_live_groups.is_empty());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let mut template = Template::new();
        template.unsafe_edges.insert(0, 1);
        template.colive_edges = edge_set(&[(2, 3)]);
        template.live_groups = vec![
            edge_set(&[(4, 5)]),
            EdgeSet::new(),
            edge_set(&[(4, 5)]),
            edge_set(&[(1, 2)]),
        ];
        template.cond_sets = vec![[0].into(), [1].into(), BTreeSet::new()];
        template.cond_live_groups = vec![
            vec![edge_set(&[(6, 7)])],
            vec![edge_set(&[(6, 7)])],
            vec![edge_set(&[(8, 9)])],
        ];

        template.clean();
        let cleaned = template.clone();
        template.clean();
        assert_eq!(template, cleaned);

        assert_eq!(
            template.live_groups,
            vec![edge_set(&[(1, 2)]), edge_set(&[(4, 5)])]
        );
        // the two conditional entries with identical groups were merged
        assert_eq!(template.cond_sets, vec![[0, 1].into()]);
        assert_eq!(template.num_cond_live_groups(), 1);
    }

    #[test]
    fn test_empty_template_prints_true() {
        let template = Template::new();
        assert_eq!(template.to_string(), "TRUE\n");
    }
}
