//! Game arenas and vertex regions.
//!
//! An [`Arena`] is the root game graph; it is never mutated by a solver.
//! Sub-arenas are views given by a disabled [`Region`]: every solver
//! operation filters out disabled vertices, so restriction never copies the
//! graph.

use std::collections::VecDeque;
use std::fmt;
use std::ops::Index;

use fixedbitset::FixedBitSet;

use crate::error::{Error, Result};
use crate::game::{Coalition, Color, Owner, Vertex};

/// A region of an arena, defining a set of vertices in this region.
///
/// A region can be indexed by a vertex index, which returns `true` if the
/// vertex is in that region.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Region {
    data: FixedBitSet,
}

impl Index<Vertex> for Region {
    type Output = bool;

    fn index(&self, index: Vertex) -> &Self::Output {
        &self.data[index]
    }
}

impl fmt::Display for Region {
    /// Renders the region as the comma-separated vertex list used by the
    /// report output, in increasing index order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for v in self.data.ones() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
            first = false;
        }
        Ok(())
    }
}

impl Region {
    /// Creates an empty region with room for `n` vertices.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            data: FixedBitSet::with_capacity(n),
        }
    }

    /// Creates the full region over `n` vertices.
    pub fn full(n: usize) -> Self {
        let mut data = FixedBitSet::with_capacity(n);
        data.insert_range(..);
        Self { data }
    }

    /// Returns an iterator over the vertices in this region, in increasing
    /// index order.
    pub fn vertices(&self) -> fixedbitset::Ones {
        self.data.ones()
    }

    pub fn insert(&mut self, index: Vertex) {
        self.data.insert(index);
    }

    pub fn set(&mut self, index: Vertex, value: bool) {
        self.data.set(index, value);
    }

    pub fn union_with(&mut self, other: &Self) {
        self.data.union_with(&other.data);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut new_region = self.clone();
        new_region.union_with(other);
        new_region
    }

    pub fn difference_with(&mut self, other: &Self) {
        self.data.difference_with(&other.data);
    }

    pub fn intersect_with(&mut self, other: &Self) {
        self.data.intersect_with(&other.data);
    }

    /// Returns the complement of this region within `n` vertices.
    pub fn complement(&self, n: usize) -> Self {
        let mut new_region = Self::full(n);
        new_region.difference_with(self);
        new_region
    }

    /// Returns the number of vertices in this region.
    pub fn size(&self) -> usize {
        self.data.count_ones(..)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns whether this region is contained in the other.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.data.is_subset(&other.data)
    }

    /// Returns whether this region and the other share a vertex.
    pub fn intersects(&self, other: &Self) -> bool {
        !self.data.is_disjoint(&other.data)
    }

    /// Extends this region to the attractor of itself for the given
    /// coalition, ignoring disabled vertices. Returns whether any vertex was
    /// added.
    ///
    /// A vertex joins the attractor if its owner is in the coalition and
    /// some enabled successor is attracted, or if its owner is outside the
    /// coalition and all its enabled successors are attracted. A vertex
    /// without enabled successors is never attracted; this is how dead ends
    /// propagate as losses in sub-games.
    pub(crate) fn attract_mut_without(
        &mut self,
        arena: &Arena,
        coalition: Coalition,
        disabled: &Self,
    ) -> bool {
        let n = arena.num_vertices();
        let mut count: Vec<isize> = vec![-1; n];
        let mut queue = VecDeque::with_capacity(n);
        let mut change = false;
        queue.extend(self.vertices());
        while let Some(i) = queue.pop_front() {
            for &j in arena.predecessors(i).iter().filter(|&&j| !disabled[j]) {
                if !self[j] {
                    let controllable = coalition.controls(arena.owner(j));
                    if !controllable {
                        if count[j] == -1 {
                            count[j] = arena
                                .successors(j)
                                .iter()
                                .filter(|&&k| !disabled[k])
                                .count() as isize;
                        }
                        count[j] -= 1;
                    }
                    if controllable || count[j] == 0 {
                        change = true;
                        self.insert(j);
                        queue.push_back(j);
                    }
                }
            }
        }
        change
    }

    /// Returns the attractor of this region for the given coalition within
    /// the enabled part of the arena.
    pub(crate) fn attract_without(
        &self,
        arena: &Arena,
        coalition: Coalition,
        disabled: &Self,
    ) -> Self {
        let mut region = self.clone();
        region.attract_mut_without(arena, coalition, disabled);
        region
    }
}

impl std::iter::Extend<Vertex> for Region {
    fn extend<T: IntoIterator<Item = Vertex>>(&mut self, iter: T) {
        self.data.extend(iter)
    }
}

/// A view on one color map of an arena, with an optional painted overlay.
///
/// The composition solver paints co-live vertices with a high odd color;
/// the overlay keeps that mutation out of the persistent arena.
#[derive(Copy, Clone)]
pub struct ColorView<'a> {
    base: &'a [Color],
    painted: Option<(&'a Region, Color)>,
}

impl<'a> ColorView<'a> {
    pub(crate) fn new(base: &'a [Color]) -> Self {
        Self {
            base,
            painted: None,
        }
    }

    pub(crate) fn with_paint(base: &'a [Color], painted: &'a Region, color: Color) -> Self {
        Self {
            base,
            painted: Some((painted, color)),
        }
    }

    /// Returns the effective color of a vertex.
    pub fn color(&self, v: Vertex) -> Color {
        if let Some((painted, color)) = self.painted {
            if painted[v] {
                return color;
            }
        }
        self.base[v]
    }

    /// Returns the largest effective color among enabled vertices, or `None`
    /// if every vertex is disabled.
    pub fn largest_color(&self, disabled: &Region) -> Option<Color> {
        (0..self.base.len())
            .filter(|&v| !disabled[v])
            .map(|v| self.color(v))
            .max()
    }
}

struct VertexData {
    owner: Owner,
    successors: Vec<Vertex>,
    predecessors: Vec<Vertex>,
    label: Option<String>,
}

/// A game arena: vertices with owners, an edge relation and one or more
/// color maps, one per parity objective.
pub struct Arena {
    vertices: Vec<VertexData>,
    colors: Vec<Vec<Color>>,
    initial: Option<Vertex>,
    num_edges: usize,
    aps: Vec<String>,
    controllable_aps: Vec<usize>,
}

impl Arena {
    /// Returns the number of vertices in this arena.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of edges in this arena.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Returns the number of parity objectives of this arena.
    pub fn num_objectives(&self) -> usize {
        self.colors.len()
    }

    /// Returns the owner of a vertex.
    pub fn owner(&self, v: Vertex) -> Owner {
        self.vertices[v].owner
    }

    /// Returns the successors of a vertex.
    pub fn successors(&self, v: Vertex) -> &[Vertex] {
        &self.vertices[v].successors
    }

    /// Returns the predecessors of a vertex.
    pub fn predecessors(&self, v: Vertex) -> &[Vertex] {
        &self.vertices[v].predecessors
    }

    /// Returns the color of a vertex in the given objective.
    pub fn color(&self, objective: usize, v: Vertex) -> Color {
        self.colors[objective][v]
    }

    /// Returns a view on the color map of the given objective.
    pub fn colors(&self, objective: usize) -> ColorView<'_> {
        ColorView::new(&self.colors[objective])
    }

    /// Returns the raw color map of the given objective.
    pub(crate) fn color_map(&self, objective: usize) -> &[Color] {
        &self.colors[objective]
    }

    /// Returns the largest color of the given objective.
    pub fn max_color(&self, objective: usize) -> Color {
        self.colors[objective].iter().copied().max().unwrap_or(0)
    }

    /// Returns the initial vertex, if one is designated.
    pub fn initial_vertex(&self) -> Option<Vertex> {
        self.initial
    }

    /// Returns the label of a vertex, if any. For edge nodes this is the
    /// transition label expression.
    pub fn label(&self, v: Vertex) -> Option<&str> {
        self.vertices[v].label.as_deref()
    }

    /// Returns whether a vertex is an auxiliary edge node.
    pub fn is_edge_node(&self, v: Vertex) -> bool {
        self.owner(v) == Owner::Edge
    }

    /// Returns the atomic proposition names, when the arena was built from a
    /// labelled-transition input.
    pub fn atomic_propositions(&self) -> &[String] {
        &self.aps
    }

    /// Returns the indices of the controllable atomic propositions.
    pub fn controllable_aps(&self) -> &[usize] {
        &self.controllable_aps
    }

    /// Names the action behind a target vertex: edge nodes are projected
    /// away to their label expression, or to their unique successor when
    /// they carry no label.
    pub fn action_name(&self, target: Vertex, use_labels: bool) -> String {
        if self.is_edge_node(target) {
            if use_labels {
                if let Some(label) = self.label(target) {
                    return label.to_string();
                }
            }
            if let [successor] = self.successors(target) {
                return successor.to_string();
            }
        }
        target.to_string()
    }

    /// Returns an arena over the same graph with the given color maps.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if a color map does not cover every
    /// vertex.
    pub fn with_objectives(&self, colors: Vec<Vec<Color>>) -> Result<Self> {
        if colors.is_empty() || colors.iter().any(|c| c.len() != self.num_vertices()) {
            return Err(Error::InvariantViolation(
                "replacement color maps must cover every vertex".to_string(),
            ));
        }
        Ok(Self {
            vertices: self
                .vertices
                .iter()
                .map(|v| VertexData {
                    owner: v.owner,
                    successors: v.successors.clone(),
                    predecessors: v.predecessors.clone(),
                    label: v.label.clone(),
                })
                .collect(),
            colors,
            initial: self.initial,
            num_edges: self.num_edges,
            aps: self.aps.clone(),
            controllable_aps: self.controllable_aps.clone(),
        })
    }

    /// Splits a single parity objective into one three-color objective per
    /// odd color: colors below the odd color become 0, the odd color itself
    /// becomes 1, and higher colors become 2 when even and 1 when odd.
    ///
    /// Solving the resulting objectives conjunctively under-approximates the
    /// original parity objective.
    pub fn split_objective(&self, objective: usize) -> Vec<Vec<Color>> {
        let max_color = self.max_color(objective);
        let mut all_colors = Vec::new();
        for odd_color in (1..=max_color).filter(|c| c % 2 == 1) {
            let colors = self.colors[objective]
                .iter()
                .map(|&c| {
                    if c < odd_color {
                        0
                    } else if c == odd_color {
                        1
                    } else if c % 2 == 0 {
                        2
                    } else {
                        1
                    }
                })
                .collect();
            all_colors.push(colors);
        }
        if all_colors.is_empty() {
            // no odd color: the objective is trivially satisfied everywhere
            all_colors.push(vec![0; self.num_vertices()]);
        }
        all_colors
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("num_vertices", &self.num_vertices())
            .field("num_edges", &self.num_edges)
            .field("num_objectives", &self.num_objectives())
            .finish()
    }
}

/// An incremental builder for [`Arena`].
pub struct ArenaBuilder {
    owners: Vec<Owner>,
    colors: Vec<Vec<Color>>,
    successors: Vec<Vec<Vertex>>,
    labels: Vec<Option<String>>,
    initial: Option<Vertex>,
    aps: Vec<String>,
    controllable_aps: Vec<usize>,
}

impl ArenaBuilder {
    /// Creates a builder for an arena with the given number of objectives.
    pub fn new(num_objectives: usize) -> Self {
        Self {
            owners: Vec::new(),
            colors: vec![Vec::new(); num_objectives],
            successors: Vec::new(),
            labels: Vec::new(),
            initial: None,
            aps: Vec::new(),
            controllable_aps: Vec::new(),
        }
    }

    /// Adds a vertex with the given owner and one color per objective, and
    /// returns its index.
    ///
    /// # Panics
    ///
    /// Panics if the number of colors does not match the number of
    /// objectives.
    pub fn add_vertex(&mut self, owner: Owner, colors: &[Color]) -> Vertex {
        assert_eq!(colors.len(), self.colors.len());
        let index = self.owners.len();
        self.owners.push(owner);
        for (map, &color) in self.colors.iter_mut().zip(colors) {
            map.push(color);
        }
        self.successors.push(Vec::new());
        self.labels.push(None);
        index
    }

    /// Adds an edge between two vertices added before.
    pub fn add_edge(&mut self, from: Vertex, to: Vertex) {
        self.successors[from].push(to);
    }

    pub fn set_initial(&mut self, v: Vertex) {
        self.initial = Some(v);
    }

    pub fn set_label(&mut self, v: Vertex, label: String) {
        self.labels[v] = Some(label);
    }

    pub fn set_atomic_propositions(&mut self, aps: Vec<String>, controllable: Vec<usize>) {
        self.aps = aps;
        self.controllable_aps = controllable;
    }

    /// Finishes the arena, checking its invariants: at least one vertex,
    /// every vertex with at least one outgoing edge, and all edge endpoints
    /// in range.
    pub fn finish(self) -> Result<Arena> {
        let n = self.owners.len();
        let mut vertices: Vec<VertexData> = self
            .owners
            .into_iter()
            .zip(self.labels)
            .map(|(owner, label)| VertexData {
                owner,
                successors: Vec::new(),
                predecessors: Vec::new(),
                label,
            })
            .collect();
        let mut num_edges = 0;
        for (from, successors) in self.successors.into_iter().enumerate() {
            if successors.is_empty() {
                return Err(Error::malformed(format!(
                    "vertex {} has no outgoing edge",
                    from
                )));
            }
            let mut successors = successors;
            successors.sort_unstable();
            successors.dedup();
            for &to in &successors {
                if to >= n {
                    return Err(Error::InvariantViolation(format!(
                        "edge ({}, {}) leaves the vertex range",
                        from, to
                    )));
                }
                vertices[to].predecessors.push(from);
                num_edges += 1;
            }
            vertices[from].successors = successors;
        }
        if let Some(initial) = self.initial {
            if initial >= n {
                return Err(Error::InvariantViolation(format!(
                    "initial vertex {} out of range",
                    initial
                )));
            }
        }
        debug_assert!(self.colors.iter().all(|map| map.len() == n));
        Ok(Arena {
            vertices,
            colors: self.colors,
            initial: self.initial,
            num_edges,
            aps: self.aps,
            controllable_aps: self.controllable_aps,
        })
    }
}
