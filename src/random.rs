//! Seeded random generation of color maps and fault sets.
//!
//! Both generators take an explicit random number generator so benchmark
//! and test runs are reproducible; the binary derives it from `--seed`, or
//! from entropy (logged) when no seed is given.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::arena::Arena;
use crate::game::{Color, Vertex};
use crate::template::EdgeSet;

/// Creates a generator from an optional seed. Without a seed, one is drawn
/// from entropy and logged so the run can be repeated.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            let seed = rand::thread_rng().gen();
            info!("no seed given, using {}", seed);
            StdRng::seed_from_u64(seed)
        }
    }
}

/// Generates a random color map over the vertices of the arena with colors
/// in `0..=max_color`. Every color is assigned to at least
/// `n / (2 * max_color)` vertices; the remaining vertices get uniform
/// colors.
pub fn random_colors(arena: &Arena, max_color: Color, rng: &mut StdRng) -> Vec<Color> {
    let n = arena.num_vertices();
    let mut colors = vec![0; n];
    let mut remaining: Vec<Vertex> = (0..n).collect();

    if max_color > 0 {
        let min_per_color = n / (2 * max_color);
        for color in 0..=max_color {
            for _ in 0..min_per_color {
                if remaining.is_empty() {
                    break;
                }
                let index = rng.gen_range(0..remaining.len());
                let vertex = remaining.swap_remove(index);
                colors[vertex] = color;
            }
        }
    }
    for vertex in remaining {
        colors[vertex] = rng.gen_range(0..=max_color);
    }
    colors
}

/// Adds `count` random color maps with colors up to `max_color` to the
/// arena, returning the extended arena. With `keep`, the existing
/// objectives are retained in front.
pub fn random_objectives(
    arena: &Arena,
    count: usize,
    max_color: Color,
    keep: bool,
    rng: &mut StdRng,
) -> crate::error::Result<Arena> {
    let mut all_colors = Vec::new();
    if keep {
        for i in 0..arena.num_objectives() {
            all_colors.push(arena.color_map(i).to_vec());
        }
    }
    for _ in 0..count {
        all_colors.push(random_colors(arena, max_color, rng));
    }
    arena.with_objectives(all_colors)
}

/// Draws `count` distinct random edges of the arena.
pub fn random_fault_edges(arena: &Arena, count: usize, rng: &mut StdRng) -> EdgeSet {
    let mut edges: Vec<(Vertex, Vertex)> = (0..arena.num_vertices())
        .flat_map(|v| arena.successors(v).iter().map(move |&u| (v, u)))
        .collect();
    let count = count.min(edges.len());
    let mut faults = EdgeSet::new();
    for _ in 0..count {
        let index = rng.gen_range(0..edges.len());
        let (v, u) = edges.swap_remove(index);
        faults.insert(v, u);
    }
    faults
}
