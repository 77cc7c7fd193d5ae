//! The PGSolver text format.
//!
//! A game is a `parity N;` header followed by one line per vertex:
//!
//! ```text
//! <id> <color>[,<color>...] <owner> <succ>[,<succ>...][;][ "<name>"]
//! ```
//!
//! A single color per line gives a parity game; a comma-separated color list
//! gives a generalized parity game with one objective per column. The color
//! count must be the same on every line. Vertex identifiers need not be
//! dense; successors are resolved against the identifiers of the listed
//! vertices.

use std::collections::HashMap;
use std::fmt::Write as _;

use log::info;

use crate::error::{Error, Result};
use crate::game::arena::{Arena, ArenaBuilder, Region};
use crate::game::{Color, Owner, Vertex};

struct VertexLine {
    line: usize,
    id: usize,
    colors: Vec<Color>,
    owner: Owner,
    successors: Vec<usize>,
}

fn parse_number(token: &str, line: usize, what: &str) -> Result<usize> {
    token
        .parse()
        .map_err(|_| Error::malformed_at(line, format!("expected {}, found {:?}", what, token)))
}

fn parse_number_list(token: &str, line: usize, what: &str) -> Result<Vec<usize>> {
    token
        .split(',')
        .map(|part| parse_number(part, line, what))
        .collect()
}

fn parse_vertex_line(number: usize, line: &str) -> Result<VertexLine> {
    // strip the optional quoted name and trailing semicolon
    let line_body = match line.find('"') {
        Some(quote) => &line[..quote],
        None => line,
    };
    let line_body = line_body.trim_end().trim_end_matches(';');

    let mut tokens = line_body.split_whitespace();
    let mut next = |what: &str| {
        tokens
            .next()
            .ok_or_else(|| Error::malformed_at(number, format!("missing {}", what)))
    };
    let id = parse_number(next("vertex id")?, number, "a vertex id")?;
    let colors = parse_number_list(next("color list")?, number, "a color")?;
    let owner_index = parse_number(next("owner")?, number, "an owner")?;
    let owner = Owner::from_index(owner_index)
        .ok_or_else(|| Error::malformed_at(number, format!("invalid owner {}", owner_index)))?;
    let successors = parse_number_list(next("successor list")?, number, "a successor")?;
    if let Some(extra) = tokens.next() {
        return Err(Error::malformed_at(
            number,
            format!("unexpected trailing token {:?}", extra),
        ));
    }
    Ok(VertexLine {
        line: number,
        id,
        colors,
        owner,
        successors,
    })
}

/// Parses a game in PGSolver format.
pub fn parse(input: &str) -> Result<Arena> {
    let mut lines = input.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));

    // skip to the header line
    let mut found_header = false;
    for (number, line) in lines.by_ref() {
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        if tokens.next() == Some("parity") {
            let count = tokens
                .next()
                .ok_or_else(|| Error::malformed_at(number, "missing vertex count in header"))?;
            parse_number(count.trim_end_matches(';'), number, "a vertex count")?;
            found_header = true;
            break;
        }
        return Err(Error::malformed_at(number, "missing `parity N;` header"));
    }
    if !found_header {
        return Err(Error::malformed("missing `parity N;` header"));
    }

    let mut vertex_lines = Vec::new();
    for (number, line) in lines {
        if line.is_empty() {
            continue;
        }
        vertex_lines.push(parse_vertex_line(number, line)?);
    }
    if vertex_lines.is_empty() {
        return Err(Error::malformed("game has no vertices"));
    }

    let num_objectives = vertex_lines[0].colors.len();
    let mut index_of: HashMap<usize, Vertex> = HashMap::with_capacity(vertex_lines.len());
    for (index, vertex) in vertex_lines.iter().enumerate() {
        if vertex.colors.len() != num_objectives {
            return Err(Error::malformed_at(
                vertex.line,
                format!(
                    "expected {} colors as on the first vertex line, found {}",
                    num_objectives,
                    vertex.colors.len()
                ),
            ));
        }
        if index_of.insert(vertex.id, index).is_some() {
            return Err(Error::malformed_at(
                vertex.line,
                format!("vertex id {} listed twice", vertex.id),
            ));
        }
    }

    let mut builder = ArenaBuilder::new(num_objectives);
    for vertex in &vertex_lines {
        builder.add_vertex(vertex.owner, &vertex.colors);
    }
    for (index, vertex) in vertex_lines.iter().enumerate() {
        for &successor in &vertex.successors {
            let target = *index_of.get(&successor).ok_or_else(|| {
                Error::malformed_at(
                    vertex.line,
                    format!("successor {} is not a vertex of the game", successor),
                )
            })?;
            builder.add_edge(index, target);
        }
    }
    builder.set_initial(0);
    let arena = builder.finish()?;
    info!(
        "parsed pgsolver game: {} vertices, {} edges, {} objective(s)",
        arena.num_vertices(),
        arena.num_edges(),
        arena.num_objectives()
    );
    Ok(arena)
}

/// Writes a game (restricted to `present`, or whole when `None`) in
/// PGSolver format. Multi-objective games use the comma-separated color
/// extension.
pub fn emit(arena: &Arena, present: Option<&Region>) -> String {
    let n = arena.num_vertices();
    let keep = |v: Vertex| present.map_or(true, |region| region[v]);
    let count = (0..n).filter(|&v| keep(v)).count();

    let mut out = String::new();
    let _ = writeln!(out, "parity {};", count.saturating_sub(1));
    for v in (0..n).filter(|&v| keep(v)) {
        let colors = (0..arena.num_objectives())
            .map(|i| arena.color(i, v).to_string())
            .collect::<Vec<_>>()
            .join(",");
        let successors = arena
            .successors(v)
            .iter()
            .filter(|&&u| keep(u))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            out,
            "{} {} {} {};",
            v,
            colors,
            arena.owner(v).index(),
            successors
        );
    }
    out
}
