//! An extended-HOA subset for parity games with labelled transitions.
//!
//! The consumer honors the header fields `HOA:`, `States:`, `Start:`,
//! `AP:`, `acc-name: parity max even K`, `Acceptance:`,
//! `spot-state-player:` (the complement of the owner, one per state) and
//! `controllable-AP:`. Transitions carry a label expression and one or more
//! acceptance colors:
//!
//! ```text
//! [<label-expr>] <succ> {<color>[ <color>...]}
//! ```
//!
//! Each transition is materialized as an auxiliary edge node owned by
//! neither player, carrying the label and the colors; states carry color 0
//! in every objective. The number of colors on the first transition fixes
//! the number of objectives; inputs mixing arities are rejected.

use std::fmt::Write as _;

use log::info;

use crate::error::{Error, Result};
use crate::game::arena::{Arena, ArenaBuilder};
use crate::game::{Color, Owner, Vertex};

#[derive(Default)]
struct Header {
    num_states: Option<usize>,
    start: Option<usize>,
    aps: Vec<String>,
    num_colors: Option<usize>,
    state_players: Vec<usize>,
    controllable_aps: Vec<usize>,
}

struct Transition {
    line: usize,
    source: usize,
    label: String,
    successor: usize,
    colors: Vec<Color>,
}

fn parse_header_number(value: &str, number: usize, what: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::malformed_at(number, format!("expected {}, found {:?}", what, value)))
}

fn parse_header_numbers(value: &str, number: usize, what: &str) -> Result<Vec<usize>> {
    value
        .split_whitespace()
        .map(|token| parse_header_number(token, number, what))
        .collect()
}

fn parse_quoted_list(value: &str, number: usize) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut rest = value.trim();
    while !rest.is_empty() {
        if !rest.starts_with('"') {
            return Err(Error::malformed_at(number, "expected a quoted name"));
        }
        let end = rest[1..]
            .find('"')
            .ok_or_else(|| Error::malformed_at(number, "unterminated quoted name"))?;
        names.push(rest[1..=end].to_string());
        rest = rest[end + 2..].trim_start();
    }
    Ok(names)
}

fn parse_header_line(header: &mut Header, number: usize, line: &str) -> Result<()> {
    let (key, value) = match line.split_once(':') {
        Some(pair) => pair,
        None => return Err(Error::malformed_at(number, "expected a `key: value` header")),
    };
    match key.trim() {
        "HOA" => {
            if value.trim() != "v1" {
                return Err(Error::malformed_at(number, "unsupported HOA version"));
            }
        }
        "States" => {
            header.num_states = Some(parse_header_number(value, number, "a state count")?);
        }
        "Start" => {
            if value.contains('&') {
                return Err(Error::malformed_at(
                    number,
                    "conjunctive start states are not supported",
                ));
            }
            header.start = Some(parse_header_number(value, number, "a start state")?);
        }
        "AP" => {
            let value = value.trim();
            let (count, names) = match value.split_once(' ') {
                Some(pair) => pair,
                None => (value, ""),
            };
            let count = parse_header_number(count, number, "an AP count")?;
            header.aps = parse_quoted_list(names, number)?;
            if header.aps.len() != count {
                return Err(Error::malformed_at(
                    number,
                    format!("AP count {} does not match {} names", count, header.aps.len()),
                ));
            }
        }
        "acc-name" => {
            let mut tokens = value.split_whitespace();
            let name = (tokens.next(), tokens.next(), tokens.next());
            if name != (Some("parity"), Some("max"), Some("even")) {
                return Err(Error::malformed_at(
                    number,
                    "only `parity max even` acceptance is supported",
                ));
            }
            let count = tokens
                .next()
                .ok_or_else(|| Error::malformed_at(number, "missing color count"))?;
            header.num_colors = Some(parse_header_number(count, number, "a color count")?);
        }
        "Acceptance" => {
            // the formula is implied by acc-name; only sanity-check the count
            let count = value
                .split_whitespace()
                .next()
                .ok_or_else(|| Error::malformed_at(number, "missing acceptance set count"))?;
            let count = parse_header_number(count, number, "an acceptance set count")?;
            if let Some(expected) = header.num_colors {
                if count != expected {
                    return Err(Error::malformed_at(
                        number,
                        "acceptance set count disagrees with acc-name",
                    ));
                }
            }
        }
        "spot-state-player" => {
            header.state_players = parse_header_numbers(value, number, "a player")?;
        }
        "controllable-AP" => {
            header.controllable_aps = parse_header_numbers(value, number, "an AP index")?;
        }
        // tool:, name:, properties:, ... are not needed to build the game
        _ => {}
    }
    Ok(())
}

fn parse_transition_line(number: usize, source: usize, line: &str) -> Result<Transition> {
    let close = line
        .find(']')
        .ok_or_else(|| Error::malformed_at(number, "transition label is not closed"))?;
    let label = line[1..close].trim().to_string();
    let rest = line[close + 1..].trim();

    let (succ, acc) = match rest.find('{') {
        Some(open) => {
            if !rest.ends_with('}') {
                return Err(Error::malformed_at(number, "acceptance signature not closed"));
            }
            (rest[..open].trim(), Some(&rest[open + 1..rest.len() - 1]))
        }
        None => (rest, None),
    };
    let successor = parse_header_number(succ, number, "a successor state")?;
    let acc = acc.ok_or_else(|| {
        Error::malformed_at(number, "transition carries no acceptance signature")
    })?;
    let colors = parse_header_numbers(acc, number, "a color")?;
    if colors.is_empty() {
        return Err(Error::malformed_at(
            number,
            "transition carries no acceptance signature",
        ));
    }
    Ok(Transition {
        line: number,
        source,
        label,
        successor,
        colors,
    })
}

/// Parses a parity game in the extended-HOA subset.
pub fn parse(input: &str) -> Result<Arena> {
    let mut header = Header::default();
    let mut transitions: Vec<Transition> = Vec::new();
    let mut current_state: Option<usize> = None;
    let mut in_body = false;
    let mut states_seen = 0usize;

    for (number, line) in input.lines().enumerate().map(|(i, l)| (i + 1, l.trim())) {
        if line.is_empty() {
            continue;
        }
        if line == "--BODY--" {
            in_body = true;
            continue;
        }
        if line == "--END--" {
            break;
        }
        if !in_body {
            parse_header_line(&mut header, number, line)?;
        } else if let Some(rest) = line.strip_prefix("State:") {
            let rest = rest.trim();
            if rest.starts_with('[') {
                return Err(Error::malformed_at(number, "state labels are not supported"));
            }
            if rest.contains('{') {
                return Err(Error::malformed_at(
                    number,
                    "state-based acceptance is not supported",
                ));
            }
            let index_token = rest.split_whitespace().next().ok_or_else(|| {
                Error::malformed_at(number, "missing state index")
            })?;
            current_state = Some(parse_header_number(index_token, number, "a state index")?);
            states_seen += 1;
        } else if line.starts_with('[') {
            let source = current_state
                .ok_or_else(|| Error::malformed_at(number, "transition before any state"))?;
            transitions.push(parse_transition_line(number, source, line)?);
        } else {
            return Err(Error::malformed_at(
                number,
                format!("unexpected body line {:?}", line),
            ));
        }
    }

    let num_states = header
        .num_states
        .ok_or_else(|| Error::malformed("missing States: header"))?;
    let num_colors = header
        .num_colors
        .ok_or_else(|| Error::malformed("missing parity max even acceptance"))?;
    if header.state_players.len() != num_states {
        return Err(Error::malformed(format!(
            "spot-state-player lists {} entries for {} states",
            header.state_players.len(),
            num_states
        )));
    }
    if states_seen != num_states {
        return Err(Error::malformed(format!(
            "body defines {} states, header announces {}",
            states_seen, num_states
        )));
    }
    let num_objectives = match transitions.first() {
        Some(first) => first.colors.len(),
        None => return Err(Error::malformed("game has no transitions")),
    };

    let mut builder = ArenaBuilder::new(num_objectives);
    let zero_colors = vec![0; num_objectives];
    for (state, &player) in header.state_players.iter().enumerate() {
        // the state-player value is the complement of the owner
        let owner = match player {
            0 => Owner::Odd,
            1 => Owner::Even,
            _ => {
                return Err(Error::malformed(format!(
                    "invalid spot-state-player value {} for state {}",
                    player, state
                )))
            }
        };
        builder.add_vertex(owner, &zero_colors);
    }
    for transition in &transitions {
        if transition.colors.len() != num_objectives {
            return Err(Error::malformed_at(
                transition.line,
                format!(
                    "expected {} colors as on the first transition, found {}",
                    num_objectives,
                    transition.colors.len()
                ),
            ));
        }
        if transition.source >= num_states || transition.successor >= num_states {
            return Err(Error::malformed_at(
                transition.line,
                "transition endpoint is not a state",
            ));
        }
        for &color in &transition.colors {
            if color >= num_colors {
                return Err(Error::malformed_at(
                    transition.line,
                    format!("color {} exceeds the announced {} colors", color, num_colors),
                ));
            }
        }
        let node = builder.add_vertex(Owner::Edge, &transition.colors);
        builder.set_label(node, transition.label.clone());
        builder.add_edge(transition.source, node);
        builder.add_edge(node, transition.successor);
    }
    if let Some(start) = header.start {
        if start >= num_states {
            return Err(Error::malformed(format!("start state {} out of range", start)));
        }
        builder.set_initial(start);
    }
    builder.set_atomic_propositions(header.aps, header.controllable_aps);

    let arena = builder.finish()?;
    info!(
        "parsed hoa game: {} states, {} transitions, {} objective(s)",
        num_states,
        transitions.len(),
        arena.num_objectives()
    );
    Ok(arena)
}

/// Builds the acceptance formula of a max-even parity condition with the
/// given number of colors.
fn acceptance_formula(num_colors: usize) -> String {
    if num_colors == 0 {
        return "f".to_string();
    }
    let mut formula = "Inf(0)".to_string();
    for color in 1..num_colors {
        formula = if color % 2 == 0 {
            format!("Inf({}) | ({})", color, formula)
        } else {
            format!("Fin({}) & ({})", color, formula)
        };
    }
    formula
}

/// Writes an arena in the extended-HOA subset. Edge nodes are projected
/// back into labelled transitions; vertices that are not edge nodes become
/// states and their colors travel on their incoming transitions' signatures
/// when the arena was built from a labelled input, or on synthetic `t`
/// transitions otherwise.
pub fn emit(arena: &Arena) -> String {
    let n = arena.num_vertices();
    let states: Vec<Vertex> = (0..n).filter(|&v| !arena.is_edge_node(v)).collect();
    let state_index: Vec<Option<usize>> = {
        let mut map = vec![None; n];
        for (i, &v) in states.iter().enumerate() {
            map[v] = Some(i);
        }
        map
    };
    let num_colors = (0..arena.num_objectives())
        .map(|i| arena.max_color(i) + 1)
        .max()
        .unwrap_or(1);

    let mut out = String::new();
    let _ = writeln!(out, "HOA: v1");
    let _ = writeln!(out, "States: {}", states.len());
    if let Some(initial) = arena.initial_vertex() {
        if let Some(index) = state_index[initial] {
            let _ = writeln!(out, "Start: {}", index);
        }
    }
    let aps = arena.atomic_propositions();
    let mut ap_line = format!("AP: {}", aps.len());
    for ap in aps {
        let _ = write!(ap_line, " \"{}\"", ap);
    }
    let _ = writeln!(out, "{}", ap_line);
    let _ = writeln!(out, "acc-name: parity max even {}", num_colors);
    let _ = writeln!(out, "Acceptance: {} {}", num_colors, acceptance_formula(num_colors));
    let players = states
        .iter()
        .map(|&v| match arena.owner(v) {
            Owner::Even => "1",
            _ => "0",
        })
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "spot-state-player: {}", players);
    if !arena.controllable_aps().is_empty() {
        let controllable = arena
            .controllable_aps()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "controllable-AP: {}", controllable);
    }
    let _ = writeln!(out, "--BODY--");
    for (i, &v) in states.iter().enumerate() {
        let _ = writeln!(out, "State: {}", i);
        for &u in arena.successors(v) {
            let (label, target, colors) = if arena.is_edge_node(u) {
                let target = arena.successors(u)[0];
                let colors: Vec<Color> = (0..arena.num_objectives())
                    .map(|objective| arena.color(objective, u))
                    .collect();
                (arena.label(u).unwrap_or("t").to_string(), target, colors)
            } else {
                let colors: Vec<Color> = (0..arena.num_objectives())
                    .map(|objective| arena.color(objective, u))
                    .collect();
                ("t".to_string(), u, colors)
            };
            let signature = colors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(
                out,
                "[{}] {} {{{}}}",
                label,
                state_index[target].expect("edge node chains are one step long"),
                signature
            );
        }
    }
    let _ = writeln!(out, "--END--");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
HOA: v1
States: 2
Start: 0
AP: 2 \"req\" \"grant\"
acc-name: parity max even 3
Acceptance: 3 Inf(2) | (Fin(1) & (Inf(0)))
spot-state-player: 1 0
controllable-AP: 1
--BODY--
State: 0
[0 & !1] 1 {2}
[!0] 0 {1}
State: 1
[t] 0 {0}
--END--
";

    #[test]
    fn test_parse_sample() {
        let arena = parse(SAMPLE).unwrap();
        // 2 states and 3 edge nodes
        assert_eq!(arena.num_vertices(), 5);
        assert_eq!(arena.num_objectives(), 1);
        assert_eq!(arena.owner(0), Owner::Even);
        assert_eq!(arena.owner(1), Owner::Odd);
        assert!(arena.is_edge_node(2));
        assert_eq!(arena.label(2), Some("0 & !1"));
        assert_eq!(arena.color(0, 2), 2);
        assert_eq!(arena.successors(2), &[1]);
        assert_eq!(arena.initial_vertex(), Some(0));
        assert_eq!(arena.atomic_propositions(), &["req", "grant"]);
        assert_eq!(arena.controllable_aps(), &[1]);
        // states carry the neutral color
        assert_eq!(arena.color(0, 0), 0);
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let arena = parse(SAMPLE).unwrap();
        let emitted = emit(&arena);
        let reparsed = parse(&emitted).unwrap();
        assert_eq!(arena.num_vertices(), reparsed.num_vertices());
        assert_eq!(arena.num_objectives(), reparsed.num_objectives());
        assert_eq!(arena.controllable_aps(), reparsed.controllable_aps());
        for v in 0..arena.num_vertices() {
            assert_eq!(arena.owner(v), reparsed.owner(v));
            assert_eq!(arena.label(v), reparsed.label(v));
            assert_eq!(arena.color(0, v), reparsed.color(0, v));
        }
    }

    #[test]
    fn test_mixed_acceptance_arity_is_rejected() {
        let input = SAMPLE.replace("[t] 0 {0}", "[t] 0 {0 1}");
        let error = parse(&input).unwrap_err();
        assert!(error.to_string().contains("colors"));
    }

    #[test]
    fn test_missing_signature_is_rejected() {
        let input = SAMPLE.replace("[t] 0 {0}", "[t] 0");
        assert!(parse(&input).is_err());
    }

    #[test]
    fn test_acceptance_formula() {
        assert_eq!(acceptance_formula(1), "Inf(0)");
        assert_eq!(acceptance_formula(2), "Fin(1) & (Inf(0))");
        assert_eq!(acceptance_formula(3), "Inf(2) | (Fin(1) & (Inf(0)))");
    }
}
