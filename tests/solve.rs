//! End-to-end tests driving the public solving API on textual games.

use shrike::game::arena::Region;
use shrike::game::{Owner, Player};
use shrike::io::{parse_game, pgsolver};
use shrike::solver::{independent_winning_regions, TemplateBuilder, ZielonkaSolver};
use shrike::template::Template;
use shrike::{solve_game, SolveMode, Status};

fn solve(input: &str) -> (shrike::game::arena::Arena, shrike::SolveResult) {
    let (arena, _) = parse_game(input).expect("game parses");
    let result = solve_game(&arena, SolveMode::Direct).expect("game solves");
    (arena, result)
}

fn region(result: &shrike::SolveResult) -> Vec<usize> {
    result.winning.vertices().collect()
}

#[test]
fn trivial_loss_on_odd_self_loop() {
    let (arena, result) = solve("parity 0;\n0 1 0 0;\n");
    assert_eq!(region(&result), Vec::<usize>::new());
    assert!(result.template.is_empty());
    assert_eq!(result.status(&arena), Status::Unrealizable);
}

#[test]
fn trivial_win_on_even_self_loop() {
    let (arena, result) = solve("parity 0;\n0 2 0 0;\n");
    assert_eq!(region(&result), vec![0]);
    assert!(result.template.unsafe_edges.is_empty());
    assert!(result.template.colive_edges.is_empty());
    let groups: Vec<Vec<(usize, usize)>> = result
        .template
        .live_groups
        .iter()
        .map(|g| g.edges().collect())
        .collect();
    assert_eq!(groups, vec![vec![(0, 0)]]);
    assert_eq!(result.status(&arena), Status::Realizable);
}

#[test]
fn two_vertex_choice_keeps_the_even_anchor() {
    let (arena, result) = solve("parity 1;\n0 2 0 0,1;\n1 1 1 0;\n");
    assert_eq!(region(&result), vec![0, 1]);
    // wandering over to the odd vertex is allowed only finitely often
    assert_eq!(
        result.template.colive_edges.edges().collect::<Vec<_>>(),
        vec![(0, 1)]
    );
    // the self-loop anchors a live group
    assert!(result
        .template
        .live_groups
        .iter()
        .any(|group| group.contains(0, 0)));
    assert_eq!(result.status(&arena), Status::Realizable);
}

#[test]
fn odd_player_forces_the_high_color_trap() {
    let (arena, result) = solve("parity 2;\n0 1 0 1;\n1 1 1 0,2;\n2 3 0 2;\n");
    assert_eq!(region(&result), Vec::<usize>::new());
    assert!(result.losing[0] && result.losing[1] && result.losing[2]);
    assert_eq!(result.status(&arena), Status::Unrealizable);
}

#[test]
fn agreeing_generalized_objectives_compose_without_conflict() {
    let (arena, result) = solve("parity 1;\n0 2,1 0 1;\n1 1,2 0 0;\n");
    assert_eq!(region(&result), vec![0, 1]);
    assert!(result.template.colive_edges.is_empty());
    assert_eq!(result.template.num_live_groups(), 2);
    assert!(result.partial);
    assert_eq!(result.status(&arena), Status::Realizable);
}

#[test]
fn conflicting_objectives_shrink_the_winning_region() {
    // both objectives want to park in their own loop reachable from 0 and
    // mark the other exit of 0 co-live; the merged template saturates 0,
    // the component collapses, and only the independent loop at 3 survives
    let input = "parity 3;
0 2,2 0 1,2;
1 2,1 0 1,0;
2 1,2 0 2,0;
3 2,2 0 3;
";
    let (_, result) = solve(input);
    assert_eq!(region(&result), vec![3]);
}

#[test]
fn composition_stays_below_the_independent_intersection() {
    let input = "parity 2;\n0 2,0 0 1;\n1 1,1 1 0,2;\n2 0,2 0 2,0;\n";
    let (arena, result) = solve(input);
    let independent = independent_winning_regions(&arena);
    for v in result.winning.vertices() {
        for objective in &independent {
            assert!(objective[v]);
        }
    }
}

#[test]
fn template_builder_agrees_with_zielonka() {
    let input = "parity 5;
0 2 0 0,1;
1 1 1 0,2;
2 0 0 3;
3 3 1 2,4;
4 2 0 4,0;
5 1 0 5,0;
";
    let (arena, _) = parse_game(input).unwrap();
    let (won, template) = TemplateBuilder::new(&arena, 0).solve();
    let plain = ZielonkaSolver::new(&arena, 0).solve();
    for v in 0..arena.num_vertices() {
        // the two solvers partition identically
        assert_eq!(won[Player::Even][v], plain[Player::Even][v]);
        assert!(won[Player::Even][v] ^ won[Player::Odd][v]);
    }
    // every template edge leaves a player-0 vertex
    for (v, _) in template
        .unsafe_edges
        .edges()
        .chain(template.colive_edges.edges())
        .chain(template.live_groups.iter().flat_map(|g| g.edges()))
    {
        assert_eq!(arena.owner(v), Owner::Even);
    }
    // winning player-0 vertices keep a safe, non-co-live choice
    for v in won[Player::Even].vertices() {
        if arena.owner(v) != Owner::Even {
            continue;
        }
        assert!(arena
            .successors(v)
            .iter()
            .any(|&u| won[Player::Even][u] && !template.colive_edges.contains(v, u)));
    }
    // every live group keeps a non-co-live choice per source
    for group in &template.live_groups {
        for (v, targets) in group.entries() {
            assert!(targets
                .iter()
                .any(|&u| !template.colive_edges.contains(v, u)));
        }
    }
}

#[test]
fn solving_is_deterministic() {
    let input = "parity 3;\n0 2,1 0 1,2;\n1 1,2 0 0;\n2 3,0 1 0,3;\n3 0,1 0 2;\n";
    let (arena, _) = parse_game(input).unwrap();
    let first = solve_game(&arena, SolveMode::Direct).unwrap();
    let second = solve_game(&arena, SolveMode::Direct).unwrap();
    assert_eq!(first.winning, second.winning);
    assert_eq!(first.template, second.template);
}

#[test]
fn composed_parity_is_a_sound_lower_bound() {
    let input = "parity 3;\n0 2 0 1;\n1 1 1 0,2;\n2 4 0 2,3;\n3 3 1 0;\n";
    let (arena, _) = parse_game(input).unwrap();
    let composed = solve_game(&arena, SolveMode::Composed).unwrap();
    let exact = ZielonkaSolver::new(&arena, 0).solve();
    for v in composed.winning.vertices() {
        assert!(exact[Player::Even][v]);
    }
}

#[test]
fn incremental_solving_matches_the_joint_result() {
    let input = "parity 1;\n0 2,1 0 1;\n1 1,2 0 0;\n";
    let (arena, _) = parse_game(input).unwrap();
    let joint = solve_game(&arena, SolveMode::Direct).unwrap();
    let incremental = solve_game(&arena, SolveMode::Incremental).unwrap();
    assert_eq!(joint.winning, incremental.winning);
}

#[test]
fn pgsolver_round_trip_preserves_the_game() {
    let input = "parity 2;\n0 2,0 0 0,1;\n1 1,1 1 2;\n2 3,2 0 0,2;\n";
    let (arena, _) = parse_game(input).unwrap();
    let emitted = pgsolver::emit(&arena, None);
    let (reparsed, _) = parse_game(&emitted).unwrap();
    assert_eq!(arena.num_vertices(), reparsed.num_vertices());
    for v in 0..arena.num_vertices() {
        assert_eq!(arena.owner(v), reparsed.owner(v));
        assert_eq!(arena.successors(v), reparsed.successors(v));
        for objective in 0..arena.num_objectives() {
            assert_eq!(arena.color(objective, v), reparsed.color(objective, v));
        }
    }
}

#[test]
fn hoa_game_solves_through_edge_nodes() {
    let input = "\
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
    let (arena, result) = solve(input);
    assert_eq!(result.status(&arena), Status::Realizable);
    // the whole inflated arena is winning
    assert_eq!(result.winning.size(), arena.num_vertices());
    // the live group points at the labelled edge node towards state 1
    let anchor = result
        .template
        .live_groups
        .iter()
        .flat_map(|g| g.edges())
        .next()
        .expect("a live group survives");
    assert_eq!(anchor.0, 0);
    assert!(arena.is_edge_node(anchor.1));
    assert_eq!(arena.label(anchor.1), Some("0 & !1"));
}

#[test]
fn games_parse_from_files_as_from_strings() {
    use std::io::Write;

    let input = "parity 1;\n0 2 0 0,1;\n1 1 1 0;\n";
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", input).unwrap();
    let from_file = std::fs::read_to_string(file.path()).unwrap();
    let (arena, _) = parse_game(&from_file).unwrap();
    let (direct, _) = parse_game(input).unwrap();
    assert_eq!(arena.num_vertices(), direct.num_vertices());
    assert_eq!(arena.num_edges(), direct.num_edges());
}

#[test]
fn cleaning_a_template_twice_changes_nothing() {
    let input = "parity 1;\n0 2 0 0,1;\n1 1 1 0;\n";
    let (_, result) = solve(input);
    let mut cleaned: Template = result.template.clone();
    cleaned.clean();
    assert_eq!(cleaned, result.template);
}

#[test]
fn empty_winning_region_yields_the_empty_template() {
    // both objectives force eventually settling on the odd vertex
    let input = "parity 1;\n0 2,2 0 1;\n1 1,1 0 1;\n";
    let (arena, result) = solve(input);
    assert!(result.winning.is_empty());
    assert!(result.template.is_empty());
    assert_eq!(result.status(&arena), Status::Unrealizable);
    assert_eq!(result.losing, Region::full(arena.num_vertices()));
}
