//! Shrike binary crate.

use std::io::{self, Read, Write};

use clap::Parser;
use fs_err as fs;
use itertools::Itertools;

use shrike::error::Result;
use shrike::game::arena::Arena;
use shrike::io::{parse_game, pgsolver, Format};
use shrike::local::{local_views, LocalViewDisplay};
use shrike::options::{
    CliOptions, Command, ConvertOptions, EchoFormat, FaultOptions, SolveOptions, TraceLevel,
};
use shrike::random::{random_fault_edges, random_objectives, rng_from_seed};
use shrike::solver::check_faults;
use shrike::template::Template;
use shrike::{solve_game, SolveMode, Status};

fn main() {
    let options = CliOptions::parse();
    if let Err(error) = initialize_logging(options.trace_level) {
        let _ = writeln!(io::stderr(), "Error: {}", error);
        std::process::exit(-1);
    }
    match shrike_main(options.command) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            // discard the result as we cannot further propagate a write error
            let _ = writeln!(io::stderr(), "Error: {}", error);
            std::process::exit(-1);
        }
    }
}

/// Initialize the logging framework with the given trace level.
///
/// # Errors
///
/// Returns an error if the logging framework has already been initialized.
fn initialize_logging(level: TraceLevel) -> io::Result<()> {
    env_logger::builder()
        .filter(None, level.into())
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}

fn read_input(path: &Option<std::path::PathBuf>) -> Result<String> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

fn shrike_main(command: Command) -> Result<i32> {
    match command {
        Command::Solve(options) => solve_command(&options),
        Command::Convert(options) => convert_command(&options),
        Command::Faults(options) => faults_command(&options),
    }
}

fn solve_command(options: &SolveOptions) -> Result<i32> {
    let input = read_input(&options.input)?;
    let (arena, format) = parse_game(&input)?;

    if let Some(echo) = options.print_game {
        let echoed = match (echo, format) {
            (EchoFormat::Native, Format::Hoa) => shrike::io::hoa::emit(&arena),
            _ => pgsolver::emit(&arena, None),
        };
        print!("{}", echoed);
    }

    let mode = if options.composed {
        SolveMode::Composed
    } else if options.incremental {
        SolveMode::Incremental
    } else {
        SolveMode::Direct
    };
    let result = solve_game(&arena, mode)?;
    let status = result.status(&arena);

    let qualifier = if result.partial { " (partial)" } else { "" };
    println!("Winning Region{}: {}", qualifier, result.winning);
    print_template(&arena, &result.template, options.print_actions);

    if options.localize {
        println!("Local templates:");
        for view in local_views(&arena, &result.winning, &result.template) {
            println!(
                "{}",
                LocalViewDisplay {
                    view: &view,
                    arena: &arena,
                    use_labels: options.print_actions,
                }
            );
        }
    }
    if options.print_template_size {
        println!("#unsafe_edges: {}", result.template.num_unsafe());
        println!("#colive_edges: {}", result.template.num_colive());
        println!("#live_groups: {}", result.template.num_live_groups());
        println!(
            "#cond_live_groups: {}",
            result.template.num_cond_live_groups()
        );
    }
    println!(
        "#winning_vertices{}: {}/{}",
        qualifier,
        result.winning.size(),
        arena.num_vertices()
    );
    println!("{}", status);
    Ok(match status {
        Status::Realizable => 0,
        Status::Unrealizable => 1,
    })
}

fn print_template(arena: &Arena, template: &Template, use_labels: bool) {
    if !use_labels {
        print!("{}", template);
        return;
    }
    let name = |v: usize| arena.action_name(v, true);
    if !template.unsafe_edges.is_empty() {
        println!("Unsafe edges:");
        for (v, u) in template.unsafe_edges.edges() {
            println!("{} -> {}", v, name(u));
        }
    }
    if !template.colive_edges.is_empty() {
        println!("Colive edges:");
        for (v, u) in template.colive_edges.edges() {
            println!("{} -> {}", v, name(u));
        }
    }
    if !template.live_groups.is_empty() {
        println!("Live groups:");
        for group in &template.live_groups {
            println!(
                "{{{}}}",
                group
                    .edges()
                    .map(|(v, u)| format!("({} -> {})", v, name(u)))
                    .join(", ")
            );
        }
    }
    if template.is_empty() {
        println!("TRUE");
    }
}

fn convert_command(options: &ConvertOptions) -> Result<i32> {
    let input = read_input(&options.input)?;
    let (arena, _) = parse_game(&input)?;

    let converted = if options.split {
        if arena.num_objectives() != 1 {
            return Err(shrike::error::Error::MalformedInput(
                "--split expects a single parity objective".to_string(),
            ));
        }
        arena.with_objectives(arena.split_objective(0))?
    } else if options.objectives > 0 {
        let mut rng = rng_from_seed(options.seed);
        random_objectives(
            &arena,
            options.objectives,
            options.max_color,
            !options.replace,
            &mut rng,
        )?
    } else {
        arena
    };
    print!("{}", pgsolver::emit(&converted, None));
    Ok(0)
}

fn faults_command(options: &FaultOptions) -> Result<i32> {
    let input = read_input(&options.input)?;
    let (arena, _) = parse_game(&input)?;
    if arena.num_objectives() != 1 {
        return Err(shrike::error::Error::MalformedInput(
            "fault analysis expects a single parity objective".to_string(),
        ));
    }

    let count = 1 + (arena.num_edges() as f64 * options.percent / 100.0) as usize;
    let mut rng = rng_from_seed(options.seed);
    let mut survived = 0usize;
    let mut total_conflicts = 0usize;
    for _ in 0..options.repetitions.max(1) {
        let faults = random_fault_edges(&arena, count, &mut rng);
        let report = check_faults(&arena, 0, &faults);
        if report.survives() {
            survived += 1;
        }
        total_conflicts += report.conflicts.len();
    }
    let repetitions = options.repetitions.max(1);
    println!(
        "#faults_per_draw: {}\n#survived: {}/{}\n#avg_conflicts: {:.2}",
        count,
        survived,
        repetitions,
        total_conflicts as f64 / repetitions as f64
    );
    Ok(if survived == repetitions { 0 } else { 1 })
}
