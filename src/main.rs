//! Maze Escape-Route Solver
//!
//! Generates mazes with a seeded Prim's-algorithm generator, solves them with
//! any of the escape-route engines, validates the result and reports timings.

use std::error::Error;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use maze_escape::generator::generate;
use maze_escape::maze::render;
use maze_escape::solver::{AutoSolver, ForkJoinSolver, DEFAULT_THRESHOLD, FORK_DISTANCE};
use maze_escape::{check_route, fixtures, GridMaze, Position, Route, Solver, Strategy};

/// Finds escape routes through mazes.
#[derive(Parser)]
#[command(name = "escape")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a maze and solve it.
    Solve {
        #[command(flatten)]
        maze: MazeArgs,
        /// Engine to use.
        #[arg(long, default_value_t = Strategy::Auto)]
        strategy: Strategy,
        /// Start cell as `x,y` (default: top-left corner).
        #[arg(long, value_parser = parse_position)]
        start: Option<Position>,
        /// Exit cell as `x,y` (default: bottom-right corner).
        #[arg(long, value_parser = parse_position)]
        exit: Option<Position>,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Print a built-in maze with the route an engine finds through it.
    Render {
        /// Fixture name: 3x3, 7x7 or 12x6.
        #[arg(long, default_value = "7x7")]
        fixture: String,
        #[arg(long, default_value_t = Strategy::Backtrack)]
        strategy: Strategy,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Run every engine on the same generated maze and compare timings.
    Compare {
        #[command(flatten)]
        maze: MazeArgs,
        #[command(flatten)]
        tuning: Tuning,
    },
}

#[derive(Args)]
struct MazeArgs {
    #[arg(long, default_value_t = 1000)]
    width: usize,
    #[arg(long, default_value_t = 1000)]
    height: usize,
    /// Generator seed; the same seed always gives the same maze.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Engine tuning knobs.
#[derive(Args)]
struct Tuning {
    /// Fork-join pool size (default: available parallelism).
    #[arg(long)]
    workers: Option<usize>,
    /// Path growth a fork-join task needs before it may fork again.
    #[arg(long, default_value_t = FORK_DISTANCE)]
    fork_distance: usize,
    /// Endpoint span at which `auto` switches to the dual engine.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: u64,
}

impl Tuning {
    fn solver(&self, strategy: Strategy) -> Box<dyn Solver> {
        match strategy {
            Strategy::ForkJoin => {
                let defaults = ForkJoinSolver::default();
                Box::new(ForkJoinSolver {
                    workers: self.workers.unwrap_or(defaults.workers),
                    fork_distance: self.fork_distance,
                })
            }
            Strategy::Auto => Box::new(AutoSolver {
                threshold: self.threshold,
            }),
            other => other.solver(),
        }
    }
}

/// Parses `x,y`.
fn parse_position(text: &str) -> Result<Position, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{text}`"))?;
    let coordinate = |part: &str| {
        part.trim()
            .parse::<i32>()
            .map_err(|e| format!("bad coordinate `{part}`: {e}"))
    };
    Ok(Position::new(coordinate(x)?, coordinate(y)?))
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Solve {
            maze,
            strategy,
            start,
            exit,
            tuning,
        } => run_solve(&maze, &*tuning.solver(strategy), start, exit),
        Command::Render {
            fixture,
            strategy,
            tuning,
        } => run_render(&fixture, &*tuning.solver(strategy)),
        Command::Compare { maze, tuning } => run_compare(&maze, &tuning),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_maze(args: &MazeArgs) -> Result<GridMaze, Box<dyn Error>> {
    let started = Instant::now();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let maze = generate(args.width, args.height, &mut rng)?;
    info!(
        "generated {}x{} maze (seed {}) in {:?}",
        args.width,
        args.height,
        args.seed,
        started.elapsed()
    );
    Ok(maze)
}

/// Solves and validates, returning the route and the solve time.
fn timed_solve(
    solver: &dyn Solver,
    maze: &GridMaze,
    start: Position,
    exit: Position,
) -> Result<(Route, Duration), Box<dyn Error>> {
    let started = Instant::now();
    let route = solver.solve(maze, start, exit)?;
    let elapsed = started.elapsed();
    check_route(maze, &route, start, exit)?;
    Ok((route, elapsed))
}

/// Generates a maze and solves it.
fn run_solve(
    args: &MazeArgs,
    solver: &dyn Solver,
    start: Option<Position>,
    exit: Option<Position>,
) -> Result<(), Box<dyn Error>> {
    let maze = build_maze(args)?;
    let start = start.unwrap_or(Position::new(0, 0));
    let exit = exit.unwrap_or_else(|| maze.far_corner());

    let (route, elapsed) = timed_solve(solver, &maze, start, exit)?;
    println!(
        "{}: route of {} positions from {} to {} in {:?}",
        solver.name(),
        route.len(),
        start,
        exit,
        elapsed
    );
    Ok(())
}

/// Prints a fixture maze with its route.
fn run_render(name: &str, solver: &dyn Solver) -> Result<(), Box<dyn Error>> {
    let fixture = fixtures::by_name(name).ok_or_else(|| format!("unknown fixture `{name}`"))?;
    let maze = fixture.maze()?;
    let (route, _) = timed_solve(solver, &maze, fixture.start(), fixture.exit())?;
    print!("{}", render(&maze, &route));
    println!("{} positions", route.len());
    Ok(())
}

/// Runs every engine on one maze and prints a timing table.
fn run_compare(args: &MazeArgs, tuning: &Tuning) -> Result<(), Box<dyn Error>> {
    let maze = build_maze(args)?;
    let start = Position::new(0, 0);
    let exit = maze.far_corner();

    println!("{:<12} {:>10} {:>14}", "engine", "positions", "time");
    for strategy in Strategy::ALL {
        let solver = tuning.solver(strategy);
        let (route, elapsed) = timed_solve(&*solver, &maze, start, exit)?;
        println!(
            "{:<12} {:>10} {:>14}",
            solver.name(),
            route.len(),
            format!("{elapsed:.2?}")
        );
    }
    Ok(())
}
