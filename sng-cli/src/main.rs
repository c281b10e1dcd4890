//! sng: CLI for the stones-n-gems PHS* solver.
//!
//! Subcommands:
//! - solve    Run the worker pool over a set of boards
//! - show     Parse a board string and print it

mod config;

use std::process;
use std::time::{Duration, Instant};

use sng_core::{default_game_params, GameParameter, GameState};
use sng_infer::{EvaluatorOptions, ModelEvaluator, UniformModel};
use sng_logging::{now_ms, NdjsonWriter, RunSummaryV1, SearchEventV1};
use sng_runtime::ThreadPool;
use sng_search::{search, SearchInput};

use config::RunConfig;

/// 16x16 demo board used when no board file is given.
const DEMO_BOARD: &str = "16|16|9999|1|02|02|02|01|01|02|02|02|02|39|02|02|02|02|02|02|02|02|02|02|02|02|02|01|02|02|02|02|02|02|02|02|02|03|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|01|02|02|01|02|02|02|02|02|02|02|02|03|02|02|02|02|02|02|02|01|02|02|02|02|02|39|02|02|02|02|07|01|02|01|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|00|02|02|02|02|02|03|02|02|02|02|02|02|01|02|02|02|02|02|02|01|02|02|02|03|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|01|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|01|02|02|02|02|02|01|02|02|03|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|39|02|02|02|02|02|39|02|02|02|02|02|02|01|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|02|39|02|02|02|02|01|02|02|02|02|02";

fn print_help() {
    eprintln!(
        r#"sng - stones-n-gems PHS* solver

USAGE:
    sng <COMMAND> [OPTIONS]

COMMANDS:
    solve    Solve a set of boards with the worker pool
    show     Parse a board string and print it

Run `sng <COMMAND> --help` for command options."#
    );
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("solve") => cmd_solve(&args[1..]),
        Some("show") => cmd_show(&args[1..]),
        Some("--help") | Some("-h") | Some("help") | None => print_help(),
        Some(other) => {
            eprintln!("Unknown command: {other}");
            print_help();
            process::exit(1);
        }
    }
}

fn cmd_show(args: &[String]) {
    let Some(board_str) = args.first() else {
        eprintln!("USAGE: sng show <BOARD_STRING>");
        process::exit(1);
    };
    match sng_core::parse_board_str(board_str) {
        Ok(board) => {
            println!(
                "{}x{} max_steps={} gems_required={}",
                board.rows, board.cols, board.max_steps, board.gems_required
            );
            print!("{board}");
        }
        Err(e) => {
            eprintln!("Bad board string: {e}");
            process::exit(1);
        }
    }
}

fn cmd_solve(args: &[String]) {
    let mut cfg = RunConfig::default();

    // First pass: pick up --config so later flags can override it.
    let mut i = 0usize;
    while i < args.len() {
        if args[i] == "--config" {
            let path = args.get(i + 1).unwrap_or_else(|| {
                eprintln!("Missing value for --config");
                process::exit(1);
            });
            cfg = RunConfig::load(path).unwrap_or_else(|e| {
                eprintln!("Failed to load {path}: {e}");
                process::exit(1);
            });
        }
        i += 1;
    }

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                eprintln!(
                    r#"sng solve

USAGE:
    sng solve [--config cfg.yaml] [--boards FILE] [--threads N] [--seed S]
              [--repeat N] [--no-gravity] [--log out.ndjson]

OPTIONS:
    --config PATH   YAML run configuration (flags override it)
    --boards FILE   One board string per line ('#' comments allowed)
    --threads N     Search worker threads (default: 8)
    --seed S        RNG seed for every game instance (default: 0)
    --repeat N      Cycle the board set N times (default: 1)
    --no-gravity    Disable gravity
    --log PATH      Append NDJSON events to PATH
"#
                );
                return;
            }
            "--config" => i += 2,
            "--boards" => {
                cfg.boards_file = Some(required_value(args, i, "--boards"));
                i += 2;
            }
            "--threads" => {
                cfg.threads = parse_value(args, i, "--threads");
                i += 2;
            }
            "--seed" => {
                cfg.seed = parse_value(args, i, "--seed");
                i += 2;
            }
            "--repeat" => {
                cfg.repeat = parse_value(args, i, "--repeat");
                i += 2;
            }
            "--no-gravity" => {
                cfg.gravity = false;
                i += 1;
            }
            "--log" => {
                cfg.log_file = Some(required_value(args, i, "--log"));
                i += 2;
            }
            other => {
                eprintln!("Unknown option for `sng solve`: {other}");
                process::exit(1);
            }
        }
    }

    if cfg.threads == 0 || cfg.repeat == 0 {
        eprintln!("--threads and --repeat must be positive");
        process::exit(1);
    }

    let boards: Vec<String> = match &cfg.boards_file {
        Some(path) => {
            let contents = std::fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Failed to read {path}: {e}");
                process::exit(1);
            });
            contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string)
                .collect()
        }
        None => vec![DEMO_BOARD.to_string()],
    };
    if boards.is_empty() {
        eprintln!("No boards to solve");
        process::exit(1);
    }

    // Build one game per problem, cycling the board set.
    let mut states = Vec::with_capacity(boards.len() * cfg.repeat);
    for k in 0..boards.len() * cfg.repeat {
        let mut params = default_game_params();
        params.insert(
            "game_board_str".into(),
            GameParameter::Str(boards[k % boards.len()].clone()),
        );
        params.insert("gravity".into(), GameParameter::Bool(cfg.gravity));
        params.insert("rng_seed".into(), GameParameter::Int(cfg.seed));
        match GameState::new(&params) {
            Ok(state) => states.push(state),
            Err(e) => {
                eprintln!("Board {} is invalid: {e}", k % boards.len());
                process::exit(1);
            }
        }
    }

    let evaluator_options = EvaluatorOptions {
        queue_size: cfg.threads * 4,
        max_batch: 32,
    };
    // Two evaluators; problems alternate between them so inference load
    // splits across two model instances.
    let evaluator_a = ModelEvaluator::new(Box::new(UniformModel::default()), evaluator_options);
    let evaluator_b = ModelEvaluator::new(Box::new(UniformModel::default()), evaluator_options);

    let inputs: Vec<SearchInput> = states
        .into_iter()
        .enumerate()
        .map(|(k, state)| SearchInput {
            index: k as i32,
            state,
            model_evaluator: if k % 2 == 0 { &evaluator_a } else { &evaluator_b },
        })
        .collect();
    let problems = inputs.len();

    println!(
        "Solving {problems} problem(s) on {} thread(s)...",
        cfg.threads
    );
    let pool = ThreadPool::new(cfg.threads);
    let t0 = Instant::now();
    let results: Vec<(Result<bool, sng_search::SearchError>, Duration)> = pool.run(
        |input: SearchInput| {
            let start = Instant::now();
            (search(input), start.elapsed())
        },
        inputs,
    );
    let elapsed = t0.elapsed();

    let run_id = format!("run-{}", now_ms());
    let mut log = cfg.log_file.as_ref().map(|path| {
        NdjsonWriter::open_append(path).unwrap_or_else(|e| {
            eprintln!("Failed to open log {path}: {e}");
            process::exit(1);
        })
    });

    let mut solved = 0u64;
    let mut aborted = 0u64;
    for (k, (result, spent)) in results.iter().enumerate() {
        let (ok, failed) = match result {
            Ok(v) => (*v, false),
            Err(e) => {
                eprintln!("Problem {k} aborted: {e}");
                (false, true)
            }
        };
        solved += u64::from(ok);
        aborted += u64::from(failed);
        println!(
            "  problem {k:>4}: {} ({} ms)",
            if ok {
                "solved"
            } else if failed {
                "aborted"
            } else {
                "unsolved"
            },
            spent.as_millis()
        );
        if let Some(w) = log.as_mut() {
            let event = SearchEventV1 {
                event: "search_result",
                ts_ms: now_ms(),
                run_id: run_id.clone(),
                problem_index: k as i32,
                solved: ok,
                aborted: failed,
                elapsed_ms: spent.as_millis() as u64,
            };
            if let Err(e) = w.write_event(&event) {
                eprintln!("Log write failed: {e}");
            }
        }
    }

    println!(
        "Solved {solved}/{problems} ({aborted} aborted) in {:.2}s",
        elapsed.as_secs_f64()
    );
    if let Some(w) = log.as_mut() {
        let summary = RunSummaryV1 {
            event: "run_summary",
            ts_ms: now_ms(),
            run_id,
            problems: problems as u64,
            solved,
            aborted,
            threads: cfg.threads as u64,
            elapsed_ms: elapsed.as_millis() as u64,
        };
        if let Err(e) = w.write_event(&summary).and_then(|_| w.flush()) {
            eprintln!("Log write failed: {e}");
        }
    }
}

fn required_value(args: &[String], i: usize, flag: &str) -> String {
    args.get(i + 1).cloned().unwrap_or_else(|| {
        eprintln!("Missing value for {flag}");
        process::exit(1);
    })
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    let raw = required_value(args, i, flag);
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Invalid {flag} value: {raw}");
        process::exit(1);
    })
}
