use anyhow::Result;
use chess::Color;
use clap::Parser;
use engine::config::valid_depth;
use engine::game::{opening_position, parse_human_input, wants_rematch, Game};
use engine::{EngineConfig, GameState, UciSession, MAX_DEPTH};
use log::info;
use std::io::{self, BufRead, Write};

#[derive(Parser, Debug)]
#[command(author, version, about = "Play chess against a depth-limited minimax engine", long_about = None)]
struct Args {
    /// Operation mode: 'play' for a game in the terminal, 'uci' for a GUI
    #[arg(long, default_value = "play")]
    mode: String,

    /// Your color: 'w' for white, 'b' for black (asked when omitted)
    #[arg(long)]
    color: Option<String>,

    /// Search depth in plies, 1 to 64 (asked in play mode when omitted)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_DEPTH as i64))]
    depth: Option<u32>,

    /// Seed for the evaluation tie-break jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Disable the evaluation tie-break jitter
    #[arg(long)]
    no_jitter: bool,

    /// Starting FEN position (play mode)
    #[arg(long)]
    fen: Option<String>,
}

fn parse_color(color_str: &str) -> Result<Color> {
    match color_str.trim().to_lowercase().as_str() {
        "w" | "white" => Ok(Color::White),
        "b" | "black" => Ok(Color::Black),
        _ => anyhow::bail!("Invalid color: use 'w' or 'b'"),
    }
}

type Lines<'a> = io::Lines<io::StdinLock<'a>>;

/// Prints `msg` and reads one line; `None` once stdin is exhausted.
fn prompt(lines: &mut Lines<'_>, msg: &str) -> Result<Option<String>> {
    print!("{}", msg);
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

fn ask_color(lines: &mut Lines<'_>) -> Result<Option<Color>> {
    loop {
        let Some(answer) = prompt(lines, "Play as (type \"b\" or \"w\"): ")? else { return Ok(None) };
        if let Ok(c) = parse_color(&answer) { return Ok(Some(c)); }
    }
}

fn ask_depth(lines: &mut Lines<'_>) -> Result<Option<u32>> {
    loop {
        let Some(answer) = prompt(lines, "Choose depth: ")? else { return Ok(None) };
        match answer.parse::<u32>() {
            Ok(d) if valid_depth(d) => return Ok(Some(d)),
            _ => println!("Depth must be a number from 1 to {}.", MAX_DEPTH),
        }
    }
}

fn run_play(args: &Args, mut config: EngineConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    for round in 0.. {
        let human = match args.color.as_deref() {
            Some(c) => parse_color(c)?,
            None => match ask_color(&mut lines)? { Some(c) => c, None => return Ok(()) },
        };
        config.depth = match args.depth {
            Some(d) => d,
            None => match ask_depth(&mut lines)? { Some(d) => d, None => return Ok(()) },
        };

        let mut game = Game::new(&config, engine::opp(human), opening_position(args.fen.as_deref(), round)?);
        info!("game {}: human={:?} depth={}", round + 1, human, config.depth);
        println!("{}", game.position);

        while game.outcome().is_none() {
            if game.is_engine_turn() {
                println!("The engine is thinking...");
                let mv = game.play_engine_move()?;
                println!("Engine plays {} ({} nodes)", mv, game.last_nodes());
                println!("{}", game.position);
                continue;
            }

            let legal: Vec<String> = game.position.legal_moves().iter().map(|m| m.to_string()).collect();
            println!("Legal moves: {}", legal.join(" "));
            println!("To undo your last move, type \"undo\".");
            let Some(text) = prompt(&mut lines, "Your move: ")? else { return Ok(()) };
            let applied = parse_human_input(&game.position, &text)
                .map_err(anyhow::Error::from)
                .and_then(|input| game.apply_human(input).map_err(anyhow::Error::from));
            match applied {
                Ok(()) => println!("{}", game.position),
                Err(e) => println!("{}", e),
            }
        }

        if let Some(result) = game.outcome() {
            println!("{}", result);
        }
        let answer = prompt(&mut lines, "Play again? (y/n): ")?;
        if !wants_rematch(answer.as_deref()) {
            break;
        }
    }
    Ok(())
}

fn run_uci(config: EngineConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut session = UciSession::new(&config);

    for line in stdin.lock().lines() {
        for reply in session.handle(&line?) {
            println!("{}", reply);
        }
        stdout.flush()?;
        if session.should_quit() { break; }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = EngineConfig::from_env();
    if let Some(d) = args.depth { config.depth = d; }
    if args.seed.is_some() { config.seed = args.seed; }
    if args.no_jitter { config.jitter = false; }

    match args.mode.as_str() {
        "play" => run_play(&args, config),
        "uci" => run_uci(config),
        other => anyhow::bail!("Invalid mode '{}': use 'play' or 'uci'", other),
    }
}
