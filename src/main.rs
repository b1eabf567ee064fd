use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use race_2048::agent::{AgentConfig, HeuristicAgent};
use race_2048::game::{GameEnd, GridEngine};
use race_2048::schedule::{Clock, SystemClock};
use race_2048::store::{BestScoreStore, FileStore, MemoryStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "autoplay", version, about = "Watch the greedy agent play one game of 2048 in real time")]
struct Args {
    /// Seed for tile spawns (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Delay between agent moves, in milliseconds
    #[arg(long, default_value_t = 1200)]
    delay_ms: u64,
    /// JSON file holding the best score across runs
    #[arg(long, value_name = "FILE")]
    best_file: Option<PathBuf>,
    /// Stop the agent after this many moves
    #[arg(long)]
    max_moves: Option<u64>,
    /// Don't print the board after each move
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    let store: Box<dyn BestScoreStore> = match &args.best_file {
        Some(path) => {
            let mut store = FileStore::new(path);
            store.load().with_context(|| format!("reading best score from {}", path.display()))?;
            Box::new(store)
        }
        None => Box::new(MemoryStore::default()),
    };
    info!(seed, "starting game");

    let ended: Rc<Cell<Option<GameEnd>>> = Rc::new(Cell::new(None));
    let ended_cb = ended.clone();
    let cfg = AgentConfig { move_delay: Duration::from_millis(args.delay_ms) };
    let mut agent = HeuristicAgent::with_config(GridEngine::new(StdRng::seed_from_u64(seed), store), cfg)
        .on_game_end(move |end| ended_cb.set(Some(end)));

    if !args.quiet {
        println!("{}", agent.engine().state());
    }

    let clock = SystemClock::new();
    agent.start(clock.now());
    while let Some(deadline) = agent.next_deadline() {
        let now = clock.now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        let Some(step) = agent.poll(clock.now()) else { continue };
        if step.dir.is_some() && !args.quiet {
            println!("{}", agent.engine().state());
        }
        if args.max_moves.is_some_and(|limit| agent.stats().moves >= limit) {
            agent.stop();
        }
    }

    let state = agent.engine().state();
    match ended.get() {
        Some(GameEnd::Won) => println!("You Win!"),
        Some(GameEnd::Lost) => println!("Game Over!"),
        None => println!("Stopped."),
    }
    println!(
        "Moves made: {}, score: {}, best: {}, highest tile: {}",
        agent.stats().moves,
        state.score(),
        state.best_score(),
        state.board().highest_tile()
    );
    Ok(())
}
