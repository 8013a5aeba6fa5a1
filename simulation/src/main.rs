//! Storyline - story viewer simulation
//!
//! Seeds an in-memory platform with authors and stories, then drives the
//! viewer through scripted or random input.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use storyline_logging::{LogConfig, StorylineSubscriberBuilder};

use storyline_simulation::{SimulationConfig, World, scenarios};

#[derive(Parser)]
#[command(
    name = "storyline",
    about = "Ephemeral story playback simulation",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// RNG seed (overrides the config file)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the two-author reference scenario
    Reference,

    /// Walk through every story creation outcome
    Post,

    /// Show the story tray of a seeded world
    Tray,

    /// Play a seeded feed in a live viewer session
    Play {
        /// Tray group to start at
        #[arg(short, long, default_value = "0")]
        start: usize,

        /// Per-story duration in milliseconds
        #[arg(long)]
        story_ms: Option<u64>,

        /// Swipe the viewer away after this many stories
        #[arg(long)]
        dismiss_after: Option<usize>,
    },

    /// Random input against a seeded world, checking invariants
    Chaos {
        /// Number of inputs
        #[arg(short, long)]
        steps: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let log_config = if cli.verbose {
        LogConfig::development()
    } else {
        config.log.clone()
    };
    let _log_guard = StorylineSubscriberBuilder::new()
        .with_config(log_config)
        .init()?;

    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    match cli.command {
        Commands::Reference => {
            let report = scenarios::run_reference_scenario(config.world.viewport_width)?;
            println!("\nVisited: {:?}", report.visited);
        }
        Commands::Post => {
            let report = scenarios::run_post_scenario(&config).await?;
            println!("\n{:?}", report);
        }
        Commands::Tray => {
            println!("seed: {}", seed);
            let world = World::seed(&config, &mut rng).await?;
            scenarios::run_tray(&world).await?;
        }
        Commands::Play {
            start,
            story_ms,
            dismiss_after,
        } => {
            println!("seed: {}", seed);
            if let Some(ms) = story_ms {
                config.playback.story_duration = std::time::Duration::from_millis(ms);
            }
            let world = World::seed(&config, &mut rng).await?;
            scenarios::run_tray(&world).await?;
            let reason = scenarios::run_playback(&world, &config.playback, start, dismiss_after).await?;
            println!("\nViewer closed: {:?}", reason);
        }
        Commands::Chaos { steps } => {
            println!("seed: {}", seed);
            if let Some(steps) = steps {
                config.chaos.steps = steps;
            }
            let world = World::seed(&config, &mut rng).await?;
            scenarios::run_chaos(&world, &config, &mut rng).await?;
        }
    }

    Ok(())
}
