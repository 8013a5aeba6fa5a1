//! # Storyline Simulation
//!
//! Runs the story viewer against an in-memory platform, without a UI.
//!
//! - **Config** (`config.rs`): TOML-loadable world, playback and log settings
//! - **World** (`world.rs`): seeded authors and posts created through the real
//!   creation path, some of them already expired
//! - **Scenarios** (`scenarios.rs`): the reference walk-through, the story
//!   creation outcomes, a live tokio viewer session and a randomized chaos run
//!
//! ## Example
//!
//! ```rust,ignore
//! use rand::SeedableRng;
//! use storyline_simulation::*;
//!
//! let config = SimulationConfig::default();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let world = World::seed(&config, &mut rng).await?;
//! let report = run_chaos(&world, &config, &mut rng).await?;
//! assert!(report.max_live_audio <= 1);
//! ```

pub mod config;
pub mod scenarios;
pub mod world;

#[cfg(test)]
mod integration_scenarios;

// Re-export main types
pub use config::{ChaosConfig, SimulationConfig, WorldConfig};
pub use scenarios::{
    ChaosReport, PostReport, ReferenceReport, reference_groups, run_chaos, run_playback, run_post_scenario,
    run_reference_scenario, run_tray,
};
pub use world::World;
