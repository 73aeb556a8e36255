// main.rs - Command line front end: play, evaluate and replay levels, render and author level sets

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use amaze::level::{self, LevelCounts};
use amaze::raster;
use amaze::{
    compute_stats, store_results, Engine, Evaluator, IdlePlayer, KeyboardPlayer, Maze, MazeConfig,
    Scene,
};

/// CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Worker threads for batch runs (defaults to one per core)
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one level from the keyboard (w/a/s/d + Enter, q to quit)
    Play {
        /// Level file, one JSON record per line
        #[arg(short, long, default_value = "resource/levels.txt")]
        levels: PathBuf,

        /// Index of the level to play
        #[arg(short = 'n', long, default_value = "0")]
        level: usize,

        /// Write the final frame to this PNG
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Run the idle player over every level and print stats
    Evaluate {
        /// Level file, one JSON record per line
        #[arg(short, long, default_value = "resource/levels.txt")]
        levels: PathBuf,

        /// Write the resulting action log here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replay an action log against a level file and print stats
    Replay {
        /// Level file, one JSON record per line
        #[arg(short, long, default_value = "resource/levels.txt")]
        levels: PathBuf,

        /// Action log (JSON array of {"level", "actions"})
        #[arg(short, long)]
        actions: PathBuf,
    },

    /// Render one level with start and goal markers to PNG
    Render {
        /// Level file, one JSON record per line
        #[arg(short, long, default_value = "resource/levels.txt")]
        levels: PathBuf,

        /// Index of the level to render
        #[arg(short = 'n', long, default_value = "0")]
        level: usize,

        /// Output image path
        #[arg(short, long, default_value = "maze.png")]
        output: PathBuf,
    },

    /// Write a fresh level set with unique seeds
    CreateLevels {
        /// Output level file
        #[arg(short, long, default_value = "resource/levels.txt")]
        output: PathBuf,

        /// Number of square levels
        #[arg(long, default_value = "30")]
        square: usize,

        /// Number of hexagonal levels
        #[arg(long, default_value = "30")]
        hex: usize,

        /// Number of circular levels
        #[arg(long, default_value = "30")]
        circular: usize,

        /// Seed for drawing level seeds (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write an all-zero action log covering every level of a level file
    CreateActions {
        /// Level file, one JSON record per line
        #[arg(short, long, default_value = "resource/levels.txt")]
        levels: PathBuf,

        /// Output action log
        #[arg(short, long, default_value = "resource/actions.json")]
        output: PathBuf,

        /// Actions per level
        #[arg(long, default_value = "1000")]
        num_actions: usize,
    },
}

fn load_levels(path: &Path) -> Result<Vec<MazeConfig>> {
    level::load_levels(path)
        .with_context(|| format!("Failed to load levels from {}", path.display()))
}

fn pick_level(levels: &[MazeConfig], index: usize) -> Result<&MazeConfig> {
    levels
        .get(index)
        .ok_or_else(|| anyhow!("Level {index} out of range, {} levels available", levels.len()))
}

fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display())),
        _ => Ok(()),
    }
}

fn print_stats(results: &[amaze::LevelResult]) -> Result<()> {
    let stats = compute_stats(results);
    println!("{}", serde_json::to_string(&stats).context("Failed to encode stats")?);
    Ok(())
}

fn play(levels: &Path, index: usize, snapshot: Option<&Path>) -> Result<()> {
    let levels = load_levels(levels)?;
    let config = pick_level(&levels, index)?;
    let mut engine = Engine::new(Maze::from_config(config)?).with_render(false);
    let mut player = KeyboardPlayer::new(io::stdin().lock());

    info!("Playing level {index} ({}), w/a/s/d + Enter to move, q to quit", config.type_name());
    let result = Evaluator::new().play(&mut engine, &mut player)?;
    println!("{} after {} actions", result.status, result.actions.len());

    if let Some(path) = snapshot {
        let frame = engine.snapshot().context("No frame to save")?;
        raster::save_png(&frame, path)
            .with_context(|| format!("Failed writing PNG {}", path.display()))?;
        info!("Saved final frame to {}", path.display());
    }
    Ok(())
}

fn render(levels: &Path, index: usize, output: &Path) -> Result<()> {
    let levels = load_levels(levels)?;
    let config = pick_level(&levels, index)?;
    let mut maze = Maze::from_config(config)?;
    let out = maze.generate();
    info!(
        "{} {}x{} start {} goal {}",
        config.type_name(),
        out.dimensions().0,
        out.dimensions().1,
        out.start,
        out.goal
    );

    // A running engine at the start position draws both markers
    let mut engine = Engine::new(maze).with_render(false);
    engine.forward(None)?;
    let frame = engine.snapshot().context("No frame to save")?;
    raster::save_png(&frame, output)
        .with_context(|| format!("Failed writing PNG {}", output.display()))?;
    info!("Saved image to {}", output.display());
    Ok(())
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Play {
            levels,
            level,
            snapshot,
        } => play(&levels, level, snapshot.as_deref()),

        Command::Evaluate { levels, output } => {
            let levels = load_levels(&levels)?;
            let results = Evaluator::new()
                .with_render(false)
                .evaluate_levels(&levels, |_| IdlePlayer)?;
            if let Some(path) = output {
                create_parent_dir(&path)?;
                level::store_action_log(&store_results(&results), &path)
                    .with_context(|| format!("Failed writing {}", path.display()))?;
            }
            print_stats(&results)
        }

        Command::Replay { levels, actions } => {
            let levels = load_levels(&levels)?;
            let records = level::load_action_log(&actions)
                .with_context(|| format!("Failed to load actions from {}", actions.display()))?;
            let results = Evaluator::new().replay_levels(&levels, &records)?;
            print_stats(&results)
        }

        Command::Render {
            levels,
            level,
            output,
        } => render(&levels, level, &output),

        Command::CreateLevels {
            output,
            square,
            hex,
            circular,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let counts = LevelCounts {
                square,
                hexagonal: hex,
                circular,
            };
            let levels = level::create_levels(counts, &mut rng);
            create_parent_dir(&output)?;
            level::store_levels(&levels, &output)
                .with_context(|| format!("Failed writing {}", output.display()))?;
            info!("Wrote {} levels to {}", levels.len(), output.display());
            Ok(())
        }

        Command::CreateActions {
            levels,
            output,
            num_actions,
        } => {
            let levels = load_levels(&levels)?;
            let log = level::idle_action_log(levels.len(), num_actions);
            create_parent_dir(&output)?;
            level::store_action_log(&log, &output)
                .with_context(|| format!("Failed writing {}", output.display()))?;
            info!("Wrote {} action records to {}", log.len(), output.display());
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("Starting with {args:?}");

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    run(args.command)
}
