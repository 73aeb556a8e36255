// level.rs - Level descriptors, level files and action logs
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error_handling::{MazeError, Result};
use crate::maze::{CircularArgs, HexagonalArgs, SquareArgs};
use crate::types::Action;

/// One level: maze type tag plus its generation arguments.
///
/// Serialized as `{"maze": "SquareMaze", "maze_args": {...}}`. Unknown tags fail to
/// parse, which surfaces as a configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "maze", content = "maze_args")]
pub enum MazeConfig {
    SquareMaze(SquareArgs),
    HexagonalMaze(HexagonalArgs),
    CircularMaze(CircularArgs),
}

impl MazeConfig {
    pub fn seed(&self) -> u64 {
        match self {
            MazeConfig::SquareMaze(args) => args.seed,
            MazeConfig::HexagonalMaze(args) => args.seed,
            MazeConfig::CircularMaze(args) => args.seed,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            MazeConfig::SquareMaze(_) => "SquareMaze",
            MazeConfig::HexagonalMaze(_) => "HexagonalMaze",
            MazeConfig::CircularMaze(_) => "CircularMaze",
        }
    }
}

/// Recorded actions for one level, as stored in action logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub level: usize,
    pub actions: Vec<Action>,
}

/// Parses line-delimited level records. Blank lines are skipped; line numbers in
/// errors are 1-based.
pub fn parse_levels(text: &str) -> Result<Vec<MazeConfig>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|source| MazeError::LevelParse { line: i + 1, source })
        })
        .collect()
}

pub fn load_levels<P: AsRef<Path>>(path: P) -> Result<Vec<MazeConfig>> {
    let path = path.as_ref();
    let levels = parse_levels(&fs::read_to_string(path)?)?;
    info!("Loaded {} levels from {}", levels.len(), path.display());
    Ok(levels)
}

pub fn store_levels<P: AsRef<Path>>(levels: &[MazeConfig], path: P) -> Result<()> {
    let mut out = String::new();
    for level in levels {
        out.push_str(&serde_json::to_string(level)?);
        out.push('\n');
    }
    fs::write(path, out)?;
    Ok(())
}

pub fn load_action_log<P: AsRef<Path>>(path: P) -> Result<Vec<ActionRecord>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn store_action_log<P: AsRef<Path>>(records: &[ActionRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, serde_json::to_string(records)?)?;
    debug!("Stored {} action records to {}", records.len(), path.display());
    Ok(())
}

/// Checks a log can be replayed against `level_count` levels: every level at most once,
/// and only levels that exist.
pub fn validate_action_log(records: &[ActionRecord], level_count: usize) -> Result<()> {
    let mut seen = BTreeSet::new();
    for record in records {
        if !seen.insert(record.level) {
            return Err(MazeError::DuplicateLevel { level: record.level });
        }
        if record.level >= level_count {
            return Err(MazeError::UnknownLevel {
                level: record.level,
                available: level_count,
            });
        }
    }
    Ok(())
}

/// Largest seed handed out by [`create_levels`].
pub const MAX_SEED: u64 = 32_000_000;

/// How many levels of each topology [`create_levels`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCounts {
    pub square: usize,
    pub hexagonal: usize,
    pub circular: usize,
}

impl Default for LevelCounts {
    fn default() -> Self {
        Self {
            square: 30,
            hexagonal: 30,
            circular: 30,
        }
    }
}

/// `count` distinct seeds in `[0, MAX_SEED]`, in draw order.
fn unique_seeds<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<u64> {
    let mut used = BTreeSet::new();
    let mut seeds = Vec::with_capacity(count);
    while seeds.len() < count {
        let seed = rng.gen_range(0..=MAX_SEED);
        if used.insert(seed) {
            seeds.push(seed);
        }
    }
    seeds
}

/// A level set of 1024x1024 mazes: square levels first, then hexagonal, then circular.
pub fn create_levels<R: Rng + ?Sized>(counts: LevelCounts, rng: &mut R) -> Vec<MazeConfig> {
    let size = [1024, 1024];
    let square = unique_seeds(counts.square, rng)
        .into_iter()
        .map(|seed| MazeConfig::SquareMaze(SquareArgs { size, seed }));
    let hexagonal = unique_seeds(counts.hexagonal, rng)
        .into_iter()
        .map(|seed| MazeConfig::HexagonalMaze(HexagonalArgs { size, num_cells: 10, seed }));
    let circular = unique_seeds(counts.circular, rng)
        .into_iter()
        .map(|seed| MazeConfig::CircularMaze(CircularArgs { size, num_levels: 7, seed }));
    square.chain(hexagonal).chain(circular).collect()
}

/// Action log that stands still for `num_actions` steps on each of `level_count` levels.
pub fn idle_action_log(level_count: usize, num_actions: usize) -> Vec<ActionRecord> {
    (0..level_count)
        .map(|level| ActionRecord {
            level,
            actions: vec![Action::ZERO; num_actions],
        })
        .collect()
}
