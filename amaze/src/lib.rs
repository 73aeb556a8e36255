// lib.rs - Library exports for amaze
// Maze generation for square, hexagonal and circular topologies, plus the game
// engine and the evaluation harness that plays levels against it.

pub mod collision;
pub mod engine;
pub mod error_handling;
pub mod evaluator;
pub mod level;
pub mod maze;
pub mod player;
pub mod raster;
pub mod types;

// Re-export commonly used types
pub use engine::{Engine, Step};
pub use error_handling::{MazeError, Result};
pub use evaluator::{compute_stats, store_results, Evaluator, LevelResult, Stats, MAX_STEPS};
pub use level::{ActionRecord, MazeConfig};
pub use maze::{Generator, Maze, Scene, StaticScene};
pub use player::{ActionReplayer, IdlePlayer, KeyboardPlayer, Player};
pub use types::{Action, GameStatus, MazeOutput, Point};
