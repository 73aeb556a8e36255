// error_handling.rs - Error taxonomy for maze generation, the game engine and the evaluator

use thiserror::Error;

use crate::types::GameStatus;

#[derive(Error, Debug)]
pub enum MazeError {
    #[error("Invalid maze configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to parse level on line {line}: {source}")]
    LevelParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Action log references level {level} but only {available} levels are loaded")]
    UnknownLevel { level: usize, available: usize },

    #[error("Action ({dx}, {dy}) must be within +-{limit} in both dimensions")]
    InvalidAction { dx: i32, dy: i32, limit: i32 },

    #[error("Can't initialize game twice")]
    AlreadyInitialized,

    #[error("Game must be initialized with an empty action before stepping")]
    NotInitialized,

    #[error("Game already finished with status {0}")]
    GameFinished(GameStatus),

    #[error("You can only play each level once (level {level} appears more than once)")]
    DuplicateLevel { level: usize },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image processing failed: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MazeError>;

impl MazeError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        MazeError::InvalidConfig { reason: reason.into() }
    }

    /// Caller bugs: the engine or harness was driven outside its contract.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            MazeError::InvalidAction { .. }
                | MazeError::AlreadyInitialized
                | MazeError::NotInitialized
                | MazeError::GameFinished(_)
                | MazeError::DuplicateLevel { .. }
        )
    }

    /// Bad level descriptors or parameters, detected before any game runs.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            MazeError::InvalidConfig { .. }
                | MazeError::LevelParse { .. }
                | MazeError::UnknownLevel { .. }
        )
    }
}
