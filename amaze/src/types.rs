// types.rs - Shared type definitions for positions, actions and game results
use std::fmt;
use std::ops::Add;

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error_handling::{MazeError, Result};

/// Largest displacement allowed per axis in a single action.
pub const MAX_ACTION: i32 = 5;

/// Mask value for blocked pixels.
pub const WALL: u8 = 255;
/// Mask value for passable pixels.
pub const PATH: u8 = 0;

/// Pixel position, x to the right and y down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }
}

impl Add<Action> for Point {
    type Output = Point;
    #[inline]
    fn add(self, action: Action) -> Point {
        Point::new(self.x + action.dx, self.y + action.dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Displacement requested by a player for one step.
///
/// Serialized as a two element array `[dx, dy]` to match the action log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Action {
    pub dx: i32,
    pub dy: i32,
}

impl Action {
    pub const ZERO: Action = Action::new(0, 0);
    pub const UP: Action = Action::new(0, -MAX_ACTION);
    pub const DOWN: Action = Action::new(0, MAX_ACTION);
    pub const LEFT: Action = Action::new(-MAX_ACTION, 0);
    pub const RIGHT: Action = Action::new(MAX_ACTION, 0);

    #[inline]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Checks the magnitude contract. Out of range actions are rejected, never clamped.
    pub fn validate(self) -> Result<Self> {
        let range = -MAX_ACTION..=MAX_ACTION;
        if !range.contains(&self.dx) || !range.contains(&self.dy) {
            return Err(MazeError::InvalidAction {
                dx: self.dx,
                dy: self.dy,
                limit: MAX_ACTION,
            });
        }
        Ok(self)
    }
}

impl From<[i32; 2]> for Action {
    fn from([dx, dy]: [i32; 2]) -> Self {
        Action::new(dx, dy)
    }
}

impl From<Action> for [i32; 2] {
    fn from(action: Action) -> Self {
        [action.dx, action.dy]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "GAME OVER")]
    GameOver,
    #[serde(rename = "YOU WON")]
    YouWon,
    #[serde(rename = "TIMEOUT")]
    Timeout,
}

impl GameStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::Running)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameStatus::Running => "RUNNING",
            GameStatus::GameOver => "GAME OVER",
            GameStatus::YouWon => "YOU WON",
            GameStatus::Timeout => "TIMEOUT",
        };
        f.write_str(label)
    }
}

/// Everything a generator produces for one level.
///
/// `image` and `mask` always share dimensions; the mask only holds [`PATH`] or [`WALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeOutput {
    pub image: RgbImage,
    pub mask: GrayImage,
    pub start: Point,
    pub goal: Point,
}

impl MazeOutput {
    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    /// True when the pixel is inside the buffer and not a wall.
    pub fn is_passable(&self, p: Point) -> bool {
        let (w, h) = self.mask.dimensions();
        p.x >= 0
            && p.y >= 0
            && (p.x as u32) < w
            && (p.y as u32) < h
            && self.mask.get_pixel(p.x as u32, p.y as u32)[0] == PATH
    }
}
