// engine.rs - Game loop state machine: action checks, collision, goal capture, frame composition
use image::{Rgb, RgbImage};
use log::debug;

use crate::collision::{check_collision, check_finished, CAPTURE_RADIUS, PLAYER_RADIUS};
use crate::error_handling::{MazeError, Result};
use crate::maze::Scene;
use crate::raster;
use crate::types::{Action, GameStatus, Point};

const GOAL_COLOR: Rgb<u8> = Rgb([214, 48, 49]);
const AGENT_COLOR: Rgb<u8> = Rgb([0, 184, 148]);
const LOSS_COLOR: Rgb<u8> = Rgb([232, 67, 147]);
const WIN_COLOR: Rgb<u8> = Rgb([253, 203, 110]);

/// Result of one call to [`Engine::forward`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub status: GameStatus,
    /// Agent position after the step, including the move that ended the game.
    pub position: Point,
}

#[derive(Debug, Clone, Copy)]
struct GameState {
    position: Point,
    goal: Point,
    status: GameStatus,
    steps: usize,
}

pub struct Engine<S: Scene> {
    scene: S,
    render: bool,
    state: Option<GameState>,
    /// Working copy of the background with markers, reused between frames.
    view: Option<RgbImage>,
}

impl<S: Scene> Engine<S> {
    pub fn new(scene: S) -> Self {
        Self {
            scene,
            render: true,
            state: None,
            view: None,
        }
    }

    /// Disable frame composition, e.g. for replays where nobody looks at the frames.
    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    /// Runs one iteration of the game loop.
    ///
    /// `None` initializes the game and must be the first call, exactly once. Every
    /// other call applies an action. Precondition violations leave the engine untouched.
    pub fn forward(&mut self, action: Option<Action>) -> Result<Step> {
        match action {
            None => self.initialize(),
            Some(action) => self.step(action),
        }
    }

    fn initialize(&mut self) -> Result<Step> {
        if self.state.is_some() {
            return Err(MazeError::AlreadyInitialized);
        }
        let output = self.scene.generate();
        let state = GameState {
            position: output.start,
            goal: output.goal,
            status: GameStatus::Running,
            steps: 0,
        };
        debug!("Game started at {} with goal {}", state.position, state.goal);

        if self.render {
            compose(&mut self.view, &output.image, state.position, state.goal, AGENT_COLOR);
        }
        self.state = Some(state);
        Ok(Step {
            status: state.status,
            position: state.position,
        })
    }

    fn step(&mut self, action: Action) -> Result<Step> {
        let state = self.state.as_mut().ok_or(MazeError::NotInitialized)?;
        if state.status.is_terminal() {
            return Err(MazeError::GameFinished(state.status));
        }
        let action = action.validate()?;
        let output = self.scene.update().ok_or(MazeError::NotInitialized)?;

        let collided = check_collision(state.position, action, &output.mask);
        state.position = state.position + action;
        state.steps += 1;

        if collided {
            state.status = GameStatus::GameOver;
            self.view = None;
            debug!("Collision at {} after {} steps", state.position, state.steps);
        } else if check_finished(state.position, state.goal) {
            state.status = GameStatus::YouWon;
            self.view = None;
            debug!("Goal reached at {} after {} steps", state.position, state.steps);
        } else if self.render {
            compose(&mut self.view, &output.image, state.position, state.goal, AGENT_COLOR);
        }

        Ok(Step {
            status: state.status,
            position: state.position,
        })
    }

    /// Latest frame while the game is running and rendering is enabled.
    pub fn view(&self) -> Option<&RgbImage> {
        match self.state {
            Some(state) if state.status == GameStatus::Running => self.view.as_ref(),
            _ => None,
        }
    }

    /// Fresh frame for the current state, marking a loss or a win on the agent.
    pub fn snapshot(&self) -> Option<RgbImage> {
        let state = self.state?;
        let output = self.scene.update()?;
        let color = match state.status {
            GameStatus::GameOver => LOSS_COLOR,
            GameStatus::YouWon => WIN_COLOR,
            GameStatus::Running | GameStatus::Timeout => AGENT_COLOR,
        };
        let mut frame = None;
        compose(&mut frame, &output.image, state.position, state.goal, color);
        frame
    }

    pub fn status(&self) -> Option<GameStatus> {
        self.state.map(|s| s.status)
    }

    pub fn position(&self) -> Option<Point> {
        self.state.map(|s| s.position)
    }

    pub fn goal(&self) -> Option<Point> {
        self.state.map(|s| s.goal)
    }

    /// Accepted actions so far.
    pub fn steps(&self) -> usize {
        self.state.map_or(0, |s| s.steps)
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }
}

/// Copies the background into `cache` and draws the goal and agent markers on top.
fn compose(
    cache: &mut Option<RgbImage>,
    background: &RgbImage,
    position: Point,
    goal: Point,
    agent: Rgb<u8>,
) {
    match cache {
        Some(frame) if frame.dimensions() == background.dimensions() => {
            frame.copy_from_slice(background.as_raw())
        }
        _ => *cache = Some(background.clone()),
    }
    let Some(frame) = cache.as_mut() else {
        return;
    };
    let at = |p: Point| (f64::from(p.x), f64::from(p.y));
    raster::fill_disc(frame, at(goal), CAPTURE_RADIUS, GOAL_COLOR);
    raster::fill_disc(frame, at(position), f64::from(PLAYER_RADIUS), agent);
}
