// evaluator.rs - Runs players against levels, replays action logs, aggregates results
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error_handling::Result;
use crate::level::{validate_action_log, ActionRecord, MazeConfig};
use crate::maze::{Maze, Scene};
use crate::player::{ActionReplayer, Player};
use crate::types::{Action, GameStatus};

/// Action ceiling per level; reaching it while still running is a timeout.
pub const MAX_STEPS: usize = 10_000;

/// Outcome of one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelResult {
    pub status: GameStatus,
    /// Every action the engine accepted, in order.
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub num_success: usize,
    pub total_actions: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    max_steps: usize,
    render: bool,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            max_steps: MAX_STEPS,
            render: true,
        }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Whether players get a rendered frame each step.
    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    /// Plays one level to completion.
    pub fn evaluate_level<P: Player + ?Sized>(
        &self,
        level: &MazeConfig,
        player: &mut P,
    ) -> Result<LevelResult> {
        let mut engine = Engine::new(Maze::from_config(level)?).with_render(self.render);
        let result = self.play(&mut engine, player)?;
        debug!(
            "{} (seed {}) finished with {}",
            level.type_name(),
            level.seed(),
            result.status
        );
        Ok(result)
    }

    /// Drives a fresh engine until the game ends, the player stops, or the action
    /// ceiling is reached. The engine is left in its final state for inspection.
    pub fn play<S: Scene, P: Player + ?Sized>(
        &self,
        engine: &mut Engine<S>,
        player: &mut P,
    ) -> Result<LevelResult> {
        let mut step = engine.forward(None)?;
        let mut actions = Vec::new();

        while step.status == GameStatus::Running {
            if actions.len() >= self.max_steps {
                warn!("Timed out after {} actions at {}", actions.len(), step.position);
                return Ok(LevelResult {
                    status: GameStatus::Timeout,
                    actions,
                });
            }
            let Some(action) = player.forward(engine.view(), step.position) else {
                warn!("Player stopped after {} actions", actions.len());
                return Ok(LevelResult {
                    status: GameStatus::GameOver,
                    actions,
                });
            };
            step = engine.forward(Some(action))?;
            actions.push(action);
        }

        Ok(LevelResult {
            status: step.status,
            actions,
        })
    }

    /// Plays every level with a fresh player, in parallel. Results keep level order.
    pub fn evaluate_levels<P, F>(
        &self,
        levels: &[MazeConfig],
        make_player: F,
    ) -> Result<Vec<LevelResult>>
    where
        P: Player,
        F: Fn(usize) -> P + Sync,
    {
        let started = Instant::now();
        let results = levels
            .par_iter()
            .enumerate()
            .map(|(i, level)| -> Result<LevelResult> {
                let mut player = make_player(i);
                let result = self.evaluate_level(level, &mut player)?;
                info!(
                    "Level {i} ({}): {} after {} actions",
                    level.type_name(),
                    result.status,
                    result.actions.len()
                );
                Ok(result)
            })
            .collect::<Result<Vec<_>>>()?;

        let stats = compute_stats(&results);
        info!(
            "Evaluated {} levels in {:?}: {} won, {} actions",
            results.len(),
            started.elapsed(),
            stats.num_success,
            stats.total_actions
        );
        Ok(results)
    }

    /// Replays an action log without rendering. The whole log is validated before
    /// any level runs. Results follow record order.
    pub fn replay_levels(
        &self,
        levels: &[MazeConfig],
        records: &[ActionRecord],
    ) -> Result<Vec<LevelResult>> {
        validate_action_log(records, levels.len())?;
        let replay = self.with_render(false);

        records
            .par_iter()
            .map(|record| -> Result<LevelResult> {
                let mut player = ActionReplayer::new(record.actions.clone());
                let result = replay.evaluate_level(&levels[record.level], &mut player)?;
                info!("Replayed level {}: {}", record.level, result.status);
                Ok(result)
            })
            .collect()
    }
}

pub fn compute_stats(results: &[LevelResult]) -> Stats {
    Stats {
        num_success: results.iter().filter(|r| r.status == GameStatus::YouWon).count(),
        total_actions: results.iter().map(|r| r.actions.len()).sum(),
    }
}

/// Action log of an evaluation run, one record per level.
pub fn store_results(results: &[LevelResult]) -> Vec<ActionRecord> {
    results
        .iter()
        .enumerate()
        .map(|(level, result)| ActionRecord {
            level,
            actions: result.actions.clone(),
        })
        .collect()
}
