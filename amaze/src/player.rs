// player.rs - Controllers that pick the next action from the current frame
use std::io::BufRead;

use image::RgbImage;
use log::debug;

use crate::types::{Action, Point};

/// Picks the next action. `None` means the player is done: the level ends as lost.
pub trait Player {
    fn forward(&mut self, view: Option<&RgbImage>, position: Point) -> Option<Action>;
}

impl<F> Player for F
where
    F: FnMut(Option<&RgbImage>, Point) -> Option<Action>,
{
    fn forward(&mut self, view: Option<&RgbImage>, position: Point) -> Option<Action> {
        self(view, position)
    }
}

/// Never moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlePlayer;

impl Player for IdlePlayer {
    fn forward(&mut self, _view: Option<&RgbImage>, _position: Point) -> Option<Action> {
        Some(Action::ZERO)
    }
}

/// Plays back a recorded action list, then gives up.
#[derive(Debug, Clone)]
pub struct ActionReplayer {
    actions: std::vec::IntoIter<Action>,
}

impl ActionReplayer {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions: actions.into_iter(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.actions.len()
    }
}

impl Player for ActionReplayer {
    fn forward(&mut self, _view: Option<&RgbImage>, _position: Point) -> Option<Action> {
        self.actions.next()
    }
}

/// Line based keyboard input: `w`/`a`/`s`/`d` move, `q` or end of input quits,
/// anything else stands still.
pub struct KeyboardPlayer<R> {
    input: R,
    line: String,
}

impl<R: BufRead> KeyboardPlayer<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: String::new(),
        }
    }
}

impl<R: BufRead> Player for KeyboardPlayer<R> {
    fn forward(&mut self, _view: Option<&RgbImage>, position: Point) -> Option<Action> {
        self.line.clear();
        match self.input.read_line(&mut self.line) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        let action = match self.line.trim().chars().next() {
            Some('q') => return None,
            Some('w') => Action::UP,
            Some('a') => Action::LEFT,
            Some('s') => Action::DOWN,
            Some('d') => Action::RIGHT,
            _ => Action::ZERO,
        };
        debug!("Key input at {position}: {action:?}");
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ORIGIN: Point = Point::new(0, 0);

    #[test]
    fn test_idle_player() {
        let mut player = IdlePlayer;
        for _ in 0..3 {
            assert_eq!(player.forward(None, ORIGIN), Some(Action::ZERO));
        }
    }

    #[test]
    fn test_replayer_runs_dry() {
        let mut player = ActionReplayer::new(vec![Action::UP, Action::new(2, -3)]);
        assert_eq!(player.remaining(), 2);
        assert_eq!(player.forward(None, ORIGIN), Some(Action::UP));
        assert_eq!(player.forward(None, ORIGIN), Some(Action::new(2, -3)));
        assert_eq!(player.forward(None, ORIGIN), None);
        assert_eq!(player.forward(None, ORIGIN), None);
    }

    #[test]
    fn test_keyboard_mapping() {
        let mut player = KeyboardPlayer::new(Cursor::new("w\na\n\ns\nx\nd\nq\ns\n"));
        let mut next = || player.forward(None, ORIGIN);
        assert_eq!(next(), Some(Action::UP));
        assert_eq!(next(), Some(Action::LEFT));
        assert_eq!(next(), Some(Action::ZERO));
        assert_eq!(next(), Some(Action::DOWN));
        assert_eq!(next(), Some(Action::ZERO));
        assert_eq!(next(), Some(Action::RIGHT));
        assert_eq!(next(), None);
    }

    #[test]
    fn test_keyboard_end_of_input() {
        let mut player = KeyboardPlayer::new(Cursor::new("d"));
        assert_eq!(player.forward(None, ORIGIN), Some(Action::RIGHT));
        assert_eq!(player.forward(None, ORIGIN), None);
    }

    #[test]
    fn test_closure_player() {
        let mut calls = 0;
        let mut player = |_: Option<&RgbImage>, position: Point| {
            calls += 1;
            (position.x < 10).then_some(Action::RIGHT)
        };
        assert_eq!(Player::forward(&mut player, None, Point::new(0, 0)), Some(Action::RIGHT));
        assert_eq!(Player::forward(&mut player, None, Point::new(10, 0)), None);
        assert_eq!(calls, 2);
    }
}
