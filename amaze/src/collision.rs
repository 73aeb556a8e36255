// collision.rs - Agent-vs-wall collision and goal capture tests in mask space
use image::GrayImage;

use crate::raster::segment_distance;
use crate::types::{Action, Point, PATH};

/// Half-width of the agent when testing against walls.
pub const PLAYER_RADIUS: i32 = 6;
/// Narrowest passage, in pixels, the agent fits through.
pub const AGENT_WIDTH: u32 = 2 * PLAYER_RADIUS as u32 + 1;
/// Distance below which the agent has reached the goal.
pub const CAPTURE_RADIUS: f64 = 10.0;

/// Whether `position` keeps the agent's radius clear of the mask borders.
pub fn within_bounds(position: Point, mask: &GrayImage) -> bool {
    let (width, height) = mask.dimensions();
    let (width, height) = (width as i64, height as i64);
    let (x, y) = (i64::from(position.x), i64::from(position.y));
    let r = i64::from(PLAYER_RADIUS);
    x >= r && y >= r && x + r < width && y + r < height
}

/// Tests the straight move from `position` by `action` against the mask.
///
/// The move is swept as a round-capped segment of width `2 * PLAYER_RADIUS`; any
/// wall pixel under it is a collision. Leaving the mask (or getting closer than the
/// radius to its border) is a collision too. Standing still never collides.
pub fn check_collision(position: Point, action: Action, mask: &GrayImage) -> bool {
    let next = position + action;
    if !within_bounds(next, mask) {
        return true;
    }
    if action.is_zero() {
        return false;
    }

    let r = PLAYER_RADIUS;
    let (width, height) = mask.dimensions();
    // Current position may sit near the border on the first step; clip the window
    let x0 = (position.x.min(next.x) - r).max(0) as u32;
    let y0 = (position.y.min(next.y) - r).max(0) as u32;
    let x1 = ((position.x.max(next.x) + r) as u32).min(width - 1);
    let y1 = ((position.y.max(next.y) + r) as u32).min(height - 1);

    let a = (f64::from(position.x), f64::from(position.y));
    let b = (f64::from(next.x), f64::from(next.y));
    let radius = f64::from(r);

    (y0..=y1).any(|y| {
        (x0..=x1).any(|x| {
            mask.get_pixel(x, y)[0] != PATH
                && segment_distance((f64::from(x), f64::from(y)), a, b).0 <= radius
        })
    })
}

/// Whether the agent is inside the capture radius of the goal.
pub fn check_finished(position: Point, goal: Point) -> bool {
    position.distance(goal) < CAPTURE_RADIUS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WALL;
    use image::Luma;
    use proptest::prelude::*;

    fn open_mask(w: u32, h: u32) -> GrayImage {
        GrayImage::new(w, h)
    }

    #[test]
    fn test_border_is_a_wall() {
        let mask = open_mask(100, 100);
        assert!(!check_collision(Point::new(50, 50), Action::new(5, 5), &mask));
        assert!(check_collision(Point::new(10, 50), Action::new(-5, 0), &mask));
        assert!(!check_collision(Point::new(11, 50), Action::new(-5, 0), &mask));
        // x + radius must stay strictly inside the width
        assert!(check_collision(Point::new(90, 50), Action::new(4, 0), &mask));
        assert!(!check_collision(Point::new(90, 50), Action::new(3, 0), &mask));
    }

    #[test]
    fn test_sweep_hits_wall_between_endpoints() {
        let mut mask = open_mask(100, 100);
        // A single wall pixel right on the path
        mask.put_pixel(52, 40, Luma([WALL]));
        assert!(check_collision(Point::new(50, 40), Action::new(5, 0), &mask));
        // Same wall, moving away from it along y
        assert!(check_collision(Point::new(50, 45), Action::new(0, 5), &mask));
        assert!(!check_collision(Point::new(50, 47), Action::new(0, 5), &mask));
    }

    #[test]
    fn test_sweep_follows_anti_diagonal() {
        let mut mask = open_mask(100, 100);
        // Wall in the top-left corner of the move's bounding box, far from an up-right move
        mask.put_pixel(44, 39, Luma([WALL]));
        assert!(!check_collision(Point::new(50, 50), Action::new(5, -5), &mask));
        // Just past the end of a down-right move
        mask.put_pixel(57, 57, Luma([WALL]));
        assert!(check_collision(Point::new(50, 50), Action::new(5, 5), &mask));
    }

    #[test]
    fn test_capture_radius_is_strict() {
        let goal = Point::new(50, 50);
        assert!(check_finished(Point::new(50, 41), goal));
        assert!(!check_finished(Point::new(50, 40), goal));
        assert!(check_finished(goal, goal));
    }

    proptest! {
        #[test]
        fn prop_standing_still_never_collides(
            x in 6i32..94,
            y in 6i32..94,
            walls in proptest::collection::vec((0u32..100, 0u32..100), 0..400),
        ) {
            let mut mask = open_mask(100, 100);
            for (wx, wy) in walls {
                mask.put_pixel(wx, wy, Luma([WALL]));
            }
            prop_assert!(!check_collision(Point::new(x, y), Action::ZERO, &mask));
        }
    }
}
