// maze/circular.rs - Concentric ring maze over a binary tree of sectors
use std::f64::consts::PI;
use std::time::Instant;

use image::{GrayImage, Luma};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::graph::{Graph, NodeId, PathMap};
use crate::collision::AGENT_WIDTH;
use crate::error_handling::{MazeError, Result};
use crate::raster::{self, LineCap, Vec2};
use crate::types::{MazeOutput, Point};

/// Stroke width of ring and radial walls.
pub const WALL_THICKNESS: f64 = 10.0;
/// Rings narrower than this cannot hold a wall plus an opening.
pub const MIN_RING_WIDTH: u32 = 30;
/// Ring count cap; the outermost ring holds 2^levels sectors.
pub const MAX_LEVELS: u32 = 16;

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircularArgs {
    pub size: [u32; 2],
    pub num_levels: u32,
    pub seed: u64,
}

impl Default for CircularArgs {
    fn default() -> Self {
        Self {
            size: [1024, 1024],
            num_levels: 7,
            seed: 42,
        }
    }
}

/// Ring `level` and angular `sector` of a node. Ring i holds 2^i sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    pub level: u32,
    pub sector: u32,
}

impl Sector {
    #[inline]
    pub fn id(self) -> NodeId {
        ((1usize << self.level) - 1) + self.sector as usize
    }

    pub fn from_id(id: NodeId) -> Self {
        let level = usize::BITS - 1 - (id + 1).leading_zeros();
        Self {
            level,
            sector: (id + 1 - (1usize << level)) as u32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircularMaze {
    args: CircularArgs,
    center: Point,
    ring_width: u32,
}

impl CircularMaze {
    pub fn new(args: CircularArgs) -> Result<Self> {
        let levels = args.num_levels;
        if levels == 0 || levels > MAX_LEVELS {
            return Err(MazeError::config(format!(
                "circular maze needs between 1 and {MAX_LEVELS} levels, got {levels}"
            )));
        }
        let [width, height] = args.size;
        let center = Point::new((width / 2) as i32, (height / 2) as i32);
        let ring_width = (width / 2).min(height / 2) / (levels + 1);
        if ring_width < MIN_RING_WIDTH {
            return Err(MazeError::config(format!(
                "{levels} levels leave {ring_width} px rings on a {width}x{height} canvas, \
                 need {MIN_RING_WIDTH}"
            )));
        }

        // Start sits mid-ring on the outermost ring; the agent must fit between its radial walls
        let sectors = f64::from(1u32 << levels);
        let mid_radius = (f64::from(levels) + 0.5) * f64::from(ring_width);
        let clearance = 2.0 * PI * mid_radius / sectors - WALL_THICKNESS;
        if clearance < f64::from(AGENT_WIDTH) {
            return Err(MazeError::config(format!(
                "{levels} levels leave {clearance:.1} px between radial walls of the outer ring \
                 on a {width}x{height} canvas, need {AGENT_WIDTH}"
            )));
        }
        Ok(Self { args, center, ring_width })
    }

    pub fn args(&self) -> &CircularArgs {
        &self.args
    }

    pub fn ring_width(&self) -> u32 {
        self.ring_width
    }

    pub fn node_count(&self) -> usize {
        (1usize << (self.args.num_levels + 1)) - 1
    }

    /// Parent/child links between rings plus cyclic sibling links within a ring.
    pub fn graph(&self) -> Graph {
        let levels = self.args.num_levels;
        let mut graph = Graph::with_nodes(self.node_count());
        for level in 0..levels {
            for sector in 0..(1u32 << level) {
                let parent = Sector { level, sector }.id();
                for child in [2 * sector, 2 * sector + 1] {
                    graph.join(parent, Sector { level: level + 1, sector: child }.id());
                }
            }
        }
        for level in 0..=levels {
            let count = 1u32 << level;
            for sector in 0..count {
                let previous = (sector + count - 1) % count;
                graph.join(
                    Sector { level, sector }.id(),
                    Sector { level, sector: previous }.id(),
                );
            }
        }
        graph
    }

    /// Generation stage: carve a spanning tree starting from the center.
    pub fn carve(&self, rng: &mut StdRng) -> (Graph, PathMap) {
        let mut graph = self.graph();
        let paths = graph.carve(0, rng);
        (graph, paths)
    }

    fn origin(&self) -> Vec2 {
        (f64::from(self.center.x), f64::from(self.center.y))
    }

    /// Point at `radius` along angle `phi`, where 0 points up and angles grow clockwise.
    fn polar(&self, phi: f64, radius: f64) -> Vec2 {
        let (cx, cy) = self.origin();
        (cx + phi.sin() * radius, cy - phi.cos() * radius)
    }

    /// Pixel position in the middle of a sector.
    pub fn sector_center(&self, s: Sector) -> Point {
        let arch = 2.0 * PI / f64::from(1u32 << (s.level + 1));
        let phi = f64::from(s.sector * 2 + 1) * arch;
        let radius = (f64::from(s.level) + 0.5) * f64::from(self.ring_width);
        let offset_x = (phi.sin() * radius) as i32;
        let offset_y = (-phi.cos() * radius) as i32;
        Point::new(self.center.x + offset_x, self.center.y + offset_y)
    }

    /// Every ring boundary and every radial sector boundary, before any opening.
    fn draw_walls(&self, img: &mut GrayImage) {
        let ll = f64::from(self.ring_width);
        for i in 0..=self.args.num_levels {
            raster::draw_circle(img, self.origin(), f64::from(i + 1) * ll, WALL_THICKNESS, BLACK);
            if i == 0 {
                continue;
            }
            let count = 1u32 << i;
            let arch = 2.0 * PI / f64::from(count);
            for s in 0..count {
                let phi = f64::from(s) * arch;
                // Start slightly inside the inner ring wall so the two overlap
                let inner = self.polar(phi, (f64::from(i) - 0.05) * ll);
                let outer = self.polar(phi, f64::from(i + 1) * ll);
                raster::draw_line(img, inner, outer, WALL_THICKNESS, LineCap::Butt, BLACK);
            }
        }
    }

    /// Clears the radial wall between two neighbors on the same ring.
    fn open_radial(&self, img: &mut GrayImage, a: Sector, b: Sector) {
        let boundary = if a.sector.abs_diff(b.sector) != 1 {
            0
        } else {
            a.sector.max(b.sector)
        };
        let ll = f64::from(self.ring_width);
        let phi = f64::from(boundary) * 2.0 * PI / f64::from(1u32 << a.level);
        let inner = self.polar(phi, f64::from(a.level) * ll + 1.0);
        let outer = self.polar(phi, f64::from(a.level + 1) * ll - WALL_THICKNESS);
        raster::draw_line(img, inner, outer, WALL_THICKNESS + 3.0, LineCap::Butt, WHITE);
    }

    /// Clears the ring wall between a sector and its child on the next ring out.
    fn open_arc(&self, img: &mut GrayImage, child: Sector) {
        let ll = f64::from(self.ring_width);
        let level = child.level;
        let count = f64::from(1u32 << level);
        let boundary = f64::from(level) * ll;
        // Keep half a wall of margin from the neighboring radial walls
        let margin = 90.0 * WALL_THICKNESS / (boundary * PI);
        let start = 360.0 * f64::from(child.sector) / count - 90.0 + margin;
        let end = 360.0 * f64::from(child.sector + 1) / count - 90.0 - margin;
        raster::draw_arc(
            img,
            self.origin(),
            boundary + WALL_THICKNESS,
            3.0 * WALL_THICKNESS,
            start,
            end,
            WHITE,
        );
    }

    /// Rasterization stage: black walls on white, carved passages cleared back to white.
    fn rasterize(&self, paths: &PathMap) -> GrayImage {
        let [width, height] = self.args.size;
        let mut img = GrayImage::from_pixel(width, height, WHITE);
        self.draw_walls(&mut img);

        for &(from, to) in paths.edges() {
            let (a, b) = (Sector::from_id(from), Sector::from_id(to));
            if a.level == b.level {
                self.open_radial(&mut img, a, b);
            } else {
                let child = if a.level > b.level { a } else { b };
                self.open_arc(&mut img, child);
            }
        }
        img
    }

    pub fn generate(&self) -> MazeOutput {
        let started = Instant::now();
        let mut rng = StdRng::seed_from_u64(self.args.seed);
        let (graph, paths) = self.carve(&mut rng);
        debug_assert!(paths.is_spanning_tree(graph.len()));

        let drawn = self.rasterize(&paths);
        let mask = raster::inverted(&drawn);
        let image = raster::gray_to_rgb(&drawn);

        let outer = self.args.num_levels;
        let sector = rng.gen_range(0..(1u32 << outer));
        let start = self.sector_center(Sector { level: outer, sector });

        debug!(
            "Generated circular maze with {} levels (seed {}) in {:?}",
            self.args.num_levels,
            self.args.seed,
            started.elapsed()
        );
        MazeOutput {
            image,
            mask,
            start,
            goal: self.center,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::flood_reaches;
    use crate::types::{PATH, WALL};
    use proptest::prelude::*;

    #[test]
    fn test_sector_ids_round_trip() {
        for level in 0..6 {
            for sector in 0..(1u32 << level) {
                let s = Sector { level, sector };
                assert_eq!(Sector::from_id(s.id()), s);
            }
        }
        assert_eq!(Sector { level: 0, sector: 0 }.id(), 0);
        assert_eq!(Sector { level: 2, sector: 0 }.id(), 3);
    }

    #[test]
    fn test_topology() {
        let maze = CircularMaze::new(CircularArgs { num_levels: 3, ..Default::default() }).unwrap();
        let graph = maze.graph();
        assert_eq!(graph.len(), 15);
        // Center links only to its two children
        assert_eq!(graph.neighbors(0).len(), 2);
        // Inner ring: parent, two children, and the one other sector on its ring
        assert_eq!(graph.neighbors(Sector { level: 1, sector: 0 }.id()).len(), 4);
        // Outer ring: parent and two siblings
        let outer = Sector { level: 3, sector: 0 }.id();
        assert_eq!(graph.neighbors(outer).len(), 3);
        assert!(graph.neighbors(outer).contains(&Sector { level: 3, sector: 7 }.id()));
    }

    #[test]
    fn test_same_seed_same_maze() {
        let a = CircularMaze::new(CircularArgs::default()).unwrap().generate();
        let b = CircularMaze::new(CircularArgs::default()).unwrap().generate();
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_invariants() {
        let args = CircularArgs { num_levels: 4, seed: 5, ..Default::default() };
        let maze = CircularMaze::new(args).unwrap();
        let out = maze.generate();
        assert_eq!(out.image.dimensions(), (1024, 1024));
        assert_eq!(out.mask.dimensions(), (1024, 1024));
        assert!(out.mask.pixels().all(|p| p[0] == PATH || p[0] == WALL));
        assert_eq!(out.goal, Point::new(512, 512));
        assert!(out.is_passable(out.start));
        assert!(out.is_passable(out.goal));
        assert!(flood_reaches(&out.mask, out.start, out.goal));
    }

    #[test]
    fn test_start_on_outer_ring() {
        let maze = CircularMaze::new(CircularArgs::default()).unwrap();
        let out = maze.generate();
        let ll = f64::from(maze.ring_width());
        let r = out.start.distance(out.goal);
        assert!(r > 7.0 * ll && r < 8.0 * ll, "start radius {r}");
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(CircularMaze::new(CircularArgs { num_levels: 0, ..Default::default() }).is_err());
        let err = CircularMaze::new(CircularArgs { num_levels: 40, ..Default::default() })
            .unwrap_err();
        assert!(err.is_config());
        // Rings are wide enough up to 16 levels, but from 8 on the outer sectors are too narrow
        assert!(CircularMaze::new(CircularArgs { num_levels: 7, ..Default::default() }).is_ok());
        for num_levels in [8, 9, 16] {
            let err = CircularMaze::new(CircularArgs { num_levels, ..Default::default() })
                .unwrap_err();
            assert!(err.is_config(), "{num_levels} levels");
        }
        // 7 levels need a larger canvas than 800 px
        assert!(CircularMaze::new(CircularArgs {
            size: [800, 800],
            num_levels: 7,
            ..Default::default()
        })
        .is_err());
        assert!(CircularMaze::new(CircularArgs {
            size: [1024, 400],
            num_levels: 7,
            ..Default::default()
        })
        .is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_carve_is_spanning_tree(seed in any::<u64>(), num_levels in 1u32..=7) {
            let args = CircularArgs { num_levels, seed, ..Default::default() };
            let maze = CircularMaze::new(args).unwrap();
            let (graph, paths) = maze.carve(&mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(graph.len(), maze.node_count());
            prop_assert!(paths.is_spanning_tree(graph.len()));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_accepted_parameters_are_solvable(
            seed in any::<u64>(),
            side in 240u32..=1024,
            num_levels in 1u32..=MAX_LEVELS,
        ) {
            let args = CircularArgs { size: [side, side], num_levels, seed };
            let maze = CircularMaze::new(args);
            prop_assume!(maze.is_ok());
            let out = maze.unwrap().generate();
            prop_assert!(out.is_passable(out.start));
            prop_assert!(flood_reaches(&out.mask, out.start, out.goal));
        }
    }
}
