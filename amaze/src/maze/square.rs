// maze/square.rs - Rectangular grid maze with block walls, upsampled to pixel space
use std::time::Instant;

use image::{GrayImage, Luma};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::graph::{Graph, NodeId, PathMap};
use crate::error_handling::{MazeError, Result};
use crate::raster;
use crate::types::{MazeOutput, Point, PATH, WALL};

/// Side length in pixels of one wall/cell block.
pub const SCALE: u32 = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SquareArgs {
    pub size: [u32; 2],
    pub seed: u64,
}

impl Default for SquareArgs {
    fn default() -> Self {
        Self {
            size: [1025, 1025],
            seed: 1235,
        }
    }
}

/// Block grid where cells sit on odd coordinates and walls on even ones.
#[derive(Debug, Clone)]
pub struct SquareMaze {
    args: SquareArgs,
    /// Wall grid columns and rows, both odd.
    cols: u32,
    rows: u32,
}

fn largest_odd_at_most(n: u32) -> u32 {
    if n % 2 == 0 {
        n.saturating_sub(1)
    } else {
        n
    }
}

impl SquareMaze {
    pub fn new(args: SquareArgs) -> Result<Self> {
        let [width, height] = args.size;
        let cols = largest_odd_at_most(width / SCALE);
        let rows = largest_odd_at_most(height / SCALE);
        if cols < 3 || rows < 3 {
            return Err(MazeError::config(format!(
                "square maze of {width}x{height} px is too small, need at least {} px per side",
                3 * SCALE
            )));
        }
        Ok(Self { args, cols, rows })
    }

    pub fn args(&self) -> &SquareArgs {
        &self.args
    }

    /// Cells per row and per column.
    pub fn cell_dims(&self) -> (u32, u32) {
        ((self.cols - 1) / 2, (self.rows - 1) / 2)
    }

    fn node_id(&self, cx: u32, cy: u32) -> NodeId {
        (cy * self.cell_dims().0 + cx) as NodeId
    }

    /// Four-way grid adjacency between cells.
    pub fn graph(&self) -> Graph {
        let (cw, ch) = self.cell_dims();
        let mut graph = Graph::with_nodes((cw * ch) as usize);
        for cy in 0..ch {
            for cx in 0..cw {
                let id = self.node_id(cx, cy);
                if cy > 0 {
                    graph.join(id, self.node_id(cx, cy - 1));
                }
                if cy + 1 < ch {
                    graph.join(id, self.node_id(cx, cy + 1));
                }
                if cx > 0 {
                    graph.join(id, self.node_id(cx - 1, cy));
                }
                if cx + 1 < cw {
                    graph.join(id, self.node_id(cx + 1, cy));
                }
            }
        }
        graph
    }

    /// Generation stage: carve a spanning tree over the cell graph.
    pub fn carve(&self, rng: &mut StdRng) -> (Graph, PathMap) {
        let mut graph = self.graph();
        let paths = graph.carve(0, rng);
        (graph, paths)
    }

    /// Wall grid in row-major order, `true` for wall blocks.
    fn wall_grid(&self, paths: &PathMap) -> Vec<bool> {
        let (cols, rows) = (self.cols as usize, self.rows as usize);
        let cw = self.cell_dims().0 as usize;
        let mut walls = vec![true; cols * rows];
        let block = |id: NodeId| (2 * (id % cw) + 1, 2 * (id / cw) + 1);

        for &(from, to) in paths.edges() {
            let (ax, ay) = block(from);
            let (bx, by) = block(to);
            walls[ay * cols + ax] = false;
            walls[by * cols + bx] = false;
            walls[((ay + by) / 2) * cols + (ax + bx) / 2] = false;
        }
        // A lone cell has no edges but is still open
        walls[cols + 1] = false;

        // Entrance at the top, exit at the bottom
        walls[1] = false;
        walls[(rows - 1) * cols + cols - 2] = false;
        walls
    }

    /// Rasterization stage: upsample the wall grid and pad with wall to the requested size.
    fn rasterize(&self, walls: &[bool]) -> GrayImage {
        let [width, height] = self.args.size;
        let cols = self.cols;
        GrayImage::from_fn(width, height, |x, y| {
            let (gx, gy) = (x / SCALE, y / SCALE);
            let blocked = gx >= cols || gy >= self.rows || walls[(gy * cols + gx) as usize];
            Luma([if blocked { WALL } else { PATH }])
        })
    }

    pub fn start(&self) -> Point {
        let s = SCALE as i32;
        Point::new(s + s / 2, s * 5 / 8)
    }

    /// Top edge of the exit block.
    pub fn goal(&self) -> Point {
        let s = SCALE as i32;
        Point::new((self.cols as i32 - 2) * s + s / 2, (self.rows as i32 - 1) * s)
    }

    pub fn generate(&self) -> MazeOutput {
        let started = Instant::now();
        let mut rng = StdRng::seed_from_u64(self.args.seed);
        let (graph, paths) = self.carve(&mut rng);
        debug_assert!(paths.is_spanning_tree(graph.len()));

        let mask = self.rasterize(&self.wall_grid(&paths));
        let image = raster::gray_to_rgb(&raster::inverted(&mask));

        debug!(
            "Generated square maze {}x{} cells (seed {}) in {:?}",
            self.cell_dims().0,
            self.cell_dims().1,
            self.args.seed,
            started.elapsed()
        );
        MazeOutput {
            image,
            mask,
            start: self.start(),
            goal: self.goal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::flood_reaches;
    use proptest::prelude::*;

    #[test]
    fn test_reference_level_dimensions() {
        let maze = SquareMaze::new(SquareArgs::default()).unwrap();
        let out = maze.generate();

        assert_eq!(out.image.dimensions(), (1025, 1025));
        assert_eq!(out.mask.dimensions(), (1025, 1025));
        assert!(out.mask.pixels().all(|p| p[0] == PATH || p[0] == WALL));
        assert_eq!(maze.cell_dims(), (15, 15));
    }

    #[test]
    fn test_same_seed_same_maze() {
        let args = SquareArgs { size: [640, 480], seed: 77 };
        let a = SquareMaze::new(args.clone()).unwrap().generate();
        let b = SquareMaze::new(args).unwrap().generate();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = SquareMaze::new(SquareArgs { size: [1024, 1024], seed: 1 }).unwrap().generate();
        let b = SquareMaze::new(SquareArgs { size: [1024, 1024], seed: 2 }).unwrap().generate();
        assert_ne!(a.mask, b.mask);
    }

    #[test]
    fn test_start_and_goal_connected() {
        let out = SquareMaze::new(SquareArgs::default()).unwrap().generate();
        assert!(out.is_passable(out.start));
        assert!(out.is_passable(out.goal));
        assert!(flood_reaches(&out.mask, out.start, out.goal));
        // Image is the negative of the mask
        let (x, y) = (out.start.x as u32, out.start.y as u32);
        assert_eq!(out.image.get_pixel(x, y)[0], 255);
        assert_eq!(out.image.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_too_small_is_config_error() {
        let err = SquareMaze::new(SquareArgs { size: [64, 1024], seed: 0 }).unwrap_err();
        assert!(err.is_config());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_carve_is_spanning_tree(seed in any::<u64>(), w in 96u32..1400, h in 96u32..1400) {
            let maze = SquareMaze::new(SquareArgs { size: [w, h], seed }).unwrap();
            let (graph, paths) = maze.carve(&mut StdRng::seed_from_u64(seed));
            prop_assert!(paths.is_spanning_tree(graph.len()));
        }
    }
}
