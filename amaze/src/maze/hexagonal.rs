// maze/hexagonal.rs - Hexagonal (offset lattice) maze drawn as thick passages between cell centers
use std::time::Instant;

use image::{GrayImage, Luma};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::graph::{Graph, NodeId, PathMap};
use crate::collision::AGENT_WIDTH;
use crate::error_handling::{MazeError, Result};
use crate::raster::{self, LineCap};
use crate::types::{MazeOutput, Point};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HexagonalArgs {
    pub size: [u32; 2],
    pub num_cells: u32,
    pub seed: u64,
}

impl Default for HexagonalArgs {
    fn default() -> Self {
        Self {
            size: [1024, 1024],
            num_cells: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HexagonalMaze {
    args: HexagonalArgs,
    cell_size: u32,
    path_size: u32,
}

impl HexagonalMaze {
    pub fn new(args: HexagonalArgs) -> Result<Self> {
        let n = args.num_cells;
        if n < 2 {
            return Err(MazeError::config(format!(
                "hexagonal maze needs at least 2 cells per side, got {n}"
            )));
        }
        let cell_size = args.size[0] / n;
        let path_size = cell_size * 2 / 5;
        if path_size < AGENT_WIDTH {
            return Err(MazeError::config(format!(
                "{n} hexagonal cells on {} px leave {path_size} px passages, need {AGENT_WIDTH}",
                args.size[0]
            )));
        }
        let maze = Self { args, cell_size, path_size };

        // The lowest passage belongs to the bottom cell of an odd column
        let half = f64::from(path_size) / 2.0;
        let far = maze.center(n - 1, n - 1);
        let low = maze.center(1, n - 1);
        let [width, height] = maze.args.size;
        if f64::from(far.x) + half >= f64::from(width)
            || f64::from(low.y) + half >= f64::from(height)
        {
            return Err(MazeError::config(format!(
                "hexagonal lattice of {n}x{n} cells overflows the {width}x{height} canvas"
            )));
        }
        Ok(maze)
    }

    pub fn args(&self) -> &HexagonalArgs {
        &self.args
    }

    /// Cell edge length and passage width in pixels.
    pub fn render_sizes(&self) -> (u32, u32) {
        (self.cell_size, self.path_size)
    }

    fn node_id(&self, x: u32, y: u32) -> NodeId {
        (y * self.args.num_cells + x) as NodeId
    }

    fn coords(&self, id: NodeId) -> (u32, u32) {
        let n = self.args.num_cells as usize;
        ((id % n) as u32, (id / n) as u32)
    }

    /// Pixel center of a cell. Odd columns sit a third of a cell lower.
    pub fn center(&self, x: u32, y: u32) -> Point {
        let shift = if x % 2 == 1 { 1.0 / 3.0 } else { 0.0 };
        let cell = f64::from(self.cell_size);
        let path = f64::from(self.path_size);
        Point::new(
            (f64::from(x) * cell + path) as i32,
            ((f64::from(y) + shift) * cell + path) as i32,
        )
    }

    /// Up to six neighbors, depending on column parity.
    pub fn graph(&self) -> Graph {
        let n = self.args.num_cells;
        let mut graph = Graph::with_nodes((n * n) as usize);
        for y in 0..n {
            for x in 0..n {
                let id = self.node_id(x, y);
                let mut link = |nx: u32, ny: u32| graph.join(id, self.node_id(nx, ny));
                if y > 0 {
                    link(x, y - 1);
                }
                if y + 1 < n {
                    link(x, y + 1);
                }
                if x % 2 == 1 {
                    link(x - 1, y);
                    if y + 1 < n {
                        link(x - 1, y + 1);
                    }
                    if x + 1 < n {
                        link(x + 1, y);
                        if y + 1 < n {
                            link(x + 1, y + 1);
                        }
                    }
                } else {
                    if x > 0 {
                        link(x - 1, y);
                        if y > 0 {
                            link(x - 1, y - 1);
                        }
                    }
                    if x + 1 < n {
                        link(x + 1, y);
                        if y > 0 {
                            link(x + 1, y - 1);
                        }
                    }
                }
            }
        }
        graph
    }

    /// Generation stage: carve a spanning tree over the lattice.
    pub fn carve(&self, rng: &mut StdRng) -> (Graph, PathMap) {
        let mut graph = self.graph();
        let paths = graph.carve(0, rng);
        (graph, paths)
    }

    /// Rasterization stage: white passages on black.
    fn rasterize(&self, paths: &PathMap) -> GrayImage {
        let [width, height] = self.args.size;
        let mut img = GrayImage::new(width, height);
        let to_vec = |p: Point| (f64::from(p.x), f64::from(p.y));
        for &(from, to) in paths.edges() {
            let (ax, ay) = self.coords(from);
            let (bx, by) = self.coords(to);
            raster::draw_line(
                &mut img,
                to_vec(self.center(ax, ay)),
                to_vec(self.center(bx, by)),
                f64::from(self.path_size),
                LineCap::Round,
                Luma([255]),
            );
        }
        img
    }

    /// Two distinct cells picked uniformly at random.
    fn start_goal(&self, rng: &mut StdRng) -> (Point, Point) {
        let count = (self.args.num_cells * self.args.num_cells) as NodeId;
        let start = rng.gen_range(0..count);
        let mut goal = rng.gen_range(0..count);
        while goal == start {
            goal = rng.gen_range(0..count);
        }
        let (sx, sy) = self.coords(start);
        let (gx, gy) = self.coords(goal);
        (self.center(sx, sy), self.center(gx, gy))
    }

    pub fn generate(&self) -> MazeOutput {
        let started = Instant::now();
        let mut rng = StdRng::seed_from_u64(self.args.seed);
        let (graph, paths) = self.carve(&mut rng);
        debug_assert!(paths.is_spanning_tree(graph.len()));

        let drawn = self.rasterize(&paths);
        let mask = raster::inverted(&drawn);
        let image = raster::gray_to_rgb(&drawn);
        let (start, goal) = self.start_goal(&mut rng);

        debug!(
            "Generated hexagonal maze {n}x{n} (seed {}) in {:?}",
            self.args.seed,
            started.elapsed(),
            n = self.args.num_cells
        );
        MazeOutput { image, mask, start, goal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::flood_reaches;
    use crate::types::{PATH, WALL};
    use proptest::prelude::*;

    #[test]
    fn test_render_sizes_and_shift() {
        let maze = HexagonalMaze::new(HexagonalArgs::default()).unwrap();
        assert_eq!(maze.render_sizes(), (102, 40));
        assert_eq!(maze.center(0, 0), Point::new(40, 40));
        assert_eq!(maze.center(1, 0), Point::new(142, 74));
    }

    #[test]
    fn test_neighbor_counts() {
        let args = HexagonalArgs { num_cells: 4, ..Default::default() };
        let maze = HexagonalMaze::new(args).unwrap();
        let graph = maze.graph();
        // Even column corner: below, right, upper right is out of range
        assert_eq!(graph.neighbors(maze.node_id(0, 0)).len(), 2);
        // Interior odd column cell has the full six
        assert_eq!(graph.neighbors(maze.node_id(1, 1)).len(), 6);
        // Interior even column cell too
        assert_eq!(graph.neighbors(maze.node_id(2, 1)).len(), 6);
    }

    #[test]
    fn test_same_seed_same_maze() {
        let args = HexagonalArgs { seed: 31337, ..Default::default() };
        let a = HexagonalMaze::new(args.clone()).unwrap().generate();
        let b = HexagonalMaze::new(args).unwrap().generate();
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_invariants() {
        let out = HexagonalMaze::new(HexagonalArgs::default()).unwrap().generate();
        assert_eq!(out.image.dimensions(), out.mask.dimensions());
        assert!(out.mask.pixels().all(|p| p[0] == PATH || p[0] == WALL));
        assert_ne!(out.start, out.goal);
        assert!(out.is_passable(out.start));
        assert!(out.is_passable(out.goal));
        assert!(flood_reaches(&out.mask, out.start, out.goal));
    }

    #[test]
    fn test_invalid_parameters() {
        let with_cells = |num_cells| HexagonalMaze::new(HexagonalArgs {
            num_cells,
            ..Default::default()
        });
        assert!(with_cells(1).is_err());
        assert!(with_cells(600).is_err());
        // 1024 / 31 = 33 px cells keep 13 px passages, 1024 / 32 = 32 px cells only 12
        assert_eq!(with_cells(31).unwrap().render_sizes(), (33, 13));
        assert!(with_cells(32).unwrap_err().is_config());
        let err = HexagonalMaze::new(HexagonalArgs {
            size: [1024, 200],
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.is_config());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_carve_is_spanning_tree(seed in any::<u64>(), num_cells in 2u32..24) {
            let args = HexagonalArgs { num_cells, seed, ..Default::default() };
            let maze = HexagonalMaze::new(args).unwrap();
            let (graph, paths) = maze.carve(&mut StdRng::seed_from_u64(seed));
            prop_assert!(paths.is_spanning_tree(graph.len()));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_accepted_parameters_are_solvable(
            seed in any::<u64>(),
            side in 240u32..=1024,
            num_cells in 2u32..=32,
        ) {
            let maze = HexagonalMaze::new(HexagonalArgs { size: [side, side], num_cells, seed });
            prop_assume!(maze.is_ok());
            let out = maze.unwrap().generate();
            prop_assert!(out.is_passable(out.start));
            prop_assert!(flood_reaches(&out.mask, out.start, out.goal));
        }
    }
}
