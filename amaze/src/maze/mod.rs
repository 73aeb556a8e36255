// maze/mod.rs - Maze generators and the scene interface the engine plays on

pub mod circular;
pub mod graph;
pub mod hexagonal;
pub mod square;

pub use circular::{CircularArgs, CircularMaze};
pub use graph::{Graph, NodeId, PathMap};
pub use hexagonal::{HexagonalArgs, HexagonalMaze};
pub use square::{SquareArgs, SquareMaze};

use crate::error_handling::Result;
use crate::level::MazeConfig;
use crate::types::MazeOutput;

/// Anything the engine can play on: built once, then read-only.
pub trait Scene {
    /// Build the level and cache the result. Called once per game.
    fn generate(&mut self) -> &MazeOutput;

    /// Cached background and mask, `None` before [`Scene::generate`].
    fn update(&self) -> Option<&MazeOutput>;
}

/// One generator per maze topology.
#[derive(Debug, Clone)]
pub enum Generator {
    Square(SquareMaze),
    Hexagonal(HexagonalMaze),
    Circular(CircularMaze),
}

impl Generator {
    /// Validates the parameters; invalid ones are configuration errors.
    pub fn from_config(config: &MazeConfig) -> Result<Self> {
        Ok(match config {
            MazeConfig::SquareMaze(args) => Generator::Square(SquareMaze::new(args.clone())?),
            MazeConfig::HexagonalMaze(args) => {
                Generator::Hexagonal(HexagonalMaze::new(args.clone())?)
            }
            MazeConfig::CircularMaze(args) => Generator::Circular(CircularMaze::new(args.clone())?),
        })
    }

    pub fn generate(&self) -> MazeOutput {
        match self {
            Generator::Square(maze) => maze.generate(),
            Generator::Hexagonal(maze) => maze.generate(),
            Generator::Circular(maze) => maze.generate(),
        }
    }

    /// Carve stage only; true when the carved passages form a spanning tree.
    pub fn carves_spanning_tree(&self, seed: u64) -> bool {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(seed);
        let (graph, paths) = match self {
            Generator::Square(maze) => maze.carve(&mut rng),
            Generator::Hexagonal(maze) => maze.carve(&mut rng),
            Generator::Circular(maze) => maze.carve(&mut rng),
        };
        paths.is_spanning_tree(graph.len())
    }
}

/// A generator plus its cached output.
#[derive(Debug, Clone)]
pub struct Maze {
    generator: Generator,
    output: Option<MazeOutput>,
}

impl Maze {
    pub fn new(generator: Generator) -> Self {
        Self { generator, output: None }
    }

    pub fn from_config(config: &MazeConfig) -> Result<Self> {
        Ok(Self::new(Generator::from_config(config)?))
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }
}

impl Scene for Maze {
    fn generate(&mut self) -> &MazeOutput {
        let generator = &self.generator;
        self.output.get_or_insert_with(|| generator.generate())
    }

    fn update(&self) -> Option<&MazeOutput> {
        self.output.as_ref()
    }
}

/// Scene over a prebuilt output, e.g. a hand made arena.
#[derive(Debug, Clone)]
pub struct StaticScene {
    output: MazeOutput,
    generated: bool,
}

impl StaticScene {
    pub fn new(output: MazeOutput) -> Self {
        Self { output, generated: false }
    }
}

impl Scene for StaticScene {
    fn generate(&mut self) -> &MazeOutput {
        self.generated = true;
        &self.output
    }

    fn update(&self) -> Option<&MazeOutput> {
        self.generated.then_some(&self.output)
    }
}

/// 4-connected flood fill over passable mask pixels.
#[cfg(test)]
pub(crate) fn flood_reaches(
    mask: &image::GrayImage,
    from: crate::types::Point,
    to: crate::types::Point,
) -> bool {
    use crate::types::PATH;

    let (w, h) = mask.dimensions();
    let index = |x: u32, y: u32| (y * w + x) as usize;
    let passable = |x: u32, y: u32| mask.get_pixel(x, y)[0] == PATH;
    let (fx, fy) = (from.x as u32, from.y as u32);
    let (tx, ty) = (to.x as u32, to.y as u32);
    if !passable(fx, fy) || !passable(tx, ty) {
        return false;
    }

    let mut seen = vec![false; (w * h) as usize];
    let mut stack = vec![(fx, fy)];
    seen[index(fx, fy)] = true;
    while let Some((x, y)) = stack.pop() {
        if (x, y) == (tx, ty) {
            return true;
        }
        let around = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in around {
            if nx < w && ny < h && !seen[index(nx, ny)] && passable(nx, ny) {
                seen[index(nx, ny)] = true;
                stack.push((nx, ny));
            }
        }
    }
    false
}
