// maze/graph.rs - Arena graph shared by all maze topologies and the randomized carve
use rand::seq::SliceRandom;
use rand::Rng;

pub type NodeId = usize;

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub visited: bool,
    neighbors: Vec<NodeId>,
}

/// Undirected graph of maze cells, stored as a flat arena.
///
/// Adjacency describes which cells are geometrically next to each other; it is fixed
/// once the topology is built. Carving never edits it, it only records which of these
/// edges become passages in a [`PathMap`].
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn with_nodes(count: usize) -> Self {
        Self {
            nodes: vec![Node::default(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Connect two nodes. Self loops and repeated edges are ignored.
    pub fn join(&mut self, a: NodeId, b: NodeId) {
        if a == b || self.nodes[a].neighbors.contains(&b) {
            return;
        }
        self.nodes[a].neighbors.push(b);
        self.nodes[b].neighbors.push(a);
    }

    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].neighbors
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Randomized depth-first traversal from `root`.
    ///
    /// Pops the top of the stack, marks it visited and, if it still has unvisited
    /// neighbors, carves towards one picked uniformly at random, pushing the current
    /// node back underneath the chosen one so the walk backtracks once the chosen
    /// branch is exhausted. Nodes without unvisited neighbors are dropped.
    pub fn carve<R: Rng + ?Sized>(&mut self, root: NodeId, rng: &mut R) -> PathMap {
        let mut paths = PathMap::new(self.len());
        let mut stack = vec![root];
        let mut candidates = Vec::with_capacity(8);

        while let Some(current) = stack.pop() {
            self.nodes[current].visited = true;

            candidates.clear();
            candidates.extend(
                self.nodes[current]
                    .neighbors
                    .iter()
                    .copied()
                    .filter(|&n| !self.nodes[n].visited),
            );

            let Some(&next) = candidates.choose(rng) else {
                continue;
            };
            paths.insert(current, next);
            stack.push(current);
            stack.push(next);
        }

        paths
    }
}

/// Carved passages, keyed by the node the passage was carved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMap {
    children: Vec<Vec<NodeId>>,
    edges: Vec<(NodeId, NodeId)>,
}

impl PathMap {
    pub fn new(node_count: usize) -> Self {
        Self {
            children: vec![Vec::new(); node_count],
            edges: Vec::new(),
        }
    }

    pub fn insert(&mut self, from: NodeId, to: NodeId) {
        self.children[from].push(to);
        self.edges.push((from, to));
    }

    /// Nodes a passage was carved to from `id`.
    pub fn carved_from(&self, id: NodeId) -> &[NodeId] {
        &self.children[id]
    }

    /// All carved edges in the order they were opened.
    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    /// Whether the carved edges connect all `node_count` nodes without a cycle.
    pub fn is_spanning_tree(&self, node_count: usize) -> bool {
        if node_count == 0 {
            return self.edges.is_empty();
        }
        if self.edges.len() != node_count - 1 {
            return false;
        }
        let mut sets = DisjointSets::new(node_count);
        self.edges.iter().all(|&(a, b)| sets.union(a, b))
    }
}

/// Union-find over node ids.
struct DisjointSets {
    parent: Vec<NodeId>,
}

impl DisjointSets {
    fn new(count: usize) -> Self {
        Self {
            parent: (0..count).collect(),
        }
    }

    fn find(&mut self, mut id: NodeId) -> NodeId {
        while self.parent[id] != id {
            self.parent[id] = self.parent[self.parent[id]];
            id = self.parent[id];
        }
        id
    }

    /// Returns false if both were already in the same set.
    fn union(&mut self, a: NodeId, b: NodeId) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[ra] = rb;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ring(count: usize) -> Graph {
        let mut graph = Graph::with_nodes(count);
        for i in 0..count {
            graph.join(i, (i + 1) % count);
        }
        graph
    }

    #[test]
    fn test_join_is_symmetric_and_idempotent() {
        let mut graph = Graph::with_nodes(3);
        graph.join(0, 1);
        graph.join(1, 0);
        graph.join(0, 1);
        graph.join(2, 2);

        assert_eq!(graph.neighbors(0), &[1]);
        assert_eq!(graph.neighbors(1), &[0]);
        assert!(graph.neighbors(2).is_empty());
    }

    #[test]
    fn test_carve_visits_every_node_once() {
        let mut graph = ring(12);
        let mut rng = StdRng::seed_from_u64(7);
        let paths = graph.carve(0, &mut rng);

        assert!((0..12).all(|id| graph.node(id).visited));
        assert_eq!(paths.edges().len(), 11);
        assert!(paths.is_spanning_tree(12));
    }

    #[test]
    fn test_carve_is_deterministic() {
        let a = ring(20).carve(0, &mut StdRng::seed_from_u64(99));
        let b = ring(20).carve(0, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_carve_skips_unreachable_nodes() {
        let mut graph = Graph::with_nodes(4);
        graph.join(0, 1);
        graph.join(2, 3);
        let paths = graph.carve(0, &mut StdRng::seed_from_u64(1));

        assert_eq!(paths.edges(), &[(0, 1)]);
        assert!(!graph.node(2).visited);
        assert!(!paths.is_spanning_tree(4));
    }

    #[test]
    fn test_spanning_tree_rejects_cycles() {
        let mut paths = PathMap::new(3);
        paths.insert(0, 1);
        paths.insert(1, 0);
        assert!(!paths.is_spanning_tree(3));

        let mut paths = PathMap::new(3);
        paths.insert(0, 1);
        paths.insert(0, 2);
        assert!(paths.is_spanning_tree(3));
        assert_eq!(paths.carved_from(0), &[1, 2]);
    }
}
