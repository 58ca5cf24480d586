//! Connected components

use crate::graph::CompressedGraph;

/// Union-Find data structure for connected component analysis
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<u32>,

    /// Size of each set, valid at roots (for union by size)
    size: Vec<u32>,
}

impl DisjointSets {
    /// Create a new DisjointSets data structure
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size as u32).collect(),
            size: vec![1; size],
        }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: u32) -> u32 {
        let px = self.parent[x as usize];
        if px != x {
            self.parent[x as usize] = self.find(px);
        }
        self.parent[x as usize]
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        // Attach the smaller tree under the root of the larger one
        let (big, small) = if self.size[root_x as usize] >= self.size[root_y as usize] {
            (root_x, root_y)
        } else {
            (root_y, root_x)
        };
        self.parent[small as usize] = big;
        self.size[big as usize] += self.size[small as usize];
    }

    /// Get the size of the set containing x
    pub fn size(&mut self, x: u32) -> u32 {
        let root = self.find(x);
        self.size[root as usize]
    }
}

/// Connected components, largest first.
///
/// Members are ascending; components of equal size are ordered by their
/// smallest member. Isolated nodes form components of their own.
pub fn connected_components(graph: &CompressedGraph) -> Vec<Vec<u32>> {
    let mut sets = DisjointSets::new(graph.node_count);

    for node in 0..graph.node_count {
        for &neighbor in graph.neighbors(node) {
            if (neighbor as usize) > node {
                sets.union(node as u32, neighbor);
            }
        }
    }

    // Roots are visited in node order, so each component's members come out ascending
    let mut by_root: Vec<Vec<u32>> = vec![Vec::new(); graph.node_count];
    for node in 0..graph.node_count as u32 {
        let root = sets.find(node);
        by_root[root as usize].push(node);
    }

    let mut components: Vec<Vec<u32>> = by_root.into_iter().filter(|c| !c.is_empty()).collect();
    components.sort_by(|a, b| b.len().cmp(&a.len()).then(a[0].cmp(&b[0])));
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use petgraph::graph::{NodeIndex, UnGraph};

    fn compressed(nodes: usize, edges: &[(u32, u32)]) -> CompressedGraph {
        let mut graph = UnGraph::new_undirected();
        for i in 0..nodes {
            graph.add_node(Node::user(i.to_string()));
        }
        for &(a, b) in edges {
            graph.add_edge(NodeIndex::new(a as usize), NodeIndex::new(b as usize), 1.0);
        }
        CompressedGraph::from_graph(&graph)
    }

    #[test]
    fn union_find() {
        let mut sets = DisjointSets::new(4);
        sets.union(0, 1);
        sets.union(2, 3);
        sets.union(1, 3);

        assert_eq!(sets.find(0), sets.find(2));
        assert_eq!(sets.size(3), 4);
    }

    #[test]
    fn components_largest_first() {
        let graph = compressed(6, &[(4, 5), (0, 1), (1, 2)]);

        assert_eq!(
            connected_components(&graph),
            vec![vec![0, 1, 2], vec![4, 5], vec![3]]
        );
    }

    #[test]
    fn equal_sizes_ordered_by_smallest_member() {
        let graph = compressed(4, &[(2, 3), (0, 1)]);

        assert_eq!(connected_components(&graph), vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn empty_graph_has_no_components() {
        assert!(connected_components(&compressed(0, &[])).is_empty());
    }
}
