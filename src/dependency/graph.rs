use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// A directed graph of `from depends on to` edges, generic over the vertex
/// type so both formula cells (`CellRef`) and any future consumer can reuse
/// it. Backed by `petgraph` storage, but every traversal below is hand-rolled
/// and iterative: the cyclic-marking semantics required by the recompute
/// transaction (annotate cells in a cycle, keep recomputing everything else)
/// aren't something `petgraph::algo::toposort`/`kosaraju_scc` give you, since
/// those either fail outright on a cycle or only report SCCs with no way to
/// continue processing the acyclic remainder in one pass.
#[derive(Debug, Clone)]
pub struct DependencyGraph<V: Eq + Hash + Clone> {
    graph: DiGraph<V, ()>,
    node_map: HashMap<V, NodeIndex>,
    /// Reverse adjacency (`target -> sources`), maintained alongside every
    /// edge mutation so dependent-lookups never have to scan every vertex.
    transpose: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl<V: Eq + Hash + Clone> DependencyGraph<V> {
    pub fn new() -> Self {
        DependencyGraph {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            transpose: HashMap::new(),
        }
    }

    fn rebuild_transpose(&mut self) {
        self.transpose.clear();
        for e in self.graph.edge_references() {
            self.transpose.entry(e.target()).or_default().push(e.source());
        }
    }

    fn get_or_create_node(&mut self, v: V) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&v) {
            idx
        } else {
            let idx = self.graph.add_node(v.clone());
            self.node_map.insert(v, idx);
            idx
        }
    }

    fn ensure_node(&mut self, v: &V) -> NodeIndex {
        self.get_or_create_node(v.clone())
    }

    /// Record that `from` depends on `to`. Both vertices are created if absent.
    pub fn add_dependency(&mut self, from: V, to: V) {
        let from_idx = self.get_or_create_node(from);
        let to_idx = self.get_or_create_node(to);
        self.graph.add_edge(from_idx, to_idx, ());
        self.transpose.entry(to_idx).or_default().push(from_idx);
    }

    /// Ensure `v` has a node even with no edges yet (a cell with no formula
    /// still participates in the graph so dependents can find it removed).
    pub fn add_vertex(&mut self, v: V) {
        self.get_or_create_node(v);
    }

    /// Drop every outgoing edge from `from` (its formula changed or was cleared).
    pub fn remove_outgoing(&mut self, from: &V) {
        if let Some(&idx) = self.node_map.get(from) {
            let edges: Vec<_> = self.graph.edges(idx).map(|e| (e.id(), e.target())).collect();
            for (edge, target) in edges {
                self.graph.remove_edge(edge);
                if let Some(sources) = self.transpose.get_mut(&target) {
                    sources.retain(|&s| s != idx);
                }
            }
        }
    }

    /// Remove a vertex and every edge touching it.
    pub fn remove_vertex(&mut self, v: &V) {
        if let Some(idx) = self.node_map.remove(v) {
            self.graph.remove_node(idx);
            // petgraph swaps the last node into the removed slot, which
            // invalidates every other node's index; re-sync both maps.
            self.node_map.clear();
            for idx in self.graph.node_indices() {
                self.node_map.insert(self.graph[idx].clone(), idx);
            }
            self.rebuild_transpose();
        }
    }

    pub fn contains(&self, v: &V) -> bool {
        self.node_map.contains_key(v)
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Vertices this vertex directly depends on.
    pub fn dependencies_of(&self, v: &V) -> Vec<V> {
        match self.node_map.get(v) {
            Some(&idx) => self
                .graph
                .edges(idx)
                .map(|e| self.graph[e.target()].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Vertices that directly depend on this vertex.
    pub fn dependents_of(&self, v: &V) -> Vec<V> {
        match self.node_map.get(v) {
            Some(idx) => self
                .transpose
                .get(idx)
                .map(|sources| sources.iter().map(|&n| self.graph[n].clone()).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Iterative post-order DFS over the whole graph, visiting every vertex
    /// exactly once regardless of component. Explicit `(node, next_edge)`
    /// frames rather than recursion, so dependency chains thousands deep
    /// don't blow the call stack.
    fn post_order(&self) -> Vec<NodeIndex> {
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.graph.node_count());
        for start in self.graph.node_indices() {
            if visited.contains(&start) {
                continue;
            }
            let mut stack: Vec<(NodeIndex, usize)> = vec![(start, 0)];
            visited.insert(start);
            while let Some(&mut (node, ref mut next)) = stack.last_mut() {
                let neighbors: Vec<NodeIndex> = self.graph.edges(node).map(|e| e.target()).collect();
                if *next < neighbors.len() {
                    let n = neighbors[*next];
                    *next += 1;
                    if visited.insert(n) {
                        stack.push((n, 0));
                    }
                } else {
                    order.push(node);
                    stack.pop();
                }
            }
        }
        order
    }

    /// Kosaraju SCC: post-order on the graph, then DFS on the transpose in
    /// reverse post-order. Returns one `Vec<V>` per strongly connected
    /// component; a singleton with a self-loop counts as cyclic, a singleton
    /// without one does not.
    pub fn strongly_connected_components(&self) -> Vec<Vec<V>> {
        let order = self.post_order();

        let mut visited = HashSet::new();
        let mut components = Vec::new();
        for &root in order.iter().rev() {
            if visited.contains(&root) {
                continue;
            }
            let mut component = Vec::new();
            let mut stack = vec![root];
            visited.insert(root);
            while let Some(node) = stack.pop() {
                component.push(node);
                if let Some(preds) = self.transpose.get(&node) {
                    for &p in preds {
                        if visited.insert(p) {
                            stack.push(p);
                        }
                    }
                }
            }
            components.push(component.into_iter().map(|idx| self.graph[idx].clone()).collect());
        }
        components
    }

    /// Vertices that belong to a non-trivial cycle: either a component of
    /// size > 1, or a singleton with a self-loop.
    pub fn cyclic_vertices(&self) -> HashSet<V> {
        let mut cyclic = HashSet::new();
        for component in self.strongly_connected_components() {
            if component.len() > 1 {
                cyclic.extend(component);
            } else if let [v] = component.as_slice() {
                if let Some(&idx) = self.node_map.get(v) {
                    if self.graph.edges(idx).any(|e| e.target() == idx) {
                        cyclic.insert(v.clone());
                    }
                }
            }
        }
        cyclic
    }

    /// Topological order (dependencies before dependents): visits a vertex
    /// only after all vertices it depends on. Returns `None` if the graph
    /// (restricted to the non-cyclic subgraph the caller passes in) still
    /// has a cycle — callers are expected to call this only on a subgraph
    /// already filtered via [`Self::subgraph`] to exclude cyclic vertices.
    pub fn topological_order(&self) -> Option<Vec<V>> {
        let mut in_progress = HashSet::new();
        let mut done = HashSet::new();
        let mut order = Vec::with_capacity(self.graph.node_count());

        for start in self.graph.node_indices() {
            if done.contains(&start) {
                continue;
            }
            let mut stack: Vec<(NodeIndex, usize)> = vec![(start, 0)];
            in_progress.insert(start);
            while let Some(&mut (node, ref mut next)) = stack.last_mut() {
                let neighbors: Vec<NodeIndex> = self.graph.edges(node).map(|e| e.target()).collect();
                if *next < neighbors.len() {
                    let n = neighbors[*next];
                    *next += 1;
                    if done.contains(&n) {
                        continue;
                    }
                    if in_progress.contains(&n) {
                        return None;
                    }
                    in_progress.insert(n);
                    stack.push((n, 0));
                } else {
                    stack.pop();
                    in_progress.remove(&node);
                    done.insert(node);
                    order.push(node);
                }
            }
        }
        // `order` lists dependencies after their dependents (post-order);
        // recompute must happen dependencies-first, so reverse it.
        order.reverse();
        Some(order.into_iter().map(|idx| self.graph[idx].clone()).collect())
    }

    /// Multi-source iterative DFS over dependents: every vertex reachable
    /// from `seeds` by following edges in reverse (i.e. everything that
    /// transitively depends on a seed), seeds included.
    pub fn reachable_dependents(&self, seeds: &HashSet<V>) -> HashSet<V> {
        let mut reachable: HashSet<NodeIndex> = HashSet::new();
        let mut stack: Vec<NodeIndex> = Vec::new();
        for seed in seeds {
            if let Some(&idx) = self.node_map.get(seed) {
                if reachable.insert(idx) {
                    stack.push(idx);
                }
            }
        }
        while let Some(node) = stack.pop() {
            if let Some(preds) = self.transpose.get(&node) {
                for &p in preds {
                    if reachable.insert(p) {
                        stack.push(p);
                    }
                }
            }
        }
        reachable.into_iter().map(|idx| self.graph[idx].clone()).collect()
    }

    /// Restrict to a vertex subset, dropping edges with either endpoint
    /// outside the set. Used to carve out the acyclic subgraph for
    /// [`Self::topological_order`].
    pub fn subgraph(&self, keep: &HashSet<V>) -> DependencyGraph<V> {
        let mut out = DependencyGraph::new();
        for v in keep {
            out.ensure_node(v);
        }
        for e in self.graph.edge_references() {
            let from = &self.graph[e.source()];
            let to = &self.graph[e.target()];
            if keep.contains(from) && keep.contains(to) {
                out.add_dependency(from.clone(), to.clone());
            }
        }
        out
    }

    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.node_map.keys()
    }
}

impl<V: Eq + Hash + Clone> Default for DependencyGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}
