//! Correlation graph construction and group extraction
//!
//! Columns are nodes; an undirected edge connects every pair whose
//! correlation meets the threshold. Groups come out of connected components,
//! with oversized components decomposed by weighted-degree seeding and a
//! greedy pair extraction as the last resort inside a component.

use crate::core::stats::CorrelationMatrix;
use crate::domain::ColumnRef;
use std::collections::{HashSet, VecDeque};

/// Undirected correlation graph over a fixed node set
pub struct CorrelationGraph<'a> {
    nodes: &'a [ColumnRef],
    matrix: &'a CorrelationMatrix,
    adjacency: Vec<HashSet<usize>>,
    edge_count: usize,
}

impl<'a> CorrelationGraph<'a> {
    /// Builds the graph, adding an edge for each pair at or above `threshold`
    pub fn build(nodes: &'a [ColumnRef], matrix: &'a CorrelationMatrix, threshold: f64) -> Self {
        let mut adjacency = vec![HashSet::new(); nodes.len()];
        let mut edge_count = 0;
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                if matrix.get(&nodes[i], &nodes[j]) >= threshold {
                    adjacency[i].insert(j);
                    adjacency[j].insert(i);
                    edge_count += 1;
                }
            }
        }
        Self {
            nodes,
            matrix,
            adjacency,
            edge_count,
        }
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Connected components via BFS, as node index sets
    ///
    /// Isolated nodes come back as singleton components; callers filter by
    /// group size.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.nodes.len()];
        let mut components = Vec::new();

        for start in 0..self.nodes.len() {
            if visited[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            visited[start] = true;
            while let Some(node) = queue.pop_front() {
                component.push(node);
                for &next in &self.adjacency[node] {
                    if !visited[next] {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }

        components
    }

    /// Decomposes an oversized component by weighted-degree seeding
    ///
    /// Nodes are seeded in descending order of summed incident correlation;
    /// each ungrouped seed pulls in its strongest-correlated ungrouped
    /// neighbours up to `max_size`. Subgroups under `min_size` are dropped.
    pub fn decompose_by_weighted_degree(
        &self,
        component: &[usize],
        min_size: usize,
        max_size: usize,
    ) -> Vec<Vec<usize>> {
        let mut seeds: Vec<usize> = component.to_vec();
        seeds.sort_by(|&a, &b| {
            self.weighted_degree(b)
                .total_cmp(&self.weighted_degree(a))
        });

        let mut grouped: HashSet<usize> = HashSet::new();
        let mut subgroups = Vec::new();

        for seed in seeds {
            if grouped.contains(&seed) {
                continue;
            }
            let mut group = vec![seed];
            grouped.insert(seed);

            let mut neighbours: Vec<usize> = self.adjacency[seed]
                .iter()
                .copied()
                .filter(|n| !grouped.contains(n))
                .collect();
            neighbours.sort_by(|&a, &b| {
                self.correlation(seed, b).total_cmp(&self.correlation(seed, a))
            });

            for neighbour in neighbours {
                if group.len() >= max_size {
                    break;
                }
                group.push(neighbour);
                grouped.insert(neighbour);
            }

            if group.len() >= min_size {
                group.sort_unstable();
                subgroups.push(group);
            }
        }

        subgroups
    }

    /// Greedy pair extraction inside one component
    ///
    /// Highest-correlation pairs first, no node reused. Each pair may be
    /// expanded to a triplet by an unused node correlated at or above
    /// `threshold` with both existing members.
    pub fn greedy_pairs(&self, component: &[usize], threshold: f64) -> Vec<Vec<usize>> {
        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for (idx, &i) in component.iter().enumerate() {
            for &j in &component[idx + 1..] {
                let corr = self.correlation(i, j);
                if corr >= threshold {
                    pairs.push((i, j, corr));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut used: HashSet<usize> = HashSet::new();
        let mut groups = Vec::new();
        for (i, j, _) in pairs {
            if used.contains(&i) || used.contains(&j) {
                continue;
            }
            used.insert(i);
            used.insert(j);
            let mut group = vec![i, j];

            // Triplet expansion: best unused node tied to both members
            let mut best: Option<(usize, f64)> = None;
            for &k in component {
                if used.contains(&k) {
                    continue;
                }
                let ci = self.correlation(i, k);
                let cj = self.correlation(j, k);
                if ci >= threshold && cj >= threshold {
                    let sum = ci + cj;
                    if best.map_or(true, |(_, s)| sum > s) {
                        best = Some((k, sum));
                    }
                }
            }
            if let Some((k, _)) = best {
                used.insert(k);
                group.push(k);
            }

            group.sort_unstable();
            groups.push(group);
        }

        groups
    }

    /// Global fallback: up to `limit` disjoint pairs from the strongest
    /// correlations at or above `threshold`
    pub fn global_top_pairs(&self, threshold: f64, limit: usize) -> Vec<Vec<usize>> {
        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let corr = self.correlation(i, j);
                if corr >= threshold {
                    pairs.push((i, j, corr));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut used: HashSet<usize> = HashSet::new();
        let mut groups = Vec::new();
        for (i, j, _) in pairs {
            if groups.len() >= limit {
                break;
            }
            if used.contains(&i) || used.contains(&j) {
                continue;
            }
            used.insert(i);
            used.insert(j);
            groups.push(vec![i, j]);
        }

        groups
    }

    fn correlation(&self, i: usize, j: usize) -> f64 {
        self.matrix.get(&self.nodes[i], &self.nodes[j])
    }

    fn weighted_degree(&self, node: usize) -> f64 {
        self.adjacency[node]
            .iter()
            .map(|&n| self.correlation(node, n))
            .sum()
    }
}
