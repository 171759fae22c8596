//! DBSCAN over a precomputed distance matrix
//!
//! Used by the ML grouping mode: distances are `1 − |corr|`, so strongly
//! correlated columns sit close together. Noise points are simply not
//! returned; the caller applies its own size bounds.

use std::collections::VecDeque;

/// Runs DBSCAN on a symmetric distance matrix
///
/// A point's ε-neighbourhood includes the point itself; a point is a core
/// point when the neighbourhood holds at least `min_pts` members. Returns
/// clusters as index sets, noise excluded.
pub fn dbscan(distances: &[Vec<f64>], eps: f64, min_pts: usize) -> Vec<Vec<usize>> {
    let n = distances.len();
    const UNVISITED: i32 = -2;
    const NOISE: i32 = -1;
    let mut labels = vec![UNVISITED; n];
    let mut cluster_id = 0;

    for point in 0..n {
        if labels[point] != UNVISITED {
            continue;
        }

        let neighbours = region_query(distances, point, eps);
        if neighbours.len() < min_pts {
            labels[point] = NOISE;
            continue;
        }

        labels[point] = cluster_id;
        let mut queue: VecDeque<usize> = neighbours.into_iter().collect();
        while let Some(next) = queue.pop_front() {
            if labels[next] == NOISE {
                labels[next] = cluster_id;
            }
            if labels[next] != UNVISITED {
                continue;
            }
            labels[next] = cluster_id;

            let next_neighbours = region_query(distances, next, eps);
            if next_neighbours.len() >= min_pts {
                queue.extend(next_neighbours);
            }
        }

        cluster_id += 1;
    }

    let mut clusters = vec![Vec::new(); cluster_id as usize];
    for (point, &label) in labels.iter().enumerate() {
        if label >= 0 {
            clusters[label as usize].push(point);
        }
    }
    clusters
}

fn region_query(distances: &[Vec<f64>], point: usize, eps: f64) -> Vec<usize> {
    (0..distances.len())
        .filter(|&other| distances[point][other] <= eps)
        .collect()
}
