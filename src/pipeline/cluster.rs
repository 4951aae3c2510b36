use std::collections::HashSet;

use kmeans_colors::get_kmeans_hamerly;
use palette::Lab;

use crate::color::delta_e_sq;

/// `kmeans_colors` stores cluster indices as `u8`.
pub const MAX_CLUSTERS: usize = 256;

const MAX_ITER: usize = 30;
const CONVERGE: f32 = 1.0;
const RESTARTS: u64 = 8;

/// Result of clustering a set of Lab points.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub centroids: Vec<Lab>,
    /// Nearest-centroid index for each input point, in input order.
    pub labels: Vec<usize>,
}

/// Seeded K-means over Lab points.
///
/// Runs Hamerly's algorithm with K-means++ initialization [`RESTARTS`] times
/// (seeds `seed`, `seed + 1`, ...) and keeps the lowest-scoring run. When the
/// input has no more distinct values than `k`, those values are the centroids.
/// Returns an empty clustering for an empty input.
pub fn kmeans(points: &[Lab], k: usize, seed: u64) -> Clustering {
    if points.is_empty() {
        return Clustering {
            centroids: Vec::new(),
            labels: Vec::new(),
        };
    }
    let k = k.clamp(1, MAX_CLUSTERS);

    let centroids = match distinct_up_to(points, k) {
        Some(distinct) => distinct,
        None => (0..RESTARTS)
            .map(|run| {
                get_kmeans_hamerly(k, MAX_ITER, CONVERGE, false, points, seed.wrapping_add(run))
            })
            .min_by(|a, b| a.score.total_cmp(&b.score))
            .map(|best| best.centroids)
            .unwrap_or_default(),
    };

    let labels = assign_nearest(points, &centroids);
    Clustering { centroids, labels }
}

/// Index of the closest centroid for every point. Ties go to the lower index.
pub fn assign_nearest(points: &[Lab], centroids: &[Lab]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let mut best = 0;
            let mut best_dist = f32::INFINITY;
            for (i, c) in centroids.iter().enumerate() {
                let d = delta_e_sq(p, c);
                if d < best_dist {
                    best_dist = d;
                    best = i;
                }
            }
            best
        })
        .collect()
}

/// The distinct points in first-seen order, or `None` once more than `limit`
/// distinct values have been seen.
fn distinct_up_to(points: &[Lab], limit: usize) -> Option<Vec<Lab>> {
    let mut seen = HashSet::new();
    let mut distinct = Vec::new();
    for p in points {
        if seen.insert([p.l.to_bits(), p.a.to_bits(), p.b.to_bits()]) {
            if distinct.len() == limit {
                return None;
            }
            distinct.push(*p);
        }
    }
    Some(distinct)
}
