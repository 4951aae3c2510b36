use tracing::debug;

use crate::pipeline::cluster::kmeans;
use crate::pipeline::extract::Candidate;

/// Assign every candidate to one of `num_groups` groups (0-based labels).
///
/// Candidates are clustered by their own Lab centroids so that each group
/// covers a distinct region of color space. With fewer candidates than
/// groups, labels are handed out round-robin by position instead, which
/// leaves the trailing groups empty.
pub fn partition_candidates(candidates: &[Candidate], num_groups: usize, seed: u64) -> Vec<usize> {
    let num_groups = num_groups.max(1);
    if candidates.len() < num_groups {
        debug!(
            candidates = candidates.len(),
            groups = num_groups,
            "fewer candidates than groups, assigning round-robin"
        );
        return (0..candidates.len()).map(|i| i % num_groups).collect();
    }

    let labs: Vec<_> = candidates.iter().map(|c| c.lab).collect();
    kmeans(&labs, num_groups, seed).labels
}
