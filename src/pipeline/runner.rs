use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use tracing::debug;

use crate::pipeline::extract::Candidate;
use crate::pipeline::select::{select_palette, GroupPalette, SelectConfig};

/// Run palette selection for groups `0..num_groups` on a pool of at most
/// `workers` threads.
///
/// Results are gathered by group index, so the returned palettes are in
/// group order regardless of completion order. A panicking selection fails
/// the whole run.
pub fn run_groups(
    candidates: &[Candidate],
    labels: &[usize],
    num_groups: usize,
    workers: usize,
    config: &SelectConfig,
) -> Result<Vec<GroupPalette>> {
    let gathered = gather_groups(num_groups, workers, |group| {
        select_palette(candidates, labels, group, config)
    })?;

    for (group, palette) in &gathered {
        debug!(
            group = group + 1,
            primary = %palette.primary,
            text = %palette.text,
            accents = palette.accents.len(),
            "selected group palette"
        );
    }

    Ok(gathered.into_values().collect())
}

fn gather_groups<F>(
    num_groups: usize,
    workers: usize,
    select: F,
) -> Result<BTreeMap<usize, GroupPalette>>
where
    F: Fn(usize) -> GroupPalette + Sync,
{
    let threads = workers.min(num_groups).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("wbconfgen-group-{i}"))
        .build()
        .context("failed to start palette worker pool")?;

    pool.install(|| {
        (0..num_groups)
            .into_par_iter()
            .map(|group| {
                panic::catch_unwind(AssertUnwindSafe(|| select(group)))
                    .map(|palette| (group, palette))
                    .map_err(|_| anyhow!("palette selection for group {} panicked", group + 1))
            })
            .collect()
    })
}
