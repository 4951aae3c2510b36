pub mod cluster;
pub mod extract;
pub mod partition;
pub mod runner;
pub mod select;

use std::path::Path;

use anyhow::{bail, Result};
use palette::Lab;
use tracing::info;

use crate::theme::ModuleBlock;
use extract::{extract_candidates, load_and_prepare, ExtractConfig};
use partition::partition_candidates;
use runner::run_groups;
use select::SelectConfig;

/// Everything needed to turn an image into module blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateConfig {
    pub num_groups: usize,
    pub workers: usize,
    pub extract: ExtractConfig,
    pub select: SelectConfig,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            num_groups: 4,
            workers: 4,
            extract: ExtractConfig::default(),
            select: SelectConfig::default(),
        }
    }
}

impl GenerateConfig {
    /// Reject settings the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.num_groups == 0 {
            bail!("number of groups must be at least 1");
        }
        if self.workers == 0 {
            bail!("number of workers must be at least 1");
        }
        if !(1..=cluster::MAX_CLUSTERS).contains(&self.extract.k_global) {
            bail!(
                "k_global must be between 1 and {}, got {}",
                cluster::MAX_CLUSTERS,
                self.extract.k_global
            );
        }
        if self.extract.sample_pixels == 0 {
            bail!("sample size must be at least 1");
        }
        if self.extract.min_l > self.extract.max_l {
            bail!(
                "min_L ({}) is greater than max_L ({})",
                self.extract.min_l,
                self.extract.max_l
            );
        }
        if self.select.primary_min_l > self.select.primary_max_l {
            bail!(
                "primary_minL ({}) is greater than primary_maxL ({})",
                self.select.primary_min_l,
                self.select.primary_max_l
            );
        }
        Ok(())
    }
}

/// Run the full pipeline on an image file.
pub fn generate(path: &Path, config: &GenerateConfig) -> Result<Vec<ModuleBlock>> {
    config.validate()?;
    let pixels = load_and_prepare(path)?;
    generate_from_pixels(&pixels, config)
}

/// Run the pipeline on already prepared CIELAB pixels.
pub fn generate_from_pixels(pixels: &[Lab], config: &GenerateConfig) -> Result<Vec<ModuleBlock>> {
    config.validate()?;
    let candidates = extract_candidates(pixels, &config.extract)?;
    info!(
        candidates = candidates.len(),
        groups = config.num_groups,
        "partitioning candidates"
    );

    let labels = partition_candidates(&candidates, config.num_groups, config.extract.seed);
    let palettes = run_groups(
        &candidates,
        &labels,
        config.num_groups,
        config.workers,
        &config.select,
    )?;

    Ok(palettes
        .into_iter()
        .enumerate()
        .map(|(group, palette)| ModuleBlock::new(group + 1, palette))
        .collect())
}
