use std::path::Path;

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use palette::{IntoColor, Lab, Srgb};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::color::{chroma, Color};
use crate::pipeline::cluster::{assign_nearest, kmeans};

/// Longest side an image is downscaled to before extraction.
pub const MAX_DIM: u32 = 1200;

/// Minimum number of sampled pixels per requested cluster.
const PIXELS_PER_CLUSTER: usize = 100;

/// A weighted color candidate: one cluster centroid of the image's pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub lab: Lab,
    pub color: Color,
    /// Filtered pixels nearest to this centroid. Always at least 1, since
    /// centroids that no pixel is nearest to are dropped.
    pub count: usize,
    pub chroma: f32,
    /// Prominence: `count * (1 + chroma)`.
    pub score: f32,
}

impl Candidate {
    pub fn from_centroid(lab: Lab, count: usize) -> Self {
        let chroma = chroma(&lab);
        Self {
            lab,
            color: Color::from_lab(lab),
            count,
            chroma,
            score: count as f32 * (1.0 + chroma),
        }
    }

    /// CIELAB lightness in [0, 100].
    pub fn lightness(&self) -> f32 {
        self.lab.l
    }

    pub fn hex(&self) -> String {
        self.color.to_hex()
    }
}

/// Knobs for candidate extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    pub sample_pixels: usize,
    pub k_global: usize,
    pub min_l: f32,
    pub max_l: f32,
    pub min_chroma: f32,
    pub seed: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            sample_pixels: 40_000,
            k_global: 256,
            min_l: 2.0,
            max_l: 98.0,
            min_chroma: 6.0,
            seed: 42,
        }
    }
}

/// Load an image, downscale it to fit within [`MAX_DIM`] (preserving aspect
/// ratio), and convert all pixels to CIELAB space.
pub fn load_and_prepare(path: &Path) -> Result<Vec<Lab>> {
    let img = image::open(path).with_context(|| {
        if !path.exists() {
            format!("file not found: {}", path.display())
        } else {
            format!(
                "unsupported or corrupt image: {}. Supported formats: PNG, JPEG, WebP, BMP, TIFF, GIF",
                path.display()
            )
        }
    })?;
    Ok(prepare_image(img))
}

/// Downscale an already decoded image and convert it to CIELAB. Alpha is dropped.
pub fn prepare_image(img: DynamicImage) -> Vec<Lab> {
    let img = if img.width() > MAX_DIM || img.height() > MAX_DIM {
        img.resize(MAX_DIM, MAX_DIM, FilterType::Triangle)
    } else {
        img
    };
    let rgb_img = img.to_rgb8();

    rgb_img
        .pixels()
        .map(|p| {
            let srgb: Srgb<f32> = Srgb::new(p[0], p[1], p[2]).into_format();
            srgb.into_color()
        })
        .collect()
}

/// Cluster image pixels into weighted color candidates, sorted by score
/// (descending).
///
/// Pixels outside the lightness band or below the chroma floor are ignored,
/// unless that would leave nothing. Clustering runs on a seeded subsample,
/// but prominence counts come from every filtered pixel. Centroids that end
/// up with no pixels are dropped.
pub fn extract_candidates(pixels: &[Lab], config: &ExtractConfig) -> Result<Vec<Candidate>> {
    let mut filtered: Vec<Lab> = pixels
        .iter()
        .filter(|p| p.l >= config.min_l && p.l <= config.max_l && chroma(p) >= config.min_chroma)
        .copied()
        .collect();
    if filtered.is_empty() {
        debug!("pixel filter removed every pixel, falling back to the full image");
        filtered = pixels.to_vec();
    }
    if filtered.is_empty() {
        bail!("no color candidates could be extracted: the image has no pixels");
    }

    let sample = subsample(&filtered, config.sample_pixels, config.seed);
    let k = config
        .k_global
        .min((sample.len() / PIXELS_PER_CLUSTER).max(1));
    debug!(
        pixels = pixels.len(),
        filtered = filtered.len(),
        sampled = sample.len(),
        k,
        "clustering pixels"
    );

    let clustering = kmeans(&sample, k, config.seed);

    let mut counts = vec![0usize; clustering.centroids.len()];
    for idx in assign_nearest(&filtered, &clustering.centroids) {
        counts[idx] += 1;
    }

    let mut candidates: Vec<Candidate> = clustering
        .centroids
        .iter()
        .zip(&counts)
        .filter(|(_, &count)| count > 0)
        .map(|(lab, &count)| Candidate::from_centroid(*lab, count))
        .collect();

    if candidates.is_empty() {
        bail!("no color candidates could be extracted from the image");
    }

    // Stable sort keeps centroid order among equal scores.
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    debug!(
        candidates = candidates.len(),
        top = %candidates[0].hex(),
        "extracted candidates"
    );

    Ok(candidates)
}

/// Seeded sample of at most `max` points, without replacement.
fn subsample(points: &[Lab], max: usize, seed: u64) -> Vec<Lab> {
    if points.len() <= max {
        return points.to_vec();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    rand::seq::index::sample(&mut rng, points.len(), max)
        .iter()
        .map(|i| points[i])
        .collect()
}
