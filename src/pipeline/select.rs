use crate::color::{delta_e, Color};
use crate::pipeline::extract::Candidate;

/// Stand-in for a slot a group has no candidate left to fill.
pub const NULL_SLOT: Color = Color::BLACK;

/// Knobs for per-group palette selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectConfig {
    pub dedupe_delta_e: f32,
    pub accents_dedupe_delta_e: f32,
    pub primary_min_l: f32,
    pub primary_max_l: f32,
    pub text_contrast_threshold: f32,
    pub num_accents: usize,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            dedupe_delta_e: 8.0,
            accents_dedupe_delta_e: 12.0,
            primary_min_l: 6.0,
            primary_max_l: 60.0,
            text_contrast_threshold: 4.5,
            num_accents: 9,
        }
    }
}

/// The colors chosen for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPalette {
    pub primary: Color,
    pub text: Color,
    /// Positional: consumers index accents by slot number.
    pub accents: Vec<Color>,
}

/// Pick primary, text and accent colors for group `group`.
///
/// `labels[i]` is the group of `candidates[i]`. Never fails: every slot has a
/// fallback, down to [`NULL_SLOT`].
pub fn select_palette(
    candidates: &[Candidate],
    labels: &[usize],
    group: usize,
    config: &SelectConfig,
) -> GroupPalette {
    let mut members: Vec<&Candidate> = candidates
        .iter()
        .zip(labels)
        .filter(|(_, &label)| label == group)
        .map(|(c, _)| c)
        .collect();
    members.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut pool = dedupe(&members, config.dedupe_delta_e);
    if pool.is_empty() {
        pool = members.clone();
    }

    let primary = pick_primary(&pool, config);
    let text = pick_text(&pool, primary, config.text_contrast_threshold);
    let accents = pick_accents(&pool, &members, primary, text, config);

    GroupPalette {
        primary,
        text,
        accents,
    }
}

/// Greedy score-order dedupe: keep a candidate only if it is farther than
/// `threshold` from everything already kept.
pub fn dedupe<'a>(members: &[&'a Candidate], threshold: f32) -> Vec<&'a Candidate> {
    let mut kept: Vec<&Candidate> = Vec::new();
    for &c in members {
        if kept.iter().all(|k| delta_e(&c.lab, &k.lab) > threshold) {
            kept.push(c);
        }
    }
    kept
}

/// First candidate inside the preferred lightness band, else the top
/// candidate, else [`NULL_SLOT`].
fn pick_primary(pool: &[&Candidate], config: &SelectConfig) -> Color {
    pool.iter()
        .find(|c| (config.primary_min_l..=config.primary_max_l).contains(&c.lightness()))
        .or_else(|| pool.first())
        .map(|c| c.color)
        .unwrap_or(NULL_SLOT)
}

/// White, then black, if either reaches `threshold` against the primary;
/// otherwise the pool's highest-contrast color.
fn pick_text(pool: &[&Candidate], primary: Color, threshold: f32) -> Color {
    for fixed in [Color::WHITE, Color::BLACK] {
        if Color::contrast_ratio(&fixed, &primary) >= threshold {
            return fixed;
        }
    }
    // max_by keeps the last maximum; reverse so the higher-scored one wins ties.
    pool.iter()
        .rev()
        .map(|c| c.color)
        .max_by(|a, b| {
            Color::contrast_ratio(a, &primary).total_cmp(&Color::contrast_ratio(b, &primary))
        })
        .unwrap_or(NULL_SLOT)
}

fn pick_accents(
    pool: &[&Candidate],
    members: &[&Candidate],
    primary: Color,
    text: Color,
    config: &SelectConfig,
) -> Vec<Color> {
    let wanted = config.num_accents;
    let mut picked: Vec<&Candidate> = Vec::with_capacity(wanted);
    for &c in pool {
        if picked.len() >= wanted {
            break;
        }
        if c.color == primary || c.color == text {
            continue;
        }
        if picked
            .iter()
            .all(|a| delta_e(&c.lab, &a.lab) > config.accents_dedupe_delta_e)
        {
            picked.push(c);
        }
    }

    let mut accents: Vec<Color> = picked.iter().map(|c| c.color).collect();
    let mut spares = members.iter().map(|c| c.color);
    while accents.len() < wanted {
        match spares.next() {
            Some(color) => {
                if color != primary && color != text && !accents.contains(&color) {
                    accents.push(color);
                }
            }
            None => accents.push(NULL_SLOT),
        }
    }
    accents
}
