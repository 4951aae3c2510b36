//! Reader for the generated `theme.<ext>` file that turns its best module into
//! a wallbash/pywal-style `theme.conf`.
//!
//! Keys are classified by substring (`primary`, `text`, `accent`), not parsed
//! exactly, so any key naming that keeps those substrings stays readable.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::color::Color;
use crate::theme::publish;

const MODULE_HEADER: &str = "{color_wbgenconf_modules.";

/// Lowest and highest luma the background is clamped into.
const MIN_BG_LUMA: f32 = 0.07;
const MAX_BG_LUMA: f32 = 0.13;

/// Number of accents exposed as `wallbash_1xa<i>`.
const NAMED_ACCENTS: usize = 8;

/// A module as read back from the theme file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedModule {
    pub primary: Option<Color>,
    pub text: Option<Color>,
    pub accents: Vec<Color>,
}

impl ParsedModule {
    fn is_empty(&self) -> bool {
        self.primary.is_none() && self.text.is_none() && self.accents.is_empty()
    }
}

/// Split theme file contents into modules.
///
/// A header line or a blank line closes the current module.
pub fn parse_modules(content: &str) -> Result<Vec<ParsedModule>> {
    let mut modules = Vec::new();
    let mut current = ParsedModule::default();

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(MODULE_HEADER) {
            if !current.is_empty() {
                modules.push(std::mem::take(&mut current));
            }
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let color = Color::from_hex(value.trim())
            .with_context(|| format!("line {}: invalid color for {key}", lineno + 1))?;
        if key.contains("primary") {
            current.primary = Some(color);
        } else if key.contains("text") {
            current.text = Some(color);
        } else if key.contains("accent") {
            current.accents.push(color);
        }
    }
    if !current.is_empty() {
        modules.push(current);
    }
    Ok(modules)
}

/// Read and parse a theme file.
pub fn read_modules(path: &Path) -> Result<Vec<ParsedModule>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read theme file: {}", path.display()))?;
    parse_modules(&content)
}

/// Scale all channels so luma lands inside `[min, max]`. Truncates.
pub fn clamp_luma(color: Color, min: f32, max: f32) -> Color {
    let luma = color.luma();
    if luma < min {
        color.brighten(min / luma.max(0.001))
    } else if luma > max {
        color.brighten(max / luma)
    } else {
        color
    }
}

/// Darker background plus a brighter first accent scores higher.
/// Modules without a primary cannot be scored.
pub fn score_module(module: &ParsedModule) -> Option<f32> {
    let primary = module.primary?;
    let mut score = -clamp_luma(primary, MIN_BG_LUMA, MAX_BG_LUMA).luma();
    if let Some(first) = module.accents.first() {
        score += first.luma();
    }
    Some(score)
}

/// Highest-scoring module; the first one wins ties.
pub fn pick_best_module(modules: &[ParsedModule]) -> Option<&ParsedModule> {
    let mut best: Option<(&ParsedModule, f32)> = None;
    for module in modules {
        let Some(score) = score_module(module) else {
            continue;
        };
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((module, score));
        }
    }
    best.map(|(m, _)| m)
}

/// Colors derived from a module before key mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalColors {
    pub background: Color,
    pub text: Color,
    pub accents: Vec<Color>,
    pub cursor: Color,
    /// Replaces the slots pywal usually fills with grays.
    pub neutral: Color,
}

impl TerminalColors {
    pub fn from_module(module: &ParsedModule) -> Option<Self> {
        let background = clamp_luma(module.primary?, MIN_BG_LUMA, MAX_BG_LUMA);
        let text = module.text.unwrap_or(Color::WHITE);
        let accents: Vec<Color> = module
            .accents
            .iter()
            .map(|a| a.saturate(1.3).brighten(1.05))
            .collect();
        let cursor = accents.first().copied().unwrap_or(text).brighten(1.1);
        let neutral = cursor.saturate(1.1);
        Some(Self {
            background,
            text,
            accents,
            cursor,
            neutral,
        })
    }

    /// `wallbash_*` keys in output order.
    pub fn wallbash_keys(&self) -> Vec<(String, Color)> {
        let bg = self.background;
        let mut keys = vec![("wallbash_bgx1".to_string(), bg)];
        for (i, a) in self.accents.iter().take(NAMED_ACCENTS).enumerate() {
            keys.push((format!("wallbash_1xa{}", i + 1), *a));
        }
        let first = self.accents.first().copied().unwrap_or(self.text);
        let second = self.accents.get(1).copied().unwrap_or(self.text);
        keys.extend([
            ("wallbash_crx1".to_string(), self.cursor),
            ("wallbash_atfx1".to_string(), self.neutral),
            ("wallbash_atbx1".to_string(), bg),
            ("wallbash_itfx1".to_string(), self.neutral),
            ("wallbash_itbx1".to_string(), bg),
            ("wallbash_apx1".to_string(), first),
            ("wallbash_appx1".to_string(), bg),
            ("wallbash_bbx1".to_string(), second),
        ]);
        for (i, color) in std::iter::once(bg).chain(self.accents.iter().copied()).enumerate() {
            let slot = i + 1;
            let value = if slot == 7 || slot == 15 { self.neutral } else { color };
            keys.push((format!("wallbash_pry{slot}"), value));
        }
        keys
    }
}

pub fn render_conf(keys: &[(String, Color)]) -> String {
    keys.iter()
        .map(|(k, v)| format!("{k}={}\n", v.to_hex()))
        .collect()
}

/// Read `theme_path`, pick its best module and write the conf to `output`.
pub fn convert(theme_path: &Path, output: &Path) -> Result<()> {
    let modules = read_modules(theme_path)?;
    if modules.is_empty() {
        bail!("no modules found in {}", theme_path.display());
    }
    let Some(best) = pick_best_module(&modules) else {
        bail!("no module in {} has a primary color", theme_path.display());
    };
    let Some(colors) = TerminalColors::from_module(best) else {
        bail!("selected module has no primary color");
    };

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    publish(&[(output, render_conf(&colors.wallbash_keys()))])?;
    info!(
        output = %output.display(),
        background = %colors.background,
        "wrote terminal theme"
    );
    Ok(())
}
