use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::pipeline::extract::ExtractConfig;
use crate::pipeline::select::SelectConfig;
use crate::pipeline::GenerateConfig;

/// Generate independent wallbash color groups from wallpaper images.
#[derive(Parser, Debug)]
#[command(name = "wbconfgen", version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract color groups from an image and write theme/colors files
    Generate(GenerateArgs),
    /// Build a terminal theme.conf from the best group of a theme file
    Kitty(KittyArgs),
}

#[derive(ClapArgs, Debug)]
pub struct GenerateArgs {
    /// Path to the wallpaper image
    pub image: PathBuf,

    /// Output directory [default: $XDG_CONFIG_HOME/main/wallbash]
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Extension of the generated theme and colors files
    #[arg(long, default_value = "dcol")]
    pub ext: String,

    /// Number of independent groups
    #[arg(long, default_value_t = 4)]
    pub groups: usize,

    /// Accent colors per group
    #[arg(long, default_value_t = 9)]
    pub accents: usize,

    /// Global candidate clusters (higher means more variety, at most 256)
    #[arg(long, default_value_t = 256)]
    pub k_global: usize,

    /// Pixel sample size for candidate extraction
    #[arg(long, default_value_t = 40_000)]
    pub sample: usize,

    /// Lowest pixel lightness considered
    #[arg(long, default_value_t = 2.0)]
    pub min_l: f32,

    /// Highest pixel lightness considered
    #[arg(long, default_value_t = 98.0)]
    pub max_l: f32,

    /// Lowest pixel chroma considered
    #[arg(long, default_value_t = 6.0)]
    pub min_chroma: f32,

    /// Minimum ΔE between kept candidates within a group
    #[arg(long, default_value_t = 8.0)]
    pub dedupe_delta_e: f32,

    /// Minimum ΔE between accents
    #[arg(long, default_value_t = 12.0)]
    pub accents_dedupe_delta_e: f32,

    /// Lowest lightness preferred for the primary color
    #[arg(long, default_value_t = 6.0)]
    pub primary_min_l: f32,

    /// Highest lightness preferred for the primary color
    #[arg(long, default_value_t = 60.0)]
    pub primary_max_l: f32,

    /// Minimum text/primary contrast ratio
    #[arg(long, default_value_t = 4.5)]
    pub text_contrast_threshold: f32,

    /// Seed for sampling and clustering
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Worker threads for per-group selection
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Print a colored terminal preview of the groups
    #[arg(long)]
    pub preview: bool,
}

impl GenerateArgs {
    pub fn to_config(&self) -> GenerateConfig {
        GenerateConfig {
            num_groups: self.groups,
            workers: self.workers,
            extract: ExtractConfig {
                sample_pixels: self.sample,
                k_global: self.k_global,
                min_l: self.min_l,
                max_l: self.max_l,
                min_chroma: self.min_chroma,
                seed: self.seed,
            },
            select: SelectConfig {
                dedupe_delta_e: self.dedupe_delta_e,
                accents_dedupe_delta_e: self.accents_dedupe_delta_e,
                primary_min_l: self.primary_min_l,
                primary_max_l: self.primary_max_l,
                text_contrast_threshold: self.text_contrast_threshold,
                num_accents: self.accents,
            },
        }
    }

    pub fn outdir(&self) -> Result<PathBuf> {
        match &self.outdir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(config_home()?.join("main").join("wallbash")),
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct KittyArgs {
    /// Theme file to read [default: $XDG_CONFIG_HOME/main/wallbash/theme.dcol]
    #[arg(long)]
    pub theme: Option<PathBuf>,

    /// Where to write the conf [default: $XDG_CONFIG_HOME/wallbash/templates/theme.conf]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl KittyArgs {
    pub fn theme(&self) -> Result<PathBuf> {
        match &self.theme {
            Some(path) => Ok(path.clone()),
            None => Ok(config_home()?
                .join("main")
                .join("wallbash")
                .join("theme.dcol")),
        }
    }

    pub fn output(&self) -> Result<PathBuf> {
        match &self.output {
            Some(path) => Ok(path.clone()),
            None => Ok(config_home()?
                .join("wallbash")
                .join("templates")
                .join("theme.conf")),
        }
    }
}

/// `$XDG_CONFIG_HOME`, else `$HOME/.config`.
pub fn config_home() -> Result<PathBuf> {
    resolve_config_home(
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
    )
}

fn resolve_config_home(xdg: Option<OsString>, home: Option<OsString>) -> Result<PathBuf> {
    if let Some(xdg) = xdg.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg));
    }
    match home.filter(|v| !v.is_empty()) {
        Some(home) => Ok(PathBuf::from(home).join(".config")),
        None => bail!("cannot locate config directory: neither XDG_CONFIG_HOME nor HOME is set"),
    }
}
