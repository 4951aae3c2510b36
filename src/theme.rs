use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::color::Color;
use crate::pipeline::select::GroupPalette;

/// Separator style of a module's keys, decided only by the module number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStyle {
    /// `wallbash.pry1_primary`, used by odd modules.
    Dotted,
    /// `wallbash_pry2_primary`, used by even modules.
    Underscored,
}

impl KeyStyle {
    pub fn for_module(index: usize) -> Self {
        if index % 2 == 1 {
            KeyStyle::Dotted
        } else {
            KeyStyle::Underscored
        }
    }

    fn separator(self) -> char {
        match self {
            KeyStyle::Dotted => '.',
            KeyStyle::Underscored => '_',
        }
    }
}

/// One group's palette as it appears in the output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleBlock {
    /// 1-based module number.
    pub index: usize,
    pub palette: GroupPalette,
}

impl ModuleBlock {
    pub fn new(index: usize, palette: GroupPalette) -> Self {
        Self { index, palette }
    }

    pub fn header(&self) -> String {
        format!("{{color_wbgenconf_modules.{}}}", self.index)
    }

    /// Keys and colors in output order: primary, text, then accents.
    pub fn entries(&self) -> Vec<(String, Color)> {
        let m = self.index;
        let sep = KeyStyle::for_module(m).separator();
        let mut entries = Vec::with_capacity(2 + self.palette.accents.len());
        entries.push((format!("wallbash{sep}pry{m}_primary"), self.palette.primary));
        entries.push((format!("wallbash{sep}txt{m}_text"), self.palette.text));
        for (i, accent) in self.palette.accents.iter().enumerate() {
            entries.push((format!("wallbash{sep}{m}xa{}_accent", i + 1), *accent));
        }
        entries
    }

    /// Block for the hex file, including the trailing blank line.
    pub fn render_hex(&self) -> String {
        let mut out = self.header();
        out.push('\n');
        for (key, color) in self.entries() {
            out.push_str(&format!("{key}={}\n", color.to_hex()));
        }
        out.push('\n');
        out
    }

    /// Block for the rgba file: `$`-prefixed keys, `rgba(...)` values.
    pub fn render_rgba(&self) -> String {
        let mut out = self.header();
        out.push('\n');
        for (key, color) in self.entries() {
            out.push_str(&format!("${key}={}\n", color.to_rgba()));
        }
        out.push('\n');
        out
    }
}

/// Paths of the published file pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub theme: PathBuf,
    pub colors: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path, ext: &str) -> Self {
        Self {
            theme: dir.join(format!("theme.{ext}")),
            colors: dir.join(format!("colors.{ext}")),
        }
    }
}

/// Render both files, blocks in ascending module order.
pub fn render(blocks: &[ModuleBlock]) -> (String, String) {
    let mut ordered: Vec<&ModuleBlock> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.index);

    let mut theme = String::new();
    let mut colors = String::new();
    for block in ordered {
        theme.push_str(&block.render_hex());
        colors.push_str(&block.render_rgba());
    }
    (theme, colors)
}

/// Write `theme.<ext>` and `colors.<ext>` into `dir`, creating it if needed.
///
/// Both files are staged as anonymous temporaries in `dir` and only moved into
/// place once both are fully written.
pub fn write_outputs(dir: &Path, ext: &str, blocks: &[ModuleBlock]) -> Result<OutputPaths> {
    write_outputs_with(dir, ext, blocks, stage)
}

fn write_outputs_with<F>(
    dir: &Path,
    ext: &str,
    blocks: &[ModuleBlock],
    stage: F,
) -> Result<OutputPaths>
where
    F: FnMut(&Path, &str) -> Result<NamedTempFile>,
{
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let paths = OutputPaths::in_dir(dir, ext);
    let (theme, colors) = render(blocks);
    publish_with(
        &[(paths.theme.as_path(), theme), (paths.colors.as_path(), colors)],
        stage,
    )?;
    Ok(paths)
}

/// Stage every file next to its target, then persist each into place.
///
/// Nothing is persisted until every file is staged. Temporaries that are never
/// persisted are removed when dropped.
pub fn publish(files: &[(&Path, String)]) -> Result<()> {
    publish_with(files, stage)
}

fn publish_with<F>(files: &[(&Path, String)], mut stage: F) -> Result<()>
where
    F: FnMut(&Path, &str) -> Result<NamedTempFile>,
{
    let staged = files
        .iter()
        .map(|(path, content)| stage(*path, content.as_str()).map(|file| (file, *path)))
        .collect::<Result<Vec<_>>>()?;

    for (file, path) in staged {
        file.persist(path).map_err(|e| e.error).with_context(|| {
            format!("failed to move staged file into place at {}", path.display())
        })?;
    }
    Ok(())
}

fn stage(path: &Path, content: &str) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to stage {} in {}", path.display(), dir.display()))?;
    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
    }
    Ok(file)
}
