use crossterm::style::{Color as TermColor, Stylize};

use crate::color::Color;
use crate::theme::ModuleBlock;

fn to_term(c: Color) -> TermColor {
    TermColor::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Choose black or white foreground for readable text on the given background.
fn label_fg(c: Color) -> TermColor {
    if c.relative_luminance() > 0.4 {
        TermColor::Black
    } else {
        TermColor::White
    }
}

fn swatch(c: Color, label: &str) -> String {
    format!(" {label:^4} ")
        .with(label_fg(c))
        .on(to_term(c))
        .to_string()
}

/// One line per module: swatches for primary (`P`), text (`T`) and accents,
/// followed by their hex codes.
pub fn render(blocks: &[ModuleBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        let p = &block.palette;
        out.push_str(&format!("[group {}] ", block.index));
        out.push_str(&swatch(p.primary, "P"));
        out.push_str(&swatch(p.text, "T"));
        for (i, accent) in p.accents.iter().enumerate() {
            out.push_str(&swatch(*accent, &(i + 1).to_string()));
        }
        let hexes: Vec<String> = p.accents.iter().map(|a| a.to_hex()).collect();
        out.push_str(&format!(
            "  primary={} text={} accents=[{}]\n",
            p.primary,
            p.text,
            hexes.join(", ")
        ));
    }
    out
}
