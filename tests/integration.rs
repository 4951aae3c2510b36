use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;
use wbconfgen::color::{delta_e, Color};
use wbconfgen::pipeline::extract::load_and_prepare;
use wbconfgen::pipeline::{generate, generate_from_pixels, GenerateConfig};
use wbconfgen::theme::{render, write_outputs, ModuleBlock};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn create_two_tone(path: &Path) {
    let img = image::RgbImage::from_fn(64, 64, |x, _| {
        if x < 32 {
            image::Rgb([220, 40, 40])
        } else {
            image::Rgb([40, 60, 210])
        }
    });
    img.save(path).unwrap();
}

fn create_uniform(path: &Path) {
    let img = image::RgbImage::from_pixel(48, 48, image::Rgb([90, 140, 70]));
    img.save(path).unwrap();
}

fn create_dark_photo(path: &Path) {
    let img = image::RgbImage::from_fn(64, 64, |x, y| {
        let r = ((x * 40) / 64) as u8;
        let g = ((y * 30) / 64) as u8 + 5;
        let b = 20 + ((x + y) % 15) as u8;
        image::Rgb([r, g, b])
    });
    img.save(path).unwrap();
}

fn create_monochrome(path: &Path) {
    let img = image::RgbImage::from_fn(64, 64, |x, y| {
        let v = ((x * 255) / 64 + (y * 255) / 64) as u8 / 2;
        image::Rgb([v, v, v])
    });
    img.save(path).unwrap();
}

fn create_colorful(path: &Path) {
    let img = image::RgbImage::from_fn(64, 64, |x, y| {
        let region = (x / 16) + (y / 16) * 4;
        match region % 8 {
            0 => image::Rgb([220, 50, 50]),   // red
            1 => image::Rgb([50, 200, 50]),   // green
            2 => image::Rgb([50, 50, 220]),   // blue
            3 => image::Rgb([220, 220, 50]),  // yellow
            4 => image::Rgb([200, 50, 200]),  // magenta
            5 => image::Rgb([50, 200, 200]),  // cyan
            6 => image::Rgb([20, 20, 20]),    // black
            _ => image::Rgb([240, 240, 240]), // white
        }
    });
    img.save(path).unwrap();
}

fn create_gradient(path: &Path) {
    let img = image::RgbImage::from_fn(64, 64, |x, y| {
        image::Rgb([(x * 4) as u8, (y * 4) as u8, (255 - x * 2) as u8])
    });
    img.save(path).unwrap();
}

/// All fixtures, written into `dir`.
fn fixtures(dir: &Path) -> Vec<PathBuf> {
    let makers: [(&str, fn(&Path)); 6] = [
        ("two-tone.png", create_two_tone),
        ("uniform.png", create_uniform),
        ("dark-photo.png", create_dark_photo),
        ("monochrome.png", create_monochrome),
        ("colorful.png", create_colorful),
        ("gradient.png", create_gradient),
    ];
    makers
        .iter()
        .map(|(name, make)| {
            let path = dir.join(name);
            make(&path);
            path
        })
        .collect()
}

/// Validate both rendered files against the module block format.
fn validate_output_structure(theme: &str, colors: &str, groups: usize, accents: usize) {
    let hex_line = Regex::new(
        r"^wallbash[._](pry\d+_primary|txt\d+_text|\d+xa\d+_accent)=#[0-9A-F]{6}$",
    )
    .unwrap();
    let rgba_line = Regex::new(
        r"^\$wallbash[._](pry\d+_primary|txt\d+_text|\d+xa\d+_accent)=rgba\(\d{1,3},\d{1,3},\d{1,3},1\.0\)$",
    )
    .unwrap();

    for (content, line_re) in [(theme, &hex_line), (colors, &rgba_line)] {
        let blocks: Vec<&str> = content.split_terminator("\n\n").collect();
        assert_eq!(blocks.len(), groups, "unexpected block count in:\n{content}");
        for (i, block) in blocks.iter().enumerate() {
            let m = i + 1;
            let lines: Vec<&str> = block.lines().collect();
            assert_eq!(lines[0], format!("{{color_wbgenconf_modules.{m}}}"));
            assert_eq!(lines.len(), 1 + 2 + accents, "block {m}:\n{block}");
            let dotted = m % 2 == 1;
            for line in &lines[1..] {
                assert!(line_re.is_match(line), "malformed line: '{line}'");
                let key = line.trim_start_matches('$');
                assert_eq!(key.starts_with("wallbash."), dotted, "block {m}: '{line}'");
            }
        }
    }
}

fn config(groups: usize, accents: usize) -> GenerateConfig {
    let mut config = GenerateConfig::default();
    config.num_groups = groups;
    config.select.num_accents = accents;
    config
}

// ---------------------------------------------------------------------------
// Pipeline tests
// ---------------------------------------------------------------------------

#[test]
fn every_fixture_produces_complete_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = GenerateConfig::default();
    for path in fixtures(dir.path()) {
        let blocks = generate(&path, &config).unwrap();
        let (theme, colors) = render(&blocks);
        validate_output_structure(&theme, &colors, 4, 9);
    }
}

#[test]
fn two_tone_image_splits_into_distinct_groups() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two-tone.png");
    create_two_tone(&path);

    let blocks = generate(&path, &config(2, 9)).unwrap();
    assert_eq!(blocks.len(), 2);
    let p1 = blocks[0].palette.primary;
    let p2 = blocks[1].palette.primary;
    let distance = delta_e(&p1.to_lab(), &p2.to_lab());
    assert!(distance > 30.0, "primaries too close: {p1} vs {p2} (ΔE {distance:.1})");

    let (theme, _) = render(&blocks);
    assert!(theme.contains("wallbash.pry1_primary="));
    assert!(theme.contains("wallbash_pry2_primary="));
}

#[test]
fn uniform_image_still_fills_every_group() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uniform.png");
    create_uniform(&path);

    let blocks = generate(&path, &config(4, 9)).unwrap();
    assert_eq!(blocks.len(), 4);
    assert_ne!(blocks[0].palette.primary, Color::BLACK);
    for block in &blocks[1..] {
        assert_eq!(block.palette.primary, Color::BLACK);
        assert_eq!(block.palette.accents, vec![Color::BLACK; 9]);
    }
}

#[test]
fn text_contrast_holds_for_all_fixtures() {
    let dir = tempfile::tempdir().unwrap();
    let config = GenerateConfig::default();
    let threshold = config.select.text_contrast_threshold;
    for path in fixtures(dir.path()) {
        for block in generate(&path, &config).unwrap() {
            let p = &block.palette;
            let reachable = Color::contrast_ratio(&Color::WHITE, &p.primary) >= threshold
                || Color::contrast_ratio(&Color::BLACK, &p.primary) >= threshold;
            if reachable {
                let ratio = Color::contrast_ratio(&p.text, &p.primary);
                assert!(
                    ratio >= threshold,
                    "{}: group {} text contrast {ratio:.2}",
                    path.display(),
                    block.index
                );
                assert!(p.text == Color::WHITE || p.text == Color::BLACK);
            }
        }
    }
}

#[test]
fn accents_exclude_primary_and_text_when_real() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("colorful.png");
    create_colorful(&path);
    for block in generate(&path, &config(3, 4)).unwrap() {
        let p = &block.palette;
        for accent in p.accents.iter().filter(|a| **a != Color::BLACK) {
            assert_ne!(*accent, p.primary);
            assert_ne!(*accent, p.text);
        }
    }
}

#[test]
fn same_seed_gives_byte_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradient.png");
    create_gradient(&path);
    let config = GenerateConfig::default();

    let first = write_outputs(
        &dir.path().join("a"),
        "dcol",
        &generate(&path, &config).unwrap(),
    )
    .unwrap();
    let second = write_outputs(
        &dir.path().join("b"),
        "dcol",
        &generate(&path, &config).unwrap(),
    )
    .unwrap();

    assert_eq!(
        std::fs::read(&first.theme).unwrap(),
        std::fs::read(&second.theme).unwrap()
    );
    assert_eq!(
        std::fs::read(&first.colors).unwrap(),
        std::fs::read(&second.colors).unwrap()
    );
}

#[test]
fn worker_count_does_not_change_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("colorful.png");
    create_colorful(&path);
    let pixels = load_and_prepare(&path).unwrap();

    let mut single = GenerateConfig::default();
    single.workers = 1;
    let mut many = GenerateConfig::default();
    many.workers = 8;

    let a: Vec<ModuleBlock> = generate_from_pixels(&pixels, &single).unwrap();
    let b: Vec<ModuleBlock> = generate_from_pixels(&pixels, &many).unwrap();
    assert_eq!(a, b);
}

#[test]
fn missing_image_is_fatal() {
    let err = generate(Path::new("/nonexistent/wall.png"), &GenerateConfig::default())
        .unwrap_err();
    assert!(format!("{err:#}").contains("file not found"));
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Generate a random synthetic image as a Vec<[u8; 3]> pixel buffer.
    fn arb_pixel_buffer() -> impl Strategy<Value = Vec<[u8; 3]>> {
        (4u32..=16u32, 4u32..=16u32).prop_flat_map(|(w, h)| {
            proptest::collection::vec(proptest::array::uniform3(0u8..=255u8), (w * h) as usize)
        })
    }

    fn pixels_to_lab(pixels: &[[u8; 3]]) -> Vec<palette::Lab> {
        pixels
            .iter()
            .map(|p| Color::new(p[0], p[1], p[2]).to_lab())
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn always_one_block_per_group(
            pixels in arb_pixel_buffer(),
            groups in 1usize..=6,
            accents in 0usize..=9,
        ) {
            let lab_pixels = pixels_to_lab(&pixels);
            let blocks = generate_from_pixels(&lab_pixels, &config(groups, accents)).unwrap();
            prop_assert_eq!(blocks.len(), groups);
            for (i, block) in blocks.iter().enumerate() {
                prop_assert_eq!(block.index, i + 1);
                prop_assert_eq!(block.entries().len(), 2 + accents);
            }
        }

        #[test]
        fn rendered_files_are_well_formed(pixels in arb_pixel_buffer()) {
            let lab_pixels = pixels_to_lab(&pixels);
            let blocks = generate_from_pixels(&lab_pixels, &GenerateConfig::default()).unwrap();
            let (theme, colors) = render(&blocks);
            validate_output_structure(&theme, &colors, 4, 9);
        }
    }
}

// ---------------------------------------------------------------------------
// CLI integration tests (run the actual binary)
// ---------------------------------------------------------------------------

fn cargo_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_wbconfgen"))
}

#[test]
fn cli_generate_then_kitty() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("colorful.png");
    create_colorful(&image);
    let outdir = dir.path().join("wallbash");

    let output = Command::new(cargo_bin())
        .args(["generate", image.to_str().unwrap(), "--outdir"])
        .arg(&outdir)
        .args(["--groups", "3", "--accents", "5"])
        .output()
        .expect("failed to run binary");
    assert!(
        output.status.success(),
        "generate failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrote"));

    let theme = std::fs::read_to_string(outdir.join("theme.dcol")).unwrap();
    let colors = std::fs::read_to_string(outdir.join("colors.dcol")).unwrap();
    validate_output_structure(&theme, &colors, 3, 5);

    let conf = dir.path().join("templates").join("theme.conf");
    let output = Command::new(cargo_bin())
        .args(["kitty", "--theme"])
        .arg(outdir.join("theme.dcol"))
        .arg("--output")
        .arg(&conf)
        .output()
        .expect("failed to run binary");
    assert!(
        output.status.success(),
        "kitty failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let conf = std::fs::read_to_string(&conf).unwrap();
    assert!(conf.starts_with("wallbash_bgx1=#"));
    assert!(conf.contains("wallbash_pry1="));
}

#[test]
fn cli_help_output() {
    let output = Command::new(cargo_bin())
        .args(["generate", "--help"])
        .output()
        .expect("failed to run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--groups"));
    assert!(stdout.contains("--text-contrast-threshold"));
    assert!(stdout.contains("--outdir"));
}

#[test]
fn cli_file_not_found_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(cargo_bin())
        .args(["generate", "/nonexistent/image.png", "--outdir"])
        .arg(dir.path())
        .output()
        .expect("failed to run binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("file not found"),
        "expected file-not-found error, got: {stderr}"
    );
    assert!(!dir.path().join("theme.dcol").exists());
}
