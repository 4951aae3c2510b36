use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wbconfgen::cli::{Args, Command, GenerateArgs, KittyArgs};
use wbconfgen::{kitty, pipeline, preview, theme};

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wbconfgen=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match args.command {
        Command::Generate(generate) => run_generate(&generate),
        Command::Kitty(kitty_args) => run_kitty(&kitty_args),
    }
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    let config = args.to_config();
    let blocks = pipeline::generate(&args.image, &config)?;
    let paths = theme::write_outputs(&args.outdir()?, &args.ext, &blocks)?;

    println!(
        "Wrote {} and {}",
        paths.theme.display(),
        paths.colors.display()
    );
    if args.preview {
        print!("{}", preview::render(&blocks));
    } else {
        for block in &blocks {
            let p = &block.palette;
            let first: Vec<String> = p.accents.iter().take(3).map(|a| a.to_hex()).collect();
            println!(
                "[group {}] primary={} text={} accents=[{}]...",
                block.index,
                p.primary,
                p.text,
                first.join(", ")
            );
        }
    }
    Ok(())
}

fn run_kitty(args: &KittyArgs) -> Result<()> {
    let output = args.output()?;
    kitty::convert(&args.theme()?, &output)?;
    println!("Terminal theme written to {}", output.display());
    Ok(())
}
