use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "spectro",
    about = "Render audio files as Mel-spectrogram images"
)]
struct Cli {
    /// Input audio file, or a directory whose files are all converted
    input: PathBuf,

    /// Output directory for the rendered images
    #[arg(short, long, default_value = "./spectrograms/")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.input.is_dir() {
        let last = spectro_core::convert_directory(&cli.input, &cli.output)
            .with_context(|| format!("batch conversion of {} failed", cli.input.display()))?;
        info!("batch complete, last image written: {}", last.display());
    } else if cli.input.is_file() {
        fs::create_dir_all(&cli.output)
            .with_context(|| format!("failed to create {}", cli.output.display()))?;

        let name = cli
            .input
            .file_name()
            .context("input path has no file name")?;
        let target = cli.output.join(name).with_extension(spectro_core::IMAGE_EXT);

        spectro_core::render(&cli.input, &target)
            .with_context(|| format!("failed to render {}", cli.input.display()))?;
        info!("wrote {}", target.display());
    } else {
        bail!("input {} does not exist", cli.input.display());
    }

    Ok(())
}
