use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qrforge::{ECLevel, MaskPattern, QRBuilder, Version};

#[derive(Parser)]
#[command(name = "qrforge", about = "Generate QR codes")]
struct Cli {
    /// Text to encode
    text: String,
    /// Error correction level: L, M, Q or H
    #[arg(short, long, default_value = "M")]
    ec_level: ECLevel,
    /// Force a version (1-40) instead of the smallest that fits
    #[arg(short, long)]
    version: Option<u8>,
    /// Force a mask (0-7) instead of the lowest penalty
    #[arg(short, long)]
    mask: Option<u8>,
    /// Pack Shift JIS double byte characters in kanji mode
    #[arg(short, long)]
    kanji: bool,
    /// Write a PNG here instead of printing to the terminal
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Pixels (or characters) per module
    #[arg(short, long, default_value_t = 1)]
    scale: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let mut builder = QRBuilder::new(cli.text.as_bytes());
    builder.ec_level(cli.ec_level).kanji(cli.kanji);
    if let Some(v) = cli.version {
        builder.version(Version::new(v).with_context(|| format!("Bad version {v}"))?);
    }
    if let Some(m) = cli.mask {
        builder.mask(MaskPattern::new(m).with_context(|| format!("Bad mask {m}"))?);
    }

    let qr = builder.build().with_context(|| format!("Failed to build QR {}", builder.metadata()))?;
    info!(version = *qr.version(), ecl = ?qr.ec_level(), mask = ?qr.mask().map(|m| *m), "Built QR");

    match cli.output {
        Some(path) => {
            let scale = cli.scale.max(1);
            qr.to_image(scale)
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => println!("{}", qr.to_str(cli.scale.max(1) as usize)),
    }

    Ok(())
}
