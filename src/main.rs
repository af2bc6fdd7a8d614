use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use stamp::config::Config;
use stamp::extractor::ctranspath::CTRANSPATH_DIGEST;
use stamp::extractor::{assets, digest, download, ExtractorKind};
use stamp::pipeline::features::{extract_features, ExtractOptions};
use stamp::tiles::dir::load_tile_dir;
use stamp::tiles::transform::CROP_SIZE;

/// STAMP: feature extraction for whole-slide histopathology images.
///
/// Runs pretrained tile encoders over pre-tiled slides and writes
/// digest-stamped feature archives for downstream aggregation models.
#[derive(Parser)]
#[command(name = "stamp", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract features from a directory of slide tiles
    Extract {
        /// Directory of tile images with coordinates in the file names
        #[arg(long)]
        tiles: PathBuf,

        /// Output directory for the archive and info.json sidecar
        #[arg(long)]
        out: PathBuf,

        /// Slide name; defaults to the tile directory name
        #[arg(long)]
        name: Option<String>,

        /// Which pretrained encoder to use
        #[arg(long, default_value = "ctranspath")]
        extractor: String,

        /// Extra augmented passes to record in the run metadata
        #[arg(long, default_value = "0")]
        augmented_repetitions: usize,

        /// Tiles were not stain-normalized upstream
        #[arg(long)]
        unnormalized: bool,

        /// Microns covered by one patch edge (default: 256)
        #[arg(long, default_value = "256")]
        microns: u32,
    },

    /// Show which model checkpoints are installed
    Status,

    /// Compute checkpoint digests and check pinned ones
    Verify {
        /// Which extractor's checkpoints to verify
        extractor: String,
    },

    /// Download a checkpoint to its expected location
    FetchAsset {
        /// Which extractor the checkpoint belongs to
        #[arg(long)]
        model: String,

        /// Source URL. The supported models are license-gated; supply
        /// the URL after accepting the upstream terms.
        #[arg(long)]
        url: String,

        /// File name within the variant's asset set (required when the
        /// variant has more than one checkpoint)
        #[arg(long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stamp=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            tiles,
            out,
            name,
            extractor,
            augmented_repetitions,
            unnormalized,
            microns,
        } => {
            let config = Config::load()?;
            let kind = parse_kind(&extractor)?;
            config.require_assets(kind)?;

            println!("Loading tiles from {}...", tiles.display());
            let (stack, coords) = load_tile_dir(&tiles)?;
            println!("  {} tiles", stack.len());
            if stack.is_empty() {
                println!(
                    "{}",
                    "No tiles found; the archive will be empty.".dimmed()
                );
            }

            println!("Initialising {kind} encoder ({})...", config.device);
            let mut extractor = kind.init(&config.resources_dir, config.device)?;
            println!("  {}", extractor.name.bold());

            let slide_name = name.unwrap_or_else(|| {
                tiles
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "slide".to_string())
            });
            std::fs::create_dir_all(&out)
                .with_context(|| format!("Failed to create output directory: {}", out.display()))?;

            let opts = ExtractOptions {
                augmented_repetitions,
                cores: config.cores,
                batch_size: config.batch_size,
                normalized: !unnormalized,
                target_microns: microns,
                patch_size: CROP_SIZE,
            };
            let path = extract_features(
                &mut extractor,
                stack,
                coords,
                &out.join(&slide_name),
                &opts,
            )?;
            info!(slide = %slide_name, "extraction finished");
            println!(
                "\n{}",
                format!("Features written to {}", path.display()).bold()
            );
        }

        Commands::Status => {
            let config = Config::load()?;
            stamp::status::show(&config.resources_dir);
        }

        Commands::Verify { extractor } => {
            let config = Config::load()?;
            let kind = parse_kind(&extractor)?;

            println!("Verifying {kind} checkpoints...");
            for rel in assets::expected_assets(kind) {
                let path = config.resources_dir.join(rel);
                match digest::file_digest(&path) {
                    Ok(actual) => {
                        let pinned = (kind == ExtractorKind::Ctranspath)
                            .then_some(CTRANSPATH_DIGEST);
                        match pinned {
                            Some(expected) if expected == actual => {
                                println!("  {} {} {}", rel, actual, "OK".green().bold());
                            }
                            Some(expected) => {
                                println!("  {} {} {}", rel, actual, "MISMATCH".red().bold());
                                println!("    pinned: {expected}");
                            }
                            None => println!("  {} {}", rel, actual),
                        }
                    }
                    Err(e) => println!("  {} {}", rel, format!("({e})").dimmed()),
                }
            }
        }

        Commands::FetchAsset { model, url, file } => {
            let config = Config::load()?;
            let kind = parse_kind(&model)?;
            let expected = assets::expected_assets(kind);

            let rel = match (&file, expected) {
                (None, [single]) => *single,
                (None, many) => anyhow::bail!(
                    "{kind} has several checkpoints; pick one with --file:\n{}",
                    many.iter()
                        .map(|rel| format!("  {rel}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                ),
                (Some(name), many) => many
                    .iter()
                    .copied()
                    .find(|rel| rel.rsplit('/').next() == Some(name.as_str()))
                    .with_context(|| format!("{kind} has no checkpoint named '{name}'"))?,
            };

            println!("Fetching {kind} checkpoint...");
            download::fetch_asset(&config.resources_dir.join(rel), &url).await?;
            println!("\n{}", "Checkpoint installed.".bold());
            println!("Run `stamp verify {kind}` to check its digest.");
        }
    }

    Ok(())
}

fn parse_kind(name: &str) -> Result<ExtractorKind> {
    name.parse::<ExtractorKind>()
        .map_err(|e| anyhow::anyhow!(e))
}
