use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::extractor::{assets, download, Device, ExtractorKind};

/// Central configuration loaded from environment variables.
///
/// The resources root is resolved once here and passed explicitly to the
/// extractor initializers — nothing below the config layer reads the
/// environment. The .env file is loaded automatically at startup via
/// dotenvy.
pub struct Config {
    /// Root directory for model checkpoints (STAMP_RESOURCES_DIR).
    pub resources_dir: PathBuf,
    /// Inference device (STAMP_DEVICE, "cpu" or "cuda").
    pub device: Device,
    /// Worker threads for tile preprocessing (STAMP_CORES).
    pub cores: usize,
    /// Tiles per inference batch (STAMP_BATCH_SIZE).
    pub batch_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default; STAMP_RESOURCES_DIR falls back to the
    /// platform data directory.
    pub fn load() -> Result<Self> {
        let resources_dir = env::var("STAMP_RESOURCES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| download::default_resources_dir());

        let device = match env::var("STAMP_DEVICE") {
            Ok(v) => v.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            Err(_) => Device::Cpu,
        };

        Ok(Self {
            resources_dir,
            device,
            cores: parse_env("STAMP_CORES", 8)?,
            batch_size: parse_env("STAMP_BATCH_SIZE", 32)?,
        })
    }

    /// Check that a variant's checkpoints are installed.
    ///
    /// Call this before initializing an extractor to get an actionable
    /// message instead of a mid-run failure.
    pub fn require_assets(&self, kind: ExtractorKind) -> Result<()> {
        let missing = assets::missing_assets(kind, &self.resources_dir);
        if !missing.is_empty() {
            let listing: Vec<String> = missing
                .iter()
                .map(|p| format!("  {}", p.display()))
                .collect();
            anyhow::bail!(
                "Missing checkpoints for {kind}:\n{}\n\
                 Run `stamp fetch-asset --model {kind} --url <URL>` to install them.",
                listing.join("\n")
            );
        }
        Ok(())
    }
}

fn parse_env(key: &str, default: usize) -> Result<usize> {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} must be a positive integer, got '{v}'")),
        Err(_) => Ok(default),
    }
}
