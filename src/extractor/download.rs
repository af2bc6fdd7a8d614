// Checkpoint download helper.
//
// Every supported checkpoint is license-gated by its publisher, so there
// is no implicit download on first use: the caller supplies the URL
// after accepting the upstream terms, and the file lands at the
// variant's expected location under the resources root.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Default resources root: ~/.local/share/stamp/resources on Linux.
pub fn default_resources_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stamp")
        .join("resources")
}

/// Download a checkpoint from `url` to `dest`.
///
/// Skips the download if the file already exists. Creates directories as
/// needed.
pub async fn fetch_asset(dest: &Path, url: &str) -> Result<()> {
    if dest.exists() {
        info!("Checkpoint already exists, skipping");
        println!("  {} (already exists)", dest.display());
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create asset directory: {}", parent.display()))?;
    }
    println!("  Downloading {}...", dest.display());
    download_file(url, dest, true).await
}

/// Download a single file from a URL, streaming to disk chunk by chunk
/// (checkpoints can be multiple GB). If `show_progress` is true, display
/// a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = if show_progress {
        let pb = match response.content_length() {
            Some(size) => {
                let pb = ProgressBar::new(size);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                        .expect("valid template")
                        .progress_chars("=> "),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("    {spinner} {bytes}")
                        .expect("valid template"),
                );
                pb
            }
        };
        Some(pb)
    } else {
        None
    };

    let mut file = std::fs::File::create(dest)
        .with_context(|| format!("Failed to write {}", dest.display()))?;
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read response body")?
    {
        file.write_all(&chunk)
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        if let Some(ref pb) = pb {
            pb.inc(chunk.len() as u64);
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}
