//! Visualizer location, launch, and installation.

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{config::Config, error::PlayError};

#[cfg(windows)]
const BINARY_NAME: &str = "visualizer.exe";
#[cfg(not(windows))]
const BINARY_NAME: &str = "visualizer";

pub fn binary_path(dir: &Path) -> PathBuf {
    dir.join(BINARY_NAME)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

pub fn ensure_installed(path: &Path) -> Result<(), PlayError> {
    if is_executable(path) {
        Ok(())
    } else {
        Err(PlayError::VisualizerMissing { path: path.to_path_buf() })
    }
}

#[async_trait]
pub trait VisualizerLauncher: Send + Sync {
    /// Hand the terminal to the visualizer and return its exit code.
    async fn launch(&self, binary: &Path, log: &Path) -> Result<i32, PlayError>;
}

/// Runs the installed binary with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemVisualizer;

#[async_trait]
impl VisualizerLauncher for SystemVisualizer {
    async fn launch(&self, binary: &Path, log: &Path) -> Result<i32, PlayError> {
        debug!(binary = %binary.display(), log = %log.display(), "launching visualizer");
        let status = Command::new(binary)
            .arg(log)
            .status()
            .await
            .map_err(|source| PlayError::Spawn {
                program: binary.display().to_string(),
                source,
            })?;
        // Killed by a signal: report a generic failure.
        Ok(status.code().unwrap_or(1))
    }
}

fn platform_url(os: &str) -> Option<&'static str> {
    match os {
        "macos" => Some("https://mm-mac.now.sh"),
        "windows" => Some("https://mm-window.now.sh"),
        "linux" => Some("https://mm-linux.now.sh"),
        _ => None,
    }
}

pub fn download_url(cfg: &Config) -> Result<String> {
    if let Some(url) = cfg.get("MM_VISUALIZER_URL").filter(|u| !u.trim().is_empty()) {
        return Ok(url);
    }
    match platform_url(std::env::consts::OS) {
        Some(url) => Ok(url.to_string()),
        None => bail!(
            "No visualizer build is available for {}",
            std::env::consts::OS
        ),
    }
}

/// Replace the install directory with a freshly downloaded visualizer.
pub async fn download(cfg: &Config) -> Result<PathBuf> {
    let url = download_url(cfg)?;
    let dir = cfg.visualizer_dir();

    match fs::remove_dir_all(&dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("removing {}", dir.display())),
    }
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    info!(%url, "downloading visualizer");
    let mut client = reqwest::Client::builder();
    if let Some(timeout) = cfg.request_timeout() {
        client = client.timeout(timeout);
    }
    let resp = client
        .build()?
        .get(&url)
        .send()
        .await
        .context("failed to send download request")?;
    if !resp.status().is_success() {
        bail!("Visualizer download failed: {}", resp.status());
    }

    let mut archive = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        archive.extend_from_slice(&chunk.context("stream error")?);
    }

    let count = install(&archive, &dir)?;
    debug!(entries = count, dir = %dir.display(), "visualizer extracted");
    Ok(binary_path(&dir))
}

/// Unpack a gzipped tarball into `dir`, dropping the leading path component.
/// Links pointing outside the archive and entries that would land outside `dir`
/// are skipped. Returns the number of entries written.
pub fn install(archive: &[u8], dir: &Path) -> Result<usize> {
    let root = dir
        .canonicalize()
        .with_context(|| format!("resolving {}", dir.display()))?;
    let mut tar = tar::Archive::new(GzDecoder::new(archive));
    let mut written = 0;
    for entry in tar.entries().context("reading visualizer archive")? {
        let mut entry = entry.context("reading visualizer archive")?;
        let path = entry.path()?.into_owned();
        let Some(stripped) = strip_first(&path) else {
            continue;
        };

        let kind = entry.header().entry_type();
        let link = if kind.is_symlink() || kind.is_hard_link() {
            match entry.link_name()?.map(|l| l.into_owned()) {
                Some(link) if stays_inside(&link) => Some(link),
                _ => {
                    debug!(entry = %path.display(), "skipping link leaving the archive");
                    continue;
                }
            }
        } else {
            None
        };

        let target = dir.join(&stripped);
        let Some(parent) = target.parent() else {
            continue;
        };
        fs::create_dir_all(parent)?;
        if !parent.canonicalize()?.starts_with(&root) {
            debug!(entry = %path.display(), "skipping entry outside the install directory");
            continue;
        }

        match link {
            // Hard links name another archive member, so they get the same prefix stripped.
            Some(link) if kind.is_hard_link() => {
                let Some(source) = strip_first(&link) else {
                    continue;
                };
                fs::hard_link(dir.join(source), &target)
                    .with_context(|| format!("extracting {}", stripped.display()))?;
            }
            _ => {
                entry
                    .unpack(&target)
                    .with_context(|| format!("extracting {}", stripped.display()))?;
            }
        }
        written += 1;
    }
    Ok(written)
}

/// Relative and free of `..`.
fn stays_inside(link: &Path) -> bool {
    link.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// `None` for the top-level entry itself and for paths escaping the archive.
fn strip_first(path: &Path) -> Option<PathBuf> {
    let mut components = path.components().filter(|c| !matches!(c, Component::CurDir));
    components.next()?;
    let rest: PathBuf = components.collect();
    let escapes = rest
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if rest.as_os_str().is_empty() || escapes {
        None
    } else {
        Some(rest)
    }
}
