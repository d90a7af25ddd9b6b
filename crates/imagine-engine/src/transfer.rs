use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use imagine_contracts::events::{EventKind, EventPayload, EventWriter};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::retry::{
    with_retry, CLIPBOARD_ATTEMPTS, CLIPBOARD_BASE_DELAY, DOWNLOAD_ATTEMPTS, DOWNLOAD_BASE_DELAY,
};

#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// First 12 hex chars of the sha256 of the bytes, used in filenames.
    pub content_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    CopiedLink,
    Printed,
}

/// Fetches image bytes from a variant URL and validates them by decoding.
pub fn fetch_image(url: &str) -> Result<FetchedImage> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .context("image client build failed")?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("image request failed ({url})"))?;
    if !response.status().is_success() {
        bail!("image endpoint returned status {}", response.status());
    }
    let bytes = response
        .bytes()
        .context("image body read failed")?
        .to_vec();
    let decoded = image::load_from_memory(&bytes).context("image payload did not decode")?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    Ok(FetchedImage {
        width: decoded.width(),
        height: decoded.height(),
        bytes,
        content_hash: digest.chars().take(12).collect(),
    })
}

/// Downloads one variant with the download retry policy and writes it as
/// `imagine-<label>-<hash>.png` under `dir` (created on demand).
pub fn download_variant(
    events: &EventWriter,
    url: &str,
    dir: &Path,
    label: &str,
) -> Result<PathBuf> {
    let fetched = with_retry(DOWNLOAD_ATTEMPTS, DOWNLOAD_BASE_DELAY, |_| fetch_image(url))
        .with_context(|| format!("download failed ({url})"))?;
    save_image(events, &fetched, dir, label)
}

/// Writes already-fetched image bytes under `dir`, named by label and
/// content hash.
pub fn save_image(
    events: &EventWriter,
    fetched: &FetchedImage,
    dir: &Path,
    label: &str,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("could not create {}", dir.display()))?;
    let file_name = format!("imagine-{}-{}.png", sanitize_label(label), fetched.content_hash);
    let path = dir.join(file_name);
    std::fs::write(&path, &fetched.bytes)
        .with_context(|| format!("could not write {}", path.display()))?;

    let mut payload = EventPayload::new();
    payload.insert("label".to_string(), Value::String(label.to_string()));
    payload.insert(
        "path".to_string(),
        Value::String(path.display().to_string()),
    );
    payload.insert("bytes".to_string(), Value::from(fetched.bytes.len()));
    payload.insert("width".to_string(), Value::from(fetched.width));
    payload.insert("height".to_string(), Value::from(fetched.height));
    events.emit(EventKind::DownloadSaved, payload)?;

    Ok(path)
}

/// Puts a variant URL on the clipboard, retrying once after a short delay.
pub fn copy_link(events: &EventWriter, url: &str) -> Result<()> {
    with_retry(CLIPBOARD_ATTEMPTS, CLIPBOARD_BASE_DELAY, |_| {
        let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
        clipboard
            .set_text(url.to_string())
            .context("clipboard write failed")?;
        Ok(())
    })?;

    let mut payload = EventPayload::new();
    payload.insert("url".to_string(), Value::String(url.to_string()));
    events.emit(EventKind::LinkCopied, payload)?;
    Ok(())
}

/// Terminal stand-in for an OS share sheet: prints the URL and copies it
/// to the clipboard. A clipboard failure degrades to print-only instead of
/// erroring.
pub fn share(events: &EventWriter, url: &str) -> Result<ShareOutcome> {
    let outcome = match copy_link(events, url) {
        Ok(()) => ShareOutcome::CopiedLink,
        Err(_) => ShareOutcome::Printed,
    };

    let mut payload = EventPayload::new();
    payload.insert("url".to_string(), Value::String(url.to_string()));
    payload.insert(
        "outcome".to_string(),
        Value::String(
            match outcome {
                ShareOutcome::CopiedLink => "copied_link",
                ShareOutcome::Printed => "printed",
            }
            .to_string(),
        ),
    );
    events.emit(EventKind::ShareCompleted, payload)?;
    Ok(outcome)
}

fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}
