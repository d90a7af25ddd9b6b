use std::env;
use std::path::PathBuf;

pub mod feed;
pub mod loader;
pub mod retry;
pub mod studio;
pub mod transfer;

pub const DEFAULT_API_BASE: &str = "https://image.pollinations.ai";
pub const DEFAULT_STATE_DIR: &str = ".imagine";

/// Base URL of the generation endpoint, `IMAGINE_API_BASE` when set.
pub fn api_base() -> String {
    non_empty_env("IMAGINE_API_BASE")
        .map(|value| value.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

/// URL of the live feed stream, `IMAGINE_FEED_URL` when set.
pub fn feed_url() -> String {
    non_empty_env("IMAGINE_FEED_URL").unwrap_or_else(|| format!("{}/feed", api_base()))
}

/// Directory holding `state.json` and `events.jsonl`. An explicit override
/// (the `--state-dir` flag) wins over `IMAGINE_STATE_DIR`.
pub fn state_dir(override_dir: Option<&std::path::Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    non_empty_env("IMAGINE_STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
}

/// Short display form of a v4 UUID.
pub fn short_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id.chars().take(8).collect()
}

pub fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" -> "), max_chars)
}

pub fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
