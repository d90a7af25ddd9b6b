use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use url::Url;

/// Optional query parameters accepted by the generation endpoint.
///
/// A `None` field is omitted from the URL entirely; the endpoint treats
/// missing and default-valued parameters differently, so empty `param=`
/// forms are never emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub seed: Option<i64>,
    pub model: Option<String>,
    pub nologo: Option<bool>,
    pub enhance: Option<bool>,
    pub safe: Option<bool>,
    pub steps: Option<u32>,
    pub strength: Option<f64>,
}

/// Builds a generation request URL: the trimmed prompt becomes a single
/// percent-encoded path segment under `/prompt/`, each defined option
/// becomes one query pair in a fixed order, and a `bust` pair is always
/// appended last to defeat intermediate caches.
///
/// Identical inputs (including an explicit `bust`) produce byte-identical
/// URLs; only the default wall-clock bust token makes the output vary.
pub fn build_image_url(
    base: &str,
    prompt: &str,
    opts: &RequestOptions,
    bust: Option<u64>,
) -> Result<Url> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        bail!("prompt is empty");
    }

    let mut url =
        Url::parse(base).with_context(|| format!("invalid generation API base ({base})"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("generation API base cannot carry a path ({base})"))?
        .pop_if_empty()
        .push("prompt")
        .push(prompt);

    {
        let mut query = url.query_pairs_mut();
        if let Some(width) = opts.width {
            query.append_pair("width", &width.to_string());
        }
        if let Some(height) = opts.height {
            query.append_pair("height", &height.to_string());
        }
        if let Some(seed) = opts.seed {
            query.append_pair("seed", &seed.to_string());
        }
        if let Some(model) = opts.model.as_deref() {
            query.append_pair("model", model);
        }
        if let Some(nologo) = opts.nologo {
            query.append_pair("nologo", if nologo { "true" } else { "false" });
        }
        if let Some(enhance) = opts.enhance {
            query.append_pair("enhance", if enhance { "true" } else { "false" });
        }
        if let Some(safe) = opts.safe {
            query.append_pair("safe", if safe { "true" } else { "false" });
        }
        if let Some(steps) = opts.steps {
            query.append_pair("steps", &steps.to_string());
        }
        if let Some(strength) = opts.strength {
            query.append_pair("strength", &strength.to_string());
        }
        query.append_pair("bust", &bust.unwrap_or_else(now_millis).to_string());
    }

    Ok(url)
}

/// Wall-clock milliseconds since the Unix epoch, used for default bust
/// tokens.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://image.pollinations.ai";

    fn query_pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn build_encodes_prompt_as_path_segment() -> Result<()> {
        let url = build_image_url(BASE, "a red fox", &RequestOptions::default(), Some(7))?;
        assert_eq!(url.path(), "/prompt/a%20red%20fox");
        Ok(())
    }

    #[test]
    fn build_omits_undefined_options() -> Result<()> {
        let opts = RequestOptions {
            width: Some(1024),
            height: Some(1024),
            seed: Some(42),
            model: Some("flux".to_string()),
            ..RequestOptions::default()
        };
        let url = build_image_url(BASE, "a red fox", &opts, Some(99))?;
        assert_eq!(
            query_pairs(&url),
            vec![
                ("width".to_string(), "1024".to_string()),
                ("height".to_string(), "1024".to_string()),
                ("seed".to_string(), "42".to_string()),
                ("model".to_string(), "flux".to_string()),
                ("bust".to_string(), "99".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn build_carries_only_bust_when_no_options_set() -> Result<()> {
        let url = build_image_url(BASE, "fox", &RequestOptions::default(), Some(1))?;
        assert_eq!(
            query_pairs(&url),
            vec![("bust".to_string(), "1".to_string())]
        );
        Ok(())
    }

    #[test]
    fn build_is_deterministic_with_explicit_bust() -> Result<()> {
        let opts = RequestOptions {
            seed: Some(7),
            model: Some("sdxl".to_string()),
            nologo: Some(true),
            ..RequestOptions::default()
        };
        let first = build_image_url(BASE, "  padded prompt  ", &opts, Some(123))?;
        let second = build_image_url(BASE, "padded prompt", &opts, Some(123))?;
        assert_eq!(first.as_str(), second.as_str());
        Ok(())
    }

    #[test]
    fn build_encodes_booleans_as_words() -> Result<()> {
        let opts = RequestOptions {
            nologo: Some(true),
            enhance: Some(false),
            safe: Some(true),
            ..RequestOptions::default()
        };
        let url = build_image_url(BASE, "fox", &opts, Some(1))?;
        let query = url.query().unwrap_or("");
        assert!(query.contains("nologo=true"));
        assert!(query.contains("enhance=false"));
        assert!(query.contains("safe=true"));
        Ok(())
    }

    #[test]
    fn prompt_round_trips_through_encoding() -> Result<()> {
        let prompt = "50% cotton & silk? a/b #test";
        let url = build_image_url(BASE, prompt, &RequestOptions::default(), Some(1))?;
        let segment = url
            .path_segments()
            .and_then(|mut segments| segments.nth(1))
            .unwrap_or("");
        let decoded = percent_decode(segment);
        assert_eq!(decoded, prompt);
        Ok(())
    }

    #[test]
    fn build_rejects_blank_prompt() {
        assert!(build_image_url(BASE, "   ", &RequestOptions::default(), Some(1)).is_err());
    }

    fn percent_decode(value: &str) -> String {
        let mut out = Vec::new();
        let bytes = value.as_bytes();
        let mut index = 0;
        while index < bytes.len() {
            if bytes[index] == b'%' && index + 2 < bytes.len() {
                let hex = &value[index + 1..index + 3];
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    index += 3;
                    continue;
                }
            }
            out.push(bytes[index]);
            index += 1;
        }
        String::from_utf8_lossy(&out).to_string()
    }
}
