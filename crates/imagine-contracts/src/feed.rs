use serde::Deserialize;

use crate::request::{build_image_url, RequestOptions};

/// Loose decode of one live-feed payload. Feeds usually carry `url`; older
/// records carry only the generation parameters, so everything is optional
/// and unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedRecord {
    pub url: Option<String>,
    pub prompt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub seed: Option<i64>,
    pub model: Option<String>,
    pub nologo: Option<bool>,
    pub enhance: Option<bool>,
}

/// A normalized feed element. `url` is the deduplication identity.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub url: String,
    pub prompt: Option<String>,
    pub model: Option<String>,
    pub seed: Option<i64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl FeedRecord {
    /// Normalizes the record, deriving a URL from the prompt and known
    /// fields when the record carries none. Derived URLs take no bust
    /// token: they must stay stable so deduplication recognizes repeats.
    /// Records with neither a URL nor a prompt are discarded.
    pub fn into_item(self, base: &str) -> Option<FeedItem> {
        let prompt = self
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let url = match self.url.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            Some(url) => url.to_string(),
            None => {
                let prompt_text = prompt.as_deref()?;
                let opts = RequestOptions {
                    width: self.width,
                    height: self.height,
                    seed: self.seed,
                    model: self.model.clone(),
                    nologo: self.nologo,
                    enhance: self.enhance,
                    ..RequestOptions::default()
                };
                derive_stable_url(base, prompt_text, &opts)?
            }
        };

        Some(FeedItem {
            url,
            prompt,
            model: self.model,
            seed: self.seed,
            width: self.width,
            height: self.height,
        })
    }
}

fn derive_stable_url(base: &str, prompt: &str, opts: &RequestOptions) -> Option<String> {
    let url = build_image_url(base, prompt, opts, Some(0)).ok()?;
    // Strip the mandatory bust pair so repeated records derive identically.
    let query: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "bust")
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let mut stable = url;
    stable.set_query(None);
    if !query.is_empty() {
        let mut pairs = stable.query_pairs_mut();
        for (key, value) in &query {
            pairs.append_pair(key, value);
        }
    }
    Some(stable.to_string())
}
