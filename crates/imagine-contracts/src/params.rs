use serde::{Deserialize, Serialize};

pub const DEFAULT_PROMPT: &str =
    "A futuristic city with flying cars and neon lights, ultra-detailed, cinematic lighting, wide angle";
pub const DEFAULT_MODEL: &str = "flux";
pub const DEFAULT_SEED: i64 = 42;
pub const MAX_VARIATIONS: u32 = 4;

/// The user-editable generation settings. Drafts are mutated freely by the
/// UI; a generation run snapshots them so later edits never perturb an
/// in-flight or completed render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub prompt: String,
    pub model: String,
    pub seed: i64,
    pub seed_locked: bool,
    pub width: u32,
    pub height: u32,
    pub ratio: String,
    pub style: Option<String>,
    pub nologo: bool,
    pub enhance: bool,
    pub safe: bool,
    pub steps: Option<u32>,
    pub strength: Option<f64>,
    pub variations: u32,
    pub compare_model: Option<String>,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            seed: DEFAULT_SEED,
            seed_locked: false,
            width: 1024,
            height: 1024,
            ratio: "square".to_string(),
            style: None,
            nologo: true,
            enhance: false,
            safe: true,
            steps: None,
            strength: None,
            variations: 1,
            compare_model: None,
        }
    }
}

impl GenerationParameters {
    /// The prompt actually submitted: the draft prompt plus the selected
    /// style descriptor, comma-joined. The stored prompt is never mutated.
    pub fn effective_prompt(&self) -> String {
        let style_suffix = self
            .style
            .as_deref()
            .and_then(find_style)
            .map(|preset| preset.descriptor);
        match style_suffix {
            Some(descriptor) => format!("{}, {}", self.prompt.trim(), descriptor),
            None => self.prompt.trim().to_string(),
        }
    }

    pub fn clamp_variations(count: u32) -> u32 {
        count.clamp(1, MAX_VARIATIONS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub id: &'static str,
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

pub const ASPECT_RATIOS: &[AspectRatio] = &[
    AspectRatio {
        id: "square",
        label: "1:1",
        width: 1024,
        height: 1024,
    },
    AspectRatio {
        id: "portrait",
        label: "3:4",
        width: 896,
        height: 1152,
    },
    AspectRatio {
        id: "landscape",
        label: "4:3",
        width: 1152,
        height: 896,
    },
    AspectRatio {
        id: "wide",
        label: "16:9",
        width: 1344,
        height: 768,
    },
];

pub fn find_ratio(id: &str) -> Option<AspectRatio> {
    ASPECT_RATIOS
        .iter()
        .find(|ratio| ratio.id == id)
        .copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub id: &'static str,
    pub label: &'static str,
    pub descriptor: &'static str,
}

pub const STYLE_PRESETS: &[StylePreset] = &[
    StylePreset {
        id: "photoreal",
        label: "Photoreal",
        descriptor: "photorealistic, 50mm lens, natural light, high detail",
    },
    StylePreset {
        id: "anime",
        label: "Anime",
        descriptor: "anime style, cel shading, vibrant colors",
    },
    StylePreset {
        id: "watercolor",
        label: "Watercolor",
        descriptor: "watercolor painting, soft edges, paper texture",
    },
    StylePreset {
        id: "neon",
        label: "Neon",
        descriptor: "neon glow, synthwave palette, night scene",
    },
];

pub fn find_style(id: &str) -> Option<StylePreset> {
    STYLE_PRESETS
        .iter()
        .find(|preset| preset.id == id)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_baseline() {
        let params = GenerationParameters::default();
        assert_eq!(params.model, "flux");
        assert_eq!(params.seed, 42);
        assert!(!params.seed_locked);
        assert_eq!((params.width, params.height), (1024, 1024));
        assert_eq!(params.ratio, "square");
        assert!(params.nologo);
        assert!(!params.enhance);
        assert!(params.safe);
        assert_eq!(params.variations, 1);
        assert!(params.compare_model.is_none());
    }

    #[test]
    fn effective_prompt_appends_style_descriptor() {
        let mut params = GenerationParameters {
            prompt: "a red fox".to_string(),
            ..GenerationParameters::default()
        };
        assert_eq!(params.effective_prompt(), "a red fox");

        params.style = Some("neon".to_string());
        assert_eq!(
            params.effective_prompt(),
            "a red fox, neon glow, synthwave palette, night scene"
        );
        assert_eq!(params.prompt, "a red fox");
    }

    #[test]
    fn unknown_style_leaves_prompt_untouched() {
        let params = GenerationParameters {
            prompt: "a red fox".to_string(),
            style: Some("no-such-style".to_string()),
            ..GenerationParameters::default()
        };
        assert_eq!(params.effective_prompt(), "a red fox");
    }

    #[test]
    fn ratio_lookup_sets_both_dimensions() {
        let wide = find_ratio("wide").expect("wide ratio");
        assert_eq!((wide.width, wide.height), (1344, 768));
        assert!(find_ratio("cinema").is_none());
    }

    #[test]
    fn variations_are_clamped_to_range() {
        assert_eq!(GenerationParameters::clamp_variations(0), 1);
        assert_eq!(GenerationParameters::clamp_variations(3), 3);
        assert_eq!(GenerationParameters::clamp_variations(9), 4);
    }
}
