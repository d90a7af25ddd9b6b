use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use imagine_contracts::events::{EventKind, EventPayload, EventWriter};
use imagine_contracts::models::{ModelRegistry, ModelSelection};
use imagine_contracts::params::{find_ratio, find_style, GenerationParameters, MAX_VARIATIONS};
use imagine_contracts::request::{build_image_url, now_millis, RequestOptions};
use imagine_contracts::store::{HistoryEntry, HistoryStore, VariantRecord};
use imagine_contracts::templates::{find_template, TemplateMode};
use rand::Rng;
use serde_json::Value;

use crate::{error_chain_text, short_id};

/// One (model, seed) request produced by a generate action.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestVariant {
    pub label: String,
    pub model: String,
    pub seed: i64,
    pub url: String,
}

/// The applied snapshot of one generate action. Owned by the engine until
/// the next run replaces it; draft edits never touch it.
#[derive(Debug, Clone)]
pub struct GenerationRun {
    pub id: String,
    pub parameters: GenerationParameters,
    pub variants: Vec<RequestVariant>,
    pub bust_base: u64,
}

impl GenerationRun {
    pub fn primary(&self) -> &RequestVariant {
        &self.variants[0]
    }

    pub fn variant_by_label(&self, label: &str) -> Option<&RequestVariant> {
        self.variants.iter().find(|variant| variant.label == label)
    }
}

/// Top-level coordinator: owns the draft parameters, the applied run, the
/// history store and the model registry.
pub struct StudioEngine {
    base: String,
    draft: GenerationParameters,
    applied: Option<GenerationRun>,
    history: HistoryStore,
    registry: ModelRegistry,
    events: EventWriter,
}

impl StudioEngine {
    pub fn new(base: String, history: HistoryStore, events: EventWriter) -> Self {
        Self {
            base,
            draft: GenerationParameters::default(),
            applied: None,
            history,
            registry: ModelRegistry::default(),
            events,
        }
    }

    pub fn draft(&self) -> &GenerationParameters {
        &self.draft
    }

    pub fn applied(&self) -> Option<&GenerationRun> {
        self.applied.as_ref()
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventWriter {
        &self.events
    }

    // Draft editing. None of these touch the applied snapshot.

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.draft.prompt = prompt.into();
    }

    pub fn use_prompt(&mut self, prompt: impl Into<String>) {
        self.draft.prompt = prompt.into();
    }

    /// Selects a model through the registry; an unknown id falls back to
    /// the default and the selection reports why.
    pub fn set_model(&mut self, requested: &str) -> Result<ModelSelection> {
        let selection = self
            .registry
            .select(Some(requested))
            .map_err(|reason| anyhow::anyhow!(reason))?;
        self.draft.model = selection.model.id.clone();
        Ok(selection)
    }

    pub fn set_seed(&mut self, seed: i64) {
        self.draft.seed = seed;
    }

    pub fn set_seed_locked(&mut self, locked: bool) {
        self.draft.seed_locked = locked;
    }

    pub fn toggle_seed_lock(&mut self) -> bool {
        self.draft.seed_locked = !self.draft.seed_locked;
        self.draft.seed_locked
    }

    pub fn randomize_seed(&mut self) -> i64 {
        self.draft.seed = rand::rng().random_range(0..10_000);
        self.draft.seed
    }

    pub fn set_ratio(&mut self, id: &str) -> Result<()> {
        let Some(ratio) = find_ratio(id) else {
            bail!("unknown aspect ratio '{id}'");
        };
        self.draft.ratio = ratio.id.to_string();
        self.draft.width = ratio.width;
        self.draft.height = ratio.height;
        Ok(())
    }

    pub fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            bail!("dimensions must be positive");
        }
        self.draft.width = width;
        self.draft.height = height;
        self.draft.ratio = "custom".to_string();
        Ok(())
    }

    pub fn set_style(&mut self, id: Option<&str>) -> Result<()> {
        match id {
            None => self.draft.style = None,
            Some(id) => {
                if find_style(id).is_none() {
                    bail!("unknown style '{id}'");
                }
                self.draft.style = Some(id.to_string());
            }
        }
        Ok(())
    }

    pub fn set_toggle(&mut self, name: &str, state: bool) -> Result<()> {
        match name {
            "nologo" => self.draft.nologo = state,
            "enhance" => self.draft.enhance = state,
            "safe" => self.draft.safe = state,
            _ => bail!("unknown toggle '{name}'"),
        }
        Ok(())
    }

    pub fn set_steps(&mut self, steps: Option<u32>) {
        self.draft.steps = steps;
    }

    pub fn set_strength(&mut self, strength: Option<f64>) {
        self.draft.strength = strength;
    }

    pub fn set_variations(&mut self, count: u32) -> u32 {
        self.draft.variations = GenerationParameters::clamp_variations(count);
        self.draft.variations
    }

    pub fn set_compare_model(&mut self, model: Option<&str>) -> Result<()> {
        match model {
            None => self.draft.compare_model = None,
            Some(id) => {
                if self.registry.get(id).is_none() {
                    bail!("unknown model '{id}'");
                }
                self.draft.compare_model = Some(id.to_string());
            }
        }
        Ok(())
    }

    /// Runs one generate action: validates the prompt, resolves the seed,
    /// fans the variant set out over models and seeds, applies the
    /// resolved parameters as the active snapshot and records history.
    pub fn generate(&mut self, bust: Option<u64>) -> Result<&GenerationRun> {
        if self.draft.prompt.trim().is_empty() {
            bail!("enter a prompt to generate");
        }

        if !self.draft.seed_locked {
            self.draft.seed = rand::rng().random_range(0..10_000);
        }
        let resolved = self.draft.clone();
        let prompt = resolved.effective_prompt();

        let mut models = vec![resolved.model.clone()];
        if let Some(compare) = resolved.compare_model.clone() {
            models.push(compare);
        }
        let ab_mode = models.len() > 1;

        // All variants in one run share a bust base, offset by position so
        // URLs stay unique while the request order remains stable.
        let bust_base = bust.unwrap_or_else(now_millis);
        let mut variants = Vec::new();
        for (model_index, model) in models.iter().enumerate() {
            for variation in 0..resolved.variations.min(MAX_VARIATIONS) {
                let seed = resolved.seed + i64::from(variation);
                let position = variants.len() as u64;
                let label = if ab_mode {
                    let side = if model_index == 0 { "A" } else { "B" };
                    format!("{side}-{seed}")
                } else {
                    format!("v{}", variation + 1)
                };
                let opts = RequestOptions {
                    width: Some(resolved.width),
                    height: Some(resolved.height),
                    seed: Some(seed),
                    model: Some(model.clone()),
                    nologo: Some(resolved.nologo),
                    enhance: Some(resolved.enhance),
                    safe: Some(resolved.safe),
                    steps: resolved.steps,
                    strength: resolved.strength,
                };
                let url = build_image_url(&self.base, &prompt, &opts, Some(bust_base + position))
                    .context("variant URL build failed")?;
                variants.push(RequestVariant {
                    label,
                    model: model.clone(),
                    seed,
                    url: url.to_string(),
                });
            }
        }

        let run = GenerationRun {
            id: short_id(),
            parameters: resolved.clone(),
            variants,
            bust_base,
        };

        let entry = HistoryEntry {
            id: run.id.clone(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            url: run.primary().url.clone(),
            variants: run
                .variants
                .iter()
                .map(|variant| VariantRecord {
                    label: variant.label.clone(),
                    model: variant.model.clone(),
                    seed: variant.seed,
                    url: variant.url.clone(),
                })
                .collect(),
            parameters: resolved.clone(),
        };
        // History is a convenience, never a gate: a failed persist leaves
        // the entry in memory and the run completes anyway.
        if let Err(err) = self.history.push(entry) {
            self.report_history_failure(&err);
        }

        let mut payload = EventPayload::new();
        payload.insert("run_id".to_string(), Value::String(run.id.clone()));
        payload.insert("model".to_string(), Value::String(resolved.model.clone()));
        payload.insert("seed".to_string(), Value::from(resolved.seed));
        payload.insert("variants".to_string(), Value::from(run.variants.len()));
        self.events.emit(EventKind::GenerationCompleted, payload)?;

        Ok(self.applied.insert(run))
    }

    /// Loads a history entry (newest-first index) back into the draft.
    /// The seed is locked so the remix reproduces; toggles keep their
    /// current draft values.
    pub fn remix(&mut self, index: usize) -> Result<()> {
        let Some(entry) = self.history.get(index) else {
            bail!("no history entry at index {index}");
        };
        let params = entry.parameters.clone();
        self.draft.prompt = params.prompt;
        self.draft.model = params.model;
        self.draft.seed = params.seed;
        self.draft.seed_locked = true;
        self.draft.width = params.width;
        self.draft.height = params.height;
        self.draft.ratio = params.ratio;
        self.draft.style = params.style;
        Ok(())
    }

    /// Fills a prompt template and replaces or comma-appends the draft
    /// prompt. Returns the resulting prompt text.
    pub fn apply_template(
        &mut self,
        id: &str,
        values: &std::collections::BTreeMap<String, String>,
        mode: TemplateMode,
    ) -> Result<String> {
        let Some(template) = find_template(id) else {
            bail!("unknown template '{id}'");
        };
        let filled = template.fill(values)?;
        let next = match mode {
            TemplateMode::Replace => filled,
            TemplateMode::Append => {
                let current = self.draft.prompt.trim();
                if current.is_empty() {
                    filled
                } else {
                    format!("{current}, {filled}")
                }
            }
        };
        self.draft.prompt = next.clone();

        let mut payload = EventPayload::new();
        payload.insert("template".to_string(), Value::String(id.to_string()));
        payload.insert(
            "mode".to_string(),
            Value::String(
                match mode {
                    TemplateMode::Replace => "replace",
                    TemplateMode::Append => "append",
                }
                .to_string(),
            ),
        );
        self.events.emit(EventKind::TemplateApplied, payload)?;
        Ok(next)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_entry(&self, index: usize) -> Option<&HistoryEntry> {
        self.history.get(index)
    }

    /// Clears history in memory always; a failed persist of the removal
    /// is reported to the event log and otherwise ignored.
    pub fn clear_history(&mut self) -> Result<()> {
        if let Err(err) = self.history.clear() {
            self.report_history_failure(&err);
        }
        self.events.emit(EventKind::HistoryCleared, EventPayload::new())?;
        Ok(())
    }

    fn report_history_failure(&self, err: &anyhow::Error) {
        let mut payload = EventPayload::new();
        payload.insert(
            "error".to_string(),
            Value::String(error_chain_text(err, 300)),
        );
        let _ = self.events.emit(EventKind::HistoryWriteFailed, payload);
    }
}

#[cfg(test)]
mod tests {
    use imagine_contracts::store::StateStore;

    use super::*;

    fn engine(dir: &std::path::Path) -> StudioEngine {
        let history = HistoryStore::new(StateStore::open(dir.join("state.json")));
        let events = EventWriter::new(dir.join("events.jsonl"), "session-test");
        StudioEngine::new("https://image.pollinations.ai".to_string(), history, events)
    }

    #[test]
    fn generate_rejects_blank_prompt_without_side_effects() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("   ");

        assert!(studio.generate(Some(1)).is_err());
        assert!(studio.applied().is_none());
        assert!(studio.history().is_empty());
        Ok(())
    }

    #[test]
    fn locked_seed_is_reused_across_generates() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("a red fox");
        studio.set_seed(42);
        studio.set_seed_locked(true);

        let first = studio.generate(Some(1))?.primary().seed;
        let second = studio.generate(Some(2))?.primary().seed;
        assert_eq!(first, 42);
        assert_eq!(second, 42);
        Ok(())
    }

    #[test]
    fn unlocked_seed_redraws_into_the_draft() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("a red fox");
        studio.set_seed_locked(false);

        let mut seeds = std::collections::HashSet::new();
        for bust in 0..5 {
            let run_seed = studio.generate(Some(bust))?.primary().seed;
            assert_eq!(run_seed, studio.draft().seed);
            assert!((0..10_000).contains(&run_seed));
            seeds.insert(run_seed);
        }
        assert!(seeds.len() > 1, "five unlocked runs drew one seed");
        Ok(())
    }

    #[test]
    fn ab_with_four_variations_yields_eight_labeled_variants() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("a red fox");
        studio.set_seed(100);
        studio.set_seed_locked(true);
        studio.set_variations(4);
        studio.set_compare_model(Some("sdxl"))?;

        let run = studio.generate(Some(7))?;
        assert_eq!(run.variants.len(), 8);

        let labels: Vec<&str> = run
            .variants
            .iter()
            .map(|variant| variant.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec!["A-100", "A-101", "A-102", "A-103", "B-100", "B-101", "B-102", "B-103"]
        );

        let urls: std::collections::HashSet<&str> = run
            .variants
            .iter()
            .map(|variant| variant.url.as_str())
            .collect();
        assert_eq!(urls.len(), 8);

        for (position, variant) in run.variants.iter().enumerate() {
            assert!(variant.url.contains(&format!("bust={}", 7 + position)));
        }
        Ok(())
    }

    #[test]
    fn single_model_variants_use_ordinal_labels() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("a red fox");
        studio.set_seed(5);
        studio.set_seed_locked(true);
        studio.set_variations(3);

        let run = studio.generate(Some(1))?;
        let labels: Vec<&str> = run
            .variants
            .iter()
            .map(|variant| variant.label.as_str())
            .collect();
        assert_eq!(labels, vec!["v1", "v2", "v3"]);
        assert_eq!(
            run.variants.iter().map(|v| v.seed).collect::<Vec<_>>(),
            vec![5, 6, 7]
        );
        Ok(())
    }

    #[test]
    fn draft_edits_never_perturb_the_applied_run() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("a red fox");
        studio.set_seed(9);
        studio.set_seed_locked(true);
        studio.generate(Some(1))?;

        studio.set_prompt("something else entirely");
        studio.set_seed(999);
        studio.set_ratio("wide")?;

        let applied = studio.applied().expect("applied run");
        assert_eq!(applied.parameters.prompt, "a red fox");
        assert_eq!(applied.parameters.seed, 9);
        assert_eq!(applied.parameters.width, 1024);
        Ok(())
    }

    #[test]
    fn generate_records_history_with_variants() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("a red fox");
        studio.set_seed(3);
        studio.set_seed_locked(true);
        studio.set_variations(2);
        studio.generate(Some(1))?;

        assert_eq!(studio.history().len(), 1);
        let entry = studio.history_entry(0).expect("entry");
        assert_eq!(entry.variants.len(), 2);
        assert_eq!(entry.url, studio.applied().expect("run").primary().url);
        Ok(())
    }

    #[test]
    fn style_is_appended_at_generation_only() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("a red fox");
        studio.set_style(Some("anime"))?;
        studio.set_seed_locked(true);

        let run = studio.generate(Some(1))?;
        assert!(run.primary().url.contains("anime%20style"));
        assert_eq!(studio.draft().prompt, "a red fox");
        Ok(())
    }

    #[test]
    fn remix_restores_and_locks_the_seed() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("first prompt");
        studio.set_seed(77);
        studio.set_seed_locked(true);
        studio.set_ratio("portrait")?;
        studio.generate(Some(1))?;

        studio.set_prompt("second prompt");
        studio.set_seed_locked(false);
        studio.set_ratio("wide")?;
        studio.generate(Some(2))?;

        // Index 1 is the older run.
        studio.remix(1)?;
        assert_eq!(studio.draft().prompt, "first prompt");
        assert_eq!(studio.draft().seed, 77);
        assert!(studio.draft().seed_locked);
        assert_eq!(studio.draft().ratio, "portrait");
        assert_eq!(studio.draft().width, 896);

        assert!(studio.remix(10).is_err());
        Ok(())
    }

    #[test]
    fn template_modes_replace_or_append() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("a red fox");

        let values: std::collections::BTreeMap<String, String> =
            [("subject", "a knight"), ("mood", "soft")]
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();

        let appended = studio.apply_template("portrait", &values, TemplateMode::Append)?;
        assert_eq!(
            appended,
            "a red fox, portrait of a knight, soft lighting, detailed face"
        );

        let replaced = studio.apply_template("portrait", &values, TemplateMode::Replace)?;
        assert_eq!(replaced, "portrait of a knight, soft lighting, detailed face");
        assert_eq!(studio.draft().prompt, replaced);
        Ok(())
    }

    #[test]
    fn set_model_falls_back_through_the_registry() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        let selection = studio.set_model("not-a-model")?;
        assert_eq!(studio.draft().model, "flux");
        assert!(selection.fallback_reason.is_some());

        studio.set_model("sdxl")?;
        assert_eq!(studio.draft().model, "sdxl");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn generate_completes_when_history_cannot_persist() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir()?;
        let sealed = temp.path().join("sealed");
        std::fs::create_dir(&sealed)?;
        std::fs::set_permissions(&sealed, std::fs::Permissions::from_mode(0o555))?;

        let history = HistoryStore::new(StateStore::open(sealed.join("state.json")));
        let events = EventWriter::new(temp.path().join("events.jsonl"), "session-test");
        let mut studio =
            StudioEngine::new("https://image.pollinations.ai".to_string(), history, events);
        studio.set_prompt("a red fox");

        let run_id = studio.generate(Some(1))?.id.clone();
        assert!(studio.applied().is_some());
        // The entry still lands in memory for /history and /remix.
        assert_eq!(studio.history().len(), 1);
        assert_eq!(
            studio.history_entry(0).map(|entry| entry.id.as_str()),
            Some(run_id.as_str())
        );

        studio.clear_history()?;
        assert!(studio.history().is_empty());

        std::fs::set_permissions(&sealed, std::fs::Permissions::from_mode(0o755))?;
        Ok(())
    }

    #[test]
    fn clear_history_empties_the_store() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = engine(temp.path());
        studio.set_prompt("a red fox");
        studio.generate(Some(1))?;
        studio.clear_history()?;
        assert!(studio.history().is_empty());
        Ok(())
    }
}
