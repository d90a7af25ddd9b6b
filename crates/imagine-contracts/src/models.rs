use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: String,
    pub label: String,
}

/// The generation models the endpoint accepts, in display order.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModelSpec> {
        self.models.get(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn default_model(&self) -> Option<&ModelSpec> {
        self.models.values().next()
    }

    /// Resolves a requested model id, falling back to the default model
    /// with a human-readable reason when the request cannot be honored.
    pub fn select(&self, requested: Option<&str>) -> Result<ModelSelection, String> {
        let (fallback_reason, requested_text) = if let Some(requested_id) = requested {
            if let Some(model) = self.get(requested_id) {
                return Ok(ModelSelection {
                    model: model.clone(),
                    requested: Some(requested_id.to_string()),
                    fallback_reason: None,
                });
            }
            (
                Some(format!("Requested model '{requested_id}' is not available.")),
                Some(requested_id.to_string()),
            )
        } else {
            (None, None)
        };

        let Some(model) = self.default_model().cloned() else {
            return Err("No models registered.".to_string());
        };
        Ok(ModelSelection {
            model,
            requested: requested_text,
            fallback_reason,
        })
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |id: &str, label: &str| {
        map.insert(
            id.to_string(),
            ModelSpec {
                id: id.to_string(),
                label: label.to_string(),
            },
        );
    };

    insert("flux", "Flux");
    insert("flux-dev", "Flux Dev");
    insert("playground-v2.5", "Playground v2.5");
    insert("sdxl", "SDXL");

    map
}
