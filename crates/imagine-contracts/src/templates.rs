use std::collections::BTreeMap;

use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMode {
    Replace,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub id: &'static str,
    pub label: &'static str,
    pub pattern: &'static str,
}

pub const PROMPT_TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        id: "portrait",
        label: "Portrait",
        pattern: "portrait of {subject}, {mood} lighting, detailed face",
    },
    PromptTemplate {
        id: "product",
        label: "Product",
        pattern: "studio product shot of {item} on {surface}, softbox lighting",
    },
    PromptTemplate {
        id: "scene",
        label: "Scene",
        pattern: "sweeping landscape of {place} at {time}, volumetric light",
    },
];

pub fn find_template(id: &str) -> Option<PromptTemplate> {
    PROMPT_TEMPLATES
        .iter()
        .find(|template| template.id == id)
        .copied()
}

impl PromptTemplate {
    /// Placeholder names in first-appearance order, deduplicated.
    pub fn fields(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut rest = self.pattern;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open + 1..].find('}') else {
                break;
            };
            let name = &rest[open + 1..open + 1 + close];
            if !name.is_empty() && !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
            rest = &rest[open + 1 + close + 1..];
        }
        names
    }

    /// Substitutes every placeholder; a missing or blank value is an error
    /// naming the field.
    pub fn fill(&self, values: &BTreeMap<String, String>) -> Result<String> {
        let mut text = self.pattern.to_string();
        for name in self.fields() {
            let value = values
                .get(&name)
                .map(|raw| raw.trim())
                .filter(|raw| !raw.is_empty());
            let Some(value) = value else {
                bail!("template '{}' is missing a value for '{name}'", self.id);
            };
            text = text.replace(&format!("{{{name}}}"), value);
        }
        Ok(text)
    }
}
