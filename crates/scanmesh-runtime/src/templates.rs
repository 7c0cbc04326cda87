use std::collections::HashMap;
use std::fs;
use std::path::Path;

use scanmesh_classify::{ParseClassError, SemanticClass};
use serde::Deserialize;
use thiserror::Error;

/// Prototype a class submesh is instantiated from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmeshTemplate {
    pub prefab: String,
    pub material: Option<String>,
}

impl SubmeshTemplate {
    pub fn new(prefab: impl Into<String>) -> Self {
        Self {
            prefab: prefab.into(),
            material: None,
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse template config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    UnknownClass(#[from] ParseClassError),
    #[error("class `{class}` is configured twice (`{first}` and `{second}`)")]
    DuplicateClass {
        class: SemanticClass,
        first: String,
        second: String,
    },
}

/// Optional template per semantic class. A class without a template is never
/// materialized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassTemplates {
    slots: [Option<SubmeshTemplate>; SemanticClass::COUNT],
}

impl ClassTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, class: SemanticClass, template: SubmeshTemplate) -> Self {
        self.set(class, Some(template));
        self
    }

    pub fn set(&mut self, class: SemanticClass, template: Option<SubmeshTemplate>) {
        self.slots[class.index()] = template;
    }

    #[inline]
    pub fn get(&self, class: SemanticClass) -> Option<&SubmeshTemplate> {
        self.slots[class.index()].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SemanticClass, &SubmeshTemplate)> {
        SemanticClass::ALL
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(c, t)| t.as_ref().map(|t| (*c, t)))
    }

    pub fn configured_count(&self) -> usize {
        self.slots.iter().filter(|t| t.is_some()).count()
    }

    pub fn from_entries(entries: &HashMap<String, TemplateEntry>) -> Result<Self, TemplateError> {
        // Keys are matched case-insensitively, so two keys can name one class.
        // Sort so the reported pair does not depend on HashMap order.
        let mut entries: Vec<_> = entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let mut keys: [Option<&str>; SemanticClass::COUNT] = Default::default();
        let mut out = ClassTemplates::new();
        for (key, entry) in entries {
            let class: SemanticClass = key.parse()?;
            if let Some(first) = keys[class.index()] {
                return Err(TemplateError::DuplicateClass {
                    class,
                    first: first.to_string(),
                    second: key.clone(),
                });
            }
            keys[class.index()] = Some(key.as_str());
            let template = match entry {
                TemplateEntry::Prefab(prefab) => SubmeshTemplate::new(prefab.clone()),
                TemplateEntry::Detail { prefab, material } => SubmeshTemplate {
                    prefab: prefab.clone(),
                    material: material.clone(),
                },
            };
            out.set(class, Some(template));
        }
        Ok(out)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, TemplateError> {
        let cfg: TemplatesConfig = toml::from_str(toml_str)?;
        Self::from_entries(&cfg.templates)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

// --- Config ---

#[derive(Deserialize, Default)]
pub struct TemplatesConfig {
    #[serde(default)]
    pub templates: HashMap<String, TemplateEntry>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum TemplateEntry {
    // Simple: wall = "WallMesh"
    Prefab(String),
    // Detailed: floor = { prefab = "FloorMesh", material = "floor_grid" }
    Detail {
        prefab: String,
        material: Option<String>,
    },
}
