//! Template registry and metadata

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FormEngineError, Result};

pub const TEMPLATE_FILE: &str = "template.pdf";
pub const FIELD_MAP_FILE: &str = "fieldMap.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateKind {
    DeregForm,
    Invoice,
}

/// Information about an available template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    /// Template id (directory name under the templates root)
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub kind: TemplateKind,
    pub template_path: PathBuf,
    pub field_map_path: PathBuf,
}

impl TemplateInfo {
    /// Template laid out as `<root>/<id>/template.pdf` + `fieldMap.json`
    pub fn in_root(root: &Path, id: &str, name: &str, kind: TemplateKind) -> Self {
        let dir = root.join(id);
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            template_path: dir.join(TEMPLATE_FILE),
            field_map_path: dir.join(FIELD_MAP_FILE),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    root: PathBuf,
    templates: BTreeMap<String, TemplateInfo>,
}

impl TemplateRegistry {
    /// Registry with the built-in templates under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut registry = Self::empty(root.clone());
        registry.register(TemplateInfo::in_root(
            &root,
            "dereg_form",
            "자동차 말소등록 신청서",
            TemplateKind::DeregForm,
        ));
        registry.register(TemplateInfo::in_root(&root, "invoice", "인보이스", TemplateKind::Invoice));
        registry
    }

    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            templates: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add or replace a template
    pub fn register(&mut self, info: TemplateInfo) {
        self.templates.insert(info.id.clone(), info);
    }

    pub fn get(&self, id: &str) -> Result<&TemplateInfo> {
        self.templates
            .get(id)
            .ok_or_else(|| FormEngineError::TemplateNotFound(id.to_string()))
    }

    /// List all available templates
    pub fn list(&self) -> Vec<&TemplateInfo> {
        self.templates.values().collect()
    }
}
