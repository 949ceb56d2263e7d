//! PdfEngine entry point

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use shared_types::CaseSummary;

use crate::error::{FormEngineError, Result};
use crate::field_map::PdfFieldMap;
use crate::fonts::CjkFont;
use crate::registry::TemplateRegistry;
use crate::render::fill_template;

/// Directory under the templates root holding font files named by field maps
pub const FONTS_DIR: &str = "fonts";

/// Renders case summaries onto registered templates.
///
/// Field maps and fonts are loaded on first use and cached for the life of
/// the engine; template PDFs are read on every render.
pub struct PdfEngine {
    registry: TemplateRegistry,
    cjk_font: Option<PathBuf>,
    field_maps: Mutex<HashMap<String, Arc<PdfFieldMap>>>,
    fonts: Mutex<HashMap<Option<PathBuf>, Arc<CjkFont>>>,
}

impl PdfEngine {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self {
            registry,
            cjk_font: None,
            field_maps: Mutex::new(HashMap::new()),
            fonts: Mutex::new(HashMap::new()),
        }
    }

    /// Use this TrueType file for CJK text instead of the field map's font
    pub fn with_cjk_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.cjk_font = Some(path.into());
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn field_map(&self, template_id: &str) -> Result<Arc<PdfFieldMap>> {
        let info = self.registry.get(template_id)?;
        let mut cache = self.field_maps.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(map) = cache.get(template_id) {
            return Ok(Arc::clone(map));
        }

        let map = Arc::new(PdfFieldMap::load(&info.field_map_path)?);
        tracing::info!(
            template = template_id,
            fields = map.fields.len(),
            "Loaded field map"
        );
        cache.insert(template_id.to_string(), Arc::clone(&map));
        Ok(map)
    }

    fn font_path(&self, map: &PdfFieldMap) -> Option<PathBuf> {
        self.cjk_font.clone().or_else(|| {
            (!map.font.is_empty()).then(|| self.registry.root().join(FONTS_DIR).join(&map.font))
        })
    }

    fn cjk_font(&self, map: &PdfFieldMap) -> Arc<CjkFont> {
        let path = self.font_path(map);
        let mut cache = self.fonts.lock().unwrap_or_else(|e| e.into_inner());
        let font = cache
            .entry(path)
            .or_insert_with_key(|path| Arc::new(CjkFont::load(path.as_deref())));
        Arc::clone(font)
    }

    /// Render into memory
    pub fn render_to_bytes(&self, template_id: &str, summary: &CaseSummary) -> Result<Vec<u8>> {
        let info = self.registry.get(template_id)?;
        let map = self.field_map(template_id)?;
        let template = std::fs::read(&info.template_path).map_err(|e| {
            FormEngineError::TemplateLoad(format!("{}: {}", info.template_path.display(), e))
        })?;
        let font = self.cjk_font(&map);

        fill_template(&template, &map, summary, &font)
    }

    /// Render and write to `output_path`, creating parent directories
    pub fn generate_pdf(
        &self,
        template_id: &str,
        summary: &CaseSummary,
        output_path: &Path,
    ) -> Result<Vec<u8>> {
        let bytes = self.render_to_bytes(template_id, summary)?;
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, &bytes)?;

        tracing::info!(
            template = template_id,
            output = %output_path.display(),
            bytes = bytes.len(),
            "Generated PDF"
        );
        Ok(bytes)
    }
}
