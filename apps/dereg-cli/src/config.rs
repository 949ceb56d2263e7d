//! TOML configuration for the CLI
//!
//! Every key has a default, so an empty file (or no file at all) is a valid
//! configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "dereg.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub fonts: FontsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// An explicit path must exist; otherwise `dereg.toml` is used when
    /// present and defaults when not.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory holding `<template_id>/template.pdf` and `fieldMap.json`
    #[serde(default = "default_templates_root")]
    pub root: PathBuf,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            root: default_templates_root(),
        }
    }
}

fn default_templates_root() -> PathBuf {
    PathBuf::from("templates")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontsConfig {
    /// TrueType font for Korean text; overrides the font named by field maps
    #[serde(default)]
    pub cjk: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where `process` writes PDFs when no `--out` is given
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.templates.root, PathBuf::from("templates"));
        assert_eq!(config.fonts.cjk, None);
        assert_eq!(config.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_str(
            r#"
            [templates]
            root = "/srv/dereg/templates"

            [fonts]
            cjk = "/usr/share/fonts/NanumGothic.ttf"

            [output]
            dir = "/var/lib/dereg/pdf"
        "#,
        )
        .unwrap();

        assert_eq!(config.templates.root, PathBuf::from("/srv/dereg/templates"));
        assert_eq!(
            config.fonts.cjk,
            Some(PathBuf::from("/usr/share/fonts/NanumGothic.ttf"))
        );
        assert_eq!(config.output.dir, PathBuf::from("/var/lib/dereg/pdf"));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::from_str("[fonts]\ncjk = \"NanumGothic.ttf\"").unwrap();
        assert_eq!(config.templates.root, PathBuf::from("templates"));
        assert_eq!(config.fonts.cjk, Some(PathBuf::from("NanumGothic.ttf")));
    }

    #[test]
    fn test_malformed_toml_is_error() {
        assert!(Config::from_str("[templates\nroot = 1").is_err());
        assert!(Config::from_str("[templates]\nroot = 1").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/dereg.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"), "Got: {}", err);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dereg.toml");
        fs::write(&path, "[output]\ndir = \"out\"").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }
}
