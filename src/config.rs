//! Engine configuration.
//!
//! Every field has a default matching the standard project layout, so an
//! absent or partial config file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_tenner_dir")]
    pub tenner_dir: PathBuf,
    #[serde(default = "default_film_bible_path")]
    pub film_bible_path: PathBuf,
    #[serde(default = "default_chunks_path")]
    pub chunks_path: PathBuf,
    #[serde(default = "default_skeletons_path")]
    pub skeletons_path: PathBuf,
    #[serde(default = "default_tenner32_path")]
    pub tenner32_path: PathBuf,
    #[serde(default = "default_film_bible_version")]
    pub film_bible_version: String,
    #[serde(default = "default_lexicon_version")]
    pub lexicon_version: String,
    #[serde(default = "default_model_profile")]
    pub default_model_profile: String,
    #[serde(default = "default_bundle_version")]
    pub bundle_version: String,
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_tenner_dir() -> PathBuf { PathBuf::from("data/tenner_32") }
fn default_film_bible_path() -> PathBuf { PathBuf::from("film_bible/header@1.0.0.txt") }
fn default_chunks_path() -> PathBuf {
    PathBuf::from("data/tenner_chunks/Improved_Tenner_List_v3_TENNER_CHUNKS.json")
}
fn default_skeletons_path() -> PathBuf {
    PathBuf::from("data/Improved_Tenner_List_v3_CHUNK_SKELETON.json")
}
fn default_tenner32_path() -> PathBuf { PathBuf::from("Improved_Tenner_List_v3.json") }
fn default_film_bible_version() -> String { "film_bible@1.0.0".to_string() }
fn default_lexicon_version() -> String { "lexicon@v1".to_string() }
fn default_model_profile() -> String { "t2i_model_x@0.9".to_string() }
fn default_bundle_version() -> String { "1.0.0".to_string() }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            tenner_dir: default_tenner_dir(),
            film_bible_path: default_film_bible_path(),
            chunks_path: default_chunks_path(),
            skeletons_path: default_skeletons_path(),
            tenner32_path: default_tenner32_path(),
            film_bible_version: default_film_bible_version(),
            lexicon_version: default_lexicon_version(),
            default_model_profile: default_model_profile(),
            bundle_version: default_bundle_version(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve every relative path against `root`.
    pub fn resolve(mut self, root: &Path) -> Self {
        for path in [
            &mut self.data_dir,
            &mut self.tenner_dir,
            &mut self.film_bible_path,
            &mut self.chunks_path,
            &mut self.skeletons_path,
            &mut self.tenner32_path,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    /// The film-bible header, trimmed. Empty when the file is absent.
    pub fn film_bible_text(&self) -> Result<String> {
        if !self.film_bible_path.exists() {
            debug!(path = %self.film_bible_path.display(), "film bible absent");
            return Ok(String::new());
        }
        Ok(fs::read_to_string(&self.film_bible_path)?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"lexicon_version": "lexicon@v2"}"#).unwrap();
        assert_eq!(config.lexicon_version, "lexicon@v2");
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_resolve_and_film_bible() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(&dir.path().join("missing.json"))
            .unwrap()
            .resolve(dir.path());
        assert_eq!(config.data_dir, dir.path().join("data"));
        assert_eq!(config.film_bible_text().unwrap(), "");

        fs::create_dir_all(dir.path().join("film_bible")).unwrap();
        fs::write(&config.film_bible_path, "  FILM BIBLE\n").unwrap();
        assert_eq!(config.film_bible_text().unwrap(), "FILM BIBLE");
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(EngineConfig::load(&path), Err(EngineError::Config(_))));
    }
}
