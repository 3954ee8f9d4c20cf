//! Bundle Factory - Identity and Packaging
//!
//! `assembled_prompt_text`, `seed` and `inputs_checksum` depend only on the
//! spec and the store snapshot. Ids are either content-addressed or carry a
//! generator index; `created_at` is the only wall-clock field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chunk::ChunkMetadata;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::hashing::{derive_seed, inputs_checksum};
use crate::resolver::ResolvedAssets;
use crate::spec::CameraOverride;
use crate::store::AssetRecord;
use crate::tenner::{Tenner32Metadata, TennerMetadata};

/// Reference recorded when a context asset is unavailable.
pub const DEFAULT_REFERENCE: &str = "default@1.0.0";

/// Hex characters of the checksum appended to content-addressed ids.
pub const ID_CHECKSUM_LEN: usize = 12;

/// The resolved spec as recorded in a bundle, with `id@version` references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSnapshot {
    pub film_bible: String,
    pub character: String,
    pub pose: String,
    #[serde(default)]
    pub orientation: Option<String>,
    pub wardrobe: Vec<String>,
    pub props: Vec<String>,
    pub scene: String,
    pub lighting: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub camera_override: Option<CameraOverride>,
}

impl SpecSnapshot {
    pub fn from_resolved(film_bible_version: &str, resolved: &ResolvedAssets<'_>) -> Self {
        Self {
            film_bible: film_bible_version.to_string(),
            character: resolved.character.reference(),
            pose: resolved.pose.reference(),
            orientation: resolved.orientation.map(AssetRecord::reference),
            wardrobe: resolved.wardrobe.iter().map(|w| w.reference()).collect(),
            props: resolved.props.iter().map(|p| p.reference()).collect(),
            scene: resolved.scene.reference(),
            lighting: reference_or_default(resolved.lighting),
            model: resolved.model.map(AssetRecord::reference),
            camera_override: resolved.spec.camera_override.clone(),
        }
    }
}

pub fn reference_or_default(record: Option<&AssetRecord>) -> String {
    record
        .map(AssetRecord::reference)
        .unwrap_or_else(|| DEFAULT_REFERENCE.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub description: String,
    pub tags: Vec<String>,
    pub status: String,
    pub approved: bool,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
}

impl BundleMetadata {
    pub fn pending(description: impl Into<String>, tags: Vec<String>, notes: &str) -> Self {
        Self {
            description: description.into(),
            tags,
            status: "pending".to_string(),
            approved: false,
            notes: notes.to_string(),
            run_id: None,
        }
    }
}

/// The reproducible output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub id: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub spec: SpecSnapshot,
    pub assembled_prompt_text: String,
    pub model_profile: String,
    pub seed: String,
    pub vocabulary_version: String,
    pub inputs_checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenner_metadata: Option<TennerMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenner32_metadata: Option<Tenner32Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_metadata: Option<ChunkMetadata>,
    pub metadata: BundleMetadata,
}

/// How a bundle's id is formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleId {
    /// `{parts joined by _}_{checksum prefix}`.
    ContentAddressed(Vec<String>),
    /// Generator-assigned, index-based id.
    Indexed(String),
}

/// Generator-specific metadata block.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    None,
    Tenner(TennerMetadata),
    Tenner32(Tenner32Metadata),
    Chunk(ChunkMetadata),
}

/// Everything the factory needs besides its own versions.
#[derive(Debug, Clone)]
pub struct BundleDraft<'a> {
    pub id: BundleId,
    pub spec: SpecSnapshot,
    pub prompt_text: String,
    pub model: Option<&'a AssetRecord>,
    pub metadata: BundleMetadata,
    pub extension: Extension,
}

#[derive(Debug, Clone)]
pub struct BundleFactory {
    film_bible_version: String,
    lexicon_version: String,
    bundle_version: String,
    default_model_profile: String,
    run_id: Option<Uuid>,
}

impl BundleFactory {
    pub fn new(film_bible_version: &str, lexicon_version: &str) -> Self {
        Self {
            film_bible_version: film_bible_version.to_string(),
            lexicon_version: lexicon_version.to_string(),
            bundle_version: "1.0.0".to_string(),
            default_model_profile: "t2i_model_x@0.9".to_string(),
            run_id: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            film_bible_version: config.film_bible_version.clone(),
            lexicon_version: config.lexicon_version.clone(),
            bundle_version: config.bundle_version.clone(),
            default_model_profile: config.default_model_profile.clone(),
            run_id: None,
        }
    }

    /// Tag every bundle built by this factory with a fresh run id.
    pub fn with_run_id(mut self) -> Self {
        self.run_id = Some(Uuid::new_v4());
        self
    }

    pub fn film_bible_version(&self) -> &str {
        &self.film_bible_version
    }

    pub fn lexicon_version(&self) -> &str {
        &self.lexicon_version
    }

    /// Build a bundle for a resolved spec with a content-addressed id.
    pub fn build(&self, resolved: &ResolvedAssets<'_>, prompt_text: String) -> Result<Bundle> {
        let id = BundleId::ContentAddressed(
            resolved.spec.identity_parts().into_iter().map(str::to_string).collect(),
        );
        self.build_with_id(resolved, prompt_text, id)
    }

    pub fn build_with_id(
        &self,
        resolved: &ResolvedAssets<'_>,
        prompt_text: String,
        id: BundleId,
    ) -> Result<Bundle> {
        let spec = SpecSnapshot::from_resolved(&self.film_bible_version, resolved);
        let character = resolved.character.id();
        let pose = resolved.pose.id();
        let orientation = resolved.orientation.map(AssetRecord::id).unwrap_or("none");
        let scene = resolved.scene.id();

        let description = format!(
            "Bundle for {} in {} pose, {} orientation",
            character, pose, orientation
        );
        let tags = vec![
            character.to_string(),
            pose.to_string(),
            orientation.to_string(),
            scene.to_string(),
        ];

        self.assemble(BundleDraft {
            id,
            spec,
            prompt_text,
            model: resolved.model,
            metadata: BundleMetadata::pending(description, tags, "Generated by Prompt Assembler"),
            extension: Extension::None,
        })
    }

    /// Derive identity and package a draft.
    pub fn assemble(&self, draft: BundleDraft<'_>) -> Result<Bundle> {
        let checksum = inputs_checksum(&draft.spec)?;
        let seed = derive_seed(&draft.prompt_text);

        let id = match draft.id {
            BundleId::ContentAddressed(parts) => {
                let prefix = &checksum[..ID_CHECKSUM_LEN];
                if parts.is_empty() {
                    prefix.to_string()
                } else {
                    format!("{}_{}", parts.join("_"), prefix)
                }
            }
            BundleId::Indexed(id) => id,
        };

        let model_profile = draft
            .model
            .map(|m| m.id().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.default_model_profile.clone());

        let mut metadata = draft.metadata;
        metadata.run_id = self.run_id;

        let mut bundle = Bundle {
            id,
            version: self.bundle_version.clone(),
            created_at: Utc::now(),
            spec: draft.spec,
            assembled_prompt_text: draft.prompt_text,
            model_profile,
            seed,
            vocabulary_version: self.lexicon_version.clone(),
            inputs_checksum: checksum,
            tenner_metadata: None,
            tenner32_metadata: None,
            chunk_metadata: None,
            metadata,
        };

        match draft.extension {
            Extension::None => {}
            Extension::Tenner(m) => bundle.tenner_metadata = Some(m),
            Extension::Tenner32(m) => bundle.tenner32_metadata = Some(m),
            Extension::Chunk(m) => bundle.chunk_metadata = Some(m),
        }

        Ok(bundle)
    }
}

impl Default for BundleFactory {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::spec::Spec;
    use crate::store::{AssetStore, Category};

    fn store() -> AssetStore {
        AssetStore::default()
            .with(Category::Characters, vec![AssetRecord::new("c1")])
            .with(Category::Poses, vec![AssetRecord::new("p1")])
            .with(Category::Scenes, vec![AssetRecord::new("s1")])
            .with(
                Category::Models,
                vec![AssetRecord::new("sdxl").with("version", "2.0.0")],
            )
    }

    #[test]
    fn test_content_addressed_id() {
        let store = store();
        let resolved = resolve(&Spec::new("c1", "p1", "s1"), &store).unwrap();
        let bundle = BundleFactory::default().build(&resolved, "x.".into()).unwrap();
        assert!(bundle.id.starts_with("c1_p1_s1_"));
        assert_eq!(bundle.id.len(), "c1_p1_s1_".len() + ID_CHECKSUM_LEN);
        assert!(bundle.inputs_checksum.starts_with(&bundle.id["c1_p1_s1_".len()..]));
    }

    #[test]
    fn test_model_profile_fallback() {
        let store = store();
        let mut spec = Spec::new("c1", "p1", "s1");
        let factory = BundleFactory::default();

        let resolved = resolve(&spec, &store).unwrap();
        let bundle = factory.build(&resolved, "x.".into()).unwrap();
        assert_eq!(bundle.model_profile, "t2i_model_x@0.9");
        assert_eq!(bundle.spec.lighting, DEFAULT_REFERENCE);

        spec.model = Some("sdxl".into());
        let resolved = resolve(&spec, &store).unwrap();
        let bundle = factory.build(&resolved, "x.".into()).unwrap();
        assert_eq!(bundle.model_profile, "sdxl");
        assert_eq!(bundle.spec.model.as_deref(), Some("sdxl@2.0.0"));
    }

    #[test]
    fn test_extension_block_serialized_only_when_set() {
        let store = store();
        let resolved = resolve(&Spec::new("c1", "p1", "s1"), &store).unwrap();
        let bundle = BundleFactory::default().build(&resolved, "x.".into()).unwrap();
        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json.get("tenner_metadata").is_none());
        assert!(json.get("chunk_metadata").is_none());
        for field in [
            "id",
            "version",
            "created_at",
            "spec",
            "assembled_prompt_text",
            "model_profile",
            "seed",
            "vocabulary_version",
            "inputs_checksum",
            "metadata",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }
}
