//! Spec Documents - Symbolic References Before Resolution

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Asset references by id. Has no identity until resolved into a bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Spec {
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub pose: Option<String>,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub scene: Option<String>,
    #[serde(default)]
    pub lighting: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub wardrobe: Vec<String>,
    #[serde(default)]
    pub props: Vec<String>,
    #[serde(default)]
    pub camera_override: Option<CameraOverride>,
}

impl Spec {
    pub fn new(character: &str, pose: &str, scene: &str) -> Self {
        Self {
            character: Some(character.to_string()),
            pose: Some(pose.to_string()),
            scene: Some(scene.to_string()),
            ..Self::default()
        }
    }

    /// Asset ids in bundle-id order: character, pose, orientation, scene, wardrobe.
    pub fn identity_parts(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = [&self.character, &self.pose, &self.orientation, &self.scene]
            .into_iter()
            .filter_map(|r| r.as_deref())
            .collect();
        parts.extend(self.wardrobe.iter().map(String::as_str));
        parts
    }
}

/// Replaces individual entries of the baseline camera clause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "pending".to_string()
}

/// A spec wrapped with its own id and bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecEnvelope {
    pub id: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    pub spec: Spec,
    #[serde(default)]
    pub metadata: SpecMetadata,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` read as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| serde::de::Error::custom(format!("invalid created_at '{}': {}", raw, e)))
}

impl SpecEnvelope {
    /// Stub envelope `spec_{index:04}` for spec composition.
    pub fn numbered(index: usize, spec: Spec) -> Self {
        let character = spec.character.clone().unwrap_or_default();
        let pose = spec.pose.clone().unwrap_or_default();
        let scene = spec.scene.clone().unwrap_or_default();
        Self {
            id: format!("spec_{:04}", index),
            version: default_version(),
            created_at: Utc::now(),
            metadata: SpecMetadata {
                description: format!("Spec for {} in {} pose at {}", character, pose, scene),
                tags: vec![character, pose, scene],
                status: default_status(),
            },
            spec,
        }
    }

    /// File name for the envelope, e.g. `spec_0003_c1_p1_o1_s1.json`.
    pub fn file_name(&self) -> String {
        let mut name = self.id.clone();
        for part in [
            &self.spec.character,
            &self.spec.pose,
            &self.spec.orientation,
            &self.spec.scene,
        ] {
            if let Some(p) = part {
                name.push('_');
                name.push_str(p);
            }
        }
        name.push_str(".json");
        name
    }
}

/// A spec file: either an envelope or a bare spec. An object with a
/// `spec` key is always an envelope, so a malformed envelope is a parse
/// error rather than an empty bare spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SpecDocument {
    Envelope(SpecEnvelope),
    Bare(Spec),
}

impl<'de> Deserialize<'de> for SpecDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let wrapped = value.get("spec").is_some();
        let document = if wrapped {
            serde_json::from_value(value).map(SpecDocument::Envelope)
        } else {
            serde_json::from_value(value).map(SpecDocument::Bare)
        };
        document.map_err(serde::de::Error::custom)
    }
}

impl SpecDocument {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn spec(&self) -> &Spec {
        match self {
            SpecDocument::Envelope(e) => &e.spec,
            SpecDocument::Bare(s) => s,
        }
    }

    pub fn into_spec(self) -> Spec {
        match self {
            SpecDocument::Envelope(e) => e.spec,
            SpecDocument::Bare(s) => s,
        }
    }
}
