//! Prompt Composition
//!
//! Part order and punctuation are a compatibility contract: any change
//! moves every seed and checksum downstream.

use crate::camera::CameraRig;
use crate::resolver::ResolvedAssets;
use crate::spec::CameraOverride;
use crate::store::AssetRecord;

const PART_SEPARATOR: &str = ". ";

/// Assembles prompt text around a fixed film-bible header.
#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    film_bible: String,
    rig: CameraRig,
}

impl PromptComposer {
    pub fn new(film_bible: impl Into<String>) -> Self {
        Self {
            film_bible: film_bible.into(),
            rig: CameraRig::default(),
        }
    }

    pub fn film_bible(&self) -> &str {
        &self.film_bible
    }

    /// Compose a resolved spec: header, character, pose, orientation,
    /// wardrobe, scene, lighting, camera.
    pub fn compose(&self, resolved: &ResolvedAssets<'_>) -> String {
        let mut parts = vec![resolved.character.descriptor(), resolved.pose.descriptor()];
        parts.push(resolved.orientation.and_then(AssetRecord::descriptor));
        parts.extend(resolved.wardrobe.iter().map(|w| w.descriptor()));
        parts.push(resolved.scene.descriptor());
        parts.push(resolved.lighting.and_then(AssetRecord::descriptor));

        self.compose_parts(
            parts.into_iter().flatten(),
            camera_framing(Some(resolved.scene)).as_deref(),
            resolved.spec.camera_override.as_ref(),
        )
    }

    /// Join the header, `parts` and the camera clause. Empty parts are dropped.
    pub fn compose_parts<I, S>(
        &self,
        parts: I,
        framing: Option<&str>,
        camera: Option<&CameraOverride>,
    ) -> String
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (rig, framing) = match camera {
            Some(c) => (
                self.rig.clone().with_override(c),
                c.framing.as_deref().or(framing),
            ),
            None => (self.rig.clone(), framing),
        };

        let mut all: Vec<String> = Vec::new();
        all.push(self.film_bible.clone());
        all.extend(parts.into_iter().map(Into::into));
        all.push(rig.clause(framing));

        let joined = all
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(PART_SEPARATOR);
        format!("{}.", joined)
    }
}

/// Free-function form of [`PromptComposer::compose`].
pub fn compose(film_bible: &str, resolved: &ResolvedAssets<'_>) -> String {
    PromptComposer::new(film_bible).compose(resolved)
}

/// A scene's `camera_framing`, flattened, when present and non-empty.
pub fn camera_framing(scene: Option<&AssetRecord>) -> Option<String> {
    scene
        .and_then(|s| s.get("camera_framing"))
        .map(|f| f.flatten())
        .filter(|f| !f.is_empty())
}
