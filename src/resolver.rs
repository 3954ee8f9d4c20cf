//! Spec Resolution - Symbolic References to Concrete Assets
//!
//! Required references fail hard; wardrobe and props are best-effort.

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::spec::Spec;
use crate::store::{AssetRecord, AssetStore, Category};

/// Concrete assets for one spec. Borrowed from the store snapshot.
#[derive(Debug, Clone)]
pub struct ResolvedAssets<'a> {
    pub spec: Spec,
    pub character: &'a AssetRecord,
    pub pose: &'a AssetRecord,
    pub orientation: Option<&'a AssetRecord>,
    pub scene: &'a AssetRecord,
    pub wardrobe: Vec<&'a AssetRecord>,
    pub props: Vec<&'a AssetRecord>,
    pub lighting: Option<&'a AssetRecord>,
    pub model: Option<&'a AssetRecord>,
}

/// Fixed supporting assets for generator bundles: the first row of each
/// store, when present.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssets<'a> {
    pub pose: Option<&'a AssetRecord>,
    pub scene: Option<&'a AssetRecord>,
    pub lighting: Option<&'a AssetRecord>,
    pub model: Option<&'a AssetRecord>,
}

impl<'a> ContextAssets<'a> {
    pub fn from_store(store: &'a AssetStore) -> Self {
        Self {
            pose: store.first(Category::Poses),
            scene: store.first(Category::Scenes),
            lighting: store.first(Category::Lighting),
            model: store.first(Category::Models),
        }
    }

    pub fn pose_descriptor(&self) -> Option<String> {
        self.pose.and_then(AssetRecord::descriptor)
    }

    pub fn scene_descriptor(&self) -> Option<String> {
        self.scene.and_then(AssetRecord::descriptor)
    }

    pub fn lighting_descriptor(&self) -> Option<String> {
        self.lighting.and_then(AssetRecord::descriptor)
    }
}

/// Resolve every reference of `spec` against `store`.
///
/// Character, pose and scene must be set. Orientation, lighting and model
/// may be null, but a set id that does not resolve is fatal.
pub fn resolve<'a>(spec: &Spec, store: &'a AssetStore) -> Result<ResolvedAssets<'a>> {
    let character = required(store, Category::Characters, spec.character.as_deref())?;
    let pose = required(store, Category::Poses, spec.pose.as_deref())?;
    let orientation = optional(store, Category::Orientations, spec.orientation.as_deref())?;
    let scene = required(store, Category::Scenes, spec.scene.as_deref())?;
    let lighting = optional(store, Category::Lighting, spec.lighting.as_deref())?;
    let model = optional(store, Category::Models, spec.model.as_deref())?;

    Ok(ResolvedAssets {
        spec: spec.clone(),
        character,
        pose,
        orientation,
        scene,
        wardrobe: best_effort(store, Category::Wardrobe, &spec.wardrobe),
        props: best_effort(store, Category::Props, &spec.props),
        lighting,
        model,
    })
}

fn required<'a>(
    store: &'a AssetStore,
    category: Category,
    id: Option<&str>,
) -> Result<&'a AssetRecord> {
    let id = id.unwrap_or("");
    store
        .find(category, id)
        .ok_or_else(|| EngineError::missing_asset(category.singular(), id))
}

fn optional<'a>(
    store: &'a AssetStore,
    category: Category,
    id: Option<&str>,
) -> Result<Option<&'a AssetRecord>> {
    match id {
        None => Ok(None),
        Some(id) => required(store, category, Some(id)).map(Some),
    }
}

fn best_effort<'a>(store: &'a AssetStore, category: Category, ids: &[String]) -> Vec<&'a AssetRecord> {
    ids.iter()
        .filter_map(|id| {
            let found = store.find(category, id);
            if found.is_none() {
                debug!(category = %category, id = %id, "skipping unresolved optional reference");
            }
            found
        })
        .collect()
}
