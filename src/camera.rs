//! Camera Clause
//!
//! The baseline rig is fixed. Its entries are part of every assembled
//! prompt, so they are part of the seed and checksum surface.

use serde::{Deserialize, Serialize};

use crate::spec::CameraOverride;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraRig {
    pub lens: String,
    pub angle: String,
    pub height: String,
    pub tilt: String,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            lens: "35mm lens".to_string(),
            angle: "eye-level".to_string(),
            height: "1m height".to_string(),
            tilt: "5° downward tilt".to_string(),
        }
    }
}

impl CameraRig {
    /// Apply the set fields of an override over this rig.
    pub fn with_override(mut self, camera: &CameraOverride) -> Self {
        if let Some(lens) = &camera.lens {
            self.lens = lens.clone();
        }
        if let Some(angle) = &camera.angle {
            self.angle = angle.clone();
        }
        if let Some(height) = &camera.height {
            self.height = height.clone();
        }
        if let Some(tilt) = &camera.tilt {
            self.tilt = tilt.clone();
        }
        self
    }

    /// `Photographed with {framing, lens, angle, height, tilt}`.
    pub fn clause(&self, framing: Option<&str>) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(5);
        if let Some(framing) = framing.filter(|f| !f.is_empty()) {
            parts.push(framing);
        }
        parts.extend([
            self.lens.as_str(),
            self.angle.as_str(),
            self.height.as_str(),
            self.tilt.as_str(),
        ]);
        format!("Photographed with {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_clause() {
        assert_eq!(
            CameraRig::default().clause(None),
            "Photographed with 35mm lens, eye-level, 1m height, 5° downward tilt"
        );
    }

    #[test]
    fn test_framing_prepended() {
        assert_eq!(
            CameraRig::default().clause(Some("close-up")),
            "Photographed with close-up, 35mm lens, eye-level, 1m height, 5° downward tilt"
        );
    }

    #[test]
    fn test_override_replaces_entries() {
        let rig = CameraRig::default().with_override(&CameraOverride {
            lens: Some("50mm lens".into()),
            ..CameraOverride::default()
        });
        assert_eq!(
            rig.clause(None),
            "Photographed with 50mm lens, eye-level, 1m height, 5° downward tilt"
        );
    }
}
