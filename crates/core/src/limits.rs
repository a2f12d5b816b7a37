//! Edition limits injected into validation and authoring.
//!
//! The Lite edition caps tours, scenes and hotspots and restricts the
//! hotspot types an author may use. The ceilings live here as a policy
//! object rather than as literals inside the validator, so an unrestricted
//! edition is just a different [`TierLimits`] value.

use serde::{Deserialize, Serialize};

use crate::tour::HotspotType;

pub const TIER_LITE: &str = "lite";
pub const TIER_UNRESTRICTED: &str = "unrestricted";

/// Lite edition ceilings.
pub const LITE_MAX_SCENES: usize = 5;
pub const LITE_MAX_HOTSPOTS_PER_SCENE: usize = 5;
pub const LITE_MAX_TOURS: usize = 10;

/// Cardinality limits and feature gates for one edition.
///
/// `None` means the dimension is unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    pub max_scenes: Option<usize>,
    pub max_hotspots_per_scene: Option<usize>,
    pub max_tours: Option<usize>,
    pub allowed_hotspot_types: Vec<HotspotType>,
}

impl TierLimits {
    /// The free edition: 5 scenes, 5 hotspots per scene, 10 tours and only
    /// info, link and scene hotspots.
    pub fn lite() -> Self {
        Self {
            max_scenes: Some(LITE_MAX_SCENES),
            max_hotspots_per_scene: Some(LITE_MAX_HOTSPOTS_PER_SCENE),
            max_tours: Some(LITE_MAX_TOURS),
            allowed_hotspot_types: vec![HotspotType::Info, HotspotType::Link, HotspotType::Scene],
        }
    }

    /// No ceilings, every hotspot type.
    pub fn unrestricted() -> Self {
        Self {
            max_scenes: None,
            max_hotspots_per_scene: None,
            max_tours: None,
            allowed_hotspot_types: HotspotType::ALL.to_vec(),
        }
    }

    /// Resolve a tier by name (`"lite"` or `"unrestricted"`).
    pub fn for_tier(name: &str) -> Result<Self, String> {
        match name.trim().to_ascii_lowercase().as_str() {
            TIER_LITE => Ok(Self::lite()),
            TIER_UNRESTRICTED => Ok(Self::unrestricted()),
            other => Err(format!(
                "Unknown tier '{other}'. Must be one of: {TIER_LITE}, {TIER_UNRESTRICTED}"
            )),
        }
    }

    pub fn allows(&self, hotspot_type: HotspotType) -> bool {
        self.allowed_hotspot_types.contains(&hotspot_type)
    }
}

impl Default for TierLimits {
    fn default() -> Self {
        Self::lite()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lite_restricts_extended_hotspot_types() {
        let limits = TierLimits::lite();
        assert!(limits.allows(HotspotType::Scene));
        assert!(!limits.allows(HotspotType::Video));
        assert_eq!(limits.max_scenes, Some(5));
        assert_eq!(limits.max_tours, Some(10));
    }

    #[test]
    fn unrestricted_allows_everything() {
        let limits = TierLimits::unrestricted();
        assert!(HotspotType::ALL.iter().all(|t| limits.allows(*t)));
        assert!(limits.max_scenes.is_none());
    }

    #[test]
    fn tier_lookup_is_case_insensitive() {
        assert_eq!(TierLimits::for_tier(" LITE ").unwrap(), TierLimits::lite());
        assert!(TierLimits::for_tier("gold").is_err());
    }
}
