use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Classification driving a marker's color and visibility toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Normal,
    Suspicious,
}

impl Category {
    pub fn from_flag(suspicious: bool) -> Self {
        if suspicious {
            Category::Suspicious
        } else {
            Category::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Normal => "Normal",
            Category::Suspicious => "Suspicious",
        }
    }

    /// Marker color as 0xRRGGBB.
    pub fn color(self) -> u32 {
        match self {
            Category::Normal => 0x00ff00,
            Category::Suspicious => 0xff0000,
        }
    }
}

/// Per-category visibility toggles shared by the whole view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityFilters {
    pub show_normal: bool,
    pub show_suspicious: bool,
}

impl Default for VisibilityFilters {
    fn default() -> Self {
        Self {
            show_normal: true,
            show_suspicious: true,
        }
    }
}

impl VisibilityFilters {
    pub fn allows(&self, category: Category) -> bool {
        match category {
            Category::Normal => self.show_normal,
            Category::Suspicious => self.show_suspicious,
        }
    }

    /// Flips the toggle for `category` and returns its new value.
    pub fn toggle(&mut self, category: Category) -> bool {
        let flag = match category {
            Category::Normal => &mut self.show_normal,
            Category::Suspicious => &mut self.show_suspicious,
        };
        *flag = !*flag;
        *flag
    }
}

/// Opaque handle to a render resource owned by a [`SceneBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(pub(crate) u64);

impl ResourceHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Geometry and material of a single marker sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerMesh {
    /// Position in the globe's local (rotating) frame.
    pub position: DVec3,
    pub radius: f64,
    pub color: u32,
}

/// Common error type for the globe core.
#[derive(thiserror::Error, Debug)]
pub enum GlobeError {
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type GlobeResult<T> = Result<T, GlobeError>;

/// Rendering-side owner of marker resources.
///
/// Every handle returned by `create_marker` must eventually be passed to
/// `dispose_marker` exactly once.
pub trait SceneBackend {
    fn create_marker(&mut self, mesh: MarkerMesh) -> GlobeResult<ResourceHandle>;
    fn dispose_marker(&mut self, handle: ResourceHandle);
    fn live_resources(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_toggle_only_their_category() {
        let mut filters = VisibilityFilters::default();
        assert!(!filters.toggle(Category::Suspicious));
        assert!(filters.allows(Category::Normal));
        assert!(!filters.allows(Category::Suspicious));
        assert!(filters.toggle(Category::Suspicious));
        assert!(filters.allows(Category::Suspicious));
    }

    #[test]
    fn category_follows_flag() {
        assert_eq!(Category::from_flag(true), Category::Suspicious);
        assert_eq!(Category::from_flag(false).label(), "Normal");
        assert_eq!(Category::Suspicious.color(), 0xff0000);
    }
}
