use crate::prelude::{GlobeError, GlobeResult, MarkerMesh, ResourceHandle, SceneBackend};
use std::collections::HashMap;

/// Bounded store of marker meshes that prevents unbounded allocations.
pub struct ResourcePool {
    meshes: HashMap<ResourceHandle, MarkerMesh>,
    next_id: u64,
    max_capacity: usize,
}

impl ResourcePool {
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self {
            meshes: HashMap::new(),
            next_id: 0,
            max_capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn get(&self, handle: ResourceHandle) -> Option<&MarkerMesh> {
        self.meshes.get(&handle)
    }

    pub fn contains(&self, handle: ResourceHandle) -> bool {
        self.meshes.contains_key(&handle)
    }
}

impl SceneBackend for ResourcePool {
    /// Allocates a mesh if there is room left in the pool.
    fn create_marker(&mut self, mesh: MarkerMesh) -> GlobeResult<ResourceHandle> {
        if self.meshes.len() >= self.max_capacity {
            return Err(GlobeError::ResourceExhaustion(format!(
                "marker pool depleted ({} live)",
                self.meshes.len()
            )));
        }
        let handle = ResourceHandle(self.next_id);
        self.next_id += 1;
        self.meshes.insert(handle, mesh);
        Ok(handle)
    }

    fn dispose_marker(&mut self, handle: ResourceHandle) {
        if self.meshes.remove(&handle).is_none() {
            log::warn!("dispose of unknown marker resource {}", handle.id());
        }
    }

    fn live_resources(&self) -> usize {
        self.meshes.len()
    }
}
