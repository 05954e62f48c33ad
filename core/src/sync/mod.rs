pub mod resource_pool;
pub mod synchronizer;

pub use resource_pool::ResourcePool;
pub use synchronizer::{Counts, Marker, MarkerSet, PointSynchronizer, MARKER_SIZE};
