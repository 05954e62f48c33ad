pub mod record;
pub mod transform;

pub use record::GeoRecord;
pub use transform::{lat_lon_to_vector3, GLOBE_RADIUS, MARKER_ALTITUDE};
