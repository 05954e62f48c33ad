pub mod camera;
pub mod controls;
pub mod frame;

pub use camera::{PerspectiveCamera, Ray};
pub use controls::OrbitControls;
pub use frame::GlobeFrame;
