//! Core point-synchronization and picking logic for the geolocated-traffic globe.
//!
//! The modules cover the path from wire records to markers anchored on a
//! rotating globe: coordinate transform, atomic marker-set replacement with
//! resource accounting, camera-driven hover picking and the refresh schedule.

pub mod geo;
pub mod hover;
pub mod prelude;
pub mod refresh;
pub mod state;
pub mod sync;
pub mod telemetry;
pub mod view;

pub use prelude::{Category, GlobeError, GlobeResult, SceneBackend, VisibilityFilters};
