use glam::{DMat3, DVec3};
use std::f64::consts::TAU;

/// Rotation applied per animation frame while spinning.
pub const ROTATION_STEP: f64 = 0.001;
/// The cloud shell drifts slightly faster than the surface.
pub const CLOUD_ROTATION_STEP: f64 = 0.0011;
pub const CLOUD_RADIUS: f64 = 1.01;

/// The globe's spinning frame; markers live in its local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobeFrame {
    rotation_y: f64,
    cloud_rotation_y: f64,
    rotating: bool,
}

impl Default for GlobeFrame {
    fn default() -> Self {
        Self {
            rotation_y: 0.0,
            cloud_rotation_y: 0.0,
            rotating: true,
        }
    }
}

impl GlobeFrame {
    pub fn rotation_y(&self) -> f64 {
        self.rotation_y
    }

    pub fn set_rotation_y(&mut self, radians: f64) {
        self.rotation_y = radians.rem_euclid(TAU);
    }

    pub fn cloud_rotation_y(&self) -> f64 {
        self.cloud_rotation_y
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn toggle_rotation(&mut self) -> bool {
        self.rotating = !self.rotating;
        self.rotating
    }

    /// Advances one animation frame.
    pub fn advance(&mut self) {
        if self.rotating {
            self.set_rotation_y(self.rotation_y + ROTATION_STEP);
            self.cloud_rotation_y = (self.cloud_rotation_y + CLOUD_ROTATION_STEP).rem_euclid(TAU);
        }
    }

    pub fn matrix(&self) -> DMat3 {
        DMat3::from_rotation_y(self.rotation_y)
    }

    pub fn to_world(&self, local: DVec3) -> DVec3 {
        self.matrix() * local
    }

    /// Maps a point of the cloud shell into world space.
    pub fn cloud_to_world(&self, local: DVec3) -> DVec3 {
        DMat3::from_rotation_y(self.cloud_rotation_y) * local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_frame_does_not_advance() {
        let mut frame = GlobeFrame::default();
        frame.advance();
        assert!((frame.rotation_y() - ROTATION_STEP).abs() < 1e-15);
        assert!(!frame.toggle_rotation());
        frame.advance();
        assert!((frame.rotation_y() - ROTATION_STEP).abs() < 1e-15);
        assert!((frame.cloud_rotation_y() - CLOUD_ROTATION_STEP).abs() < 1e-15);
    }

    #[test]
    fn clouds_drift_ahead_of_the_surface() {
        let mut frame = GlobeFrame::default();
        for _ in 0..1000 {
            frame.advance();
        }
        let lead = frame.cloud_rotation_y() - frame.rotation_y();
        assert!((lead - 1000.0 * (CLOUD_ROTATION_STEP - ROTATION_STEP)).abs() < 1e-9);

        let surface = frame.to_world(DVec3::X);
        let cloud = frame.cloud_to_world(DVec3::X);
        assert!(surface.angle_between(cloud) > 0.09);
    }

    #[test]
    fn quarter_turn_moves_x_to_negative_z() {
        let mut frame = GlobeFrame::default();
        frame.set_rotation_y(std::f64::consts::FRAC_PI_2);
        let world = frame.to_world(DVec3::X);
        assert!((world - DVec3::NEG_Z).length() < 1e-12);
    }
}
