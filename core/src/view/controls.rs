use super::camera::{PerspectiveCamera, HOME_POSITION};
use glam::DVec3;
use std::f64::consts::{PI, TAU};

const POLAR_EPSILON: f64 = 1e-6;
const SETTLE_THRESHOLD: f64 = 1e-6;

/// Orbit-style camera controller with inertial damping.
///
/// Pointer input accumulates pending rotation; each `update` applies a
/// `damping` fraction of it and decays the rest, so motion eases out.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: DVec3,
    radius: f64,
    /// Azimuth around +Y, measured from +Z.
    theta: f64,
    /// Polar angle from +Y.
    phi: f64,
    pending_theta: f64,
    pending_phi: f64,
    pending_scale: f64,
    pub damping: f64,
    pub rotate_speed: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl OrbitControls {
    pub fn new(camera: &PerspectiveCamera) -> Self {
        let mut controls = Self {
            target: camera.target,
            radius: 0.0,
            theta: 0.0,
            phi: 0.0,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            damping: 0.05,
            rotate_speed: 1.0,
            min_distance: 1.1,
            max_distance: 10.0,
        };
        controls.sync_from(camera);
        controls
    }

    fn sync_from(&mut self, camera: &PerspectiveCamera) {
        let offset = camera.position - self.target;
        self.radius = offset.length();
        self.theta = offset.x.atan2(offset.z);
        self.phi = if self.radius > 0.0 {
            (offset.y / self.radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };
    }

    pub fn distance(&self) -> f64 {
        self.radius
    }

    /// Queues a rotation from a pointer drag of `dx`/`dy` pixels.
    pub fn rotate(&mut self, dx: f64, dy: f64, viewport_height: f64) {
        if viewport_height <= 0.0 {
            return;
        }
        self.pending_theta -= TAU * dx / viewport_height * self.rotate_speed;
        self.pending_phi -= TAU * dy / viewport_height * self.rotate_speed;
    }

    /// Queues a dolly step; positive `steps` move the camera closer.
    pub fn zoom(&mut self, steps: f64) {
        self.pending_scale *= 0.95f64.powf(steps);
    }

    /// Applies pending input to the camera. Returns `false` once motion has settled.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        self.theta = (self.theta + self.pending_theta * self.damping).rem_euclid(TAU);
        self.phi = (self.phi + self.pending_phi * self.damping)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.radius = (self.radius * self.pending_scale).clamp(self.min_distance, self.max_distance);

        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        camera.position = self.target
            + DVec3::new(
                self.radius * sin_phi * sin_theta,
                self.radius * cos_phi,
                self.radius * sin_phi * cos_theta,
            );
        camera.target = self.target;

        self.pending_theta *= 1.0 - self.damping;
        self.pending_phi *= 1.0 - self.damping;
        self.pending_scale = 1.0;

        self.pending_theta.abs() > SETTLE_THRESHOLD || self.pending_phi.abs() > SETTLE_THRESHOLD
    }

    /// Puts the camera back at its home position and drops pending motion.
    pub fn reset(&mut self, camera: &mut PerspectiveCamera) {
        camera.position = HOME_POSITION;
        camera.target = DVec3::ZERO;
        camera.up = DVec3::Y;
        self.target = DVec3::ZERO;
        self.pending_theta = 0.0;
        self.pending_phi = 0.0;
        self.pending_scale = 1.0;
        self.sync_from(camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_update_keeps_home_position() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(&camera);
        assert!(!controls.update(&mut camera));
        assert!((camera.position - HOME_POSITION).length() < 1e-12);
    }

    #[test]
    fn drag_orbits_at_constant_distance() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(&camera);
        controls.rotate(120.0, 40.0, 600.0);
        for _ in 0..30 {
            controls.update(&mut camera);
        }
        assert!((camera.position.length() - 2.0).abs() < 1e-9);
        assert!((camera.position - HOME_POSITION).length() > 0.1);
    }

    #[test]
    fn damping_eases_out() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(&camera);
        controls.rotate(300.0, 0.0, 600.0);
        let first = camera.position;
        controls.update(&mut camera);
        let step_one = (camera.position - first).length();
        let second = camera.position;
        controls.update(&mut camera);
        let step_two = (camera.position - second).length();
        assert!(step_two < step_one);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(&camera);
        controls.zoom(500.0);
        controls.update(&mut camera);
        assert!((controls.distance() - controls.min_distance).abs() < 1e-12);
        controls.zoom(-500.0);
        controls.update(&mut camera);
        assert!((controls.distance() - controls.max_distance).abs() < 1e-12);
    }

    #[test]
    fn reset_returns_home() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(&camera);
        controls.rotate(200.0, 100.0, 600.0);
        controls.zoom(3.0);
        controls.update(&mut camera);
        controls.reset(&mut camera);
        assert_eq!(camera.position, HOME_POSITION);
        assert!(!controls.update(&mut camera));
        assert!((camera.position - HOME_POSITION).length() < 1e-12);
    }
}
