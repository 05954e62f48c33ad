use glam::{DMat4, DVec2, DVec3};
use globecore::view::camera::ndc_to_pixels;
use globecore::view::{OrbitControls, PerspectiveCamera};
use rand::{rngs::StdRng, Rng, SeedableRng};

const STAR_COUNT: usize = 10_000;
const STAR_EXTENT: f64 = 2000.0;

/// Ambient fill plus a single directional "sun".
#[derive(Debug, Clone, Copy)]
pub struct Lighting {
    pub ambient: f32,
    pub sun_direction: DVec3,
    pub sun_intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0x33 as f32 / 255.0,
            sun_direction: DVec3::new(5.0, 3.0, 5.0).normalize(),
            sun_intensity: 1.0,
        }
    }
}

impl Lighting {
    /// Lambert brightness for a surface with the given unit normal.
    pub fn intensity(&self, normal: DVec3) -> f32 {
        let diffuse = normal.dot(self.sun_direction).max(0.0) as f32;
        (self.ambient + self.sun_intensity * diffuse).min(1.0)
    }
}

/// Camera, controls and static scenery, created once at startup.
pub struct RenderContext {
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub lighting: Lighting,
    stars: Vec<DVec3>,
    viewport: (f64, f64),
}

impl RenderContext {
    pub fn new(star_seed: u64) -> Self {
        let camera = PerspectiveCamera::default();
        let controls = OrbitControls::new(&camera);
        Self {
            camera,
            controls,
            lighting: Lighting::default(),
            stars: generate_stars(star_seed, STAR_COUNT),
            viewport: (0.0, 0.0),
        }
    }

    pub fn stars(&self) -> &[DVec3] {
        &self.stars
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    /// Keeps the camera aspect in step with the drawing surface.
    pub fn resize(&mut self, width: f64, height: f64) {
        if (width, height) == self.viewport || width <= 0.0 || height <= 0.0 {
            return;
        }
        self.viewport = (width, height);
        self.camera.set_aspect(width, height);
    }

    pub fn orbit(&mut self, dx: f64, dy: f64) {
        self.controls.rotate(dx, dy, self.viewport.1);
    }

    pub fn zoom(&mut self, steps: f64) {
        self.controls.zoom(steps);
    }

    pub fn update_controls(&mut self) -> bool {
        self.controls.update(&mut self.camera)
    }

    pub fn reset_view(&mut self) {
        self.controls.reset(&mut self.camera);
    }
}

/// World → pixel mapping for one frame.
pub struct Projector {
    view_projection: DMat4,
    width: f64,
    height: f64,
}

impl Projector {
    pub fn new(camera: &PerspectiveCamera, width: f64, height: f64) -> Self {
        let mut camera = camera.clone();
        camera.set_aspect(width, height);
        Self {
            view_projection: camera.view_projection(),
            width,
            height,
        }
    }

    /// Pixel position of `world`, or `None` outside the clip volume's depth range.
    pub fn to_screen(&self, world: DVec3) -> Option<DVec2> {
        let clip = self.view_projection * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }
        Some(ndc_to_pixels(ndc.truncate(), self.width, self.height))
    }
}

fn generate_stars(seed: u64, count: usize) -> Vec<DVec3> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            DVec3::new(
                (rng.gen::<f64>() - 0.5) * STAR_EXTENT,
                (rng.gen::<f64>() - 0.5) * STAR_EXTENT,
                (rng.gen::<f64>() - 0.5) * STAR_EXTENT,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_are_reproducible() {
        let a = RenderContext::new(42);
        let b = RenderContext::new(42);
        assert_eq!(a.stars().len(), STAR_COUNT);
        assert_eq!(a.stars(), b.stars());
        assert!(a
            .stars()
            .iter()
            .all(|s| s.abs().max_element() <= STAR_EXTENT / 2.0));
    }

    #[test]
    fn resize_updates_camera_aspect() {
        let mut ctx = RenderContext::new(1);
        ctx.resize(1200.0, 600.0);
        assert_eq!(ctx.camera.aspect, 2.0);
        assert_eq!(ctx.viewport(), (1200.0, 600.0));
        ctx.resize(0.0, 600.0);
        assert_eq!(ctx.viewport(), (1200.0, 600.0));
    }

    #[test]
    fn night_side_gets_ambient_only() {
        let lighting = Lighting::default();
        let away = -lighting.sun_direction;
        assert!((lighting.intensity(away) - lighting.ambient).abs() < 1e-6);
        assert_eq!(lighting.intensity(lighting.sun_direction), 1.0);
    }

    #[test]
    fn projector_centres_the_origin() {
        let camera = PerspectiveCamera::default();
        let projector = Projector::new(&camera, 800.0, 600.0);
        let centre = projector.to_screen(DVec3::ZERO).unwrap();
        assert!((centre - DVec2::new(400.0, 300.0)).length() < 1e-9);
        assert!(projector.to_screen(DVec3::new(0.0, 0.0, 10.0)).is_none());
    }
}
