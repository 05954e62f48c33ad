use glam::{DMat4, DVec2, DVec3};

/// Default camera placement: two globe radii out on +Z, looking at the origin.
pub const HOME_POSITION: DVec3 = DVec3::new(0.0, 0.0, 2.0);

const RAY_EPSILON: f64 = 1e-9;

/// Half-line used for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    /// Unit length.
    pub direction: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, distance: f64) -> DVec3 {
        self.origin + self.direction * distance
    }

    /// Distance to the first intersection with a sphere in front of the origin.
    pub fn intersect_sphere(&self, center: DVec3, radius: f64) -> Option<f64> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        if near > RAY_EPSILON {
            Some(near)
        } else if far > RAY_EPSILON {
            Some(far)
        } else {
            None
        }
    }
}

/// Pinhole camera with an OpenGL-style clip space.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: DVec3,
    pub target: DVec3,
    pub up: DVec3,
    pub fov_deg: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PerspectiveCamera {
    pub fn new(aspect: f64) -> Self {
        Self {
            position: HOME_POSITION,
            target: DVec3::ZERO,
            up: DVec3::Y,
            fov_deg: 75.0,
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Matches the aspect ratio to a viewport; degenerate sizes are ignored.
    pub fn set_aspect(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh_gl(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Projects a world point to normalized device coordinates.
    ///
    /// Returns `None` for points at or behind the camera plane.
    pub fn project(&self, world: DVec3) -> Option<DVec3> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= RAY_EPSILON {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }

    /// Picking ray through a point given in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: DVec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(DVec3::new(ndc.x, ndc.y, -1.0));
        let far = inverse.project_point3(DVec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(self.position, far - near)
    }

    /// Unit vector pointing from the camera towards its target.
    pub fn forward(&self) -> DVec3 {
        (self.target - self.position).normalize()
    }

    /// Unit vector pointing to screen-right.
    pub fn right(&self) -> DVec3 {
        self.forward().cross(self.up).normalize()
    }
}

/// Converts client pixel coordinates into normalized device coordinates.
pub fn pointer_to_ndc(client_x: f64, client_y: f64, width: f64, height: f64) -> DVec2 {
    DVec2::new(
        (client_x / width) * 2.0 - 1.0,
        -(client_y / height) * 2.0 + 1.0,
    )
}

/// Converts normalized device coordinates back into pixels.
pub fn ndc_to_pixels(ndc: DVec2, width: f64, height: f64) -> DVec2 {
    DVec2::new((ndc.x + 1.0) * 0.5 * width, (1.0 - ndc.y) * 0.5 * height)
}
