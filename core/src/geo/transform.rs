use glam::DVec3;

/// Radius of the rendered globe sphere.
pub const GLOBE_RADIUS: f64 = 1.0;

/// Radius at which markers float, just above the globe surface.
pub const MARKER_ALTITUDE: f64 = 1.02;

/// Maps geographic degrees onto a sphere of `radius`.
///
/// The polar angle is measured from +Y and the azimuth is offset by 180° so
/// that the result lines up with an equirectangular texture wrapped on a
/// Y-up sphere: `x = -r·sinφ·cosθ`, `y = r·cosφ`, `z = r·sinφ·sinθ`.
pub fn lat_lon_to_vector3(latitude: f64, longitude: f64, radius: f64) -> DVec3 {
    let phi = (90.0 - latitude).to_radians();
    let theta = (longitude + 180.0).to_radians();

    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();

    DVec3::new(
        -radius * sin_phi * cos_theta,
        radius * cos_phi,
        radius * sin_phi * sin_theta,
    )
}
