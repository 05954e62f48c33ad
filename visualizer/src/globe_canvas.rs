use crate::scene::{Projector, RenderContext};
use crate::Message;
use glam::DVec3;
use globecore::geo::{lat_lon_to_vector3, GLOBE_RADIUS};
use globecore::hover::HoverInfo;
use globecore::state::GlobeState;
use globecore::view::frame::CLOUD_RADIUS;
use globecore::view::Ray;
use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke, Text},
    window, Color, Point, Rectangle, Renderer, Size, Theme,
};

const GRATICULE_STEP_DEG: f64 = 30.0;
const SAMPLE_STEP_DEG: f64 = 5.0;
const SILHOUETTE_SAMPLES: usize = 96;
const CLOUD_OPACITY: f32 = 0.4;
// (latitude, starting longitude, span) of each cloud band, in degrees.
const CLOUD_BANDS: [(f64, f64, f64); 10] = [
    (-55.0, -170.0, 80.0),
    (-42.0, 20.0, 60.0),
    (-28.0, -95.0, 45.0),
    (-8.0, 60.0, 35.0),
    (5.0, -150.0, 50.0),
    (12.0, -30.0, 40.0),
    (28.0, 100.0, 55.0),
    (38.0, -60.0, 70.0),
    (50.0, 10.0, 65.0),
    (62.0, 140.0, 90.0),
];
const OVERLAY_OFFSET: f32 = 15.0;
const OVERLAY_SIZE: Size = Size::new(270.0, 84.0);
const OVERLAY_LINE_HEIGHT: f32 = 18.0;

/// Hover overlay anchored to the pointer.
#[derive(Debug, Clone)]
pub struct HoverOverlay {
    pub position: Point,
    pub info: HoverInfo,
}

/// Pointer bookkeeping that lives inside the canvas widget.
#[derive(Debug, Default)]
pub struct Interaction {
    dragging: bool,
    inside: bool,
    last: Option<Point>,
}

/// The globe, its markers and the hover overlay.
pub struct GlobeCanvas<'a> {
    pub globe: &'a GlobeState,
    pub render: &'a RenderContext,
    pub hover: Option<&'a HoverOverlay>,
}

impl canvas::Program<Message> for GlobeCanvas<'_> {
    type State = Interaction;

    fn update(
        &self,
        interaction: &mut Interaction,
        event: &canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let position = cursor.position_in(bounds)?;
                interaction.dragging = true;
                interaction.last = Some(position);
                Some(canvas::Action::capture())
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                interaction.dragging = false;
                None
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                let Some(position) = cursor.position_in(bounds) else {
                    interaction.last = None;
                    if std::mem::take(&mut interaction.inside) {
                        return Some(canvas::Action::publish(Message::PointerLeft));
                    }
                    return None;
                };
                interaction.inside = true;
                let drag = match (interaction.dragging, interaction.last) {
                    (true, Some(last)) => Some(position - last),
                    _ => None,
                };
                interaction.last = Some(position);
                Some(canvas::Action::publish(Message::PointerMoved {
                    position,
                    viewport: bounds.size(),
                    drag,
                }))
            }
            canvas::Event::Mouse(mouse::Event::CursorLeft) => {
                interaction.inside = false;
                interaction.dragging = false;
                interaction.last = None;
                Some(canvas::Action::publish(Message::PointerLeft))
            }
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                cursor.position_in(bounds)?;
                let steps = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => *y,
                    mouse::ScrollDelta::Pixels { y, .. } => *y / 60.0,
                };
                Some(canvas::Action::publish(Message::Zoom(steps)).and_capture())
            }
            canvas::Event::Window(window::Event::Resized(_)) => Some(canvas::Action::publish(
                Message::ViewportResized(bounds.size()),
            )),
            _ => None,
        }
    }

    fn draw(
        &self,
        _interaction: &Interaction,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::BLACK);

        let projector = Projector::new(
            &self.render.camera,
            bounds.width as f64,
            bounds.height as f64,
        );

        self.draw_stars(&mut frame, &projector);
        self.draw_globe(&mut frame, &projector);
        self.draw_graticule(&mut frame, &projector);
        self.draw_clouds(&mut frame, &projector);
        self.draw_markers(&mut frame, &projector);
        if let Some(overlay) = self.hover {
            draw_overlay(&mut frame, bounds.size(), overlay);
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        interaction: &Interaction,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if interaction.dragging {
            mouse::Interaction::Grabbing
        } else if self.hover.is_some() && cursor.is_over(bounds) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }
}

impl GlobeCanvas<'_> {
    fn draw_stars(&self, frame: &mut Frame, projector: &Projector) {
        let stars = Path::new(|builder| {
            for star in self.render.stars() {
                if let Some(p) = projector.to_screen(*star) {
                    builder.rectangle(Point::new(p.x as f32, p.y as f32), Size::new(1.0, 1.0));
                }
            }
        });
        frame.fill(&stars, Color::WHITE);
    }

    fn draw_globe(&self, frame: &mut Frame, projector: &Projector) {
        let eye = self.render.camera.position;
        let distance = eye.length();
        if distance <= GLOBE_RADIUS {
            return;
        }

        // Horizon circle as seen from the eye.
        let axis = eye / distance;
        let centre = axis * (GLOBE_RADIUS * GLOBE_RADIUS / distance);
        let radius = GLOBE_RADIUS * (1.0 - (GLOBE_RADIUS / distance).powi(2)).sqrt();
        let u = axis.any_orthonormal_vector();
        let v = axis.cross(u);

        let outline: Vec<Point> = (0..SILHOUETTE_SAMPLES)
            .filter_map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / SILHOUETTE_SAMPLES as f64;
                let world = centre + (u * angle.cos() + v * angle.sin()) * radius;
                projector
                    .to_screen(world)
                    .map(|p| Point::new(p.x as f32, p.y as f32))
            })
            .collect();
        if outline.len() < 3 {
            return;
        }

        let disk = Path::new(|builder| {
            builder.move_to(outline[0]);
            for point in &outline[1..] {
                builder.line_to(*point);
            }
            builder.close();
        });
        let shade = self.render.lighting.intensity(axis);
        frame.fill(&disk, Color::from_rgb(0.02 * shade, 0.09 * shade, 0.22 * shade));
        frame.stroke(
            &disk,
            Stroke::default()
                .with_width(1.5)
                .with_color(Color::from_rgba(0.35, 0.6, 1.0, 0.35)),
        );
    }

    fn draw_graticule(&self, frame: &mut Frame, projector: &Projector) {
        let globe_frame = self.globe.frame();
        let eye = self.render.camera.position;

        let mut lines: Vec<Vec<(f64, f64)>> = Vec::new();
        let mut lat = -90.0 + GRATICULE_STEP_DEG;
        while lat < 90.0 {
            lines.push(sample_range(-180.0, 180.0).map(|lon| (lat, lon)).collect());
            lat += GRATICULE_STEP_DEG;
        }
        let mut lon = -180.0;
        while lon < 180.0 {
            lines.push(sample_range(-90.0, 90.0).map(|lat| (lat, lon)).collect());
            lon += GRATICULE_STEP_DEG;
        }

        for line in lines {
            for pair in line.windows(2) {
                let a = globe_frame.to_world(lat_lon_to_vector3(pair[0].0, pair[0].1, GLOBE_RADIUS));
                let b = globe_frame.to_world(lat_lon_to_vector3(pair[1].0, pair[1].1, GLOBE_RADIUS));
                if !faces(eye, a) || !faces(eye, b) {
                    continue;
                }
                let (Some(pa), Some(pb)) = (projector.to_screen(a), projector.to_screen(b)) else {
                    continue;
                };
                let light = self.render.lighting.intensity((a + b).normalize());
                let segment = Path::line(
                    Point::new(pa.x as f32, pa.y as f32),
                    Point::new(pb.x as f32, pb.y as f32),
                );
                frame.stroke(
                    &segment,
                    Stroke::default()
                        .with_width(1.0)
                        .with_color(Color::from_rgb(0.15 * light, 0.55 * light, 0.75 * light)),
                );
            }
        }
    }

    fn draw_clouds(&self, frame: &mut Frame, projector: &Projector) {
        let globe_frame = self.globe.frame();
        let eye = self.render.camera.position;

        for (lat, start, span) in CLOUD_BANDS {
            let samples: Vec<DVec3> = sample_range(start, start + span)
                .map(|lon| globe_frame.cloud_to_world(lat_lon_to_vector3(lat, lon, CLOUD_RADIUS)))
                .collect();
            for pair in samples.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if !faces(eye, a) || !faces(eye, b) {
                    continue;
                }
                let (Some(pa), Some(pb)) = (projector.to_screen(a), projector.to_screen(b)) else {
                    continue;
                };
                let light = self.render.lighting.intensity((a + b).normalize());
                frame.stroke(
                    &Path::line(
                        Point::new(pa.x as f32, pa.y as f32),
                        Point::new(pb.x as f32, pb.y as f32),
                    ),
                    Stroke::default()
                        .with_width(3.0)
                        .with_color(Color::from_rgba(light, light, light, CLOUD_OPACITY)),
                );
            }
        }
    }

    fn draw_markers(&self, frame: &mut Frame, projector: &Projector) {
        let camera = &self.render.camera;
        let globe_frame = self.globe.frame();
        let right = camera.right();

        for marker in self.globe.markers().visible() {
            let world = globe_frame.to_world(marker.position());
            if occluded(camera.position, world) {
                continue;
            }
            let (Some(centre), Some(edge)) = (
                projector.to_screen(world),
                projector.to_screen(world + right * marker.size()),
            ) else {
                continue;
            };
            let radius = ((edge - centre).length() as f32).max(2.0);
            let color = self
                .globe
                .resources()
                .get(marker.handle())
                .map(|mesh| mesh.color)
                .unwrap_or_else(|| marker.category().color());
            frame.fill(
                &Path::circle(Point::new(centre.x as f32, centre.y as f32), radius),
                rgb(color),
            );
        }
    }
}

fn draw_overlay(frame: &mut Frame, bounds: Size, overlay: &HoverOverlay) {
    let x = (overlay.position.x + OVERLAY_OFFSET).min(bounds.width - OVERLAY_SIZE.width).max(0.0);
    let y = (overlay.position.y + OVERLAY_OFFSET).min(bounds.height - OVERLAY_SIZE.height).max(0.0);
    frame.fill_rectangle(
        Point::new(x, y),
        OVERLAY_SIZE,
        Color::from_rgba(0.0, 0.0, 0.0, 0.7),
    );

    for (row, line) in overlay.info.lines().into_iter().enumerate() {
        frame.fill_text(Text {
            content: line,
            position: Point::new(x + 8.0, y + 6.0 + row as f32 * OVERLAY_LINE_HEIGHT),
            color: Color::WHITE,
            size: 14.0.into(),
            ..Text::default()
        });
    }
}

fn sample_range(from: f64, to: f64) -> impl Iterator<Item = f64> {
    let steps = ((to - from) / SAMPLE_STEP_DEG).round() as usize;
    (0..=steps).map(move |i| from + i as f64 * SAMPLE_STEP_DEG)
}

/// Whether a point on the unit globe faces the eye.
fn faces(eye: DVec3, point: DVec3) -> bool {
    point.dot(eye - point) > 0.0
}

/// Whether the globe hides `point` from the eye.
fn occluded(eye: DVec3, point: DVec3) -> bool {
    let to_point = point - eye;
    let ray = Ray::new(eye, to_point);
    ray.intersect_sphere(DVec3::ZERO, GLOBE_RADIUS)
        .is_some_and(|hit| hit < to_point.length())
}

fn rgb(color: u32) -> Color {
    Color::from_rgb8(
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_side_markers_are_hidden() {
        let eye = DVec3::new(0.0, 0.0, 2.0);
        assert!(!occluded(eye, DVec3::new(0.0, 0.0, 1.02)));
        assert!(occluded(eye, DVec3::new(0.0, 0.0, -1.02)));
        assert!(faces(eye, DVec3::new(0.0, 0.0, 1.0)));
        assert!(!faces(eye, DVec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn colors_unpack() {
        assert_eq!(rgb(0xff0000), Color::from_rgb8(255, 0, 0));
        assert_eq!(rgb(0x00ff00), Color::from_rgb8(0, 255, 0));
    }

    #[test]
    fn sampling_covers_both_ends() {
        let samples: Vec<f64> = sample_range(-90.0, 90.0).collect();
        assert_eq!(samples.first(), Some(&-90.0));
        assert_eq!(samples.last(), Some(&90.0));
        assert_eq!(samples.len(), 37);
    }

    #[test]
    fn cloud_bands_stay_on_the_map() {
        for (lat, start, span) in CLOUD_BANDS {
            assert!((-90.0..=90.0).contains(&lat));
            assert!(span > SAMPLE_STEP_DEG);
            assert!(sample_range(start, start + span).count() >= 2);
        }
    }
}
