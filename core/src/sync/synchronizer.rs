use crate::geo::{lat_lon_to_vector3, GeoRecord, MARKER_ALTITUDE};
use crate::prelude::{
    Category, GlobeResult, MarkerMesh, ResourceHandle, SceneBackend, VisibilityFilters,
};
use crate::telemetry::log::LogManager;
use glam::DVec3;

/// Radius of each marker sphere.
pub const MARKER_SIZE: f64 = 0.02;

/// Renderable marker anchored on the globe, tied back to its source record.
#[derive(Debug, Clone)]
pub struct Marker {
    handle: ResourceHandle,
    position: DVec3,
    category: Category,
    visible: bool,
    record: GeoRecord,
}

impl Marker {
    pub fn handle(&self) -> ResourceHandle {
        self.handle
    }

    /// Position in the globe's local frame.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn record(&self) -> &GeoRecord {
        &self.record
    }

    pub fn size(&self) -> f64 {
        MARKER_SIZE
    }
}

/// Per-category marker totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub normal: usize,
    pub suspicious: usize,
}

impl Counts {
    pub fn total(&self) -> usize {
        self.normal + self.suspicious
    }
}

/// The complete collection of markers attached to the globe.
#[derive(Debug, Default)]
pub struct MarkerSet {
    markers: Vec<Marker>,
    generation: u64,
}

impl MarkerSet {
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|marker| marker.visible)
    }

    /// Incremented every time a new set is installed; 0 means nothing has been installed yet.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn counts(&self) -> Counts {
        self.markers
            .iter()
            .fold(Counts::default(), |mut counts, marker| {
                match marker.category {
                    Category::Normal => counts.normal += 1,
                    Category::Suspicious => counts.suspicious += 1,
                }
                counts
            })
    }
}

/// Owns the live marker set and swaps it wholesale on every refresh.
pub struct PointSynchronizer {
    active: MarkerSet,
    counts: Counts,
    logger: LogManager,
}

impl Default for PointSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PointSynchronizer {
    pub fn new() -> Self {
        Self {
            active: MarkerSet::default(),
            counts: Counts::default(),
            logger: LogManager::new(),
        }
    }

    pub fn active(&self) -> &MarkerSet {
        &self.active
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// Builds a marker per record, installs the new set and releases the old one.
    ///
    /// The new set is fully allocated before the swap. If the backend runs out
    /// of room part-way, everything allocated for the new set is released and
    /// the current set stays on screen.
    pub fn replace<B>(
        &mut self,
        backend: &mut B,
        records: &[GeoRecord],
        filters: VisibilityFilters,
    ) -> GlobeResult<Counts>
    where
        B: SceneBackend + ?Sized,
    {
        let mut markers = Vec::with_capacity(records.len());

        for record in records {
            if !record.has_finite_coordinates() {
                self.logger.warn(&format!(
                    "skipping record {} with non-finite coordinates",
                    record.identifier().unwrap_or("N/A")
                ));
                continue;
            }

            let category = record.category();
            let position = lat_lon_to_vector3(record.latitude, record.longitude, MARKER_ALTITUDE);
            let mesh = MarkerMesh {
                position,
                radius: MARKER_SIZE,
                color: category.color(),
            };

            match backend.create_marker(mesh) {
                Ok(handle) => markers.push(Marker {
                    handle,
                    position,
                    category,
                    visible: filters.allows(category),
                    record: record.clone(),
                }),
                Err(err) => {
                    release_all(backend, &markers);
                    return Err(err);
                }
            }
        }

        let next = MarkerSet {
            markers,
            generation: self.active.generation + 1,
        };
        let previous = std::mem::replace(&mut self.active, next);
        release_all(backend, &previous.markers);

        self.counts = self.active.counts();
        self.logger.record(&format!(
            "marker set {} installed: {} normal, {} suspicious, {} released",
            self.active.generation,
            self.counts.normal,
            self.counts.suspicious,
            previous.markers.len()
        ));

        Ok(self.counts)
    }

    /// Re-applies `filters` to the existing markers without touching geometry.
    pub fn update_visibility(&mut self, filters: VisibilityFilters) {
        for marker in &mut self.active.markers {
            marker.visible = filters.allows(marker.category);
        }
    }

    /// Releases every marker and leaves an empty set installed.
    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: SceneBackend + ?Sized,
    {
        let generation = self.active.generation + 1;
        let previous = std::mem::replace(
            &mut self.active,
            MarkerSet {
                markers: Vec::new(),
                generation,
            },
        );
        release_all(backend, &previous.markers);
        self.counts = Counts::default();
    }
}

fn release_all<B>(backend: &mut B, markers: &[Marker])
where
    B: SceneBackend + ?Sized,
{
    for marker in markers {
        backend.dispose_marker(marker.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::GlobeError;
    use crate::sync::ResourcePool;

    fn records(normal: usize, suspicious: usize) -> Vec<GeoRecord> {
        let mut out = Vec::new();
        for i in 0..normal {
            out.push(GeoRecord::new(format!("10.0.0.{i}"), i as f64, i as f64, false));
        }
        for i in 0..suspicious {
            out.push(GeoRecord::new(format!("10.0.1.{i}"), -(i as f64), i as f64, true));
        }
        out
    }

    #[test]
    fn empty_replace_releases_everything() {
        let mut pool = ResourcePool::with_capacity(64);
        let mut sync = PointSynchronizer::new();
        sync.replace(&mut pool, &records(3, 2), VisibilityFilters::default())
            .unwrap();
        assert_eq!(pool.live_resources(), 5);

        let counts = sync
            .replace(&mut pool, &[], VisibilityFilters::default())
            .unwrap();
        assert_eq!(counts.total(), 0);
        assert!(sync.active().is_empty());
        assert_eq!(pool.live_resources(), 0);
    }

    #[test]
    fn back_to_back_replace_keeps_only_latest() {
        let mut pool = ResourcePool::with_capacity(64);
        let mut sync = PointSynchronizer::new();
        let filters = VisibilityFilters::default();
        sync.replace(&mut pool, &records(6, 4), filters).unwrap();
        sync.replace(&mut pool, &records(1, 2), filters).unwrap();

        assert_eq!(sync.active().len(), 3);
        assert!(sync.active().visible().count() <= 3);
        assert_eq!(pool.live_resources(), 3);
        assert_eq!(sync.active().generation(), 2);
        for marker in sync.active().iter() {
            assert!(pool.contains(marker.handle()));
        }
    }

    #[test]
    fn counts_ignore_ordering() {
        let mut pool = ResourcePool::with_capacity(64);
        let mut sync = PointSynchronizer::new();
        let mut input = records(5, 3);
        input.reverse();
        input.swap(0, 4);
        let counts = sync
            .replace(&mut pool, &input, VisibilityFilters::default())
            .unwrap();
        assert_eq!(counts, Counts { normal: 5, suspicious: 3 });
        assert_eq!(sync.active().counts(), counts);
    }

    #[test]
    fn visibility_is_fixed_at_construction() {
        let mut pool = ResourcePool::with_capacity(64);
        let mut sync = PointSynchronizer::new();
        let filters = VisibilityFilters {
            show_normal: true,
            show_suspicious: false,
        };
        sync.replace(&mut pool, &records(2, 2), filters).unwrap();
        for marker in sync.active().iter() {
            assert_eq!(marker.is_visible(), marker.category() == Category::Normal);
        }
    }

    #[test]
    fn hiding_suspicious_leaves_normal_alone() {
        let mut pool = ResourcePool::with_capacity(64);
        let mut sync = PointSynchronizer::new();
        let initial = VisibilityFilters {
            show_normal: false,
            show_suspicious: true,
        };
        sync.replace(&mut pool, &records(3, 3), initial).unwrap();
        let before: Vec<bool> = sync
            .active()
            .iter()
            .filter(|m| m.category() == Category::Normal)
            .map(Marker::is_visible)
            .collect();

        sync.update_visibility(VisibilityFilters {
            show_normal: false,
            show_suspicious: false,
        });

        assert!(sync
            .active()
            .iter()
            .filter(|m| m.category() == Category::Suspicious)
            .all(|m| !m.is_visible()));
        let after: Vec<bool> = sync
            .active()
            .iter()
            .filter(|m| m.category() == Category::Normal)
            .map(Marker::is_visible)
            .collect();
        assert_eq!(before, after);
        assert_eq!(pool.live_resources(), 6);
    }

    #[test]
    fn london_marker_matches_transform() {
        let mut pool = ResourcePool::with_capacity(4);
        let mut sync = PointSynchronizer::new();
        let record = GeoRecord::new("1.2.3.4", 51.5, -0.1, true)
            .with_timestamp("2024-01-01T00:00:00Z");
        sync.replace(&mut pool, &[record.clone()], VisibilityFilters::default())
            .unwrap();

        let marker = sync.active().iter().next().unwrap();
        let expected = lat_lon_to_vector3(51.5, -0.1, MARKER_ALTITUDE);
        assert!((marker.position() - expected).length() < 1e-12);
        assert_eq!(marker.category(), Category::Suspicious);
        assert_eq!(marker.record(), &record);
        assert_eq!(pool.get(marker.handle()).unwrap().color, 0xff0000);
    }

    #[test]
    fn exhaustion_keeps_previous_set() {
        let mut pool = ResourcePool::with_capacity(3);
        let mut sync = PointSynchronizer::new();
        let filters = VisibilityFilters::default();
        sync.replace(&mut pool, &records(2, 0), filters).unwrap();

        let result = sync.replace(&mut pool, &records(0, 2), filters);
        assert!(matches!(result, Err(GlobeError::ResourceExhaustion(_))));
        assert_eq!(sync.active().len(), 2);
        assert_eq!(sync.counts().normal, 2);
        assert_eq!(pool.live_resources(), 2);
    }

    #[test]
    fn non_finite_records_are_skipped() {
        let mut pool = ResourcePool::with_capacity(8);
        let mut sync = PointSynchronizer::new();
        let input = vec![
            GeoRecord::new("a", f64::NAN, 0.0, false),
            GeoRecord::new("b", 10.0, 10.0, false),
        ];
        let counts = sync
            .replace(&mut pool, &input, VisibilityFilters::default())
            .unwrap();
        assert_eq!(counts.total(), 1);
        assert_eq!(pool.live_resources(), 1);
    }

    #[test]
    fn clear_releases_markers() {
        let mut pool = ResourcePool::with_capacity(8);
        let mut sync = PointSynchronizer::new();
        sync.replace(&mut pool, &records(2, 2), VisibilityFilters::default())
            .unwrap();
        sync.clear(&mut pool);
        assert_eq!(pool.live_resources(), 0);
        assert_eq!(sync.counts().total(), 0);
    }
}
