//! Explicit application state threaded through the UI callbacks.

use crate::geo::GeoRecord;
use crate::hover::{self, HoverTarget};
use crate::prelude::{Category, GlobeError, GlobeResult, VisibilityFilters};
use crate::refresh::{DiscardReason, RefreshLoop, TickDecision, TickTicket};
use crate::sync::{Counts, MarkerSet, PointSynchronizer, ResourcePool};
use crate::telemetry::{LogManager, MetricsRecorder};
use crate::view::{GlobeFrame, PerspectiveCamera};
use glam::DVec2;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on live marker resources when none is configured.
pub const DEFAULT_MAX_MARKERS: usize = 100_000;

/// Everything the view mutates: filters, the live marker set and its
/// resources, the refresh schedule and the spinning frame.
pub struct GlobeState {
    filters: VisibilityFilters,
    synchronizer: PointSynchronizer,
    resources: ResourcePool,
    refresh: RefreshLoop,
    frame: GlobeFrame,
    max_markers: usize,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl Default for GlobeState {
    fn default() -> Self {
        Self::new(crate::refresh::DEFAULT_INTERVAL, DEFAULT_MAX_MARKERS)
    }
}

impl GlobeState {
    pub fn new(interval: Duration, max_markers: usize) -> Self {
        Self::with_metrics(interval, max_markers, Arc::new(MetricsRecorder::new()))
    }

    /// Builds state that reports into a recorder shared with other parts
    /// of the application.
    pub fn with_metrics(
        interval: Duration,
        max_markers: usize,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            filters: VisibilityFilters::default(),
            synchronizer: PointSynchronizer::new(),
            // Old and new sets coexist until the swap completes.
            resources: ResourcePool::with_capacity(max_markers.saturating_mul(2)),
            refresh: RefreshLoop::new(interval),
            frame: GlobeFrame::default(),
            max_markers,
            metrics,
            logger: LogManager::new(),
        }
    }

    pub fn filters(&self) -> VisibilityFilters {
        self.filters
    }

    pub fn markers(&self) -> &MarkerSet {
        self.synchronizer.active()
    }

    pub fn counts(&self) -> Counts {
        self.synchronizer.counts()
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    pub fn frame(&self) -> &GlobeFrame {
        &self.frame
    }

    pub fn refresh(&self) -> &RefreshLoop {
        &self.refresh
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    /// Flips one category's visibility and re-applies filters in place.
    pub fn toggle_category(&mut self, category: Category) -> bool {
        let shown = self.filters.toggle(category);
        self.synchronizer.update_visibility(self.filters);
        shown
    }

    pub fn toggle_rotation(&mut self) -> bool {
        self.frame.toggle_rotation()
    }

    pub fn advance_frame(&mut self) {
        self.frame.advance();
    }

    pub fn start_live(&mut self) -> bool {
        let started = self.refresh.start();
        if started {
            self.logger.record(&format!(
                "live refresh started every {:?}",
                self.refresh.interval()
            ));
        }
        started
    }

    pub fn stop_live(&mut self) -> bool {
        let stopped = self.refresh.stop();
        if stopped {
            self.logger.record("live refresh stopped");
        }
        stopped
    }

    pub fn begin_tick(&mut self) -> Option<TickTicket> {
        self.refresh.begin_tick()
    }

    pub fn begin_one_shot(&mut self) -> TickTicket {
        self.refresh.begin_one_shot()
    }

    /// Applies the records of a scheduled tick if they are still wanted.
    ///
    /// Returns the new counts when the marker set was replaced.
    pub fn complete_tick(
        &mut self,
        ticket: TickTicket,
        records: Vec<GeoRecord>,
    ) -> GlobeResult<Option<Counts>> {
        let decision = self.refresh.complete(ticket, records);
        self.settle(ticket, decision)
    }

    pub fn complete_one_shot(
        &mut self,
        ticket: TickTicket,
        records: Vec<GeoRecord>,
    ) -> GlobeResult<Option<Counts>> {
        let decision = self.refresh.complete_one_shot(ticket, records);
        self.settle(ticket, decision)
    }

    fn settle(&mut self, ticket: TickTicket, decision: TickDecision) -> GlobeResult<Option<Counts>> {
        match decision {
            TickDecision::Apply(records) => match self.apply(&records) {
                Ok(counts) => {
                    self.metrics.record_applied();
                    Ok(Some(counts))
                }
                Err(err) => {
                    self.metrics.record_failed();
                    Err(err)
                }
            },
            TickDecision::Discard(DiscardReason::Empty) => {
                self.metrics.record_empty();
                Ok(None)
            }
            TickDecision::Discard(reason) => {
                self.logger.record(&format!(
                    "tick {} discarded: {:?}",
                    ticket.sequence(),
                    reason
                ));
                self.metrics.record_discarded();
                Ok(None)
            }
        }
    }

    /// Replaces the marker set with `records` under the current filters.
    ///
    /// A batch with more drawable records than `max_markers` is rejected
    /// and the current set stays.
    pub fn apply(&mut self, records: &[GeoRecord]) -> GlobeResult<Counts> {
        let drawable = records.iter().filter(|r| r.has_finite_coordinates()).count();
        if drawable > self.max_markers {
            return Err(GlobeError::ResourceExhaustion(format!(
                "{} markers exceed the limit of {}",
                drawable, self.max_markers
            )));
        }
        self.synchronizer
            .replace(&mut self.resources, records, self.filters)
    }

    pub fn hover(&self, camera: &PerspectiveCamera, ndc: DVec2) -> HoverTarget {
        hover::query(self.markers(), &self.frame, camera, ndc)
    }
}
