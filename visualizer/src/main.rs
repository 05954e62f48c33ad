use anyhow::Context;
use clap::Parser;
use globe_canvas::{GlobeCanvas, HoverOverlay};
use globecore::geo::GeoRecord;
use globecore::hover::HoverTarget;
use globecore::refresh::TickTicket;
use globecore::state::GlobeState;
use globecore::sync::Counts;
use globecore::telemetry::MetricsRecorder;
use globecore::view::camera::pointer_to_ndc;
use globecore::{Category, GlobeResult};
use iced::{
    time,
    widget::{button, column, container, row, text, Canvas},
    Element, Length, Point, Size, Subscription, Task, Theme, Vector,
};
use log::{info, warn};
use scene::RenderContext;
use source::RecordSource;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod globe_canvas;
mod scene;
mod source;

use config::VisualizerConfig;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(author, version, about = "Live globe of geolocated IP records")]
struct Args {
    /// Load the visualizer config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the ingest API, e.g. http://127.0.0.1:5000
    #[arg(long)]
    api_base: Option<String>,
    /// Seconds between live refreshes
    #[arg(long)]
    interval: Option<u64>,
    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    #[arg(long)]
    max_markers: Option<usize>,
    /// Fetch every stored record once at startup
    #[arg(long, default_value_t = false)]
    load_history: bool,
    #[arg(long)]
    star_seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<VisualizerConfig> {
        let mut config = match &self.config {
            Some(path) => VisualizerConfig::load(path)?,
            None => VisualizerConfig::default(),
        };
        if let Some(api_base) = self.api_base {
            config.api_base = api_base;
        }
        if let Some(interval) = self.interval {
            config.refresh_interval_secs = interval;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(max_markers) = self.max_markers {
            config.max_markers = max_markers;
        }
        if let Some(star_seed) = self.star_seed {
            config.star_seed = star_seed;
        }
        config.load_history |= self.load_history;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Args::parse().into_config()?;
    info!(
        "visualizer polling {} every {}s",
        config.api_base, config.refresh_interval_secs
    );

    let metrics = Arc::new(MetricsRecorder::new());
    let source = RecordSource::new(config.endpoints(), config.request_timeout(), metrics.clone())
        .context("creating record source")?;

    iced::application(
        move || Visualizer::boot(&config, source.clone(), metrics.clone()),
        Visualizer::update,
        Visualizer::view,
    )
    .title(application_title)
    .subscription(application_subscription)
    .theme(application_theme)
    .run()
    .map_err(|err| anyhow::anyhow!("visualizer exited: {err}"))
}

fn application_title(_: &Visualizer) -> String {
    "IP Globe".into()
}

fn application_subscription(state: &Visualizer) -> Subscription<Message> {
    let frames = time::every(FRAME_INTERVAL).map(|_| Message::Frame);
    if state.globe.refresh().is_active() {
        Subscription::batch([
            frames,
            time::every(state.globe.refresh().interval()).map(|_| Message::Tick),
        ])
    } else {
        frames
    }
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

struct Visualizer {
    globe: GlobeState,
    render: RenderContext,
    source: RecordSource,
    hover: Option<HoverOverlay>,
    pointer: Option<Point>,
    status: String,
}

#[derive(Debug, Clone)]
pub enum Message {
    Frame,
    Tick,
    RecordsFetched(TickTicket, Vec<GeoRecord>),
    HistoryLoaded(TickTicket, Vec<GeoRecord>),
    ResetView,
    ToggleRotation,
    ToggleCategory(Category),
    ToggleLive,
    PointerMoved {
        position: Point,
        viewport: Size,
        drag: Option<Vector>,
    },
    PointerLeft,
    Zoom(f32),
    ViewportResized(Size),
}

impl Visualizer {
    fn boot(
        config: &VisualizerConfig,
        source: RecordSource,
        metrics: Arc<MetricsRecorder>,
    ) -> (Self, Task<Message>) {
        let mut globe = GlobeState::with_metrics(
            config.refresh_interval(),
            config.max_markers,
            metrics,
        );

        let task = if config.load_history {
            let ticket = globe.begin_one_shot();
            Task::perform(source.clone().fetch_all(), move |records| {
                Message::HistoryLoaded(ticket, records)
            })
        } else {
            Task::none()
        };

        (
            Visualizer {
                globe,
                render: RenderContext::new(config.star_seed),
                source,
                hover: None,
                pointer: None,
                status: "Live data stopped.".into(),
            },
            task,
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Frame => {
                state.globe.advance_frame();
                state.render.update_controls();
                state.refresh_hover();
                Task::none()
            }
            Message::Tick => match state.globe.begin_tick() {
                Some(ticket) => {
                    Task::perform(state.source.clone().fetch_recent(), move |records| {
                        Message::RecordsFetched(ticket, records)
                    })
                }
                None => Task::none(),
            },
            Message::RecordsFetched(ticket, records) => {
                let outcome = state.globe.complete_tick(ticket, records);
                state.settle(outcome);
                Task::none()
            }
            Message::HistoryLoaded(ticket, records) => {
                let outcome = state.globe.complete_one_shot(ticket, records);
                state.settle(outcome);
                Task::none()
            }
            Message::ResetView => {
                state.render.reset_view();
                state.refresh_hover();
                Task::none()
            }
            Message::ToggleRotation => {
                state.globe.toggle_rotation();
                Task::none()
            }
            Message::ToggleCategory(category) => {
                state.globe.toggle_category(category);
                state.refresh_hover();
                Task::none()
            }
            Message::ToggleLive => {
                if state.globe.refresh().is_active() {
                    state.globe.stop_live();
                    state.status = "Live data stopped.".into();
                } else {
                    state.globe.start_live();
                    state.status = format!(
                        "Live data every {}s.",
                        state.globe.refresh().interval().as_secs()
                    );
                }
                Task::none()
            }
            Message::PointerMoved {
                position,
                viewport,
                drag,
            } => {
                state
                    .render
                    .resize(viewport.width as f64, viewport.height as f64);
                if let Some(delta) = drag {
                    state.render.orbit(delta.x as f64, delta.y as f64);
                }
                state.pointer = Some(position);
                state.refresh_hover();
                Task::none()
            }
            Message::PointerLeft => {
                state.pointer = None;
                state.hover = None;
                Task::none()
            }
            Message::Zoom(steps) => {
                state.render.zoom(steps as f64);
                Task::none()
            }
            Message::ViewportResized(size) => {
                state.render.resize(size.width as f64, size.height as f64);
                Task::none()
            }
        }
    }

    fn settle(&mut self, outcome: GlobeResult<Option<Counts>>) {
        match outcome {
            Ok(Some(counts)) => {
                self.status = format!("Showing {} records.", counts.total());
                self.refresh_hover();
            }
            Ok(None) => {}
            Err(err) => {
                warn!("keeping previous markers: {err}");
                self.status = format!("Update failed: {err}");
            }
        }
    }

    /// Re-runs the hover query for the last pointer position.
    fn refresh_hover(&mut self) {
        let Some(position) = self.pointer else {
            self.hover = None;
            return;
        };
        let (width, height) = self.render.viewport();
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let ndc = pointer_to_ndc(position.x as f64, position.y as f64, width, height);
        self.hover = match self.globe.hover(&self.render.camera, ndc) {
            HoverTarget::Marker(info) => Some(HoverOverlay { position, info }),
            HoverTarget::Nothing => None,
        };
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let filters = state.globe.filters();
        let counts = state.globe.counts();
        let metrics = state.globe.metrics().snapshot();

        let controls = column![
            text("IP Globe").size(26),
            button("Reset View").on_press(Message::ResetView).padding(10),
            button(if state.globe.frame().is_rotating() {
                "Stop Rotation"
            } else {
                "Start Rotation"
            })
            .on_press(Message::ToggleRotation)
            .padding(10),
            button(if filters.show_normal {
                "Hide Green"
            } else {
                "Show Green"
            })
            .on_press(Message::ToggleCategory(Category::Normal))
            .padding(10),
            button(if filters.show_suspicious {
                "Hide Red"
            } else {
                "Show Red"
            })
            .on_press(Message::ToggleCategory(Category::Suspicious))
            .padding(10),
            button(if state.globe.refresh().is_active() {
                "Stop Live Data"
            } else {
                "Start Live Data"
            })
            .on_press(Message::ToggleLive)
            .padding(10),
            column![
                text(format!("Normal: {}", counts.normal)).size(16),
                text(format!("Suspicious: {}", counts.suspicious)).size(16),
                text(format!("Total: {}", counts.total())).size(16),
            ]
            .spacing(4),
            text(&state.status).size(14),
            text(format!(
                "Applied {} / discarded {} / empty {} / failed {} / fetch errors {}",
                metrics.applied,
                metrics.discarded,
                metrics.empty,
                metrics.failed,
                metrics.fetch_errors
            ))
            .size(12),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(260.0));

        let globe = Canvas::new(GlobeCanvas {
            globe: &state.globe,
            render: &state.render,
            hover: state.hover.as_ref(),
        })
        .width(Length::Fill)
        .height(Length::Fill);

        container(row![controls, globe])
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}
