use crate::config::Endpoints;
use anyhow::{bail, Context};
use globecore::geo::GeoRecord;
use globecore::telemetry::MetricsRecorder;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// HTTP client for the ingest API's record endpoints.
///
/// Fetches never fail from the caller's point of view: any transport error,
/// non-2xx status or undecodable body is logged, counted and turned into an
/// empty record list.
#[derive(Clone)]
pub struct RecordSource {
    client: reqwest::Client,
    endpoints: Endpoints,
    metrics: Arc<MetricsRecorder>,
}

impl RecordSource {
    pub fn new(
        endpoints: Endpoints,
        timeout: Duration,
        metrics: Arc<MetricsRecorder>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            endpoints,
            metrics,
        })
    }

    /// Records received in the most recent ingest batches.
    pub async fn fetch_recent(self) -> Vec<GeoRecord> {
        self.fetch(&self.endpoints.recent).await
    }

    /// Every record the API has seen.
    pub async fn fetch_all(self) -> Vec<GeoRecord> {
        self.fetch(&self.endpoints.all).await
    }

    async fn fetch(&self, url: &str) -> Vec<GeoRecord> {
        match fetch_records(&self.client, url).await {
            Ok(records) => {
                debug!("fetched {} records from {}", records.len(), url);
                records
            }
            Err(err) => {
                warn!("error fetching data: {:#}", err);
                self.metrics.record_fetch_error();
                Vec::new()
            }
        }
    }
}

async fn fetch_records(client: &reqwest::Client, url: &str) -> anyhow::Result<Vec<GeoRecord>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("{url} answered {status}");
    }
    response
        .json::<Vec<GeoRecord>>()
        .await
        .with_context(|| format!("decoding records from {url}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualizerConfig;
    use serde_json::json;
    use warp::http::StatusCode;
    use warp::Filter;

    fn source_for(base: String) -> (RecordSource, Arc<MetricsRecorder>) {
        let metrics = Arc::new(MetricsRecorder::new());
        let endpoints = VisualizerConfig {
            api_base: base,
            ..Default::default()
        }
        .endpoints();
        let source = RecordSource::new(endpoints, Duration::from_secs(2), metrics.clone()).unwrap();
        (source, metrics)
    }

    #[tokio::test]
    async fn fetches_both_endpoints() {
        let recent = warp::path!("api" / "recent").map(|| {
            warp::reply::json(&json!([
                {"ip": "1.2.3.4", "lat": 51.5, "lon": -0.1, "timestamp": "2024-01-01T00:00:00Z", "suspicious": 1}
            ]))
        });
        let all = warp::path!("api" / "ipdata").map(|| {
            warp::reply::json(&json!([
                {"ip": "1.2.3.4", "lat": 51.5, "lon": -0.1, "suspicious": 1},
                {"ip": "5.6.7.8", "lat": 48.8, "lon": 2.3, "suspicious": 0}
            ]))
        });
        let (addr, server) = warp::serve(recent.or(all)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let (source, metrics) = source_for(format!("http://{addr}"));
        let recent = source.clone().fetch_recent().await;
        assert_eq!(recent.len(), 1);
        assert!(recent[0].suspicious);
        assert_eq!(source.fetch_all().await.len(), 2);
        assert_eq!(metrics.snapshot().fetch_errors, 0);
    }

    #[tokio::test]
    async fn server_errors_yield_empty() {
        let failing = warp::path!("api" / "recent")
            .map(|| warp::reply::with_status("boom", StatusCode::INTERNAL_SERVER_ERROR));
        let (addr, server) = warp::serve(failing).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let (source, metrics) = source_for(format!("http://{addr}"));
        assert!(source.fetch_recent().await.is_empty());
        assert_eq!(metrics.snapshot().fetch_errors, 1);
    }

    #[tokio::test]
    async fn malformed_bodies_yield_empty() {
        let garbled = warp::path!("api" / "recent").map(|| "definitely not json");
        let (addr, server) = warp::serve(garbled).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let (source, metrics) = source_for(format!("http://{addr}"));
        assert!(source.fetch_recent().await.is_empty());
        assert_eq!(metrics.snapshot().fetch_errors, 1);
    }

    #[tokio::test]
    async fn unreachable_api_yields_empty() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let (source, metrics) = source_for(format!("http://127.0.0.1:{port}"));
        assert!(source.fetch_all().await.is_empty());
        assert_eq!(metrics.snapshot().fetch_errors, 1);
    }
}
