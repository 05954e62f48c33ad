use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Scheme, host and port of the ingest API.
    pub api_base: String,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub max_markers: usize,
    /// Fetch the full history once at startup.
    pub load_history: bool,
    pub star_seed: u64,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5000".into(),
            refresh_interval_secs: 5,
            request_timeout_secs: 10,
            max_markers: globecore::state::DEFAULT_MAX_MARKERS,
            load_history: false,
            star_seed: 7,
        }
    }
}

/// The two record endpoints exposed by the ingest API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub all: String,
    pub recent: String,
}

impl VisualizerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading visualizer config {}", path_ref.display()))?;
        let config: VisualizerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing visualizer config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.api_base.starts_with("http://") || self.api_base.starts_with("https://"),
            "api_base must be an http(s) URL, got {}",
            self.api_base
        );
        ensure!(
            self.refresh_interval_secs >= 1,
            "refresh interval must be at least one second"
        );
        ensure!(
            self.request_timeout_secs >= 1,
            "request timeout must be at least one second"
        );
        ensure!(self.max_markers >= 1, "max_markers must be at least 1");
        Ok(())
    }

    pub fn endpoints(&self) -> Endpoints {
        let base = self.api_base.trim_end_matches('/');
        Endpoints {
            all: format!("{base}/api/ipdata"),
            recent: format!("{base}/api/recent"),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_reference_behaviour() {
        let cfg = VisualizerConfig::default();
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(5));
        assert_eq!(cfg.endpoints().recent, "http://127.0.0.1:5000/api/recent");
        cfg.validate().unwrap();
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"api_base: http://collector:5000/\nrefresh_interval_secs: 2\nload_history: true\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = VisualizerConfig::load(&path).unwrap();
        assert_eq!(cfg.refresh_interval_secs, 2);
        assert!(cfg.load_history);
        assert_eq!(cfg.request_timeout_secs, 10);
        assert_eq!(cfg.endpoints().all, "http://collector:5000/api/ipdata");
    }

    #[test]
    fn config_load_reports_bad_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"refresh_interval_secs: [oops\n").unwrap();
        let path = temp.into_temp_path();
        let err = VisualizerConfig::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("parsing visualizer config"));
    }

    #[test]
    fn validation_rejects_zero_interval() {
        let cfg = VisualizerConfig {
            refresh_interval_secs: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = VisualizerConfig {
            api_base: "collector:5000".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
