//! Engine runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use ytdlp_bridge::ReleaseSource;
use ytdlp_bridge::runner::DEFAULT_BUDGET;

/// Where the engine binary lives, where it is fetched from, and how long one
/// extraction may run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Staging location for the engine binary.
    pub binary_path: PathBuf,
    /// Release asset to fetch when the binary is absent.
    pub download_url: String,
    /// Hard wall-clock budget for one extraction.
    pub budget: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            download_url: ReleaseSource::default_url().to_string(),
            budget: DEFAULT_BUDGET,
        }
    }
}

impl EngineConfig {
    /// Load engine config from environment variables, falling back to
    /// defaults.
    ///
    /// Supported env vars:
    /// - `YTDLP_PATH` (e.g. "/tmp/yt-dlp")
    /// - `YTDLP_DOWNLOAD_URL`
    /// - `EXTRACTION_BUDGET_SECS`
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("YTDLP_PATH")
            && !path.trim().is_empty()
        {
            config.binary_path = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("YTDLP_DOWNLOAD_URL")
            && !url.trim().is_empty()
        {
            config.download_url = url;
        }

        if let Ok(secs) = std::env::var("EXTRACTION_BUDGET_SECS")
            && let Ok(parsed) = secs.parse::<u64>()
            && parsed > 0
        {
            config.budget = Duration::from_secs(parsed);
        }

        config
    }
}

/// The runtime exposes one writable directory with no durability guarantee;
/// the binary is staged there and re-checked on every cold start.
fn default_binary_path() -> PathBuf {
    let name = if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    };
    std::env::temp_dir().join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.budget, DEFAULT_BUDGET);
        assert!(config.download_url.starts_with("https://github.com/yt-dlp/"));
        assert!(
            config
                .binary_path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with("yt-dlp"))
        );
    }
}
