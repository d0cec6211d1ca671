//! Bounded invocation of the extraction engine.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ExtractorError;
use crate::media::raw::RawMetadata;

/// Hard wall-clock budget for one engine run. Kept under the hosting
/// environment's ~15s request ceiling so a timeout still produces a clean
/// response instead of the outer environment killing the request mid-flight.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(14);

// Upper bounds on captured bytes per stream; a misbehaving engine cannot
// grow memory past these.
const MAX_STDOUT_BYTES: u64 = 16 * 1024 * 1024;
const MAX_STDERR_BYTES: u64 = 256 * 1024;

/// Fixed, non-interactive argument set. Load-bearing for compatibility with
/// the wrapped engine; keep bit-exact.
const ENGINE_ARGS: [&str; 6] = [
    "--dump-json",
    "--no-playlist",
    "--no-warnings",
    "--no-check-certificate",
    "--format-sort",
    "res,vcodec:h264",
];

/// Runs the engine binary against a URL and parses its JSON document.
///
/// No retries here; each request gets exactly one attempt and the caller
/// decides what to do with a failure.
pub struct Extractor {
    engine_path: PathBuf,
    budget: Duration,
}

impl Extractor {
    pub fn new(engine_path: impl Into<PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            budget: DEFAULT_BUDGET,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub async fn fetch_metadata(&self, url: &str) -> Result<RawMetadata, ExtractorError> {
        let mut command = Command::new(&self.engine_path);
        command
            .args(ENGINE_ARGS)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // If the deadline fires the drive future is dropped; this reaps
            // the child instead of leaking it.
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(ExtractorError::SpawnFailed)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractorError::Other("failed to capture engine stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractorError::Other("failed to capture engine stderr".to_string()))?;

        let drive = async move {
            let mut out = Vec::new();
            let mut err = Vec::new();
            let mut stdout = stdout.take(MAX_STDOUT_BYTES);
            let mut stderr = stderr.take(MAX_STDERR_BYTES);
            tokio::try_join!(stdout.read_to_end(&mut out), stderr.read_to_end(&mut err))?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, out, err))
        };

        let (status, out, err) = tokio::select! {
            result = drive => result
                .map_err(|error| ExtractorError::Other(format!("engine i/o failed: {error}")))?,
            _ = tokio::time::sleep(self.budget) => {
                warn!(url, budget_secs = self.budget.as_secs(), "engine run exceeded its budget");
                return Err(ExtractorError::Timeout(self.budget));
            }
        };

        if !status.success() {
            let stderr_text = String::from_utf8_lossy(&err);
            debug!(url, stderr = %stderr_text, "engine exited non-zero");
            return Err(classify_engine_failure(&stderr_text));
        }

        Ok(serde_json::from_slice(&out)?)
    }
}

#[derive(Debug, Clone, Copy)]
enum FailureKind {
    Unsupported,
    Restricted,
}

/// Ordered, case-sensitive markers scanned top-to-bottom. Best-effort: the
/// engine's stderr is free text, not a versioned contract, so anything
/// unmatched falls through as an unknown failure.
const FAILURE_RULES: [(&str, FailureKind); 3] = [
    ("Unsupported URL", FailureKind::Unsupported),
    ("Private video", FailureKind::Restricted),
    ("Video unavailable", FailureKind::Restricted),
];

fn classify_engine_failure(stderr: &str) -> ExtractorError {
    for (marker, kind) in FAILURE_RULES {
        if stderr.contains(marker) {
            return match kind {
                FailureKind::Unsupported => ExtractorError::UnsupportedSource,
                FailureKind::Restricted => ExtractorError::RestrictedSource,
            };
        }
    }
    ExtractorError::Other(last_diagnostic_line(stderr))
}

/// The engine prints its "ERROR: ..." line last; surface that rather than
/// the whole stream.
fn last_diagnostic_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("engine failed without diagnostics")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unsupported_url() {
        let error = classify_engine_failure("ERROR: Unsupported URL: https://x");
        assert!(matches!(error, ExtractorError::UnsupportedSource));
    }

    #[test]
    fn test_classify_private_video() {
        let error = classify_engine_failure(
            "ERROR: [youtube] abc: Private video. Sign in if you've been granted access",
        );
        assert!(matches!(error, ExtractorError::RestrictedSource));
    }

    #[test]
    fn test_classify_video_unavailable() {
        let error = classify_engine_failure("ERROR: [youtube] abc: Video unavailable");
        assert!(matches!(error, ExtractorError::RestrictedSource));
    }

    #[test]
    fn test_classification_is_case_sensitive() {
        let error = classify_engine_failure("ERROR: unsupported url: https://x");
        assert!(matches!(error, ExtractorError::Other(_)));
    }

    #[test]
    fn test_unmatched_text_surfaces_last_line() {
        let error = classify_engine_failure("WARNING: something\nERROR: disk on fire\n");
        match error {
            ExtractorError::Other(message) => assert_eq!(message, "ERROR: disk on fire"),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_spawn_failure() {
        let extractor = Extractor::new("/nonexistent/engine-binary");
        let error = extractor
            .fetch_metadata("https://example.com/v")
            .await
            .unwrap_err();
        assert!(matches!(error, ExtractorError::SpawnFailed(_)));
    }
}
