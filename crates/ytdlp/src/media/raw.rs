//! Serde view of the engine's `--dump-json` document.
//!
//! Field names are the engine's own. Everything is optional because the
//! engine omits keys freely depending on site and format kind.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormatRecord>,
}

/// One downloadable variant as reported by the engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormatRecord {
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Average audio bitrate in kbps.
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    /// The engine computes this one; it can come back fractional.
    #[serde(default)]
    pub filesize_approx: Option<f64>,
}

impl RawFormatRecord {
    // The engine reports an absent codec as the literal string "none".

    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref().is_some_and(|c| c != "none")
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref().is_some_and(|c| c != "none")
    }
}
