//! Normalization of the engine's raw format list into the user-facing
//! catalog.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::raw::{RawFormatRecord, RawMetadata};

/// Container label attached to a catalog entry.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaContainer {
    Mp4,
    Mp3,
}

impl MediaContainer {
    pub fn as_str(&self) -> &str {
        match self {
            MediaContainer::Mp4 => "MP4",
            MediaContainer::Mp3 => "MP3",
        }
    }
}

/// Whether an entry is a muxed video+audio variant or audio alone.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormatRole {
    Video,
    Audio,
}

/// One presentable download option.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    /// "720p" for video entries, "128kbps" for audio entries.
    pub quality: String,
    pub container: MediaContainer,
    pub source_url: String,
    pub role: FormatRole,
    pub size_bytes: u64,
}

/// Response payload: title, thumbnail and the ranked format list.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VideoCatalog {
    pub title: String,
    pub thumbnail_url: String,
    pub formats: Vec<FormatDescriptor>,
}

/// Build the catalog from the engine's raw format list.
///
/// The engine emits formats sorted by `-S res,vcodec:h264` with the least
/// preferred variant first (empirical, not contractual), so the projected
/// list is reversed before deduplication to keep the best representative of
/// each `(quality, container)` tier.
pub fn normalize(raw: &RawMetadata) -> VideoCatalog {
    let mut formats: Vec<FormatDescriptor> = raw
        .formats
        .iter()
        .filter(|record| is_eligible(record))
        .map(project)
        .filter(|descriptor| descriptor.size_bytes > 0)
        .collect();

    formats.reverse();

    let mut seen = HashSet::new();
    formats.retain(|descriptor| seen.insert((descriptor.quality.clone(), descriptor.container)));

    VideoCatalog {
        title: raw.title.clone().unwrap_or_default(),
        thumbnail_url: raw.thumbnail.clone().unwrap_or_default(),
        formats,
    }
}

/// Muxed video+audio or audio-only. Muted video-only streams and codec-less
/// placeholder records are dropped.
fn is_eligible(record: &RawFormatRecord) -> bool {
    let has_url = record.url.as_deref().is_some_and(|u| !u.is_empty());
    has_url
        && ((record.has_video() && record.has_audio())
            || (!record.has_video() && record.has_audio()))
}

fn project(record: &RawFormatRecord) -> FormatDescriptor {
    let audio_only = !record.has_video();
    let quality = if audio_only {
        format!("{}kbps", record.abr.unwrap_or_default().round() as u64)
    } else {
        format!("{}p", record.height.unwrap_or_default())
    };

    FormatDescriptor {
        quality,
        container: if audio_only {
            MediaContainer::Mp3
        } else {
            MediaContainer::Mp4
        },
        source_url: record.url.clone().unwrap_or_default(),
        role: if audio_only {
            FormatRole::Audio
        } else {
            FormatRole::Video
        },
        size_bytes: record
            .filesize
            .or_else(|| record.filesize_approx.map(|approx| approx as u64))
            .unwrap_or(0),
    }
}
