//! Bridge to the yt-dlp extraction engine.
//!
//! Three pieces, used in sequence by the server:
//! - [`provision::EngineProvisioner`] stages the engine binary into the
//!   runtime's one writable directory, once per process, no matter how many
//!   requests race for it.
//! - [`runner::Extractor`] runs the staged binary against a URL under a hard
//!   wall-clock budget and parses its JSON document.
//! - [`media::catalog::normalize`] turns the raw format list into the
//!   de-duplicated, ranked catalog presented to users.

pub mod error;
pub mod media;
pub mod provision;
pub mod runner;

pub use error::{ExtractorError, ProvisionError};
pub use media::catalog::{FormatDescriptor, FormatRole, MediaContainer, VideoCatalog, normalize};
pub use media::raw::{RawFormatRecord, RawMetadata};
pub use provision::{EngineProvisioner, EngineSource, ReleaseSource};
pub use runner::Extractor;
