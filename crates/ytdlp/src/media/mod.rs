pub mod catalog;
pub mod raw;

pub use catalog::{FormatDescriptor, FormatRole, MediaContainer, VideoCatalog};
pub use raw::{RawFormatRecord, RawMetadata};
