//! Cover resolution for lectio.
//!
//! This crate provides the embedded-cover locator, the Open Library client,
//! image transcoding and the pipeline that ties them to the cover cache.

pub mod epub;
pub mod openlibrary;
pub mod placeholder;
pub mod resolver;
pub mod service;
pub mod transcode;

#[cfg(test)]
pub(crate) mod testing;

pub use epub::{CoverStrategy, EmbeddedCover, EpubError, EpubMetadata, locate, read_metadata};
pub use openlibrary::{CoverSource, LookupError, OpenLibraryClient, OpenLibraryConfig};
pub use resolver::{ExternalCoverResolver, ExternalOutcome};
pub use service::{CoverImage, CoverOrigin, CoverRequest, CoverService};
pub use transcode::{TranscodeError, Transcoder};
