//! Embedded cover extraction from EPUB archives.
//!
//! ### Lookup
//! - `META-INF/container.xml` -> `rootfile@full-path` -> OPF package document.
//! - Cover href precedence: `properties="cover-image"`, then `<meta name="cover">`,
//!   then a manifest id of `cover` / `cover-image` / `coverimage`.
//! - The href is resolved against the OPF directory.
//!
//! ### Failure classes
//! - **Malformed**: unreadable archive, missing container, rootfile or OPF, or an
//!   entry that decompresses past [`MAX_ENTRY_BYTES`].
//! - **NotFound**: no cover reference, or the reference points outside the archive.
//!
//! Both are recoverable; callers fall back to an external lookup.

pub mod package;

pub use package::{CoverStrategy, ManifestItem, PackageDocument, rootfile_path};

use std::io::{Cursor, Read};

use bytes::Bytes;
use zip::ZipArchive;
use zip::result::ZipError;

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Largest archive entry read into memory, after decompression.
pub const MAX_ENTRY_BYTES: u64 = 16 * 1024 * 1024;

/// Errors from embedded cover extraction.
#[derive(Debug, thiserror::Error)]
pub enum EpubError {
    /// The bytes are not a readable zip archive.
    #[error("invalid EPUB: {0}")]
    Archive(String),

    /// `META-INF/container.xml` is absent.
    #[error("invalid EPUB: no container.xml")]
    MissingContainer,

    /// container.xml has no rootfile `full-path`.
    #[error("invalid EPUB: no rootfile")]
    MissingRootfile,

    /// The rootfile path does not exist in the archive.
    #[error("invalid EPUB: OPF not found at {0}")]
    MissingPackage(String),

    /// An entry decompresses to more than the allowed size.
    #[error("invalid EPUB: {name} exceeds {limit} bytes")]
    EntryTooLarge { name: String, limit: u64 },

    /// The package document declares no cover.
    #[error("no cover reference in package document")]
    NoCoverReference,

    /// The declared cover is not present in the archive.
    #[error("cover {0} is not present in the archive")]
    MissingCoverEntry(String),
}

impl EpubError {
    /// Whether the archive itself is unusable, as opposed to merely coverless.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, EpubError::NoCoverReference | EpubError::MissingCoverEntry(_))
    }
}

/// A cover image read out of an EPUB archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedCover {
    /// Path of the image inside the archive.
    pub path: String,
    /// MIME type inferred from the file extension.
    pub content_type: &'static str,
    pub bytes: Bytes,
    pub strategy: CoverStrategy,
}

/// Title and author declared in the package document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpubMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

fn open_archive(bytes: &[u8]) -> Result<Archive<'_>, EpubError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| EpubError::Archive(e.to_string()))
}

/// Read an archive entry, mapping a missing entry to `None`.
///
/// The declared size in the central directory is only a hint; at most
/// `limit` decompressed bytes are read before the entry is rejected.
fn read_entry(archive: &mut Archive<'_>, name: &str, limit: u64) -> Result<Option<Vec<u8>>, EpubError> {
    let file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(EpubError::Archive(e.to_string())),
    };

    let mut buf = Vec::with_capacity(file.size().min(limit) as usize);
    file.take(limit + 1)
        .read_to_end(&mut buf)
        .map_err(|e| EpubError::Archive(e.to_string()))?;

    if buf.len() as u64 > limit {
        return Err(EpubError::EntryTooLarge { name: name.to_string(), limit });
    }
    Ok(Some(buf))
}

/// Open the archive and return it with the OPF path and parsed package document.
fn open_package(bytes: &[u8]) -> Result<(Archive<'_>, String, PackageDocument), EpubError> {
    let mut archive = open_archive(bytes)?;

    let container = read_entry(&mut archive, CONTAINER_PATH, MAX_ENTRY_BYTES)?.ok_or(EpubError::MissingContainer)?;
    let opf_path = rootfile_path(&String::from_utf8_lossy(&container)).ok_or(EpubError::MissingRootfile)?;

    let opf = read_entry(&mut archive, &opf_path, MAX_ENTRY_BYTES)?
        .ok_or_else(|| EpubError::MissingPackage(opf_path.clone()))?;
    let package = PackageDocument::parse(&String::from_utf8_lossy(&opf));

    Ok((archive, opf_path, package))
}

/// Locate and read the embedded cover image.
pub fn locate(bytes: &[u8]) -> Result<EmbeddedCover, EpubError> {
    let (mut archive, opf_path, package) = open_package(bytes)?;

    let (href, strategy) = package.cover_href().ok_or(EpubError::NoCoverReference)?;
    let path = resolve_href(&opf_path, href);
    tracing::debug!("cover reference {:?} resolved to {} via {:?}", href, path, strategy);

    let image = read_entry(&mut archive, &path, MAX_ENTRY_BYTES)?
        .ok_or_else(|| EpubError::MissingCoverEntry(path.clone()))?;

    Ok(EmbeddedCover { content_type: content_type_for(&path), path, bytes: Bytes::from(image), strategy })
}

/// Read the title and author declared in the package document.
pub fn read_metadata(bytes: &[u8]) -> Result<EpubMetadata, EpubError> {
    let (_, _, package) = open_package(bytes)?;
    Ok(EpubMetadata { title: package.title, author: package.creator })
}

/// Resolve a manifest href against the directory of the OPF document.
///
/// `.` segments (including a leading `./`) are dropped and `..` segments pop
/// the previous component; they never climb above the archive root.
pub fn resolve_href(opf_path: &str, href: &str) -> String {
    let opf_dir = opf_path.rfind('/').map(|idx| &opf_path[..=idx]).unwrap_or("");
    let joined = format!("{opf_dir}{href}");

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Infer an image MIME type from a file extension, defaulting to JPEG.
pub fn content_type_for(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
