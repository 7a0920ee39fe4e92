//! Test fixtures: in-memory EPUB archives, synthetic images and a scripted cover source.

use std::io::{Cursor, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::openlibrary::{CoverSource, LookupError, SearchDoc, SearchRequest, SearchResponse};

/// Builds EPUB archives in memory.
pub(crate) struct EpubBuilder {
    opf_path: Option<String>,
    files: Vec<(String, Vec<u8>, SimpleFileOptions)>,
}

fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored)
}

impl EpubBuilder {
    /// Archive with a mimetype entry and a container pointing at `opf_path`.
    pub(crate) fn new(opf_path: &str) -> Self {
        let container = format!(
            r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{opf_path}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#
        );
        Self::without_container()
            .with_opf_path(opf_path)
            .file("META-INF/container.xml", container.as_bytes())
    }

    /// Archive with only a mimetype entry.
    pub(crate) fn without_container() -> Self {
        Self { opf_path: None, files: vec![("mimetype".into(), b"application/epub+zip".to_vec(), stored())] }
    }

    fn with_opf_path(mut self, path: &str) -> Self {
        self.opf_path = Some(path.to_string());
        self
    }

    /// Write the package document at the container's rootfile path.
    pub(crate) fn opf(self, xml: &str) -> Self {
        let path = self.opf_path.clone().unwrap_or_else(|| "content.opf".to_string());
        self.file(&path, xml.as_bytes())
    }

    pub(crate) fn file(self, name: &str, bytes: &[u8]) -> Self {
        self.file_with(name, bytes, stored())
    }

    /// Add an entry written with explicit zip options.
    pub(crate) fn file_with(mut self, name: &str, bytes: &[u8], options: SimpleFileOptions) -> Self {
        self.files.push((name.to_string(), bytes.to_vec(), options));
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes, options) in self.files {
            writer.start_file(name, options).unwrap();
            writer.write_all(&bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

/// Rewrite the uncompressed size that the central directory declares for `name`.
///
/// Entries written with `large_file(true)` carry a zip64 extra field, whose
/// first value is the uncompressed size; otherwise the 32-bit field is patched.
pub(crate) fn declare_uncompressed_size(archive: &mut [u8], name: &str, size: u64) {
    const CENTRAL_HEADER: [u8; 4] = [0x50, 0x4B, 0x01, 0x02];
    let u16_at = |buf: &[u8], at: usize| u16::from_le_bytes([buf[at], buf[at + 1]]) as usize;

    let mut pos = 0;
    while pos + 46 <= archive.len() {
        if archive[pos..pos + 4] != CENTRAL_HEADER {
            pos += 1;
            continue;
        }
        let name_len = u16_at(archive, pos + 28);
        let extra_len = u16_at(archive, pos + 30);
        let comment_len = u16_at(archive, pos + 32);
        let name_start = pos + 46;
        if &archive[name_start..name_start + name_len] != name.as_bytes() {
            pos = name_start + name_len + extra_len + comment_len;
            continue;
        }

        if archive[pos + 24..pos + 28] == [0xFF; 4] {
            let mut field = name_start + name_len;
            let extra_end = field + extra_len;
            while field + 4 <= extra_end {
                let id = u16_at(archive, field);
                let len = u16_at(archive, field + 2);
                if id == 0x0001 && len >= 8 {
                    archive[field + 4..field + 12].copy_from_slice(&size.to_le_bytes());
                    return;
                }
                field += 4 + len;
            }
        }
        archive[pos + 24..pos + 28].copy_from_slice(&(size.min(u64::from(u32::MAX) - 1) as u32).to_le_bytes());
        return;
    }
    panic!("no central directory entry for {name}");
}

/// EPUB 3 package document with the given manifest items and extra metadata.
pub(crate) fn opf_with_manifest(items: &str, meta: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:0000</dc:identifier>
    <dc:title>Test Book</dc:title>
    <dc:creator>Test Author</dc:creator>
    {meta}
  </metadata>
  <manifest>
    {items}
  </manifest>
  <spine/>
</package>"#
    )
}

/// A PNG of the given size filled with a gradient.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Scripted [`CoverSource`] that records every call.
pub(crate) struct FakeSource {
    search: Result<Vec<Option<i64>>, LookupError>,
    image: Result<Bytes, LookupError>,
    pub(crate) search_calls: AtomicUsize,
    pub(crate) fetch_calls: AtomicUsize,
    queries: Mutex<Vec<(String, u8)>>,
    fetched: Mutex<Vec<u64>>,
}

impl FakeSource {
    fn scripted(search: Result<Vec<Option<i64>>, LookupError>, image: Result<Bytes, LookupError>) -> Self {
        Self {
            search,
            image,
            search_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// One candidate with `cover_id`, serving `image` for it.
    pub(crate) fn with_cover(cover_id: i64, image: Vec<u8>) -> Self {
        Self::scripted(Ok(vec![Some(cover_id)]), Ok(Bytes::from(image)))
    }

    /// Candidates with the given cover ids, serving a small PNG for any fetch.
    pub(crate) fn with_docs(cover_ids: Vec<Option<i64>>) -> Self {
        Self::scripted(Ok(cover_ids), Ok(Bytes::from(png_bytes(60, 90))))
    }

    /// Successful search with zero candidates.
    pub(crate) fn no_results() -> Self {
        Self::with_docs(Vec::new())
    }

    /// Every search fails with `err`.
    pub(crate) fn failing(err: LookupError) -> Self {
        Self::scripted(Err(err), Ok(Bytes::new()))
    }

    /// Every image fetch fails with `err`.
    pub(crate) fn with_fetch_error(mut self, err: LookupError) -> Self {
        self.image = Err(err);
        self
    }

    pub(crate) fn queries(&self) -> Vec<(String, u8)> {
        self.queries.lock().unwrap().clone()
    }

    pub(crate) fn fetched_ids(&self) -> Vec<u64> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl CoverSource for FakeSource {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, LookupError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push((request.q.clone(), request.limit));
        let ids = self.search.clone()?;
        let docs: Vec<SearchDoc> = ids.into_iter().map(|cover_i| SearchDoc { cover_i }).collect();
        Ok(SearchResponse { num_found: docs.len() as u64, docs })
    }

    async fn fetch_cover(&self, cover_id: u64) -> Result<Bytes, LookupError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(cover_id);
        self.image.clone()
    }
}
