//! OPF package document and container.xml parsing.
//!
//! Both documents are read with a streaming pull parser. Parsing is lenient:
//! a syntax error stops the scan but keeps everything collected up to that
//! point, since real-world EPUBs frequently carry slightly broken markup.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Manifest ids conventionally used for cover images.
const CONVENTIONAL_COVER_IDS: &[&str] = &["cover", "cover-image", "coverimage"];

/// How the cover href was found in the package document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverStrategy {
    /// Manifest item with `properties="cover-image"` (EPUB 3).
    CoverImageProperty,
    /// `<meta name="cover" content="ID">` pointing at a manifest id (EPUB 2).
    MetaCover,
    /// Manifest item whose id is one of the conventional cover ids.
    ConventionalId,
}

/// A manifest `<item>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: Option<String>,
    pub href: Option<String>,
    pub properties: Option<String>,
    pub media_type: Option<String>,
}

impl ManifestItem {
    fn has_property(&self, name: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == name))
    }
}

/// The parts of an OPF document the cover pipeline cares about.
#[derive(Debug, Clone, Default)]
pub struct PackageDocument {
    pub manifest: Vec<ManifestItem>,
    /// Content of `<meta name="cover">`, if declared.
    pub cover_meta: Option<String>,
    /// First `dc:title`.
    pub title: Option<String>,
    /// First `dc:creator`.
    pub creator: Option<String>,
}

#[derive(Clone, Copy)]
enum TextField {
    Title,
    Creator,
}

impl PackageDocument {
    /// Parse an OPF document.
    pub fn parse(xml: &str) -> Self {
        let mut doc = PackageDocument::default();
        let mut reader = Reader::from_str(xml);
        let config = reader.config_mut();
        config.trim_text(true);
        config.check_end_names = false;

        let mut text_target: Option<TextField> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    text_target = doc.visit_element(&e);
                }
                Ok(Event::Empty(e)) => {
                    doc.visit_element(&e);
                    text_target = None;
                }
                Ok(Event::Text(t)) => {
                    if let Some(field) = text_target.take() {
                        let value = match t.unescape() {
                            Ok(text) => text.into_owned(),
                            Err(_) => String::from_utf8_lossy(&t).into_owned(),
                        };
                        doc.set_text(field, value);
                    }
                }
                Ok(Event::End(_)) => text_target = None,
                Ok(Event::Eof) => break,
                Err(e) => {
                    tracing::debug!(
                        "package document parse stopped at byte {}: {}",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
                Ok(_) => {}
            }
        }

        doc
    }

    fn visit_element(&mut self, e: &BytesStart<'_>) -> Option<TextField> {
        match e.local_name().as_ref() {
            b"item" => {
                let mut item = ManifestItem::default();
                for (key, value) in attributes(e) {
                    match key.as_str() {
                        "id" => item.id = Some(value),
                        "href" => item.href = Some(value),
                        "properties" => item.properties = Some(value),
                        "media-type" => item.media_type = Some(value),
                        _ => {}
                    }
                }
                self.manifest.push(item);
                None
            }
            b"meta" => {
                let attrs = attributes(e);
                let is_cover = attrs.iter().any(|(k, v)| k == "name" && v == "cover");
                if is_cover && self.cover_meta.is_none() {
                    self.cover_meta = attrs.into_iter().find(|(k, _)| k == "content").map(|(_, v)| v);
                }
                None
            }
            b"title" if self.title.is_none() => Some(TextField::Title),
            b"creator" if self.creator.is_none() => Some(TextField::Creator),
            _ => None,
        }
    }

    fn set_text(&mut self, field: TextField, value: String) {
        let value = value.trim().to_string();
        if value.is_empty() {
            return;
        }
        match field {
            TextField::Title => self.title = Some(value),
            TextField::Creator => self.creator = Some(value),
        }
    }

    fn item_by_id(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id.as_deref() == Some(id))
    }

    /// Find the cover href, trying each strategy in precedence order.
    pub fn cover_href(&self) -> Option<(&str, CoverStrategy)> {
        let by_property = self
            .manifest
            .iter()
            .find(|item| item.has_property("cover-image"))
            .and_then(|item| item.href.as_deref());
        if let Some(href) = by_property {
            return Some((href, CoverStrategy::CoverImageProperty));
        }

        let by_meta = self
            .cover_meta
            .as_deref()
            .and_then(|id| self.item_by_id(id))
            .and_then(|item| item.href.as_deref());
        if let Some(href) = by_meta {
            return Some((href, CoverStrategy::MetaCover));
        }

        self.manifest
            .iter()
            .find(|item| {
                item.id
                    .as_deref()
                    .is_some_and(|id| CONVENTIONAL_COVER_IDS.iter().any(|c| id.eq_ignore_ascii_case(c)))
            })
            .and_then(|item| item.href.as_deref())
            .map(|href| (href, CoverStrategy::ConventionalId))
    }
}

/// Extract the `full-path` of the first `<rootfile>` in container.xml.
pub fn rootfile_path(container_xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(container_xml);
    reader.config_mut().check_end_names = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"rootfile" => {
                let path = attributes(&e)
                    .into_iter()
                    .find(|(k, v)| k == "full-path" && !v.is_empty())
                    .map(|(_, v)| v);
                if path.is_some() {
                    return path;
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Decoded (local name, value) pairs, skipping attributes that fail to parse.
fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .with_checks(false)
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            (key, value)
        })
        .collect()
}
