//! Open Library search response types.

use serde::Deserialize;

/// Raw response from `GET /search.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default, alias = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

/// One search hit. Only the cover id is requested.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SearchDoc {
    #[serde(default)]
    pub cover_i: Option<i64>,
}

impl SearchResponse {
    /// Cover id of the first document that has one, in API order.
    pub fn first_cover_id(&self) -> Option<u64> {
        self.docs
            .iter()
            .find_map(|doc| doc.cover_i.filter(|id| *id > 0))
            .map(|id| id as u64)
    }
}
