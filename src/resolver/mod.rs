// Query resolution
// Turns a user key (catalog identifier or free text) into a query vector


use std::collections::HashMap;
use tracing::debug;

use crate::catalog::Catalog;
use crate::embeddings::TextEmbedder;
use crate::features::TextExtractor;
use crate::{Result, ScoutError};

/// What the user asked to search from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKey {
    /// A catalog identifier whose stored vector is the query
    Entity(String),
    /// Free text embedded at query time
    Text(String),
}

impl QueryKey {
    /// Identifier when the trimmed input names a catalog entity, free text otherwise
    #[inline]
    pub fn parse(raw: &str, catalog: &Catalog) -> Self {
        let trimmed = raw.trim();
        if catalog.contains(trimmed) {
            Self::Entity(trimmed.to_string())
        } else {
            Self::Text(raw.to_string())
        }
    }
}

struct TextMode<'a> {
    embedder: &'a dyn TextEmbedder,
    extractor: TextExtractor,
}

/// Looks up precomputed vectors by identifier and, when enabled, embeds free text
pub struct QueryResolver<'a> {
    catalog: &'a Catalog,
    vectors: Vec<Vec<f32>>,
    slots: HashMap<usize, usize>,
    text: Option<TextMode<'a>>,
}

impl<'a> QueryResolver<'a> {
    /// `vectors[i]` belongs to catalog position `i`
    #[inline]
    pub fn new(catalog: &'a Catalog, vectors: Vec<Vec<f32>>) -> Self {
        let slots = (0..vectors.len()).map(|i| (i, i)).collect();
        Self {
            catalog,
            vectors,
            slots,
            text: None,
        }
    }

    /// Re-map vectors onto catalog positions: `vectors[i]` belongs to `members[i]`
    #[inline]
    #[must_use]
    pub fn with_members(mut self, members: &[usize]) -> Self {
        self.slots = members
            .iter()
            .enumerate()
            .map(|(slot, &position)| (position, slot))
            .collect();
        self
    }

    /// Enable free-text queries
    #[inline]
    #[must_use]
    pub fn with_text(mut self, embedder: &'a dyn TextEmbedder, extractor: TextExtractor) -> Self {
        self.text = Some(TextMode {
            embedder,
            extractor,
        });
        self
    }

    #[inline]
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    #[inline]
    pub fn accepts_text(&self) -> bool {
        self.text.is_some()
    }

    /// Vector for an identifier or a piece of text
    #[inline]
    pub fn resolve(&self, key: &QueryKey) -> Result<Vec<f32>> {
        match key {
            QueryKey::Entity(id) => self.lookup(id),
            QueryKey::Text(text) => match &self.text {
                Some(mode) => self.embed(mode, text),
                None => self.lookup(text.trim()),
            },
        }
    }

    fn lookup(&self, id: &str) -> Result<Vec<f32>> {
        self.catalog
            .position(id)
            .and_then(|position| self.slots.get(&position))
            .and_then(|&slot| self.vectors.get(slot))
            .cloned()
            .ok_or_else(|| ScoutError::NotFound(format!("'{}'", id)))
    }

    fn embed(&self, mode: &TextMode<'_>, text: &str) -> Result<Vec<f32>> {
        debug!("Embedding free-text query '{}'", text);
        let vector = mode.extractor.extract_text(text, mode.embedder)?;

        if let Some(expected) = self.vectors.first().map(Vec::len) {
            if vector.len() != expected {
                return Err(ScoutError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        Ok(vector)
    }
}
