// Similarity search
// Ties the catalog, a feature extractor, the vector index and the query resolver together


use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{Catalog, Entity};
use crate::embeddings::TextEmbedder;
use crate::features::{MissingValues, Scaling, StatExtractor, TextExtractor};
use crate::index::{Metric, Neighbor, VectorIndex};
use crate::resolver::{QueryKey, QueryResolver};
use crate::{Result, ScoutError};

/// A search hit resolved back to its catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Match<'a> {
    pub entity: &'a Entity,
    /// Catalog position
    pub position: usize,
    /// Metric value, see [`Metric::is_similarity`]
    pub distance: f32,
}

/// k-NN over one vector representation of a catalog
pub struct SimilaritySearch<'a> {
    catalog: &'a Catalog,
    members: Vec<usize>,
    resolver: QueryResolver<'a>,
    index: VectorIndex,
}

impl<'a> SimilaritySearch<'a> {
    /// `vectors[i]` represents the catalog entity at `members[i]`
    #[inline]
    pub fn from_vectors(
        catalog: &'a Catalog,
        members: Vec<usize>,
        vectors: Vec<Vec<f32>>,
        metric: Metric,
    ) -> Result<Self> {
        if members.len() != vectors.len() {
            return Err(ScoutError::Catalog(format!(
                "{} vectors for {} catalog rows",
                vectors.len(),
                members.len()
            )));
        }
        if let Some(&position) = members.iter().find(|&&p| p >= catalog.len()) {
            return Err(ScoutError::Catalog(format!(
                "Row {} is outside a catalog of {} rows",
                position,
                catalog.len()
            )));
        }

        let index = VectorIndex::build(&vectors, metric)?;
        let resolver = QueryResolver::new(catalog, vectors).with_members(&members);

        Ok(Self {
            catalog,
            members,
            resolver,
            index,
        })
    }

    /// Numeric variant over stat columns
    ///
    /// With [`MissingValues::Drop`] rows lacking any column are left out of both the
    /// standardization and the index.
    #[inline]
    pub fn stats(
        catalog: &'a Catalog,
        columns: &[String],
        scaling: Scaling,
        metric: Metric,
        missing: MissingValues,
    ) -> Result<Self> {
        let completeness = StatExtractor::fit(catalog, columns, Scaling::Raw)?;
        let members: Vec<usize> = match missing {
            MissingValues::Zero => (0..catalog.len()).collect(),
            MissingValues::Drop => catalog
                .entities()
                .iter()
                .enumerate()
                .filter(|(_, entity)| completeness.is_complete(entity))
                .map(|(position, _)| position)
                .collect(),
        };
        debug!(
            "Using {} of {} rows for {:?}",
            members.len(),
            catalog.len(),
            columns
        );

        let extractor = StatExtractor::fit_on(catalog, &members, columns, scaling)?;
        let vectors = members
            .iter()
            .filter_map(|&position| catalog.get(position))
            .map(|entity| extractor.extract(entity))
            .collect();

        info!(
            "Built {} stat index over {} rows",
            metric,
            members.len()
        );
        Self::from_vectors(catalog, members, vectors, metric)
    }

    /// Embedding variant; the whole catalog goes through the embedder in one batch
    #[inline]
    pub fn text(
        catalog: &'a Catalog,
        extractor: TextExtractor,
        embedder: &'a dyn TextEmbedder,
        metric: Metric,
    ) -> Result<Self> {
        let vectors = extractor.extract_all(catalog, embedder)?;
        let members = (0..catalog.len()).collect();

        info!("Built {} text index over {} rows", metric, catalog.len());
        Ok(Self::from_vectors(catalog, members, vectors, metric)?.with_text(embedder, extractor))
    }

    /// Allow free-text queries against precomputed vectors
    #[inline]
    #[must_use]
    pub fn with_text(mut self, embedder: &'a dyn TextEmbedder, extractor: TextExtractor) -> Self {
        self.resolver = self.resolver.with_text(embedder, extractor);
        self
    }

    /// Closest entities to `id`, never including the row `id` resolves to
    ///
    /// Other rows sharing the same identifier are ordinary candidates.
    #[inline]
    pub fn similar_to(&self, id: &str, k: usize) -> Result<Vec<Match<'a>>> {
        let vector = self.resolver.resolve(&QueryKey::Entity(id.to_string()))?;
        let own = self.catalog.position(id);
        let neighbors = self.index.query(&vector, k.saturating_add(1))?;

        let mut matches = self.matches(neighbors);
        matches.retain(|m| Some(m.position) != own);
        matches.truncate(k);
        Ok(matches)
    }

    /// Closest entities to an identifier or free text, the identifier itself included
    #[inline]
    pub fn search(&self, key: &QueryKey, k: usize) -> Result<Vec<Match<'a>>> {
        let vector = self.resolver.resolve(key)?;
        let neighbors = self.index.query(&vector, k)?;
        Ok(self.matches(neighbors))
    }

    #[inline]
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    #[inline]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[inline]
    pub fn metric(&self) -> Metric {
        self.index.metric()
    }

    /// Catalog positions covered by the index, in index order
    #[inline]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    fn matches(&self, neighbors: Vec<Neighbor>) -> Vec<Match<'a>> {
        let catalog = self.catalog;
        neighbors
            .into_iter()
            .filter_map(|neighbor| {
                let position = *self.members.get(neighbor.position)?;
                Some(Match {
                    entity: catalog.get(position)?,
                    position,
                    distance: neighbor.distance,
                })
            })
            .collect()
    }
}
