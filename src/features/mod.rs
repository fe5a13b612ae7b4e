// Feature extraction module
// Turns catalog rows into vectors: numeric stat columns or text through an embedding model


use tracing::{debug, info};

use crate::catalog::{Catalog, Entity};
use crate::embeddings::TextEmbedder;
use crate::format::format_number;
use crate::{Result, ScoutError};

/// How stat columns are rescaled before indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    /// Zero mean, unit variance per column
    Standard,
    Raw,
}

/// What happens to rows lacking one of the feature columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValues {
    /// Substitute zero
    Zero,
    /// Leave the row out of the index
    Drop,
}

/// Per-column mean and population standard deviation
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    means: Vec<f64>,
    std_devs: Vec<f64>,
}

impl Standardizer {
    /// Fit over every row; `columns` names the row entries for error reporting
    ///
    /// Every row must hold exactly one value per column.
    #[inline]
    pub fn fit(columns: &[String], rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(ScoutError::EmptyCatalog);
        }
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(ScoutError::DimensionMismatch {
                expected: columns.len(),
                actual: row.len(),
            });
        }

        let count = rows.len() as f64;
        let mut means = Vec::with_capacity(columns.len());
        let mut std_devs = Vec::with_capacity(columns.len());

        for (i, column) in columns.iter().enumerate() {
            let mean = rows.iter().map(|row| row[i]).sum::<f64>() / count;
            let variance = rows
                .iter()
                .map(|row| (row[i] - mean).powi(2))
                .sum::<f64>()
                / count;
            let std_dev = variance.sqrt();

            if std_dev == 0.0 || !std_dev.is_finite() {
                return Err(ScoutError::DegenerateFeature {
                    column: column.clone(),
                });
            }

            means.push(mean);
            std_devs.push(std_dev);
        }

        Ok(Self { means, std_devs })
    }

    #[inline]
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.std_devs))
            .map(|(value, (mean, std_dev))| (value - mean) / std_dev)
            .collect()
    }

    #[inline]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    #[inline]
    pub fn std_devs(&self) -> &[f64] {
        &self.std_devs
    }
}

/// Fixed ordered list of numeric columns, optionally standardized
#[derive(Debug, Clone)]
pub struct StatExtractor {
    columns: Vec<String>,
    standardizer: Option<Standardizer>,
}

impl StatExtractor {
    /// Fit over the whole catalog
    #[inline]
    pub fn fit(catalog: &Catalog, columns: &[String], scaling: Scaling) -> Result<Self> {
        let members: Vec<usize> = (0..catalog.len()).collect();
        Self::fit_on(catalog, &members, columns, scaling)
    }

    /// Fit over the rows at `members` only
    ///
    /// Column names are checked against the catalog header, so a typo fails here rather than on
    /// the first query.
    #[inline]
    pub fn fit_on(
        catalog: &Catalog,
        members: &[usize],
        columns: &[String],
        scaling: Scaling,
    ) -> Result<Self> {
        if let Some(unknown) = columns.iter().find(|c| !catalog.has_column(c)) {
            return Err(ScoutError::Config(format!(
                "Unknown feature column '{}'",
                unknown
            )));
        }
        if members.is_empty() {
            return Err(ScoutError::EmptyCatalog);
        }

        let mut extractor = Self {
            columns: columns.to_vec(),
            standardizer: None,
        };

        if scaling == Scaling::Standard {
            let rows = members
                .iter()
                .filter_map(|&position| catalog.get(position))
                .map(|entity| extractor.raw(entity))
                .collect::<Vec<_>>();
            let standardizer = Standardizer::fit(columns, &rows)?;
            debug!(
                "Standardizing {:?} with means {:?}",
                columns,
                standardizer.means()
            );
            extractor.standardizer = Some(standardizer);
        }

        Ok(extractor)
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn standardizer(&self) -> Option<&Standardizer> {
        self.standardizer.as_ref()
    }

    /// Unscaled values, zero for missing cells
    #[inline]
    pub fn raw(&self, entity: &Entity) -> Vec<f64> {
        self.columns
            .iter()
            .map(|column| entity.attribute(column).unwrap_or(0.0))
            .collect()
    }

    /// Whether every feature column holds a number for this entity
    #[inline]
    pub fn is_complete(&self, entity: &Entity) -> bool {
        self.columns
            .iter()
            .all(|column| entity.attribute(column).is_some())
    }

    #[inline]
    pub fn extract(&self, entity: &Entity) -> Vec<f32> {
        let raw = self.raw(entity);
        let scaled = match &self.standardizer {
            Some(standardizer) => standardizer.transform(&raw),
            None => raw,
        };
        scaled.into_iter().map(|value| value as f32).collect()
    }

    #[inline]
    pub fn extract_all(&self, catalog: &Catalog) -> Vec<Vec<f32>> {
        catalog
            .entities()
            .iter()
            .map(|entity| self.extract(entity))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Column(String),
    Id,
}

/// Sentence pattern such as `"{PLAYER_NAME} is {AGE} years old"`
///
/// `{id}` expands to the entity identifier, any other placeholder to the cell of that column.
#[derive(Debug, Clone, PartialEq)]
pub struct BioTemplate {
    segments: Vec<Segment>,
}

impl BioTemplate {
    #[inline]
    pub fn parse(template: &str, catalog: &Catalog) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                ScoutError::Config(format!("Unclosed placeholder in template '{}'", template))
            })?;
            let name = after[..close].trim();

            if name == "id" {
                segments.push(Segment::Id);
            } else if catalog.has_column(name) {
                segments.push(Segment::Column(name.to_string()));
            } else {
                return Err(ScoutError::Config(format!(
                    "Template placeholder '{}' is not a catalog column",
                    name
                )));
            }
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    #[inline]
    pub fn render(&self, entity: &Entity) -> String {
        let mut text = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => text.push_str(literal),
                Segment::Id => text.push_str(&entity.id),
                Segment::Column(column) => {
                    if let Some(label) = entity.label(column) {
                        text.push_str(label);
                    } else if let Some(value) = entity.attribute(column) {
                        text.push_str(&format_number(value));
                    }
                }
            }
        }
        text
    }
}

/// Where an entity's text comes from
#[derive(Debug, Clone)]
pub enum TextSource {
    Template(BioTemplate),
    /// The entity description, falling back to its identifier
    Description,
}

/// Text features computed by an external embedding model
#[derive(Debug, Clone)]
pub struct TextExtractor {
    source: TextSource,
}

impl TextExtractor {
    #[inline]
    pub fn new(source: TextSource) -> Self {
        Self { source }
    }

    #[inline]
    pub fn text_for(&self, entity: &Entity) -> String {
        match &self.source {
            TextSource::Template(template) => template.render(entity),
            TextSource::Description => entity
                .description
                .clone()
                .unwrap_or_else(|| entity.id.clone()),
        }
    }

    /// Embed every entity in one batch call
    #[inline]
    pub fn extract_all(
        &self,
        catalog: &Catalog,
        embedder: &dyn TextEmbedder,
    ) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = catalog
            .entities()
            .iter()
            .map(|entity| self.text_for(entity))
            .collect();

        info!("Embedding {} catalog texts", texts.len());
        let vectors = embedder
            .embed_batch(&texts)
            .map_err(|e| ScoutError::Embedding(format!("{:#}", e)))?;

        if vectors.len() != texts.len() {
            return Err(ScoutError::Embedding(format!(
                "Expected {} vectors, model returned {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    /// Embed a free-text query
    #[inline]
    pub fn extract_text(&self, query: &str, embedder: &dyn TextEmbedder) -> Result<Vec<f32>> {
        embedder
            .embed(query)
            .map_err(|e| ScoutError::Embedding(format!("{:#}", e)))
    }
}
