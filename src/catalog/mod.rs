// Catalog module
// Immutable in-memory table of players or shots, loaded once per process


use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use crate::{Result, ScoutError};

/// Identifier used for rows whose id cell is blank
pub const UNKNOWN_ID: &str = "Unknown";

/// One catalog row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Name or title, unique for lookups
    pub id: String,
    /// Cells that parsed as finite numbers
    pub attributes: BTreeMap<String, f64>,
    /// Every non-empty cell as written in the source
    pub labels: BTreeMap<String, String>,
    /// Free text used for text similarity
    pub description: Option<String>,
}

impl Entity {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }

    #[inline]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// Ordered entities plus an identifier index
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: Vec<Entity>,
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

/// Shot descriptions shipped with their embeddings
#[derive(Debug, Clone)]
pub struct EmbeddedCatalog {
    pub catalog: Catalog,
    pub vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedRecord {
    title: String,
    #[serde(default)]
    description: String,
    embedding: Vec<f32>,
}

impl Catalog {
    /// Build a catalog from entities and the column header they were read with
    #[inline]
    pub fn new(columns: Vec<String>, entities: Vec<Entity>) -> Self {
        let mut positions = HashMap::with_capacity(entities.len());
        for (position, entity) in entities.iter().enumerate() {
            if positions.contains_key(&entity.id) {
                warn!(
                    "Duplicate identifier '{}' at row {}, lookups resolve to the first occurrence",
                    entity.id, position
                );
            } else {
                positions.insert(entity.id.clone(), position);
            }
        }

        Self {
            entities,
            columns,
            positions,
        }
    }

    /// Build a catalog whose columns are every attribute and label the entities carry
    #[inline]
    pub fn from_entities(entities: Vec<Entity>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for entity in &entities {
            for name in entity.attributes.keys().chain(entity.labels.keys()) {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
        Self::new(columns, entities)
    }

    /// Load a delimited player file with a header row
    #[inline]
    pub fn load_csv<P: AsRef<Path>>(path: P, config: &CatalogConfig) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading catalog from {}", path.display());

        let file = File::open(path).map_err(|e| {
            ScoutError::Catalog(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_csv_reader(BufReader::new(file), config)?;

        info!(
            "Loaded {} rows with {} columns from {}",
            catalog.len(),
            catalog.columns.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse a delimited table from any reader
    #[inline]
    pub fn from_csv_reader<R: Read>(reader: R, config: &CatalogConfig) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|e| ScoutError::Catalog(format!("Failed to read header row: {}", e)))?
            .clone();
        let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

        let id_index = column_index(&columns, &config.id_column)?;
        let team_index = column_index(&columns, &config.team_column)?;

        let mut entities = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record
                .map_err(|e| ScoutError::Catalog(format!("Failed to read row {}: {}", row + 1, e)))?;

            if record.get(team_index).is_none_or(|team| team.trim().is_empty()) {
                warn!("Skipping row {}: missing {}", row + 1, config.team_column);
                continue;
            }

            let id = record
                .get(id_index)
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .unwrap_or(UNKNOWN_ID);

            let mut entity = Entity::new(id);
            for (column, cell) in columns.iter().zip(record.iter()) {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                if let Ok(value) = cell.parse::<f64>() {
                    if value.is_finite() {
                        entity.attributes.insert(column.clone(), value);
                    }
                }
                entity.labels.insert(column.clone(), cell.to_string());
            }
            entities.push(entity);
        }

        Ok(Self::new(columns, entities))
    }

    /// Load `[{"title", "description", "embedding"}]` records
    #[inline]
    pub fn load_embedded<P: AsRef<Path>>(path: P) -> Result<EmbeddedCatalog> {
        let path = path.as_ref();
        debug!("Loading embedded catalog from {}", path.display());

        let file = File::open(path).map_err(|e| {
            ScoutError::Catalog(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let embedded = Self::from_embedded_reader(BufReader::new(file))?;

        info!(
            "Loaded {} embedded records from {}",
            embedded.catalog.len(),
            path.display()
        );
        Ok(embedded)
    }

    #[inline]
    pub fn from_embedded_reader<R: Read>(reader: R) -> Result<EmbeddedCatalog> {
        let records: Vec<EmbeddedRecord> = serde_json::from_reader(reader)
            .map_err(|e| ScoutError::Catalog(format!("Failed to parse embedded records: {}", e)))?;

        let mut entities = Vec::with_capacity(records.len());
        let mut vectors = Vec::with_capacity(records.len());
        for record in records {
            entities.push(
                Entity::new(record.title.clone())
                    .with_label("title", record.title)
                    .with_label("description", record.description.clone())
                    .with_description(record.description),
            );
            vectors.push(record.embedding);
        }

        Ok(EmbeddedCatalog {
            catalog: Self::new(
                vec!["title".to_string(), "description".to_string()],
                entities,
            ),
            vectors,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[inline]
    pub fn get(&self, position: usize) -> Option<&Entity> {
        self.entities.get(position)
    }

    /// Position of the first entity with this identifier
    #[inline]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    #[inline]
    pub fn find(&self, id: &str) -> Option<&Entity> {
        self.position(id).and_then(|position| self.get(position))
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

fn column_index(columns: &[String], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| ScoutError::Catalog(format!("Missing required column '{}'", name)))
}
