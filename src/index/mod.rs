// Vector index module
// Brute-force k-nearest-neighbour search over vectors built once from the catalog


use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

use crate::{Result, ScoutError};

/// How two vectors are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Sum of squared differences, smaller is closer
    SquaredEuclidean,
    /// Dot product, larger is closer
    InnerProduct,
    /// Dot product of L2-normalized vectors, larger is closer
    Cosine,
    /// Sum of absolute differences, smaller is closer
    Manhattan,
}

impl Metric {
    /// Whether larger values mean closer vectors
    #[inline]
    pub fn is_similarity(self) -> bool {
        matches!(self, Self::InnerProduct | Self::Cosine)
    }

    fn compare(self, a: &[f32], b: &[f32]) -> f32 {
        let value = match self {
            Self::SquaredEuclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>(),
            Self::InnerProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
            Self::Cosine => cosine(a, b),
            Self::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
        };

        // NaN always ranks last, and -0.0 must tie with 0.0 under total_cmp
        if value == 0.0 {
            0.0
        } else if value.is_nan() {
            if self.is_similarity() {
                f32::NEG_INFINITY
            } else {
                f32::INFINITY
            }
        } else {
            value
        }
    }

    fn rank(self, a: &Neighbor, b: &Neighbor) -> Ordering {
        let by_value = if self.is_similarity() {
            b.distance.total_cmp(&a.distance)
        } else {
            a.distance.total_cmp(&b.distance)
        };
        by_value.then(a.position.cmp(&b.position))
    }
}

impl fmt::Display for Metric {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SquaredEuclidean => "squared euclidean",
            Self::InnerProduct => "inner product",
            Self::Cosine => "cosine",
            Self::Manhattan => "manhattan",
        };
        f.write_str(name)
    }
}

/// One search hit: the index position and its metric value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    /// Distance for distance metrics, score for similarity metrics
    pub distance: f32,
}

/// Immutable flat index; vectors are stored contiguously in insertion order
#[derive(Debug, Clone)]
pub struct VectorIndex {
    metric: Metric,
    dimension: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Build an index from every vector at once
    ///
    /// Fails on an empty input, on vectors whose length differs from the first,
    /// and on vectors holding NaN or infinite values
    #[inline]
    pub fn build(vectors: &[Vec<f32>], metric: Metric) -> Result<Self> {
        let first = vectors.first().ok_or(ScoutError::EmptyIndex)?;
        let dimension = first.len();
        if dimension == 0 {
            return Err(ScoutError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        let mut data = Vec::with_capacity(vectors.len() * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(ScoutError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            if !vector.iter().all(|x| x.is_finite()) {
                return Err(ScoutError::NonFiniteVector);
            }
            if metric == Metric::Cosine {
                data.extend(normalized(vector));
            } else {
                data.extend_from_slice(vector);
            }
        }

        debug!(
            "Built {} index with {} vectors of dimension {}",
            metric,
            vectors.len(),
            dimension
        );

        Ok(Self {
            metric,
            dimension,
            data,
        })
    }

    /// Find the `k` closest vectors, best first, ties in insertion order
    #[inline]
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if vector.len() != self.dimension {
            return Err(ScoutError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if !vector.iter().all(|x| x.is_finite()) {
            return Err(ScoutError::NonFiniteVector);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = if self.metric == Metric::Cosine {
            normalized(vector)
        } else {
            vector.to_vec()
        };

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| Neighbor {
                position,
                distance: self.metric.compare(&query, stored),
            })
            .collect();

        neighbors.sort_by(|a, b| self.metric.rank(a, b));
        neighbors.truncate(k);
        Ok(neighbors)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Stored vector at `position`, normalized for cosine indexes
    #[inline]
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        self.data.chunks_exact(self.dimension).nth(position)
    }
}

fn normalized(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|x| x / norm).collect()
}

// Accumulated in f64 and renormalized, so parallel vectors score exactly 1.0 once rounded to f32
fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |acc, (x, y)| {
        let (x, y) = (f64::from(*x), f64::from(*y));
        (x.mul_add(y, acc.0), x.mul_add(x, acc.1), y.mul_add(y, acc.2))
    });
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}
