use crate::models::{Chunk, Distance, IndexedPoint, ScoredPoint};
use crate::traits::{check_dimensions, rank, VectorIndex};
use crate::IndexError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

struct MemoryCollection {
    dimension: usize,
    distance: Distance,
    points: BTreeMap<String, (Vec<f32>, Chunk)>,
}

/// In-process vector index with exhaustive scoring. Scores are "higher is closer" for every metric,
/// so Euclid reports the negated distance.
#[derive(Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .get(collection)
            .map(|stored| stored.points.len())
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<IndexedPoint> {
        let collections = self.collections.read();
        let (vector, payload) = collections.get(collection)?.points.get(id)?;
        Some(IndexedPoint {
            id: id.to_string(),
            vector: vector.clone(),
            payload: payload.clone(),
        })
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<(), IndexError> {
        if dimension == 0 {
            return Err(IndexError::InvalidArgument(
                "collection dimension must be positive".to_string(),
            ));
        }

        let mut collections = self.collections.write();
        match collections.get(name) {
            Some(existing) if existing.dimension != dimension => Err(IndexError::DimensionMismatch {
                collection: name.to_string(),
                expected: existing.dimension,
                actual: dimension,
            }),
            Some(_) => Ok(()),
            None => {
                collections.insert(
                    name.to_string(),
                    MemoryCollection {
                        dimension,
                        distance,
                        points: BTreeMap::new(),
                    },
                );
                info!(collection = name, dimension, "created in-memory collection");
                Ok(())
            }
        }
    }

    async fn upsert(&self, collection: &str, points: &[IndexedPoint]) -> Result<(), IndexError> {
        let mut collections = self.collections.write();
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| IndexError::CollectionNotFound(collection.to_string()))?;

        check_dimensions(collection, stored.dimension, points)?;

        for point in points {
            stored
                .points
                .insert(point.id.clone(), (point.vector.clone(), point.payload.clone()));
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        let collections = self.collections.read();
        let stored = collections
            .get(collection)
            .ok_or_else(|| IndexError::CollectionNotFound(collection.to_string()))?;

        if query_vector.len() != stored.dimension {
            return Err(IndexError::DimensionMismatch {
                collection: collection.to_string(),
                expected: stored.dimension,
                actual: query_vector.len(),
            });
        }

        let hits = stored
            .points
            .iter()
            .map(|(id, (vector, payload))| ScoredPoint {
                id: id.clone(),
                score: score(stored.distance, query_vector, vector),
                payload: Some(payload.clone()),
            })
            .collect();

        Ok(rank(hits, top_k))
    }
}

fn score(distance: Distance, left: &[f32], right: &[f32]) -> f32 {
    match distance {
        Distance::Dot => dot(left, right),
        Distance::Cosine => {
            let norms = dot(left, left).sqrt() * dot(right, right).sqrt();
            if norms > 0.0 {
                dot(left, right) / norms
            } else {
                0.0
            }
        }
        Distance::Euclid => -left
            .iter()
            .zip(right)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt(),
    }
}

fn dot(left: &[f32], right: &[f32]) -> f32 {
    left.iter().zip(right).map(|(a, b)| a * b).sum()
}
