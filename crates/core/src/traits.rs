use crate::models::{Distance, IndexedPoint, ScoredPoint};
use crate::IndexError;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates `name` if absent. Fails with `DimensionMismatch` when it exists with another dimension.
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<(), IndexError>;

    /// Inserts or overwrites points by id. All vectors are checked before anything is written.
    async fn upsert(&self, collection: &str, points: &[IndexedPoint]) -> Result<(), IndexError>;

    /// Up to `top_k` points, best score first, ties broken by ascending id.
    async fn query(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError>;
}

#[async_trait]
impl<T> VectorIndex for Arc<T>
where
    T: VectorIndex + ?Sized,
{
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<(), IndexError> {
        (**self).ensure_collection(name, dimension, distance).await
    }

    async fn upsert(&self, collection: &str, points: &[IndexedPoint]) -> Result<(), IndexError> {
        (**self).upsert(collection, points).await
    }

    async fn query(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        (**self).query(collection, query_vector, top_k).await
    }
}

pub(crate) fn check_dimensions(
    collection: &str,
    expected: usize,
    points: &[IndexedPoint],
) -> Result<(), IndexError> {
    match points.iter().find(|point| point.vector.len() != expected) {
        Some(point) => Err(IndexError::DimensionMismatch {
            collection: collection.to_string(),
            expected,
            actual: point.vector.len(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn rank(mut hits: Vec<ScoredPoint>, top_k: usize) -> Vec<ScoredPoint> {
    hits.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then_with(|| left.id.cmp(&right.id))
    });
    hits.truncate(top_k);
    hits
}
