use crate::config::QdrantConfig;
use crate::models::{Chunk, Distance, IndexedPoint, ScoredPoint};
use crate::traits::{check_dimensions, rank, VectorIndex};
use crate::IndexError;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

const BACKEND: &str = "qdrant";

/// Vector index backed by the Qdrant REST API.
pub struct QdrantStore {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl QdrantStore {
    pub fn new(config: &QdrantConfig) -> Result<Self, IndexError> {
        Url::parse(&config.endpoint)?;
        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client: Client::new(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.endpoint, path.trim_start_matches('/')));
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    /// Vector size of `name`, or `None` when the collection does not exist.
    pub async fn collection_dimension(&self, name: &str) -> Result<Option<usize>, IndexError> {
        let response = self
            .request(Method::GET, &format!("collections/{name}"))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let parsed = expect_success(response).await?.json::<Value>().await?;

        parsed
            .pointer("/result/config/params/vectors/size")
            .and_then(Value::as_u64)
            .map(|size| Some(size as usize))
            .ok_or_else(|| IndexError::BackendResponse {
                backend: BACKEND.to_string(),
                details: format!("collection {name} has no single unnamed vector config"),
            })
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<bool, IndexError> {
        let response = self
            .request(Method::PUT, &format!("collections/{name}"))
            .json(&json!({
                "vectors": {
                    "size": dimension,
                    "distance": distance.as_qdrant(),
                }
            }))
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Ok(false);
        }
        expect_success(response).await?;
        Ok(true)
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
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

        let existing = match self.collection_dimension(name).await? {
            Some(existing) => existing,
            None => {
                if self.create_collection(name, dimension, distance).await? {
                    info!(collection = name, dimension, "created qdrant collection");
                    return Ok(());
                }
                // Created concurrently by someone else; verify what they created.
                self.collection_dimension(name)
                    .await?
                    .ok_or_else(|| IndexError::CollectionNotFound(name.to_string()))?
            }
        };

        if existing != dimension {
            return Err(IndexError::DimensionMismatch {
                collection: name.to_string(),
                expected: existing,
                actual: dimension,
            });
        }
        debug!(collection = name, dimension, "qdrant collection already exists");
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[IndexedPoint]) -> Result<(), IndexError> {
        let dimension = self
            .collection_dimension(collection)
            .await?
            .ok_or_else(|| IndexError::CollectionNotFound(collection.to_string()))?;
        check_dimensions(collection, dimension, points)?;

        if points.is_empty() {
            return Ok(());
        }

        let body = points
            .iter()
            .map(|point| -> Result<Value, IndexError> {
                Ok(json!({
                    "id": point.id,
                    "vector": point.vector,
                    "payload": serde_json::to_value(&point.payload)?,
                }))
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        let response = self
            .request(Method::PUT, &format!("collections/{collection}/points?wait=true"))
            .json(&json!({ "points": body }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IndexError::CollectionNotFound(collection.to_string()));
        }
        expect_success(response).await?;
        debug!(collection, count = points.len(), "upserted points into qdrant");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        if top_k == 0 {
            return match self.collection_dimension(collection).await? {
                Some(_) => Ok(Vec::new()),
                None => Err(IndexError::CollectionNotFound(collection.to_string())),
            };
        }

        let response = self
            .request(Method::POST, &format!("collections/{collection}/points/search"))
            .json(&json!({
                "vector": query_vector,
                "limit": top_k,
                "with_payload": true,
            }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IndexError::CollectionNotFound(collection.to_string()));
        }
        let parsed: Value = expect_success(response).await?.json().await?;
        Ok(rank(parse_search_response(&parsed)?, top_k))
    }
}

async fn expect_success(response: Response) -> Result<Response, IndexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IndexError::BackendResponse {
        backend: BACKEND.to_string(),
        details: format!("{status}: {body}"),
    })
}

/// Normalizes Qdrant search hits. Payloads that are not `{text, source}` are kept as `None`.
fn parse_search_response(parsed: &Value) -> Result<Vec<ScoredPoint>, IndexError> {
    let hits = parsed
        .pointer("/result")
        .and_then(Value::as_array)
        .ok_or_else(|| IndexError::BackendResponse {
            backend: BACKEND.to_string(),
            details: "search response has no result array".to_string(),
        })?;

    let mut result = Vec::with_capacity(hits.len());
    for hit in hits {
        let id = match hit.pointer("/id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(IndexError::BackendResponse {
                    backend: BACKEND.to_string(),
                    details: format!("search hit without id: {hit}"),
                })
            }
        };
        let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
        let payload = hit
            .pointer("/payload")
            .cloned()
            .and_then(|payload| serde_json::from_value::<Chunk>(payload).ok());

        result.push(ScoredPoint { id, score, payload });
    }

    Ok(result)
}
