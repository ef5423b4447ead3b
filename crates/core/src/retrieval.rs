use crate::embeddings::EmbeddingProvider;
use crate::grounding::build_grounded_prompt;
use crate::models::{RetrievalOptions, ScoredPoint};
use crate::traits::VectorIndex;
use crate::RetrievalError;
use tracing::{debug, warn};

/// Prompt ready for the answer generator, plus what went into it.
#[derive(Debug)]
pub struct GroundedPrompt {
    pub prompt: String,
    pub contexts: Vec<String>,
    /// Set when retrieval failed and the prompt fell back to the no-context marker.
    pub retrieval_error: Option<RetrievalError>,
}

pub struct Retriever<E, V>
where
    E: EmbeddingProvider,
    V: VectorIndex,
{
    embedder: E,
    index: V,
    options: RetrievalOptions,
}

impl<E, V> Retriever<E, V>
where
    E: EmbeddingProvider,
    V: VectorIndex,
{
    pub fn new(embedder: E, index: V, options: RetrievalOptions) -> Self {
        Self {
            embedder,
            index,
            options,
        }
    }

    pub fn options(&self) -> &RetrievalOptions {
        &self.options
    }

    /// Nearest points for `query`, best first.
    pub async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<ScoredPoint>, RetrievalError> {
        let top_k = top_k.unwrap_or(self.options.top_k);
        let query_vector = self.embedder.embed_one(query).await?;
        let hits = self
            .index
            .query(&self.options.collection, &query_vector, top_k)
            .await?;
        debug!(collection = %self.options.collection, top_k, hits = hits.len(), "vector search");
        Ok(hits)
    }

    /// Context texts for `query`, best first. Hits without a readable payload are skipped.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<String>, RetrievalError> {
        let hits = self.search(query, top_k).await?;
        Ok(context_texts(hits))
    }

    /// Always yields a prompt. Retrieval failures degrade to the no-context prompt and are reported
    /// through `retrieval_error`.
    pub async fn grounded_prompt(&self, question: &str, top_k: Option<usize>) -> GroundedPrompt {
        match self.retrieve(question, top_k).await {
            Ok(contexts) => GroundedPrompt {
                prompt: build_grounded_prompt(&contexts, question),
                contexts,
                retrieval_error: None,
            },
            Err(error) => {
                if error.is_missing_collection() {
                    warn!(%error, "no documents ingested yet, answering without context");
                } else {
                    warn!(%error, "retrieval failed, answering without context");
                }
                GroundedPrompt {
                    prompt: build_grounded_prompt(&[], question),
                    contexts: Vec::new(),
                    retrieval_error: Some(error),
                }
            }
        }
    }
}

fn context_texts(hits: Vec<ScoredPoint>) -> Vec<String> {
    hits.into_iter()
        .filter_map(|hit| match hit.payload {
            Some(payload) => Some(payload.text),
            None => {
                warn!(id = %hit.id, "skipping hit without a text payload");
                None
            }
        })
        .collect()
}
