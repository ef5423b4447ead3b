use crate::chunking::{split_text, ChunkingConfig};
use crate::embeddings::EmbeddingProvider;
use crate::extractor::PdfExtractor;
use crate::models::{Chunk, Document, IndexedPoint, IngestionOptions};
use crate::traits::VectorIndex;
use crate::{EmbeddingError, IngestError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Extract, chunk, embed, and store documents. Each call writes a fresh set of points; re-ingesting
/// the same document duplicates its chunks under new ids.
pub struct IngestionPipeline<X, E, V>
where
    X: PdfExtractor,
    E: EmbeddingProvider,
    V: VectorIndex,
{
    extractor: X,
    embedder: E,
    index: V,
    options: IngestionOptions,
    chunking: ChunkingConfig,
}

impl<X, E, V> IngestionPipeline<X, E, V>
where
    X: PdfExtractor,
    E: EmbeddingProvider,
    V: VectorIndex,
{
    pub fn new(
        extractor: X,
        embedder: E,
        index: V,
        options: IngestionOptions,
    ) -> Result<Self, IngestError> {
        let chunking = ChunkingConfig::try_from(&options)?;
        if options.collection.trim().is_empty() {
            return Err(IngestError::InvalidArgument("collection name is empty".to_string()));
        }

        Ok(Self {
            extractor,
            embedder,
            index,
            options,
            chunking,
        })
    }

    pub fn options(&self) -> &IngestionOptions {
        &self.options
    }

    /// Returns the number of points written.
    pub async fn ingest(&self, document: &Document) -> Result<usize, IngestError> {
        let text = self.extractor.extract_text(&document.bytes)?;
        info!(
            source = %document.source,
            checksum = %document.checksum(),
            chars = text.chars().count(),
            "extracted document text"
        );
        self.ingest_text(&text, &document.source).await
    }

    pub async fn ingest_text(&self, text: &str, source: &str) -> Result<usize, IngestError> {
        let pieces = split_text(text, self.chunking);
        if pieces.is_empty() {
            warn!(source, "document produced no chunks, nothing to index");
            return Ok(0);
        }
        debug!(source, chunks = pieces.len(), "chunked document");

        let vectors = self.embedder.embed_many(&pieces).await?;
        if vectors.len() != pieces.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: pieces.len(),
                actual: vectors.len(),
            }
            .into());
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or_default();
        self.index
            .ensure_collection(&self.options.collection, dimension, self.options.distance)
            .await?;

        let points = pieces
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| IndexedPoint {
                id: Uuid::new_v4().to_string(),
                vector,
                payload: Chunk {
                    text,
                    source: source.to_string(),
                },
            })
            .collect::<Vec<_>>();

        self.index.upsert(&self.options.collection, &points).await?;
        info!(
            source,
            collection = %self.options.collection,
            points = points.len(),
            "ingested document"
        );
        Ok(points.len())
    }
}
