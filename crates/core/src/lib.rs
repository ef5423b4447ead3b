pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod grounding;
pub mod ingest;
pub mod models;
pub mod providers;
pub mod retrieval;
pub mod stores;
pub mod traits;

pub use chunking::{split_text, ChunkingConfig};
pub use config::{EmbeddingConfig, QdrantConfig, DEFAULT_EMBEDDING_MODEL};
pub use embeddings::{CharacterNgramEmbedder, EmbeddingProvider, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{EmbeddingError, ExtractionError, IndexError, IngestError, RetrievalError};
pub use extractor::{extract_page_texts, join_pages, LopdfExtractor, PageText, PdfExtractor};
pub use grounding::{build_grounded_prompt, CONTEXT_SEPARATOR, NO_CONTEXT_MARKER, UNKNOWN_ANSWER};
pub use ingest::{discover_pdf_files, IngestionPipeline};
pub use models::{
    Chunk, Distance, Document, IndexedPoint, IngestionOptions, RetrievalOptions, ScoredPoint,
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_COLLECTION, DEFAULT_TOP_K,
};
pub use providers::OpenAiEmbedder;
pub use retrieval::{GroundedPrompt, Retriever};
pub use stores::{MemoryIndex, QdrantStore};
pub use traits::VectorIndex;
