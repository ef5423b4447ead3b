use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub const DEFAULT_CHUNK_SIZE: usize = 1_000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_COLLECTION: &str = "pdf_docs";

/// A document handed to ingestion. Only lives for the duration of one ingestion call.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let source = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;
        let bytes = fs::read(path)?;
        Ok(Self::new(source, bytes))
    }

    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }
}

/// Payload stored next to every vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Chunk,
}

/// One similarity hit. `payload` is `None` when the stored payload could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: Option<Chunk>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
    Euclid,
}

impl Distance {
    pub fn as_qdrant(&self) -> &'static str {
        match self {
            Distance::Cosine => "Cosine",
            Distance::Dot => "Dot",
            Distance::Euclid => "Euclid",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub distance: Distance,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            distance: Distance::Cosine,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub collection: String,
    pub top_k: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn document_from_path_uses_file_name_as_source() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("Geography.pdf");
        fs::write(&path, b"%PDF-1.4")?;

        let document = Document::from_path(&path)?;
        assert_eq!(document.source, "Geography.pdf");
        assert_eq!(document.bytes, b"%PDF-1.4");
        Ok(())
    }

    #[test]
    fn checksum_is_reproducible() {
        let first = Document::new("a.pdf", b"abc".to_vec());
        let second = Document::new("b.pdf", b"abc".to_vec());
        assert_eq!(first.checksum(), second.checksum());
        assert_ne!(first.checksum(), Document::new("a.pdf", b"abd".to_vec()).checksum());
    }
}
