use crate::error::IngestError;
use crate::models::{IngestionOptions, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use std::collections::VecDeque;

/// Boundaries tried from coarsest to finest: paragraph, line, sentence, word, character.
const SEPARATORS: [&str; 7] = ["\n\n", "\n", ". ", "! ", "? ", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "chunk_overlap {chunk_overlap} must be smaller than chunk_size {chunk_size}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl TryFrom<&IngestionOptions> for ChunkingConfig {
    type Error = IngestError;

    fn try_from(value: &IngestionOptions) -> Result<Self, Self::Error> {
        Self::new(value.chunk_size, value.chunk_overlap)
    }
}

/// Splits `text` into pieces of at most `chunk_size` characters, preferring the coarsest boundary
/// available and carrying up to `chunk_overlap` characters of context between neighbours.
pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    split_recursive(text, &SEPARATORS, config)
}

fn split_recursive(text: &str, separators: &[&str], config: ChunkingConfig) -> Vec<String> {
    let (separator, finer) = pick_separator(text, separators);

    let mut chunks = Vec::new();
    let mut fitting: Vec<&str> = Vec::new();

    for piece in split_keep_separator(text, separator) {
        if char_len(piece) < config.chunk_size {
            fitting.push(piece);
            continue;
        }

        if !fitting.is_empty() {
            chunks.extend(merge_pieces(&fitting, config));
            fitting.clear();
        }

        if finer.is_empty() {
            chunks.push(piece.to_string());
        } else {
            chunks.extend(split_recursive(piece, finer, config));
        }
    }

    if !fitting.is_empty() {
        chunks.extend(merge_pieces(&fitting, config));
    }

    chunks
}

fn pick_separator<'s>(text: &str, separators: &'s [&'s str]) -> (&'s str, &'s [&'s str]) {
    for (position, &separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return (separator, &[]);
        }
        if text.contains(separator) {
            return (separator, &separators[position + 1..]);
        }
    }
    ("", &[])
}

/// Separators stay attached to the end of the piece they terminate.
fn split_keep_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(start, ch)| &text[start..start + ch.len_utf8()])
            .collect();
    }

    text.split_inclusive(separator)
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn merge_pieces(pieces: &[&str], config: ChunkingConfig) -> Vec<String> {
    let mut merged = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for &piece in pieces {
        let len = char_len(piece);

        if total + len > config.chunk_size && !window.is_empty() {
            if let Some(chunk) = join_window(&window) {
                merged.push(chunk);
            }

            while total > config.chunk_overlap || (total > 0 && total + len > config.chunk_size) {
                match window.pop_front() {
                    Some(dropped) => total = total.saturating_sub(char_len(dropped)),
                    None => break,
                }
            }
        }

        window.push_back(piece);
        total += len;
    }

    if let Some(chunk) = join_window(&window) {
        merged.push(chunk);
    }

    merged
}

fn join_window(window: &VecDeque<&str>) -> Option<String> {
    let joined = window.iter().copied().collect::<String>();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig::new(size, overlap).expect("valid chunking config")
    }

    fn synthetic_words(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("token{index:04}")).collect()
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(100, 100).is_err());
        assert!(ChunkingConfig::new(100, 150).is_err());
        assert!(ChunkingConfig::new(100, 99).is_ok());
    }

    #[test]
    fn empty_and_blank_text_yield_no_chunks() {
        assert!(split_text("", config(100, 10)).is_empty());
        assert!(split_text("   \n\n  ", config(100, 10)).is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let text = "India has a rich biodiversity.\n\nIt spans many climate zones.";
        assert_eq!(split_text(text, config(1_000, 200)), vec![text.to_string()]);
    }

    #[test]
    fn splitting_is_deterministic() {
        let text = synthetic_words(300).join(" ");
        let first = split_text(&text, config(250, 50));
        let second = split_text(&text, config(250, 50));
        assert_eq!(first, second);
    }

    #[test]
    fn every_chunk_respects_the_size_bound() {
        let paragraph = synthetic_words(60).join(" ");
        let text = format!("{paragraph}\n\n{paragraph}. {paragraph}\n{paragraph}");
        for chunk in split_text(&text, config(200, 40)) {
            assert!(chunk.chars().count() <= 200, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn synthetic_document_splits_into_three_overlapping_chunks() {
        let words = synthetic_words(240);
        let text = words.join(" ");

        let chunks = split_text(&text, config(1_000, 200));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], words[..100].join(" "));
        assert_eq!(chunks[1], words[80..180].join(" "));
        assert_eq!(chunks[2], words[160..].join(" "));
    }

    #[test]
    fn paragraphs_are_preferred_over_words() {
        let first = "a".repeat(60);
        let second = "b".repeat(60);
        let text = format!("{first}\n\n{second}");

        let chunks = split_text(&text, config(100, 0));

        assert_eq!(chunks, vec![first, second]);
    }

    #[test]
    fn unbroken_text_falls_back_to_characters_with_overlap() {
        let text = "x".repeat(2_400);
        let chunks = split_text(&text, config(1_000, 200));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1_000);
        assert_eq!(chunks[1].len(), 1_000);
        assert_eq!(chunks[2].len(), 800);
    }

    #[test]
    fn multibyte_text_is_measured_in_characters() {
        let text = "é".repeat(150);
        let chunks = split_text(&text, config(100, 0));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 100);
        assert_eq!(chunks[1].chars().count(), 50);
    }
}
