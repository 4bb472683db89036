//! Plain-text document loading and chunking.

use std::time::Duration;

use async_trait::async_trait;

use docgraph_core::config::AppConfig;
use docgraph_core::document::{DocumentSource, DocumentText};
use docgraph_core::error::{DocgraphError, Result};
use docgraph_core::extraction::TextExtractor;

/// Rough characters-per-token ratio used to size chunks without a tokenizer.
const CHARS_PER_TOKEN: usize = 4;
const FETCH_TIMEOUT_SECS: u64 = 60;

/// Loads a document, splits it into paragraph-merged chunks bounded by a token
/// budget, and concatenates the chunks back into one text.
pub struct ChunkedTextExtractor {
    client: reqwest::Client,
    max_chunk_chars: usize,
}

impl ChunkedTextExtractor {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_chunk_tokens(config.max_chunk_tokens)
    }

    pub fn with_chunk_tokens(max_chunk_tokens: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| DocgraphError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_chunk_chars: max_chunk_tokens.saturating_mul(CHARS_PER_TOKEN).max(1),
        })
    }

    async fn load(&self, source: &DocumentSource) -> Result<String> {
        match source {
            DocumentSource::Path(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                DocgraphError::Document(format!("failed to read {}: {e}", path.display()))
            }),
            DocumentSource::Url(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| DocgraphError::Document(format!("failed to fetch {url}: {e}")))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(DocgraphError::Document(format!(
                        "fetching {url} returned status {status}"
                    )));
                }

                response
                    .text()
                    .await
                    .map_err(|e| DocgraphError::Document(format!("failed to read body of {url}: {e}")))
            }
        }
    }

    /// Split into chunks no longer than `max_chunk_chars`, merging paragraphs
    /// while they fit.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            let separator = if current.is_empty() { 0 } else { 2 };
            if current.len() + separator + paragraph.len() <= self.max_chunk_chars {
                if !current.is_empty() {
                    current.push_str("\n\n");
                }
                current.push_str(paragraph);
                continue;
            }

            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }

            if paragraph.len() > self.max_chunk_chars {
                chunks.extend(split_at_char_limit(paragraph, self.max_chunk_chars));
            } else {
                current.push_str(paragraph);
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

/// Split on char boundaries so multi-byte text is never cut mid-character.
fn split_at_char_limit(text: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if current.len() + ch.len_utf8() > limit && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

#[async_trait]
impl TextExtractor for ChunkedTextExtractor {
    async fn extract(&self, source: &DocumentSource) -> Result<DocumentText> {
        tracing::info!(source = %source, "Starting document conversion");

        let raw = self.load(source).await?;
        let chunks = self.chunk(&raw);

        tracing::info!(
            source = %source,
            chunks = chunks.len(),
            max_chunk_chars = self.max_chunk_chars,
            "Document chunking complete"
        );

        let mut text = String::with_capacity(raw.len() + chunks.len());
        for chunk in &chunks {
            text.push_str(chunk);
            text.push('\n');
        }

        Ok(DocumentText::new(text))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn extractor(max_chunk_tokens: usize) -> ChunkedTextExtractor {
        ChunkedTextExtractor::with_chunk_tokens(max_chunk_tokens).unwrap()
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = extractor(100).chunk("First paragraph.\n\nSecond paragraph.");
        assert_eq!(chunks, vec!["First paragraph.\n\nSecond paragraph."]);
    }

    #[test]
    fn paragraphs_split_when_budget_exceeded() {
        // 5 tokens = 20 chars per chunk
        let chunks = extractor(5).chunk("aaaaaaaaaa\n\nbbbbbbbbbb\n\ncccc");
        assert_eq!(chunks, vec!["aaaaaaaaaa", "bbbbbbbbbb\n\ncccc"]);
    }

    #[test]
    fn oversized_paragraph_is_split_on_chars() {
        let chunks = extractor(1).chunk("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
        assert!(chunks.iter().all(|c| c.len() <= 4));
    }

    #[test]
    fn multibyte_text_is_not_cut_mid_char() {
        let chunks = split_at_char_limit("ééééé", 3);
        assert_eq!(chunks, vec!["é", "é", "é", "é", "é"]);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(extractor(10).chunk(" \n\n \n").is_empty());
    }

    #[tokio::test]
    async fn extract_concatenates_chunks_with_newlines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "Data centers consume significant energy for cooling.\n\nWater use is rising."
        )
        .unwrap();

        let source = DocumentSource::Path(file.path().to_path_buf());
        // 15 tokens = 60 chars, so the two paragraphs land in separate chunks
        let text = extractor(15).extract(&source).await.unwrap();
        assert_eq!(
            text.as_str(),
            "Data centers consume significant energy for cooling.\nWater use is rising.\n"
        );
    }

    #[tokio::test]
    async fn missing_file_is_a_document_error() {
        let source = DocumentSource::parse("/definitely/not/here.txt");
        let err = extractor(10).extract(&source).await.unwrap_err();
        assert!(matches!(err, DocgraphError::Document(_)));
    }
}
