use async_trait::async_trait;

use crate::document::{DocumentSource, DocumentText};
use crate::error::Result;

/// Turns a source document into concatenated plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, source: &DocumentSource) -> Result<DocumentText>;
}
