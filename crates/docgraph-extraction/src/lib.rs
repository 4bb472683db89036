pub mod document;
pub mod normalize;
pub mod stages;
pub mod watsonx;

pub use document::ChunkedTextExtractor;
pub use normalize::{normalize, END_OF_RECORD_MARKER};
pub use stages::LlmStages;
pub use watsonx::WatsonxClient;
