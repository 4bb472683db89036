use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

/// Where a document comes from: a local file or a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    Path(PathBuf),
    Url(Url),
}

impl DocumentSource {
    /// `http`/`https` URLs are fetched remotely; everything else is a path.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Self::Url(url),
            _ => Self::Path(PathBuf::from(raw)),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

// Stage payloads are unvalidated model text. Each gets its own type so a
// draft can never be handed where a normalized extraction is expected.
macro_rules! text_payload {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(text: impl Into<String>) -> Self {
                Self(text.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(text: String) -> Self {
                Self(text)
            }
        }

        impl From<&str> for $name {
            fn from(text: &str) -> Self {
                Self(text.to_string())
            }
        }
    };
}

text_payload!(
    /// Concatenated chunk text of one document.
    DocumentText
);
text_payload!(
    /// Freeform themes/entities/relationships listing from the instruct model.
    ThemeExtraction
);
text_payload!(
    /// Theme extraction with an end-of-record marker on every line.
    NormalizedExtraction
);
text_payload!(
    /// First Cypher script produced by the code model.
    CypherDraft
);
text_payload!(
    /// Repaired Cypher script, regenerated from the same draft on every attempt.
    CypherFinal
);
text_payload!(
    /// Draft with its last line dropped; only used by the degraded fallback.
    TruncatedCypher
);
