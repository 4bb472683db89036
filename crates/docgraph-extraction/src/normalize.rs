use docgraph_core::document::{NormalizedExtraction, ThemeExtraction};

/// Appended to every line so the code model sees explicit record boundaries.
pub const END_OF_RECORD_MARKER: &str = " |<special-end-tok>|";

/// Append [`END_OF_RECORD_MARKER`] to each line of the extraction.
///
/// Blank input yields an empty result. Leading and trailing whitespace of the
/// whole text is trimmed first; interior lines, blank or not, each keep a
/// one-to-one counterpart in the output. Not idempotent.
pub fn normalize(extraction: &ThemeExtraction) -> NormalizedExtraction {
    let text = extraction.as_str().trim();
    if text.is_empty() {
        return NormalizedExtraction::default();
    }

    let lines: Vec<String> = text
        .lines()
        .map(|line| format!("{line}{END_OF_RECORD_MARKER}"))
        .collect();

    NormalizedExtraction::new(lines.join("\n"))
}
