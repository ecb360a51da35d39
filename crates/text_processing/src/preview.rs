//! Log-safe previews of user text

use unicode_segmentation::UnicodeSegmentation;

/// Graphemes kept when a message is written to the logs
pub const LOG_PREVIEW_GRAPHEMES: usize = 50;

/// First `max` grapheme clusters of `text`, with an ellipsis when cut
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Preview used for the `message` field of log events
pub fn log_preview(text: &str) -> String {
    truncate_graphemes(text, LOG_PREVIEW_GRAPHEMES)
}
