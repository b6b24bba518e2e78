//! Message content classification.
//!
//! WhatsApp exports do not tag attachments; a message that carried a file
//! reads like `IMG-20240312-WA0004.jpg (file attached)`. The category is
//! inferred from that text with ordered substring rules.

use crate::model::MessageCategory;
use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

/// Written in place of media left out of a "without media" export.
pub const MEDIA_OMITTED: &str = "<media omitted>";

/// Suffix WhatsApp appends to messages that carried a file.
pub const FILE_ATTACHED: &str = "(file attached)";

const DELETED_MARKERS: &[&str] = &["you deleted this message", "this message was deleted"];

/// Checked in this order; the first category with a matching `.ext`
/// substring wins.
const ATTACHMENT_ORDER: [MessageCategory; 4] = [
    MessageCategory::Image,
    MessageCategory::Video,
    MessageCategory::Audio,
    MessageCategory::Document,
];

static DELETED: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(DELETED_MARKERS).expect("deleted markers are valid"));

static EXTENSION_MARKERS: Lazy<Vec<(MessageCategory, AhoCorasick)>> = Lazy::new(|| {
    ATTACHMENT_ORDER
        .iter()
        .map(|&category| {
            let dotted = category.extensions().iter().map(|ext| format!(".{ext}"));
            let matcher = AhoCorasick::new(dotted).expect("extension markers are valid");
            (category, matcher)
        })
        .collect()
});

/// Categorise message content. Case-insensitive; surrounding whitespace is
/// ignored.
///
/// Omitted media is reported as [`MessageCategory::Audio`]: the export
/// does not say what kind of file was dropped and most omitted items are
/// voice notes.
#[must_use]
pub fn classify(content: &str) -> MessageCategory {
    let lc = content.trim().to_lowercase();

    if lc == MEDIA_OMITTED {
        return MessageCategory::Audio;
    }
    if DELETED.is_match(&lc) {
        return MessageCategory::Text;
    }
    if lc.contains(FILE_ATTACHED) {
        return classify_attachment(&lc).unwrap_or(MessageCategory::Text);
    }
    MessageCategory::Text
}

fn classify_attachment(lc: &str) -> Option<MessageCategory> {
    // stickers are named STK-*.webp; plain .webp files are images
    if lc.contains("stk") && lc.contains(".webp") {
        return Some(MessageCategory::Sticker);
    }
    EXTENSION_MARKERS
        .iter()
        .find(|(_, matcher)| matcher.is_match(lc))
        .map(|(category, _)| *category)
}
