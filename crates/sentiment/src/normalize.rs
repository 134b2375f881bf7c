//! Chat text normalization.
//!
//! Removes the two kinds of noise analysis services handle poorly before a
//! message is scored:
//!
//! - inline stamp tokens of the shape `:identifier:` (custom emoticons)
//! - emoji, removed per user-perceived character (grapheme cluster)
//!
//! The remaining text is NFKC-normalized and trimmed.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Default stamp token pattern. Not nested, no escaping.
pub const DEFAULT_STAMP_PATTERN: &str = r":[\w-]+:";

static STAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(DEFAULT_STAMP_PATTERN).unwrap());

/// Code point ranges whose presence at the start of a grapheme cluster
/// marks the whole cluster as an emoji.
const EMOJI_RANGES: &[(u32, u32)] = &[
    // Emoticons
    (0x1F600, 0x1F64F),
    // Miscellaneous Symbols and Pictographs
    (0x1F300, 0x1F5FF),
    // Transport and Map Symbols
    (0x1F680, 0x1F6FF),
    // Miscellaneous Symbols, Dingbats
    (0x2600, 0x26FF),
    (0x2700, 0x27BF),
    // General Punctuation through Miscellaneous Symbols and Arrows
    (0x2000, 0x2B00),
    // Supplemental Symbols and Pictographs
    (0x1F900, 0x1F9FF),
    // Symbols and Pictographs Extended-A
    (0x1FA70, 0x1FAFF),
    // Geometric Shapes Extended
    (0x1F780, 0x1F7F0),
    // Enclosed Alphanumeric Supplement (includes regional indicators)
    (0x1F100, 0x1F1FF),
    // Mahjong Tiles, Domino Tiles, Playing Cards
    (0x1F000, 0x1F0FF),
];

/// Whether `c`, as the leading code point of a cluster, marks an emoji.
pub fn is_emoji_leading(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| cp >= start && cp <= end)
}

/// Drop every grapheme cluster whose leading code point is an emoji.
///
/// Clusters that do not start with an emoji are kept intact, including any
/// modifiers or joiners they carry.
pub fn strip_emoji(text: &str) -> String {
    text.graphemes(true)
        .filter(|cluster| {
            cluster
                .chars()
                .next()
                .is_some_and(|lead| !is_emoji_leading(lead))
        })
        .collect()
}

/// Prepares chat messages for sentiment analysis.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stamp_pattern: Regex,
}

impl TextNormalizer {
    /// Create a normalizer using [`DEFAULT_STAMP_PATTERN`].
    pub fn new() -> Self {
        Self {
            stamp_pattern: STAMP_REGEX.clone(),
        }
    }

    /// Remove stamp tokens from `text`.
    pub fn strip_stamps(&self, text: &str) -> String {
        self.stamp_pattern.replace_all(text, "").into_owned()
    }

    /// Run the full pipeline: stamps, emoji, NFKC, trim.
    ///
    /// The result may be empty; that is a valid input for classification.
    pub fn normalize(&self, text: &str) -> String {
        let without_stamps = self.strip_stamps(text);
        let without_emoji = strip_emoji(&without_stamps);
        let composed: String = without_emoji.nfkc().collect();
        composed.trim().to_string()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
