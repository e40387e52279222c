pub mod live_feed;
pub mod markets;

pub use live_feed::{FeedSnapshot, FilterMode, LiveFeedClient, MatchDetails};

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Lowercase + strip diacritics, so "pénalty" matches "penalty".
/// The feed mixes French and English league text.
pub fn normalize_text(value: &str) -> String {
    value
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}
