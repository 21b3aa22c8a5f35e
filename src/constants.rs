// === Export layout ===
pub const MIN_ROW_CELLS: usize = 10;
pub const DETAIL_PREVIEW_CHARS: usize = 500;
pub const DEFAULT_CASE_PREFIX: &str = "AST-";
pub const DEFAULT_SOURCE_TAG: &str = "asteria";

// === Summarization service ===
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 15; // 4 s between calls
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

// === Retry ===
pub const MAX_ATTEMPTS: u32 = 5;
pub const BASE_BACKOFF_SECS: f64 = 60.0;
pub const MAX_BACKOFF_SECS: f64 = 300.0;
pub const JITTER_MIN: f64 = 0.8;
pub const JITTER_MAX: f64 = 1.2;

/// Truncate at a char boundary, never splitting a multi-byte character.
pub fn truncate_safe(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_safe_multibyte() {
        assert_eq!(truncate_safe("送信メッセージ", 2), "送信");
        assert_eq!(truncate_safe("abc", 10), "abc");
    }
}
