//! Small shared helpers: random name suffixes and display-name timestamps.

use chrono::{DateTime, Local};
use rand::Rng as _;

/// Charset for random suffixes — ASCII letters only, no digits, so the
/// bracketed suffix reads distinctly from the numeric timestamp next to it.
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random string of `length` ASCII letters.
pub fn random_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// Millisecond-resolution timestamp used inside display names,
/// e.g. `2024-04-28_13:45:12_123`.
pub fn name_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d_%H:%M:%S_%3f").to_string()
}

/// Display name for an imported asset:
/// `gallery_mocker_<timestamp>_[<random>]`.
pub fn display_name(now: DateTime<Local>, random_text: &str) -> String {
    format!("gallery_mocker_{}_{}", name_timestamp(now), random_text)
}
