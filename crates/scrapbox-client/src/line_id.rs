//! Line id generation.
//!
//! ```text
//! {secs:08x}{author suffix}{0000}{nonce:08x}
//! ```
//!
//! The author suffix is the last 6 characters of the user id (all of it when
//! shorter), so ids are 26 characters for normal accounts.
//!
//! The nonce is not a full 32-bit random draw. Its high half is 16 bits from
//! the OS-seeded CSPRNG and its low half is a process-wide wrapping sequence
//! with a random start. That trades 16 bits of unpredictability for a hard
//! guarantee: any 65536 consecutive ids from one process differ even within
//! the same second, where a pure random draw would only make a clash unlikely.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU16, Ordering};

use rand::Rng;
use scrapbox_types::LineId;

/// Constant pad between the author suffix and the nonce.
pub const LINE_ID_PAD: &str = "0000";

const AUTHOR_SUFFIX_LEN: usize = 6;

static SEQUENCE: LazyLock<AtomicU16> = LazyLock::new(|| AtomicU16::new(rand::random()));

/// Mint a fresh line id for `user_id`.
pub fn new_line_id(user_id: &str) -> LineId {
    let high: u16 = rand::thread_rng().r#gen();
    let low = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let nonce = (u32::from(high) << 16) | u32::from(low);
    line_id_at(unix_secs(), user_id, nonce)
}

/// Deterministic form of [`new_line_id`].
pub fn line_id_at(secs: u64, user_id: &str, nonce: u32) -> LineId {
    // Truncation keeps the prefix at 8 hex chars past 2106.
    LineId::new(format!(
        "{:08x}{}{}{:08x}",
        secs as u32,
        author_suffix(user_id),
        LINE_ID_PAD,
        nonce
    ))
}

/// Last 6 characters of `user_id`, or the whole string if shorter.
pub fn author_suffix(user_id: &str) -> &str {
    let count = user_id.chars().count();
    if count <= AUTHOR_SUFFIX_LEN {
        return user_id;
    }
    let start = user_id
        .char_indices()
        .nth(count - AUTHOR_SUFFIX_LEN)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &user_id[start..]
}

fn unix_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
