//! # Bounded Text Utilities
//!
//! Helpers for turning raw inbound payloads into bounded text and for copying
//! topics and payloads into fixed-capacity storage.

use heapless::{String, Vec};

use crate::config::MAX_TOPIC_LEN;
use crate::error::{Error, ErrorPlaceHolder};

/// Decodes a raw payload into text that fits a `MAX`-byte buffer.
///
/// One byte of the buffer is reserved for the terminator, so payloads of `MAX`
/// bytes or more are cut to `MAX - 1` bytes. The text also ends at the first
/// NUL byte and at the last complete UTF-8 sequence, so the result never holds
/// a partial character. No copy is made: the result borrows from `payload`.
pub fn decode_payload<const MAX: usize>(payload: &[u8]) -> &str {
    let limit = payload.len().min(MAX.saturating_sub(1));
    let bounded = &payload[..limit];
    let text = match bounded.iter().position(|&b| b == 0) {
        Some(nul) => &bounded[..nul],
        None => bounded,
    };

    match core::str::from_utf8(text) {
        Ok(s) => s,
        // `valid_up_to` always lies on a character boundary.
        Err(e) => core::str::from_utf8(&text[..e.valid_up_to()]).unwrap_or_default(),
    }
}

/// Copies a topic into fixed-capacity storage.
pub fn owned_topic(topic: &str) -> Result<String<MAX_TOPIC_LEN>, Error<ErrorPlaceHolder>> {
    let mut owned = String::new();
    owned.push_str(topic).map_err(|_| Error::TopicTooLong)?;
    Ok(owned)
}

/// Copies a payload into fixed-capacity storage.
pub fn owned_payload<const N: usize>(payload: &[u8]) -> Result<Vec<u8, N>, Error<ErrorPlaceHolder>> {
    let mut owned = Vec::new();
    owned
        .extend_from_slice(payload)
        .map_err(|_| Error::PayloadTooLarge)?;
    Ok(owned)
}
