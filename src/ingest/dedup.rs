// src/ingest/dedup.rs
//! Dedup keys: a column is identified by its trailing link; link-less posts
//! fall back to a content digest so repeated forwards still collapse.

use sha2::{Digest, Sha256};

use crate::text::find_urls;

/// Body prefix (in chars) that feeds the fallback digest.
pub const DIGEST_BODY_CHARS: usize = 200;

/// Last URL in the post, scanning lines bottom-up.
pub fn trailing_url(text: &str) -> Option<String> {
    text.lines()
        .rev()
        .find_map(|line| find_urls(line).pop())
        .map(|u| u.trim().to_string())
}

/// Key for a column: the URL verbatim, or `sha256:<32 hex>` over
/// `(outlet, header, body prefix)`.
pub fn dedup_key(link: Option<&str>, outlet: &str, header: &str, body: &str) -> String {
    if let Some(url) = link.map(str::trim).filter(|u| !u.is_empty()) {
        return url.to_string();
    }

    let prefix: String = body.chars().take(DIGEST_BODY_CHARS).collect();
    let mut hasher = Sha256::new();
    for part in [outlet, header, prefix.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update([0x1f_u8]);
    }
    let digest = hasher.finalize();

    let mut out = String::with_capacity(7 + 32);
    out.push_str("sha256:");
    for b in digest.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
