//! Splices print-layer CSS (margins, forced appearance) into loaded HTML,
//! and caches the spliced result so identical `(html, css)` pairs within a
//! batch are only spliced once.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

/// Maximum number of distinct `(html, css)` pairs retained before the oldest
/// is evicted.
const CAPACITY: usize = 100;

struct Inner {
    map: HashMap<u64, Arc<Vec<u8>>>,
    order: VecDeque<u64>,
}

/// Hash-keyed, insertion-order-evicted cache of CSS-spliced HTML documents.
pub struct CssInjectionCache {
    inner: Mutex<Inner>,
}

impl Default for CssInjectionCache {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }
}

impl CssInjectionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `html` with `css` spliced in, using a cached result if this
    /// exact pair has been spliced before in this cache's lifetime.
    pub fn inject(&self, html: &[u8], css: &[u8]) -> Arc<Vec<u8>> {
        let key = Self::hash_key(html, css);

        if let Some(hit) = self.inner.lock().unwrap().map.get(&key) {
            return Arc::clone(hit);
        }

        let spliced = Arc::new(splice(html, css));

        let mut inner = self.inner.lock().unwrap();
        if !inner.map.contains_key(&key) {
            if inner.order.len() >= CAPACITY {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.map.remove(&oldest);
                }
            }
            inner.order.push_back(key);
            inner.map.insert(key, Arc::clone(&spliced));
        }
        spliced
    }

    /// Number of entries currently cached.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().order.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn hash_key(html: &[u8], css: &[u8]) -> u64 {
        let mut hasher = DefaultHasher::new();
        html.hash(&mut hasher);
        css.hash(&mut hasher);
        hasher.finish()
    }
}

/// Splice `css` into `html`, preferring (in order):
///
/// 1. Just before `</head>`, if present.
/// 2. Just after the closing `>` of an opening `<head`, if present.
/// 3. Just before `<body`, if present.
/// 4. Prepended to the document.
pub fn splice(html: &[u8], css: &[u8]) -> Vec<u8> {
    if let Some(pos) = find_ci(html, b"</head") {
        return splice_at(html, css, pos);
    }

    if let Some(head_open) = find_ci(html, b"<head") {
        if let Some(gt_offset) = html[head_open..].iter().position(|&b| b == b'>') {
            return splice_at(html, css, head_open + gt_offset + 1);
        }
    }

    if let Some(pos) = find_ci(html, b"<body") {
        return splice_at(html, css, pos);
    }

    let mut out = Vec::with_capacity(css.len() + html.len());
    out.extend_from_slice(css);
    out.extend_from_slice(html);
    out
}

fn splice_at(html: &[u8], css: &[u8], pos: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(html.len() + css.len());
    out.extend_from_slice(&html[..pos]);
    out.extend_from_slice(css);
    out.extend_from_slice(&html[pos..]);
    out
}

/// ASCII case-insensitive substring search over raw bytes. Safe to use on
/// unvalidated UTF-8 input: every byte of a multi-byte UTF-8 sequence has its
/// high bit set, so it can never be mistaken for one of the ASCII tag bytes
/// we search for here.
fn find_ci(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splices_before_closing_head_tag() {
        let html = b"<html><head><title>t</title></head><body>x</body></html>";
        let out = splice(html, b"<style>a</style>");
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "<html><head><title>t</title><style>a</style></head><body>x</body></html>"
        );
    }

    #[test]
    fn splices_after_head_open_when_no_closing_head() {
        let html = b"<html><head><body>x</body></html>";
        let out = splice(html, b"<style>a</style>");
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "<html><head><style>a</style><body>x</body></html>");
    }

    #[test]
    fn splices_before_body_when_no_head() {
        let html = b"<html><body>x</body></html>";
        let out = splice(html, b"<style>a</style>");
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "<html><style>a</style><body>x</body></html>");
    }

    #[test]
    fn prepends_when_no_head_or_body() {
        let html = b"<div>x</div>";
        let out = splice(html, b"<style>a</style>");
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "<style>a</style><div>x</div>");
    }

    #[test]
    fn splice_is_case_insensitive() {
        let html = b"<HTML><HEAD></HEAD><BODY>x</BODY></HTML>";
        let out = splice(html, b"<style>a</style>");
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "<HTML><HEAD><style>a</style></HEAD><BODY>x</BODY></HTML>");
    }

    #[test]
    fn cache_returns_identical_bytes_for_repeated_pair() {
        let cache = CssInjectionCache::new();
        let html = b"<html><head></head><body>x</body></html>";
        let css = b"<style>a</style>";
        let first = cache.inject(html, css);
        let second = cache.inject(html, css);
        assert_eq!(*first, *second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_evicts_oldest_entry_past_capacity() {
        let cache = CssInjectionCache::new();
        for i in 0..CAPACITY + 10 {
            let html = format!("<html><head></head><body>{i}</body></html>");
            cache.inject(html.as_bytes(), b"<style>a</style>");
        }
        assert_eq!(cache.len(), CAPACITY);
    }
}
