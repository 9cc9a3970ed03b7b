use std::borrow::Cow;
use std::cell::RefCell;

// Never valid in UTF-8, so fragments can't run into each other.
const SEPARATOR: u8 = 0xff;
const POOL_SIZE: usize = 16;
const DEFAULT_CAPACITY: usize = 128;

thread_local! {
    static POOL: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}

/// Accumulates ordered string fragments into a byte key.
///
/// Buffers are recycled through a small per-thread pool, so building a key
/// for a map lookup normally doesn't allocate.
pub(crate) struct Digester {
    buf: Vec<u8>,
}

impl Digester {
    pub(crate) fn new() -> Self {
        let buf = POOL
            .with(|pool| pool.borrow_mut().pop())
            .unwrap_or_else(|| Vec::with_capacity(DEFAULT_CAPACITY));
        Self { buf }
    }

    pub(crate) fn add(&mut self, prefix: &str, value: &str) {
        if !self.buf.is_empty() {
            self.buf.push(SEPARATOR);
        }
        self.buf.extend_from_slice(prefix.as_bytes());
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub(crate) fn digest(&self) -> &[u8] {
        &self.buf
    }
}

impl Drop for Digester {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        // The pool may already be gone during thread teardown.
        let _ = POOL.try_with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool.len() < POOL_SIZE {
                pool.push(buf);
            }
        });
    }
}

fn is_allowed(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Replaces every character outside `[A-Za-z0-9_]` with an underscore.
///
/// Scrubbing is idempotent; already-clean input is borrowed, not copied.
pub fn scrub(s: &str) -> Cow<'_, str> {
    // Fast path: check if scrubbing is needed
    if s.chars().all(is_allowed) {
        return Cow::Borrowed(s);
    }

    let scrubbed = s
        .chars()
        .map(|ch| if is_allowed(ch) { ch } else { '_' })
        .collect();
    Cow::Owned(scrubbed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrub_clean_input_is_borrowed() {
        assert!(matches!(scrub("fOo_123"), Cow::Borrowed("fOo_123")));
    }

    #[test]
    fn test_scrub_replaces_forbidden_chars() {
        assert_eq!(scrub("foo:bar"), "foo_bar");
        assert_eq!(scrub("f&"), "f_");
        assert_eq!(scrub("q&&x"), "q__x");
        assert_eq!(scrub("caf\u{e9}"), "caf_");
        assert_eq!(scrub(""), "");
    }

    #[test]
    fn test_scrub_is_idempotent() {
        for input in ["foo:bar", "x!", "a b-c.d", "ok"] {
            let once = scrub(input).into_owned();
            assert_eq!(scrub(&once), once);
        }
    }

    #[test]
    fn test_digest_separates_fragments() {
        let mut a = Digester::new();
        a.add("", "ab");
        a.add("", "c");
        let mut b = Digester::new();
        b.add("", "a");
        b.add("", "bc");
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_digest_prefix_distinguishes_fragments() {
        let mut constant = Digester::new();
        constant.add("", "name");
        constant.add("", "tag");
        let mut variable = Digester::new();
        variable.add("", "name");
        variable.add("$", "tag");
        assert_ne!(constant.digest(), variable.digest());
    }

    #[test]
    fn test_recycled_buffers_start_empty() {
        {
            let mut d = Digester::new();
            d.add("", "leftover");
        }
        let d = Digester::new();
        assert!(d.digest().is_empty());
    }
}
