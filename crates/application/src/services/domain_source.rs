use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Round-robin cursor over the target domains, shared by all workers.
///
/// The cursor is kept in `0..len` by a compare-and-swap loop, so the indices
/// handed out form the exact cycle `0, 1, .., len - 1, 0, ..` no matter how
/// many workers call [`DomainSource::next`] concurrently.
pub struct DomainSource {
    domains: Arc<[Arc<str>]>,
    cursor: AtomicUsize,
}

impl DomainSource {
    /// # Panics
    /// Panics if `domains` is empty; the dispatch config rejects that earlier.
    pub fn new(domains: impl Into<Arc<[Arc<str>]>>) -> Self {
        let domains = domains.into();
        assert!(!domains.is_empty(), "DomainSource needs at least one domain");
        Self {
            domains,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Returns the domain under the cursor and advances it by one.
    pub fn next(&self) -> Arc<str> {
        let index = self.next_index();
        Arc::clone(&self.domains[index])
    }

    pub fn next_index(&self) -> usize {
        let len = self.domains.len();
        match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
        {
            Ok(previous) | Err(previous) => previous,
        }
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn domains(&self) -> &[Arc<str>] {
        &self.domains
    }
}
