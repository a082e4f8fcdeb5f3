//! Per-source continuation state.
//!
//! A [`Descriptor`] says where the next page of one source comes from.  The
//! [`Frontier`] is the set of descriptors that have not been exhausted yet.
//!
//! After every fetch a descriptor is resolved into its replacement:
//!
//! | fetch result                  | next frontier entry           |
//! |-------------------------------|-------------------------------|
//! | continuation `next` present   | tokened descriptor for `next` |
//! | no `next`, URL has `{page}`   | the same descriptor again     |
//! | no `next`, no placeholder     | nothing, the source is done   |
//!
//! Each descriptor is resolved on its own; one source running dry never
//! touches another.

use crate::source::FeedPage;

/// Marker substituted with the shared page counter.
pub const PAGE_PLACEHOLDER: &str = "{page}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Contains [`PAGE_PLACEHOLDER`]; re-fetched with the next page number.
    Paged,
    /// Fetched once as-is.
    Plain,
    /// Opaque continuation from the server, fetched verbatim.
    Tokened,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// The configured source URL this descriptor descends from.
    origin: String,
    /// Template, plain URL, or continuation value depending on `kind`.
    target: String,
    kind: DescriptorKind,
}

impl Descriptor {
    /// Descriptor for a configured source URL.
    pub fn from_source(url: impl Into<String>) -> Self {
        let url = url.into();
        let kind = if url.contains(PAGE_PLACEHOLDER) {
            DescriptorKind::Paged
        } else {
            DescriptorKind::Plain
        };
        Self {
            origin: url.clone(),
            target: url,
            kind,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// The URL to request for this descriptor on page `page`.
    ///
    /// Only paged descriptors look at the counter; tokened ones already carry
    /// their continuation.
    pub fn advance(&self, page: u64) -> String {
        match self.kind {
            DescriptorKind::Paged => self.target.replace(PAGE_PLACEHOLDER, &page.to_string()),
            DescriptorKind::Plain | DescriptorKind::Tokened => self.target.clone(),
        }
    }

    /// What replaces this descriptor in the next frontier, if anything.
    pub fn resolve(&self, page: &FeedPage) -> Option<Descriptor> {
        match (&page.continuation, self.kind) {
            (Some(next), _) => Some(Descriptor {
                origin: self.origin.clone(),
                target: next.clone(),
                kind: DescriptorKind::Tokened,
            }),
            (None, DescriptorKind::Paged) => Some(self.clone()),
            (None, _) => None,
        }
    }
}

/// Descriptors still eligible for fetching.
#[derive(Debug, Default)]
pub struct Frontier {
    pending: Vec<Descriptor>,
}

impl Frontier {
    pub fn from_sources<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pending: urls.into_iter().map(Descriptor::from_source).collect(),
        }
    }

    /// Take every pending descriptor out for a cycle, leaving the frontier
    /// empty until resolved descriptors are pushed back.
    pub fn take_snapshot(&mut self) -> Vec<Descriptor> {
        std::mem::take(&mut self.pending)
    }

    pub fn push(&mut self, descriptor: Descriptor) {
        self.pending.push(descriptor);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
