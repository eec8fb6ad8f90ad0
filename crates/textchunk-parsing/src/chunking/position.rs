//! Reconciling fragments with their offsets in the source
//!
//! Splitters return strings, not offsets. Offsets are recovered by searching
//! the source characters for each fragment, moving a cursor forward so that
//! successive fragments bind to successive occurrences.
//!
//! A fragment whose text also occurs between the cursor and its true
//! position binds to that earlier copy. Callers accept that.

/// Inclusive character range in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// A span whose start and end coincide carries no usable range
    pub const fn is_degenerate(&self) -> bool {
        self.start >= self.end
    }
}

/// First occurrence of `fragment` in `source` at or after `scan_from`
///
/// Returns `None` when the fragment is empty or does not occur there.
pub fn locate(source: &[char], fragment: &[char], scan_from: usize) -> Option<Span> {
    let first = fragment.first()?;
    let last_start = source.len().checked_sub(fragment.len())?;

    (scan_from..=last_start)
        .filter(|&i| source.get(i) == Some(first))
        .find(|&i| source.get(i..i.saturating_add(fragment.len())) == Some(fragment))
        .map(|start| Span {
            start,
            end: start.saturating_add(fragment.len()).saturating_sub(1),
        })
}

/// Locates successive fragments of one source with a monotonic cursor
///
/// After each hit the cursor moves one character past the hit's start, which
/// is also where a rescan after a miss would begin, so overlapping fragments
/// still resolve while ordering is preserved. A fragment that cannot be
/// found from the cursor is reported as a miss.
#[derive(Debug)]
pub struct FragmentLocator<'a> {
    source: &'a [char],
    cursor: usize,
    placed: usize,
}

impl<'a> FragmentLocator<'a> {
    pub const fn new(source: &'a [char]) -> Self {
        Self {
            source,
            cursor: 0,
            placed: 0,
        }
    }

    /// Offsets of the next fragment, or `None` when it cannot be placed or
    /// would cover a single character
    pub fn next_span(&mut self, fragment: &str) -> Option<Span> {
        let fragment: Vec<char> = fragment.chars().collect();
        let span = locate(self.source, &fragment, self.cursor)?;
        if span.is_degenerate() {
            return None;
        }
        self.cursor = span.start.saturating_add(1);
        self.placed = self.placed.saturating_add(1);
        Some(span)
    }

    /// Whether any fragment has been placed yet
    pub const fn has_previous(&self) -> bool {
        self.placed > 0
    }
}
