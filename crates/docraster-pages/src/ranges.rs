//! Contiguous page windows

use std::collections::{btree_set, BTreeSet};
use std::fmt;

use crate::list::parse_pages;

/// An inclusive window of 1-based pages handed to a rasterizer in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRange {
    /// No restriction: every page of the document
    All,
    /// Pages `first..=last`
    Span { first: u32, last: u32 },
}

impl PageRange {
    /// Window covering a single page
    pub fn single(page: u32) -> Self {
        PageRange::Span {
            first: page,
            last: page,
        }
    }

    /// The window as a `(first, last)` pair, with `All` as the `(1, -1)`
    /// sentinel rasterizer front ends traditionally use.
    pub fn bounds(&self) -> (i64, i64) {
        match *self {
            PageRange::All => (1, -1),
            PageRange::Span { first, last } => (i64::from(first), i64::from(last)),
        }
    }

    /// Whether this is the unrestricted window
    pub fn is_all(&self) -> bool {
        matches!(self, PageRange::All)
    }

    /// Number of pages in a concrete window; `None` for `All` or a span
    /// whose bounds are out of order
    pub fn page_count(&self) -> Option<u32> {
        match *self {
            PageRange::All => None,
            PageRange::Span { first, last } => last.checked_sub(first)?.checked_add(1),
        }
    }

    /// Whether `page` falls inside the window
    pub fn contains(&self, page: u32) -> bool {
        match *self {
            PageRange::All => page >= 1,
            PageRange::Span { first, last } => (first..=last).contains(&page),
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PageRange::All => f.write_str("all"),
            PageRange::Span { first, last } if first == last => write!(f, "{}", first),
            PageRange::Span { first, last } => write!(f, "{}-{}", first, last),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Open { start: u32, finish: u32 },
    Done,
}

/// Lazy iterator of maximal contiguous windows over ascending page numbers.
///
/// Created by [`compact_ranges`]. Each window is computed only when asked for,
/// so a caller can launch one rasterizer per window as it goes.
#[derive(Debug, Clone)]
pub struct PageRanges<I> {
    pages: I,
    state: State,
}

impl<I> Iterator for PageRanges<I>
where
    I: Iterator<Item = u32>,
{
    type Item = PageRange;

    fn next(&mut self) -> Option<PageRange> {
        let (start, mut finish) = match self.state {
            State::Done => return None,
            State::Open { start, finish } => (start, finish),
            State::Start => match self.pages.next() {
                Some(page) => (page, page),
                None => {
                    self.state = State::Done;
                    return Some(PageRange::All);
                }
            },
        };

        loop {
            match self.pages.next() {
                Some(right) if right >= start && right <= finish.saturating_add(1) => {
                    finish = finish.max(right)
                }
                Some(right) => {
                    self.state = State::Open {
                        start: right,
                        finish: right,
                    };
                    return Some(PageRange::Span {
                        first: start,
                        last: finish,
                    });
                }
                None => {
                    self.state = State::Done;
                    return Some(PageRange::Span {
                        first: start,
                        last: finish,
                    });
                }
            }
        }
    }
}

/// Compact ascending page numbers into maximal windows.
///
/// An empty input yields exactly one [`PageRange::All`]. Duplicates are
/// absorbed. Input that steps backwards still yields well-formed windows
/// (`first <= last`, every page covered), but they are no longer ascending
/// or maximal; pass a sorted collection such as a `BTreeSet` for that.
///
/// # Examples
/// ```
/// use docraster_pages::{compact_ranges, PageRange};
///
/// let windows: Vec<_> = compact_ranges([1, 2, 3, 5, 6, 8]).collect();
/// assert_eq!(
///     windows,
///     vec![
///         PageRange::Span { first: 1, last: 3 },
///         PageRange::Span { first: 5, last: 6 },
///         PageRange::single(8),
///     ]
/// );
/// assert_eq!(compact_ranges(Vec::new()).collect::<Vec<_>>(), vec![PageRange::All]);
/// ```
pub fn compact_ranges<P>(pages: P) -> PageRanges<P::IntoIter>
where
    P: IntoIterator<Item = u32>,
{
    PageRanges {
        pages: pages.into_iter(),
        state: State::Start,
    }
}

/// Parse a page list and compact it in one step.
pub fn page_windows(list: &str) -> PageRanges<btree_set::IntoIter<u32>> {
    compact_ranges(parse_pages(list))
}

/// Windows for an optional page list; `None` means every page.
pub fn page_windows_for(list: Option<&str>) -> PageRanges<btree_set::IntoIter<u32>> {
    match list {
        Some(list) => page_windows(list),
        None => compact_ranges(BTreeSet::new()),
    }
}
