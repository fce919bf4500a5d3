//! Page list parsing

use std::collections::BTreeSet;

use tracing::{debug, warn};

/// Most pages a single `a-b` token may expand to. Wider ranges are dropped.
pub const MAX_RANGE_PAGES: u32 = 100_000;

/// Parse a page list like `"1,3-5,10"` into a sorted set of page numbers.
///
/// Tokens are separated by commas. A token containing `-` is an inclusive
/// range built from its first and last dash-separated pieces exactly as
/// written, so a reversed range such as `"5-2"` contributes no pages. Any
/// token (or range bound) that is not an integer is dropped, as is page 0.
/// A range covering more than [`MAX_RANGE_PAGES`] pages is dropped with a
/// warning.
///
/// # Examples
/// ```
/// use docraster_pages::parse_pages;
///
/// let pages: Vec<u32> = parse_pages("10,1,3-5,4").into_iter().collect();
/// assert_eq!(pages, vec![1, 3, 4, 5, 10]);
/// assert_eq!(parse_pages("abc,2").into_iter().collect::<Vec<_>>(), vec![2]);
/// ```
pub fn parse_pages(list: &str) -> BTreeSet<u32> {
    let mut pages = BTreeSet::new();

    for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if token.contains('-') {
            let mut bounds = token.split('-').map(str::trim);
            let first = bounds.next().and_then(|b| b.parse::<u32>().ok());
            let last = bounds.last().and_then(|b| b.parse::<u32>().ok());
            match (first, last) {
                (Some(first), Some(last)) if last >= first && last - first >= MAX_RANGE_PAGES => {
                    warn!(token, max = MAX_RANGE_PAGES, "Dropping page range wider than the limit");
                }
                (Some(first), Some(last)) => pages.extend(first..=last),
                _ => debug!(token, "Dropping malformed page range"),
            }
        } else {
            match token.parse::<u32>() {
                Ok(page) => {
                    pages.insert(page);
                }
                Err(_) => debug!(token, "Dropping non-numeric page"),
            }
        }
    }

    pages.remove(&0);
    pages
}
