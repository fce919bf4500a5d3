//! Page selection for rasterizer runs.
//!
//! Rasterizers such as `pdftocairo` only accept one `-f first -l last`
//! window per invocation. This crate turns a user page list (`"1,3-5,10"`)
//! into the fewest such windows:
//!
//! ```
//! use docraster_pages::{page_windows, PageRange};
//!
//! let windows: Vec<PageRange> = page_windows("1,3-5,4,10").collect();
//! assert_eq!(windows.len(), 3);
//! assert_eq!(windows[1], PageRange::Span { first: 3, last: 5 });
//! ```

pub mod list;
pub mod ranges;

pub use list::{parse_pages, MAX_RANGE_PAGES};
pub use ranges::{compact_ranges, page_windows, page_windows_for, PageRange, PageRanges};
