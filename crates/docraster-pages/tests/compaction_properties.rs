//! Property-based tests for page window compaction
//!
//! For any set of requested pages, the compacted windows are disjoint,
//! ascending, maximal, and cover exactly the requested pages.

use std::collections::BTreeSet;

use docraster_pages::{compact_ranges, page_windows, parse_pages, PageRange};
use proptest::prelude::*;

/// Strategy for page sets typical of real documents
fn page_set_strategy() -> impl Strategy<Value = BTreeSet<u32>> {
    prop::collection::btree_set(1u32..500, 1..60)
}

fn spans(windows: &[PageRange]) -> Vec<(u32, u32)> {
    windows
        .iter()
        .map(|w| match *w {
            PageRange::Span { first, last } => (first, last),
            PageRange::All => panic!("non-empty input must not produce the all-pages window"),
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_windows_cover_exactly_the_input(pages in page_set_strategy()) {
        let windows: Vec<_> = compact_ranges(pages.iter().copied()).collect();

        let covered: BTreeSet<u32> = spans(&windows)
            .into_iter()
            .flat_map(|(first, last)| first..=last)
            .collect();
        prop_assert_eq!(covered, pages);
    }

    #[test]
    fn prop_windows_are_disjoint_ascending_and_maximal(pages in page_set_strategy()) {
        let windows: Vec<_> = compact_ranges(pages.iter().copied()).collect();
        let spans = spans(&windows);

        for &(first, last) in &spans {
            prop_assert!(first <= last);
        }
        for pair in spans.windows(2) {
            let (_, prev_last) = pair[0];
            let (next_first, _) = pair[1];
            // A gap of at least one page, otherwise the windows should have merged.
            prop_assert!(next_first > prev_last + 1);
        }
    }

    #[test]
    fn prop_window_count_matches_gaps(pages in page_set_strategy()) {
        let sorted: Vec<u32> = pages.iter().copied().collect();
        let gaps = sorted.windows(2).filter(|w| w[1] > w[0] + 1).count();

        prop_assert_eq!(compact_ranges(sorted).count(), gaps + 1);
    }

    #[test]
    fn prop_rendered_list_round_trips(pages in page_set_strategy()) {
        let list = compact_ranges(pages.iter().copied())
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(",");

        prop_assert_eq!(parse_pages(&list), pages.clone());
        prop_assert_eq!(
            page_windows(&list).collect::<Vec<_>>(),
            compact_ranges(pages).collect::<Vec<_>>()
        );
    }

    #[test]
    fn prop_any_order_yields_well_formed_cover(pages in prop::collection::vec(1u32..200, 1..40)) {
        let windows: Vec<_> = compact_ranges(pages.iter().copied()).collect();

        for &(first, last) in &spans(&windows) {
            prop_assert!(first <= last);
        }
        for window in &windows {
            prop_assert!(window.page_count().is_some());
        }
        for page in &pages {
            prop_assert!(windows.iter().any(|w| w.contains(*page)));
        }
    }

    #[test]
    fn prop_parse_ignores_garbage_tokens(pages in page_set_strategy(), junk in "[a-z]{1,6}") {
        let mut tokens: Vec<String> = pages.iter().map(u32::to_string).collect();
        tokens.insert(tokens.len() / 2, junk);

        prop_assert_eq!(parse_pages(&tokens.join(",")), pages);
    }
}

#[test]
fn test_empty_request_means_all_pages() {
    let windows: Vec<_> = compact_ranges(BTreeSet::new()).collect();
    assert_eq!(windows, vec![PageRange::All]);
    assert_eq!(windows[0].bounds(), (1, -1));
}

#[test]
fn test_documented_examples() {
    assert_eq!(
        parse_pages("1,3-5,10").into_iter().collect::<Vec<_>>(),
        vec![1, 3, 4, 5, 10]
    );
    assert_eq!(parse_pages("abc,2").into_iter().collect::<Vec<_>>(), vec![2]);
    assert_eq!(
        compact_ranges([1, 2, 3, 5, 6, 8])
            .map(|w| w.bounds())
            .collect::<Vec<_>>(),
        vec![(1, 3), (5, 6), (8, 8)]
    );
}
