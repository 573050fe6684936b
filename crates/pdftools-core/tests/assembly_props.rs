//! Property tests for the assembly engine and the reorder primitives

use pdftools_core::assembly::{merge, rotate, split};
use pdftools_core::model::{Document, DocumentSet, PageRange, Rotation, RotationDirection};
use pdftools_core::ranges::parse_page_numbers;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

fn doc(id: usize, pages: usize) -> Document<usize> {
    Document::from_source(Arc::new(id), vec![Rotation::NONE; pages])
}

fn origins(doc: &Document<usize>) -> Vec<(usize, u32)> {
    doc.pages()
        .iter()
        .map(|p| (**p.source(), p.origin()))
        .collect()
}

fn direction() -> impl Strategy<Value = RotationDirection> {
    prop_oneof![Just(RotationDirection::Left), Just(RotationDirection::Right)]
}

proptest! {
    /// Merged page count is the sum, in source-then-page order
    #[test]
    fn merge_preserves_count_and_order(counts in prop::collection::vec(0usize..8, 2..6)) {
        let docs: Vec<_> = counts.iter().enumerate().map(|(i, &n)| doc(i, n)).collect();
        let merged = merge(&docs).unwrap();

        let expected: Vec<(usize, u32)> = counts
            .iter()
            .enumerate()
            .flat_map(|(i, &n)| (0..n as u32).map(move |p| (i, p)))
            .collect();
        prop_assert_eq!(origins(&merged), expected);
    }

    /// Exactly the valid ranges produce output, each with the requested pages
    #[test]
    fn split_outputs_match_valid_ranges(
        page_count in 0usize..15,
        ranges in prop::collection::vec((0u32..20, 0u32..20), 0..8),
    ) {
        let source = doc(0, page_count);
        let ranges: Vec<PageRange> = ranges.into_iter().map(|(s, e)| PageRange::new(s, e)).collect();
        let parts = split(&source, &ranges);

        let valid: Vec<usize> = ranges
            .iter()
            .enumerate()
            .filter(|(_, r)| r.start >= 1 && r.start <= r.end && r.end as usize <= page_count)
            .map(|(i, _)| i)
            .collect();
        let produced: Vec<usize> = parts.iter().map(|p| p.request_index).collect();
        prop_assert_eq!(produced, valid);

        for part in &parts {
            let expected: Vec<(usize, u32)> =
                (part.range.start - 1..part.range.end).map(|p| (0, p)).collect();
            prop_assert_eq!(origins(&part.document), expected);
        }
    }

    /// Rotations stay on right angles whatever the sequence of turns
    #[test]
    fn rotation_is_always_a_right_angle(turns in prop::collection::vec(direction(), 0..20)) {
        let mut rotation = Rotation::NONE;
        for turn in &turns {
            rotation = rotation.turned(*turn);
        }
        prop_assert!(matches!(rotation.degrees(), 0 | 90 | 180 | 270));

        let net: i64 = turns.iter().map(|t| t.delta()).sum();
        prop_assert_eq!(rotation, Rotation::from_degrees(net));
    }

    /// A turn followed by the opposite turn restores every page
    #[test]
    fn rotate_then_opposite_is_identity(
        page_count in 1usize..10,
        list in "[0-9, ]{0,12}",
        dir in direction(),
    ) {
        let source = doc(0, page_count);
        let targets = parse_page_numbers(&list, page_count);
        prop_assume!(!targets.is_empty());

        let opposite = match dir {
            RotationDirection::Left => RotationDirection::Right,
            RotationDirection::Right => RotationDirection::Left,
        };
        let there = rotate(&source, &targets, Some(dir)).unwrap();
        let back = rotate(&there, &targets, Some(opposite)).unwrap();

        for page in back.pages() {
            prop_assert_eq!(page.rotation(), Rotation::NONE);
        }
    }

    /// Parsed rotate targets are always in bounds
    #[test]
    fn parsed_page_numbers_are_in_bounds(list in ".{0,30}", page_count in 0usize..10) {
        let targets: BTreeSet<usize> = parse_page_numbers(&list, page_count);
        prop_assert!(targets.iter().all(|&i| i < page_count));
    }

    /// move_file keeps every entry exactly once and lands the moved one at `to`
    #[test]
    fn move_file_is_a_permutation(len in 1usize..10, from in 0usize..10, to in 0usize..10) {
        let mut set: DocumentSet<usize> = (0..len).collect();
        let result = set.move_file(from, to);

        if from < len && to < len {
            prop_assert!(result.is_ok());
            prop_assert_eq!(set.get(to), Some(&from));
            let mut sorted = set.snapshot();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, (0..len).collect::<Vec<_>>());
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(set.snapshot(), (0..len).collect::<Vec<_>>());
        }
    }

    /// Reversing twice is the identity
    #[test]
    fn reverse_twice_is_identity(items in prop::collection::vec(any::<u8>(), 0..20)) {
        let mut set: DocumentSet<u8> = items.iter().copied().collect();
        set.reverse_files();
        set.reverse_files();
        prop_assert_eq!(set.snapshot(), items);
    }
}

#[test]
fn move_file_example() {
    let mut set: DocumentSet<&str> = ["A", "B", "C", "D"].into_iter().collect();
    set.move_file(0, 2).unwrap();
    assert_eq!(set.snapshot(), vec!["B", "C", "A", "D"]);

    set.reverse_files();
    assert_eq!(set.snapshot(), vec!["D", "A", "C", "B"]);

    assert_eq!(set.remove_file(1).unwrap(), "A");
    assert_eq!(set.snapshot(), vec!["D", "C", "B"]);
}
