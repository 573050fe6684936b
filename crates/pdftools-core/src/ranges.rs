//! Parsing of user-typed page lists and range lists

use crate::error::PdfToolsError;
use crate::model::PageRange;
use std::collections::BTreeSet;

/// Parse the rotate tool's page list ("1, 3,5") into zero-based indices.
///
/// A token counts as its leading integer ("3abc" is 3, "2.5" is 2). Tokens
/// without one, or that fall outside `0..page_count` after the 1-based to
/// 0-based shift, are dropped. The result is ascending and free
/// of duplicates, so a page named twice is rotated once.
pub fn parse_page_numbers(input: &str, page_count: usize) -> BTreeSet<usize> {
    let mut targets = BTreeSet::new();

    for token in input.split(',') {
        let token = token.trim();
        let Some(number) = parse_leading_int(token) else {
            if !token.is_empty() {
                tracing::debug!(token, "ignoring non-numeric page token");
            }
            continue;
        };

        let index = number - 1;
        if index < 0 || index >= page_count as i64 {
            tracing::debug!(page = number, page_count, "ignoring out-of-bounds page");
            continue;
        }
        targets.insert(index as usize);
    }

    targets
}

/// Parse a range list like "1-3, 5, 8-10" into split requests.
///
/// A lone number `N` is the range `N-N`. Syntax errors are reported;
/// bounds are not checked here because split drops out-of-bounds ranges.
pub fn parse_range_list(input: &str) -> Result<Vec<PageRange>, PdfToolsError> {
    let mut ranges = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let range = if let Some((start, end)) = part.split_once('-') {
            PageRange::new(parse_number(start, "start")?, parse_number(end, "end")?)
        } else {
            let page = parse_number(part, "page")?;
            PageRange::new(page, page)
        };
        ranges.push(range);
    }

    Ok(ranges)
}

/// Parse a page selection like "1-3, 5, 8-10" into sorted unique page
/// numbers of a document with `page_count` pages.
///
/// Every range is checked against the document before it is expanded.
pub fn parse_page_selection(input: &str, page_count: usize) -> Result<Vec<u32>, PdfToolsError> {
    let mut pages = BTreeSet::new();

    for range in parse_range_list(input)? {
        if range.start > range.end {
            return Err(PdfToolsError::InvalidRange(format!(
                "Start {} > end {}",
                range.start, range.end
            )));
        }
        if range.start == 0 || range.end as usize > page_count {
            return Err(PdfToolsError::InvalidRange(format!(
                "Pages {} do not exist (document has {} pages)",
                range, page_count
            )));
        }
        pages.extend(range.start..=range.end);
    }

    Ok(pages.into_iter().collect())
}

/// Leading integer of a token: optional sign, then digits; the rest is
/// ignored. `None` when there are no digits. Saturates at the `i64` bounds.
pub(crate) fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut value: i64 = 0;
    let mut seen = false;
    for d in digits {
        seen = true;
        value = value.saturating_mul(10).saturating_add((d - b'0') as i64);
    }

    seen.then_some(if negative { -value } else { value })
}

fn parse_number(s: &str, what: &str) -> Result<u32, PdfToolsError> {
    s.trim()
        .parse()
        .map_err(|_| PdfToolsError::InvalidRange(format!("Invalid {}: {}", what, s.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_page_numbers_drops_out_of_bounds() {
        let targets = parse_page_numbers("1, 3,5", 4);
        assert_eq!(targets.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_parse_page_numbers_ignores_garbage_and_zero() {
        let targets = parse_page_numbers("0, abc, , -2, 2", 3);
        assert_eq!(targets.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_parse_page_numbers_uses_leading_integer() {
        let targets = parse_page_numbers("3abc, 2.5, +1", 4);
        assert_eq!(targets.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int(" 3px"), Some(3));
        assert_eq!(parse_leading_int("2.0"), Some(2));
        assert_eq!(parse_leading_int("-7x"), Some(-7));
        assert_eq!(parse_leading_int("+1"), Some(1));
        assert_eq!(parse_leading_int("x3"), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("99999999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn test_parse_page_numbers_deduplicates() {
        let targets = parse_page_numbers("2,2, 2", 3);
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn test_parse_page_numbers_empty_input() {
        assert!(parse_page_numbers("", 10).is_empty());
        assert!(parse_page_numbers("1", 0).is_empty());
    }

    #[test]
    fn test_parse_range_list_single_and_ranges() {
        let ranges = parse_range_list("1-3, 5, 8-2").unwrap();
        assert_eq!(
            ranges,
            vec![
                PageRange::new(1, 3),
                PageRange::new(5, 5),
                PageRange::new(8, 2)
            ]
        );
    }

    #[test]
    fn test_parse_range_list_rejects_syntax_errors() {
        assert!(parse_range_list("1-x").is_err());
        assert!(parse_range_list("abc").is_err());
        assert!(parse_range_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_page_selection_complex() {
        let result = parse_page_selection("1-3, 5, 8-10", 10).unwrap();
        assert_eq!(result, vec![1, 2, 3, 5, 8, 9, 10]);
    }

    #[test]
    fn test_parse_page_selection_deduplicates() {
        let result = parse_page_selection("1-3, 2-4", 4).unwrap();
        assert_eq!(result, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_parse_page_selection_rejects_inverted_range() {
        assert!(parse_page_selection("5-3", 10).is_err());
    }

    #[test]
    fn test_parse_page_selection_rejects_huge_range_before_expanding() {
        let err = parse_page_selection("1-4294967295", 1).unwrap_err();
        assert!(matches!(err, PdfToolsError::InvalidRange(_)));
        assert!(parse_page_selection("0-1", 1).is_err());
        assert_eq!(parse_page_selection("1", 1).unwrap(), vec![1]);
    }
}
