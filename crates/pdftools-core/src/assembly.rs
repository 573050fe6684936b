//! Document Assembly Engine
//!
//! Pure page-set algebra over [`Document`]: merge, split, extract and
//! rotate. Every operation reads its inputs and returns new documents;
//! nothing here touches PDF bytes.

use crate::error::PdfToolsError;
use crate::model::{Document, Page, PageRange, RotationDirection};
use crate::ranges::parse_page_numbers;
use std::collections::BTreeSet;

/// One output of a split, tagged with the request that produced it
#[derive(Debug)]
pub struct SplitPart<S> {
    /// Position of the range in the caller's request list
    pub request_index: usize,
    pub range: PageRange,
    pub document: Document<S>,
}

/// Concatenate documents in order, each fully expanded before the next.
///
/// Refuses to run with fewer than two documents.
pub fn merge<S>(documents: &[Document<S>]) -> Result<Document<S>, PdfToolsError> {
    if documents.len() < 2 {
        return Err(PdfToolsError::NotEnoughDocuments {
            found: documents.len(),
        });
    }

    let total: usize = documents.iter().map(Document::page_count).sum();
    let mut pages = Vec::with_capacity(total);
    for doc in documents {
        pages.extend(doc.pages().iter().cloned());
    }

    tracing::info!(documents = documents.len(), pages = total, "merged documents");
    Ok(Document::from_pages(pages))
}

/// Split a document into one part per valid range.
///
/// Ranges may overlap, leave pages out or come in any order. A range is
/// valid when `1 <= start <= end <= page_count`; invalid ranges produce no
/// part and no error, and the remaining ranges are still processed.
pub fn split<S>(source: &Document<S>, ranges: &[PageRange]) -> Vec<SplitPart<S>> {
    let page_count = source.page_count();
    let mut parts = Vec::with_capacity(ranges.len());

    for (request_index, range) in ranges.iter().enumerate() {
        if !range.is_valid_for(page_count) {
            tracing::debug!(
                request_index,
                start = range.start,
                end = range.end,
                page_count,
                "skipping invalid split range"
            );
            continue;
        }

        let pages = source.pages()[range.indices()].to_vec();
        parts.push(SplitPart {
            request_index,
            range: *range,
            document: Document::from_pages(pages),
        });
    }

    tracing::info!(
        requested = ranges.len(),
        produced = parts.len(),
        "split document"
    );
    parts
}

/// Keep only the listed 1-based pages, in ascending order.
///
/// Unlike [`split`], an out-of-bounds page is an error: the selection comes
/// from a single validated input rather than a list of independent requests.
pub fn extract<S>(source: &Document<S>, pages: &[u32]) -> Result<Document<S>, PdfToolsError> {
    if pages.is_empty() {
        return Err(PdfToolsError::InvalidRange("No pages specified".into()));
    }

    let page_count = source.page_count();
    let selection: BTreeSet<u32> = pages.iter().copied().collect();
    for &page in &selection {
        if page == 0 || page as usize > page_count {
            return Err(PdfToolsError::InvalidRange(format!(
                "Page {} does not exist (document has {} pages)",
                page, page_count
            )));
        }
    }

    let kept = selection
        .iter()
        .map(|&page| source.pages()[page as usize - 1].clone())
        .collect();
    Ok(Document::from_pages(kept))
}

/// Turn the pages at the given zero-based indices by a quarter turn.
///
/// Indices outside the document are ignored. Refuses to run when no
/// direction was chosen or no index is left to rotate.
pub fn rotate<S>(
    source: &Document<S>,
    targets: &BTreeSet<usize>,
    direction: Option<RotationDirection>,
) -> Result<Document<S>, PdfToolsError> {
    let direction = direction.ok_or(PdfToolsError::NothingToRotate)?;
    let rotated = targets.iter().filter(|&&i| i < source.page_count()).count();
    if rotated == 0 {
        return Err(PdfToolsError::NothingToRotate);
    }

    let pages = source
        .pages()
        .iter()
        .enumerate()
        .map(|(i, page)| {
            if targets.contains(&i) {
                page.with_rotation(page.rotation().turned(direction))
            } else {
                page.clone()
            }
        })
        .collect();

    tracing::info!(pages = rotated, ?direction, "rotated pages");
    Ok(Document::from_pages(pages))
}

/// Rotate the pages named in a comma-separated 1-based list ("1, 3,5")
pub fn rotate_pages<S>(
    source: &Document<S>,
    page_list: &str,
    direction: Option<RotationDirection>,
) -> Result<Document<S>, PdfToolsError> {
    let targets = parse_page_numbers(page_list, source.page_count());
    rotate(source, &targets, direction)
}

/// Rotate every page of the document
pub fn rotate_all<S>(source: &Document<S>, direction: RotationDirection) -> Document<S> {
    let pages = source
        .pages()
        .iter()
        .map(|page| page.with_rotation(page.rotation().turned(direction)))
        .collect::<Vec<Page<S>>>();
    Document::from_pages(pages)
}
