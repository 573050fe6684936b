//! Document model
//!
//! Documents are immutable ordered lists of lightweight page references.
//! A page points at its decoded source through an `Arc`, so every transform
//! can build a new `Document` without copying page data.

use crate::error::PdfToolsError;
use crate::ranges::parse_leading_int;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Page rotation in degrees, always one of 0, 90, 180 or 270
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "i64")]
pub struct Rotation(u16);

impl Rotation {
    pub const NONE: Rotation = Rotation(0);

    /// Normalize any angle into 0..360, snapping to a right angle.
    ///
    /// Negative angles wrap around (-90 becomes 270).
    pub fn from_degrees(degrees: i64) -> Self {
        let normalized = degrees.rem_euclid(360);
        Rotation((normalized - normalized % 90) as u16)
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    /// Apply one quarter turn in the given direction
    pub fn turned(self, direction: RotationDirection) -> Self {
        Rotation::from_degrees(self.0 as i64 + direction.delta())
    }
}

impl From<Rotation> for u16 {
    fn from(r: Rotation) -> Self {
        r.0
    }
}

impl TryFrom<i64> for Rotation {
    type Error = String;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        if degrees % 90 != 0 {
            return Err(format!("rotation {} is not a multiple of 90", degrees));
        }
        Ok(Rotation::from_degrees(degrees))
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Quarter-turn direction chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationDirection {
    /// Counter-clockwise, -90°
    Left,
    /// Clockwise, +90°
    Right,
}

impl RotationDirection {
    pub fn delta(self) -> i64 {
        match self {
            RotationDirection::Left => -90,
            RotationDirection::Right => 90,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(RotationDirection::Left),
            "right" => Some(RotationDirection::Right),
            _ => None,
        }
    }
}

/// A page of a document: its source, its zero-based index in that source,
/// and the rotation overlay applied on top.
pub struct Page<S> {
    source: Arc<S>,
    origin: u32,
    rotation: Rotation,
}

impl<S> Page<S> {
    pub fn new(source: Arc<S>, origin: u32, rotation: Rotation) -> Self {
        Self {
            source,
            origin,
            rotation,
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Zero-based index of this page in its source
    pub fn origin(&self) -> u32 {
        self.origin
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn with_rotation(&self, rotation: Rotation) -> Self {
        Self {
            source: Arc::clone(&self.source),
            origin: self.origin,
            rotation,
        }
    }

    /// True when both pages refer to the same page of the same source
    pub fn same_origin(&self, other: &Page<S>) -> bool {
        Arc::ptr_eq(&self.source, &other.source) && self.origin == other.origin
    }
}

impl<S> Clone for Page<S> {
    fn clone(&self) -> Self {
        self.with_rotation(self.rotation)
    }
}

impl<S> fmt::Debug for Page<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("origin", &self.origin)
            .field("rotation", &self.rotation)
            .finish()
    }
}

/// An ordered sequence of pages
pub struct Document<S> {
    pages: Vec<Page<S>>,
}

impl<S> Document<S> {
    pub fn from_pages(pages: Vec<Page<S>>) -> Self {
        Self { pages }
    }

    /// Build a document covering every page of a source, in source order.
    ///
    /// `rotations` holds the rotation stored in the source for each page.
    pub fn from_source(source: Arc<S>, rotations: impl IntoIterator<Item = Rotation>) -> Self {
        let pages = rotations
            .into_iter()
            .enumerate()
            .map(|(i, rotation)| Page::new(Arc::clone(&source), i as u32, rotation))
            .collect();
        Self { pages }
    }

    pub fn pages(&self) -> &[Page<S>] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page<S>> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn into_pages(self) -> Vec<Page<S>> {
        self.pages
    }

    /// New document with the page at `from` moved to `to`
    pub fn move_page(&self, from: usize, to: usize) -> Result<Self, PdfToolsError> {
        let mut pages = self.pages.clone();
        move_item(&mut pages, from, to)?;
        Ok(Self { pages })
    }

    pub fn reverse_pages(&self) -> Self {
        let mut pages = self.pages.clone();
        pages.reverse();
        Self { pages }
    }

    pub fn remove_page(&self, index: usize) -> Result<Self, PdfToolsError> {
        check_index(index, self.pages.len())?;
        let mut pages = self.pages.clone();
        pages.remove(index);
        Ok(Self { pages })
    }
}

impl<S> Clone for Document<S> {
    fn clone(&self) -> Self {
        Self {
            pages: self.pages.clone(),
        }
    }
}

impl<S> fmt::Debug for Document<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("pages", &self.pages)
            .finish()
    }
}

/// A 1-based inclusive page interval requested for a split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Build a range from the two text fields of the split form.
    ///
    /// Each field counts as its leading integer ("3px" is 3). Returns
    /// `None` when either field has none. Negative numbers can never be
    /// valid, so they are mapped to 0.
    pub fn from_fields(start: &str, end: &str) -> Option<Self> {
        let start = parse_leading_int(start)?;
        let end = parse_leading_int(end)?;
        let clamp = |n: i64| n.clamp(0, u32::MAX as i64) as u32;
        Some(Self::new(clamp(start), clamp(end)))
    }

    /// `1 <= start <= end <= page_count`
    pub fn is_valid_for(&self, page_count: usize) -> bool {
        self.start >= 1 && self.start <= self.end && (self.end as usize) <= page_count
    }

    /// Number of pages covered (0 for an inverted range)
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-based index range into the source; only meaningful when valid
    pub fn indices(&self) -> Range<usize> {
        (self.start as usize).saturating_sub(1)..self.end as usize
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Ordered collection of pending files (documents awaiting merge, images
/// awaiting conversion). Insertion order is processing order.
#[derive(Debug, Clone)]
pub struct DocumentSet<T> {
    entries: Vec<T>,
}

impl<T> Default for DocumentSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> DocumentSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove the entry at `from` and reinsert it at `to`; the entries in
    /// between shift by one. Out-of-range indices leave the set unchanged.
    pub fn move_file(&mut self, from: usize, to: usize) -> Result<(), PdfToolsError> {
        move_item(&mut self.entries, from, to)
    }

    pub fn reverse_files(&mut self) {
        self.entries.reverse();
    }

    pub fn remove_file(&mut self, index: usize) -> Result<T, PdfToolsError> {
        check_index(index, self.entries.len())?;
        Ok(self.entries.remove(index))
    }

    /// Apply a full permutation: `new_order[i]` is the current index of the
    /// entry that should end up at position `i`.
    pub fn reorder(&mut self, new_order: &[usize]) -> Result<(), PdfToolsError> {
        let len = self.entries.len();
        if new_order.len() != len {
            return Err(PdfToolsError::InvalidRange(format!(
                "Invalid order: expected {} indices, got {}",
                len,
                new_order.len()
            )));
        }

        let mut seen = vec![false; len];
        for &idx in new_order {
            check_index(idx, len)?;
            if seen[idx] {
                return Err(PdfToolsError::InvalidRange(format!(
                    "Invalid order: duplicate index {}",
                    idx
                )));
            }
            seen[idx] = true;
        }

        let mut slots: Vec<Option<T>> = self.entries.drain(..).map(Some).collect();
        self.entries = new_order
            .iter()
            .filter_map(|&idx| slots[idx].take())
            .collect();
        Ok(())
    }
}

impl<T: Clone> DocumentSet<T> {
    /// Copy of the current order, taken when an operation starts
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.clone()
    }
}

impl<T> FromIterator<T> for DocumentSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a DocumentSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn check_index(index: usize, len: usize) -> Result<(), PdfToolsError> {
    if index >= len {
        return Err(PdfToolsError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), PdfToolsError> {
    check_index(from, items.len())?;
    check_index(to, items.len())?;
    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }
    Ok(())
}
