//! Types and errors for logical grid reconstruction.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

// ============================================================
// Error Types
// ============================================================

#[derive(Debug, Error)]
pub enum GridError {
    #[error("half-table {half} resolved to {found} rows, layout expects {expected}")]
    LayoutMismatch {
        half: usize,
        expected: usize,
        found: usize,
    },

    #[error("resolved {found} category columns, layout defines {expected}")]
    ColumnMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, GridError>;

// ============================================================
// Section Grid
// ============================================================

/// Reconstructed scoring key for one section: each question's category
/// labels, in column order.
///
/// Every question number is present from construction, so a question with
/// no marks reads as an empty list rather than a missing key. A fully empty
/// grid is a legitimate result (a blank table), observable through
/// [`SectionGrid::is_empty`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SectionGrid {
    questions: BTreeMap<u32, Vec<String>>,
}

impl SectionGrid {
    /// An empty grid covering questions `1..=question_count`.
    pub fn new(question_count: u32) -> Self {
        Self {
            questions: (1..=question_count).map(|q| (q, Vec::new())).collect(),
        }
    }

    /// Record a category mark. Questions outside the construction range are
    /// ignored; the layout check upstream makes them unreachable.
    pub fn assign(&mut self, question: u32, label: &str) {
        if let Some(labels) = self.questions.get_mut(&question) {
            labels.push(label.to_string());
        }
    }

    /// Category labels for a question, empty when unmarked or out of range.
    pub fn categories_for(&self, question: u32) -> &[String] {
        self.questions.get(&question).map_or(&[], Vec::as_slice)
    }

    pub fn question_count(&self) -> u32 {
        self.questions.len() as u32
    }

    /// Total marks across all questions.
    pub fn total_marks(&self) -> usize {
        self.questions.values().map(Vec::len).sum()
    }

    /// True when no question carries any mark.
    pub fn is_empty(&self) -> bool {
        self.total_marks() == 0
    }

    /// Questions in ascending order with their labels.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[String])> {
        self.questions.iter().map(|(q, l)| (*q, l.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_covers_all_questions_empty() {
        let grid = SectionGrid::new(40);
        assert_eq!(grid.question_count(), 40);
        assert!(grid.is_empty());
        assert_eq!(grid.total_marks(), 0);
        assert!(grid.categories_for(1).is_empty());
        assert!(grid.categories_for(40).is_empty());
    }

    #[test]
    fn test_assign_and_read_back() {
        let mut grid = SectionGrid::new(10);
        grid.assign(3, "KID");
        grid.assign(3, "IKI");
        grid.assign(7, "CS");
        assert_eq!(grid.categories_for(3), &["KID", "IKI"]);
        assert_eq!(grid.categories_for(7), &["CS"]);
        assert_eq!(grid.total_marks(), 3);
        assert!(!grid.is_empty());
    }

    #[test]
    fn test_assign_out_of_range_is_ignored() {
        let mut grid = SectionGrid::new(10);
        grid.assign(11, "KID");
        grid.assign(0, "KID");
        assert!(grid.is_empty());
    }

    #[test]
    fn test_iter_ascending() {
        let mut grid = SectionGrid::new(3);
        grid.assign(2, "A");
        let seen: Vec<u32> = grid.iter().map(|(q, _)| q).collect();
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
