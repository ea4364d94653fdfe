//! Read-only page-layout calibration for the four printed scoring-key
//! sections.
//!
//! Every value here was measured once, by visual inspection, on the
//! reference pages rendered at the canonical 850x1100 resolution. The boxes
//! and label lists are configuration, not derived at runtime: downstream
//! crops and grid reconstruction assume this exact page geometry.

use crate::geometry::BoundingBox;

// ============================================================
// Constants
// ============================================================

/// Canonical page width in pixels. All calibration boxes assume it.
pub const PAGE_WIDTH: u32 = 850;

/// Canonical page height in pixels.
pub const PAGE_HEIGHT: u32 = 1100;

// ============================================================
// Section Types
// ============================================================

/// The four test sections, each with its own scoring-key table shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    English,
    Math,
    Reading,
    Science,
}

impl SectionKind {
    /// All sections in printed order.
    pub fn all() -> [SectionKind; 4] {
        [
            SectionKind::English,
            SectionKind::Math,
            SectionKind::Reading,
            SectionKind::Science,
        ]
    }

    /// One-letter section code used in file names and the category file.
    pub fn code(&self) -> char {
        match self {
            SectionKind::English => 'e',
            SectionKind::Math => 'm',
            SectionKind::Reading => 'r',
            SectionKind::Science => 's',
        }
    }
}

/// Fixed layout of one section's scoring key: the two half-table boxes on
/// the page, the question count, and the ordered category labels.
#[derive(Debug, Clone)]
pub struct SectionLayout {
    pub kind: SectionKind,
    /// Total questions in the section.
    pub question_count: u32,
    /// Category column labels, left to right.
    pub labels: &'static [&'static str],
    /// Half-table positions within the full page, first then second.
    pub tables: [BoundingBox; 2],
}

impl SectionLayout {
    /// Layout for a section. Boxes come from the reference-page calibration.
    pub fn of(kind: SectionKind) -> Self {
        match kind {
            SectionKind::English => Self {
                kind,
                question_count: 75,
                labels: &["POW", "KLA", "CSE"],
                tables: [
                    BoundingBox::new(74, 223, 164, 708),
                    BoundingBox::new(277, 223, 163, 691),
                ],
            },
            SectionKind::Math => Self {
                kind,
                question_count: 60,
                labels: &["N", "A", "F", "G", "S", "IES", "MDL"],
                tables: [
                    BoundingBox::new(74, 94, 300, 586),
                    BoundingBox::new(476, 94, 300, 586),
                ],
            },
            SectionKind::Reading => Self {
                kind,
                question_count: 40,
                labels: &["KID", "CS", "IKI"],
                tables: [
                    BoundingBox::new(74, 94, 164, 407),
                    BoundingBox::new(277, 94, 163, 407),
                ],
            },
            SectionKind::Science => Self {
                kind,
                question_count: 40,
                labels: &["IOD", "SIN", "EMI"],
                tables: [
                    BoundingBox::new(74, 594, 164, 407),
                    BoundingBox::new(277, 594, 163, 407),
                ],
            },
        }
    }

    /// Questions covered by the first half-table: `ceil(N / 2)`.
    pub fn first_half_rows(&self) -> u32 {
        self.question_count.div_ceil(2)
    }

    /// Questions covered by the second half-table.
    pub fn second_half_rows(&self) -> u32 {
        self.question_count - self.first_half_rows()
    }

    /// Expected row count for half-table `half` (0 or 1).
    pub fn rows_in_half(&self, half: usize) -> u32 {
        match half {
            0 => self.first_half_rows(),
            _ => self.second_half_rows(),
        }
    }

    /// Reporting-category legend (label -> long name) for the category file.
    pub fn legend(&self) -> &'static [(&'static str, &'static str)] {
        match self.kind {
            SectionKind::English => &[
                ("POW", "Production of Writing"),
                ("KLA", "Knowledge of Language"),
                ("CSE", "Conventions of Standard English"),
            ],
            SectionKind::Math => &[
                ("N", "Number & Quantity"),
                ("A", "Algebra"),
                ("F", "Functions"),
                ("G", "Geometry"),
                ("S", "Statistics & Probability"),
                ("IES", "Integrating Essential Skills"),
                ("MDL", "Modeling"),
            ],
            SectionKind::Reading => &[
                ("KID", "Key Ideas and Details"),
                ("CS", "Craft & Structure"),
                ("IKI", "Integration of Knowledge & Ideas"),
            ],
            SectionKind::Science => &[
                ("IOD", "Interpretation of Data"),
                ("SIN", "Scientific Investigation"),
                ("EMI", "Evaluation of Models, Inferences, & Experimental Results"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sections_have_two_tables_on_page() {
        for kind in SectionKind::all() {
            let layout = SectionLayout::of(kind);
            for table in &layout.tables {
                assert!(table.x >= 0 && table.y >= 0);
                assert!((table.x as u32 + table.w) <= PAGE_WIDTH);
                assert!((table.y as u32 + table.h) <= PAGE_HEIGHT);
            }
        }
    }

    #[test]
    fn test_half_rows_sum_to_question_count() {
        for kind in SectionKind::all() {
            let layout = SectionLayout::of(kind);
            assert_eq!(
                layout.first_half_rows() + layout.second_half_rows(),
                layout.question_count
            );
            assert!(layout.first_half_rows() >= layout.second_half_rows());
        }
    }

    #[test]
    fn test_math_halves_are_thirty_rows() {
        let math = SectionLayout::of(SectionKind::Math);
        assert_eq!(math.rows_in_half(0), 30);
        assert_eq!(math.rows_in_half(1), 30);
    }

    #[test]
    fn test_english_halves_are_uneven() {
        let english = SectionLayout::of(SectionKind::English);
        assert_eq!(english.rows_in_half(0), 38);
        assert_eq!(english.rows_in_half(1), 37);
    }

    #[test]
    fn test_legend_covers_all_labels() {
        for kind in SectionKind::all() {
            let layout = SectionLayout::of(kind);
            for label in layout.labels {
                assert!(
                    layout.legend().iter().any(|(short, _)| short == label),
                    "missing legend entry for {label}"
                );
            }
        }
    }

    #[test]
    fn test_section_codes() {
        assert_eq!(SectionKind::English.code(), 'e');
        assert_eq!(SectionKind::Math.code(), 'm');
        assert_eq!(SectionKind::Reading.code(), 'r');
        assert_eq!(SectionKind::Science.code(), 's');
    }
}
