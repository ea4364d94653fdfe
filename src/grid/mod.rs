//! Logical grid reconstruction from raw marker coordinates.
//!
//! Markers land at slightly different pixel coordinates even within one
//! logical row or column. Collapsing nearby coordinates recovers the
//! logical row and column positions, and each marker then snaps to its
//! nearest row and column. Row counts are checked against the layout: a
//! wrong count means a detection failure upstream and poisoning the output
//! with misnumbered questions is worse than failing.

pub mod types;

pub use self::types::{GridError, Result, SectionGrid};

use tracing::warn;

use crate::geometry::Marker;
use crate::layout::SectionLayout;

// ============================================================
// Coordinate collapsing
// ============================================================

/// Collapse raw coordinates into logical positions.
///
/// Coordinates are sorted, deduplicated, and then any value within `delta`
/// of its successor is dropped, keeping the higher of the pair. The
/// survivor is then compared against its new predecessor, so a run keeps
/// collapsing only while the kept value stays within `delta`:
/// `[11, 14, 17]` with `delta = 4` folds 14 into 17 but keeps 11. The
/// result is stable under re-collapsing.
pub fn collapse_unique(values: &[i32], delta: i32) -> Vec<i32> {
    let mut out = values.to_vec();
    out.sort_unstable();
    out.dedup();
    let mut i = out.len() as isize - 1;
    while i >= 1 {
        if out[i as usize] - out[i as usize - 1] <= delta {
            out.remove(i as usize - 1);
        }
        i -= 1;
    }
    out
}

/// Index of the value in a sorted slice nearest to `v`. Ties go low.
fn nearest_index(values: &[i32], v: i32) -> usize {
    let mut best = 0;
    for (i, &candidate) in values.iter().enumerate() {
        if (v - candidate).abs() < (v - values[best]).abs() {
            best = i;
        }
    }
    best
}

// ============================================================
// Marker assignment
// ============================================================

/// Snap each marker in one half-table onto the logical grid.
///
/// Rows are recovered by collapsing marker y coordinates and must match the
/// layout's expected count for `half`. Columns are recovered the same way
/// from x coordinates and must match the label count. On success every
/// marker carries its question number (`row_offset` + local row, one-based)
/// and its category label.
pub fn assign_markers(
    markers: &mut [Marker],
    layout: &SectionLayout,
    half: usize,
    row_offset: u32,
    delta: i32,
) -> Result<()> {
    let ys: Vec<i32> = markers.iter().map(|m| m.bounds.y).collect();
    let xs: Vec<i32> = markers.iter().map(|m| m.bounds.x).collect();

    let rows = collapse_unique(&ys, delta);
    let expected_rows = layout.rows_in_half(half) as usize;
    if rows.len() != expected_rows {
        return Err(GridError::LayoutMismatch {
            half,
            expected: expected_rows,
            found: rows.len(),
        });
    }

    let columns = collapse_unique(&xs, delta);
    if columns.len() != layout.labels.len() {
        return Err(GridError::ColumnMismatch {
            expected: layout.labels.len(),
            found: columns.len(),
        });
    }

    for marker in markers.iter_mut() {
        let row = nearest_index(&rows, marker.bounds.y) as u32;
        let column = nearest_index(&columns, marker.bounds.x);
        marker.row = Some(row_offset + row + 1);
        marker.column = Some(layout.labels[column].to_string());
    }
    Ok(())
}

// ============================================================
// Section reconstruction
// ============================================================

/// Reconstruct a section's scoring key from the markers of its two
/// half-tables.
///
/// An empty half is a legitimate blank table and contributes nothing; the
/// grid then reports empty for its questions. A non-empty half that does
/// not resolve to the expected shape is an error.
pub fn reconstruct(
    layout: &SectionLayout,
    halves: &mut [Vec<Marker>; 2],
    delta: i32,
) -> Result<SectionGrid> {
    let mut grid = SectionGrid::new(layout.question_count);

    for (half, markers) in halves.iter_mut().enumerate() {
        if markers.is_empty() {
            warn!(
                section = ?layout.kind,
                half,
                "no markers detected in half-table"
            );
            continue;
        }
        let row_offset = if half == 0 { 0 } else { layout.first_half_rows() };
        assign_markers(markers, layout, half, row_offset, delta)?;
        for marker in markers.iter() {
            if let (Some(row), Some(label)) = (marker.row, marker.column.as_deref()) {
                grid.assign(row, label);
            }
        }
    }
    Ok(grid)
}
