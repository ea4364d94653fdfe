//! Geometry primitives shared by every detection stage.
//!
//! A [`BoundingBox`] is the axis-aligned bounding rectangle of any detected
//! region, in page-pixel coordinates with the origin at the top left. A
//! [`Marker`] is a classified mark (a printed category-marker line) carrying
//! its raw contour, its bounding box, and the logical grid cell assigned to
//! it by the grid reconstructor.

use imageproc::contours::Contour;
use imageproc::point::Point;

/// Axis-aligned bounding rectangle in page-pixel coordinates.
///
/// Width and height are always positive; construction enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    /// Create a box. Panics if `w` or `h` is zero.
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        assert!(w > 0 && h > 0, "BoundingBox requires w, h > 0");
        Self { x, y, w, h }
    }

    /// Bounding rectangle of a contour's points.
    ///
    /// Returns `None` for an empty contour. A single point yields a 1x1 box.
    pub fn of_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(
            min_x,
            min_y,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        ))
    }

    /// Area in pixels.
    pub fn area(&self) -> u32 {
        self.w * self.h
    }

    /// Aspect ratio (w / h). Marker lines are wider than tall, so >= 1.
    pub fn aspect(&self) -> f64 {
        f64::from(self.w) / f64::from(self.h)
    }

    /// Center of the box, rounded down.
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w as i32 / 2, self.y + self.h as i32 / 2)
    }
}

/// A classified mark extracted from one half-table image.
///
/// `column` and `row` start unset; the grid reconstructor assigns them when
/// it snaps the marker onto the logical grid. That assignment is the only
/// mutation a marker undergoes.
#[derive(Debug, Clone)]
pub struct Marker {
    /// Raw contour points, in half-table pixel coordinates.
    pub points: Vec<Point<i32>>,
    /// Bounding rectangle of the contour.
    pub bounds: BoundingBox,
    /// Category label, assigned during grid reconstruction.
    pub column: Option<String>,
    /// One-based question number, assigned during grid reconstruction.
    pub row: Option<u32>,
}

impl Marker {
    /// Build a marker from a raw contour.
    ///
    /// Returns `None` for an empty contour, which cannot carry a mark.
    pub fn from_contour(contour: &Contour<i32>) -> Option<Self> {
        let bounds = BoundingBox::of_points(&contour.points)?;
        Some(Self {
            points: contour.points.clone(),
            bounds,
            column: None,
            row: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::contours::BorderType;

    #[test]
    fn test_bounding_box_measures() {
        let b = BoundingBox::new(1, 2, 3, 4);
        assert_eq!(b.x, 1);
        assert_eq!(b.y, 2);
        assert_eq!(b.w, 3);
        assert_eq!(b.h, 4);
        assert_eq!(b.area(), 12);
        assert_eq!(b.aspect(), 0.75);
    }

    #[test]
    #[should_panic]
    fn test_bounding_box_rejects_zero_width() {
        let _ = BoundingBox::new(0, 0, 0, 4);
    }

    #[test]
    fn test_of_points_spans_extremes() {
        let points = vec![
            Point::new(10, 5),
            Point::new(14, 5),
            Point::new(14, 7),
            Point::new(10, 7),
        ];
        let b = BoundingBox::of_points(&points).unwrap();
        assert_eq!(b, BoundingBox::new(10, 5, 5, 3));
    }

    #[test]
    fn test_of_points_single_point() {
        let b = BoundingBox::of_points(&[Point::new(3, 9)]).unwrap();
        assert_eq!(b, BoundingBox::new(3, 9, 1, 1));
    }

    #[test]
    fn test_of_points_empty() {
        assert!(BoundingBox::of_points(&[]).is_none());
    }

    #[test]
    fn test_marker_from_contour_starts_unassigned() {
        let contour = Contour {
            points: vec![Point::new(60, 80), Point::new(80, 80), Point::new(80, 82)],
            border_type: BorderType::Outer,
            parent: None,
        };
        let marker = Marker::from_contour(&contour).unwrap();
        assert_eq!(marker.bounds, BoundingBox::new(60, 80, 21, 3));
        assert!(marker.column.is_none());
        assert!(marker.row.is_none());
    }

    #[test]
    fn test_center() {
        let b = BoundingBox::new(10, 20, 4, 6);
        assert_eq!(b.center(), (12, 23));
    }
}
