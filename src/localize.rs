//! Mapping the query rectangle into reference coordinates.

use crate::homography::Homography;
use crate::trace::trace_event;
use nalgebra::Point2;

/// Corner index of a [`Quadrilateral`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

/// Four mapped corners in top-left, top-right, bottom-right, bottom-left
/// order of the untransformed query rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quadrilateral {
    corners: [Point2<f64>; 4],
}

impl Quadrilateral {
    pub fn new(corners: [Point2<f64>; 4]) -> Self {
        Self { corners }
    }

    /// Axis-aligned rectangle `(0, 0) - (width, height)`.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new([
            Point2::new(0.0, 0.0),
            Point2::new(width, 0.0),
            Point2::new(width, height),
            Point2::new(0.0, height),
        ])
    }

    pub fn corners(&self) -> &[Point2<f64>; 4] {
        &self.corners
    }

    pub fn corner(&self, corner: Corner) -> Point2<f64> {
        self.corners[corner as usize]
    }

    /// True if every corner has finite coordinates.
    pub fn is_finite(&self) -> bool {
        self.corners
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Signed shoelace area; positive for the clockwise-on-screen order of an
    /// unwarped rectangle (y pointing down).
    pub fn signed_area(&self) -> f64 {
        let c = &self.corners;
        (0..4)
            .map(|i| {
                let a = c[i];
                let b = c[(i + 1) % 4];
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            * 0.5
    }

    /// Absolute enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// True for a strictly convex, non-self-intersecting quadrilateral.
    pub fn is_convex(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        let c = &self.corners;
        let mut sign = 0.0f64;
        for i in 0..4 {
            let a = c[i];
            let b = c[(i + 1) % 4];
            let d = c[(i + 2) % 4];
            let cross = (b.x - a.x) * (d.y - b.y) - (b.y - a.y) * (d.x - b.x);
            if cross == 0.0 {
                return false;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }
}

/// Maps the corners of a `query_width x query_height` image through `h`.
///
/// Corners are mapped independently and returned in source order. Results
/// outside the reference frame are kept as-is; a corner sent to infinity
/// has NaN coordinates.
pub fn localize(h: &Homography, query_width: f64, query_height: f64) -> Quadrilateral {
    let source = Quadrilateral::rectangle(query_width, query_height);
    let quad = Quadrilateral::new(source.corners.map(|p| h.project(&p)));
    trace_event!("localized", finite = quad.is_finite(), area = quad.area());
    quad
}
