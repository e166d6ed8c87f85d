use approx::assert_relative_eq;
use planematch::nalgebra::Point2;
use planematch::{localize, Corner, Homography};

#[test]
fn translated_query_lands_at_offset() {
    let h = Homography::from_rows([[1.0, 0.0, 40.0], [0.0, 1.0, 25.0], [0.0, 0.0, 1.0]]);
    let quad = localize(&h, 100.0, 200.0);
    let expected = [(40.0, 25.0), (140.0, 25.0), (140.0, 225.0), (40.0, 225.0)];
    for (p, (x, y)) in quad.corners().iter().zip(expected) {
        assert_relative_eq!(p.x, x, epsilon = 1e-9);
        assert_relative_eq!(p.y, y, epsilon = 1e-9);
    }
    assert_relative_eq!(quad.area(), 20000.0, epsilon = 1e-6);
}

#[test]
fn corners_keep_source_order_under_rotation() {
    // 90 degrees: (x, y) -> (-y, x), shifted into the positive quadrant.
    let h = Homography::from_rows([[0.0, -1.0, 300.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
    let quad = localize(&h, 100.0, 200.0);
    assert_relative_eq!(quad.corner(Corner::TopLeft).x, 300.0, epsilon = 1e-9);
    assert_relative_eq!(quad.corner(Corner::TopRight).y, 100.0, epsilon = 1e-9);
    assert_relative_eq!(quad.corner(Corner::BottomRight).x, 100.0, epsilon = 1e-9);
    assert_relative_eq!(quad.corner(Corner::BottomLeft).y, 0.0, epsilon = 1e-9);
    assert!(quad.is_convex());
}

#[test]
fn corners_outside_reference_are_not_clamped() {
    let h = Homography::from_rows([[2.0, 0.0, -500.0], [0.0, 2.0, -80.0], [0.0, 0.0, 1.0]]);
    let quad = localize(&h, 100.0, 100.0);
    assert_eq!(quad.corner(Corner::TopLeft), Point2::new(-500.0, -80.0));
    assert_eq!(quad.corner(Corner::BottomRight), Point2::new(-300.0, 120.0));
    assert!(quad.is_finite());
}

#[test]
fn perspective_warp_stays_convex() {
    let h = Homography::from_rows([
        [0.9, 0.1, 30.0],
        [-0.05, 1.1, 12.0],
        [0.0008, 0.0005, 1.0],
    ]);
    let quad = localize(&h, 320.0, 240.0);
    assert!(quad.is_finite());
    assert!(quad.is_convex());
    for (src, mapped) in [(0.0, 0.0), (320.0, 0.0), (320.0, 240.0), (0.0, 240.0)]
        .iter()
        .zip(quad.corners())
    {
        let p = h.project(&Point2::new(src.0, src.1));
        assert_eq!(p, *mapped);
    }
}

#[test]
fn corner_at_infinity_is_nan() {
    // w = 1 - x / 100 vanishes at the right edge of a 100-wide query.
    let h = Homography::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-0.01, 0.0, 1.0]]);
    let quad = localize(&h, 100.0, 50.0);
    assert!(!quad.is_finite());
    assert!(quad.corner(Corner::TopRight).x.is_nan());
    assert_eq!(quad.corner(Corner::TopLeft), Point2::new(0.0, 0.0));
    assert!(!quad.is_convex());
}
