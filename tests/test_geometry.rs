use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;

use wave_shooter::geometry::*;

#[test]
fn circle_touching_a_rect_edge_does_not_intersect() {
    let r = Rect::new(10.0, 10.0, 20.0, 20.0);
    assert!(!circle_intersects_rect(Vec2::new(5.0, 20.0), 5.0, &r));
    assert!(circle_intersects_rect(Vec2::new(5.1, 20.0), 5.0, &r));
    assert!(circle_intersects_rect(Vec2::new(20.0, 20.0), 1.0, &r));
}

#[test]
fn corner_uses_the_nearest_point() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    // sqrt(3² + 3²) ≈ 4.24
    assert!(circle_intersects_rect(Vec2::new(13.0, 13.0), 4.3, &r));
    assert!(!circle_intersects_rect(Vec2::new(13.0, 13.0), 4.2, &r));
}

#[test]
fn touching_circles_overlap() {
    assert!(circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0));
    assert!(!circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.1, 0.0), 5.0));
}

#[test]
fn angles_follow_screen_coordinates() {
    let close = |a: f32, b: f32| (a - b).abs() < 1e-6;
    assert!(close(angle_to(Vec2::ZERO, Vec2::new(1.0, 0.0)), 0.0));
    assert!(close(angle_to(Vec2::ZERO, Vec2::new(0.0, 1.0)), FRAC_PI_2));
    assert!(close(angle_to(Vec2::new(5.0, 5.0), Vec2::new(4.0, 5.0)), PI));
    assert!((unit(FRAC_PI_2) - Vec2::new(0.0, 1.0)).length() < 1e-6);
}

#[test]
fn bounds_clamp_and_containment() {
    let b = Bounds::new(100.0, 50.0);
    assert_eq!(b.center(), Vec2::new(50.0, 25.0));
    assert_eq!(b.clamp_circle(Vec2::new(-10.0, 60.0), 5.0), Vec2::new(5.0, 45.0));
    assert!(!b.is_outside(Vec2::new(-4.0, 10.0), 5.0));
    assert!(b.is_outside(Vec2::new(-6.0, 10.0), 5.0));
    assert!(b.contains_rect(&Rect::new(0.0, 0.0, 100.0, 50.0)));
    assert!(!b.contains_rect(&Rect::new(90.0, 0.0, 20.0, 10.0)));
}

#[test]
fn rects_sharing_an_edge_do_not_overlap() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(!a.overlaps(&Rect::new(10.0, 0.0, 10.0, 10.0)));
    assert!(a.overlaps(&Rect::new(9.0, 9.0, 10.0, 10.0)));
    assert_eq!(a.center(), Vec2::new(5.0, 5.0));
}
