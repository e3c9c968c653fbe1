//! Shared physics helpers
//!
//! Point-mass gravity, circle overlap and all-or-nothing fuel spending.

use glam::Vec2;

use super::state::Rejection;

/// Acceleration pulling `from` toward `center`.
///
/// Magnitude is `gm / d^2` with `d` floored at `min_distance`, so a craft that
/// is already inside a body is pulled gently rather than flung across the
/// field before the collision check sees it.
#[inline]
pub fn inverse_square_pull(from: Vec2, center: Vec2, gm: f32, min_distance: f32) -> Vec2 {
    let offset = center - from;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return Vec2::ZERO;
    }
    let softened = distance.max(min_distance);
    offset / distance * (gm / (softened * softened))
}

/// Two circles overlap when their centres are closer than the sum of radii
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    a.distance(b) < radius_a + radius_b
}

/// Spend `cost` from `fuel`, or reject without touching it
#[inline]
pub fn spend(fuel: f32, cost: f32) -> Result<f32, Rejection> {
    if cost.is_nan() || cost <= 0.0 {
        return Err(Rejection::InvalidAmount);
    }
    if fuel < cost {
        return Err(Rejection::InsufficientFuel {
            required: cost,
            available: fuel,
        });
    }
    Ok(fuel - cost)
}

/// Passive drain, clamped at zero
#[inline]
pub fn drain(fuel: f32, amount: f32) -> f32 {
    (fuel - amount).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pull_points_at_center() {
        let pull = inverse_square_pull(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 100.0, 1.0);
        assert!((pull.x - 1.0).abs() < 1e-6);
        assert!(pull.y.abs() < 1e-6);
    }

    #[test]
    fn test_pull_is_softened_inside_body() {
        let inside = inverse_square_pull(Vec2::new(9.0, 0.0), Vec2::new(10.0, 0.0), 100.0, 5.0);
        assert!((inside.length() - 4.0).abs() < 1e-5);
        assert_eq!(
            inverse_square_pull(Vec2::ONE, Vec2::ONE, 100.0, 5.0),
            Vec2::ZERO
        );
    }

    #[test]
    fn test_pull_superposition_cancels() {
        let left = inverse_square_pull(Vec2::ZERO, Vec2::new(-50.0, 0.0), 10.0, 1.0);
        let right = inverse_square_pull(Vec2::ZERO, Vec2::new(50.0, 0.0), 10.0, 1.0);
        assert!((left + right).length() < 1e-6);
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 10.0));
        assert!(!circles_overlap(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0));
    }

    #[test]
    fn test_spend() {
        assert_eq!(spend(10.0, 4.0), Ok(6.0));
        assert_eq!(spend(4.0, 4.0), Ok(0.0));
        assert_eq!(
            spend(3.0, 4.0),
            Err(Rejection::InsufficientFuel {
                required: 4.0,
                available: 3.0
            })
        );
        assert_eq!(spend(3.0, 0.0), Err(Rejection::InvalidAmount));
        assert_eq!(spend(3.0, f32::NAN), Err(Rejection::InvalidAmount));
    }

    proptest! {
        #[test]
        fn prop_spend_never_goes_negative(fuel in 0.0f32..1000.0, cost in -10.0f32..1000.0) {
            match spend(fuel, cost) {
                Ok(left) => prop_assert!(left >= 0.0),
                Err(_) => {}
            }
            prop_assert!(drain(fuel, cost.abs()) >= 0.0);
        }
    }
}
