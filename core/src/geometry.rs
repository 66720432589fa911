//! Containment arithmetic shared by validation, clamping and diagnostics.

use crate::{Point, ZoneError};

/// Numerical slack applied when comparing a centre offset to its allowance.
///
/// Absorbs the error introduced by rounding generated centres to two decimals.
pub const CONTAINMENT_EPSILON: f64 = 1e-6;

/// Euclidean distance between two points.
///
/// Coincident points yield exactly `0.0`.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    (b.x() - a.x()).hypot(b.y() - a.y())
}

/// Elementwise distances between two equally sized point batches.
pub fn batch_distance(left: &[Point], right: &[Point]) -> Result<Vec<f64>, ZoneError> {
    if left.len() != right.len() {
        return Err(ZoneError::Shape {
            left: left.len(),
            right: right.len(),
        });
    }

    Ok(left
        .iter()
        .zip(right)
        .map(|(a, b)| distance(*a, *b))
        .collect())
}

/// Largest centre offset that keeps a circle of `next_radius` inside one of `radius`.
///
/// Negative when the radii are inverted; callers decide how to treat that.
#[must_use]
pub fn max_allowed_offset(radius: u32, next_radius: u32) -> f64 {
    f64::from(radius) - f64::from(next_radius)
}

/// Returns `true` when an offset of `offset` respects the `allowed` containment budget.
#[must_use]
pub fn within_containment(offset: f64, allowed: f64) -> bool {
    offset <= allowed + CONTAINMENT_EPSILON
}

/// Rounds a coordinate to two decimal places, the precision of generated rows.
#[must_use]
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_coincident_points_is_zero() {
        let point = Point::new(412.5, 87.25);
        let value = distance(point, point);
        assert_eq!(value, 0.0);
        assert!(!value.is_nan());
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(distance(a, b), 5.0);
        assert_eq!(distance(b, a), 5.0);
    }

    #[test]
    fn batch_distance_rejects_mismatched_lengths() {
        let left = [Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        let right = [Point::new(0.0, 0.0)];
        assert_eq!(
            batch_distance(&left, &right),
            Err(ZoneError::Shape { left: 2, right: 1 })
        );
    }

    #[test]
    fn batch_distance_is_elementwise() {
        let left = [Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
        let right = [Point::new(6.0, 8.0), Point::new(10.0, 10.0)];
        assert_eq!(batch_distance(&left, &right), Ok(vec![10.0, 0.0]));
    }

    #[test]
    fn containment_allows_epsilon_slack() {
        let allowed = max_allowed_offset(298, 162);
        assert_eq!(allowed, 136.0);
        assert!(within_containment(136.0, allowed));
        assert!(within_containment(136.0 + 5e-7, allowed));
        assert!(!within_containment(136.01, allowed));
    }

    #[test]
    fn inverted_radii_produce_negative_allowance() {
        assert_eq!(max_allowed_offset(99, 162), -63.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_to_cents(600.123_4), 600.12);
        assert_eq!(round_to_cents(-12.345_6), -12.35);
        assert_eq!(round_to_cents(736.0), 736.0);
    }
}
