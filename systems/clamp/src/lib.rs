#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Boundary clamp projecting predicted zone centres back into the feasible region.
//!
//! The feasible region for the next centre is the disc of radius
//! `current_radius - next_radius` around the current centre. Points inside it
//! pass through untouched; points outside are pulled back along the ray from
//! the current centre. Feasibility uses the same containment predicate as the
//! sequence validator, so a projected point always validates.

use zone_forecast_core::{
    geometry::{distance, max_allowed_offset, within_containment},
    Point, ZoneError,
};

/// Exact result of projecting a candidate centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Feasible centre.
    pub point: Point,
    /// Whether the candidate had to be moved.
    pub was_clamped: bool,
}

/// Pixel-precision result of clamping a candidate centre.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClampedCenter {
    /// Horizontal pixel coordinate, truncated toward zero.
    pub x: i64,
    /// Vertical pixel coordinate, truncated toward zero.
    pub y: i64,
    /// Whether the candidate had to be moved.
    pub was_clamped: bool,
}

impl ClampedCenter {
    /// Pixel coordinates as a real-valued point.
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// Projects `predicted` onto the disc of feasible next centres around `current`.
///
/// When the radii do not shrink the current centre is returned unchanged and
/// reported as not clamped.
pub fn project(
    predicted: Point,
    current: Point,
    current_radius: u32,
    next_radius: u32,
) -> Result<Projection, ZoneError> {
    ensure_finite(predicted)?;
    ensure_finite(current)?;

    let max_offset = max_allowed_offset(current_radius, next_radius);
    if max_offset <= 0.0 {
        return Ok(Projection {
            point: current,
            was_clamped: false,
        });
    }

    let offset = distance(predicted, current);
    if within_containment(offset, max_offset) {
        return Ok(Projection {
            point: predicted,
            was_clamped: false,
        });
    }

    // offset > max_offset > 0 here, so the ratio is well defined.
    let ratio = max_offset / offset;
    let point = Point::new(
        current.x() + (predicted.x() - current.x()) * ratio,
        current.y() + (predicted.y() - current.y()) * ratio,
    );
    Ok(Projection {
        point,
        was_clamped: true,
    })
}

/// Clamps `predicted` like [`project`] and truncates the result to whole pixels.
pub fn clamp(
    predicted: Point,
    current: Point,
    current_radius: u32,
    next_radius: u32,
) -> Result<ClampedCenter, ZoneError> {
    let projection = project(predicted, current, current_radius, next_radius)?;
    Ok(ClampedCenter {
        x: projection.point.x().trunc() as i64,
        y: projection.point.y().trunc() as i64,
        was_clamped: projection.was_clamped,
    })
}

fn ensure_finite(point: Point) -> Result<(), ZoneError> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(ZoneError::NonFiniteCoordinate {
            x: point.x(),
            y: point.y(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_prediction_is_pulled_to_allowance() {
        let clamped = clamp(Point::new(200.0, 0.0), Point::new(0.0, 0.0), 298, 162)
            .expect("finite input");
        assert_eq!(
            clamped,
            ClampedCenter {
                x: 136,
                y: 0,
                was_clamped: true
            }
        );
    }

    #[test]
    fn equal_radii_return_current_center() {
        let current = Point::new(410.0, 377.0);
        let clamped = clamp(Point::new(900.0, 900.0), current, 162, 162).expect("finite");
        assert_eq!(
            clamped,
            ClampedCenter {
                x: 410,
                y: 377,
                was_clamped: false
            }
        );
    }

    #[test]
    fn inverted_radii_return_current_center() {
        let current = Point::new(10.5, 20.5);
        let projection = project(Point::new(0.0, 0.0), current, 48, 99).expect("finite");
        assert_eq!(projection.point, current);
        assert!(!projection.was_clamped);
    }

    #[test]
    fn coincident_prediction_is_feasible() {
        let current = Point::new(300.0, 300.0);
        let projection = project(current, current, 298, 162).expect("finite");
        assert_eq!(projection.point, current);
        assert!(!projection.was_clamped);
    }

    #[test]
    fn truncation_drops_fraction_toward_zero() {
        let clamped = clamp(Point::new(10.9, -3.7), Point::new(0.0, 0.0), 298, 162)
            .expect("finite");
        assert_eq!((clamped.x, clamped.y), (10, -3));
        assert!(!clamped.was_clamped);
    }

    #[test]
    fn non_finite_prediction_fails_fast() {
        let error = clamp(Point::new(f64::NAN, 1.0), Point::new(0.0, 0.0), 298, 162)
            .expect_err("nan must be rejected");
        assert!(matches!(error, ZoneError::NonFiniteCoordinate { .. }));
    }
}
