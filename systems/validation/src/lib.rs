#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure validation system enforcing nested-circle containment.

use zone_forecast_core::{
    geometry::{distance, max_allowed_offset, within_containment},
    MatchSequence, Phase,
};

/// Describes the first consecutive phase pair that breaks containment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainmentViolation {
    /// Phase of the enclosing circle.
    pub phase: Phase,
    /// Phase of the circle that escapes it.
    pub next_phase: Phase,
    /// Measured distance between the two centres.
    pub offset: f64,
    /// Largest distance the radii permit.
    pub allowed: f64,
}

impl ContainmentViolation {
    /// Amount by which the offset exceeds its allowance.
    #[must_use]
    pub fn excess(&self) -> f64 {
        self.offset - self.allowed
    }
}

/// Stateless validator checking that every circle lies inside its predecessor.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceValidator;

impl SequenceValidator {
    /// Creates a validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns `true` when every consecutive pair of circles satisfies containment.
    #[must_use]
    pub fn is_valid(&self, sequence: &MatchSequence) -> bool {
        self.first_violation(sequence).is_none()
    }

    /// Reports the earliest transition that escapes its enclosing circle.
    #[must_use]
    pub fn first_violation(&self, sequence: &MatchSequence) -> Option<ContainmentViolation> {
        sequence.transitions().find_map(|(current, next)| {
            let offset = distance(current.center(), next.center());
            let allowed = max_allowed_offset(current.radius(), next.radius());
            if within_containment(offset, allowed) {
                None
            } else {
                Some(ContainmentViolation {
                    phase: current.phase(),
                    next_phase: next.phase(),
                    offset,
                    allowed,
                })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zone_forecast_core::{Circle, MatchId, Point};

    fn sequence(centers: &[(f64, f64)], radii: &[u32]) -> MatchSequence {
        let circles = centers
            .iter()
            .zip(radii)
            .enumerate()
            .map(|(index, (&(x, y), &radius))| {
                Circle::new(
                    MatchId::new("mac0100"),
                    Phase::new(index as u32 + 1),
                    Point::new(x, y),
                    radius,
                )
            })
            .collect();
        MatchSequence::new(circles).expect("well-formed sequence")
    }

    #[test]
    fn single_phase_sequence_is_trivially_valid() {
        let validator = SequenceValidator::new();
        assert!(validator.is_valid(&sequence(&[(600.0, 550.0)], &[298])));
    }

    #[test]
    fn violation_reports_offending_pair() {
        let validator = SequenceValidator::new();
        let escaped = sequence(
            &[(600.0, 550.0), (700.0, 550.0), (800.0, 550.0)],
            &[298, 162, 99],
        );
        let violation = validator
            .first_violation(&escaped)
            .expect("second transition escapes");
        assert_eq!(violation.phase, Phase::new(2));
        assert_eq!(violation.next_phase, Phase::new(3));
        assert_eq!(violation.offset, 100.0);
        assert_eq!(violation.allowed, 63.0);
        assert_eq!(violation.excess(), 37.0);
    }
}
