#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the zone forecasting workspace.
//!
//! This crate defines the vocabulary every other crate speaks: the
//! [`ZoneSchedule`] describing how the safe zone shrinks phase by phase, the
//! [`Circle`] and [`MatchSequence`] values produced by generators and dataset
//! readers, and the containment arithmetic in [`geometry`] that validators
//! and clamps must agree on. Systems consume these values and never mutate
//! them once created.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod geometry;

/// Radii of the default four-phase schedule, measured in map pixels.
pub const DEFAULT_PHASE_RADII: [u32; 4] = [298, 162, 99, 48];
/// Width of the default reference map in pixels.
pub const DEFAULT_MAP_WIDTH: u32 = 1181;
/// Height of the default reference map in pixels.
pub const DEFAULT_MAP_HEIGHT: u32 = 1133;
/// Prefix shared by every match identifier.
pub const MATCH_ID_PREFIX: &str = "mac";

/// Errors raised by schedule lookups and geometric helpers.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ZoneError {
    /// A phase outside the schedule was requested.
    #[error("phase {phase} is outside the schedule range 1..={max_phase}")]
    Domain {
        /// Phase that was requested.
        phase: u32,
        /// Last phase defined by the schedule.
        max_phase: u32,
    },
    /// Two point batches that must align had different lengths.
    #[error("point batches differ in length ({left} vs {right})")]
    Shape {
        /// Length of the left-hand batch.
        left: usize,
        /// Length of the right-hand batch.
        right: usize,
    },
    /// Upstream configuration or data is inconsistent.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    /// A coordinate was NaN or infinite.
    #[error("coordinate ({x}, {y}) is not finite")]
    NonFiniteCoordinate {
        /// Horizontal component.
        x: f64,
        /// Vertical component.
        y: f64,
    },
}

/// Specific reasons a schedule, distribution or sequence is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The schedule contained no phases.
    #[error("schedule defines no phases")]
    EmptySchedule,
    /// A phase radius was zero.
    #[error("phase {phase} has a zero radius")]
    ZeroRadius {
        /// Offending phase.
        phase: u32,
    },
    /// Radii did not strictly decrease between two phases.
    #[error("phase {phase} radius {radius} does not exceed next radius {next_radius}")]
    RadiiNotDecreasing {
        /// Earlier phase of the offending pair.
        phase: u32,
        /// Radius of the earlier phase.
        radius: u32,
        /// Radius of the following phase.
        next_radius: u32,
    },
    /// The map had a zero dimension.
    #[error("map dimensions {width}x{height} are empty")]
    EmptyMap {
        /// Map width in pixels.
        width: u32,
        /// Map height in pixels.
        height: u32,
    },
    /// The first circle cannot be placed anywhere on the map.
    #[error("radius {radius} does not fit a {width}x{height} map")]
    ZoneExceedsMap {
        /// Radius that does not fit.
        radius: u32,
        /// Map width in pixels.
        width: u32,
        /// Map height in pixels.
        height: u32,
    },
    /// Shift distribution parameters were rejected.
    #[error("shift distribution parameters alpha={alpha}, beta={beta} are invalid")]
    InvalidShiftDistribution {
        /// First shape parameter, rendered for display.
        alpha: String,
        /// Second shape parameter, rendered for display.
        beta: String,
    },
    /// A generation run would number matches past `u32::MAX`.
    #[error("cannot number {count} matches starting at {first}")]
    MatchNumberOverflow {
        /// First match number of the run.
        first: u32,
        /// Requested number of matches.
        count: u32,
    },
    /// A sequence of circles violated the phase ordering rules.
    #[error("match {match_id}: {reason}")]
    MalformedSequence {
        /// Match whose circles were malformed.
        match_id: String,
        /// Description of the ordering problem.
        reason: String,
    },
}

/// Sequential stage of the shrinking safe zone, counted from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phase(u32);

impl Phase {
    /// The opening phase of every match.
    pub const FIRST: Self = Self(1);

    /// Wraps a raw phase number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw phase number.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Phase immediately following this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Real-valued map coordinate in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a point from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Returns `true` when both components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Moves the point by `distance` along `angle` radians.
    #[must_use]
    pub fn offset_polar(&self, distance: f64, angle: f64) -> Self {
        Self::new(
            self.x + distance * angle.cos(),
            self.y + distance * angle.sin(),
        )
    }

    /// Rounds both components to two decimal places.
    #[must_use]
    pub fn rounded_to_cents(&self) -> Self {
        Self::new(
            geometry::round_to_cents(self.x),
            geometry::round_to_cents(self.y),
        )
    }
}

/// Identifier naming a real or synthetic match.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Wraps an arbitrary identifier string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds the identifier assigned to synthetic match `number`.
    #[must_use]
    pub fn synthetic(number: u32) -> Self {
        Self(format!("{MATCH_ID_PREFIX}{number:04}"))
    }

    /// Numeric suffix following the shared prefix, when the identifier has one.
    #[must_use]
    pub fn numeric_suffix(&self) -> Option<u32> {
        self.0.strip_prefix(MATCH_ID_PREFIX)?.parse().ok()
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number the next synthetic match should use given the identifiers already taken.
///
/// Identifiers without a numeric suffix are ignored; when none parse the
/// `fallback` is returned.
#[must_use]
pub fn next_free_match_number<'a>(
    existing: impl IntoIterator<Item = &'a MatchId>,
    fallback: u32,
) -> u32 {
    existing
        .into_iter()
        .filter_map(MatchId::numeric_suffix)
        .max()
        .map_or(fallback, |highest| highest.saturating_add(1))
}

/// Safe-zone circle observed or generated for one phase of one match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    match_id: MatchId,
    phase: Phase,
    center: Point,
    radius: u32,
}

impl Circle {
    /// Creates a circle for `phase` of `match_id`.
    #[must_use]
    pub fn new(match_id: MatchId, phase: Phase, center: Point, radius: u32) -> Self {
        Self {
            match_id,
            phase,
            center,
            radius,
        }
    }

    /// Match the circle belongs to.
    #[must_use]
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Phase the circle describes.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Centre of the circle.
    #[must_use]
    pub const fn center(&self) -> Point {
        self.center
    }

    /// Radius of the circle in pixels.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }
}

/// Phase-ordered circles of a single match.
///
/// Construction guarantees a non-empty sequence whose circles share one match
/// identifier and whose phases run contiguously from 1. Containment between
/// consecutive circles is not guaranteed here; that is the validator's job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchSequence {
    circles: Vec<Circle>,
}

impl MatchSequence {
    /// Creates a sequence, rejecting empty, mixed or non-contiguous circle lists.
    pub fn new(circles: Vec<Circle>) -> Result<Self, ZoneError> {
        let Some(first) = circles.first() else {
            return Err(ConfigurationError::MalformedSequence {
                match_id: String::new(),
                reason: "sequence contains no circles".to_owned(),
            }
            .into());
        };
        let match_id = first.match_id().clone();

        for (index, circle) in circles.iter().enumerate() {
            if circle.match_id() != &match_id {
                return Err(malformed(
                    &match_id,
                    format!("circle for match {} mixed into sequence", circle.match_id()),
                ));
            }

            let expected = Phase::new(index as u32 + 1);
            if circle.phase() != expected {
                return Err(malformed(
                    &match_id,
                    format!("expected phase {expected}, found phase {}", circle.phase()),
                ));
            }
        }

        Ok(Self { circles })
    }

    /// Identifier shared by every circle.
    #[must_use]
    pub fn match_id(&self) -> &MatchId {
        self.circles[0].match_id()
    }

    /// Circles in phase order.
    #[must_use]
    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    /// Number of phases covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.circles.len()
    }

    /// Always `false`; sequences hold at least one circle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    /// Consecutive `(current, next)` circle pairs in phase order.
    pub fn transitions(&self) -> impl Iterator<Item = (&Circle, &Circle)> + '_ {
        self.circles.windows(2).map(|pair| (&pair[0], &pair[1]))
    }
}

fn malformed(match_id: &MatchId, reason: String) -> ZoneError {
    ConfigurationError::MalformedSequence {
        match_id: match_id.to_string(),
        reason,
    }
    .into()
}

/// Axis-aligned rectangle of admissible circle centres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterBounds {
    /// Smallest admissible x coordinate.
    pub x_min: f64,
    /// Largest admissible x coordinate.
    pub x_max: f64,
    /// Smallest admissible y coordinate.
    pub y_min: f64,
    /// Largest admissible y coordinate.
    pub y_max: f64,
}

impl CenterBounds {
    /// Returns `true` when `point` lies inside the bounds, edges included.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        (self.x_min..=self.x_max).contains(&point.x())
            && (self.y_min..=self.y_max).contains(&point.y())
    }
}

/// Immutable per-phase radius table together with the map it applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneSchedule {
    radii: Vec<u32>,
    map_width: u32,
    map_height: u32,
}

impl Default for ZoneSchedule {
    fn default() -> Self {
        Self {
            radii: DEFAULT_PHASE_RADII.to_vec(),
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
        }
    }
}

impl ZoneSchedule {
    /// Creates a schedule, validating radii ordering and map fit.
    pub fn new(radii: Vec<u32>, map_width: u32, map_height: u32) -> Result<Self, ZoneError> {
        let Some(&first) = radii.first() else {
            return Err(ConfigurationError::EmptySchedule.into());
        };

        if map_width == 0 || map_height == 0 {
            return Err(ConfigurationError::EmptyMap {
                width: map_width,
                height: map_height,
            }
            .into());
        }

        for (index, &radius) in radii.iter().enumerate() {
            if radius == 0 {
                return Err(ConfigurationError::ZeroRadius {
                    phase: index as u32 + 1,
                }
                .into());
            }
        }

        for (index, pair) in radii.windows(2).enumerate() {
            if pair[0] <= pair[1] {
                return Err(ConfigurationError::RadiiNotDecreasing {
                    phase: index as u32 + 1,
                    radius: pair[0],
                    next_radius: pair[1],
                }
                .into());
            }
        }

        let diameter = u64::from(first) * 2;
        if diameter > u64::from(map_width) || diameter > u64::from(map_height) {
            return Err(ConfigurationError::ZoneExceedsMap {
                radius: first,
                width: map_width,
                height: map_height,
            }
            .into());
        }

        Ok(Self {
            radii,
            map_width,
            map_height,
        })
    }

    /// Number of phases defined by the schedule.
    #[must_use]
    pub fn phase_count(&self) -> u32 {
        self.radii.len() as u32
    }

    /// Final phase of the schedule.
    #[must_use]
    pub fn last_phase(&self) -> Phase {
        Phase::new(self.phase_count())
    }

    /// Iterates over every phase in order.
    pub fn phases(&self) -> impl Iterator<Item = Phase> {
        (1..=self.phase_count()).map(Phase::new)
    }

    /// Radius of the circle for `phase`.
    pub fn radius(&self, phase: Phase) -> Result<u32, ZoneError> {
        let index = phase
            .get()
            .checked_sub(1)
            .ok_or_else(|| self.domain_error(phase))?;
        self.radii
            .get(index as usize)
            .copied()
            .ok_or_else(|| self.domain_error(phase))
    }

    /// Radius of the phase after `phase`, or the last radius once the schedule is exhausted.
    pub fn next_radius_or_last(&self, phase: Phase) -> Result<u32, ZoneError> {
        let _ = self.radius(phase)?;
        match self.radius(phase.next()) {
            Ok(radius) => Ok(radius),
            Err(_) => self.radius(self.last_phase()),
        }
    }

    /// Largest centre shift allowed when moving from `phase` to the following phase.
    pub fn max_offset(&self, phase: Phase) -> Result<f64, ZoneError> {
        let radius = self.radius(phase)?;
        let next_radius = self.radius(phase.next())?;
        Ok(geometry::max_allowed_offset(radius, next_radius))
    }

    /// Rectangle of centres keeping the `phase` circle fully on the map.
    pub fn valid_center_bounds(&self, phase: Phase) -> Result<CenterBounds, ZoneError> {
        let radius = f64::from(self.radius(phase)?);
        Ok(CenterBounds {
            x_min: radius,
            x_max: f64::from(self.map_width) - radius,
            y_min: radius,
            y_max: f64::from(self.map_height) - radius,
        })
    }

    fn domain_error(&self, phase: Phase) -> ZoneError {
        ZoneError::Domain {
            phase: phase.get(),
            max_phase: self.phase_count(),
        }
    }
}
