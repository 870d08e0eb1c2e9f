//! Curve solver.
//!
//! Converts a pair of endpoints, their tangent hints and an optional anchor
//! into a dense sequence of oriented samples. Every degenerate input falls
//! back to linear interpolation instead of failing.

use crate::sample::PathSample;
use pathforge_core::geometry::COLLINEAR_EPSILON;
use pathforge_core::{circle_through, cross2, horizontal, Vec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

/// Chords shorter than this are always solved linearly.
pub const MIN_CHORD: f64 = 0.1;
/// Anchors closer than this to an endpoint are ignored.
pub const MIN_ANCHOR_DISTANCE: f64 = 0.1;
/// Smallest usable arc radius.
pub const MIN_ARC_RADIUS: f64 = 0.1;
/// Largest usable arc radius.
pub const MAX_ARC_RADIUS: f64 = 1000.0;
/// Anchors farther than this multiple of the chord from an endpoint are ignored.
pub const MAX_ANCHOR_REACH: f64 = 3.0;
/// Maximum angular spacing between arc samples.
pub const MAX_ARC_STEP_DEGREES: f64 = 5.0;

/// Samples used when estimating spline segment length.
const LENGTH_ESTIMATE_STEPS: usize = 16;

/// Shape of the curve between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CurveKind {
    /// Straight segment.
    #[default]
    Straight,
    /// Circular arc through the anchor.
    Arc,
    /// Catmull-Rom style spline.
    SplineApprox,
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveKind::Straight => write!(f, "straight"),
            CurveKind::Arc => write!(f, "arc"),
            CurveKind::SplineApprox => write!(f, "spline"),
        }
    }
}

/// Inputs for solving one edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveInput {
    /// Start point.
    pub p1: Vec3,
    /// End point.
    pub p2: Vec3,
    /// Direction of travel at `p1`.
    pub tangent1: Vec3,
    /// Direction of travel at `p2`.
    pub tangent2: Vec3,
    /// Optional anchor shaping the curve.
    pub anchor: Option<Vec3>,
}

impl CurveInput {
    /// Input for a segment with chord tangents and no anchor.
    pub fn straight(p1: Vec3, p2: Vec3) -> Self {
        let chord = chord_direction(p1, p2);
        Self {
            p1,
            p2,
            tangent1: chord,
            tangent2: chord,
            anchor: None,
        }
    }

    /// Set the anchor.
    pub fn with_anchor(mut self, anchor: Vec3) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Set both tangent hints.
    pub fn with_tangents(mut self, tangent1: Vec3, tangent2: Vec3) -> Self {
        self.tangent1 = tangent1;
        self.tangent2 = tangent2;
        self
    }
}

/// Whether an anchor is usable to shape the curve between `p1` and `p2`.
///
/// Rejects anchors on top of an endpoint, collinear with the chord, farther
/// from the chord than half its length, or far outside the segment.
pub fn anchor_is_valid(p1: Vec3, p2: Vec3, anchor: Vec3) -> bool {
    let chord = p2 - p1;
    let length = chord.length();
    if length < MIN_CHORD {
        return false;
    }
    if anchor.distance(p1) < MIN_ANCHOR_DISTANCE || anchor.distance(p2) < MIN_ANCHOR_DISTANCE {
        return false;
    }

    let h_chord = horizontal(chord);
    let h_length = h_chord.length();
    if h_length < MIN_CHORD {
        return false;
    }
    let cross = cross2(h_chord, anchor - p1);
    if cross.abs() < COLLINEAR_EPSILON {
        return false;
    }
    if cross.abs() / h_length > length * 0.5 {
        return false;
    }

    let reach = length * MAX_ANCHOR_REACH;
    anchor.distance(p1) <= reach && anchor.distance(p2) <= reach
}

/// Analytic tangent of a curve at one of its ends, in direction of travel.
///
/// Arc tangents are horizontal and oriented along the direction of travel
/// through the anchor. Falls back to the chord direction whenever the
/// curve would be solved linearly.
pub fn analytic_tangent(
    kind: CurveKind,
    p1: Vec3,
    p2: Vec3,
    anchor: Option<Vec3>,
    at_start: bool,
) -> Vec3 {
    let chord = chord_direction(p1, p2);
    let Some(anchor) = anchor.filter(|a| anchor_is_valid(p1, p2, *a)) else {
        return chord;
    };

    match kind {
        CurveKind::Straight => chord,
        CurveKind::Arc => {
            let Some(circle) = circle_through(p1, p2, anchor) else {
                return chord;
            };
            if !(MIN_ARC_RADIUS..=MAX_ARC_RADIUS).contains(&circle.radius) {
                return chord;
            }
            let angle = circle.angle_of(if at_start { p1 } else { p2 });
            let sweep = arc_sweep(
                circle.angle_of(p1),
                circle.angle_of(p2),
                circle.angle_of(anchor),
            );
            Vec3::new(-angle.sin(), 0.0, angle.cos()) * sweep.signum()
        }
        CurveKind::SplineApprox => {
            let direction = if at_start { anchor - p1 } else { p2 - anchor };
            direction.try_normalize().unwrap_or(chord)
        }
    }
}

/// Signed angle swept from `a1` to `a2` on the side of the circle holding `aa`.
fn arc_sweep(a1: f64, a2: f64, aa: f64) -> f64 {
    let to_end = (a2 - a1).rem_euclid(TAU);
    let to_anchor = (aa - a1).rem_euclid(TAU);
    if to_anchor < to_end {
        to_end
    } else {
        to_end - TAU
    }
}

fn chord_direction(p1: Vec3, p2: Vec3) -> Vec3 {
    (p2 - p1).try_normalize().unwrap_or(Vec3::X)
}

/// Quadratic Bézier of three scalars.
fn bezier(a: f64, b: f64, c: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * a + 2.0 * u * t * b + t * t * c
}

fn bezier_derivative(a: f64, b: f64, c: f64, t: f64) -> f64 {
    2.0 * (1.0 - t) * (b - a) + 2.0 * t * (c - b)
}

/// Uniform Catmull-Rom segment between `c1` and `c2`.
#[derive(Debug, Clone, Copy)]
struct CatmullRom {
    c0: Vec3,
    c1: Vec3,
    c2: Vec3,
    c3: Vec3,
}

impl CatmullRom {
    fn point(&self, u: f64) -> Vec3 {
        let (c0, c1, c2, c3) = (self.c0, self.c1, self.c2, self.c3);
        0.5 * (2.0 * c1
            + (c2 - c0) * u
            + (2.0 * c0 - 5.0 * c1 + 4.0 * c2 - c3) * u * u
            + (3.0 * c1 - c0 - 3.0 * c2 + c3) * u * u * u)
    }

    fn derivative(&self, u: f64) -> Vec3 {
        let (c0, c1, c2, c3) = (self.c0, self.c1, self.c2, self.c3);
        0.5 * ((c2 - c0)
            + 2.0 * (2.0 * c0 - 5.0 * c1 + 4.0 * c2 - c3) * u
            + 3.0 * (3.0 * c1 - c0 - 3.0 * c2 + c3) * u * u)
    }

    fn estimated_length(&self) -> f64 {
        let mut length = 0.0;
        let mut previous = self.point(0.0);
        for i in 1..=LENGTH_ESTIMATE_STEPS {
            let next = self.point(i as f64 / LENGTH_ESTIMATE_STEPS as f64);
            length += previous.distance(next);
            previous = next;
        }
        length
    }
}

/// Produces dense samples for a single edge.
#[derive(Debug, Clone, Copy)]
pub struct CurveSolver {
    sampling_step: f64,
}

impl Default for CurveSolver {
    fn default() -> Self {
        Self { sampling_step: 0.25 }
    }
}

impl CurveSolver {
    /// Creates a solver with the given maximum spacing between samples.
    pub fn new(sampling_step: f64) -> Self {
        Self {
            sampling_step: sampling_step.max(f64::EPSILON),
        }
    }

    /// Maximum spacing between consecutive samples.
    pub fn sampling_step(&self) -> f64 {
        self.sampling_step
    }

    /// Solve an edge.
    ///
    /// A spline without an anchor is shaped by the tangent hints alone; a
    /// spline or arc whose anchor is rejected degrades to a straight line.
    /// The result starts exactly at `p1` and ends exactly at `p2`, unless
    /// both coincide, in which case a single sample is returned.
    pub fn solve(&self, kind: CurveKind, input: &CurveInput) -> Vec<PathSample> {
        let valid_anchor = input
            .anchor
            .filter(|a| anchor_is_valid(input.p1, input.p2, *a));
        let anchor_rejected = input.anchor.is_some() && valid_anchor.is_none();

        let samples = match (kind, valid_anchor) {
            (CurveKind::Straight, _) | (CurveKind::Arc, None) => None,
            (CurveKind::Arc, Some(anchor)) => self.solve_arc(input.p1, input.p2, anchor),
            (CurveKind::SplineApprox, _) if anchor_rejected => None,
            (CurveKind::SplineApprox, anchor) => {
                if input.p1.distance(input.p2) < MIN_CHORD {
                    None
                } else {
                    Some(self.solve_spline(input, anchor))
                }
            }
        };

        let mut samples = samples.unwrap_or_else(|| self.solve_linear(input.p1, input.p2));
        dedupe_tail(&mut samples);
        samples
    }

    fn solve_linear(&self, p1: Vec3, p2: Vec3) -> Vec<PathSample> {
        let chord = p2 - p1;
        let length = chord.length();
        if length <= f64::EPSILON {
            return vec![PathSample::along(p1, Vec3::X)];
        }

        let count = ((length / self.sampling_step).ceil() as usize).max(1);
        (0..=count)
            .map(|i| {
                let position = if i == count {
                    p2
                } else {
                    p1 + chord * (i as f64 / count as f64)
                };
                PathSample::along(position, chord)
            })
            .collect()
    }

    fn solve_arc(&self, p1: Vec3, p2: Vec3, anchor: Vec3) -> Option<Vec<PathSample>> {
        let circle = circle_through(p1, p2, anchor)?;
        if !(MIN_ARC_RADIUS..=MAX_ARC_RADIUS).contains(&circle.radius) {
            return None;
        }

        let a1 = circle.angle_of(p1);
        let sweep = arc_sweep(a1, circle.angle_of(p2), circle.angle_of(anchor));
        if sweep.abs() <= f64::EPSILON {
            return None;
        }

        let arc_length = circle.radius * sweep.abs();
        let spacing = self
            .sampling_step
            .min(circle.radius * MAX_ARC_STEP_DEGREES.to_radians());
        let count = ((arc_length / spacing).ceil() as usize).max(2);

        let samples = (0..=count)
            .map(|i| {
                let t = i as f64 / count as f64;
                let angle = a1 + sweep * t;
                let position = if i == 0 {
                    p1
                } else if i == count {
                    p2
                } else {
                    let flat = circle.point_at(angle);
                    Vec3::new(flat.x, bezier(p1.y, anchor.y, p2.y, t), flat.z)
                };
                let along_circle = Vec3::new(-angle.sin(), 0.0, angle.cos()) * sweep.signum();
                let direction = along_circle * arc_length
                    + Vec3::Y * bezier_derivative(p1.y, anchor.y, p2.y, t);
                PathSample::along(position, direction)
            })
            .collect();
        Some(samples)
    }

    fn solve_spline(&self, input: &CurveInput, anchor: Option<Vec3>) -> Vec<PathSample> {
        let (p1, p2) = (input.p1, input.p2);
        let h1 = horizontal(p1);
        let h2 = horizontal(p2);
        let chord = horizontal(p2 - p1).try_normalize().unwrap_or(Vec3::X);
        let t1 = horizontal(input.tangent1).try_normalize().unwrap_or(chord);
        let t2 = horizontal(input.tangent2).try_normalize().unwrap_or(chord);

        match anchor {
            None => {
                let reach = h1.distance(h2) * 0.5;
                let segment = CatmullRom {
                    c0: h1 - t1 * reach,
                    c1: h1,
                    c2: h2,
                    c3: h2 + t2 * reach,
                };
                let y = |t: f64| p1.y + (p2.y - p1.y) * t;
                let dy = p2.y - p1.y;
                self.sample_segment(&segment, 0.0, 1.0, p1, p2, |t| (y(t), dy))
            }
            Some(anchor) => {
                let ha = horizontal(anchor);
                let first_length = h1.distance(ha);
                let second_length = ha.distance(h2);
                let total = first_length + second_length;
                let split = if total > f64::EPSILON {
                    first_length / total
                } else {
                    0.5
                };

                let first = CatmullRom {
                    c0: h1 - t1 * (first_length * 0.5),
                    c1: h1,
                    c2: ha,
                    c3: h2,
                };
                let second = CatmullRom {
                    c0: h1,
                    c1: ha,
                    c2: h2,
                    c3: h2 + t2 * (second_length * 0.5),
                };
                let height = |t: f64| {
                    (
                        bezier(p1.y, anchor.y, p2.y, t),
                        bezier_derivative(p1.y, anchor.y, p2.y, t),
                    )
                };

                let mid = Vec3::new(ha.x, anchor.y, ha.z);
                let mut samples = self.sample_segment(&first, 0.0, split, p1, mid, height);
                let tail = self.sample_segment(&second, split, 1.0, mid, p2, height);
                samples.extend(tail.into_iter().skip(1));
                samples
            }
        }
    }

    /// Sample one Catmull-Rom segment covering `[t_start, t_end]` of the
    /// whole edge. `height` maps the edge parameter to `(y, dy/dt)`.
    fn sample_segment(
        &self,
        segment: &CatmullRom,
        t_start: f64,
        t_end: f64,
        start: Vec3,
        end: Vec3,
        height: impl Fn(f64) -> (f64, f64),
    ) -> Vec<PathSample> {
        let span = t_end - t_start;
        let count = ((segment.estimated_length() / self.sampling_step).ceil() as usize).max(1);

        (0..=count)
            .map(|i| {
                let u = i as f64 / count as f64;
                let t = t_start + span * u;
                let (y, dy) = height(t);
                let flat = segment.point(u);
                let position = if i == 0 {
                    start
                } else if i == count {
                    end
                } else {
                    Vec3::new(flat.x, y, flat.z)
                };
                let flat_derivative = if span > f64::EPSILON {
                    segment.derivative(u) / span
                } else {
                    segment.derivative(u)
                };
                PathSample::along(position, flat_derivative + Vec3::Y * dy)
            })
            .collect()
    }
}

/// Drop a final sample that coincides with its predecessor.
fn dedupe_tail(samples: &mut Vec<PathSample>) {
    if samples.len() >= 2 {
        let n = samples.len();
        if samples[n - 1].position.distance(samples[n - 2].position) <= f64::EPSILON {
            samples.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver() -> CurveSolver {
        CurveSolver::new(0.25)
    }

    #[test]
    fn test_linear_endpoints_and_spacing() {
        let p1 = Vec3::new(0.0, 64.0, 0.0);
        let p2 = Vec3::new(10.0, 64.0, 0.0);
        let samples = solver().solve(CurveKind::Straight, &CurveInput::straight(p1, p2));

        assert_eq!(samples.first().unwrap().position, p1);
        assert_eq!(samples.last().unwrap().position, p2);
        assert_eq!(samples.len(), 41);
        for pair in samples.windows(2) {
            assert!(pair[0].position.distance(pair[1].position) <= 0.25 + 1e-9);
        }
        assert!(samples.iter().all(|s| s.yaw == 0.0 && s.pitch == 0.0));
    }

    #[test]
    fn test_coincident_endpoints_yield_single_sample() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let samples = solver().solve(CurveKind::Arc, &CurveInput::straight(p, p));
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].position, p);
    }

    #[test]
    fn test_arc_passes_through_anchor() {
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(10.0, 0.0, 0.0);
        let anchor = Vec3::new(5.0, 0.0, 5.0);
        let samples = solver().solve(
            CurveKind::Arc,
            &CurveInput::straight(p1, p2).with_anchor(anchor),
        );

        assert_eq!(samples.first().unwrap().position, p1);
        assert_eq!(samples.last().unwrap().position, p2);
        let closest = samples
            .iter()
            .map(|s| s.position.distance(anchor))
            .fold(f64::INFINITY, f64::min);
        assert!(closest < 0.2, "closest approach {closest}");
        assert!(samples.iter().all(|s| s.position.z >= -1e-9));
        assert!((samples[0].yaw - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_arc_follows_major_arc_to_reach_anchor() {
        let p1 = Vec3::new(10.0, 0.0, 0.0);
        let p2 = Vec3::new(0.0, 0.0, 10.0);
        let (s, c) = 99.0f64.to_radians().sin_cos();
        let anchor = Vec3::new(10.0 * c, 0.0, 10.0 * s);
        assert!(anchor_is_valid(p1, p2, anchor));

        let samples = solver().solve(
            CurveKind::Arc,
            &CurveInput::straight(p1, p2).with_anchor(anchor),
        );
        let closest = samples
            .iter()
            .map(|s| s.position.distance(anchor))
            .fold(f64::INFINITY, f64::min);
        assert!(closest < 0.25, "closest approach {closest}");
        assert_eq!(samples.first().unwrap().position, p1);
        assert_eq!(samples.last().unwrap().position, p2);
        assert!(samples.iter().any(|s| s.position.z < -5.0));

        let start = analytic_tangent(CurveKind::Arc, p1, p2, Some(anchor), true);
        assert!((start - Vec3::NEG_Z).length() < 1e-9);
        let end = analytic_tangent(CurveKind::Arc, p1, p2, Some(anchor), false);
        assert!((end - Vec3::X).length() < 1e-9);
    }

    #[test]
    fn test_arc_without_anchor_is_linear() {
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(4.0, 0.0, 0.0);
        let samples = solver().solve(CurveKind::Arc, &CurveInput::straight(p1, p2));
        assert!(samples.iter().all(|s| s.position.z == 0.0));
    }

    #[test]
    fn test_collinear_anchor_falls_back_to_linear() {
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(10.0, 0.0, 0.0);
        let anchor = Vec3::new(5.0, 0.0, 0.0);
        assert!(!anchor_is_valid(p1, p2, anchor));
        let samples = solver().solve(
            CurveKind::Arc,
            &CurveInput::straight(p1, p2).with_anchor(anchor),
        );
        assert!(samples.iter().all(|s| s.position.z.abs() < 1e-9));
    }

    #[test]
    fn test_anchor_validity_limits() {
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(10.0, 0.0, 0.0);
        assert!(anchor_is_valid(p1, p2, Vec3::new(5.0, 0.0, 5.0)));
        assert!(!anchor_is_valid(p1, p2, Vec3::new(5.0, 0.0, 6.0)));
        assert!(!anchor_is_valid(p1, p2, Vec3::new(0.05, 0.0, 0.0)));
        assert!(!anchor_is_valid(p1, p2, Vec3::new(40.0, 0.0, 1.0)));
        assert!(!anchor_is_valid(p1, p1 + Vec3::X * 0.05, Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_arc_interpolates_height() {
        let p1 = Vec3::new(0.0, 10.0, 0.0);
        let p2 = Vec3::new(10.0, 20.0, 0.0);
        let anchor = Vec3::new(5.0, 15.0, 5.0);
        let samples = solver().solve(
            CurveKind::Arc,
            &CurveInput::straight(p1, p2).with_anchor(anchor),
        );
        for pair in samples.windows(2) {
            assert!(pair[1].position.y >= pair[0].position.y - 1e-9);
        }
        assert!(samples.iter().all(|s| s.pitch < 0.0));
    }

    #[test]
    fn test_spline_respects_tangents() {
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(10.0, 0.0, 0.0);
        let input = CurveInput::straight(p1, p2).with_tangents(Vec3::Z, Vec3::NEG_Z);
        let samples = solver().solve(CurveKind::SplineApprox, &input);

        assert_eq!(samples.first().unwrap().position, p1);
        assert_eq!(samples.last().unwrap().position, p2);
        assert!(samples[samples.len() / 2].position.z.abs() > 0.1);
        assert!(samples[0].yaw > 0.0);
    }

    #[test]
    fn test_spline_with_anchor_passes_through_it() {
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(10.0, 0.0, 0.0);
        let anchor = Vec3::new(5.0, 2.0, 3.0);
        let samples = solver().solve(
            CurveKind::SplineApprox,
            &CurveInput::straight(p1, p2).with_anchor(anchor),
        );
        assert!(samples.iter().any(|s| s.position.distance(anchor) < 1e-9));
        assert_eq!(samples.last().unwrap().position, p2);
    }

    #[test]
    fn test_analytic_tangents() {
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(10.0, 0.0, 0.0);
        let anchor = Some(Vec3::new(5.0, 0.0, 5.0));

        let straight = analytic_tangent(CurveKind::Straight, p1, p2, anchor, true);
        assert!((straight - Vec3::X).length() < 1e-9);

        let arc_start = analytic_tangent(CurveKind::Arc, p1, p2, anchor, true);
        assert!((arc_start - Vec3::Z).length() < 1e-9);
        let arc_end = analytic_tangent(CurveKind::Arc, p1, p2, anchor, false);
        assert!((arc_end - Vec3::NEG_Z).length() < 1e-9);

        let spline_end = analytic_tangent(CurveKind::SplineApprox, p1, p2, anchor, false);
        assert!(spline_end.x > 0.0 && spline_end.z < 0.0);
    }
}
