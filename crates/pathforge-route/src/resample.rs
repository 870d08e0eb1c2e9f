//! Uniform resampling of dense paths.

use crate::sample::PathSample;
use pathforge_core::lerp_degrees;

/// Slack when deciding whether a target distance falls inside a segment.
const DISTANCE_EPSILON: f64 = 1e-7;

/// Residual beyond which the path end is appended after the last step.
const END_EPSILON: f64 = 1e-6;

/// Resample a path so consecutive samples are `step` apart along its length.
///
/// The first sample is kept, positions are interpolated linearly and headings
/// along the shortest circular path. The original end is appended when the
/// last step does not land on it.
pub fn resample(path: &[PathSample], step: f64) -> Vec<PathSample> {
    let Some(first) = path.first() else {
        return Vec::new();
    };
    if path.len() == 1 || step <= 0.0 {
        return path.to_vec();
    }

    let mut out = vec![*first];
    let mut travelled = 0.0;
    let mut target = step;

    for pair in path.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let length = a.position.distance(b.position);
        if length <= f64::EPSILON {
            continue;
        }

        while travelled + length >= target - DISTANCE_EPSILON {
            let t = ((target - travelled) / length).clamp(0.0, 1.0);
            out.push(interpolate(a, b, t));
            target += step;
        }
        travelled += length;
    }

    if let (Some(last_out), Some(last_in)) = (out.last(), path.last()) {
        if last_out.position.distance(last_in.position) > END_EPSILON {
            out.push(*last_in);
        }
    }
    out
}

fn interpolate(a: &PathSample, b: &PathSample, t: f64) -> PathSample {
    PathSample::new(
        a.position.lerp(b.position, t),
        lerp_degrees(a.yaw, b.yaw, t),
        lerp_degrees(a.pitch, b.pitch, t),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathforge_core::Vec3;

    fn line(length: f64, count: usize) -> Vec<PathSample> {
        (0..=count)
            .map(|i| {
                let x = length * i as f64 / count as f64;
                PathSample::new(Vec3::new(x, 0.0, 0.0), 0.0, 0.0)
            })
            .collect()
    }

    #[test]
    fn test_resample_uniform_spacing() {
        let out = resample(&line(10.0, 40), 1.0);
        assert_eq!(out.len(), 11);
        for (i, sample) in out.iter().enumerate() {
            assert!((sample.position.x - i as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_resample_appends_residual_end() {
        let out = resample(&line(10.5, 21), 1.0);
        assert_eq!(out.len(), 12);
        assert!((out.last().unwrap().position.x - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_resample_degenerate_inputs() {
        assert!(resample(&[], 1.0).is_empty());
        let single = [PathSample::new(Vec3::ZERO, 10.0, 0.0)];
        assert_eq!(resample(&single, 1.0), single.to_vec());
    }

    #[test]
    fn test_resample_interpolates_heading_across_wrap() {
        let path = [
            PathSample::new(Vec3::ZERO, 170.0, 0.0),
            PathSample::new(Vec3::new(2.0, 0.0, 0.0), -170.0, 0.0),
        ];
        let out = resample(&path, 1.0);
        assert_eq!(out.len(), 3);
        assert!((out[1].yaw.abs() - 180.0).abs() < 1e-9);
    }
}
