//! Geometry primitives shared by the route and extrusion crates.
//!
//! Conventions:
//! - `y` is up; the horizontal plane is `x`/`z`.
//! - Headings are in degrees. Yaw is `atan2(dz, dx)`, so travelling
//!   towards `+x` is yaw 0 and towards `+z` is yaw 90. Pitch is
//!   `asin(-dy)`, positive when descending.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// 3D vector / point type used throughout PathForge.
pub type Vec3 = glam::DVec3;

/// Collinearity threshold for the 2D cross product.
pub const COLLINEAR_EPSILON: f64 = 1e-6;

/// Bias applied before flooring world coordinates to block coordinates.
const BLOCK_BIAS: f64 = 1e-6;

/// Project a point onto the horizontal plane (`y = 0`).
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// 2D cross product of the horizontal components (`a.x*b.z - a.z*b.x`).
pub fn cross2(a: Vec3, b: Vec3) -> f64 {
    a.x * b.z - a.z * b.x
}

/// A circle in the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle2 {
    /// Center, with `y = 0`.
    pub center: Vec3,
    /// Radius.
    pub radius: f64,
}

impl Circle2 {
    /// Horizontal angle (radians) of a point around the center.
    pub fn angle_of(&self, p: Vec3) -> f64 {
        (p.z - self.center.z).atan2(p.x - self.center.x)
    }

    /// Horizontal point on the circle at the given angle (`y = 0`).
    pub fn point_at(&self, angle: f64) -> Vec3 {
        Vec3::new(
            self.center.x + self.radius * angle.cos(),
            0.0,
            self.center.z + self.radius * angle.sin(),
        )
    }
}

/// Circumcircle of three points projected onto the horizontal plane.
///
/// Returns `None` when the projections are collinear.
pub fn circle_through(p1: Vec3, p2: Vec3, p3: Vec3) -> Option<Circle2> {
    if cross2(p2 - p1, p3 - p1).abs() < COLLINEAR_EPSILON {
        return None;
    }

    let (ax, az) = (p1.x, p1.z);
    let (bx, bz) = (p2.x, p2.z);
    let (cx, cz) = (p3.x, p3.z);

    let d = 2.0 * (ax * (bz - cz) + bx * (cz - az) + cx * (az - bz));
    if d.abs() < f64::EPSILON {
        return None;
    }

    let a2 = ax * ax + az * az;
    let b2 = bx * bx + bz * bz;
    let c2 = cx * cx + cz * cz;

    let ux = (a2 * (bz - cz) + b2 * (cz - az) + c2 * (az - bz)) / d;
    let uz = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;

    let center = Vec3::new(ux, 0.0, uz);
    let radius = center.distance(horizontal(p1));
    Some(Circle2 { center, radius })
}

/// Normalize an angle in degrees into `[-180, 180)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Normalize an angle in radians into `[-PI, PI)`.
pub fn wrap_radians(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Interpolate between two headings along the shortest circular path.
pub fn lerp_degrees(from: f64, to: f64, t: f64) -> f64 {
    wrap_degrees(from + wrap_degrees(to - from) * t)
}

/// Yaw and pitch (degrees) of a direction vector.
///
/// A zero-length direction yields `(0, 0)`.
pub fn heading_of(dir: Vec3) -> (f64, f64) {
    let Some(n) = dir.try_normalize() else {
        return (0.0, 0.0);
    };
    let yaw = wrap_degrees(n.z.atan2(n.x).to_degrees());
    let pitch = (-n.y).clamp(-1.0, 1.0).asin().to_degrees();
    (yaw, pitch)
}

/// Local frame of a path sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    /// Direction of travel.
    pub forward: Vec3,
    /// Horizontal, to the right of travel.
    pub right: Vec3,
    /// Perpendicular to both, pointing upwards.
    pub up: Vec3,
}

impl Basis {
    /// Build the frame for a heading in degrees.
    pub fn from_heading(yaw: f64, pitch: f64) -> Self {
        let (sy, cy) = yaw.to_radians().sin_cos();
        let (sp, cp) = pitch.to_radians().sin_cos();
        let forward = Vec3::new(cp * cy, -sp, cp * sy);
        let right = Vec3::new(-sy, 0.0, cy);
        let up = right.cross(forward);
        Self { forward, right, up }
    }

    /// World position of a point given in frame coordinates around `origin`.
    pub fn project(&self, origin: Vec3, lateral: f64, vertical: f64, along: f64) -> Vec3 {
        origin + self.right * lateral + self.up * vertical + self.forward * along
    }
}

/// Integer block coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block containing a world-space point.
    pub fn containing(v: Vec3) -> Self {
        Self {
            x: (v.x + BLOCK_BIAS).floor() as i32,
            y: (v.y + BLOCK_BIAS).floor() as i32,
            z: (v.z + BLOCK_BIAS).floor() as i32,
        }
    }

    /// Block offset by a delta.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
