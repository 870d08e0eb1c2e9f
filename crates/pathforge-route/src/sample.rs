//! Oriented path samples.

use pathforge_core::{heading_of, wrap_degrees, Basis, Vec3};

/// A position on a path with the heading of travel at that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    /// World position.
    pub position: Vec3,
    /// Yaw in degrees, `[-180, 180)`.
    pub yaw: f64,
    /// Pitch in degrees, positive when descending.
    pub pitch: f64,
}

impl PathSample {
    /// Creates a new path sample.
    pub fn new(position: Vec3, yaw: f64, pitch: f64) -> Self {
        Self {
            position,
            yaw: wrap_degrees(yaw),
            pitch,
        }
    }

    /// Sample whose heading follows a direction vector.
    pub fn along(position: Vec3, direction: Vec3) -> Self {
        let (yaw, pitch) = heading_of(direction);
        Self::new(position, yaw, pitch)
    }

    /// The same point travelled in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self::new(self.position, self.yaw + 180.0, -self.pitch)
    }

    /// Local right/up/forward frame.
    pub fn basis(&self) -> Basis {
        Basis::from_heading(self.yaw, self.pitch)
    }
}
