//! Minimal 3D geometry for facing and spawn math
//!
//! The ground plane is XZ with +Y up. Yaw is measured in degrees clockwise
//! from +Z when viewed from above, so yaw 0 faces +Z and yaw 90 faces +X.

use serde::{Deserialize, Serialize};

/// Vectors shorter than this are treated as degenerate
const DEGENERATE_LENGTH: f32 = 1e-6;

/// 3D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Unit vector on the ground plane for a yaw angle
    pub fn from_yaw_degrees(yaw: f32) -> Self {
        let rad = yaw.to_radians();
        Self::new(rad.sin(), 0.0, rad.cos())
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance_to(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Unit vector in the same direction, or None for (near) zero length
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if !len.is_finite() || len < DEGENERATE_LENGTH {
            None
        } else {
            Some(self.scale(1.0 / len))
        }
    }

    /// Right-hand side of a facing direction on the ground plane
    pub fn right(self) -> Self {
        Self::new(self.z, 0.0, -self.x)
    }

    /// Rotate about +Y by `degrees` (positive turns right)
    pub fn rotate_yaw(self, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(
            self.x * cos + self.z * sin,
            self.y,
            self.z * cos - self.x * sin,
        )
    }

    /// Same vector projected onto the ground plane
    pub fn flattened(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Unsigned angle between two directions in degrees (0..=180)
///
/// Returns None when either vector is degenerate.
pub fn angle_between(a: Vec3, b: Vec3) -> Option<f32> {
    let a = a.normalized()?;
    let b = b.normalized()?;
    let cos = a.dot(b).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Position and facing of an agent
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub facing: Vec3,
}

impl Pose {
    pub const fn new(position: Vec3, facing: Vec3) -> Self {
        Self { position, facing }
    }

    /// Pose on the ground plane at (x, z) looking along `yaw`
    pub fn at(x: f32, z: f32, yaw: f32) -> Self {
        Self::new(Vec3::new(x, 0.0, z), Vec3::from_yaw_degrees(yaw))
    }

    /// Same pose with a unit facing, or None when the facing has no direction
    pub fn normalized(self) -> Option<Self> {
        self.facing
            .normalized()
            .map(|facing| Self::new(self.position, facing))
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::FORWARD)
    }
}
