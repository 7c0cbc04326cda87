use crate::Vec3;

/// Unit quaternion rotation (x, y, z imaginary, w real).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    #[inline]
    pub const fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Scales to unit length; a zero or non-finite quaternion yields identity.
    pub fn normalized(self) -> Quat {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            let inv = 1.0 / len;
            Quat::from_xyzw(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Quat::IDENTITY
        }
    }
}

/// Local placement of a mesh relative to its parent (position + orientation).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    #[inline]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_scales_to_unit() {
        let q = Quat::from_xyzw(0.0, 2.0, 0.0, 2.0).normalized();
        assert!((q.length() - 1.0).abs() <= 1e-6);
        assert!((q.y - q.w).abs() <= 1e-6);
    }

    #[test]
    fn degenerate_quat_normalizes_to_identity() {
        assert_eq!(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0).normalized(), Quat::IDENTITY);
        assert_eq!(
            Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0).normalized(),
            Quat::IDENTITY
        );
    }

    #[test]
    fn default_transform_is_identity() {
        assert_eq!(Transform::default(), Transform::IDENTITY);
    }
}
