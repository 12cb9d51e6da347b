//! Skeletal pose value type and linear pose blending.
//!
//! The pose is deliberately minimal: per-joint TRS with component lerp for
//! translation/scale and shortest-arc nlerp for rotation. Hosts with richer
//! skeleton math convert at the seam; the tree only needs assignment and a
//! linear two-pose blend.

use serde::{Deserialize, Serialize};

/// Local transform of one joint (rotation is a quaternion, x,y,z,w).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointTransform {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl JointTransform {
    pub const IDENTITY: Self = Self {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// Linear blend between two joint transforms.
    pub fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        Self {
            translation: lerp3(a.translation, b.translation, t),
            rotation: nlerp_quat(a.rotation, b.rotation, t),
            scale: lerp3(a.scale, b.scale, t),
        }
    }
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[inline]
fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
fn normalize4(q: [f32; 4]) -> [f32; 4] {
    let n = dot4(q, q).sqrt();
    if n > 0.0 {
        [q[0] / n, q[1] / n, q[2] / n, q[3] / n]
    } else {
        [0.0, 0.0, 0.0, 1.0]
    }
}

/// Normalized lerp between quaternions, taking the shortest arc.
pub fn nlerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    if dot4(a, b) < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
    }
    normalize4([
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ])
}

/// Instantaneous configuration of a skeleton: one transform per joint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub joints: Vec<JointTransform>,
}

impl Pose {
    /// Pose with `count` identity joints (a neutral stand-in for a bind pose).
    pub fn with_joint_count(count: usize) -> Self {
        Self {
            joints: vec![JointTransform::IDENTITY; count],
        }
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Assign from another pose, reusing this pose's allocation.
    pub fn copy_from(&mut self, other: &Pose) {
        self.joints.clear();
        self.joints.extend_from_slice(&other.joints);
    }

    /// In-place linear two-pose blend: `t = 0` is fully `a`, `t = 1` fully `b`.
    pub fn blend_from(&mut self, a: &Pose, b: &Pose, t: f32) {
        debug_assert_eq!(
            a.joint_count(),
            b.joint_count(),
            "blended poses must share a skeleton"
        );
        self.joints.clear();
        self.joints.extend(
            a.joints
                .iter()
                .zip(b.joints.iter())
                .map(|(ja, jb)| JointTransform::lerp(ja, jb, t)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn stamped(x: f32) -> Pose {
        let mut joint = JointTransform::IDENTITY;
        joint.translation = [x, 2.0 * x, 0.0];
        Pose {
            joints: vec![joint; 3],
        }
    }

    /// it should return the endpoints exactly at t=0 and t=1
    #[test]
    fn blend_boundary_identity() {
        let a = stamped(1.0);
        let b = stamped(5.0);
        let mut out = Pose::default();
        out.blend_from(&a, &b, 0.0);
        assert_eq!(out, a);
        out.blend_from(&a, &b, 1.0);
        assert_eq!(out, b);
        out.blend_from(&a, &b, 0.5);
        approx(out.joints[0].translation[0], 3.0, 1e-6);
    }

    /// it should keep nlerp results unit length and take the shortest arc
    #[test]
    fn nlerp_unit_norm_shortest_arc() {
        let a = [0.0, 0.0, 0.0, 1.0];
        let b = [0.0, 1.0, 0.0, 0.0];
        let q = nlerp_quat(a, b, 0.5);
        approx(dot4(q, q).sqrt(), 1.0, 1e-5);

        // Negated quaternion represents the same rotation; blending must not
        // take the long way around.
        let q2 = nlerp_quat(a, [0.0, -1.0, 0.0, 0.0], 0.5);
        approx(q2[1].abs(), q[1].abs(), 1e-5);
    }

    /// it should copy_from without disturbing the source
    #[test]
    fn copy_from_reuses_allocation() {
        let src = stamped(4.0);
        let mut dst = stamped(9.0);
        dst.copy_from(&src);
        assert_eq!(dst, src);
        assert_eq!(src.joint_count(), 3);
    }

    /// it should round-trip through serde
    #[test]
    fn pose_serde_roundtrip() {
        let pose = stamped(1.5);
        let s = serde_json::to_string(&pose).unwrap();
        let back: Pose = serde_json::from_str(&s).unwrap();
        assert_eq!(pose, back);
    }
}
