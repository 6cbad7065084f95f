mod dirty;
mod tracked;

use glam::Vec3;

pub use dirty::{BroadcastVariant, DirtyFields, MessageShape};
pub use tracked::{BroadcastPlan, TrackedPose};

/// Absolute threshold below which a component change is treated as jitter.
pub const SMOOTH_NODE_EPSILON: f32 = 0.01;

pub const POSE_COMPONENTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub pos: Vec3,
    pub hpr: Vec3,
}

impl Pose {
    pub const ZERO: Self = Self {
        pos: Vec3::ZERO,
        hpr: Vec3::ZERO,
    };

    pub fn new(pos: Vec3, hpr: Vec3) -> Self {
        Self { pos, hpr }
    }

    #[inline]
    pub fn component(&self, index: usize) -> f32 {
        if index < 3 {
            self.pos[index]
        } else {
            self.hpr[index - 3]
        }
    }

    #[inline]
    pub fn set_component(&mut self, index: usize, value: f32) {
        if index < 3 {
            self.pos[index] = value;
        } else {
            self.hpr[index - 3] = value;
        }
    }
}

#[inline]
pub fn is_threshold_equal(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() <= epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_indexing_follows_wire_order() {
        let mut pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));
        let values: Vec<f32> = (0..POSE_COMPONENTS).map(|i| pose.component(i)).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        pose.set_component(4, -9.0);
        assert_eq!(pose.hpr.y, -9.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(is_threshold_equal(0.0, 0.01, SMOOTH_NODE_EPSILON));
        assert!(!is_threshold_equal(0.0, 0.010001, SMOOTH_NODE_EPSILON));
        assert!(!is_threshold_equal(0.0, -0.010001, SMOOTH_NODE_EPSILON));
    }
}
