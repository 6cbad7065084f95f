use super::dirty::{BroadcastVariant, DirtyFields, MessageShape};
use super::{Pose, SMOOTH_NODE_EPSILON, is_threshold_equal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastPlan {
    pub dirty: DirtyFields,
    pub shape: Option<MessageShape>,
}

#[derive(Debug, Clone)]
pub struct TrackedPose {
    pose: Pose,
    stopped: bool,
    sent_location: u64,
    pending_location: u64,
    epsilon: f32,
}

impl TrackedPose {
    pub fn new(pose: Pose) -> Self {
        Self::with_epsilon(pose, SMOOTH_NODE_EPSILON)
    }

    pub fn with_epsilon(pose: Pose, epsilon: f32) -> Self {
        Self {
            pose,
            stopped: false,
            sent_location: 0,
            pending_location: 0,
            epsilon,
        }
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn sent_location(&self) -> u64 {
        self.sent_location
    }

    pub fn pending_location(&self) -> u64 {
        self.pending_location
    }

    pub fn set_location(&mut self, location: u64) {
        self.pending_location = location;
    }

    pub fn location_changed(&self) -> bool {
        self.sent_location != self.pending_location
    }

    pub fn dirty_fields(&self, current: &Pose, watched: DirtyFields) -> DirtyFields {
        watched
            .indices()
            .filter(|&i| {
                !is_threshold_equal(self.pose.component(i), current.component(i), self.epsilon)
            })
            .fold(DirtyFields::empty(), |acc, i| acc | DirtyFields::component(i))
    }

    pub fn plan(&self, current: &Pose, variant: BroadcastVariant) -> BroadcastPlan {
        let dirty = self.dirty_fields(current, variant.watched());

        let shape = if variant.tracks_location() && self.location_changed() {
            Some(MessageShape::PosHprL)
        } else if dirty.is_empty() {
            (!self.stopped).then_some(MessageShape::Stop)
        } else {
            Some(variant.select(dirty))
        };

        BroadcastPlan { dirty, shape }
    }

    /// Stores the dirty components and updates the stop/location bookkeeping
    /// for the planned shape. Called before the message is packed, so a
    /// failed pack still leaves the attempted values cached.
    pub fn commit(&mut self, current: &Pose, plan: &BroadcastPlan) {
        for i in plan.dirty.indices() {
            self.pose.set_component(i, current.component(i));
        }

        match plan.shape {
            None => {}
            Some(MessageShape::Stop) => self.stopped = true,
            Some(MessageShape::PosHprL) => {
                self.sent_location = self.pending_location;
                self.stopped = false;
            }
            Some(_) => self.stopped = false,
        }
    }

    pub fn mark_location_sent(&mut self) -> u64 {
        self.sent_location = self.pending_location;
        self.sent_location
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn step(
        tracked: &mut TrackedPose,
        current: Pose,
        variant: BroadcastVariant,
    ) -> Option<MessageShape> {
        let plan = tracked.plan(&current, variant);
        tracked.commit(&current, &plan);
        plan.shape
    }

    #[test]
    fn epsilon_boundary_is_strict() {
        let tracked = TrackedPose::new(Pose::ZERO);

        let at_epsilon = Pose::new(Vec3::new(0.01, 0.0, 0.0), Vec3::ZERO);
        assert!(tracked.dirty_fields(&at_epsilon, DirtyFields::all()).is_empty());

        let past_epsilon = Pose::new(Vec3::new(0.010001, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(tracked.dirty_fields(&past_epsilon, DirtyFields::all()), DirtyFields::X);
    }

    #[test]
    fn only_dirty_components_are_cached() {
        let mut tracked = TrackedPose::new(Pose::ZERO);
        let current = Pose::new(Vec3::new(5.0, 0.005, 0.0), Vec3::new(0.0, 0.0, 0.009));

        assert_eq!(step(&mut tracked, current, BroadcastVariant::Full), Some(MessageShape::PosHpr));
        assert_eq!(tracked.pose().pos, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(tracked.pose().hpr, Vec3::ZERO);
    }

    #[test]
    fn stop_sentinel_sent_once() {
        let mut tracked = TrackedPose::new(Pose::ZERO);
        let moved = Pose::new(Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO);

        assert_eq!(step(&mut tracked, moved, BroadcastVariant::Full), Some(MessageShape::Xy));
        let shapes: Vec<_> = (0..5)
            .map(|_| step(&mut tracked, moved, BroadcastVariant::Full))
            .collect();
        assert_eq!(shapes, vec![Some(MessageShape::Stop), None, None, None, None]);
        assert!(tracked.is_stopped());
    }

    #[test]
    fn fresh_tracker_sends_stop_first() {
        let mut tracked = TrackedPose::new(Pose::ZERO);
        assert_eq!(
            step(&mut tracked, Pose::ZERO, BroadcastVariant::Full),
            Some(MessageShape::Stop)
        );
        assert_eq!(step(&mut tracked, Pose::ZERO, BroadcastVariant::Full), None);
    }

    #[test]
    fn location_change_dominates() {
        let mut tracked = TrackedPose::new(Pose::ZERO);
        step(&mut tracked, Pose::ZERO, BroadcastVariant::Full);
        assert!(tracked.is_stopped());

        tracked.set_location(7);
        assert_eq!(tracked.sent_location(), 0);
        assert_eq!(
            step(&mut tracked, Pose::ZERO, BroadcastVariant::Full),
            Some(MessageShape::PosHprL)
        );
        assert_eq!(tracked.sent_location(), 7);
        assert!(!tracked.is_stopped());
    }

    #[test]
    fn narrow_variants_ignore_location_and_unwatched_axes() {
        let mut tracked = TrackedPose::new(Pose::ZERO);
        tracked.set_location(3);

        let climbed = Pose::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 45.0, 0.0));
        assert_eq!(step(&mut tracked, climbed, BroadcastVariant::Xyh), Some(MessageShape::Stop));
        assert_eq!(tracked.pose().pos.z, 0.0);
        assert_eq!(tracked.sent_location(), 0);

        let turned = Pose::new(Vec3::ZERO, Vec3::new(90.0, 0.0, 0.0));
        assert_eq!(step(&mut tracked, turned, BroadcastVariant::Xy), None);
        assert_eq!(step(&mut tracked, turned, BroadcastVariant::Xyh), Some(MessageShape::H));
    }
}
