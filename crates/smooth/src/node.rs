use std::sync::{Arc, PoisonError, RwLock};

use glam::Vec3;

use crate::pose::Pose;

pub trait PoseSource {
    fn pos(&self) -> Vec3;
    fn hpr(&self) -> Vec3;

    fn name(&self) -> &str {
        "node"
    }

    fn pose(&self) -> Pose {
        Pose::new(self.pos(), self.hpr())
    }
}

impl PoseSource for Pose {
    fn pos(&self) -> Vec3 {
        self.pos
    }

    fn hpr(&self) -> Vec3 {
        self.hpr
    }
}

impl<T: PoseSource + ?Sized> PoseSource for Arc<T> {
    fn pos(&self) -> Vec3 {
        (**self).pos()
    }

    fn hpr(&self) -> Vec3 {
        (**self).hpr()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    name: Arc<str>,
    pose: Arc<RwLock<Pose>>,
}

impl SceneNode {
    pub fn new(name: &str) -> Self {
        Self::with_pose(name, Pose::ZERO)
    }

    pub fn with_pose(name: &str, pose: Pose) -> Self {
        Self {
            name: Arc::from(name),
            pose: Arc::new(RwLock::new(pose)),
        }
    }

    fn read(&self) -> Pose {
        *self.pose.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut Pose)) {
        let mut pose = self.pose.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut pose);
    }

    pub fn set_pos(&self, pos: Vec3) {
        self.update(|pose| pose.pos = pos);
    }

    pub fn set_hpr(&self, hpr: Vec3) {
        self.update(|pose| pose.hpr = hpr);
    }

    pub fn set_pos_hpr(&self, pos: Vec3, hpr: Vec3) {
        self.update(|pose| *pose = Pose::new(pos, hpr));
    }
}

impl PoseSource for SceneNode {
    fn pos(&self) -> Vec3 {
        self.read().pos
    }

    fn hpr(&self) -> Vec3 {
        self.read().hpr
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn pose(&self) -> Pose {
        self.read()
    }
}
