use glam::Vec3;
use smooth::{PoseSource, SceneNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Circle,
    Turn,
    Still,
    Climb,
    Rezone,
}

impl Phase {
    const ORDER: [Phase; 5] = [
        Phase::Circle,
        Phase::Turn,
        Phase::Still,
        Phase::Climb,
        Phase::Rezone,
    ];
}

/// Scripted movement for the demo avatar. Each phase lasts `phase_ticks`
/// broadcasts and exercises a different set of dirty components.
pub struct Walk {
    radius: f32,
    phase_ticks: u32,
    tick: u32,
    heading: f32,
    height: f32,
    zone: u64,
}

impl Walk {
    pub fn new(radius: f32, phase_ticks: u32) -> Self {
        Self {
            radius,
            phase_ticks: phase_ticks.max(1),
            tick: 0,
            heading: 0.0,
            height: 0.0,
            zone: 1,
        }
    }

    pub fn phase(&self) -> Phase {
        let index = (self.tick / self.phase_ticks) as usize % Phase::ORDER.len();
        Phase::ORDER[index]
    }

    pub fn zone(&self) -> u64 {
        self.zone
    }

    /// Moves `node` for the current tick. Returns the new zone when the
    /// avatar crosses into one.
    pub fn step(&mut self, node: &SceneNode) -> Option<u64> {
        let phase = self.phase();
        let phase_tick = self.tick % self.phase_ticks;
        self.tick = self.tick.wrapping_add(1);

        match phase {
            Phase::Circle => {
                self.heading = (self.heading + 360.0 / self.phase_ticks as f32) % 360.0;
                let angle = self.heading.to_radians();
                let pos = Vec3::new(
                    self.radius * angle.cos(),
                    self.radius * angle.sin(),
                    self.height,
                );
                node.set_pos_hpr(pos, Vec3::new(self.heading, 0.0, 0.0));
                None
            }
            Phase::Turn => {
                self.heading = (self.heading - 15.0).rem_euclid(360.0);
                let pos = node.pos();
                node.set_pos_hpr(pos, Vec3::new(self.heading, 0.0, 0.0));
                None
            }
            Phase::Still => None,
            Phase::Climb => {
                self.height += 0.25;
                let mut pos = node.pos();
                pos.z = self.height;
                node.set_pos(pos);
                None
            }
            Phase::Rezone => {
                if phase_tick + 1 == self.phase_ticks {
                    self.height = 0.0;
                    let mut pos = node.pos();
                    pos.z = 0.0;
                    node.set_pos(pos);
                }
                (phase_tick == 0).then(|| {
                    self.zone += 1;
                    self.zone
                })
            }
        }
    }
}
