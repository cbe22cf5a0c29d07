use crate::{
    pose::{Pose, Velocity, integrate_pose},
    protocol::AuthoritativeSnapshot,
    settings::SyncSettings,
};

/// Display pose of an entity this peer does not control.
///
/// Each frame the displayed pose decays toward the latest snapshot with a frame-rate independent
/// factor `1 - exp(-rate * dt)`. With velocity seeding the target itself is carried forward by
/// the verified request velocity, for at most `max_extrapolation_secs` after the snapshot.
#[derive(Clone, Copy, Debug)]
pub struct RemoteSmoother {
    current: Pose,
    target: Pose,
    velocity: Velocity,
    since_snapshot: f32,
    initialized: bool,
    position_rate: f32,
    rotation_rate: f32,
    seed_velocity: bool,
    max_extrapolation_secs: f32,
}

impl Default for RemoteSmoother {
    fn default() -> Self {
        Self::new(&SyncSettings::default())
    }
}

impl RemoteSmoother {
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            current: Pose::default(),
            target: Pose::default(),
            velocity: Velocity::ZERO,
            since_snapshot: 0.0,
            initialized: false,
            position_rate: settings.remote_position_rate,
            rotation_rate: settings.remote_rotation_rate,
            seed_velocity: settings.remote_seed_velocity,
            max_extrapolation_secs: settings.max_extrapolation_secs,
        }
    }

    pub fn pose(&self) -> Pose {
        self.current
    }

    pub fn target(&self) -> Pose {
        self.target
    }

    pub fn on_snapshot(&mut self, snapshot: &AuthoritativeSnapshot) {
        self.target = snapshot.pose();
        self.since_snapshot = 0.0;
        self.velocity = match (self.seed_velocity, snapshot.verified) {
            (true, Some(request)) => request.velocity(),
            _ => Velocity::ZERO,
        };
        // First sighting: appear in place rather than sliding in from the origin.
        if !self.initialized {
            self.current = self.target;
            self.initialized = true;
        }
    }

    /// Advance the displayed pose by one frame of `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Pose {
        if !self.initialized {
            return self.current;
        }
        self.since_snapshot += dt;
        let ahead = self.since_snapshot.min(self.max_extrapolation_secs);
        let goal = integrate_pose(&self.target, &self.velocity, ahead);

        let position_t = 1.0 - (-self.position_rate * dt).exp();
        let rotation_t = 1.0 - (-self.rotation_rate * dt).exp();
        self.current.position = self.current.position.lerp(&goal.position, position_t);
        self.current.orientation = self
            .current
            .orientation
            .try_slerp(&goal.orientation, rotation_t, 1.0e-6)
            .unwrap_or(goal.orientation);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pose::{Quat, Vec3},
        protocol::MoveRequest,
    };

    fn snapshot(position: Vec3, orientation: Quat, verified: Option<MoveRequest>) -> AuthoritativeSnapshot {
        AuthoritativeSnapshot::from_pose(3, &Pose::new(position, orientation), verified)
    }

    #[test]
    fn first_snapshot_places_entity_directly() {
        let mut smoother = RemoteSmoother::default();
        smoother.on_snapshot(&snapshot(Vec3::new(5.0, 0.0, 0.0), Quat::identity(), None));
        assert_eq!(smoother.pose().position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn converges_toward_latest_snapshot() {
        let mut smoother = RemoteSmoother::default();
        smoother.on_snapshot(&snapshot(Vec3::zeros(), Quat::identity(), None));
        let turned = Quat::from_axis_angle(&Vec3::y_axis(), 1.0);
        smoother.on_snapshot(&snapshot(Vec3::new(2.0, 0.0, 0.0), turned, None));

        let first = smoother.update(1.0 / 60.0);
        assert!(first.position.x > 0.0 && first.position.x < 2.0);

        for _ in 0..120 {
            smoother.update(1.0 / 60.0);
        }
        let pose = smoother.pose();
        assert!((pose.position.x - 2.0).abs() < 1.0e-3);
        assert!(pose.orientation.angle_to(&smoother.target().orientation) < 1.0e-3);
        // The target itself is only as close as the rotation codec allows.
        assert!(pose.orientation.angle_to(&turned) < 5.0e-3);
    }

    #[test]
    fn seeded_velocity_extrapolates_for_a_bounded_time() {
        let mut smoother = RemoteSmoother::default();
        let request = MoveRequest::from_velocity(1, 0.0, &Velocity::new(Vec3::x(), Vec3::zeros()));
        smoother.on_snapshot(&snapshot(Vec3::zeros(), Quat::identity(), Some(request)));

        for _ in 0..600 {
            smoother.update(1.0 / 60.0);
        }
        let limit = SyncSettings::default().max_extrapolation_secs;
        assert!((smoother.pose().position.x - limit).abs() < 1.0e-3);
    }

    #[test]
    fn no_velocity_seeding_when_disabled() {
        let settings = SyncSettings {
            remote_seed_velocity: false,
            ..SyncSettings::default()
        };
        let mut smoother = RemoteSmoother::new(&settings);
        let request = MoveRequest::from_velocity(1, 0.0, &Velocity::new(Vec3::x(), Vec3::zeros()));
        smoother.on_snapshot(&snapshot(Vec3::zeros(), Quat::identity(), Some(request)));
        for _ in 0..60 {
            smoother.update(1.0 / 60.0);
        }
        assert_eq!(smoother.pose().position, Vec3::zeros());
    }
}
