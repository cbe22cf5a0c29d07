//! Client-side prediction and reconciliation for one controlled entity.
//!
//! The engine samples the live velocity into sequenced [`MoveRequest`]s at a fixed rate and keeps
//! every request the server has not acknowledged yet. When a snapshot names an acknowledged
//! request, the engine drops everything up to it and replays the rest on top of the authoritative
//! pose:
//!
//! ```text
//! snapshot pose ──(v of ack)──> t(r1) ──(v of r1)──> t(r2) ── ... ──(mean(v of rN, live))──> now
//! ```
//!
//! Integration between samples is rectangular: each interval uses the velocity of the request
//! that opened it. The result is compared with the live body and written back through
//! [`PhysicsBody`] only where it crosses the divergence thresholds.

use std::collections::VecDeque;

use crate::{
    pose::{PhysicsBody, Pose, Velocity, integrate_pose},
    protocol::{AuthoritativeSnapshot, MoveRequest},
    settings::{CorrectionPolicy, SyncSettings},
    stats::SyncStats,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PredictionState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// At least one request is waiting for acknowledgement.
    Predicting,
}

/// Unacknowledged requests in sequence order.
#[derive(Clone, Debug)]
pub struct PredictionQueue {
    requests: VecDeque<MoveRequest>,
    capacity: usize,
}

impl PredictionQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            requests: VecDeque::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
        }
    }

    /// Append a request. Returns the oldest entry when it had to be evicted to make room.
    pub fn push(&mut self, request: MoveRequest) -> Option<MoveRequest> {
        debug_assert!(
            self.requests
                .back()
                .is_none_or(|last| last.sequence < request.sequence),
            "sequence must increase"
        );
        let evicted = if self.requests.len() >= self.capacity {
            self.requests.pop_front()
        } else {
            None
        };
        self.requests.push_back(request);
        evicted
    }

    /// Drop every request with `sequence <= acked`. Returns how many were removed.
    pub fn acknowledge(&mut self, acked: u32) -> usize {
        let before = self.requests.len();
        while self
            .requests
            .front()
            .is_some_and(|front| front.sequence <= acked)
        {
            self.requests.pop_front();
        }
        before - self.requests.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveRequest> {
        self.requests.iter()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The snapshot carries no verified request.
    NoVerifiedRequest,
    /// Duplicate or reordered snapshot.
    Stale { acked: u32, last_acked: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reconciliation {
    Ignored(IgnoreReason),
    Reconciled {
        position_error_sq: f32,
        rotation_error_rad: f32,
        corrected_position: bool,
        corrected_rotation: bool,
    },
}

impl Reconciliation {
    pub fn corrected(&self) -> bool {
        matches!(
            self,
            Reconciliation::Reconciled { corrected_position, corrected_rotation, .. }
                if *corrected_position || *corrected_rotation
        )
    }
}

/// Replay `pending` on top of `start`.
///
/// `acked` opens the first interval. The tail from the last request to `now` uses the mean of
/// that request's velocity and `live`. Returns the predicted pose and the velocity of the most
/// recent request.
pub fn replay<'a>(
    start: Pose,
    acked: &MoveRequest,
    pending: impl IntoIterator<Item = &'a MoveRequest>,
    now: f32,
    live: &Velocity,
) -> (Pose, Velocity) {
    let mut pose = start;
    let mut previous = *acked;

    for request in pending {
        let dt = (request.client_time - previous.client_time).max(0.0);
        pose = integrate_pose(&pose, &previous.velocity(), dt);
        previous = *request;
    }

    let latest = previous.velocity();
    let tail = Velocity::new(
        (latest.linear + live.linear) * 0.5,
        (latest.angular + live.angular) * 0.5,
    );
    let dt = (now - previous.client_time).max(0.0);
    (integrate_pose(&pose, &tail, dt), latest)
}

#[derive(Clone, Debug)]
pub struct PredictionEngine {
    queue: PredictionQueue,
    state: PredictionState,
    next_sequence: u32,
    last_acked: Option<u32>,
    settings: SyncSettings,
    stats: SyncStats,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(SyncSettings::default())
    }
}

impl PredictionEngine {
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            queue: PredictionQueue::with_capacity(settings.max_pending_requests),
            state: PredictionState::Idle,
            next_sequence: 1,
            last_acked: None,
            settings,
            stats: SyncStats::default(),
        }
    }

    pub fn state(&self) -> PredictionState {
        self.state
    }

    pub fn queue(&self) -> &PredictionQueue {
        &self.queue
    }

    pub fn last_acked(&self) -> Option<u32> {
        self.last_acked
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Sample the live velocity into the next request, queue it and return it for sending.
    pub fn sample(&mut self, now: f32, body: &impl PhysicsBody) -> MoveRequest {
        let request = MoveRequest::from_velocity(self.next_sequence, now, &body.velocity());
        self.next_sequence = self.next_sequence.wrapping_add(1);

        if let Some(evicted) = self.queue.push(request) {
            self.stats.requests_evicted += 1;
            log::warn!(
                "prediction queue full ({}), dropped unacknowledged request {}",
                self.settings.max_pending_requests,
                evicted.sequence
            );
        }
        self.stats.requests_sent += 1;
        self.state = PredictionState::Predicting;
        request
    }

    /// Reconcile the live body against a snapshot of this entity.
    pub fn on_snapshot(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        now: f32,
        body: &mut impl PhysicsBody,
    ) -> Reconciliation {
        let Some(acked) = snapshot.verified else {
            self.stats.snapshots_ignored += 1;
            return Reconciliation::Ignored(IgnoreReason::NoVerifiedRequest);
        };
        if let Some(last_acked) = self.last_acked
            && acked.sequence <= last_acked
        {
            self.stats.snapshots_ignored += 1;
            return Reconciliation::Ignored(IgnoreReason::Stale {
                acked: acked.sequence,
                last_acked,
            });
        }

        self.last_acked = Some(acked.sequence);
        self.queue.acknowledge(acked.sequence);
        self.stats.snapshots_applied += 1;

        let live_pose = body.pose();
        let live_velocity = body.velocity();
        let (predicted, latest_velocity) = replay(
            snapshot.pose(),
            &acked,
            self.queue.iter(),
            now,
            &live_velocity,
        );

        let position_error_sq = (predicted.position - live_pose.position).norm_squared();
        let rotation_error_rad = predicted.orientation.angle_to(&live_pose.orientation);
        let correct_position = position_error_sq > self.settings.position_divergence_sq;
        let correct_rotation = rotation_error_rad > self.settings.rotation_divergence_rad;

        if correct_position || correct_rotation {
            let target = Pose::new(
                if correct_position {
                    predicted.position
                } else {
                    live_pose.position
                },
                if correct_rotation {
                    predicted.orientation
                } else {
                    live_pose.orientation
                },
            );
            body.set_pose(corrected_pose(&live_pose, &target, self.settings.correction));
            body.set_velocity(latest_velocity);

            self.stats.position_corrections += u64::from(correct_position);
            self.stats.rotation_corrections += u64::from(correct_rotation);
            log::debug!(
                "corrected entity {} at ack {}: position error^2 {:.4}, rotation error {:.4} rad",
                snapshot.entity_id,
                acked.sequence,
                position_error_sq,
                rotation_error_rad
            );
        }

        if self.queue.is_empty() {
            self.state = PredictionState::Idle;
        }

        Reconciliation::Reconciled {
            position_error_sq,
            rotation_error_rad,
            corrected_position: correct_position,
            corrected_rotation: correct_rotation,
        }
    }
}

fn corrected_pose(live: &Pose, target: &Pose, policy: CorrectionPolicy) -> Pose {
    match policy {
        CorrectionPolicy::Snap => *target,
        CorrectionPolicy::Blend { factor } => {
            let t = factor.clamp(0.0, 1.0);
            Pose::new(
                live.position.lerp(&target.position, t),
                live.orientation
                    .try_slerp(&target.orientation, t, 1.0e-6)
                    .unwrap_or(target.orientation),
            )
        }
    }
}
