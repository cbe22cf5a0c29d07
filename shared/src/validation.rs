//! Server-side checks on incoming move requests, and the per-entity authority that applies them
//! and publishes snapshots.
//!
//! Over-limit requests are clamped, logged and counted. They are never rejected outright because
//! jitter and reordering produce transient over-limit samples from honest clients too.

use crate::{
    constants::{VELOCITY_EPS_SQ, VELOCITY_SCALE},
    movement::MoveAbility,
    pose::{PhysicsBody, Vec3, Velocity, integrate_pose},
    protocol::{AuthoritativeSnapshot, MoveRequest},
    quantize::encode_vec3,
};

/// What clamping changed in a request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidationViolation {
    pub sequence: u32,
    /// Requested `|linear|`, m/s.
    pub requested_linear_speed: f32,
    /// Requested angular velocity, rad/s.
    pub requested_angular: Vec3,
    pub linear_clamped: bool,
    pub angular_clamped: bool,
}

/// Clamp a request to `ability`.
///
/// Linear velocity is rescaled to `max_linear_speed` keeping its direction. Each angular
/// component is clamped to `±max_angular_speed`.
pub fn validate_move_request(
    request: &MoveRequest,
    ability: &MoveAbility,
) -> (MoveRequest, Option<ValidationViolation>) {
    let linear = request.linear();
    let angular = request.angular();

    let max_linear = ability.max_linear_speed;
    let linear_clamped = linear.norm_squared() > max_linear * max_linear;
    let clamped_linear = if linear_clamped {
        linear.normalize() * max_linear
    } else {
        linear
    };

    let max_angular = ability.max_angular_speed;
    let clamped_angular = angular.map(|c| c.clamp(-max_angular, max_angular));
    let angular_clamped = clamped_angular != angular;

    if !linear_clamped && !angular_clamped {
        return (*request, None);
    }

    let verified = MoveRequest {
        linear_velocity: encode_vec3(&clamped_linear, VELOCITY_SCALE),
        angular_velocity: encode_vec3(&clamped_angular, VELOCITY_SCALE),
        ..*request
    };
    let violation = ValidationViolation {
        sequence: request.sequence,
        requested_linear_speed: linear.norm(),
        requested_angular: angular,
        linear_clamped,
        angular_clamped,
    };
    (verified, Some(violation))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RequestOutcome {
    Applied { violation: Option<ValidationViolation> },
    /// Not newer than the last applied request; nothing changed.
    Stale { sequence: u32, last_sequence: u32 },
}

/// Server-side movement authority for one entity.
///
/// Plain data so that hosts can keep it in their own storage and rebuild it per call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ServerAuthority {
    pub entity_id: u64,
    pub ability: MoveAbility,
    pub last_sequence: Option<u32>,
    pub verified: Option<MoveRequest>,
    /// A request was applied since the last published snapshot.
    pub dirty: bool,
    pub violations: u64,
}

impl ServerAuthority {
    pub fn new(entity_id: u64, ability: MoveAbility) -> Self {
        Self {
            entity_id,
            ability,
            ..Default::default()
        }
    }

    /// Validate `request` and write the verified velocity to `body`.
    pub fn apply_request(
        &mut self,
        request: &MoveRequest,
        body: &mut impl PhysicsBody,
    ) -> RequestOutcome {
        if let Some(last_sequence) = self.last_sequence
            && request.sequence <= last_sequence
        {
            log::debug!(
                "entity {}: ignoring request {} (last applied {})",
                self.entity_id,
                request.sequence,
                last_sequence
            );
            return RequestOutcome::Stale {
                sequence: request.sequence,
                last_sequence,
            };
        }

        let (verified, violation) = validate_move_request(request, &self.ability);
        if let Some(v) = &violation {
            self.violations += 1;
            log::warn!(
                "entity {}: request {} exceeds ability (linear {:.3} m/s > {:.3}: {}, angular {:?} clamped: {})",
                self.entity_id,
                v.sequence,
                v.requested_linear_speed,
                self.ability.max_linear_speed,
                v.linear_clamped,
                v.requested_angular,
                v.angular_clamped
            );
        }

        body.set_velocity(verified.velocity());
        self.last_sequence = Some(verified.sequence);
        self.verified = Some(verified);
        self.dirty = true;
        RequestOutcome::Applied { violation }
    }

    /// Advance `body` by one server tick and return a snapshot when the entity changed.
    pub fn tick(&mut self, body: &mut impl PhysicsBody, dt: f32) -> Option<AuthoritativeSnapshot> {
        let velocity = body.velocity();
        let moving = is_moving(&velocity);
        if moving {
            body.set_pose(integrate_pose(&body.pose(), &velocity, dt));
        }
        if !moving && !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(AuthoritativeSnapshot::from_pose(
            self.entity_id,
            &body.pose(),
            self.verified,
        ))
    }
}

pub fn is_moving(velocity: &Velocity) -> bool {
    velocity.linear.norm_squared() > VELOCITY_EPS_SQ || velocity.angular.norm_squared() > VELOCITY_EPS_SQ
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pose::KinematicBody, quantize::QuantizedVec3};

    fn request(sequence: u32, linear: Vec3, angular: Vec3) -> MoveRequest {
        MoveRequest::from_velocity(sequence, sequence as f32 / 15.0, &Velocity::new(linear, angular))
    }

    #[test]
    fn double_speed_is_clamped_to_exact_cap_same_direction() {
        let ability = MoveAbility::default();
        let (verified, violation) =
            validate_move_request(&request(1, Vec3::new(0.0, 0.0, -6.0), Vec3::zeros()), &ability);

        assert_eq!(verified.linear_velocity, QuantizedVec3::new(0, 0, -30_000));
        assert_eq!(verified.linear(), Vec3::new(0.0, 0.0, -3.0));
        let violation = violation.expect("violation reported");
        assert!(violation.linear_clamped && !violation.angular_clamped);
        assert!((violation.requested_linear_speed - 6.0).abs() < 1.0e-4);
    }

    #[test]
    fn diagonal_clamp_keeps_direction() {
        let ability = MoveAbility::default();
        let requested = Vec3::new(4.0, 0.0, -4.0);
        let (verified, _) = validate_move_request(&request(1, requested, Vec3::zeros()), &ability);
        let v = verified.linear();
        assert!((v.norm() - 3.0).abs() < 1.0e-3);
        assert!(v.normalize().dot(&requested.normalize()) > 1.0 - 1.0e-6);
    }

    #[test]
    fn angular_components_clamped_independently() {
        let ability = MoveAbility::default();
        let (verified, violation) =
            validate_move_request(&request(1, Vec3::zeros(), Vec3::new(5.0, -1.0, -9.0)), &ability);
        assert_eq!(verified.angular(), Vec3::new(2.0, -1.0, -2.0));
        assert!(violation.is_some_and(|v| v.angular_clamped && !v.linear_clamped));
    }

    #[test]
    fn legal_request_passes_unchanged() {
        let original = request(3, Vec3::new(1.0, 0.0, -2.0), Vec3::new(0.0, -1.5, 0.0));
        assert_eq!(validate_move_request(&original, &MoveAbility::default()), (original, None));
    }

    #[test]
    fn authority_ignores_stale_requests() {
        let mut authority = ServerAuthority::new(7, MoveAbility::default());
        let mut body = KinematicBody::default();

        authority.apply_request(&request(5, Vec3::new(0.0, 0.0, -1.0), Vec3::zeros()), &mut body);
        let stale = authority.apply_request(&request(4, Vec3::new(0.0, 0.0, -2.0), Vec3::zeros()), &mut body);

        assert_eq!(stale, RequestOutcome::Stale { sequence: 4, last_sequence: 5 });
        assert_eq!(body.velocity.linear, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(authority.verified.map(|r| r.sequence), Some(5));
    }

    #[test]
    fn tick_publishes_clamped_echo_and_goes_quiet_at_rest() {
        let mut authority = ServerAuthority::new(7, MoveAbility::default());
        let mut body = KinematicBody::default();
        let dt = 1.0 / 15.0;

        authority.apply_request(&request(1, Vec3::new(0.0, 0.0, -6.0), Vec3::zeros()), &mut body);
        let snapshot = authority.tick(&mut body, dt).expect("dirty entity publishes");
        assert_eq!(snapshot.entity_id, 7);
        assert_eq!(
            snapshot.verified.map(|r| r.linear_velocity),
            Some(QuantizedVec3::new(0, 0, -30_000))
        );
        assert!((snapshot.pose().position.z + 3.0 * dt).abs() < 1.0e-4);
        assert_eq!(authority.violations, 1);

        authority.apply_request(&request(2, Vec3::zeros(), Vec3::zeros()), &mut body);
        assert!(authority.tick(&mut body, dt).is_some());
        assert!(authority.tick(&mut body, dt).is_none());
    }
}
