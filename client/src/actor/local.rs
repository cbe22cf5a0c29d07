use super::{LocalMover, NetworkEntity, PhysicsBodies, SimClock};
use crate::{convert::pose_to_transform, input::PendingActions, net::Uplink};
use bevy::prelude::*;
use movesync_shared::{
    Mover, PhysicsBody, UnitAction, apply_actions, integrate_all,
    rapier::KinematicBodies,
    wire::{Envelope, MoveRequestMsg, WireBody, encode_envelope},
};

/// Render smoothing toward the 15 Hz simulated pose.
const LOCAL_POSITION_RATE: f32 = 20.0;
const LOCAL_ROTATION_RATE: f32 = 30.0;

/// One fixed movement step for the local bodies.
///
/// Consumes buffered actions, integrates every local mover in one batch, moves the physics
/// bodies and, when the sampling clock fires, queues a move request per body and sends it.
pub(super) fn step_local_mover(
    time: Res<Time>,
    mut clock: ResMut<SimClock>,
    mut pending: ResMut<PendingActions>,
    mut bodies: ResMut<PhysicsBodies>,
    mut uplink: ResMut<Uplink>,
    mut local_q: Query<(&NetworkEntity, &mut LocalMover)>,
) {
    if !clock.integrate.advance(time.delta()) {
        return;
    }
    clock.steps += 1;
    let dt = clock.integrate.dt();
    let interval = clock.integrate.interval();
    let sample_due = clock.sample.advance(interval);
    let now = clock.now();

    let actions = std::mem::take(&mut pending.0);
    integrate_local_movers(
        &mut bodies,
        local_q.iter_mut().map(|(_, local)| local.into_inner()),
        &actions,
        dt,
    );

    if !sample_due {
        return;
    }
    let delta = !uplink.0.conditions().reorders();
    for (net, mut local) in &mut local_q {
        let LocalMover {
            engine,
            encoder,
            handle,
            ..
        } = &mut *local;
        let Some(body) = bodies.get(*handle) else {
            continue;
        };
        let request = engine.sample(now, body);
        let msg = if delta {
            encoder.encode(&request)
        } else {
            MoveRequestMsg::from(request)
        };
        uplink.0.send(
            time.elapsed(),
            encode_envelope(&Envelope {
                entity_id: net.0,
                body: WireBody::MoveRequest(msg),
            }),
        );
    }
}

/// Apply `actions` to every local mover, advance their velocities through [`integrate_all`] and
/// move the bodies by one step. Returns how many movers were stepped.
pub(super) fn integrate_local_movers<'a>(
    bodies: &mut KinematicBodies,
    locals: impl IntoIterator<Item = &'a mut LocalMover>,
    actions: &[UnitAction],
    dt: f32,
) -> usize {
    let mut stepped = Vec::new();
    let mut movers: Vec<Mover> = Vec::new();
    for local in locals {
        let Some(body) = bodies.get(local.handle) else {
            warn!("local mover {:?} has no physics body", local.handle);
            continue;
        };
        let (velocity, orientation) = (body.velocity(), body.pose().orientation);
        let mover = &mut local.mover;
        apply_actions(&mut mover.state, &mover.ability, actions);
        mover.velocity = velocity;
        mover.orientation = orientation;
        movers.push(*mover);
        stepped.push(local);
    }

    integrate_all(&mut movers, dt);

    for (local, mover) in stepped.iter_mut().zip(movers) {
        local.mover = mover;
        if let Some(body) = bodies.get_mut(local.handle) {
            body.set_velocity(mover.velocity);
        }
    }
    bodies.step(dt);
    stepped.len()
}

pub(super) fn present_local(
    time: Res<Time>,
    bodies: Res<PhysicsBodies>,
    mut local_q: Query<(&mut Transform, &LocalMover)>,
) {
    let dt = time.delta_secs();
    for (mut transform, local) in &mut local_q {
        let Some(body) = bodies.get(local.handle) else {
            continue;
        };
        let target = pose_to_transform(&body.pose());
        transform
            .translation
            .smooth_nudge(&target.translation, LOCAL_POSITION_RATE, dt);
        transform.rotation = transform
            .rotation
            .slerp(target.rotation, 1.0 - (-LOCAL_ROTATION_RATE * dt).exp());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use movesync_shared::{MoveAbility, Pose, Quat, SyncSettings, Vec3};

    const DT: f32 = 1.0 / 15.0;

    #[test]
    fn every_local_mover_steps_in_one_batch() {
        let settings = SyncSettings::default();
        let mut bodies = KinematicBodies::default();
        let start = Pose::new(Vec3::new(4.0, 0.0, 0.0), Quat::identity());
        let mut a = LocalMover::new(bodies.spawn(Pose::default()), MoveAbility::default(), &settings);
        let mut b = LocalMover::new(bodies.spawn(start), MoveAbility::default(), &settings);

        let stepped = integrate_local_movers(
            &mut bodies,
            [&mut a, &mut b],
            &[UnitAction::MoveForward(1.0)],
            DT,
        );
        assert_eq!(stepped, 2);

        for (local, origin) in [(&a, Pose::default()), (&b, start)] {
            assert!(local.mover.state.linear_intent.is_some());
            assert!(local.mover.velocity.linear.z < 0.0, "drives along -Z");
            let body = bodies.get(local.handle).expect("spawned body");
            assert_eq!(body.velocity(), local.mover.velocity);
            let travelled = body.pose().position - origin.position;
            assert!((travelled - local.mover.velocity.linear * DT).norm() < 1.0e-6);
        }
    }

    #[test]
    fn auto_stop_brakes_every_mover_to_rest() {
        let settings = SyncSettings::default();
        let mut bodies = KinematicBodies::default();
        let mut local = LocalMover::new(bodies.spawn(Pose::default()), MoveAbility::default(), &settings);

        integrate_local_movers(&mut bodies, [&mut local], &[UnitAction::MoveForward(1.0)], DT);
        integrate_local_movers(
            &mut bodies,
            [&mut local],
            &[UnitAction::StopMoveForward(1.0), UnitAction::AutoStopMove],
            DT,
        );
        for _ in 0..10 {
            integrate_local_movers(&mut bodies, [&mut local], &[], DT);
        }

        assert!(local.mover.state.is_idle());
        assert_eq!(local.mover.velocity.linear, Vec3::zeros());
    }
}
