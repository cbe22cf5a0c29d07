use super::RemoteBody;
use crate::convert::pose_to_transform;
use bevy::prelude::*;

/// Drive remote transforms from their smoothers.
pub(super) fn smooth_remotes(
    time: Res<Time>,
    mut remote_q: Query<(&mut Transform, &mut RemoteBody)>,
) {
    let dt = time.delta_secs();
    remote_q
        .par_iter_mut()
        .for_each(|(mut transform, mut remote)| {
            let pose = remote.smoother.update(dt);
            *transform = pose_to_transform(&pose);
        });
}
