//! Wire forms of the protocol messages.
//!
//! Velocity, position and orientation fields are optional. An absent field means "unchanged since
//! the previous message for this entity", never zero. The encoders suppress fields equal to the
//! last value they sent and the decoders carry the last received value forward.
//!
//! Binary layout, little endian:
//!
//! ```text
//! tag u8 | entity_id u64 | presence u8 | fields...
//!
//! move request fields: sequence u32 | client_time f32 | [linear 3 x i32] | [angular 3 x i32]
//! snapshot fields:     [position 3 x i32] | [orientation u32] | [presence u8 | move request fields]
//! ```
//!
//! A zero entity id, an unknown tag or a truncated buffer fails to decode and the message is
//! dropped by the caller.
//!
//! Suppression relies on in-order delivery. Links that may reorder send full messages
//! (`From<MoveRequest>` / `From<AuthoritativeSnapshot>`).

use bytes::{Buf, BufMut};

use crate::{
    bitmask_flags::BitmaskFlags,
    define_bitmask_flags,
    error::{SyncError, SyncResult},
    protocol::{AuthoritativeSnapshot, MoveRequest},
    quantize::{CompressedQuat, QuantizedVec3},
};

const TAG_MOVE_REQUEST: u8 = 0x01;
const TAG_SNAPSHOT: u8 = 0x02;

define_bitmask_flags!(
    /// Which optional fields follow the presence byte.
    Field, u8, {
        LinearVelocity,
        AngularVelocity,
        Position,
        Orientation,
        VerifiedRequest,
    }
);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveRequestMsg {
    pub sequence: u32,
    pub client_time: f32,
    pub linear_velocity: Option<QuantizedVec3>,
    pub angular_velocity: Option<QuantizedVec3>,
}

impl From<MoveRequest> for MoveRequestMsg {
    /// Full message with every field present.
    fn from(request: MoveRequest) -> Self {
        Self {
            sequence: request.sequence,
            client_time: request.client_time,
            linear_velocity: Some(request.linear_velocity),
            angular_velocity: Some(request.angular_velocity),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SnapshotMsg {
    pub position: Option<QuantizedVec3>,
    pub orientation: Option<CompressedQuat>,
    pub verified_request: Option<MoveRequestMsg>,
}

impl From<AuthoritativeSnapshot> for SnapshotMsg {
    fn from(snapshot: AuthoritativeSnapshot) -> Self {
        Self {
            position: Some(snapshot.position),
            orientation: Some(snapshot.orientation),
            verified_request: snapshot.verified.map(MoveRequestMsg::from),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WireBody {
    MoveRequest(MoveRequestMsg),
    Snapshot(SnapshotMsg),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub entity_id: u64,
    pub body: WireBody,
}

// ---------------------------------------------------------------------------
// Delta suppression / carry-forward
// ---------------------------------------------------------------------------

/// Per-entity sender side of the move request stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveRequestEncoder {
    last_linear: Option<QuantizedVec3>,
    last_angular: Option<QuantizedVec3>,
}

impl MoveRequestEncoder {
    pub fn encode(&mut self, request: &MoveRequest) -> MoveRequestMsg {
        MoveRequestMsg {
            sequence: request.sequence,
            client_time: request.client_time,
            linear_velocity: changed(&mut self.last_linear, request.linear_velocity),
            angular_velocity: changed(&mut self.last_angular, request.angular_velocity),
        }
    }
}

/// Per-entity receiver side of the move request stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveRequestDecoder {
    linear: QuantizedVec3,
    angular: QuantizedVec3,
}

impl MoveRequestDecoder {
    /// Resume a stream whose last received velocities were persisted elsewhere.
    pub fn resume(linear: QuantizedVec3, angular: QuantizedVec3) -> Self {
        Self { linear, angular }
    }

    /// Last received `(linear, angular)` velocities.
    pub fn last(&self) -> (QuantizedVec3, QuantizedVec3) {
        (self.linear, self.angular)
    }

    pub fn decode(&mut self, msg: &MoveRequestMsg) -> MoveRequest {
        if let Some(linear) = msg.linear_velocity {
            self.linear = linear;
        }
        if let Some(angular) = msg.angular_velocity {
            self.angular = angular;
        }
        MoveRequest {
            sequence: msg.sequence,
            client_time: msg.client_time,
            linear_velocity: self.linear,
            angular_velocity: self.angular,
        }
    }
}

/// Per-entity sender side of the snapshot stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnapshotEncoder {
    last_position: Option<QuantizedVec3>,
    last_orientation: Option<CompressedQuat>,
    last_verified_sequence: Option<u32>,
}

impl SnapshotEncoder {
    pub fn encode(&mut self, snapshot: &AuthoritativeSnapshot) -> SnapshotMsg {
        let verified_request = snapshot.verified.and_then(|request| {
            changed(&mut self.last_verified_sequence, request.sequence)
                .map(|_| MoveRequestMsg::from(request))
        });
        SnapshotMsg {
            position: changed(&mut self.last_position, snapshot.position),
            orientation: changed(&mut self.last_orientation, snapshot.orientation),
            verified_request,
        }
    }
}

/// Per-entity receiver side of the snapshot stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnapshotDecoder {
    position: QuantizedVec3,
    orientation: CompressedQuat,
    verified: Option<MoveRequest>,
    request: MoveRequestDecoder,
}

impl SnapshotDecoder {
    pub fn decode(&mut self, entity_id: u64, msg: &SnapshotMsg) -> AuthoritativeSnapshot {
        if let Some(position) = msg.position {
            self.position = position;
        }
        if let Some(orientation) = msg.orientation {
            self.orientation = orientation;
        }
        if let Some(request) = &msg.verified_request {
            self.verified = Some(self.request.decode(request));
        }
        AuthoritativeSnapshot {
            entity_id,
            position: self.position,
            orientation: self.orientation,
            verified: self.verified,
        }
    }
}

/// Returns `Some(value)` and records it when it differs from `last`.
fn changed<T: Copy + PartialEq>(last: &mut Option<T>, value: T) -> Option<T> {
    if *last == Some(value) {
        return None;
    }
    *last = Some(value);
    Some(value)
}

// ---------------------------------------------------------------------------
// Byte codec
// ---------------------------------------------------------------------------

pub fn encode_envelope(envelope: &Envelope) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    match &envelope.body {
        WireBody::MoveRequest(msg) => {
            out.put_u8(TAG_MOVE_REQUEST);
            out.put_u64_le(envelope.entity_id);
            put_move_request(&mut out, msg);
        }
        WireBody::Snapshot(msg) => {
            out.put_u8(TAG_SNAPSHOT);
            out.put_u64_le(envelope.entity_id);

            let mut presence = BitmaskFlags::<u8>::default();
            presence.set(Field::Position, msg.position.is_some());
            presence.set(Field::Orientation, msg.orientation.is_some());
            presence.set(Field::VerifiedRequest, msg.verified_request.is_some());
            out.put_u8(presence.bits);

            if let Some(position) = msg.position {
                put_vec3(&mut out, position);
            }
            if let Some(orientation) = msg.orientation {
                out.put_u32_le(orientation.0);
            }
            if let Some(request) = &msg.verified_request {
                put_move_request(&mut out, request);
            }
        }
    }
    out
}

pub fn decode_envelope(mut buf: &[u8]) -> SyncResult<Envelope> {
    let tag = take_u8(&mut buf)?;
    let entity_id = take_u64(&mut buf)?;
    if entity_id == 0 {
        return Err(SyncError::MissingEntity);
    }
    let body = match tag {
        TAG_MOVE_REQUEST => WireBody::MoveRequest(take_move_request(&mut buf)?),
        TAG_SNAPSHOT => {
            let presence = BitmaskFlags::new(take_u8(&mut buf)?);
            let position = presence
                .has(Field::Position)
                .then(|| take_vec3(&mut buf))
                .transpose()?;
            let orientation = presence
                .has(Field::Orientation)
                .then(|| take_u32(&mut buf).map(CompressedQuat))
                .transpose()?;
            let verified_request = presence
                .has(Field::VerifiedRequest)
                .then(|| take_move_request(&mut buf))
                .transpose()?;
            WireBody::Snapshot(SnapshotMsg {
                position,
                orientation,
                verified_request,
            })
        }
        other => return Err(SyncError::UnknownTag(other)),
    };
    Ok(Envelope { entity_id, body })
}

fn put_move_request(out: &mut Vec<u8>, msg: &MoveRequestMsg) {
    let mut presence = BitmaskFlags::<u8>::default();
    presence.set(Field::LinearVelocity, msg.linear_velocity.is_some());
    presence.set(Field::AngularVelocity, msg.angular_velocity.is_some());
    out.put_u8(presence.bits);
    out.put_u32_le(msg.sequence);
    out.put_f32_le(msg.client_time);
    if let Some(linear) = msg.linear_velocity {
        put_vec3(out, linear);
    }
    if let Some(angular) = msg.angular_velocity {
        put_vec3(out, angular);
    }
}

fn take_move_request(buf: &mut &[u8]) -> SyncResult<MoveRequestMsg> {
    let presence = BitmaskFlags::new(take_u8(buf)?);
    ensure(buf, 8)?;
    let sequence = buf.get_u32_le();
    let client_time = buf.get_f32_le();
    let linear_velocity = presence
        .has(Field::LinearVelocity)
        .then(|| take_vec3(buf))
        .transpose()?;
    let angular_velocity = presence
        .has(Field::AngularVelocity)
        .then(|| take_vec3(buf))
        .transpose()?;
    Ok(MoveRequestMsg {
        sequence,
        client_time,
        linear_velocity,
        angular_velocity,
    })
}

fn put_vec3(out: &mut Vec<u8>, v: QuantizedVec3) {
    out.put_i32_le(v.x);
    out.put_i32_le(v.y);
    out.put_i32_le(v.z);
}

fn take_vec3(buf: &mut &[u8]) -> SyncResult<QuantizedVec3> {
    ensure(buf, 12)?;
    Ok(QuantizedVec3::new(
        buf.get_i32_le(),
        buf.get_i32_le(),
        buf.get_i32_le(),
    ))
}

fn take_u8(buf: &mut &[u8]) -> SyncResult<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

fn take_u32(buf: &mut &[u8]) -> SyncResult<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32_le())
}

fn take_u64(buf: &mut &[u8]) -> SyncResult<u64> {
    ensure(buf, 8)?;
    Ok(buf.get_u64_le())
}

// `Buf::get_*` panics on short input, so every read is checked first.
fn ensure(buf: &&[u8], needed: usize) -> SyncResult<()> {
    if buf.remaining() < needed {
        return Err(SyncError::Truncated {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(sequence: u32, linear: QuantizedVec3) -> MoveRequest {
        MoveRequest {
            sequence,
            client_time: sequence as f32 / 15.0,
            linear_velocity: linear,
            angular_velocity: QuantizedVec3::ZERO,
        }
    }

    #[test]
    fn unchanged_fields_are_suppressed_and_carried_forward() {
        let mut encoder = MoveRequestEncoder::default();
        let mut decoder = MoveRequestDecoder::default();
        let v = QuantizedVec3::new(0, 0, -10_000);

        let first = encoder.encode(&request(1, v));
        assert_eq!(first.linear_velocity, Some(v));
        assert_eq!(first.angular_velocity, Some(QuantizedVec3::ZERO));

        let second = encoder.encode(&request(2, v));
        assert_eq!(second.linear_velocity, None);
        assert_eq!(second.angular_velocity, None);

        decoder.decode(&first);
        let decoded = decoder.decode(&second);
        assert_eq!(decoded, request(2, v));
    }

    #[test]
    fn absent_field_is_not_zero() {
        let mut decoder = MoveRequestDecoder::default();
        let v = QuantizedVec3::new(5, 6, 7);
        decoder.decode(&MoveRequest::default().into());
        decoder.decode(&MoveRequestMsg::from(request(1, v)));
        let carried = decoder.decode(&MoveRequestMsg {
            sequence: 2,
            client_time: 0.2,
            linear_velocity: None,
            angular_velocity: None,
        });
        assert_eq!(carried.linear_velocity, v);
    }

    #[test]
    fn snapshot_stream_suppresses_repeated_verified_request() {
        let mut encoder = SnapshotEncoder::default();
        let mut decoder = SnapshotDecoder::default();
        let snapshot = AuthoritativeSnapshot {
            entity_id: 9,
            position: QuantizedVec3::new(1, 2, 3),
            orientation: CompressedQuat::default(),
            verified: Some(request(4, QuantizedVec3::new(0, 0, -1))),
        };

        let first = encoder.encode(&snapshot);
        assert!(first.position.is_some() && first.verified_request.is_some());
        let second = encoder.encode(&snapshot);
        assert_eq!(second, SnapshotMsg::default());

        decoder.decode(9, &first);
        assert_eq!(decoder.decode(9, &second), snapshot);
    }

    #[test]
    fn byte_codec_preserves_envelopes() {
        let envelopes = [
            Envelope {
                entity_id: 42,
                body: WireBody::MoveRequest(MoveRequestMsg {
                    sequence: 17,
                    client_time: 1.25,
                    linear_velocity: Some(QuantizedVec3::new(-1, 2, -3)),
                    angular_velocity: None,
                }),
            },
            Envelope {
                entity_id: u64::MAX,
                body: WireBody::Snapshot(SnapshotMsg {
                    position: None,
                    orientation: Some(CompressedQuat(0xdead_beef)),
                    verified_request: Some(request(3, QuantizedVec3::ZERO).into()),
                }),
            },
        ];
        for envelope in envelopes {
            let bytes = encode_envelope(&envelope);
            assert_eq!(decode_envelope(&bytes), Ok(envelope));
        }
    }

    #[test]
    fn malformed_input_is_rejected() {
        let envelope = Envelope {
            entity_id: 1,
            body: WireBody::Snapshot(SnapshotMsg {
                position: Some(QuantizedVec3::new(1, 1, 1)),
                ..Default::default()
            }),
        };
        let bytes = encode_envelope(&envelope);

        assert!(matches!(
            decode_envelope(&bytes[..bytes.len() - 1]),
            Err(SyncError::Truncated { needed: 12, available: 11 })
        ));
        assert_eq!(decode_envelope(&[]), Err(SyncError::Truncated { needed: 1, available: 0 }));

        let mut bad_tag = bytes.clone();
        bad_tag[0] = 0x7f;
        assert_eq!(decode_envelope(&bad_tag), Err(SyncError::UnknownTag(0x7f)));

        let mut no_entity = bytes;
        no_entity[1..9].fill(0);
        assert_eq!(decode_envelope(&no_entity), Err(SyncError::MissingEntity));
    }
}
