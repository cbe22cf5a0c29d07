use thiserror::Error;

/// Failures on the receive path. None of them are fatal: the message or update is dropped (or
/// retried next tick) and the last known state is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("message has no entity id")]
    MissingEntity,
    #[error("message truncated: needed {needed} bytes, had {available}")]
    Truncated { needed: usize, available: usize },
    #[error("unknown message tag {0:#04x}")]
    UnknownTag(u8),
    #[error("unknown entity {0}")]
    UnknownEntity(u64),
    #[error("message kind not accepted by this receiver")]
    UnexpectedMessage,
}

pub type SyncResult<T> = Result<T, SyncError>;
