/// Per-item ceiling of the sync backend, counted over key plus serialized value.
pub const SYNC_QUOTA_BYTES_PER_ITEM: usize = 8 * 1024;

/// Aggregate ceiling of the sync backend. Enforced by the backend, not by [`guard`].
pub const SYNC_QUOTA_BYTES: usize = 100 * 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SizeVerdict {
    pub eligible: bool,
    pub bytes: usize,
}

pub fn guard(key: &str, serialized: &str) -> SizeVerdict {
    let bytes = key.len() + serialized.len();
    SizeVerdict {
        eligible: bytes <= SYNC_QUOTA_BYTES_PER_ITEM,
        bytes,
    }
}
