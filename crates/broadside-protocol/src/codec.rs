//! Serde codecs for structured values such as match snapshots.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! Frames on the wire carry plain text, so no codec is involved there.
//! Codecs matter one layer up: the snapshot store turns a match snapshot
//! into an owned byte blob and back, which keeps saved state detached from
//! the live match that produced it.
//!
//! The store only depends on the [`Codec`] trait, not on a format. Today
//! that is [`JsonCodec`], which is easy to read in a debugger or a log
//! line. A compact binary codec could be swapped in without touching the
//! store or the match code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync`: the codec sits inside shared server state, and Tokio
///   may poll the tasks that use it on any worker thread.
/// - `'static`: the codec owns everything it needs and borrows nothing
///   temporary, so it can be stored in long-lived match tasks.
///
/// ## Generic methods
///
/// `encode` and `decode` are generic over the value type:
/// - `encode<T: Serialize>`: `T` can be written out as bytes.
/// - `decode<T: DeserializeOwned>`: `T` can be rebuilt from bytes.
///
/// `DeserializeOwned` (rather than plain `Deserialize<'de>`) means the
/// decoded value does not borrow from the input buffer. A restored
/// snapshot outlives the blob it came from, so that is required here.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails (for example
    /// a map with non-string keys under JSON).
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// truncated, or do not match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// JSON is larger than a binary format, but a saved snapshot can be read
/// as is when a resumed match looks wrong. A snapshot is two small grids
/// and a turn index, so the size cost is negligible.
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use broadside_protocol::{Codec, Coordinate, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Coordinate::new(0, 3)).unwrap();
/// let back: Coordinate = codec.decode(&bytes).unwrap();
/// assert_eq!(back, Coordinate::new(0, 3));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
