//! Wire protocol for Broadside.
//!
//! This crate defines what travels on a connection and how it is checked:
//!
//! - **Types** ([`Identity`], [`MatchId`]) — who is talking and in which match.
//! - **Frames** ([`FrameCodec`], [`SequenceGuard`]) — one line on the wire,
//!   `SEQ|TOKEN|CHECKSUM`, integrity-checked before it is decrypted.
//! - **Cipher** ([`Cipher`] trait, [`AesCtrCipher`]) — the opaque
//!   `encrypt(plaintext) -> token` / `decrypt(token) -> plaintext` pair.
//! - **Coordinates** ([`Coordinate`]) — the `B5`-style shot grammar.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — serde-based encoding
//!   used for match snapshots.
//! - **Errors** ([`ProtocolError`], [`ParseError`]).
//!
//! The protocol layer knows nothing about sockets or matches. It turns
//! strings into checked values and back.
//!
//! ```text
//! Transport (lines) → Protocol (frames) → Match (turns)
//! ```

mod cipher;
mod codec;
mod coord;
mod error;
mod frame;
mod types;

pub use cipher::{AesCtrCipher, Cipher, DEV_KEY};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use coord::Coordinate;
pub use error::{ParseError, ProtocolError};
pub use frame::{Frame, FrameCodec, GRID_SENTINEL, SequenceCounter, SequenceGuard, checksum};
pub use types::{Identity, MatchId};
