//! Frames: one wire line, `SEQ|TOKEN|CHECKSUM`.
//!
//! `CHECKSUM` is the decimal CRC-32 of the `SEQ|TOKEN` substring. Decoding
//! verifies it before touching the cipher, so a corrupted line never
//! reaches decryption.
//!
//! ```text
//! 7|q2hC...base64...==|2874411906
//! ^ ^                 ^
//! | opaque token      crc32("7|q2hC...==")
//! sequence number
//! ```
//!
//! Board renders are not framed. A plain `GRID` line starts a block of
//! raw text rows that ends with an empty line.

use crate::{Cipher, ProtocolError};

/// Separates the three frame fields.
const DELIMITER: char = '|';

/// First line of an unframed board-render block.
pub const GRID_SENTINEL: &str = "GRID";

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub seq: u64,
    pub plaintext: String,
}

/// Decimal CRC-32 over a frame body (`SEQ|TOKEN`).
pub fn checksum(body: &str) -> u32 {
    crc32fast::hash(body.as_bytes())
}

/// Encodes and decodes frames with the given [`Cipher`].
///
/// Stateless apart from the cipher; sequence policy lives in
/// [`SequenceCounter`] (sending) and [`SequenceGuard`] (receiving).
#[derive(Debug, Clone, Default)]
pub struct FrameCodec<C> {
    cipher: C,
}

impl<C: Cipher> FrameCodec<C> {
    pub fn new(cipher: C) -> Self {
        Self { cipher }
    }

    /// Builds the wire line for `plaintext` (without the trailing newline).
    pub fn encode(&self, seq: u64, plaintext: &str) -> String {
        let body = format!("{seq}{DELIMITER}{}", self.cipher.encrypt(plaintext));
        let crc = checksum(&body);
        format!("{body}{DELIMITER}{crc}")
    }

    /// Parses and verifies one wire line.
    ///
    /// # Errors
    /// Every failure is [`ProtocolError::Integrity`]: missing delimiters,
    /// non-numeric sequence or checksum, checksum mismatch, or a token the
    /// cipher rejects.
    pub fn decode(&self, line: &str) -> Result<Frame, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);

        let (body, received) = line
            .rsplit_once(DELIMITER)
            .ok_or_else(|| ProtocolError::integrity("missing checksum field"))?;
        let received: u32 = parse_decimal(received)
            .ok_or_else(|| ProtocolError::integrity("checksum is not a decimal number"))?;

        let expected = checksum(body);
        if expected != received {
            return Err(ProtocolError::integrity(format!(
                "checksum mismatch (expected {expected}, got {received})"
            )));
        }

        let (seq, token) = body
            .split_once(DELIMITER)
            .ok_or_else(|| ProtocolError::integrity("missing sequence field"))?;
        let seq: u64 = parse_decimal(seq)
            .ok_or_else(|| ProtocolError::integrity("sequence is not a decimal number"))?;

        let plaintext = self.cipher.decrypt(token)?;
        Ok(Frame { seq, plaintext })
    }
}

/// Digits only; `str::parse` alone would also take a leading `+`.
fn parse_decimal<T: std::str::FromStr>(field: &str) -> Option<T> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

// ---------------------------------------------------------------------------
// Sequence policy
// ---------------------------------------------------------------------------

/// Outbound sequence numbers for one connection: 0, 1, 2, ...
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: u64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next number and advances the counter.
    pub fn next_seq(&mut self) -> u64 {
        let seq = self.next;
        self.next += 1;
        seq
    }
}

/// Inbound replay/reorder filter for one connection.
///
/// A frame is accepted only if its sequence number is strictly greater
/// than the last accepted one. Gaps are fine (a discarded frame leaves
/// one); repeats and anything older are rejected.
#[derive(Debug, Default, Clone)]
pub struct SequenceGuard {
    last: Option<u64>,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `seq` if it is fresh.
    ///
    /// # Errors
    /// [`ProtocolError::Integrity`] for a replayed or out-of-order number.
    /// The guard is left unchanged in that case.
    pub fn accept(&mut self, seq: u64) -> Result<(), ProtocolError> {
        match self.last {
            Some(last) if seq <= last => Err(ProtocolError::integrity(format!(
                "stale sequence {seq} (last accepted {last})"
            ))),
            _ => {
                self.last = Some(seq);
                Ok(())
            }
        }
    }

    /// The highest sequence number accepted so far.
    pub fn last(&self) -> Option<u64> {
        self.last
    }
}
