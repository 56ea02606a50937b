//! Error types for the protocol layer.
//!
//! Integrity problems and coordinate problems are kept apart on purpose:
//! a frame that fails its integrity check is dropped without telling the
//! sender, while a bad coordinate is reported back to the player.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame was malformed, failed its checksum, could not be
    /// decrypted, or repeated an old sequence number.
    ///
    /// All of these are the same kind on purpose: the caller's policy is
    /// identical for every one of them (discard, wait for the next line).
    #[error("frame rejected: {0}")]
    Integrity(String),

    /// A shot coordinate did not match the grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

impl ProtocolError {
    pub(crate) fn integrity(reason: impl Into<String>) -> Self {
        Self::Integrity(reason.into())
    }

    /// Returns `true` for the silently-discarded class of errors.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}

/// Why a coordinate string was rejected.
///
/// The `Display` text is shown to the player after `Invalid input: `.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Nothing but whitespace was entered.
    #[error("no input received")]
    Empty,

    /// The first character is not a row letter.
    #[error("'{0}' is not a row letter (expected A-J style)")]
    BadRow(char),

    /// The column part is missing, not numeric, or longer than two digits.
    #[error("column must be a 1-2 digit number, got '{0}'")]
    BadColumn(String),

    /// Well-formed, but outside the grid.
    #[error("{0} is outside the {1}x{1} grid")]
    OutOfBounds(String, usize),
}
