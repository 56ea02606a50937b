//! The symmetric-cipher collaborator.
//!
//! The frame codec treats encryption as an opaque pair of functions:
//! `encrypt(plaintext) -> token` and `decrypt(token) -> plaintext`. The
//! token is self-contained: whatever per-message randomness the cipher
//! needs travels inside it.

use aes::Aes256;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::Rng;

use crate::ProtocolError;

/// Anything that can turn plaintext into a printable token and back.
///
/// Tokens must never contain `|` or a newline, since they are embedded in
/// a delimited, line-terminated frame.
pub trait Cipher: Send + Sync + 'static {
    /// Encrypts `plaintext` into a printable token.
    fn encrypt(&self, plaintext: &str) -> String;

    /// Recovers the plaintext from a token produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    /// Returns [`ProtocolError::Integrity`] if the token is not valid for
    /// this cipher.
    fn decrypt(&self, token: &str) -> Result<String, ProtocolError>;
}

/// The fixed development key. Only suitable for local play.
pub const DEV_KEY: [u8; 32] = *b"ThisIsAStaticKeyForTesting123456";

const IV_LEN: usize = 16;

/// Standard alphabet; accepts tokens with or without trailing padding.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// AES-256 in CTR mode with a fresh random IV per message.
///
/// Token layout: `base64(IV || ciphertext)`, where the 16-byte IV is the
/// initial value of a 128-bit big-endian counter.
#[derive(Clone)]
pub struct AesCtrCipher {
    key: [u8; 32],
}

impl AesCtrCipher {
    /// Creates a cipher with the given 256-bit key.
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    fn keystream(&self, iv: &[u8; IV_LEN], buf: &mut [u8]) {
        let mut cipher = Aes256Ctr::new(&self.key.into(), &(*iv).into());
        cipher.apply_keystream(buf);
    }
}

impl Default for AesCtrCipher {
    fn default() -> Self {
        Self::new(DEV_KEY)
    }
}

// Keep the key out of logs.
impl std::fmt::Debug for AesCtrCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesCtrCipher").finish_non_exhaustive()
    }
}

impl Cipher for AesCtrCipher {
    fn encrypt(&self, plaintext: &str) -> String {
        let iv: [u8; IV_LEN] = rand::rng().random();
        let mut body = plaintext.as_bytes().to_vec();
        self.keystream(&iv, &mut body);

        let mut raw = Vec::with_capacity(IV_LEN + body.len());
        raw.extend_from_slice(&iv);
        raw.extend_from_slice(&body);
        TOKEN_ENGINE.encode(raw)
    }

    fn decrypt(&self, token: &str) -> Result<String, ProtocolError> {
        let raw = TOKEN_ENGINE
            .decode(token)
            .map_err(|e| ProtocolError::integrity(format!("token is not base64: {e}")))?;

        if raw.len() < IV_LEN {
            return Err(ProtocolError::integrity("token shorter than its IV"));
        }
        let (iv, body) = raw.split_at(IV_LEN);
        let iv: [u8; IV_LEN] = iv
            .try_into()
            .map_err(|_| ProtocolError::integrity("token IV has the wrong length"))?;

        let mut body = body.to_vec();
        self.keystream(&iv, &mut body);
        String::from_utf8(body)
            .map_err(|_| ProtocolError::integrity("decrypted payload is not UTF-8"))
    }
}
