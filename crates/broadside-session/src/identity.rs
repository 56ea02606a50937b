//! Turning a typed display name into an [`Identity`].
//!
//! There is no authentication beyond the self-chosen name. A blank name
//! gets a generated guest identity instead.

use broadside_protocol::Identity;
use rand::Rng;

use crate::SessionError;

/// Longest accepted display name, in characters.
const MAX_NAME_CHARS: usize = 32;

/// Validates a display name, or generates a guest identity for a blank one.
///
/// # Errors
/// [`SessionError::InvalidIdentity`] if the name is too long or contains
/// control characters.
pub fn resolve_identity(input: &str) -> Result<Identity, SessionError> {
    let name = input.trim();
    if name.is_empty() {
        return Ok(guest_identity());
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(SessionError::InvalidIdentity(format!(
            "names are limited to {MAX_NAME_CHARS} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(SessionError::InvalidIdentity(
            "names cannot contain control characters".to_string(),
        ));
    }
    Ok(Identity::new(name))
}

/// A fresh `guest-xxxxxxxx` identity (32 random bits, lowercase hex).
pub fn guest_identity() -> Identity {
    Identity::new(format!("guest-{}", generate_token::<4>()))
}

/// `N` random bytes as a `2 * N` character hex string.
fn generate_token<const N: usize>() -> String {
    let bytes: [u8; N] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
