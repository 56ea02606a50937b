//! Identity registry and reconnection for Broadside.
//!
//! Every admitted participant has exactly one [`Session`], keyed by its
//! [`Identity`](broadside_protocol::Identity). The session's
//! [`SessionState`] says where that identity currently lives:
//!
//! ```text
//!            admit()                 mark_playing()
//!   (none) ─────────→ Lobby ─────────────────────────→ Playing
//!     ↑                 ↑                                │
//!     │                 └────── return_to_lobby() ───────┤
//!     │                                                  │ on_detach()
//!     │   settle_expiry() (grace elapsed)                ▼
//!     └──────────────────────────────────────────── Detached
//!                                                        │
//!                          admit() / on_attach() ────────┘ → Playing
//! ```
//!
//! An identity is therefore in at most one of {lobby, match, grace
//! window} at a time. Reattachment is event-driven: the supervisor waiting
//! on a [`ReconnectionRecord`] is woken through a oneshot channel the
//! moment the same identity is admitted again.
//!
//! `SessionManager` itself is not synchronized; the server keeps it behind
//! a mutex and never holds that mutex across an `.await`.

mod error;
mod identity;
mod manager;
mod session;

pub use error::SessionError;
pub use identity::{guest_identity, resolve_identity};
pub use manager::{Admission, ReconnectionRecord, ResumeOutcome, SessionManager};
pub use session::{Session, SessionConfig, SessionState};
