//! Seams between the driver and the outside world.

use std::future::Future;
use std::sync::Arc;

use crate::{FleetGrid, MatchSnapshot};

/// A player's link failed (closed, reset, or write error).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("connection fault: {0}")]
pub struct ConnectionFault(pub String);

/// One player's side of a match.
///
/// `recv` yields already-decoded, integrity-checked text; lines that fail
/// the wire checks never reach the driver. It must be cancel-safe, since
/// the driver wraps it in the turn timeout.
pub trait Endpoint: Send + Sync {
    /// Sends one text message.
    fn send(&self, text: &str) -> impl Future<Output = Result<(), ConnectionFault>> + Send;

    /// Sends a board render (header row plus grid rows).
    fn send_grid(&self, rows: &[String]) -> impl Future<Output = Result<(), ConnectionFault>> + Send;

    /// Waits for the next message from the player.
    fn recv(&self) -> impl Future<Output = Result<String, ConnectionFault>> + Send;
}

impl<T: Endpoint + ?Sized> Endpoint for Arc<T> {
    fn send(&self, text: &str) -> impl Future<Output = Result<(), ConnectionFault>> + Send {
        (**self).send(text)
    }

    fn send_grid(&self, rows: &[String]) -> impl Future<Output = Result<(), ConnectionFault>> + Send {
        (**self).send_grid(rows)
    }

    fn recv(&self) -> impl Future<Output = Result<String, ConnectionFault>> + Send {
        (**self).recv()
    }
}

/// Callbacks the driver uses for everything that is not one of the two
/// players.
pub trait MatchHooks<G: FleetGrid>: Send + Sync {
    /// Persists the latest snapshot. Called after every state change that
    /// a resumed match must see, before the next turn begins.
    fn save_snapshot(
        &self,
        snapshot: &MatchSnapshot<G>,
    ) -> impl Future<Output = Result<(), crate::MatchError>> + Send;

    /// Sends a read-only update to everyone watching. Delivery failures
    /// stay inside the hook and never reach the match.
    fn broadcast(&self, text: String) -> impl Future<Output = ()> + Send;
}
