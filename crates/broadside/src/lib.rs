//! # Broadside
//!
//! Multi-client battleship match server over line-oriented TCP.
//!
//! Clients pick a name, wait in a shared lobby, and are seated two at a
//! time into matches. Everyone else in the lobby watches read-only
//! updates. A player whose connection drops mid-match has a grace window
//! to come back under the same name and continue from the last saved
//! state. Every gameplay line travels as an encrypted, sequenced,
//! checksummed frame.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use broadside::prelude::*;
//!
//! # async fn start() -> Result<(), BroadsideError> {
//! let server = BroadsideServer::<ClassicFleet>::builder()
//!     .bind("0.0.0.0:5000")
//!     .build(ClassicFleet::random())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod link;
mod lobby;
mod server;
mod supervisor;

pub use error::BroadsideError;
pub use link::{FramedLink, WireCodec};
pub use lobby::{Lobby, LobbyEntry, Matchmaker, Pairing, Role};
pub use server::{BroadsideServer, BroadsideServerBuilder};

pub mod prelude {
    //! Everything needed to configure and start a server.

    pub use crate::{BroadsideError, BroadsideServer, BroadsideServerBuilder};
    pub use broadside_match::{MatchConfig, RulesEngine, TimeoutPolicy};
    pub use broadside_protocol::{AesCtrCipher, DEV_KEY, FrameCodec, Identity};
    pub use broadside_rules::{ClassicFleet, standard_layout};
    pub use broadside_session::SessionConfig;
}
