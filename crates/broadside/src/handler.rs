//! Per-connection admission: name prompt, duplicate check, and routing.
//!
//! Each accepted connection gets its own task running this handler.
//! The flow is:
//!   1. Ask for a name → resolve it to an identity
//!   2. Admit the identity → fresh, resumed, or taken
//!   3. Fresh → lobby; resumed → the waiting match takes the link
//!
//! The handler ends once the link has an owner. From then on the lobby,
//! and later a match supervisor, do all reads and writes.

use std::sync::Arc;

use broadside_match::RulesEngine;
use broadside_session::{Admission, SessionError, resolve_identity};
use broadside_transport::LineConnection;

use crate::BroadsideError;
use crate::link::FramedLink;
use crate::server::ServerState;

const NAME_PROMPT: &str = "[INFO] Welcome! Please enter your username:";
const CHECKING_NOTICE: &str = "[INFO] Checking for any ongoing games...";
const NAME_TAKEN: &str =
    "[ERROR] This username is already taken. Please choose a different one.";

/// Handles a single connection from accept until it is admitted.
pub(crate) async fn handle_connection<R: RulesEngine>(
    conn: LineConnection,
    state: Arc<ServerState<R>>,
) -> Result<(), BroadsideError> {
    let link = Arc::new(FramedLink::new(conn, Arc::clone(&state.codec)));
    let conn_id = link.id();
    tracing::debug!(%conn_id, "handling new connection");

    link.send(NAME_PROMPT).await?;

    loop {
        let Some(input) = link.recv().await? else {
            tracing::debug!(%conn_id, "left before choosing a name");
            return Ok(());
        };

        let identity = match resolve_identity(&input) {
            Ok(identity) => identity,
            Err(e) => {
                link.send(&format!("[ERROR] {e}")).await?;
                continue;
            }
        };

        link.send(CHECKING_NOTICE).await?;

        let admission = state.sessions.lock().await.admit(&identity, &link);
        match admission {
            Ok(Admission::Resumed { match_id }) => {
                tracing::info!(%conn_id, %identity, %match_id, "handed to waiting match");
                return Ok(());
            }
            Ok(Admission::Fresh) => {
                tracing::info!(%conn_id, %identity, "admitted");
                state.enter_lobby(identity, link).await;
                return Ok(());
            }
            Err(SessionError::DuplicateIdentity(identity)) => {
                tracing::debug!(%conn_id, %identity, "name already in use");
                link.send(NAME_TAKEN).await?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
